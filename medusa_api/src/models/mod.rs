pub mod main_config;
pub use self::main_config::MainConfig;
pub mod manual_search_status;
pub use self::manual_search_status::ManualSearchStatus;
pub mod search_job;
pub use self::search_job::{EpisodeKey, SearchJob, SearchStatus};
pub mod search_result;
pub use self::search_result::SearchResult;
pub mod show_lookup;
pub use self::show_lookup::{ShowLookupResponse, ShowLookupResult};
pub mod show_scope;
pub use self::show_scope::ShowScope;
pub mod ui_message;
pub use self::ui_message::{Notification, UiMessage};

use serde::Deserialize;

/// The slice of `api/v2/config/main` the watcher needs at boot
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MainConfig {
    pub web_root: String,
    pub theme_name: Option<String>,
    pub wiki_url: Option<String>,
}

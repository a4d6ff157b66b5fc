use super::SearchJob;
use serde::{Deserialize, Serialize};

/// Response of `getManualSearchStatus`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualSearchStatus {
    /// Missing and `null` both mean there is nothing in flight
    #[serde(default)]
    pub episodes: Option<Vec<SearchJob>>,
}

impl ManualSearchStatus {
    pub fn into_jobs(self) -> Vec<SearchJob> {
        self.episodes.unwrap_or_default()
    }
}

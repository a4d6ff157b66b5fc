use serde::{Deserialize, Serialize};

/// Response of the search trigger endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub result: String,
    #[serde(default)]
    pub quality: Option<String>,
}

impl SearchResult {
    /// Anything but `success` counts as a failed submission
    pub fn is_success(&self) -> bool {
        self.result.eq_ignore_ascii_case("success")
    }
}

use super::SearchJob;
use std::{fmt, str::FromStr};

/// Restricts status polling to a single show
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShowScope {
    pub indexer_name: String,
    pub series_id: i64,
}

impl ShowScope {
    pub fn new(indexer_name: impl Into<String>, series_id: i64) -> Self {
        Self {
            indexer_name: indexer_name.into(),
            series_id,
        }
    }

    pub fn matches(&self, job: &SearchJob) -> bool {
        self.series_id == job.series_id && self.indexer_name.eq_ignore_ascii_case(&job.indexer_name)
    }
}

impl fmt::Display for ShowScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.indexer_name, self.series_id)
    }
}

impl FromStr for ShowScope {
    type Err = String;

    /// Parses `indexer:series_id`, e.g. `tvdb:42`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (indexer, id) = s
            .split_once(':')
            .ok_or_else(|| format!("expected <indexer>:<series id>, got '{s}'"))?;
        if indexer.is_empty() {
            return Err(format!("missing indexer name in '{s}'"));
        }
        let series_id = id
            .parse()
            .map_err(|_| format!("series id '{id}' is not a number"))?;
        Ok(Self::new(indexer, series_id))
    }
}

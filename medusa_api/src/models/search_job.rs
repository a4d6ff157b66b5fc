use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, DisplayFromStr, PickFirst, SerializeDisplay, serde_as};
use std::{convert::Infallible, fmt, str::FromStr};

/// Progress of a manual search as reported by the server
#[derive(Debug, Clone, PartialEq, Eq, SerializeDisplay, DeserializeFromStr)]
pub enum SearchStatus {
    Searching,
    Queued,
    Finished,
    /// Anything the server sends that we don't know how to render
    Unknown(String),
}

impl FromStr for SearchStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "searching" => Self::Searching,
            "queued" => Self::Queued,
            "finished" => Self::Finished,
            _ => Self::Unknown(s.to_string()),
        })
    }
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Searching => f.write_str("searching"),
            Self::Queued => f.write_str("queued"),
            Self::Finished => f.write_str("finished"),
            Self::Unknown(raw) => f.write_str(raw),
        }
    }
}

/// One outstanding or completed manual search for a single episode
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchJob {
    #[serde(rename = "indexer_name", alias = "indexerName")]
    pub indexer_name: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(rename = "series_id", alias = "seriesId")]
    pub series_id: i64,
    pub season: i32,
    pub episode: i32,
    #[serde(rename = "searchstatus", alias = "searchStatus")]
    pub search_status: SearchStatus,
    /// Server-defined episode status string, e.g. "Snatched (HDTV)"
    #[serde(rename = "status", alias = "episodeStatus", default)]
    pub episode_status: String,
    #[serde(default)]
    pub quality: String,
}

impl SearchJob {
    pub fn key(&self) -> EpisodeKey {
        EpisodeKey {
            indexer_name: self.indexer_name.clone(),
            series_id: self.series_id,
            season: self.season,
            episode: self.episode,
        }
    }

    pub fn is_snatched(&self) -> bool {
        self.episode_status.to_ascii_lowercase().contains("snatched")
    }
}

/// Composite identity of an episode row: `(indexerName, seriesId, season, episode)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EpisodeKey {
    pub indexer_name: String,
    pub series_id: i64,
    pub season: i32,
    pub episode: i32,
}

impl fmt::Display for EpisodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} S{:02}E{:02}",
            self.indexer_name, self.series_id, self.season, self.episode
        )
    }
}

/// Query payloads for the Medusa search endpoints
use crate::models::{EpisodeKey, ShowScope};
use serde::{Deserialize, Serialize};

/// How a scope is spelled in the status query string; older servers only understand `show=`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeParams {
    /// `indexername=<name>&seriesid=<id>`
    #[default]
    Split,
    /// `show=<id>`
    Show,
}

impl ScopeParams {
    pub fn query(self, scope: &ShowScope) -> Vec<(&'static str, String)> {
        match self {
            Self::Split => vec![
                ("indexername", scope.indexer_name.clone()),
                ("seriesid", scope.series_id.to_string()),
            ],
            Self::Show => vec![("show", scope.series_id.to_string())],
        }
    }
}

/// Enqueues a manual search for one episode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EpisodeSearchCommand {
    #[serde(skip)]
    retry: bool,
    #[serde(rename = "indexername")]
    pub indexer_name: String,
    #[serde(rename = "seriesid")]
    pub series_id: i64,
    pub season: i32,
    pub episode: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    down_cur_quality: Option<u8>,
}

impl EpisodeSearchCommand {
    /// Regular search (`home/searchEpisode`)
    pub fn search(key: &EpisodeKey) -> Self {
        Self {
            retry: false,
            indexer_name: key.indexer_name.clone(),
            series_id: key.series_id,
            season: key.season,
            episode: key.episode,
            down_cur_quality: None,
        }
    }

    /// Failed-download retry (`home/retryEpisode`), optionally accepting the current quality again
    pub fn retry(key: &EpisodeKey, down_cur_quality: bool) -> Self {
        Self {
            retry: true,
            down_cur_quality: down_cur_quality.then_some(1),
            ..Self::search(key)
        }
    }

    pub fn key(&self) -> EpisodeKey {
        EpisodeKey {
            indexer_name: self.indexer_name.clone(),
            series_id: self.series_id,
            season: self.season,
            episode: self.episode,
        }
    }

    pub fn is_retry(&self) -> bool {
        self.retry
    }

    pub fn path(&self) -> &'static str {
        if self.retry {
            "home/retryEpisode"
        } else {
            "home/searchEpisode"
        }
    }
}

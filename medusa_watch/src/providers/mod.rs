//! Traits the server backend implements for the watcher
//!
//! A backend does three things:
//! 1. Report the state of outstanding manual searches, optionally for one show
//! 2. Accept search and retry submissions for a single episode
//! 3. Look up shows on the configured indexers by name
use anyhow::Result;
use async_trait::async_trait;
use medusa_api::{
    commands::EpisodeSearchCommand,
    models::{SearchJob, SearchResult, ShowLookupResult, ShowScope},
};

#[async_trait]
pub trait StatusSource: Send + Sync {
    /// One status request; `scope` restricts the query to a single show
    async fn fetch(&self, scope: Option<&ShowScope>) -> Result<Vec<SearchJob>>;
}

#[async_trait]
pub trait SearchTrigger: Send + Sync {
    /// Enqueue a manual search (or retry) for one episode
    async fn trigger(&self, command: &EpisodeSearchCommand) -> Result<SearchResult>;
}

#[async_trait]
pub trait ShowSearcher: Send + Sync {
    async fn lookup(&self, term: &str, indexer: Option<i64>) -> Result<Vec<ShowLookupResult>>;
}

// Shared utilities
mod api_logging;

pub mod medusa;

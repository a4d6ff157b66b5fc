//! Show lookup by name, where a newer query replaces the one still in flight
use crate::providers::ShowSearcher;
use anyhow::Result;
use medusa_api::models::ShowLookupResult;
use std::sync::Arc;
use tokio::{sync::Mutex, task::AbortHandle};
use tracing::debug;

pub struct ShowLookup {
    searcher: Arc<dyn ShowSearcher>,
    in_flight: Mutex<Option<AbortHandle>>,
}

impl ShowLookup {
    pub fn new(searcher: Arc<dyn ShowSearcher>) -> Self {
        Self {
            searcher,
            in_flight: Mutex::new(None),
        }
    }

    /// Look up `term`, aborting any lookup that is still running
    ///
    /// Resolves to `Ok(None)` when this lookup was itself replaced before it finished.
    pub async fn search(
        &self,
        term: &str,
        indexer: Option<i64>,
    ) -> Result<Option<Vec<ShowLookupResult>>> {
        let task = tokio::spawn({
            let searcher = Arc::clone(&self.searcher);
            let term = term.to_string();
            async move { searcher.lookup(&term, indexer).await }
        });

        if let Some(previous) = self.in_flight.lock().await.replace(task.abort_handle()) {
            debug!("Aborting previous show lookup");
            previous.abort();
        }

        match task.await {
            Ok(results) => results.map(Some),
            Err(e) if e.is_cancelled() => {
                debug!(term = %term, "Show lookup was replaced by a newer one");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::time::sleep;

    struct SlowSearcher;

    #[async_trait]
    impl ShowSearcher for SlowSearcher {
        async fn lookup(&self, term: &str, _indexer: Option<i64>) -> Result<Vec<ShowLookupResult>> {
            // Shorter terms take longer, like an indexer chewing on a vague query
            sleep(Duration::from_secs(10 / term.len() as u64)).await;
            Ok(vec![ShowLookupResult {
                indexer_name: "tvdb".to_string(),
                indexer_id: 1,
                show_url: String::new(),
                series_id: term.len() as i64,
                title: term.to_string(),
                premiered: None,
                network: None,
            }])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn newer_lookup_aborts_older_one() {
        let lookup = Arc::new(ShowLookup::new(Arc::new(SlowSearcher)));

        let first = tokio::spawn({
            let lookup = Arc::clone(&lookup);
            async move { lookup.search("b", None).await }
        });
        sleep(Duration::from_millis(1)).await;

        let second = lookup.search("breaking bad", None).await.unwrap().unwrap();
        assert_eq!(second[0].title, "breaking bad");
        assert!(first.await.unwrap().unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn lone_lookup_returns_results() {
        let lookup = ShowLookup::new(Arc::new(SlowSearcher));
        let results = lookup.search("lost", None).await.unwrap().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].series_id, 4);
    }
}

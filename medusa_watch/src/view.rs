//! View model for episode rows
//!
//! Every page that shows manual search state renders into an [EpisodeBoard]: a map from the
//! composite episode key to what the row currently shows. The poller and the search actions
//! only ever talk to the board, and the board only touches rows that are bound to it.
use medusa_api::models::{EpisodeKey, SearchJob, SearchResult, SearchStatus};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    sync::Arc,
    time::Duration,
};
use tokio::{
    sync::{Mutex, watch},
    task::JoinHandle,
    time::{Instant, interval},
};
use tracing::{debug, info, trace};

pub type SharedBoard = Arc<Mutex<EpisodeBoard>>;

/// Which icon a row shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Indicator {
    /// Nothing happening, the row offers a search
    #[default]
    Idle,
    Loading,
    Queued,
    /// Finished and snatched
    Success,
    /// Finished without a snatch, the row offers another try
    Retry,
    /// The search could not be submitted
    Failed,
}

/// Asset paths for each indicator, so every skin shares one view model
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Theme {
    pub idle: String,
    pub loading: String,
    pub queued: String,
    pub success: String,
    pub retry: String,
    pub failed: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            idle: "images/search16.png".to_string(),
            loading: "images/loading16.gif".to_string(),
            queued: "images/queued.png".to_string(),
            success: "images/yes16.png".to_string(),
            retry: "images/no16.png".to_string(),
            failed: "images/no16.png".to_string(),
        }
    }
}

impl Theme {
    pub fn asset(&self, indicator: Indicator) -> &str {
        match indicator {
            Indicator::Idle => &self.idle,
            Indicator::Loading => &self.loading,
            Indicator::Queued => &self.queued,
            Indicator::Success => &self.success,
            Indicator::Retry => &self.retry,
            Indicator::Failed => &self.failed,
        }
    }
}

/// Rendered state of one episode row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeRow {
    pub indicator: Indicator,
    /// Tooltip on the indicator
    pub title: String,
    /// Whether clicking the indicator submits a search
    pub click_enabled: bool,
    pub status: Option<String>,
    pub quality: Option<String>,
    /// Set once the row is due to disappear
    pub remove_at: Option<Instant>,
}

impl Default for EpisodeRow {
    fn default() -> Self {
        Self {
            indicator: Indicator::Idle,
            title: "Manual search".to_string(),
            click_enabled: true,
            status: None,
            quality: None,
            remove_at: None,
        }
    }
}

impl EpisodeRow {
    /// Finished rows have a terminal icon and accept clicks again
    pub fn is_settled(&self) -> bool {
        self.click_enabled && matches!(self.indicator, Indicator::Success | Indicator::Retry)
    }
}

#[derive(Debug, Default)]
pub struct EpisodeBoard {
    theme: Theme,
    rows: BTreeMap<EpisodeKey, EpisodeRow>,
    /// When the server last reported each bound row
    last_reported: BTreeMap<EpisodeKey, Instant>,
    /// Rows that were taken off the page and must not come back, with their removal time
    removed: BTreeMap<EpisodeKey, Instant>,
    auto_bind: bool,
    snatched_row_removal: Option<Duration>,
}

impl EpisodeBoard {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            ..Default::default()
        }
    }

    /// Bind rows for every episode the server reports instead of only pre-bound ones
    pub fn set_auto_bind(&mut self, auto_bind: bool) {
        self.auto_bind = auto_bind;
    }

    /// Remove rows of snatched episodes after `delay` (backlog style pages)
    pub fn set_snatched_row_removal(&mut self, delay: Option<Duration>) {
        self.snatched_row_removal = delay;
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn bind(&mut self, key: EpisodeKey) {
        self.removed.remove(&key);
        self.rows.entry(key).or_default();
    }

    pub fn row(&self, key: &EpisodeKey) -> Option<&EpisodeRow> {
        self.rows.get(key)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&EpisodeKey, &EpisodeRow)> {
        self.rows.iter()
    }

    pub fn asset(&self, key: &EpisodeKey) -> Option<&str> {
        self.rows.get(key).map(|row| self.theme.asset(row.indicator))
    }

    fn bound_row(&mut self, key: &EpisodeKey) -> Option<&mut EpisodeRow> {
        if !self.rows.contains_key(key) {
            if !self.auto_bind || self.removed.contains_key(key) {
                return None;
            }
            self.rows.insert(key.clone(), EpisodeRow::default());
        }
        self.rows.get_mut(key)
    }

    /// Render one job snapshot. Returns true if the row changed.
    ///
    /// Applying the same snapshot again is a no-op, including an already scheduled removal.
    pub fn apply(&mut self, job: &SearchJob) -> bool {
        if let SearchStatus::Unknown(raw) = &job.search_status {
            debug!(status = %raw, "Ignoring unknown search status");
            return false;
        }

        let key = job.key();
        let removal = self.snatched_row_removal;
        if self.bound_row(&key).is_none() {
            trace!(episode = %key, "No row bound for episode");
            return false;
        }
        self.last_reported.insert(key.clone(), Instant::now());
        let Some(row) = self.rows.get_mut(&key) else {
            return false;
        };

        let mut next = row.clone();
        if !job.episode_status.is_empty() {
            next.status = Some(job.episode_status.clone());
        }
        if !job.quality.is_empty() {
            next.quality = Some(job.quality.clone());
        }

        match job.search_status {
            SearchStatus::Searching => {
                next.indicator = Indicator::Loading;
                next.title = "Searching".to_string();
                next.click_enabled = false;
                next.remove_at = None;
            }
            SearchStatus::Queued => {
                next.indicator = Indicator::Queued;
                next.title = "Queued".to_string();
                next.click_enabled = false;
                next.remove_at = None;
            }
            SearchStatus::Finished if job.is_snatched() => {
                next.indicator = Indicator::Success;
                next.title = "Snatched".to_string();
                next.click_enabled = true;
                if let Some(delay) = removal
                    && next.remove_at.is_none()
                {
                    next.remove_at = Some(Instant::now() + delay);
                }
            }
            SearchStatus::Finished => {
                next.indicator = Indicator::Retry;
                next.title = "Search again".to_string();
                next.click_enabled = true;
                next.remove_at = None;
            }
            SearchStatus::Unknown(_) => return false,
        }

        if next == *row {
            return false;
        }

        *row = next.clone();
        info!(
            episode = %key,
            indicator = ?next.indicator,
            asset = self.theme.asset(next.indicator),
            status = next.status.as_deref().unwrap_or_default(),
            quality = next.quality.as_deref().unwrap_or_default(),
            "Episode search state changed"
        );
        true
    }

    /// A click on the row's indicator. Returns false if clicks are currently disabled.
    pub fn begin_search(&mut self, key: &EpisodeKey) -> bool {
        self.bind(key.clone());
        let Some(row) = self.rows.get_mut(key) else {
            return false;
        };
        if !row.click_enabled {
            return false;
        }
        row.indicator = Indicator::Loading;
        row.title = "Searching".to_string();
        row.click_enabled = false;
        row.remove_at = None;
        true
    }

    /// The server answered a search submission
    pub fn finish_submission(&mut self, key: &EpisodeKey, result: &SearchResult) {
        let Some(row) = self.rows.get_mut(key) else {
            return;
        };
        if let Some(quality) = result.quality.as_ref().filter(|q| !q.is_empty()) {
            row.quality = Some(quality.clone());
        }
        if result.is_success() {
            row.indicator = Indicator::Loading;
            row.title = "Searching".to_string();
            row.click_enabled = false;
        } else {
            row.indicator = Indicator::Failed;
            row.title = "Search failed".to_string();
            row.click_enabled = true;
        }
    }

    /// The search submission never reached the server
    pub fn fail_submission(&mut self, key: &EpisodeKey) {
        if let Some(row) = self.rows.get_mut(key) {
            row.indicator = Indicator::Failed;
            row.title = "Search failed".to_string();
            row.click_enabled = true;
        }
    }

    /// Drop rows whose removal deadline has passed
    pub fn sweep(&mut self, now: Instant) -> Vec<EpisodeKey> {
        let due: Vec<EpisodeKey> = self
            .rows
            .iter()
            .filter(|(_, row)| row.remove_at.is_some_and(|at| at <= now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &due {
            self.rows.remove(key);
            self.last_reported.remove(key);
            self.removed.insert(key.clone(), now);
            info!(episode = %key, "Removed snatched episode row");
        }
        due
    }

    /// Forget settled rows the server stopped reporting and removals older than `retention`
    ///
    /// Rows that were bound but never reported, and rows waiting for removal, are kept.
    pub fn prune(&mut self, now: Instant, retention: Duration) -> usize {
        let stale: Vec<EpisodeKey> = self
            .last_reported
            .iter()
            .filter(|(_, at)| now.saturating_duration_since(**at) >= retention)
            .map(|(key, _)| key.clone())
            .filter(|key| {
                self.rows
                    .get(key)
                    .is_none_or(|row| row.is_settled() && row.remove_at.is_none())
            })
            .collect();
        for key in &stale {
            self.rows.remove(key);
            self.last_reported.remove(key);
        }

        let before = self.removed.len();
        self.removed
            .retain(|_, at| now.saturating_duration_since(*at) < retention);

        let pruned = stale.len() + before - self.removed.len();
        if pruned > 0 {
            debug!(pruned, "Pruned settled episode rows");
        }
        pruned
    }
}

/// Periodically sweep removed rows off the board and prune stale ones until shutdown
pub fn spawn_row_sweeper(
    board: SharedBoard,
    period: Duration,
    retention: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        loop {
            tokio::select! {
                _ = crate::poller::stop_requested(&mut shutdown) => break,
                _ = ticker.tick() => {
                    let now = Instant::now();
                    let mut board = board.lock().await;
                    let removed = board.sweep(now);
                    if !removed.is_empty() {
                        debug!(count = removed.len(), "Swept episode rows");
                    }
                    board.prune(now, retention);
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(status: &str, episode_status: &str) -> SearchJob {
        SearchJob {
            indexer_name: "tvdb".to_string(),
            series_id: 42,
            season: 1,
            episode: 2,
            search_status: status.parse().unwrap(),
            episode_status: episode_status.to_string(),
            quality: "HDTV".to_string(),
        }
    }

    fn board() -> EpisodeBoard {
        let mut board = EpisodeBoard::new(Theme::default());
        board.set_auto_bind(true);
        board.set_snatched_row_removal(Some(Duration::from_millis(3000)));
        board
    }

    #[tokio::test(start_paused = true)]
    async fn searching_and_queued_disable_clicks() {
        let mut board = board();
        let searching = job("searching", "Wanted");
        assert!(board.apply(&searching));
        let row = board.row(&searching.key()).unwrap();
        assert_eq!(row.indicator, Indicator::Loading);
        assert!(!row.click_enabled);
        assert_eq!(row.status.as_deref(), Some("Wanted"));
        assert_eq!(board.asset(&searching.key()), Some("images/loading16.gif"));

        assert!(board.apply(&job("queued", "Wanted")));
        let row = board.row(&searching.key()).unwrap();
        assert_eq!(row.indicator, Indicator::Queued);
        assert!(!row.click_enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn snatched_finish_schedules_removal() {
        let mut board = board();
        let finished = job("finished", "Snatched (HDTV)");
        board.apply(&finished);

        let row = board.row(&finished.key()).unwrap();
        assert_eq!(row.indicator, Indicator::Success);
        assert_eq!(board.asset(&finished.key()), Some("images/yes16.png"));
        assert_eq!(
            row.remove_at,
            Some(Instant::now() + Duration::from_millis(3000))
        );

        assert!(board.sweep(Instant::now()).is_empty());
        tokio::time::advance(Duration::from_millis(3000)).await;
        assert_eq!(board.sweep(Instant::now()), vec![finished.key()]);
        assert!(board.row(&finished.key()).is_none());

        // The server keeps reporting finished jobs for a while, the row stays gone
        assert!(!board.apply(&finished));
        assert!(board.row(&finished.key()).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn new_search_cancels_pending_removal() {
        let mut board = board();
        let snatched = job("finished", "Snatched (HDTV)");
        board.apply(&snatched);

        tokio::time::advance(Duration::from_millis(1000)).await;
        board.apply(&job("searching", "Snatched (HDTV)"));
        let row = board.row(&snatched.key()).unwrap();
        assert_eq!(row.indicator, Indicator::Loading);
        assert_eq!(row.remove_at, None);

        tokio::time::advance(Duration::from_millis(2500)).await;
        assert!(board.sweep(Instant::now()).is_empty());
        assert!(board.apply(&job("queued", "Snatched (HDTV)")));
        assert_eq!(
            board.row(&snatched.key()).unwrap().indicator,
            Indicator::Queued
        );

        // A later snatch starts a fresh removal window
        board.apply(&snatched);
        assert_eq!(
            board.row(&snatched.key()).unwrap().remove_at,
            Some(Instant::now() + Duration::from_millis(3000))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn prune_forgets_rows_the_server_stopped_reporting() {
        let retention = Duration::from_secs(600);
        let mut board = board();
        let snatched = job("finished", "Snatched");
        let running = SearchJob {
            episode: 3,
            ..job("searching", "Wanted")
        };
        let skipped = SearchJob {
            episode: 4,
            ..job("finished", "Skipped")
        };
        let pinned = SearchJob {
            episode: 5,
            ..job("finished", "Skipped")
        };
        board.bind(pinned.key());
        for job in [&snatched, &running, &skipped] {
            board.apply(job);
        }

        tokio::time::advance(Duration::from_millis(3000)).await;
        assert_eq!(board.sweep(Instant::now()), vec![snatched.key()]);
        assert_eq!(board.prune(Instant::now(), retention), 0);

        tokio::time::advance(retention).await;
        // Settled and removed entries go, the running search and the never reported row stay
        assert_eq!(board.prune(Instant::now(), retention), 2);
        assert!(board.row(&skipped.key()).is_none());
        assert!(board.row(&running.key()).is_some());
        assert!(board.row(&pinned.key()).is_some());

        // Once forgotten, a snatched episode reported again gets a row back
        assert!(board.apply(&snatched));
        assert!(board.row(&snatched.key()).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn plain_finish_reenables_retry() {
        let mut board = board();
        board.apply(&job("searching", "Wanted"));
        let finished = job("finished", "Skipped");
        board.apply(&finished);

        let row = board.row(&finished.key()).unwrap();
        assert_eq!(row.indicator, Indicator::Retry);
        assert!(row.click_enabled);
        assert_eq!(row.remove_at, None);
        assert_eq!(board.asset(&finished.key()), Some("images/no16.png"));
    }

    #[tokio::test(start_paused = true)]
    async fn applying_twice_is_idempotent() {
        let mut board = board();
        let finished = job("finished", "Snatched");
        assert!(board.apply(&finished));
        let first = board.row(&finished.key()).unwrap().clone();

        tokio::time::advance(Duration::from_millis(1000)).await;
        assert!(!board.apply(&finished));
        assert_eq!(board.row(&finished.key()).unwrap(), &first);
        assert_eq!(board.rows().count(), 1);
    }

    #[test]
    fn unbound_and_unknown_rows_are_left_alone() {
        let mut board = EpisodeBoard::new(Theme::default());
        assert!(!board.apply(&job("searching", "Wanted")));
        assert_eq!(board.rows().count(), 0);

        let key = job("searching", "").key();
        board.bind(key.clone());
        assert!(!board.apply(&job("postponed", "Wanted")));
        assert_eq!(board.row(&key), Some(&EpisodeRow::default()));
    }

    #[test]
    fn clicks_follow_row_state() {
        let mut board = EpisodeBoard::new(Theme::default());
        let key = job("searching", "").key();

        assert!(board.begin_search(&key));
        assert!(!board.begin_search(&key));

        board.finish_submission(
            &key,
            &SearchResult {
                result: "failure".to_string(),
                quality: None,
            },
        );
        let row = board.row(&key).unwrap();
        assert_eq!(row.indicator, Indicator::Failed);
        assert!(row.click_enabled);

        assert!(board.begin_search(&key));
        board.finish_submission(
            &key,
            &SearchResult {
                result: "success".to_string(),
                quality: Some("1080p WEB-DL".to_string()),
            },
        );
        let row = board.row(&key).unwrap();
        assert_eq!(row.indicator, Indicator::Loading);
        assert_eq!(row.quality.as_deref(), Some("1080p WEB-DL"));
        assert!(!row.click_enabled);
    }
}

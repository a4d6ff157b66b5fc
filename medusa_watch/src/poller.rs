//! Manual search status poller
//!
//! One loop per scope: fetch the status, render it into the board, pick the next interval from
//! the outcome and sleep. The next request is only scheduled once the current one completed, so
//! a poller never has more than one request in flight, and a slow server stretches the cadence
//! instead of piling requests up.
use crate::{providers::StatusSource, view::SharedBoard};
use medusa_api::models::ShowScope;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{
    sync::{Mutex, watch},
    task::JoinHandle,
    time::{sleep, timeout},
};
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    /// Next interval when the server reported at least one job
    pub active_interval: Duration,
    /// Next interval when nothing is in flight
    pub idle_interval: Duration,
    /// Next interval after a failed request
    pub failure_backoff: Duration,
    /// Upper bound for a single status request
    pub request_timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            active_interval: Duration::from_millis(5000),
            idle_interval: Duration::from_millis(15000),
            failure_backoff: Duration::from_millis(30000),
            request_timeout: Duration::from_millis(15000),
        }
    }
}

/// Result of one poll cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Number of job entries in the response, before scope filtering
    Jobs(usize),
    Failed,
}

impl PollSettings {
    pub fn next_interval(&self, outcome: PollOutcome) -> Duration {
        match outcome {
            PollOutcome::Jobs(0) => self.idle_interval,
            PollOutcome::Jobs(_) => self.active_interval,
            PollOutcome::Failed => self.failure_backoff,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollState {
    /// Delay before the next poll, as chosen by the last cycle
    pub poll_interval: Duration,
    pub cycles: u64,
}

/// Resolves once `stop` carries `true` or its sender is gone
pub async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    let _ = stop.wait_for(|stopped| *stopped).await;
}

fn scope_label(scope: Option<&ShowScope>) -> String {
    scope.map_or_else(|| "all".to_string(), ToString::to_string)
}

/// A running poll loop. Dropping the handle also ends the loop.
#[derive(Debug)]
pub struct PollerHandle {
    stop: watch::Sender<bool>,
    state: watch::Receiver<PollState>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn state(&self) -> PollState {
        *self.state.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn stop(self) {
        let _ = self.stop.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Poll loop ended abnormally");
        }
    }
}

/// Starts and stops poll loops, at most one per scope
pub struct Poller {
    source: Arc<dyn StatusSource>,
    board: SharedBoard,
    settings: PollSettings,
    active: Mutex<HashMap<Option<ShowScope>, PollerHandle>>,
}

impl Poller {
    pub fn new(source: Arc<dyn StatusSource>, board: SharedBoard, settings: PollSettings) -> Self {
        Self {
            source,
            board,
            settings,
            active: Mutex::new(HashMap::new()),
        }
    }

    pub fn board(&self) -> &SharedBoard {
        &self.board
    }

    /// Start polling `scope` (all shows when `None`). Returns false if that scope is already polled.
    pub async fn start(&self, scope: Option<ShowScope>) -> bool {
        let mut active = self.active.lock().await;
        if let Some(handle) = active.get(&scope)
            && !handle.is_finished()
        {
            debug!(scope = %scope_label(scope.as_ref()), "Poller already running");
            return false;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(PollState::default());
        let task = tokio::spawn(run_poll_loop(
            Arc::clone(&self.source),
            Arc::clone(&self.board),
            self.settings.clone(),
            scope.clone(),
            state_tx,
            stop_rx,
        ));

        active.insert(
            scope,
            PollerHandle {
                stop: stop_tx,
                state: state_rx,
                task,
            },
        );
        true
    }

    /// Stop polling `scope`. Returns false if it wasn't being polled.
    pub async fn stop(&self, scope: Option<&ShowScope>) -> bool {
        let handle = self.active.lock().await.remove(&scope.cloned());
        match handle {
            Some(handle) => {
                handle.stop().await;
                true
            }
            None => false,
        }
    }

    pub async fn stop_all(&self) {
        let handles: Vec<_> = self.active.lock().await.drain().map(|(_, h)| h).collect();
        for handle in handles {
            handle.stop().await;
        }
    }

    pub async fn state(&self, scope: Option<&ShowScope>) -> Option<PollState> {
        self.active
            .lock()
            .await
            .get(&scope.cloned())
            .map(PollerHandle::state)
    }
}

async fn poll_once(
    source: &dyn StatusSource,
    board: &SharedBoard,
    scope: Option<&ShowScope>,
    request_timeout: Duration,
) -> PollOutcome {
    match timeout(request_timeout, source.fetch(scope)).await {
        Ok(Ok(jobs)) => {
            let mut board = board.lock().await;
            for job in jobs
                .iter()
                .filter(|job| scope.is_none_or(|s| s.matches(job)))
            {
                board.apply(job);
            }
            PollOutcome::Jobs(jobs.len())
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Manual search status request failed");
            PollOutcome::Failed
        }
        Err(_) => {
            warn!(
                timeout_ms = request_timeout.as_millis() as u64,
                "Manual search status request timed out"
            );
            PollOutcome::Failed
        }
    }
}

async fn run_poll_loop(
    source: Arc<dyn StatusSource>,
    board: SharedBoard,
    settings: PollSettings,
    scope: Option<ShowScope>,
    state: watch::Sender<PollState>,
    mut stop: watch::Receiver<bool>,
) {
    let label = scope_label(scope.as_ref());
    info!(scope = %label, "Starting manual search status poller");

    loop {
        let outcome = tokio::select! {
            biased;
            _ = stop_requested(&mut stop) => break,
            outcome = poll_once(source.as_ref(), &board, scope.as_ref(), settings.request_timeout) => outcome,
        };

        let interval = settings.next_interval(outcome);
        state.send_modify(|s| {
            s.poll_interval = interval;
            s.cycles += 1;
        });
        trace!(scope = %label, ?outcome, interval_ms = interval.as_millis() as u64, "Scheduled next poll");

        tokio::select! {
            biased;
            _ = stop_requested(&mut stop) => break,
            _ = sleep(interval) => {}
        }
    }

    info!(scope = %label, "Stopped manual search status poller");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{EpisodeBoard, Indicator, Theme};
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use medusa_api::models::{SearchJob, SearchStatus};
    use std::{
        collections::VecDeque,
        sync::{
            Mutex as StdMutex,
            atomic::{AtomicUsize, Ordering},
        },
    };
    use tokio::time::Instant;

    enum Scripted {
        Jobs(Vec<SearchJob>),
        Fail,
        Hang,
    }

    /// Status source that plays back a script and records when each request started
    struct ScriptedSource {
        script: StdMutex<VecDeque<Scripted>>,
        fallback: Vec<SearchJob>,
        latency: Duration,
        calls: StdMutex<Vec<Instant>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    struct InFlight<'a>(&'a AtomicUsize);

    impl Drop for InFlight<'_> {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl ScriptedSource {
        fn new(script: Vec<Scripted>) -> Self {
            Self {
                script: StdMutex::new(script.into()),
                fallback: vec![],
                latency: Duration::ZERO,
                calls: StdMutex::new(vec![]),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        fn gaps(&self) -> Vec<Duration> {
            let calls = self.calls.lock().unwrap();
            calls.windows(2).map(|w| w[1] - w[0]).collect()
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn fetch(&self, _scope: Option<&ShowScope>) -> Result<Vec<SearchJob>> {
            self.calls.lock().unwrap().push(Instant::now());
            let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);
            let _guard = InFlight(&self.in_flight);

            let next = self.script.lock().unwrap().pop_front();
            if !self.latency.is_zero() {
                sleep(self.latency).await;
            }
            match next {
                Some(Scripted::Jobs(jobs)) => Ok(jobs),
                Some(Scripted::Fail) => Err(anyhow!("connection refused")),
                Some(Scripted::Hang) => std::future::pending().await,
                None => Ok(self.fallback.clone()),
            }
        }
    }

    fn job(series_id: i64, status: SearchStatus) -> SearchJob {
        SearchJob {
            indexer_name: "tvdb".to_string(),
            series_id,
            season: 1,
            episode: 1,
            search_status: status,
            episode_status: "Wanted".to_string(),
            quality: "N/A".to_string(),
        }
    }

    fn poller(source: Arc<ScriptedSource>) -> Poller {
        let mut board = EpisodeBoard::new(Theme::default());
        board.set_auto_bind(true);
        Poller::new(
            source,
            Arc::new(Mutex::new(board)),
            PollSettings::default(),
        )
    }

    #[test]
    fn interval_follows_outcome() {
        let settings = PollSettings::default();
        assert_eq!(
            settings.next_interval(PollOutcome::Jobs(3)),
            Duration::from_millis(5000)
        );
        assert_eq!(
            settings.next_interval(PollOutcome::Jobs(0)),
            Duration::from_millis(15000)
        );
        assert_eq!(
            settings.next_interval(PollOutcome::Failed),
            Duration::from_millis(30000)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slow_responses_never_overlap() {
        let mut source = ScriptedSource::new(vec![]);
        source.fallback = vec![job(42, SearchStatus::Searching)];
        source.latency = Duration::from_secs(14);
        let source = Arc::new(source);
        let poller = poller(Arc::clone(&source));

        assert!(poller.start(None).await);
        sleep(Duration::from_secs(100)).await;
        poller.stop_all().await;

        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
        let gaps = source.gaps();
        assert!(gaps.len() >= 4, "{gaps:?}");
        assert!(gaps.iter().all(|gap| *gap == Duration::from_secs(19)), "{gaps:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn interval_tracks_each_outcome() {
        let source = Arc::new(ScriptedSource::new(vec![
            Scripted::Jobs(vec![job(42, SearchStatus::Queued)]),
            Scripted::Fail,
            Scripted::Jobs(vec![]),
            Scripted::Fail,
            Scripted::Fail,
            Scripted::Jobs(vec![job(42, SearchStatus::Searching)]),
        ]));
        let poller = poller(Arc::clone(&source));

        poller.start(None).await;
        sleep(Duration::from_secs(125)).await;
        poller.stop_all().await;

        let secs: Vec<u64> = source.gaps().iter().take(5).map(Duration::as_secs).collect();
        assert_eq!(secs, vec![5, 30, 15, 30, 30]);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_sets_backoff_in_state() {
        let source = Arc::new(ScriptedSource::new(vec![
            Scripted::Jobs(vec![job(42, SearchStatus::Searching)]),
            Scripted::Fail,
        ]));
        let poller = poller(Arc::clone(&source));

        poller.start(None).await;
        sleep(Duration::from_secs(1)).await;
        let state = poller.state(None).await.unwrap();
        assert_eq!(state.poll_interval, Duration::from_secs(5));
        assert_eq!(state.cycles, 1);

        sleep(Duration::from_secs(5)).await;
        let state = poller.state(None).await.unwrap();
        assert_eq!(state.poll_interval, Duration::from_secs(30));
        assert_eq!(state.cycles, 2);
        poller.stop_all().await;
    }

    #[tokio::test(start_paused = true)]
    async fn hung_request_times_out_into_backoff() {
        let source = Arc::new(ScriptedSource::new(vec![Scripted::Hang]));
        let poller = poller(Arc::clone(&source));

        poller.start(None).await;
        sleep(Duration::from_secs(50)).await;
        poller.stop_all().await;

        assert_eq!(source.gaps().first(), Some(&Duration::from_secs(45)));
        assert_eq!(source.in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_is_ignored() {
        let source = Arc::new(ScriptedSource::new(vec![]));
        let poller = poller(Arc::clone(&source));

        assert!(poller.start(None).await);
        assert!(!poller.start(None).await);
        sleep(Duration::from_secs(50)).await;

        // One loop at the idle cadence: t = 0, 15, 30, 45
        assert_eq!(source.call_count(), 4);
        poller.stop_all().await;
    }

    #[tokio::test(start_paused = true)]
    async fn scopes_have_independent_guards() {
        let source = Arc::new(ScriptedSource::new(vec![]));
        let poller = poller(Arc::clone(&source));
        let scope = ShowScope::new("tvdb", 42);

        assert!(poller.start(None).await);
        assert!(poller.start(Some(scope.clone())).await);
        assert!(!poller.start(Some(scope.clone())).await);

        assert!(poller.stop(Some(&scope)).await);
        assert!(!poller.stop(Some(&scope)).await);
        assert!(poller.state(None).await.is_some());
        poller.stop_all().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_the_loop() {
        let source = Arc::new(ScriptedSource::new(vec![]));
        let poller = poller(Arc::clone(&source));

        poller.start(None).await;
        sleep(Duration::from_secs(1)).await;
        assert!(poller.stop(None).await);
        sleep(Duration::from_secs(100)).await;
        assert_eq!(source.call_count(), 1);

        // A stopped scope can be started again
        assert!(poller.start(None).await);
        poller.stop_all().await;
    }

    #[tokio::test(start_paused = true)]
    async fn scoped_poller_ignores_other_shows() {
        let source = Arc::new(ScriptedSource::new(vec![Scripted::Jobs(vec![
            job(42, SearchStatus::Searching),
            job(7, SearchStatus::Searching),
        ])]));
        let poller = poller(Arc::clone(&source));
        let scope = ShowScope::new("tvdb", 42);

        poller.start(Some(scope.clone())).await;
        sleep(Duration::from_secs(1)).await;

        {
            let board = poller.board().lock().await;
            let rows: Vec<_> = board.rows().map(|(key, row)| (key.series_id, row.indicator)).collect();
            assert_eq!(rows, vec![(42, Indicator::Loading)]);
        }

        // Cadence still follows the whole response
        let state = poller.state(Some(&scope)).await.unwrap();
        assert_eq!(state.poll_interval, Duration::from_secs(5));
        poller.stop_all().await;
    }
}

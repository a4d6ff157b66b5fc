//! User-initiated search submissions
use crate::{
    notifications::NotificationSink,
    providers::SearchTrigger,
    user_facing_error,
    view::SharedBoard,
};
use anyhow::Result;
use medusa_api::{
    commands::EpisodeSearchCommand,
    models::{Notification, UiMessage},
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// What happened to a click on an episode's search indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// A search for this episode is already running, nothing was sent
    Ignored,
    /// The server queued the search; the poller takes it from here
    Accepted,
    /// The server answered but refused the search
    Refused,
}

pub struct SearchActions {
    trigger: Arc<dyn SearchTrigger>,
    board: SharedBoard,
    sink: Arc<dyn NotificationSink>,
}

impl SearchActions {
    pub fn new(
        trigger: Arc<dyn SearchTrigger>,
        board: SharedBoard,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            trigger,
            board,
            sink,
        }
    }

    /// Submit a search or retry for one episode, updating its row as the request progresses
    ///
    /// Transport errors are shown to the user as a toast and returned.
    pub async fn submit(&self, command: &EpisodeSearchCommand) -> Result<Submission> {
        let key = command.key();

        if !self.board.lock().await.begin_search(&key) {
            info!(episode = %key, "Search already running, ignoring click");
            return Ok(Submission::Ignored);
        }

        match self.trigger.trigger(command).await {
            Ok(result) => {
                self.board.lock().await.finish_submission(&key, &result);
                if result.is_success() {
                    info!(episode = %key, "Manual search queued");
                    Ok(Submission::Accepted)
                } else {
                    warn!(episode = %key, result = %result.result, "Server refused manual search");
                    Ok(Submission::Refused)
                }
            }
            Err(e) => {
                error!(episode = %key, error = %e, "Failed to submit manual search");
                self.board.lock().await.fail_submission(&key);
                self.sink.notify(UiMessage::Notification(Notification {
                    kind: "error".to_string(),
                    title: format!("Search for {key} failed"),
                    body: user_facing_error(&e).to_string(),
                    hash: None,
                }));
                Err(e)
            }
        }
    }
}

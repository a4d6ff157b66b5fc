//! UI notification socket (`/ws/ui`)
//!
//! The server pushes toasts over a WebSocket. We keep one connection open for the lifetime of
//! the process and reconnect with exponential backoff whenever it drops.
use crate::poller::stop_requested;
use anyhow::{Context, Result, bail};
use futures::StreamExt;
use medusa_api::models::{Notification, UiMessage};
use std::{
    collections::{HashSet, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::{net::TcpStream, sync::watch, time::sleep};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Message, client::IntoClientRequest, http::HeaderValue},
};
use tracing::{debug, info, warn};
use url::Url;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Build `<ws|wss>://host:port<webRoot>/ws/ui` from the web interface URL
///
/// `web_root` comes from the server configuration; when it is empty the path of `base_path` is used.
pub fn socket_url(base_path: &str, web_root: &str) -> Result<Url> {
    let mut url =
        Url::parse(base_path).with_context(|| format!("Invalid base URL: {base_path}"))?;

    let scheme = match url.scheme() {
        "https" => "wss",
        "http" => "ws",
        other => bail!("Unsupported scheme for the UI socket: {other}"),
    };
    url.set_scheme(scheme)
        .map_err(|_| anyhow::anyhow!("Could not switch {base_path} to {scheme}"))?;

    let root = if web_root.trim_matches('/').is_empty() {
        url.path().trim_end_matches('/').to_string()
    } else {
        format!("/{}", web_root.trim_matches('/'))
    };
    url.set_path(&format!("{root}/ws/ui"));
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(60000),
            multiplier: 2,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt number `attempt` (starting at 0)
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt);
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Where toasts end up
pub trait NotificationSink: Send + Sync {
    fn notify(&self, message: UiMessage);
}

/// How many notification hashes [LogSink] remembers by default
pub const SEEN_HASHES: usize = 1024;

#[derive(Debug, Default)]
struct SeenHashes {
    hashes: HashSet<String>,
    order: VecDeque<String>,
}

/// Writes toasts to the log, showing each notification hash once
///
/// Only the most recent hashes are remembered, the oldest one is forgotten first.
#[derive(Debug)]
pub struct LogSink {
    seen: Mutex<SeenHashes>,
    capacity: usize,
}

impl Default for LogSink {
    fn default() -> Self {
        Self::with_capacity(SEEN_HASHES)
    }
}

impl LogSink {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            seen: Mutex::new(SeenHashes::default()),
            capacity: capacity.max(1),
        }
    }

    /// True the first time a hash is seen
    fn first_sighting(&self, hash: &str) -> bool {
        let mut seen = self
            .seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !seen.hashes.insert(hash.to_string()) {
            return false;
        }
        seen.order.push_back(hash.to_string());
        if seen.order.len() > self.capacity
            && let Some(oldest) = seen.order.pop_front()
        {
            seen.hashes.remove(&oldest);
        }
        true
    }
}

impl NotificationSink for LogSink {
    fn notify(&self, message: UiMessage) {
        match message {
            UiMessage::Notification(Notification {
                kind,
                title,
                body,
                hash,
            }) => {
                if let Some(hash) = &hash
                    && !self.first_sighting(hash)
                {
                    debug!(hash = %hash, "Skipping repeated notification");
                    return;
                }
                match kind.as_str() {
                    "error" | "warning" => warn!(kind = %kind, title = %title, "{}", body),
                    _ => info!(kind = %kind, title = %title, "{}", body),
                }
            }
            UiMessage::Info(text) => info!("{}", text),
        }
    }
}

async fn connect(url: &Url, headers: &[(&'static str, String)]) -> Result<Socket> {
    let mut request = url.as_str().into_client_request()?;
    for (name, value) in headers {
        request
            .headers_mut()
            .insert(*name, HeaderValue::from_str(value)?);
    }
    let (socket, response) = connect_async(request).await?;
    debug!(status = %response.status(), "UI socket handshake complete");
    Ok(socket)
}

/// Hand every message to the sink until the connection ends, returning why it ended
async fn read_messages(socket: &mut Socket, sink: &dyn NotificationSink) -> String {
    while let Some(message) = socket.next().await {
        match message {
            Ok(Message::Text(text)) => sink.notify(UiMessage::parse(text.as_str())),
            Ok(Message::Binary(bytes)) => {
                sink.notify(UiMessage::Info(String::from_utf8_lossy(&bytes).into_owned()))
            }
            Ok(Message::Close(frame)) => return format!("closed by server: {frame:?}"),
            Ok(_) => {}
            Err(e) => return e.to_string(),
        }
    }
    "stream ended".to_string()
}

/// Keep the UI socket connected until shutdown, reconnecting with backoff
pub async fn run_notifications(
    url: Url,
    headers: Vec<(&'static str, String)>,
    sink: Arc<dyn NotificationSink>,
    policy: ReconnectPolicy,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut attempt = 0u32;

    loop {
        let connected = tokio::select! {
            biased;
            _ = stop_requested(&mut shutdown) => break,
            connected = connect(&url, &headers) => connected,
        };

        match connected {
            Ok(mut socket) => {
                info!(url = %url, "Connected to UI notification socket");
                attempt = 0;

                let stopping = tokio::select! {
                    biased;
                    _ = stop_requested(&mut shutdown) => true,
                    reason = read_messages(&mut socket, sink.as_ref()) => {
                        warn!(reason = %reason, "UI notification socket disconnected");
                        false
                    }
                };
                if stopping {
                    let _ = socket.close(None).await;
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, attempt, "Could not connect to UI notification socket");
            }
        }

        let delay = policy.delay(attempt);
        attempt = attempt.saturating_add(1);
        debug!(delay_ms = delay.as_millis() as u64, "Reconnecting to UI notification socket");

        tokio::select! {
            biased;
            _ = stop_requested(&mut shutdown) => break,
            _ = sleep(delay) => {}
        }
    }

    info!("UI notification socket closed");
}

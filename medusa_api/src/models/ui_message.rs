use serde::Deserialize;
use serde_json::Value;

/// A toast pushed by the server over `/ws/ui`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Notification {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub hash: Option<String>,
}

/// Anything received on the UI socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiMessage {
    Notification(Notification),
    /// Payloads we don't understand are shown as plain info messages
    Info(String),
}

#[derive(Deserialize)]
struct Envelope {
    event: Option<String>,
    data: Option<Value>,
}

impl UiMessage {
    pub fn parse(raw: &str) -> Self {
        let Ok(envelope) = serde_json::from_str::<Envelope>(raw) else {
            return Self::Info(raw.to_string());
        };

        if envelope.event.as_deref() == Some("notification")
            && let Some(data) = envelope.data
            && let Ok(notification) = serde_json::from_value::<Notification>(data)
        {
            Self::Notification(notification)
        } else {
            Self::Info(raw.to_string())
        }
    }
}

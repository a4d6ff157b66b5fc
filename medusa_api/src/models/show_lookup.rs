use serde::{Deserialize, Deserializer, de::Error as _};
use serde_json::Value;

/// Response of `addShows/searchIndexersForShowName`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ShowLookupResponse {
    #[serde(default)]
    pub results: Vec<ShowLookupResult>,
    #[serde(default)]
    pub langid: Option<i64>,
}

/// One indexer hit for a show name
///
/// The server sends these as positional arrays:
/// `[indexer_name, indexer_id, show_url, series_id, title, premiered, network, ...]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowLookupResult {
    pub indexer_name: String,
    pub indexer_id: i64,
    pub show_url: String,
    pub series_id: i64,
    pub title: String,
    pub premiered: Option<String>,
    pub network: Option<String>,
}

impl<'de> Deserialize<'de> for ShowLookupResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let row = Vec::<Value>::deserialize(deserializer)?;

        let text = |i: usize| match row.get(i) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        let number = |i: usize| match row.get(i) {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.parse().ok(),
            _ => None,
        };

        Ok(Self {
            indexer_name: text(0).ok_or_else(|| D::Error::custom("missing indexer name"))?,
            indexer_id: number(1).ok_or_else(|| D::Error::custom("missing indexer id"))?,
            show_url: text(2).unwrap_or_default(),
            series_id: number(3).ok_or_else(|| D::Error::custom("missing series id"))?,
            title: text(4).ok_or_else(|| D::Error::custom("missing title"))?,
            premiered: text(5),
            network: text(6),
        })
    }
}

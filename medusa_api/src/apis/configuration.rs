use reqwest::{RequestBuilder, header::USER_AGENT};
use url::Url;

/// Header Medusa reads the per-installation API key from
pub const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Debug, Clone)]
pub struct Configuration {
    /// Base URL of the web interface, including the web root (e.g. `http://host:8081/medusa`)
    pub base_path: String,
    pub user_agent: Option<String>,
    pub client: reqwest::Client,
    pub api_key: Option<ApiKey>,
    pub bearer_access_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiKey {
    pub prefix: Option<String>,
    pub key: String,
}

impl Configuration {
    pub fn new(base_path: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_path: base_path.into(),
            user_agent: Some(format!("medusa_api/{}", env!("CARGO_PKG_VERSION"))),
            client,
            api_key: None,
            bearer_access_token: None,
        }
    }

    /// Resolve a path relative to the base path, keeping the web root intact
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        let mut base = Url::parse(&self.base_path)?;
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(path.trim_start_matches('/'))
    }

    /// Authentication headers for this installation, shared by REST calls and the UI socket handshake
    pub fn auth_headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = Vec::new();
        if let Some(token) = &self.bearer_access_token {
            headers.push(("Authorization", format!("Bearer {token}")));
        }
        if let Some(key) = &self.api_key {
            let value = match &key.prefix {
                Some(prefix) => format!("{prefix} {}", key.key),
                None => key.key.clone(),
            };
            headers.push((API_KEY_HEADER, value));
        }
        headers
    }

    /// Start a GET request with the user agent and auth headers attached
    pub fn get(&self, url: Url) -> RequestBuilder {
        let mut req = self.client.get(url);
        if let Some(user_agent) = &self.user_agent {
            req = req.header(USER_AGENT, user_agent);
        }
        for (name, value) in self.auth_headers() {
            req = req.header(name, value);
        }
        req
    }
}

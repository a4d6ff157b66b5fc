use serde::de::DeserializeOwned;

pub mod config_api;
pub mod configuration;
pub mod search_api;
pub mod show_lookup_api;

/// Status and raw body of a non-2xx response
#[derive(Debug, Clone)]
pub struct ResponseContent {
    pub status: reqwest::StatusCode,
    pub content: String,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("error in reqwest: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("error in serde: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
    #[error("error in response: status code {}", .0.status)]
    ResponseError(ResponseContent),
}

impl Error {
    /// True when the request never produced a response in time
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Reqwest(e) if e.is_timeout())
    }
}

/// Reads the body of a response and decodes it as JSON, turning non-2xx statuses into
/// [Error::ResponseError] so callers can log the body the server sent back
pub(crate) async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    let content = resp.text().await?;

    if status.is_client_error() || status.is_server_error() {
        return Err(Error::ResponseError(ResponseContent { status, content }));
    }

    Ok(serde_json::from_str(&content)?)
}

/// Answer every request on a local port with the same response, returning a base path for it
#[cfg(test)]
pub(crate) async fn canned_server(status: u16, body: &'static str) -> String {
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let response = format!(
                "HTTP/1.1 {status} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });
    format!("http://{addr}/medusa")
}

/// Logging for errors coming back from the Medusa API client
use medusa_api::apis::Error as MedusaApiError;
use tracing::error;

/// Log the details of a failed API call, including the body the server sent back
pub fn log_api_error(err: &MedusaApiError, context: &str) {
    match err {
        _ if err.is_timeout() => {
            error!("{} - Request timed out: {}", context, err);
        }
        MedusaApiError::ResponseError(response) => {
            error!("{} - HTTP {}: {}", context, response.status, response.content);
        }
        MedusaApiError::Reqwest(e) => {
            error!("{} - Reqwest error: {}", context, e);
        }
        MedusaApiError::Serde(e) => {
            error!("{} - Deserialization error: {}", context, e);
        }
        MedusaApiError::Url(e) => {
            error!("{} - Invalid endpoint: {}", context, e);
        }
    }
}

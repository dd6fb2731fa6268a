//! Error taxonomy for weather lookups.

use thiserror::Error;

/// Failure of a single weather lookup. Always scoped to one request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// Rejected before any network call (missing place, bad coordinates).
    #[error("Invalid location: {0}")]
    Validation(String),

    /// Provider answered with a non-2xx status other than 429.
    #[error("Provider request failed with status {status}: {message}")]
    Provider { status: u16, message: String },

    /// Provider answered 429. Advisory, not a hard failure.
    #[error("Provider rate limit reached")]
    RateLimited { seconds_left: Option<u64> },

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// The provider answered 2xx but the body could not be decoded.
    #[error("Failed to decode provider response: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::RateLimited { .. })
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Validation(reason) => format!("Invalid location parameters: {reason}"),
            FetchError::Provider { status, .. } => {
                format!("Error fetching weather data (status {status})")
            }
            FetchError::RateLimited { seconds_left: Some(secs) } => {
                format!("Please wait {secs} seconds before making another request.")
            }
            FetchError::RateLimited { seconds_left: None } => {
                "Too many requests. Please try again later.".to_string()
            }
            FetchError::Network(_) => {
                "Could not reach the weather service. Please try again.".to_string()
            }
            FetchError::Decode(_) => "Received unexpected data from the weather service.".to_string(),
        }
    }
}

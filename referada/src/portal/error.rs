//! Error types for portal requests.

use thiserror::Error;

/// Errors that can occur while talking to the portal.
#[derive(Debug, Error)]
pub enum PortalError {
    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    ClientBuild(String),

    /// The request could not be sent or the response not read.
    #[error("request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    /// The portal answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// The response body is not valid JSON.
    #[error("failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let err = PortalError::Status {
            url: "https://portal/api".to_string(),
            status: 401,
        };
        assert_eq!(err.to_string(), "HTTP 401 from https://portal/api");
    }
}

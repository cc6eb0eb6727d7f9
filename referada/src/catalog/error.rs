//! Error types for catalog parsing.

use thiserror::Error;

/// Errors produced while turning the portal response into a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The response is missing an expected key or has an unexpected shape.
    #[error("malformed materials response: {0}")]
    MalformedResponse(String),
}

impl CatalogError {
    pub(crate) fn malformed(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

//! Reqwest-based portal client.

use futures::StreamExt;
use reqwest::header::COOKIE;
use reqwest::Client;
use serde_json::Value;

use super::error::PortalError;
use crate::fetch::{BoxFuture, ByteStream, FetchError, RemoteFiles};
use crate::session::SessionToken;

/// Root of the portal; file links in the catalog are relative to it.
pub const DEFAULT_BASE_URL: &str = "https://student.racunarstvo.hr/digitalnareferada/";

/// Portal-relative path of the materials listing.
pub const DEFAULT_MATERIALS_PATH: &str = "api/materijali";

/// Connection settings for the portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    pub base_url: String,
    pub materials_path: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            materials_path: DEFAULT_MATERIALS_PATH.to_string(),
        }
    }
}

/// HTTP client for the portal.
#[derive(Debug, Clone)]
pub struct PortalClient {
    client: Client,
    config: PortalConfig,
}

impl PortalClient {
    /// Create a client for the given portal.
    pub fn new(config: PortalConfig) -> Result<Self, PortalError> {
        let client = Client::builder()
            .user_agent(concat!("referada/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PortalError::ClientBuild(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Absolute URL for a portal-relative link.
    ///
    /// Links that are already absolute are returned unchanged.
    pub fn url_for(&self, link: &str) -> String {
        if link.starts_with("http://") || link.starts_with("https://") {
            return link.to_string();
        }
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            link.trim_start_matches('/')
        )
    }

    /// Fetch the raw materials response for the catalog parser.
    pub async fn fetch_materials(&self, session: &SessionToken) -> Result<Value, PortalError> {
        let url = self.url_for(&self.config.materials_path);
        tracing::debug!(url = %url, "Fetching materials listing");

        let response = self
            .client
            .get(&url)
            .header(COOKIE, session.cookie_header())
            .send()
            .await
            .map_err(|e| PortalError::Http {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PortalError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| PortalError::Http {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        serde_json::from_slice(&body).map_err(|e| PortalError::Decode {
            url,
            reason: e.to_string(),
        })
    }
}

impl RemoteFiles for PortalClient {
    fn open<'a>(
        &'a self,
        url: &'a str,
        session: &'a SessionToken,
    ) -> BoxFuture<'a, Result<ByteStream, FetchError>> {
        Box::pin(async move {
            let url = self.url_for(url);
            let response = self
                .client
                .get(&url)
                .header(COOKIE, session.cookie_header())
                .send()
                .await
                .map_err(|e| FetchError::Network {
                    url: url.clone(),
                    reason: e.to_string(),
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url,
                    status: status.as_u16(),
                });
            }

            let body = response.bytes_stream().map(move |chunk| {
                chunk.map_err(|e| FetchError::Network {
                    url: url.clone(),
                    reason: format!("read error: {}", e),
                })
            });
            Ok(Box::pin(body) as ByteStream)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PortalClient {
        PortalClient::new(PortalConfig::default()).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = PortalConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.materials_path, DEFAULT_MATERIALS_PATH);
    }

    #[test]
    fn test_url_for_relative_link() {
        assert_eq!(
            client().url_for("materijali/preuzmi/7"),
            "https://student.racunarstvo.hr/digitalnareferada/materijali/preuzmi/7"
        );
    }

    #[test]
    fn test_url_for_trims_duplicate_slashes() {
        let client = PortalClient::new(PortalConfig {
            base_url: "https://portal.example/".to_string(),
            materials_path: DEFAULT_MATERIALS_PATH.to_string(),
        })
        .unwrap();

        assert_eq!(client.url_for("/a/b"), "https://portal.example/a/b");
    }

    #[test]
    fn test_url_for_absolute_link() {
        assert_eq!(
            client().url_for("https://cdn.example/file.pdf"),
            "https://cdn.example/file.pdf"
        );
    }
}

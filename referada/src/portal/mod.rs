//! HTTP access to the student records portal.
//!
//! Every request is authenticated with the session cookie. The client
//! fetches the raw materials response for the catalog parser and implements
//! [`RemoteFiles`](crate::fetch::RemoteFiles) for the fetch orchestrator.

mod client;
mod error;

pub use client::{PortalClient, PortalConfig, DEFAULT_BASE_URL, DEFAULT_MATERIALS_PATH};
pub use error::PortalError;

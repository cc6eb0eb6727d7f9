//! Remote file source abstraction for testability.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;

use super::error::FetchError;
use crate::session::SessionToken;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Body of a remote file, delivered chunk by chunk.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, FetchError>> + Send>>;

/// Source of portal files.
///
/// `open` resolves once the response headers are in; the returned stream
/// then yields the body incrementally. Implementations must be shareable
/// across concurrently running fetch units.
pub trait RemoteFiles: Send + Sync {
    /// Start a GET of the portal-relative `url`, authenticated by `session`.
    fn open<'a>(
        &'a self,
        url: &'a str,
        session: &'a SessionToken,
    ) -> BoxFuture<'a, Result<ByteStream, FetchError>>;
}

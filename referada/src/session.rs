//! Portal session credentials.

use std::fmt;

/// Name of the cookie carrying the portal session.
pub const SESSION_COOKIE: &str = "PHPSESSID";

/// Opaque session token issued by the portal after login.
///
/// The token is never printed: `Debug` output is redacted so it cannot leak
/// into log files.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Value for the `Cookie` request header.
    pub fn cookie_header(&self) -> String {
        format!("{}={}", SESSION_COOKIE, self.0)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

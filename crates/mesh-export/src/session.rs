//! Credentials passed explicitly into resolver calls.

use std::fmt;

use crate::error::{Error, Result};

/// An authenticated session with the export service.
///
/// The credential is stored exactly as it will be sent in the
/// `Authorization` header, scheme included. Sign-in and token refresh are
/// handled by whoever constructs the session.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    authorization: String,
}

impl Session {
    /// Create a session from a credential that already carries its scheme
    /// (e.g. `Bearer eyJ...`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Precondition`] if the credential is missing either the
    /// scheme or the token part.
    pub fn new(credential: impl Into<String>) -> Result<Self> {
        let authorization = credential.into();
        let trimmed = authorization.trim();

        let has_scheme_and_token = trimmed
            .split_once(' ')
            .is_some_and(|(scheme, token)| !scheme.is_empty() && !token.trim().is_empty());

        if !has_scheme_and_token {
            return Err(Error::Precondition {
                context: "session credential",
                detail: "expected '<scheme> <token>'".to_string(),
            });
        }

        Ok(Self {
            authorization: trimmed.to_string(),
        })
    }

    /// Create a session from a raw bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Precondition`] if the token is empty.
    pub fn bearer(token: &str) -> Result<Self> {
        Self::new(format!("Bearer {}", token.trim()))
    }

    /// The value sent in the `Authorization` header.
    #[must_use]
    pub fn authorization(&self) -> &str {
        &self.authorization
    }

    /// The authentication scheme, e.g. `Bearer`.
    #[must_use]
    pub fn scheme(&self) -> &str {
        self.authorization
            .split_once(' ')
            .map_or("", |(scheme, _)| scheme)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("scheme", &self.scheme())
            .field("token", &"<redacted>")
            .finish()
    }
}

//! Waiting for an export to become available.
//!
//! The resolver reports "no export yet" as an absent result rather than an
//! error. The host polls on that signal at a fixed interval and gives up
//! after a bounded number of attempts; actual errors end the wait at once.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use mesh_export::TilesetLocator;

/// Default delay between listing requests.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default number of listing requests before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 12;

/// How often and how long to poll for an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between consecutive attempts.
    pub interval: Duration,
    /// Total number of attempts, at least one.
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Why no tileset could be obtained.
#[derive(Debug)]
pub enum WaitError {
    /// The resolver failed; not retried.
    Resolve(mesh_export::Error),
    /// Every attempt came back without an export.
    NotReady {
        /// Number of attempts made.
        attempts: u32,
    },
}

impl fmt::Display for WaitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitError::Resolve(e) => write!(f, "could not resolve tileset: {e}"),
            WaitError::NotReady { attempts } => write!(
                f,
                "could not get tileset URL: no export available after {attempts} attempt(s)"
            ),
        }
    }
}

impl std::error::Error for WaitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WaitError::Resolve(e) => Some(e),
            WaitError::NotReady { .. } => None,
        }
    }
}

/// Call `resolve` until it yields a locator, fails, or attempts run out.
pub async fn wait_for_tileset<F, Fut>(
    policy: PollPolicy,
    mut resolve: F,
) -> Result<TilesetLocator, WaitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = mesh_export::Result<Option<TilesetLocator>>>,
{
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        if let Some(locator) = resolve().await.map_err(WaitError::Resolve)? {
            return Ok(locator);
        }

        if attempt < max_attempts {
            tracing::info!(
                attempt,
                max_attempts,
                retry_in_secs = policy.interval.as_secs_f64(),
                "export not ready"
            );
            tokio::time::sleep(policy.interval).await;
        }
    }

    Err(WaitError::NotReady {
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_export::ExportListing;
    use std::cell::Cell;

    fn locator() -> TilesetLocator {
        let body = br#"{ "exports": [{ "_links": { "mesh": { "href": "https://h/x?sig=abc" } } }] }"#;
        ExportListing::from_slice("test", body)
            .unwrap()
            .locator()
            .unwrap()
            .unwrap()
    }

    fn immediate(max_attempts: u32) -> PollPolicy {
        PollPolicy {
            interval: Duration::ZERO,
            max_attempts,
        }
    }

    #[tokio::test]
    async fn test_polls_until_export_appears() {
        let calls = Cell::new(0);
        let result = wait_for_tileset(immediate(5), || {
            calls.set(calls.get() + 1);
            let ready = calls.get() >= 3;
            async move { Ok(ready.then(locator)) }
        })
        .await
        .unwrap();

        assert_eq!(result, locator());
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = Cell::new(0);
        let result = wait_for_tileset(immediate(4), || {
            calls.set(calls.get() + 1);
            async { Ok(None) }
        })
        .await;

        assert!(matches!(result, Err(WaitError::NotReady { attempts: 4 })));
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test]
    async fn test_errors_are_not_retried() {
        let calls = Cell::new(0);
        let result = wait_for_tileset(immediate(10), || {
            calls.set(calls.get() + 1);
            async {
                Err(mesh_export::Error::Resolution {
                    message: "not found".to_string(),
                })
            }
        })
        .await;

        let err = result.unwrap_err();
        assert!(matches!(err, WaitError::Resolve(_)));
        assert_eq!(err.to_string(), "could not resolve tileset: not found");
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let calls = Cell::new(0);
        let result = wait_for_tileset(immediate(0), || {
            calls.set(calls.get() + 1);
            async { Ok(None) }
        })
        .await;

        assert!(matches!(result, Err(WaitError::NotReady { attempts: 1 })));
        assert_eq!(calls.get(), 1);
    }
}

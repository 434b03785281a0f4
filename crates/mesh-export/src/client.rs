//! HTTP client for the mesh export service.
//!
//! This module provides the main `Client` type for listing a model's 3D Tiles
//! exports, deriving the tileset URL from the listing, and fetching the root
//! tileset manifest.

use reqwest::Url;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};

use crate::error::{Error, Result};
use crate::session::Session;
use crate::tileset::Tileset;
use crate::types::{ExportListing, ExportQuery, TilesetLocator};

/// Base URL for the export service.
const BASE_URL: &str = "https://api.bentley.com/";

/// Path of the export-listing endpoint, relative to the base URL.
const LISTING_PATH: &str = "mesh-export/";

/// Versioned media type the export service responds with.
const ACCEPT_MEDIA_TYPE: &str = "application/vnd.bentley.itwin-platform.v1+json";

/// Asks the service to return the full representation in the response body.
const PREFER_REPRESENTATION: &str = "return=representation";

/// HTTP client for resolving mesh exports.
///
/// Every call is independent: the client holds no per-model state and issues
/// exactly one request per call, without retrying. Polling for an export that
/// is not ready yet is up to the caller.
///
/// # Example
///
/// ```ignore
/// let client = Client::new();
/// let session = Session::new(credential)?;
/// if let Some(locator) = client.resolve_tileset(&session, model_id).await? {
///     renderer.load(locator.url());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Create a new client with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_http(reqwest::Client::new())
    }

    /// Create a new client with a custom HTTP client.
    #[must_use]
    pub fn with_http(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Set a custom base URL (e.g. a staging environment or a test server).
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = if base_url.ends_with('/') {
            base_url
        } else {
            format!("{base_url}/")
        };
        self
    }

    /// The base URL requests are made against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve the tileset URL of a model's most relevant 3D Tiles export.
    ///
    /// Returns `Ok(None)` if the model has no export yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Precondition`] for an empty model id,
    /// [`Error::Resolution`] if the service reports an error, and
    /// [`Error::Transport`] if the request fails or the body is unreadable.
    pub async fn resolve_tileset(
        &self,
        session: &Session,
        model_id: &str,
    ) -> Result<Option<TilesetLocator>> {
        let query = ExportQuery::new(model_id, session)?;
        self.resolve(&query).await
    }

    /// Resolve the tileset URL for a prepared query.
    ///
    /// # Errors
    ///
    /// See [`Client::resolve_tileset`].
    pub async fn resolve(&self, query: &ExportQuery) -> Result<Option<TilesetLocator>> {
        let listing = self.fetch_listing(query).await?;

        match listing.locator() {
            Ok(Some(locator)) => {
                tracing::info!(
                    model_id = %query.model_id,
                    tileset = %locator.redacted(),
                    "resolved tileset"
                );
                Ok(Some(locator))
            }
            Ok(None) => {
                tracing::warn!(model_id = %query.model_id, "no exports available yet");
                Ok(None)
            }
            Err(e) => {
                tracing::error!(model_id = %query.model_id, error = %e, "export resolution failed");
                Err(e)
            }
        }
    }

    /// Fetch the export listing for a query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the request fails, the body is not a
    /// listing, or the status is unsuccessful without an error body.
    pub async fn fetch_listing(&self, query: &ExportQuery) -> Result<ExportListing> {
        let url = self.listing_url(query)?;

        tracing::debug!(url = %url, model_id = %query.model_id, "fetching export listing");

        let response = self
            .http
            .get(url.clone())
            .header(AUTHORIZATION, query.session.authorization())
            .header(ACCEPT, ACCEPT_MEDIA_TYPE)
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", PREFER_REPRESENTATION)
            .send()
            .await
            .map_err(|e| Error::transport(url.as_str(), e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::transport(url.as_str(), e))?;

        let listing = ExportListing::from_slice(url.as_str(), &body).map_err(|e| {
            if status.is_success() {
                e
            } else {
                Error::transport(url.as_str(), format!("status {status}"))
            }
        })?;

        if !status.is_success() && listing.error.is_none() {
            return Err(Error::transport(url.as_str(), format!("status {status}")));
        }

        Ok(listing)
    }

    /// Fetch and parse the root `tileset.json` of a resolved export.
    ///
    /// The locator's signature is sent along with the request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the request fails, returns an
    /// unsuccessful status, or the body is not a tileset.
    pub async fn fetch_root_tileset(&self, locator: &TilesetLocator) -> Result<Tileset> {
        // The query carries the access signature; keep it out of errors.
        let redacted = locator.redacted();
        tracing::debug!(tileset = %redacted, "fetching root tileset");

        let response = self
            .http
            .get(locator.url().clone())
            .send()
            .await
            .map_err(|e| Error::transport(&redacted, e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::transport(&redacted, format!("status {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::transport(&redacted, e.without_url()))?;

        Tileset::from_slice(&redacted, &body)
    }

    /// Build the listing URL for a query.
    fn listing_url(&self, query: &ExportQuery) -> Result<Url> {
        let endpoint = format!("{}{LISTING_PATH}", self.base_url);
        let mut url = Url::parse(&endpoint).map_err(|e| Error::InvalidData {
            context: "base url",
            detail: format!("{endpoint}: {e}"),
        })?;
        url.query_pairs_mut().extend_pairs(query.query_pairs());
        Ok(url)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

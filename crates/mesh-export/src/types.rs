//! Request and response types for the mesh export service.
//!
//! The listing types mirror the JSON returned by the export-listing endpoint;
//! [`TilesetLocator`] is the value handed on to the tile-streaming renderer.

use std::fmt;

use reqwest::Url;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::session::Session;

/// File name of the root manifest of a 3D Tiles hierarchy.
pub const TILESET_FILE: &str = "tileset.json";

/// Export format filter sent with every listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportType {
    /// Cesium 3D Tiles.
    #[default]
    ThreeDTiles,
}

impl ExportType {
    /// The value used in the `exportType` query parameter.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExportType::ThreeDTiles => "3DTILES",
        }
    }
}

impl fmt::Display for ExportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for a single export-listing request.
#[derive(Debug, Clone)]
pub struct ExportQuery {
    /// Opaque model identifier.
    pub model_id: String,
    /// Session whose credential is sent as-is.
    pub session: Session,
    /// Export format filter.
    pub export_type: ExportType,
}

impl ExportQuery {
    /// Create a query for the 3D Tiles exports of a model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Precondition`] if `model_id` is empty or blank. The id
    /// is otherwise sent exactly as given.
    pub fn new(model_id: &str, session: &Session) -> Result<Self> {
        if model_id.trim().is_empty() {
            return Err(Error::Precondition {
                context: "export query",
                detail: "model id must not be empty".to_string(),
            });
        }

        Ok(Self {
            model_id: model_id.to_string(),
            session: session.clone(),
            export_type: ExportType::ThreeDTiles,
        })
    }

    /// Query string parameters for the listing endpoint.
    #[must_use]
    pub fn query_pairs(&self) -> [(&'static str, &str); 2] {
        [
            ("iModelId", self.model_id.as_str()),
            ("exportType", self.export_type.as_str()),
        ]
    }
}

/// Error body reported by the export service.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServiceError {
    /// Machine-readable error code, when provided.
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}

/// Response of the export-listing endpoint.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ExportListing {
    /// Set when the service rejected the request.
    #[serde(default)]
    pub error: Option<ServiceError>,
    /// Exports in server order, most relevant first.
    #[serde(default)]
    pub exports: Option<Vec<ExportRecord>>,
}

impl ExportListing {
    /// Parse a listing from a raw response body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the body is not a valid listing.
    pub fn from_slice(url: &str, body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| Error::transport(url, e))
    }

    /// The first export, without consuming the listing.
    #[must_use]
    pub fn first(&self) -> Option<&ExportRecord> {
        self.exports.as_deref().and_then(<[ExportRecord]>::first)
    }

    /// Derive the tileset locator from this listing.
    ///
    /// Returns `Ok(None)` when the listing has no exports yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolution`] if the listing carries an error, or
    /// [`Error::InvalidData`] if the first export's mesh href is not a URL.
    pub fn locator(&self) -> Result<Option<TilesetLocator>> {
        if let Some(error) = &self.error {
            return Err(Error::Resolution {
                message: error.message.clone(),
            });
        }

        self.first().map(TilesetLocator::from_record).transpose()
    }
}

/// A single export entry in a listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportRecord {
    /// Export identifier, when provided.
    #[serde(default)]
    pub id: Option<String>,
    /// Export job status, when provided.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "_links")]
    links: ExportLinks,
}

#[derive(Debug, Clone, Deserialize)]
struct ExportLinks {
    mesh: Link,
}

#[derive(Debug, Clone, Deserialize)]
struct Link {
    href: String,
}

impl ExportRecord {
    /// Location of the exported mesh resource.
    #[must_use]
    pub fn mesh_href(&self) -> &str {
        &self.links.mesh.href
    }
}

/// Fully-qualified URL of an export's `tileset.json`.
///
/// The query string of the mesh href is kept verbatim. It usually carries a
/// time-limited access signature that must accompany every request made
/// against the tileset; see [`TilesetLocator::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilesetLocator {
    url: Url,
}

impl TilesetLocator {
    /// Build a locator from an export record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] if the mesh href is not an absolute URL
    /// with a path.
    pub fn from_record(record: &ExportRecord) -> Result<Self> {
        let href = record.mesh_href();
        let mut url = Url::parse(href).map_err(|e| Error::InvalidData {
            context: "mesh href",
            detail: format!("{href}: {e}"),
        })?;

        if url.cannot_be_a_base() {
            return Err(Error::InvalidData {
                context: "mesh href",
                detail: format!("{href}: cannot append a path segment"),
            });
        }

        let path = format!("{}/{TILESET_FILE}", url.path());
        url.set_path(&path);

        Ok(Self { url })
    }

    /// The tileset URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The tileset URL as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// The inherited query string (without the leading `?`), if any.
    #[must_use]
    pub fn signature(&self) -> Option<&str> {
        self.url.query().filter(|q| !q.is_empty())
    }

    /// The tileset URL with its query removed, safe to log.
    #[must_use]
    pub fn redacted(&self) -> String {
        let mut url = self.url.clone();
        url.set_query(None);
        url.to_string()
    }

    /// Resolve a tile URI relative to this tileset.
    ///
    /// The locator's signature is attached to the result unless the URI
    /// already carries its own query string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] if the URI cannot be joined.
    pub fn resolve(&self, uri: &str) -> Result<Url> {
        let mut url = self.url.join(uri).map_err(|e| Error::InvalidData {
            context: "tile uri",
            detail: format!("{uri}: {e}"),
        })?;

        if url.query().is_none_or(str::is_empty) {
            url.set_query(self.signature());
        }

        Ok(url)
    }
}

impl fmt::Display for TilesetLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

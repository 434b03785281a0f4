//! Resolve and place cloud-hosted 3D Tiles mesh exports.
//!
//! This crate provides an async HTTP client that turns a model identifier and
//! a credential into the URL of the model's exported `tileset.json`, along
//! with the transform that moves an Earth-referenced tileset to the origin of
//! a y-up scene.
//!
//! # Design principles
//!
//! - **Runtime-agnostic**: Returns `impl Future`, works with any executor
//! - **No hidden retries**: One request per call; polling is the caller's job
//! - **Pure alignment**: The transform is a function of the bounding sphere
//!
//! # Example
//!
//! ```ignore
//! use mesh_export::{Client, RootAlignment, Session};
//!
//! let client = Client::new();
//! let session = Session::new(credential)?;
//!
//! let Some(locator) = client.resolve_tileset(&session, model_id).await? else {
//!     return Ok(()); // Export not ready yet.
//! };
//!
//! let tileset = client.fetch_root_tileset(&locator).await?;
//! let mut alignment = RootAlignment::new();
//! if let Some(result) = alignment.on_root_loaded(&tileset.root_bounding_sphere()?)? {
//!     group.rotation = result.rotation;
//!     group.translation.y = result.vertical_offset;
//! }
//! ```

pub mod align;
mod client;
mod error;
mod session;
pub mod tileset;
pub mod types;

pub use align::{AlignmentResult, BoundingSphere, RootAlignment, align_to_origin};
pub use client::Client;
pub use error::{Error, Result};
pub use session::Session;
pub use tileset::Tileset;
pub use types::{ExportListing, ExportQuery, ExportRecord, ExportType, TilesetLocator};

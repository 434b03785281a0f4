//! Root `tileset.json` parsing.
//!
//! Only what the host needs to place the mesh is read: the root tile's
//! bounding volume and optional transform. Child tiles and content are left
//! to the tile-streaming renderer.

use glam::{DMat4, DVec3};
use serde::Deserialize;

use crate::align::BoundingSphere;
use crate::error::{Error, Result};

/// A 3D Tiles tileset manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tileset {
    /// Asset metadata.
    #[serde(default)]
    pub asset: Option<Asset>,
    /// Geometric error of the whole tileset, in meters.
    #[serde(default)]
    pub geometric_error: f64,
    /// The root tile.
    pub root: Tile,
}

/// Tileset asset metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    /// 3D Tiles specification version, e.g. `1.0`.
    pub version: String,
}

/// A tile in the hierarchy.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    /// Volume enclosing this tile and all of its children.
    pub bounding_volume: BoundingVolume,
    /// Column-major 4x4 transform from tile space to the parent's space.
    #[serde(default)]
    pub transform: Option<[f64; 16]>,
}

/// A tile bounding volume; exactly one field is expected to be set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoundingVolume {
    /// Oriented box: center followed by the x, y and z half-axes.
    #[serde(default, rename = "box")]
    pub oriented_box: Option<[f64; 12]>,
    /// Sphere: center followed by radius.
    #[serde(default)]
    pub sphere: Option<[f64; 4]>,
    /// Geographic region: west, south, east, north, min height, max height.
    #[serde(default)]
    pub region: Option<[f64; 6]>,
}

impl BoundingVolume {
    /// The smallest sphere centered on this volume's center that encloses it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] for region volumes or when no volume is
    /// set.
    pub fn bounding_sphere(&self) -> Result<BoundingSphere> {
        if let Some(sphere) = self.sphere {
            return Ok(BoundingSphere::new(
                DVec3::new(sphere[0], sphere[1], sphere[2]),
                sphere[3],
            ));
        }

        if let Some(b) = self.oriented_box {
            let center = DVec3::new(b[0], b[1], b[2]);
            let half_axes = [
                DVec3::new(b[3], b[4], b[5]),
                DVec3::new(b[6], b[7], b[8]),
                DVec3::new(b[9], b[10], b[11]),
            ];
            return Ok(BoundingSphere::new(center, box_corner_distance(half_axes)));
        }

        if self.region.is_some() {
            return Err(Error::InvalidData {
                context: "bounding volume",
                detail: "region volumes are not supported".to_string(),
            });
        }

        Err(Error::InvalidData {
            context: "bounding volume",
            detail: "no box, sphere or region".to_string(),
        })
    }
}

/// Distance from a box's center to its farthest corner.
fn box_corner_distance(half_axes: [DVec3; 3]) -> f64 {
    let [x, y, z] = half_axes;
    [
        x + y + z,
        x + y - z,
        x - y + z,
        x - y - z,
    ]
    .iter()
    .map(|corner| corner.length())
    .fold(0.0, f64::max)
}

impl Tileset {
    /// Parse a tileset from a raw response body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the body is not a valid tileset.
    pub fn from_slice(url: &str, body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| Error::transport(url, e))
    }

    /// The root tile's bounding sphere in the tileset's frame.
    ///
    /// The root transform, when present, is applied to the center and its
    /// largest axis scale to the radius.
    ///
    /// # Errors
    ///
    /// See [`BoundingVolume::bounding_sphere`].
    pub fn root_bounding_sphere(&self) -> Result<BoundingSphere> {
        let sphere = self.root.bounding_volume.bounding_sphere()?;
        let Some(transform) = self.root.transform else {
            return Ok(sphere);
        };

        let matrix = DMat4::from_cols_array(&transform);
        let scale = matrix
            .x_axis
            .truncate()
            .length()
            .max(matrix.y_axis.truncate().length())
            .max(matrix.z_axis.truncate().length());

        Ok(BoundingSphere::new(
            matrix.transform_point3(sphere.center),
            sphere.radius * scale,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &serde_json::Value) -> Tileset {
        Tileset::from_slice("test", json.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn test_sphere_volume() {
        let tileset = parse(&serde_json::json!({
            "asset": { "version": "1.0" },
            "geometricError": 500.0,
            "root": { "boundingVolume": { "sphere": [1.0, 2.0, 3.0, 40.0] } }
        }));

        let sphere = tileset.root_bounding_sphere().unwrap();
        assert_eq!(sphere.center, DVec3::new(1.0, 2.0, 3.0));
        assert!((sphere.radius - 40.0).abs() < 1e-12);
        assert_eq!(tileset.asset.map(|a| a.version).as_deref(), Some("1.0"));
    }

    #[test]
    fn test_box_volume_encloses_corners() {
        let tileset = parse(&serde_json::json!({
            "root": { "boundingVolume": { "box": [
                10.0, 20.0, 30.0,
                3.0, 0.0, 0.0,
                0.0, 4.0, 0.0,
                0.0, 0.0, 12.0
            ] } }
        }));

        let sphere = tileset.root_bounding_sphere().unwrap();
        assert_eq!(sphere.center, DVec3::new(10.0, 20.0, 30.0));
        assert!((sphere.radius - 13.0).abs() < 1e-12);
    }

    #[test]
    fn test_root_transform_moves_center() {
        let earth_radius = 6_378_000.0;
        let mut transform = [0.0; 16];
        transform[0] = 1.0;
        transform[5] = 1.0;
        transform[10] = 1.0;
        transform[15] = 1.0;
        transform[12] = earth_radius;

        let tileset = parse(&serde_json::json!({
            "root": {
                "boundingVolume": { "sphere": [0.0, 0.0, 0.0, 25.0] },
                "transform": transform
            }
        }));

        let sphere = tileset.root_bounding_sphere().unwrap();
        assert!(sphere.center.abs_diff_eq(DVec3::new(earth_radius, 0.0, 0.0), 1e-9));
        assert!((sphere.radius - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_region_volume_is_unsupported() {
        let tileset = parse(&serde_json::json!({
            "root": { "boundingVolume": { "region": [-1.3, 0.6, -1.2, 0.7, 0.0, 100.0] } }
        }));
        assert!(matches!(
            tileset.root_bounding_sphere(),
            Err(Error::InvalidData { .. })
        ));
    }

    #[test]
    fn test_missing_root_is_transport_error() {
        let result = Tileset::from_slice("https://h/x/tileset.json", br#"{ "asset": {} }"#);
        assert!(matches!(result, Err(Error::Transport { .. })));
    }
}

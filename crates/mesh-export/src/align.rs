//! Placement of Earth-referenced meshes in a y-up scene.
//!
//! Exported tilesets are positioned in ECEF coordinates, thousands of
//! kilometres from the origin. [`align_to_origin`] computes the rigid
//! transform that rotates the local surface normal at the mesh onto the
//! scene's up axis and drops the mesh down onto the origin.

use std::f64::consts::PI;

use glam::{DMat4, DQuat, DVec3};

use crate::error::{Error, Result};

/// The scene's vertical axis.
pub const SCENE_UP: DVec3 = DVec3::Y;

/// Below this value of `1 + from·to` the half-angle construction degenerates.
const ANTIPARALLEL_EPSILON: f64 = 1e-12;

/// Bounding sphere of a loaded tileset, in ECEF.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// Sphere center; the planet's center is the origin.
    pub center: DVec3,
    /// Sphere radius in meters.
    pub radius: f64,
}

impl BoundingSphere {
    /// Create a bounding sphere.
    #[must_use]
    pub fn new(center: DVec3, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Compute the transform that brings this sphere's center to the origin.
    ///
    /// # Errors
    ///
    /// See [`align_to_origin`].
    pub fn align(&self) -> Result<AlignmentResult> {
        align_to_origin(self.center)
    }
}

/// Rotation and vertical offset to apply to a mesh group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentResult {
    /// Unit quaternion taking the local surface normal onto [`SCENE_UP`].
    pub rotation: DQuat,
    /// Translation along [`SCENE_UP`]; always `-‖center‖`.
    pub vertical_offset: f64,
}

impl AlignmentResult {
    /// Translation applied after the rotation.
    #[must_use]
    pub fn translation(&self) -> DVec3 {
        SCENE_UP * self.vertical_offset
    }

    /// Map an ECEF point into scene space.
    #[must_use]
    pub fn apply(&self, point: DVec3) -> DVec3 {
        self.rotation * point + self.translation()
    }

    /// The transform as an affine matrix (rotation first, then translation).
    #[must_use]
    pub fn to_matrix(&self) -> DMat4 {
        DMat4::from_rotation_translation(self.rotation, self.translation())
    }
}

/// Minimal rotation taking unit vector `from` onto unit vector `to`.
///
/// Uses the half-angle construction `q = (from × to, 1 + from·to)`. When the
/// vectors are opposite, that quaternion has zero length, so a half turn
/// about an axis perpendicular to `to` is returned instead.
#[must_use]
pub fn rotation_between_directions(from: DVec3, to: DVec3) -> DQuat {
    let w = 1.0 + from.dot(to);
    if w < ANTIPARALLEL_EPSILON {
        return DQuat::from_axis_angle(to.any_orthonormal_vector(), PI);
    }

    let axis = from.cross(to);
    DQuat::from_xyzw(axis.x, axis.y, axis.z, w).normalize()
}

/// Compute the transform placing `center` at the scene origin, facing up.
///
/// # Errors
///
/// Returns [`Error::Precondition`] if `center` is the zero vector, has a
/// non-finite component, or is too large for its length to be represented.
pub fn align_to_origin(center: DVec3) -> Result<AlignmentResult> {
    if !center.is_finite() {
        return Err(Error::Precondition {
            context: "alignment center",
            detail: format!("expected finite components, got {center}"),
        });
    }

    let distance = center.length();
    if distance <= 0.0 {
        return Err(Error::Precondition {
            context: "alignment center",
            detail: "the zero vector has no surface direction".to_string(),
        });
    }
    if !distance.is_finite() {
        return Err(Error::Precondition {
            context: "alignment center",
            detail: format!("distance to the planet's center overflows, got {center}"),
        });
    }

    let surface_direction = center / distance;
    Ok(AlignmentResult {
        rotation: rotation_between_directions(surface_direction, SCENE_UP),
        vertical_offset: -distance,
    })
}

/// Applies the alignment once, on the first root-tileset load notification.
///
/// Tile-streaming renderers report a root load more than once (e.g. after a
/// refresh); only the first report moves the mesh.
#[derive(Debug, Default)]
pub struct RootAlignment {
    applied: Option<AlignmentResult>,
}

impl RootAlignment {
    /// Create a latch that has not fired yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a root-tileset load notification.
    ///
    /// Returns the alignment to apply on the first call and `None` on every
    /// call after that.
    ///
    /// # Errors
    ///
    /// Propagates [`align_to_origin`] failures; the latch stays armed.
    pub fn on_root_loaded(&mut self, sphere: &BoundingSphere) -> Result<Option<AlignmentResult>> {
        if self.applied.is_some() {
            tracing::debug!("root tileset already aligned, ignoring load event");
            return Ok(None);
        }

        let result = sphere.align()?;
        tracing::debug!(
            vertical_offset = result.vertical_offset,
            radius = sphere.radius,
            "aligned root tileset"
        );
        self.applied = Some(result);
        Ok(Some(result))
    }

    /// The alignment that was applied, if the latch has fired.
    #[must_use]
    pub fn applied(&self) -> Option<&AlignmentResult> {
        self.applied.as_ref()
    }
}

/// Convert an ECEF position to latitude and longitude in degrees.
///
/// Uses a spherical Earth approximation.
#[must_use]
pub fn ecef_to_lat_lon(position: DVec3) -> (f64, f64) {
    let lat_rad = (position.z / position.length()).asin();
    let lon_rad = position.y.atan2(position.x);
    (lat_rad.to_degrees(), lon_rad.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EARTH_RADIUS: f64 = 6_378_000.0;

    #[test]
    fn test_center_on_up_axis_is_identity() {
        let result = align_to_origin(DVec3::new(0.0, EARTH_RADIUS, 0.0)).unwrap();
        assert!(result.rotation.abs_diff_eq(DQuat::IDENTITY, 1e-12));
        assert!((result.vertical_offset + EARTH_RADIUS).abs() < 1e-9);
    }

    #[test]
    fn test_center_on_x_axis_rotates_x_to_up() {
        let result = align_to_origin(DVec3::new(EARTH_RADIUS, 0.0, 0.0)).unwrap();
        assert!((result.rotation * DVec3::X).abs_diff_eq(DVec3::Y, 1e-12));
        assert!((result.vertical_offset + EARTH_RADIUS).abs() < 1e-9);
    }

    #[test]
    fn test_zero_center_is_precondition_error() {
        assert!(matches!(
            align_to_origin(DVec3::ZERO),
            Err(Error::Precondition { .. })
        ));
        assert!(align_to_origin(DVec3::new(f64::NAN, 0.0, 0.0)).is_err());
    }

    #[test]
    fn test_overflowing_center_is_not_reported_as_non_finite() {
        let center = DVec3::splat(1e200);
        assert!(center.is_finite());

        let err = align_to_origin(center).unwrap_err();
        assert!(matches!(err, Error::Precondition { .. }));
        assert!(err.to_string().contains("overflows"));
        assert!(!err.to_string().contains("finite"));
    }

    #[test]
    fn test_opposite_direction_uses_half_turn() {
        let rotation = rotation_between_directions(-SCENE_UP, SCENE_UP);
        assert!((rotation.length() - 1.0).abs() < 1e-12);
        assert!((rotation * -SCENE_UP).abs_diff_eq(SCENE_UP, 1e-12));

        let result = align_to_origin(DVec3::new(0.0, -EARTH_RADIUS, 0.0)).unwrap();
        assert!(result.apply(DVec3::new(0.0, -EARTH_RADIUS, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_apply_moves_center_to_origin() {
        // Roughly New York, in ECEF.
        let center = DVec3::new(1_329_866.230_289, -4_643_494.267_515, 4_154_677.131_562);
        let result = align_to_origin(center).unwrap();
        assert!(result.apply(center).length() < 1e-6);

        let matrix_mapped = result.to_matrix().transform_point3(center);
        assert!(matrix_mapped.length() < 1e-6);
    }

    #[test]
    fn test_points_above_center_map_to_up() {
        let center = DVec3::new(3_000_000.0, 2_000_000.0, -5_000_000.0);
        let result = align_to_origin(center).unwrap();
        let above = center + center.normalize() * 100.0;
        assert!(result.apply(above).abs_diff_eq(DVec3::new(0.0, 100.0, 0.0), 1e-6));
    }

    #[test]
    fn test_root_alignment_fires_once() {
        let mut latch = RootAlignment::new();
        let first = BoundingSphere::new(DVec3::new(EARTH_RADIUS, 0.0, 0.0), 50.0);
        let second = BoundingSphere::new(DVec3::new(0.0, 0.0, EARTH_RADIUS), 50.0);

        let applied = latch.on_root_loaded(&first).unwrap();
        assert!(applied.is_some());
        assert!(latch.on_root_loaded(&second).unwrap().is_none());
        assert_eq!(latch.applied(), applied.as_ref());
    }

    #[test]
    fn test_root_alignment_stays_armed_after_failure() {
        let mut latch = RootAlignment::new();
        let degenerate = BoundingSphere::new(DVec3::ZERO, 1.0);
        assert!(latch.on_root_loaded(&degenerate).is_err());
        assert!(latch.applied().is_none());

        let valid = BoundingSphere::new(DVec3::new(0.0, EARTH_RADIUS, 0.0), 1.0);
        assert!(latch.on_root_loaded(&valid).unwrap().is_some());
    }

    #[test]
    fn test_ecef_to_lat_lon() {
        let (lat, lon) = ecef_to_lat_lon(DVec3::new(EARTH_RADIUS, 0.0, 0.0));
        assert!(lat.abs() < 1e-9);
        assert!(lon.abs() < 1e-9);

        let (lat, _) = ecef_to_lat_lon(DVec3::new(0.0, 0.0, EARTH_RADIUS));
        assert!((lat - 90.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_rotation_maps_direction_onto_up(
            x in -1.0f64..1.0,
            y in -1.0f64..1.0,
            z in -1.0f64..1.0,
        ) {
            let direction = DVec3::new(x, y, z);
            prop_assume!(direction.length() > 1e-3);
            let direction = direction.normalize();

            let rotation = rotation_between_directions(direction, SCENE_UP);
            prop_assert!((rotation.length() - 1.0).abs() < 1e-9);
            prop_assert!((rotation * direction).distance(SCENE_UP) < 1e-6);
        }

        #[test]
        fn prop_vertical_offset_is_negative_distance(
            x in -1.0e7f64..1.0e7,
            y in -1.0e7f64..1.0e7,
            z in -1.0e7f64..1.0e7,
        ) {
            let center = DVec3::new(x, y, z);
            prop_assume!(center.length() > 1.0);

            let result = align_to_origin(center).unwrap();
            prop_assert!(result.vertical_offset <= 0.0);
            prop_assert!((result.vertical_offset + center.length()).abs() < 1e-6);
            prop_assert!(result.apply(center).length() < 1e-3);
        }
    }
}

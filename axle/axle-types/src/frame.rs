//! Reference frames for joints and bodies.
//!
//! A [`Frame`] is a rigid placement in 3D: a position plus a unit
//! quaternion. Joints use frames everywhere - the pin frame a joint is
//! created with, the local frames cached against each connected body, and
//! the global frames reconstructed from them every step.
//!
//! By convention the local X axis of a frame is the *primary axis*: the
//! rotation axis of a hinge, the travel axis of a slider, the tangent of a
//! path-following joint.

use nalgebra::{Isometry3, Matrix3, Point3, Rotation3, Unit, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A rigid placement: position plus orientation.
///
/// # Example
///
/// ```
/// use axle_types::Frame;
/// use nalgebra::{Point3, Vector3};
///
/// let frame = Frame::from_position(Point3::new(1.0, 0.0, 0.0));
/// let world = frame.transform_point(&Point3::new(0.0, 1.0, 0.0));
/// assert_eq!(world, Point3::new(1.0, 1.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Frame {
    /// Position of the frame origin.
    pub position: Point3<f64>,
    /// Orientation as a unit quaternion.
    pub rotation: UnitQuaternion<f64>,
}

impl Default for Frame {
    fn default() -> Self {
        Self::identity()
    }
}

impl Frame {
    /// The identity frame (origin, no rotation).
    #[must_use]
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a frame from a position with identity rotation.
    #[must_use]
    pub fn from_position(position: Point3<f64>) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a frame from position and rotation.
    #[must_use]
    pub const fn new(position: Point3<f64>, rotation: UnitQuaternion<f64>) -> Self {
        Self { position, rotation }
    }

    /// Create a frame whose primary (X) axis points along `axis`.
    ///
    /// The lateral and normal axes are completed by Gram-Schmidt against
    /// the world axis least aligned with `axis`, so the result is always
    /// a right-handed orthonormal basis. A zero `axis` yields the
    /// identity rotation.
    #[must_use]
    pub fn from_primary_axis(position: Point3<f64>, axis: Vector3<f64>) -> Self {
        let norm = axis.norm();
        if norm < 1e-12 {
            return Self::from_position(position);
        }
        let x = axis / norm;

        // Pick the world axis least aligned with x as the seed.
        let seed = if x.x.abs() < 0.577 {
            Vector3::x()
        } else if x.y.abs() < 0.577 {
            Vector3::y()
        } else {
            Vector3::z()
        };

        let z = x.cross(&seed).normalize();
        let y = z.cross(&x);

        let rot = Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[x, y, z]));
        Self {
            position,
            rotation: UnitQuaternion::from_rotation_matrix(&rot),
        }
    }

    /// Create a frame from an arbitrary 3x3 basis, stripping scale and shear.
    ///
    /// The basis columns are interpreted as the intended X/Y/Z axes;
    /// [`Rotation3::from_matrix`] finds the nearest proper rotation. Use
    /// this when accepting pin frames from callers that may hand over
    /// scaled transforms.
    #[must_use]
    pub fn from_matrix_lossy(position: Point3<f64>, basis: &Matrix3<f64>) -> Self {
        let rot = Rotation3::from_matrix(basis);
        Self {
            position,
            rotation: UnitQuaternion::from_rotation_matrix(&rot),
        }
    }

    /// Create a frame from an isometry.
    #[must_use]
    pub fn from_isometry(iso: Isometry3<f64>) -> Self {
        Self {
            position: Point3::from(iso.translation.vector),
            rotation: iso.rotation,
        }
    }

    /// Convert to an isometry.
    #[must_use]
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(self.position.coords.into(), self.rotation)
    }

    /// Re-normalize the rotation quaternion.
    ///
    /// Accumulated floating-point drift can denormalize a quaternion that
    /// is repeatedly composed; callers that store frames long-term pass
    /// them through here.
    #[must_use]
    pub fn orthonormalized(&self) -> Self {
        Self {
            position: self.position,
            rotation: UnitQuaternion::new_normalize(self.rotation.into_inner()),
        }
    }

    /// The primary (local X) axis in world coordinates.
    #[must_use]
    pub fn primary_axis(&self) -> Vector3<f64> {
        self.rotation * Vector3::x()
    }

    /// The lateral (local Y) axis in world coordinates.
    #[must_use]
    pub fn lateral_axis(&self) -> Vector3<f64> {
        self.rotation * Vector3::y()
    }

    /// The normal (local Z) axis in world coordinates.
    #[must_use]
    pub fn normal_axis(&self) -> Vector3<f64> {
        self.rotation * Vector3::z()
    }

    /// The primary axis as a [`Unit`] vector.
    #[must_use]
    pub fn primary_axis_unit(&self) -> Unit<Vector3<f64>> {
        Unit::new_unchecked(self.primary_axis())
    }

    /// Transform a point from frame-local to world coordinates.
    #[must_use]
    pub fn transform_point(&self, local: &Point3<f64>) -> Point3<f64> {
        self.position + self.rotation * local.coords
    }

    /// Rotate a vector from frame-local to world coordinates.
    #[must_use]
    pub fn transform_vector(&self, local: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * local
    }

    /// Transform a point from world to frame-local coordinates.
    #[must_use]
    pub fn inverse_transform_point(&self, world: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation.inverse() * (world - self.position))
    }

    /// Rotate a vector from world to frame-local coordinates.
    #[must_use]
    pub fn inverse_transform_vector(&self, world: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.inverse() * world
    }

    /// The inverse frame.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let inv_rotation = self.rotation.inverse();
        Self {
            position: Point3::from(-(inv_rotation * self.position.coords)),
            rotation: inv_rotation,
        }
    }

    /// Compose two frames: `self * other` (apply `other`, then `self`).
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            position: self.transform_point(&other.position),
            rotation: self.rotation * other.rotation,
        }
    }

    /// Express `self` relative to `reference`: `reference⁻¹ * self`.
    ///
    /// This is the operation that caches a joint's local frames at
    /// connect time: the global pin frame expressed in each body's frame.
    #[must_use]
    pub fn relative_to(&self, reference: &Self) -> Self {
        reference.inverse().compose(self)
    }

    /// Check for `NaN` or `Inf` components.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|x| x.is_finite())
            && self.rotation.coords.iter().all(|x| x.is_finite())
    }
}

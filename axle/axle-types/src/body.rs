//! Rigid-body kinematic state as seen from the joint boundary.
//!
//! Joints never own bodies; they read a body's [`BodyState`] and
//! [`MassProperties`] during row submission and append deferred forces.
//! These types are the read side of that boundary.

use nalgebra::{Matrix3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Frame;

/// Linear and angular velocity of a rigid body, world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Twist {
    /// Linear velocity (m/s).
    pub linear: Vector3<f64>,
    /// Angular velocity (rad/s).
    pub angular: Vector3<f64>,
}

impl Default for Twist {
    fn default() -> Self {
        Self::zero()
    }
}

impl Twist {
    /// Create a twist from linear and angular parts.
    #[must_use]
    pub const fn new(linear: Vector3<f64>, angular: Vector3<f64>) -> Self {
        Self { linear, angular }
    }

    /// A body at rest.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            linear: Vector3::zeros(),
            angular: Vector3::zeros(),
        }
    }

    /// Velocity of a point rigidly attached to the body.
    ///
    /// `offset` is the world-space vector from the body origin to the
    /// point: v = v_lin + ω × r.
    #[must_use]
    pub fn velocity_at_point(&self, offset: &Vector3<f64>) -> Vector3<f64> {
        self.linear + self.angular.cross(offset)
    }

    /// Check for `NaN` or `Inf` components.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.linear.iter().all(|x| x.is_finite()) && self.angular.iter().all(|x| x.is_finite())
    }
}

/// Frame plus twist: the complete kinematic state of a rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyState {
    /// Position and orientation.
    pub frame: Frame,
    /// Linear and angular velocity.
    pub twist: Twist,
}

impl BodyState {
    /// Create a state from frame and twist.
    #[must_use]
    pub const fn new(frame: Frame, twist: Twist) -> Self {
        Self { frame, twist }
    }

    /// A body at rest at the given frame.
    #[must_use]
    pub fn at_rest(frame: Frame) -> Self {
        Self {
            frame,
            twist: Twist::zero(),
        }
    }

    /// Check for `NaN` or `Inf` components.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.frame.is_finite() && self.twist.is_finite()
    }
}

/// Mass, center of mass and inertia of a rigid body.
///
/// Joints read these to scale friction bounds by the lighter connected
/// body and to let the solver compute per-row effective masses. A mass of
/// zero or infinity marks a static body.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MassProperties {
    /// Total mass (kg).
    pub mass: f64,
    /// Center of mass offset from the body origin, local coordinates.
    pub center_of_mass: Vector3<f64>,
    /// Inertia tensor about the center of mass, local coordinates (kg·m²).
    pub inertia: Matrix3<f64>,
}

impl MassProperties {
    /// Create mass properties with explicit values.
    #[must_use]
    pub const fn new(mass: f64, center_of_mass: Vector3<f64>, inertia: Matrix3<f64>) -> Self {
        Self {
            mass,
            center_of_mass,
            inertia,
        }
    }

    /// A point mass at the body origin (inertia from a small solid sphere
    /// so the tensor stays invertible).
    #[must_use]
    pub fn point_mass(mass: f64) -> Self {
        Self::sphere(mass, 0.1)
    }

    /// A uniform solid sphere: I = (2/5)·m·r².
    #[must_use]
    pub fn sphere(mass: f64, radius: f64) -> Self {
        let i = 0.4 * mass * radius * radius;
        Self {
            mass,
            center_of_mass: Vector3::zeros(),
            inertia: Matrix3::from_diagonal(&Vector3::new(i, i, i)),
        }
    }

    /// A uniform solid box with the given half extents.
    #[must_use]
    pub fn box_shape(mass: f64, half_extents: Vector3<f64>) -> Self {
        let x2 = 4.0 * half_extents.x * half_extents.x;
        let y2 = 4.0 * half_extents.y * half_extents.y;
        let z2 = 4.0 * half_extents.z * half_extents.z;

        Self {
            mass,
            center_of_mass: Vector3::zeros(),
            inertia: Matrix3::from_diagonal(&Vector3::new(
                mass * (y2 + z2) / 12.0,
                mass * (x2 + z2) / 12.0,
                mass * (x2 + y2) / 12.0,
            )),
        }
    }

    /// Mass properties of a static (immovable) body.
    #[must_use]
    pub fn fixed() -> Self {
        Self {
            mass: f64::INFINITY,
            center_of_mass: Vector3::zeros(),
            inertia: Matrix3::zeros(),
        }
    }

    /// Inverse mass; 0 for static bodies.
    #[must_use]
    pub fn inverse_mass(&self) -> f64 {
        if self.mass <= 0.0 || self.mass.is_infinite() {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    /// Inverse inertia tensor in local coordinates; zeros when singular
    /// or static.
    #[must_use]
    pub fn inverse_inertia(&self) -> Matrix3<f64> {
        if self.is_static() {
            return Matrix3::zeros();
        }
        self.inertia.try_inverse().unwrap_or_else(Matrix3::zeros)
    }

    /// Whether this body is immovable.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.mass <= 0.0 || self.mass.is_infinite()
    }
}

impl Default for MassProperties {
    fn default() -> Self {
        Self::point_mass(1.0)
    }
}

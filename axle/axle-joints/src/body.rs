//! Reference Body collaborator.
//!
//! Joints never write body state directly: during row submission they
//! read kinematics and may append to the body's deferred force/torque
//! accumulator, which the world applies exactly once per step. That
//! protocol is what makes multi-joint fan-in to a shared body safe.

use axle_types::{BodyState, Frame, MassProperties, Twist};
use nalgebra::{Matrix3, Point3, Vector3};

use crate::arena::Handle;

/// Handle to a body stored in a [`crate::JointWorld`].
pub type BodyId = Handle<Body>;

/// A rigid body as seen from the joint boundary.
#[derive(Debug, Clone)]
pub struct Body {
    name: Option<String>,
    state: BodyState,
    mass: MassProperties,
    is_static: bool,
    force_accum: Vector3<f64>,
    torque_accum: Vector3<f64>,
}

impl Body {
    /// Create a dynamic body.
    #[must_use]
    pub fn new(state: BodyState, mass: MassProperties) -> Self {
        Self {
            name: None,
            state,
            mass,
            is_static: false,
            force_accum: Vector3::zeros(),
            torque_accum: Vector3::zeros(),
        }
    }

    /// Create a static (immovable) body at the given frame.
    #[must_use]
    pub fn fixed(frame: Frame) -> Self {
        Self {
            name: None,
            state: BodyState::at_rest(frame),
            mass: MassProperties::fixed(),
            is_static: true,
            force_accum: Vector3::zeros(),
            torque_accum: Vector3::zeros(),
        }
    }

    /// Set a debug name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The debug name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Current kinematic state.
    #[must_use]
    pub fn state(&self) -> &BodyState {
        &self.state
    }

    /// Current frame.
    #[must_use]
    pub fn frame(&self) -> &Frame {
        &self.state.frame
    }

    /// Current twist.
    #[must_use]
    pub fn twist(&self) -> &Twist {
        &self.state.twist
    }

    /// Mass properties.
    #[must_use]
    pub fn mass_properties(&self) -> &MassProperties {
        &self.mass
    }

    /// Whether this body is immovable.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.is_static || self.mass.is_static()
    }

    /// Overwrite the kinematic state (host-engine feed-in).
    pub fn set_state(&mut self, state: BodyState) {
        self.state = state;
    }

    /// Center of mass in world coordinates.
    #[must_use]
    pub fn center_of_mass_world(&self) -> Point3<f64> {
        self.state
            .frame
            .transform_point(&Point3::from(self.mass.center_of_mass))
    }

    /// Inverse mass; 0 for static bodies.
    #[must_use]
    pub fn inverse_mass(&self) -> f64 {
        if self.is_static {
            0.0
        } else {
            self.mass.inverse_mass()
        }
    }

    /// Inverse inertia tensor in world coordinates: R·I⁻¹·Rᵀ.
    #[must_use]
    pub fn inverse_inertia_world(&self) -> Matrix3<f64> {
        if self.is_static() {
            return Matrix3::zeros();
        }
        let r = self.state.frame.rotation.to_rotation_matrix();
        r.matrix() * self.mass.inverse_inertia() * r.matrix().transpose()
    }

    /// Append a force (through the center of mass) to the deferred
    /// accumulator. Applied once at the next step, then cleared.
    pub fn apply_force(&mut self, force: Vector3<f64>) {
        if !self.is_static() {
            self.force_accum += force;
        }
    }

    /// Append a torque to the deferred accumulator.
    pub fn apply_torque(&mut self, torque: Vector3<f64>) {
        if !self.is_static() {
            self.torque_accum += torque;
        }
    }

    /// Append a force acting at a world-space point.
    pub fn apply_force_at_point(&mut self, force: Vector3<f64>, point: Point3<f64>) {
        if !self.is_static() {
            self.force_accum += force;
            self.torque_accum += (point - self.center_of_mass_world()).cross(&force);
        }
    }

    /// Drain the deferred accumulators (world-internal, once per step).
    pub(crate) fn take_accumulators(&mut self) -> (Vector3<f64>, Vector3<f64>) {
        let out = (self.force_accum, self.torque_accum);
        self.force_accum = Vector3::zeros();
        self.torque_accum = Vector3::zeros();
        out
    }

    pub(crate) fn state_mut(&mut self) -> &mut BodyState {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_deferred_accumulator() {
        let mut body = Body::new(BodyState::default(), MassProperties::sphere(2.0, 0.5));

        body.apply_force(Vector3::new(1.0, 0.0, 0.0));
        body.apply_force(Vector3::new(1.0, 0.0, 0.0));
        body.apply_torque(Vector3::new(0.0, 0.0, 3.0));

        let (f, t) = body.take_accumulators();
        assert_relative_eq!(f.x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(t.z, 3.0, epsilon = 1e-12);

        // Cleared after the drain.
        let (f, t) = body.take_accumulators();
        assert_relative_eq!(f.norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(t.norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_force_at_point_produces_torque() {
        let mut body = Body::new(BodyState::default(), MassProperties::sphere(1.0, 0.5));

        // Push +Y at a point one meter out on +X: torque about +Z.
        body.apply_force_at_point(Vector3::new(0.0, 1.0, 0.0), Point3::new(1.0, 0.0, 0.0));
        let (_, t) = body.take_accumulators();
        assert_relative_eq!(t.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_static_body_ignores_forces() {
        let mut body = Body::fixed(Frame::identity());
        body.apply_force(Vector3::new(100.0, 0.0, 0.0));

        let (f, _) = body.take_accumulators();
        assert_relative_eq!(f.norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(body.inverse_mass(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(body.inverse_inertia_world().norm(), 0.0, epsilon = 1e-12);
    }
}

//! Hinge joint: single-axis rotation.

use nalgebra::{Unit, Vector3};

use crate::angle::AngularIntegrator;

use super::limits::{LimitSide, Limits};
use super::{AxisTelemetry, DofKind, LimitDescriptor, SubmitContext};

pub(crate) use revolute::submit_revolute_locks;

/// Lock rows and axis measurement shared by the revolute family
/// (Hinge, Motor, Servo).
mod revolute {
    use super::{SubmitContext, Unit, Vector3};

    /// The free rotation axis after the lock rows are in place.
    pub(crate) struct RevoluteAxis {
        /// Parent-side primary axis, world coordinates (unit).
        pub axis: Unit<Vector3<f64>>,
        /// Relative angular velocity about the axis, child minus parent.
        pub omega: f64,
        /// Cosine of the instantaneous relative twist.
        pub cos: f64,
        /// Sine of the instantaneous relative twist.
        pub sin: f64,
    }

    /// Submit the five lock rows of a revolute joint (three linear, two
    /// angular) and measure the remaining free axis.
    pub(crate) fn submit_revolute_locks(ctx: &mut SubmitContext<'_>) -> RevoluteAxis {
        ctx.lock_linear_all();

        let front_child = ctx.frame_child.primary_axis();
        let front_parent = ctx.frame_parent.primary_axis();
        let up_parent = ctx.frame_parent.lateral_axis();
        let normal_parent = ctx.frame_parent.normal_axis();

        ctx.align_axes(Unit::new_unchecked(up_parent), &front_child, &front_parent);
        ctx.align_axes(
            Unit::new_unchecked(normal_parent),
            &front_child,
            &front_parent,
        );

        // Relative twist about the shared primary axis, measured by how
        // far the child's lateral axis has swung from the parent's.
        let up_child = ctx.frame_child.lateral_axis();
        let cos = up_parent.dot(&up_child);
        let sin = up_parent.cross(&up_child).dot(&front_parent);

        let axis = Unit::new_unchecked(front_parent);
        let omega = ctx.relative_angular_velocity().dot(&axis);

        RevoluteAxis {
            axis,
            omega,
            cos,
            sin,
        }
    }
}

/// A hinge: one free rotation with optional travel limits and dry
/// friction.
#[derive(Debug, Clone)]
pub struct Hinge {
    integrator: AngularIntegrator,
    telemetry: AxisTelemetry,
    limits: Limits,
    friction: f64,
}

impl Default for Hinge {
    fn default() -> Self {
        Self::new()
    }
}

impl Hinge {
    /// Create an unlimited, frictionless hinge.
    #[must_use]
    pub fn new() -> Self {
        Self {
            integrator: AngularIntegrator::new(),
            telemetry: AxisTelemetry::default(),
            limits: Limits::disabled(),
            friction: 0.0,
        }
    }

    /// Enable travel limits at construction.
    #[must_use]
    pub fn with_limits(mut self, min: f64, max: f64) -> Self {
        self.limits = Limits::new(min, max);
        self
    }

    /// Set dry friction at construction (clamped to ≥ 0).
    #[must_use]
    pub fn with_friction(mut self, friction: f64) -> Self {
        self.friction = friction.max(0.0);
        self
    }

    /// Continuous (unwrapped) hinge angle in radians.
    #[must_use]
    pub fn angle(&self) -> f64 {
        self.integrator.angle()
    }

    /// Position/velocity/acceleration telemetry of the free axis.
    #[must_use]
    pub fn telemetry(&self) -> &AxisTelemetry {
        &self.telemetry
    }

    /// The travel limits.
    #[must_use]
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Mutable access to the travel limits.
    pub fn limits_mut(&mut self) -> &mut Limits {
        &mut self.limits
    }

    /// Dry friction torque coefficient.
    #[must_use]
    pub fn friction(&self) -> f64 {
        self.friction
    }

    /// Set the dry friction coefficient (clamped to ≥ 0).
    pub fn set_friction(&mut self, friction: f64) {
        self.friction = friction.max(0.0);
    }

    pub(crate) fn reset_state(&mut self) {
        self.integrator = AngularIntegrator::new();
        self.telemetry.reset();
        self.limits.reset();
    }

    pub(crate) fn describe_limits(&self) -> Vec<LimitDescriptor> {
        if !self.limits.is_enabled() {
            return Vec::new();
        }
        vec![LimitDescriptor {
            kind: DofKind::Angular,
            axis: 0,
            min: self.limits.min(),
            max: self.limits.max(),
        }]
    }

    pub(crate) fn submit(&mut self, ctx: &mut SubmitContext<'_>) {
        let axis = submit_revolute_locks(ctx);
        let angle = self.integrator.update(axis.cos, axis.sin);
        self.telemetry.update(angle, ctx.dt);

        if let Some((side, violation)) = self.limits.assess(angle) {
            let push = match side {
                LimitSide::Upper => Unit::new_unchecked(-axis.axis.into_inner()),
                LimitSide::Lower => axis.axis,
            };
            ctx.stop_angular(push, violation);
        } else if self.friction > 0.0 {
            let bound = self.friction * ctx.lighter_mass();
            ctx.friction_angular(axis.axis, bound);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::joint::testing::{submit_once, submit_once_from};
    use crate::joint::JointKind;
    use approx::assert_relative_eq;
    use axle_types::{BodyState, Frame, MassProperties, Twist};
    use nalgebra::{Point3, UnitQuaternion};

    fn child_rotated_about_x(angle: f64) -> Body {
        Body::new(
            BodyState::at_rest(Frame::new(
                Point3::origin(),
                UnitQuaternion::from_axis_angle(&Vector3::x_axis(), angle),
            )),
            MassProperties::default(),
        )
    }

    #[test]
    fn test_unlimited_hinge_rows() {
        let mut kind = JointKind::Hinge(Hinge::new());
        let child = Body::new(BodyState::default(), MassProperties::default());

        // Five lock rows, no limit, no friction.
        let batch = submit_once(&mut kind, child, Frame::identity());
        assert_eq!(batch.len(), 5);
    }

    #[test]
    fn test_friction_adds_bounded_row() {
        let mut kind = JointKind::Hinge(Hinge::new().with_friction(2.5));
        let child = Body::new(BodyState::default(), MassProperties::default());

        let batch = submit_once(&mut kind, child, Frame::identity());
        assert_eq!(batch.len(), 6);

        let row = &batch.rows()[5];
        assert_relative_eq!(row.max_force, 2.5, epsilon = 1e-12);
        assert_relative_eq!(row.min_force, -2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_angle_is_zero_at_connect() {
        // Whatever pose the child connects at becomes angle zero; the
        // local frames absorb the offset.
        let mut kind = JointKind::Hinge(Hinge::new());
        let child = child_rotated_about_x(0.7);

        submit_once(&mut kind, child, Frame::identity());
        let angle = kind.as_hinge().map_or(f64::NAN, Hinge::angle);
        assert_relative_eq!(angle, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_limit_engagement_emits_stop_row() {
        // Connect at zero, then submit with the child swung 0.8 rad past
        // the 0.5 rad limit.
        let mut kind = JointKind::Hinge(Hinge::new().with_limits(-0.5, 0.5));
        let child = child_rotated_about_x(0.8);

        let batch = submit_once_from(&mut kind, Frame::identity(), child, Frame::identity());

        // Five locks plus the one-sided stop; the stop row cannot pull.
        assert_eq!(batch.len(), 6);
        let stop = &batch.rows()[5];
        assert_relative_eq!(stop.min_force, 0.0, epsilon = 1e-12);
        assert!(stop.max_force.is_infinite());
        assert_relative_eq!(stop.position_error, -0.3, epsilon = 1e-9);

        let angle = kind.as_hinge().map_or(f64::NAN, Hinge::angle);
        assert_relative_eq!(angle, 0.8, epsilon = 1e-9);
    }

    #[test]
    fn test_first_sample_only_primes_telemetry() {
        let mut kind = JointKind::Hinge(Hinge::new());
        let child = Body::new(
            BodyState::new(
                Frame::identity(),
                Twist::new(Vector3::zeros(), Vector3::new(2.0, 0.0, 0.0)),
            ),
            MassProperties::default(),
        );

        let _ = submit_once(&mut kind, child, Frame::identity());
        let telemetry = kind.as_hinge().map(Hinge::telemetry);
        assert_relative_eq!(
            telemetry.map_or(f64::NAN, AxisTelemetry::velocity),
            0.0,
            epsilon = 1e-12
        );
    }
}

//! Slider joint: single-axis translation.

use nalgebra::Unit;

use super::limits::{LimitSide, Limits};
use super::{AxisTelemetry, DofKind, LimitDescriptor, SubmitContext};

pub(crate) use prismatic::submit_prismatic_locks;

/// Lock rows and axis measurement shared by the prismatic family
/// (Slider, Piston).
mod prismatic {
    use nalgebra::{Unit, Vector3};

    use crate::joint::SubmitContext;

    /// The free translation axis after the lock rows are in place.
    pub(crate) struct PrismaticAxis {
        /// Parent-side primary axis, world coordinates (unit).
        pub axis: Unit<Vector3<f64>>,
        /// Travel of the child joint origin along the axis.
        pub position: f64,
        /// Relative speed along the axis, child minus parent.
        pub speed: f64,
    }

    /// Submit the five lock rows of a prismatic joint (two linear
    /// perpendicular to the axis, three angular) and measure the free
    /// axis.
    pub(crate) fn submit_prismatic_locks(ctx: &mut SubmitContext<'_>) -> PrismaticAxis {
        let front_child = ctx.frame_child.primary_axis();
        let front_parent = ctx.frame_parent.primary_axis();
        let up_parent = ctx.frame_parent.lateral_axis();
        let normal_parent = ctx.frame_parent.normal_axis();

        // Translation locked perpendicular to the travel axis only.
        ctx.lock_linear(Unit::new_unchecked(up_parent));
        ctx.lock_linear(Unit::new_unchecked(normal_parent));

        // All three rotations locked: two aligning the primary axes, one
        // removing twist.
        ctx.align_axes(Unit::new_unchecked(up_parent), &front_child, &front_parent);
        ctx.align_axes(
            Unit::new_unchecked(normal_parent),
            &front_child,
            &front_parent,
        );
        let up_child = ctx.frame_child.lateral_axis();
        ctx.align_axes(Unit::new_unchecked(front_parent), &up_child, &up_parent);

        let axis = Unit::new_unchecked(front_parent);
        let position = (ctx.frame_child.position - ctx.frame_parent.position).dot(&axis);
        let speed = ctx
            .relative_velocity_at(ctx.frame_child.position)
            .dot(&axis);

        PrismaticAxis {
            axis,
            position,
            speed,
        }
    }
}

/// A slider: one free translation with optional travel limits and dry
/// friction.
#[derive(Debug, Clone)]
pub struct Slider {
    telemetry: AxisTelemetry,
    limits: Limits,
    friction: f64,
}

impl Default for Slider {
    fn default() -> Self {
        Self::new()
    }
}

impl Slider {
    /// Create an unlimited, frictionless slider.
    #[must_use]
    pub fn new() -> Self {
        Self {
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

    /// Travel along the axis in meters.
    #[must_use]
    pub fn position(&self) -> f64 {
        self.telemetry.position()
    }

    /// Free-axis telemetry.
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

    /// Dry friction force coefficient.
    #[must_use]
    pub fn friction(&self) -> f64 {
        self.friction
    }

    /// Set the dry friction coefficient (clamped to ≥ 0).
    pub fn set_friction(&mut self, friction: f64) {
        self.friction = friction.max(0.0);
    }

    pub(crate) fn reset_state(&mut self) {
        self.telemetry.reset();
        self.limits.reset();
    }

    pub(crate) fn describe_limits(&self) -> Vec<LimitDescriptor> {
        if !self.limits.is_enabled() {
            return Vec::new();
        }
        vec![LimitDescriptor {
            kind: DofKind::Linear,
            axis: 0,
            min: self.limits.min(),
            max: self.limits.max(),
        }]
    }

    pub(crate) fn submit(&mut self, ctx: &mut SubmitContext<'_>) {
        let axis = submit_prismatic_locks(ctx);
        self.telemetry.update(axis.position, ctx.dt);

        if let Some((side, violation)) = self.limits.assess(axis.position) {
            let push = match side {
                LimitSide::Upper => Unit::new_unchecked(-axis.axis.into_inner()),
                LimitSide::Lower => axis.axis,
            };
            ctx.stop_linear(push, violation);
        } else if self.friction > 0.0 {
            let bound = self.friction * ctx.lighter_mass();
            ctx.friction_linear(axis.axis, bound);
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
    use axle_types::{BodyState, Frame, MassProperties};
    use nalgebra::Point3;

    #[test]
    fn test_lock_rows_leave_axis_free() {
        let mut kind = JointKind::Slider(Slider::new());
        let child = Body::new(BodyState::default(), MassProperties::default());

        let batch = submit_once(&mut kind, child, Frame::identity());
        assert_eq!(batch.len(), 5);
    }

    #[test]
    fn test_position_measured_along_axis() {
        // Connect at the origin, submit with the child slid 0.4 m along
        // the pin axis (world X by default).
        let mut kind = JointKind::Slider(Slider::new());
        let child = Body::new(
            BodyState::at_rest(Frame::from_position(Point3::new(0.4, 0.0, 0.0))),
            MassProperties::default(),
        );

        let _ = submit_once_from(&mut kind, Frame::identity(), child, Frame::identity());
        let position = kind.as_slider().map_or(f64::NAN, Slider::position);
        assert_relative_eq!(position, 0.4, epsilon = 1e-9);
    }

    #[test]
    fn test_limit_stop_row_is_one_sided() {
        let mut kind = JointKind::Slider(Slider::new().with_limits(-0.1, 0.1));
        let child = Body::new(
            BodyState::at_rest(Frame::from_position(Point3::new(0.3, 0.0, 0.0))),
            MassProperties::default(),
        );

        let batch = submit_once_from(&mut kind, Frame::identity(), child, Frame::identity());
        assert_eq!(batch.len(), 6);
        let stop = &batch.rows()[5];
        assert_relative_eq!(stop.min_force, 0.0, epsilon = 1e-12);
        assert_relative_eq!(stop.position_error, -0.2, epsilon = 1e-9);
    }
}

//! Corkscrew joint: translation and rotation about one shared axis.

use nalgebra::Unit;

use crate::angle::AngularIntegrator;

use super::limits::{LimitSide, Limits};
use super::{AxisTelemetry, DofKind, LimitDescriptor, SubmitContext};

/// Free translation plus free rotation about the pin axis, everything
/// else locked. Both free axes carry their own limits and friction.
#[derive(Debug, Clone)]
pub struct Corkscrew {
    integrator: AngularIntegrator,
    travel_telemetry: AxisTelemetry,
    angle_telemetry: AxisTelemetry,
    travel_limits: Limits,
    angle_limits: Limits,
    travel_friction: f64,
    angle_friction: f64,
}

impl Default for Corkscrew {
    fn default() -> Self {
        Self::new()
    }
}

impl Corkscrew {
    /// Create an unlimited, frictionless corkscrew.
    #[must_use]
    pub fn new() -> Self {
        Self {
            integrator: AngularIntegrator::new(),
            travel_telemetry: AxisTelemetry::default(),
            angle_telemetry: AxisTelemetry::default(),
            travel_limits: Limits::disabled(),
            angle_limits: Limits::disabled(),
            travel_friction: 0.0,
            angle_friction: 0.0,
        }
    }

    /// Enable travel limits at construction (meters).
    #[must_use]
    pub fn with_travel_limits(mut self, min: f64, max: f64) -> Self {
        self.travel_limits = Limits::new(min, max);
        self
    }

    /// Enable angle limits at construction (radians).
    #[must_use]
    pub fn with_angle_limits(mut self, min: f64, max: f64) -> Self {
        self.angle_limits = Limits::new(min, max);
        self
    }

    /// Set both friction coefficients at construction (clamped ≥ 0).
    #[must_use]
    pub fn with_friction(mut self, travel: f64, angle: f64) -> Self {
        self.travel_friction = travel.max(0.0);
        self.angle_friction = angle.max(0.0);
        self
    }

    /// Travel along the axis in meters.
    #[must_use]
    pub fn position(&self) -> f64 {
        self.travel_telemetry.position()
    }

    /// Continuous (unwrapped) angle about the axis in radians.
    #[must_use]
    pub fn angle(&self) -> f64 {
        self.integrator.angle()
    }

    /// Travel telemetry.
    #[must_use]
    pub fn travel_telemetry(&self) -> &AxisTelemetry {
        &self.travel_telemetry
    }

    /// Angle telemetry.
    #[must_use]
    pub fn angle_telemetry(&self) -> &AxisTelemetry {
        &self.angle_telemetry
    }

    /// Mutable access to the travel limits.
    pub fn travel_limits_mut(&mut self) -> &mut Limits {
        &mut self.travel_limits
    }

    /// Mutable access to the angle limits.
    pub fn angle_limits_mut(&mut self) -> &mut Limits {
        &mut self.angle_limits
    }

    pub(crate) fn reset_state(&mut self) {
        self.integrator = AngularIntegrator::new();
        self.travel_telemetry.reset();
        self.angle_telemetry.reset();
        self.travel_limits.reset();
        self.angle_limits.reset();
    }

    pub(crate) fn describe_limits(&self) -> Vec<LimitDescriptor> {
        let mut out = Vec::new();
        if self.travel_limits.is_enabled() {
            out.push(LimitDescriptor {
                kind: DofKind::Linear,
                axis: 0,
                min: self.travel_limits.min(),
                max: self.travel_limits.max(),
            });
        }
        if self.angle_limits.is_enabled() {
            out.push(LimitDescriptor {
                kind: DofKind::Angular,
                axis: 1,
                min: self.angle_limits.min(),
                max: self.angle_limits.max(),
            });
        }
        out
    }

    pub(crate) fn submit(&mut self, ctx: &mut SubmitContext<'_>) {
        let front_child = ctx.frame_child.primary_axis();
        let front_parent = ctx.frame_parent.primary_axis();
        let up_parent = ctx.frame_parent.lateral_axis();
        let normal_parent = ctx.frame_parent.normal_axis();

        // Lock the two lateral translations and the two swing rotations;
        // both the travel and the twist about the axis stay free.
        ctx.lock_linear(Unit::new_unchecked(up_parent));
        ctx.lock_linear(Unit::new_unchecked(normal_parent));
        ctx.align_axes(Unit::new_unchecked(up_parent), &front_child, &front_parent);
        ctx.align_axes(
            Unit::new_unchecked(normal_parent),
            &front_child,
            &front_parent,
        );

        let axis = Unit::new_unchecked(front_parent);
        let travel = (ctx.frame_child.position - ctx.frame_parent.position).dot(&axis);

        let up_child = ctx.frame_child.lateral_axis();
        let cos = up_parent.dot(&up_child);
        let sin = up_parent.cross(&up_child).dot(&front_parent);
        let angle = self.integrator.update(cos, sin);

        self.travel_telemetry.update(travel, ctx.dt);
        self.angle_telemetry.update(angle, ctx.dt);

        if let Some((side, violation)) = self.travel_limits.assess(travel) {
            let push = match side {
                LimitSide::Upper => Unit::new_unchecked(-axis.into_inner()),
                LimitSide::Lower => axis,
            };
            ctx.stop_linear(push, violation);
        } else if self.travel_friction > 0.0 {
            ctx.friction_linear(axis, self.travel_friction * ctx.lighter_mass());
        }

        if let Some((side, violation)) = self.angle_limits.assess(angle) {
            let push = match side {
                LimitSide::Upper => Unit::new_unchecked(-axis.into_inner()),
                LimitSide::Lower => axis,
            };
            ctx.stop_angular(push, violation);
        } else if self.angle_friction > 0.0 {
            ctx.friction_angular(axis, self.angle_friction * ctx.lighter_mass());
        }
    }
}

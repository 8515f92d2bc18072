//! Motor joint: speed-controlled hinge.

use nalgebra::Unit;

use crate::angle::AngularIntegrator;

use super::hinge::submit_revolute_locks;
use super::limits::{LimitSide, Limits};
use super::{AxisTelemetry, DofKind, LimitDescriptor, SubmitContext};

/// A hinge whose free axis chases a commanded speed.
///
/// The axis accelerates toward the target speed at most
/// `max_acceleration` per second, and the drive torque is bounded by
/// `power` scaled by the lighter connected body's mass. The continuous
/// angle keeps counting across revolutions, which is what makes
/// multi-turn telemetry and limits meaningful.
#[derive(Debug, Clone)]
pub struct Motor {
    integrator: AngularIntegrator,
    telemetry: AxisTelemetry,
    target_speed: f64,
    power: f64,
    max_acceleration: f64,
    limits: Limits,
}

impl Default for Motor {
    fn default() -> Self {
        Self::new()
    }
}

impl Motor {
    /// Create a stopped motor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            integrator: AngularIntegrator::new(),
            telemetry: AxisTelemetry::default(),
            target_speed: 0.0,
            power: 10.0,
            max_acceleration: 50.0,
            limits: Limits::disabled(),
        }
    }

    /// Set the commanded speed at construction (rad/s).
    #[must_use]
    pub fn with_target_speed(mut self, speed: f64) -> Self {
        self.target_speed = speed;
        self
    }

    /// Set the torque coefficient at construction (clamped to ≥ 0).
    #[must_use]
    pub fn with_power(mut self, power: f64) -> Self {
        self.power = power.max(0.0);
        self
    }

    /// Set the acceleration cap at construction (clamped to > 0).
    #[must_use]
    pub fn with_max_acceleration(mut self, accel: f64) -> Self {
        self.max_acceleration = accel.max(1e-6);
        self
    }

    /// Enable travel limits at construction.
    #[must_use]
    pub fn with_limits(mut self, min: f64, max: f64) -> Self {
        self.limits = Limits::new(min, max);
        self
    }

    /// The commanded speed (rad/s).
    #[must_use]
    pub fn target_speed(&self) -> f64 {
        self.target_speed
    }

    /// Set the commanded speed (rad/s).
    pub fn set_target_speed(&mut self, speed: f64) {
        self.target_speed = speed;
    }

    /// Torque coefficient, scaled by the lighter body's mass per step.
    #[must_use]
    pub fn power(&self) -> f64 {
        self.power
    }

    /// Set the torque coefficient (clamped to ≥ 0).
    pub fn set_power(&mut self, power: f64) {
        self.power = power.max(0.0);
    }

    /// Acceleration cap (rad/s²).
    #[must_use]
    pub fn max_acceleration(&self) -> f64 {
        self.max_acceleration
    }

    /// Set the acceleration cap (clamped to > 0).
    pub fn set_max_acceleration(&mut self, accel: f64) {
        self.max_acceleration = accel.max(1e-6);
    }

    /// Continuous (unwrapped) angle in radians.
    #[must_use]
    pub fn angle(&self) -> f64 {
        self.integrator.angle()
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
            return;
        }

        if ctx.dt <= 0.0 {
            return;
        }
        let accel = ((self.target_speed - axis.omega) / ctx.dt)
            .clamp(-self.max_acceleration, self.max_acceleration);
        let bound = self.power * ctx.lighter_mass();
        ctx.drive_angular(axis.axis, accel, bound);
    }
}

//! Piston joint: position-controlled slider.

use nalgebra::Unit;

use super::drive::Drive;
use super::limits::{LimitSide, Limits};
use super::slider::submit_prismatic_locks;
use super::{AxisTelemetry, DofKind, LimitDescriptor, SubmitContext};

/// A slider whose free axis ramps toward a commanded position.
#[derive(Debug, Clone)]
pub struct Piston {
    telemetry: AxisTelemetry,
    target_position: f64,
    drive: Drive,
    force: f64,
    limits: Limits,
}

impl Default for Piston {
    fn default() -> Self {
        Self::new()
    }
}

impl Piston {
    /// Create a piston holding position zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            telemetry: AxisTelemetry::default(),
            target_position: 0.0,
            drive: Drive::new(1.0, 0.1),
            force: 10.0,
            limits: Limits::disabled(),
        }
    }

    /// Set the ramp at construction.
    #[must_use]
    pub fn with_drive(mut self, drive: Drive) -> Self {
        self.drive = drive;
        self
    }

    /// Set the force coefficient at construction (clamped to ≥ 0).
    #[must_use]
    pub fn with_force(mut self, force: f64) -> Self {
        self.force = force.max(0.0);
        self
    }

    /// Enable travel limits at construction.
    #[must_use]
    pub fn with_limits(mut self, min: f64, max: f64) -> Self {
        self.limits = Limits::new(min, max);
        self
    }

    /// The commanded position (meters).
    #[must_use]
    pub fn target_position(&self) -> f64 {
        self.target_position
    }

    /// Command a new position.
    pub fn set_target_position(&mut self, position: f64) {
        self.target_position = position;
    }

    /// The setpoint ramp.
    #[must_use]
    pub fn drive(&self) -> &Drive {
        &self.drive
    }

    /// Mutable access to the setpoint ramp.
    pub fn drive_mut(&mut self) -> &mut Drive {
        &mut self.drive
    }

    /// Force coefficient, scaled by the lighter body's mass per step.
    #[must_use]
    pub fn force(&self) -> f64 {
        self.force
    }

    /// Set the force coefficient (clamped to ≥ 0).
    pub fn set_force(&mut self, force: f64) {
        self.force = force.max(0.0);
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
            return;
        }

        let error = self.target_position - axis.position;
        let accel = self.drive.target_acceleration(error, axis.speed, ctx.dt);
        let bound = self.force * ctx.lighter_mass();
        ctx.drive_linear(axis.axis, accel, bound);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::joint::testing::submit_once;
    use crate::joint::JointKind;
    use crate::row::RowResponse;
    use approx::assert_relative_eq;
    use axle_types::{BodyState, Frame, MassProperties};

    #[test]
    fn test_drive_row_present_inside_limits() {
        let mut kind = JointKind::Piston(Piston::new().with_limits(-1.0, 1.0));
        if let Some(piston) = kind.as_piston_mut() {
            piston.set_target_position(0.5);
        }
        let child = Body::new(BodyState::default(), MassProperties::default());

        let batch = submit_once(&mut kind, child, Frame::identity());
        assert_eq!(batch.len(), 6);
        assert!(matches!(
            batch.rows()[5].response,
            RowResponse::Acceleration(a) if a > 0.0
        ));
    }

    #[test]
    fn test_force_clamp() {
        let mut piston = Piston::new();
        piston.set_force(-2.0);
        assert_relative_eq!(piston.force(), 0.0, epsilon = 1e-12);
    }
}

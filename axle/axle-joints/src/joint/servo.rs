//! Servo joint: position-controlled hinge.

use nalgebra::Unit;

use crate::angle::AngularIntegrator;

use super::drive::Drive;
use super::hinge::submit_revolute_locks;
use super::limits::{LimitSide, Limits};
use super::{AxisTelemetry, DofKind, LimitDescriptor, SubmitContext};

/// A hinge whose free axis ramps toward a commanded angle.
///
/// The setpoint is approached with the shared rate-limited ramp. After a
/// setpoint jump the travel limits are temporarily suppressed until the
/// measured angle re-enters the limit range, so a target on the far side
/// of a limit does not wedge the axis against a stop row it is being
/// driven into.
#[derive(Debug, Clone)]
pub struct Servo {
    integrator: AngularIntegrator,
    telemetry: AxisTelemetry,
    target_angle: f64,
    start_angle: f64,
    drive: Drive,
    torque: f64,
    limits: Limits,
    limits_suppressed: bool,
}

impl Default for Servo {
    fn default() -> Self {
        Self::new()
    }
}

impl Servo {
    /// Create a servo holding angle zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            integrator: AngularIntegrator::new(),
            telemetry: AxisTelemetry::default(),
            target_angle: 0.0,
            start_angle: 0.0,
            drive: Drive::new(3.0, 0.1),
            torque: 10.0,
            limits: Limits::disabled(),
            limits_suppressed: false,
        }
    }

    /// Set the ramp at construction.
    #[must_use]
    pub fn with_drive(mut self, drive: Drive) -> Self {
        self.drive = drive;
        self
    }

    /// Set the torque coefficient at construction (clamped to ≥ 0).
    #[must_use]
    pub fn with_torque(mut self, torque: f64) -> Self {
        self.torque = torque.max(0.0);
        self
    }

    /// Enable travel limits at construction.
    #[must_use]
    pub fn with_limits(mut self, min: f64, max: f64) -> Self {
        self.limits = Limits::new(min, max);
        self
    }

    /// Bias the continuous angle, so the servo reports and regulates
    /// relative to a non-zero starting angle. The bias survives
    /// reconnects.
    #[must_use]
    pub fn with_start_angle(mut self, angle: f64) -> Self {
        self.start_angle = angle;
        self.integrator = AngularIntegrator::from_angle(angle);
        self
    }

    /// The start-angle bias.
    #[must_use]
    pub fn start_angle(&self) -> f64 {
        self.start_angle
    }

    /// The commanded angle (radians).
    #[must_use]
    pub fn target_angle(&self) -> f64 {
        self.target_angle
    }

    /// Command a new angle. Travel limits are suppressed until the
    /// measured angle is back inside their range.
    pub fn set_target_angle(&mut self, angle: f64) {
        self.target_angle = angle;
        if self.limits.is_enabled() {
            self.limits_suppressed = true;
        }
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

    /// Torque coefficient, scaled by the lighter body's mass per step.
    #[must_use]
    pub fn torque(&self) -> f64 {
        self.torque
    }

    /// Set the torque coefficient (clamped to ≥ 0).
    pub fn set_torque(&mut self, torque: f64) {
        self.torque = torque.max(0.0);
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

    /// Whether limits are currently suppressed after a setpoint jump.
    #[must_use]
    pub fn limits_suppressed(&self) -> bool {
        self.limits_suppressed
    }

    pub(crate) fn reset_state(&mut self) {
        self.integrator = AngularIntegrator::from_angle(self.start_angle);
        self.telemetry.reset();
        self.limits.reset();
        self.limits_suppressed = false;
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

        if self.limits_suppressed && self.limits.contains(angle) {
            self.limits_suppressed = false;
            self.limits.reset();
        }

        let engaged = if self.limits_suppressed {
            None
        } else {
            self.limits.assess(angle)
        };

        if let Some((side, violation)) = engaged {
            let push = match side {
                LimitSide::Upper => Unit::new_unchecked(-axis.axis.into_inner()),
                LimitSide::Lower => axis.axis,
            };
            ctx.stop_angular(push, violation);
            return;
        }

        let error = self.target_angle - angle;
        let accel = self.drive.target_acceleration(error, axis.omega, ctx.dt);
        let bound = self.torque * ctx.lighter_mass();
        ctx.drive_angular(axis.axis, accel, bound);
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
    use nalgebra::{Point3, UnitQuaternion, Vector3};

    #[test]
    fn test_setpoint_jump_suppresses_limits() {
        let mut servo = Servo::new().with_limits(-1.0, 1.0);
        assert!(!servo.limits_suppressed());

        servo.set_target_angle(2.0);
        assert!(servo.limits_suppressed());
    }

    #[test]
    fn test_suppression_clears_once_back_in_range() {
        let mut kind = JointKind::Servo({
            let mut servo = Servo::new().with_limits(-1.0, 1.0);
            servo.set_target_angle(0.5);
            servo
        });

        // Angle at connect is zero, which is inside the range, so the
        // flag clears on the first submission.
        let child = Body::new(BodyState::default(), MassProperties::default());
        let _ = submit_once(&mut kind, child, Frame::identity());

        assert!(!kind.as_servo().map_or(true, Servo::limits_suppressed));
    }

    #[test]
    fn test_suppressed_limits_emit_no_stop_row() {
        // Swung far outside the limit, but suppressed: the servo keeps
        // its drive row instead of a stop.
        let mut kind = JointKind::Servo({
            let mut servo = Servo::new().with_limits(-0.5, 0.5);
            servo.set_target_angle(2.0);
            servo
        });
        let child = Body::new(
            BodyState::at_rest(Frame::new(
                Point3::origin(),
                UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 1.0),
            )),
            MassProperties::default(),
        );

        let batch = submit_once_from(&mut kind, Frame::identity(), child, Frame::identity());
        assert_eq!(batch.len(), 6);
        // The last row is a bounded drive, not a one-sided stop.
        let row = &batch.rows()[5];
        assert!(row.min_force < 0.0);
        assert!(kind.as_servo().map_or(false, Servo::limits_suppressed));
    }

    #[test]
    fn test_start_angle_bias() {
        let servo = Servo::new().with_start_angle(6.0);
        assert_relative_eq!(servo.angle(), 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_start_angle_survives_connect() {
        // A bias of one full turn: the connect pose reads as 2π, not 0,
        // and regulation continues from there.
        let turn = 2.0 * std::f64::consts::PI;
        let mut kind = JointKind::Servo(Servo::new().with_start_angle(turn));
        let child = Body::new(BodyState::default(), MassProperties::default());

        let _ = submit_once(&mut kind, child, Frame::identity());
        let angle = kind.as_servo().map_or(f64::NAN, Servo::angle);
        assert_relative_eq!(angle, turn, epsilon = 1e-9);
    }
}

//! Ball-and-socket joint: three free rotations.

use nalgebra::Unit;

use crate::angle::AngularIntegrator;

use super::limits::Limits;
use super::{AxisTelemetry, DofKind, LimitDescriptor, SubmitContext};

/// A ball-and-socket: translation locked at the pivot, rotation free,
/// with an optional cone limit on the swing and dry friction on the
/// twist.
#[derive(Debug, Clone)]
pub struct BallAndSocket {
    twist_integrator: AngularIntegrator,
    cone_telemetry: AxisTelemetry,
    cone_limits: Limits,
    twist_friction: f64,
}

impl Default for BallAndSocket {
    fn default() -> Self {
        Self::new()
    }
}

impl BallAndSocket {
    /// Create an unconstrained ball-and-socket.
    #[must_use]
    pub fn new() -> Self {
        Self {
            twist_integrator: AngularIntegrator::new(),
            cone_telemetry: AxisTelemetry::default(),
            cone_limits: Limits::disabled(),
            twist_friction: 0.0,
        }
    }

    /// Enable a cone limit on the swing angle at construction.
    #[must_use]
    pub fn with_cone_limit(mut self, max_angle: f64) -> Self {
        self.cone_limits = Limits::new(0.0, max_angle.abs());
        self
    }

    /// Set twist friction at construction (clamped to ≥ 0).
    #[must_use]
    pub fn with_twist_friction(mut self, friction: f64) -> Self {
        self.twist_friction = friction.max(0.0);
        self
    }

    /// Enable or replace the cone limit.
    pub fn set_cone_limit(&mut self, max_angle: f64) {
        self.cone_limits = Limits::new(0.0, max_angle.abs());
    }

    /// Remove the cone limit.
    pub fn clear_cone_limit(&mut self) {
        self.cone_limits = Limits::disabled();
    }

    /// The cone limit bound, if enabled.
    #[must_use]
    pub fn cone_limit(&self) -> Option<f64> {
        self.cone_limits.is_enabled().then(|| self.cone_limits.max())
    }

    /// Swing angle between the primary axes, radians.
    #[must_use]
    pub fn cone_angle(&self) -> f64 {
        self.cone_telemetry.position()
    }

    /// Continuous twist angle about the primary axis, radians.
    #[must_use]
    pub fn twist_angle(&self) -> f64 {
        self.twist_integrator.angle()
    }

    /// Twist friction coefficient.
    #[must_use]
    pub fn twist_friction(&self) -> f64 {
        self.twist_friction
    }

    /// Set the twist friction coefficient (clamped to ≥ 0).
    pub fn set_twist_friction(&mut self, friction: f64) {
        self.twist_friction = friction.max(0.0);
    }

    pub(crate) fn reset_state(&mut self) {
        self.twist_integrator = AngularIntegrator::new();
        self.cone_telemetry.reset();
        self.cone_limits.reset();
    }

    pub(crate) fn describe_limits(&self) -> Vec<LimitDescriptor> {
        if !self.cone_limits.is_enabled() {
            return Vec::new();
        }
        vec![LimitDescriptor {
            kind: DofKind::Angular,
            axis: 0,
            min: 0.0,
            max: self.cone_limits.max(),
        }]
    }

    pub(crate) fn submit(&mut self, ctx: &mut SubmitContext<'_>) {
        ctx.lock_linear_all();

        let front_child = ctx.frame_child.primary_axis();
        let front_parent = ctx.frame_parent.primary_axis();

        // Swing: angle between the primary axes.
        let swing_sin_vec = front_child.cross(&front_parent);
        let swing_sin = swing_sin_vec.norm();
        let swing_cos = front_child.dot(&front_parent);
        let cone_angle = swing_sin.atan2(swing_cos);
        self.cone_telemetry.update(cone_angle, ctx.dt);

        // Twist about the primary axis, continuous across turns.
        let up_child = ctx.frame_child.lateral_axis();
        let up_parent = ctx.frame_parent.lateral_axis();
        let twist_cos = up_parent.dot(&up_child);
        let twist_sin = up_parent.cross(&up_child).dot(&front_parent);
        self.twist_integrator.update(twist_cos, twist_sin);

        if let Some((_, violation)) = self.cone_limits.assess(cone_angle) {
            // Rotating the child about front_child × front_parent swings
            // it back toward the parent axis. Skip when nearly aligned:
            // no usable correction axis, and no meaningful violation.
            if swing_sin > 1e-6 {
                let push = Unit::new_normalize(swing_sin_vec);
                ctx.stop_angular(push, violation);
            }
        }

        if self.twist_friction > 0.0 {
            let bound = self.twist_friction * ctx.lighter_mass();
            ctx.friction_angular(Unit::new_unchecked(front_child), bound);
        }
    }
}

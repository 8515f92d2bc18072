//! Universal joint: two perpendicular rotation axes.

use nalgebra::Unit;

use crate::angle::AngularIntegrator;

use super::limits::{LimitSide, Limits};
use super::{AxisTelemetry, DofKind, LimitDescriptor, SubmitContext};

/// A cardan-style joint: rotation free about the parent's lateral axis
/// and the child's primary axis, translation locked at the pivot, and a
/// single angular row keeping the two free axes perpendicular.
#[derive(Debug, Clone)]
pub struct Universal {
    swing_integrator: AngularIntegrator,
    twist_integrator: AngularIntegrator,
    swing_telemetry: AxisTelemetry,
    twist_telemetry: AxisTelemetry,
    swing_limits: Limits,
    twist_limits: Limits,
    swing_friction: f64,
    twist_friction: f64,
}

impl Default for Universal {
    fn default() -> Self {
        Self::new()
    }
}

impl Universal {
    /// Create an unlimited, frictionless universal joint.
    #[must_use]
    pub fn new() -> Self {
        Self {
            swing_integrator: AngularIntegrator::new(),
            twist_integrator: AngularIntegrator::new(),
            swing_telemetry: AxisTelemetry::default(),
            twist_telemetry: AxisTelemetry::default(),
            swing_limits: Limits::disabled(),
            twist_limits: Limits::disabled(),
            swing_friction: 0.0,
            twist_friction: 0.0,
        }
    }

    /// Enable limits on the swing axis (about the parent's lateral axis).
    #[must_use]
    pub fn with_swing_limits(mut self, min: f64, max: f64) -> Self {
        self.swing_limits = Limits::new(min, max);
        self
    }

    /// Enable limits on the twist axis (about the child's primary axis).
    #[must_use]
    pub fn with_twist_limits(mut self, min: f64, max: f64) -> Self {
        self.twist_limits = Limits::new(min, max);
        self
    }

    /// Set both friction coefficients at construction (clamped ≥ 0).
    #[must_use]
    pub fn with_friction(mut self, swing: f64, twist: f64) -> Self {
        self.swing_friction = swing.max(0.0);
        self.twist_friction = twist.max(0.0);
        self
    }

    /// Continuous swing angle, radians.
    #[must_use]
    pub fn swing_angle(&self) -> f64 {
        self.swing_integrator.angle()
    }

    /// Continuous twist angle, radians.
    #[must_use]
    pub fn twist_angle(&self) -> f64 {
        self.twist_integrator.angle()
    }

    /// Swing-axis telemetry.
    #[must_use]
    pub fn swing_telemetry(&self) -> &AxisTelemetry {
        &self.swing_telemetry
    }

    /// Twist-axis telemetry.
    #[must_use]
    pub fn twist_telemetry(&self) -> &AxisTelemetry {
        &self.twist_telemetry
    }

    /// Mutable access to the swing limits.
    pub fn swing_limits_mut(&mut self) -> &mut Limits {
        &mut self.swing_limits
    }

    /// Mutable access to the twist limits.
    pub fn twist_limits_mut(&mut self) -> &mut Limits {
        &mut self.twist_limits
    }

    pub(crate) fn reset_state(&mut self) {
        self.swing_integrator = AngularIntegrator::new();
        self.twist_integrator = AngularIntegrator::new();
        self.swing_telemetry.reset();
        self.twist_telemetry.reset();
        self.swing_limits.reset();
        self.twist_limits.reset();
    }

    pub(crate) fn describe_limits(&self) -> Vec<LimitDescriptor> {
        let mut out = Vec::new();
        if self.swing_limits.is_enabled() {
            out.push(LimitDescriptor {
                kind: DofKind::Angular,
                axis: 0,
                min: self.swing_limits.min(),
                max: self.swing_limits.max(),
            });
        }
        if self.twist_limits.is_enabled() {
            out.push(LimitDescriptor {
                kind: DofKind::Angular,
                axis: 1,
                min: self.twist_limits.min(),
                max: self.twist_limits.max(),
            });
        }
        out
    }

    pub(crate) fn submit(&mut self, ctx: &mut SubmitContext<'_>) {
        ctx.lock_linear_all();

        let front_child = ctx.frame_child.primary_axis();
        let front_parent = ctx.frame_parent.primary_axis();
        let up_parent = ctx.frame_parent.lateral_axis();
        let up_child = ctx.frame_child.lateral_axis();

        // The free axes are up_parent and front_child; lock the rotation
        // about their mutual perpendicular so they stay orthogonal.
        // Skipped near gimbal lock, where the perpendicular degenerates.
        let perp = front_child.cross(&up_parent);
        let perp_norm = perp.norm();
        if perp_norm > 1e-6 {
            let dir = Unit::new_unchecked(perp / perp_norm);
            let error = front_child.dot(&up_parent);
            ctx.batch.add_angular_row(dir, error);
            ctx.tag_lock();
        }

        // Swing: azimuth of the child's primary axis about up_parent.
        let swing = {
            let projected = front_child - up_parent * front_child.dot(&up_parent);
            let norm = projected.norm();
            if norm > 1e-9 {
                let r = projected / norm;
                let cos = r.dot(&front_parent);
                let sin = front_parent.cross(&r).dot(&up_parent);
                self.swing_integrator.update(cos, sin)
            } else {
                self.swing_integrator.angle()
            }
        };

        // Twist: rotation of the child about its own primary axis,
        // referenced against up_parent projected off that axis.
        let twist = {
            let projected = up_parent - front_child * up_parent.dot(&front_child);
            let norm = projected.norm();
            if norm > 1e-9 {
                let r = projected / norm;
                let cos = r.dot(&up_child);
                let sin = r.cross(&up_child).dot(&front_child);
                self.twist_integrator.update(cos, sin)
            } else {
                self.twist_integrator.angle()
            }
        };

        self.swing_telemetry.update(swing, ctx.dt);
        self.twist_telemetry.update(twist, ctx.dt);

        let swing_axis = Unit::new_unchecked(up_parent);
        if let Some((side, violation)) = self.swing_limits.assess(swing) {
            let push = match side {
                LimitSide::Upper => Unit::new_unchecked(-up_parent),
                LimitSide::Lower => swing_axis,
            };
            ctx.stop_angular(push, violation);
        } else if self.swing_friction > 0.0 {
            ctx.friction_angular(swing_axis, self.swing_friction * ctx.lighter_mass());
        }

        let twist_axis = Unit::new_unchecked(front_child);
        if let Some((side, violation)) = self.twist_limits.assess(twist) {
            let push = match side {
                LimitSide::Upper => Unit::new_unchecked(-front_child),
                LimitSide::Lower => twist_axis,
            };
            ctx.stop_angular(push, violation);
        } else if self.twist_friction > 0.0 {
            ctx.friction_angular(twist_axis, self.twist_friction * ctx.lighter_mass());
        }
    }
}

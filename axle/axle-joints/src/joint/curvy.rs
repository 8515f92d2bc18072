//! CurvyPiston: a piston whose travel axis is a waypoint path.
//!
//! The child's joint origin is projected onto the path every step; the
//! two translations perpendicular to the local tangent are locked, the
//! along-path travel is driven like a piston, and - when alignment is
//! enabled - the child's primary axis is held to the tangent. The arc
//! position is kept continuous across the loop seam of closed paths so
//! telemetry and limits behave like any other travel axis.

use axle_types::Frame;
use nalgebra::Unit;
use tracing::warn;

use super::drive::Drive;
use super::path::WaypointPath;
use super::{AxisTelemetry, DofKind, LimitDescriptor, SubmitContext};

/// A path-following piston over a waypoint curve.
#[derive(Debug, Clone)]
pub struct CurvyPiston {
    path: WaypointPath,
    telemetry: AxisTelemetry,
    drive: Drive,
    force: f64,
    spin_friction: f64,
    target_arc: f64,
    arc: f64,
    align: bool,
    allow_spin: bool,
    needs_resync: bool,
}

impl CurvyPiston {
    /// Create a path-following piston over `path`.
    #[must_use]
    pub fn new(path: WaypointPath) -> Self {
        Self {
            path,
            telemetry: AxisTelemetry::default(),
            drive: Drive::new(1.0, 0.1),
            force: 10.0,
            spin_friction: 1.0,
            target_arc: 0.0,
            arc: 0.0,
            align: true,
            allow_spin: true,
            needs_resync: true,
        }
    }

    /// Set the ramp at construction.
    #[must_use]
    pub fn with_drive(mut self, drive: Drive) -> Self {
        self.drive = drive;
        self
    }

    /// Set the drive force coefficient at construction (clamped ≥ 0).
    #[must_use]
    pub fn with_force(mut self, force: f64) -> Self {
        self.force = force.max(0.0);
        self
    }

    /// Choose whether the child's primary axis is held to the tangent.
    #[must_use]
    pub fn with_align(mut self, align: bool) -> Self {
        self.align = align;
        self
    }

    /// Choose whether spin about the tangent stays free when aligned.
    #[must_use]
    pub fn with_allow_spin(mut self, allow_spin: bool) -> Self {
        self.allow_spin = allow_spin;
        self
    }

    /// The waypoint path.
    #[must_use]
    pub fn path(&self) -> &WaypointPath {
        &self.path
    }

    /// Replace the waypoint path; the cached arc position resyncs on the
    /// next step.
    pub fn set_path(&mut self, path: WaypointPath) {
        self.path = path;
        self.target_arc = self.path.clamp_arc(self.target_arc);
        self.resync_path_state();
    }

    /// The commanded arc position.
    #[must_use]
    pub fn target_arc(&self) -> f64 {
        self.target_arc
    }

    /// Command an arc position; clamped to the path ends when the path
    /// does not loop.
    pub fn set_target_arc(&mut self, arc: f64) {
        self.target_arc = self.path.clamp_arc(arc);
    }

    /// Continuous arc position of the child on the path.
    #[must_use]
    pub fn arc_position(&self) -> f64 {
        self.telemetry.position()
    }

    /// Free-axis telemetry (position is the continuous arc).
    #[must_use]
    pub fn telemetry(&self) -> &AxisTelemetry {
        &self.telemetry
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

    /// Drive force coefficient.
    #[must_use]
    pub fn force(&self) -> f64 {
        self.force
    }

    /// Set the drive force coefficient (clamped ≥ 0).
    pub fn set_force(&mut self, force: f64) {
        self.force = force.max(0.0);
    }

    /// Heading friction torque coefficient used when not aligned.
    #[must_use]
    pub fn spin_friction(&self) -> f64 {
        self.spin_friction
    }

    /// Set the heading friction coefficient (clamped ≥ 0).
    pub fn set_spin_friction(&mut self, friction: f64) {
        self.spin_friction = friction.max(0.0);
    }

    /// Whether orientation is held to the path tangent.
    #[must_use]
    pub fn align(&self) -> bool {
        self.align
    }

    /// Enable or disable tangent alignment.
    pub fn set_align(&mut self, align: bool) {
        self.align = align;
    }

    /// Whether spin about the tangent stays free when aligned.
    #[must_use]
    pub fn allow_spin(&self) -> bool {
        self.allow_spin
    }

    /// Allow or lock spin about the tangent.
    pub fn set_allow_spin(&mut self, allow_spin: bool) {
        self.allow_spin = allow_spin;
    }

    /// Forget the cached arc position; the next step re-derives it from
    /// the closest-point projection (pin frame moves invalidate it).
    pub(crate) fn resync_path_state(&mut self) {
        self.needs_resync = true;
    }

    pub(crate) fn reset_state(&mut self) {
        self.telemetry.reset();
        self.arc = 0.0;
        self.needs_resync = true;
    }

    pub(crate) fn describe_limits(&self) -> Vec<LimitDescriptor> {
        if self.path.is_looped() {
            return Vec::new();
        }
        vec![LimitDescriptor {
            kind: DofKind::Linear,
            axis: 0,
            min: 0.0,
            max: self.path.total_length(),
        }]
    }

    /// Continuous arc update: the raw projection folds at the loop seam,
    /// so advance the cached arc by the wrapped delta instead.
    fn advance_arc(&mut self, projected: f64) -> f64 {
        if self.needs_resync {
            self.arc = projected;
            self.needs_resync = false;
            return self.arc;
        }
        if self.path.is_looped() {
            let total = self.path.total_length();
            let mut delta = (projected - self.arc).rem_euclid(total);
            if delta > 0.5 * total {
                delta -= total;
            }
            self.arc += delta;
        } else {
            self.arc = projected;
        }
        self.arc
    }

    pub(crate) fn submit(&mut self, ctx: &mut SubmitContext<'_>) {
        // The path lives in the parent-side pin frame.
        let pin = ctx.frame_parent;
        let query = pin.inverse_transform_point(&ctx.frame_child.position);

        let Some(sample) = self.path.closest_point(&query) else {
            warn!(waypoints = self.path.waypoint_count(), "curvy piston path degenerate, skipping step");
            return;
        };

        let arc = self.advance_arc(sample.arc);
        self.telemetry.update(arc, ctx.dt);

        let target_point = pin.transform_point(&sample.point);
        let tangent = pin.transform_vector(&sample.tangent);
        let rail = Frame::from_primary_axis(target_point, tangent);
        let tangent = Unit::new_unchecked(rail.primary_axis());

        // Lock the two translations perpendicular to the tangent, child
        // origin against its projection.
        ctx.lock_linear_at(
            ctx.frame_child.position,
            target_point,
            Unit::new_unchecked(rail.lateral_axis()),
        );
        ctx.lock_linear_at(
            ctx.frame_child.position,
            target_point,
            Unit::new_unchecked(rail.normal_axis()),
        );

        let front_child = ctx.frame_child.primary_axis();
        if self.align {
            ctx.align_axes(
                Unit::new_unchecked(rail.lateral_axis()),
                &front_child,
                &tangent,
            );
            ctx.align_axes(
                Unit::new_unchecked(rail.normal_axis()),
                &front_child,
                &tangent,
            );
            if !self.allow_spin {
                let up_child = ctx.frame_child.lateral_axis();
                ctx.align_axes(tangent, &up_child, &rail.lateral_axis());
            }
        } else if self.spin_friction > 0.0 {
            // Unaligned heading would spin freely; hold it with friction.
            ctx.friction_angular(tangent, self.spin_friction * ctx.lighter_mass());
        }

        // Drive along the tangent like a piston, clamped to the path
        // ends when open.
        let speed = ctx
            .relative_velocity_at(ctx.frame_child.position)
            .dot(&tangent);
        let target = self.path.clamp_arc(self.target_arc);
        let error = target - arc;
        let bound = self.force * ctx.lighter_mass();

        if self.force > 0.0 {
            let accel = self.drive.target_acceleration(error, speed, ctx.dt);
            ctx.drive_linear(tangent, accel, bound);
        }
    }
}

//! Joint core: lifecycle, frames, telemetry and per-kind dispatch.
//!
//! A [`Joint`] connects a required child body to an optional parent body
//! (absent parent = world-fixed). It stores the requested *pin frame*
//! relative to the parent, and at connect time caches two *local frames*
//! (child-relative and parent-relative). Every step, the global joint
//! frames are reconstructed from the local frames and the bodies' current
//! frames - never from the pin frame directly - and handed to the kind's
//! row submission.
//!
//! The per-kind polymorphism is a tagged enum, [`JointKind`]: one match
//! per operation instead of a function-pointer table.

use axle_types::Frame;
use nalgebra::{Point3, Unit, Vector3};
use std::ops::Range;

use crate::arena::Handle;
use crate::body::{Body, BodyId};
use crate::row::RowBatch;

pub mod drive;
pub mod limits;
pub mod path;

mod ball;
mod corkscrew;
mod curvy;
mod fixed;
mod hinge;
mod motor;
mod piston;
mod servo;
mod slider;
mod spring;
mod universal;
mod up_vector;

pub use ball::BallAndSocket;
pub use corkscrew::Corkscrew;
pub use curvy::CurvyPiston;
pub use drive::Drive;
pub use fixed::Fixed;
pub use hinge::Hinge;
pub use limits::{LimitSide, Limits};
pub use motor::Motor;
pub use path::{PathSample, WaypointPath};
pub use piston::Piston;
pub use servo::Servo;
pub use slider::Slider;
pub use spring::Spring;
pub use universal::Universal;
pub use up_vector::UpVector;

/// Handle to a joint stored in a [`crate::JointWorld`].
pub type JointId = Handle<Joint>;

/// How a joint's lock rows are enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConstraintMode {
    /// Hard rows with position-error feedback.
    #[default]
    Rigid,
    /// Soft rows driven by the joint's spring-damper pair.
    Flexible,
    /// Velocity-level rows with no position feedback; drift-tolerant.
    Robust,
}

/// Spring-damper pair used by lock rows in [`ConstraintMode::Flexible`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlexParams {
    /// Spring coefficient (N/m or Nm/rad), ≥ 0.
    pub spring: f64,
    /// Damper coefficient (Ns/m or Nms/rad), ≥ 0.
    pub damper: f64,
}

impl Default for FlexParams {
    fn default() -> Self {
        Self {
            spring: 400.0,
            damper: 40.0,
        }
    }
}

/// Linear or angular degree of freedom, for limit descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DofKind {
    /// Translation along an axis.
    Linear,
    /// Rotation about an axis.
    Angular,
}

/// One degree-of-freedom bound, bridged to the solver for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitDescriptor {
    /// Linear or angular.
    pub kind: DofKind,
    /// Free-axis index within the joint (0-based).
    pub axis: usize,
    /// Lower bound (−∞ when unbounded).
    pub min: f64,
    /// Upper bound (+∞ when unbounded).
    pub max: f64,
}

/// Backward-difference telemetry for one free axis.
///
/// Velocity and acceleration are finite differences of the submitted
/// position: vel = Δpos/Δt, accel = Δvel/Δt. The first sample after a
/// (re)connect primes the position without producing a spike.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisTelemetry {
    position: f64,
    velocity: f64,
    acceleration: f64,
    primed: bool,
}

impl AxisTelemetry {
    /// Current position (radians or meters).
    #[must_use]
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Current velocity (backward difference).
    #[must_use]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Current acceleration (backward difference).
    #[must_use]
    pub fn acceleration(&self) -> f64 {
        self.acceleration
    }

    /// Zero everything; the next update only primes the position.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn update(&mut self, position: f64, dt: f64) {
        if !self.primed || dt <= 0.0 {
            self.position = position;
            self.velocity = 0.0;
            self.acceleration = 0.0;
            self.primed = true;
            return;
        }
        let velocity = (position - self.position) / dt;
        self.acceleration = (velocity - self.velocity) / dt;
        self.velocity = velocity;
        self.position = position;
    }
}

// ============================================================================
// Submission context
// ============================================================================

/// Everything a kind needs while submitting rows for one step.
pub(crate) struct SubmitContext<'a> {
    pub batch: &'a mut RowBatch,
    /// Global joint frame derived from the child's cached local frame.
    pub frame_child: Frame,
    /// Global joint frame derived from the parent's cached local frame
    /// (the stored frame itself when the joint is world-fixed).
    pub frame_parent: Frame,
    pub child: &'a Body,
    pub parent: Option<&'a Body>,
    pub mode: ConstraintMode,
    pub stiffness: f64,
    pub flex: FlexParams,
    pub dt: f64,
}

impl SubmitContext<'_> {
    /// Tag the last row per the joint's constraint mode and stiffness.
    fn tag_lock(&mut self) {
        match self.mode {
            ConstraintMode::Rigid => {}
            ConstraintMode::Flexible => {
                self.batch
                    .set_spring_damper(self.flex.spring, self.flex.damper);
            }
            ConstraintMode::Robust => self.batch.set_zero_acceleration(),
        }
        self.batch.set_stiffness(self.stiffness);
    }

    /// Lock relative translation along `dir` (between the joint origins).
    pub fn lock_linear(&mut self, dir: Unit<Vector3<f64>>) {
        self.batch
            .add_linear_row(self.frame_child.position, self.frame_parent.position, dir);
        self.tag_lock();
    }

    /// Lock relative translation along `dir` between explicit anchors
    /// (path-following joints anchor against a point on the path, not the
    /// parent-side joint origin).
    pub fn lock_linear_at(
        &mut self,
        anchor_child: Point3<f64>,
        anchor_parent: Point3<f64>,
        dir: Unit<Vector3<f64>>,
    ) {
        self.batch.add_linear_row(anchor_child, anchor_parent, dir);
        self.tag_lock();
    }

    /// Lock translation on all three parent-frame axes.
    pub fn lock_linear_all(&mut self) {
        for dir in [
            self.frame_parent.primary_axis(),
            self.frame_parent.lateral_axis(),
            self.frame_parent.normal_axis(),
        ] {
            self.lock_linear(Unit::new_unchecked(dir));
        }
    }

    /// Lock the rotation that would misalign `axis_child` from
    /// `axis_parent`, measured about `dir`.
    pub fn align_axes(
        &mut self,
        dir: Unit<Vector3<f64>>,
        axis_child: &Vector3<f64>,
        axis_parent: &Vector3<f64>,
    ) {
        let error = axis_parent.cross(axis_child).dot(&dir);
        self.batch.add_angular_row(dir, error);
        self.tag_lock();
    }

    /// One-sided linear stop: positive force along `push_dir` restores the
    /// violated bound; friction is zeroed on the violated side.
    pub fn stop_linear(&mut self, push_dir: Unit<Vector3<f64>>, violation: f64) {
        self.batch.add_linear_row(
            self.frame_child.position,
            self.frame_child.position,
            push_dir,
        );
        self.batch.set_position_error(-violation.max(0.0));
        self.batch.set_minimum_friction(0.0);
    }

    /// One-sided angular stop, same shape as [`Self::stop_linear`].
    pub fn stop_angular(&mut self, push_dir: Unit<Vector3<f64>>, violation: f64) {
        self.batch.add_angular_row(push_dir, -violation.max(0.0));
        self.batch.set_minimum_friction(0.0);
    }

    /// Free-motion linear row resisted by a symmetric force bound.
    pub fn friction_linear(&mut self, dir: Unit<Vector3<f64>>, max_force: f64) {
        self.batch.add_linear_row(
            self.frame_child.position,
            self.frame_child.position,
            dir,
        );
        self.batch.set_zero_acceleration();
        self.batch.set_minimum_friction(-max_force);
        self.batch.set_maximum_friction(max_force);
    }

    /// Free-motion angular row resisted by a symmetric torque bound.
    pub fn friction_angular(&mut self, dir: Unit<Vector3<f64>>, max_force: f64) {
        self.batch.add_angular_row(dir, 0.0);
        self.batch.set_zero_acceleration();
        self.batch.set_minimum_friction(-max_force);
        self.batch.set_maximum_friction(max_force);
    }

    /// Controller row: drive the linear axis at `accel`, force-bounded.
    pub fn drive_linear(&mut self, dir: Unit<Vector3<f64>>, accel: f64, max_force: f64) {
        self.batch.add_linear_row(
            self.frame_child.position,
            self.frame_child.position,
            dir,
        );
        self.batch.set_acceleration(accel);
        self.batch.set_minimum_friction(-max_force);
        self.batch.set_maximum_friction(max_force);
    }

    /// Controller row: drive the angular axis at `accel`, torque-bounded.
    pub fn drive_angular(&mut self, dir: Unit<Vector3<f64>>, accel: f64, max_force: f64) {
        self.batch.add_angular_row(dir, 0.0);
        self.batch.set_acceleration(accel);
        self.batch.set_minimum_friction(-max_force);
        self.batch.set_maximum_friction(max_force);
    }

    /// Mass of the lighter connected body, used to scale friction and
    /// drive bounds. Falls back to 1 when both sides are static.
    #[must_use]
    pub fn lighter_mass(&self) -> f64 {
        let child = self.child.mass_properties().mass;
        let parent = self
            .parent
            .map_or(f64::INFINITY, |p| p.mass_properties().mass);
        let lighter = child.min(parent);
        if lighter.is_finite() && lighter > 0.0 {
            lighter
        } else {
            1.0
        }
    }

    /// Relative angular velocity, child minus parent.
    #[must_use]
    pub fn relative_angular_velocity(&self) -> Vector3<f64> {
        let parent = self
            .parent
            .map_or_else(Vector3::zeros, |p| p.twist().angular);
        self.child.twist().angular - parent
    }

    /// Relative velocity of a world point, child minus parent.
    #[must_use]
    pub fn relative_velocity_at(&self, point: Point3<f64>) -> Vector3<f64> {
        let child = self
            .child
            .twist()
            .velocity_at_point(&(point - self.child.center_of_mass_world()));
        let parent = self.parent.map_or_else(Vector3::zeros, |p| {
            p.twist().velocity_at_point(&(point - p.center_of_mass_world()))
        });
        child - parent
    }
}

// ============================================================================
// Kind dispatch
// ============================================================================

/// Tagged per-kind payload of a joint.
///
/// One enum with one match per operation replaces the per-type
/// function-pointer dispatch table of classic joint libraries.
#[derive(Debug, Clone)]
pub enum JointKind {
    /// Rigid weld, zero free axes.
    Fixed(Fixed),
    /// Ball-and-socket, three free rotations.
    BallAndSocket(BallAndSocket),
    /// Single-axis rotation.
    Hinge(Hinge),
    /// Speed-controlled hinge.
    Motor(Motor),
    /// Position-controlled hinge.
    Servo(Servo),
    /// Single-axis translation.
    Slider(Slider),
    /// Position-controlled slider.
    Piston(Piston),
    /// Six-axis spring-damper coupling.
    Spring(Spring),
    /// Coupled translation and rotation about one axis.
    Corkscrew(Corkscrew),
    /// Two perpendicular rotation axes.
    Universal(Universal),
    /// Keeps a body axis aligned to a reference direction.
    UpVector(UpVector),
    /// Path-following piston over a waypoint curve.
    CurvyPiston(CurvyPiston),
}

impl JointKind {
    /// Kind name for diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fixed(_) => "fixed",
            Self::BallAndSocket(_) => "ball_and_socket",
            Self::Hinge(_) => "hinge",
            Self::Motor(_) => "motor",
            Self::Servo(_) => "servo",
            Self::Slider(_) => "slider",
            Self::Piston(_) => "piston",
            Self::Spring(_) => "spring",
            Self::Corkscrew(_) => "corkscrew",
            Self::Universal(_) => "universal",
            Self::UpVector(_) => "up_vector",
            Self::CurvyPiston(_) => "curvy_piston",
        }
    }

    /// Relative-motion axes the kind nominally leaves unconstrained
    /// before limits and locks apply.
    #[must_use]
    pub fn free_dof(&self) -> usize {
        match self {
            Self::Fixed(_) => 0,
            Self::Hinge(_) | Self::Motor(_) | Self::Servo(_) | Self::Slider(_)
            | Self::Piston(_) | Self::CurvyPiston(_) => 1,
            Self::Corkscrew(_) | Self::Universal(_) => 2,
            Self::BallAndSocket(_) => 3,
            Self::UpVector(_) => 4,
            Self::Spring(_) => 6,
        }
    }

    /// Upper bound on the rows this kind submits per step, in [1, 6].
    #[must_use]
    pub fn row_capacity(&self) -> usize {
        match self {
            Self::UpVector(_) => 2,
            Self::BallAndSocket(_) => 5,
            Self::Spring(_) => 6,
            Self::Fixed(_)
            | Self::Hinge(_)
            | Self::Motor(_)
            | Self::Servo(_)
            | Self::Slider(_)
            | Self::Piston(_)
            | Self::Corkscrew(_)
            | Self::Universal(_)
            | Self::CurvyPiston(_) => 6,
        }
    }

    /// Degree-of-freedom bounds, for solver diagnostics.
    #[must_use]
    pub fn describe_limits(&self) -> Vec<LimitDescriptor> {
        match self {
            Self::Fixed(_) | Self::Spring(_) | Self::UpVector(_) => Vec::new(),
            Self::BallAndSocket(k) => k.describe_limits(),
            Self::Hinge(k) => k.describe_limits(),
            Self::Motor(k) => k.describe_limits(),
            Self::Servo(k) => k.describe_limits(),
            Self::Slider(k) => k.describe_limits(),
            Self::Piston(k) => k.describe_limits(),
            Self::Corkscrew(k) => k.describe_limits(),
            Self::Universal(k) => k.describe_limits(),
            Self::CurvyPiston(k) => k.describe_limits(),
        }
    }

    pub(crate) fn submit(&mut self, ctx: &mut SubmitContext<'_>) {
        match self {
            Self::Fixed(k) => k.submit(ctx),
            Self::BallAndSocket(k) => k.submit(ctx),
            Self::Hinge(k) => k.submit(ctx),
            Self::Motor(k) => k.submit(ctx),
            Self::Servo(k) => k.submit(ctx),
            Self::Slider(k) => k.submit(ctx),
            Self::Piston(k) => k.submit(ctx),
            Self::Spring(k) => k.submit(ctx),
            Self::Corkscrew(k) => k.submit(ctx),
            Self::Universal(k) => k.submit(ctx),
            Self::UpVector(k) => k.submit(ctx),
            Self::CurvyPiston(k) => k.submit(ctx),
        }
    }

    pub(crate) fn on_connect(&mut self) {
        match self {
            Self::Fixed(_) | Self::Spring(_) | Self::UpVector(_) => {}
            Self::BallAndSocket(k) => k.reset_state(),
            Self::Hinge(k) => k.reset_state(),
            Self::Motor(k) => k.reset_state(),
            Self::Servo(k) => k.reset_state(),
            Self::Slider(k) => k.reset_state(),
            Self::Piston(k) => k.reset_state(),
            Self::Corkscrew(k) => k.reset_state(),
            Self::Universal(k) => k.reset_state(),
            Self::CurvyPiston(k) => k.reset_state(),
        }
    }

    pub(crate) fn on_disconnect(&mut self) {
        // Telemetry must read zero on a detached joint.
        self.on_connect();
    }

    pub(crate) fn on_pin_changed(&mut self) {
        if let Self::CurvyPiston(k) = self {
            k.resync_path_state();
        }
    }
}

// Typed accessors; `None` when the joint is a different kind.
macro_rules! kind_accessors {
    ($( $fn:ident, $fn_mut:ident, $variant:ident, $ty:ty );* $(;)?) => {
        impl JointKind {
            $(
                /// Borrow the payload when this kind matches.
                #[must_use]
                pub fn $fn(&self) -> Option<&$ty> {
                    match self {
                        Self::$variant(k) => Some(k),
                        _ => None,
                    }
                }

                /// Mutably borrow the payload when this kind matches.
                pub fn $fn_mut(&mut self) -> Option<&mut $ty> {
                    match self {
                        Self::$variant(k) => Some(k),
                        _ => None,
                    }
                }
            )*
        }
    };
}

kind_accessors! {
    as_fixed, as_fixed_mut, Fixed, Fixed;
    as_ball, as_ball_mut, BallAndSocket, BallAndSocket;
    as_hinge, as_hinge_mut, Hinge, Hinge;
    as_motor, as_motor_mut, Motor, Motor;
    as_servo, as_servo_mut, Servo, Servo;
    as_slider, as_slider_mut, Slider, Slider;
    as_piston, as_piston_mut, Piston, Piston;
    as_spring, as_spring_mut, Spring, Spring;
    as_corkscrew, as_corkscrew_mut, Corkscrew, Corkscrew;
    as_universal, as_universal_mut, Universal, Universal;
    as_up_vector, as_up_vector_mut, UpVector, UpVector;
    as_curvy_piston, as_curvy_piston_mut, CurvyPiston, CurvyPiston;
}

// ============================================================================
// Joint
// ============================================================================

/// A constraint between a child body and an optional parent body.
#[derive(Debug, Clone)]
pub struct Joint {
    kind: JointKind,
    mode: ConstraintMode,
    stiffness: f64,
    flex: FlexParams,
    collidable: bool,
    breaking_force: f64,
    connected: bool,
    parent: Option<BodyId>,
    child: Option<BodyId>,
    pin_parent: Frame,
    local_child: Frame,
    local_parent: Frame,
    pub(crate) row_range: Range<usize>,
    pub(crate) last_row_force: f64,
}

impl Joint {
    pub(crate) fn new(kind: JointKind, parent: Option<BodyId>, pin_parent: Frame) -> Self {
        Self {
            kind,
            mode: ConstraintMode::default(),
            stiffness: 1.0,
            flex: FlexParams::default(),
            collidable: false,
            breaking_force: 0.0,
            connected: false,
            parent,
            child: None,
            pin_parent: pin_parent.orthonormalized(),
            local_child: Frame::identity(),
            local_parent: Frame::identity(),
            row_range: 0..0,
            last_row_force: 0.0,
        }
    }

    /// The per-kind payload.
    #[must_use]
    pub fn kind(&self) -> &JointKind {
        &self.kind
    }

    /// Mutable access to the per-kind payload.
    pub fn kind_mut(&mut self) -> &mut JointKind {
        &mut self.kind
    }

    /// The constraint mode of the lock rows.
    #[must_use]
    pub fn mode(&self) -> ConstraintMode {
        self.mode
    }

    /// Set the constraint mode.
    pub fn set_mode(&mut self, mode: ConstraintMode) {
        self.mode = mode;
    }

    /// Stiffness weight in [0, 1].
    #[must_use]
    pub fn stiffness(&self) -> f64 {
        self.stiffness
    }

    /// Set the stiffness weight; clamped to [0, 1].
    pub fn set_stiffness(&mut self, stiffness: f64) {
        self.stiffness = stiffness.clamp(0.0, 1.0);
    }

    /// Spring-damper pair used by flexible-mode lock rows.
    #[must_use]
    pub fn flex_params(&self) -> FlexParams {
        self.flex
    }

    /// Set the flexible-mode spring-damper pair (clamped to ≥ 0).
    pub fn set_flex_params(&mut self, spring: f64, damper: f64) {
        self.flex = FlexParams {
            spring: spring.max(0.0),
            damper: damper.max(0.0),
        };
    }

    /// Whether the connected bodies may collide with each other.
    #[must_use]
    pub fn collidable(&self) -> bool {
        self.collidable
    }

    pub(crate) fn set_collidable_flag(&mut self, collidable: bool) {
        self.collidable = collidable;
    }

    /// Breaking-force threshold; 0 disables the monitor.
    #[must_use]
    pub fn breaking_force(&self) -> f64 {
        self.breaking_force
    }

    /// Set the breaking-force threshold (clamped to ≥ 0).
    pub fn set_breaking_force(&mut self, threshold: f64) {
        self.breaking_force = threshold.max(0.0);
    }

    /// Whether the joint currently has a child attached.
    #[must_use]
    pub fn connected(&self) -> bool {
        self.connected
    }

    /// The parent body; `None` means world-fixed.
    #[must_use]
    pub fn parent(&self) -> Option<BodyId> {
        self.parent
    }

    /// The child body, present while connected.
    #[must_use]
    pub fn child(&self) -> Option<BodyId> {
        self.child
    }

    /// Free axes of the kind (glossary DOF).
    #[must_use]
    pub fn free_dof(&self) -> usize {
        self.kind.free_dof()
    }

    /// Row capacity of the kind, in [1, 6].
    #[must_use]
    pub fn row_capacity(&self) -> usize {
        let capacity = self.kind.row_capacity();
        debug_assert!((1..=6).contains(&capacity));
        capacity
    }

    /// The pin frame, relative to the parent (world when parentless).
    #[must_use]
    pub fn pin_frame(&self) -> &Frame {
        &self.pin_parent
    }

    /// Cached local frames (child-relative, parent-relative); identity
    /// while detached.
    #[must_use]
    pub fn local_frames(&self) -> (&Frame, &Frame) {
        (&self.local_child, &self.local_parent)
    }

    /// Largest row force the solver resolved for this joint last step.
    #[must_use]
    pub fn last_row_force(&self) -> f64 {
        self.last_row_force
    }

    /// Compute the local frames from the pin frame and both bodies'
    /// current global frames. Runs exactly once per connect.
    pub(crate) fn connect_with(
        &mut self,
        child: BodyId,
        child_frame: &Frame,
        parent_frame: Option<&Frame>,
    ) {
        let pin_world = parent_frame.map_or(self.pin_parent, |f| f.compose(&self.pin_parent));
        self.local_child = pin_world.relative_to(child_frame);
        self.local_parent = self.pin_parent;
        self.child = Some(child);
        self.connected = true;
        self.last_row_force = 0.0;
        self.kind.on_connect();
    }

    pub(crate) fn disconnect_now(&mut self) {
        self.child = None;
        self.connected = false;
        self.row_range = 0..0;
        self.last_row_force = 0.0;
        self.local_child = Frame::identity();
        self.local_parent = Frame::identity();
        self.kind.on_disconnect();
    }

    /// Replace the pin frame (parent-relative) and, when connected,
    /// recompute the local frames against the current body frames.
    pub(crate) fn set_pin(
        &mut self,
        pin_parent: Frame,
        child_frame: Option<&Frame>,
        parent_frame: Option<&Frame>,
    ) {
        self.pin_parent = pin_parent.orthonormalized();
        if self.connected {
            if let Some(child_frame) = child_frame {
                let pin_world =
                    parent_frame.map_or(self.pin_parent, |f| f.compose(&self.pin_parent));
                self.local_child = pin_world.relative_to(child_frame);
                self.local_parent = self.pin_parent;
            }
            self.kind.on_pin_changed();
        }
    }

    /// Reconstruct the global joint frames and dispatch row submission.
    pub(crate) fn submit_rows(
        &mut self,
        batch: &mut RowBatch,
        child: &Body,
        parent: Option<&Body>,
        dt: f64,
    ) {
        let frame_child = child.frame().compose(&self.local_child);
        let frame_parent =
            parent.map_or(self.local_parent, |p| p.frame().compose(&self.local_parent));

        let mut ctx = SubmitContext {
            batch,
            frame_child,
            frame_parent,
            child,
            parent,
            mode: self.mode,
            stiffness: self.stiffness,
            flex: self.flex,
            dt,
        };
        self.kind.submit(&mut ctx);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_stiffness_clamps() {
        let mut joint = Joint::new(JointKind::Fixed(Fixed::new()), None, Frame::identity());

        joint.set_stiffness(5.0);
        assert_relative_eq!(joint.stiffness(), 1.0, epsilon = 1e-12);
        joint.set_stiffness(-1.0);
        assert_relative_eq!(joint.stiffness(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_breaking_force_clamps() {
        let mut joint = Joint::new(JointKind::Fixed(Fixed::new()), None, Frame::identity());
        joint.set_breaking_force(-10.0);
        assert_relative_eq!(joint.breaking_force(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_telemetry_primes_without_spike() {
        let mut telemetry = AxisTelemetry::default();
        let dt = 1.0 / 60.0;

        telemetry.update(5.0, dt);
        assert_relative_eq!(telemetry.position(), 5.0, epsilon = 1e-12);
        assert_relative_eq!(telemetry.velocity(), 0.0, epsilon = 1e-12);

        telemetry.update(5.0 + 2.0 * dt, dt);
        assert_relative_eq!(telemetry.velocity(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_telemetry_backward_differences() {
        let mut telemetry = AxisTelemetry::default();
        let dt = 0.1;

        telemetry.update(0.0, dt);
        telemetry.update(1.0, dt); // v = 10
        telemetry.update(3.0, dt); // v = 20, a = 100

        assert_relative_eq!(telemetry.velocity(), 20.0, epsilon = 1e-9);
        assert_relative_eq!(telemetry.acceleration(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_free_dof_per_kind() {
        assert_eq!(JointKind::Fixed(Fixed::new()).free_dof(), 0);
        assert_eq!(JointKind::Hinge(Hinge::new()).free_dof(), 1);
        assert_eq!(JointKind::BallAndSocket(BallAndSocket::new()).free_dof(), 3);
        assert_eq!(JointKind::Spring(Spring::new()).free_dof(), 6);
    }

    #[test]
    fn test_kind_accessors() {
        let mut kind = JointKind::Hinge(Hinge::new());
        assert!(kind.as_hinge().is_some());
        assert!(kind.as_slider().is_none());
        assert!(kind.as_hinge_mut().is_some());
    }
}

//! Constraint rows: the currency between joints and the solver.
//!
//! A row is one scalar equation relating the relative motion of two
//! bodies along an axis. Joints submit rows each step through a
//! [`RowBatch`]; the solver resolves a force per row and writes it back,
//! which is where the breaking-force monitor reads it.
//!
//! Sign conventions, used consistently by every joint kind:
//!
//! - Linear rows measure child-relative-to-parent: the position error is
//!   `(anchor_child - anchor_parent) · dir` and a positive impulse pushes
//!   the child along `+dir` (and the parent along `-dir`).
//! - Angular rows measure `(ω_child - ω_parent) · dir`; a positive
//!   impulse torques the child about `+dir`.
//! - Alignment errors are passed as `(axis_parent × axis_child) · dir`,
//!   which decays to zero under the solver's position feedback.

use nalgebra::{Point3, Unit, Vector3};

use crate::body::BodyId;

/// Geometric half of a constraint row.
#[derive(Debug, Clone, Copy)]
pub enum RowAxis {
    /// A linear (translation) row between two anchor points.
    Linear {
        /// Anchor on the child body, world coordinates.
        anchor_child: Point3<f64>,
        /// Anchor on the parent body (or in the world), world coordinates.
        anchor_parent: Point3<f64>,
        /// Constraint direction, world coordinates.
        dir: Unit<Vector3<f64>>,
    },
    /// An angular (rotation) row about an axis.
    Angular {
        /// Constraint axis, world coordinates.
        dir: Unit<Vector3<f64>>,
    },
}

/// How the solver should drive a row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowResponse {
    /// Hard row with position-error feedback (rigid mode, limit stops).
    Stabilized,
    /// Soft row: acceleration from a spring-damper on the position error
    /// (flexible mode).
    SpringDamper {
        /// Spring coefficient (N/m or Nm/rad).
        spring: f64,
        /// Damper coefficient (Ns/m or Nms/rad).
        damper: f64,
    },
    /// Drive the relative velocity to zero, ignoring position error
    /// (robust mode locks, friction rows).
    ZeroAcceleration,
    /// Drive the relative acceleration to an explicit target
    /// (controller rows).
    Acceleration(f64),
}

/// One scalar constraint equation.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintRow {
    pub(crate) child: BodyId,
    pub(crate) parent: Option<BodyId>,
    /// Row geometry.
    pub axis: RowAxis,
    /// Signed position error along the row (see module docs).
    pub position_error: f64,
    /// Response tag.
    pub response: RowResponse,
    /// Stiffness weight in [0, 1]; scales position-error feedback.
    pub stiffness: f64,
    /// Lower force bound (N or Nm), ≤ 0.
    pub min_force: f64,
    /// Upper force bound (N or Nm), ≥ 0.
    pub max_force: f64,
    pub(crate) impulse: f64,
    pub(crate) resolved_force: f64,
}

impl ConstraintRow {
    /// The force the solver resolved for this row, available after the
    /// step's solve. This is what the breaking-force monitor inspects.
    #[must_use]
    pub fn resolved_force(&self) -> f64 {
        self.resolved_force
    }
}

/// The per-step collection of rows, with the submission primitives the
/// solver boundary exposes to joints.
///
/// Mutating calls (`set_*`) act on the most recently added row, matching
/// the immediate-mode submission style of row-based solvers.
#[derive(Debug)]
pub struct RowBatch {
    dt: f64,
    rows: Vec<ConstraintRow>,
    child: Option<BodyId>,
    parent: Option<BodyId>,
}

impl RowBatch {
    pub(crate) fn new(dt: f64) -> Self {
        Self {
            dt,
            rows: Vec::new(),
            child: None,
            parent: None,
        }
    }

    /// Select the body pair subsequent rows apply to. Returns the current
    /// row count, which callers use to delimit their row range.
    pub(crate) fn begin_joint(&mut self, child: BodyId, parent: Option<BodyId>) -> usize {
        self.child = Some(child);
        self.parent = parent;
        self.rows.len()
    }

    /// The physics timestep for this batch.
    #[must_use]
    pub fn timestep(&self) -> f64 {
        self.dt
    }

    /// Number of rows submitted so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows have been submitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows, for post-solve inspection.
    #[must_use]
    pub fn rows(&self) -> &[ConstraintRow] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [ConstraintRow] {
        &mut self.rows
    }

    /// Add a linear row between two world-space anchors along `dir`.
    ///
    /// The position error is `(anchor_child - anchor_parent) · dir`.
    pub fn add_linear_row(
        &mut self,
        anchor_child: Point3<f64>,
        anchor_parent: Point3<f64>,
        dir: Unit<Vector3<f64>>,
    ) {
        let position_error = (anchor_child - anchor_parent).dot(&dir);
        self.push(
            RowAxis::Linear {
                anchor_child,
                anchor_parent,
                dir,
            },
            position_error,
        );
    }

    /// Add an angular row about `dir` with an explicit angle error.
    pub fn add_angular_row(&mut self, dir: Unit<Vector3<f64>>, angle_error: f64) {
        self.push(RowAxis::Angular { dir }, angle_error);
    }

    /// Override the last row's position error.
    pub fn set_position_error(&mut self, error: f64) {
        if let Some(row) = self.rows.last_mut() {
            row.position_error = error;
        }
    }

    /// Tag the last row with a spring-damper response.
    pub fn set_spring_damper(&mut self, spring: f64, damper: f64) {
        if let Some(row) = self.rows.last_mut() {
            row.response = RowResponse::SpringDamper {
                spring: spring.max(0.0),
                damper: damper.max(0.0),
            };
        }
    }

    /// Tag the last row with a zero-acceleration target.
    pub fn set_zero_acceleration(&mut self) {
        if let Some(row) = self.rows.last_mut() {
            row.response = RowResponse::ZeroAcceleration;
        }
    }

    /// Tag the last row with an explicit acceleration target.
    pub fn set_acceleration(&mut self, accel: f64) {
        if let Some(row) = self.rows.last_mut() {
            row.response = RowResponse::Acceleration(accel);
        }
    }

    /// Set the last row's stiffness weight, clamped to [0, 1].
    pub fn set_stiffness(&mut self, stiffness: f64) {
        if let Some(row) = self.rows.last_mut() {
            row.stiffness = stiffness.clamp(0.0, 1.0);
        }
    }

    /// Set the last row's lower force bound (clamped to ≤ 0).
    pub fn set_minimum_friction(&mut self, force: f64) {
        if let Some(row) = self.rows.last_mut() {
            row.min_force = force.min(0.0);
        }
    }

    /// Set the last row's upper force bound (clamped to ≥ 0).
    pub fn set_maximum_friction(&mut self, force: f64) {
        if let Some(row) = self.rows.last_mut() {
            row.max_force = force.max(0.0);
        }
    }

    fn push(&mut self, axis: RowAxis, position_error: f64) {
        let Some(child) = self.child else {
            debug_assert!(false, "row added outside begin_joint");
            return;
        };
        self.rows.push(ConstraintRow {
            child,
            parent: self.parent,
            axis,
            position_error,
            response: RowResponse::Stabilized,
            stiffness: 1.0,
            min_force: f64::NEG_INFINITY,
            max_force: f64::INFINITY,
            impulse: 0.0,
            resolved_force: 0.0,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::body::Body;
    use approx::assert_relative_eq;
    use axle_types::{BodyState, Frame, MassProperties};

    fn some_body() -> BodyId {
        let mut arena: Arena<Body> = Arena::new();
        arena.insert(Body::new(BodyState::default(), MassProperties::default()))
    }

    #[test]
    fn test_linear_row_position_error() {
        let mut batch = RowBatch::new(1.0 / 60.0);
        batch.begin_joint(some_body(), None);

        batch.add_linear_row(
            Point3::new(0.5, 0.0, 0.0),
            Point3::origin(),
            Unit::new_normalize(Vector3::x()),
        );

        assert_relative_eq!(batch.rows()[0].position_error, 0.5, epsilon = 1e-12);
        assert_eq!(batch.rows()[0].response, RowResponse::Stabilized);
    }

    #[test]
    fn test_last_row_mutators() {
        let mut batch = RowBatch::new(1.0 / 60.0);
        batch.begin_joint(some_body(), None);
        batch.add_angular_row(Unit::new_normalize(Vector3::z()), 0.1);

        batch.set_spring_damper(100.0, 10.0);
        batch.set_stiffness(5.0); // clamps to 1.0
        batch.set_minimum_friction(0.5); // clamps to 0.0
        batch.set_maximum_friction(20.0);

        let row = &batch.rows()[0];
        assert_eq!(
            row.response,
            RowResponse::SpringDamper {
                spring: 100.0,
                damper: 10.0
            }
        );
        assert_relative_eq!(row.stiffness, 1.0, epsilon = 1e-12);
        assert_relative_eq!(row.min_force, 0.0, epsilon = 1e-12);
        assert_relative_eq!(row.max_force, 20.0, epsilon = 1e-12);
    }

    #[test]
    fn test_row_ranges_per_joint() {
        let mut batch = RowBatch::new(1.0 / 60.0);
        let start_a = batch.begin_joint(some_body(), None);
        batch.add_angular_row(Unit::new_normalize(Vector3::z()), 0.0);
        batch.add_angular_row(Unit::new_normalize(Vector3::y()), 0.0);
        let start_b = batch.begin_joint(some_body(), None);
        batch.add_angular_row(Unit::new_normalize(Vector3::x()), 0.0);

        assert_eq!(start_a, 0);
        assert_eq!(start_b, 2);
        assert_eq!(batch.len(), 3);
    }
}

//! Reference row solver.
//!
//! The subsystem targets an external iterative solver; this module is the
//! minimal in-repo stand-in so the crate is testable end-to-end. It runs
//! projected Gauss-Seidel over the submitted rows at the velocity level:
//! each row's target velocity encodes its response tag (position-error
//! feedback, spring-damper, zero-acceleration, or an explicit
//! acceleration), and accumulated impulses are clamped to the row's force
//! bounds. Resolved forces are written back onto the rows for the
//! breaking-force monitor.

use nalgebra::{Matrix3, Vector3};

use crate::arena::Arena;
use crate::body::{Body, BodyId};
use crate::row::{ConstraintRow, RowAxis, RowBatch, RowResponse};

/// Tuning for the reference solver.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverConfig {
    /// Gauss-Seidel iterations per step.
    pub iterations: usize,

    /// Position-error feedback factor per step (0 = none, 1 = full).
    pub error_reduction: f64,

    /// Cap on the correction velocity injected by position feedback
    /// (m/s or rad/s), so deep errors do not explode.
    pub max_correction_velocity: f64,

    /// Small denominator regularization keeping near-singular rows tame.
    pub regularization: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            iterations: 16,
            error_reduction: 0.2,
            max_correction_velocity: 10.0,
            regularization: 1e-9,
        }
    }
}

impl SolverConfig {
    /// Higher-accuracy settings for articulated mechanisms.
    #[must_use]
    pub fn robotics() -> Self {
        Self {
            iterations: 32,
            error_reduction: 0.1,
            max_correction_velocity: 5.0,
            regularization: 1e-10,
        }
    }

    /// Cheaper settings for real-time scenes.
    #[must_use]
    pub fn realtime() -> Self {
        Self {
            iterations: 8,
            error_reduction: 0.3,
            max_correction_velocity: 20.0,
            regularization: 1e-9,
        }
    }
}

/// Per-row precomputed Jacobian pieces and the fixed velocity target.
struct RowWork {
    child: BodyId,
    parent: Option<BodyId>,
    j_lin: Vector3<f64>,
    j_ang_child: Vector3<f64>,
    j_ang_parent: Vector3<f64>,
    inv_mass_child: f64,
    inv_mass_parent: f64,
    inv_inertia_child: Matrix3<f64>,
    inv_inertia_parent: Matrix3<f64>,
    effective_inv_mass: f64,
    target_velocity: f64,
    min_impulse: f64,
    max_impulse: f64,
}

impl RowWork {
    fn relative_velocity(&self, bodies: &Arena<Body>) -> f64 {
        let mut v = 0.0;
        if let Some(child) = bodies.get(self.child) {
            v += self.j_lin.dot(&child.twist().linear) + self.j_ang_child.dot(&child.twist().angular);
        }
        if let Some(parent) = self.parent.and_then(|id| bodies.get(id)) {
            v -= self.j_lin.dot(&parent.twist().linear)
                + self.j_ang_parent.dot(&parent.twist().angular);
        }
        v
    }

    fn apply_impulse(&self, bodies: &mut Arena<Body>, impulse: f64) {
        if let Some(child) = bodies.get_mut(self.child) {
            let state = child.state_mut();
            state.twist.linear += self.j_lin * (self.inv_mass_child * impulse);
            state.twist.angular += self.inv_inertia_child * self.j_ang_child * impulse;
        }
        if let Some(parent) = self.parent {
            if let Some(parent) = bodies.get_mut(parent) {
                let state = parent.state_mut();
                state.twist.linear -= self.j_lin * (self.inv_mass_parent * impulse);
                state.twist.angular -= self.inv_inertia_parent * self.j_ang_parent * impulse;
            }
        }
    }
}

/// The reference projected-Gauss-Seidel solver.
#[derive(Debug, Clone, Default)]
pub struct RowSolver {
    config: SolverConfig,
}

impl RowSolver {
    /// Create a solver with the given configuration.
    #[must_use]
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Mutable access to the configuration.
    pub fn config_mut(&mut self) -> &mut SolverConfig {
        &mut self.config
    }

    /// Resolve all rows in the batch against current body velocities.
    ///
    /// Velocities are updated in place; each row's resolved force is
    /// written back for post-solve inspection.
    pub fn solve(&self, batch: &mut RowBatch, bodies: &mut Arena<Body>) {
        let dt = batch.timestep();
        if dt <= 0.0 || batch.is_empty() {
            return;
        }

        let mut work: Vec<Option<RowWork>> = batch
            .rows()
            .iter()
            .map(|row| self.prepare(row, bodies, dt))
            .collect();

        for _ in 0..self.config.iterations {
            for (row, work) in batch.rows_mut().iter_mut().zip(work.iter_mut()) {
                let Some(work) = work else { continue };

                let v = work.relative_velocity(bodies);
                let delta = (work.target_velocity - v)
                    / (work.effective_inv_mass + self.config.regularization);

                let accumulated = (row.impulse + delta).clamp(work.min_impulse, work.max_impulse);
                let applied = accumulated - row.impulse;
                row.impulse = accumulated;

                work.apply_impulse(bodies, applied);
            }
        }

        for row in batch.rows_mut() {
            row.resolved_force = row.impulse / dt;
        }
    }

    /// Build the Jacobian pieces and the fixed velocity target for a row.
    /// Rows touching stale bodies, or with no resolvable mass, are skipped.
    fn prepare(&self, row: &ConstraintRow, bodies: &Arena<Body>, dt: f64) -> Option<RowWork> {
        let child = bodies.get(row.child)?;
        let parent = row.parent.map(|id| bodies.get(id)).unwrap_or_default();
        if row.parent.is_some() && parent.is_none() {
            return None;
        }

        let (j_lin, j_ang_child, j_ang_parent) = match row.axis {
            RowAxis::Linear {
                anchor_child,
                anchor_parent,
                dir,
            } => {
                let r_child = anchor_child - child.center_of_mass_world();
                let r_parent = parent
                    .map(|p| anchor_parent - p.center_of_mass_world())
                    .unwrap_or_else(Vector3::zeros);
                (
                    dir.into_inner(),
                    r_child.cross(&dir),
                    r_parent.cross(&dir),
                )
            }
            RowAxis::Angular { dir } => {
                (Vector3::zeros(), dir.into_inner(), dir.into_inner())
            }
        };

        let inv_mass_child = child.inverse_mass();
        let inv_inertia_child = child.inverse_inertia_world();
        let inv_mass_parent = parent.map_or(0.0, Body::inverse_mass);
        let inv_inertia_parent = parent.map_or_else(Matrix3::zeros, Body::inverse_inertia_world);

        let effective_inv_mass = inv_mass_child * j_lin.norm_squared()
            + j_ang_child.dot(&(inv_inertia_child * j_ang_child))
            + inv_mass_parent * j_lin.norm_squared()
            + j_ang_parent.dot(&(inv_inertia_parent * j_ang_parent));

        if effective_inv_mass < 1e-12 {
            return None;
        }

        let mut work = RowWork {
            child: row.child,
            parent: row.parent,
            j_lin,
            j_ang_child,
            j_ang_parent,
            inv_mass_child,
            inv_mass_parent,
            inv_inertia_child,
            inv_inertia_parent,
            effective_inv_mass,
            target_velocity: 0.0,
            min_impulse: row.min_force * dt,
            max_impulse: row.max_force * dt,
        };

        let v0 = work.relative_velocity(bodies);
        let correction_cap = self.config.max_correction_velocity;

        work.target_velocity = match row.response {
            RowResponse::Stabilized => {
                let bias = self.config.error_reduction * row.position_error / dt;
                -(row.stiffness * bias.clamp(-correction_cap, correction_cap))
            }
            RowResponse::ZeroAcceleration => 0.0,
            RowResponse::Acceleration(accel) => v0 + accel * dt,
            RowResponse::SpringDamper { spring, damper } => {
                let accel = row.stiffness * (-spring * row.position_error - damper * v0);
                v0 + accel * dt
            }
        };

        Some(work)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use axle_types::{BodyState, Frame, MassProperties, Twist};
    use nalgebra::{Point3, Unit};

    const DT: f64 = 1.0 / 60.0;

    fn unit_body_at(x: f64) -> Body {
        Body::new(
            BodyState::at_rest(Frame::from_position(Point3::new(x, 0.0, 0.0))),
            MassProperties::sphere(1.0, 0.5),
        )
    }

    #[test]
    fn test_stabilized_row_pulls_error_down() {
        let mut bodies = Arena::new();
        let id = bodies.insert(unit_body_at(0.1));

        let mut batch = RowBatch::new(DT);
        batch.begin_joint(id, None);
        // Child anchor 0.1 ahead of the world anchor along X.
        batch.add_linear_row(
            Point3::new(0.1, 0.0, 0.0),
            Point3::origin(),
            Unit::new_normalize(Vector3::x()),
        );

        let solver = RowSolver::default();
        solver.solve(&mut batch, &mut bodies);

        let v = bodies.get(id).map(|b| b.twist().linear.x).unwrap_or(0.0);
        let expected = -solver.config().error_reduction * 0.1 / DT;
        assert_relative_eq!(v, expected, epsilon = 1e-6);
        assert!(batch.rows()[0].resolved_force() < 0.0);
    }

    #[test]
    fn test_friction_bounds_clamp_force() {
        let mut bodies = Arena::new();
        let id = bodies.insert(Body::new(
            BodyState::new(Frame::identity(), Twist::new(Vector3::x(), Vector3::zeros())),
            MassProperties::sphere(1.0, 0.5),
        ));

        let mut batch = RowBatch::new(DT);
        batch.begin_joint(id, None);
        batch.add_linear_row(
            Point3::origin(),
            Point3::origin(),
            Unit::new_normalize(Vector3::x()),
        );
        batch.set_zero_acceleration();
        batch.set_minimum_friction(-0.5);
        batch.set_maximum_friction(0.5);

        let solver = RowSolver::default();
        solver.solve(&mut batch, &mut bodies);

        // Unbounded, the row would remove all of v = 1 m/s; the 0.5 N
        // bound only allows an impulse of 0.5 * dt.
        let v = bodies.get(id).map(|b| b.twist().linear.x).unwrap_or(0.0);
        assert_relative_eq!(v, 1.0 - 0.5 * DT, epsilon = 1e-9);
        assert_relative_eq!(batch.rows()[0].resolved_force(), -0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_acceleration_target() {
        let mut bodies = Arena::new();
        let id = bodies.insert(unit_body_at(0.0));

        let mut batch = RowBatch::new(DT);
        batch.begin_joint(id, None);
        batch.add_angular_row(Unit::new_normalize(Vector3::z()), 0.0);
        batch.set_acceleration(2.0);

        RowSolver::default().solve(&mut batch, &mut bodies);

        let omega = bodies.get(id).map(|b| b.twist().angular.z).unwrap_or(0.0);
        assert_relative_eq!(omega, 2.0 * DT, epsilon = 1e-9);
    }

    #[test]
    fn test_static_pair_skipped() {
        let mut bodies = Arena::new();
        let id = bodies.insert(Body::fixed(Frame::identity()));

        let mut batch = RowBatch::new(DT);
        batch.begin_joint(id, None);
        batch.add_angular_row(Unit::new_normalize(Vector3::z()), 0.5);

        RowSolver::default().solve(&mut batch, &mut bodies);
        assert_relative_eq!(batch.rows()[0].resolved_force(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_spring_damper_direction() {
        let mut bodies = Arena::new();
        let id = bodies.insert(unit_body_at(0.2));

        let mut batch = RowBatch::new(DT);
        batch.begin_joint(id, None);
        batch.add_linear_row(
            Point3::new(0.2, 0.0, 0.0),
            Point3::origin(),
            Unit::new_normalize(Vector3::x()),
        );
        batch.set_spring_damper(50.0, 5.0);

        RowSolver::default().solve(&mut batch, &mut bodies);

        // Spring pulls the positive error back toward zero.
        let v = bodies.get(id).map(|b| b.twist().linear.x).unwrap_or(0.0);
        assert!(v < 0.0);
    }
}

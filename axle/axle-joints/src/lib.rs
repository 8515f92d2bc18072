//! Joint constraints for iterative rigid-body solvers.
//!
//! This crate expresses mechanical relationships between pairs of rigid
//! bodies - hinges, sliders, motors, servos, springs, ball-and-sockets,
//! path-following pistons - as per-timestep linear/angular constraint
//! rows consumed by a row-based solver.
//!
//! # Joint Kinds
//!
//! - [`Fixed`]: rigid weld (breakable with a force threshold)
//! - [`BallAndSocket`]: 3 free rotations, optional cone limit
//! - [`Hinge`] / [`Motor`] / [`Servo`]: single-axis rotation - free,
//!   speed-controlled, and position-controlled
//! - [`Slider`] / [`Piston`]: single-axis translation - free and
//!   position-controlled
//! - [`Spring`]: six-axis spring-damper coupling
//! - [`Corkscrew`]: coupled translation + rotation about one axis
//! - [`Universal`]: two perpendicular rotation axes
//! - [`UpVector`]: holds a body axis against a reference direction
//! - [`CurvyPiston`]: piston whose travel axis is a waypoint path
//!
//! # Shared Machinery
//!
//! Every kind follows the same per-step pattern: reconstruct the global
//! joint frames from local frames cached at connect time, add lock rows
//! for each non-free axis (hard, spring-damper, or velocity-level per
//! the joint's [`ConstraintMode`]), update backward-difference telemetry,
//! then add a limit stop, friction row, or rate-limited controller row
//! for the free axis. Continuous angles come from [`AngularIntegrator`],
//! which never folds at ±180°.
//!
//! # Lifecycle
//!
//! [`JointWorld`] owns bodies, joints and skeletons behind generational
//! handles. Joints are created detached, connect to a child body (the
//! moment their local frames are computed), and disconnect either
//! through the API or through the breaking-force monitor - the latter
//! never mid-step, only via the pending-disconnect queue drained between
//! steps.
//!
//! # Example
//!
//! ```
//! use axle_joints::{Body, Hinge, JointKind, JointWorld};
//! use axle_types::{BodyState, Frame, MassProperties};
//! use nalgebra::{Point3, Vector3};
//!
//! let mut world = JointWorld::new(1.0 / 60.0);
//! let door = world.add_body(Body::new(
//!     BodyState::at_rest(Frame::from_position(Point3::new(0.5, 0.0, 0.0))),
//!     MassProperties::box_shape(2.0, Vector3::new(0.5, 0.05, 1.0)),
//! ));
//!
//! // World-fixed hinge about Z at the door edge, swinging ±90°.
//! let pin = Frame::from_primary_axis(Point3::origin(), Vector3::z());
//! let hinge = world
//!     .create_joint(
//!         JointKind::Hinge(Hinge::new().with_limits(-1.57, 1.57)),
//!         None,
//!         pin,
//!     )
//!     .unwrap();
//! world.connect(hinge, door).unwrap();
//!
//! world.step();
//! assert!(world.connected(hinge));
//! ```
//!
//! # Solver Boundary
//!
//! The target solver is external; rows carry everything it needs
//! (Jacobian halves, response tags, stiffness weights, friction bounds)
//! and resolved forces flow back for the breaking-force monitor. The
//! in-repo [`RowSolver`] is a minimal projected-Gauss-Seidel stand-in so
//! the crate is testable end-to-end.

#![doc(html_root_url = "https://docs.rs/axle-joints/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,  // Many methods can't be const due to nalgebra
    clippy::module_name_repetitions,
)]

mod angle;
mod arena;
mod body;
mod joint;
mod row;
mod skeleton;
mod solver;
mod world;

pub use angle::AngularIntegrator;
pub use arena::{Arena, Handle};
pub use body::{Body, BodyId};
pub use joint::{
    AxisTelemetry, BallAndSocket, ConstraintMode, Corkscrew, CurvyPiston, DofKind, Drive, Fixed,
    FlexParams, Hinge, Joint, JointId, JointKind, LimitDescriptor, LimitSide, Limits, Motor,
    PathSample, Piston, Servo, Slider, Spring, Universal, UpVector, WaypointPath,
};
pub use row::{ConstraintRow, RowAxis, RowBatch, RowResponse};
pub use skeleton::{BoneIndex, SkeletonContainer, SkeletonId, SkeletonSolverMode};
pub use solver::{RowSolver, SolverConfig};
pub use world::{JointEvent, JointWorld};

// Re-export the shared data types alongside the machinery.
pub use axle_types::{BodyState, Frame, JointError, MassProperties, Result, Twist};

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_public_surface_composes() {
        let mut world = JointWorld::default();
        let body = world.add_body(Body::new(
            BodyState::default(),
            MassProperties::point_mass(1.0),
        ));

        let joint = world
            .create_joint(
                JointKind::BallAndSocket(BallAndSocket::new()),
                None,
                Frame::identity(),
            )
            .unwrap();
        world.connect(joint, body).unwrap();
        world.step();

        assert_eq!(world.joint(joint).unwrap().free_dof(), 3);
        assert!(world.pending_disconnects().is_empty());
    }
}

//! Core types for the axle joint constraint subsystem.
//!
//! This crate provides the foundational data types shared by the joint
//! machinery and its collaborators:
//!
//! - [`Frame`] - Position and orientation of a joint or body in 3D space
//! - [`Twist`] - Linear and angular velocity of a rigid body
//! - [`MassProperties`] - Mass, center of mass, inertia tensor
//! - [`BodyState`] - Frame + twist of a rigid body
//! - [`JointError`] - Typed failures at the joint API boundary
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They carry no constraint logic, no
//! integration, no solver state. They are the common language between:
//!
//! - The joint constraint subsystem (`axle-joints`)
//! - Host rigid-body engines feeding body kinematics in
//! - Tooling that inspects or serializes joint configurations
//!
//! # Frames
//!
//! Joints reason about three frames (see the `axle-joints` docs): the
//! *pin frame* a joint is created with, and the two *local frames* cached
//! against each connected body. All of them are a [`Frame`]: a position
//! plus a unit quaternion, with the local X axis acting as the primary
//! (free) axis of single-axis joints.
//!
//! # Example
//!
//! ```
//! use axle_types::Frame;
//! use nalgebra::{Point3, Vector3};
//!
//! // A pin frame at the origin whose primary axis points along world Z.
//! let pin = Frame::from_primary_axis(Point3::origin(), Vector3::z());
//! let axis = pin.primary_axis();
//! assert!((axis.z - 1.0).abs() < 1e-12);
//! ```

#![doc(html_root_url = "https://docs.rs/axle-types/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,  // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,      // mul_add style changes aren't always clearer
)]

mod body;
mod error;
mod frame;

pub use body::{BodyState, MassProperties, Twist};
pub use error::JointError;
pub use frame::Frame;

// Re-export math types for convenience
pub use nalgebra::{Isometry3, Matrix3, Point3, Unit, UnitQuaternion, Vector3};

/// Result type for joint operations.
pub type Result<T> = std::result::Result<T, JointError>;

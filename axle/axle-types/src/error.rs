//! Error types for joint operations.
//!
//! Validation failures are reported synchronously at the API boundary;
//! nothing in the per-step submission path returns an error (degenerate
//! inputs there are skipped or clamped for the frame instead).

use thiserror::Error;

/// Errors returned by the joint API.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum JointError {
    /// A joint handle refers to a destroyed or never-created joint.
    #[error("stale joint handle")]
    StaleJoint,

    /// A body handle refers to a removed or never-created body.
    #[error("stale body handle")]
    StaleBody,

    /// A skeleton handle refers to a destroyed or never-created skeleton.
    #[error("stale skeleton handle")]
    StaleSkeleton,

    /// `connect` called on a joint that already has a child.
    #[error("joint is already connected")]
    AlreadyConnected,

    /// `disconnect` (or a connected-only operation) called on a detached joint.
    #[error("joint is not connected")]
    NotConnected,

    /// The child passed to `connect` is the joint's own parent.
    #[error("joint child and parent must be distinct bodies")]
    SelfParenting,

    /// The child body belongs to a different world than the joint.
    #[error("joint and child body belong to different worlds")]
    WorldMismatch,

    /// A path-following joint needs at least two waypoints.
    #[error("path requires at least 2 waypoints, got {0}")]
    PathTooShort(usize),

    /// A path-following joint was given waypoints with no usable length.
    #[error("path has no segment longer than the degeneracy epsilon")]
    PathDegenerate,

    /// A bone was attached to a skeleton that is already finalized.
    #[error("skeleton is finalized; no more bones can be attached")]
    SkeletonFinalized,

    /// A bone index does not exist in the skeleton.
    #[error("bone index {0} does not exist in the skeleton")]
    UnknownBone(usize),

    /// A numeric input contained `NaN` or `Inf`.
    #[error("non-finite value passed for {0}")]
    NonFinite(&'static str),
}

impl JointError {
    /// Whether this error indicates a stale (destroyed) handle.
    #[must_use]
    pub fn is_stale_handle(&self) -> bool {
        matches!(
            self,
            Self::StaleJoint | Self::StaleBody | Self::StaleSkeleton
        )
    }
}

//! Skeleton containers: hierarchical grouping hints for the solver.
//!
//! A skeleton is bookkeeping, not constraint math: it names a tree of
//! bodies so a solver with a hierarchical mode can factor them together.
//! Joints reference skeleton validity, which is why it lives behind the
//! same generational-arena handles as everything else.

use axle_types::{JointError, Result};

use crate::arena::Handle;
use crate::body::BodyId;

/// Handle to a skeleton stored in a [`crate::JointWorld`].
pub type SkeletonId = Handle<SkeletonContainer>;

/// Index of a bone within its skeleton.
pub type BoneIndex = usize;

/// How the solver should treat the grouped bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SkeletonSolverMode {
    /// Solve the tree with the solver's hierarchical path.
    #[default]
    Hierarchical,
    /// Fall back to plain row iteration.
    Iterative,
}

#[derive(Debug, Clone)]
struct Bone {
    body: BodyId,
    parent: Option<BoneIndex>,
}

/// A tree of bodies handed to the solver as one unit.
#[derive(Debug, Clone)]
pub struct SkeletonContainer {
    bones: Vec<Bone>,
    finalized: bool,
    mode: SkeletonSolverMode,
}

impl SkeletonContainer {
    /// Create a skeleton rooted at `root`.
    #[must_use]
    pub fn new(root: BodyId) -> Self {
        Self {
            bones: vec![Bone {
                body: root,
                parent: None,
            }],
            finalized: false,
            mode: SkeletonSolverMode::default(),
        }
    }

    /// The root bone's body.
    #[must_use]
    pub fn root(&self) -> BodyId {
        self.bones[0].body
    }

    /// Number of bones, root included.
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Whether the skeleton has been finalized.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// The solver mode hint.
    #[must_use]
    pub fn solver_mode(&self) -> SkeletonSolverMode {
        self.mode
    }

    /// Set the solver mode hint.
    pub fn set_solver_mode(&mut self, mode: SkeletonSolverMode) {
        self.mode = mode;
    }

    /// Attach `body` under the bone at `parent`. Fails after
    /// finalization or for an unknown parent index.
    pub fn attach_bone(&mut self, body: BodyId, parent: BoneIndex) -> Result<BoneIndex> {
        if self.finalized {
            return Err(JointError::SkeletonFinalized);
        }
        if parent >= self.bones.len() {
            return Err(JointError::UnknownBone(parent));
        }
        self.bones.push(Bone {
            body,
            parent: Some(parent),
        });
        Ok(self.bones.len() - 1)
    }

    /// The body of the bone at `index`.
    #[must_use]
    pub fn bone_body(&self, index: BoneIndex) -> Option<BodyId> {
        self.bones.get(index).map(|b| b.body)
    }

    /// The parent bone of the bone at `index` (`None` for the root).
    #[must_use]
    pub fn bone_parent(&self, index: BoneIndex) -> Option<BoneIndex> {
        self.bones.get(index).and_then(|b| b.parent)
    }

    /// Close the skeleton for attachment; the solver may now consume it.
    pub fn finalize(&mut self) {
        self.finalized = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::body::Body;
    use axle_types::{BodyState, MassProperties};

    fn body_id(arena: &mut Arena<Body>) -> BodyId {
        arena.insert(Body::new(BodyState::default(), MassProperties::default()))
    }

    #[test]
    fn test_tree_building() {
        let mut bodies = Arena::new();
        let root = body_id(&mut bodies);
        let thigh = body_id(&mut bodies);
        let shin = body_id(&mut bodies);

        let mut skeleton = SkeletonContainer::new(root);
        let thigh_bone = skeleton.attach_bone(thigh, 0).unwrap_or(usize::MAX);
        let shin_bone = skeleton.attach_bone(shin, thigh_bone).unwrap_or(usize::MAX);

        assert_eq!(skeleton.bone_count(), 3);
        assert_eq!(skeleton.bone_parent(shin_bone), Some(thigh_bone));
        assert_eq!(skeleton.bone_body(thigh_bone), Some(thigh));
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let mut bodies = Arena::new();
        let root = body_id(&mut bodies);
        let stray = body_id(&mut bodies);

        let mut skeleton = SkeletonContainer::new(root);
        assert_eq!(
            skeleton.attach_bone(stray, 7),
            Err(JointError::UnknownBone(7))
        );
    }

    #[test]
    fn test_finalize_closes_attachment() {
        let mut bodies = Arena::new();
        let root = body_id(&mut bodies);
        let late = body_id(&mut bodies);

        let mut skeleton = SkeletonContainer::new(root);
        skeleton.finalize();
        assert!(skeleton.is_finalized());
        assert_eq!(
            skeleton.attach_bone(late, 0),
            Err(JointError::SkeletonFinalized)
        );
    }

    #[test]
    fn test_solver_mode() {
        let mut bodies = Arena::new();
        let root = body_id(&mut bodies);

        let mut skeleton = SkeletonContainer::new(root);
        assert_eq!(skeleton.solver_mode(), SkeletonSolverMode::Hierarchical);
        skeleton.set_solver_mode(SkeletonSolverMode::Iterative);
        assert_eq!(skeleton.solver_mode(), SkeletonSolverMode::Iterative);
    }
}

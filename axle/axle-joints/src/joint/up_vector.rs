//! Up-vector joint: holds a body axis against a reference direction.
//!
//! Unlike the other kinds this one locks no translation at all: it
//! drives two angular rows so the child's primary axis tracks a
//! configurable world direction, leaving spin about that direction and
//! all translation free. The classic use is keeping a character capsule
//! upright without welding its position.

use axle_types::{Frame, JointError, Result};
use nalgebra::{Point3, Unit, Vector3};

use super::SubmitContext;

/// Drives the child's primary axis toward a reference world direction.
#[derive(Debug, Clone, Copy)]
pub struct UpVector {
    target: Vector3<f64>,
}

impl Default for UpVector {
    fn default() -> Self {
        Self::new(Vector3::z())
    }
}

impl UpVector {
    /// Create an up-vector joint tracking `direction` (normalized; a
    /// near-zero input falls back to world Z).
    #[must_use]
    pub fn new(direction: Vector3<f64>) -> Self {
        let norm = direction.norm();
        let target = if norm > 1e-9 && norm.is_finite() {
            direction / norm
        } else {
            Vector3::z()
        };
        Self { target }
    }

    /// The reference direction (unit, world coordinates).
    #[must_use]
    pub fn target_direction(&self) -> Vector3<f64> {
        self.target
    }

    /// Replace the reference direction. Fails on zero or non-finite
    /// input; the stored direction is always unit length.
    pub fn set_target_direction(&mut self, direction: Vector3<f64>) -> Result<()> {
        let norm = direction.norm();
        if !norm.is_finite() || norm < 1e-9 {
            return Err(JointError::NonFinite("up-vector direction"));
        }
        self.target = direction / norm;
        Ok(())
    }

    pub(crate) fn submit(&mut self, ctx: &mut SubmitContext<'_>) {
        let axis = ctx.frame_child.primary_axis();
        let misalign = axis.cross(&self.target);
        let sin = misalign.norm();

        if sin > 1e-6 {
            // One row rotates the axis toward the target, the second
            // pins the perpendicular drift.
            let n1 = Unit::new_unchecked(misalign / sin);
            ctx.align_axes(n1, &axis, &self.target);

            let n2 = Unit::new_normalize(self.target.cross(&n1));
            ctx.align_axes(n2, &axis, &self.target);
        } else {
            // Aligned (or anti-aligned): any orthogonal pair will do,
            // with near-zero errors.
            let basis = Frame::from_primary_axis(Point3::origin(), self.target);
            ctx.align_axes(
                Unit::new_unchecked(basis.lateral_axis()),
                &axis,
                &self.target,
            );
            ctx.align_axes(
                Unit::new_unchecked(basis.normal_axis()),
                &axis,
                &self.target,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::joint::testing::{submit_once, submit_once_from};
    use crate::joint::JointKind;
    use crate::row::RowAxis;
    use approx::assert_relative_eq;
    use axle_types::{BodyState, MassProperties};
    use nalgebra::UnitQuaternion;

    #[test]
    fn test_rejects_degenerate_direction() {
        let mut joint = UpVector::default();
        assert!(joint.set_target_direction(Vector3::zeros()).is_err());
        assert!(joint
            .set_target_direction(Vector3::new(f64::NAN, 0.0, 0.0))
            .is_err());
        // Unchanged after rejected input.
        assert_relative_eq!(joint.target_direction().z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_normalizes_direction() {
        let joint = UpVector::new(Vector3::new(0.0, 3.0, 0.0));
        assert_relative_eq!(joint.target_direction().norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(joint.target_direction().y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_no_linear_rows() {
        let mut kind = JointKind::UpVector(UpVector::default());
        let child = Body::new(BodyState::default(), MassProperties::default());

        let batch = submit_once(&mut kind, child, Frame::identity());
        assert_eq!(batch.len(), 2);
        assert!(batch
            .rows()
            .iter()
            .all(|r| matches!(r.axis, RowAxis::Angular { .. })));
    }

    #[test]
    fn test_misalignment_produces_error() {
        // Track world Z while the child's primary axis points along X
        // tilted 0.5 rad toward Z: the first row carries the error.
        let mut kind = JointKind::UpVector(UpVector::new(Vector3::z()));
        let child = Body::new(
            BodyState::at_rest(Frame::new(
                Point3::origin(),
                UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -0.5),
            )),
            MassProperties::default(),
        );

        let batch = submit_once_from(&mut kind, Frame::identity(), child, Frame::identity());
        let max_error = batch
            .rows()
            .iter()
            .map(|r| r.position_error.abs())
            .fold(0.0, f64::max);
        assert!(max_error > 0.1);
    }
}

//! Rigid weld between two bodies.

use nalgebra::Unit;

use super::SubmitContext;

/// A fixed joint: all six relative axes locked.
///
/// The degenerate instance of the shared submission pattern - every axis
/// is a lock row, there is no free axis, no limits and no telemetry.
/// Combined with a breaking-force threshold it models breakable welds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fixed {}

impl Fixed {
    /// Create a fixed joint payload.
    #[must_use]
    pub fn new() -> Self {
        Self {}
    }

    pub(crate) fn submit(&mut self, ctx: &mut SubmitContext<'_>) {
        ctx.lock_linear_all();

        // Two rows align the primary axes, the third removes twist.
        let front_child = ctx.frame_child.primary_axis();
        let front_parent = ctx.frame_parent.primary_axis();
        let up_parent = ctx.frame_parent.lateral_axis();
        let normal_parent = ctx.frame_parent.normal_axis();

        ctx.align_axes(Unit::new_unchecked(up_parent), &front_child, &front_parent);
        ctx.align_axes(
            Unit::new_unchecked(normal_parent),
            &front_child,
            &front_parent,
        );

        let up_child = ctx.frame_child.lateral_axis();
        ctx.align_axes(Unit::new_unchecked(front_parent), &up_child, &up_parent);
    }
}

//! Spring joint: six-axis spring-damper coupling.

use nalgebra::Unit;

use super::SubmitContext;

/// A spring-damper on all six relative axes toward the connect pose.
///
/// Unlike the other kinds, every row is soft regardless of the joint's
/// constraint mode: the spring-damper pair IS the joint. `elasticity`
/// scales both spring coefficients and clamps to [0.01, 2.0].
#[derive(Debug, Clone, Copy)]
pub struct Spring {
    linear_spring: f64,
    linear_damper: f64,
    angular_spring: f64,
    angular_damper: f64,
    elasticity: f64,
}

impl Default for Spring {
    fn default() -> Self {
        Self::new()
    }
}

impl Spring {
    /// Elasticity clamp range.
    pub const ELASTICITY_RANGE: (f64, f64) = (0.01, 2.0);

    /// Create a spring with moderate default coefficients.
    #[must_use]
    pub fn new() -> Self {
        Self {
            linear_spring: 200.0,
            linear_damper: 20.0,
            angular_spring: 50.0,
            angular_damper: 5.0,
            elasticity: 1.0,
        }
    }

    /// Set the linear spring-damper pair at construction (clamped ≥ 0).
    #[must_use]
    pub fn with_linear(mut self, spring: f64, damper: f64) -> Self {
        self.linear_spring = spring.max(0.0);
        self.linear_damper = damper.max(0.0);
        self
    }

    /// Set the angular spring-damper pair at construction (clamped ≥ 0).
    #[must_use]
    pub fn with_angular(mut self, spring: f64, damper: f64) -> Self {
        self.angular_spring = spring.max(0.0);
        self.angular_damper = damper.max(0.0);
        self
    }

    /// Linear spring-damper pair.
    #[must_use]
    pub fn linear(&self) -> (f64, f64) {
        (self.linear_spring, self.linear_damper)
    }

    /// Angular spring-damper pair.
    #[must_use]
    pub fn angular(&self) -> (f64, f64) {
        (self.angular_spring, self.angular_damper)
    }

    /// Set the linear spring-damper pair (clamped ≥ 0).
    pub fn set_linear(&mut self, spring: f64, damper: f64) {
        self.linear_spring = spring.max(0.0);
        self.linear_damper = damper.max(0.0);
    }

    /// Set the angular spring-damper pair (clamped ≥ 0).
    pub fn set_angular(&mut self, spring: f64, damper: f64) {
        self.angular_spring = spring.max(0.0);
        self.angular_damper = damper.max(0.0);
    }

    /// Elasticity scale applied to both springs.
    #[must_use]
    pub fn elasticity(&self) -> f64 {
        self.elasticity
    }

    /// Set the elasticity scale; clamped to [0.01, 2.0].
    pub fn set_elasticity(&mut self, elasticity: f64) {
        let (lo, hi) = Self::ELASTICITY_RANGE;
        self.elasticity = elasticity.clamp(lo, hi);
    }

    pub(crate) fn submit(&mut self, ctx: &mut SubmitContext<'_>) {
        let k_lin = self.linear_spring * self.elasticity;
        let k_ang = self.angular_spring * self.elasticity;

        // Three soft linear rows between the joint origins.
        for dir in [
            ctx.frame_parent.primary_axis(),
            ctx.frame_parent.lateral_axis(),
            ctx.frame_parent.normal_axis(),
        ] {
            ctx.batch.add_linear_row(
                ctx.frame_child.position,
                ctx.frame_parent.position,
                Unit::new_unchecked(dir),
            );
            ctx.batch.set_spring_damper(k_lin, self.linear_damper);
            ctx.batch.set_stiffness(ctx.stiffness);
        }

        // Three soft angular rows: two aligning the primary axes, one on
        // the twist.
        let front_child = ctx.frame_child.primary_axis();
        let front_parent = ctx.frame_parent.primary_axis();
        let up_parent = ctx.frame_parent.lateral_axis();
        let normal_parent = ctx.frame_parent.normal_axis();
        let up_child = ctx.frame_child.lateral_axis();

        let rows = [
            (up_parent, front_child, front_parent),
            (normal_parent, front_child, front_parent),
            (front_parent, up_child, up_parent),
        ];
        for (dir, axis_child, axis_parent) in rows {
            let error = axis_parent.cross(&axis_child).dot(&dir);
            ctx.batch.add_angular_row(Unit::new_unchecked(dir), error);
            ctx.batch.set_spring_damper(k_ang, self.angular_damper);
            ctx.batch.set_stiffness(ctx.stiffness);
        }
    }
}

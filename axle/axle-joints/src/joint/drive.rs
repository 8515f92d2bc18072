//! Rate-limited setpoint ramp shared by the controller-driven joints.
//!
//! Servo, Piston, Motor and CurvyPiston all approach their setpoint the
//! same way: the commanded step per tick is
//!
//! ```text
//! step = rate · min(1, |error| / (rate · reduction)) · Δt
//! ```
//!
//! i.e. full rate far from the target, proportionally reduced inside the
//! `rate · reduction` band so the axis settles without ringing, and never
//! stepping past the target.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Setpoint ramp parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Drive {
    rate: f64,
    reduction: f64,
}

impl Drive {
    /// Create a ramp with the given peak rate (units/s) and reduction
    /// ratio (seconds of slow-down band; clamped to ≥ 1 ms).
    #[must_use]
    pub fn new(rate: f64, reduction: f64) -> Self {
        Self {
            rate: rate.max(0.0),
            reduction: reduction.max(1e-3),
        }
    }

    /// Peak rate in units/s.
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Reduction ratio in seconds.
    #[must_use]
    pub fn reduction(&self) -> f64 {
        self.reduction
    }

    /// Set the peak rate (clamped to ≥ 0).
    pub fn set_rate(&mut self, rate: f64) {
        self.rate = rate.max(0.0);
    }

    /// Set the reduction ratio (clamped to ≥ 1 ms).
    pub fn set_reduction(&mut self, reduction: f64) {
        self.reduction = reduction.max(1e-3);
    }

    /// The commanded step toward the target for this tick, clipped to
    /// never overshoot.
    #[must_use]
    pub fn ramp_step(&self, error: f64, dt: f64) -> f64 {
        if error == 0.0 || dt <= 0.0 {
            return 0.0;
        }
        let band = self.rate * self.reduction;
        let scale = if band > 0.0 {
            (error.abs() / band).min(1.0)
        } else {
            1.0
        };
        let step = self.rate * scale * dt;
        step.min(error.abs()).copysign(error)
    }

    /// The acceleration that realizes this tick's ramp step from the
    /// current axis velocity.
    #[must_use]
    pub fn target_acceleration(&self, error: f64, velocity: f64, dt: f64) -> f64 {
        if dt <= 0.0 {
            return 0.0;
        }
        let desired_velocity = self.ramp_step(error, dt) / dt;
        (desired_velocity - velocity) / dt
    }
}

impl Default for Drive {
    fn default() -> Self {
        Self::new(1.0, 0.1)
    }
}

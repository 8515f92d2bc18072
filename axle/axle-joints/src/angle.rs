//! Continuous angle tracking across multiple revolutions.
//!
//! Joint telemetry and limit checks need an angle that does not fold at
//! ±180°: a motor that has turned 350° must not read −10°. The
//! [`AngularIntegrator`] consumes the instantaneous cosine/sine of the
//! relative angle each step and accumulates the signed delta between
//! consecutive samples, so the reported angle grows without wrapping.

/// Accumulates a continuous (non-wrapping) angle from incremental
/// cosine/sine pairs.
///
/// Each update computes the signed rotation between the previous and new
/// unit vector via the two-argument arctangent of their cross and dot
/// products and adds it to the accumulator. This is exact for any
/// per-step rotation under 180°, which physics step sizes guarantee in
/// practice. A rotation of exactly 180° in one step is ambiguous: the
/// delta lands on ±π at the mercy of floating-point rounding, and that
/// behavior is intentionally left as-is.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AngularIntegrator {
    cos: f64,
    sin: f64,
    angle: f64,
}

impl Default for AngularIntegrator {
    fn default() -> Self {
        Self::new()
    }
}

impl AngularIntegrator {
    /// Start at angle zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cos: 1.0,
            sin: 0.0,
            angle: 0.0,
        }
    }

    /// Start at a given angle (the start-angle bias of servo joints).
    #[must_use]
    pub fn from_angle(angle: f64) -> Self {
        Self {
            cos: angle.cos(),
            sin: angle.sin(),
            angle,
        }
    }

    /// The accumulated angle in radians.
    #[must_use]
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Reset the accumulator to a given angle.
    pub fn set_angle(&mut self, angle: f64) {
        self.cos = angle.cos();
        self.sin = angle.sin();
        self.angle = angle;
    }

    /// Feed the cosine/sine of the current relative angle; returns the
    /// updated accumulated angle.
    ///
    /// Near-zero input pairs (degenerate frames) leave the accumulator
    /// unchanged for the frame.
    pub fn update(&mut self, cos: f64, sin: f64) -> f64 {
        let mag = (cos * cos + sin * sin).sqrt();
        if mag < 1e-9 || !mag.is_finite() {
            return self.angle;
        }
        let (cos, sin) = (cos / mag, sin / mag);

        // Signed delta from the previous sample: cross and dot of the two
        // unit vectors are sin and cos of the step rotation.
        let delta = (self.cos * sin - self.sin * cos).atan2(self.cos * cos + self.sin * sin);

        self.cos = cos;
        self.sin = sin;
        self.angle += delta;
        self.angle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_accumulates_small_steps() {
        // N equal increments below 180° accumulate to N * increment.
        let inc = 10_f64.to_radians();
        let mut tracker = AngularIntegrator::new();

        for step in 1..=72 {
            let a = inc * f64::from(step);
            tracker.update(a.cos(), a.sin());
        }

        // Two full turns, no wrap.
        assert_relative_eq!(tracker.angle(), 72.0 * inc, epsilon = 1e-9);
        assert_relative_eq!(tracker.angle(), 4.0 * PI, epsilon = 1e-9);
    }

    #[test]
    fn test_negative_direction() {
        let inc = -0.3;
        let mut tracker = AngularIntegrator::new();

        for step in 1..=50 {
            let a = inc * f64::from(step);
            tracker.update(a.cos(), a.sin());
        }

        assert_relative_eq!(tracker.angle(), -15.0, epsilon = 1e-9);
    }

    #[test]
    fn test_does_not_fold_at_pi() {
        let mut tracker = AngularIntegrator::new();

        // 350° in 1.75 rad-ish chunks; the raw atan2 of the final pose
        // would report -10°.
        let target = 350_f64.to_radians();
        let steps = 10;
        for step in 1..=steps {
            let a = target * f64::from(step) / f64::from(steps);
            tracker.update(a.cos(), a.sin());
        }

        assert_relative_eq!(tracker.angle(), target, epsilon = 1e-9);
        assert!(tracker.angle() > PI);
    }

    #[test]
    fn test_step_just_under_pi() {
        let inc = PI - 1e-3;
        let mut tracker = AngularIntegrator::new();
        tracker.update(inc.cos(), inc.sin());
        assert_relative_eq!(tracker.angle(), inc, epsilon = 1e-9);
    }

    #[test]
    fn test_start_angle_bias() {
        let mut tracker = AngularIntegrator::from_angle(2.0 * PI);
        assert_relative_eq!(tracker.angle(), 2.0 * PI, epsilon = 1e-12);

        // Continues from the biased value.
        let a = 2.0 * PI + 0.25;
        tracker.update(a.cos(), a.sin());
        assert_relative_eq!(tracker.angle(), a, epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_input_skipped() {
        let mut tracker = AngularIntegrator::from_angle(1.0);
        tracker.update(0.0, 0.0);
        assert_relative_eq!(tracker.angle(), 1.0, epsilon = 1e-12);
        tracker.update(f64::NAN, 0.5);
        assert_relative_eq!(tracker.angle(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unnormalized_input() {
        let mut tracker = AngularIntegrator::new();
        // Scaled (cos, sin) pair still lands on the right angle.
        tracker.update(3.0 * 0.5_f64.cos(), 3.0 * 0.5_f64.sin());
        assert_relative_eq!(tracker.angle(), 0.5, epsilon = 1e-9);
    }
}

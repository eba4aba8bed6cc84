//! Transition Shaping
//!
//! Pure numeric helpers used to move a simulated value from where it is to
//! where a scenario wants it to be. Nothing here holds state or draws random
//! numbers; out-of-range inputs are clamped, never rejected.
//!
//! ## Example
//!
//! ```rust
//! use hrsim_core::transitions::{bounded_step, ease_in_out, interpolate};
//!
//! // Heart rate may move at most 4 units this step
//! assert_eq!(bounded_step(60.0, 120.0, 4.0), 64.0);
//! assert_eq!(bounded_step(118.0, 120.0, 4.0), 120.0);
//!
//! assert_eq!(interpolate(60.0, 120.0, 0.5), 90.0);
//! assert_eq!(ease_in_out(0.5), 0.5);
//! ```

/// Linear interpolation from `current` toward `target`.
///
/// `alpha` is clamped to [0, 1], so the result always lies on the segment
/// between the two values.
#[inline]
pub fn interpolate(current: f64, target: f64, alpha: f64) -> f64 {
    current + (target - current) * alpha.clamp(0.0, 1.0)
}

/// Rate-limited step toward `target`.
///
/// Moves at most `max_step` away from `current`. When the remaining gap is
/// within `max_step` the target is returned exactly, so repeated calls
/// settle instead of creeping toward it forever.
///
/// A negative `max_step` is treated as zero.
#[inline]
pub fn bounded_step(current: f64, target: f64, max_step: f64) -> f64 {
    let max_step = max_step.max(0.0);
    let difference = target - current;
    if difference.abs() <= max_step {
        return target;
    }

    let mut next = if difference > 0.0 {
        current + max_step
    } else {
        current - max_step
    };
    // The addition rounds; pull back until the move fits the limit
    while (next - current).abs() > max_step {
        next = ulp_toward(next, current);
    }
    next
}

/// The neighbouring `f64` of `value` in the direction of `toward`
fn ulp_toward(value: f64, toward: f64) -> f64 {
    if value == toward || value.is_nan() || toward.is_nan() {
        return value;
    }
    if value == 0.0 {
        return f64::from_bits(1).copysign(toward);
    }
    let bits = value.to_bits();
    if (value < toward) == (value > 0.0) {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}

/// Fraction of a transition completed after `elapsed` seconds.
///
/// A zero or negative `duration` means the transition is instantaneous and
/// always reports `1.0`.
#[inline]
pub fn progress(elapsed: f64, duration: f64) -> f64 {
    if duration <= 0.0 {
        return 1.0;
    }
    (elapsed / duration).clamp(0.0, 1.0)
}

/// Smoothstep easing curve, `t² (3 − 2t)` on `t` clamped to [0, 1].
#[inline]
pub fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_interpolate_clamps_alpha() {
        assert_eq!(interpolate(60.0, 120.0, -0.5), 60.0);
        assert_eq!(interpolate(60.0, 120.0, -100.0), 60.0);
        assert_eq!(interpolate(60.0, 120.0, 1.5), 120.0);
        assert_eq!(interpolate(60.0, 120.0, 42.0), 120.0);
    }

    #[test]
    fn test_interpolate_midpoint() {
        assert_relative_eq!(interpolate(60.0, 120.0, 0.5), 90.0);
        assert_relative_eq!(interpolate(120.0, 60.0, 0.5), 90.0);
        assert_relative_eq!(interpolate(-10.0, 10.0, 0.25), -5.0);
    }

    #[test]
    fn test_interpolate_stays_on_segment() {
        for i in 0..=20 {
            let alpha = i as f64 / 20.0;
            let v = interpolate(80.0, 50.0, alpha);
            assert!((50.0..=80.0).contains(&v), "alpha={} gave {}", alpha, v);
        }
    }

    #[test]
    fn test_bounded_step_up_and_down() {
        assert_eq!(bounded_step(60.0, 120.0, 5.0), 65.0);
        assert_eq!(bounded_step(120.0, 60.0, 5.0), 115.0);
    }

    #[test]
    fn test_bounded_step_snaps_to_target() {
        assert_eq!(bounded_step(118.0, 120.0, 5.0), 120.0);
        assert_eq!(bounded_step(121.0, 120.0, 1.0), 120.0);
        assert_eq!(bounded_step(75.5, 75.5, 0.0), 75.5);
    }

    #[test]
    fn test_bounded_step_never_exceeds_limit() {
        let cases = [
            (60.0, 180.0, 4.0),
            (180.0, 40.0, 0.4),
            (72.0, 72.5, 0.1),
            (30.0, 220.0, 0.0),
            (100.0, 99.0, 3.0),
        ];
        for (current, target, max_step) in cases {
            let next = bounded_step(current, target, max_step);
            assert!(
                (next - current).abs() <= max_step,
                "step from {} toward {} moved {}",
                current,
                target,
                (next - current).abs()
            );
            if (target - current).abs() <= max_step {
                assert_eq!(next, target);
            }
        }
    }

    #[test]
    fn test_bounded_step_limit_survives_rounding() {
        // Fractional steps over a wide range of baselines, both directions
        for i in 0..2000 {
            let current = 30.0 + i as f64 * 0.0957;
            for max_step in [0.4, 0.1, 0.3, 4.0 * 0.7, 1.0 / 3.0] {
                for target in [current - 60.0, current + 60.0] {
                    let next = bounded_step(current, target, max_step);
                    assert!(
                        (next - current).abs() <= max_step,
                        "step from {} toward {} by {} moved {}",
                        current,
                        target,
                        max_step,
                        (next - current).abs()
                    );
                    assert!((next - target).abs() < (current - target).abs());
                }
            }
        }
    }

    #[test]
    fn test_bounded_step_negative_limit_holds_still() {
        assert_eq!(bounded_step(80.0, 120.0, -2.0), 80.0);
        assert_eq!(bounded_step(80.0, 80.0, -2.0), 80.0);
    }

    #[test]
    fn test_bounded_step_converges() {
        let mut rate = 60.0;
        for _ in 0..100 {
            rate = bounded_step(rate, 120.0, 4.0);
        }
        assert_eq!(rate, 120.0);
    }

    #[test]
    fn test_progress() {
        assert_eq!(progress(0.0, 10.0), 0.0);
        assert_relative_eq!(progress(2.5, 10.0), 0.25);
        assert_eq!(progress(15.0, 10.0), 1.0);
        assert_eq!(progress(-1.0, 10.0), 0.0);
    }

    #[test]
    fn test_progress_degenerate_duration() {
        assert_eq!(progress(0.0, 0.0), 1.0);
        assert_eq!(progress(3.0, 0.0), 1.0);
        assert_eq!(progress(-3.0, -1.0), 1.0);
    }

    #[test]
    fn test_progress_monotonic() {
        let mut last = progress(-1.0, 4.0);
        for i in 0..60 {
            let p = progress(i as f64 * 0.1, 4.0);
            assert!(p >= last);
            last = p;
        }
    }

    #[test]
    fn test_ease_in_out_endpoints_and_symmetry() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(1.0), 1.0);
        assert_eq!(ease_in_out(-2.0), 0.0);
        assert_eq!(ease_in_out(3.0), 1.0);
        assert_relative_eq!(ease_in_out(0.5), 0.5);

        for i in 0..=10 {
            let t = i as f64 / 20.0;
            assert_relative_eq!(ease_in_out(t) + ease_in_out(1.0 - t), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_ease_in_out_monotonic() {
        let mut last = 0.0;
        for i in 0..=100 {
            let v = ease_in_out(i as f64 / 100.0);
            assert!(v >= last);
            last = v;
        }
    }
}

//! Acceleration curves that shape raw window progress into effect intensity.
//!
//! Every curve is a pure function on `[0, 1]` with fixed endpoints, so the
//! engine applies them unconditionally on each tick.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Shaping function applied to linear progress before it is published.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccelerationCurve {
    /// Progress is published unchanged.
    #[default]
    Linear,
    /// Quadratic ease-in, `p²`.
    EaseIn,
    /// Quadratic ease-out, `1 − (1 − p)²`.
    EaseOut,
    /// Quadratic ease-in for the first half, ease-out for the second.
    EaseInOut,
    /// Stays near zero for most of the window, then rises sharply: `2^(10(p − 1))`.
    Exponential,
    /// Rises quickly at first, then flattens: `log10(1 + 9p)`.
    Logarithmic,
}

impl AccelerationCurve {
    /// Every available curve, in menu order.
    pub const ALL: [AccelerationCurve; 6] = [
        AccelerationCurve::Linear,
        AccelerationCurve::EaseIn,
        AccelerationCurve::EaseOut,
        AccelerationCurve::EaseInOut,
        AccelerationCurve::Exponential,
        AccelerationCurve::Logarithmic,
    ];

    /// Shape `progress`. Input is clamped to `[0, 1]` (NaN counts as 0) and
    /// the result always lies in `[0, 1]` with `apply(0) == 0`, `apply(1) == 1`.
    pub fn apply(self, progress: f64) -> f64 {
        let p = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };

        let shaped = match self {
            AccelerationCurve::Linear => p,
            AccelerationCurve::EaseIn => p * p,
            AccelerationCurve::EaseOut => 1.0 - (1.0 - p) * (1.0 - p),
            AccelerationCurve::EaseInOut => {
                if p < 0.5 {
                    2.0 * p * p
                } else {
                    1.0 - (-2.0 * p + 2.0).powi(2) / 2.0
                }
            }
            AccelerationCurve::Exponential => {
                if p <= 0.0 {
                    0.0
                } else {
                    // 2^0 is exactly 1.0, so the top endpoint holds without a special case
                    2f64.powf(10.0 * (p - 1.0))
                }
            }
            AccelerationCurve::Logarithmic => {
                if p <= 0.0 {
                    0.0
                } else if p >= 1.0 {
                    1.0
                } else {
                    (1.0 + 9.0 * p).log10()
                }
            }
        };

        shaped.clamp(0.0, 1.0)
    }

    /// Configuration name, e.g. `ease-in-out`.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccelerationCurve::Linear => "linear",
            AccelerationCurve::EaseIn => "ease-in",
            AccelerationCurve::EaseOut => "ease-out",
            AccelerationCurve::EaseInOut => "ease-in-out",
            AccelerationCurve::Exponential => "exponential",
            AccelerationCurve::Logarithmic => "logarithmic",
        }
    }

    /// Human readable label for settings screens.
    pub fn display_name(&self) -> &'static str {
        match self {
            AccelerationCurve::Linear => "Linear",
            AccelerationCurve::EaseIn => "Ease In",
            AccelerationCurve::EaseOut => "Ease Out",
            AccelerationCurve::EaseInOut => "Ease In/Out",
            AccelerationCurve::Exponential => "Exponential",
            AccelerationCurve::Logarithmic => "Logarithmic",
        }
    }
}

impl fmt::Display for AccelerationCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccelerationCurve {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        AccelerationCurve::ALL
            .into_iter()
            .find(|curve| curve.as_str() == normalized)
            .ok_or_else(|| {
                let names: Vec<_> = AccelerationCurve::ALL.iter().map(|c| c.as_str()).collect();
                format!("Unknown curve '{s}'. Expected one of: {}", names.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_endpoints_are_exact() {
        for curve in AccelerationCurve::ALL {
            assert_eq!(curve.apply(0.0), 0.0, "{curve} at 0");
            assert_eq!(curve.apply(1.0), 1.0, "{curve} at 1");
        }
    }

    #[test]
    fn test_out_of_range_input_is_clamped() {
        for curve in AccelerationCurve::ALL {
            assert_eq!(curve.apply(-0.5), 0.0);
            assert_eq!(curve.apply(3.0), 1.0);
            assert_eq!(curve.apply(f64::NAN), 0.0);
        }
    }

    #[test]
    fn test_known_midpoints() {
        assert_eq!(AccelerationCurve::Linear.apply(0.5), 0.5);
        assert_eq!(AccelerationCurve::EaseIn.apply(0.5), 0.25);
        assert_eq!(AccelerationCurve::EaseOut.apply(0.5), 0.75);
        assert_eq!(AccelerationCurve::EaseInOut.apply(0.5), 0.5);
        assert_eq!(AccelerationCurve::Exponential.apply(0.5), 0.03125);
        assert!((AccelerationCurve::Logarithmic.apply(0.5) - 5.5f64.log10()).abs() < 1e-12);
    }

    #[test]
    fn test_ease_in_out_is_continuous_at_breakpoint() {
        let below = AccelerationCurve::EaseInOut.apply(0.5 - 1e-9);
        let at = AccelerationCurve::EaseInOut.apply(0.5);
        assert!((at - below).abs() < 1e-6);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("linear".parse(), Ok(AccelerationCurve::Linear));
        assert_eq!("Ease In/Out".replace('/', "-").parse(), Ok(AccelerationCurve::EaseInOut));
        assert_eq!("ease_out".parse(), Ok(AccelerationCurve::EaseOut));
        assert!("bounce".parse::<AccelerationCurve>().is_err());
        for curve in AccelerationCurve::ALL {
            assert_eq!(curve.to_string().parse(), Ok(curve));
        }
    }

    proptest! {
        #[test]
        fn prop_curves_stay_in_unit_interval(p in -2.0f64..3.0) {
            for curve in AccelerationCurve::ALL {
                let value = curve.apply(p);
                prop_assert!((0.0..=1.0).contains(&value), "{} gave {}", curve, value);
            }
        }

        #[test]
        fn prop_curves_are_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            for curve in AccelerationCurve::ALL {
                prop_assert!(curve.apply(lo) <= curve.apply(hi), "{} not monotonic", curve);
            }
        }
    }
}

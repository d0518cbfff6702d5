//! Ratios between indicator values: percentage difference, turnover and
//! closeness classification.

use super::MathError;
use std::fmt;

pub const DEFAULT_OUTCOME_CUTOFF: f64 = 5.0;

/// Difference of `b` relative to the midpoint of `a` and `b`, in percent.
pub fn percentage_diff(a: f64, b: f64, absolute: bool) -> Result<f64, MathError> {
    let sum = a + b;
    if sum == 0.0 {
        return Err(MathError::DivisionByZero {
            operation: "percentage difference",
        });
    }
    let diff = (b - a) / (sum / 2.0) * 100.0;
    if !diff.is_finite() {
        return Err(MathError::NonFinite {
            operation: "percentage difference",
        });
    }
    Ok(if absolute { diff.abs() } else { diff })
}

/// Mean traded volume valued at `price`.
pub fn turnover(volumes: &[f64], price: f64) -> Result<f64, MathError> {
    if volumes.is_empty() {
        return Err(MathError::InsufficientValues {
            needed: 1,
            available: 0,
        });
    }
    Ok(volumes.iter().sum::<f64>() / volumes.len() as f64 * price)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    CloseBy,
    FarAway,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::CloseBy => "close by",
            Outcome::FarAway => "far away",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `CloseBy` when `-cutoff < ratio < cutoff`.
pub fn outcome_analysis(ratio: f64, cutoff: f64) -> Outcome {
    if -cutoff < ratio && ratio < cutoff {
        Outcome::CloseBy
    } else {
        Outcome::FarAway
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn percentage_diff_relative_to_midpoint() {
        // midpoint 150, diff 100
        assert_relative_eq!(percentage_diff(100.0, 200.0, false).unwrap(), 66.666_666_666_666_67);
        assert_relative_eq!(percentage_diff(200.0, 100.0, false).unwrap(), -66.666_666_666_666_67);
        assert_relative_eq!(percentage_diff(200.0, 100.0, true).unwrap(), 66.666_666_666_666_67);
    }

    #[test]
    fn percentage_diff_zero_sum_is_an_error() {
        assert_eq!(
            percentage_diff(5.0, -5.0, true),
            Err(MathError::DivisionByZero {
                operation: "percentage difference"
            })
        );
    }

    #[test]
    fn turnover_is_mean_volume_times_price() {
        assert_relative_eq!(turnover(&[100.0, 200.0, 300.0], 2.5).unwrap(), 500.0);
    }

    #[test]
    fn turnover_of_no_volumes_is_an_error() {
        assert!(turnover(&[], 10.0).is_err());
    }

    #[test]
    fn outcome_is_close_inside_open_band() {
        assert_eq!(outcome_analysis(0.0, 5.0), Outcome::CloseBy);
        assert_eq!(outcome_analysis(-4.99, 5.0), Outcome::CloseBy);
        assert_eq!(outcome_analysis(4.99, 5.0), Outcome::CloseBy);
    }

    #[test]
    fn outcome_band_edges_are_far_away() {
        assert_eq!(outcome_analysis(5.0, 5.0), Outcome::FarAway);
        assert_eq!(outcome_analysis(-5.0, 5.0), Outcome::FarAway);
        assert_eq!(outcome_analysis(12.0, 5.0).as_str(), "far away");
    }

    proptest! {
        #[test]
        fn absolute_percentage_diff_is_non_negative(a in -1e6f64..1e6, b in -1e6f64..1e6) {
            prop_assume!(a + b != 0.0);
            if let Ok(diff) = percentage_diff(a, b, true) {
                prop_assert!(diff >= 0.0);
            }
        }
    }
}

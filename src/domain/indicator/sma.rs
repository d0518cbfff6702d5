//! Simple moving average.

use super::MathError;

/// Mean of the `period` most recent values in `window`.
pub fn simple_moving_average(window: &[f64], period: usize) -> Result<f64, MathError> {
    if period == 0 {
        return Err(MathError::ZeroPeriod);
    }
    if window.len() < period {
        return Err(MathError::InsufficientValues {
            needed: period,
            available: window.len(),
        });
    }

    let recent = &window[window.len() - period..];
    Ok(recent.iter().sum::<f64>() / period as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sma_uses_most_recent_values() {
        let closes = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(simple_moving_average(&closes, 3).unwrap(), 4.0);
        assert_relative_eq!(simple_moving_average(&closes, 5).unwrap(), 3.0);
    }

    #[test]
    fn sma_period_1_is_last_value() {
        assert_relative_eq!(simple_moving_average(&[7.0, 9.0], 1).unwrap(), 9.0);
    }

    #[test]
    fn sma_rejects_short_window() {
        assert_eq!(
            simple_moving_average(&[1.0, 2.0], 3),
            Err(MathError::InsufficientValues {
                needed: 3,
                available: 2
            })
        );
    }

    #[test]
    fn sma_rejects_zero_period() {
        assert_eq!(simple_moving_average(&[1.0], 0), Err(MathError::ZeroPeriod));
    }
}

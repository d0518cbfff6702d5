//! Annualized rate of return.

use super::MathError;

/// `((end/start)^(1/years) - 1) * 100`.
///
/// `years` is the holding period expressed in years; momentum passes a
/// fraction of a year for the monthly leg.
pub fn annualized_rate_of_return(end: f64, start: f64, years: f64) -> Result<f64, MathError> {
    const OPERATION: &str = "annualized return";

    if start == 0.0 {
        return Err(MathError::DivisionByZero {
            operation: OPERATION,
        });
    }
    if years <= 0.0 || !years.is_finite() {
        return Err(MathError::NonPositive {
            operation: OPERATION,
            operand: "years",
        });
    }

    let rate = ((end / start).powf(1.0 / years) - 1.0) * 100.0;
    if !rate.is_finite() {
        return Err(MathError::NonFinite {
            operation: OPERATION,
        });
    }
    Ok(rate)
}

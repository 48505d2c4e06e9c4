//! Signed quantity change computation.

/// Direction of an observed change when only its size is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Increase,
    Decrease,
}

impl Sign {
    pub fn apply(self, magnitude: i64) -> i64 {
        let magnitude = magnitude.saturating_abs();
        match self {
            Sign::Increase => magnitude,
            Sign::Decrease => -magnitude,
        }
    }
}

/// Compute the signed delta of a change.
///
/// Absolute quantities win when both are known. Otherwise the observed
/// magnitude with its sign is used, and with no magnitude either the delta
/// is unknown.
pub fn compute_delta(
    previous_quantity_after: Option<i64>,
    new_quantity_after: Option<i64>,
    observed_magnitude: Option<i64>,
    sign: Sign,
) -> Option<i64> {
    match (previous_quantity_after, new_quantity_after) {
        (Some(previous), Some(new)) => Some(new.saturating_sub(previous)),
        _ => observed_magnitude.map(|m| sign.apply(m)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_quantities_win() {
        assert_eq!(compute_delta(Some(10), Some(7), Some(5), Sign::Decrease), Some(-3));
        assert_eq!(compute_delta(Some(7), Some(10), None, Sign::Decrease), Some(3));
    }

    #[test]
    fn test_falls_back_to_magnitude() {
        assert_eq!(compute_delta(None, Some(7), Some(3), Sign::Decrease), Some(-3));
        assert_eq!(compute_delta(None, None, Some(3), Sign::Decrease), Some(-3));
        assert_eq!(compute_delta(Some(4), None, Some(2), Sign::Increase), Some(2));
    }

    #[test]
    fn test_unknown_without_magnitude() {
        assert_eq!(compute_delta(None, Some(7), None, Sign::Decrease), None);
        assert_eq!(compute_delta(None, None, None, Sign::Increase), None);
    }

    #[test]
    fn test_sign_ignores_magnitude_sign() {
        assert_eq!(Sign::Decrease.apply(-4), -4);
        assert_eq!(Sign::Increase.apply(-4), 4);
    }
}

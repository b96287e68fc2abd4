//! Decimal rounding shared by the analytics and the record flattening.
//!
//! Halfway cases round to even, matching how the platform's own exports
//! round derived values.

/// Round to `places` decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round_ties_even() / factor
}

/// Round to the nearest whole number
pub fn round_whole(value: f64) -> u32 {
    value.round_ties_even().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(3.333_333, 2), 3.33);
        assert_eq!(round_to(12.25, 1), 12.2);
        assert_eq!(round_to(12.35, 0), 12.0);
        assert_eq!(round_to(-0.04, 1), -0.0);
    }

    #[test]
    fn test_round_whole_ties_to_even() {
        assert_eq!(round_whole(142.5), 142);
        assert_eq!(round_whole(143.5), 144);
        assert_eq!(round_whole(150.2), 150);
    }
}

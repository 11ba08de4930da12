//! Utility functions for tankd

use std::time::{SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp (fractional seconds)
pub fn unix_epoch_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs_f64()
}

/// Round to one decimal place (display precision for liters/percent)
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_epoch_now() {
        let now = unix_epoch_now();
        // Sanity: after 2020-01-01, before 2100-01-01
        assert!(now > 1_577_836_800.0);
        assert!(now < 4_102_444_800.0);
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(0.0), 0.0);
        assert_eq!(round1(1.04), 1.0);
        assert_eq!(round1(1.05), 1.1);
        assert_eq!(round1(9999.96), 10000.0);
        assert_eq!(round1(-2.34), -2.3);
    }
}

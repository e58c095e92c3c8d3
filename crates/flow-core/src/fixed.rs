use fixed::types::I32F32;
use std::time::Duration;

/// Q32.32 fixed-point: amounts, flow rates, multipliers, power, and rates.
pub type Fixed64 = I32F32;

const NANOS_PER_SEC: u32 = 1_000_000_000;

/// Convert an f64 to Fixed64. Use only for initialization, never for user data.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert an f64 to Fixed64, returning None for NaN, infinities, or values
/// outside the representable range.
#[inline]
pub fn checked_f64_to_fixed64(v: f64) -> Option<Fixed64> {
    Fixed64::checked_from_num(v)
}

/// Convert Fixed64 to f64. Use only for display.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Checked multiplication for Fixed64 that returns None on overflow.
#[inline]
pub fn checked_mul_64(a: Fixed64, b: Fixed64) -> Option<Fixed64> {
    a.checked_mul(b)
}

/// Checked division for Fixed64 that returns None on zero divisor or overflow.
#[inline]
pub fn checked_div_64(a: Fixed64, b: Fixed64) -> Option<Fixed64> {
    a.checked_div(b)
}

/// Length of a duration in seconds, or None if it does not fit in Fixed64.
pub fn duration_secs(d: Duration) -> Option<Fixed64> {
    let whole = Fixed64::checked_from_num(d.as_secs())?;
    let frac = Fixed64::from_num(d.subsec_nanos()) / Fixed64::from_num(NANOS_PER_SEC);
    whole.checked_add(frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed64_basic_arithmetic() {
        let a = f64_to_fixed64(1.5);
        let b = f64_to_fixed64(2.0);
        assert_eq!(fixed64_to_f64(a + b), 3.5);
    }

    #[test]
    fn checked_conversion_rejects_nan_and_overflow() {
        assert!(checked_f64_to_fixed64(f64::NAN).is_none());
        assert!(checked_f64_to_fixed64(f64::INFINITY).is_none());
        assert!(checked_f64_to_fixed64(1e12).is_none());
        assert_eq!(checked_f64_to_fixed64(0.25), Some(f64_to_fixed64(0.25)));
    }

    #[test]
    fn fixed64_checked_mul_overflow() {
        let two = f64_to_fixed64(2.0);
        assert!(checked_mul_64(Fixed64::MAX, two).is_none());
    }

    #[test]
    fn fixed64_checked_div_by_zero() {
        assert!(checked_div_64(Fixed64::ONE, Fixed64::ZERO).is_none());
    }

    #[test]
    fn duration_secs_keeps_fraction() {
        let secs = duration_secs(Duration::from_millis(3500)).unwrap();
        assert_eq!(secs, f64_to_fixed64(3.5));
        assert_eq!(duration_secs(Duration::ZERO), Some(Fixed64::ZERO));
    }

    #[test]
    fn duration_secs_overflow() {
        assert!(duration_secs(Duration::from_secs(u64::MAX)).is_none());
    }
}

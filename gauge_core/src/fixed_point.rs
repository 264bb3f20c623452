//! Integer scaling helpers.
//!
//! Every register conversion is an exact rational scale. Products are formed
//! in 64-bit before dividing so no intermediate can overflow for 16-bit codes
//! and 32-bit design capacities.

/// `value * num / den` with a 64-bit intermediate, truncating toward zero.
///
/// `den` must be non-zero.
#[inline]
pub fn mul_div_trunc_i64(value: i64, num: i64, den: i64) -> i64 {
    debug_assert!(den != 0, "mul_div_trunc_i64: zero denominator");
    value.saturating_mul(num) / den
}

/// `pct` percent of `full`, truncating. `pct` above 100 is not clamped here.
#[inline]
pub fn percent_of_u32(pct: u8, full: u32) -> u32 {
    let v = u64::from(pct) * u64::from(full) / 100;
    u32::try_from(v).unwrap_or(u32::MAX)
}

/// Saturating narrow of a non-negative quotient to `u32`.
#[inline]
pub fn narrow_u32(v: i64) -> u32 {
    if v <= 0 {
        0
    } else {
        u32::try_from(v).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_toward_zero_for_both_signs() {
        assert_eq!(mul_div_trunc_i64(7, 1, 2), 3);
        assert_eq!(mul_div_trunc_i64(-7, 1, 2), -3);
    }

    #[test]
    fn percent_of_full_scale_does_not_overflow() {
        assert_eq!(percent_of_u32(100, u32::MAX), u32::MAX);
        assert_eq!(percent_of_u32(50, 5_000_000), 2_500_000);
        assert_eq!(percent_of_u32(0, 5_000_000), 0);
    }

    #[test]
    fn narrow_clamps_negatives() {
        assert_eq!(narrow_u32(-5), 0);
        assert_eq!(narrow_u32(i64::MAX), u32::MAX);
        assert_eq!(narrow_u32(42), 42);
    }
}

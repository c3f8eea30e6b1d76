use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Mass in kilograms.
pub type Kg = Fixed64;

/// Absolute temperature in kelvin.
pub type Kelvin = Fixed64;

/// Food energy in calories.
pub type Calories = Fixed64;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Smallest mass any tracked body may have (0.001 kg).
pub const MASS_FLOOR: Kg = Fixed64::from_bits(4_294_967);

/// Temperature used when neither the source material nor the body reports one.
pub const FALLBACK_TEMPERATURE: Kelvin = Fixed64::from_bits(300 << 32);

/// Convert an f64 to Fixed64. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::saturating_from_num(v)
}

/// Convert Fixed64 to f64. Use only for display, never in sim loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Raise a mass to [`MASS_FLOOR`].
#[inline]
pub fn floor_mass(v: Kg) -> Kg {
    v.max(MASS_FLOOR)
}

/// Clamp a value into `[0, 1]`.
#[inline]
pub fn clamp01(v: Fixed64) -> Fixed64 {
    v.clamp(Fixed64::ZERO, Fixed64::ONE)
}

/// Linear interpolation between `a` and `b`. `t` is not clamped.
#[inline]
pub fn lerp(a: Fixed64, b: Fixed64, t: Fixed64) -> Fixed64 {
    a.saturating_add(b.saturating_sub(a).saturating_mul(t))
}

/// Division that yields zero instead of panicking on a zero divisor or overflow.
#[inline]
pub fn div_or_zero(a: Fixed64, b: Fixed64) -> Fixed64 {
    a.checked_div(b).unwrap_or(Fixed64::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mass_floor_is_one_gram() {
        let diff = (fixed64_to_f64(MASS_FLOOR) - 0.001).abs();
        assert!(diff < 1e-9, "got {}", fixed64_to_f64(MASS_FLOOR));
    }

    #[test]
    fn fallback_temperature_is_300k() {
        assert_eq!(FALLBACK_TEMPERATURE, Fixed64::from_num(300));
    }

    #[test]
    fn floor_mass_raises_small_values() {
        assert_eq!(floor_mass(Fixed64::ZERO), MASS_FLOOR);
        assert_eq!(floor_mass(Fixed64::from_num(-5)), MASS_FLOOR);
        assert_eq!(floor_mass(Fixed64::from_num(2)), Fixed64::from_num(2));
    }

    #[test]
    fn clamp01_bounds() {
        assert_eq!(clamp01(Fixed64::from_num(-1)), Fixed64::ZERO);
        assert_eq!(clamp01(Fixed64::from_num(0.5)), Fixed64::from_num(0.5));
        assert_eq!(clamp01(Fixed64::from_num(3)), Fixed64::ONE);
    }

    #[test]
    fn lerp_endpoints_and_midpoint() {
        let a = Fixed64::from_num(1);
        let b = Fixed64::from_num(3);
        assert_eq!(lerp(a, b, Fixed64::ZERO), a);
        assert_eq!(lerp(a, b, Fixed64::ONE), b);
        assert_eq!(lerp(a, b, Fixed64::from_num(0.5)), Fixed64::from_num(2));
    }

    #[test]
    fn div_or_zero_handles_zero_divisor() {
        assert_eq!(div_or_zero(Fixed64::ONE, Fixed64::ZERO), Fixed64::ZERO);
        assert_eq!(
            div_or_zero(Fixed64::from_num(6), Fixed64::from_num(3)),
            Fixed64::from_num(2)
        );
    }

    #[test]
    fn f64_conversion_saturates() {
        assert_eq!(f64_to_fixed64(1e30), Fixed64::MAX);
        assert_eq!(fixed64_to_f64(f64_to_fixed64(2.5)), 2.5);
    }
}

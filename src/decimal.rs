//! 16-byte decimal samples.
//!
//! A decimal sample is `mantissa * 10^exponent`. It is stored as one 128-bit
//! word: the exponent in the top 16 bits and a two's complement mantissa in
//! the remaining 112 bits. The word is written in the buffer's byte order.

use crate::quad::Quad;
use std::fmt::{self, Display, Formatter};

const MANTISSA_BITS: u32 = 112;
const MANTISSA_MASK: u128 = (1 << MANTISSA_BITS) - 1;
const MANTISSA_MAX: i128 = (1 << (MANTISSA_BITS - 1)) - 1;
const MANTISSA_MIN: i128 = -(1 << (MANTISSA_BITS - 1));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Decimal {
    mantissa: i128,
    exponent: i16,
}

impl Decimal {
    pub const ZERO: Decimal = Decimal {
        mantissa: 0,
        exponent: 0,
    };
    pub const MAX: Decimal = Decimal {
        mantissa: MANTISSA_MAX,
        exponent: i16::MAX,
    };
    pub const MIN: Decimal = Decimal {
        mantissa: MANTISSA_MIN,
        exponent: i16::MAX,
    };

    /// Returns `None` if the mantissa doesn't fit in 112 bits.
    pub fn new(mantissa: i128, exponent: i16) -> Option<Decimal> {
        if (MANTISSA_MIN..=MANTISSA_MAX).contains(&mantissa) {
            Some(Decimal { mantissa, exponent })
        } else {
            None
        }
    }

    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    pub fn exponent(&self) -> i16 {
        self.exponent
    }

    pub fn from_bits(bits: u128) -> Decimal {
        Decimal {
            mantissa: ((bits << (128 - MANTISSA_BITS)) as i128) >> (128 - MANTISSA_BITS),
            exponent: (bits >> MANTISSA_BITS) as u16 as i16,
        }
    }

    pub fn to_bits(&self) -> u128 {
        let exponent = u128::from(self.exponent as u16);
        (exponent << MANTISSA_BITS) | (self.mantissa as u128 & MANTISSA_MASK)
    }

    /// Exact for anything up to 64 bits. Wider values drop their lowest
    /// digits.
    pub fn from_i128(value: i128) -> Decimal {
        let mut mantissa = value;
        let mut exponent = 0i16;
        while !(MANTISSA_MIN..=MANTISSA_MAX).contains(&mantissa) {
            mantissa /= 10;
            exponent += 1;
        }
        Decimal { mantissa, exponent }
    }

    /// Uses the shortest digit string that reads back as the same `f64`.
    /// NaN becomes zero and infinities saturate to [`Decimal::MAX`] and
    /// [`Decimal::MIN`].
    pub fn from_f64(value: f64) -> Decimal {
        if value.is_nan() || value == 0.0 {
            return Decimal::ZERO;
        }
        if value.is_infinite() {
            return if value > 0.0 {
                Decimal::MAX
            } else {
                Decimal::MIN
            };
        }
        // Formats as e.g. "-1.2345e-7"
        let text = format!("{:e}", value);
        let (digits, exp) = text.split_once('e').unwrap_or((text.as_str(), "0"));
        let exp: i32 = exp.parse().unwrap_or(0);
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        let mantissa: i128 = format!("{}{}", int_part, frac_part).parse().unwrap_or(0);
        Decimal {
            mantissa,
            exponent: (exp - frac_part.len() as i32) as i16,
        }
    }

    /// Correctly rounded.
    pub fn to_f64(&self) -> f64 {
        format!("{}e{}", self.mantissa, self.exponent)
            .parse()
            .unwrap_or(f64::NAN)
    }

    /// Correctly rounded, not via `f64`.
    pub fn to_f32(&self) -> f32 {
        format!("{}e{}", self.mantissa, self.exponent)
            .parse()
            .unwrap_or(f32::NAN)
    }

    /// Correctly rounded to the 113 bit binary128 significand.
    pub fn to_quad(&self) -> Quad {
        Quad::from_decimal_parts(self.mantissa, i32::from(self.exponent))
    }

    /// Integer part, truncated toward zero. Saturates at the `i128` range.
    pub fn trunc_to_i128(&self) -> i128 {
        if self.exponent >= 0 {
            match 10i128
                .checked_pow(self.exponent as u32)
                .and_then(|scale| self.mantissa.checked_mul(scale))
            {
                Some(v) => v,
                None if self.mantissa > 0 => i128::MAX,
                None if self.mantissa < 0 => i128::MIN,
                None => 0,
            }
        } else {
            // The mantissa is below 10^34, larger divisors give zero
            match 10i128.checked_pow(u32::from(self.exponent.unsigned_abs())) {
                Some(scale) => self.mantissa / scale,
                None => 0,
            }
        }
    }
}

impl Display for Decimal {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}e{}", self.mantissa, self.exponent)
    }
}

#[cfg(test)]
use test_log::test;

#[test]
fn test_bits() {
    for (mantissa, exponent) in [(0, 0), (1, 0), (-1, 0), (12345, -3), (-987, 300)] {
        let d = Decimal::new(mantissa, exponent).unwrap();
        assert_eq!(Decimal::from_bits(d.to_bits()), d);
    }
    assert_eq!(Decimal::from_bits(Decimal::MAX.to_bits()), Decimal::MAX);
    assert_eq!(Decimal::from_bits(Decimal::MIN.to_bits()), Decimal::MIN);
    assert_eq!(Decimal::new(-1, -1).unwrap().to_bits() >> 112, 0xffff);
    assert_eq!(Decimal::new(1 << 111, 0), None);
}

#[test]
fn test_from_f64() {
    let d = Decimal::from_f64(0.1);
    assert_eq!((d.mantissa(), d.exponent()), (1, -1));
    let d = Decimal::from_f64(-1234.5);
    assert_eq!((d.mantissa(), d.exponent()), (-12345, -1));
    let d = Decimal::from_f64(3e20);
    assert_eq!((d.mantissa(), d.exponent()), (3, 20));
    assert_eq!(Decimal::from_f64(f64::NAN), Decimal::ZERO);
    assert_eq!(Decimal::from_f64(f64::INFINITY), Decimal::MAX);
    assert_eq!(Decimal::from_f64(f64::NEG_INFINITY), Decimal::MIN);
    for v in [0.1, 1.0 / 3.0, -2.5e-300, 1.7976931348623157e308, 5e-324] {
        assert_eq!(Decimal::from_f64(v).to_f64(), v);
    }
}

#[test]
fn test_to_float() {
    assert_eq!(Decimal::new(15, -1).unwrap().to_f64(), 1.5);
    assert_eq!(Decimal::new(1, -1).unwrap().to_f32(), 0.1f32);
    assert_eq!(Decimal::MAX.to_f64(), f64::INFINITY);
    assert_eq!(Decimal::MIN.to_f32(), f32::NEG_INFINITY);
}

#[test]
fn test_to_quad() {
    let wide = (1i128 << 100) + 1;
    let d = Decimal::new(wide, 0).unwrap();
    assert_eq!(d.to_quad().trunc_to_i128(), Some(wide));
    assert_eq!(Decimal::new(-1234, -2).unwrap().to_quad().to_f64(), -12.34);
    assert_eq!(Decimal::new(7, 2).unwrap().to_quad(), Quad::from_i128(700));
    assert_eq!(Decimal::MAX.to_quad().to_f64(), f64::INFINITY);
    assert_eq!(Decimal::MIN.to_quad().to_f64(), f64::NEG_INFINITY);
}

#[test]
fn test_trunc() {
    assert_eq!(Decimal::new(-19, -1).unwrap().trunc_to_i128(), -1);
    assert_eq!(Decimal::new(19, -1).unwrap().trunc_to_i128(), 1);
    assert_eq!(Decimal::new(7, 3).unwrap().trunc_to_i128(), 7000);
    assert_eq!(Decimal::new(7, -40).unwrap().trunc_to_i128(), 0);
    assert_eq!(Decimal::MAX.trunc_to_i128(), i128::MAX);
    assert_eq!(Decimal::MIN.trunc_to_i128(), i128::MIN);
    assert_eq!(Decimal::new(0, 500).unwrap().trunc_to_i128(), 0);
}

#[test]
fn test_from_i128() {
    assert_eq!(
        Decimal::from_i128(i64::MIN.into()),
        Decimal::new(i64::MIN.into(), 0).unwrap()
    );
    let d = Decimal::from_i128(i128::MAX);
    assert_eq!(d.exponent(), 5);
    assert_eq!(d.mantissa(), i128::MAX / 100_000);
}

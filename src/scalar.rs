use crate::decimal::Decimal;
use crate::quad::Quad;
use num_complex::{Complex32, Complex64};
use std::fmt::{self, Display, Formatter};

/// A decoded sample, wide enough to hold any supported source sample
/// without loss.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    /// Any integer sample, signed or unsigned, up to 8 bytes
    Int(i128),
    /// 4- and 8-byte float samples
    Float(f64),
    /// 16-byte float samples
    Quad(Quad),
    Complex(Complex64),
    Decimal(Decimal),
}

impl Scalar {
    /// Real value as `f64`. Complex values give their real part.
    pub fn to_f64(&self) -> f64 {
        match self {
            Scalar::Int(v) => *v as f64,
            Scalar::Float(v) => *v,
            Scalar::Quad(q) => q.to_f64(),
            Scalar::Complex(c) => c.re,
            Scalar::Decimal(d) => d.to_f64(),
        }
    }

    pub fn is_nan(&self) -> bool {
        match self {
            Scalar::Int(_) | Scalar::Decimal(_) => false,
            Scalar::Float(v) => v.is_nan(),
            Scalar::Quad(q) => q.is_nan(),
            Scalar::Complex(c) => c.re.is_nan(),
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Scalar::Int(v) => Display::fmt(v, f),
            Scalar::Float(v) => Display::fmt(v, f),
            Scalar::Quad(q) => Display::fmt(&q.to_f64(), f),
            Scalar::Complex(c) => Display::fmt(c, f),
            Scalar::Decimal(d) => Display::fmt(d, f),
        }
    }
}

macro_rules! from_int {
    ($($t: ty),*) => {
        $(impl From<$t> for Scalar {
            fn from(v: $t) -> Scalar {
                Scalar::Int(i128::from(v))
            }
        })*
    };
}

from_int!(i8, i16, i32, i64, u8, u16, u32, u64);

impl From<f32> for Scalar {
    fn from(v: f32) -> Scalar {
        Scalar::Float(f64::from(v))
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Scalar {
        Scalar::Float(v)
    }
}

impl From<Quad> for Scalar {
    fn from(v: Quad) -> Scalar {
        Scalar::Quad(v)
    }
}

impl From<Complex32> for Scalar {
    fn from(v: Complex32) -> Scalar {
        Scalar::Complex(Complex64::new(v.re.into(), v.im.into()))
    }
}

impl From<Complex64> for Scalar {
    fn from(v: Complex64) -> Scalar {
        Scalar::Complex(v)
    }
}

impl From<Decimal> for Scalar {
    fn from(v: Decimal) -> Scalar {
        Scalar::Decimal(v)
    }
}

#[cfg(test)]
use test_log::test;

#[test]
fn test_real_value() {
    assert_eq!(Scalar::from(-3i8).to_f64(), -3.0);
    assert_eq!(Scalar::from(u64::MAX), Scalar::Int(18446744073709551615));
    assert_eq!(Scalar::from(0.5f32).to_f64(), 0.5);
    assert_eq!(Scalar::from(Complex64::new(2.0, 7.0)).to_f64(), 2.0);
    assert_eq!(
        Scalar::from(Decimal::new(25, -1).unwrap()).to_f64(),
        2.5
    );
    assert!(Scalar::from(f32::NAN).is_nan());
    assert!(!Scalar::from(0i32).is_nan());
}

//! Per-sample casts into a target format.
//!
//! Out of range values and NaN never fail a conversion. They are resolved
//! by a [`CastPolicy`]. The default saturates at the target range and maps
//! NaN to zero, so plot data always stays renderable.

use crate::data_type::DataTypeFormat;
use crate::data_type::DataTypeFormat::{
    ComplexFloatingPoint, FloatingPoint, SignedInteger, UnsignedInteger,
};
use crate::decimal::Decimal;
use crate::quad::Quad;
use crate::scalar::Scalar;
use num_complex::{Complex32, Complex64};
use serde::{Deserialize, Serialize};

/// How integer targets treat values outside their range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Clamp to the nearest representable value
    #[default]
    Saturate,
    /// Keep the low bits of the two's complement value, like a C cast.
    /// Floats are truncated to an integer first.
    Wrap,
}

/// What integer targets receive for a NaN sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NanPolicy {
    #[default]
    Zero,
    /// The minimum of the target type, which is what x86 float to integer
    /// instructions produce
    Minimum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CastPolicy {
    pub overflow: OverflowPolicy,
    pub nan: NanPolicy,
}

/// A sample cast to its target representation, ready to be encoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypedSample {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    F128(Quad),
    C64(Complex32),
    C128(Complex64),
    Decimal(Decimal),
}

fn int_range(signed: bool, sample_bytes: usize) -> (i128, i128) {
    let bits = (sample_bytes * 8) as u32;
    if signed {
        (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
    } else {
        (0, (1i128 << bits) - 1)
    }
}

fn wrap(value: i128, signed: bool, sample_bytes: usize) -> i128 {
    let bits = (sample_bytes * 8) as u32;
    let raw = (value as u128) & ((1u128 << bits) - 1);
    if signed && raw >> (bits - 1) == 1 {
        raw as i128 - (1i128 << bits)
    } else {
        raw as i128
    }
}

// Integer part of a sample, or None for NaN
fn integer_value(value: &Scalar) -> Option<i128> {
    match value {
        Scalar::Int(v) => Some(*v),
        // `as` truncates toward zero and saturates at the i128 range
        Scalar::Float(v) if !v.is_nan() => Some(*v as i128),
        Scalar::Complex(c) if !c.re.is_nan() => Some(c.re as i128),
        Scalar::Float(_) | Scalar::Complex(_) => None,
        Scalar::Quad(q) => q.trunc_to_i128(),
        Scalar::Decimal(d) => Some(d.trunc_to_i128()),
    }
}

fn cast_integer(value: &Scalar, signed: bool, sample_bytes: usize, policy: &CastPolicy) -> i128 {
    let (min, max) = int_range(signed, sample_bytes);
    match integer_value(value) {
        None => match policy.nan {
            NanPolicy::Zero => 0,
            NanPolicy::Minimum => min,
        },
        Some(v) => match policy.overflow {
            OverflowPolicy::Saturate => v.clamp(min, max),
            OverflowPolicy::Wrap => wrap(v, signed, sample_bytes),
        },
    }
}

fn cast_f32(value: &Scalar) -> f32 {
    match value {
        // Rounds to nearest
        Scalar::Int(v) => *v as f32,
        Scalar::Decimal(d) => d.to_f32(),
        Scalar::Quad(q) => q.to_f32(),
        v => v.to_f64() as f32,
    }
}

fn cast_quad(value: &Scalar) -> Quad {
    match value {
        Scalar::Int(v) => Quad::from_i128(*v),
        Scalar::Quad(q) => *q,
        Scalar::Decimal(d) => d.to_quad(),
        v => Quad::from_f64(v.to_f64()),
    }
}

fn cast_decimal(value: &Scalar) -> Decimal {
    match value {
        Scalar::Int(v) => Decimal::from_i128(*v),
        Scalar::Decimal(d) => *d,
        v => Decimal::from_f64(v.to_f64()),
    }
}

fn imaginary(value: &Scalar) -> f64 {
    match value {
        Scalar::Complex(c) => c.im,
        _ => 0.0,
    }
}

/// Cast a decoded sample into `format` stored in `sample_bytes` bytes.
/// The combination must be supported.
pub fn cast(
    value: &Scalar,
    format: DataTypeFormat,
    sample_bytes: usize,
    policy: &CastPolicy,
) -> TypedSample {
    match (format, sample_bytes) {
        (SignedInteger, bytes) => {
            let v = cast_integer(value, true, bytes, policy);
            match bytes {
                1 => TypedSample::I8(v as i8),
                2 => TypedSample::I16(v as i16),
                4 => TypedSample::I32(v as i32),
                _ => TypedSample::I64(v as i64),
            }
        }
        (UnsignedInteger, bytes) => {
            let v = cast_integer(value, false, bytes, policy);
            match bytes {
                1 => TypedSample::U8(v as u8),
                2 => TypedSample::U16(v as u16),
                4 => TypedSample::U32(v as u32),
                _ => TypedSample::U64(v as u64),
            }
        }
        (FloatingPoint, 4) => TypedSample::F32(cast_f32(value)),
        (FloatingPoint, 8) => TypedSample::F64(value.to_f64()),
        (FloatingPoint, _) => TypedSample::F128(cast_quad(value)),
        (ComplexFloatingPoint, 8) => {
            TypedSample::C64(Complex32::new(cast_f32(value), imaginary(value) as f32))
        }
        (ComplexFloatingPoint, _) => {
            TypedSample::C128(Complex64::new(value.to_f64(), imaginary(value)))
        }
        (DataTypeFormat::Decimal, _) => TypedSample::Decimal(cast_decimal(value)),
    }
}

#[cfg(test)]
use test_log::test;

#[cfg(test)]
fn cast_default(value: Scalar, format: DataTypeFormat, sample_bytes: usize) -> TypedSample {
    cast(&value, format, sample_bytes, &CastPolicy::default())
}

#[test]
fn test_integer_saturation() {
    assert_eq!(
        cast_default(i64::MAX.into(), SignedInteger, 1),
        TypedSample::I8(127)
    );
    assert_eq!(
        cast_default(i64::MIN.into(), SignedInteger, 2),
        TypedSample::I16(-32768)
    );
    assert_eq!(
        cast_default((-1i32).into(), UnsignedInteger, 4),
        TypedSample::U32(0)
    );
    assert_eq!(
        cast_default(u64::MAX.into(), SignedInteger, 8),
        TypedSample::I64(i64::MAX)
    );
    assert_eq!(
        cast_default(300u16.into(), UnsignedInteger, 1),
        TypedSample::U8(255)
    );
}

#[test]
fn test_integer_wrap() {
    let policy = CastPolicy {
        overflow: OverflowPolicy::Wrap,
        ..Default::default()
    };
    assert_eq!(
        cast(&300u16.into(), UnsignedInteger, 1, &policy),
        TypedSample::U8(44)
    );
    assert_eq!(
        cast(&0xffu8.into(), SignedInteger, 1, &policy),
        TypedSample::I8(-1)
    );
    assert_eq!(
        cast(&(-1i64).into(), UnsignedInteger, 8, &policy),
        TypedSample::U64(u64::MAX)
    );
    assert_eq!(
        cast(&Scalar::Float(65537.9), UnsignedInteger, 2, &policy),
        TypedSample::U16(1)
    );
}

#[test]
fn test_float_to_integer() {
    assert_eq!(
        cast_default(Scalar::Float(-2.9), SignedInteger, 4),
        TypedSample::I32(-2)
    );
    assert_eq!(
        cast_default(Scalar::Float(2.9), UnsignedInteger, 1),
        TypedSample::U8(2)
    );
    assert_eq!(
        cast_default(Scalar::Float(1e10), SignedInteger, 2),
        TypedSample::I16(i16::MAX)
    );
    assert_eq!(
        cast_default(Scalar::Float(f64::NEG_INFINITY), SignedInteger, 8),
        TypedSample::I64(i64::MIN)
    );
    assert_eq!(
        cast_default(Scalar::Float(f64::NAN), SignedInteger, 4),
        TypedSample::I32(0)
    );
    let policy = CastPolicy {
        nan: NanPolicy::Minimum,
        ..Default::default()
    };
    assert_eq!(
        cast(&Scalar::Float(f64::NAN), SignedInteger, 4, &policy),
        TypedSample::I32(i32::MIN)
    );
    assert_eq!(
        cast(&Scalar::Float(f64::NAN), UnsignedInteger, 2, &policy),
        TypedSample::U16(0)
    );
}

#[test]
fn test_float_targets() {
    assert_eq!(
        cast_default(Scalar::Float(1.0), FloatingPoint, 4),
        TypedSample::F32(1.0)
    );
    assert_eq!(
        cast_default(Scalar::Float(0.1), FloatingPoint, 4),
        TypedSample::F32(0.1)
    );
    assert_eq!(
        cast_default(Scalar::Float(1e300), FloatingPoint, 4),
        TypedSample::F32(f32::INFINITY)
    );
    // 2^24 + 1 is not representable as f32, nearest even is 2^24
    assert_eq!(
        cast_default(16_777_217i32.into(), FloatingPoint, 4),
        TypedSample::F32(16_777_216.0)
    );
    assert_eq!(
        cast_default(i64::MAX.into(), FloatingPoint, 16),
        TypedSample::F128(Quad::from_i128(i64::MAX.into()))
    );
}

#[test]
fn test_complex_and_decimal() {
    assert_eq!(
        cast_default(Scalar::Complex(Complex64::new(3.5, -1.0)), SignedInteger, 2),
        TypedSample::I16(3)
    );
    assert_eq!(
        cast_default(Scalar::Complex(Complex64::new(3.5, -1.0)), ComplexFloatingPoint, 8),
        TypedSample::C64(Complex32::new(3.5, -1.0))
    );
    assert_eq!(
        cast_default(7u8.into(), ComplexFloatingPoint, 16),
        TypedSample::C128(Complex64::new(7.0, 0.0))
    );
    assert_eq!(
        cast_default(Scalar::Float(-0.25), DataTypeFormat::Decimal, 16),
        TypedSample::Decimal(Decimal::new(-25, -2).unwrap())
    );
    assert_eq!(
        cast_default(
            Scalar::Decimal(Decimal::new(-1999, -3).unwrap()),
            SignedInteger,
            1
        ),
        TypedSample::I8(-1)
    );
}

#[test]
fn test_policy_config() {
    let policy: CastPolicy = serde_json::from_str(r#"{"overflow": "wrap"}"#).unwrap();
    assert_eq!(policy.overflow, OverflowPolicy::Wrap);
    assert_eq!(policy.nan, NanPolicy::Zero);
}

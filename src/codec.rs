//! Reading and writing single samples.
//!
//! Callers guarantee that the slice length equals the sample size of a
//! supported data type.

use crate::cast::TypedSample;
use crate::data_type::{ByteOrder, DataTypeFormat, NumericDataType};
use crate::decimal::Decimal;
use crate::quad::Quad;
use crate::scalar::Scalar;
use byteorder::{BigEndian, LittleEndian};
use num_complex::Complex64;

pub fn decode(bytes: &[u8], data_type: &NumericDataType) -> Scalar {
    match data_type.byte_order {
        ByteOrder::LittleEndian => decode_as::<LittleEndian>(bytes, data_type.format),
        ByteOrder::BigEndian => decode_as::<BigEndian>(bytes, data_type.format),
    }
}

fn decode_as<E: byteorder::ByteOrder>(bytes: &[u8], format: DataTypeFormat) -> Scalar {
    use DataTypeFormat::{ComplexFloatingPoint, FloatingPoint, SignedInteger, UnsignedInteger};
    match (format, bytes.len()) {
        (SignedInteger, 1) => Scalar::from(bytes[0] as i8),
        (SignedInteger, 2) => Scalar::from(E::read_i16(bytes)),
        (SignedInteger, 4) => Scalar::from(E::read_i32(bytes)),
        (SignedInteger, _) => Scalar::from(E::read_i64(bytes)),
        (UnsignedInteger, 1) => Scalar::from(bytes[0]),
        (UnsignedInteger, 2) => Scalar::from(E::read_u16(bytes)),
        (UnsignedInteger, 4) => Scalar::from(E::read_u32(bytes)),
        (UnsignedInteger, _) => Scalar::from(E::read_u64(bytes)),
        (FloatingPoint, 4) => Scalar::from(E::read_f32(bytes)),
        (FloatingPoint, 8) => Scalar::from(E::read_f64(bytes)),
        (FloatingPoint, _) => Scalar::from(Quad::from_bits(E::read_u128(bytes))),
        (ComplexFloatingPoint, 8) => Scalar::from(Complex64::new(
            E::read_f32(&bytes[..4]).into(),
            E::read_f32(&bytes[4..]).into(),
        )),
        (ComplexFloatingPoint, _) => Scalar::from(Complex64::new(
            E::read_f64(&bytes[..8]),
            E::read_f64(&bytes[8..]),
        )),
        (DataTypeFormat::Decimal, _) => Scalar::from(Decimal::from_bits(E::read_u128(bytes))),
    }
}

pub fn encode(sample: &TypedSample, byte_order: ByteOrder, out: &mut [u8]) {
    match byte_order {
        ByteOrder::LittleEndian => encode_as::<LittleEndian>(sample, out),
        ByteOrder::BigEndian => encode_as::<BigEndian>(sample, out),
    }
}

fn encode_as<E: byteorder::ByteOrder>(sample: &TypedSample, out: &mut [u8]) {
    match sample {
        TypedSample::I8(v) => out[0] = *v as u8,
        TypedSample::I16(v) => E::write_i16(out, *v),
        TypedSample::I32(v) => E::write_i32(out, *v),
        TypedSample::I64(v) => E::write_i64(out, *v),
        TypedSample::U8(v) => out[0] = *v,
        TypedSample::U16(v) => E::write_u16(out, *v),
        TypedSample::U32(v) => E::write_u32(out, *v),
        TypedSample::U64(v) => E::write_u64(out, *v),
        TypedSample::F32(v) => E::write_f32(out, *v),
        TypedSample::F64(v) => E::write_f64(out, *v),
        TypedSample::F128(q) => E::write_u128(out, q.to_bits()),
        TypedSample::C64(c) => {
            E::write_f32(&mut out[..4], c.re);
            E::write_f32(&mut out[4..], c.im);
        }
        TypedSample::C128(c) => {
            E::write_f64(&mut out[..8], c.re);
            E::write_f64(&mut out[8..], c.im);
        }
        TypedSample::Decimal(d) => E::write_u128(out, d.to_bits()),
    }
}

/// Reverse the byte order of every sample component in place.
pub fn swap_byte_order(data: &mut [u8], component_bytes: usize) {
    if component_bytes <= 1 {
        return;
    }
    for chunk in data.chunks_exact_mut(component_bytes) {
        chunk.reverse();
    }
}

#[cfg(test)]
use test_log::test;

#[cfg(test)]
fn data_type(s: &str) -> NumericDataType {
    s.parse().unwrap()
}

#[test]
fn test_decode() {
    assert_eq!(decode(&[0x01, 0x02], &data_type(">u2")), Scalar::Int(0x0102));
    assert_eq!(decode(&[0x01, 0x02], &data_type("<u2")), Scalar::Int(0x0201));
    assert_eq!(decode(&[0xff], &data_type("<i1")), Scalar::Int(-1));
    assert_eq!(decode(&[0xff], &data_type("<u1")), Scalar::Int(255));
    assert_eq!(
        decode(&[0x3f, 0x80, 0, 0], &data_type(">f4")),
        Scalar::Float(1.0)
    );
    assert_eq!(
        decode(&[0, 0, 0x80, 0x3f, 0, 0, 0, 0xc0], &data_type("<c8")),
        Scalar::Complex(Complex64::new(1.0, -2.0))
    );
    let mut quad = [0u8; 16];
    quad[0] = 0x3f;
    quad[1] = 0xff;
    assert_eq!(
        decode(&quad, &data_type(">f16")),
        Scalar::Quad(Quad::from_f64(1.0))
    );
}

#[test]
fn test_encode() {
    let mut out = [0u8; 2];
    encode(&TypedSample::U16(0x0102), ByteOrder::LittleEndian, &mut out);
    assert_eq!(out, [0x02, 0x01]);
    encode(&TypedSample::I16(-2), ByteOrder::BigEndian, &mut out);
    assert_eq!(out, [0xff, 0xfe]);

    let mut out = [0u8; 16];
    let d = Decimal::new(-5, 2).unwrap();
    encode(&TypedSample::Decimal(d), ByteOrder::BigEndian, &mut out);
    assert_eq!(decode(&out, &data_type(">d16")), Scalar::Decimal(d));
    encode(&TypedSample::Decimal(d), ByteOrder::LittleEndian, &mut out);
    assert_eq!(out[15], 0x00);
    assert_eq!(out[0], 0xfb);
    assert_eq!(decode(&out, &data_type("<d16")), Scalar::Decimal(d));
}

#[test]
fn test_swap_byte_order() {
    let mut data = [1, 2, 3, 4, 5, 6, 7, 8];
    swap_byte_order(&mut data, 4);
    assert_eq!(data, [4, 3, 2, 1, 8, 7, 6, 5]);
    swap_byte_order(&mut data, 1);
    assert_eq!(data, [4, 3, 2, 1, 8, 7, 6, 5]);
}

//! Re-encoding sample buffers under another data type.

use crate::cast::{self, CastPolicy};
use crate::codec;
use crate::data_type::{ByteOrder, DataTypeFormat, NumericDataType};
use crate::error::Error;
use crate::numeric_data::{sample_count_of, NumericData};
use log::{debug, trace};

/// Convert raw sample bytes of type `from` into a new byte vector of type
/// `to`. Structural problems are reported before anything is allocated.
pub fn convert_bytes(
    source: &[u8],
    from: &NumericDataType,
    to: &NumericDataType,
    policy: &CastPolicy,
) -> Result<Vec<u8>, Error> {
    if !to.is_supported() {
        return Err(Error::UnsupportedConversion(*to));
    }
    from.validate()?;
    let count = sample_count_of(source.len(), from)?;
    debug!("Converting {} samples from {} to {}", count, from, to);

    if from.same_encoding(to) {
        let mut out = source.to_vec();
        if from.byte_order != to.byte_order {
            trace!("Swapping byte order only");
            codec::swap_byte_order(&mut out, to.component_bytes());
        }
        return Ok(out);
    }

    let mut out = vec![0u8; count * to.sample_bytes];
    for (src, dst) in source
        .chunks_exact(from.sample_bytes)
        .zip(out.chunks_exact_mut(to.sample_bytes))
    {
        let value = codec::decode(src, from);
        let sample = cast::cast(&value, to.format, to.sample_bytes, policy);
        codec::encode(&sample, to.byte_order, dst);
    }
    Ok(out)
}

/// Convert `source` to `target` using the given cast policy. The result
/// keeps the shape of the source.
pub fn convert_with(
    source: &NumericData,
    target: NumericDataType,
    policy: &CastPolicy,
) -> Result<NumericData, Error> {
    let data = convert_bytes(source.data(), source.data_type(), &target, policy)?;
    NumericData::with_shape(data, target, source.shape().to_vec())
}

/// Convert `source` to `target`, saturating out of range values and
/// mapping NaN to zero for integer targets.
pub fn convert(source: &NumericData, target: NumericDataType) -> Result<NumericData, Error> {
    convert_with(source, target, &CastPolicy::default())
}

pub fn convert_to_type(
    source: &NumericData,
    format: DataTypeFormat,
    sample_bytes: usize,
    byte_order: ByteOrder,
) -> Result<NumericData, Error> {
    convert(source, NumericDataType::new(format, sample_bytes, byte_order))
}

pub trait TypeConversion {
    fn converted_to_data_type(&self, new_type: NumericDataType) -> Result<NumericData, Error>;

    fn converted_to_type(
        &self,
        format: DataTypeFormat,
        sample_bytes: usize,
        byte_order: ByteOrder,
    ) -> Result<NumericData, Error> {
        self.converted_to_data_type(NumericDataType::new(format, sample_bytes, byte_order))
    }
}

impl TypeConversion for NumericData {
    fn converted_to_data_type(&self, new_type: NumericDataType) -> Result<NumericData, Error> {
        convert(self, new_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cast::{NanPolicy, OverflowPolicy};
    use crate::decimal::Decimal;
    use crate::scalar::Scalar;
    use proptest::prelude::*;
    use test_log::test;
    use DataTypeFormat::*;

    fn data_type(s: &str) -> NumericDataType {
        s.parse().unwrap()
    }

    #[test]
    fn test_saturating_narrow() {
        let source = NumericData::new(i64::MAX.to_le_bytes().to_vec(), data_type("<i8")).unwrap();
        let result = convert(&source, data_type("<i1")).unwrap();
        assert_eq!(result.data(), &[127]);
        assert_eq!(result.sample_count(), 1);

        let source = NumericData::new(i64::MIN.to_be_bytes().to_vec(), data_type(">i8")).unwrap();
        let result = source.converted_to_type(SignedInteger, 1, ByteOrder::BigEndian).unwrap();
        assert_eq!(result.data(), &[0x80]);
    }

    #[test]
    fn test_byte_order_swap() {
        let source = NumericData::new(vec![0x01, 0x02], data_type(">u2")).unwrap();
        let result = convert(&source, data_type("<u2")).unwrap();
        assert_eq!(result.data(), &[0x02, 0x01]);
        assert_eq!(result.sample_value(0), Some(Scalar::Int(0x0102)));
        assert_eq!(*result.data_type(), data_type("<u2"));
    }

    #[test]
    fn test_complex_swap_per_component() {
        let source = NumericData::new(vec![1, 2, 3, 4, 5, 6, 7, 8], data_type("<c8")).unwrap();
        let result = convert(&source, data_type(">c8")).unwrap();
        assert_eq!(result.data(), &[4, 3, 2, 1, 8, 7, 6, 5]);
        assert_eq!(result.to_f64_vec(), source.to_f64_vec());
    }

    #[test]
    fn test_float_narrowing() {
        let source = NumericData::new(1.0f64.to_le_bytes().to_vec(), data_type("<f8")).unwrap();
        let result = convert(&source, data_type("<f4")).unwrap();
        assert_eq!(result.data(), &1.0f32.to_le_bytes());
        assert_eq!(result.byte_len(), 4);
    }

    #[test]
    fn test_unsupported_target() {
        let source = NumericData::new(1.0f64.to_le_bytes().to_vec(), data_type("<f8")).unwrap();
        let target = NumericDataType::new(FloatingPoint, 3, ByteOrder::LittleEndian);
        assert_eq!(convert(&source, target), Err(Error::UnsupportedConversion(target)));
        assert_eq!(
            source.converted_to_type(DataTypeFormat::Decimal, 8, ByteOrder::LittleEndian),
            Err(Error::UnsupportedConversion(NumericDataType::new(
                DataTypeFormat::Decimal,
                8,
                ByteOrder::LittleEndian
            )))
        );
    }

    #[test]
    fn test_malformed_source() {
        assert_eq!(
            convert_bytes(
                &[0, 0, 0],
                &data_type("<i2"),
                &data_type("<i4"),
                &CastPolicy::default()
            ),
            Err(Error::MalformedSource {
                byte_len: 3,
                sample_bytes: 2
            })
        );
        // The target is checked first
        assert_eq!(
            convert_bytes(
                &[0, 0, 0],
                &data_type("<i2"),
                &NumericDataType::new(UnsignedInteger, 3, ByteOrder::LittleEndian),
                &CastPolicy::default()
            ),
            Err(Error::UnsupportedConversion(NumericDataType::new(
                UnsignedInteger,
                3,
                ByteOrder::LittleEndian
            )))
        );
    }

    #[test]
    fn test_shape_preserved() {
        let source = NumericData::with_shape(vec![0u8; 12], data_type("<u2"), vec![2, 3]).unwrap();
        let result = convert(&source, data_type(">f8")).unwrap();
        assert_eq!(result.shape(), &[2, 3]);
        assert_eq!(result.byte_len(), 48);
    }

    #[test]
    fn test_source_untouched() {
        let bytes = vec![0x80u8, 0x7f];
        let source = NumericData::new(bytes.clone(), data_type("<i1")).unwrap();
        let result = convert(&source, data_type("<u1")).unwrap();
        assert_eq!(result.data(), &[0, 0x7f]);
        assert_eq!(source.data(), &bytes[..]);
    }

    #[test]
    fn test_wrap_policy() {
        let source = NumericData::from_values(&[300.0, -1.0, f64::NAN], data_type("<i4")).unwrap();
        let policy = CastPolicy {
            overflow: OverflowPolicy::Wrap,
            nan: NanPolicy::Minimum,
        };
        let result = convert_with(&source, data_type("<u1"), &policy).unwrap();
        // NaN was already mapped to 0 when building the i4 source
        assert_eq!(result.data(), &[44, 255, 0]);

        let source = NumericData::from_values(&[f64::NAN], data_type("<f8")).unwrap();
        let result = convert_with(&source, data_type("<i2"), &policy).unwrap();
        assert_eq!(result.sample_value(0), Some(Scalar::Int(i16::MIN.into())));
    }

    #[test]
    fn test_wide_types() {
        let source = NumericData::from_values(&[0.1, -2.5, 1e300], data_type("<f8")).unwrap();

        let quad = convert(&source, data_type(">f16")).unwrap();
        assert_eq!(quad.byte_len(), 48);
        assert_eq!(quad.to_f64_vec(), vec![0.1, -2.5, 1e300]);
        let back = convert(&quad, data_type("<f8")).unwrap();
        assert_eq!(back, source);

        let decimal = convert(&source, data_type("<d16")).unwrap();
        assert_eq!(
            decimal.sample_value(1),
            Some(Scalar::Decimal(Decimal::new(-25, -1).unwrap()))
        );
        let back = convert(&decimal, data_type("<f8")).unwrap();
        assert_eq!(back, source);

        let ints = convert(&decimal, data_type("<i2")).unwrap();
        assert_eq!(ints.to_f64_vec(), vec![0.0, -2.0, 32767.0]);

        // Same encoding keeps every bit of a 16-byte float
        let raw: Vec<u8> = (1u8..=16).collect();
        let source = NumericData::new(raw.clone(), data_type("<f16")).unwrap();
        let swapped = convert(&source, data_type(">f16")).unwrap();
        let restored = convert(&swapped, data_type("<f16")).unwrap();
        assert_eq!(restored.data(), &raw[..]);
    }

    #[test]
    fn test_integer_to_float_precision() {
        let source = NumericData::new(i64::MAX.to_le_bytes().to_vec(), data_type("<i8")).unwrap();
        let result = convert(&source, data_type("<f8")).unwrap();
        assert_eq!(result.to_f64_vec(), vec![9223372036854775807.0]);
        let result = convert(&source, data_type("<f16")).unwrap();
        let back = convert(&result, data_type("<i8")).unwrap();
        assert_eq!(back.data(), source.data());
    }

    #[test]
    fn test_quad_narrowing_rounds_once() {
        // 1 + 2^-24 + 2^-60
        let bits = 0x3fff_0000_0000_0000_0000_0000_0000_0000u128 | (1 << 88) | (1 << 52);
        let source = NumericData::new(bits.to_le_bytes().to_vec(), data_type("<f16")).unwrap();
        let result = convert(&source, data_type("<f4")).unwrap();
        assert_eq!(result.data(), &(1.0f32 + f32::EPSILON).to_le_bytes());
        let result = convert(&source, data_type("<c8")).unwrap();
        assert_eq!(result.to_f64_vec(), vec![f64::from(1.0f32 + f32::EPSILON)]);
    }

    #[test]
    fn test_decimal_to_quad_keeps_precision() {
        let wide = (1i128 << 100) + 1;
        let source = NumericData::from_scalars(
            &[Scalar::Decimal(Decimal::new(wide, 0).unwrap())],
            data_type("<d16"),
        )
        .unwrap();
        let quad = convert(&source, data_type("<f16")).unwrap();
        let ints = convert(&quad, data_type("<i8")).unwrap();
        assert_eq!(ints.sample_value(0), Some(Scalar::Int(i64::MAX.into())));
        let back = convert(&quad, data_type("<d16")).unwrap();
        assert_eq!(back.sample_value(0).map(|v| v.to_f64()), Some(wide as f64));
        match quad.sample_value(0) {
            Some(Scalar::Quad(q)) => assert_eq!(q.trunc_to_i128(), Some(wide)),
            other => panic!("Unexpected sample {:?}", other),
        }
    }

    #[test]
    fn test_complex_targets() {
        let source = NumericData::from_values(&[1.5, -3.0], data_type("<f4")).unwrap();
        let complex = convert(&source, data_type(">c16")).unwrap();
        assert_eq!(complex.byte_len(), 32);
        assert_eq!(complex.to_f64_vec(), vec![1.5, -3.0]);
        let ints = convert(&complex, data_type("<u2")).unwrap();
        assert_eq!(ints.to_f64_vec(), vec![1.0, 0.0]);
    }

    fn integer_type() -> impl Strategy<Value = NumericDataType> {
        (
            prop_oneof![Just(SignedInteger), Just(UnsignedInteger)],
            prop_oneof![Just(1usize), Just(2), Just(4), Just(8)],
            prop_oneof![Just(ByteOrder::LittleEndian), Just(ByteOrder::BigEndian)],
        )
            .prop_map(|(format, sample_bytes, byte_order)| {
                NumericDataType::new(format, sample_bytes, byte_order)
            })
    }

    fn any_type() -> impl Strategy<Value = NumericDataType> {
        prop_oneof![
            integer_type(),
            Just(data_type("<f4")),
            Just(data_type(">f8")),
            Just(data_type("<f16")),
            Just(data_type(">c8")),
            Just(data_type("<c16")),
            Just(data_type(">d16")),
        ]
    }

    proptest! {
        #[test]
        fn prop_sample_count_preserved(
            from in any_type(),
            to in any_type(),
            seed in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let count = seed.len() / from.sample_bytes;
            let bytes = seed[..count * from.sample_bytes].to_vec();
            let source = NumericData::new(bytes, from).unwrap();
            let result = convert(&source, to).unwrap();
            prop_assert_eq!(result.sample_count(), source.sample_count());
            prop_assert_eq!(result.byte_len(), count * to.sample_bytes);
            prop_assert_eq!(result.data_type(), &to);
        }

        #[test]
        fn prop_widen_and_back(
            from in integer_type(),
            wide_order in prop_oneof![Just(ByteOrder::LittleEndian), Just(ByteOrder::BigEndian)],
            signed_wide in any::<bool>(),
            seed in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let count = seed.len() / from.sample_bytes;
            let bytes = seed[..count * from.sample_bytes].to_vec();
            let source = NumericData::new(bytes, from).unwrap();
            // Signed 8 bytes holds everything but 8-byte unsigned values,
            // which a 16-byte float holds exactly
            let wide = match (from.format, signed_wide) {
                (UnsignedInteger, false) => NumericDataType::new(UnsignedInteger, 8, wide_order),
                (UnsignedInteger, true) if from.sample_bytes == 8 => {
                    NumericDataType::new(FloatingPoint, 16, wide_order)
                }
                _ => NumericDataType::new(SignedInteger, 8, wide_order),
            };
            let widened = convert(&source, wide).unwrap();
            let restored = convert(&widened, from).unwrap();
            prop_assert_eq!(restored.data(), source.data());
        }

        #[test]
        fn prop_order_preserved(values in proptest::collection::vec(any::<i16>(), 0..32)) {
            let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
            let source = NumericData::new(bytes, data_type(">i2")).unwrap();
            let result = convert(&source, data_type("<f4")).unwrap();
            let expected: Vec<f64> = values.iter().map(|v| f64::from(*v)).collect();
            prop_assert_eq!(result.to_f64_vec(), expected);
        }
    }
}

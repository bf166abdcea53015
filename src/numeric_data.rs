use crate::cast::{self, CastPolicy};
use crate::codec;
use crate::data_type::NumericDataType;
use crate::error::Error;
use crate::scalar::Scalar;
use bytes::Bytes;

/// An immutable buffer of numeric samples.
///
/// The raw bytes are interpreted through a [`NumericDataType`] and arranged
/// in row-major order according to `shape`. A buffer is only ever created
/// through a validating constructor, so the data type is supported and the
/// byte length is a whole number of samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericData {
    data: Bytes,
    data_type: NumericDataType,
    shape: Vec<usize>,
}

/// Check that `byte_len` holds whole samples and return the sample count.
pub(crate) fn sample_count_of(byte_len: usize, data_type: &NumericDataType) -> Result<usize, Error> {
    if byte_len % data_type.sample_bytes != 0 {
        return Err(Error::MalformedSource {
            byte_len,
            sample_bytes: data_type.sample_bytes,
        });
    }
    Ok(byte_len / data_type.sample_bytes)
}

impl NumericData {
    /// One dimensional buffer.
    pub fn new(data: impl Into<Bytes>, data_type: NumericDataType) -> Result<NumericData, Error> {
        let data = data.into();
        data_type.validate()?;
        let count = sample_count_of(data.len(), &data_type)?;
        Ok(NumericData {
            data,
            data_type,
            shape: vec![count],
        })
    }

    pub fn with_shape(
        data: impl Into<Bytes>,
        data_type: NumericDataType,
        shape: Vec<usize>,
    ) -> Result<NumericData, Error> {
        let data = data.into();
        data_type.validate()?;
        let sample_count = sample_count_of(data.len(), &data_type)?;
        let shape_count = shape.iter().try_fold(1usize, |n, dim| n.checked_mul(*dim));
        if shape_count != Some(sample_count) {
            return Err(Error::ShapeMismatch {
                sample_count,
                shape,
            });
        }
        Ok(NumericData {
            data,
            data_type,
            shape,
        })
    }

    /// Encode `values` as samples of `data_type`, using the default cast
    /// policy for values the type can't hold.
    pub fn from_scalars(values: &[Scalar], data_type: NumericDataType) -> Result<NumericData, Error> {
        data_type.validate()?;
        let policy = CastPolicy::default();
        let mut data = vec![0u8; values.len() * data_type.sample_bytes];
        for (value, out) in values
            .iter()
            .zip(data.chunks_exact_mut(data_type.sample_bytes))
        {
            let sample = cast::cast(value, data_type.format, data_type.sample_bytes, &policy);
            codec::encode(&sample, data_type.byte_order, out);
        }
        NumericData::new(data, data_type)
    }

    pub fn from_values(values: &[f64], data_type: NumericDataType) -> Result<NumericData, Error> {
        let values: Vec<Scalar> = values.iter().map(|v| Scalar::Float(*v)).collect();
        NumericData::from_scalars(&values, data_type)
    }

    /// Same samples, rearranged into a new shape.
    pub fn reshape(&self, shape: Vec<usize>) -> Result<NumericData, Error> {
        NumericData::with_shape(self.data.clone(), self.data_type, shape)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    pub fn data_type(&self) -> &NumericDataType {
        &self.data_type
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn number_of_dimensions(&self) -> usize {
        self.shape.len()
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    pub fn sample_count(&self) -> usize {
        self.data.len() / self.data_type.sample_bytes
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat sample index for a row-major multi-dimensional index.
    pub fn sample_index(&self, indices: &[usize]) -> Option<usize> {
        if indices.len() != self.shape.len() {
            return None;
        }
        let mut index = 0;
        for (i, dim) in indices.iter().zip(&self.shape) {
            if i >= dim {
                return None;
            }
            index = index * dim + i;
        }
        Some(index)
    }

    /// Raw bytes of one sample.
    pub fn sample_bytes_at(&self, index: usize) -> Option<&[u8]> {
        let size = self.data_type.sample_bytes;
        let start = index.checked_mul(size)?;
        self.data.get(start..start.checked_add(size)?)
    }

    pub fn sample_value(&self, index: usize) -> Option<Scalar> {
        self.sample_bytes_at(index)
            .map(|bytes| codec::decode(bytes, &self.data_type))
    }

    pub fn samples(&self) -> impl Iterator<Item = Scalar> + '_ {
        self.data
            .chunks_exact(self.data_type.sample_bytes)
            .map(move |bytes| codec::decode(bytes, &self.data_type))
    }

    /// Real value of every sample.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        self.samples().map(|s| s.to_f64()).collect()
    }
}

#[cfg(test)]
use test_log::test;

#[cfg(test)]
use crate::data_type::{ByteOrder, DataTypeFormat};

#[test]
fn test_construction() {
    let data_type = NumericDataType::new(DataTypeFormat::SignedInteger, 2, ByteOrder::BigEndian);
    let data = NumericData::new(vec![0, 1, 0, 2, 0xff, 0xff], data_type).unwrap();
    assert_eq!(data.sample_count(), 3);
    assert_eq!(data.byte_len(), 6);
    assert_eq!(data.shape(), &[3]);
    assert_eq!(data.to_f64_vec(), vec![1.0, 2.0, -1.0]);
    assert_eq!(data.sample_value(2), Some(Scalar::Int(-1)));
    assert_eq!(data.sample_value(3), None);
    assert_eq!(data.sample_bytes_at(1), Some(&[0u8, 2][..]));

    let empty = NumericData::new(Vec::new(), data_type).unwrap();
    assert!(empty.is_empty());
    assert_eq!(empty.sample_count(), 0);
}

#[test]
fn test_construction_failure() {
    let data_type = NumericDataType::new(DataTypeFormat::SignedInteger, 4, ByteOrder::BigEndian);
    assert_eq!(
        NumericData::new(vec![0u8; 6], data_type),
        Err(Error::MalformedSource {
            byte_len: 6,
            sample_bytes: 4
        })
    );
    let bad_type = NumericDataType::new(DataTypeFormat::FloatingPoint, 2, ByteOrder::BigEndian);
    assert_eq!(
        NumericData::new(vec![0u8; 6], bad_type),
        Err(Error::UnsupportedDataType(bad_type))
    );
    assert_eq!(
        NumericData::with_shape(vec![0u8; 24], data_type, vec![2, 2]),
        Err(Error::ShapeMismatch {
            sample_count: 6,
            shape: vec![2, 2]
        })
    );
}

#[test]
fn test_shape() {
    let data_type = NumericDataType::native(DataTypeFormat::UnsignedInteger, 1);
    let data = NumericData::with_shape((0u8..6).collect::<Vec<u8>>(), data_type, vec![2, 3]).unwrap();
    assert_eq!(data.number_of_dimensions(), 2);
    assert_eq!(data.sample_index(&[1, 2]), Some(5));
    assert_eq!(data.sample_index(&[0, 1]), Some(1));
    assert_eq!(data.sample_index(&[2, 0]), None);
    assert_eq!(data.sample_index(&[1]), None);
    assert_eq!(data.sample_value(data.sample_index(&[1, 0]).unwrap()), Some(Scalar::Int(3)));

    let flat = data.reshape(vec![6]).unwrap();
    assert_eq!(flat.data(), data.data());
    assert!(data.reshape(vec![4]).is_err());
    assert!(data.reshape(vec![usize::MAX, 3]).is_err());
}

#[test]
fn test_shape_overflow() {
    let data_type = NumericDataType::native(DataTypeFormat::UnsignedInteger, 1);
    assert_eq!(
        NumericData::with_shape(Vec::new(), data_type, vec![usize::MAX, 2, 0]),
        Err(Error::ShapeMismatch {
            sample_count: 0,
            shape: vec![usize::MAX, 2, 0]
        })
    );
}

#[test]
fn test_from_values() {
    let data_type = NumericDataType::new(DataTypeFormat::FloatingPoint, 4, ByteOrder::LittleEndian);
    let data = NumericData::from_values(&[1.0, -0.5], data_type).unwrap();
    assert_eq!(data.data(), &[0, 0, 0x80, 0x3f, 0, 0, 0, 0xbf]);

    let data_type = NumericDataType::new(DataTypeFormat::UnsignedInteger, 1, ByteOrder::LittleEndian);
    let data = NumericData::from_values(&[-4.0, 12.7, 1000.0, f64::NAN], data_type).unwrap();
    assert_eq!(data.data(), &[0, 12, 255, 0]);

    let data = NumericData::from_scalars(&[Scalar::Int(7)], data_type).unwrap();
    assert_eq!(data.data(), &[7]);
}

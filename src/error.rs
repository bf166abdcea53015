use crate::data_type::NumericDataType;
use std::fmt::{self, Display, Formatter};

pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Byte length is not a whole number of samples
    MalformedSource { byte_len: usize, sample_bytes: usize },
    /// Conversion target has a sample width its format can't hold
    UnsupportedConversion(NumericDataType),
    /// Buffer declared with a sample width its format can't hold
    UnsupportedDataType(NumericDataType),
    ShapeMismatch {
        sample_count: usize,
        shape: Vec<usize>,
    },
    InvalidTypeString(String),
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Error::MalformedSource {
                byte_len,
                sample_bytes,
            } => write!(
                f,
                "Data length {} is not a multiple of the sample size {}",
                byte_len, sample_bytes
            ),
            Error::UnsupportedConversion(data_type) => write!(
                f,
                "Can't convert to {} samples of {} bytes",
                data_type.format.as_str(),
                data_type.sample_bytes
            ),
            Error::UnsupportedDataType(data_type) => write!(
                f,
                "Unsupported data type: {} samples of {} bytes",
                data_type.format.as_str(),
                data_type.sample_bytes
            ),
            Error::ShapeMismatch {
                sample_count,
                shape,
            } => write!(
                f,
                "Shape {:?} doesn't match the number of samples ({})",
                shape, sample_count
            ),
            Error::InvalidTypeString(s) => write!(f, "Invalid data type string \"{}\"", s),
        }
    }
}

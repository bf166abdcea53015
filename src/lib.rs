//! Transcoding of numeric sample buffers.
//!
//! A [`NumericData`] buffer holds raw sample bytes described by a
//! [`NumericDataType`]: integer, float, complex or decimal samples of a given
//! width and byte order. [`convert`] re-encodes the samples under another
//! data type, keeping their count and order.
//!
//! ```
//! use numeric_data::{convert, NumericData};
//!
//! let source = NumericData::new(vec![0x01, 0x02], ">u2".parse().unwrap()).unwrap();
//! let result = convert(&source, "<u2".parse().unwrap()).unwrap();
//! assert_eq!(result.data(), &[0x02, 0x01]);
//! ```

pub mod cast;
pub mod codec;
pub mod config;
pub mod convert;
pub mod data_type;
pub mod decimal;
pub mod error;
pub mod logging;
pub mod numeric_data;
pub mod quad;
pub mod scalar;

pub use cast::{CastPolicy, NanPolicy, OverflowPolicy};
pub use convert::{convert, convert_to_type, convert_with, TypeConversion};
pub use data_type::{ByteOrder, DataTypeFormat, NumericDataType};
pub use error::Error;
pub use numeric_data::NumericData;
pub use scalar::Scalar;

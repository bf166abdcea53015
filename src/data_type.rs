//! Sample encodings.
//!
//! A [`NumericDataType`] tells how the raw bytes of a buffer decode into
//! samples. It has a compact string form borrowed from the NumPy array
//! interface: byte order, format character and sample size, e.g. `"<f8"`
//! for little endian doubles or `">i2"` for big endian 16-bit integers.

use crate::error::Error;
use nom::branch::alt;
use nom::character::complete::{char, digit1, one_of};
use nom::combinator::{eof, map, map_opt, map_res, value};
use nom::sequence::{terminated, tuple};
use nom::IResult;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// The numeric codes follow the declaration order of the plot framework's
/// format enumeration, where 0 is the undefined type.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum DataTypeFormat {
    SignedInteger = 1,
    UnsignedInteger = 2,
    FloatingPoint = 3,
    ComplexFloatingPoint = 4,
    Decimal = 5,
}
use DataTypeFormat::*;

impl DataTypeFormat {
    /// Sample sizes in bytes this format can be stored in.
    pub fn supported_sizes(&self) -> &'static [usize] {
        match self {
            SignedInteger | UnsignedInteger => &[1, 2, 4, 8],
            FloatingPoint => &[4, 8, 16],
            ComplexFloatingPoint => &[8, 16],
            Decimal => &[16],
        }
    }

    pub fn type_char(&self) -> char {
        match self {
            SignedInteger => 'i',
            UnsignedInteger => 'u',
            FloatingPoint => 'f',
            ComplexFloatingPoint => 'c',
            Decimal => 'd',
        }
    }

    pub fn from_type_char(c: char) -> Option<DataTypeFormat> {
        match c {
            'i' => Some(SignedInteger),
            'u' => Some(UnsignedInteger),
            'f' => Some(FloatingPoint),
            'c' => Some(ComplexFloatingPoint),
            'd' => Some(Decimal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignedInteger => "signed integer",
            UnsignedInteger => "unsigned integer",
            FloatingPoint => "floating point",
            ComplexFloatingPoint => "complex floating point",
            Decimal => "decimal",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, SignedInteger | UnsignedInteger)
    }
}

#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    /// Byte order of the host.
    pub fn native() -> ByteOrder {
        if cfg!(target_endian = "big") {
            ByteOrder::BigEndian
        } else {
            ByteOrder::LittleEndian
        }
    }

    pub fn is_native(&self) -> bool {
        *self == ByteOrder::native()
    }

    pub fn as_char(&self) -> char {
        match self {
            ByteOrder::LittleEndian => '<',
            ByteOrder::BigEndian => '>',
        }
    }
}

#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NumericDataType {
    pub format: DataTypeFormat,
    pub sample_bytes: usize,
    pub byte_order: ByteOrder,
}

impl NumericDataType {
    /// Plain constructor, the combination is not checked. Use
    /// [`NumericDataType::validate`] or [`NumericDataType::is_supported`]
    /// before relying on it.
    pub fn new(format: DataTypeFormat, sample_bytes: usize, byte_order: ByteOrder) -> Self {
        NumericDataType {
            format,
            sample_bytes,
            byte_order,
        }
    }

    /// Data type in host byte order.
    pub fn native(format: DataTypeFormat, sample_bytes: usize) -> Self {
        NumericDataType::new(format, sample_bytes, ByteOrder::native())
    }

    pub fn is_supported(&self) -> bool {
        self.format.supported_sizes().contains(&self.sample_bytes)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.is_supported() {
            Ok(())
        } else {
            Err(Error::UnsupportedDataType(*self))
        }
    }

    /// Size of each independently byte swapped part of a sample. Complex
    /// samples are swapped one component at a time.
    pub fn component_bytes(&self) -> usize {
        match self.format {
            ComplexFloatingPoint => self.sample_bytes / 2,
            _ => self.sample_bytes,
        }
    }

    /// Same format and width, only the byte order may differ.
    pub fn same_encoding(&self, other: &NumericDataType) -> bool {
        self.format == other.format && self.sample_bytes == other.sample_bytes
    }
}

impl Display for NumericDataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(
            f,
            "{}{}{}",
            self.byte_order.as_char(),
            self.format.type_char(),
            self.sample_bytes
        )
    }
}

fn byte_order(input: &str) -> IResult<&str, ByteOrder> {
    alt((
        value(ByteOrder::LittleEndian, char('<')),
        value(ByteOrder::BigEndian, char('>')),
        map(char('='), |_| ByteOrder::native()),
    ))(input)
}

// Either a type character or the numeric format code
fn format(input: &str) -> IResult<&str, DataTypeFormat> {
    alt((
        map_opt(one_of("iufcd"), DataTypeFormat::from_type_char),
        map_opt(one_of("12345"), |c| {
            c.to_digit(10)
                .and_then(|code| DataTypeFormat::try_from(code as u8).ok())
        }),
    ))(input)
}

fn sample_bytes(input: &str) -> IResult<&str, usize> {
    map_res(digit1, usize::from_str)(input)
}

fn data_type(input: &str) -> IResult<&str, NumericDataType> {
    map(
        tuple((byte_order, format, sample_bytes)),
        |(byte_order, format, sample_bytes)| NumericDataType {
            format,
            sample_bytes,
            byte_order,
        },
    )(input)
}

/// Parse a type string such as `"<f8"`. The result is validated.
pub fn parse_data_type(input: &str) -> Result<NumericDataType, Error> {
    let data_type = match terminated(data_type, eof)(input.trim()) {
        Ok((_, data_type)) => data_type,
        Err(_) => return Err(Error::InvalidTypeString(input.to_string())),
    };
    data_type.validate()?;
    Ok(data_type)
}

impl FromStr for NumericDataType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_data_type(s)
    }
}

impl TryFrom<String> for NumericDataType {
    type Error = Error;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        parse_data_type(&s)
    }
}

impl From<NumericDataType> for String {
    fn from(data_type: NumericDataType) -> String {
        data_type.to_string()
    }
}

#[cfg(test)]
use test_log::test;

#[test]
fn test_supported_sizes() {
    let le = ByteOrder::LittleEndian;
    for size in [1, 2, 4, 8] {
        assert!(NumericDataType::new(SignedInteger, size, le).is_supported());
        assert!(NumericDataType::new(UnsignedInteger, size, le).is_supported());
    }
    assert!(!NumericDataType::new(SignedInteger, 16, le).is_supported());
    assert!(!NumericDataType::new(UnsignedInteger, 3, le).is_supported());
    assert!(NumericDataType::new(FloatingPoint, 16, le).is_supported());
    assert!(!NumericDataType::new(FloatingPoint, 2, le).is_supported());
    assert!(!NumericDataType::new(FloatingPoint, 3, le).is_supported());
    assert!(NumericDataType::new(ComplexFloatingPoint, 8, le).is_supported());
    assert!(!NumericDataType::new(ComplexFloatingPoint, 4, le).is_supported());
    assert!(NumericDataType::new(Decimal, 16, le).is_supported());
    assert!(!NumericDataType::new(Decimal, 8, le).is_supported());

    let bad = NumericDataType::new(FloatingPoint, 3, le);
    assert_eq!(bad.validate(), Err(Error::UnsupportedDataType(bad)));
}

#[test]
fn test_parse_type_string() {
    assert_eq!(
        parse_data_type("<f8"),
        Ok(NumericDataType::new(
            FloatingPoint,
            8,
            ByteOrder::LittleEndian
        ))
    );
    assert_eq!(
        parse_data_type(">i2"),
        Ok(NumericDataType::new(SignedInteger, 2, ByteOrder::BigEndian))
    );
    assert_eq!(
        parse_data_type("=u1"),
        Ok(NumericDataType::native(UnsignedInteger, 1))
    );
    assert_eq!(
        parse_data_type(">c16"),
        Ok(NumericDataType::new(
            ComplexFloatingPoint,
            16,
            ByteOrder::BigEndian
        ))
    );
    assert_eq!(
        parse_data_type(" <d16 "),
        Ok(NumericDataType::new(Decimal, 16, ByteOrder::LittleEndian))
    );
    // Numeric format codes
    assert_eq!(
        parse_data_type("<38"),
        Ok(NumericDataType::new(
            FloatingPoint,
            8,
            ByteOrder::LittleEndian
        ))
    );
    assert_eq!(
        parse_data_type(">24"),
        Ok(NumericDataType::new(UnsignedInteger, 4, ByteOrder::BigEndian))
    );
}

#[test]
fn test_parse_type_string_failure() {
    assert_eq!(
        parse_data_type("f8"),
        Err(Error::InvalidTypeString("f8".to_string()))
    );
    assert_eq!(
        parse_data_type("<x8"),
        Err(Error::InvalidTypeString("<x8".to_string()))
    );
    assert_eq!(
        parse_data_type("<08"),
        Err(Error::InvalidTypeString("<08".to_string()))
    );
    assert_eq!(
        parse_data_type("<f8 junk"),
        Err(Error::InvalidTypeString("<f8 junk".to_string()))
    );
    assert_eq!(
        parse_data_type("<f3"),
        Err(Error::UnsupportedDataType(NumericDataType::new(
            FloatingPoint,
            3,
            ByteOrder::LittleEndian
        )))
    );
}

#[test]
fn test_type_string_display() {
    for s in ["<f8", ">i2", "<u1", ">c8", "<d16", ">f16"] {
        assert_eq!(parse_data_type(s).unwrap().to_string(), s);
    }
}

#[test]
fn test_format_codes() {
    assert_eq!(DataTypeFormat::try_from(3u8).ok(), Some(FloatingPoint));
    assert!(DataTypeFormat::try_from(0u8).is_err());
    assert!(DataTypeFormat::try_from(6u8).is_err());
    assert_eq!(u8::from(Decimal), 5);
}

#[test]
fn test_serde_type_string() {
    let data_type = NumericDataType::new(UnsignedInteger, 2, ByteOrder::BigEndian);
    assert_eq!(serde_json::to_string(&data_type).unwrap(), "\">u2\"");
    let parsed: NumericDataType = serde_json::from_str("\"<c16\"").unwrap();
    assert_eq!(
        parsed,
        NumericDataType::new(ComplexFloatingPoint, 16, ByteOrder::LittleEndian)
    );
    assert!(serde_json::from_str::<NumericDataType>("\"<i3\"").is_err());
}

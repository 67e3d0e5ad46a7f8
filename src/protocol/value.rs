//! Typed scalar values
//!
//! `WireValue` is the closed set of scalars the protocol can carry. Callers
//! build one explicitly, so the mapping from a Rust type to its type tag is
//! checked at compile time.
//!
//! ## Scalar Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Tag (1)  │ Len (4)  │  Value bytes (little-endian) │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```

use bytes::{Buf, BufMut};

use super::codes::DataType;
use super::endian::{self, ByteOrder, HOST_ORDER};
use crate::error::{NodeSocketError, Result};

/// Size of the tag + length prefix in front of every scalar
pub const SCALAR_HEADER_SIZE: usize = 5;

/// A scalar value that can travel over the wire
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Byte(i8),
    UByte(u8),
    Short(i16),
    UShort(u16),
    Int(i32),
    UInt(u32),
    Float(f32),
    Double(f64),
    String(String),
    Boolean(bool),
}

impl WireValue {
    /// The type tag for this value
    pub fn data_type(&self) -> DataType {
        match self {
            WireValue::Byte(_) => DataType::Byte,
            WireValue::UByte(_) => DataType::UByte,
            WireValue::Short(_) => DataType::Short,
            WireValue::UShort(_) => DataType::UShort,
            WireValue::Int(_) => DataType::Int,
            WireValue::UInt(_) => DataType::UInt,
            WireValue::Float(_) => DataType::Float,
            WireValue::Double(_) => DataType::Double,
            WireValue::String(_) => DataType::String,
            WireValue::Boolean(_) => DataType::Boolean,
        }
    }

    /// The zero value of a type, used when a call yields no result
    pub fn zero(data_type: DataType) -> Self {
        match data_type {
            DataType::Byte => WireValue::Byte(0),
            DataType::UByte => WireValue::UByte(0),
            DataType::Short => WireValue::Short(0),
            DataType::UShort => WireValue::UShort(0),
            DataType::Int => WireValue::Int(0),
            DataType::UInt => WireValue::UInt(0),
            DataType::Float => WireValue::Float(0.0),
            DataType::Double => WireValue::Double(0.0),
            DataType::String => WireValue::String(String::new()),
            DataType::Boolean => WireValue::Boolean(false),
        }
    }

    /// Length of the value bytes, excluding tag and length prefix
    pub fn encoded_len(&self) -> usize {
        match self {
            WireValue::String(s) => s.len(),
            other => other.data_type().fixed_len().unwrap_or(0),
        }
    }

    /// Value bytes in wire order, as produced on a host with `order`
    pub fn to_wire_bytes(&self, order: ByteOrder) -> Vec<u8> {
        match self {
            WireValue::Byte(v) => vec![*v as u8],
            WireValue::UByte(v) => vec![*v],
            WireValue::Short(v) => endian::i16_to_wire(*v, order).to_vec(),
            WireValue::UShort(v) => endian::u16_to_wire(*v, order).to_vec(),
            WireValue::Int(v) => endian::i32_to_wire(*v, order).to_vec(),
            WireValue::UInt(v) => endian::u32_to_wire(*v, order).to_vec(),
            WireValue::Float(v) => endian::f32_to_wire(*v, order).to_vec(),
            WireValue::Double(v) => endian::f64_to_wire(*v, order).to_vec(),
            WireValue::String(s) => s.as_bytes().to_vec(),
            WireValue::Boolean(b) => vec![u8::from(*b)],
        }
    }

    /// Equality that compares floats by bit pattern, so NaN equals itself
    pub fn bit_eq(&self, other: &WireValue) -> bool {
        match (self, other) {
            (WireValue::Float(a), WireValue::Float(b)) => a.to_bits() == b.to_bits(),
            (WireValue::Double(a), WireValue::Double(b)) => a.to_bits() == b.to_bits(),
            (a, b) => a == b,
        }
    }
}

impl std::fmt::Display for WireValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireValue::Byte(v) => write!(f, "{}", v),
            WireValue::UByte(v) => write!(f, "{}", v),
            WireValue::Short(v) => write!(f, "{}", v),
            WireValue::UShort(v) => write!(f, "{}", v),
            WireValue::Int(v) => write!(f, "{}", v),
            WireValue::UInt(v) => write!(f, "{}", v),
            WireValue::Float(v) => write!(f, "{}", v),
            WireValue::Double(v) => write!(f, "{}", v),
            WireValue::String(v) => write!(f, "{:?}", v),
            WireValue::Boolean(v) => write!(f, "{}", v),
        }
    }
}

// =============================================================================
// Scalar Encoding/Decoding
// =============================================================================

/// Encode a scalar as tag + length + value bytes
pub fn encode_scalar<B: BufMut>(value: &WireValue, buf: &mut B) {
    encode_scalar_with(value, HOST_ORDER, buf)
}

/// Encode a scalar as if running on a host with byte order `order`
pub fn encode_scalar_with<B: BufMut>(value: &WireValue, order: ByteOrder, buf: &mut B) {
    let bytes = value.to_wire_bytes(order);
    buf.put_u8(value.data_type() as u8);
    buf.put_slice(&endian::u32_to_wire(bytes.len() as u32, order));
    buf.put_slice(&bytes);
}

/// Decode value bytes of a known type
///
/// `bytes` must be exactly the declared length; strings are taken as-is,
/// with no terminator.
pub fn decode_scalar(data_type: DataType, bytes: &[u8]) -> Result<WireValue> {
    decode_scalar_with(data_type, bytes, HOST_ORDER)
}

/// Decode value bytes as if running on a host with byte order `order`
pub fn decode_scalar_with(data_type: DataType, bytes: &[u8], order: ByteOrder) -> Result<WireValue> {
    if let Some(expected) = data_type.fixed_len() {
        if bytes.len() != expected {
            return Err(NodeSocketError::Protocol(format!(
                "{:?} value: expected {} bytes, got {}",
                data_type,
                expected,
                bytes.len()
            )));
        }
    }

    let value = match data_type {
        DataType::Byte => WireValue::Byte(bytes[0] as i8),
        DataType::UByte => WireValue::UByte(bytes[0]),
        DataType::Short => WireValue::Short(endian::i16_from_wire(fixed(bytes), order)),
        DataType::UShort => WireValue::UShort(endian::u16_from_wire(fixed(bytes), order)),
        DataType::Int => WireValue::Int(endian::i32_from_wire(fixed(bytes), order)),
        DataType::UInt => WireValue::UInt(endian::u32_from_wire(fixed(bytes), order)),
        DataType::Float => WireValue::Float(endian::f32_from_wire(fixed(bytes), order)),
        DataType::Double => WireValue::Double(endian::f64_from_wire(fixed(bytes), order)),
        DataType::String => {
            let s = std::str::from_utf8(bytes).map_err(|e| {
                NodeSocketError::Protocol(format!("String value is not valid UTF-8: {}", e))
            })?;
            WireValue::String(s.to_string())
        }
        DataType::Boolean => WireValue::Boolean(bytes[0] > 0),
    };

    Ok(value)
}

/// Read one tag + length + value triple, advancing `buf` past it
///
/// The cursor always moves by the declared byte length.
pub fn read_scalar<B: Buf>(buf: &mut B) -> Result<WireValue> {
    if buf.remaining() < SCALAR_HEADER_SIZE {
        return Err(NodeSocketError::Protocol(format!(
            "Incomplete scalar header: expected {} bytes, got {}",
            SCALAR_HEADER_SIZE,
            buf.remaining()
        )));
    }

    let tag = buf.get_u8();
    let data_type = DataType::from_byte(tag)
        .ok_or_else(|| NodeSocketError::Protocol(format!("Unknown type tag: 0x{:02x}", tag)))?;
    let len = buf.get_u32_le() as usize;

    if buf.remaining() < len {
        return Err(NodeSocketError::Protocol(format!(
            "Incomplete {:?} value: expected {} bytes, got {}",
            data_type,
            len,
            buf.remaining()
        )));
    }

    let mut bytes = vec![0u8; len];
    buf.copy_to_slice(&mut bytes);
    decode_scalar(data_type, &bytes)
}

fn fixed<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

// =============================================================================
// Conversions
// =============================================================================

macro_rules! wire_conversions {
    ($($variant:ident($ty:ty) => $name:expr),* $(,)?) => {
        $(
            impl From<$ty> for WireValue {
                fn from(value: $ty) -> Self {
                    WireValue::$variant(value)
                }
            }

            impl FromWire for $ty {
                fn from_wire(value: WireValue) -> Result<Self> {
                    match value {
                        WireValue::$variant(v) => Ok(v),
                        other => Err(NodeSocketError::TypeMismatch {
                            expected: $name,
                            actual: other.data_type(),
                        }),
                    }
                }

                fn no_result() -> Self {
                    Default::default()
                }
            }
        )*
    };
}

wire_conversions! {
    Byte(i8) => "Byte",
    UByte(u8) => "UByte",
    Short(i16) => "Short",
    UShort(u16) => "UShort",
    Int(i32) => "Int",
    UInt(u32) => "UInt",
    Float(f32) => "Float",
    Double(f64) => "Double",
    String(String) => "String",
    Boolean(bool) => "Boolean",
}

impl From<&str> for WireValue {
    fn from(value: &str) -> Self {
        WireValue::String(value.to_string())
    }
}

/// Types a remote call result can be decoded into
pub trait FromWire: Sized {
    /// Convert a decoded result, failing on a type mismatch
    fn from_wire(value: WireValue) -> Result<Self>;

    /// Value returned when the peer answers with NoResult
    fn no_result() -> Self;
}

impl FromWire for WireValue {
    fn from_wire(value: WireValue) -> Result<Self> {
        Ok(value)
    }

    /// No type is known, so the Int zero stands in
    fn no_result() -> Self {
        WireValue::Int(0)
    }
}

impl FromWire for Option<WireValue> {
    fn from_wire(value: WireValue) -> Result<Self> {
        Ok(Some(value))
    }

    fn no_result() -> Self {
        None
    }
}

impl FromWire for () {
    fn from_wire(_value: WireValue) -> Result<Self> {
        Ok(())
    }

    fn no_result() -> Self {}
}

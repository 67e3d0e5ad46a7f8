//! Protocol Module
//!
//! Defines the wire protocol spoken between two nodes.
//!
//! ## Handshake
//! Both sides exchange the 8 ASCII bytes of [`SIGNATURE`] and must match
//! them byte-for-byte before any other traffic.
//!
//! ## Control Bytes
//! - 0x00: REQUEST_MASTER - sender claims the master role
//! - 0x01: REQUEST_SLAVE  - sender gives up the master role
//! - 0x02: EXEC_FUNCTION  - a call frame follows
//!
//! ### Type Tags
//! Byte, UByte, Short, UShort, Int, UInt, Float, Double, String, Boolean
//! (0x00 - 0x09). All multi-byte values are little-endian.
//!
//! ### Response Codes
//! - 0x00: OKAY (a typed value follows)
//! - 0x01: NO_RESULT
//! - 0x02: INVALID_FUNCTION
//! - 0x03: NODE_ERROR
//! - 0x04: INVALID_EXEC_CODE
//! - 0x05: NOT_ALLOWED

mod codes;
mod codec;
mod endian;
mod value;

pub use codes::{DataType, ExecutionCode, ResponseCode};
pub use codec::{
    call_payload_len, decode_call_frame, decode_call_payload, decode_response_frame,
    encode_call_frame, encode_response_frame, parse_payload_len, CallFrame, ResponseFrame,
    CALL_HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
pub use endian::{ByteOrder, HOST_ORDER};
pub use value::{
    decode_scalar, decode_scalar_with, encode_scalar, encode_scalar_with, read_scalar,
    FromWire, WireValue, SCALAR_HEADER_SIZE,
};

/// Protocol version token exchanged during the handshake
pub const SIGNATURE: &[u8; 8] = b"nsockv01";

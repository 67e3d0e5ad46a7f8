//! Protocol codec
//!
//! Encoding and decoding functions for call and response frames.
//!
//! ## Wire Format
//!
//! ### Call Frame
//! ```text
//! ┌──────────┬──────────────┬─────────────┬────────────┬─────────────┐
//! │ 0x02 (1) │ PayloadLen(4)│ IdentLen (4)│ Identifier │ Arg * N     │
//! └──────────┴──────────────┴─────────────┴────────────┴─────────────┘
//! ```
//! `PayloadLen` counts everything after itself: the identifier length
//! field, the identifier bytes and every argument's tag + length + bytes.
//!
//! ### Response Frame
//! ```text
//! ┌──────────┬───────────────────────────────────────┐
//! │ Code (1) │ Tag (1) + Len (4) + Bytes, if Okay    │
//! └──────────┴───────────────────────────────────────┘
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::codes::{ExecutionCode, ResponseCode};
use super::value::{encode_scalar, read_scalar, WireValue, SCALAR_HEADER_SIZE};
use crate::error::{NodeSocketError, Result};

/// Call frame header: 1 byte execution code + 4 bytes payload length
pub const CALL_HEADER_SIZE: usize = 5;

/// Maximum payload size accepted from a peer (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// A decoded remote function invocation
#[derive(Debug, Clone, PartialEq)]
pub struct CallFrame {
    /// Name of the function to run
    pub identifier: String,

    /// Arguments in call order
    pub args: Vec<WireValue>,
}

/// A decoded reply to a call frame
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseFrame {
    /// Outcome of the call
    pub code: ResponseCode,

    /// Result value, present only when `code` is Okay
    pub value: Option<WireValue>,
}

impl ResponseFrame {
    /// Successful call with a result value
    pub fn okay(value: WireValue) -> Self {
        Self {
            code: ResponseCode::Okay,
            value: Some(value),
        }
    }

    /// Successful call without a result
    pub fn no_result() -> Self {
        Self::code(ResponseCode::NoResult)
    }

    /// Bare response code with no value
    pub fn code(code: ResponseCode) -> Self {
        Self { code, value: None }
    }
}

// =============================================================================
// Call Frame Encoding/Decoding
// =============================================================================

/// Payload length of a call frame
///
/// 4 (identifier length field) + identifier bytes + (1 + 4 + len) per argument.
pub fn call_payload_len(identifier: &str, args: &[WireValue]) -> usize {
    let args_len: usize = args
        .iter()
        .map(|arg| SCALAR_HEADER_SIZE + arg.encoded_len())
        .sum();
    4 + identifier.len() + args_len
}

/// Encode a call frame to bytes
///
/// Fails if the payload exceeds `MAX_PAYLOAD_SIZE`, which the peer would
/// refuse after the frame was already on the wire.
pub fn encode_call_frame(identifier: &str, args: &[WireValue]) -> Result<Bytes> {
    let payload_len = call_payload_len(identifier, args);
    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(NodeSocketError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }

    let mut message = BytesMut::with_capacity(CALL_HEADER_SIZE + payload_len);
    message.put_u8(ExecutionCode::ExecFunction as u8);
    message.put_u32_le(payload_len as u32);
    message.put_u32_le(identifier.len() as u32);
    message.put_slice(identifier.as_bytes());

    for arg in args {
        encode_scalar(arg, &mut message);
    }

    Ok(message.freeze())
}

/// Decode a complete call frame, starting at the execution code
pub fn decode_call_frame(bytes: &[u8]) -> Result<CallFrame> {
    if bytes.len() < CALL_HEADER_SIZE {
        return Err(NodeSocketError::Protocol(format!(
            "Incomplete header: expected {} bytes, got {}",
            CALL_HEADER_SIZE,
            bytes.len()
        )));
    }

    if bytes[0] != ExecutionCode::ExecFunction as u8 {
        return Err(NodeSocketError::Protocol(format!(
            "Unexpected execution code: 0x{:02x}",
            bytes[0]
        )));
    }

    let payload_len = parse_payload_len([bytes[1], bytes[2], bytes[3], bytes[4]])?;

    let total_len = CALL_HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(NodeSocketError::Protocol(format!(
            "Incomplete payload: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    decode_call_payload(&bytes[CALL_HEADER_SIZE..total_len])
}

/// Decode the bytes that follow the payload length field
///
/// Arguments are read until the payload is fully consumed.
pub fn decode_call_payload(mut payload: &[u8]) -> Result<CallFrame> {
    if payload.remaining() < 4 {
        return Err(NodeSocketError::Protocol(
            "Call frame: missing identifier length".to_string(),
        ));
    }

    let identifier_len = payload.get_u32_le() as usize;
    if payload.remaining() < identifier_len {
        return Err(NodeSocketError::Protocol(format!(
            "Call frame: incomplete identifier (expected {}, got {})",
            identifier_len,
            payload.remaining()
        )));
    }

    let identifier = std::str::from_utf8(&payload[..identifier_len])
        .map_err(|e| NodeSocketError::Protocol(format!("Identifier is not valid UTF-8: {}", e)))?
        .to_string();
    payload.advance(identifier_len);

    let mut args = Vec::new();
    while payload.has_remaining() {
        args.push(read_scalar(&mut payload)?);
    }

    Ok(CallFrame { identifier, args })
}

/// Validate a payload length read from the wire
pub fn parse_payload_len(raw: [u8; 4]) -> Result<usize> {
    let payload_len = u32::from_le_bytes(raw);

    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(NodeSocketError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }
    if payload_len < 4 {
        return Err(NodeSocketError::Protocol(format!(
            "Payload too small: {} bytes (identifier length alone needs 4)",
            payload_len
        )));
    }

    Ok(payload_len as usize)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// The value is only written when the code is Okay. Okay without a value
/// goes out as NoResult so the peer never waits on a missing scalar.
pub fn encode_response_frame(response: &ResponseFrame) -> Bytes {
    let mut message = BytesMut::with_capacity(1 + SCALAR_HEADER_SIZE);

    match (response.code, &response.value) {
        (ResponseCode::Okay, Some(value)) => {
            message.put_u8(ResponseCode::Okay as u8);
            encode_scalar(value, &mut message);
        }
        (ResponseCode::Okay, None) => message.put_u8(ResponseCode::NoResult as u8),
        (code, _) => message.put_u8(code as u8),
    }

    message.freeze()
}

/// Decode a response from bytes
pub fn decode_response_frame(mut bytes: &[u8]) -> Result<ResponseFrame> {
    if !bytes.has_remaining() {
        return Err(NodeSocketError::Protocol(
            "Empty response frame".to_string(),
        ));
    }

    let code_byte = bytes.get_u8();
    let code = ResponseCode::from_byte(code_byte)
        .ok_or(NodeSocketError::UnknownResponse(code_byte))?;

    let value = if code == ResponseCode::Okay {
        Some(read_scalar(&mut bytes)?)
    } else {
        None
    };

    Ok(ResponseFrame { code, value })
}

//! Codec Tests
//!
//! Tests for call frame and response frame encoding/decoding.

use nodesocket::protocol::{
    call_payload_len, decode_call_frame, decode_call_payload, decode_response_frame,
    encode_call_frame, encode_response_frame, CallFrame, ResponseCode, ResponseFrame, WireValue,
    CALL_HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
use nodesocket::NodeSocketError;

// =============================================================================
// Call Frame Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_decode_call_no_args() {
    let encoded = encode_call_frame("ping", &[]).unwrap();
    let decoded = decode_call_frame(&encoded).unwrap();

    assert_eq!(decoded.identifier, "ping");
    assert!(decoded.args.is_empty());
}

#[test]
fn test_encode_decode_call_mixed_args() {
    let args = vec![
        WireValue::Byte(-128),
        WireValue::UByte(255),
        WireValue::Short(i16::MIN),
        WireValue::UShort(u16::MAX),
        WireValue::Int(-1),
        WireValue::UInt(u32::MAX),
        WireValue::Float(1.5),
        WireValue::Double(-2.25),
        WireValue::String("hello".to_string()),
        WireValue::Boolean(true),
        WireValue::Boolean(false),
    ];

    let encoded = encode_call_frame("mixed", &args).unwrap();
    let decoded = decode_call_frame(&encoded).unwrap();

    assert_eq!(
        decoded,
        CallFrame {
            identifier: "mixed".to_string(),
            args
        }
    );
}

#[test]
fn test_encode_decode_call_empty_identifier() {
    let encoded = encode_call_frame("", &[WireValue::Int(7)]).unwrap();
    let decoded = decode_call_frame(&encoded).unwrap();

    assert_eq!(decoded.identifier, "");
    assert_eq!(decoded.args, vec![WireValue::Int(7)]);
}

#[test]
fn test_encode_decode_call_empty_string_arg() {
    let args = vec![
        WireValue::String(String::new()),
        WireValue::Int(1),
    ];
    let encoded = encode_call_frame("f", &args).unwrap();
    let decoded = decode_call_frame(&encoded).unwrap();

    assert_eq!(decoded.args, args);
}

#[test]
fn test_encode_decode_call_multibyte_utf8() {
    // Byte length differs from character count for both the identifier and the argument
    let args = vec![
        WireValue::String("héllo ☃ 🚀".to_string()),
        WireValue::UShort(9),
    ];
    let encoded = encode_call_frame("données", &args).unwrap();
    let decoded = decode_call_frame(&encoded).unwrap();

    assert_eq!(decoded.identifier, "données");
    assert_eq!(decoded.args, args);
}

// =============================================================================
// Payload Length Tests
// =============================================================================

#[test]
fn test_payload_len_matches_consumed_bytes() {
    let cases: Vec<(&str, Vec<WireValue>)> = vec![
        ("", vec![]),
        ("a", vec![WireValue::Boolean(true)]),
        ("double", vec![WireValue::Int(3)]),
        ("naïve", vec![WireValue::String("☃☃".to_string()), WireValue::Double(0.1)]),
        (
            "many",
            (0..50).map(|i| WireValue::UShort(i as u16)).collect(),
        ),
    ];

    for (identifier, args) in cases {
        let encoded = encode_call_frame(identifier, &args).unwrap();
        let payload_len = call_payload_len(identifier, &args);

        // Leading code and the length field itself are excluded
        assert_eq!(encoded.len() - CALL_HEADER_SIZE, payload_len);
        assert_eq!(
            u32::from_le_bytes([encoded[1], encoded[2], encoded[3], encoded[4]]) as usize,
            payload_len
        );
    }
}

#[test]
fn test_payload_len_formula() {
    // 4 + identifier bytes + (1 + 4 + len) per argument
    let args = vec![WireValue::Int(1), WireValue::String("abc".to_string())];
    assert_eq!(call_payload_len("fn", &args), 4 + 2 + (5 + 4) + (5 + 3));
}

#[test]
fn test_decode_call_payload_directly() {
    let encoded = encode_call_frame("add", &[WireValue::Int(2), WireValue::Int(3)]).unwrap();
    let decoded = decode_call_payload(&encoded[CALL_HEADER_SIZE..]).unwrap();

    assert_eq!(decoded.identifier, "add");
    assert_eq!(decoded.args, vec![WireValue::Int(2), WireValue::Int(3)]);
}

// =============================================================================
// Wire Format Verification Tests
// =============================================================================

#[test]
fn test_wire_format_call() {
    let encoded = encode_call_frame("ab", &[WireValue::Int(1)]).unwrap();

    // Expected: [0x02][0x0F 0 0 0][0x02 0 0 0][a b][0x04][0x04 0 0 0][0x01 0 0 0]
    //           exec  payload(15)  ident_len(2) ident tag  len(4)      value
    assert_eq!(encoded.len(), 20);
    assert_eq!(encoded[0], 0x02);
    assert_eq!(&encoded[1..5], &[0x0F, 0x00, 0x00, 0x00]);
    assert_eq!(&encoded[5..9], &[0x02, 0x00, 0x00, 0x00]);
    assert_eq!(&encoded[9..11], b"ab");
    assert_eq!(encoded[11], 0x04);
    assert_eq!(&encoded[12..16], &[0x04, 0x00, 0x00, 0x00]);
    assert_eq!(&encoded[16..20], &[0x01, 0x00, 0x00, 0x00]);
}

#[test]
fn test_wire_format_response_okay() {
    let encoded = encode_response_frame(&ResponseFrame::okay(WireValue::Int(6)));

    // Expected: [0x00][0x04][0x04 0 0 0][0x06 0 0 0]
    //           code  tag   len(4)      value
    assert_eq!(
        encoded.as_ref(),
        &[0x00, 0x04, 0x04, 0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00]
    );
}

#[test]
fn test_wire_format_response_codes_only() {
    assert_eq!(encode_response_frame(&ResponseFrame::no_result()).as_ref(), &[0x01]);
    assert_eq!(
        encode_response_frame(&ResponseFrame::code(ResponseCode::InvalidFunction)).as_ref(),
        &[0x02]
    );
    assert_eq!(
        encode_response_frame(&ResponseFrame::code(ResponseCode::NotAllowed)).as_ref(),
        &[0x05]
    );
}

#[test]
fn test_response_value_only_written_for_okay() {
    let frame = ResponseFrame {
        code: ResponseCode::NodeError,
        value: Some(WireValue::Int(1)),
    };
    assert_eq!(encode_response_frame(&frame).as_ref(), &[0x03]);
}

#[test]
fn test_okay_without_value_sent_as_no_result() {
    let frame = ResponseFrame {
        code: ResponseCode::Okay,
        value: None,
    };
    let encoded = encode_response_frame(&frame);
    assert_eq!(encoded.as_ref(), &[0x01]);

    let decoded = decode_response_frame(&encoded).unwrap();
    assert_eq!(decoded, ResponseFrame::no_result());
}

// =============================================================================
// Response Decoding Tests
// =============================================================================

#[test]
fn test_encode_decode_response_okay() {
    let frame = ResponseFrame::okay(WireValue::String("result".to_string()));
    let decoded = decode_response_frame(&encode_response_frame(&frame)).unwrap();

    assert_eq!(decoded, frame);
}

#[test]
fn test_decode_response_every_known_code() {
    for code in [
        ResponseCode::NoResult,
        ResponseCode::InvalidFunction,
        ResponseCode::NodeError,
        ResponseCode::InvalidExecCode,
        ResponseCode::NotAllowed,
    ] {
        let decoded = decode_response_frame(&[code as u8]).unwrap();
        assert_eq!(decoded.code, code);
        assert_eq!(decoded.value, None);
    }
}

#[test]
fn test_decode_response_unknown_code() {
    let result = decode_response_frame(&[0x06]);
    assert!(matches!(result, Err(NodeSocketError::UnknownResponse(0x06))));

    let result = decode_response_frame(&[0xFF]);
    assert!(matches!(result, Err(NodeSocketError::UnknownResponse(0xFF))));
}

#[test]
fn test_decode_response_okay_without_value() {
    let result = decode_response_frame(&[0x00]);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Incomplete scalar header"));
}

#[test]
fn test_decode_empty_response() {
    let result = decode_response_frame(&[]);
    assert!(matches!(result, Err(NodeSocketError::Protocol(_))));
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_incomplete_header() {
    let bytes = [0x02, 0x00, 0x00]; // Only 3 bytes, need 5
    let result = decode_call_frame(&bytes);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Incomplete header"));
}

#[test]
fn test_wrong_execution_code() {
    let mut bytes = encode_call_frame("f", &[]).unwrap().to_vec();
    bytes[0] = 0x00;
    let result = decode_call_frame(&bytes);
    assert!(result.unwrap_err().to_string().contains("Unexpected execution code"));
}

#[test]
fn test_incomplete_payload() {
    let encoded = encode_call_frame("double", &[WireValue::Int(3)]).unwrap();
    let result = decode_call_frame(&encoded[..encoded.len() - 2]);
    assert!(result.unwrap_err().to_string().contains("Incomplete payload"));
}

#[test]
fn test_payload_too_large() {
    let bytes = [0x02, 0xFF, 0xFF, 0xFF, 0xFF];
    let result = decode_call_frame(&bytes);
    assert!(result.unwrap_err().to_string().contains("Payload too large"));
}

#[test]
fn test_encode_rejects_oversized_payload() {
    // 4 (ident len) + 5 (arg header) + value bytes lands one past the limit
    let value = "x".repeat(MAX_PAYLOAD_SIZE as usize - 8);
    let result = encode_call_frame("", &[WireValue::String(value)]);
    assert!(result.unwrap_err().to_string().contains("Payload too large"));
}

#[test]
fn test_encode_accepts_payload_at_limit() {
    let value = "x".repeat(MAX_PAYLOAD_SIZE as usize - 9);
    let args = [WireValue::String(value)];
    assert_eq!(call_payload_len("", &args), MAX_PAYLOAD_SIZE as usize);

    let encoded = encode_call_frame("", &args).unwrap();
    assert_eq!(encoded.len(), CALL_HEADER_SIZE + MAX_PAYLOAD_SIZE as usize);
    assert_eq!(&encoded[1..5], &MAX_PAYLOAD_SIZE.to_le_bytes());
}

#[test]
fn test_payload_too_small_for_identifier_length() {
    let bytes = [0x02, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00];
    let result = decode_call_frame(&bytes);
    assert!(result.unwrap_err().to_string().contains("Payload too small"));
}

#[test]
fn test_identifier_longer_than_payload() {
    // payload_len 6, identifier claims 10 bytes
    let bytes = [0x02, 0x06, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x00, 0x00, b'a', b'b'];
    let result = decode_call_frame(&bytes);
    assert!(result.unwrap_err().to_string().contains("incomplete identifier"));
}

#[test]
fn test_truncated_argument_inside_payload() {
    // Argument declares 4 bytes but payload ends after 2
    let bytes = [
        0x02, 0x0B, 0x00, 0x00, 0x00, // payload_len 11
        0x00, 0x00, 0x00, 0x00, // identifier ""
        0x04, 0x04, 0x00, 0x00, 0x00, 0x01, 0x02, // Int with 2 of 4 bytes
    ];
    let result = decode_call_frame(&bytes);
    assert!(result.unwrap_err().to_string().contains("Incomplete Int value"));
}

#[test]
fn test_unknown_type_tag() {
    let bytes = [
        0x02, 0x0A, 0x00, 0x00, 0x00, // payload_len 10
        0x00, 0x00, 0x00, 0x00, // identifier ""
        0x0A, 0x01, 0x00, 0x00, 0x00, 0x00, // tag 0x0A is invalid
    ];
    let result = decode_call_frame(&bytes);
    assert!(result.unwrap_err().to_string().contains("Unknown type tag"));
}

#[test]
fn test_invalid_utf8_identifier() {
    let bytes = [0x02, 0x06, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0xC3, 0x28];
    let result = decode_call_frame(&bytes);
    assert!(result.unwrap_err().to_string().contains("not valid UTF-8"));
}

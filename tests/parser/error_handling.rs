//! Tests for error classification and header validation

use h2_frame_parser::{
    compile_frame, flags, frame_type, ping_frame, ErrorCode, ErrorKind, H2Event, ParseError,
    ParserConfig, StreamError,
};

use crate::support::*;

/// Header limit where one 20-byte field decodes fine but its literal
/// encoding (23 bytes) is over the limit.
fn small_header_limit() -> ParserConfig {
    ParserConfig::new().header_size_limit(20)
}

#[test]
fn test_oversized_header_block_is_stream_error() {
    let mut parser = parser_with(small_header_limit());

    let block = literal("x-a", &"v".repeat(17));
    let mut data = headers_frame(1, flags::END_HEADERS | flags::END_STREAM, &block);
    data.extend(headers_frame(3, flags::END_HEADERS, &[0x82]));
    parser.push(&data).unwrap();

    let events = parser.handler();
    assert_eq!(events.len(), 2, "no headers or stream end for the rejected block");
    assert_eq!(
        events[0],
        H2Event::StreamError(StreamError {
            stream_id: 1,
            code: ErrorCode::EnhanceYourCalm,
            kind: ErrorKind::HeaderListTooLarge(20),
        })
    );
    assert!(matches!(&events[1], H2Event::Headers { stream_id: 3, .. }));
    assert!(!parser.is_closed());
}

#[test]
fn test_oversized_block_still_updates_dynamic_table() {
    let mut parser = parser_with(small_header_limit());

    // Inserts x-a into the dynamic table at index 62, then is rejected
    let block = indexed_literal("x-a", &"v".repeat(17));
    parser.push(&headers_frame(1, flags::END_HEADERS, &block)).unwrap();
    assert_eq!(stream_errors(parser.handler()).len(), 1);

    // 0xbe = indexed field 62
    parser.push(&headers_frame(3, flags::END_HEADERS, &[0xbe])).unwrap();

    match &parser.handler()[1] {
        H2Event::Headers { stream_id, headers, .. } => {
            assert_eq!(*stream_id, 3);
            assert_eq!(headers.get("x-a"), Some("vvvvvvvvvvvvvvvvv"));
        }
        other => panic!("Expected Headers event, got {:?}", other),
    }
}

#[test]
fn test_size_limit_reported_before_invalid_name() {
    let mut parser = parser_with(small_header_limit());

    let block = literal("X-A", &"v".repeat(17));
    parser.push(&headers_frame(1, flags::END_HEADERS, &block)).unwrap();

    let errors = stream_errors(parser.handler());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::HeaderListTooLarge(20));
}

#[test]
fn test_decoded_size_over_limit_is_compression_error() {
    let mut parser = parser_with(ParserConfig::new().header_size_limit(8));

    // :method GET decodes to 10 bytes from a single byte
    let err = expect_connection_error(parser.push(&headers_frame(1, flags::END_HEADERS, &[0x82])));

    assert_eq!(err.code, ErrorCode::CompressionError);
    assert_reported(&parser, &err);
}

#[test]
fn test_hpack_failure_is_connection_error() {
    let mut parser = new_parser();

    // Index 0 is invalid
    let err = expect_connection_error(parser.push(&headers_frame(1, flags::END_HEADERS, &[0x80])));

    assert!(matches!(err.kind, ErrorKind::Compression(_)));
    assert_eq!(err.code, ErrorCode::CompressionError);
    assert_reported(&parser, &err);
}

#[test]
fn test_invalid_header_name_is_stream_error() {
    let mut parser = new_parser();

    let mut block = vec![0x82];
    block.extend(literal("X-Upper", "v"));
    let mut data = headers_frame(5, flags::END_HEADERS, &block);
    data.extend(ping_frame([9; 8], false));
    parser.push(&data).unwrap();

    assert_eq!(
        parser.handler().as_slice(),
        &[
            H2Event::StreamError(StreamError {
                stream_id: 5,
                code: ErrorCode::ProtocolError,
                kind: ErrorKind::InvalidHeaderName,
            }),
            H2Event::Ping([9; 8]),
        ]
    );
}

#[test]
fn test_pseudo_header_after_regular_is_connection_error() {
    let mut parser = new_parser();

    let mut block = literal("accept", "*/*");
    block.push(0x82);
    let err = expect_connection_error(parser.push(&headers_frame(1, flags::END_HEADERS, &block)));

    assert_eq!(err.kind, ErrorKind::PseudoHeaderAfterRegular);
    assert_reported(&parser, &err);
}

#[test]
fn test_repeat_pseudo_header_is_connection_error() {
    let mut parser = new_parser();

    let err = expect_connection_error(
        parser.push(&headers_frame(1, flags::END_HEADERS, &[0x82, 0x83])),
    );
    assert_eq!(err.kind, ErrorKind::RepeatPseudoHeader(":method".to_string()));
}

#[test]
fn test_frame_size_limit_checked_before_payload() {
    let mut parser = new_parser();

    let frame = compile_frame(&vec![0; 16385], frame_type::DATA, flags::NONE, 1);

    // The header alone is enough to reject the frame
    let err = expect_connection_error(parser.push(&frame[..9]));

    assert_eq!(err.kind, ErrorKind::FrameTooLarge { length: 16385, limit: 16384 });
    assert_eq!(err.code, ErrorCode::FrameSizeError);
    assert_reported(&parser, &err);
    assert_eq!(parser.buffered_len(), 0);
    assert_eq!(parser.received_byte_count(), 0);
    assert_eq!(parser.received_frame_count(), 0);
}

#[test]
fn test_frame_at_size_limit_accepted() {
    let mut parser = new_parser();

    parser
        .push(&compile_frame(&vec![7; 16384], frame_type::DATA, flags::NONE, 1))
        .unwrap();

    assert!(matches!(&parser.handler()[0], H2Event::Data { data, .. } if data.len() == 16384));
}

#[test]
fn test_configured_frame_size_limit() {
    let mut parser = parser_with(ParserConfig::new().frame_size_limit(4));

    let err = expect_connection_error(parser.push(&ping_frame([0; 8], false)));
    assert_eq!(err.kind, ErrorKind::FrameTooLarge { length: 8, limit: 4 });
}

#[test]
fn test_unknown_frame_type_ignored() {
    let mut parser = new_parser();

    let mut data = compile_frame(b"extension payload", 0x7f, 0xff, 5);
    data.extend(ping_frame([1; 8], false));
    parser.push(&data).unwrap();

    assert_eq!(parser.handler().as_slice(), &[H2Event::Ping([1; 8])]);
    assert_eq!(parser.received_frame_count(), 2);
}

#[test]
fn test_unknown_frame_during_continuation_rejected() {
    let mut parser = new_parser();

    let mut data = headers_frame(1, flags::NONE, &[0x82]);
    data.extend(compile_frame(&[], 0x7f, 0, 1));

    let err = expect_connection_error(parser.push(&data));
    assert_eq!(err.kind, ErrorKind::ExpectedContinuation(1));
}

#[test]
fn test_push_after_connection_error_fails() {
    let mut parser = new_parser();

    expect_connection_error(parser.push(&data_frame(0, flags::NONE, b"x")));
    let events_before = parser.handler().len();

    assert_eq!(parser.push(&ping_frame([0; 8], false)), Err(ParseError::Closed));
    assert_eq!(parser.handler().len(), events_before);
}

#[test]
fn test_frames_after_fatal_frame_in_same_chunk_not_processed() {
    let mut parser = new_parser();

    let mut data = ping_frame([1; 8], false);
    data.extend(data_frame(0, flags::NONE, b"x"));
    data.extend(ping_frame([2; 8], false));
    expect_connection_error(parser.push(&data));

    let events = parser.handler();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], H2Event::Ping([1; 8]));
    assert!(matches!(&events[1], H2Event::ConnectionError(_)));
}

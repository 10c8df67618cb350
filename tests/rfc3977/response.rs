//! RFC 3977 Section 3.1 - Response Line Parsing Tests
//!
//! - Responses begin with a three-digit status code
//! - The code is followed by an optional space and message

use nntp_mirror::commands::{parse_response_line, parse_single_response};
use nntp_mirror::{MirrorError, codes};

#[test]
fn test_response_with_message() {
    let (code, msg) = parse_response_line("200 server ready").unwrap();
    assert_eq!(code, 200);
    assert_eq!(msg, "server ready");
}

#[test]
fn test_response_code_only() {
    let (code, msg) = parse_response_line("205").unwrap();
    assert_eq!(code, codes::CLOSING_CONNECTION);
    assert_eq!(msg, "");
}

#[test]
fn test_response_missing_space() {
    let (code, msg) = parse_response_line("111yyyymmddhhmmss").unwrap();
    assert_eq!(code, codes::SERVER_DATE);
    assert_eq!(msg, "yyyymmddhhmmss");
}

#[test]
fn test_response_with_bom() {
    let (code, _) = parse_response_line("\u{FEFF}201 no posting").unwrap();
    assert_eq!(code, codes::READY_NO_POSTING);
}

#[test]
fn test_response_codes_the_mirror_handles() {
    let cases = [
        ("211 3 1 3 alt.test", codes::GROUP_SELECTED),
        ("215 list follows", codes::LIST_INFORMATION_FOLLOWS),
        ("221 Header follows", codes::XHDR_FOLLOWS),
        ("225 Headers follow", codes::HEADERS_FOLLOW),
        ("281 Authentication accepted", codes::AUTH_ACCEPTED),
        ("381 Password required", codes::AUTH_CONTINUE),
        ("411 No such newsgroup", codes::NO_SUCH_GROUP),
        ("412 No newsgroup selected", codes::NO_GROUP_SELECTED),
        ("423 No articles in that range", codes::NO_SUCH_ARTICLE_NUMBER),
        ("481 Authentication failed", codes::AUTH_REJECTED),
        ("500 Unknown command", codes::COMMAND_NOT_RECOGNIZED),
    ];
    for (line, expected) in cases {
        let (code, _) = parse_response_line(line).unwrap();
        assert_eq!(code, expected, "Failed for input: {}", line);
    }
}

#[test]
fn test_response_rejects_malformed_lines() {
    for line in ["", "20", "abc hello", "2x0 nope", "2000 four digits", " 200 leading space"] {
        assert!(
            matches!(parse_response_line(line), Err(MirrorError::InvalidResponse(_))),
            "accepted {:?}",
            line
        );
    }
}

#[test]
fn test_invalid_response_echo_is_bounded() {
    let line = format!("xyz {}", "a".repeat(1000));
    match parse_response_line(&line) {
        Err(MirrorError::InvalidResponse(echo)) => assert!(echo.len() <= 100),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_single_response_classification() {
    let ok = parse_single_response("211 3 1 3 alt.test").unwrap();
    assert!(ok.is_success());
    assert!(ok.lines.is_empty());

    let more = parse_single_response("381 Password required").unwrap();
    assert!(more.is_continuation());

    let err = parse_single_response("411 No such newsgroup").unwrap();
    assert!(err.is_error());
}

//! RFC 3977 Section 6.1.1 - GROUP Command Tests
//!
//! Response: "211 number low high group"

use nntp_mirror::commands::{group, parse_group_response};
use nntp_mirror::{ArticleRange, MirrorError, NntpResponse};

fn response(code: u16, message: &str) -> NntpResponse {
    NntpResponse {
        code,
        message: message.to_string(),
        lines: vec![],
    }
}

#[test]
fn test_group_command_format() {
    assert_eq!(group("alt.test"), "GROUP alt.test\r\n");
    assert_eq!(group("comp.lang.rust").matches("\r\n").count(), 1);
}

#[test]
fn test_group_response_standard_format() {
    let info = parse_group_response(response(211, "1234 100 5000 alt.test")).unwrap();
    assert_eq!(info.count, 1234);
    assert_eq!(info.first, 100);
    assert_eq!(info.last, 5000);
    assert_eq!(info.range(), ArticleRange::new(100, 5000));
}

#[test]
fn test_group_response_empty_group() {
    // RFC 3977 §6.1.1: an empty group may report high = low - 1
    let info = parse_group_response(response(211, "0 100 99 empty.group")).unwrap();
    assert!(info.range().is_empty());
    assert_eq!(info.range(), ArticleRange::new(100, 99));

    let info = parse_group_response(response(211, "0 0 0 empty.group")).unwrap();
    assert!(info.range().is_empty());
}

#[test]
fn test_group_response_estimate_may_exceed_range() {
    // The count is only an estimate
    let info = parse_group_response(response(211, "5000 1 100 alt.test")).unwrap();
    assert_eq!(info.range(), ArticleRange::new(1, 100));
}

#[test]
fn test_group_response_without_group_name() {
    let info = parse_group_response(response(211, "10 1 10")).unwrap();
    assert_eq!(info.last, 10);
}

#[test]
fn test_group_response_malformed() {
    for message in ["", "10 1", "ten 1 10 alt.test", "10 -1 10 alt.test"] {
        assert!(
            matches!(
                parse_group_response(response(211, message)),
                Err(MirrorError::InvalidResponse(_))
            ),
            "accepted {:?}",
            message
        );
    }
}

#[test]
fn test_group_response_error_status() {
    assert!(matches!(
        parse_group_response(response(411, "No such newsgroup")),
        Err(MirrorError::Protocol { code: 411, .. })
    ));
}

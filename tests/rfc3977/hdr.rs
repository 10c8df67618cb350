//! RFC 3977 Section 8.5 - HDR Command Tests, with RFC 2980 XHDR
//!
//! Reference: https://datatracker.ietf.org/doc/html/rfc3977#section-8.5

use nntp_mirror::commands::{self, HdrEntry};
use nntp_mirror::{ArticleRange, MirrorError, NntpResponse, codes};

fn body(code: u16, lines: &[&str]) -> NntpResponse {
    NntpResponse {
        code,
        message: "Headers follow".to_string(),
        lines: lines.iter().map(|l| l.to_string()).collect(),
    }
}

#[test]
fn test_hdr_command_format() {
    assert_eq!(commands::hdr("Subject", "1-100"), "HDR Subject 1-100\r\n");
    assert_eq!(commands::hdr("Message-Id", "42"), "HDR Message-Id 42\r\n");
}

#[test]
fn test_xhdr_command_format() {
    assert_eq!(commands::xhdr("Date", "1-100"), "XHDR Date 1-100\r\n");
}

#[test]
fn test_hdr_range_argument_from_article_range() {
    let range = ArticleRange::new(990, 1000);
    assert_eq!(
        commands::hdr("From", &range.to_string()),
        "HDR From 990-1000\r\n"
    );
}

#[test]
fn test_parse_hdr_response() {
    let entries = commands::parse_hdr_response(body(
        codes::HEADERS_FOLLOW,
        &["3000 I am just a test article", "3001 Re: I am just a test article"],
    ))
    .unwrap();

    assert_eq!(
        entries,
        vec![
            HdrEntry {
                article_number: 3000,
                value: "I am just a test article".to_string(),
            },
            HdrEntry {
                article_number: 3001,
                value: "Re: I am just a test article".to_string(),
            },
        ]
    );
}

#[test]
fn test_parse_xhdr_response() {
    let entries = commands::parse_hdr_response(body(
        codes::XHDR_FOLLOWS,
        &["5 <5@example.com>", "6 <6@example.com>"],
    ))
    .unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].value, "<6@example.com>");
}

#[test]
fn test_parse_hdr_absent_header() {
    // RFC 3977 §8.5.2: articles without the header have an empty value
    let entries = commands::parse_hdr_response(body(225, &["7 ", "8"])).unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.value.is_empty()));
}

#[test]
fn test_parse_hdr_empty_body() {
    let entries = commands::parse_hdr_response(body(225, &[])).unwrap();
    assert!(entries.is_empty());
}

#[test]
fn test_parse_hdr_error_status() {
    let response = NntpResponse {
        code: codes::NO_GROUP_SELECTED,
        message: "No newsgroup selected".to_string(),
        lines: vec![],
    };
    assert!(matches!(
        commands::parse_hdr_response(response),
        Err(MirrorError::Protocol { code: 412, .. })
    ));
}

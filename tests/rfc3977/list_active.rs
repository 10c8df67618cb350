//! RFC 3977 Section 7.6.3 - LIST ACTIVE Command Tests
//!
//! Response lines: "group high low status"

use nntp_mirror::commands::{self, ActiveGroup};
use nntp_mirror::{NntpResponse, codes};

fn listing(lines: &[&str]) -> NntpResponse {
    NntpResponse {
        code: codes::LIST_INFORMATION_FOLLOWS,
        message: "list of newsgroups follows".to_string(),
        lines: lines.iter().map(|l| l.to_string()).collect(),
    }
}

#[test]
fn test_list_active_command_format() {
    assert_eq!(commands::list_active("*"), "LIST ACTIVE *\r\n");
    assert_eq!(commands::list_active("comp.lang.*"), "LIST ACTIVE comp.lang.*\r\n");
}

#[test]
fn test_list_active_response() {
    let groups = commands::parse_list_active_response(listing(&[
        "misc.test 3002322 3000234 y",
        "comp.risks 442001 441099 m",
        "alt.rfc-writers.recovery 4 1 y",
        "tx.natives.recovery 89 56 y",
        "tx.natives.recovery.d 11 9 n",
    ]))
    .unwrap();

    assert_eq!(groups.len(), 5);
    assert_eq!(
        groups[0],
        ActiveGroup {
            name: "misc.test".to_string(),
            high: 3002322,
            low: 3000234,
            status: "y".to_string(),
        }
    );
    assert_eq!(groups[1].status, "m");
}

#[test]
fn test_list_active_alias_status() {
    let groups =
        commands::parse_list_active_response(listing(&["old.group 0 1 =new.group"])).unwrap();
    assert_eq!(groups[0].status, "=new.group");
}

#[test]
fn test_list_active_skips_short_lines() {
    let groups =
        commands::parse_list_active_response(listing(&["broken", "alt.test 10 1 y"])).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "alt.test");
}

#[test]
fn test_list_active_empty() {
    let groups = commands::parse_list_active_response(listing(&[])).unwrap();
    assert!(groups.is_empty());
}

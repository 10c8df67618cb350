//! Scripted in-process NNTP server for session tests
//!
//! Speaks plain TCP on a loopback port and answers the handful of commands
//! the mirror uses. Every received command line is logged.

#![allow(dead_code)]

use nntp_mirror::ServerConfig;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// Articles keyed by number, each a list of (header, value)
pub type Articles = BTreeMap<u64, Vec<(String, String)>>;

#[derive(Debug, Clone, Default)]
pub struct MockNews {
    pub groups: BTreeMap<String, Articles>,
    /// Answer HDR with 500 so clients must use XHDR
    pub xhdr_only: bool,
    /// Require AUTHINFO with these credentials
    pub credentials: Option<(String, String)>,
    /// Hang up on the first connection when this command number arrives
    pub drop_first_connection_at: Option<usize>,
    /// Low-water mark reported for groups without articles
    pub low_water: BTreeMap<String, u64>,
}

impl MockNews {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_article(mut self, group: &str, article: u64, headers: &[(&str, &str)]) -> Self {
        self.groups.entry(group.to_string()).or_default().insert(
            article,
            headers
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        );
        self
    }

    /// Articles `range` with Message-Id, Date and Subject set
    pub fn with_articles(mut self, group: &str, range: std::ops::RangeInclusive<u64>) -> Self {
        for n in range {
            let message_id = format!("<{}@example.com>", n);
            let subject = format!("Article {}", n);
            self = self.with_article(
                group,
                n,
                &[
                    ("Message-Id", message_id.as_str()),
                    ("Date", "Tue, 20 Jan 2026 12:00:00 +0000"),
                    ("Subject", subject.as_str()),
                    ("From", "poster@example.com"),
                ],
            );
        }
        self
    }

    pub fn with_empty_group(mut self, group: &str) -> Self {
        self.groups.entry(group.to_string()).or_default();
        self
    }

    /// Empty group whose articles below `low` have all expired
    pub fn with_expired_group(mut self, group: &str, low: u64) -> Self {
        self.low_water.insert(group.to_string(), low);
        self.with_empty_group(group)
    }
}

pub struct MockServer {
    pub addr: SocketAddr,
    log: Arc<Mutex<Vec<String>>>,
    connections: Arc<AtomicUsize>,
}

impl MockServer {
    pub async fn start(news: MockNews) -> MockServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));
        let news = Arc::new(news);

        let accept_log = Arc::clone(&log);
        let accept_connections = Arc::clone(&connections);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let index = accept_connections.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(serve(
                    stream,
                    Arc::clone(&news),
                    Arc::clone(&accept_log),
                    index,
                ));
            }
        });

        MockServer {
            addr,
            log,
            connections,
        }
    }

    /// Plain-TCP configuration pointing at this server
    pub fn config(&self) -> ServerConfig {
        ServerConfig::new("127.0.0.1", self.addr.port(), false)
    }

    /// Every command line received so far, across connections
    pub fn commands(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

struct ConnectionState {
    group: Option<String>,
    user: Option<String>,
    authenticated: bool,
}

async fn serve(stream: TcpStream, news: Arc<MockNews>, log: Arc<Mutex<Vec<String>>>, index: usize) {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();
    if write.write_all(b"200 mock news server ready\r\n").await.is_err() {
        return;
    }

    let mut state = ConnectionState {
        group: None,
        user: None,
        authenticated: false,
    };
    let mut received = 0;
    while let Ok(Some(line)) = lines.next_line().await {
        log.lock().unwrap().push(line.clone());
        received += 1;
        if index == 0 && news.drop_first_connection_at == Some(received) {
            return;
        }

        let reply = respond(&news, &mut state, &line);
        if write.write_all(reply.as_bytes()).await.is_err() {
            return;
        }
        if line.eq_ignore_ascii_case("QUIT") {
            return;
        }
    }
}

fn respond(news: &MockNews, state: &mut ConnectionState, line: &str) -> String {
    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or_default().to_ascii_uppercase();

    if news.credentials.is_some()
        && !state.authenticated
        && !matches!(verb.as_str(), "AUTHINFO" | "QUIT" | "DATE")
    {
        return "480 Authentication required\r\n".to_string();
    }

    match verb.as_str() {
        "DATE" => "111 20260120120000\r\n".to_string(),
        "QUIT" => "205 Bye\r\n".to_string(),
        "AUTHINFO" => {
            let sub = words.next().unwrap_or_default().to_ascii_uppercase();
            let arg = words.next().unwrap_or_default().to_string();
            match sub.as_str() {
                "USER" => {
                    state.user = Some(arg);
                    "381 Password required\r\n".to_string()
                }
                "PASS" => {
                    let accepted = news.credentials.as_ref().is_some_and(|(user, pass)| {
                        state.user.as_deref() == Some(user.as_str()) && *pass == arg
                    });
                    if accepted {
                        state.authenticated = true;
                        "281 Authentication accepted\r\n".to_string()
                    } else {
                        "481 Authentication failed\r\n".to_string()
                    }
                }
                _ => "501 Syntax error\r\n".to_string(),
            }
        }
        "GROUP" => {
            let name = words.next().unwrap_or_default();
            match news.groups.get(name) {
                Some(articles) => {
                    state.group = Some(name.to_string());
                    let (first, last) = match (articles.keys().next(), articles.keys().next_back()) {
                        (Some(first), Some(last)) => (*first, *last),
                        _ => match news.low_water.get(name) {
                            Some(&low) => (low, low.saturating_sub(1)),
                            None => (0, 0),
                        },
                    };
                    format!("211 {} {} {} {}\r\n", articles.len(), first, last, name)
                }
                None => "411 No such newsgroup\r\n".to_string(),
            }
        }
        "HDR" if news.xhdr_only => "500 Unknown command\r\n".to_string(),
        "HDR" | "XHDR" => {
            let Some(articles) = state.group.as_ref().and_then(|g| news.groups.get(g)) else {
                return "412 No newsgroup selected\r\n".to_string();
            };
            let field = words.next().unwrap_or_default();
            let (min, max) = parse_range(words.next().unwrap_or_default());
            let selected: Vec<_> = if min <= max {
                articles.range(min..=max).collect()
            } else {
                Vec::new()
            };
            if selected.is_empty() {
                return "423 No articles in that range\r\n".to_string();
            }

            let code = if verb == "HDR" { 225 } else { 221 };
            let mut reply = format!("{} Headers follow\r\n", code);
            // RFC 3977 §8.5: articles lacking the header get an empty value
            for (number, headers) in selected {
                let value = headers
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(field))
                    .map(|(_, value)| value.as_str())
                    .unwrap_or_default();
                reply.push_str(&format!("{} {}\r\n", number, value));
            }
            reply.push_str(".\r\n");
            reply
        }
        "LIST" => {
            let mut reply = "215 Newsgroups follow\r\n".to_string();
            for (name, articles) in &news.groups {
                let low = articles.keys().next().copied().unwrap_or(1);
                let high = articles.keys().next_back().copied().unwrap_or(0);
                reply.push_str(&format!("{} {} {} y\r\n", name, high, low));
            }
            reply.push_str(".\r\n");
            reply
        }
        _ => "500 Unknown command\r\n".to_string(),
    }
}

fn parse_range(spec: &str) -> (u64, u64) {
    match spec.split_once('-') {
        Some((min, "")) => (min.parse().unwrap_or(0), u64::MAX),
        Some((min, max)) => (min.parse().unwrap_or(0), max.parse().unwrap_or(0)),
        None => {
            let n = spec.parse().unwrap_or(0);
            (n, n)
        }
    }
}

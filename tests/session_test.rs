//! Session behaviour against a scripted NNTP server
//!
//! Covers header retrieval, the HDR to XHDR fallback, date normalization,
//! authentication and transparent reconnection.

mod common;

use common::{MockNews, MockServer};
use nntp_mirror::{
    ArticleRange, HeaderBatch, HeaderField, HeaderSource, MessageFilter, MirrorError, NntpClient,
    Predicate, Session, SqliteStore, Storage, SyncEngine, SyncRequest,
};
use std::sync::Arc;

fn sample_news() -> MockNews {
    MockNews::new()
        .with_article(
            "alt.test",
            1,
            &[
                ("Message-Id", "<1@example.com>"),
                ("Date", "Tue, 20 Jan 2026 12:00:00 +0000"),
                ("Subject", "First post"),
                ("From", "alice@example.com"),
            ],
        )
        .with_article(
            "alt.test",
            2,
            &[
                ("Message-Id", "<2@example.com>"),
                ("Date", "sometime last week"),
                ("Subject", "Second post"),
            ],
        )
        .with_article(
            "alt.test",
            3,
            &[("Message-Id", "<3@example.com>"), ("Subject", ".hidden dot")],
        )
}

#[tokio::test]
async fn test_live_range() {
    let server = MockServer::start(sample_news()).await;
    let mut session = Session::new(server.config());

    let range = session.live_range("alt.test").await.unwrap();
    assert_eq!(range, ArticleRange::new(1, 3));
    assert_eq!(server.commands(), vec!["GROUP alt.test"]);
}

#[tokio::test]
async fn test_unknown_group() {
    let server = MockServer::start(sample_news()).await;
    let mut session = Session::new(server.config());

    let err = session.live_range("alt.missing").await.unwrap_err();
    assert!(matches!(err, MirrorError::GroupNotFound(ref g) if g == "alt.missing"));
}

#[tokio::test]
async fn test_expired_group_keeps_low_water_mark() {
    let server = MockServer::start(MockNews::new().with_expired_group("alt.expired", 1001)).await;
    let mut session = Session::new(server.config());

    let range = session.live_range("alt.expired").await.unwrap();
    assert_eq!(range, ArticleRange::new(1001, 1000));
    assert!(range.is_empty());
}

#[tokio::test]
async fn test_expired_group_fetches_nothing() {
    let server = MockServer::start(MockNews::new().with_expired_group("alt.expired", 1001)).await;
    let mut store = SqliteStore::open_in_memory("127.0.0.1").unwrap();
    let mut batch = HeaderBatch::new();
    batch.insert(HeaderField::Subject, 100, "old");
    batch.insert(HeaderField::Subject, 200, "older");
    store.update_messages("alt.expired", &batch).unwrap();

    let mut engine = SyncEngine::new(store, Session::new(server.config()));
    let report = engine
        .sync("alt.expired", SyncRequest::refresh(50, 100))
        .await
        .unwrap();

    assert!(report.fetched.is_empty());
    assert!(report.is_consistent());
    assert_eq!(report.achieved, ArticleRange::new(100, 200));
    assert!(
        !server
            .commands()
            .iter()
            .any(|c| c.starts_with("HDR") || c.starts_with("XHDR"))
    );
    engine.close().await.unwrap();
}

#[tokio::test]
async fn test_retrieve_headers() {
    let server = MockServer::start(sample_news()).await;
    let mut session = Session::new(server.config());

    let batch = session
        .retrieve_headers("alt.test", ArticleRange::new(1, 3))
        .await
        .unwrap();

    assert_eq!(
        batch.get(HeaderField::MessageId),
        &[
            (1, "<1@example.com>".to_string()),
            (2, "<2@example.com>".to_string()),
            (3, "<3@example.com>".to_string()),
        ]
    );
    assert_eq!(
        batch.get(HeaderField::Date),
        &[(1, "2026-01-20T12:00:00+00:00".to_string())]
    );
    assert_eq!(batch.get(HeaderField::Subject)[2], (3, ".hidden dot".to_string()));
    assert_eq!(batch.get(HeaderField::From).len(), 1);
    assert!(batch.get(HeaderField::Organization).is_empty());

    assert_eq!(batch.rejected().len(), 1);
    assert_eq!(batch.rejected()[0].article, 2);
    assert_eq!(batch.rejected()[0].field, HeaderField::Date);

    let commands = server.commands();
    assert_eq!(commands[0], "GROUP alt.test");
    let requested: Vec<&str> = commands[1..].iter().map(String::as_str).collect();
    assert_eq!(
        requested,
        HeaderField::ALL
            .iter()
            .map(|field| format!("HDR {} 1-3", field.name()))
            .collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_absent_headers_stay_null() {
    let server = MockServer::start(sample_news()).await;
    let store = SqliteStore::open_in_memory("127.0.0.1").unwrap();
    let mut engine = SyncEngine::new(store, Session::new(server.config()));

    // Article 3 has no Date; only the unparseable one on article 2 is rejected
    let report = engine
        .sync("alt.test", SyncRequest::refresh(0, 10))
        .await
        .unwrap();
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].article, 2);

    let filter = MessageFilter::new()
        .with("from", Predicate::is_null())
        .unwrap();
    let rows = engine
        .messages("alt.test", SyncRequest::cached(), &filter)
        .await
        .unwrap();
    let articles: Vec<u64> = rows.iter().map(|r| r.article).collect();
    assert_eq!(articles, vec![2, 3]);
    assert_eq!(rows[1].date, None);
    assert_eq!(rows[1].organization, None);
    engine.close().await.unwrap();
}

#[tokio::test]
async fn test_xhdr_fallback() {
    let mut news = sample_news();
    news.xhdr_only = true;
    let server = MockServer::start(news).await;
    let mut session = Session::new(server.config());

    let batch = session
        .retrieve_headers("alt.test", ArticleRange::new(1, 3))
        .await
        .unwrap();
    assert_eq!(batch.get(HeaderField::Subject).len(), 3);

    let commands = server.commands();
    let hdr = commands.iter().filter(|c| c.starts_with("HDR ")).count();
    let xhdr = commands.iter().filter(|c| c.starts_with("XHDR ")).count();
    assert_eq!(hdr, 1, "HDR is only tried once per connection");
    assert_eq!(xhdr, HeaderField::ALL.len());
}

#[tokio::test]
async fn test_range_without_articles_is_empty() {
    let server = MockServer::start(sample_news()).await;
    let mut session = Session::new(server.config());

    let batch = session
        .retrieve_headers("alt.test", ArticleRange::new(100, 200))
        .await
        .unwrap();
    assert!(batch.is_empty());
}

#[tokio::test]
async fn test_connection_is_reused() {
    let server = MockServer::start(sample_news()).await;
    let mut session = Session::new(server.config());

    session.live_range("alt.test").await.unwrap();
    session.live_range("alt.test").await.unwrap();

    assert_eq!(server.connections(), 1);
    assert_eq!(
        server.commands(),
        vec!["GROUP alt.test", "DATE", "GROUP alt.test"]
    );
}

#[tokio::test]
async fn test_reconnects_after_dead_connection() {
    let mut news = sample_news();
    // Second command on the first connection is the DATE probe
    news.drop_first_connection_at = Some(2);
    let server = MockServer::start(news).await;
    let mut session = Session::new(server.config());

    session.live_range("alt.test").await.unwrap();
    let batch = session
        .retrieve_headers("alt.test", ArticleRange::new(1, 3))
        .await
        .unwrap();

    assert_eq!(batch.get(HeaderField::MessageId).len(), 3);
    assert_eq!(server.connections(), 2);
}

#[tokio::test]
async fn test_authentication() {
    let mut news = sample_news();
    news.credentials = Some(("reader".to_string(), "secret".to_string()));
    let server = MockServer::start(news).await;

    let config = server.config().with_credentials("reader", "secret");
    let mut session = Session::new(config);
    assert_eq!(
        session.live_range("alt.test").await.unwrap(),
        ArticleRange::new(1, 3)
    );
    let commands = server.commands();
    assert_eq!(commands[0], "AUTHINFO USER reader");
    assert_eq!(commands[1], "AUTHINFO PASS secret");
}

#[tokio::test]
async fn test_authentication_rejected() {
    let mut news = sample_news();
    news.credentials = Some(("reader".to_string(), "secret".to_string()));
    let server = MockServer::start(news).await;

    let config = server.config().with_credentials("reader", "wrong");
    let mut session = Session::new(config);
    let err = session.live_range("alt.test").await.unwrap_err();
    assert!(matches!(err, MirrorError::AuthFailed(_)));
}

#[tokio::test]
async fn test_list_groups() {
    let news = sample_news().with_empty_group("comp.lang.rust");
    let server = MockServer::start(news).await;
    let mut session = Session::new(server.config());

    let mut groups = session.list_groups().await.unwrap();
    groups.sort();
    assert_eq!(groups, vec!["alt.test", "comp.lang.rust"]);
}

#[tokio::test]
async fn test_close_sends_quit_once() {
    let server = MockServer::start(sample_news()).await;
    let mut session = Session::new(server.config());

    session.live_range("alt.test").await.unwrap();
    session.close().await.unwrap();
    session.close().await.unwrap();

    assert_eq!(server.commands().last().map(String::as_str), Some("QUIT"));
    assert_eq!(server.commands().iter().filter(|c| *c == "QUIT").count(), 1);
}

#[tokio::test]
async fn test_client_hdr_without_group() {
    let server = MockServer::start(sample_news()).await;
    let mut client = NntpClient::connect(Arc::new(server.config())).await.unwrap();

    let err = client.hdr("Subject", "1-3").await.unwrap_err();
    assert!(matches!(err, MirrorError::NoGroupSelected));
    assert!(!client.is_broken());
    client.quit().await.unwrap();
}

#[tokio::test]
async fn test_engine_over_network() {
    let server = MockServer::start(MockNews::new().with_articles("alt.test", 1..=20)).await;
    let store = SqliteStore::open_in_memory("127.0.0.1").unwrap();
    let mut engine = SyncEngine::new(store, Session::new(server.config()));
    let all = MessageFilter::new();

    let report = engine
        .sync("alt.test", SyncRequest::refresh(0, 5))
        .await
        .unwrap();
    assert_eq!(report.achieved, ArticleRange::new(15, 20));
    assert!(report.is_consistent());

    let rows = engine
        .messages("alt.test", SyncRequest::refresh(3, 5), &all)
        .await
        .unwrap();
    let articles: Vec<u64> = rows.iter().map(|r| r.article).collect();
    assert_eq!(articles, (12..=20).collect::<Vec<_>>());
    assert_eq!(rows[0].date.as_deref(), Some("2026-01-20T12:00:00+00:00"));

    let sent = server.commands().len();
    let filter = MessageFilter::new()
        .with("subject", Predicate::like("%article 1_"))
        .unwrap();
    let cached = engine
        .messages("alt.test", SyncRequest::cached(), &filter)
        .await
        .unwrap();
    assert_eq!(cached.len(), 8);
    assert_eq!(server.commands().len(), sent, "cached reads stay offline");

    engine.close().await.unwrap();
}

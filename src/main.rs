use clap::{Arg, ArgAction, Command, value_parser};
use nntp_mirror::{
    MessageFilter, MessageRecord, Predicate, ServerConfig, Session, SqliteStore, SyncEngine,
    SyncRequest,
};
use std::error::Error;
use std::time::Instant;
use tracing::debug;

fn cli() -> Command {
    Command::new("nntp-mirror")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Mirror newsgroup headers into a local database")
        .arg(
            Arg::new("db")
                .short('f')
                .long("db")
                .value_name("FILE")
                .required(true)
                .help("Database file"),
        )
        .arg(
            Arg::new("server")
                .short('s')
                .long("server")
                .value_name("HOST")
                .required(true)
                .help("News server"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_parser(value_parser!(u16))
                .default_value("563")
                .help("News server port"),
        )
        .arg(Arg::new("group").required(true).help("Newsgroup"))
        .arg(
            Arg::new("batch-size")
                .short('b')
                .long("batch-size")
                .value_parser(value_parser!(u64))
                .default_value("50000")
                .help("Maximum number of articles to retrieve in one batch"),
        )
        .arg(
            Arg::new("repeat")
                .short('c')
                .long("repeat")
                .value_parser(value_parser!(u32))
                .default_value("1")
                .help("Maximum number of batches to run"),
        )
        .arg(
            Arg::new("refresh")
                .short('r')
                .long("refresh")
                .action(ArgAction::SetTrue)
                .help("Retrieve new messages from the server"),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Set the log level to DEBUG"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Set the log level to INFO"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .env("NNTP_USER")
                .help("Username for AUTHINFO"),
        )
        .arg(
            Arg::new("password")
                .long("password")
                .env("NNTP_PASS")
                .hide_env_values(true)
                .help("Password for AUTHINFO"),
        )
        .arg(
            Arg::new("insecure")
                .long("insecure")
                .action(ArgAction::SetTrue)
                .help("Accept any TLS certificate"),
        )
        .arg(
            Arg::new("filter")
                .long("filter")
                .value_name("COLUMN=EXPR")
                .action(ArgAction::Append)
                .help("Only print rows matching, e.g. 'subject=like %rust%'"),
        )
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn parse_filters<'a>(args: impl Iterator<Item = &'a String>) -> nntp_mirror::Result<MessageFilter> {
    args.into_iter().try_fold(MessageFilter::new(), |filter, arg| {
        let (column, expr) = arg.split_once('=').ok_or_else(|| {
            nntp_mirror::MirrorError::InvalidFilter(format!("expected COLUMN=EXPR, got {:?}", arg))
        })?;
        filter.with(column.trim(), Predicate::parse(expr))
    })
}

fn describe(record: &MessageRecord) -> String {
    format!(
        "{} {} {} {}",
        record.article,
        record.message_id.as_deref().unwrap_or("-"),
        record.date.as_deref().unwrap_or("-"),
        record.subject.as_deref().unwrap_or("-"),
    )
}

async fn run_once(
    db: &str,
    config: &ServerConfig,
    group: &str,
    request: SyncRequest,
    filter: &MessageFilter,
) -> Result<(), Box<dyn Error>> {
    let store = SqliteStore::open(db, config.host.as_str())?;
    let mut engine = SyncEngine::new(store, Session::new(config.clone()));

    let messages = engine.messages(group, request, filter).await;
    // Close either way; a sync error takes precedence
    let closed = engine.close().await;
    let messages = messages?;
    closed?;

    println!("Length of messages = {}", messages.len());
    let head = messages.iter().take(3);
    let tail = messages.iter().skip(messages.len().saturating_sub(3));
    for record in head {
        println!("{}", describe(record));
    }
    println!("...");
    for record in tail {
        println!("{}", describe(record));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let matches = cli().get_matches();

    let level = if matches.get_flag("debug") {
        "debug"
    } else if matches.get_flag("verbose") {
        "info"
    } else {
        "warn"
    };
    init_tracing(level);

    let db = matches.get_one::<String>("db").ok_or("--db is required")?;
    let server = matches.get_one::<String>("server").ok_or("--server is required")?;
    let group = matches.get_one::<String>("group").ok_or("group is required")?;
    let port = matches.get_one::<u16>("port").copied().unwrap_or(563);
    let batch_size = matches.get_one::<u64>("batch-size").copied().unwrap_or(50000);
    let repeat = matches.get_one::<u32>("repeat").copied().unwrap_or(1);

    let mut config = ServerConfig::new(server.as_str(), port, true);
    config.allow_insecure_tls = matches.get_flag("insecure");
    if let (Some(user), Some(password)) = (
        matches.get_one::<String>("user"),
        matches.get_one::<String>("password"),
    ) {
        config = config.with_credentials(user.as_str(), password.as_str());
    }

    let filter = parse_filters(matches.get_many::<String>("filter").into_iter().flatten())?;
    let request = if matches.get_flag("refresh") {
        SyncRequest::refresh(batch_size, batch_size)
    } else {
        SyncRequest::cached()
    };
    debug!("Request: {:?}, filter: {:?}", request, filter);

    for _ in 0..repeat {
        let started = Instant::now();
        run_once(db, &config, group, request, &filter).await?;
        println!("Batch duration: {:?}", started.elapsed());
    }

    Ok(())
}

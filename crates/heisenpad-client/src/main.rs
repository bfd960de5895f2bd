//! Heisenpad command-line client.
//!
//! # Usage
//!
//! ```bash
//! heisenpad --server ws://127.0.0.1:9002 --channel lobby
//! ```
//!
//! Lines typed on stdin are sent to the channel; `/help` lists commands.

use std::time::Duration;

use clap::Parser;
use heisenpad_app::SessionSnapshot;
use heisenpad_client::{
    ClientConfig, SessionHandle,
    display::{Feed, HELP, Line, parse_line},
};
use heisenpad_core::ConnectionConfig;
use heisenpad_proto::Channel;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Heisenpad ephemeral chat client
#[derive(Parser, Debug)]
#[command(name = "heisenpad")]
#[command(about = "Ephemeral, optionally encrypted group chat")]
#[command(version)]
struct Args {
    /// Relay address
    #[arg(short, long, default_value = heisenpad_app::DEFAULT_SERVER_URL)]
    server: String,

    /// Channel to join
    #[arg(short, long, default_value = heisenpad_proto::DEFAULT_CHANNEL)]
    channel: String,

    /// Encryption passphrase (can also be set later with /key)
    #[arg(short, long, env = "HEISENPAD_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Seconds between keepalive pings
    #[arg(long, default_value = "10")]
    heartbeat_secs: u64,

    /// Seconds between automatic reconnect attempts
    #[arg(long, default_value = "3")]
    reconnect_secs: u64,

    /// Automatic reconnect attempts before giving up
    #[arg(long, default_value = "3")]
    reconnect_attempts: u32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Args {
    fn config(&self) -> ClientConfig {
        ClientConfig {
            server_url: self.server.clone(),
            channel: Channel::new(&self.channel),
            passphrase: self.key.clone().unwrap_or_default(),
            connection: ConnectionConfig {
                heartbeat_interval: Duration::from_secs(self.heartbeat_secs),
                reconnect_interval: Duration::from_secs(self.reconnect_secs),
                max_reconnect_attempts: self.reconnect_attempts,
            },
            ..ClientConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

    let (handle, task) = heisenpad_client::spawn(args.config())?;
    let mut snapshots = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut feed = Feed::default();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    handle.shutdown().await?;
                    break;
                };
                if !dispatch(&handle, &mut stdout, &line).await? {
                    break;
                }
            },
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if let Some(snapshot) = snapshot {
                    for line in feed.update(&snapshot) {
                        write_line(&mut stdout, &line).await?;
                    }
                }
            },
        }
    }

    task.await??;
    Ok(())
}

/// Act on one input line. Returns `false` once the user quits.
async fn dispatch(
    handle: &SessionHandle,
    stdout: &mut Stdout,
    line: &str,
) -> Result<bool, Box<dyn std::error::Error>> {
    match parse_line(line) {
        Line::Send(text) => handle.send_text(&text).await?,
        Line::Join(channel) => handle.join(&channel).await?,
        Line::Key(passphrase) => handle.set_passphrase(&passphrase).await?,
        Line::Delete(prefix) => match find(handle.snapshot(), &prefix) {
            Some(id) => handle.delete(&id).await?,
            None => write_line(stdout, &format!("* no message matching {prefix}")).await?,
        },
        Line::Resend(prefix) => {
            let message = handle.snapshot().and_then(|snapshot| {
                let id = find(Some(snapshot.clone()), &prefix)?;
                snapshot.message(&id).map(|view| view.message.clone())
            });
            match message {
                Some(message) => handle.resend(message).await?,
                None => write_line(stdout, &format!("* no message matching {prefix}")).await?,
            }
        },
        Line::Reconnect => handle.reconnect().await?,
        Line::Help => write_line(stdout, HELP).await?,
        Line::Quit => {
            handle.shutdown().await?;
            return Ok(false);
        },
        Line::Unknown(name) => write_line(stdout, &format!("* unknown command /{name}, try /help")).await?,
    }
    Ok(true)
}

/// Id of the single message whose id starts with `prefix`.
fn find(snapshot: Option<SessionSnapshot>, prefix: &str) -> Option<String> {
    let snapshot = snapshot?;
    let mut matches = snapshot.messages.iter().filter(|view| view.id.starts_with(prefix));
    let first = matches.next()?;
    if matches.next().is_some() {
        return None;
    }
    Some(first.id.clone())
}

async fn write_line(stdout: &mut Stdout, line: &str) -> std::io::Result<()> {
    stdout.write_all(line.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await
}

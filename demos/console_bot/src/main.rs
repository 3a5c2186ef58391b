//! Console Bot
//!
//! Drives Herald commands from the terminal. Every line read from stdin is
//! one chat message; replies are printed to stdout and `command_error`
//! events to stderr.
//!
//! A line of the form `name> text` is sent as `name`; any other line is
//! sent as the bot's own account.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package console-bot
//! > !ping
//! [bot -> me] pong
//! > alice> !pay @bob 20 for lunch
//! [bot -> alice] alice sent 20 coins to bob (for lunch)
//! > guest> !roll 6
//! > !add 1 2 x
//! [command_error] cannot convert 'x' for 'numbers': ...
//! ```
//!
//! `--self-only` makes the bot ignore everyone but itself; `--list` prints
//! the registered commands as JSON and exits.

mod commands;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use clap::Parser;
use herald::core::{BoxedMessage, Client, EventPayload, Identity, Message, ReplyOptions, SendResult};
use herald::framework::async_trait;
use herald::runtime::{CommandRuntime, ConfigLoader, HeraldConfig, init_from_config};
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

#[derive(Debug, Parser)]
#[command(version, about = "Drive Herald commands from the terminal")]
struct Args {
    /// Configuration file (default: search for herald.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Account id of the bot
    #[arg(long, default_value = "me")]
    id: String,

    /// Only obey messages written by the bot's own account
    #[arg(long)]
    self_only: bool,

    /// Override the configured command prefixes
    #[arg(short, long = "prefix")]
    prefixes: Vec<String>,

    /// Print the registered commands as JSON and exit
    #[arg(long)]
    list: bool,
}

// ============================================================================
// Console transport
// ============================================================================

/// One line of the console transcript.
#[derive(Debug, Clone)]
struct Reply {
    to: String,
    text: String,
}

struct ConsoleClient {
    identity: Identity,
    prefixes: Vec<String>,
}

#[async_trait]
impl Client for ConsoleClient {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    async fn emit(&self, event: &str, payload: EventPayload) {
        eprintln!("[{event}] {payload}");
    }
}

struct ConsoleMessage {
    author: String,
    text: String,
    transcript: Arc<Mutex<Vec<Reply>>>,
    next_id: Arc<AtomicU64>,
}

#[async_trait]
impl Message for ConsoleMessage {
    fn text(&self) -> &str {
        &self.text
    }

    fn author_id(&self) -> &str {
        &self.author
    }

    async fn reply(&self, text: &str, options: ReplyOptions) -> SendResult<String> {
        let tag = if options.silent { " (silent)" } else { "" };
        println!("[bot -> {}{tag}] {text}", self.author);
        self.transcript.lock().push(Reply {
            to: self.author.clone(),
            text: text.to_owned(),
        });
        Ok(self.next_id.fetch_add(1, Ordering::Relaxed).to_string())
    }
}

/// Splits `name> text` into its author and text.
fn parse_line<'a>(line: &'a str, default_author: &'a str) -> (&'a str, &'a str) {
    match line.split_once("> ") {
        Some((author, text)) if !author.is_empty() && !author.contains(char::is_whitespace) => {
            (author, text)
        }
        _ => (default_author, line),
    }
}

async fn read_stdin(
    bot_id: String,
    transcript: Arc<Mutex<Vec<Reply>>>,
    messages: mpsc::Sender<BoxedMessage>,
) -> Result<()> {
    let next_id = Arc::new(AtomicU64::new(1));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (author, text) = parse_line(line, &bot_id);
        let message = Arc::new(ConsoleMessage {
            author: author.to_owned(),
            text: text.to_owned(),
            transcript: Arc::clone(&transcript),
            next_id: Arc::clone(&next_id),
        });
        if messages.send(message).await.is_err() {
            break;
        }
    }

    debug!("stdin closed");
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    if !args.prefixes.is_empty() {
        let mut overrides = HeraldConfig::default();
        overrides.client.prefixes = args.prefixes.clone();
        loader = loader.merge(overrides);
    }
    let config = loader.load()?;
    let _guard = init_from_config(&config.logging)?;

    let registry = commands::registry()?;

    if args.list {
        let commands: Vec<_> = registry.iter().map(|spec| spec.info()).collect();
        println!("{}", serde_json::to_string_pretty(&commands)?);
        return Ok(());
    }

    let identity = if args.self_only {
        Identity::self_only(&args.id)
    } else {
        Identity::bot(&args.id)
    };
    let client = Arc::new(ConsoleClient {
        identity,
        prefixes: config.client.prefixes.clone(),
    });

    info!(
        id = %args.id,
        prefixes = ?config.client.prefixes,
        commands = registry.len(),
        "Console bot ready, type a command or Ctrl+D to quit"
    );

    let runtime = CommandRuntime::from_config(registry, client, &config.client);
    let transcript = Arc::new(Mutex::new(Vec::new()));
    let (tx, rx) = mpsc::channel(32);
    let reader = tokio::spawn(read_stdin(args.id.clone(), Arc::clone(&transcript), tx));

    runtime.run(rx).await?;
    reader.abort();

    let replies = transcript.lock();
    let recipients: BTreeSet<&str> = replies.iter().map(|reply| reply.to.as_str()).collect();
    let stats = runtime.stats();
    info!(
        replies = replies.len(),
        ?recipients,
        completed = stats.completed,
        failed = stats.failed,
        "Goodbye"
    );
    debug!(last = ?replies.last().map(|reply| &reply.text), "Last reply");

    Ok(())
}

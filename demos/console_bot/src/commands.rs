//! The commands the console bot answers to.

use std::time::Duration;

use herald::prelude::*;
use herald::runtime::RuntimeResult;

/// Every command of the bot.
pub fn registry() -> RuntimeResult<Registry> {
    let mut registry = Registry::new();
    registry.add(ping()?)?;
    registry.add(echo()?)?;
    registry.add(add()?)?;
    registry.add(pay()?)?;
    registry.add(roll()?)?;
    registry.add(nap()?)?;
    registry.add(help()?)?;
    Ok(registry)
}

// ============================================================================
// Converters
// ============================================================================

/// A user named with `@name`, or `me` for the author.
pub struct User(pub String);

impl ArgValue for User {}

pub struct Mention {
    author: String,
}

#[async_trait]
impl Convert for Mention {
    type Output = User;

    fn new(ctx: &InvocationContext, _raw: &str) -> Self {
        Mention {
            author: ctx.author_id().to_owned(),
        }
    }

    async fn convert(self, _ctx: &InvocationContext, raw: &str) -> Result<User, BoxError> {
        if raw == "me" {
            return Ok(User(self.author));
        }
        match raw.strip_prefix('@') {
            Some(name) if !name.is_empty() => Ok(User(name.to_owned())),
            _ => Err(format!("expected @name or me, got '{raw}'").into()),
        }
    }
}

fn not_guest(ctx: &InvocationContext) -> bool {
    ctx.author_id() != "guest"
}

// ============================================================================
// Commands
// ============================================================================

/// Checks that the bot is alive.
#[command(aliases = "p")]
async fn ping(_ctx: Arc<InvocationContext>) -> &'static str {
    "pong"
}

/// Repeats everything after the command.
#[command(aliases = ["say"])]
async fn echo(_ctx: Arc<InvocationContext>, text: Rest<String>) -> Option<String> {
    text.into_inner()
}

/// Adds whole numbers.
#[command(aliases = ["sum", "+"])]
async fn add(_ctx: Arc<InvocationContext>, numbers: Variadic<i64>) -> String {
    numbers.iter().sum::<i64>().to_string()
}

/// Sends coins to someone.
#[command(aliases = "give")]
async fn pay(
    ctx: Arc<InvocationContext>,
    #[convert(Converter::stateful::<Mention>())] to: User,
    amount: u64,
    note: Rest<String>,
) -> String {
    let mut receipt = format!("{} sent {amount} coins to {}", ctx.author_id(), to.0);
    if let Some(note) = note.into_inner() {
        receipt.push_str(&format!(" ({note})"));
    }
    receipt
}

/// Rolls a die. Guests may not roll.
#[command(guard = not_guest)]
async fn roll(_ctx: Arc<InvocationContext>, sides: u32) -> Result<String, BoxError> {
    if sides == 0 {
        return Err("a die needs at least one side".into());
    }
    Ok(rand::random_range(1..=sides).to_string())
}

/// Sleeps, then answers. Useful to watch the invocation timeout fire.
#[command]
async fn nap(_ctx: Arc<InvocationContext>, seconds: u64) -> String {
    tokio::time::sleep(Duration::from_secs(seconds)).await;
    format!("slept {seconds}s")
}

/// Lists the commands, without notifying anyone.
#[command(aliases = "?")]
async fn help(ctx: Arc<InvocationContext>) -> Result<(), SendError> {
    let prefix = ctx.prefix().unwrap_or_default();
    let listing = ctx
        .registry()
        .iter()
        .map(|spec| match spec.help() {
            Some(help) => format!("{prefix}{}  {help}", spec.usage()),
            None => format!("{prefix}{}", spec.usage()),
        })
        .collect::<Vec<_>>()
        .join("\n");
    ctx.reply_with(&listing, ReplyOptions::default().silent(true))
        .await?;
    Ok(())
}

//! `#[command]` expansion, checked end to end through the pipeline.

use herald::prelude::*;
use parking_lot::Mutex;

// ============================================================================
// Collaborators
// ============================================================================

struct TestClient {
    identity: Identity,
    prefixes: Vec<String>,
    events: Mutex<Vec<String>>,
}

impl TestClient {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            identity: Identity::bot("1"),
            prefixes: vec!["!".to_owned()],
            events: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Client for TestClient {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    async fn emit(&self, event: &str, payload: EventPayload) {
        self.events.lock().push(format!("{event}: {payload}"));
    }
}

struct TestMessage {
    author: String,
    text: String,
    replies: Mutex<Vec<String>>,
}

impl TestMessage {
    fn new(author: &str, text: &str) -> Arc<Self> {
        Arc::new(Self {
            author: author.to_owned(),
            text: text.to_owned(),
            replies: Mutex::new(Vec::new()),
        })
    }

    fn replies(&self) -> Vec<String> {
        self.replies.lock().clone()
    }
}

#[async_trait]
impl Message for TestMessage {
    fn text(&self) -> &str {
        &self.text
    }

    fn author_id(&self) -> &str {
        &self.author
    }

    async fn reply(&self, text: &str, _options: ReplyOptions) -> SendResult<String> {
        self.replies.lock().push(text.to_owned());
        Ok("ok".to_owned())
    }
}

// ============================================================================
// Commands
// ============================================================================

struct Member(String);

impl ArgValue for Member {}

struct MemberLookup;

#[async_trait]
impl Convert for MemberLookup {
    type Output = Member;

    fn new(_ctx: &InvocationContext, _raw: &str) -> Self {
        MemberLookup
    }

    async fn convert(self, _ctx: &InvocationContext, raw: &str) -> Result<Member, BoxError> {
        raw.strip_prefix('@')
            .map(|name| Member(name.to_owned()))
            .ok_or_else(|| format!("'{raw}' is not a mention").into())
    }
}

fn not_banned(ctx: &InvocationContext) -> bool {
    ctx.author_id() != "666"
}

async fn is_owner(ctx: Arc<InvocationContext>) -> bool {
    ctx.author_id() == "1"
}

/// Replies with pong.
///
/// Only the first paragraph becomes help text.
#[command(aliases = ["p", "pong?"])]
async fn ping(_ctx: Arc<InvocationContext>) -> &'static str {
    "pong"
}

/// Sends coins to another member.
#[command(name = "pay", aliases = "give", guard = not_banned)]
async fn transfer(
    _ctx: Arc<InvocationContext>,
    #[convert(Converter::stateful::<MemberLookup>())] to: Member,
    amount: u64,
) -> String {
    format!("sent {amount} to {}", to.0)
}

#[command(help = "Repeats the text.")]
async fn echo(_ctx: Arc<InvocationContext>, _text: Rest<String>) -> Option<String> {
    _text.into_inner()
}

#[command]
async fn double(
    _ctx: Arc<InvocationContext>,
    #[convert(Converter::plain(|raw: &str| raw.parse::<i64>().map(|n| n * 2)))] numbers: Variadic<i64>,
) -> String {
    numbers.iter().sum::<i64>().to_string()
}

#[command(async_guard = is_owner)]
async fn shutdown(_ctx: Arc<InvocationContext>) -> &'static str {
    "bye"
}

fn pipeline() -> (Pipeline, Arc<TestClient>) {
    let mut registry = Registry::new();
    for spec in [ping(), transfer(), echo(), double(), shutdown()] {
        registry.add(spec.unwrap()).unwrap();
    }

    let client = TestClient::new();
    (Pipeline::new(Arc::new(registry), client.clone()), client)
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_metadata_from_attribute() {
    let ping = ping().unwrap();
    assert_eq!(ping.name(), "ping");
    assert_eq!(ping.aliases(), ["ping", "p", "pong?"]);
    assert_eq!(ping.help(), Some("Replies with pong."));
    assert!(ping.guard().is_none());

    let pay = transfer().unwrap();
    assert_eq!(pay.name(), "pay");
    assert_eq!(pay.aliases(), ["pay", "give"]);
    assert_eq!(pay.help(), Some("Sends coins to another member."));
    assert_eq!(pay.usage(), "pay <to> <amount>");
    assert!(pay.guard().is_some());

    let echo = echo().unwrap();
    assert_eq!(echo.help(), Some("Repeats the text."));
    assert_eq!(echo.usage(), "echo [text]");

    assert_eq!(double().unwrap().usage(), "double [numbers...]");
}

#[tokio::test]
async fn test_converter_attribute() {
    let (pipeline, client) = pipeline();

    let message = TestMessage::new("2", "!give @bob 5");
    assert!(pipeline.handle(message.clone()).await.is_completed());
    assert_eq!(message.replies(), ["sent 5 to bob"]);

    let message = TestMessage::new("2", "!pay bob 5");
    let outcome = pipeline.handle(message.clone()).await;
    assert!(matches!(
        outcome.error(),
        Some(CommandError::Conversion { parameter, .. }) if parameter == "to"
    ));
    assert!(message.replies().is_empty());
    assert_eq!(client.events.lock().len(), 1);

    let message = TestMessage::new("2", "!double 1 2 3");
    pipeline.handle(message.clone()).await;
    assert_eq!(message.replies(), ["12"]);
}

#[tokio::test]
async fn test_guards() {
    let (pipeline, client) = pipeline();

    let banned = TestMessage::new("666", "!pay @bob 5");
    assert!(matches!(
        pipeline.handle(banned.clone()).await,
        Outcome::Skipped(SkipReason::CheckFailed)
    ));
    assert!(banned.replies().is_empty());

    let stranger = TestMessage::new("2", "!shutdown");
    assert!(matches!(
        pipeline.handle(stranger).await,
        Outcome::Skipped(SkipReason::CheckFailed)
    ));

    let owner = TestMessage::new("1", "!shutdown");
    pipeline.handle(owner.clone()).await;
    assert_eq!(owner.replies(), ["bye"]);

    assert!(client.events.lock().is_empty());
}

#[tokio::test]
async fn test_keyword_remainder() {
    let (pipeline, _client) = pipeline();

    let message = TestMessage::new("2", "!echo  hello   there");
    pipeline.handle(message.clone()).await;
    assert_eq!(message.replies(), ["hello there"]);

    let message = TestMessage::new("2", "!echo");
    assert!(pipeline.handle(message.clone()).await.is_completed());
    assert!(message.replies().is_empty());
}

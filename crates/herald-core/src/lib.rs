//! # Herald Core
//!
//! Transport-facing contracts for the Herald command framework.
//!
//! The command machinery in `herald-framework` never talks to a network
//! directly. Everything it needs from the outside world goes through two
//! narrow traits defined here:
//!
//! - [`Client`]: the logged-in account. It knows its own [`Identity`], the
//!   ordered list of command prefixes it answers to, and how to publish
//!   client-level events such as `command_error`.
//! - [`Message`]: one incoming chat message. It exposes the raw text, the
//!   author id, and a way to reply.
//!
//! ```text
//! ┌───────────┐  Message   ┌──────────────────┐  reply()  ┌───────────┐
//! │ Transport │───────────▶│ herald-framework │──────────▶│ Transport │
//! └───────────┘            └──────────────────┘           └───────────┘
//!                                   │ emit("command_error")
//!                                   ▼
//!                               ┌────────┐
//!                               │ Client │
//!                               └────────┘
//! ```

pub mod client;
pub mod error;
pub mod message;

pub use client::{BoxedClient, COMMAND_ERROR, Client, EventPayload, Identity, OperatingMode};
pub use error::{BoxError, SendError, SendResult};
pub use message::{BoxedMessage, Message, ReplyOptions};

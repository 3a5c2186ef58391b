//! Herald Runtime - everything around the command pipeline.
//!
//! This crate provides:
//! - Layered configuration (`config`): defaults, `herald.toml` / `herald.yaml`,
//!   `HERALD_*` environment variables and programmatic overrides
//! - Log subscriber setup (`logging`)
//! - The message loop (`CommandRuntime`): one task per message, graceful
//!   shutdown on channel close, Ctrl+C or SIGTERM
//!
//! ```rust,ignore
//! use herald_runtime::{CommandRuntime, config::load_config, logging};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let _guard = logging::init_from_config(&config.logging)?;
//!
//!     let mut registry = Registry::new();
//!     registry.add(ping()?)?;
//!
//!     let (tx, rx) = tokio::sync::mpsc::channel(64);
//!     let client = MyClient::connect(&config.client.prefixes, tx).await?;
//!
//!     CommandRuntime::from_config(registry, client, &config.client)
//!         .run(rx)
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! # Feature Flags
//!
//! - `toml-config`: read `herald.toml`
//! - `yaml-config`: read `herald.yaml` / `herald.yml`
//! - `json-log`: enable `format = "json"` log output

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{ConfigError, ConfigLoader, ConfigResult, HeraldConfig, load_config};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, LoggingGuard, init_from_config};
pub use runtime::{CommandRuntime, RuntimeStats};

pub use tracing;

/// Logging macros, re-exported for command authors.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}

//! Log subscriber setup.
//!
//! Everything in Herald logs through `tracing`. This module installs the
//! global subscriber: an [`EnvFilter`] built from the configured level, the
//! per-target filters and `RUST_LOG`, feeding one `fmt` layer that writes to
//! stdout, stderr or a (rotated) file.
//!
//! ```rust,ignore
//! use herald_runtime::{config::load_config, logging};
//!
//! let config = load_config()?;
//! let _guard = logging::init_from_config(&config.logging)?;
//! ```
//!
//! Keep the returned [`LoggingGuard`] alive for the lifetime of the program;
//! dropping it flushes and stops the background file writer.

use std::path::{Path, PathBuf};

use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::{LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig};
use crate::error::{RuntimeError, RuntimeResult};

/// Installs the global subscriber described by `config`.
pub fn init_from_config(config: &LoggingConfig) -> RuntimeResult<LoggingGuard> {
    LoggingBuilder::from_config(config).try_init()
}

/// Keeps the non-blocking file writer alive.
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug, Default)]
pub struct LoggingGuard {
    _worker: Option<WorkerGuard>,
}

/// Builder for the global log subscriber.
///
/// ```rust,ignore
/// let _guard = LoggingBuilder::new()
///     .level(LogLevel::Debug)
///     .directive("herald_framework=trace")
///     .format(LogFormat::Pretty)
///     .try_init()?;
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct LoggingBuilder {
    level: LogLevel,
    directives: Vec<String>,
    format: LogFormat,
    output: LogOutput,
    file_path: Option<PathBuf>,
    rotation: LogRotation,
    span_timing: bool,
    file_location: bool,
    thread_ids: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self::from_config(&LoggingConfig::default())
    }

    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut directives: Vec<String> = config
            .filters
            .iter()
            .map(|(target, level)| format!("{target}={level}"))
            .collect();
        // HashMap order is unstable; keep the filter string reproducible.
        directives.sort();

        Self {
            level: config.level,
            directives,
            format: config.format,
            output: config.output,
            file_path: config.file_path.clone(),
            rotation: config.rotation,
            span_timing: config.span_timing,
            file_location: config.file_location,
            thread_ids: config.thread_ids,
        }
    }

    /// Default level for targets without a directive.
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Adds an `EnvFilter` directive such as `herald_framework=trace`.
    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    /// Writes to `path` and switches the output to [`LogOutput::File`].
    pub fn file(mut self, path: impl AsRef<Path>, rotation: LogRotation) -> Self {
        self.output = LogOutput::File;
        self.file_path = Some(path.as_ref().to_path_buf());
        self.rotation = rotation;
        self
    }

    /// Emits a line with busy/idle time whenever a span closes.
    pub fn span_timing(mut self, enabled: bool) -> Self {
        self.span_timing = enabled;
        self
    }

    pub fn file_location(mut self, enabled: bool) -> Self {
        self.file_location = enabled;
        self
    }

    pub fn thread_ids(mut self, enabled: bool) -> Self {
        self.thread_ids = enabled;
        self
    }

    /// Builds the filter: `RUST_LOG` first, then the level, then directives.
    pub fn build_filter(&self) -> RuntimeResult<EnvFilter> {
        let default = LevelFilter::from_level(self.level.to_tracing_level());
        let mut filter = EnvFilter::builder()
            .with_default_directive(default.into())
            .from_env_lossy();

        for directive in &self.directives {
            let parsed: Directive =
                directive
                    .parse()
                    .map_err(|source| RuntimeError::InvalidDirective {
                        directive: directive.clone(),
                        source,
                    })?;
            filter = filter.add_directive(parsed);
        }

        Ok(filter)
    }

    fn make_writer(&self) -> RuntimeResult<(BoxMakeWriter, Option<WorkerGuard>)> {
        match self.output {
            LogOutput::Stdout => Ok((BoxMakeWriter::new(std::io::stdout), None)),
            LogOutput::Stderr => Ok((BoxMakeWriter::new(std::io::stderr), None)),
            LogOutput::File => {
                let path = self
                    .file_path
                    .as_deref()
                    .ok_or_else(|| RuntimeError::log_output("file output without a file path"))?;
                let name = path.file_name().ok_or_else(|| {
                    RuntimeError::log_output(format!("'{}' is not a file", path.display()))
                })?;
                let dir = path
                    .parent()
                    .filter(|dir| !dir.as_os_str().is_empty())
                    .unwrap_or_else(|| Path::new("."));

                let appender = match self.rotation {
                    LogRotation::Never => rolling::never(dir, name),
                    LogRotation::Hourly => rolling::hourly(dir, name),
                    LogRotation::Daily => rolling::daily(dir, name),
                };
                let (writer, guard) = tracing_appender::non_blocking(appender);
                Ok((BoxMakeWriter::new(writer), Some(guard)))
            }
        }
    }

    /// Installs the subscriber. Fails if one is already installed.
    pub fn try_init(self) -> RuntimeResult<LoggingGuard> {
        let filter = self.build_filter()?;
        let (writer, worker) = self.make_writer()?;
        let ansi = self.output != LogOutput::File;
        let spans = if self.span_timing {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        macro_rules! finish {
            ($layer:expr) => {
                $layer
                    .with_writer(writer)
                    .with_ansi(ansi)
                    .with_span_events(spans)
                    .with_thread_ids(self.thread_ids)
                    .with_file(self.file_location)
                    .with_line_number(self.file_location)
                    .boxed()
            };
        }

        let layer: Box<dyn Layer<Registry> + Send + Sync> = match self.format {
            LogFormat::Compact => finish!(fmt::layer().compact()),
            LogFormat::Full => finish!(fmt::layer()),
            LogFormat::Pretty => finish!(fmt::layer().pretty()),
            #[cfg(feature = "json-log")]
            LogFormat::Json => finish!(fmt::layer().json()),
            #[cfg(not(feature = "json-log"))]
            LogFormat::Json => finish!(fmt::layer()),
        };

        tracing_subscriber::registry()
            .with(layer)
            .with(filter)
            .try_init()?;

        Ok(LoggingGuard { _worker: worker })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_includes_directives() {
        let mut config = LoggingConfig::default();
        config
            .filters
            .insert("herald_framework".into(), LogLevel::Trace);
        config.filters.insert("herald_runtime".into(), LogLevel::Warn);

        let builder = LoggingBuilder::from_config(&config);
        let filter = builder.build_filter().unwrap().to_string().to_lowercase();
        assert!(filter.contains("herald_framework=trace"));
        assert!(filter.contains("herald_runtime=warn"));
    }

    #[test]
    fn test_invalid_directive() {
        let err = LoggingBuilder::new()
            .directive("herald=loud")
            .build_filter()
            .unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidDirective { directive, .. } if directive == "herald=loud"));
    }

    #[test]
    fn test_file_output_requires_path() {
        let err = LoggingBuilder::new()
            .output(LogOutput::File)
            .try_init()
            .unwrap_err();
        assert!(matches!(err, RuntimeError::LogOutput(_)));
    }
}

//! Integration between ziggy and the standard `log` facade.
//!
//! [`LogHandler`] is a `log::Log` implementation that turns every log
//! record into one ziggy event: logger name, level, the rendered message
//! and, if an error was attached, the string-formatted error chain.

use std::error::Error;
use std::fmt::Write as _;
use std::sync::Arc;

use log::LevelFilter;

use crate::context::Context;
use crate::recorder::Recorder;

/// The record shape the handler consumes: the `log::Record` data as plain
/// fields, plus an optional pre-formatted error chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Source-logger name (`target` in `log` terms).
    pub name: String,
    /// Severity level name, e.g. `"ERROR"`.
    pub level: String,
    /// Fully rendered message; interpolation is already resolved.
    pub msg: String,
    /// Formatted error chain, when one was attached to the record.
    pub exception: Option<String>,
}

impl LogRecord {
    /// Attach an error to this record, formatted with
    /// [`format_error_chain`].
    pub fn with_exception(mut self, err: &(dyn Error + 'static)) -> Self {
        self.exception = Some(format_error_chain(err));
        self
    }
}

impl From<&log::Record<'_>> for LogRecord {
    fn from(record: &log::Record) -> Self {
        Self {
            name: record.target().to_string(),
            level: record.level().as_str().to_string(),
            // args() carries the interpolated message, never the template
            msg: record.args().to_string(),
            exception: None,
        }
    }
}

/// Render an error and its `source()` chain as a single string, the
/// counterpart of a formatted exception trace.
pub fn format_error_chain(err: &(dyn Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(out, "\ncaused by: {cause}");
        source = cause.source();
    }
    out
}

/// Handler that records log events as ziggy events.
///
/// Each record becomes one context carrying the standard fields: logger
/// `name`, `level`, the rendered `msg` and, if an error was attached, the
/// formatted `exception`. The context type name defaults to `.log`.
///
/// Register it with the `log` facade via [`LogHandler::install`], or hold
/// it directly and feed it [`LogRecord`]s through [`LogHandler::emit`].
pub struct LogHandler {
    name: Option<String>,
    level: LevelFilter,
    recorder: Option<Arc<dyn Recorder>>,
}

impl Default for LogHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LogHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogHandler")
            .field("name", &self.name)
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

impl LogHandler {
    /// Handler with the default context type name `.log`.
    pub fn new() -> Self {
        Self {
            name: None,
            level: LevelFilter::Trace,
            recorder: None,
        }
    }

    /// Handler whose contexts are named `name` instead of `.log`.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new()
        }
    }

    /// Only records at `level` or above pass [`log::Log::enabled`].
    pub fn level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Route events to `recorder` instead of the globally installed one.
    pub fn recorder(mut self, recorder: Arc<dyn Recorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Record one log event as one ziggy event.
    ///
    /// Opens a context, sets the standard fields, and lets the context
    /// finalize when it goes out of scope.
    pub fn emit(&self, record: &LogRecord) {
        let name = self.name.as_deref().unwrap_or(".log");
        let mut ctx = match &self.recorder {
            Some(recorder) => Context::with_recorder(name, recorder.clone()),
            None => Context::new(name),
        };

        ctx.set("name", record.name.as_str());
        ctx.set("level", record.level.as_str());
        ctx.set("msg", record.msg.as_str());
        if let Some(exception) = &record.exception {
            ctx.set("exception", exception.as_str());
        }
    }

    /// Register this handler as the process-wide `log` destination and set
    /// the facade's max level.
    pub fn install(self, level: LevelFilter) -> Result<(), log::SetLoggerError> {
        log::set_max_level(level);
        log::set_boxed_logger(Box::new(self))
    }
}

impl log::Log for LogHandler {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            self.emit(&LogRecord::from(record));
        }
    }

    fn flush(&self) {
        // Contexts flush themselves on scope exit.
    }
}

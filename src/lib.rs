//! Ziggy - scoped event-recording contexts for the `log` facade
//!
//! This crate bridges standard `log`-based logging into ziggy's event
//! model: every log record becomes one recorded event, built inside a
//! scoped [`Context`] that finalizes itself when the scope exits.
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `context` - Scoped recording contexts and their finalized events
//! - `recorder` - The [`Recorder`] seam events are delivered through
//! - `logger` - [`LogHandler`], the `log::Log` adapter
//!
//! ## Usage
//!
//! Install a recorder (where events go), then register the handler with
//! the `log` facade:
//!
//! ```
//! use std::sync::Arc;
//! use ziggy::{set_recorder, LogHandler, MemoryRecorder};
//!
//! let recorder = Arc::new(MemoryRecorder::new());
//! let _ = set_recorder(recorder.clone());
//!
//! if LogHandler::new().install(log::LevelFilter::Info).is_ok() {
//!     log::error!(target: "app.db", "conn failed: {}", "timeout");
//!     let events = recorder.take();
//!     assert_eq!(events[0].fields["msg"], "conn failed: timeout");
//! }
//! ```

pub mod context;
pub mod logger;
pub mod recorder;

pub use context::{Context, ContextEvent};
pub use logger::{format_error_chain, LogHandler, LogRecord};
pub use recorder::{set_boxed_recorder, set_recorder, MemoryRecorder, Recorder, SetRecorderError};

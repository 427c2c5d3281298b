//! Scoped event-recording contexts.
//!
//! A [`Context`] is a named recording unit: it accumulates key/value fields
//! for the duration of a scope and finalizes exactly once when dropped,
//! handing a [`ContextEvent`] snapshot to the installed [`Recorder`].

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::recorder::{installed_recorder, Recorder};

/// Snapshot of a finalized context, ready to be persisted or transmitted
/// by whatever [`Recorder`] is installed.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContextEvent {
    /// The context's type name (e.g. `.log`).
    pub name: String,
    /// Short unique id for correlating this event downstream.
    pub id: String,
    /// When the context was opened.
    pub timestamp: DateTime<Utc>,
    /// Accumulated fields, keyed uniquely. Last write wins.
    pub fields: BTreeMap<String, Value>,
}

/// A scoped recording context.
///
/// Created with a type name, filled with [`set`](Context::set), and
/// finalized automatically when it goes out of scope — on normal exit and
/// during unwinding alike. Each context is an independent unit; nothing is
/// shared across contexts except the recorder they report to.
pub struct Context {
    name: String,
    id: String,
    started_at: DateTime<Utc>,
    fields: BTreeMap<String, Value>,
    recorder: Option<Arc<dyn Recorder>>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Open a context that reports to the globally installed recorder.
    ///
    /// The recorder is captured at creation, so a context never observes a
    /// recorder installed mid-scope. With no recorder installed, the
    /// finalized event is discarded.
    pub fn new(name: &str) -> Self {
        Self::build(name, installed_recorder())
    }

    /// Open a context that reports to `recorder`, bypassing the global
    /// installation. Intended for embedders that route events per-component
    /// and for tests.
    pub fn with_recorder(name: &str, recorder: Arc<dyn Recorder>) -> Self {
        Self::build(name, Some(recorder))
    }

    fn build(name: &str, recorder: Option<Arc<dyn Recorder>>) -> Self {
        Self {
            name: name.to_string(),
            id: format!("ctx-{}", &Uuid::new_v4().to_string()[..8]),
            started_at: Utc::now(),
            fields: BTreeMap::new(),
            recorder,
        }
    }

    /// Assign a field. Keys are unique within a context; setting the same
    /// key again replaces the earlier value.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        if let Some(recorder) = self.recorder.take() {
            recorder.record(ContextEvent {
                name: std::mem::take(&mut self.name),
                id: std::mem::take(&mut self.id),
                timestamp: self.started_at,
                fields: std::mem::take(&mut self.fields),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;

    use super::*;
    use crate::recorder::MemoryRecorder;

    #[test]
    fn test_finalizes_once_on_drop() {
        let recorder = Arc::new(MemoryRecorder::new());

        {
            let mut ctx = Context::with_recorder("request", recorder.clone());
            ctx.set("status", "ok");
        }

        let events = recorder.take();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "request");
        assert_eq!(events[0].fields["status"], "ok");

        // Nothing left after draining
        assert!(recorder.take().is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let recorder = Arc::new(MemoryRecorder::new());

        {
            let mut ctx = Context::with_recorder("request", recorder.clone());
            ctx.set("status", "pending");
            ctx.set("status", "ok");
        }

        let events = recorder.take();
        assert_eq!(events[0].fields.len(), 1);
        assert_eq!(events[0].fields["status"], "ok");
    }

    #[test]
    fn test_finalizes_during_unwind() {
        let recorder = Arc::new(MemoryRecorder::new());
        let cloned = recorder.clone();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let mut ctx = Context::with_recorder("request", cloned);
            ctx.set("status", "about to fail");
            panic!("boom");
        }));
        assert!(result.is_err());

        let events = recorder.take();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].fields["status"], "about to fail");
    }

    #[test]
    fn test_no_recorder_is_silent() {
        // Must not panic; the event has nowhere to go.
        let mut ctx = Context::with_recorder("request", Arc::new(MemoryRecorder::new()));
        ctx.set("k", 1);
        drop(ctx);

        let mut orphan = Context::build("orphan", None);
        orphan.set("k", 1);
        drop(orphan);
    }

    #[test]
    fn test_event_serializes() {
        let recorder = Arc::new(MemoryRecorder::new());

        {
            let mut ctx = Context::with_recorder("request", recorder.clone());
            ctx.set("code", 42);
        }

        let events = recorder.take();
        let json = serde_json::to_value(&events[0]).unwrap();
        assert_eq!(json["name"], "request");
        assert_eq!(json["fields"]["code"], 42);
        assert!(json["id"].as_str().unwrap().starts_with("ctx-"));
    }

    proptest! {
        #[test]
        fn prop_fields_match_distinct_sets(
            entries in proptest::collection::btree_map("[a-z]{1,12}", "\\PC{0,32}", 0..8)
        ) {
            let recorder = Arc::new(MemoryRecorder::new());

            {
                let mut ctx = Context::with_recorder("request", recorder.clone());
                for (key, value) in &entries {
                    ctx.set(key, value.as_str());
                }
            }

            let events = recorder.take();
            prop_assert_eq!(events.len(), 1);
            prop_assert_eq!(events[0].fields.len(), entries.len());
            for (key, value) in &entries {
                prop_assert_eq!(events[0].fields[key].as_str(), Some(value.as_str()));
            }
        }
    }
}

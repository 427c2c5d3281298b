//! Recorder seam.
//!
//! Finalized contexts are handed to a [`Recorder`]; where the events go from
//! there (socket, file, queue) is the recorder's business, not this crate's.
//! One recorder may be installed process-wide, mirroring the set-once
//! discipline of `log::set_logger`.

use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::{Mutex, RwLock};
use thiserror::Error;

use crate::context::ContextEvent;

/// Destination for finalized context events.
///
/// Called synchronously on whatever thread dropped the context, so
/// implementations must be `Send + Sync` and should not block for long.
pub trait Recorder: Send + Sync {
    fn record(&self, event: ContextEvent);
}

lazy_static! {
    static ref RECORDER: RwLock<Option<Arc<dyn Recorder>>> = RwLock::new(None);
}

/// Returned by [`set_recorder`] when a recorder is already installed.
#[derive(Debug, Error)]
#[error("a ziggy recorder has already been installed")]
pub struct SetRecorderError(());

/// Install the process-wide recorder. May only succeed once.
pub fn set_recorder(recorder: Arc<dyn Recorder>) -> Result<(), SetRecorderError> {
    let mut slot = RECORDER.write();
    if slot.is_some() {
        return Err(SetRecorderError(()));
    }
    *slot = Some(recorder);
    Ok(())
}

/// Install a boxed recorder. Convenience over [`set_recorder`].
pub fn set_boxed_recorder(recorder: Box<dyn Recorder>) -> Result<(), SetRecorderError> {
    set_recorder(Arc::from(recorder))
}

/// The currently installed recorder, if any.
pub(crate) fn installed_recorder() -> Option<Arc<dyn Recorder>> {
    RECORDER.read().clone()
}

/// Recorder that buffers events in memory until drained.
///
/// Useful for embedders that ship events in batches, and for tests that
/// assert on exactly what a context emitted.
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    events: Mutex<Vec<ContextEvent>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain and return everything recorded so far.
    pub fn take(&self) -> Vec<ContextEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl Recorder for MemoryRecorder {
    fn record(&self, event: ContextEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_recorder_buffers_and_drains() {
        let recorder = MemoryRecorder::new();
        assert!(recorder.is_empty());

        recorder.record(ContextEvent {
            name: "request".to_string(),
            id: "ctx-deadbeef".to_string(),
            timestamp: chrono::Utc::now(),
            fields: Default::default(),
        });
        assert_eq!(recorder.len(), 1);

        let events = recorder.take();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "request");
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_global_install_is_set_once() {
        // The slot is process-wide, so this test owns it: first install
        // succeeds, the second is rejected.
        let first = set_recorder(Arc::new(MemoryRecorder::new()));
        assert!(first.is_ok());

        let second = set_boxed_recorder(Box::new(MemoryRecorder::new()));
        assert!(second.is_err());
    }
}

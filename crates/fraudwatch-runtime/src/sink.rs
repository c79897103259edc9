//! Event sink seam
//!
//! After a committing mutation the pipeline and the alert lifecycle hand the
//! resulting [`DomainEvent`] to an [`EventSink`]. The server implements the
//! trait over the fan-out hub and topic publisher; delivery is best-effort
//! and a sink failure never propagates to the write path.

use crate::error::Result;
use async_trait::async_trait;
use fraudwatch_core::DomainEvent;
use std::sync::{Arc, Mutex};

/// Receives committed domain events for best-effort distribution
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one event
    async fn notify(&self, event: DomainEvent) -> Result<()>;
}

/// Sink that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

#[async_trait]
impl EventSink for NullSink {
    async fn notify(&self, _event: DomainEvent) -> Result<()> {
        Ok(())
    }
}

/// Sink that records events for verification in tests
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<DomainEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events, in delivery order
    pub fn recorded(&self) -> Vec<DomainEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Returns true when nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn notify(&self, event: DomainEvent) -> Result<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

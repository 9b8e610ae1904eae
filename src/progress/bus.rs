//! In-process event bus for run progress.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc::{self, error::SendError, UnboundedReceiver, UnboundedSender};
use tracing::warn;

use crate::progress::event::ProgressEvent;
use crate::progress::session::now_millis;

#[derive(Clone)]
pub struct ProgressBus {
    sender: UnboundedSender<ProgressEvent>,
    next_seq: Arc<AtomicU64>,
}

impl ProgressBus {
    pub fn new_pair() -> (Self, UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender,
                next_seq: Arc::new(AtomicU64::new(1)),
            },
            receiver,
        )
    }

    pub fn emit(
        &self,
        run: impl Into<String>,
        event_type: impl Into<String>,
        data: Value,
    ) -> Result<(), SendError<ProgressEvent>> {
        let event = ProgressEvent {
            ts: now_millis().to_string(),
            run: run.into(),
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            event_type: event_type.into(),
            data,
        };
        self.sender.send(event)
    }

    /// Emit, logging instead of failing when the receiver is gone.
    pub fn emit_best_effort(&self, run: &str, event_type: &str, data: Value) {
        if let Err(err) = self.emit(run, event_type, data) {
            warn!(
                run_id = %run,
                event_type = %event_type,
                error = %err,
                "failed to emit progress event"
            );
        }
    }
}

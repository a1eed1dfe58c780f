//! Fire-and-forget audit trail.
//!
//! Use cases enqueue onto an unbounded channel and never wait; a single
//! consumer task drains it into the [`SecurityEventRepository`].

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::domain::repository::SecurityEventRepository;
use crate::domain::types::{SecurityEvent, Severity};

#[derive(Clone, Debug)]
pub struct SecurityEventEmitter {
    tx: UnboundedSender<SecurityEvent>,
}

impl SecurityEventEmitter {
    pub fn channel() -> (Self, UnboundedReceiver<SecurityEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }

    /// Enqueue an event. Never blocks and never fails the caller.
    pub fn emit(&self, event: SecurityEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::warn!(
                event_type = %e.0.event_type,
                "security event dropped: consumer closed"
            );
        }
    }
}

/// Persist events until every emitter is dropped.
pub async fn run_consumer<R: SecurityEventRepository>(
    repo: R,
    mut rx: UnboundedReceiver<SecurityEvent>,
) {
    while let Some(event) = rx.recv().await {
        match event.severity {
            Severity::Info => tracing::info!(
                event_type = %event.event_type,
                user_id = ?event.user_id,
                tenant_id = ?event.tenant_id,
                "security event"
            ),
            Severity::Warning | Severity::Critical => tracing::warn!(
                event_type = %event.event_type,
                severity = event.severity.as_str(),
                user_id = ?event.user_id,
                tenant_id = ?event.tenant_id,
                "security event"
            ),
        }
        if let Err(e) = repo.insert(&event).await {
            tracing::error!(
                error = ?e,
                event_id = %event.id,
                event_type = %event.event_type,
                "failed to persist security event"
            );
        }
    }
    tracing::info!("security event consumer stopped");
}

//! Broadcast of batch progress events to WebSocket clients.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::BatchSummary;

/// Default broadcast channel capacity.
const DEFAULT_BROADCAST_CAPACITY: usize = 256;

/// Push notification emitted while a batch runs. Counts only, no per-record results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    BatchStarted {
        batch_id: Uuid,
        total: usize,
    },
    RecordProcessed {
        batch_id: Uuid,
        processed: usize,
        total: usize,
    },
    BatchCompleted {
        batch_id: Uuid,
        summary: BatchSummary,
    },
}

/// Fan-out of progress events. Publishing with no subscribers is fine.
pub struct ProgressHub {
    tx: broadcast::Sender<ProgressEvent>,
}

impl ProgressHub {
    pub fn new() -> Arc<Self> {
        let (tx, _rx) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);
        Arc::new(Self { tx })
    }

    /// Subscribe to live events. Each WS client calls this.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_without_subscribers_is_fine() {
        let hub = ProgressHub::new();
        assert_eq!(hub.subscriber_count(), 0);
        hub.publish(ProgressEvent::BatchStarted {
            batch_id: Uuid::new_v4(),
            total: 3,
        });
    }

    #[tokio::test]
    async fn subscribers_receive_events_in_order() {
        let hub = ProgressHub::new();
        let mut rx = hub.subscribe();
        let batch_id = Uuid::new_v4();

        hub.publish(ProgressEvent::BatchStarted { batch_id, total: 1 });
        hub.publish(ProgressEvent::RecordProcessed {
            batch_id,
            processed: 1,
            total: 1,
        });

        assert_eq!(
            rx.recv().await.unwrap(),
            ProgressEvent::BatchStarted { batch_id, total: 1 }
        );
        assert!(matches!(
            rx.recv().await.unwrap(),
            ProgressEvent::RecordProcessed { processed: 1, .. }
        ));
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = ProgressEvent::RecordProcessed {
            batch_id: Uuid::nil(),
            processed: 2,
            total: 5,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "record_processed");
        assert_eq!(json["processed"], 2);
        assert_eq!(json["total"], 5);
    }
}

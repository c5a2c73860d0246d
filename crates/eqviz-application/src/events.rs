//! Broadcast bus for [`ClientEvent`]s.

use eqviz_core::event::ClientEvent;
use tokio::sync::broadcast;

const CAPACITY: usize = 64;

/// Fan-out of client events to any number of subscribers.
///
/// Publishing with nobody listening is fine; slow subscribers may observe
/// `RecvError::Lagged` and should simply resynchronize from a snapshot.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ClientEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, event: ClientEvent) {
        tracing::trace!(target: "events", event = ?event, "Publishing");
        // Err only means there are no receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eqviz_core::dataset::DatasetId;

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let bus = EventBus::new();
        bus.publish(ClientEvent::DetailSelected { id: 1 });

        let mut rx = bus.subscribe();
        let id: DatasetId = 2;
        bus.publish(ClientEvent::DetailSelected { id });
        assert_eq!(rx.recv().await.unwrap(), ClientEvent::DetailSelected { id: 2 });
    }
}

use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::model::Event;

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast hub for change notifications per car registration.
#[derive(Default)]
pub struct NotifyHub {
    channels: DashMap<String, broadcast::Sender<Event>>,
}

impl NotifyHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to notifications for a car. Creates the channel if needed.
    pub fn subscribe(&self, registration: &str) -> broadcast::Receiver<Event> {
        let sender = self
            .channels
            .entry(registration.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Send a notification. No-op if nobody is listening; a channel whose
    /// receivers have all gone is dropped.
    pub fn send(&self, registration: &str, event: &Event) {
        let Some(sender) = self.channels.get(registration) else {
            return;
        };
        if sender.send(event.clone()).is_ok() {
            return;
        }
        drop(sender);
        self.channels
            .remove_if(registration, |_, sender| sender.receiver_count() == 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribe_and_receive() {
        let hub = NotifyHub::new();
        let mut rx = hub.subscribe("XX15 5UR");

        let event = Event::CarAdded {
            registration: "XX15 5UR".into(),
        };
        hub.send("XX15 5UR", &event);

        let received = rx.recv().await.unwrap();
        assert_eq!(received, event);
    }

    #[tokio::test]
    async fn other_registration_not_delivered() {
        let hub = NotifyHub::new();
        let mut rx = hub.subscribe("A");
        hub.send(
            "B",
            &Event::CarAdded {
                registration: "B".into(),
            },
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_without_subscribers_is_noop() {
        let hub = NotifyHub::new();
        // no subscriber, must not panic
        hub.send(
            "XX15 5UR",
            &Event::CarAdded {
                registration: "XX15 5UR".into(),
            },
        );
    }

    #[tokio::test]
    async fn abandoned_channel_is_pruned() {
        let hub = NotifyHub::new();
        let rx = hub.subscribe("XX15 5UR");
        drop(rx);
        let event = Event::CarAdded {
            registration: "XX15 5UR".into(),
        };
        hub.send("XX15 5UR", &event);
        assert!(hub.channels.is_empty());

        let mut rx = hub.subscribe("XX15 5UR");
        hub.send("XX15 5UR", &event);
        assert_eq!(rx.recv().await.unwrap(), event);
        assert_eq!(hub.channels.len(), 1);
    }
}

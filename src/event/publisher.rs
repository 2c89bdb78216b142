use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use super::{events::Event, registry::SubscriberRegistry};

/// Pushes events to every live subscriber of the event's room
///
/// A subscriber whose send fails is cancelled and skipped; the rest of the room
/// still receives the event and the caller never sees the failure.
#[derive(Clone)]
pub struct Publisher {
    registry: Arc<SubscriberRegistry>,
}

impl Publisher {
    pub fn new(registry: Arc<SubscriberRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    /// Delivers `event` to the room's current subscribers
    ///
    /// The subscriber set is copied under the registry lock and the writes happen
    /// after it is released, so a slow client never blocks registration.
    #[instrument(skip(self, event), fields(room_id = %event.room_id(), kind = %event.kind()))]
    pub async fn publish(&self, event: Event) {
        let subscribers = self.registry.snapshot(event.room_id());
        if subscribers.is_empty() {
            debug!("No subscribers for room");
            return;
        }

        let frame = match event.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!(error = %e, "Failed to serialize event");
                return;
            }
        };

        let mut delivered = 0usize;
        let mut failed = 0usize;

        for subscriber in subscribers {
            // Already closing; its session will deregister it
            if subscriber.cancel.is_cancelled() {
                continue;
            }

            match subscriber.socket.send_message(frame.clone()).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(
                        connection_id = %subscriber.connection_id,
                        error = %e,
                        "Failed to send event to subscriber"
                    );
                    subscriber.cancel.cancel();
                    failed += 1;
                }
            }
        }

        debug!(delivered, failed, "Event published");
    }

    /// Publishes `event` on a detached task
    ///
    /// Request handlers call this so the response never waits on fan-out. Each call
    /// spawns one task; under heavy write load that is unbounded concurrency.
    pub fn dispatch(&self, event: Event) -> JoinHandle<()> {
        let publisher = self.clone();
        tokio::spawn(async move { publisher.publish(event).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::MockOutboundSocket;
    use rstest::rstest;
    use uuid::Uuid;

    fn setup() -> (Publisher, Arc<SubscriberRegistry>) {
        let registry = Arc::new(SubscriberRegistry::new());
        (Publisher::new(Arc::clone(&registry)), registry)
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_a_no_op() {
        let (publisher, registry) = setup();
        let room_id = Uuid::new_v4();

        publisher
            .publish(Event::message_created(room_id, "m1", "hi"))
            .await;

        assert_eq!(registry.room_count(), 0);
    }

    #[tokio::test]
    async fn test_single_subscriber_receives_exact_frame() {
        let (publisher, registry) = setup();
        let room_id = Uuid::new_v4();
        let socket = Arc::new(MockOutboundSocket::new());
        registry.register(room_id, Uuid::new_v4(), socket.clone());

        publisher
            .publish(Event::message_created(room_id, "m1", "hi"))
            .await;

        assert_eq!(
            socket.frames(),
            vec![r#"{"kind":"message_created","value":{"id":"m1","message":"hi"}}"#.to_string()]
        );
    }

    #[tokio::test]
    async fn test_other_rooms_receive_nothing() {
        let (publisher, registry) = setup();
        let subscribed_room = Uuid::new_v4();
        let other_room = Uuid::new_v4();
        let socket = Arc::new(MockOutboundSocket::new());
        registry.register(subscribed_room, Uuid::new_v4(), socket.clone());

        publisher
            .publish(Event::message_answered(other_room, "m1"))
            .await;

        assert!(socket.frames().is_empty());
    }

    #[rstest]
    #[case::all_healthy(vec![false, false, false])]
    #[case::all_broken(vec![true, true])]
    #[case::mixed(vec![false, true, false, true, true])]
    #[case::single_broken(vec![true])]
    #[tokio::test]
    async fn test_failures_cancel_exactly_the_failing_subscribers(#[case] broken: Vec<bool>) {
        let (publisher, registry) = setup();
        let room_id = Uuid::new_v4();

        let subscribers: Vec<_> = broken
            .iter()
            .map(|&is_broken| {
                let socket = Arc::new(MockOutboundSocket::new());
                socket.set_broken(is_broken);
                let cancel = registry.register(room_id, Uuid::new_v4(), socket.clone());
                (socket, cancel, is_broken)
            })
            .collect();

        publisher
            .publish(Event::reaction_increased(room_id, "m1", 1))
            .await;

        for (socket, cancel, is_broken) in subscribers {
            assert_eq!(cancel.is_cancelled(), is_broken);
            assert_eq!(socket.frames().len(), if is_broken { 0 } else { 1 });
        }
    }

    #[tokio::test]
    async fn test_cancelled_subscriber_is_skipped() {
        let (publisher, registry) = setup();
        let room_id = Uuid::new_v4();
        let socket = Arc::new(MockOutboundSocket::new());
        let cancel = registry.register(room_id, Uuid::new_v4(), socket.clone());

        cancel.cancel();
        publisher
            .publish(Event::message_answered(room_id, "m1"))
            .await;

        assert!(socket.frames().is_empty());
    }

    #[tokio::test]
    async fn test_sequential_publishes_arrive_in_order() {
        let (publisher, registry) = setup();
        let room_id = Uuid::new_v4();
        let socket = Arc::new(MockOutboundSocket::new());
        registry.register(room_id, Uuid::new_v4(), socket.clone());

        for count in 1..=5 {
            publisher
                .publish(Event::reaction_increased(room_id, "m1", count))
                .await;
        }

        let counts: Vec<i64> = socket
            .frames()
            .iter()
            .map(|frame| {
                let value: serde_json::Value = serde_json::from_str(frame).unwrap();
                value["value"]["count"].as_i64().unwrap()
            })
            .collect();
        assert_eq!(counts, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_dispatch_runs_in_background() {
        let (publisher, registry) = setup();
        let room_id = Uuid::new_v4();
        let socket = Arc::new(MockOutboundSocket::new());
        registry.register(room_id, Uuid::new_v4(), socket.clone());

        publisher
            .dispatch(Event::message_created(room_id, "m1", "hello"))
            .await
            .unwrap();

        assert_eq!(socket.frames().len(), 1);
    }
}

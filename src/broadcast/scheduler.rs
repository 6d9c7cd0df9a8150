//! Broadcast scheduler implementation
//!
//! One long-lived loop drives all periodic delivery; ticks never overlap.
//! The interval is a fixed sleep between tick starts, so a slow fan-out
//! delays the next tick rather than stacking a second one on top of it.

use std::sync::Arc;
use std::time::Duration;

use crate::frame::FrameProducer;
use crate::hub::Hub;
use crate::protocol::ServerEvent;
use crate::stats::{BroadcastCounters, BroadcastStats};

/// Periodic broadcast driver
///
/// Every failure mode inside a tick (production, serialization, a dead
/// subscriber queue) is contained within that tick; the loop itself only
/// ends with the process (or the shutdown future of [`run_until`]).
///
/// [`run_until`]: Broadcaster::run_until
pub struct Broadcaster {
    hub: Arc<Hub>,
    producer: Arc<FrameProducer>,
    topic: String,
    interval: Duration,
    counters: BroadcastCounters,
}

impl Broadcaster {
    /// Create a scheduler broadcasting to `topic` every `interval`
    pub fn new(
        hub: Arc<Hub>,
        producer: Arc<FrameProducer>,
        topic: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            hub,
            producer,
            topic: topic.into(),
            interval,
            counters: BroadcastCounters::new(),
        }
    }

    /// The topic gating delivery
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Snapshot of cumulative broadcast counters
    pub fn stats(&self) -> BroadcastStats {
        self.counters.snapshot()
    }

    /// Run the broadcast loop forever
    pub async fn run(&self) {
        tracing::info!(topic = %self.topic, interval = ?self.interval, "Broadcast loop started");
        loop {
            tokio::time::sleep(self.interval).await;
            self.tick().await;
        }
    }

    /// Run the broadcast loop until `shutdown` resolves
    ///
    /// The signal is observed during the inter-tick sleep; a tick already
    /// in flight completes first.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: std::future::Future<Output = ()>,
    {
        tokio::select! {
            _ = shutdown => {
                tracing::info!(topic = %self.topic, "Broadcast loop stopped");
            }
            _ = self.run() => {}
        }
    }

    /// Perform exactly one broadcast pass
    pub async fn tick(&self) {
        // Nobody connected at all: skip production entirely. Membership is
        // deliberately not consulted here: a populated registry with zero
        // subscribers still produces a frame that reaches nobody.
        if self.hub.connection_count() == 0 {
            return;
        }

        let frame = match self.producer.produce() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "Frame production failed, tick skipped");
                self.counters.record_skipped_tick();
                return;
            }
        };

        // Serialize once; every recipient shares the same text
        let envelope = match ServerEvent::stream_frames(&frame).encode() {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(error = %e, "Frame serialization failed, tick skipped");
                self.counters.record_skipped_tick();
                return;
            }
        };

        // Send against a snapshot: a disconnect landing mid-fan-out shows
        // up as one failed send, never a torn iteration
        let subscribers = self.hub.subscribers_of(&self.topic).await;

        let mut delivered = 0u64;
        let mut failed = 0u64;
        for (id, sender) in subscribers {
            if sender.send(Arc::clone(&envelope)).is_ok() {
                delivered += 1;
            } else {
                failed += 1;
                tracing::debug!(conn = %id, frame = %frame.name, "Frame dropped, session gone");
            }
        }

        self.counters.record_frame();
        self.counters.record_fanout(delivered, failed);
        tracing::debug!(frame = %frame.name, delivered, failed, "Broadcast tick");
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;
    use tokio::sync::mpsc;

    use crate::hub::ConnectionId;
    use crate::protocol::DEFAULT_STREAM_TOPIC;
    use crate::router::EventRouter;

    use super::*;

    const TICK: Duration = Duration::from_secs(1);

    fn broadcaster() -> (Broadcaster, Arc<Hub>, Arc<FrameProducer>) {
        let hub = Arc::new(Hub::new());
        let producer = Arc::new(FrameProducer::with_dimensions(16, 12));
        let b = Broadcaster::new(
            Arc::clone(&hub),
            Arc::clone(&producer),
            DEFAULT_STREAM_TOPIC,
            TICK,
        );
        (b, hub, producer)
    }

    async fn join(
        hub: &Hub,
        id: u64,
        topic: Option<&str>,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<Arc<String>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = ConnectionId(id);
        hub.register(id, None, tx).await.unwrap();
        if let Some(topic) = topic {
            hub.subscribe(id, topic).await;
        }
        (id, rx)
    }

    fn next_json(rx: &mut mpsc::UnboundedReceiver<Arc<String>>) -> Value {
        let text = rx.try_recv().expect("expected a queued envelope");
        serde_json::from_str(&text).unwrap()
    }

    #[tokio::test]
    async fn test_empty_registry_skips_production() {
        let (b, _hub, producer) = broadcaster();

        b.tick().await;
        b.tick().await;

        // Zero calls to the producer when nobody is connected
        assert_eq!(producer.sequence(), 0);
        assert_eq!(b.stats(), BroadcastStats::default());
    }

    #[tokio::test]
    async fn test_unsubscribed_connection_produces_but_receives_nothing() {
        let (b, hub, producer) = broadcaster();
        let (_id, mut rx) = join(&hub, 1, None).await;

        b.tick().await;

        assert_eq!(producer.sequence(), 1);
        assert!(rx.try_recv().is_err());
        let stats = b.stats();
        assert_eq!(stats.frames_broadcast, 1);
        assert_eq!(stats.deliveries, 0);
    }

    #[tokio::test]
    async fn test_tick_delivers_to_topic_members_only() {
        let (b, hub, _) = broadcaster();
        let (_a, mut rx_a) = join(&hub, 1, Some(DEFAULT_STREAM_TOPIC)).await;
        let (_b, mut rx_b) = join(&hub, 2, Some("other_topic")).await;

        b.tick().await;

        let envelope = next_json(&mut rx_a);
        assert_eq!(envelope["event"], "stream_frames");
        assert_eq!(envelope["payload"]["title"], "send_frames");
        assert_eq!(envelope["payload"]["data"]["frame_name"], "frame_0");
        assert!(!envelope["payload"]["data"]["frame_data"]
            .as_str()
            .unwrap()
            .is_empty());

        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_frame_names_carry_increasing_sequence() {
        let (b, hub, _) = broadcaster();
        let (_a, mut rx) = join(&hub, 1, Some(DEFAULT_STREAM_TOPIC)).await;

        b.tick().await;
        b.tick().await;
        b.tick().await;

        for expected in ["frame_0", "frame_1", "frame_2"] {
            let envelope = next_json(&mut rx);
            assert_eq!(envelope["payload"]["data"]["frame_name"], expected);
        }
    }

    #[tokio::test]
    async fn test_dead_session_is_isolated_from_other_members() {
        let (b, hub, _) = broadcaster();
        let (_a, mut rx_a) = join(&hub, 1, Some(DEFAULT_STREAM_TOPIC)).await;
        let (_bad, rx_bad) = join(&hub, 2, Some(DEFAULT_STREAM_TOPIC)).await;

        // Session task gone, hub cleanup not yet run
        drop(rx_bad);

        b.tick().await;

        assert_eq!(next_json(&mut rx_a)["event"], "stream_frames");
        let stats = b.stats();
        assert_eq!(stats.deliveries, 1);
        assert_eq!(stats.send_failures, 1);
    }

    #[tokio::test]
    async fn test_disconnected_member_gets_no_further_frames() {
        let (b, hub, _) = broadcaster();
        let (a, mut rx_a) = join(&hub, 1, Some(DEFAULT_STREAM_TOPIC)).await;
        let (_keep, mut rx_keep) = join(&hub, 2, Some(DEFAULT_STREAM_TOPIC)).await;

        b.tick().await;
        let _ = next_json(&mut rx_a);
        let _ = next_json(&mut rx_keep);

        hub.clear(a).await;
        hub.unregister(a).await;

        b.tick().await;

        assert!(rx_a.try_recv().is_err());
        assert_eq!(next_json(&mut rx_keep)["event"], "stream_frames");
    }

    #[tokio::test]
    async fn test_production_failure_skips_tick_and_loop_survives() {
        let hub = Arc::new(Hub::new());
        let producer = Arc::new(FrameProducer::with_dimensions(0, 0));
        let b = Broadcaster::new(
            Arc::clone(&hub),
            Arc::clone(&producer),
            DEFAULT_STREAM_TOPIC,
            TICK,
        );
        let (_id, mut rx) = join(&hub, 1, Some(DEFAULT_STREAM_TOPIC)).await;

        b.tick().await;
        b.tick().await;

        assert!(rx.try_recv().is_err());
        let stats = b.stats();
        assert_eq!(stats.ticks_skipped, 2);
        assert_eq!(stats.frames_broadcast, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_ticks_on_interval_and_stops() {
        let (b, hub, _) = broadcaster();
        let b = Arc::new(b);
        let (_id, mut rx) = join(&hub, 1, Some(DEFAULT_STREAM_TOPIC)).await;

        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn({
            let b = Arc::clone(&b);
            async move {
                b.run_until(async {
                    let _ = stop_rx.await;
                })
                .await;
            }
        });

        // Paused clock: sleeping past one interval runs exactly one tick
        tokio::time::sleep(TICK + Duration::from_millis(100)).await;
        assert_eq!(next_json(&mut rx)["event"], "stream_frames");
        assert!(rx.try_recv().is_err());

        stop_tx.send(()).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_subscribe_then_tick_end_to_end() {
        // welcome -> subscribe -> confirmed -> tick -> frame -> disconnect
        let hub = Arc::new(Hub::new());
        let producer = Arc::new(FrameProducer::with_dimensions(16, 12));
        let router = EventRouter::new(Arc::clone(&hub), Arc::clone(&producer));
        let b = Broadcaster::new(
            Arc::clone(&hub),
            Arc::clone(&producer),
            DEFAULT_STREAM_TOPIC,
            TICK,
        );

        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = ConnectionId(7);
        router.on_connect(id, None, tx).await;

        let welcome = next_json(&mut rx);
        assert_eq!(welcome["event"], "welcome");
        assert_eq!(welcome["payload"]["client_id"], 7);

        router
            .on_message(id, r#"{"event": "subscribe", "payload": "stream_frames"}"#)
            .await;
        let confirm = next_json(&mut rx);
        assert_eq!(confirm["event"], "subscription_confirmed");
        assert_eq!(confirm["payload"]["topic"], "stream_frames");

        b.tick().await;
        let envelope = next_json(&mut rx);
        assert_eq!(envelope["event"], "stream_frames");
        assert!(envelope["payload"]["data"]["frame_name"]
            .as_str()
            .unwrap()
            .starts_with("frame_"));

        router.on_disconnect(id).await;
        b.tick().await;
        assert!(rx.try_recv().is_err());
    }
}

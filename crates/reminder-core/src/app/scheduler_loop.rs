//! SchedulerLoop - 定期的に期限切れエントリを取り出して配送する
//!
//! # フロー
//! 1. Idle: tick_interval ごとのタイマー、または shutdown を待つ
//! 2. Draining: `ScheduleHandle::drain_due_now()` で期限切れを一括取得
//! 3. Dispatching: 1 件ごとに独立したタスクで `Notifier::notify()`（await しない）
//! 4. shutdown を受けたら抜ける。キューに残ったエントリと配送中のタスクは捨てる

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use super::status::DispatchCounters;
use crate::config::SchedulerConfig;
use crate::domain::ScheduledEntry;
use crate::ports::{Clock, Notifier};
use crate::queue::ScheduleHandle;

/// The single background drain loop.
pub struct SchedulerLoop {
    handle: ScheduleHandle,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    permits: Arc<Semaphore>,
    counters: Arc<DispatchCounters>,
    tick_interval: Duration,
}

impl SchedulerLoop {
    pub fn new(
        handle: ScheduleHandle,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
        config: &SchedulerConfig,
        counters: Arc<DispatchCounters>,
    ) -> Self {
        Self {
            handle,
            clock,
            notifier,
            permits: Arc::new(Semaphore::new(config.max_concurrent_deliveries)),
            counters,
            tick_interval: config.tick_interval(),
        }
    }

    /// One wake-up: drain what is due and launch a delivery per entry.
    ///
    /// Returns the number of deliveries launched. Does not wait for them.
    pub async fn tick(&self) -> usize {
        let due = self.handle.drain_due_now(self.clock.as_ref()).await;
        let launched = due.len();
        self.counters.record_tick(launched);

        for entry in due {
            self.dispatch(entry);
        }
        launched
    }

    fn dispatch(&self, entry: ScheduledEntry) {
        tokio::spawn(deliver(
            entry,
            Arc::clone(&self.notifier),
            Arc::clone(&self.permits),
            Arc::clone(&self.counters),
        ));
    }

    /// Tick every `tick_interval` until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// The first tick fires one full interval after start.
    ///
    /// # Panics
    /// If `tick_interval` is zero or too large to add to `Instant::now()`;
    /// [`SchedulerBuilder`](super::SchedulerBuilder) rejects both.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval_at(Instant::now() + self.tick_interval, self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            tick_interval_secs = self.tick_interval.as_secs(),
            "scheduler loop started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    // sender dropped: treat as shutdown
                    if changed.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        let abandoned = self.handle.pending().await;
        info!(abandoned, "scheduler loop stopped");
    }

    /// Run on a new task.
    pub fn spawn(self) -> RunningScheduler {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(self.run(shutdown_rx));
        RunningScheduler { shutdown_tx, join }
    }
}

/// Deliver one entry. Never re-queues; failures are logged and counted.
async fn deliver(
    entry: ScheduledEntry,
    notifier: Arc<dyn Notifier>,
    permits: Arc<Semaphore>,
    counters: Arc<DispatchCounters>,
) {
    let Ok(_permit) = permits.acquire_owned().await else {
        warn!(entry_id = %entry.id(), "delivery pool closed; dropping reminder");
        counters.record_failed();
        return;
    };

    // inner task so a panicking notifier is reported here instead of vanishing
    let attempt = {
        let recipient = entry.recipient().clone();
        let payload_id = entry.payload_id().clone();
        tokio::spawn(async move { notifier.notify(&recipient, &payload_id).await })
    };

    match attempt.await {
        Ok(Ok(())) => {
            counters.record_delivered();
            debug!(
                entry_id = %entry.id(),
                payload_id = %entry.payload_id(),
                "reminder delivered"
            );
        }
        Ok(Err(error)) => {
            counters.record_failed();
            warn!(
                entry_id = %entry.id(),
                payload_id = %entry.payload_id(),
                recipient = %entry.recipient().address,
                %error,
                "reminder delivery failed; dropping"
            );
        }
        Err(error) => {
            counters.record_failed();
            warn!(
                entry_id = %entry.id(),
                payload_id = %entry.payload_id(),
                recipient = %entry.recipient().address,
                %error,
                "notifier aborted; dropping"
            );
        }
    }
}

/// Handle to a spawned [`SchedulerLoop`].
/// - `request_shutdown()` か `RunningScheduler` の drop でループが止まる
/// - 配送中のタスクは待たない
pub struct RunningScheduler {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl RunningScheduler {
    pub fn request_shutdown(&self) {
        // ignore send error: the loop may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    /// Shutdown and wait for the loop itself to return.
    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        if let Err(error) = self.join.await {
            warn!(%error, "scheduler loop task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::SchedulerStatus;
    use crate::domain::{DeliveryError, PayloadId, Recipient};
    use crate::impls::InMemoryNotifier;
    use crate::ports::{FixedClock, SystemClock, UlidGenerator};
    use crate::queue::TimeOrderedQueue;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};

    struct Fixture {
        handle: ScheduleHandle,
        clock: Arc<FixedClock>,
        notifier: Arc<InMemoryNotifier>,
        counters: Arc<DispatchCounters>,
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
    }

    fn fixture() -> Fixture {
        Fixture {
            handle: ScheduleHandle::new(
                TimeOrderedQueue::with_capacity(10),
                Arc::new(UlidGenerator::new(SystemClock)),
            ),
            clock: Arc::new(FixedClock::new(t0())),
            notifier: Arc::new(InMemoryNotifier::new()),
            counters: Arc::new(DispatchCounters::default()),
        }
    }

    impl Fixture {
        fn scheduler(&self, config: &SchedulerConfig) -> SchedulerLoop {
            SchedulerLoop::new(
                self.handle.clone(),
                self.clock.clone(),
                self.notifier.clone(),
                config,
                self.counters.clone(),
            )
        }

        async fn register(&self, offset: chrono::Duration, payload: u64, address: &str) {
            self.handle
                .register(
                    t0() + offset,
                    PayloadId::from(payload),
                    Recipient::new("user", address),
                )
                .await;
        }
    }

    #[tokio::test]
    async fn tick_dispatches_only_due_entries() {
        let fx = fixture();
        fx.register(chrono::Duration::minutes(-5), 1, "a@x").await;
        fx.register(chrono::Duration::minutes(-1), 2, "b@x").await;
        fx.register(chrono::Duration::minutes(5), 3, "c@x").await;

        let scheduler = fx.scheduler(&SchedulerConfig::default());
        assert_eq!(scheduler.tick().await, 2);
        assert!(fx.notifier.wait_for_attempts(2, Duration::from_secs(5)).await);

        let mut delivered: Vec<_> = fx
            .notifier
            .deliveries()
            .await
            .into_iter()
            .map(|d| d.payload_id.to_string())
            .collect();
        delivered.sort();
        assert_eq!(delivered, vec!["1", "2"]);
        assert_eq!(fx.handle.pending().await, 1);
    }

    #[tokio::test]
    async fn failed_delivery_is_dropped_and_does_not_affect_others() {
        let fx = fixture();
        fx.notifier.fail_for("bounce@x").await;
        fx.register(chrono::Duration::minutes(-3), 1, "ok@x").await;
        fx.register(chrono::Duration::minutes(-2), 2, "bounce@x").await;
        fx.register(chrono::Duration::minutes(-1), 3, "ok@x").await;

        let scheduler = fx.scheduler(&SchedulerConfig::default());
        assert_eq!(scheduler.tick().await, 3);
        assert!(fx.notifier.wait_for_attempts(3, Duration::from_secs(5)).await);
        assert_eq!(fx.notifier.deliveries().await.len(), 2);

        // no retry: the failed entry is gone for good
        fx.clock.advance(chrono::Duration::hours(1));
        assert_eq!(scheduler.tick().await, 0);
        assert_eq!(fx.handle.pending().await, 0);
    }

    #[tokio::test]
    async fn entry_due_at_tick_instant_waits_for_next_tick() {
        let fx = fixture();
        fx.register(chrono::Duration::zero(), 1, "a@x").await;

        let scheduler = fx.scheduler(&SchedulerConfig::default());
        assert_eq!(scheduler.tick().await, 0);

        fx.clock.advance(chrono::Duration::minutes(1));
        assert_eq!(scheduler.tick().await, 1);
        assert!(fx.notifier.wait_for_attempts(1, Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn batch_is_dispatched_in_due_order() {
        let fx = fixture();
        for (payload, minutes) in [(3, -1), (1, -30), (2, -10)] {
            fx.register(chrono::Duration::minutes(minutes), payload, "a@x").await;
        }

        let config = SchedulerConfig {
            max_concurrent_deliveries: 1,
            ..SchedulerConfig::default()
        };
        fx.scheduler(&config).tick().await;
        assert!(fx.notifier.wait_for_attempts(3, Duration::from_secs(5)).await);

        let order: Vec<_> = fx
            .notifier
            .deliveries()
            .await
            .into_iter()
            .map(|d| d.payload_id.to_string())
            .collect();
        assert_eq!(order, vec!["1", "2", "3"]);
    }

    struct PanickingNotifier;

    #[async_trait]
    impl Notifier for PanickingNotifier {
        async fn notify(&self, _: &Recipient, _: &PayloadId) -> Result<(), DeliveryError> {
            panic!("notifier blew up");
        }
    }

    #[tokio::test]
    async fn panicking_notifier_is_counted_as_failure() {
        let fx = fixture();
        fx.register(chrono::Duration::minutes(-1), 1, "a@x").await;

        let scheduler = SchedulerLoop::new(
            fx.handle.clone(),
            fx.clock.clone(),
            Arc::new(PanickingNotifier),
            &SchedulerConfig::default(),
            fx.counters.clone(),
        );
        assert_eq!(scheduler.tick().await, 1);

        let deadline = Instant::now() + Duration::from_secs(5);
        while SchedulerStatus::new(0, None, &fx.counters).failed == 0 {
            assert!(Instant::now() < deadline, "failure was never recorded");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn run_ticks_on_interval_and_stops_on_shutdown() {
        let fx = fixture();
        fx.register(chrono::Duration::minutes(-1), 1, "a@x").await;

        let running = fx.scheduler(&SchedulerConfig::default()).spawn();
        // let the loop start its timer before time moves
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        // nothing before the first full interval
        tokio::time::advance(Duration::from_secs(59)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(fx.notifier.attempts(), 0);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(fx.notifier.wait_for_attempts(1, Duration::from_secs(1)).await);

        // still queued at shutdown: abandoned, never delivered
        fx.register(chrono::Duration::minutes(-1), 2, "b@x").await;
        running.shutdown_and_join().await;
        assert_eq!(fx.handle.pending().await, 1);
        assert_eq!(fx.notifier.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_shutdown_sender_stops_the_loop() {
        let fx = fixture();
        let (tx, rx) = watch::channel(false);
        let join = tokio::spawn(fx.scheduler(&SchedulerConfig::default()).run(rx));

        drop(tx);
        tokio::time::timeout(Duration::from_secs(1), join)
            .await
            .expect("loop should stop")
            .unwrap();
    }
}

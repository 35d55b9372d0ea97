//! Guarded queue handle shared by registration callers and the scheduler loop.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use super::TimeOrderedQueue;
use crate::domain::{EntryId, PayloadId, Recipient, ScheduledEntry};
use crate::ports::{Clock, IdGenerator};

/// Cloneable handle to the single process-wide queue.
///
/// Every heap mutation runs under one lock. Critical sections are a single
/// insert or a single drain; nothing awaits I/O while holding the lock.
#[derive(Clone)]
pub struct ScheduleHandle {
    queue: Arc<Mutex<TimeOrderedQueue>>,
    ids: Arc<dyn IdGenerator>,
}

impl ScheduleHandle {
    pub fn new(queue: TimeOrderedQueue, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            queue: Arc::new(Mutex::new(queue)),
            ids,
        }
    }

    /// Register a reminder. Never rejects; input validation is the caller's job.
    pub async fn register(
        &self,
        due_at: DateTime<Utc>,
        payload_id: PayloadId,
        recipient: Recipient,
    ) -> EntryId {
        let id = self.ids.generate_entry_id();
        self.register_entry(ScheduledEntry::new(id, due_at, payload_id, recipient))
            .await;
        id
    }

    /// Register a pre-built entry.
    pub async fn register_entry(&self, entry: ScheduledEntry) {
        debug!(
            entry_id = %entry.id(),
            due_at = %entry.due_at(),
            payload_id = %entry.payload_id(),
            "reminder registered"
        );
        self.queue.lock().await.insert(entry);
    }

    /// Take every entry due strictly before `clock.now()`.
    ///
    /// `now` is sampled after the lock is acquired. Only the scheduler loop
    /// should call this; delivery happens after the lock is released.
    pub async fn drain_due_now(&self, clock: &dyn Clock) -> Vec<ScheduledEntry> {
        let (as_of, due, remaining) = {
            let mut queue = self.queue.lock().await;
            let as_of = clock.now();
            let due = queue.drain_due(as_of);
            (as_of, due, queue.len())
        };
        debug!(%as_of, drained = due.len(), remaining, "drained due reminders");
        due
    }

    pub async fn pending(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub async fn next_due(&self) -> Option<DateTime<Utc>> {
        self.queue.lock().await.peek_min().map(ScheduledEntry::due_at)
    }

    /// Run `f` against the queue under the lock (for invariant checks).
    pub async fn inspect<R>(&self, f: impl FnOnce(&TimeOrderedQueue) -> R) -> R {
        f(&*self.queue.lock().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock, UlidGenerator};
    use chrono::{Duration, TimeZone};
    use std::collections::HashSet;

    fn handle() -> ScheduleHandle {
        ScheduleHandle::new(
            TimeOrderedQueue::with_capacity(10),
            Arc::new(UlidGenerator::new(SystemClock)),
        )
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn register_then_drain_with_injected_clock() {
        let handle = handle();
        let clock = FixedClock::new(t0());

        let early = handle
            .register(
                t0() - Duration::minutes(5),
                PayloadId::from(1u64),
                Recipient::new("ana", "ana@example.com"),
            )
            .await;
        handle
            .register(
                t0() + Duration::minutes(5),
                PayloadId::from(2u64),
                Recipient::new("bo", "bo@example.com"),
            )
            .await;

        let drained = handle.drain_due_now(&clock).await;
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].id(), early);
        assert_eq!(handle.pending().await, 1);
        assert_eq!(handle.next_due().await, Some(t0() + Duration::minutes(5)));

        clock.advance(Duration::minutes(10));
        assert_eq!(handle.drain_due_now(&clock).await.len(), 1);
        assert_eq!(handle.pending().await, 0);
        assert_eq!(handle.next_due().await, None);
    }

    #[tokio::test]
    async fn entry_due_at_sampled_instant_is_deferred() {
        let handle = handle();
        let clock = FixedClock::new(t0());
        handle
            .register(t0(), PayloadId::from(9u64), Recipient::new("ana", "a@x"))
            .await;

        assert!(handle.drain_due_now(&clock).await.is_empty());
        clock.advance(Duration::milliseconds(1));
        assert_eq!(handle.drain_due_now(&clock).await.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_register_and_drain_lose_nothing() {
        const PRODUCERS: u64 = 8;
        const PER_PRODUCER: u64 = 50;
        const DRAINERS: usize = 4;

        let handle = handle();
        // every entry is already due relative to this clock
        let clock = Arc::new(FixedClock::new(t0()));

        let mut producers = Vec::new();
        for p in 0..PRODUCERS {
            let handle = handle.clone();
            producers.push(tokio::spawn(async move {
                let mut ids = Vec::new();
                for i in 0..PER_PRODUCER {
                    let n = p * PER_PRODUCER + i;
                    let due = t0() - Duration::seconds((n % 97) as i64 + 1);
                    ids.push(
                        handle
                            .register(due, PayloadId::from(n), Recipient::new("u", "u@x"))
                            .await,
                    );
                    tokio::task::yield_now().await;
                }
                ids
            }));
        }

        let mut drainers = Vec::new();
        for _ in 0..DRAINERS {
            let handle = handle.clone();
            let clock = clock.clone();
            drainers.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                for _ in 0..100 {
                    let batch = handle.drain_due_now(clock.as_ref()).await;
                    assert!(batch.windows(2).all(|w| w[0].due_at() <= w[1].due_at()));
                    assert!(handle.inspect(|q| q.satisfies_heap_property()).await);
                    seen.extend(batch.into_iter().map(|e| e.id()));
                    tokio::task::yield_now().await;
                }
                seen
            }));
        }

        let mut registered = HashSet::new();
        for p in producers {
            registered.extend(p.await.unwrap());
        }
        let mut extracted = Vec::new();
        for d in drainers {
            extracted.extend(d.await.unwrap());
        }
        extracted.extend(handle.drain_due_now(clock.as_ref()).await.into_iter().map(|e| e.id()));

        let unique: HashSet<_> = extracted.iter().copied().collect();
        assert_eq!(extracted.len(), unique.len(), "an entry was extracted twice");
        assert_eq!(unique, registered);
        assert_eq!(registered.len() as u64, PRODUCERS * PER_PRODUCER);
        assert_eq!(handle.pending().await, 0);
    }
}

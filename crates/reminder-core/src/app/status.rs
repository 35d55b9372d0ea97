//! Status - スケジューラの観測用ビュー

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Counters shared between the loop and its in-flight deliveries.
#[derive(Debug, Default)]
pub struct DispatchCounters {
    ticks: AtomicU64,
    dispatched: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl DispatchCounters {
    pub(crate) fn record_tick(&self, dispatched: usize) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        self.dispatched
            .fetch_add(dispatched as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time view of the scheduler.
///
/// `dispatched - delivered - failed` deliveries are still in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerStatus {
    pub pending: usize,
    pub next_due: Option<DateTime<Utc>>,
    pub ticks: u64,
    pub dispatched: u64,
    pub delivered: u64,
    pub failed: u64,
}

impl SchedulerStatus {
    pub(crate) fn new(
        pending: usize,
        next_due: Option<DateTime<Utc>>,
        counters: &DispatchCounters,
    ) -> Self {
        Self {
            pending,
            next_due,
            ticks: counters.ticks.load(Ordering::Relaxed),
            dispatched: counters.dispatched.load(Ordering::Relaxed),
            delivered: counters.delivered.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
        }
    }

    pub fn in_flight(&self) -> u64 {
        self.dispatched
            .saturating_sub(self.delivered)
            .saturating_sub(self.failed)
    }
}

//! SchedulerBuilder - スケジューラの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Semaphore;

use super::scheduler_loop::{RunningScheduler, SchedulerLoop};
use super::status::{DispatchCounters, SchedulerStatus};
use crate::config::{MAX_TICK_INTERVAL_SECS, SchedulerConfig};
use crate::ports::{Clock, IdGenerator, Notifier, SystemClock, UlidGenerator};
use crate::queue::{ScheduleHandle, TimeOrderedQueue};

/// SchedulerBuilder はスケジューラを構築
///
/// # 使用例
/// ```ignore
/// let scheduler = SchedulerBuilder::new()
///     .config(SchedulerConfig::load()?)
///     .notifier(Arc::new(LogNotifier::new()))
///     .build()?;
/// let running = scheduler.spawn()?;
/// ```
///
/// # Fail-fast 設計
/// - notifier が無ければ BuildError::MissingNotifier
/// - tick_interval / max_concurrent_deliveries が 0 または上限超えなら BuildError::InvalidConfig
#[derive(Default)]
pub struct SchedulerBuilder {
    config: SchedulerConfig,
    clock: Option<Arc<dyn Clock>>,
    notifier: Option<Arc<dyn Notifier>>,
    id_generator: Option<Arc<dyn IdGenerator>>,
}

/// BuildError はスケジューラ構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no notifier configured; reminders would have nowhere to go")]
    MissingNotifier,

    #[error("invalid scheduler config: {0}")]
    InvalidConfig(&'static str),
}

/// SpawnError は drain ループ起動時のエラー
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error("the drain loop for this scheduler has already been started")]
    AlreadyStarted,
}

impl SchedulerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Defaults to a [`UlidGenerator`] on the wall clock.
    pub fn id_generator(mut self, id_generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = Some(id_generator);
        self
    }

    pub fn build(self) -> Result<Scheduler, BuildError> {
        if self.config.tick_interval_secs == 0 {
            return Err(BuildError::InvalidConfig("tick_interval_secs must be positive"));
        }
        if self.config.tick_interval_secs > MAX_TICK_INTERVAL_SECS {
            return Err(BuildError::InvalidConfig(
                "tick_interval_secs must not exceed one week",
            ));
        }
        if self.config.max_concurrent_deliveries == 0 {
            return Err(BuildError::InvalidConfig(
                "max_concurrent_deliveries must be positive",
            ));
        }
        if self.config.max_concurrent_deliveries > Semaphore::MAX_PERMITS {
            return Err(BuildError::InvalidConfig(
                "max_concurrent_deliveries exceeds the semaphore permit limit",
            ));
        }
        let notifier = self.notifier.ok_or(BuildError::MissingNotifier)?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let id_generator = self
            .id_generator
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(SystemClock)));

        let handle = ScheduleHandle::new(
            TimeOrderedQueue::with_capacity(self.config.initial_capacity),
            id_generator,
        );

        Ok(Scheduler {
            handle,
            clock,
            notifier,
            config: self.config,
            counters: Arc::new(DispatchCounters::default()),
            loop_started: AtomicBool::new(false),
        })
    }
}

/// Scheduler は queue・clock・notifier を束ねたもの
///
/// - `handle()` を登録側（HTTP ハンドラなど）に配る
/// - `spawn()` でバックグラウンドの drain ループを起動する（1 回だけ）
pub struct Scheduler {
    handle: ScheduleHandle,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    config: SchedulerConfig,
    counters: Arc<DispatchCounters>,
    loop_started: AtomicBool,
}

impl Scheduler {
    pub fn handle(&self) -> ScheduleHandle {
        self.handle.clone()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// The single loop over this scheduler's queue; later calls get `AlreadyStarted`.
    pub(crate) fn scheduler_loop(&self) -> Result<SchedulerLoop, SpawnError> {
        if self.loop_started.swap(true, Ordering::AcqRel) {
            return Err(SpawnError::AlreadyStarted);
        }
        Ok(SchedulerLoop::new(
            self.handle.clone(),
            Arc::clone(&self.clock),
            Arc::clone(&self.notifier),
            &self.config,
            Arc::clone(&self.counters),
        ))
    }

    /// Start the drain loop. Only the first call succeeds.
    pub fn spawn(&self) -> Result<RunningScheduler, SpawnError> {
        Ok(self.scheduler_loop()?.spawn())
    }

    pub async fn status(&self) -> SchedulerStatus {
        let pending = self.handle.pending().await;
        let next_due = self.handle.next_due().await;
        SchedulerStatus::new(pending, next_due, &self.counters)
    }
}

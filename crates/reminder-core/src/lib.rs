//! reminder-core
//!
//! In-process engine for deferred notifications: callers register
//! "remind at time T" entries, and one background loop periodically drains
//! every entry whose time has passed and hands each to a [`ports::Notifier`].
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ScheduledEntry, ids, message, errors）
//! - **ports**: 抽象化レイヤー（Clock, IdGenerator, Notifier）
//! - **queue**: TimeOrderedQueue（min-heap）と ScheduleHandle（ロック付き共有ハンドル）
//! - **app**: SchedulerBuilder, SchedulerLoop, status
//! - **impls**: Notifier 実装（LogNotifier, InMemoryNotifier）
//! - **config**: SchedulerConfig（環境変数で上書き可能）
//!
//! # 配送の保証
//! best-effort / at-most-once。キューはメモリ上のみで、プロセス終了時に
//! 残っているエントリは失われる。

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod queue;

pub use app::{Scheduler, SchedulerBuilder};
pub use config::SchedulerConfig;

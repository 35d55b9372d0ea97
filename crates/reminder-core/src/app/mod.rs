//! App - アプリケーション層
//!
//! ports と queue を組み合わせてスケジューラを動かします。
//!
//! # 主要コンポーネント
//! - **SchedulerBuilder / Scheduler**: 構築とワイヤリング
//! - **SchedulerLoop**: 定期 drain と配送の fan-out
//! - **SchedulerStatus**: 観測用のスナップショット

pub mod builder;
pub mod scheduler_loop;
pub mod status;

pub use self::builder::{BuildError, Scheduler, SchedulerBuilder, SpawnError};
pub use self::scheduler_loop::{RunningScheduler, SchedulerLoop};
pub use self::status::{DispatchCounters, SchedulerStatus};

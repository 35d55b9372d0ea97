//! Ports - 抽象化レイヤー
//!
//! スケジューラが外部に依存する 3 つの境界（時刻・ID・配送）を trait として定義します。
//! キャンセルは `tokio::sync::watch` をそのまま使うので port は持ちません。

pub mod clock;
pub mod id_generator;
pub mod notifier;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::notifier::Notifier;

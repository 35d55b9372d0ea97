//! Impls - Notifier の実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **LogNotifier**: tracing に出力するだけの配送
//! - **InMemoryNotifier**: 配送を記録し、失敗を注入できる
//!
//! メールなど本番用の配送は呼び出し側が `Notifier` を実装して差し込む。

pub mod inmem_notifier;
pub mod log_notifier;

pub use self::inmem_notifier::{Delivery, InMemoryNotifier};
pub use self::log_notifier::LogNotifier;

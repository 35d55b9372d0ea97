//! Errors - エラー型と分類
//!
//! スケジューラ内部に致命的なエラーはない。失敗はすべて 1 件の配送か、
//! 登録前の入力検証か、起動時の設定読み込みに閉じている。

use thiserror::Error;

/// Failure reported by a [`Notifier`](crate::ports::Notifier).
///
/// The scheduler only logs it; the entry is dropped either way.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("recipient rejected: {0}")]
    Rejected(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("{0}")]
    Other(String),
}

/// Invalid registration input, caught by the caller before `register`.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("invalid due time {input:?}: {source}")]
    InvalidDueTime {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("invalid payload id {0:?}")]
    InvalidPayloadId(String),
}

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load scheduler config: {0}")]
    Load(#[from] config::ConfigError),
}

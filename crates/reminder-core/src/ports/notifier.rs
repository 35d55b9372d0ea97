//! Notifier port - 配送アクションの抽象化
//!
//! 期限が来たエントリ 1 件につき 1 回呼ばれる。結果はログに残すだけで、
//! スケジューラ側はリトライも再登録もしない（at-most-once）。

use async_trait::async_trait;

use crate::domain::{DeliveryError, PayloadId, Recipient};

/// Notifier は 1 件のリマインダーを受信者に届ける
///
/// # 設計原則
/// - 他の配送や次の tick をブロックしない（スケジューラが独立タスクで呼ぶ）
/// - 失敗は `DeliveryError` で返す。panic は自分のタスクだけを落とす
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        recipient: &Recipient,
        payload_id: &PayloadId,
    ) -> Result<(), DeliveryError>;
}

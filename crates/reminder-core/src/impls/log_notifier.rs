//! LogNotifier - 配送先をログに置き換えた Notifier
//!
//! 外部のメール送信サービスがない開発環境で使う。常に成功する。

use async_trait::async_trait;
use tracing::info;

use crate::domain::{DeliveryError, PayloadId, Recipient, ReminderMessage};
use crate::ports::Notifier;

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        recipient: &Recipient,
        payload_id: &PayloadId,
    ) -> Result<(), DeliveryError> {
        let message = ReminderMessage::for_entry(recipient, payload_id);
        info!(
            to_name = %message.to_name,
            to_address = %message.to_address,
            subject = %message.subject,
            body = %message.body,
            "reminder sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        let notifier = LogNotifier::new();
        let result = notifier
            .notify(&Recipient::new("ana", "ana@example.com"), &PayloadId::from(1u64))
            .await;
        assert!(result.is_ok());
    }
}

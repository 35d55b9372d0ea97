//! InMemoryNotifier - 開発・テスト用の Notifier
//!
//! # 学習ポイント
//! - Notify による「n 件届くまで待つ」
//! - 受信者アドレス単位の失敗注入

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use crate::domain::{DeliveryError, PayloadId, Recipient};
use crate::ports::Notifier;

/// One successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub recipient: Recipient,
    pub payload_id: PayloadId,
}

/// Records deliveries instead of sending them.
///
/// # 使用例
/// ```ignore
/// let notifier = Arc::new(InMemoryNotifier::new());
/// notifier.fail_for("bounce@example.com").await;
/// assert!(notifier.wait_for_attempts(3, Duration::from_secs(1)).await);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryNotifier {
    deliveries: Mutex<Vec<Delivery>>,
    failing: Mutex<HashSet<String>>,
    attempts: AtomicUsize,
    attempted: Notify,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every future delivery to `address`.
    pub async fn fail_for(&self, address: impl Into<String>) {
        self.failing.lock().await.insert(address.into());
    }

    /// Successful deliveries, in completion order.
    pub async fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().await.clone()
    }

    /// Successful and failed attempts so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Wait until at least `n` attempts were made. `false` on timeout.
    pub async fn wait_for_attempts(&self, n: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let notified = self.attempted.notified();
            tokio::pin!(notified);
            // register before checking so a concurrent attempt is not missed
            notified.as_mut().enable();

            if self.attempts() >= n {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.attempts() >= n;
            }
        }
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn notify(
        &self,
        recipient: &Recipient,
        payload_id: &PayloadId,
    ) -> Result<(), DeliveryError> {
        let rejected = self.failing.lock().await.contains(&recipient.address);
        let result = if rejected {
            Err(DeliveryError::Rejected(recipient.address.clone()))
        } else {
            self.deliveries.lock().await.push(Delivery {
                recipient: recipient.clone(),
                payload_id: payload_id.clone(),
            });
            Ok(())
        };

        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.attempted.notify_waiters();
        result
    }
}

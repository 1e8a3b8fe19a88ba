use crate::config::PollPolicy;
use crate::domain::payment::{PaymentRecord, PaymentStatus, Provider, TransactionStatus};
use crate::error::PaymentError;
use crate::gateways::PaymentGateway;
use crate::repo::payment_records_repo::PaymentRecordsRepo;
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollDirective {
    Complete,
    Fail(String),
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Completed,
    Failed,
    TimedOut,
    Cancelled,
    /// The record disappeared or was already resolved elsewhere.
    Abandoned,
}

/// Transport and status-check errors are transient: they never end the loop.
pub fn classify_poll_result(result: &Result<TransactionStatus, PaymentError>) -> PollDirective {
    match result {
        Ok(status) => classify_status(status),
        Err(_) => PollDirective::Continue,
    }
}

pub fn classify_status(status: &TransactionStatus) -> PollDirective {
    match status.status {
        PaymentStatus::Completed => PollDirective::Complete,
        PaymentStatus::Failed => PollDirective::Fail(
            status
                .message
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "Payment failed".to_string()),
        ),
        PaymentStatus::Pending => PollDirective::Continue,
    }
}

pub struct StatusPoller {
    pub gateway: Arc<dyn PaymentGateway>,
    pub records: PaymentRecordsRepo,
    pub policy: PollPolicy,
    pub record_id: Uuid,
    pub transaction_id: String,
    pub provider: Provider,
}

impl StatusPoller {
    pub async fn run(self, mut cancel: watch::Receiver<bool>) -> PollOutcome {
        let max_attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let result = tokio::select! {
                r = self.gateway.check_status(&self.transaction_id, self.provider) => r,
                _ = cancelled(&mut cancel) => return self.on_cancel(),
            };

            match classify_poll_result(&result) {
                PollDirective::Complete => {
                    return self.finish(|r| r.complete(), PollOutcome::Completed).await;
                }
                PollDirective::Fail(reason) => {
                    return self.finish(move |r| r.fail(reason), PollOutcome::Failed).await;
                }
                PollDirective::Continue => {
                    if let Err(e) = &result {
                        tracing::warn!(
                            "status check {}/{} for transaction {} failed: {}",
                            attempt,
                            max_attempts,
                            self.transaction_id,
                            e
                        );
                    }
                }
            }

            if attempt < max_attempts {
                tokio::select! {
                    _ = tokio::time::sleep(self.policy.interval) => {}
                    _ = cancelled(&mut cancel) => return self.on_cancel(),
                }
            }
        }

        tracing::warn!(
            "transaction {} still pending after {} status checks",
            self.transaction_id,
            max_attempts
        );
        self.finish(|r| r.fail(PaymentError::Timeout.to_string()), PollOutcome::TimedOut)
            .await
    }

    async fn finish<F>(&self, change: F, outcome: PollOutcome) -> PollOutcome
    where
        F: FnOnce(&mut PaymentRecord) -> Result<(), PaymentError>,
    {
        match self.records.update(self.record_id, change).await {
            Ok(record) => {
                tracing::info!(
                    "payment {} (transaction {}) resolved as {:?}",
                    record.id,
                    self.transaction_id,
                    record.status
                );
                outcome
            }
            Err(e @ PaymentError::InvalidTransition { .. }) => {
                tracing::info!("payment {} already resolved: {}", self.record_id, e);
                PollOutcome::Abandoned
            }
            Err(e) => {
                tracing::error!("could not resolve payment {}: {}", self.record_id, e);
                PollOutcome::Abandoned
            }
        }
    }

    fn on_cancel(&self) -> PollOutcome {
        tracing::info!("status polling for transaction {} cancelled", self.transaction_id);
        PollOutcome::Cancelled
    }
}

async fn cancelled(rx: &mut watch::Receiver<bool>) {
    // A dropped sender means nobody can cancel any more.
    let sender_gone = rx.wait_for(|flag| *flag).await.is_err();
    if sender_gone {
        std::future::pending::<()>().await;
    }
}

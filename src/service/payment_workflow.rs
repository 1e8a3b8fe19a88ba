use crate::config::PollPolicy;
use crate::domain::payment::{
    InitiatePaymentRequest, InitiatedPayment, PaymentDetails, PaymentRecord, PaymentStatus,
    Provider,
};
use crate::domain::phone::{format_phone_number, validate_phone_number};
use crate::error::PaymentError;
use crate::gateways::PaymentGateway;
use crate::repo::payment_records_repo::PaymentRecordsRepo;
use crate::service::status_poller::{classify_status, PollDirective, StatusPoller};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{broadcast, watch};
use uuid::Uuid;

type PollerMap = HashMap<String, (u64, watch::Sender<bool>)>;

/// Drives one payment from validation through initiation and background
/// status polling. Cloning shares the record history and poller registry.
#[derive(Clone)]
pub struct PaymentWorkflow {
    pub gateway: Arc<dyn PaymentGateway>,
    pub records: PaymentRecordsRepo,
    pub poll_policy: PollPolicy,
    pub currency: String,
    pollers: Arc<Mutex<PollerMap>>,
    poller_seq: Arc<AtomicU64>,
}

impl PaymentWorkflow {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        records: PaymentRecordsRepo,
        poll_policy: PollPolicy,
        currency: &str,
    ) -> Self {
        Self {
            gateway,
            records,
            poll_policy,
            currency: currency.to_string(),
            pollers: Arc::new(Mutex::new(HashMap::new())),
            poller_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Validates, records and submits a payment. Returns as soon as the
    /// provider answers the initiation; the final status lands on the record
    /// later.
    pub async fn initiate_payment(
        &self,
        req: InitiatePaymentRequest,
    ) -> Result<InitiatedPayment, PaymentError> {
        if req.amount <= 0 {
            return Err(PaymentError::Validation(
                "Amount must be greater than 0".to_string(),
            ));
        }
        if !validate_phone_number(&req.phone_number, req.provider) {
            return Err(PaymentError::Validation(
                "Invalid phone number for selected provider".to_string(),
            ));
        }
        let phone_number = format_phone_number(&req.phone_number)?;

        let record = self
            .records
            .insert(PaymentRecord::new(
                req.amount,
                &self.currency,
                phone_number,
                req.provider,
                &req.description,
            ))
            .await?;
        tracing::info!(
            "payment {} created: {} {} via {}",
            record.id,
            record.amount,
            record.currency,
            record.provider
        );

        let details = PaymentDetails {
            amount: record.amount,
            currency: record.currency.clone(),
            phone_number: record.phone_number.clone(),
            provider: record.provider,
            description: record.description.clone(),
            reference: record.id.to_string(),
        };
        let result = self.gateway.initiate(&details).await;

        match (result.success, result.transaction_id.clone()) {
            (true, Some(transaction_id)) => {
                self.records
                    .update(record.id, |r| r.attach_transaction(transaction_id.clone()))
                    .await?;
                if let Err(e) = self.start_polling(record.id, &transaction_id, record.provider) {
                    tracing::warn!(
                        "payment {} accepted as transaction {} but cannot be polled: {}",
                        record.id,
                        transaction_id,
                        e
                    );
                    self.records.update(record.id, |r| r.fail(e.to_string())).await?;
                }
            }
            _ => {
                let reason = result
                    .error
                    .clone()
                    .unwrap_or_else(|| "Payment initiation failed".to_string());
                tracing::warn!("payment {} rejected at initiation: {}", record.id, reason);
                self.records.update(record.id, |r| r.fail(reason)).await?;
            }
        }

        Ok(InitiatedPayment {
            record_id: record.id,
            result,
        })
    }

    /// Spawns the background poll for a transaction. Refuses to run two
    /// pollers for the same transaction id.
    pub fn start_polling(
        &self,
        record_id: Uuid,
        transaction_id: &str,
        provider: Provider,
    ) -> Result<(), PaymentError> {
        let seq = self.poller_seq.fetch_add(1, Ordering::SeqCst);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        {
            let mut pollers = self.lock_pollers();
            if pollers.contains_key(transaction_id) {
                return Err(PaymentError::PollingAlreadyActive(transaction_id.to_string()));
            }
            pollers.insert(transaction_id.to_string(), (seq, cancel_tx));
        }

        let poller = StatusPoller {
            gateway: self.gateway.clone(),
            records: self.records.clone(),
            policy: self.poll_policy,
            record_id,
            transaction_id: transaction_id.to_string(),
            provider,
        };
        let registry = self.pollers.clone();
        let key = transaction_id.to_string();
        tokio::spawn(async move {
            let outcome = poller.run(cancel_rx).await;
            tracing::debug!("poller for transaction {} finished: {:?}", key, outcome);
            let mut pollers = registry.lock().unwrap_or_else(|p| p.into_inner());
            if matches!(pollers.get(&key), Some((owner, _)) if *owner == seq) {
                pollers.remove(&key);
            }
        });

        Ok(())
    }

    /// Restarts polling for a pending record, e.g. after a cancelled poll.
    pub async fn resume_polling(&self, record_id: Uuid) -> Result<(), PaymentError> {
        let record = self.pending_with_transaction(record_id).await?;
        let transaction_id = record.transaction_id.unwrap_or_default();
        self.start_polling(record.id, &transaction_id, record.provider)
    }

    /// Stops the poller for a transaction. The record stays PENDING.
    pub fn cancel_polling(&self, transaction_id: &str) -> bool {
        match self.lock_pollers().remove(transaction_id) {
            Some((_, cancel_tx)) => {
                let _ = cancel_tx.send(true);
                true
            }
            None => false,
        }
    }

    pub async fn cancel_polling_for(&self, record_id: Uuid) -> Result<bool, PaymentError> {
        let record = self
            .records
            .get(record_id)
            .await
            .ok_or_else(|| PaymentError::NotFound(record_id.to_string()))?;
        Ok(record
            .transaction_id
            .as_deref()
            .map(|tx| self.cancel_polling(tx))
            .unwrap_or(false))
    }

    pub fn is_polling(&self, transaction_id: &str) -> bool {
        self.lock_pollers().contains_key(transaction_id)
    }

    /// One-shot status check outside the polling loop. Terminal answers
    /// resolve the record; pending answers leave it as is.
    pub async fn verify_payment(&self, record_id: Uuid) -> Result<PaymentRecord, PaymentError> {
        let record = self
            .records
            .get(record_id)
            .await
            .ok_or_else(|| PaymentError::NotFound(record_id.to_string()))?;
        if record.status.is_terminal() {
            return Ok(record);
        }
        let record = self.pending_with_transaction(record_id).await?;
        let transaction_id = record.transaction_id.clone().unwrap_or_default();

        let status = self
            .gateway
            .check_status(&transaction_id, record.provider)
            .await?;

        let updated = match classify_status(&status) {
            PollDirective::Complete => self.records.update(record.id, |r| r.complete()).await,
            PollDirective::Fail(reason) => self.records.update(record.id, |r| r.fail(reason)).await,
            PollDirective::Continue => return Ok(record),
        };

        match updated {
            Ok(resolved) => {
                self.cancel_polling(&transaction_id);
                tracing::info!("payment {} verified as {:?}", resolved.id, resolved.status);
                Ok(resolved)
            }
            Err(PaymentError::InvalidTransition { .. }) => self
                .records
                .get(record_id)
                .await
                .ok_or_else(|| PaymentError::NotFound(record_id.to_string())),
            Err(e) => Err(e),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PaymentRecord> {
        self.records.subscribe()
    }

    /// Resolves once the record reaches COMPLETED or FAILED.
    pub async fn wait_for_terminal(&self, record_id: Uuid) -> Result<PaymentRecord, PaymentError> {
        let mut rx = self.records.subscribe();
        loop {
            let record = self
                .records
                .get(record_id)
                .await
                .ok_or_else(|| PaymentError::NotFound(record_id.to_string()))?;
            if record.status.is_terminal() {
                return Ok(record);
            }

            match rx.recv().await {
                Ok(update) if update.id == record_id && update.status.is_terminal() => {
                    return Ok(update)
                }
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return Ok(record),
            }
        }
    }

    async fn pending_with_transaction(&self, record_id: Uuid) -> Result<PaymentRecord, PaymentError> {
        let record = self
            .records
            .get(record_id)
            .await
            .ok_or_else(|| PaymentError::NotFound(record_id.to_string()))?;
        if record.status != PaymentStatus::Pending {
            return Err(PaymentError::InvalidTransition {
                from: record.status,
                to: PaymentStatus::Pending,
            });
        }
        if record.transaction_id.is_none() {
            return Err(PaymentError::Validation(format!(
                "payment {} has no provider transaction",
                record.id
            )));
        }
        Ok(record)
    }

    fn lock_pollers(&self) -> MutexGuard<'_, PollerMap> {
        self.pollers.lock().unwrap_or_else(|p| p.into_inner())
    }
}

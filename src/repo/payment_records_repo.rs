use crate::domain::payment::{PaymentRecord, PaymentStatus};
use crate::error::PaymentError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

const EVENT_CAPACITY: usize = 256;

/// Append-only payment history. Every insert or update is broadcast as an
/// immutable copy of the record.
#[derive(Clone)]
pub struct PaymentRecordsRepo {
    inner: Arc<RwLock<RecordsState>>,
    events: broadcast::Sender<PaymentRecord>,
}

#[derive(Default)]
struct RecordsState {
    records: Vec<PaymentRecord>,
    current: Option<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordsSnapshot {
    pub payments: Vec<PaymentRecord>,
    pub current_payment: Option<Uuid>,
}

impl Default for PaymentRecordsRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentRecordsRepo {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(RwLock::new(RecordsState::default())),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PaymentRecord> {
        self.events.subscribe()
    }

    /// Appends the record and makes it the current one.
    pub async fn insert(&self, record: PaymentRecord) -> Result<PaymentRecord, PaymentError> {
        let mut state = self.inner.write().await;
        if state.records.iter().any(|r| r.id == record.id) {
            return Err(PaymentError::Validation(format!(
                "payment {} already recorded",
                record.id
            )));
        }
        state.current = Some(record.id);
        state.records.push(record.clone());
        let _ = self.events.send(record.clone());
        Ok(record)
    }

    pub async fn get(&self, id: Uuid) -> Option<PaymentRecord> {
        let state = self.inner.read().await;
        state.records.iter().find(|r| r.id == id).cloned()
    }

    pub async fn list(&self) -> Vec<PaymentRecord> {
        self.inner.read().await.records.clone()
    }

    pub async fn list_by_status(&self, status: PaymentStatus) -> Vec<PaymentRecord> {
        let state = self.inner.read().await;
        state
            .records
            .iter()
            .filter(|r| r.status == status)
            .cloned()
            .collect()
    }

    pub async fn current(&self) -> Option<PaymentRecord> {
        let state = self.inner.read().await;
        let id = state.current?;
        state.records.iter().find(|r| r.id == id).cloned()
    }

    /// Applies `change` to a copy of the record and commits it only if the
    /// change succeeds.
    pub async fn update<F>(&self, id: Uuid, change: F) -> Result<PaymentRecord, PaymentError>
    where
        F: FnOnce(&mut PaymentRecord) -> Result<(), PaymentError>,
    {
        let mut state = self.inner.write().await;
        let slot = state
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| PaymentError::NotFound(id.to_string()))?;

        let mut next = slot.clone();
        change(&mut next)?;
        *slot = next.clone();
        let _ = self.events.send(next.clone());
        Ok(next)
    }

    pub async fn snapshot(&self) -> RecordsSnapshot {
        let state = self.inner.read().await;
        RecordsSnapshot {
            payments: state.records.clone(),
            current_payment: state.current,
        }
    }

    pub async fn restore(&self, snapshot: RecordsSnapshot) {
        let mut state = self.inner.write().await;
        state.current = snapshot
            .current_payment
            .filter(|id| snapshot.payments.iter().any(|r| r.id == *id));
        state.records = snapshot.payments;
    }

    pub async fn reset(&self) {
        let mut state = self.inner.write().await;
        state.records.clear();
        state.current = None;
    }
}

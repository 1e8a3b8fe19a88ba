use crate::error::PaymentError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Provider {
    Mtn,
    Airtel,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Mtn => "MTN",
            Provider::Airtel => "AIRTEL",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

/// Local record of one payment attempt. Serializes to plain JSON so callers
/// can snapshot the history to device storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub amount: i64,
    pub currency: String,
    pub phone_number: String,
    pub provider: Provider,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub error: Option<String>,
    pub description: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl PaymentRecord {
    pub fn new(
        amount: i64,
        currency: &str,
        phone_number: String,
        provider: Provider,
        description: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount,
            currency: currency.to_string(),
            phone_number,
            provider,
            status: PaymentStatus::Pending,
            transaction_id: None,
            error: None,
            description: description.to_string(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn attach_transaction(&mut self, transaction_id: String) -> Result<(), PaymentError> {
        if self.status.is_terminal() {
            return Err(PaymentError::InvalidTransition {
                from: self.status,
                to: PaymentStatus::Pending,
            });
        }
        match &self.transaction_id {
            Some(existing) if existing != &transaction_id => Err(PaymentError::Validation(format!(
                "payment {} already has transaction {}",
                self.id, existing
            ))),
            _ => {
                self.transaction_id = Some(transaction_id);
                Ok(())
            }
        }
    }

    pub fn complete(&mut self) -> Result<(), PaymentError> {
        self.transition(PaymentStatus::Completed, None)
    }

    pub fn fail(&mut self, error: String) -> Result<(), PaymentError> {
        self.transition(PaymentStatus::Failed, Some(error))
    }

    fn transition(&mut self, to: PaymentStatus, error: Option<String>) -> Result<(), PaymentError> {
        if self.status.is_terminal() || to == PaymentStatus::Pending {
            return Err(PaymentError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.error = error;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InitiatePaymentRequest {
    pub amount: i64,
    pub phone_number: String,
    pub provider: Provider,
    pub description: String,
}

/// What the gateway client needs to submit one payment.
#[derive(Debug, Clone)]
pub struct PaymentDetails {
    pub amount: i64,
    pub currency: String,
    pub phone_number: String,
    pub provider: Provider,
    pub description: String,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitiationResult {
    pub success: bool,
    pub transaction_id: Option<String>,
    pub status: PaymentStatus,
    pub error: Option<String>,
}

impl InitiationResult {
    pub fn accepted(transaction_id: String) -> Self {
        Self {
            success: true,
            transaction_id: Some(transaction_id),
            status: PaymentStatus::Pending,
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            transaction_id: None,
            status: PaymentStatus::Failed,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InitiatedPayment {
    pub record_id: Uuid,
    pub result: InitiationResult,
}

/// Provider view of a transaction, already mapped to the canonical status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionStatus {
    pub transaction_id: String,
    pub status: PaymentStatus,
    pub amount: Option<i64>,
    pub currency: Option<String>,
    pub timestamp: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl From<&PaymentError> for ErrorEnvelope {
    fn from(err: &PaymentError) -> Self {
        ErrorEnvelope {
            error: ErrorPayload {
                code: err.code().to_string(),
                message: err.to_string(),
                details: None,
            },
        }
    }
}

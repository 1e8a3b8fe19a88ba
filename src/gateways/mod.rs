use crate::domain::payment::{InitiationResult, PaymentDetails, PaymentStatus, Provider, TransactionStatus};
use crate::error::PaymentError;
use serde_json::Value;

pub mod airtel;
pub mod client;
pub mod mock;
pub mod mtn;
pub mod token_cache;

/// Transport adapter to the mobile-money providers. The workflow only talks
/// to this trait so tests can swap in [`mock::MockGateway`].
#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    fn name(&self) -> &'static str;

    async fn authenticate(&self, provider: Provider) -> Result<String, PaymentError>;

    /// Never fails outright: token, transport and provider errors come back
    /// as a rejected [`InitiationResult`].
    async fn initiate(&self, details: &PaymentDetails) -> InitiationResult;

    async fn check_status(
        &self,
        transaction_id: &str,
        provider: Provider,
    ) -> Result<TransactionStatus, PaymentError>;
}

pub fn map_status(provider: Provider, raw: &str) -> PaymentStatus {
    let raw = raw.trim().to_ascii_uppercase();
    let completed: &[&str] = match provider {
        Provider::Mtn => &["SUCCESSFUL", "COMPLETED"],
        Provider::Airtel => &["SUCCESS", "SUCCESSFUL"],
    };
    if completed.contains(&raw.as_str()) {
        PaymentStatus::Completed
    } else if raw == "FAILED" || raw == "REJECTED" {
        PaymentStatus::Failed
    } else {
        PaymentStatus::Pending
    }
}

pub(crate) fn error_message(body: &Value, fallback: &str) -> String {
    ["message", "error_description", "error"]
        .iter()
        .find_map(|key| match body.get(*key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Object(inner)) => inner
                .get("message")
                .and_then(|m| m.as_str())
                .map(ToString::to_string),
            _ => None,
        })
        .unwrap_or_else(|| fallback.to_string())
}

pub(crate) fn transaction_ref(body: &Value) -> Option<String> {
    body.get("transactionId")
        .or_else(|| body.get("referenceId"))
        .or_else(|| body.pointer("/transaction/id"))
        .or_else(|| body.pointer("/data/transaction/id"))
        .or_else(|| body.get("id"))
        .and_then(scalar_to_string)
}

pub(crate) fn parse_status_body(transaction_id: &str, provider: Provider, body: &Value) -> TransactionStatus {
    let raw_status = body
        .get("status")
        .or_else(|| body.pointer("/data/transaction/status"))
        .and_then(|s| s.as_str())
        .unwrap_or("");

    TransactionStatus {
        transaction_id: transaction_id.to_string(),
        status: map_status(provider, raw_status),
        amount: body.get("amount").and_then(parse_amount),
        currency: body.get("currency").and_then(|c| c.as_str()).map(ToString::to_string),
        timestamp: body
            .get("timestamp")
            .or_else(|| body.get("createdAt"))
            .and_then(|t| t.as_str())
            .map(ToString::to_string),
        message: ["message", "statusMessage", "reason"]
            .iter()
            .find_map(|key| body.get(*key).and_then(|m| m.as_str()))
            .map(ToString::to_string),
    }
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// Providers report amounts as either JSON numbers or decimal strings.
fn parse_amount(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .ok()
            .or_else(|| s.trim().parse::<f64>().ok().map(|f| f as i64)),
        _ => None,
    }
}

use crate::domain::payment::PaymentStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("{0}")]
    Validation(String),
    #[error("{provider} authentication failed: {message}")]
    Auth { provider: String, message: String },
    #[error("{message}")]
    Gateway { status: Option<u16>, message: String },
    #[error("Failed to check transaction status: {0}")]
    StatusCheck(String),
    #[error("{0}")]
    Format(String),
    #[error("Payment verification timeout")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("payment {0} not found")]
    NotFound(String),
    #[error("status polling already active for transaction {0}")]
    PollingAlreadyActive(String),
    #[error("cannot move payment from {from:?} to {to:?}")]
    InvalidTransition { from: PaymentStatus, to: PaymentStatus },
}

impl PaymentError {
    pub fn code(&self) -> &'static str {
        match self {
            PaymentError::Validation(_) => "VALIDATION_ERROR",
            PaymentError::Auth { .. } => "AUTH_ERROR",
            PaymentError::Gateway { .. } => "GATEWAY_ERROR",
            PaymentError::StatusCheck(_) => "STATUS_CHECK_ERROR",
            PaymentError::Format(_) => "FORMAT_ERROR",
            PaymentError::Timeout => "TIMEOUT",
            PaymentError::Transport(_) => "TRANSPORT_ERROR",
            PaymentError::NotFound(_) => "NOT_FOUND",
            PaymentError::PollingAlreadyActive(_) => "POLLING_ALREADY_ACTIVE",
            PaymentError::InvalidTransition { .. } => "INVALID_TRANSITION",
        }
    }

    pub fn http_status(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            PaymentError::Validation(_) | PaymentError::Format(_) => StatusCode::BAD_REQUEST,
            PaymentError::NotFound(_) => StatusCode::NOT_FOUND,
            PaymentError::PollingAlreadyActive(_) | PaymentError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            PaymentError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            PaymentError::Auth { .. }
            | PaymentError::Gateway { .. }
            | PaymentError::StatusCheck(_)
            | PaymentError::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

use crate::domain::payment::{ErrorEnvelope, InitiatePaymentRequest, PaymentStatus};
use crate::error::PaymentError;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

fn error_response(err: &PaymentError) -> Response {
    (err.http_status(), Json(ErrorEnvelope::from(err))).into_response()
}

pub async fn create_payment(
    State(state): State<AppState>,
    Json(req): Json<InitiatePaymentRequest>,
) -> impl IntoResponse {
    match state.workflow.initiate_payment(req).await {
        Ok(resp) => (axum::http::StatusCode::ACCEPTED, Json(resp)).into_response(),
        Err(e) => error_response(&e),
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<PaymentStatus>,
}

pub async fn list_payments(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let records = match query.status {
        Some(status) => state.workflow.records.list_by_status(status).await,
        None => state.workflow.records.list().await,
    };
    (axum::http::StatusCode::OK, Json(records)).into_response()
}

pub async fn current_payment(State(state): State<AppState>) -> impl IntoResponse {
    match state.workflow.records.current().await {
        Some(record) => (axum::http::StatusCode::OK, Json(record)).into_response(),
        None => error_response(&PaymentError::NotFound("current".to_string())),
    }
}

pub async fn get_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.workflow.records.get(payment_id).await {
        Some(record) => (axum::http::StatusCode::OK, Json(record)).into_response(),
        None => error_response(&PaymentError::NotFound(payment_id.to_string())),
    }
}

pub async fn verify_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.workflow.verify_payment(payment_id).await {
        Ok(record) => (axum::http::StatusCode::OK, Json(record)).into_response(),
        Err(e) => error_response(&e),
    }
}

pub async fn resume_polling(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.workflow.resume_polling(payment_id).await {
        Ok(()) => (
            axum::http::StatusCode::ACCEPTED,
            Json(serde_json::json!({"payment_id": payment_id, "polling": true})),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

pub async fn cancel_polling(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.workflow.cancel_polling_for(payment_id).await {
        Ok(cancelled) => (
            axum::http::StatusCode::OK,
            Json(serde_json::json!({"payment_id": payment_id, "cancelled": cancelled})),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

pub async fn health() -> impl IntoResponse {
    (axum::http::StatusCode::OK, "ok")
}

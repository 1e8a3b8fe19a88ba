pub mod config;
pub mod domain {
    pub mod payment;
    pub mod phone;
}
pub mod error;
pub mod gateways;
pub mod http {
    pub mod handlers {
        pub mod payments;
    }
}
pub mod repo {
    pub mod payment_records_repo;
}
pub mod service {
    pub mod payment_workflow;
    pub mod status_poller;
}

use axum::routing::{get, post};
use axum::Router;

#[derive(Clone)]
pub struct AppState {
    pub workflow: service::payment_workflow::PaymentWorkflow,
}

pub fn router(state: AppState) -> Router {
    use http::handlers::payments;

    Router::new()
        .route("/health", get(payments::health))
        .route(
            "/payments",
            post(payments::create_payment).get(payments::list_payments),
        )
        .route("/payments/current", get(payments::current_payment))
        .route("/payments/:payment_id", get(payments::get_payment))
        .route("/payments/:payment_id/verify", post(payments::verify_payment))
        .route(
            "/payments/:payment_id/polling",
            post(payments::resume_polling).delete(payments::cancel_polling),
        )
        .with_state(state)
}

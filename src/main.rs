use momo_payments::config::AppConfig;
use momo_payments::gateways::client::MobileMoneyClient;
use momo_payments::gateways::mock::MockGateway;
use momo_payments::gateways::PaymentGateway;
use momo_payments::repo::payment_records_repo::PaymentRecordsRepo;
use momo_payments::service::payment_workflow::PaymentWorkflow;
use momo_payments::AppState;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();

    let gateway: Arc<dyn PaymentGateway> = if cfg.gateway_mode == "mock" {
        Arc::new(MockGateway::from_behavior(&cfg.mock_behavior))
    } else {
        Arc::new(MobileMoneyClient::new(cfg.gateway.clone(), reqwest::Client::new()))
    };
    tracing::info!(
        "using {} gateway against {} environment",
        gateway.name(),
        cfg.gateway.environment.as_str()
    );

    let workflow = PaymentWorkflow::new(gateway, PaymentRecordsRepo::new(), cfg.poll, &cfg.currency);
    let app = momo_payments::router(AppState { workflow });

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

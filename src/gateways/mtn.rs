use crate::config::{GatewaySettings, ProviderConfig};
use crate::domain::payment::PaymentDetails;
use serde_json::json;

const SUBSCRIPTION_HEADER: &str = "Ocp-Apim-Subscription-Key";

fn with_subscription(req: reqwest::RequestBuilder, cfg: &ProviderConfig) -> reqwest::RequestBuilder {
    match cfg.subscription_key.as_deref() {
        Some(key) if !key.is_empty() => req.header(SUBSCRIPTION_HEADER, key),
        _ => req,
    }
}

pub fn token_request(client: &reqwest::Client, settings: &GatewaySettings) -> reqwest::RequestBuilder {
    let cfg = &settings.mtn;
    let req = client
        .post(&cfg.token_url)
        .basic_auth(&cfg.api_key, Some(&cfg.api_secret))
        .json(&json!({ "grant_type": "client_credentials" }));
    with_subscription(req, cfg)
}

pub fn payment_request(
    client: &reqwest::Client,
    settings: &GatewaySettings,
    token: &str,
    details: &PaymentDetails,
) -> reqwest::RequestBuilder {
    let cfg = &settings.mtn;
    let body = json!({
        "amount": details.amount.to_string(),
        "currency": details.currency,
        "externalId": details.reference,
        "payer": {
            "partyIdType": "MSISDN",
            "partyId": details.phone_number
        },
        "payerMessage": details.description,
        "payeeNote": details.description
    });

    let req = client
        .post(&cfg.payment_url)
        .bearer_auth(token)
        .header("X-Reference-Id", &details.reference)
        .header("X-Target-Environment", settings.environment.as_str())
        .json(&body);
    with_subscription(req, cfg)
}

pub fn status_request(
    client: &reqwest::Client,
    settings: &GatewaySettings,
    token: &str,
    transaction_id: &str,
) -> reqwest::RequestBuilder {
    let cfg = &settings.mtn;
    let url = format!("{}/{}", cfg.payment_url.trim_end_matches('/'), transaction_id);
    let req = client
        .get(url)
        .bearer_auth(token)
        .header("X-Target-Environment", settings.environment.as_str());
    with_subscription(req, cfg)
}

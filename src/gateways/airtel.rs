use crate::config::GatewaySettings;
use crate::domain::payment::PaymentDetails;
use serde_json::json;

const COUNTRY: &str = "UGA";

pub fn token_request(client: &reqwest::Client, settings: &GatewaySettings) -> reqwest::RequestBuilder {
    let cfg = &settings.airtel;
    client.post(&cfg.token_url).json(&json!({
        "client_id": cfg.api_key,
        "client_secret": cfg.api_secret,
        "grant_type": "client_credentials"
    }))
}

pub fn payment_request(
    client: &reqwest::Client,
    settings: &GatewaySettings,
    token: &str,
    details: &PaymentDetails,
) -> reqwest::RequestBuilder {
    let body = json!({
        "reference": details.reference,
        "phoneNumber": details.phone_number,
        "amount": details.amount,
        "currency": details.currency,
        "description": details.description
    });

    client
        .post(&settings.airtel.payment_url)
        .bearer_auth(token)
        .header("X-Country", COUNTRY)
        .header("X-Currency", &details.currency)
        .json(&body)
}

pub fn status_request(
    client: &reqwest::Client,
    settings: &GatewaySettings,
    token: &str,
    transaction_id: &str,
) -> reqwest::RequestBuilder {
    let url = format!(
        "{}/{}",
        settings.airtel.payment_url.trim_end_matches('/'),
        transaction_id
    );
    client
        .get(url)
        .bearer_auth(token)
        .header("X-Country", COUNTRY)
}

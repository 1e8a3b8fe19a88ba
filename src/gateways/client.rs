use crate::config::GatewaySettings;
use crate::domain::payment::{InitiationResult, PaymentDetails, Provider, TransactionStatus};
use crate::error::PaymentError;
use crate::gateways::token_cache::TokenCache;
use crate::gateways::{airtel, error_message, mtn, parse_status_body, transaction_ref, PaymentGateway};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

/// REST client for MTN MoMo and Airtel Money collections.
pub struct MobileMoneyClient {
    pub settings: GatewaySettings,
    pub client: reqwest::Client,
    tokens: TokenCache,
}

struct AccessToken {
    token: String,
    expires_in: Option<Duration>,
}

impl MobileMoneyClient {
    pub fn new(settings: GatewaySettings, client: reqwest::Client) -> Self {
        Self {
            settings,
            client,
            tokens: TokenCache::default(),
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.settings.timeout_ms)
    }

    async fn request_token(&self, provider: Provider) -> Result<AccessToken, PaymentError> {
        let req = match provider {
            Provider::Mtn => mtn::token_request(&self.client, &self.settings),
            Provider::Airtel => airtel::token_request(&self.client, &self.settings),
        };
        let auth_err = |message: String| PaymentError::Auth {
            provider: provider.to_string(),
            message,
        };

        let resp = req
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| auth_err(e.to_string()))?;
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or_default();

        if !status.is_success() {
            return Err(auth_err(error_message(
                &body,
                &format!("Failed to obtain {} access token", provider),
            )));
        }

        let token = body
            .get("access_token")
            .and_then(|t| t.as_str())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| auth_err("token response carried no access_token".to_string()))?;
        let expires_in = body.get("expires_in").and_then(|e| match e {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse::<u64>().ok(),
            _ => None,
        });

        Ok(AccessToken {
            token: token.to_string(),
            expires_in: expires_in.map(Duration::from_secs),
        })
    }

    async fn bearer_token(&self, provider: Provider) -> Result<String, PaymentError> {
        if self.settings.cache_tokens {
            if let Some(token) = self.tokens.get(provider).await {
                return Ok(token);
            }
        }

        let fresh = self.request_token(provider).await?;
        if self.settings.cache_tokens {
            self.tokens
                .put(provider, fresh.token.clone(), fresh.expires_in)
                .await;
        }
        Ok(fresh.token)
    }

    async fn drop_token_if_unauthorized(&self, provider: Provider, status: StatusCode) {
        if status == StatusCode::UNAUTHORIZED {
            self.tokens.invalidate(provider).await;
        }
    }
}

#[async_trait::async_trait]
impl PaymentGateway for MobileMoneyClient {
    fn name(&self) -> &'static str {
        "mobile_money"
    }

    async fn authenticate(&self, provider: Provider) -> Result<String, PaymentError> {
        Ok(self.request_token(provider).await?.token)
    }

    async fn initiate(&self, details: &PaymentDetails) -> InitiationResult {
        let provider = details.provider;
        let token = match self.bearer_token(provider).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("{} token request failed for {}: {}", provider, details.reference, e);
                return InitiationResult::rejected(e.to_string());
            }
        };

        let req = match provider {
            Provider::Mtn => mtn::payment_request(&self.client, &self.settings, &token, details),
            Provider::Airtel => airtel::payment_request(&self.client, &self.settings, &token, details),
        };

        match req.timeout(self.timeout()).send().await {
            Ok(r) if r.status().is_success() => {
                let body: Value = r.json().await.unwrap_or_default();
                let transaction_id =
                    transaction_ref(&body).unwrap_or_else(|| details.reference.clone());
                tracing::info!(
                    "{} accepted payment {} as transaction {}",
                    provider,
                    details.reference,
                    transaction_id
                );
                InitiationResult::accepted(transaction_id)
            }
            Ok(r) => {
                let status = r.status();
                self.drop_token_if_unauthorized(provider, status).await;
                let body: Value = r.json().await.unwrap_or_default();
                let err = PaymentError::Gateway {
                    status: Some(status.as_u16()),
                    message: error_message(&body, "Payment initiation failed"),
                };
                tracing::warn!(
                    "{} rejected payment {} with HTTP {}: {}",
                    provider,
                    details.reference,
                    status.as_u16(),
                    err
                );
                InitiationResult::rejected(err.to_string())
            }
            Err(e) if e.is_timeout() => InitiationResult::rejected("gateway timeout"),
            Err(e) => InitiationResult::rejected(PaymentError::from(e).to_string()),
        }
    }

    async fn check_status(
        &self,
        transaction_id: &str,
        provider: Provider,
    ) -> Result<TransactionStatus, PaymentError> {
        let token = self
            .bearer_token(provider)
            .await
            .map_err(|e| PaymentError::StatusCheck(e.to_string()))?;

        let req = match provider {
            Provider::Mtn => mtn::status_request(&self.client, &self.settings, &token, transaction_id),
            Provider::Airtel => airtel::status_request(&self.client, &self.settings, &token, transaction_id),
        };

        let resp = req
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| PaymentError::StatusCheck(e.to_string()))?;
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or_default();

        if !status.is_success() {
            self.drop_token_if_unauthorized(provider, status).await;
            return Err(PaymentError::StatusCheck(error_message(
                &body,
                &format!("HTTP {}", status.as_u16()),
            )));
        }

        Ok(parse_status_body(transaction_id, provider, &body))
    }
}

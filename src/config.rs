use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MomoEnvironment {
    Sandbox,
    Production,
}

impl MomoEnvironment {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => MomoEnvironment::Production,
            _ => MomoEnvironment::Sandbox,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MomoEnvironment::Sandbox => "sandbox",
            MomoEnvironment::Production => "production",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub api_secret: String,
    pub subscription_key: Option<String>,
    pub token_url: String,
    pub payment_url: String,
}

#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub environment: MomoEnvironment,
    pub mtn: ProviderConfig,
    pub airtel: ProviderConfig,
    pub timeout_ms: u64,
    pub cache_tokens: bool,
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub currency: String,
    pub gateway_mode: String,
    pub mock_behavior: String,
    pub gateway: GatewaySettings,
    pub poll: PollPolicy,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let environment = MomoEnvironment::parse(&var("MOMO_ENVIRONMENT", "sandbox"));

        let mtn_base = var(
            "MTN_BASE_URL",
            match environment {
                MomoEnvironment::Sandbox => "https://sandbox.momodeveloper.mtn.com",
                MomoEnvironment::Production => "https://proxy.momoapi.mtn.com",
            },
        );
        let airtel_base = var(
            "AIRTEL_BASE_URL",
            match environment {
                MomoEnvironment::Sandbox => "https://openapiuat.airtel.africa",
                MomoEnvironment::Production => "https://openapi.airtel.africa",
            },
        );
        let mtn_base = mtn_base.trim_end_matches('/');
        let airtel_base = airtel_base.trim_end_matches('/');

        let mtn = ProviderConfig {
            api_key: var("MTN_API_KEY", ""),
            api_secret: var("MTN_API_SECRET", ""),
            subscription_key: Some(var("MTN_SUBSCRIPTION_KEY", "")),
            token_url: var("MTN_TOKEN_URL", &format!("{}/collection/token/", mtn_base)),
            payment_url: var(
                "MTN_PAYMENT_URL",
                &format!("{}/collection/v1_0/requesttopay", mtn_base),
            ),
        };
        let airtel = ProviderConfig {
            api_key: var("AIRTEL_API_KEY", ""),
            api_secret: var("AIRTEL_API_SECRET", ""),
            subscription_key: None,
            token_url: var("AIRTEL_TOKEN_URL", &format!("{}/auth/oauth2/token", airtel_base)),
            payment_url: var(
                "AIRTEL_PAYMENT_URL",
                &format!("{}/merchant/v1/payments", airtel_base),
            ),
        };

        let defaults = PollPolicy::default();
        let poll = PollPolicy {
            max_attempts: lookup("POLL_MAX_ATTEMPTS")
                .and_then(|s| s.parse::<u32>().ok())
                .filter(|n| *n >= 1)
                .unwrap_or(defaults.max_attempts),
            interval: lookup("POLL_INTERVAL_MS")
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.interval),
        };

        Self {
            bind_addr: var("BIND_ADDR", "0.0.0.0:3000"),
            currency: var("PAYMENT_CURRENCY", "UGX"),
            gateway_mode: var("GATEWAY_MODE", "live").to_ascii_lowercase(),
            mock_behavior: var("MOCK_BEHAVIOR", "ALWAYS_SUCCESS").to_ascii_uppercase(),
            gateway: GatewaySettings {
                environment,
                mtn,
                airtel,
                timeout_ms: lookup("GATEWAY_TIMEOUT_MS")
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(10_000),
                cache_tokens: lookup("TOKEN_CACHE_ENABLED")
                    .map(|s| !matches!(s.to_ascii_lowercase().as_str(), "0" | "false" | "no"))
                    .unwrap_or(true),
            },
            poll,
        }
    }
}

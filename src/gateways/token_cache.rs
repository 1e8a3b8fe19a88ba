use crate::domain::payment::Provider;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Clone, Default)]
pub struct TokenCache {
    inner: Arc<RwLock<HashMap<Provider, (Instant, String)>>>,
}

impl TokenCache {
    pub async fn get(&self, provider: Provider) -> Option<String> {
        let read = self.inner.read().await;
        match read.get(&provider) {
            Some((valid_until, token)) if Instant::now() < *valid_until => Some(token.clone()),
            _ => None,
        }
    }

    /// Tokens without a usable lifetime are not stored.
    pub async fn put(&self, provider: Provider, token: String, expires_in: Option<Duration>) {
        let ttl = match expires_in.and_then(|e| e.checked_sub(EXPIRY_MARGIN)) {
            Some(ttl) if !ttl.is_zero() => ttl,
            _ => return,
        };
        let mut write = self.inner.write().await;
        write.insert(provider, (Instant::now() + ttl, token));
    }

    pub async fn invalidate(&self, provider: Provider) {
        self.inner.write().await.remove(&provider);
    }
}

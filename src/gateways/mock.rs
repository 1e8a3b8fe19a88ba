use crate::domain::payment::{InitiationResult, PaymentDetails, PaymentStatus, Provider, TransactionStatus};
use crate::error::PaymentError;
use crate::gateways::PaymentGateway;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub enum MockInitiation {
    /// Accept and echo the caller's reference as the transaction id.
    Accept,
    AcceptAs(String),
    Reject(String),
}

#[derive(Debug, Clone)]
pub enum MockStatus {
    Pending,
    Completed,
    Failed(String),
    TransportError,
}

/// Scripted gateway. Status answers are consumed per provider in order; once
/// a script runs out the fallback answer repeats.
pub struct MockGateway {
    initiations: HashMap<Provider, MockInitiation>,
    scripts: Mutex<HashMap<Provider, VecDeque<MockStatus>>>,
    fallback: MockStatus,
    initiate_calls: AtomicUsize,
    status_calls: AtomicUsize,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self {
            initiations: HashMap::new(),
            scripts: Mutex::new(HashMap::new()),
            fallback: MockStatus::Pending,
            initiate_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
        }
    }
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same behaviour names the mock adapters use for demo gateways.
    pub fn from_behavior(behavior: &str) -> Self {
        match behavior {
            "ALWAYS_FAILURE" => Self::new()
                .on_initiate(Provider::Mtn, MockInitiation::Reject("mock decline".to_string()))
                .on_initiate(Provider::Airtel, MockInitiation::Reject("mock decline".to_string())),
            "ALWAYS_DECLINED" => Self::new().fallback(MockStatus::Failed("mock decline".to_string())),
            "ALWAYS_TIMEOUT" => Self::new().fallback(MockStatus::Pending),
            _ => Self::new().fallback(MockStatus::Completed),
        }
    }

    pub fn on_initiate(mut self, provider: Provider, behavior: MockInitiation) -> Self {
        self.initiations.insert(provider, behavior);
        self
    }

    pub fn statuses(mut self, provider: Provider, answers: Vec<MockStatus>) -> Self {
        if let Ok(scripts) = self.scripts.get_mut() {
            scripts.insert(provider, answers.into());
        }
        self
    }

    pub fn push_status(&self, provider: Provider, answer: MockStatus) {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.entry(provider).or_default().push_back(answer);
        }
    }

    pub fn fallback(mut self, answer: MockStatus) -> Self {
        self.fallback = answer;
        self
    }

    pub fn initiate_calls(&self) -> usize {
        self.initiate_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    fn next_status(&self, provider: Provider) -> MockStatus {
        self.scripts
            .lock()
            .ok()
            .and_then(|mut scripts| scripts.get_mut(&provider).and_then(VecDeque::pop_front))
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait::async_trait]
impl PaymentGateway for MockGateway {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn authenticate(&self, _provider: Provider) -> Result<String, PaymentError> {
        Ok("mock-token".to_string())
    }

    async fn initiate(&self, details: &PaymentDetails) -> InitiationResult {
        self.initiate_calls.fetch_add(1, Ordering::SeqCst);
        match self
            .initiations
            .get(&details.provider)
            .cloned()
            .unwrap_or(MockInitiation::Accept)
        {
            MockInitiation::Accept => InitiationResult::accepted(details.reference.clone()),
            MockInitiation::AcceptAs(id) => InitiationResult::accepted(id),
            MockInitiation::Reject(message) => InitiationResult::rejected(message),
        }
    }

    async fn check_status(
        &self,
        transaction_id: &str,
        provider: Provider,
    ) -> Result<TransactionStatus, PaymentError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let (status, message) = match self.next_status(provider) {
            MockStatus::Pending => (PaymentStatus::Pending, None),
            MockStatus::Completed => (PaymentStatus::Completed, Some("Payment completed".to_string())),
            MockStatus::Failed(reason) => (PaymentStatus::Failed, Some(reason)),
            MockStatus::TransportError => {
                return Err(PaymentError::StatusCheck("mock connection reset".to_string()))
            }
        };

        Ok(TransactionStatus {
            transaction_id: transaction_id.to_string(),
            status,
            amount: None,
            currency: None,
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
            message,
        })
    }
}

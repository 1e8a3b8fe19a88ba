use momo_payments::config::PollPolicy;
use momo_payments::domain::payment::{InitiatePaymentRequest, PaymentRecord, PaymentStatus, Provider};
use momo_payments::error::PaymentError;
use momo_payments::gateways::mock::{MockGateway, MockInitiation, MockStatus};
use momo_payments::repo::payment_records_repo::PaymentRecordsRepo;
use momo_payments::service::payment_workflow::PaymentWorkflow;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn workflow(gateway: Arc<MockGateway>, max_attempts: u32, interval_ms: u64) -> PaymentWorkflow {
    PaymentWorkflow::new(
        gateway,
        PaymentRecordsRepo::new(),
        PollPolicy {
            max_attempts,
            interval: Duration::from_millis(interval_ms),
        },
        "UGX",
    )
}

fn request(provider: Provider, phone: &str) -> InitiatePaymentRequest {
    InitiatePaymentRequest {
        amount: 1000,
        phone_number: phone.to_string(),
        provider,
        description: "test".to_string(),
    }
}

async fn settle(wf: &PaymentWorkflow, id: Uuid) -> PaymentRecord {
    tokio::time::timeout(Duration::from_secs(5), wf.wait_for_terminal(id))
        .await
        .expect("payment did not settle in time")
        .unwrap()
}

#[tokio::test]
async fn completes_on_third_status_check() {
    let gateway = Arc::new(
        MockGateway::new()
            .on_initiate(Provider::Mtn, MockInitiation::AcceptAs("TX1".to_string()))
            .statuses(
                Provider::Mtn,
                vec![MockStatus::Pending, MockStatus::Pending, MockStatus::Completed],
            ),
    );
    let wf = workflow(gateway.clone(), 10, 5);

    let initiated = wf
        .initiate_payment(request(Provider::Mtn, "0771234567"))
        .await
        .unwrap();
    assert!(initiated.result.success);
    assert_eq!(initiated.result.status, PaymentStatus::Pending);
    assert_eq!(initiated.result.transaction_id.as_deref(), Some("TX1"));

    let record = settle(&wf, initiated.record_id).await;
    assert_eq!(record.status, PaymentStatus::Completed);
    assert_eq!(record.transaction_id.as_deref(), Some("TX1"));
    assert_eq!(record.error, None);
    assert_eq!(record.phone_number, "256771234567");
    assert_eq!(record.currency, "UGX");
    assert_eq!(gateway.status_calls(), 3);
}

#[tokio::test]
async fn exhausting_the_budget_fails_with_timeout() {
    let gateway = Arc::new(MockGateway::new().fallback(MockStatus::Pending));
    let wf = workflow(gateway.clone(), 4, 2);

    let initiated = wf
        .initiate_payment(request(Provider::Airtel, "0701234567"))
        .await
        .unwrap();
    let record = settle(&wf, initiated.record_id).await;

    assert_eq!(record.status, PaymentStatus::Failed);
    assert_eq!(record.error.as_deref(), Some("Payment verification timeout"));
    assert_eq!(gateway.status_calls(), 4);
}

#[tokio::test]
async fn transient_status_errors_do_not_abort_polling() {
    let gateway = Arc::new(MockGateway::new().statuses(
        Provider::Mtn,
        vec![
            MockStatus::Pending,
            MockStatus::TransportError,
            MockStatus::Pending,
            MockStatus::TransportError,
            MockStatus::Completed,
        ],
    ));
    let wf = workflow(gateway.clone(), 10, 2);

    let initiated = wf
        .initiate_payment(request(Provider::Mtn, "0781234567"))
        .await
        .unwrap();
    let record = settle(&wf, initiated.record_id).await;

    assert_eq!(record.status, PaymentStatus::Completed);
    assert_eq!(gateway.status_calls(), 5);
}

#[tokio::test]
async fn provider_failure_is_recorded_with_its_message() {
    let gateway = Arc::new(MockGateway::new().statuses(
        Provider::Airtel,
        vec![MockStatus::Pending, MockStatus::Failed("Payer declined".to_string())],
    ));
    let wf = workflow(gateway.clone(), 10, 2);

    let initiated = wf
        .initiate_payment(request(Provider::Airtel, "0751234567"))
        .await
        .unwrap();
    let record = settle(&wf, initiated.record_id).await;

    assert_eq!(record.status, PaymentStatus::Failed);
    assert_eq!(record.error.as_deref(), Some("Payer declined"));
    assert_eq!(gateway.status_calls(), 2);
}

#[tokio::test]
async fn invalid_phone_never_reaches_the_gateway() {
    let gateway = Arc::new(MockGateway::new());
    let wf = workflow(gateway.clone(), 10, 2);

    let err = wf
        .initiate_payment(request(Provider::Mtn, "0751234567"))
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::Validation(_)));

    let err = wf
        .initiate_payment(request(Provider::Airtel, "075123"))
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::Validation(_)));

    assert_eq!(gateway.initiate_calls(), 0);
    assert!(wf.records.list().await.is_empty());
}

#[tokio::test]
async fn non_positive_amount_is_rejected() {
    let gateway = Arc::new(MockGateway::new());
    let wf = workflow(gateway.clone(), 10, 2);

    let mut req = request(Provider::Mtn, "0771234567");
    req.amount = 0;
    let err = wf.initiate_payment(req).await.unwrap_err();

    assert!(matches!(err, PaymentError::Validation(_)));
    assert_eq!(gateway.initiate_calls(), 0);
}

#[tokio::test]
async fn rejected_initiation_fails_record_without_transaction() {
    let gateway = Arc::new(MockGateway::new().on_initiate(
        Provider::Mtn,
        MockInitiation::Reject("Insufficient funds".to_string()),
    ));
    let wf = workflow(gateway.clone(), 10, 2);

    let initiated = wf
        .initiate_payment(request(Provider::Mtn, "0771234567"))
        .await
        .unwrap();
    assert!(!initiated.result.success);
    assert_eq!(initiated.result.status, PaymentStatus::Failed);

    let record = wf.records.get(initiated.record_id).await.unwrap();
    assert_eq!(record.status, PaymentStatus::Failed);
    assert_eq!(record.error.as_deref(), Some("Insufficient funds"));
    assert!(record.transaction_id.is_none());
    assert_eq!(gateway.status_calls(), 0);
    assert_eq!(wf.records.current().await.unwrap().id, record.id);
}

#[tokio::test]
async fn concurrent_payments_resolve_independently() {
    let gateway = Arc::new(
        MockGateway::new()
            .statuses(Provider::Mtn, vec![MockStatus::Completed])
            .statuses(
                Provider::Airtel,
                vec![
                    MockStatus::Pending,
                    MockStatus::Pending,
                    MockStatus::Failed("Not enough balance".to_string()),
                ],
            ),
    );
    let wf = workflow(gateway.clone(), 10, 3);
    let mut events = wf.subscribe();

    let (a, b) = tokio::join!(
        wf.initiate_payment(request(Provider::Mtn, "0771234567")),
        wf.initiate_payment(request(Provider::Airtel, "0701234567")),
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_ne!(a.record_id, b.record_id);

    let rec_a = settle(&wf, a.record_id).await;
    let rec_b = settle(&wf, b.record_id).await;
    assert_eq!(rec_a.status, PaymentStatus::Completed);
    assert_eq!(rec_a.error, None);
    assert_eq!(rec_b.status, PaymentStatus::Failed);
    assert_eq!(rec_b.error.as_deref(), Some("Not enough balance"));

    let mut seen = Vec::new();
    while let Ok(update) = events.try_recv() {
        seen.push(update);
    }
    for id in [a.record_id, b.record_id] {
        let statuses: Vec<PaymentStatus> = seen
            .iter()
            .filter(|r| r.id == id)
            .map(|r| r.status)
            .collect();
        let terminal = statuses.iter().filter(|s| s.is_terminal()).count();
        assert_eq!(terminal, 1);
        assert!(statuses.last().unwrap().is_terminal());
    }
}

#[tokio::test]
async fn second_poller_for_same_transaction_is_refused() {
    let gateway = Arc::new(
        MockGateway::new()
            .on_initiate(Provider::Mtn, MockInitiation::AcceptAs("TX-DUP".to_string()))
            .fallback(MockStatus::Pending),
    );
    let wf = workflow(gateway.clone(), 1000, 10);

    let initiated = wf
        .initiate_payment(request(Provider::Mtn, "0771234567"))
        .await
        .unwrap();
    assert!(wf.is_polling("TX-DUP"));

    let err = wf
        .start_polling(initiated.record_id, "TX-DUP", Provider::Mtn)
        .unwrap_err();
    assert!(matches!(err, PaymentError::PollingAlreadyActive(_)));
    assert!(matches!(
        wf.resume_polling(initiated.record_id).await,
        Err(PaymentError::PollingAlreadyActive(_))
    ));

    assert!(wf.cancel_polling("TX-DUP"));
    assert!(!wf.cancel_polling("TX-DUP"));
}

#[tokio::test]
async fn cancelled_polling_stops_checking_and_leaves_record_pending() {
    let gateway = Arc::new(MockGateway::new().fallback(MockStatus::Pending));
    let wf = workflow(gateway.clone(), 1000, 10);

    let initiated = wf
        .initiate_payment(request(Provider::Airtel, "0751234567"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(40)).await;
    assert!(wf.cancel_polling_for(initiated.record_id).await.unwrap());

    tokio::time::sleep(Duration::from_millis(30)).await;
    let after_cancel = gateway.status_calls();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(gateway.status_calls(), after_cancel);

    let record = wf.records.get(initiated.record_id).await.unwrap();
    assert_eq!(record.status, PaymentStatus::Pending);
    assert!(record.transaction_id.is_some());
}

#[tokio::test]
async fn verify_resolves_a_pending_record() {
    let gateway = Arc::new(MockGateway::new().fallback(MockStatus::Pending));
    let wf = workflow(gateway.clone(), 1000, 10);

    let initiated = wf
        .initiate_payment(request(Provider::Mtn, "0771234567"))
        .await
        .unwrap();
    wf.cancel_polling_for(initiated.record_id).await.unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;

    let still_pending = wf.verify_payment(initiated.record_id).await.unwrap();
    assert_eq!(still_pending.status, PaymentStatus::Pending);

    gateway.push_status(Provider::Mtn, MockStatus::Completed);
    let record = wf.verify_payment(initiated.record_id).await.unwrap();
    assert_eq!(record.status, PaymentStatus::Completed);

    assert!(matches!(
        wf.resume_polling(initiated.record_id).await,
        Err(PaymentError::InvalidTransition { .. })
    ));
    let again = wf.verify_payment(initiated.record_id).await.unwrap();
    assert_eq!(again, record);
}

#[tokio::test]
async fn verify_unknown_payment_is_not_found() {
    let wf = workflow(Arc::new(MockGateway::new()), 10, 2);
    assert!(matches!(
        wf.verify_payment(Uuid::new_v4()).await,
        Err(PaymentError::NotFound(_))
    ));
}

#[tokio::test]
async fn reused_transaction_id_fails_the_second_payment_instead_of_erroring() {
    let gateway = Arc::new(
        MockGateway::new()
            .on_initiate(Provider::Mtn, MockInitiation::AcceptAs("TX1".to_string()))
            .fallback(MockStatus::Pending),
    );
    let wf = workflow(gateway.clone(), 1000, 10);

    let first = wf
        .initiate_payment(request(Provider::Mtn, "0771234567"))
        .await
        .unwrap();
    let second = wf
        .initiate_payment(request(Provider::Mtn, "0781234567"))
        .await
        .unwrap();
    assert!(second.result.success);
    assert_eq!(second.result.transaction_id.as_deref(), Some("TX1"));
    assert_eq!(gateway.initiate_calls(), 2);

    let record = wf.records.get(second.record_id).await.unwrap();
    assert_eq!(record.status, PaymentStatus::Failed);
    assert!(record.error.unwrap().contains("already active"));

    let original = wf.records.get(first.record_id).await.unwrap();
    assert_eq!(original.status, PaymentStatus::Pending);
    assert!(wf.cancel_polling("TX1"));
}

#[tokio::test]
async fn zero_attempt_policy_still_checks_once() {
    let gateway = Arc::new(MockGateway::new().statuses(Provider::Mtn, vec![MockStatus::Completed]));
    let wf = workflow(gateway.clone(), 0, 2);

    let initiated = wf
        .initiate_payment(request(Provider::Mtn, "0771234567"))
        .await
        .unwrap();
    let record = settle(&wf, initiated.record_id).await;

    assert_eq!(record.status, PaymentStatus::Completed);
    assert_eq!(gateway.status_calls(), 1);
}

#[tokio::test]
async fn verify_records_provider_failure_reason() {
    let gateway = Arc::new(MockGateway::new().fallback(MockStatus::Pending));
    let wf = workflow(gateway.clone(), 1000, 10);

    let initiated = wf
        .initiate_payment(request(Provider::Airtel, "0701234567"))
        .await
        .unwrap();
    wf.cancel_polling_for(initiated.record_id).await.unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;

    gateway.push_status(Provider::Airtel, MockStatus::Failed("Payer declined".to_string()));
    let record = wf.verify_payment(initiated.record_id).await.unwrap();
    assert_eq!(record.status, PaymentStatus::Failed);
    assert_eq!(record.error.as_deref(), Some("Payer declined"));
}

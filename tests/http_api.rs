use momo_payments::config::PollPolicy;
use momo_payments::domain::payment::Provider;
use momo_payments::gateways::mock::{MockGateway, MockInitiation, MockStatus};
use momo_payments::repo::payment_records_repo::PaymentRecordsRepo;
use momo_payments::service::payment_workflow::PaymentWorkflow;
use momo_payments::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

async fn serve(gateway: MockGateway) -> String {
    let workflow = PaymentWorkflow::new(
        Arc::new(gateway),
        PaymentRecordsRepo::new(),
        PollPolicy {
            max_attempts: 5,
            interval: Duration::from_millis(5),
        },
        "UGX",
    );
    let app = momo_payments::router(AppState { workflow });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn wait_for_status(http: &reqwest::Client, url: &str, want: &str) -> Value {
    for _ in 0..200 {
        let body: Value = http.get(url).send().await.unwrap().json().await.unwrap();
        if body["status"] == want {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("{} never reached {}", url, want);
}

#[tokio::test]
async fn payment_lifecycle_over_http() {
    let base = serve(
        MockGateway::new()
            .on_initiate(Provider::Mtn, MockInitiation::AcceptAs("TX1".to_string()))
            .statuses(Provider::Mtn, vec![MockStatus::Pending, MockStatus::Completed]),
    )
    .await;
    let http = reqwest::Client::new();

    let resp = http
        .post(format!("{}/payments", base))
        .json(&json!({
            "amount": 1000,
            "phone_number": "0771234567",
            "provider": "MTN",
            "description": "fertilizer"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 202);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["result"]["success"], true);
    assert_eq!(body["result"]["transaction_id"], "TX1");
    let id = body["record_id"].as_str().unwrap().to_string();

    let record = wait_for_status(&http, &format!("{}/payments/{}", base, id), "COMPLETED").await;
    assert_eq!(record["phone_number"], "256771234567");
    assert_eq!(record["currency"], "UGX");

    let current: Value = http
        .get(format!("{}/payments/current", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(current["id"], id.as_str());

    let completed: Vec<Value> = http
        .get(format!("{}/payments?status=COMPLETED", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(completed.len(), 1);
    let pending: Vec<Value> = http
        .get(format!("{}/payments?status=PENDING", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(pending.is_empty());

    let resume = http
        .post(format!("{}/payments/{}/polling", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(resume.status(), 409);
}

#[tokio::test]
async fn invalid_phone_is_a_bad_request() {
    let base = serve(MockGateway::new()).await;
    let http = reqwest::Client::new();

    let resp = http
        .post(format!("{}/payments", base))
        .json(&json!({
            "amount": 1000,
            "phone_number": "0771234567",
            "provider": "AIRTEL",
            "description": "seeds"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let all: Vec<Value> = http
        .get(format!("{}/payments", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn unknown_payment_is_not_found() {
    let base = serve(MockGateway::new()).await;
    let http = reqwest::Client::new();

    let resp = http
        .get(format!("{}/payments/{}", base, uuid::Uuid::new_v4()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = http
        .delete(format!("{}/payments/{}/polling", base, uuid::Uuid::new_v4()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = http.get(format!("{}/payments/current", base)).send().await.unwrap();
    assert_eq!(resp.status(), 404);
}

// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use certify_backend::{
    config::{Config, RazorpayConfig},
    error::AppError,
    grading::LengthHeuristic,
    models::{
        certificate::Certificate,
        payment::{OrderRequest, PaymentOrder},
        user::User,
    },
    routes, seed,
    services::{
        notifier::Notifier, payment_provider::PaymentProvider, renderer::CertificateRenderer,
    },
    state::AppState,
    store::{MemoryStore, Store},
    utils::signature::sign_payload,
};
use serde_json::{Value, json};
use url::Url;

pub const WEBHOOK_SECRET: &str = "whsec_integration_tests";
pub const LEVEL_ONE_CORRECT: [i64; 5] = [3, 2, 2, 2, 1];

/// Counts notifications instead of sending them. Optionally fails every call.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: AtomicUsize,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn count(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn certificate_issued(&self, _user: &User, _certificate: &Certificate) -> Result<(), AppError> {
        if self.fail {
            return Err(AppError::Downstream("SMTP relay refused connection".to_string()));
        }
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Returns a canned order and keeps every request it was given.
#[derive(Default)]
pub struct FakePaymentProvider {
    pub requests: Mutex<Vec<OrderRequest>>,
}

#[async_trait]
impl PaymentProvider for FakePaymentProvider {
    fn key_id(&self) -> &str {
        "rzp_test_key"
    }

    async fn create_order(&self, order: &OrderRequest) -> Result<PaymentOrder, AppError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(order.clone());
        Ok(PaymentOrder {
            id: format!("order_test_{}", requests.len()),
            amount: order.amount,
            currency: order.currency.clone(),
            receipt: Some(order.receipt.clone()),
            status: Some("created".to_string()),
        })
    }
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub payments: Arc<FakePaymentProvider>,
}

pub fn test_config() -> Config {
    Config {
        database_url: None,
        rust_log: "error".to_string(),
        port: 0,
        public_base_url: Url::parse("https://certs.example.org").unwrap(),
        issuer_name: "Test Photographic Society".to_string(),
        certificate_prefix: "IPS".to_string(),
        currency: "INR".to_string(),
        cors_origins: vec![],
        razorpay: RazorpayConfig {
            key_id: "rzp_test_key".to_string(),
            key_secret: "rzp_test_secret".to_string(),
            webhook_secret: WEBHOOK_SECRET.to_string(),
            api_base: "http://127.0.0.1:9".to_string(),
        },
        smtp: None,
    }
}

/// Spawns the app on a random port, backed by a seeded in-memory store.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(RecordingNotifier::default()).await
}

pub async fn spawn_app_with(notifier: RecordingNotifier) -> TestApp {
    let config = test_config();

    let store = Arc::new(MemoryStore::new());
    seed::seed(store.as_ref()).await.expect("Failed to seed store");

    let notifier = Arc::new(notifier);
    let payments = Arc::new(FakePaymentProvider::default());

    let state = AppState {
        store: store.clone(),
        notifier: notifier.clone(),
        payments: payments.clone(),
        renderer: Arc::new(CertificateRenderer::new(config.issuer_name.clone())),
        evaluator: Arc::new(LengthHeuristic::default()),
        config,
    };

    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        store,
        notifier,
        payments,
    }
}

pub fn unique_email() -> String {
    format!("candidate_{}@example.org", &uuid::Uuid::new_v4().to_string()[..8])
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn level_one_ids(&self) -> Vec<i64> {
        let paper: Value = self
            .client
            .get(self.url("/exam/LEVEL-1/questions"))
            .send()
            .await
            .expect("Failed to execute request")
            .json()
            .await
            .unwrap();
        paper["questions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|q| q["id"].as_i64().unwrap())
            .collect()
    }

    /// Submits LEVEL-1 with the first `correct` answers right and the rest wrong.
    pub async fn submit_level_one(&self, email: &str, correct: usize) -> reqwest::Response {
        let ids = self.level_one_ids().await;
        let answers: Vec<Value> = ids
            .iter()
            .zip(LEVEL_ONE_CORRECT)
            .enumerate()
            .map(|(i, (id, right))| {
                let choice = if i < correct { right } else { right % 4 + 1 };
                json!({ "question_id": id, "answer": choice })
            })
            .collect();

        self.client
            .post(self.url("/exam/submit"))
            .json(&json!({
                "name": "Asha Rao",
                "email": email,
                "certificate_code": "LEVEL-1",
                "answers": answers,
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Passes LEVEL-1 and returns the minted certificate code.
    pub async fn issue_certificate(&self) -> String {
        let body: Value = self.submit_level_one(&unique_email(), 5).await.json().await.unwrap();
        body["certificate_code"].as_str().unwrap().to_string()
    }

    pub async fn post_webhook(&self, body: &Value, signature: Option<&str>) -> reqwest::Response {
        let raw = serde_json::to_vec(body).unwrap();
        let mut request = self
            .client
            .post(self.url("/webhook/payment"))
            .header("content-type", "application/json");
        if let Some(signature) = signature {
            request = request.header("x-razorpay-signature", signature);
        }
        request.body(raw).send().await.expect("Failed to execute request")
    }

    pub async fn post_signed_webhook(&self, body: &Value) -> reqwest::Response {
        let raw = serde_json::to_vec(body).unwrap();
        let signature = sign_payload(WEBHOOK_SECRET, &raw);
        self.post_webhook(body, Some(&signature)).await
    }

    pub async fn certificate(&self, code: &str) -> Certificate {
        self.store.find_certificate(code).await.unwrap().expect("certificate exists")
    }
}

pub fn captured_event(certificate_code: &str) -> Value {
    json!({
        "entity": "event",
        "event": "payment.captured",
        "payload": {
            "payment": {
                "entity": {
                    "id": "pay_test_001",
                    "order_id": "order_test_1",
                    "amount": 50000,
                    "currency": "INR",
                    "notes": { "certificate_code": certificate_code }
                }
            }
        }
    })
}

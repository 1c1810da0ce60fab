// tests/payment_tests.rs

mod common;

use certify_backend::{store::Store, utils::signature::sign_payload};
use common::{RecordingNotifier, WEBHOOK_SECRET, captured_event, spawn_app, spawn_app_with};
use serde_json::{Value, json};
use tokio::task::JoinSet;

#[tokio::test]
async fn webhook_without_signature_401() {
    let app = spawn_app().await;
    let code = app.issue_certificate().await;

    let response = app.post_webhook(&captured_event(&code), None).await;

    assert_eq!(response.status().as_u16(), 401);
    assert!(!app.certificate(&code).await.is_paid);
}

#[tokio::test]
async fn webhook_with_forged_signature_401() {
    let app = spawn_app().await;
    let code = app.issue_certificate().await;

    let forged = sign_payload(
        "not_the_secret",
        &serde_json::to_vec(&captured_event(&code)).unwrap(),
    );
    let response = app.post_webhook(&captured_event(&code), Some(&forged)).await;

    assert_eq!(response.status().as_u16(), 401);
    assert!(!app.certificate(&code).await.is_paid);
    assert_eq!(app.notifier.count(), 0);
}

#[tokio::test]
async fn non_capture_event_is_acknowledged() {
    let app = spawn_app().await;
    let code = app.issue_certificate().await;

    let mut event = captured_event(&code);
    event["event"] = json!("payment.failed");
    let response = app.post_signed_webhook(&event).await;

    assert_eq!(response.status().as_u16(), 200);
    assert!(!app.certificate(&code).await.is_paid);
    assert_eq!(app.notifier.count(), 0);
}

#[tokio::test]
async fn capture_marks_paid_and_notifies_once() {
    let app = spawn_app().await;
    let code = app.issue_certificate().await;

    let response = app.post_signed_webhook(&captured_event(&code)).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    assert!(app.certificate(&code).await.is_paid);
    assert_eq!(app.notifier.count(), 1);

    // Redelivery of the same event
    let again = app.post_signed_webhook(&captured_event(&code)).await;
    assert_eq!(again.status().as_u16(), 200);
    assert!(app.certificate(&code).await.is_paid);
    assert_eq!(app.notifier.count(), 1);
}

#[tokio::test]
async fn concurrent_captures_notify_once() {
    let app = spawn_app().await;
    let code = app.issue_certificate().await;

    let raw = serde_json::to_vec(&captured_event(&code)).unwrap();
    let signature = sign_payload(WEBHOOK_SECRET, &raw);

    // Deliveries race on the server
    let mut deliveries = JoinSet::new();
    for _ in 0..8 {
        let request = app
            .client
            .post(app.url("/webhook/payment"))
            .header("content-type", "application/json")
            .header("x-razorpay-signature", signature.clone())
            .body(raw.clone());
        deliveries.spawn(async move { request.send().await.unwrap().status().as_u16() });
    }

    while let Some(status) = deliveries.join_next().await {
        assert_eq!(status.unwrap(), 200);
    }
    assert!(app.certificate(&code).await.is_paid);
    assert_eq!(app.notifier.count(), 1);
}

#[tokio::test]
async fn notifier_failure_keeps_payment() {
    let app = spawn_app_with(RecordingNotifier {
        fail: true,
        ..Default::default()
    })
    .await;
    let code = app.issue_certificate().await;

    let response = app.post_signed_webhook(&captured_event(&code)).await;

    assert_eq!(response.status().as_u16(), 200);
    assert!(app.certificate(&code).await.is_paid);

    let failures = app.store.notification_failures().await.unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].certificate_code, code);
}

#[tokio::test]
async fn capture_without_certificate_code_400() {
    let app = spawn_app().await;

    let mut event = captured_event("unused");
    event["payload"]["payment"]["entity"]["notes"] = json!([]);
    let response = app.post_signed_webhook(&event).await;

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn capture_for_unknown_certificate_404() {
    let app = spawn_app().await;

    let response = app
        .post_signed_webhook(&captured_event("IPS-1999-000042"))
        .await;

    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(app.notifier.count(), 0);
}

#[tokio::test]
async fn create_order_uses_certificate_fee() {
    let app = spawn_app().await;
    let code = app.issue_certificate().await;

    let response = app
        .client
        .post(app.url(&format!("/payment/create/{}", code)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["key_id"], "rzp_test_key");
    assert_eq!(body["certificate_code"], code.as_str());
    assert_eq!(body["order"]["amount"], 50000);
    assert_eq!(body["order"]["currency"], "INR");

    let requests = app.payments.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].notes.certificate_code, code);
    assert_eq!(requests[0].receipt, code);
}

#[tokio::test]
async fn create_order_for_paid_certificate_409() {
    let app = spawn_app().await;
    let code = app.issue_certificate().await;
    app.store.mark_paid(&code).await.unwrap();

    let response = app
        .client
        .post(app.url(&format!("/payment/create/{}", code)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 409);
    assert!(app.payments.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn create_order_for_unknown_certificate_404() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/payment/create/IPS-1999-000042"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
}

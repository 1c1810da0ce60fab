// src/handlers/payment.rs

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    models::{
        certificate::Certificate,
        payment::{CreateOrderResponse, OrderNotes, OrderRequest, WebhookEvent},
    },
    state::AppState,
    utils::signature::verify_payload,
};

/// Header carrying the hex HMAC-SHA256 of the raw webhook body.
pub const SIGNATURE_HEADER: &str = "x-razorpay-signature";

/// Creates a provider order for an unpaid certificate.
/// The certificate code travels in the order notes and comes back on the webhook.
pub async fn create_order(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let certificate = state
        .store
        .find_certificate(&code)
        .await?
        .ok_or(AppError::NotFound("Certificate not found".to_string()))?;

    if certificate.is_paid {
        return Err(AppError::Conflict("Certificate already paid".to_string()));
    }

    let certificate_type = state
        .store
        .find_certificate_type(&certificate.certificate_type)
        .await?
        .ok_or_else(|| {
            AppError::InternalServerError(format!(
                "Certificate {} references missing type {}",
                certificate.certificate_code, certificate.certificate_type
            ))
        })?;

    let amount = certificate_type.fee_minor_units().ok_or_else(|| {
        AppError::InternalServerError(format!("Fee overflow for {}", certificate_type.code))
    })?;

    let request = OrderRequest {
        amount,
        currency: state.config.currency.clone(),
        receipt: certificate.certificate_code.clone(),
        notes: OrderNotes {
            certificate_code: certificate.certificate_code.clone(),
        },
    };

    let order = state.payments.create_order(&request).await?;
    tracing::info!(
        "Created payment order {} for certificate {} ({} {})",
        order.id,
        certificate.certificate_code,
        order.amount,
        order.currency
    );

    Ok(Json(CreateOrderResponse {
        key_id: state.payments.key_id().to_string(),
        certificate_code: certificate.certificate_code,
        order,
    }))
}

/// Payment confirmation webhook.
///
/// * The signature is checked against the raw body before anything is parsed.
/// * Only `payment.captured` moves a certificate to paid; other events are acknowledged.
/// * The unpaid → paid flip happens once; repeats are acknowledged without notifying again.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Rejected payment webhook without signature header");
            AppError::AuthError("Missing webhook signature".to_string())
        })?;

    if !verify_payload(&state.config.razorpay.webhook_secret, &body, signature) {
        tracing::warn!(
            "Rejected payment webhook with invalid signature ({} byte body)",
            body.len()
        );
        return Err(AppError::AuthError("Invalid webhook signature".to_string()));
    }

    let event: WebhookEvent = serde_json::from_slice(&body)?;

    if !event.is_capture() {
        tracing::info!("Acknowledged payment event '{}' without action", event.event);
        return Ok(Json(json!({ "status": "ok" })));
    }

    let code = event.certificate_code().ok_or_else(|| {
        AppError::BadRequest("Payment event carries no certificate code".to_string())
    })?;

    let certificate = state
        .store
        .find_certificate(code)
        .await?
        .ok_or(AppError::NotFound("Certificate not found".to_string()))?;

    if !state.store.mark_paid(&certificate.certificate_code).await? {
        tracing::info!(
            "Certificate {} already paid, ignoring repeat capture {:?}",
            certificate.certificate_code,
            event.payment_id()
        );
        return Ok(Json(json!({ "status": "ok" })));
    }

    tracing::info!(
        "Certificate {} marked paid by payment {:?}",
        certificate.certificate_code,
        event.payment_id()
    );

    let certificate = Certificate {
        is_paid: true,
        ..certificate
    };
    notify_issued(&state, &certificate).await;

    Ok(Json(json!({ "status": "ok" })))
}

/// Sends the issuance notice. Failures never undo the payment; they are
/// logged and stored for manual follow-up.
async fn notify_issued(state: &AppState, certificate: &Certificate) {
    let result = match state.store.find_user(certificate.user_id).await {
        Ok(Some(user)) => state.notifier.certificate_issued(&user, certificate).await,
        Ok(None) => Err(AppError::InternalServerError(format!(
            "User {} not found",
            certificate.user_id
        ))),
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tracing::error!(
            "Issuance notification failed for {}: {}",
            certificate.certificate_code,
            e
        );
        if let Err(record_err) = state
            .store
            .record_notification_failure(&certificate.certificate_code, &e.to_string())
            .await
        {
            tracing::error!(
                "Could not record notification failure for {}: {}",
                certificate.certificate_code,
                record_err
            );
        }
    }
}

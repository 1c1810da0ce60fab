// src/handlers/certificate.rs

use axum::{
    Json,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::{
    error::AppError,
    models::certificate::{Certificate, VerificationResponse},
    services::renderer::CertificateView,
    state::AppState,
    store::DynStore,
};

const PNG_CONTENT_TYPE: &str = "image/png";

async fn load_certificate(store: &DynStore, code: &str) -> Result<Certificate, AppError> {
    store
        .find_certificate(code)
        .await?
        .ok_or(AppError::NotFound("Certificate not found".to_string()))
}

/// Renders a certificate, watermarked unless it has been paid for.
/// Rasterising is CPU-bound, so it runs on the blocking pool.
async fn render_certificate(
    state: &AppState,
    certificate: &Certificate,
    watermark: bool,
) -> Result<Vec<u8>, AppError> {
    let holder_name = state
        .store
        .find_user(certificate.user_id)
        .await?
        .map_or_else(|| "Candidate".to_string(), |u| u.display_name().to_string());

    let title = state
        .store
        .find_certificate_type(&certificate.certificate_type)
        .await?
        .map(|t| t.display_title())
        .unwrap_or_else(|| certificate.certificate_type.clone());

    let verification_url = state.config.verification_url(&certificate.certificate_code);
    let renderer = state.renderer.clone();
    let certificate = certificate.clone();

    tokio::task::spawn_blocking(move || {
        renderer.render(
            &CertificateView {
                certificate: &certificate,
                holder_name: &holder_name,
                certificate_title: &title,
                verification_url: &verification_url,
            },
            watermark,
        )
    })
    .await
    .map_err(|e| AppError::InternalServerError(format!("Render task failed: {}", e)))?
}

/// Preview is always available. Unpaid certificates carry the preview watermark.
pub async fn preview_certificate(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response, AppError> {
    let certificate = load_certificate(&state.store, &code).await?;
    let png = render_certificate(&state, &certificate, !certificate.is_paid).await?;

    Ok((
        [
            (header::CONTENT_TYPE, PNG_CONTENT_TYPE.to_string()),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        png,
    )
        .into_response())
}

/// Clean certificate download. Refused with 402 until payment is confirmed.
pub async fn download_certificate(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response, AppError> {
    let certificate = load_certificate(&state.store, &code).await?;

    if !certificate.is_paid {
        return Err(AppError::PaymentRequired("Payment required".to_string()));
    }

    let png = render_certificate(&state, &certificate, false).await?;

    Ok((
        [
            (header::CONTENT_TYPE, PNG_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}.png\"", certificate.certificate_code),
            ),
        ],
        png,
    )
        .into_response())
}

/// Public verification of a certificate code.
pub async fn verify_certificate(
    State(store): State<DynStore>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let certificate = load_certificate(&store, &code).await?;

    Ok(Json(VerificationResponse {
        certificate_code: certificate.certificate_code,
        certificate_type: certificate.certificate_type,
        grade: certificate.grade,
        percentage: certificate.percentage,
        issued_at: certificate.issued_at,
    }))
}

// src/handlers/catalog.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::{error::AppError, models::catalog::CertificateSummary, store::DynStore};

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Lists every certificate type candidates can sit for.
pub async fn list_certificates(State(store): State<DynStore>) -> Result<impl IntoResponse, AppError> {
    let summaries: Vec<CertificateSummary> = store
        .list_certificate_types()
        .await?
        .into_iter()
        .map(CertificateSummary::from)
        .collect();

    Ok(Json(summaries))
}

// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{catalog, certificate, exam, payment},
    state::AppState,
};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origins)
    }
}

/// Assembles the main application router.
///
/// * Exam routes: catalog, question papers, submissions.
/// * Certificate routes: preview, gated download, public verification.
/// * Payment routes: order creation and the provider webhook.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let exam_routes = Router::new()
        .route("/{code}/questions", get(exam::get_questions))
        .route("/submit", post(exam::submit_exam));

    let certificate_routes = Router::new()
        .route("/{code}/preview", get(certificate::preview_certificate))
        .route("/{code}/download", get(certificate::download_certificate));

    let payment_routes = Router::new().route("/create/{code}", post(payment::create_order));

    Router::new()
        .route("/health", get(catalog::health))
        .route("/certificates", get(catalog::list_certificates))
        .route("/verify/{code}", get(certificate::verify_certificate))
        .route("/webhook/payment", post(payment::payment_webhook))
        .nest("/exam", exam_routes)
        .nest("/certificate", certificate_routes)
        .nest("/payment", payment_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

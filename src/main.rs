// src/main.rs

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use certify_backend::config::Config;
use certify_backend::grading::LengthHeuristic;
use certify_backend::routes;
use certify_backend::seed;
use certify_backend::services::{
    notifier::{LogNotifier, Notifier, SmtpNotifier},
    payment_provider::RazorpayClient,
    renderer::CertificateRenderer,
};
use certify_backend::state::AppState;
use certify_backend::store::{DynStore, MemoryStore, PgStore};
use dotenvy::dotenv;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let store: DynStore = match &config.database_url {
        Some(url) => {
            let pool = connect_with_retry(url).await;

            // Run Migrations Automatically
            tracing::info!("Running migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Migrations applied successfully.");

            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store. Data is lost on restart.");
            Arc::new(MemoryStore::new())
        }
    };

    // Seed catalog and the LEVEL-1 bank
    if let Err(e) = seed::seed(store.as_ref()).await {
        tracing::error!("Failed to seed catalog: {:?}", e);
    }

    let notifier: Arc<dyn Notifier> = match &config.smtp {
        Some(smtp) => match SmtpNotifier::new(smtp, config.clone()) {
            Ok(notifier) => Arc::new(notifier),
            Err(e) => {
                tracing::error!("SMTP setup failed, falling back to log notifier: {:?}", e);
                Arc::new(LogNotifier)
            }
        },
        None => {
            tracing::warn!("SMTP_SERVER not set, issuance emails will only be logged.");
            Arc::new(LogNotifier)
        }
    };

    // Create AppState
    let state = AppState {
        store,
        notifier,
        payments: Arc::new(RazorpayClient::new(&config.razorpay)),
        renderer: Arc::new(CertificateRenderer::new(config.issuer_name.clone())),
        evaluator: Arc::new(LengthHeuristic::default()),
        config: config.clone(),
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    // Start the server
    axum::serve(listener, app).await.unwrap();
}

// Initialize Database Pool with Retry
async fn connect_with_retry(database_url: &str) -> PgPool {
    let mut retry_count = 0;
    loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await
        {
            Ok(pool) => {
                tracing::info!("Database connected...");
                return pool;
            }
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to connect to database after 5 retries: {}", e);
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}

// src/bin/load_questions.rs

//! Loads a question bank from a JSON file into Postgres.
//!
//! ```text
//! load-questions --file level2.json
//! ```
//!
//! The file holds `{"certificate_code": "...", "questions": [...]}`. Every
//! question is validated before anything is written, and the batch is
//! inserted in a single transaction.

use std::path::PathBuf;

use certify_backend::{
    error::AppError,
    models::question::QuestionBankFile,
    seed,
    store::{PgStore, Store},
};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use validator::Validate;

#[derive(Debug, Parser)]
#[command(about = "Append questions from a JSON file to a certificate's bank")]
struct Args {
    /// Path to the question bank JSON file.
    #[clap(long)]
    file: PathBuf,

    #[clap(long, env)]
    database_url: String,

    /// Validate the file without writing to the database.
    #[clap(long, default_value_t = false)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!("Loading questions failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.file).map_err(|e| {
        AppError::BadRequest(format!("Cannot read {}: {}", args.file.display(), e))
    })?;
    let bank: QuestionBankFile = serde_json::from_str(&raw)?;

    for (index, question) in bank.questions.iter().enumerate() {
        question.validate().map_err(|e| {
            AppError::BadRequest(format!("Question #{} is invalid: {}", index + 1, e))
        })?;
    }

    tracing::info!(
        "{} valid questions for {}",
        bank.questions.len(),
        bank.certificate_code
    );
    if args.dry_run {
        return Ok(());
    }

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&args.database_url)
        .await?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| AppError::InternalServerError(format!("Migration failed: {}", e)))?;

    let store = PgStore::new(pool);

    // Catalog rows must exist before their banks can be filled.
    for certificate_type in seed::catalog() {
        store.insert_certificate_type(&certificate_type).await?;
    }

    // One transaction: a failure leaves the bank as it was.
    let stored = store
        .add_questions(&bank.certificate_code, &bank.questions)
        .await?;
    if let (Some(first), Some(last)) = (stored.first(), stored.last()) {
        tracing::debug!("Inserted positions {}..={}", first.position, last.position);
    }

    tracing::info!(
        "Loaded {} questions into {}",
        bank.questions.len(),
        bank.certificate_code
    );
    Ok(())
}

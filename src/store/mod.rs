// src/store/mod.rs

//! Persistence for the catalog, question banks, attempt ledger and certificates.
//!
//! Handlers only see the [`Store`] trait. `PgStore` is the production backend,
//! `MemoryStore` serves local runs without a database and the test suite.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    grading::AnswerRecord,
    models::{
        attempt::{Answer, Attempt},
        catalog::CertificateType,
        certificate::Certificate,
        question::{NewQuestion, Question},
        user::User,
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type DynStore = Arc<dyn Store>;

/// Everything needed to persist one graded submission.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub full_name: Option<String>,

    /// Normalised email. `None` creates a fresh anonymous user.
    pub email: Option<String>,

    pub certificate_code: String,
    pub total_marks: i32,
    pub marks_obtained: i32,
    pub percentage: f64,
    pub passed: bool,
    pub records: Vec<AnswerRecord>,

    /// Used only when `passed`: prefix of the minted certificate code.
    pub certificate_prefix: String,
    pub grade: String,
    pub submitted_at: DateTime<Utc>,
}

/// Rows written by [`Store::record_submission`].
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub user: User,
    pub attempt: Attempt,
    pub answers: Vec<Answer>,

    /// Present exactly when the attempt passed.
    pub certificate: Option<Certificate>,
}

/// A notifier failure kept for manual follow-up.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationFailure {
    pub certificate_code: String,
    pub error: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn list_certificate_types(&self) -> Result<Vec<CertificateType>, AppError>;

    async fn find_certificate_type(&self, code: &str) -> Result<Option<CertificateType>, AppError>;

    /// Inserts the type unless its code already exists. Returns whether a row was added.
    async fn insert_certificate_type(&self, certificate_type: &CertificateType) -> Result<bool, AppError>;

    /// Bank of one certificate in question order.
    async fn questions_for(&self, certificate_code: &str) -> Result<Vec<Question>, AppError>;

    /// Appends a question to a bank. `NotFound` if the certificate type does not exist.
    async fn add_question(&self, certificate_code: &str, question: &NewQuestion) -> Result<Question, AppError>;

    /// Appends a batch of questions in order. Either all of them are stored or none.
    async fn add_questions(
        &self,
        certificate_code: &str,
        questions: &[NewQuestion],
    ) -> Result<Vec<Question>, AppError>;

    /// Resolves the user, writes the attempt with its answers and, when it
    /// passed, the certificate. All of it or none of it becomes visible.
    async fn record_submission(&self, submission: NewSubmission) -> Result<SubmissionOutcome, AppError>;

    async fn find_attempt(&self, attempt_id: i64) -> Result<Option<Attempt>, AppError>;

    async fn answers_for_attempt(&self, attempt_id: i64) -> Result<Vec<Answer>, AppError>;

    async fn find_certificate(&self, certificate_code: &str) -> Result<Option<Certificate>, AppError>;

    async fn find_user(&self, user_id: i64) -> Result<Option<User>, AppError>;

    /// Flips `is_paid` to true if it is still false.
    /// Returns `true` only for the call that performed the transition.
    async fn mark_paid(&self, certificate_code: &str) -> Result<bool, AppError>;

    async fn record_notification_failure(&self, certificate_code: &str, error: &str) -> Result<(), AppError>;

    async fn notification_failures(&self) -> Result<Vec<NotificationFailure>, AppError>;
}

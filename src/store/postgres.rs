// src/store/postgres.rs

use async_trait::async_trait;
use chrono::Datelike;
use sqlx::{PgConnection, PgPool, Postgres, Transaction, types::Json};

use super::{NewSubmission, NotificationFailure, Store, SubmissionOutcome};
use crate::{
    error::AppError,
    models::{
        attempt::{Answer, AnswerValue, Attempt},
        catalog::CertificateType,
        certificate::{Certificate, format_certificate_code},
        question::{NewQuestion, Question},
        user::User,
    },
};

/// Helper struct for reading questions; `kind` and `options` need conversion.
#[derive(sqlx::FromRow)]
struct QuestionRow {
    id: i64,
    certificate_code: String,
    position: i32,
    text: String,
    kind: String,
    max_marks: i32,
    options: Json<Vec<String>>,
    correct_option: Option<i32>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = AppError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        Ok(Question {
            id: row.id,
            certificate_code: row.certificate_code,
            position: row.position,
            text: row.text,
            kind: row.kind.parse().map_err(AppError::InternalServerError)?,
            max_marks: row.max_marks,
            options: row.options.0,
            correct_option: row.correct_option,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AnswerRow {
    id: i64,
    attempt_id: i64,
    question_id: i64,
    submitted_value: Option<Json<AnswerValue>>,
    correct_option: Option<i32>,
    marks_awarded: i32,
}

impl From<AnswerRow> for Answer {
    fn from(row: AnswerRow) -> Self {
        Answer {
            id: row.id,
            attempt_id: row.attempt_id,
            question_id: row.question_id,
            submitted_value: row.submitted_value.map(|v| v.0),
            correct_option: row.correct_option,
            marks_awarded: row.marks_awarded,
        }
    }
}

#[derive(sqlx::FromRow)]
struct NotificationFailureRow {
    certificate_code: String,
    error: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

const QUESTION_COLUMNS: &str =
    "id, certificate_code, position, text, kind, max_marks, options, correct_option";
const ATTEMPT_COLUMNS: &str = "id, user_id, certificate_code, attempt_number, total_marks, \
     marks_obtained, percentage, passed, created_at";
const CERTIFICATE_COLUMNS: &str = "id, user_id, attempt_id, certificate_code, certificate_type, \
     grade, percentage, is_paid, issued_at";

/// Postgres-backed store. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Inserts one question at the end of its bank.
    async fn insert_question(
        conn: &mut PgConnection,
        certificate_code: &str,
        q: &NewQuestion,
    ) -> Result<Question, AppError> {
        let known: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM certificate_types WHERE code = $1)")
                .bind(certificate_code)
                .fetch_one(&mut *conn)
                .await?;
        if !known {
            return Err(AppError::NotFound(format!(
                "Certificate type '{}' not found",
                certificate_code
            )));
        }

        let row = sqlx::query_as::<_, QuestionRow>(&format!(
            r#"
            INSERT INTO questions (certificate_code, position, text, kind, max_marks, options, correct_option)
            VALUES (
                $1,
                (SELECT COALESCE(MAX(position), 0) + 1 FROM questions WHERE certificate_code = $1),
                $2, $3, $4, $5, $6
            )
            RETURNING {}
            "#,
            QUESTION_COLUMNS
        ))
        .bind(certificate_code)
        .bind(&q.text)
        .bind(q.kind.as_str())
        .bind(q.max_marks)
        .bind(Json(&q.options))
        .bind(q.correct_option)
        .fetch_one(&mut *conn)
        .await?;

        Question::try_from(row)
    }

    /// Looks the user up by email, creating them if needed. Without an email
    /// every call creates a new anonymous user.
    async fn resolve_user(
        tx: &mut Transaction<'_, Postgres>,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User, AppError> {
        let user = match email {
            // The no-op update makes RETURNING yield the existing row on conflict.
            Some(email) => {
                sqlx::query_as::<_, User>(
                    r#"
                    INSERT INTO users (full_name, email)
                    VALUES ($1, $2)
                    ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
                    RETURNING id, full_name, email, created_at
                    "#,
                )
                .bind(full_name)
                .bind(email)
                .fetch_one(&mut **tx)
                .await?
            }
            None => {
                sqlx::query_as::<_, User>(
                    r#"
                    INSERT INTO users (full_name, email)
                    VALUES ($1, NULL)
                    RETURNING id, full_name, email, created_at
                    "#,
                )
                .bind(full_name)
                .fetch_one(&mut **tx)
                .await?
            }
        };
        Ok(user)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn list_certificate_types(&self) -> Result<Vec<CertificateType>, AppError> {
        let types = sqlx::query_as::<_, CertificateType>(
            r#"
            SELECT code, title, abbreviation, description, duration_minutes, mcq_count,
                   short_answer_count, mcq_mark, pass_percentage, fee
            FROM certificate_types
            ORDER BY code
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list certificate types: {:?}", e);
            AppError::from(e)
        })?;

        Ok(types)
    }

    async fn find_certificate_type(&self, code: &str) -> Result<Option<CertificateType>, AppError> {
        let found = sqlx::query_as::<_, CertificateType>(
            r#"
            SELECT code, title, abbreviation, description, duration_minutes, mcq_count,
                   short_answer_count, mcq_mark, pass_percentage, fee
            FROM certificate_types
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(found)
    }

    async fn insert_certificate_type(&self, t: &CertificateType) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO certificate_types
                (code, title, abbreviation, description, duration_minutes, mcq_count,
                 short_answer_count, mcq_mark, pass_percentage, fee)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(&t.code)
        .bind(&t.title)
        .bind(&t.abbreviation)
        .bind(&t.description)
        .bind(t.duration_minutes)
        .bind(t.mcq_count)
        .bind(t.short_answer_count)
        .bind(t.mcq_mark)
        .bind(t.pass_percentage)
        .bind(t.fee)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn questions_for(&self, certificate_code: &str) -> Result<Vec<Question>, AppError> {
        let rows = sqlx::query_as::<_, QuestionRow>(&format!(
            "SELECT {} FROM questions WHERE certificate_code = $1 ORDER BY position, id",
            QUESTION_COLUMNS
        ))
        .bind(certificate_code)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch questions for {}: {:?}", certificate_code, e);
            AppError::from(e)
        })?;

        rows.into_iter().map(Question::try_from).collect()
    }

    async fn add_question(&self, certificate_code: &str, q: &NewQuestion) -> Result<Question, AppError> {
        let mut conn = self.pool.acquire().await?;
        Self::insert_question(&mut *conn, certificate_code, q).await
    }

    async fn add_questions(
        &self,
        certificate_code: &str,
        questions: &[NewQuestion],
    ) -> Result<Vec<Question>, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut stored = Vec::with_capacity(questions.len());
        for q in questions {
            stored.push(Self::insert_question(&mut *tx, certificate_code, q).await?);
        }

        tx.commit().await?;
        Ok(stored)
    }

    async fn record_submission(&self, s: NewSubmission) -> Result<SubmissionOutcome, AppError> {
        let mut tx = self.pool.begin().await?;

        let user = Self::resolve_user(&mut tx, s.full_name.as_deref(), s.email.as_deref()).await?;

        let previous: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM attempts WHERE user_id = $1 AND certificate_code = $2",
        )
        .bind(user.id)
        .bind(&s.certificate_code)
        .fetch_one(&mut *tx)
        .await?;

        let attempt = sqlx::query_as::<_, Attempt>(&format!(
            r#"
            INSERT INTO attempts
                (user_id, certificate_code, attempt_number, total_marks, marks_obtained,
                 percentage, passed, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            ATTEMPT_COLUMNS
        ))
        .bind(user.id)
        .bind(&s.certificate_code)
        .bind(i32::try_from(previous + 1).unwrap_or(i32::MAX))
        .bind(s.total_marks)
        .bind(s.marks_obtained)
        .bind(s.percentage)
        .bind(s.passed)
        .bind(s.submitted_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert attempt: {:?}", e);
            AppError::from(e)
        })?;

        let mut answers = Vec::with_capacity(s.records.len());
        for record in &s.records {
            let row = sqlx::query_as::<_, AnswerRow>(
                r#"
                INSERT INTO answers (attempt_id, question_id, submitted_value, correct_option, marks_awarded)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, attempt_id, question_id, submitted_value, correct_option, marks_awarded
                "#,
            )
            .bind(attempt.id)
            .bind(record.question_id)
            .bind(record.submitted_value.as_ref().map(Json))
            .bind(record.correct_option)
            .bind(record.marks_awarded)
            .fetch_one(&mut *tx)
            .await?;
            answers.push(Answer::from(row));
        }

        let certificate = if s.passed {
            // Serial comes from a sequence so the code is final on insert.
            let serial: i64 = sqlx::query_scalar("SELECT nextval('certificate_serial_seq')")
                .fetch_one(&mut *tx)
                .await?;
            let code = format_certificate_code(&s.certificate_prefix, s.submitted_at.year(), serial);

            let cert = sqlx::query_as::<_, Certificate>(&format!(
                r#"
                INSERT INTO certificates
                    (user_id, attempt_id, certificate_code, certificate_type, grade, percentage,
                     is_paid, issued_at)
                VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7)
                RETURNING {}
                "#,
                CERTIFICATE_COLUMNS
            ))
            .bind(user.id)
            .bind(attempt.id)
            .bind(&code)
            .bind(&s.certificate_code)
            .bind(&s.grade)
            .bind(s.percentage)
            .bind(s.submitted_at)
            .fetch_one(&mut *tx)
            .await?;
            Some(cert)
        } else {
            None
        };

        tx.commit().await?;

        Ok(SubmissionOutcome {
            user,
            attempt,
            answers,
            certificate,
        })
    }

    async fn find_attempt(&self, attempt_id: i64) -> Result<Option<Attempt>, AppError> {
        let attempt = sqlx::query_as::<_, Attempt>(&format!(
            "SELECT {} FROM attempts WHERE id = $1",
            ATTEMPT_COLUMNS
        ))
        .bind(attempt_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attempt)
    }

    async fn answers_for_attempt(&self, attempt_id: i64) -> Result<Vec<Answer>, AppError> {
        let rows = sqlx::query_as::<_, AnswerRow>(
            r#"
            SELECT id, attempt_id, question_id, submitted_value, correct_option, marks_awarded
            FROM answers
            WHERE attempt_id = $1
            ORDER BY id
            "#,
        )
        .bind(attempt_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Answer::from).collect())
    }

    async fn find_certificate(&self, certificate_code: &str) -> Result<Option<Certificate>, AppError> {
        let cert = sqlx::query_as::<_, Certificate>(&format!(
            "SELECT {} FROM certificates WHERE certificate_code = $1",
            CERTIFICATE_COLUMNS
        ))
        .bind(certificate_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(cert)
    }

    async fn find_user(&self, user_id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, full_name, email, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn mark_paid(&self, certificate_code: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE certificates SET is_paid = TRUE WHERE certificate_code = $1 AND is_paid = FALSE",
        )
        .bind(certificate_code)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to mark {} paid: {:?}", certificate_code, e);
            AppError::from(e)
        })?;

        Ok(result.rows_affected() == 1)
    }

    async fn record_notification_failure(&self, certificate_code: &str, error: &str) -> Result<(), AppError> {
        sqlx::query("INSERT INTO notification_failures (certificate_code, error) VALUES ($1, $2)")
            .bind(certificate_code)
            .bind(error)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn notification_failures(&self) -> Result<Vec<NotificationFailure>, AppError> {
        let rows = sqlx::query_as::<_, NotificationFailureRow>(
            "SELECT certificate_code, error, created_at FROM notification_failures ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| NotificationFailure {
                certificate_code: r.certificate_code,
                error: r.error,
                created_at: r.created_at,
            })
            .collect())
    }
}

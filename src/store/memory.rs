// src/store/memory.rs

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Datelike, Utc};

use super::{NewSubmission, NotificationFailure, Store, SubmissionOutcome};
use crate::{
    error::AppError,
    models::{
        attempt::{Answer, Attempt},
        catalog::CertificateType,
        certificate::{Certificate, format_certificate_code},
        question::{NewQuestion, Question},
        user::User,
    },
};

#[derive(Default)]
struct Tables {
    certificate_types: Vec<CertificateType>,
    questions: Vec<Question>,
    users: Vec<User>,
    attempts: Vec<Attempt>,
    answers: Vec<Answer>,
    certificates: Vec<Certificate>,
    notification_failures: Vec<NotificationFailure>,

    next_question_id: i64,
    next_user_id: i64,
    next_attempt_id: i64,
    next_answer_id: i64,
    next_certificate_id: i64,
    certificate_serial: i64,
}

impl Tables {
    fn ensure_certificate_type(&self, code: &str) -> Result<(), AppError> {
        if self.certificate_types.iter().any(|t| t.code == code) {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Certificate type '{}' not found", code)))
        }
    }

    fn append_question(&mut self, certificate_code: &str, question: &NewQuestion) -> Question {
        let position = self
            .questions
            .iter()
            .filter(|q| q.certificate_code == certificate_code)
            .map(|q| q.position)
            .max()
            .map_or(1, |p| p + 1);

        let row = Question {
            id: next(&mut self.next_question_id),
            certificate_code: certificate_code.to_string(),
            position,
            text: question.text.clone(),
            kind: question.kind,
            max_marks: question.max_marks,
            options: question.options.clone(),
            correct_option: question.correct_option,
        };
        self.questions.push(row.clone());
        row
    }
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

/// In-process store. Every operation runs under one lock, which gives the
/// same all-or-nothing visibility the Postgres transactions provide.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|_| AppError::InternalServerError("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_certificate_types(&self) -> Result<Vec<CertificateType>, AppError> {
        let tables = self.lock()?;
        let mut types = tables.certificate_types.clone();
        types.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(types)
    }

    async fn find_certificate_type(&self, code: &str) -> Result<Option<CertificateType>, AppError> {
        let tables = self.lock()?;
        Ok(tables.certificate_types.iter().find(|t| t.code == code).cloned())
    }

    async fn insert_certificate_type(&self, certificate_type: &CertificateType) -> Result<bool, AppError> {
        let mut tables = self.lock()?;
        if tables
            .certificate_types
            .iter()
            .any(|t| t.code == certificate_type.code)
        {
            return Ok(false);
        }
        tables.certificate_types.push(certificate_type.clone());
        Ok(true)
    }

    async fn questions_for(&self, certificate_code: &str) -> Result<Vec<Question>, AppError> {
        let tables = self.lock()?;
        let mut questions: Vec<Question> = tables
            .questions
            .iter()
            .filter(|q| q.certificate_code == certificate_code)
            .cloned()
            .collect();
        questions.sort_by_key(|q| (q.position, q.id));
        Ok(questions)
    }

    async fn add_question(&self, certificate_code: &str, question: &NewQuestion) -> Result<Question, AppError> {
        let mut tables = self.lock()?;
        tables.ensure_certificate_type(certificate_code)?;
        Ok(tables.append_question(certificate_code, question))
    }

    async fn add_questions(
        &self,
        certificate_code: &str,
        questions: &[NewQuestion],
    ) -> Result<Vec<Question>, AppError> {
        let mut tables = self.lock()?;
        tables.ensure_certificate_type(certificate_code)?;
        Ok(questions
            .iter()
            .map(|q| tables.append_question(certificate_code, q))
            .collect())
    }

    async fn record_submission(&self, submission: NewSubmission) -> Result<SubmissionOutcome, AppError> {
        let mut guard = self.lock()?;
        let tables = &mut *guard;

        if !tables
            .certificate_types
            .iter()
            .any(|t| t.code == submission.certificate_code)
        {
            return Err(AppError::NotFound(format!(
                "Certificate type '{}' not found",
                submission.certificate_code
            )));
        }

        let existing = submission
            .email
            .as_deref()
            .and_then(|email| tables.users.iter().find(|u| u.email.as_deref() == Some(email)))
            .cloned();

        let (user, is_new_user) = match existing {
            Some(user) => (user, false),
            None => {
                let user = User {
                    id: next(&mut tables.next_user_id),
                    full_name: submission.full_name.clone(),
                    email: submission.email.clone(),
                    created_at: submission.submitted_at,
                };
                (user, true)
            }
        };

        let previous = tables
            .attempts
            .iter()
            .filter(|a| a.user_id == user.id && a.certificate_code == submission.certificate_code)
            .count();

        let attempt = Attempt {
            id: next(&mut tables.next_attempt_id),
            user_id: user.id,
            certificate_code: submission.certificate_code.clone(),
            attempt_number: i32::try_from(previous + 1).unwrap_or(i32::MAX),
            total_marks: submission.total_marks,
            marks_obtained: submission.marks_obtained,
            percentage: submission.percentage,
            passed: submission.passed,
            created_at: submission.submitted_at,
        };

        let mut answers = Vec::with_capacity(submission.records.len());
        for record in &submission.records {
            answers.push(Answer {
                id: next(&mut tables.next_answer_id),
                attempt_id: attempt.id,
                question_id: record.question_id,
                submitted_value: record.submitted_value.clone(),
                correct_option: record.correct_option,
                marks_awarded: record.marks_awarded,
            });
        }

        let certificate = if submission.passed {
            let serial = next(&mut tables.certificate_serial);
            Some(Certificate {
                id: next(&mut tables.next_certificate_id),
                user_id: user.id,
                attempt_id: attempt.id,
                certificate_code: format_certificate_code(
                    &submission.certificate_prefix,
                    submission.submitted_at.year(),
                    serial,
                ),
                certificate_type: submission.certificate_code.clone(),
                grade: submission.grade.clone(),
                percentage: submission.percentage,
                is_paid: false,
                issued_at: submission.submitted_at,
            })
        } else {
            None
        };

        if let Some(cert) = &certificate {
            if tables
                .certificates
                .iter()
                .any(|c| c.attempt_id == cert.attempt_id || c.certificate_code == cert.certificate_code)
            {
                return Err(AppError::Conflict(format!(
                    "Certificate '{}' already issued",
                    cert.certificate_code
                )));
            }
        }

        // Rows become visible only after every check has passed. Ids taken by a
        // rejected submission are not reused, as with Postgres sequences.
        if is_new_user {
            tables.users.push(user.clone());
        }
        tables.attempts.push(attempt.clone());
        tables.answers.extend(answers.iter().cloned());
        if let Some(cert) = &certificate {
            tables.certificates.push(cert.clone());
        }

        Ok(SubmissionOutcome {
            user,
            attempt,
            answers,
            certificate,
        })
    }

    async fn find_attempt(&self, attempt_id: i64) -> Result<Option<Attempt>, AppError> {
        let tables = self.lock()?;
        Ok(tables.attempts.iter().find(|a| a.id == attempt_id).cloned())
    }

    async fn answers_for_attempt(&self, attempt_id: i64) -> Result<Vec<Answer>, AppError> {
        let tables = self.lock()?;
        Ok(tables
            .answers
            .iter()
            .filter(|a| a.attempt_id == attempt_id)
            .cloned()
            .collect())
    }

    async fn find_certificate(&self, certificate_code: &str) -> Result<Option<Certificate>, AppError> {
        let tables = self.lock()?;
        Ok(tables
            .certificates
            .iter()
            .find(|c| c.certificate_code == certificate_code)
            .cloned())
    }

    async fn find_user(&self, user_id: i64) -> Result<Option<User>, AppError> {
        let tables = self.lock()?;
        Ok(tables.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn mark_paid(&self, certificate_code: &str) -> Result<bool, AppError> {
        let mut tables = self.lock()?;
        match tables
            .certificates
            .iter_mut()
            .find(|c| c.certificate_code == certificate_code && !c.is_paid)
        {
            Some(cert) => {
                cert.is_paid = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn record_notification_failure(&self, certificate_code: &str, error: &str) -> Result<(), AppError> {
        let mut tables = self.lock()?;
        tables.notification_failures.push(NotificationFailure {
            certificate_code: certificate_code.to_string(),
            error: error.to_string(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn notification_failures(&self) -> Result<Vec<NotificationFailure>, AppError> {
        let tables = self.lock()?;
        Ok(tables.notification_failures.clone())
    }
}

// src/models/certificate.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Grade recorded on every issued certificate.
pub const PASS_GRADE: &str = "PASS";

/// Represents the 'certificates' table in the database.
/// `is_paid` is the only column that changes after issuance, and only from false to true.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Certificate {
    pub id: i64,
    pub user_id: i64,

    /// At most one certificate per attempt.
    pub attempt_id: i64,

    /// Globally unique public code, e.g. "IPS-2025-000042".
    pub certificate_code: String,

    /// Code of the certificate type this was issued for.
    pub certificate_type: String,

    pub grade: String,
    pub percentage: f64,
    pub is_paid: bool,
    pub issued_at: DateTime<Utc>,
}

/// Formats a certificate code from the issuance year and a serial number.
pub fn format_certificate_code(prefix: &str, year: i32, serial: i64) -> String {
    format!("{}-{}-{:06}", prefix, year, serial)
}

/// Public metadata returned by `GET /verify/{code}`.
#[derive(Debug, Serialize)]
pub struct VerificationResponse {
    pub certificate_code: String,
    pub certificate_type: String,
    pub grade: String,
    pub percentage: f64,
    pub issued_at: DateTime<Utc>,
}

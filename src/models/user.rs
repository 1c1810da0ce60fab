// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'users' table in the database.
/// Candidates are identified by email when one is supplied; there are no logins.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    pub full_name: Option<String>,

    /// Lower-cased dedup key. Anonymous candidates have none.
    pub email: Option<String>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    /// Name printed on the certificate.
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or("Candidate")
    }
}

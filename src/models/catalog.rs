// src/models/catalog.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'certificate_types' table in the database.
/// Reference data seeded at startup; request handlers only read it.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct CertificateType {
    /// Unique key, e.g. "LEVEL-1".
    pub code: String,

    pub title: String,

    /// Short form shown next to the title, e.g. "L1-BP".
    pub abbreviation: String,

    pub description: String,

    pub duration_minutes: i32,
    pub mcq_count: i32,
    pub short_answer_count: i32,

    /// Points per correct multiple-choice answer.
    pub mcq_mark: i32,

    /// Minimum percentage (0-100) required to pass.
    pub pass_percentage: f64,

    /// Certificate fee in major currency units.
    pub fee: i64,
}

impl CertificateType {
    /// Title with the abbreviation appended, as displayed to candidates.
    pub fn display_title(&self) -> String {
        format!("{} ({})", self.title, self.abbreviation)
    }

    /// Fee converted to currency subunits (paise, cents).
    pub fn fee_minor_units(&self) -> Option<i64> {
        self.fee.checked_mul(100)
    }
}

/// DTO for the public catalog listing.
#[derive(Debug, Serialize)]
pub struct CertificateSummary {
    pub code: String,
    pub title: String,
    pub duration_minutes: i32,
    pub mcq: i32,
    pub short_answers: i32,
    pub pass_percentage: f64,
    pub fee: i64,
}

impl From<CertificateType> for CertificateSummary {
    fn from(t: CertificateType) -> Self {
        Self {
            title: t.display_title(),
            code: t.code,
            duration_minutes: t.duration_minutes,
            mcq: t.mcq_count,
            short_answers: t.short_answer_count,
            pass_percentage: t.pass_percentage,
            fee: t.fee,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(fee: i64) -> CertificateType {
        CertificateType {
            code: "LEVEL-1".to_string(),
            title: "Level 1 – Basic Photography".to_string(),
            abbreviation: "L1-BP".to_string(),
            description: String::new(),
            duration_minutes: 30,
            mcq_count: 25,
            short_answer_count: 0,
            mcq_mark: 4,
            pass_percentage: 50.0,
            fee,
        }
    }

    #[test]
    fn test_fee_in_minor_units() {
        assert_eq!(level(500).fee_minor_units(), Some(50_000));
        assert_eq!(level(i64::MAX).fee_minor_units(), None);
    }

    #[test]
    fn test_summary_uses_display_title() {
        let summary = CertificateSummary::from(level(500));
        assert_eq!(summary.title, "Level 1 – Basic Photography (L1-BP)");
        assert_eq!(summary.mcq, 25);
    }
}

// src/seed.rs

//! Reference data inserted at startup.

use crate::{
    error::AppError,
    models::{
        catalog::CertificateType,
        question::{NewQuestion, QuestionKind},
    },
    store::Store,
};

const DEFAULT_FEE: i64 = 500;

fn certificate_type(
    code: &str,
    title: &str,
    abbreviation: &str,
    description: &str,
    duration_minutes: i32,
    mcq_count: i32,
    short_answer_count: i32,
    pass_percentage: f64,
) -> CertificateType {
    CertificateType {
        code: code.to_string(),
        title: title.to_string(),
        abbreviation: abbreviation.to_string(),
        description: description.to_string(),
        duration_minutes,
        mcq_count,
        short_answer_count,
        mcq_mark: 4,
        pass_percentage,
        fee: DEFAULT_FEE,
    }
}

/// The certificate catalog.
pub fn catalog() -> Vec<CertificateType> {
    let field_work = "Subject oriented, technical & practical field work";
    vec![
        certificate_type(
            "LEVEL-1",
            "Level 1 – Basic Photography",
            "L1-BP",
            "Exposure triangle, ISO, aperture, shutter speed",
            30,
            25,
            0,
            50.0,
        ),
        certificate_type(
            "LEVEL-2",
            "Level 2 – Intermediate Composition & Lighting",
            "L2-ICL",
            "High/low key, framing, positive & negative space",
            45,
            20,
            5,
            50.0,
        ),
        certificate_type(
            "LEVEL-3",
            "Level 3 – Professional Photography Fundamentals Completion Certificate",
            "L3-PPF",
            "Advanced analytical MCQs & short answers",
            60,
            20,
            5,
            50.0,
        ),
        certificate_type(
            "EPM-IWP",
            "Elite Professional Master in Indian Wedding Photography",
            "EPM-IWP",
            field_work,
            90,
            20,
            5,
            60.0,
        ),
        certificate_type(
            "EPM-EP",
            "Elite Professional Master in Event Photography",
            "EPM-EP",
            field_work,
            90,
            20,
            5,
            60.0,
        ),
        certificate_type(
            "EPM-CPP",
            "Elite Professional Master in Commercial Product Photography",
            "EPM-CPP",
            field_work,
            90,
            20,
            5,
            60.0,
        ),
        certificate_type(
            "EPM-WP",
            "Elite Professional Master in Wildlife Photography",
            "EPM-WP",
            field_work,
            90,
            20,
            5,
            60.0,
        ),
    ]
}

fn mcq(text: &str, options: [&str; 4], correct_option: i32) -> NewQuestion {
    NewQuestion {
        text: text.to_string(),
        kind: QuestionKind::Mcq,
        max_marks: 4,
        options: options.iter().map(|o| o.to_string()).collect(),
        correct_option: Some(correct_option),
    }
}

/// Starter bank for LEVEL-1.
pub fn level_one_questions() -> Vec<NewQuestion> {
    vec![
        mcq(
            "Which element controls the amount of light entering the camera?",
            ["ISO", "Shutter Speed", "Aperture", "White Balance"],
            3,
        ),
        mcq(
            "Which camera setting primarily controls image noise?",
            ["Aperture", "ISO", "Shutter Speed", "Focal Length"],
            2,
        ),
        mcq(
            "Shutter speed mainly affects which aspect of a photograph?",
            ["Colour saturation", "Motion blur", "Lens sharpness", "Sensor size"],
            2,
        ),
        mcq(
            "What does a lower f-number (e.g. f/1.8) indicate?",
            ["Small aperture", "Large aperture", "Low ISO", "Slow shutter speed"],
            2,
        ),
        mcq(
            "Which three elements form the exposure triangle?",
            [
                "ISO, Aperture, Shutter Speed",
                "ISO, Focus, Zoom",
                "Aperture, White Balance, FPS",
                "Shutter Speed, Colour, ISO",
            ],
            1,
        ),
    ]
}

/// Inserts missing catalog entries and fills the LEVEL-1 bank if it is empty.
/// Existing rows are never modified.
pub async fn seed(store: &dyn Store) -> Result<(), AppError> {
    for certificate_type in catalog() {
        if store.insert_certificate_type(&certificate_type).await? {
            tracing::info!("Seeded certificate type {}", certificate_type.code);
        }
    }

    if store.questions_for("LEVEL-1").await?.is_empty() {
        store.add_questions("LEVEL-1", &level_one_questions()).await?;
        tracing::info!("Seeded LEVEL-1 question bank");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_catalog_codes_unique() {
        let codes: std::collections::HashSet<_> = catalog().into_iter().map(|t| t.code).collect();
        assert_eq!(codes.len(), 7);
    }

    #[test]
    fn test_seed_questions_are_valid() {
        for q in level_one_questions() {
            assert!(q.validate().is_ok(), "invalid seed question: {}", q.text);
        }
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = crate::store::MemoryStore::new();
        seed(&store).await.unwrap();
        seed(&store).await.unwrap();

        assert_eq!(store.list_certificate_types().await.unwrap().len(), 7);
        assert_eq!(store.questions_for("LEVEL-1").await.unwrap().len(), 5);
    }
}

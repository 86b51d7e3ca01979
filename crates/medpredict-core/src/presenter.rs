//! # Presenter Module
//!
//! Maps a model label to the fixed diagnosis text for each disease.
//!
//! Pure: no display logic lives here, only the message and how
//! prominently it should be shown.

use crate::{Disease, Label};
use serde::Serialize;

/// How a diagnosis should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The condition is predicted.
    Alert,
    /// The condition is not predicted.
    Clear,
}

impl From<Label> for Severity {
    fn from(label: Label) -> Self {
        match label {
            Label::Positive => Severity::Alert,
            Label::Negative => Severity::Clear,
        }
    }
}

/// A diagnosis ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnosis {
    pub disease: Disease,
    pub label: Label,
    pub severity: Severity,
    pub message: &'static str,
}

impl Diagnosis {
    #[must_use]
    pub fn is_alert(&self) -> bool {
        self.severity == Severity::Alert
    }
}

/// Build the diagnosis for `label` as returned by the `disease` model.
#[must_use]
pub fn present(disease: Disease, label: Label) -> Diagnosis {
    Diagnosis {
        disease,
        label,
        severity: Severity::from(label),
        message: message(disease, label),
    }
}

fn message(disease: Disease, label: Label) -> &'static str {
    match (disease, label) {
        (Disease::Diabetes, Label::Positive) => "The person is diabetic",
        (Disease::Diabetes, Label::Negative) => "The person is not diabetic",
        (Disease::HeartDisease, Label::Positive) => "The person has heart disease",
        (Disease::HeartDisease, Label::Negative) => "The person does not have heart disease",
        (Disease::Parkinsons, Label::Positive) => "The person has Parkinson's disease",
        (Disease::Parkinsons, Label::Negative) => "The person does not have Parkinson's disease",
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_is_alert() {
        let diagnosis = present(Disease::Diabetes, Label::Positive);
        assert!(diagnosis.is_alert());
        assert_eq!(diagnosis.message, "The person is diabetic");
    }

    #[test]
    fn negative_is_clear() {
        let diagnosis = present(Disease::HeartDisease, Label::Negative);
        assert_eq!(diagnosis.severity, Severity::Clear);
        assert_eq!(diagnosis.message, "The person does not have heart disease");
    }

    #[test]
    fn every_disease_has_distinct_messages() {
        for disease in Disease::ALL {
            let pos = present(disease, Label::Positive);
            let neg = present(disease, Label::Negative);
            assert_ne!(pos.message, neg.message);
        }
        assert_eq!(
            present(Disease::Parkinsons, Label::Positive).message,
            "The person has Parkinson's disease"
        );
    }
}

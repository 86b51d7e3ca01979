//! # MedPredict Core
//!
//! The pure prediction pipeline behind the MedPredict forms.
//!
//! Every submission follows the same straight line:
//!
//! ```text
//! InputRecord ─► validate ─► FeatureVector ─► ModelRegistry::invoke ─► Label ─► Diagnosis
//! ```
//!
//! The three diseases differ only in their [`FormSchema`] table; there is a
//! single validator, a single invoker and a single presenter.
//!
//! This crate performs no I/O and has no async or network dependencies.
//! [`formats`] turns artifact bytes into models; reading the files is left
//! to the application.

pub mod error;
pub mod formats;
pub mod invoker;
pub mod model;
pub mod presenter;
pub mod schema;
pub mod submission;
pub mod validate;

pub use error::UnknownDisease;
pub use invoker::{InvokeError, ModelRegistry};
pub use model::{Classifier, DecisionTree, LinearModel, ModelArtifact, ModelError, TreeNode};
pub use presenter::{Diagnosis, Severity, present};
pub use schema::{FieldDescriptor, FormSchema, PlausibleRange};
pub use submission::{Outcome, submit};
pub use validate::{InputRecord, RangeWarning, Validated, ValidationError, ValidationErrors, validate};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// DISEASE
// =============================================================================

/// The diseases a model can be registered for.
///
/// Each disease owns exactly one schema and at most one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Disease {
    #[serde(rename = "diabetes")]
    Diabetes,
    #[serde(rename = "heart")]
    HeartDisease,
    #[serde(rename = "parkinsons")]
    Parkinsons,
}

impl Disease {
    /// All diseases, in navigation order.
    pub const ALL: [Disease; 3] = [Disease::Diabetes, Disease::HeartDisease, Disease::Parkinsons];

    /// URL / CLI identifier.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Disease::Diabetes => "diabetes",
            Disease::HeartDisease => "heart",
            Disease::Parkinsons => "parkinsons",
        }
    }

    /// Human-readable name used in navigation.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Disease::Diabetes => "Diabetes",
            Disease::HeartDisease => "Heart Disease",
            Disease::Parkinsons => "Parkinson's",
        }
    }

    /// File stem of the model artifact, e.g. `heart_disease_model`.
    #[must_use]
    pub fn artifact_stem(self) -> &'static str {
        match self {
            Disease::Diabetes => "diabetes_model",
            Disease::HeartDisease => "heart_disease_model",
            Disease::Parkinsons => "parkinsons_model",
        }
    }
}

impl fmt::Display for Disease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Disease {
    type Err = UnknownDisease;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "diabetes" => Ok(Disease::Diabetes),
            "heart" | "heart-disease" | "heart_disease" => Ok(Disease::HeartDisease),
            "parkinsons" | "parkinson" | "parkinson's" => Ok(Disease::Parkinsons),
            _ => Err(UnknownDisease(s.to_string())),
        }
    }
}

// =============================================================================
// LABEL
// =============================================================================

/// Binary output of a classifier.
///
/// Serialized as the raw `0` / `1` the model produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Label {
    /// Label `0`: the condition is not predicted.
    Negative,
    /// Label `1`: the condition is predicted.
    Positive,
}

impl Label {
    /// Raw numeric value of the label.
    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Label::Negative => 0,
            Label::Positive => 1,
        }
    }

    #[must_use]
    pub fn is_positive(self) -> bool {
        self == Label::Positive
    }
}

impl From<Label> for u8 {
    fn from(label: Label) -> Self {
        label.as_u8()
    }
}

impl TryFrom<u8> for Label {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Label::Negative),
            1 => Ok(Label::Positive),
            other => Err(ModelError::InvalidLabel(u32::from(other))),
        }
    }
}

// =============================================================================
// FEATURE VECTOR
// =============================================================================

/// Ordered numeric inputs for a model, one per schema field.
///
/// Only the validator builds these from user input, so a vector coming out
/// of [`validate`] always has the schema's arity and order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disease_slug_round_trip() {
        for disease in Disease::ALL {
            assert_eq!(disease.slug().parse::<Disease>(), Ok(disease));
        }
    }

    #[test]
    fn disease_accepts_aliases() {
        assert_eq!("Heart_Disease".parse::<Disease>(), Ok(Disease::HeartDisease));
        assert_eq!(" parkinson ".parse::<Disease>(), Ok(Disease::Parkinsons));
        assert!("cancer".parse::<Disease>().is_err());
    }

    #[test]
    fn disease_serializes_as_slug() {
        let json = serde_json::to_string(&Disease::HeartDisease).ok();
        assert_eq!(json.as_deref(), Some("\"heart\""));
    }

    #[test]
    fn label_from_raw() {
        assert_eq!(Label::try_from(0), Ok(Label::Negative));
        assert_eq!(Label::try_from(1), Ok(Label::Positive));
        assert_eq!(Label::try_from(2), Err(ModelError::InvalidLabel(2)));
    }

    #[test]
    fn label_serializes_as_number() {
        let json = serde_json::to_string(&Label::Positive).ok();
        assert_eq!(json.as_deref(), Some("1"));
        let parsed: Result<Label, _> = serde_json::from_str("7");
        assert!(parsed.is_err());
    }
}

//! # Submission Module
//!
//! One form submission, end to end: validate, invoke, present.
//!
//! A submission with any validation error never reaches the model.

use crate::invoker::{InvokeError, ModelRegistry};
use crate::presenter::{Diagnosis, present};
use crate::schema::FormSchema;
use crate::validate::{InputRecord, RangeWarning, ValidationErrors, validate};
use crate::{Disease, FeatureVector};

/// What the user gets back for one submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Validation failed; the model was not called.
    Rejected {
        disease: Disease,
        errors: ValidationErrors,
    },
    /// The model produced a label.
    Diagnosed {
        diagnosis: Diagnosis,
        warnings: Vec<RangeWarning>,
        features: FeatureVector,
    },
}

impl Outcome {
    #[must_use]
    pub fn disease(&self) -> Disease {
        match self {
            Outcome::Rejected { disease, .. } => *disease,
            Outcome::Diagnosed { diagnosis, .. } => diagnosis.disease,
        }
    }

    #[must_use]
    pub fn diagnosis(&self) -> Option<&Diagnosis> {
        match self {
            Outcome::Diagnosed { diagnosis, .. } => Some(diagnosis),
            Outcome::Rejected { .. } => None,
        }
    }

    #[must_use]
    pub fn errors(&self) -> Option<&ValidationErrors> {
        match self {
            Outcome::Rejected { errors, .. } => Some(errors),
            Outcome::Diagnosed { .. } => None,
        }
    }

    #[must_use]
    pub fn warnings(&self) -> &[RangeWarning] {
        match self {
            Outcome::Diagnosed { warnings, .. } => warnings,
            Outcome::Rejected { .. } => &[],
        }
    }

    /// Format as plain text for terminals.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut output = String::new();
        let schema = FormSchema::for_disease(self.disease());

        output.push_str(&format!("┌ {}\n", schema.title));

        match self {
            Outcome::Rejected { errors, .. } => {
                output.push_str("│ ERRORS (prediction not run)\n");
                for error in errors {
                    output.push_str(&format!("│ ✗ {error}\n"));
                }
            }
            Outcome::Diagnosed {
                diagnosis,
                warnings,
                ..
            } => {
                if !warnings.is_empty() {
                    output.push_str("│ WARNINGS\n");
                    for warning in warnings {
                        output.push_str(&format!("│ ! {warning}\n"));
                    }
                }
                let marker = if diagnosis.is_alert() { "⚠" } else { "✓" };
                output.push_str(&format!("│ {marker} {}\n", diagnosis.message));
            }
        }

        output.push_str("└ This is a predictive tool; not a substitute for medical advice.\n");
        output
    }
}

/// Run one submission for `disease`.
///
/// Validation failures are an `Ok(Outcome::Rejected)`: they are an expected
/// result for the user, not a fault. `Err` is reserved for model problems.
pub fn submit(
    registry: &ModelRegistry,
    disease: Disease,
    record: &InputRecord,
) -> Result<Outcome, InvokeError> {
    let schema = FormSchema::for_disease(disease);

    let validated = match validate(schema, record) {
        Ok(validated) => validated,
        Err(errors) => return Ok(Outcome::Rejected { disease, errors }),
    };

    let label = registry.invoke(disease, &validated.features)?;

    Ok(Outcome::Diagnosed {
        diagnosis: present(disease, label),
        warnings: validated.warnings,
        features: validated.features,
    })
}

// =============================================================================
// TESTS
// =============================================================================

//! # Validate Module
//!
//! The form validator: raw strings in, feature vector (or errors) out.
//!
//! Policy:
//! - every field is required; blank or whitespace-only is `MissingField`
//! - a value that does not parse to a finite number is `NotNumeric`
//! - all offending fields are reported in one pass, in schema order
//! - plausible ranges only produce warnings, and only once parsing succeeded

use crate::FeatureVector;
use crate::schema::{FormSchema, PlausibleRange};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

// =============================================================================
// INPUT RECORD
// =============================================================================

/// Raw values captured from a form, in schema order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InputRecord {
    values: Vec<String>,
}

impl InputRecord {
    /// Build a record from positional values.
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a record from `key=value` pairs, placing each value at its
    /// schema position.
    ///
    /// Keys the schema does not know are rejected. Keys that never appear
    /// are left blank and will be reported as missing by [`validate`].
    /// If a key repeats, the last value wins.
    pub fn from_named<I, K, V>(schema: &FormSchema, pairs: I) -> Result<Self, ValidationErrors>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut values = vec![String::new(); schema.arity()];
        let mut errors = Vec::new();

        for (key, value) in pairs {
            let key = key.as_ref();
            match schema.position(key) {
                Some(idx) => values[idx] = value.into(),
                None => errors.push(ValidationError::UnknownField {
                    field: key.to_string(),
                }),
            }
        }

        if errors.is_empty() {
            Ok(Self { values })
        } else {
            Err(ValidationErrors(errors))
        }
    }

    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// A single reason a submission cannot be sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("{field} is required.")]
    MissingField { field: String },

    #[error("{field} must be numeric.")]
    NotNumeric { field: String, value: String },

    #[error("{field} is not a field of this form.")]
    UnknownField { field: String },

    #[error("expected {expected} values, got {got}.")]
    ArityMismatch { expected: usize, got: usize },
}

impl ValidationError {
    /// The field this error is about, if it concerns a single field.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::MissingField { field }
            | ValidationError::NotNumeric { field, .. }
            | ValidationError::UnknownField { field } => Some(field),
            ValidationError::ArityMismatch { .. } => None,
        }
    }
}

/// Every error found in one submission. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    #[must_use]
    pub fn as_slice(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// User-facing messages, one per error.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.0 {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{error}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// =============================================================================
// WARNINGS
// =============================================================================

/// A parsed value outside its field's plausible range. Advisory only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeWarning {
    pub field: &'static str,
    pub value: f64,
    pub range: PlausibleRange,
}

impl fmt::Display for RangeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is outside normal range ({})", self.field, self.range)
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

/// A submission that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    pub features: FeatureVector,
    pub warnings: Vec<RangeWarning>,
}

/// Validate `record` against `schema`.
///
/// On success the feature vector has exactly `schema.arity()` entries in
/// schema order. On failure every offending field is listed.
pub fn validate(schema: &FormSchema, record: &InputRecord) -> Result<Validated, ValidationErrors> {
    if record.len() != schema.arity() {
        return Err(ValidationErrors(vec![ValidationError::ArityMismatch {
            expected: schema.arity(),
            got: record.len(),
        }]));
    }

    let mut errors = Vec::new();
    let mut values = Vec::with_capacity(schema.arity());

    for (field, raw) in schema.fields.iter().zip(record.values()) {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            errors.push(ValidationError::MissingField {
                field: field.key.to_string(),
            });
            continue;
        }
        match parse_number(trimmed) {
            Some(value) => values.push(value),
            None => errors.push(ValidationError::NotNumeric {
                field: field.key.to_string(),
                value: raw.clone(),
            }),
        }
    }

    if !errors.is_empty() {
        return Err(ValidationErrors(errors));
    }

    let warnings = schema
        .fields
        .iter()
        .zip(&values)
        .filter_map(|(field, &value)| {
            let range = field.range?;
            (!range.contains(value)).then_some(RangeWarning {
                field: field.key,
                value,
                range,
            })
        })
        .collect();

    Ok(Validated {
        features: FeatureVector::new(values),
        warnings,
    })
}

/// Finite decimal or scientific notation. `NaN` and infinities are rejected.
fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::Disease;
    use proptest::prelude::*;

    fn diabetes() -> &'static FormSchema {
        FormSchema::for_disease(Disease::Diabetes)
    }

    fn sample_diabetes() -> InputRecord {
        InputRecord::new(["2", "120", "70", "20", "79", "25.0", "0.5", "33"])
    }

    #[test]
    fn diabetes_feature_vector_order() {
        let validated = validate(diabetes(), &sample_diabetes()).unwrap();
        assert_eq!(
            validated.features.as_slice(),
            &[2.0, 120.0, 70.0, 20.0, 79.0, 25.0, 0.5, 33.0]
        );
        assert!(validated.warnings.is_empty());
    }

    #[test]
    fn blank_field_is_missing() {
        let record = InputRecord::new(["2", "120", "  ", "20", "79", "25.0", "0.5", "33"]);
        let errors = validate(diabetes(), &record).unwrap_err();
        assert_eq!(
            errors.as_slice(),
            &[ValidationError::MissingField {
                field: "BloodPressure".to_string()
            }]
        );
        assert_eq!(errors.messages(), vec!["BloodPressure is required."]);
    }

    #[test]
    fn non_numeric_field() {
        let record = InputRecord::new(["2", "abc", "70", "20", "79", "25.0", "0.5", "33"]);
        let errors = validate(diabetes(), &record).unwrap_err();
        assert_eq!(
            errors.as_slice(),
            &[ValidationError::NotNumeric {
                field: "Glucose".to_string(),
                value: "abc".to_string()
            }]
        );
        assert_eq!(errors.to_string(), "Glucose must be numeric.");
    }

    #[test]
    fn errors_are_batched_in_schema_order() {
        let record = InputRecord::new(["x", "", "70", "y", "79", "", "0.5", "33"]);
        let errors = validate(diabetes(), &record).unwrap_err();
        let fields: Vec<_> = errors.iter().filter_map(|e| e.field()).collect();
        assert_eq!(fields, vec!["Pregnancies", "Glucose", "SkinThickness", "BMI"]);
    }

    #[test]
    fn nan_and_infinity_are_not_numeric() {
        for bad in ["NaN", "inf", "-infinity"] {
            let record = InputRecord::new(["2", "120", "70", "20", "79", bad, "0.5", "33"]);
            let errors = validate(diabetes(), &record).unwrap_err();
            assert!(matches!(
                errors.as_slice(),
                [ValidationError::NotNumeric { field, .. }] if field == "BMI"
            ));
        }
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let record = InputRecord::new([" 2", "120 ", "70", "20", "79", "25", ".5", "3.3e1"]);
        let validated = validate(diabetes(), &record).unwrap();
        assert_eq!(validated.features.as_slice()[0], 2.0);
        assert_eq!(validated.features.as_slice()[7], 33.0);
    }

    #[test]
    fn out_of_range_warns_but_passes() {
        let record = InputRecord::new(["2", "120", "70", "20", "79", "25.0", "0.5", "150"]);
        let validated = validate(diabetes(), &record).unwrap();
        assert_eq!(validated.features.as_slice()[7], 150.0);
        assert_eq!(validated.warnings.len(), 1);
        assert_eq!(
            validated.warnings[0].to_string(),
            "Age is outside normal range (21-81)"
        );
    }

    #[test]
    fn heart_form_warns_on_its_ranges() {
        let heart = FormSchema::for_disease(Disease::HeartDisease);
        let record = InputRecord::new([
            "45", "2", "2", "120", "200", "0", "1", "170", "0", "0", "2", "0", "2",
        ]);
        let validated = validate(heart, &record).unwrap();
        assert_eq!(validated.warnings.len(), 1);
        assert_eq!(validated.warnings[0].field, "sex");
        assert_eq!(
            validated.warnings[0].to_string(),
            "sex is outside normal range (0-1)"
        );
    }

    #[test]
    fn wrong_arity_is_reported_alone() {
        let record = InputRecord::new(["1", "2"]);
        let errors = validate(diabetes(), &record).unwrap_err();
        assert_eq!(
            errors.as_slice(),
            &[ValidationError::ArityMismatch {
                expected: 8,
                got: 2
            }]
        );
    }

    #[test]
    fn from_named_places_values_by_key() {
        let schema = FormSchema::for_disease(Disease::HeartDisease);
        let record = InputRecord::from_named(schema, [("thal", "2"), ("age", "54")]).unwrap();
        assert_eq!(record.len(), 13);
        assert_eq!(record.values()[0], "54");
        assert_eq!(record.values()[12], "2");

        // the other eleven are blank
        let errors = validate(schema, &record).unwrap_err();
        assert_eq!(errors.len(), 11);
        assert!(errors
            .iter()
            .all(|e| matches!(e, ValidationError::MissingField { .. })));
    }

    #[test]
    fn from_named_rejects_unknown_keys() {
        let schema = FormSchema::for_disease(Disease::HeartDisease);
        let errors = InputRecord::from_named(schema, [("age", "54"), ("Cholesterol", "200")])
            .unwrap_err();
        assert_eq!(
            errors.as_slice(),
            &[ValidationError::UnknownField {
                field: "Cholesterol".to_string()
            }]
        );
    }

    #[test]
    fn parkinsons_blank_fields_are_all_reported() {
        let schema = FormSchema::for_disease(Disease::Parkinsons);
        let mut values = vec!["0.1".to_string(); 22];
        values[3] = String::new();
        values[21] = "n/a".to_string();
        let errors = validate(schema, &InputRecord::new(values)).unwrap_err();
        let fields: Vec<_> = errors.iter().filter_map(|e| e.field()).collect();
        assert_eq!(fields, vec!["Jitter_percent", "PPE"]);
    }

    #[test]
    fn validation_errors_serialize_with_kind() {
        let record = InputRecord::new(["", "120", "70", "20", "79", "25.0", "0.5", "33"]);
        let errors = validate(diabetes(), &record).unwrap_err();
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json[0]["kind"], "missing_field");
        assert_eq!(json[0]["field"], "Pregnancies");
    }

    proptest! {
        #[test]
        fn valid_numbers_keep_order_and_arity(
            values in proptest::collection::vec(-1.0e6f64..1.0e6, 22)
        ) {
            let schema = FormSchema::for_disease(Disease::Parkinsons);
            let record = InputRecord::new(values.iter().map(|v| v.to_string()));
            let validated = validate(schema, &record);
            prop_assert!(validated.is_ok());
            let validated = validated.unwrap();
            prop_assert_eq!(validated.features.len(), 22);
            prop_assert_eq!(validated.features.as_slice(), values.as_slice());
        }

        #[test]
        fn every_blank_field_is_reported(
            blanks in proptest::collection::btree_set(0usize..13, 1..13)
        ) {
            let schema = FormSchema::for_disease(Disease::HeartDisease);
            let values: Vec<String> = (0..13)
                .map(|i| if blanks.contains(&i) { String::new() } else { "1".to_string() })
                .collect();
            let errors = validate(schema, &InputRecord::new(values)).unwrap_err();
            prop_assert_eq!(errors.len(), blanks.len());
            for (error, idx) in errors.iter().zip(&blanks) {
                prop_assert_eq!(error.field(), Some(schema.fields[*idx].key));
            }
        }

        #[test]
        fn validation_is_deterministic(
            values in proptest::collection::vec("[0-9a-z. ]{0,6}", 8)
        ) {
            let record = InputRecord::new(values);
            prop_assert_eq!(validate(diabetes(), &record), validate(diabetes(), &record));
        }
    }
}

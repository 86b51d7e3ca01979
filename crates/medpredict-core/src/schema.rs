//! # Schema Module
//!
//! Declarative form schemas, one static table per disease.
//!
//! The order of `fields` IS the feature order the model was trained on.
//! Nothing else in the crate is allowed to reorder inputs: layout concerns
//! (columns, tabs) live in the app and only ever iterate these tables.

use crate::Disease;
use serde::Serialize;
use std::fmt;

// =============================================================================
// PLAUSIBLE RANGE
// =============================================================================

/// Advisory bounds for a field. Inclusive on both ends.
///
/// A value outside the range produces a warning; it never blocks a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlausibleRange {
    pub min: f64,
    pub max: f64,
}

impl PlausibleRange {
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl fmt::Display for PlausibleRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

// =============================================================================
// FIELD DESCRIPTOR
// =============================================================================

/// One input of a form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldDescriptor {
    /// Feature name as the model knows it. Also the form input name.
    pub key: &'static str,
    /// Label shown next to the input.
    pub label: &'static str,
    /// Input hint (typical values).
    pub placeholder: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<PlausibleRange>,
}

impl FieldDescriptor {
    const fn ranged(
        key: &'static str,
        label: &'static str,
        placeholder: &'static str,
        min: f64,
        max: f64,
    ) -> Self {
        Self {
            key,
            label,
            placeholder,
            range: Some(PlausibleRange::new(min, max)),
        }
    }

    const fn unranged(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            placeholder: "",
            range: None,
        }
    }
}

// =============================================================================
// SCHEMA TABLES
// =============================================================================

const DIABETES_FIELDS: [FieldDescriptor; 8] = [
    FieldDescriptor::ranged("Pregnancies", "Number of Pregnancies", "0-17", 0.0, 17.0),
    FieldDescriptor::ranged("Glucose", "Glucose Level", "0-199", 0.0, 199.0),
    FieldDescriptor::ranged("BloodPressure", "Blood Pressure", "0-122", 0.0, 122.0),
    FieldDescriptor::ranged("SkinThickness", "Skin Thickness", "0-99", 0.0, 99.0),
    FieldDescriptor::ranged("Insulin", "Insulin Level", "0-846", 0.0, 846.0),
    FieldDescriptor::ranged("BMI", "BMI", "0-67.1", 0.0, 67.1),
    FieldDescriptor::ranged(
        "DiabetesPedigreeFunction",
        "Diabetes Pedigree Function",
        "0.078-2.42",
        0.078,
        2.42,
    ),
    FieldDescriptor::ranged("Age", "Age", "21-81", 21.0, 81.0),
];

const HEART_FIELDS: [FieldDescriptor; 13] = [
    FieldDescriptor::ranged("age", "Age", "29-77", 29.0, 77.0),
    FieldDescriptor::ranged("sex", "Sex", "0=Female, 1=Male", 0.0, 1.0),
    FieldDescriptor::ranged("cp", "Chest Pain type", "0-3", 0.0, 3.0),
    FieldDescriptor::ranged("trestbps", "Resting Blood Pressure", "94-200", 94.0, 200.0),
    FieldDescriptor::ranged("chol", "Serum Cholesterol", "126-564", 126.0, 564.0),
    FieldDescriptor::ranged("fbs", "Fasting Blood Sugar > 120 mg/dl", "0/1", 0.0, 1.0),
    FieldDescriptor::ranged("restecg", "Resting ECG", "0-2", 0.0, 2.0),
    FieldDescriptor::ranged("thalach", "Max Heart Rate", "71-202", 71.0, 202.0),
    FieldDescriptor::ranged("exang", "Exercise Induced Angina", "0/1", 0.0, 1.0),
    FieldDescriptor::ranged("oldpeak", "ST depression", "0-6.2", 0.0, 6.2),
    FieldDescriptor::ranged("slope", "Slope of ST segment", "0-2", 0.0, 2.0),
    FieldDescriptor::ranged("ca", "Major vessels colored", "0-3", 0.0, 3.0),
    FieldDescriptor::ranged(
        "thal",
        "Thalassemia",
        "0=normal, 1=fixed, 2=reversible",
        0.0,
        2.0,
    ),
];

const PARKINSONS_FIELDS: [FieldDescriptor; 22] = [
    FieldDescriptor::unranged("fo", "MDVP:Fo(Hz)"),
    FieldDescriptor::unranged("fhi", "MDVP:Fhi(Hz)"),
    FieldDescriptor::unranged("flo", "MDVP:Flo(Hz)"),
    FieldDescriptor::unranged("Jitter_percent", "MDVP:Jitter(%)"),
    FieldDescriptor::unranged("Jitter_Abs", "MDVP:Jitter(Abs)"),
    FieldDescriptor::unranged("RAP", "MDVP:RAP"),
    FieldDescriptor::unranged("PPQ", "MDVP:PPQ"),
    FieldDescriptor::unranged("DDP", "Jitter:DDP"),
    FieldDescriptor::unranged("Shimmer", "MDVP:Shimmer"),
    FieldDescriptor::unranged("Shimmer_dB", "MDVP:Shimmer(dB)"),
    FieldDescriptor::unranged("APQ3", "Shimmer:APQ3"),
    FieldDescriptor::unranged("APQ5", "Shimmer:APQ5"),
    FieldDescriptor::unranged("APQ", "MDVP:APQ"),
    FieldDescriptor::unranged("DDA", "Shimmer:DDA"),
    FieldDescriptor::unranged("NHR", "NHR"),
    FieldDescriptor::unranged("HNR", "HNR"),
    FieldDescriptor::unranged("RPDE", "RPDE"),
    FieldDescriptor::unranged("DFA", "DFA"),
    FieldDescriptor::unranged("spread1", "spread1"),
    FieldDescriptor::unranged("spread2", "spread2"),
    FieldDescriptor::unranged("D2", "D2"),
    FieldDescriptor::unranged("PPE", "PPE"),
];

static DIABETES: FormSchema = FormSchema {
    disease: Disease::Diabetes,
    title: "Diabetes Prediction using ML",
    problem_statement: "Diabetes is a chronic disease that occurs when blood sugar (glucose) is too high. \
        This tool predicts the likelihood of diabetes based on key medical parameters.",
    submit_label: "Predict Diabetes",
    learn_more: "https://www.who.int/news-room/fact-sheets/detail/diabetes",
    fields: &DIABETES_FIELDS,
};

static HEART: FormSchema = FormSchema {
    disease: Disease::HeartDisease,
    title: "Heart Disease Prediction using ML",
    problem_statement: "Heart disease is the leading cause of death worldwide. \
        This tool predicts the likelihood of heart disease based on vital health parameters.",
    submit_label: "Predict Heart Disease",
    learn_more: "https://www.who.int/news-room/fact-sheets/detail/cardiovascular-diseases-(cvds)",
    fields: &HEART_FIELDS,
};

static PARKINSONS: FormSchema = FormSchema {
    disease: Disease::Parkinsons,
    title: "Parkinson's Disease Prediction using ML",
    problem_statement: "Parkinson's disease is a neurodegenerative disorder affecting movement. \
        This tool predicts the likelihood of Parkinson's disease using voice measurements.",
    submit_label: "Predict Parkinson's",
    learn_more: "https://www.parkinson.org/Understanding-Parkinsons",
    fields: &PARKINSONS_FIELDS,
};

// =============================================================================
// FORM SCHEMA
// =============================================================================

/// The full description of one disease form.
#[derive(Debug, Serialize)]
pub struct FormSchema {
    pub disease: Disease,
    pub title: &'static str,
    /// Short description shown above the inputs.
    pub problem_statement: &'static str,
    pub submit_label: &'static str,
    pub learn_more: &'static str,
    pub fields: &'static [FieldDescriptor],
}

impl FormSchema {
    /// The schema registered for `disease`.
    #[must_use]
    pub fn for_disease(disease: Disease) -> &'static FormSchema {
        match disease {
            Disease::Diabetes => &DIABETES,
            Disease::HeartDisease => &HEART,
            Disease::Parkinsons => &PARKINSONS,
        }
    }

    /// Every schema, in navigation order.
    pub fn all() -> impl Iterator<Item = &'static FormSchema> {
        Disease::ALL.into_iter().map(Self::for_disease)
    }

    /// Number of features the model for this schema expects.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn field(&self, key: &str) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Position of `key` in the feature vector.
    #[must_use]
    pub fn position(&self, key: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.key == key)
    }

    /// Feature names in model order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> {
        self.fields.iter().map(|f| f.key)
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! Server-rendered form pages.
//!
//! One template serves all three diseases; the schema table drives which
//! inputs appear and in what order. Values are HTML-escaped by minijinja
//! (auto-escape is on for `.html` templates).

use medpredict_core::{Diagnosis, Disease, FormSchema, Outcome};
use minijinja::Environment;
use serde::Serialize;

const PAGE_TEMPLATE: &str = "page.html";

/// What the form shows besides its inputs.
#[derive(Debug, Default)]
pub struct FormState<'a> {
    /// Raw values in schema order. Empty for a fresh form.
    pub values: &'a [String],
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub diagnosis: Option<&'a Diagnosis>,
}

impl<'a> FormState<'a> {
    /// State after a submission: the entered values plus its outcome.
    pub fn from_outcome(values: &'a [String], outcome: &'a Outcome) -> Self {
        Self {
            values,
            errors: outcome
                .errors()
                .map(|errors| errors.messages())
                .unwrap_or_default(),
            warnings: outcome.warnings().iter().map(ToString::to_string).collect(),
            diagnosis: outcome.diagnosis(),
        }
    }
}

#[derive(Serialize)]
struct NavItem {
    slug: &'static str,
    name: &'static str,
    active: bool,
}

#[derive(Serialize)]
struct FieldView<'a> {
    key: &'static str,
    label: &'static str,
    placeholder: &'static str,
    value: &'a str,
}

#[derive(Serialize)]
struct DiagnosisView {
    message: &'static str,
    alert: bool,
}

#[derive(Serialize)]
struct PageView<'a> {
    nav: Vec<NavItem>,
    title: &'static str,
    problem_statement: &'static str,
    slug: &'static str,
    name: &'static str,
    submit_label: &'static str,
    learn_more: &'static str,
    fields: Vec<FieldView<'a>>,
    errors: &'a [String],
    warnings: &'a [String],
    diagnosis: Option<DiagnosisView>,
}

/// Template environment, built once at startup.
#[derive(Debug)]
pub struct Pages {
    env: Environment<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(PAGE_TEMPLATE, include_str!("../../templates/page.html"))?;
        Ok(Self { env })
    }

    pub fn render_form(
        &self,
        schema: &FormSchema,
        state: &FormState<'_>,
    ) -> Result<String, minijinja::Error> {
        let nav = Disease::ALL
            .into_iter()
            .map(|d| NavItem {
                slug: d.slug(),
                name: d.display_name(),
                active: d == schema.disease,
            })
            .collect();

        let fields = schema
            .fields
            .iter()
            .enumerate()
            .map(|(idx, field)| FieldView {
                key: field.key,
                label: field.label,
                placeholder: field.placeholder,
                value: state.values.get(idx).map(String::as_str).unwrap_or(""),
            })
            .collect();

        let view = PageView {
            nav,
            title: schema.title,
            problem_statement: schema.problem_statement,
            slug: schema.disease.slug(),
            name: schema.disease.display_name(),
            submit_label: schema.submit_label,
            learn_more: schema.learn_more,
            fields,
            errors: &state.errors,
            warnings: &state.warnings,
            diagnosis: state.diagnosis.map(|d| DiagnosisView {
                message: d.message,
                alert: d.is_alert(),
            }),
        };

        self.env.get_template(PAGE_TEMPLATE)?.render(&view)
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! Route handlers: HTML forms, JSON API and health.

use super::AppState;
use super::error::ApiError;
use super::pages::FormState;
use axum::Json;
use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::response::{Html, Redirect};
use medpredict_core::{
    Diagnosis, Disease, FeatureVector, FormSchema, InputRecord, Label, Outcome, RangeWarning,
    Severity, ValidationError, submit,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

fn parse_disease(slug: &str) -> Result<Disease, ApiError> {
    Ok(slug.parse::<Disease>()?)
}

// =============================================================================
// HEALTH
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub models: Vec<Disease>,
}

#[tracing::instrument(name = "GET /health", skip(state))]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        models: state.registry.diseases().collect(),
    })
}

// =============================================================================
// HTML FORMS
// =============================================================================

pub async fn index() -> Redirect {
    Redirect::to(&format!("/forms/{}", Disease::Diabetes.slug()))
}

#[tracing::instrument(name = "GET /forms", skip(state))]
pub async fn show_form(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Html<String>, ApiError> {
    let schema = FormSchema::for_disease(parse_disease(&slug)?);
    let html = state
        .pages
        .render_form(schema, &FormState::default())
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(Html(html))
}

/// Handles a form post and re-renders the page with the outcome.
///
/// Validation problems are part of the normal page (status 200). A missing
/// model renders the page with the error and status 503.
#[tracing::instrument(name = "POST /forms", skip(state, form))]
pub async fn submit_form(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Result<(StatusCode, Html<String>), ApiError> {
    let disease = parse_disease(&slug)?;
    let schema = FormSchema::for_disease(disease);
    let Form(pairs) = form.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let render = |state_view: &FormState<'_>| {
        state
            .pages
            .render_form(schema, state_view)
            .map_err(|e| ApiError::internal(e.to_string()))
    };

    // What the user typed into known fields, kept for re-display
    let mut typed = vec![String::new(); schema.arity()];
    for (key, value) in &pairs {
        if let Some(pos) = schema.position(key) {
            typed[pos].clone_from(value);
        }
    }

    let record = match InputRecord::from_named(schema, pairs) {
        Ok(record) => record,
        Err(errors) => {
            tracing::info!(%disease, errors = errors.len(), "Form rejected: unknown fields");
            let view = FormState {
                values: &typed,
                errors: errors.messages(),
                ..FormState::default()
            };
            return Ok((StatusCode::OK, Html(render(&view)?)));
        }
    };

    match submit(&state.registry, disease, &record) {
        Ok(outcome) => {
            log_outcome(&outcome);
            let view = FormState::from_outcome(record.values(), &outcome);
            Ok((StatusCode::OK, Html(render(&view)?)))
        }
        Err(err) => {
            tracing::error!(%disease, error = %err, "Prediction failed");
            let view = FormState {
                values: record.values(),
                errors: vec![err.to_string()],
                ..FormState::default()
            };
            let status = ApiError::from(err).status();
            Ok((status, Html(render(&view)?)))
        }
    }
}

fn log_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Rejected { disease, errors } => {
            tracing::info!(%disease, errors = errors.len(), "Submission rejected");
        }
        Outcome::Diagnosed {
            diagnosis,
            warnings,
            ..
        } => {
            tracing::info!(
                disease = %diagnosis.disease,
                label = diagnosis.label.as_u8(),
                warnings = warnings.len(),
                "Submission diagnosed"
            );
        }
    }
}

// =============================================================================
// JSON API
// =============================================================================

#[tracing::instrument(name = "GET /api/schemas")]
pub async fn list_schemas() -> Json<Vec<&'static FormSchema>> {
    Json(FormSchema::all().collect())
}

#[tracing::instrument(name = "GET /api/schemas/{disease}")]
pub async fn get_schema(Path(slug): Path<String>) -> Result<Json<&'static FormSchema>, ApiError> {
    Ok(Json(FormSchema::for_disease(parse_disease(&slug)?)))
}

/// Prediction request. Exactly one of `values` (positional, schema order)
/// or `fields` (by feature name) must be given. Entries may be JSON
/// numbers or strings; `null` counts as blank.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PredictRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Value>>,
}

impl PredictRequest {
    fn into_record(self, schema: &FormSchema) -> Result<InputRecord, ApiError> {
        match (self.values, self.fields) {
            (Some(values), None) => Ok(InputRecord::new(values.into_iter().map(raw_text))),
            (None, Some(fields)) => {
                InputRecord::from_named(schema, fields.into_iter().map(|(k, v)| (k, raw_text(v))))
                    .map_err(validation_failure)
            }
            _ => Err(ApiError::bad_request(
                "provide exactly one of \"values\" or \"fields\"",
            )),
        }
    }
}

/// The text a form input would have held for this JSON value.
fn raw_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WarningBody {
    pub field: String,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub message: String,
}

impl From<&RangeWarning> for WarningBody {
    fn from(w: &RangeWarning) -> Self {
        Self {
            field: w.field.to_string(),
            value: w.value,
            min: w.range.min,
            max: w.range.max,
            message: w.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    #[serde(flatten)]
    error: &'a ValidationError,
    message: String,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub disease: Disease,
    pub label: Label,
    pub severity: Severity,
    pub message: &'static str,
    pub warnings: Vec<WarningBody>,
    pub features: FeatureVector,
}

impl PredictResponse {
    fn new(diagnosis: &Diagnosis, warnings: &[RangeWarning], features: FeatureVector) -> Self {
        Self {
            disease: diagnosis.disease,
            label: diagnosis.label,
            severity: diagnosis.severity,
            message: diagnosis.message,
            warnings: warnings.iter().map(WarningBody::from).collect(),
            features,
        }
    }
}

fn validation_failure(errors: medpredict_core::ValidationErrors) -> ApiError {
    let details: Vec<ErrorBody<'_>> = errors
        .iter()
        .map(|error| ErrorBody {
            error,
            message: error.to_string(),
        })
        .collect();
    let details = serde_json::to_value(details).unwrap_or(Value::Null);
    ApiError::unprocessable(errors.to_string()).with_details(details)
}

#[tracing::instrument(name = "POST /api/predict/{disease}", skip(state, body))]
pub async fn predict(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let disease = parse_disease(&slug)?;
    let schema = FormSchema::for_disease(disease);
    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let record = request.into_record(schema)?;

    let outcome = submit(&state.registry, disease, &record)?;
    log_outcome(&outcome);

    match outcome {
        Outcome::Rejected { errors, .. } => Err(validation_failure(errors)),
        Outcome::Diagnosed {
            diagnosis,
            warnings,
            features,
        } => Ok(Json(PredictResponse::new(&diagnosis, &warnings, features))),
    }
}

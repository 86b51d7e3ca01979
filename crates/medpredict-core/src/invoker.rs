//! # Invoker Module
//!
//! The model registry: one read-only classifier per disease.
//!
//! Models are registered once at startup and never mutated afterwards, so
//! the registry can be wrapped in an `Arc` and shared by every request
//! handler without locks. Nothing here is global: callers construct a
//! registry and pass it to whoever needs to predict.

use crate::model::{Classifier, ModelError};
use crate::schema::FormSchema;
use crate::{Disease, FeatureVector, Label};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// A classifier that can be shared across threads.
pub type SharedClassifier = Arc<dyn Classifier + Send + Sync>;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeError {
    #[error("no model loaded for {0}")]
    ModelNotLoaded(Disease),

    #[error("{disease} model expects {model} features but the form has {schema}")]
    SchemaMismatch {
        disease: Disease,
        schema: usize,
        model: usize,
    },

    #[error("{disease} model returned {labels} labels for one row")]
    UnexpectedOutput { disease: Disease, labels: usize },

    #[error("{disease} model failed: {source}")]
    Model {
        disease: Disease,
        #[source]
        source: ModelError,
    },
}

// =============================================================================
// MODEL REGISTRY
// =============================================================================

/// Loaded models, keyed by disease.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: BTreeMap<Disease, SharedClassifier>,
}

impl ModelRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `model` for `disease`, replacing any previous one.
    ///
    /// Rejects a model whose arity differs from the disease's schema.
    pub fn register<C>(&mut self, disease: Disease, model: C) -> Result<(), InvokeError>
    where
        C: Classifier + Send + Sync + 'static,
    {
        self.register_shared(disease, Arc::new(model))
    }

    pub fn register_shared(
        &mut self,
        disease: Disease,
        model: SharedClassifier,
    ) -> Result<(), InvokeError> {
        let schema = FormSchema::for_disease(disease).arity();
        if model.arity() != schema {
            return Err(InvokeError::SchemaMismatch {
                disease,
                schema,
                model: model.arity(),
            });
        }
        self.models.insert(disease, model);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, disease: Disease) -> Option<&SharedClassifier> {
        self.models.get(&disease)
    }

    /// Diseases with a loaded model, in navigation order.
    pub fn diseases(&self) -> impl Iterator<Item = Disease> + '_ {
        self.models.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Run the disease's model on a single row and return its label.
    pub fn invoke(&self, disease: Disease, features: &FeatureVector) -> Result<Label, InvokeError> {
        let model = self
            .models
            .get(&disease)
            .ok_or(InvokeError::ModelNotLoaded(disease))?;

        let labels = model
            .predict(std::slice::from_ref(features))
            .map_err(|source| InvokeError::Model { disease, source })?;

        match labels.as_slice() {
            [label] => Ok(*label),
            other => Err(InvokeError::UnexpectedOutput {
                disease,
                labels: other.len(),
            }),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

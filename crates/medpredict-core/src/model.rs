//! # Model Module
//!
//! Pre-trained classifiers, seen only through the [`Classifier`] trait.
//!
//! Training happens offline; this crate only evaluates exported
//! parameters. Two artifact kinds cover the exports we receive:
//!
//! - `linear`: sign of `w·x + b`, with optional baked-in standardisation
//!   (linear SVM, logistic regression)
//! - `tree`: a flattened binary decision tree
//!
//! Models perform no feature engineering of their own beyond what is
//! stored in the artifact.

use crate::{FeatureVector, Label};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("model expects {expected} features, got {got}")]
    ArityMismatch { expected: usize, got: usize },

    #[error("model produced label {0}, expected 0 or 1")]
    InvalidLabel(u32),

    #[error("malformed model artifact: {0}")]
    Malformed(String),

    #[error("model produced a non-finite decision value")]
    NonFiniteDecision,
}

// =============================================================================
// CLASSIFIER TRAIT
// =============================================================================

/// The contract every model fulfils: a pure function from rows to labels.
///
/// Implementations must be read-only; the registry shares them across
/// requests without locking.
pub trait Classifier: fmt::Debug {
    /// Number of features each row must contain.
    fn arity(&self) -> usize;

    /// Classify every row. Output has one label per input row.
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<Label>, ModelError>;
}

fn check_row(expected: usize, row: &FeatureVector) -> Result<(), ModelError> {
    if row.len() == expected {
        Ok(())
    } else {
        Err(ModelError::ArityMismatch {
            expected,
            got: row.len(),
        })
    }
}

fn malformed(msg: impl Into<String>) -> ModelError {
    ModelError::Malformed(msg.into())
}

// =============================================================================
// LINEAR MODEL
// =============================================================================

/// Per-feature standardisation applied before the dot product:
/// `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardizer {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// A linear decision function. Positive when `w·x + b > 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub weights: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub scaler: Option<Standardizer>,
}

impl LinearModel {
    #[must_use]
    pub fn new(weights: Vec<f64>, intercept: f64) -> Self {
        Self {
            weights,
            intercept,
            scaler: None,
        }
    }

    #[must_use]
    pub fn with_scaler(mut self, mean: Vec<f64>, scale: Vec<f64>) -> Self {
        self.scaler = Some(Standardizer { mean, scale });
        self
    }

    /// Raw margin for one row. Caller guarantees the arity.
    #[allow(clippy::float_arithmetic)]
    pub fn decision_function(&self, row: &[f64]) -> f64 {
        let dot: f64 = match &self.scaler {
            Some(s) => self
                .weights
                .iter()
                .zip(row)
                .zip(s.mean.iter().zip(&s.scale))
                .map(|((w, x), (mean, scale))| w * ((x - mean) / scale))
                .sum(),
            None => self.weights.iter().zip(row).map(|(w, x)| w * x).sum(),
        };
        self.intercept + dot
    }

    fn check(&self) -> Result<(), ModelError> {
        if self.weights.is_empty() {
            return Err(malformed("linear model has no weights"));
        }
        if !self.intercept.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(malformed("linear model has non-finite parameters"));
        }
        if let Some(scaler) = &self.scaler {
            if scaler.mean.len() != self.weights.len() || scaler.scale.len() != self.weights.len() {
                return Err(malformed(format!(
                    "scaler has {}/{} entries for {} weights",
                    scaler.mean.len(),
                    scaler.scale.len(),
                    self.weights.len()
                )));
            }
            if scaler.mean.iter().any(|m| !m.is_finite())
                || scaler.scale.iter().any(|s| !s.is_finite() || *s == 0.0)
            {
                return Err(malformed("scaler has zero or non-finite entries"));
            }
        }
        Ok(())
    }
}

impl Classifier for LinearModel {
    fn arity(&self) -> usize {
        self.weights.len()
    }

    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<Label>, ModelError> {
        rows.iter()
            .map(|row| {
                check_row(self.arity(), row)?;
                let margin = self.decision_function(row.as_slice());
                if !margin.is_finite() {
                    return Err(ModelError::NonFiniteDecision);
                }
                Ok(if margin > 0.0 {
                    Label::Positive
                } else {
                    Label::Negative
                })
            })
            .collect()
    }
}

// =============================================================================
// DECISION TREE
// =============================================================================

/// One node of a flattened tree. Children always sit at larger indices
/// than their parent, so evaluation cannot loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    /// `row[feature] <= threshold` goes `left`, otherwise `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        label: Label,
    },
}

/// A binary decision tree, root at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub n_features: usize,
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Build a tree, rejecting dangling or backward child references.
    pub fn new(n_features: usize, nodes: Vec<TreeNode>) -> Result<Self, ModelError> {
        let tree = Self { n_features, nodes };
        tree.check()?;
        Ok(tree)
    }

    fn check(&self) -> Result<(), ModelError> {
        if self.n_features == 0 {
            return Err(malformed("tree declares zero features"));
        }
        if self.nodes.is_empty() {
            return Err(malformed("tree has no nodes"));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } = *node
            {
                if feature >= self.n_features {
                    return Err(malformed(format!(
                        "node {idx} splits on feature {feature} of {}",
                        self.n_features
                    )));
                }
                if !threshold.is_finite() {
                    return Err(malformed(format!("node {idx} has non-finite threshold")));
                }
                for child in [left, right] {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(malformed(format!(
                            "node {idx} references invalid child {child}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn classify(&self, row: &[f64]) -> Result<Label, ModelError> {
        let mut idx = 0;
        // Bounded walk: at most one visit per node.
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { label }) => return Ok(*label),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = row
                        .get(*feature)
                        .ok_or_else(|| malformed(format!("feature {feature} out of bounds")))?;
                    idx = if *value <= *threshold { *left } else { *right };
                }
                None => return Err(malformed(format!("node {idx} does not exist"))),
            }
        }
        Err(malformed("tree walk did not reach a leaf"))
    }
}

impl Classifier for DecisionTree {
    fn arity(&self) -> usize {
        self.n_features
    }

    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<Label>, ModelError> {
        rows.iter()
            .map(|row| {
                check_row(self.arity(), row)?;
                self.classify(row.as_slice())
            })
            .collect()
    }
}

// =============================================================================
// MODEL ARTIFACT
// =============================================================================

/// Everything that can be stored in a model file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelArtifact {
    Linear(LinearModel),
    Tree(DecisionTree),
}

impl ModelArtifact {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ModelArtifact::Linear(_) => "linear",
            ModelArtifact::Tree(_) => "tree",
        }
    }

    /// Structural validation, run once at load time.
    pub fn check(&self) -> Result<(), ModelError> {
        match self {
            ModelArtifact::Linear(m) => m.check(),
            ModelArtifact::Tree(t) => t.check(),
        }
    }
}

impl Classifier for ModelArtifact {
    fn arity(&self) -> usize {
        match self {
            ModelArtifact::Linear(m) => m.arity(),
            ModelArtifact::Tree(t) => t.arity(),
        }
    }

    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<Label>, ModelError> {
        match self {
            ModelArtifact::Linear(m) => m.predict(rows),
            ModelArtifact::Tree(t) => t.predict(rows),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(values: &[f64]) -> FeatureVector {
        FeatureVector::new(values.to_vec())
    }

    /// x0 <= 100 → 0, else (x1 <= 30 → 0, else 1)
    fn small_tree() -> DecisionTree {
        DecisionTree::new(
            2,
            vec![
                TreeNode::Split {
                    feature: 0,
                    threshold: 100.0,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf {
                    label: Label::Negative,
                },
                TreeNode::Split {
                    feature: 1,
                    threshold: 30.0,
                    left: 3,
                    right: 4,
                },
                TreeNode::Leaf {
                    label: Label::Negative,
                },
                TreeNode::Leaf {
                    label: Label::Positive,
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn linear_sign_decides_label() {
        let model = LinearModel::new(vec![1.0, -1.0], 0.0);
        let labels = model.predict(&[row(&[2.0, 1.0]), row(&[1.0, 2.0])]).unwrap();
        assert_eq!(labels, vec![Label::Positive, Label::Negative]);
    }

    #[test]
    fn linear_zero_margin_is_negative() {
        let model = LinearModel::new(vec![1.0], -1.0);
        assert_eq!(model.predict(&[row(&[1.0])]).unwrap(), vec![Label::Negative]);
    }

    #[test]
    fn linear_applies_scaler() {
        let model = LinearModel::new(vec![1.0], 0.0).with_scaler(vec![100.0], vec![10.0]);
        assert_eq!(model.decision_function(&[120.0]), 2.0);
        assert_eq!(model.predict(&[row(&[90.0])]).unwrap(), vec![Label::Negative]);
    }

    #[test]
    fn linear_overflowing_margin_is_an_error() {
        let model =
            LinearModel::new(vec![1.0, 1.0], 0.0).with_scaler(vec![0.0, 0.0], vec![0.5, 0.5]);
        assert_eq!(
            model.predict(&[row(&[1e308, 1e308])]),
            Err(ModelError::NonFiniteDecision)
        );

        let opposing = LinearModel::new(vec![1e308, -1e308], 0.0);
        assert_eq!(
            opposing.predict(&[row(&[10.0, 10.0])]),
            Err(ModelError::NonFiniteDecision)
        );
    }

    #[test]
    fn linear_rejects_wrong_arity() {
        let model = LinearModel::new(vec![1.0, 1.0], 0.0);
        assert_eq!(
            model.predict(&[row(&[1.0])]),
            Err(ModelError::ArityMismatch {
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn linear_check_rejects_bad_scaler() {
        let model = ModelArtifact::Linear(
            LinearModel::new(vec![1.0, 1.0], 0.0).with_scaler(vec![0.0, 0.0], vec![1.0, 0.0]),
        );
        assert!(matches!(model.check(), Err(ModelError::Malformed(_))));

        let short = ModelArtifact::Linear(
            LinearModel::new(vec![1.0, 1.0], 0.0).with_scaler(vec![0.0], vec![1.0]),
        );
        assert!(short.check().is_err());
    }

    #[test]
    fn tree_walks_to_leaf() {
        let tree = small_tree();
        let labels = tree
            .predict(&[row(&[50.0, 99.0]), row(&[150.0, 10.0]), row(&[150.0, 40.0])])
            .unwrap();
        assert_eq!(labels, vec![Label::Negative, Label::Negative, Label::Positive]);
    }

    #[test]
    fn tree_threshold_goes_left() {
        let tree = small_tree();
        assert_eq!(tree.predict(&[row(&[100.0, 99.0])]).unwrap(), vec![Label::Negative]);
    }

    #[test]
    fn tree_rejects_backward_child() {
        let result = DecisionTree::new(
            1,
            vec![
                TreeNode::Split {
                    feature: 0,
                    threshold: 0.0,
                    left: 0,
                    right: 1,
                },
                TreeNode::Leaf {
                    label: Label::Negative,
                },
            ],
        );
        assert!(matches!(result, Err(ModelError::Malformed(_))));
    }

    #[test]
    fn tree_rejects_unknown_feature() {
        let result = DecisionTree::new(
            1,
            vec![
                TreeNode::Split {
                    feature: 3,
                    threshold: 0.0,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf {
                    label: Label::Negative,
                },
                TreeNode::Leaf {
                    label: Label::Positive,
                },
            ],
        );
        assert!(result.is_err());
    }

    #[test]
    fn artifact_json_shape() {
        let json = r#"{"linear":{"weights":[0.5,-0.25],"intercept":1.0}}"#;
        let artifact: ModelArtifact = serde_json::from_str(json).unwrap();
        assert_eq!(artifact.kind(), "linear");
        assert_eq!(artifact.arity(), 2);
        assert!(artifact.check().is_ok());
    }

    #[test]
    fn artifact_rejects_invalid_leaf_label() {
        let json = r#"{"tree":{"n_features":1,"nodes":[{"leaf":{"label":3}}]}}"#;
        let artifact: Result<ModelArtifact, _> = serde_json::from_str(json);
        assert!(artifact.is_err());
    }

    #[test]
    fn prediction_is_repeatable() {
        let artifact = ModelArtifact::Tree(small_tree());
        let rows = [row(&[150.0, 40.0])];
        assert_eq!(artifact.predict(&rows), artifact.predict(&rows));
    }
}

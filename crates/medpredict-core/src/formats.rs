//! # Formats Module
//!
//! Byte-level encodings of [`ModelArtifact`].
//!
//! Two encodings are supported:
//! - JSON (`.json`): what export scripts write, human-inspectable
//! - Binary (`.bin`): 8-byte header followed by a postcard payload
//!
//! ```text
//! ┌──────────┬─────────────┬──────────────┬──────────────────┐
//! │ "MDPM"   │ version u16 │ reserved u16 │ postcard payload │
//! └──────────┴─────────────┴──────────────┴──────────────────┘
//! ```
//!
//! Note: File I/O stays in the app layer. Every decoder here runs
//! [`ModelArtifact::check`] so a structurally broken model never reaches
//! the registry.

use crate::model::{ModelArtifact, ModelError};
use std::path::Path;
use thiserror::Error;

/// Magic bytes at the start of a binary artifact.
pub const MAGIC: [u8; 4] = *b"MDPM";

/// Current binary format version.
pub const FORMAT_VERSION: u16 = 1;

/// Size of the binary header in bytes.
pub const HEADER_LEN: usize = 8;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("JSON artifact error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary artifact error: {0}")]
    Postcard(#[from] postcard::Error),

    #[error("binary artifact is truncated ({0} bytes)")]
    Truncated(usize),

    #[error("not a model artifact (bad magic bytes)")]
    BadMagic,

    #[error("unsupported artifact version {0} (supported: {FORMAT_VERSION})")]
    UnsupportedVersion(u16),

    #[error("unknown artifact extension for '{0}' (expected .json or .bin)")]
    UnknownExtension(String),

    #[error(transparent)]
    Invalid(#[from] ModelError),
}

// =============================================================================
// FORMAT SELECTION
// =============================================================================

/// On-disk encoding of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Json,
    Binary,
}

impl ArtifactFormat {
    /// Every format, in lookup preference order.
    pub const ALL: [ArtifactFormat; 2] = [ArtifactFormat::Json, ArtifactFormat::Binary];

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactFormat::Json => "json",
            ArtifactFormat::Binary => "bin",
        }
    }

    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, FormatError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(ArtifactFormat::Json),
            Some("bin") => Ok(ArtifactFormat::Binary),
            _ => Err(FormatError::UnknownExtension(path.display().to_string())),
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Result<ModelArtifact, FormatError> {
        match self {
            ArtifactFormat::Json => from_json(bytes),
            ArtifactFormat::Binary => from_binary(bytes),
        }
    }

    pub fn encode(self, artifact: &ModelArtifact) -> Result<Vec<u8>, FormatError> {
        match self {
            ArtifactFormat::Json => Ok(to_json(artifact)?.into_bytes()),
            ArtifactFormat::Binary => to_binary(artifact),
        }
    }
}

// =============================================================================
// JSON
// =============================================================================

pub fn from_json(bytes: &[u8]) -> Result<ModelArtifact, FormatError> {
    let artifact: ModelArtifact = serde_json::from_slice(bytes)?;
    artifact.check()?;
    Ok(artifact)
}

pub fn to_json(artifact: &ModelArtifact) -> Result<String, FormatError> {
    Ok(serde_json::to_string_pretty(artifact)?)
}

// =============================================================================
// BINARY
// =============================================================================

pub fn to_binary(artifact: &ModelArtifact) -> Result<Vec<u8>, FormatError> {
    let payload = postcard::to_allocvec(artifact)?;
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

pub fn from_binary(bytes: &[u8]) -> Result<ModelArtifact, FormatError> {
    if bytes.len() < HEADER_LEN {
        return Err(FormatError::Truncated(bytes.len()));
    }
    let (header, payload) = bytes.split_at(HEADER_LEN);
    if header[..4] != MAGIC {
        return Err(FormatError::BadMagic);
    }
    let version = u16::from_le_bytes([header[4], header[5]]);
    if version != FORMAT_VERSION {
        return Err(FormatError::UnsupportedVersion(version));
    }
    let artifact: ModelArtifact = postcard::from_bytes(payload)?;
    artifact.check()?;
    Ok(artifact)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Classifier, DecisionTree, LinearModel, TreeNode};
    use crate::{FeatureVector, Label};

    fn linear() -> ModelArtifact {
        ModelArtifact::Linear(
            LinearModel::new(vec![0.5, -1.5, 2.0], 0.25).with_scaler(
                vec![1.0, 2.0, 3.0],
                vec![0.5, 0.5, 0.5],
            ),
        )
    }

    fn stump() -> ModelArtifact {
        ModelArtifact::Tree(
            DecisionTree::new(
                1,
                vec![
                    TreeNode::Split {
                        feature: 0,
                        threshold: 0.5,
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
            )
            .unwrap(),
        )
    }

    #[test]
    fn binary_keeps_predictions() {
        for artifact in [linear(), stump()] {
            let decoded = from_binary(&to_binary(&artifact).unwrap()).unwrap();
            assert_eq!(decoded, artifact);
        }
        let decoded = from_binary(&to_binary(&stump()).unwrap()).unwrap();
        let row = FeatureVector::new(vec![1.0]);
        assert_eq!(decoded.predict(&[row]).unwrap(), vec![Label::Positive]);
    }

    #[test]
    fn binary_header_layout() {
        let bytes = to_binary(&stump()).unwrap();
        assert_eq!(&bytes[..4], b"MDPM");
        assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), FORMAT_VERSION);
    }

    #[test]
    fn binary_rejects_bad_magic() {
        let mut bytes = to_binary(&stump()).unwrap();
        bytes[0] = b'X';
        assert!(matches!(from_binary(&bytes), Err(FormatError::BadMagic)));
    }

    #[test]
    fn binary_rejects_future_version() {
        let mut bytes = to_binary(&stump()).unwrap();
        bytes[4..6].copy_from_slice(&9u16.to_le_bytes());
        assert!(matches!(
            from_binary(&bytes),
            Err(FormatError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn version_error_names_supported_version() {
        let err = FormatError::UnsupportedVersion(9);
        assert_eq!(
            err.to_string(),
            "unsupported artifact version 9 (supported: 1)"
        );
    }

    #[test]
    fn decode_errors_convert_into_format_error() {
        assert!(matches!(from_json(b"{"), Err(FormatError::Json(_))));
        let mut bytes = to_binary(&stump()).unwrap();
        bytes.truncate(HEADER_LEN + 1);
        assert!(matches!(from_binary(&bytes), Err(FormatError::Postcard(_))));
    }

    #[test]
    fn binary_rejects_truncated() {
        assert!(matches!(from_binary(b"MDP"), Err(FormatError::Truncated(3))));
    }

    #[test]
    fn json_runs_structural_check() {
        let json = br#"{"linear":{"weights":[],"intercept":0.0}}"#;
        assert!(matches!(
            from_json(json),
            Err(FormatError::Invalid(ModelError::Malformed(_)))
        ));
    }

    #[test]
    fn json_encoding_decodes() {
        let text = to_json(&linear()).unwrap();
        assert!(text.contains("\"linear\""));
        assert_eq!(from_json(text.as_bytes()).unwrap(), linear());
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(
            ArtifactFormat::from_path(Path::new("models/diabetes_model.json")).ok(),
            Some(ArtifactFormat::Json)
        );
        assert_eq!(
            ArtifactFormat::from_path(Path::new("heart_disease_model.bin")).ok(),
            Some(ArtifactFormat::Binary)
        );
        assert!(ArtifactFormat::from_path(Path::new("parkinsons_model.sav")).is_err());
    }
}

//! # Model Loading
//!
//! File I/O for model artifacts: locating them in the models directory,
//! decoding them and filling a [`ModelRegistry`].
//!
//! Artifacts are named after the disease (`diabetes_model`,
//! `heart_disease_model`, `parkinsons_model`) with a `.json` or `.bin`
//! extension. JSON wins when both exist.

use medpredict_core::formats::{ArtifactFormat, FormatError};
use medpredict_core::{Classifier, Disease, InvokeError, ModelArtifact, ModelRegistry};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no {disease} model in {} (looked for {stem}.json and {stem}.bin)", .dir.display())]
    NotFound {
        disease: Disease,
        stem: &'static str,
        dir: PathBuf,
    },

    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid model artifact {}: {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    #[error(transparent)]
    Registry(#[from] InvokeError),
}

/// Locate the artifact for `disease` inside `dir`.
pub fn find_artifact(dir: &Path, disease: Disease) -> Result<PathBuf, LoadError> {
    ArtifactFormat::ALL
        .iter()
        .map(|format| dir.join(format!("{}.{}", disease.artifact_stem(), format.extension())))
        .find(|path| path.is_file())
        .ok_or_else(|| LoadError::NotFound {
            disease,
            stem: disease.artifact_stem(),
            dir: dir.to_path_buf(),
        })
}

/// Read and decode one artifact. The format follows the file extension.
pub fn load_artifact(path: &Path) -> Result<ModelArtifact, LoadError> {
    let format_err = |source| LoadError::Format {
        path: path.to_path_buf(),
        source,
    };
    let format = ArtifactFormat::from_path(path).map_err(format_err)?;
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    format.decode(&bytes).map_err(format_err)
}

/// Encode `artifact` according to the extension of `path` and write it.
pub fn save_artifact(path: &Path, artifact: &ModelArtifact) -> Result<(), LoadError> {
    let format_err = |source| LoadError::Format {
        path: path.to_path_buf(),
        source,
    };
    let format = ArtifactFormat::from_path(path).map_err(format_err)?;
    let bytes = format.encode(artifact).map_err(format_err)?;
    std::fs::write(path, bytes).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the model for a single disease into `registry`.
pub fn load_into(
    registry: &mut ModelRegistry,
    dir: &Path,
    disease: Disease,
) -> Result<PathBuf, LoadError> {
    let path = find_artifact(dir, disease)?;
    let artifact = load_artifact(&path)?;
    tracing::debug!(
        %disease,
        path = %path.display(),
        kind = artifact.kind(),
        arity = artifact.arity(),
        "Loaded model artifact"
    );
    registry.register(disease, artifact)?;
    Ok(path)
}

/// Load every disease model from `dir`. Any missing or broken artifact
/// fails the whole load.
pub fn load_registry(dir: &Path) -> Result<ModelRegistry, LoadError> {
    let mut registry = ModelRegistry::new();
    for disease in Disease::ALL {
        load_into(&mut registry, dir, disease)?;
    }
    tracing::info!(dir = %dir.display(), models = registry.len(), "Model registry ready");
    Ok(registry)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use medpredict_core::LinearModel;

    fn linear(arity: usize) -> ModelArtifact {
        ModelArtifact::Linear(LinearModel::new(vec![1.0; arity], 0.0))
    }

    #[test]
    fn loads_json_and_binary() {
        let dir = tempfile::tempdir().unwrap();
        save_artifact(&dir.path().join("diabetes_model.json"), &linear(8)).unwrap();
        save_artifact(&dir.path().join("heart_disease_model.bin"), &linear(13)).unwrap();
        save_artifact(&dir.path().join("parkinsons_model.json"), &linear(22)).unwrap();

        let registry = load_registry(dir.path()).unwrap();
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn json_preferred_over_binary() {
        let dir = tempfile::tempdir().unwrap();
        save_artifact(&dir.path().join("diabetes_model.bin"), &linear(8)).unwrap();
        save_artifact(&dir.path().join("diabetes_model.json"), &linear(8)).unwrap();
        let path = find_artifact(dir.path(), Disease::Diabetes).unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("json"));
    }

    #[test]
    fn missing_model_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        save_artifact(&dir.path().join("diabetes_model.json"), &linear(8)).unwrap();
        let err = load_registry(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::NotFound {
                disease: Disease::HeartDisease,
                ..
            }
        ));
    }

    #[test]
    fn wrong_arity_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        save_artifact(&dir.path().join("diabetes_model.json"), &linear(13)).unwrap();
        let mut registry = ModelRegistry::new();
        let err = load_into(&mut registry, dir.path(), Disease::Diabetes).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Registry(InvokeError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn corrupt_artifact_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diabetes_model.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load_artifact(&path),
            Err(LoadError::Format { .. })
        ));
    }
}

//! # Error Module
//!
//! Errors shared across pipeline stages. Each stage owns its own error type
//! (`ValidationErrors`, `ModelError`, `FormatError`, `InvokeError`).

use thiserror::Error;

/// A disease identifier that does not name any known schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown disease '{0}' (expected one of: diabetes, heart, parkinsons)")]
pub struct UnknownDisease(pub String);

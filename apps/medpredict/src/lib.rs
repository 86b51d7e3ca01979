//! # MedPredict Library
//!
//! This library exposes the MedPredict modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod api;
pub mod cli;
pub mod models;

// Re-export medpredict_core for convenience
pub use medpredict_core;

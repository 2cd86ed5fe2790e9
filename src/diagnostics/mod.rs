//! Structured diagnostics for graph builds.

pub mod build_diagnostics;

pub use build_diagnostics::{BuildDiagnostic, DiagnosticStage};

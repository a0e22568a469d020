//! Error types for configuration loading and validation

use std::path::PathBuf;
use thiserror::Error;
use validator::ValidationErrors;

/// Unified configuration error type.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File not found error.
    #[error("viruslab configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// Configuration validation error.
    #[error("invalid viruslab configuration:\n{}", format_validation_errors(.0))]
    Validation(#[source] ValidationErrors),

    /// Figment parsing error.
    #[error("viruslab configuration parsing error: {0}")]
    Parsing(#[from] figment::Error),
}

/// One `Field '<name>':` header per field, then one indented line per
/// failed rule, preferring the rule's message over its code.
fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields
        .into_iter()
        .flat_map(|(field, failures)| {
            std::iter::once(format!("Field '{field}':\n")).chain(failures.iter().map(|failure| {
                let reason = failure.message.as_ref().unwrap_or(&failure.code);
                format!("  - {reason}\n")
            }))
        })
        .collect()
}

impl From<ValidationErrors> for ConfigError {
    fn from(errors: ValidationErrors) -> Self {
        ConfigError::Validation(errors)
    }
}

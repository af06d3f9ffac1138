//! Error taxonomy shared by every component.
//!
//! Each variant belongs to one of three categories, and each category maps to a
//! process exit code used by the `outlook` binary:
//!
//! - input validation (bad budget, unknown metric, invalid config) -> `2`
//! - data unavailable (missing dataset, missing/corrupt model file) -> `3`
//! - numerical failure (curve fit non-convergence, degenerate series) -> `4`
//!
//! Partial results (a regional batch with skipped sub-regions) are not errors;
//! they are successful results carrying diagnostics.

use thiserror::Error;

use crate::config::ConfigError;

/// Convenience alias used throughout the crate.
pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InputValidation,
    DataUnavailable,
    NumericalFailure,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid `{field}`: {message}")]
    InvalidInput { field: String, message: String },

    #[error("invalid budget {0}: must be finite and > 0")]
    InvalidBudget(f64),

    #[error("unknown metric or region `{0}`")]
    NotFound(String),

    #[error("invalid configuration: {}", format_config_errors(.0))]
    Config(Vec<ConfigError>),

    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    #[error("model for `{metric}` unavailable: {reason}")]
    ModelUnavailable { metric: String, reason: String },

    #[error("growth rate of `{column}` is undefined (need at least two consecutive observations)")]
    GrowthRateUndefined { column: String },

    #[error("curve fit failed: {0}")]
    FitFailure(String),

    #[error("numerical failure: {0}")]
    NumericalFailure(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn model_unavailable(metric: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ModelUnavailable {
            metric: metric.into(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::InvalidInput { .. }
            | AppError::InvalidBudget(_)
            | AppError::NotFound(_)
            | AppError::Config(_) => ErrorCategory::InputValidation,
            AppError::DataUnavailable(_) | AppError::ModelUnavailable { .. } | AppError::Io(_) => {
                ErrorCategory::DataUnavailable
            }
            AppError::GrowthRateUndefined { .. }
            | AppError::FitFailure(_)
            | AppError::NumericalFailure(_) => ErrorCategory::NumericalFailure,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self.category() {
            ErrorCategory::InputValidation => 2,
            ErrorCategory::DataUnavailable => 3,
            ErrorCategory::NumericalFailure => 4,
        }
    }
}

fn format_config_errors(errors: &[ConfigError]) -> String {
    let parts: Vec<String> = errors.iter().map(ToString::to_string).collect();
    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_category() {
        assert_eq!(AppError::InvalidBudget(0.0).exit_code(), 2);
        assert_eq!(AppError::NotFound("tidal".into()).exit_code(), 2);
        assert_eq!(AppError::model_unavailable("solar", "missing").exit_code(), 3);
        assert_eq!(AppError::FitFailure("no convergence".into()).exit_code(), 4);
        assert_eq!(
            AppError::GrowthRateUndefined { column: "Population".into() }.category(),
            ErrorCategory::NumericalFailure
        );
    }

    #[test]
    fn fit_failure_is_distinct_from_budget_validation() {
        let fit = AppError::FitFailure("x".into());
        let budget = AppError::InvalidBudget(-1.0);
        assert_ne!(fit.category(), budget.category());
    }
}

//! Recovery of a typed workout program from raw model output.
//!
//! Raw Repair → Structured Extraction → Schema Validation, followed by the
//! normalization stages in [`crate::pipeline::normalize`]. The orchestrator
//! wires them together and owns all failure logging.

pub mod extract;
pub mod orchestrator;
pub mod repair;
pub mod validation;

use thiserror::Error;

pub use extract::{bounded_preview, extract_json, extract_json_with, ExtractionOutcome, ExtractionStrategy};
pub use orchestrator::{
    extract_and_validate, normalize_program, recover_program, ExerciseMatch, NormalizedProgram,
    RecoveredProgram, ValidatedResponse,
};
pub use repair::repair_json;
pub use validation::{validate_program, Violation};

/// Why a model response could not be turned into a program. Every variant is
/// a property of that one response, so a fresh generation may succeed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecoveryError {
    #[error("Model response is empty")]
    EmptyResponse,

    #[error("{reason}")]
    Extraction {
        reason: String,
        /// Bounded excerpt of the raw response.
        preview: String,
    },

    #[error("Program failed validation ({} violations)", .0.len())]
    Validation(Vec<Violation>),
}

impl RecoveryError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::EmptyResponse | Self::Extraction { .. } | Self::Validation(_)
        )
    }

    /// Short message safe to show to an end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyResponse => "The AI returned no data. Please try again.".to_string(),
            Self::Extraction { .. } => {
                "AI returned an invalid response format. Please try again.".to_string()
            }
            Self::Validation(violations) => match violations.first() {
                Some(first) => format!("AI returned an incomplete program ({first}). Please try again."),
                None => "AI returned an incomplete program. Please try again.".to_string(),
            },
        }
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Validation(v) => v,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_response_failures_are_retryable() {
        assert!(RecoveryError::EmptyResponse.is_retryable());
        assert!(RecoveryError::Extraction {
            reason: "x".into(),
            preview: "y".into()
        }
        .is_retryable());
        assert!(RecoveryError::Validation(vec![]).is_retryable());
    }

    #[test]
    fn user_messages_are_generic() {
        let err = RecoveryError::Extraction {
            reason: "Could not extract valid JSON from response (tried: direct)".into(),
            preview: "secret raw text".into(),
        };
        assert!(!err.user_message().contains("secret"));
        assert_eq!(
            RecoveryError::EmptyResponse.user_message(),
            "The AI returned no data. Please try again."
        );
    }

    #[test]
    fn validation_message_names_first_violation() {
        let err = RecoveryError::Validation(vec![Violation {
            path: "rationale".into(),
            message: "Required".into(),
        }]);
        assert!(err.user_message().contains("rationale: Required"));
        assert_eq!(err.to_string(), "Program failed validation (1 violations)");
        assert_eq!(err.violations().len(), 1);
    }
}

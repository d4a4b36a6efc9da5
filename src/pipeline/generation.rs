//! Program generation: one LLM call per attempt, each response run through
//! the full recovery pipeline.
//!
//! Recovery failures describe a single response, so they are retried with a
//! fresh generation up to `max_generation_attempts`. Transport errors from the
//! client are not ours to retry and propagate immediately.

use std::collections::VecDeque;
use std::sync::Mutex;

use thiserror::Error;

use crate::models::CanonicalExercise;
use crate::pipeline::recovery::{recover_program, RecoveredProgram, RecoveryError};
use crate::pipeline_config::PipelineConfig;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("LLM call failed: {0}")]
    Llm(String),

    #[error(transparent)]
    Recovery(#[from] RecoveryError),
}

impl GenerationError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Llm(_) => "The AI service is unavailable. Please try again later.".to_string(),
            Self::Recovery(e) => e.user_message(),
        }
    }
}

/// LLM client abstraction (allows mocking).
pub trait LlmClient {
    fn generate(&self, prompt: &str, system: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramRequest {
    pub prompt: String,
    pub system: String,
}

pub struct ProgramGenerator {
    llm: Box<dyn LlmClient + Send + Sync>,
    config: PipelineConfig,
}

impl ProgramGenerator {
    pub fn new(llm: Box<dyn LlmClient + Send + Sync>, config: PipelineConfig) -> Self {
        Self { llm, config }
    }

    pub fn generate<'a>(
        &self,
        request: &ProgramRequest,
        catalog: &'a [CanonicalExercise],
    ) -> Result<RecoveredProgram<'a>, GenerationError> {
        let max_attempts = self.config.max_generation_attempts.max(1);
        let mut last_error: Option<RecoveryError> = None;

        for attempt in 1..=max_attempts {
            // Client errors propagate immediately
            let response = self.llm.generate(&request.prompt, &request.system)?;

            match recover_program(&response, catalog, &self.config) {
                Ok(program) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "Program recovered after retry");
                    }
                    return Ok(program);
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        error = %e,
                        "Model response unusable, regenerating"
                    );
                    last_error = Some(e);
                }
                Err(e) => {
                    last_error = Some(e);
                    break;
                }
            }
        }

        Err(last_error.map_or_else(
            || GenerationError::Llm("All generation attempts exhausted".into()),
            GenerationError::Recovery,
        ))
    }
}

/// Client that replays a fixed script of responses, one per call. Once the
/// script runs out every call fails.
pub struct ScriptedLlmClient {
    responses: Mutex<VecDeque<Result<String, GenerationError>>>,
}

impl ScriptedLlmClient {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(|r| Ok(r.into())).collect()),
        }
    }

    pub fn with_results(responses: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().map(|r| r.len()).unwrap_or(0)
    }
}

impl LlmClient for ScriptedLlmClient {
    fn generate(&self, _prompt: &str, _system: &str) -> Result<String, GenerationError> {
        let mut responses = self
            .responses
            .lock()
            .map_err(|_| GenerationError::Llm("scripted client poisoned".into()))?;
        responses
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Llm("script exhausted".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const VALID: &str = r#"{
        "program_type": "single_session",
        "rationale": "Heavier squat top set today.",
        "plan_data": [{
            "week": 1,
            "workout_index": 1,
            "exercises": [{"name": "Barbell Back Squat", "sets": [{"weight": 140, "reps": 3}]}],
            "coaching_notes": "Drive through mid-foot."
        }]
    }"#;

    fn request() -> ProgramRequest {
        ProgramRequest {
            prompt: "Plan today's session".into(),
            system: "Respond with JSON only".into(),
        }
    }

    fn generator(client: ScriptedLlmClient, attempts: u32) -> ProgramGenerator {
        let config = PipelineConfig {
            max_generation_attempts: attempts,
            ..PipelineConfig::default()
        };
        ProgramGenerator::new(Box::new(client), config)
    }

    struct SharedClient(Arc<ScriptedLlmClient>);

    impl LlmClient for SharedClient {
        fn generate(&self, prompt: &str, system: &str) -> Result<String, GenerationError> {
            self.0.generate(prompt, system)
        }
    }

    #[test]
    fn first_valid_response_wins() {
        let catalog = vec![CanonicalExercise::new("Back Squat")];
        let gen = generator(ScriptedLlmClient::new([VALID]), 1);
        let program = gen.generate(&request(), &catalog).unwrap();
        assert_eq!(program.program.days()[0].exercises[0].name, "Back Squat");
        assert_eq!(program.matches[0].result.confidence, 1.0);
    }

    #[test]
    fn single_attempt_surfaces_recovery_error() {
        let gen = generator(ScriptedLlmClient::new(["no json here", VALID]), 1);
        let err = gen.generate(&request(), &[]).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Recovery(RecoveryError::Extraction { .. })
        ));
    }

    #[test]
    fn retries_unusable_responses() {
        let client = Arc::new(ScriptedLlmClient::new(["", "still not json", VALID]));
        let config = PipelineConfig {
            max_generation_attempts: 3,
            ..PipelineConfig::default()
        };
        let gen = ProgramGenerator::new(Box::new(SharedClient(client.clone())), config);
        assert!(gen.generate(&request(), &[]).is_ok());
        assert_eq!(client.remaining(), 0);
    }

    #[test]
    fn gives_up_after_budget() {
        let client = Arc::new(ScriptedLlmClient::new(["{}", "{}", VALID]));
        let config = PipelineConfig {
            max_generation_attempts: 2,
            ..PipelineConfig::default()
        };
        let gen = ProgramGenerator::new(Box::new(SharedClient(client.clone())), config);
        let err = gen.generate(&request(), &[]).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Recovery(RecoveryError::Validation(_))
        ));
        assert_eq!(client.remaining(), 1);
    }

    #[test]
    fn final_attempt_error_is_reported() {
        let client = Arc::new(ScriptedLlmClient::new(["", "prose only, no braces"]));
        let config = PipelineConfig {
            max_generation_attempts: 2,
            ..PipelineConfig::default()
        };
        let gen = ProgramGenerator::new(Box::new(SharedClient(client.clone())), config);
        let err = gen.generate(&request(), &[]).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Recovery(RecoveryError::Extraction { .. })
        ));
        assert_eq!(client.remaining(), 0);
    }

    #[test]
    fn llm_errors_are_not_retried() {
        let client = Arc::new(ScriptedLlmClient::with_results(vec![
            Err(GenerationError::Llm("connection refused".into())),
            Ok(VALID.to_string()),
        ]));
        let config = PipelineConfig {
            max_generation_attempts: 3,
            ..PipelineConfig::default()
        };
        let gen = ProgramGenerator::new(Box::new(SharedClient(client.clone())), config);
        let err = gen.generate(&request(), &[]).unwrap_err();
        assert_eq!(err, GenerationError::Llm("connection refused".into()));
        assert_eq!(client.remaining(), 1);
    }

    #[test]
    fn exhausted_script_is_an_llm_error() {
        let client = ScriptedLlmClient::new(Vec::<String>::new());
        assert!(matches!(
            client.generate("p", "s"),
            Err(GenerationError::Llm(_))
        ));
    }

    #[test]
    fn user_messages_hide_detail() {
        let err = GenerationError::Llm("tcp reset at 10.0.0.3".into());
        assert!(!err.user_message().contains("10.0.0.3"));
        let err = GenerationError::from(RecoveryError::EmptyResponse);
        assert_eq!(err.user_message(), "The AI returned no data. Please try again.");
    }
}

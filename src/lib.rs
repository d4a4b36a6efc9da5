pub mod config;
pub mod models;
pub mod pipeline;
pub mod pipeline_config;

pub use models::{CanonicalExercise, ValidatedProgram};
pub use pipeline::generation::{GenerationError, LlmClient, ProgramGenerator, ProgramRequest};
pub use pipeline::recovery::{recover_program, RecoveredProgram, RecoveryError};
pub use pipeline_config::{ConfigError, PipelineConfig};

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` wins over the built-in
/// filter. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();

    tracing::debug!("{} v{} tracing initialized", config::APP_NAME, config::APP_VERSION);
}

pub mod config;
pub mod context;
pub mod error;
pub mod handle;
pub mod orchestrator;
pub mod outcome;
pub mod stage;

pub use config::PipelineConfig;
pub use context::PipelineContext;
pub use error::{ErrorKind, PipelineError, RunFailure};
pub use handle::{dispose, Disposition, HandleError, HandleState, ResultHandle};
pub use orchestrator::ScanGateOrchestrator;
pub use outcome::{OutcomeKind, OutcomeReport, PipelineOutcome, UploadPhaseReport};
pub use stage::PipelineStage;

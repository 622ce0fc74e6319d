//! Imaging and analysis core for the Rust medical vision platform.
//!
//! The modules mirror the legacy diagnostic-tool pipeline while providing
//! safe abstractions, scoped buffers, and well-defined analysis stages.

pub mod imaging;
pub mod inference;
pub mod narrative;
pub mod prelude;
pub mod processing;
pub mod records;
pub mod report;
pub mod telemetry;

pub use imaging::frame::Frame;
use records::DetectionRecord;
use serde::{Deserialize, Serialize};

/// Shared configuration for each analysis stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Longest edge allowed before the preprocessor downscales.
    pub max_edge: u32,
    pub clahe_clip_limit: f32,
    pub clahe_grid: u32,
    /// Square input edge expected by the classifier backbone.
    pub classifier_edge: u32,
    pub enhance_contrast: bool,
    pub denoise: bool,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            max_edge: 1024,
            clahe_clip_limit: 3.0,
            clahe_grid: 8,
            classifier_edge: 224,
            enhance_contrast: true,
            denoise: true,
        }
    }
}

/// Input payload for an analysis stage.
#[derive(Debug, Clone)]
pub struct StageInput {
    pub frame: Frame,
    pub timestamp: Option<f64>,
}

/// Output produced by each stage.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub frame: Frame,
    pub metadata: StageMetadata,
}

/// Metadata used for chaining stages and telemetry.
#[derive(Debug, Clone, Default)]
pub struct StageMetadata {
    pub detection: Option<DetectionRecord>,
    pub notes: Vec<String>,
}

/// Common error type for stage execution.
#[derive(thiserror::Error, Debug)]
pub enum StageError {
    #[error("image read failure: {0}")]
    ImageRead(String),
    #[error("buffer exhaustion: {0}")]
    BufferExhaustion(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type StageResult<T> = Result<T, StageError>;

/// Trait describing the stages of the image-analysis pipeline.
pub trait AnalysisStage {
    fn initialize(&mut self, config: &StageConfig) -> StageResult<()>;
    fn execute(&mut self, input: StageInput) -> StageResult<StageOutput>;
    fn cleanup(&mut self);
}

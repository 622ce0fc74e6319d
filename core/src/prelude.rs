//! Convenience re-exports for downstream crates driving the pipeline.

pub use crate::imaging::frame::Frame;
pub use crate::records::{DetectionRecord, Region};
pub use crate::{
    AnalysisStage, StageConfig, StageError, StageInput, StageMetadata, StageOutput, StageResult,
};

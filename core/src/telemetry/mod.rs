pub mod log;
pub mod metrics;

pub use log::StageLogger;
pub use metrics::MetricsRecorder;

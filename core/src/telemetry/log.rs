use log::{info, warn};

/// Named logger carried by each pipeline stage.
pub struct StageLogger {
    stage: &'static str,
}

impl StageLogger {
    pub fn new(stage: &'static str) -> Self {
        Self { stage }
    }

    pub fn record(&self, message: &str) {
        info!("{}: {}", self.stage, message);
    }

    pub fn record_warning(&self, message: &str) {
        warn!("{}: {}", self.stage, message);
    }
}

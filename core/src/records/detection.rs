use serde::{Deserialize, Serialize};

/// Bounding region asserted by the anomaly detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub score: f32,
}

/// Detection record emitted by the analysis pipeline.
///
/// The fields are currently synthesized placeholder values; nothing ties
/// them to the content of the analyzed image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub has_anomaly: bool,
    pub confidence: f32,
    pub regions: Vec<Region>,
}

impl DetectionRecord {
    pub fn new(has_anomaly: bool, confidence: f32, regions: Vec<Region>) -> Self {
        Self {
            has_anomaly,
            confidence,
            regions,
        }
    }
}

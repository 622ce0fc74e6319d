use ndarray::Array4;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::imaging::filter;
use crate::inference::Classifier;
use crate::prelude::{
    AnalysisStage, StageConfig, StageError, StageInput, StageMetadata, StageOutput, StageResult,
};
use crate::records::{DetectionRecord, Region};
use crate::telemetry::log::StageLogger;

/// Anomaly-detection stage wrapping the classifier backbone.
///
/// The emitted record is synthesized placeholder data: uniformly random
/// confidence and one random bounding region, not derived from the
/// backbone's prediction vector. The backbone still runs so the inference
/// path stays exercised; its output is only logged.
pub struct DetectStage {
    classifier: Classifier,
    config: Option<StageConfig>,
    rng: StdRng,
    logger: StageLogger,
}

impl DetectStage {
    pub fn new(classifier: Classifier) -> Self {
        Self::with_rng(classifier, StdRng::from_entropy())
    }

    /// Seeded constructor so tests can pin the synthesized record.
    pub fn with_seed(classifier: Classifier, seed: u64) -> Self {
        Self::with_rng(classifier, StdRng::seed_from_u64(seed))
    }

    fn with_rng(classifier: Classifier, rng: StdRng) -> Self {
        Self {
            classifier,
            config: None,
            rng,
            logger: StageLogger::new("detect"),
        }
    }

    fn synthesize_record(&mut self) -> DetectionRecord {
        let has_anomaly = self.rng.gen::<f32>() > 0.5;
        let confidence = self.rng.gen::<f32>() * 0.5 + 0.5;
        let region = Region {
            x: self.rng.gen_range(0..100),
            y: self.rng.gen_range(0..100),
            width: self.rng.gen_range(0..50),
            height: self.rng.gen_range(0..50),
            score: self.rng.gen::<f32>(),
        };
        DetectionRecord::new(has_anomaly, confidence, vec![region])
    }
}

impl AnalysisStage for DetectStage {
    fn initialize(&mut self, config: &StageConfig) -> StageResult<()> {
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: StageInput) -> StageResult<StageOutput> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| StageError::Internal("stage not initialized".into()))?;

        let edge = config.classifier_edge.max(1);
        let resized = filter::resize_area(&input.frame, edge, edge)?;
        let pixels = resized.pixels();
        let tensor = Array4::from_shape_fn(
            (1, edge as usize, edge as usize, 3),
            |(_, y, x, channel)| pixels[(y * edge as usize + x) * 3 + channel] as f32 / 255.0,
        );

        let prediction = self.classifier.predict(&tensor)?;
        let (top_class, top_score) = prediction
            .iter()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (index, &score)| {
                if score > best.1 {
                    (index, score)
                } else {
                    best
                }
            });
        self.logger.record(&format!(
            "backbone top class {} score {:.4} (unused)",
            top_class, top_score
        ));

        let record = self.synthesize_record();
        self.logger.record(&format!(
            "anomaly={} confidence={:.3}",
            record.has_anomaly, record.confidence
        ));

        let metadata = StageMetadata {
            detection: Some(record),
            notes: vec![format!("backbone classes {}", prediction.len())],
        };

        Ok(StageOutput {
            frame: input.frame,
            metadata,
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}

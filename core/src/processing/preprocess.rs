use crate::imaging::clahe::ClaheEqualizer;
use crate::imaging::color;
use crate::imaging::filter;
use crate::imaging::frame::Frame;
use crate::imaging::stats::PlaneStats;
use crate::prelude::{
    AnalysisStage, StageConfig, StageError, StageInput, StageMetadata, StageOutput, StageResult,
};
use crate::processing::buffer_pool::BufferPool;
use crate::telemetry::log::StageLogger;

/// Enhancement stage: proportional downscale, CLAHE on the luminance
/// channel, and a light Gaussian smoothing pass.
pub struct PreprocessStage {
    pool: BufferPool,
    config: Option<StageConfig>,
    logger: StageLogger,
}

impl PreprocessStage {
    pub fn new(pool_size: usize) -> Self {
        Self {
            pool: BufferPool::with_capacity(pool_size),
            config: None,
            logger: StageLogger::new("preprocess"),
        }
    }
}

impl AnalysisStage for PreprocessStage {
    fn initialize(&mut self, config: &StageConfig) -> StageResult<()> {
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: StageInput) -> StageResult<StageOutput> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| StageError::Internal("stage not initialized".into()))?;

        if input.frame.pixels().is_empty() {
            return Err(StageError::InvalidInput("empty frame".into()));
        }

        let mut frame = filter::fit_longer_edge(input.frame, config.max_edge)?;
        let mut notes = Vec::new();

        if config.enhance_contrast {
            let mut planes = color::split_lab(frame.pixels());
            let mean_before = PlaneStats::mean(&planes.l);

            let mut equalized = self.pool.checkout(planes.l.len())?;
            ClaheEqualizer::new(config.clahe_clip_limit, config.clahe_grid).apply(
                &planes.l,
                frame.width(),
                frame.height(),
                &mut equalized,
            );
            std::mem::swap(&mut planes.l, &mut equalized);
            color::merge_lab(&planes, frame.pixels_mut());
            self.pool.release(equalized);

            let mean_after = PlaneStats::mean(&planes.l);
            self.logger.record(&format!(
                "luma mean {:.1} -> {:.1}",
                mean_before, mean_after
            ));
            notes.push(format!("luma mean {:.1} -> {:.1}", mean_before, mean_after));
        }

        if config.denoise {
            let mut smoothed = self.pool.checkout(frame.pixels().len())?;
            filter::gaussian_blur_3x3(&frame, &mut smoothed);
            let (width, height) = (frame.width(), frame.height());
            self.pool.release(frame.into_raw());
            frame = Frame::new(width, height, smoothed)?;
            notes.push("gaussian 3x3 applied".into());
        }

        self.logger.record(&format!(
            "frame {}x{} ready",
            frame.width(),
            frame.height()
        ));

        Ok(StageOutput {
            frame,
            metadata: StageMetadata {
                notes,
                ..Default::default()
            },
        })
    }

    fn cleanup(&mut self) {
        self.pool.reset();
        self.config = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame(width: u32, height: u32) -> Frame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let value = ((x + y) * 7 % 256) as u8;
                data.extend_from_slice(&[value, value, value]);
            }
        }
        Frame::new(width, height, data).unwrap()
    }

    fn test_config(max_edge: u32) -> StageConfig {
        StageConfig {
            max_edge,
            ..StageConfig::default()
        }
    }

    #[test]
    fn oversized_frames_are_capped_proportionally() {
        let mut stage = PreprocessStage::new(4);
        stage.initialize(&test_config(8)).unwrap();
        let input = StageInput {
            frame: gradient_frame(16, 8),
            timestamp: Some(0.0),
        };
        let output = stage.execute(input).unwrap();
        assert_eq!((output.frame.width(), output.frame.height()), (8, 4));
        assert_eq!(output.frame.channels(), 3);
        stage.cleanup();
    }

    #[test]
    fn frames_within_cap_keep_their_dimensions() {
        let mut stage = PreprocessStage::new(4);
        stage.initialize(&test_config(1024)).unwrap();
        let input = StageInput {
            frame: gradient_frame(20, 12),
            timestamp: None,
        };
        let output = stage.execute(input).unwrap();
        assert_eq!((output.frame.width(), output.frame.height()), (20, 12));
        stage.cleanup();
    }

    #[test]
    fn contrast_pass_records_luma_note() {
        let mut stage = PreprocessStage::new(4);
        stage.initialize(&test_config(1024)).unwrap();
        let output = stage
            .execute(StageInput {
                frame: gradient_frame(16, 16),
                timestamp: None,
            })
            .unwrap();
        assert!(output.metadata.notes[0].starts_with("luma mean"));
        stage.cleanup();
    }

    #[test]
    fn uninitialized_stage_refuses_to_run() {
        let mut stage = PreprocessStage::new(4);
        let err = stage
            .execute(StageInput {
                frame: gradient_frame(4, 4),
                timestamp: None,
            })
            .unwrap_err();
        assert!(matches!(err, StageError::Internal(_)));
    }
}

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use medviscore::inference::Classifier;
use medviscore::narrative::{
    GeminiProvider, ImageSource, Language, NarrativeGenerator, NarrativeResult, VisionProvider,
};
use medviscore::prelude::{AnalysisStage, DetectionRecord, Frame, StageInput};
use medviscore::processing::{DetectStage, PreprocessStage};
use medviscore::report::compose_report;
use medviscore::telemetry::MetricsRecorder;

use crate::workflow::config::AppConfig;

#[derive(Debug)]
pub struct WorkflowResult {
    pub detection: DetectionRecord,
    pub narrative: NarrativeResult,
    pub report: String,
    pub source_name: String,
}

#[derive(Clone)]
pub struct Runner {
    config: AppConfig,
    generator: Arc<NarrativeGenerator>,
    metrics: Arc<MetricsRecorder>,
}

impl Runner {
    pub fn new(config: AppConfig) -> Self {
        let provider = GeminiProvider::new(&config.api_key, config.model.as_deref());
        Self::with_provider(config, Box::new(provider))
    }

    /// Injection point so tests can run the workflow without the network.
    pub fn with_provider(config: AppConfig, provider: Box<dyn VisionProvider>) -> Self {
        Self {
            config,
            generator: Arc::new(NarrativeGenerator::new(provider)),
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    pub fn metrics(&self) -> Arc<MetricsRecorder> {
        self.metrics.clone()
    }

    pub fn display_width(&self) -> u32 {
        self.config.display_width
    }

    pub async fn execute(&self, path: &Path, language: Language) -> anyhow::Result<WorkflowResult> {
        let stage_config = self.config.to_stage_config();

        // An unreadable file aborts here, before any detection or narrative
        // request happens.
        let frame = match Frame::open(path) {
            Ok(frame) => frame,
            Err(err) => {
                self.metrics.record_failure();
                return Err(
                    anyhow::Error::new(err).context(format!("reading image {}", path.display()))
                );
            }
        };

        let mut preprocess_stage = PreprocessStage::new(4);
        preprocess_stage
            .initialize(&stage_config)
            .context("initializing preprocess stage")?;
        let preprocess_output = preprocess_stage
            .execute(StageInput {
                frame,
                timestamp: None,
            })
            .context("executing preprocess stage")?;
        preprocess_stage.cleanup();

        let classifier = match &self.config.model_path {
            Some(model_path) => Classifier::from_file(model_path)
                .with_context(|| format!("loading model {}", model_path.display()))?,
            None => Classifier::pretrained(),
        };
        let mut detect_stage = DetectStage::new(classifier);
        detect_stage
            .initialize(&stage_config)
            .context("initializing detect stage")?;
        let detect_output = detect_stage
            .execute(StageInput {
                frame: preprocess_output.frame,
                timestamp: None,
            })
            .context("executing detect stage")?;
        detect_stage.cleanup();

        let detection = detect_output
            .metadata
            .detection
            .ok_or_else(|| anyhow::anyhow!("detect stage produced no record"))?;

        let narrative = self
            .generator
            .analyze(ImageSource::Path(path), Some(&detection), language)
            .await;
        if narrative.is_error() {
            self.metrics.record_narrative_error();
        }

        let report = compose_report(path, &detection, &narrative, Local::now().date_naive());
        self.metrics.record_analysis();

        let source_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(WorkflowResult {
            detection,
            narrative,
            report,
            source_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use medviscore::narrative::ProviderError;
    use std::io::Write;

    struct FixedProvider {
        text: Option<String>,
    }

    #[async_trait]
    impl VisionProvider for FixedProvider {
        async fn describe(&self, _prompt: &str, _jpeg_b64: &str) -> Result<String, ProviderError> {
            match &self.text {
                Some(text) => Ok(text.clone()),
                None => Err(ProviderError::Credential("Invalid or missing API key".into())),
            }
        }

        fn provider_name(&self) -> &str {
            "fixed"
        }

        fn model_name(&self) -> &str {
            "test"
        }
    }

    fn temp_png() -> tempfile::TempPath {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        let rgb = image::RgbImage::from_pixel(24, 18, image::Rgb([120, 90, 60]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(rgb)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        file.write_all(&bytes).unwrap();
        file.into_temp_path()
    }

    #[tokio::test]
    async fn workflow_produces_complete_report() {
        let runner = Runner::with_provider(
            AppConfig::from_args("unused".into(), 8080),
            Box::new(FixedProvider {
                text: Some("Findings: study reviewed.".into()),
            }),
        );
        let path = temp_png();
        let result = runner.execute(&path, Language::English).await.unwrap();
        assert!(result.report.contains("# Medical Image Analysis Report"));
        assert!(result.report.contains("Findings: study reviewed."));
        assert!(!result.report.contains("## Error Information"));
        assert_eq!(result.narrative.confidence, 0.85);
        assert!((0.0..=1.0).contains(&result.detection.confidence));
        assert_eq!(runner.metrics().snapshot(), (1, 0, 0));
    }

    #[tokio::test]
    async fn narrative_failures_still_yield_a_report() {
        let runner = Runner::with_provider(
            AppConfig::from_args("unused".into(), 8080),
            Box::new(FixedProvider { text: None }),
        );
        let path = temp_png();
        let result = runner.execute(&path, Language::English).await.unwrap();
        assert!(result.report.contains("## Error Information"));
        assert!(result.report.contains("Invalid API credential"));
        assert_eq!(runner.metrics().snapshot(), (1, 0, 1));
    }

    #[tokio::test]
    async fn unreadable_image_aborts_before_detection() {
        let runner = Runner::with_provider(
            AppConfig::from_args("unused".into(), 8080),
            Box::new(FixedProvider {
                text: Some("unreached".into()),
            }),
        );
        let err = runner
            .execute(Path::new("/no/such/scan.png"), Language::English)
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("image read failure"));
        assert_eq!(runner.metrics().snapshot(), (0, 1, 0));
    }
}

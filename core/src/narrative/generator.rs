use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use super::prompt::{build_prompt, Language};
use super::provider::{ProviderError, VisionProvider};
use super::types::NarrativeResult;
use crate::imaging::frame::Frame;
use crate::records::DetectionRecord;
use crate::telemetry::log::StageLogger;

/// Image handed to the narrative endpoint: either a file on disk or an
/// in-memory frame from the pipeline.
pub enum ImageSource<'a> {
    Path(&'a Path),
    Frame(&'a Frame),
}

/// Wraps a [`VisionProvider`] and folds every failure into a renderable
/// [`NarrativeResult`]. No retries, no timeout.
pub struct NarrativeGenerator {
    provider: Box<dyn VisionProvider>,
    logger: StageLogger,
}

impl NarrativeGenerator {
    pub fn new(provider: Box<dyn VisionProvider>) -> Self {
        Self {
            provider,
            logger: StageLogger::new("narrative"),
        }
    }

    pub async fn analyze(
        &self,
        source: ImageSource<'_>,
        detection: Option<&DetectionRecord>,
        language: Language,
    ) -> NarrativeResult {
        let prompt = build_prompt(detection, language);

        let encoded = match self.encode_image(source).await {
            Ok(encoded) => encoded,
            Err(err) => {
                self.logger.record_warning(&format!("encode failed: {}", err));
                return NarrativeResult::failure(err.category(), err.detail().to_string());
            }
        };

        match self.provider.describe(&prompt, &encoded).await {
            Ok(text) => {
                self.logger.record(&format!(
                    "{} ({}) returned {} chars",
                    self.provider.provider_name(),
                    self.provider.model_name(),
                    text.len()
                ));
                NarrativeResult::success(text)
            }
            Err(err) => {
                self.logger.record_warning(&format!("request failed: {}", err));
                NarrativeResult::failure(err.category(), err.detail().to_string())
            }
        }
    }

    /// Encodes the source as base64 JPEG. JPEG files pass through untouched;
    /// other formats are re-encoded before upload.
    async fn encode_image(&self, source: ImageSource<'_>) -> Result<String, ProviderError> {
        let jpeg_bytes = match source {
            ImageSource::Path(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|err| {
                    ProviderError::InvalidImage(format!("{}: {}", path.display(), err))
                })?;
                let is_jpeg = path
                    .extension()
                    .map(|ext| {
                        let ext = ext.to_ascii_lowercase();
                        ext == "jpg" || ext == "jpeg"
                    })
                    .unwrap_or(false);
                if is_jpeg {
                    bytes
                } else {
                    let decoded = image::load_from_memory(&bytes).map_err(|err| {
                        ProviderError::InvalidImage(format!("{}: {}", path.display(), err))
                    })?;
                    Frame::from_dynamic(decoded)
                        .to_jpeg()
                        .map_err(|err| ProviderError::InvalidImage(err.to_string()))?
                }
            }
            ImageSource::Frame(frame) => frame
                .to_jpeg()
                .map_err(|err| ProviderError::InvalidImage(err.to_string()))?,
        };
        Ok(BASE64.encode(jpeg_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrative::types::ErrorCategory;
    use async_trait::async_trait;

    struct ScriptedProvider {
        outcome: Result<String, ProviderError>,
    }

    #[async_trait]
    impl VisionProvider for ScriptedProvider {
        async fn describe(&self, _prompt: &str, _jpeg_b64: &str) -> Result<String, ProviderError> {
            match &self.outcome {
                Ok(text) => Ok(text.clone()),
                Err(ProviderError::Credential(message)) => {
                    Err(ProviderError::Credential(message.clone()))
                }
                Err(ProviderError::ContentBlocked(message)) => {
                    Err(ProviderError::ContentBlocked(message.clone()))
                }
                Err(ProviderError::InvalidImage(message)) => {
                    Err(ProviderError::InvalidImage(message.clone()))
                }
                Err(ProviderError::Network(message)) => {
                    Err(ProviderError::Network(message.clone()))
                }
                Err(ProviderError::Api(message)) => Err(ProviderError::Api(message.clone())),
            }
        }

        fn provider_name(&self) -> &str {
            "scripted"
        }

        fn model_name(&self) -> &str {
            "test"
        }
    }

    fn tiny_frame() -> Frame {
        Frame::new(4, 4, vec![120; 4 * 4 * 3]).unwrap()
    }

    #[tokio::test]
    async fn successful_analysis_uses_fixed_confidence() {
        let generator = NarrativeGenerator::new(Box::new(ScriptedProvider {
            outcome: Ok("Findings: unremarkable study.".into()),
        }));
        let frame = tiny_frame();
        let result = generator
            .analyze(ImageSource::Frame(&frame), None, Language::English)
            .await;
        assert_eq!(result.analysis, "Findings: unremarkable study.");
        assert_eq!(result.confidence, 0.85);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn credential_failure_is_recovered_locally() {
        let generator = NarrativeGenerator::new(Box::new(ScriptedProvider {
            outcome: Err(ProviderError::Credential(
                "Invalid or missing API key".into(),
            )),
        }));
        let frame = tiny_frame();
        let result = generator
            .analyze(ImageSource::Frame(&frame), None, Language::English)
            .await;
        assert_eq!(result.confidence, 0.0);
        assert!(result.analysis.contains("Please check your API key"));
        let failure = result.error.expect("tagged failure");
        assert_eq!(failure.category, ErrorCategory::Credential);
        assert_eq!(failure.message, "Invalid or missing API key");
    }

    #[tokio::test]
    async fn unreadable_path_maps_to_invalid_image() {
        let generator = NarrativeGenerator::new(Box::new(ScriptedProvider {
            outcome: Ok("unreached".into()),
        }));
        let result = generator
            .analyze(
                ImageSource::Path(Path::new("/missing/scan.png")),
                None,
                Language::English,
            )
            .await;
        assert_eq!(
            result.error.expect("tagged failure").category,
            ErrorCategory::InvalidImage
        );
    }

    #[tokio::test]
    async fn detection_confidence_reaches_the_prompt() {
        struct PromptCapture;

        #[async_trait]
        impl VisionProvider for PromptCapture {
            async fn describe(
                &self,
                prompt: &str,
                _jpeg_b64: &str,
            ) -> Result<String, ProviderError> {
                Ok(prompt.to_string())
            }

            fn provider_name(&self) -> &str {
                "capture"
            }

            fn model_name(&self) -> &str {
                "test"
            }
        }

        let generator = NarrativeGenerator::new(Box::new(PromptCapture));
        let record = DetectionRecord::new(true, 0.5, Vec::new());
        let frame = tiny_frame();
        let result = generator
            .analyze(ImageSource::Frame(&frame), Some(&record), Language::Tamil)
            .await;
        assert!(result
            .analysis
            .contains("detected anomalies with 50.0% confidence"));
        assert!(result.analysis.ends_with("Respond in Tamil language only."));
    }
}

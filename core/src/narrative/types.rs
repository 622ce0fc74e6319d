use serde::{Deserialize, Serialize};

/// Category attached to a failed narrative request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    Credential,
    InvalidImage,
    ContentBlocked,
    Unexpected,
}

impl ErrorCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorCategory::Credential => "Invalid API credential",
            ErrorCategory::InvalidImage => "Unsupported or unreadable image",
            ErrorCategory::ContentBlocked => "Content blocked by safety filter",
            ErrorCategory::Unexpected => "Unexpected analysis failure",
        }
    }

    /// User-facing text shown in place of the narrative when the request
    /// fails with this category.
    pub fn fallback_analysis(&self) -> &'static str {
        match self {
            ErrorCategory::Credential => {
                "Please check your API key configuration and try again."
            }
            ErrorCategory::InvalidImage => {
                "The image could not be analyzed. Please verify it is a supported medical image."
            }
            ErrorCategory::ContentBlocked => {
                "The analysis request was declined by the safety filter. \
                 Please verify the image is appropriate for medical analysis."
            }
            ErrorCategory::Unexpected => "An error occurred during medical image analysis.",
        }
    }
}

/// Tagged failure carried inside a [`NarrativeResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeFailure {
    pub category: ErrorCategory,
    pub message: String,
}

/// Outcome of one narrative request. Immutable after creation; failures are
/// recovered into this shape so the report composer always has something to
/// render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeResult {
    pub analysis: String,
    pub confidence: f32,
    pub error: Option<NarrativeFailure>,
}

impl NarrativeResult {
    /// Successful analysis. The confidence is a fixed figure, not derived
    /// from the endpoint.
    pub fn success(analysis: String) -> Self {
        Self {
            analysis,
            confidence: 0.85,
            error: None,
        }
    }

    pub fn failure(category: ErrorCategory, message: String) -> Self {
        Self {
            analysis: category.fallback_analysis().to_string(),
            confidence: 0.0,
            error: Some(NarrativeFailure { category, message }),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_carries_fixed_confidence() {
        let result = NarrativeResult::success("Findings: none.".into());
        assert_eq!(result.confidence, 0.85);
        assert!(!result.is_error());
    }

    #[test]
    fn failure_zeroes_confidence_and_keeps_category() {
        let result =
            NarrativeResult::failure(ErrorCategory::Credential, "key rejected".into());
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.analysis, ErrorCategory::Credential.fallback_analysis());
        assert_eq!(result.error.unwrap().category, ErrorCategory::Credential);
    }
}

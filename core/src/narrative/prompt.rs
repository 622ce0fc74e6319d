use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::records::DetectionRecord;

/// Languages the narrative endpoint is asked to respond in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    English,
    Hindi,
    Tamil,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::English, Language::Hindi, Language::Tamil];

    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
            Language::Tamil => "ta",
        }
    }

    fn directive(&self) -> &'static str {
        match self {
            Language::English => "Respond in English language.",
            Language::Hindi => "Respond in Hindi language only.",
            Language::Tamil => "Respond in Tamil language only.",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Tamil => "Tamil",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "hi" | "hindi" => Ok(Language::Hindi),
            "ta" | "tamil" => Ok(Language::Tamil),
            other => Err(format!("unsupported language: {}", other)),
        }
    }
}

const CLINICAL_PROMPT: &str = "You are a medical image analysis expert. \
Analyze this medical image and provide:
1. Hospital Priority (RED/ORANGE/GREEN) and action (Immediate/Monitor/Home Care).
2. Detailed description of visible features.
3. Abnormalities or concerns.
4. Possible diagnoses.
5. Recommendations.";

/// Builds the fixed clinical prompt, appending the detector confidence when
/// a record is supplied and closing with the language directive.
pub fn build_prompt(detection: Option<&DetectionRecord>, language: Language) -> String {
    let mut prompt = CLINICAL_PROMPT.to_string();

    if let Some(record) = detection {
        prompt.push_str(&format!(
            "\n\nComputer vision model detected anomalies with {:.1}% confidence.",
            record.confidence * 100.0
        ));
    }

    prompt.push_str("\n\n");
    prompt.push_str(language.directive());
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_without_detection_still_sets_language() {
        let prompt = build_prompt(None, Language::English);
        assert!(prompt.starts_with("You are a medical image analysis expert."));
        assert!(prompt.ends_with("Respond in English language."));
        assert!(!prompt.contains("Computer vision model"));
    }

    #[test]
    fn detection_confidence_is_formatted_as_percentage() {
        let record = DetectionRecord::new(true, 0.77, Vec::new());
        let prompt = build_prompt(Some(&record), Language::Hindi);
        assert!(prompt.contains("detected anomalies with 77.0% confidence."));
        assert!(prompt.ends_with("Respond in Hindi language only."));
    }

    #[test]
    fn tamil_directive_is_exclusive() {
        let prompt = build_prompt(None, Language::Tamil);
        assert!(prompt.ends_with("Respond in Tamil language only."));
    }

    #[test]
    fn language_codes_round_trip() {
        for language in Language::ALL {
            assert_eq!(language.code().parse::<Language>().unwrap(), language);
        }
        assert!("fr".parse::<Language>().is_err());
    }
}

use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{ProviderError, VisionProvider};
use async_trait::async_trait;

const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Gemini `generateContent` client for multimodal (text + image) prompts.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(api_key: &str, model: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
        }
    }
}

#[async_trait]
impl VisionProvider for GeminiProvider {
    async fn describe(&self, prompt: &str, jpeg_b64: &str) -> Result<String, ProviderError> {
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {"text": prompt},
                    {"inline_data": {"mime_type": "image/jpeg", "data": jpeg_b64}}
                ]
            }]
        });

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(format!("Gemini request failed: {}", e)))?;

        let status = resp.status().as_u16();
        let data: Value = resp
            .json()
            .await
            .map_err(|e| ProviderError::Api(format!("parse error: {}", e)))?;

        classify_response(status, &data)
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Categorizes a `generateContent` response from its status code and
/// structured fields. Pure so the mapping stays unit-testable offline.
fn classify_response(status: u16, data: &Value) -> Result<String, ProviderError> {
    if let Some(error) = data.get("error") {
        let message = error["message"].as_str().unwrap_or("unknown error").to_string();
        let key_rejected = error["details"]
            .as_array()
            .map(|details| {
                details
                    .iter()
                    .any(|detail| detail["reason"].as_str() == Some("API_KEY_INVALID"))
            })
            .unwrap_or(false);

        return Err(match status {
            401 | 403 => ProviderError::Credential(message),
            400 if key_rejected => ProviderError::Credential(message),
            400 => ProviderError::InvalidImage(message),
            _ => ProviderError::Api(message),
        });
    }

    if let Some(reason) = data["promptFeedback"]["blockReason"].as_str() {
        return Err(ProviderError::ContentBlocked(format!(
            "prompt blocked: {}",
            reason
        )));
    }

    let candidate = &data["candidates"][0];
    if candidate["finishReason"].as_str() == Some("SAFETY") {
        return Err(ProviderError::ContentBlocked(
            "candidate suppressed for safety".into(),
        ));
    }

    candidate["content"]["parts"][0]["text"]
        .as_str()
        .map(|text| text.to_string())
        .ok_or_else(|| ProviderError::Api("no analysis text in response".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_candidate_text() {
        let data = json!({
            "candidates": [{"content": {"parts": [{"text": "Findings: clear."}]}}]
        });
        assert_eq!(classify_response(200, &data).unwrap(), "Findings: clear.");
    }

    #[test]
    fn rejected_key_maps_to_credential() {
        let data = json!({
            "error": {
                "message": "API key not valid. Please pass a valid API key.",
                "details": [{"reason": "API_KEY_INVALID"}]
            }
        });
        let err = classify_response(400, &data).unwrap_err();
        assert!(matches!(err, ProviderError::Credential(_)));
    }

    #[test]
    fn forbidden_status_maps_to_credential() {
        let data = json!({"error": {"message": "permission denied"}});
        let err = classify_response(403, &data).unwrap_err();
        assert!(matches!(err, ProviderError::Credential(_)));
    }

    #[test]
    fn malformed_payload_maps_to_invalid_image() {
        let data = json!({"error": {"message": "image data could not be decoded"}});
        let err = classify_response(400, &data).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidImage(_)));
    }

    #[test]
    fn block_reason_maps_to_content_blocked() {
        let data = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let err = classify_response(200, &data).unwrap_err();
        assert!(matches!(err, ProviderError::ContentBlocked(_)));
    }

    #[test]
    fn safety_finish_reason_maps_to_content_blocked() {
        let data = json!({"candidates": [{"finishReason": "SAFETY"}]});
        let err = classify_response(200, &data).unwrap_err();
        assert!(matches!(err, ProviderError::ContentBlocked(_)));
    }

    #[test]
    fn empty_response_is_an_api_failure() {
        let err = classify_response(200, &json!({})).unwrap_err();
        assert!(matches!(err, ProviderError::Api(_)));
    }
}

//! Local Ollama as the summarization backend.

use std::time::Duration;

use serde::Deserialize;

use super::{build_synthesis_prompt, Summarizer, SummarizerError, ERROR_PREFIX};
use crate::types::{EntityClass, OllamaConfig};

/// Generation can be slow on large local models.
const GENERATE_TIMEOUT: Duration = Duration::from_secs(120);
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const TEMPERATURE: f64 = 0.3;
const TOP_P: f64 = 0.9;

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    #[serde(default)]
    name: String,
}

pub struct OllamaClient {
    endpoint: String,
    model: String,
}

impl OllamaClient {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    pub fn from_config(config: &OllamaConfig) -> Self {
        Self::new(config.endpoint.clone(), config.model.clone())
    }

    /// Use a specific installed model, e.g. the one [`verify_setup`](Self::verify_setup) found.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Server root: the endpoint with its `/api/...` path removed.
    fn base_url(&self) -> &str {
        self.endpoint
            .rsplit_once("/api")
            .map(|(base, _)| base)
            .unwrap_or(self.endpoint.as_str())
            .trim_end_matches('/')
    }

    fn make_request_payload(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": TEMPERATURE,
                "top_p": TOP_P,
            },
        })
    }

    fn parse_response_text(response_json: &str) -> Result<String, SummarizerError> {
        let value: serde_json::Value = serde_json::from_str(response_json)
            .map_err(|e| SummarizerError::InvalidResponse(e.to_string()))?;
        Ok(value["response"].as_str().unwrap_or("").trim().to_string())
    }

    /// Names of the locally installed models.
    pub fn list_models(&self) -> Result<Vec<String>, SummarizerError> {
        let url = format!("{}/api/tags", self.base_url());
        let response = reqwest::blocking::Client::new()
            .get(&url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .map_err(|_| SummarizerError::NotRunning(self.base_url().to_string()))?;
        if !response.status().is_success() {
            return Err(SummarizerError::NotRunning(self.base_url().to_string()));
        }
        let tags: TagsResponse = response
            .json()
            .map_err(|e| SummarizerError::InvalidResponse(e.to_string()))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Check Ollama is up and the configured model (by family prefix) is installed.
    ///
    /// Returns the matching installed model name.
    pub fn verify_setup(&self) -> Result<String, SummarizerError> {
        let available = self.list_models()?;
        pick_model(&self.model, &available)
    }

    /// Run one non-streaming generation.
    pub fn generate(&self, prompt: &str) -> Result<String, SummarizerError> {
        let response = reqwest::blocking::Client::new()
            .post(&self.endpoint)
            .timeout(GENERATE_TIMEOUT)
            .json(&self.make_request_payload(prompt))
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    SummarizerError::Timeout
                } else {
                    SummarizerError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SummarizerError::Status(status.as_u16()));
        }
        let text = response.text().map_err(|e| {
            if e.is_timeout() {
                SummarizerError::Timeout
            } else {
                SummarizerError::InvalidResponse(e.to_string())
            }
        })?;
        Self::parse_response_text(&text)
    }
}

/// First installed model sharing the configured model's family (`gemma2` of `gemma2:27b`).
fn pick_model(model: &str, available: &[String]) -> Result<String, SummarizerError> {
    if available.is_empty() {
        return Err(SummarizerError::NoModels);
    }
    let family = model.split(':').next().unwrap_or(model);
    available
        .iter()
        .find(|name| name.starts_with(family))
        .cloned()
        .ok_or_else(|| SummarizerError::ModelMissing {
            model: model.to_string(),
            available: available.to_vec(),
        })
}

impl Summarizer for OllamaClient {
    fn synthesize(&self, context: &str, entity_name: &str, class: EntityClass) -> String {
        let prompt = build_synthesis_prompt(context, entity_name, class);
        match self.generate(&prompt) {
            Ok(text) => text,
            Err(e) => format!("{} {}", ERROR_PREFIX, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_strips_api_path() {
        let client = OllamaClient::new("http://localhost:11434/api/generate", "gemma2:27b");
        assert_eq!(client.base_url(), "http://localhost:11434");

        let bare = OllamaClient::new("http://gpu-box:11434/", "gemma2:27b");
        assert_eq!(bare.base_url(), "http://gpu-box:11434");
    }

    #[test]
    fn test_request_payload() {
        let client = OllamaClient::new("http://localhost:11434/api/generate", "gemma2:27b");
        let payload = client.make_request_payload("Summarize.");
        assert_eq!(payload["model"], "gemma2:27b");
        assert_eq!(payload["prompt"], "Summarize.");
        assert_eq!(payload["stream"], false);
        assert_eq!(payload["options"]["temperature"], 0.3);
        assert_eq!(payload["options"]["top_p"], 0.9);
    }

    #[test]
    fn test_parse_response_text() {
        let text = OllamaClient::parse_response_text(r#"{"response": "  Activity: Met.\n"}"#).unwrap();
        assert_eq!(text, "Activity: Met.");
        assert_eq!(OllamaClient::parse_response_text("{}").unwrap(), "");
        assert!(OllamaClient::parse_response_text("not json").is_err());
    }

    #[test]
    fn test_pick_model_by_family() {
        let available = vec!["llama3:8b".to_string(), "gemma2:9b".to_string()];
        assert_eq!(pick_model("gemma2:27b", &available).unwrap(), "gemma2:9b");
        assert!(matches!(
            pick_model("mistral", &available),
            Err(SummarizerError::ModelMissing { .. })
        ));
        assert!(matches!(pick_model("gemma2", &[]), Err(SummarizerError::NoModels)));
    }

    #[test]
    fn test_unreachable_server_yields_error_summary() {
        // Port 9 (discard) is closed on test machines.
        let client = OllamaClient::new("http://127.0.0.1:9/api/generate", "gemma2:27b");
        let summary = client.synthesize("context", "Acme", EntityClass::Deal);
        assert!(summary.starts_with("Error: "));
        assert!(client.verify_setup().is_err());
    }
}

//! Blocking client for a local Ollama server.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ollama client errors.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Ollama request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Ollama returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Ollama generation failed: {0}")]
    Generation(String),
}

pub type LlmResult<T> = Result<T, LlmError>;

/// Non-streaming `/api/generate` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateResponse {
    pub model: String,
    pub response: String,
    #[serde(default)]
    pub done: bool,
}

/// A locally installed model, from `/api/tags`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OllamaModel {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub digest: String,
    #[serde(default)]
    pub modified_at: String,
}

/// Final status of `/api/pull`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PullStatus {
    pub status: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Serialize)]
struct PullRequest<'a> {
    name: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

/// Text generation backend.
pub trait TextGenerator: Send + Sync {
    /// Generate a complete response for `prompt`.
    fn generate(&self, model: &str, prompt: &str) -> LlmResult<GenerateResponse>;

    /// Whether `model` is installed. Errors count as unavailable.
    fn is_model_available(&self, model: &str) -> bool;

    /// Download `model`.
    fn pull_model(&self, model: &str) -> LlmResult<PullStatus>;
}

/// Pull `model` when it is missing, then generate.
pub fn generate_with_pull(
    generator: &dyn TextGenerator,
    model: &str,
    prompt: &str,
) -> LlmResult<GenerateResponse> {
    if !generator.is_model_available(model) {
        tracing::info!(model = %model, "Model not installed, pulling");
        let status = generator.pull_model(model)?;
        tracing::info!(model = %model, status = %status.status, "Model pull finished");
    }
    generator.generate(model, prompt)
}

/// Model names match when they agree after an untagged name is read as `:latest`.
fn same_model(installed: &str, requested: &str) -> bool {
    fn with_tag(name: &str) -> std::borrow::Cow<'_, str> {
        if name.contains(':') {
            name.into()
        } else {
            format!("{}:latest", name).into()
        }
    }
    with_tag(installed) == with_tag(requested)
}

/// HTTP client for the Ollama REST API.
pub struct OllamaClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl OllamaClient {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> LlmResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List installed models.
    pub fn list_models(&self) -> LlmResult<Vec<OllamaModel>> {
        let response = self.http.get(format!("{}/api/tags", self.base_url)).send()?;
        let tags: TagsResponse = check_status(response)?.json()?;
        Ok(tags.models)
    }

    fn post<B: Serialize>(&self, path: &str, body: &B) -> LlmResult<reqwest::blocking::Response> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()?;
        check_status(response)
    }
}

impl TextGenerator for OllamaClient {
    fn generate(&self, model: &str, prompt: &str) -> LlmResult<GenerateResponse> {
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
        };
        let generated: GenerateResponse = self.post("/api/generate", &request)?.json()?;

        tracing::debug!(
            model = %generated.model,
            chars = generated.response.len(),
            "Ollama generation complete"
        );
        Ok(generated)
    }

    fn is_model_available(&self, model: &str) -> bool {
        match self.list_models() {
            Ok(models) => models.iter().any(|m| same_model(&m.name, model)),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list Ollama models");
                false
            }
        }
    }

    fn pull_model(&self, model: &str) -> LlmResult<PullStatus> {
        let request = PullRequest {
            name: model,
            stream: false,
        };
        Ok(self.post("/api/pull", &request)?.json()?)
    }
}

fn check_status(response: reqwest::blocking::Response) -> LlmResult<reqwest::blocking::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(LlmError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Scripted generator for tests and offline use.
///
/// Responses are chosen by the first registered key contained in the prompt.
#[derive(Default)]
pub struct MockGenerator {
    responses: Vec<(String, String)>,
    installed: Vec<String>,
    failing: bool,
    pulls: Mutex<HashMap<String, usize>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer prompts containing `prompt_fragment` with `response`.
    pub fn respond(mut self, prompt_fragment: &str, response: &str) -> Self {
        self.responses
            .push((prompt_fragment.to_string(), response.to_string()));
        self
    }

    /// Mark `model` as installed.
    pub fn with_model(mut self, model: &str) -> Self {
        self.installed.push(model.to_string());
        self
    }

    /// Make every generation fail.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// How many times `model` was pulled.
    pub fn pull_count(&self, model: &str) -> usize {
        self.pulls
            .lock()
            .map(|pulls| pulls.get(model).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

impl TextGenerator for MockGenerator {
    fn generate(&self, model: &str, prompt: &str) -> LlmResult<GenerateResponse> {
        if self.failing {
            return Err(LlmError::Generation("mock generator is offline".into()));
        }

        let response = self
            .responses
            .iter()
            .find(|(fragment, _)| prompt.contains(fragment.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_default();

        Ok(GenerateResponse {
            model: model.to_string(),
            response,
            done: true,
        })
    }

    fn is_model_available(&self, model: &str) -> bool {
        self.installed.iter().any(|m| same_model(m, model))
    }

    fn pull_model(&self, model: &str) -> LlmResult<PullStatus> {
        if let Ok(mut pulls) = self.pulls.lock() {
            *pulls.entry(model.to_string()).or_insert(0) += 1;
        }
        Ok(PullStatus {
            status: "success".into(),
        })
    }
}

//! Text-generation client that turns a question into SQL.
//!
//! `SqlGenerator` is the seam between the pipeline and the hosted model. `GeminiClient` talks to
//! the Gemini `generateContent` endpoint; `MockGenerator` returns a canned reply for tests and
//! offline runs.

use crate::config::GenerationConfig;
use crate::constants::API_KEY_HEADER;
use crate::error::GenerationError;
use medquery_types::Question;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub trait SqlGenerator: Send + Sync {
    /// Sends the fixed instruction and the question as one user turn and returns the raw
    /// completion text. Errors are final: callers do not retry.
    fn generate_sql(&self, question: &Question, prompt: &str) -> Result<String, GenerationError>;
}

/// Client for the hosted Gemini model.
///
/// A fresh blocking HTTP client is built for each call and dropped before returning, so the
/// client never outlives the blocking thread it runs on. No request timeout is set.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: GenerationConfig,
}

impl GeminiClient {
    pub fn new(config: GenerationConfig) -> Self {
        Self { config }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url(),
            self.config.model()
        )
    }
}

/// Request body for `models/{model}:generateContent`
#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// Response body from `models/{model}:generateContent`
#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

fn request_body<'a>(prompt: &'a str, question: &'a Question) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![Part { text: prompt }, Part { text: question.as_str() }],
        }],
    }
}

/// Concatenates the text parts of the first candidate.
fn completion_text(response: GenerateContentResponse) -> Result<String, GenerationError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(text)
}

impl SqlGenerator for GeminiClient {
    fn generate_sql(&self, question: &Question, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self.config.api_key().ok_or(GenerationError::MissingApiKey)?;

        let client = reqwest::blocking::Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| GenerationError::HttpClient(e.to_string()))?;

        tracing::info!("requesting SQL from {}", self.config.model());
        let response = client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .json(&request_body(prompt, question))
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    GenerationError::Connection(self.config.base_url().to_string())
                } else {
                    GenerationError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GenerationError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .map_err(|e| GenerationError::ResponseParsing(e.to_string()))?;

        completion_text(parsed)
    }
}

/// Generator returning a configured reply, counting how often it is called.
#[derive(Debug)]
pub struct MockGenerator {
    reply: Result<String, String>,
    calls: AtomicUsize,
}

impl MockGenerator {
    /// Always answers with `text`.
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always fails as a service error carrying `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SqlGenerator for MockGenerator {
    fn generate_sql(&self, _question: &Question, _prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().map_err(|body| GenerationError::Service {
            status: 503,
            body,
        })
    }
}

//! Gemini-backed location classifier.
//!
//! Calls `POST {base}/v1beta/models/{model}:generateContent` with the
//! neighborhood prompt and reads the text parts of the first candidate.
//! The answer is normalized with [`canonical_name`].

use serde::{Deserialize, Serialize};
use streetcred_core::neighborhood::{canonical_name, classifier_prompt};
use streetcred_core::Coordinates;
use streetcred_rewards::{ClassifierError, LocationClassifier};

use crate::error::ClientError;
use crate::retry::{self, Retry};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| {
                c.parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Classifier delegating to a Gemini model.
#[derive(Debug, Clone)]
pub struct GeminiClassifier {
    http: reqwest::Client,
    base_url: url::Url,
    model: String,
}

impl GeminiClassifier {
    pub(crate) fn new(http: reqwest::Client, base_url: url::Url, model: String) -> Self {
        Self {
            http,
            base_url,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Raw model answer for a prompt.
    pub async fn generate(&self, prompt: &str) -> Result<String, ClientError> {
        let endpoint = format!("POST /v1beta/models/{}:generateContent", self.model);
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.as_str().trim_end_matches('/'),
            self.model
        );
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        // generateContent has no side effects.
        let resp = retry::send(Retry::Idempotent, || self.http.post(&url).json(&body).send())
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::ApiError {
                endpoint,
                status,
                body,
            });
        }

        let parsed: GenerateResponse =
            resp.json()
                .await
                .map_err(|e| ClientError::Deserialization {
                    endpoint,
                    source: e,
                })?;
        Ok(parsed.text())
    }
}

impl LocationClassifier for GeminiClassifier {
    async fn classify(&self, at: &Coordinates) -> Result<String, ClassifierError> {
        let raw = self
            .generate(&classifier_prompt(at))
            .await
            .map_err(ClientError::into_classifier_error)?;
        let name = canonical_name(&raw).ok_or(ClassifierError::EmptyResponse)?;
        tracing::debug!(lat = at.lat(), lon = at.lon(), location = %name, "location classified");
        Ok(name)
    }
}

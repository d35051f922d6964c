use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stroll_core::{GroundingChunk, LatLng, OutputContract, TourError};
use tracing::{debug, warn};

use crate::model::{GenerativeModel, ModelCall, ModelReply};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Gemini `generateContent` over REST.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<ToolConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_maps: GoogleMaps,
}

#[derive(Debug, Serialize)]
struct GoogleMaps {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolConfig {
    retrieval_config: RetrievalConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalConfig {
    lat_lng: LatLng,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<RawGroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
struct RawGroundingChunk {
    #[serde(default)]
    maps: Option<PlaceReference>,
    #[serde(default)]
    web: Option<PlaceReference>,
}

#[derive(Debug, Default, Deserialize)]
struct PlaceReference {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GeminiClient {
    pub fn new(http: Client, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

impl GenerativeModel for GeminiClient {
    async fn generate(&self, call: ModelCall) -> Result<ModelReply, TourError> {
        let body = request_body(&call);
        debug!(
            model = %self.model,
            mode = call.contract.mode().as_str(),
            prompt_len = call.prompt.len(),
            "calling gemini generateContent"
        );

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", call.api_key.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|error| TourError::upstream(format!("gemini request failed: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorEnvelope>(&raw)
                .map(|envelope| {
                    format!(
                        "{} ({})",
                        envelope.error.message,
                        envelope.error.status.unwrap_or_default()
                    )
                })
                .unwrap_or(raw);
            warn!(status = status.as_u16(), "gemini returned non-success status");
            return Err(TourError::upstream(format!(
                "gemini status {}: {}",
                status.as_u16(),
                detail
            )));
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|error| TourError::upstream(format!("malformed gemini envelope: {error}")))?;

        Ok(reply_from_response(payload))
    }
}

fn request_body(call: &ModelCall) -> GenerateContentRequest<'_> {
    let contents = vec![Content {
        role: "user",
        parts: vec![Part {
            text: call.prompt.as_str(),
        }],
    }];

    match &call.contract {
        OutputContract::Grounded => GenerateContentRequest {
            contents,
            tools: Some(vec![Tool {
                google_maps: GoogleMaps {},
            }]),
            tool_config: call.lat_lng.map(|lat_lng| ToolConfig {
                retrieval_config: RetrievalConfig { lat_lng },
            }),
            generation_config: None,
        },
        OutputContract::Structured { schema } => GenerateContentRequest {
            contents,
            tools: None,
            tool_config: None,
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
            }),
        },
    }
}

fn reply_from_response(payload: GenerateContentResponse) -> ModelReply {
    let Some(candidate) = payload.candidates.into_iter().next() else {
        return ModelReply::default();
    };

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if reason != "STOP" {
            debug!(finish_reason = reason, "gemini candidate finished early");
        }
    }

    let text = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    let grounding_chunks = candidate
        .grounding_metadata
        .map(|metadata| {
            metadata
                .grounding_chunks
                .into_iter()
                .filter_map(|chunk| chunk.maps.or(chunk.web))
                .filter_map(|place| {
                    let title = place.title.filter(|title| !title.is_empty())?;
                    Some(GroundingChunk {
                        title,
                        uri: place.uri.unwrap_or_default(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    ModelReply {
        text,
        grounding_chunks,
    }
}

// Gemini `generateContent` over HTTPS (blocking reqwest; runs on the
// generation worker thread, never on the window thread).

use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ServiceConfig;
use crate::error::Error;
use crate::generation::{GenerationRequest, GenerationService};
use crate::response::ResponsePart;

const API_KEY_HEADER: &str = "x-goog-api-key";
const LOG_PREVIEW_CHARS: usize = 50;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataOut,
    },
    Text {
        text: &'a str,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataOut {
    mime_type: &'static str,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: [&'static str; 2],
}

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
    parts: Vec<WirePart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    text: Option<String>,
    inline_data: Option<WireInlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireInlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn preview(text: &str) -> String {
    if text.len() <= LOG_PREVIEW_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(LOG_PREVIEW_CHARS).collect();
    format!("{head}... (truncated)")
}

/// JSON body for one request: the PNG first, then the prompt text.
fn request_body<'a>(request: &'a GenerationRequest, image_b64: String) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![
                RequestPart::InlineData {
                    inline_data: InlineDataOut { mime_type: "image/png", data: image_b64 },
                },
                RequestPart::Text { text: request.prompt_text() },
            ],
        }],
        generation_config: GenerationConfig { response_modalities: ["TEXT", "IMAGE"] },
    }
}

/// Turn a successful response body into ordered parts. Parts that are
/// neither text nor inline data are skipped.
pub fn parts_from_json(body: &str) -> Result<Vec<ResponsePart>, Error> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| Error::Service(format!("unreadable response body: {e}")))?;

    let Some(content) = response.candidates.into_iter().next().and_then(|c| c.content) else {
        return Ok(Vec::new());
    };

    let mut parts = Vec::with_capacity(content.parts.len());
    for part in content.parts {
        if let Some(inline) = part.inline_data {
            let data = general_purpose::STANDARD
                .decode(inline.data.as_bytes())
                .map_err(|e| Error::Decode(format!("inline data is not base64: {e}")))?;
            parts.push(ResponsePart::InlineData { mime_type: inline.mime_type, data });
        } else if let Some(text) = part.text {
            parts.push(ResponsePart::Text(text));
        }
    }
    Ok(parts)
}

/// Best human-readable message from a failed response body.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => format!("{status}: {}", envelope.error.message),
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => format!("{status}: {}", preview(body.trim())),
    }
}

pub struct GeminiService {
    client: Client,
    url: String,
}

impl GeminiService {
    pub fn new(config: &ServiceConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(15))
            .user_agent(concat!("co-drawing/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("http client: {e}")))?;
        Ok(Self { client, url: generate_url(&config.endpoint, &config.model) })
    }
}

pub fn generate_url(endpoint: &str, model: &str) -> String {
    format!("{}/v1beta/models/{model}:generateContent", endpoint.trim_end_matches('/'))
}

impl GenerationService for GeminiService {
    fn generate(&self, request: &GenerationRequest, credential: &str)
        -> Result<Vec<ResponsePart>, Error> {
        let image_b64 = general_purpose::STANDARD.encode(request.image_png());
        debug!(
            prompt = request.prompt_text(),
            drawing_data = %preview(&image_b64),
            "request payload"
        );
        let body = request_body(request, image_b64);

        let response = self
            .client
            .post(&self.url)
            .header(API_KEY_HEADER, credential)
            .json(&body)
            .send()
            .map_err(|e| Error::Service(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| Error::Service(format!("read response body: {e}")))?;
        if !status.is_success() {
            let message = error_message(status, &text);
            warn!(%status, "generation service rejected the request");
            return Err(Error::Service(message));
        }
        debug!(response = %preview(&text), "response body");
        parts_from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn request_body_carries_image_prompt_and_modalities() {
        let request = GenerationRequest::new("draw a cat", vec![0x89, b'P', b'N', b'G']);
        let b64 = general_purpose::STANDARD.encode(request.image_png());
        let value: Value = serde_json::to_value(request_body(&request, b64.clone())).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        { "inlineData": { "mimeType": "image/png", "data": b64 } },
                        { "text": "draw a cat. Keep the same minimal line doodle style." }
                    ]
                }],
                "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] }
            })
        );
    }

    #[test]
    fn response_parts_keep_their_order_and_decode_base64() {
        let body = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "Here is your cat" },
                        { "inlineData": { "mimeType": "image/png", "data": "AQID" } },
                        { "thoughtSignature": "ignored" }
                    ]
                },
                "finishReason": "STOP"
            }]
        })
        .to_string();
        let parts = parts_from_json(&body).unwrap();
        assert_eq!(
            parts,
            vec![
                ResponsePart::Text("Here is your cat".into()),
                ResponsePart::InlineData { mime_type: "image/png".into(), data: vec![1, 2, 3] },
            ]
        );
    }

    #[test]
    fn missing_candidates_give_no_parts() {
        assert!(parts_from_json("{}").unwrap().is_empty());
        assert!(parts_from_json(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap().is_empty());
    }

    #[test]
    fn bad_base64_is_a_decode_error() {
        let body = r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"image/png","data":"%%%"}}]}}]}"#;
        assert!(matches!(parts_from_json(body), Err(Error::Decode(_))));
    }

    #[test]
    fn non_json_body_is_a_service_error() {
        assert!(matches!(parts_from_json("<html>bad gateway</html>"), Err(Error::Service(_))));
    }

    #[test]
    fn service_error_message_is_extracted() {
        let body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(
            error_message(reqwest::StatusCode::BAD_REQUEST, body),
            "400 Bad Request: API key not valid."
        );
        assert_eq!(error_message(reqwest::StatusCode::BAD_GATEWAY, ""), "502 Bad Gateway");
    }

    #[test]
    fn url_joins_endpoint_and_model() {
        assert_eq!(
            generate_url("https://example.test/", "m-1"),
            "https://example.test/v1beta/models/m-1:generateContent"
        );
    }

    #[test]
    fn previews_are_truncated() {
        let long = "A".repeat(80);
        let p = preview(&long);
        assert!(p.starts_with(&"A".repeat(50)));
        assert!(p.ends_with("... (truncated)"));
        assert_eq!(preview("short"), "short");
    }
}

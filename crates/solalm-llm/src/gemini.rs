//! Gemini adapter:
//! - text fragments via `models/{model}:generateContent` with a JSON response schema
//! - images via the Imagen `models/{model}:predict` endpoint

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Value, json};
use tracing::debug;

use crate::errors::{
    AdapterTimeout, ConfigurationError, ErrorInfo, HttpErrorClassification, LlmError,
    NoObjectGeneratedError, ProviderError, ProviderErrorKind, RequestTimeoutError,
    classify_message, default_retryable_for_kind, map_grpc_status, map_http_status,
};
use crate::prompts::{fragment_prompt, image_prompt, reference_example};
use crate::provider::{ImageProvider, TextFragmentProvider};
use crate::types::{FragmentMode, ImageHandle, TextFragment};

const PROVIDER: &str = "gemini";

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";

#[derive(Clone, Debug)]
pub struct GeminiAdapterConfig {
    pub api_key: String,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub timeout: AdapterTimeout,
}

impl GeminiAdapterConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            timeout: AdapterTimeout::default(),
        }
    }

    /// Reads `GEMINI_API_KEY` (or the legacy `API_KEY`) plus optional
    /// endpoint and model overrides. Returns `None` when no key is set.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty())?;
        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("GEMINI_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(model) = std::env::var("GEMINI_TEXT_MODEL") {
            config.text_model = model;
        }
        if let Ok(model) = std::env::var("GEMINI_IMAGE_MODEL") {
            config.image_model = model;
        }
        Some(config)
    }
}

#[derive(Clone)]
pub struct GeminiAdapter {
    client: reqwest::Client,
    config: GeminiAdapterConfig,
}

impl std::fmt::Debug for GeminiAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiAdapter")
            .field("base_url", &self.config.base_url)
            .field("text_model", &self.config.text_model)
            .field("image_model", &self.config.image_model)
            .field("timeout", &self.config.timeout)
            .finish()
    }
}

impl GeminiAdapter {
    pub fn new(config: GeminiAdapterConfig) -> Result<Self, LlmError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&config.api_key).map_err(|error| {
                LlmError::Configuration(ConfigurationError::new(format!(
                    "invalid Gemini API key header: {}",
                    error
                )))
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs_f64(config.timeout.connect))
            .timeout(Duration::from_secs_f64(config.timeout.request))
            .default_headers(headers)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, LlmError> {
        let config = GeminiAdapterConfig::from_env().ok_or_else(|| {
            LlmError::Configuration(ConfigurationError::new(
                "GEMINI_API_KEY (or API_KEY) environment variable is not set",
            ))
        })?;
        Self::new(config)
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.base_url.trim_end_matches('/'),
            model,
            method
        )
    }

    async fn post_json(&self, url: String, body: &Value) -> Result<Value, LlmError> {
        let response = self.client.post(url).json(body).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let raw = response.text().await.unwrap_or_default();
            return Err(build_provider_error(status, &raw));
        }
        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl TextFragmentProvider for GeminiAdapter {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn fetch(&self, mode: FragmentMode) -> Result<TextFragment, LlmError> {
        let url = self.endpoint(&self.config.text_model, "generateContent");
        let body = build_fragment_body(mode);
        debug!(mode = mode.as_str(), model = %self.config.text_model, "requesting text fragment");
        let raw = self.post_json(url, &body).await?;
        parse_fragment_response(&raw)
    }
}

#[async_trait]
impl ImageProvider for GeminiAdapter {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, prompt_text: &str) -> Result<ImageHandle, LlmError> {
        let url = self.endpoint(&self.config.image_model, "predict");
        let body = build_image_body(&image_prompt(prompt_text));
        debug!(model = %self.config.image_model, "requesting image");
        let raw = self.post_json(url, &body).await?;
        parse_image_response(&raw)
    }
}

pub(crate) fn build_fragment_body(mode: FragmentMode) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": fragment_prompt(mode) }],
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "verseText": {
                        "type": "STRING",
                        "description": "The full text of the Bible verse.",
                    },
                    "reference": {
                        "type": "STRING",
                        "description": format!(
                            "The reference for the verse, e.g., '{}'.",
                            reference_example(mode)
                        ),
                    },
                },
                "required": ["verseText", "reference"],
            },
        },
    })
}

pub(crate) fn build_image_body(prompt: &str) -> Value {
    json!({
        "instances": [{ "prompt": prompt }],
        "parameters": {
            "sampleCount": 1,
            "aspectRatio": "1:1",
            "outputOptions": { "mimeType": "image/png" },
        },
    })
}

/// Extract the structured fragment from the first candidate's text parts.
pub(crate) fn parse_fragment_response(raw: &Value) -> Result<TextFragment, LlmError> {
    let parts = raw
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .ok_or_else(|| {
            LlmError::NoObjectGenerated(NoObjectGeneratedError::new(
                "response contained no candidates",
            ))
        })?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    let text = text.trim();
    if text.is_empty() {
        return Err(LlmError::NoObjectGenerated(NoObjectGeneratedError::new(
            "response candidate contained no text",
        )));
    }

    let fragment: TextFragment = serde_json::from_str(text).map_err(|error| {
        LlmError::NoObjectGenerated(NoObjectGeneratedError::with_cause(
            "response text is not a valid verse object",
            error.to_string(),
        ))
    })?;
    if fragment.text.trim().is_empty() || fragment.reference.trim().is_empty() {
        return Err(LlmError::NoObjectGenerated(NoObjectGeneratedError::new(
            "verse object has empty fields",
        )));
    }
    Ok(fragment)
}

pub(crate) fn parse_image_response(raw: &Value) -> Result<ImageHandle, LlmError> {
    let prediction = raw
        .get("predictions")
        .and_then(Value::as_array)
        .and_then(|predictions| {
            predictions
                .iter()
                .find(|prediction| prediction.get("bytesBase64Encoded").is_some())
        })
        .ok_or_else(|| {
            LlmError::NoObjectGenerated(NoObjectGeneratedError::new("No image was generated."))
        })?;

    let data = prediction
        .get("bytesBase64Encoded")
        .and_then(Value::as_str)
        .filter(|data| !data.is_empty())
        .ok_or_else(|| {
            LlmError::NoObjectGenerated(NoObjectGeneratedError::new(
                "image prediction has no payload",
            ))
        })?;
    let mime_type = prediction
        .get("mimeType")
        .and_then(Value::as_str)
        .unwrap_or("image/png");
    let handle = ImageHandle::new(mime_type, data);
    handle.decode_bytes().map_err(|err| {
        LlmError::NoObjectGenerated(NoObjectGeneratedError::with_cause(
            "image payload is not valid base64",
            err.to_string(),
        ))
    })?;
    Ok(handle)
}

pub(crate) fn build_provider_error(status: u16, body_text: &str) -> LlmError {
    let raw_json = serde_json::from_str::<Value>(body_text).ok();
    let error_obj = raw_json.as_ref().and_then(|json| json.get("error"));
    let message = error_obj
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
        .unwrap_or(body_text)
        .to_string();
    let grpc_status = error_obj
        .and_then(|error| error.get("status"))
        .and_then(Value::as_str)
        .map(ToString::to_string);

    let classification = map_http_status(status)
        .or_else(|| grpc_status.as_deref().and_then(map_grpc_status))
        .or_else(|| {
            classify_message(&message).map(|kind| {
                let retryable = default_retryable_for_kind(&kind);
                HttpErrorClassification::Provider(kind, retryable)
            })
        });

    match classification {
        Some(HttpErrorClassification::RequestTimeout(retryable)) => {
            LlmError::RequestTimeout(RequestTimeoutError {
                info: ErrorInfo::new(message),
                retryable,
            })
        }
        Some(HttpErrorClassification::Provider(kind, retryable)) => {
            LlmError::Provider(ProviderError {
                info: ErrorInfo::new(message),
                provider: PROVIDER.to_string(),
                kind,
                status_code: Some(status),
                error_code: grpc_status,
                retryable,
                raw: raw_json,
            })
        }
        None => {
            let mut error = ProviderError::new(PROVIDER, ProviderErrorKind::Other, message);
            error.status_code = Some(status);
            error.error_code = grpc_status;
            error.raw = raw_json;
            LlmError::Provider(error)
        }
    }
}

//! Clients for hosted language-model APIs.
//!
//! A request is described by a [`Capability`] (what kind of generation or
//! recognition) and a [`Provider`] (whose API). The pair resolves to a fixed
//! endpoint through [`endpoint_for`]; [`create_client`] turns it into a
//! [`ModelClient`] whose single operation is [`ModelClient::run`].
//!
//! | Capability | Request | Response |
//! |------------|---------|----------|
//! | `text-to-text` | `POST` JSON | JSON, or text when `"stream": true` |
//! | `text-to-image` | `POST` JSON | JSON |
//! | `text-to-speech` | `POST` JSON | binary audio |
//! | `text-to-music` | `POST` JSON | binary audio |
//! | `speech-to-text` | `POST` multipart (`audio/wav`) | JSON |
//! | `image-to-text` | `POST` multipart (`image/png`) | JSON |
//! | `model-list` | `GET` | JSON |
//!
//! Every failure is returned as a [`GatewayError`]. There is no retry,
//! backoff, or request timeout; response bodies are passed through as the
//! vendor sends them.
//!
//! ```rust,no_run
//! use wakeup::gateway::{create_client, Capability, ModelOptions, Provider};
//!
//! # async fn example() -> Result<(), wakeup::gateway::GatewayError> {
//! let client = create_client(Capability::TextToText, Provider::OpenAi, "sk-...")?;
//! let reply = client
//!     .run(ModelOptions::json(serde_json::json!({
//!         "model": "gpt-4o-mini",
//!         "messages": [{ "role": "user", "content": "Summarize page 3" }]
//!     })))
//!     .await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("unknown capability: '{0}'")]
    UnknownCapability(String),
    #[error("unknown provider: '{0}'")]
    UnknownProvider(String),
    #[error("unsupported type or provider: {capability} is not available from {provider}")]
    Unsupported {
        capability: Capability,
        provider: Provider,
    },
    #[error("{0} requires a file attachment")]
    MissingAttachment(Capability),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model API error {status}: {body}")]
    Status { status: u16, body: String },
}

// ============ Capability / Provider ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    TextToText,
    TextToSpeech,
    SpeechToText,
    ImageToText,
    TextToImage,
    TextToMusic,
    ModelList,
}

impl Capability {
    pub const ALL: [Capability; 7] = [
        Capability::TextToText,
        Capability::TextToSpeech,
        Capability::SpeechToText,
        Capability::ImageToText,
        Capability::TextToImage,
        Capability::TextToMusic,
        Capability::ModelList,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::TextToText => "text-to-text",
            Capability::TextToSpeech => "text-to-speech",
            Capability::SpeechToText => "speech-to-text",
            Capability::ImageToText => "image-to-text",
            Capability::TextToImage => "text-to-image",
            Capability::TextToMusic => "text-to-music",
            Capability::ModelList => "model-list",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| GatewayError::UnknownCapability(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Groq,
    Cerebras,
    Mistral,
    Infodev,
}

impl Provider {
    pub const ALL: [Provider; 5] = [
        Provider::OpenAi,
        Provider::Groq,
        Provider::Cerebras,
        Provider::Mistral,
        Provider::Infodev,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Groq => "groq",
            Provider::Cerebras => "cerebras",
            Provider::Mistral => "mistral",
            Provider::Infodev => "infodev",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider names are matched case-insensitively.
impl FromStr for Provider {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str() == lower)
            .ok_or_else(|| GatewayError::UnknownProvider(s.to_string()))
    }
}

/// Static endpoint table. `None` means the provider does not offer the
/// capability.
pub fn endpoint_for(capability: Capability, provider: Provider) -> Option<&'static str> {
    use Capability::*;
    use Provider::*;

    let url = match (capability, provider) {
        (TextToText, OpenAi) => "https://api.openai.com/v1/chat/completions",
        (TextToText, Groq) => "https://api.groq.com/openai/v1/chat/completions",
        (TextToText, Cerebras) => "https://api.cerebras.ai/v1/chat/completions",
        (TextToText, Mistral) => "https://api.mistral.ai/v1/chat/completions",
        (TextToText, Infodev) => "https://zara.infodev.ovh/v1/chat/completions",

        (TextToSpeech, OpenAi) => "https://api.openai.com/v1/audio/speech",
        (TextToSpeech, Groq) => "https://api.groq.io/v1/synthesize",
        (TextToSpeech, Cerebras) => "https://api.cerebras.io/v1/synthesize",
        (TextToSpeech, Mistral) => "https://api.mistral.io/v1/synthesize",
        (TextToSpeech, Infodev) => "https://zara.infodev.ovh/v1/audio/speech",

        (SpeechToText, OpenAi) => "https://api.openai.com/v1/audio/transcriptions",
        (SpeechToText, Groq) => "https://api.groq.io/v1/audio/transcriptions",
        (SpeechToText, Cerebras) => "https://api.cerebras.io/v1/audio/transcriptions",
        (SpeechToText, Mistral) => "https://api.mistral.io/v1/audio/transcriptions",
        (SpeechToText, Infodev) => "https://zara.infodev.ovh/v1/audio/transcriptions",

        (ImageToText, OpenAi) => "https://api.openai.com/v1/recognize",
        (ImageToText, Groq) => "https://api.groq.io/v1/recognize",
        (ImageToText, Cerebras) => "https://api.cerebras.io/v1/recognize",
        (ImageToText, Mistral) => "https://api.mistral.io/v1/recognize",
        (ImageToText, Infodev) => "https://zara.infodev.ovh/v1/recognize",

        (TextToImage, OpenAi) => "https://api.openai.com/v1/images/generations",
        (TextToImage, Groq) => "https://api.groq.io/v1/images/generations",
        (TextToImage, Cerebras) => "https://api.cerebras.io/v1/images/generations",
        (TextToImage, Mistral) => "https://api.mistral.io/v1/images/generations",
        (TextToImage, Infodev) => "https://zara.infodev.ovh/v1/images/generations",

        (ModelList, OpenAi) => "https://api.openai.com/v1/models",
        (ModelList, Groq) => "https://api.groq.com/openai/v1/models",
        (ModelList, Cerebras) => "https://api.cerebras.ai/v1/models",
        (ModelList, Mistral) => "https://api.mistral.ai/v1/models",
        (ModelList, Infodev) => "https://zara.infodev.ovh/v1/models",

        (TextToMusic, Infodev) => "https://zara.infodev.ovh/v1/music/generations",
        (TextToMusic, _) => return None,
    };
    Some(url)
}

// ============ Request / response ============

/// A file sent as the `file` part of a multipart request.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Capability-specific request payload.
///
/// `body` is sent as the JSON request body, or as text form fields next to
/// the attachment for the recognition capabilities. It is ignored by
/// `model-list`.
#[derive(Debug, Clone, Default)]
pub struct ModelOptions {
    pub body: Value,
    pub attachment: Option<Attachment>,
}

impl ModelOptions {
    pub fn json(body: Value) -> Self {
        Self {
            body,
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.attachment = Some(Attachment {
            file_name: file_name.into(),
            bytes,
        });
        self
    }

    fn is_stream(&self) -> bool {
        self.body.get("stream").and_then(Value::as_bool) == Some(true)
    }

    /// The JSON body to send; an absent body is sent as `{}`.
    fn json_body(&self) -> Value {
        if self.body.is_null() {
            Value::Object(Default::default())
        } else {
            self.body.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelResponse {
    Json(Value),
    Text(String),
    Binary(Vec<u8>),
}

impl ModelResponse {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ModelResponse::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ModelResponse::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ModelResponse::Binary(b) => Some(b),
            _ => None,
        }
    }
}

// ============ Client trait ============

/// A client bound to one capability and one endpoint.
#[async_trait]
pub trait ModelClient: Send + Sync {
    fn capability(&self) -> Capability;

    fn endpoint(&self) -> &str;

    /// Sends one request and returns the decoded response.
    async fn run(&self, options: ModelOptions) -> Result<ModelResponse, GatewayError>;
}

/// Builds the client for a capability offered by `provider`.
///
/// Fails with [`GatewayError::Unsupported`] before any network activity
/// when the pair is not in the endpoint table.
pub fn create_client(
    capability: Capability,
    provider: Provider,
    token: &str,
) -> Result<Box<dyn ModelClient>, GatewayError> {
    let url = endpoint_for(capability, provider).ok_or(GatewayError::Unsupported {
        capability,
        provider,
    })?;
    create_client_for_endpoint(capability, url, token)
}

/// [`create_client`] from string names, e.g. `("text-to-text", "OpenAI")`.
pub fn create_client_by_name(
    capability: &str,
    provider: &str,
    token: &str,
) -> Result<Box<dyn ModelClient>, GatewayError> {
    create_client(capability.parse()?, provider.parse()?, token)
}

/// Builds a client for an explicit endpoint URL, bypassing the table.
/// Useful for self-hosted deployments that speak a vendor's API.
pub fn create_client_for_endpoint(
    capability: Capability,
    url: &str,
    token: &str,
) -> Result<Box<dyn ModelClient>, GatewayError> {
    let endpoint = HttpEndpoint {
        url: url.to_string(),
        token: token.to_string(),
        http: reqwest::Client::builder().build()?,
    };

    let client: Box<dyn ModelClient> = match capability {
        Capability::TextToText => Box::new(ChatCompletion(endpoint)),
        Capability::TextToImage => Box::new(JsonGeneration {
            capability,
            endpoint,
        }),
        Capability::TextToSpeech | Capability::TextToMusic => Box::new(AudioSynthesis {
            capability,
            endpoint,
        }),
        Capability::SpeechToText => Box::new(FileRecognition {
            capability,
            mime: "audio/wav",
            endpoint,
        }),
        Capability::ImageToText => Box::new(FileRecognition {
            capability,
            mime: "image/png",
            endpoint,
        }),
        Capability::ModelList => Box::new(ModelListing(endpoint)),
    };
    Ok(client)
}

// ============ Implementations ============

struct HttpEndpoint {
    url: String,
    token: String,
    http: reqwest::Client,
}

impl HttpEndpoint {
    async fn post_json(&self, body: &Value) -> Result<reqwest::Response, GatewayError> {
        let resp = self
            .http
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        check_status(resp).await
    }
}

/// Turns a non-2xx response into [`GatewayError::Status`] with its body.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = match resp.text().await {
        Ok(text) => text,
        Err(e) => format!("<response body unreadable: {}>", e),
    };
    tracing::warn!(status = status.as_u16(), "model API request failed");
    Err(GatewayError::Status {
        status: status.as_u16(),
        body,
    })
}

struct ChatCompletion(HttpEndpoint);

#[async_trait]
impl ModelClient for ChatCompletion {
    fn capability(&self) -> Capability {
        Capability::TextToText
    }

    fn endpoint(&self) -> &str {
        &self.0.url
    }

    async fn run(&self, options: ModelOptions) -> Result<ModelResponse, GatewayError> {
        let mut resp = self.0.post_json(&options.json_body()).await?;

        if !options.is_stream() {
            return Ok(ModelResponse::Json(resp.json().await?));
        }

        // Streamed bodies are returned verbatim (SSE framing included).
        let mut raw = Vec::new();
        while let Some(chunk) = resp.chunk().await? {
            tracing::debug!(bytes = chunk.len(), "received stream chunk");
            raw.extend_from_slice(&chunk);
        }
        Ok(ModelResponse::Text(String::from_utf8_lossy(&raw).into_owned()))
    }
}

struct JsonGeneration {
    capability: Capability,
    endpoint: HttpEndpoint,
}

#[async_trait]
impl ModelClient for JsonGeneration {
    fn capability(&self) -> Capability {
        self.capability
    }

    fn endpoint(&self) -> &str {
        &self.endpoint.url
    }

    async fn run(&self, options: ModelOptions) -> Result<ModelResponse, GatewayError> {
        let resp = self.endpoint.post_json(&options.json_body()).await?;
        Ok(ModelResponse::Json(resp.json().await?))
    }
}

struct AudioSynthesis {
    capability: Capability,
    endpoint: HttpEndpoint,
}

#[async_trait]
impl ModelClient for AudioSynthesis {
    fn capability(&self) -> Capability {
        self.capability
    }

    fn endpoint(&self) -> &str {
        &self.endpoint.url
    }

    async fn run(&self, options: ModelOptions) -> Result<ModelResponse, GatewayError> {
        let resp = self.endpoint.post_json(&options.json_body()).await?;
        Ok(ModelResponse::Binary(resp.bytes().await?.to_vec()))
    }
}

struct FileRecognition {
    capability: Capability,
    mime: &'static str,
    endpoint: HttpEndpoint,
}

#[async_trait]
impl ModelClient for FileRecognition {
    fn capability(&self) -> Capability {
        self.capability
    }

    fn endpoint(&self) -> &str {
        &self.endpoint.url
    }

    async fn run(&self, options: ModelOptions) -> Result<ModelResponse, GatewayError> {
        let attachment = options
            .attachment
            .ok_or(GatewayError::MissingAttachment(self.capability))?;

        let mut form = Form::new();
        if let Value::Object(fields) = options.body {
            for (key, value) in fields {
                let text = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                form = form.text(key, text);
            }
        }
        let part = Part::bytes(attachment.bytes)
            .file_name(attachment.file_name)
            .mime_str(self.mime)?;
        form = form.part("file", part);

        let resp = self
            .endpoint
            .http
            .post(&self.endpoint.url)
            .bearer_auth(&self.endpoint.token)
            .multipart(form)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(ModelResponse::Json(resp.json().await?))
    }
}

struct ModelListing(HttpEndpoint);

#[async_trait]
impl ModelClient for ModelListing {
    fn capability(&self) -> Capability {
        Capability::ModelList
    }

    fn endpoint(&self) -> &str {
        &self.0.url
    }

    async fn run(&self, _options: ModelOptions) -> Result<ModelResponse, GatewayError> {
        let resp = self
            .0
            .http
            .get(&self.0.url)
            .bearer_auth(&self.0.token)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(ModelResponse::Json(resp.json().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_round_trips_through_names() {
        for c in Capability::ALL {
            assert_eq!(c.as_str().parse::<Capability>().unwrap(), c);
        }
        assert!(matches!(
            "text-to-video".parse::<Capability>(),
            Err(GatewayError::UnknownCapability(_))
        ));
    }

    #[test]
    fn test_provider_parse_is_case_insensitive() {
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert_eq!("GROQ".parse::<Provider>().unwrap(), Provider::Groq);
        assert!(matches!(
            "anthropic".parse::<Provider>(),
            Err(GatewayError::UnknownProvider(_))
        ));
    }

    #[test]
    fn test_every_provider_has_all_but_music() {
        for p in Provider::ALL {
            for c in Capability::ALL {
                let expected = c != Capability::TextToMusic || p == Provider::Infodev;
                assert_eq!(endpoint_for(c, p).is_some(), expected, "{} / {}", c, p);
            }
        }
    }

    #[test]
    fn test_unsupported_pair_fails_at_construction() {
        let err = create_client(Capability::TextToMusic, Provider::OpenAi, "t")
            .err()
            .unwrap();
        assert!(matches!(
            err,
            GatewayError::Unsupported {
                capability: Capability::TextToMusic,
                provider: Provider::OpenAi
            }
        ));
    }

    #[test]
    fn test_create_client_by_name() {
        let client = create_client_by_name("model-list", "Mistral", "t").unwrap();
        assert_eq!(client.capability(), Capability::ModelList);
        assert_eq!(client.endpoint(), "https://api.mistral.ai/v1/models");

        assert!(matches!(
            create_client_by_name("summarize", "openai", "t").err().unwrap(),
            GatewayError::UnknownCapability(_)
        ));
        assert!(matches!(
            create_client_by_name("text-to-text", "acme", "t").err().unwrap(),
            GatewayError::UnknownProvider(_)
        ));
    }

    #[test]
    fn test_clients_keep_their_capability() {
        for c in Capability::ALL {
            let client = create_client(c, Provider::Infodev, "t").unwrap();
            assert_eq!(client.capability(), c);
            assert!(client.endpoint().starts_with("https://zara.infodev.ovh/v1/"));
        }
    }

    #[tokio::test]
    async fn test_recognition_without_attachment_fails_before_request() {
        let client = create_client_for_endpoint(
            Capability::SpeechToText,
            "http://127.0.0.1:9/never-called",
            "t",
        )
        .unwrap();
        let err = client.run(ModelOptions::default()).await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::MissingAttachment(Capability::SpeechToText)
        ));
    }
}

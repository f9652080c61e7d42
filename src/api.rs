use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

// No request timeout: a pending call runs until the backend answers or the connection fails.
static CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

pub const TRANSLATE_FALLBACK: &str = "Translation failed";
pub const EXAMPLES_FALLBACK: &str = "Failed to load examples";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub text: String,
    pub num_beams: u32,
    pub preserve_numbers: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResponse {
    #[serde(default)]
    pub success: bool,
    pub translation: String,
    pub confidence: f64,
    pub metadata: TranslationMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationMetadata {
    pub input_length: u64,
    pub output_length: u64,
    pub device: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_beams: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleEntry {
    pub english: String,
    pub hindi: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamplesResponse {
    pub examples: Vec<ExampleEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub device: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The backend answered with a non-success status. `detail` is what the user sees.
    #[error("{detail}")]
    Rejected { status: u16, detail: String },

    #[error("{0}")]
    Http(#[from] reqwest::Error),
}

#[async_trait]
pub trait Backend: Send + Sync {
    async fn translate(&self, request: &TranslationRequest) -> Result<TranslationResponse, ApiError>;

    async fn examples(&self) -> Result<Vec<ExampleEntry>, ApiError>;

    async fn health(&self) -> Result<HealthStatus, ApiError>;
}

/// Talks to the translation backend over HTTP.
pub struct HttpBackend {
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Best-effort extraction of a string `detail` from an error body.
async fn rejection(resp: reqwest::Response, fallback: &str) -> ApiError {
    let status = resp.status().as_u16();
    let detail = resp
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.detail)
        .and_then(|detail| match detail {
            serde_json::Value::String(s) if !s.is_empty() => Some(s),
            _ => None,
        })
        .unwrap_or_else(|| fallback.to_string());
    ApiError::Rejected { status, detail }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn translate(&self, request: &TranslationRequest) -> Result<TranslationResponse, ApiError> {
        let resp = CLIENT.post(self.url("/translate")).json(request).send().await?;
        if !resp.status().is_success() {
            return Err(rejection(resp, TRANSLATE_FALLBACK).await);
        }
        Ok(resp.json::<TranslationResponse>().await?)
    }

    async fn examples(&self) -> Result<Vec<ExampleEntry>, ApiError> {
        let resp = CLIENT.get(self.url("/examples")).send().await?;
        if !resp.status().is_success() {
            return Err(rejection(resp, EXAMPLES_FALLBACK).await);
        }
        Ok(resp.json::<ExamplesResponse>().await?.examples)
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        let resp = CLIENT.get(self.url("/health")).send().await?;
        Ok(resp.error_for_status()?.json::<HealthStatus>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn request(text: &str) -> TranslationRequest {
        TranslationRequest { text: text.to_string(), num_beams: 5, preserve_numbers: false }
    }

    #[tokio::test]
    async fn translate_sends_body_and_parses_response() {
        let router = Router::new().route(
            "/translate",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body, json!({ "text": "Parking is not allowed.", "num_beams": 5, "preserve_numbers": false }));
                Json(json!({
                    "success": true,
                    "translation": "पार्किंग की अनुमति नहीं है।",
                    "confidence": 0.92,
                    "metadata": { "input_length": 4, "output_length": 5, "num_beams": 5, "device": "cuda" }
                }))
            }),
        );
        let backend = HttpBackend::new(format!("{}/", serve(router).await));

        let resp = backend.translate(&request("Parking is not allowed.")).await.unwrap();
        assert!(resp.success);
        assert_eq!(resp.translation, "पार्किंग की अनुमति नहीं है।");
        assert_eq!(resp.confidence, 0.92);
        assert_eq!(resp.metadata.input_length, 4);
        assert_eq!(resp.metadata.output_length, 5);
        assert_eq!(resp.metadata.device, "cuda");
        assert_eq!(resp.metadata.num_beams, Some(5));
    }

    #[tokio::test]
    async fn translate_surfaces_detail_verbatim() {
        let router = Router::new().route(
            "/translate",
            post(|| async {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "detail": "Translation error: CUDA out of memory" })))
            }),
        );
        let backend = HttpBackend::new(serve(router).await);

        let err = backend.translate(&request("hello")).await.unwrap_err();
        assert!(matches!(err, ApiError::Rejected { status: 500, .. }));
        assert_eq!(err.to_string(), "Translation error: CUDA out of memory");
    }

    #[tokio::test]
    async fn non_string_detail_uses_fallback() {
        let router = Router::new().route(
            "/translate",
            post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "detail": [{ "loc": ["body", "text"], "msg": "too long" }] })),
                )
            }),
        );
        let backend = HttpBackend::new(serve(router).await);

        let err = backend.translate(&request("hello")).await.unwrap_err();
        assert_eq!(err.to_string(), TRANSLATE_FALLBACK);
    }

    #[tokio::test]
    async fn non_json_error_body_uses_fallback() {
        let router = Router::new().route("/translate", post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }));
        let backend = HttpBackend::new(serve(router).await);

        let err = backend.translate(&request("hello")).await.unwrap_err();
        assert!(matches!(err, ApiError::Rejected { status: 502, .. }));
        assert_eq!(err.to_string(), TRANSLATE_FALLBACK);
    }

    #[tokio::test]
    async fn unreachable_backend_is_an_http_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let backend = HttpBackend::new(format!("http://{}", addr));

        let err = backend.translate(&request("hello")).await.unwrap_err();
        assert!(matches!(err, ApiError::Http(_)));
        assert!(!err.to_string().is_empty());
    }

    #[tokio::test]
    async fn examples_keep_backend_order() {
        let router = Router::new().route(
            "/examples",
            get(|| async {
                Json(json!({ "examples": [
                    { "english": "Parking is not allowed.", "hindi": "पार्किंग की अनुमति नहीं है।" },
                    { "english": "Unauthorized entry is prohibited.", "hindi": "अनधिकृत प्रवेश प्रतिबंधित है।" }
                ]}))
            }),
        );
        let backend = HttpBackend::new(serve(router).await);

        let examples = backend.examples().await.unwrap();
        let english: Vec<_> = examples.iter().map(|e| e.english.as_str()).collect();
        assert_eq!(english, ["Parking is not allowed.", "Unauthorized entry is prohibited."]);
        assert_eq!(examples[1].hindi, "अनधिकृत प्रवेश प्रतिबंधित है।");
    }

    #[tokio::test]
    async fn examples_failure_uses_examples_fallback() {
        let router = Router::new().route("/examples", get(|| async { StatusCode::NOT_FOUND }));
        let backend = HttpBackend::new(serve(router).await);

        let err = backend.examples().await.unwrap_err();
        assert_eq!(err.to_string(), EXAMPLES_FALLBACK);
    }

    #[tokio::test]
    async fn health_reports_model_and_device() {
        let router = Router::new().route(
            "/health",
            get(|| async {
                Json(json!({ "status": "healthy", "model": "Helsinki-NLP/opus-mt-en-hi (fine-tuned)", "device": "cpu" }))
            }),
        );
        let backend = HttpBackend::new(serve(router).await);

        let health = backend.health().await.unwrap();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.device, "cpu");
    }
}

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use super::error::GeminiError;
use super::{GenerateContentRequest, GenerateContentResponse};

pub const API_URL: &str = "https://generativelanguage.googleapis.com";

/// Anything that can answer a `generateContent` request.
pub trait ContentGenerator {
    async fn generate_content(
        &self,
        model: &str,
        req: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError>;
}

/// HTTP client for the Gemini API. Constructed explicitly and handed to
/// whoever needs it; it holds no global state.
pub struct GeminiClient {
    api_key: String,
    client: Client,
    base_url: String,
}

impl GeminiClient {
    /// Create a client for the API at `base_url` (the production URL is [`API_URL`]).
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, GeminiError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            api_key,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent", self.base_url)
    }
}

impl ContentGenerator for GeminiClient {
    async fn generate_content(
        &self,
        model: &str,
        req: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        debug!(model, "generateContent request");
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(req)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000)
                .unwrap_or(1000);
            return Err(GeminiError::RateLimited {
                retry_after_ms: retry_after,
            });
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(GeminiError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.json::<GenerateContentResponse>().await?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn posts_to_model_endpoint_with_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "g-key"))
            .and(body_partial_json(json!({
                "contents": [{"role": "user", "parts": [{"text": "hi"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "hello"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::with_base_url("g-key".into(), server.uri()).unwrap();
        let resp = client
            .generate_content("gemini-2.5-flash", &GenerateContentRequest::user_text("hi"))
            .await
            .unwrap();
        assert_eq!(resp.text().as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn rate_limit_reads_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "3"))
            .mount(&server)
            .await;

        let client = GeminiClient::with_base_url("k".into(), server.uri()).unwrap();
        let err = client
            .generate_content("m", &GenerateContentRequest::user_text("x"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GeminiError::RateLimited {
                retry_after_ms: 3000
            }
        ));
    }

    #[tokio::test]
    async fn api_error_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .mount(&server)
            .await;

        let client = GeminiClient::with_base_url("k".into(), server.uri()).unwrap();
        let err = client
            .generate_content("m", &GenerateContentRequest::user_text("x"))
            .await
            .unwrap_err();
        match err {
            GeminiError::ApiError { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad request");
            }
            other => panic!("expected ApiError, got {other:?}"),
        }
    }
}

use crate::llm::decoder::StreamDecoder;
use crate::llm::ApiError;
use crate::types::{EventSink, SummaryEvent};
use anyhow::Result;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// Client for the Gemini `streamGenerateContent` endpoint.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self::with_model(
            api_key,
            DEFAULT_MODEL.to_string(),
            DEFAULT_BASE_URL.to_string(),
        )
    }

    pub fn with_model(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            base_url,
        }
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent",
            self.base_url, self.model
        )
    }

    /// Sends one prompt and drives the response body to completion, emitting
    /// a `Fragment` event per decoded piece of text and exactly one
    /// `Complete` event at end of stream.
    ///
    /// Transport and HTTP failures are returned as errors without any event
    /// having been emitted; there is no retry. A sink error aborts the read
    /// loop, which closes the connection.
    pub async fn stream_generate(&self, prompt: &str, sink: &EventSink) -> Result<()> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        trace!(
            "Sending generation request to {}:\n{}",
            self.model,
            serde_json::to_string_pretty(&request)?
        );

        let response = self
            .client
            .post(self.stream_url())
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        let mut response = check_response_error(response).await?;

        let mut decoder = StreamDecoder::new();
        let mut fragment_count = 0usize;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ApiError::NetworkError(e.to_string()))?
        {
            for text in decoder.push_bytes(&chunk) {
                fragment_count += 1;
                sink(&SummaryEvent::Fragment(text))?;
            }
        }

        debug!("stream finished after {fragment_count} fragments");
        sink(&SummaryEvent::Complete)?;
        Ok(())
    }
}

/// Maps a non-success response to the error taxonomy, extracting the message
/// from a `{"error":{"message":...}}` body when one is present and falling
/// back to the HTTP status text.
async fn check_response_error(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let response_text = response
        .text()
        .await
        .map_err(|e| ApiError::NetworkError(e.to_string()))?;

    let message = serde_json::from_str::<ErrorBody>(&response_text)
        .ok()
        .and_then(|body| body.error)
        .and_then(|detail| detail.message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map_or_else(|| status.to_string(), str::to_string)
        });

    let error = match status {
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimit(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Authentication(message),
        StatusCode::BAD_REQUEST => ApiError::InvalidRequest(message),
        status if status.is_server_error() => ApiError::ServiceError(message),
        _ => ApiError::Unknown(message),
    };
    Err(error.into())
}

//! Gemini integration: the streaming client and the incremental decoder that
//! turns its chunked response body into ordered text fragments.

pub mod decoder;
pub mod gemini;

#[cfg(test)]
mod tests;

pub use gemini::GeminiClient;

/// Error taxonomy for the generation endpoint. Only these reach the consumer
/// as terminal error events; per-object decode issues are absorbed by the
/// decoder.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error: {0}")]
    Unknown(String),
}

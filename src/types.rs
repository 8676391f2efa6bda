use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which kind of generation the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryAction {
    /// Summarize the readable content of the page
    Summarize,
    /// Re-summarize an existing summary into something even shorter
    Shrink,
    /// Turn a summary into a short social media post promoting the page
    Social,
}

/// Output style for generated summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    FreeFlow,
    BulletPoints,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Wording used inside the prompt templates
        match self {
            OutputFormat::FreeFlow => write!(f, "free flow text"),
            OutputFormat::BulletPoints => write!(f, "bullet points"),
        }
    }
}

/// One user-initiated request, as handed to the session by the front end.
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    pub action: SummaryAction,
    /// Page the content comes from. Required for summarize and social.
    pub url: Option<String>,
    /// Prior summary to shrink or to base a social post on.
    pub text: Option<String>,
    /// Explicitly selected text, taking precedence over page extraction.
    pub selection: Option<String>,
    /// Target language; falls back to the stored preference, then English.
    pub language: Option<String>,
    pub format: Option<OutputFormat>,
}

/// Events delivered to the consumer, strictly in order: any number of
/// fragments, then exactly one terminal event (`Complete` or `Error`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryEvent {
    /// One piece of generated text, emitted as soon as it is decoded
    Fragment(String),
    /// End of stream, emitted exactly once per successful request
    Complete,
    /// Terminal failure with a human-readable message
    Error(String),
}

/// Consumer of summary events. Returning an error aborts the request; this is
/// the cancellation hook (the read loop exits and the connection is dropped).
pub type EventSink = Box<dyn Fn(&SummaryEvent) -> Result<()> + Send + Sync>;

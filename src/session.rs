//! One user-initiated request from start to terminal event: resolve
//! preferences, gather page content, build the prompt, and stream the
//! generated text to the event sink.

use crate::config::Settings;
use crate::llm::GeminiClient;
use crate::prompts;
use crate::types::{EventSink, SummaryAction, SummaryEvent, SummaryRequest};
use crate::web::{extract_content, PageClient, PageSource};
use anyhow::{anyhow, bail, Result};
use tracing::{debug, warn};

/// Lifecycle of a request. The terminal states are each reached at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestState {
    Idle,
    Requesting,
    Streaming,
    Complete,
    Failed,
}

pub struct Session {
    settings: Settings,
    pages: Box<dyn PageSource>,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self::with_page_source(settings, Box::new(PageClient::new()))
    }

    pub fn with_page_source(settings: Settings, pages: Box<dyn PageSource>) -> Self {
        Self { settings, pages }
    }

    /// Drives one request to its terminal event. Failures are delivered to
    /// the sink as a single `Error` event; the returned `Result` only
    /// reports sink failures (the caller cancelling).
    pub async fn run(&self, request: SummaryRequest, sink: &EventSink) -> Result<()> {
        match self.run_inner(&request, sink).await {
            Ok(()) => Ok(()),
            Err(error) => {
                warn!("summarization error: {error:#}");
                sink(&SummaryEvent::Error(error.to_string()))
            }
        }
    }

    async fn run_inner(&self, request: &SummaryRequest, sink: &EventSink) -> Result<()> {
        let mut state = RequestState::Idle;
        debug!(?state, ?request.action, "handling request");

        let api_key = self
            .settings
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                anyhow!("API key not found. Please set it with `page-gist config set-api-key`.")
            })?;

        // Input-text preconditions fail before anything is fetched.
        let prior_summary = match request.action {
            SummaryAction::Summarize => None,
            SummaryAction::Shrink => Some(
                request
                    .text
                    .as_deref()
                    .filter(|text| !text.trim().is_empty())
                    .ok_or_else(|| anyhow!("No text provided to shrink."))?,
            ),
            SummaryAction::Social => Some(
                request
                    .text
                    .as_deref()
                    .filter(|text| !text.trim().is_empty())
                    .ok_or_else(|| anyhow!("No text provided to generate a social media post."))?,
            ),
        };

        let language = request
            .language
            .clone()
            .or_else(|| self.settings.preferred_language.clone())
            .unwrap_or_else(|| prompts::DEFAULT_LANGUAGE.to_string());
        let format = request
            .format
            .or(self.settings.preferred_format)
            .unwrap_or_default();

        // Fetch page content for all actions to provide context.
        let page_text = match &request.url {
            Some(url) => {
                let html = self.pages.fetch(url).await?;
                extract_content(&html, request.selection.as_deref())
            }
            None => String::new(),
        };

        let prompt = match request.action {
            SummaryAction::Summarize => {
                if page_text.trim().is_empty() {
                    bail!("Could not find any text on this page to summarize.");
                }
                prompts::summarize_prompt(&page_text, &language, format)
            }
            SummaryAction::Shrink => prompts::shrink_prompt(
                prior_summary.unwrap_or_default(),
                &page_text,
                &language,
                format,
            ),
            SummaryAction::Social => {
                let url = request
                    .url
                    .as_deref()
                    .ok_or_else(|| anyhow!("Could not get the page URL."))?;
                prompts::social_prompt(prior_summary.unwrap_or_default(), &page_text, &language, url)
            }
        };

        state = RequestState::Requesting;
        debug!(?state, prompt_len = prompt.len(), "sending generation request");

        let client = GeminiClient::new(api_key.to_string());
        state = RequestState::Streaming;
        debug!(?state, "consuming response stream");

        match client.stream_generate(&prompt, sink).await {
            Ok(()) => {
                state = RequestState::Complete;
                debug!(?state, "request finished");
                Ok(())
            }
            Err(error) => {
                state = RequestState::Failed;
                debug!(?state, "request failed");
                Err(error)
            }
        }
    }
}

//! Prompt templates for the three supported actions. Each prompt is built
//! once per request and never mutated afterwards.

use crate::types::OutputFormat;

pub const DEFAULT_LANGUAGE: &str = "English";

/// Prompt for summarizing freshly extracted page content.
pub fn summarize_prompt(page_text: &str, language: &str, format: OutputFormat) -> String {
    let style = match format {
        OutputFormat::BulletPoints => {
            "Stay concise, use bullet points, don't bother to use full sentences."
        }
        OutputFormat::FreeFlow => "Use full sentences and a narrative style.",
    };

    format!(
        r#"Summarize the text below in {language}.
Focus on the key points and main ideas.
Keep it concise and easy to read.
{style}
No need for filler text, or introductory sentence like "Here is a summary..." or "Voici un résumé..."

"{page_text}""#
    )
}

/// Prompt for shrinking an existing summary even further. The full page text
/// is appended for reference so the model can keep what matters.
pub fn shrink_prompt(
    summary: &str,
    page_text: &str,
    language: &str,
    format: OutputFormat,
) -> String {
    let style = match format {
        OutputFormat::BulletPoints => "using bullet points",
        OutputFormat::FreeFlow => "using full sentences and a narrative style",
    };

    format!(
        r#"Summarize the following text in {language} in an even more concise way.
Make it as short as possible, {style}.
No need for filler text, or introductory sentence like "Here is a summary..." or "Voici un résumé..."

"{summary}"

For reference, here's the full original content of the article before summarization:
{page_text}"#
    )
}

/// Prompt for turning a summary into a short social media post linking back
/// to the article.
pub fn social_prompt(summary: &str, page_text: &str, language: &str, url: &str) -> String {
    format!(
        r#"You are a social media manager. Based on the following text, write a short social media post to promote the article from this page.
The post should be engaging and encourage people to click the link.
The post should be short, as it should fit in a tweet.
Use emojis if it makes sense.
Mention why this article is important, why it's relevant today, if it's something new and interesting to share and why.
Use short hashtags when possible. Hashtags should be used inline with the text if possible, not just at the end of the post.
The tone of the post should be factual and professional, avoiding overly excited language (e.g., "awesome", "crazy", "incredible").
Avoid using first-person pronouns like "I", "we", "our", or "us", as the person sharing the link is not the author of the article.
The language of the post should be {language}.
At the end of the post, add the link to the article: {url}

Here's the article summary:
"{summary}"

For reference, here's the full original content of the article before summarization:
{page_text}"#
    )
}

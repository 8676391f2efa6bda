//! Incremental decoder for the `streamGenerateContent` response body.
//!
//! The endpoint delivers a JSON array of response objects, but the bytes
//! arrive in chunks whose boundaries are arbitrary - a chunk can end in the
//! middle of an object, a field name, or even a multi-byte UTF-8 sequence.
//! Instead of waiting for the full body, the decoder slices complete `{...}`
//! objects out of an accumulation buffer as soon as they are closed and
//! extracts the generated text from each one.

use serde::Deserialize;
use tracing::warn;

/// Shape of one stream object. Every field is optional so that metadata-only
/// objects (usage counts, model version) still deserialize cleanly.
#[derive(Debug, Deserialize)]
struct StreamObject {
    #[serde(default)]
    candidates: Vec<StreamCandidate>,
}

#[derive(Debug, Deserialize)]
struct StreamCandidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    text: Option<String>,
}

impl StreamObject {
    /// The generated text at `candidates[0].content.parts[0].text`, if any.
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

#[derive(Debug, Clone, Copy)]
enum ScanState {
    Normal,
    InString,
    Escaped,
}

/// Finds the closing brace matching the `{` at byte index `start`.
///
/// Tracks nesting depth while skipping the contents of string literals, so a
/// brace inside a generated summary (`"text": "use {braces}"`) does not
/// perturb the count. Returns `None` when the buffer ends before the object
/// closes; the caller should retry once more bytes have arrived.
pub fn find_matching_brace(buffer: &str, start: usize) -> Option<usize> {
    let bytes = buffer.as_bytes();
    debug_assert_eq!(bytes.get(start), Some(&b'{'));

    let mut depth = 1usize;
    let mut state = ScanState::Normal;
    for (offset, byte) in bytes.iter().enumerate().skip(start + 1) {
        match state {
            ScanState::Normal => match byte {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(offset);
                    }
                }
                b'"' => state = ScanState::InString,
                _ => {}
            },
            ScanState::InString => match byte {
                b'\\' => state = ScanState::Escaped,
                b'"' => state = ScanState::Normal,
                _ => {}
            },
            ScanState::Escaped => state = ScanState::InString,
        }
    }
    None
}

/// Accumulation state for one streaming request.
///
/// Owns both buffers explicitly so the decoding logic can be driven without a
/// live connection. One decoder lives exactly as long as one request.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    /// Bytes that did not yet form a complete UTF-8 sequence
    pending: Vec<u8>,
    /// Decoded text that has not yet yielded a complete JSON object
    buffer: String,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one network chunk and returns the text fragments completed by
    /// it, in stream order. An empty result means the buffer is waiting for
    /// more bytes.
    pub fn push_bytes(&mut self, chunk: &[u8]) -> Vec<String> {
        self.decode_utf8(chunk);
        self.drain_objects()
    }

    /// Appends the maximal decodable prefix to the text buffer, holding back
    /// an incomplete trailing sequence until the next chunk.
    fn decode_utf8(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    self.pending.clear();
                    return;
                }
                Err(error) => {
                    let valid = error.valid_up_to();
                    match error.error_len() {
                        // Truncated sequence at the tail: keep it pending.
                        None => {
                            let tail = self.pending.split_off(valid);
                            self.buffer
                                .push_str(&String::from_utf8_lossy(&self.pending));
                            self.pending = tail;
                            return;
                        }
                        // Genuinely invalid bytes: substitute and move on.
                        Some(len) => {
                            let tail = self.pending.split_off(valid + len);
                            self.buffer
                                .push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                            self.buffer.push('\u{FFFD}');
                            self.pending = tail;
                        }
                    }
                }
            }
        }
    }

    /// Slices complete objects out of the buffer until only an incomplete
    /// tail (or inter-object noise) remains.
    fn drain_objects(&mut self) -> Vec<String> {
        let mut fragments = Vec::new();
        while let Some(open) = self.buffer.find('{') {
            let Some(close) = find_matching_brace(&self.buffer, open) else {
                // Incomplete object, wait for more data
                break;
            };

            // Consume everything up to the closing brace; array framing and
            // separators before the object are dropped along with it.
            let rest = self.buffer.split_off(close + 1);
            let object = self.buffer.split_off(open);
            self.buffer = rest;

            match serde_json::from_str::<StreamObject>(&object) {
                Ok(decoded) => {
                    // Objects without the text path carry no fragment; that
                    // is expected for metadata-only increments.
                    if let Some(text) = decoded.into_text() {
                        if !text.is_empty() {
                            fragments.push(text);
                        }
                    }
                }
                Err(error) => {
                    // A malformed object must not abort the stream.
                    warn!("failed to parse stream object: {error}; input: {object}");
                }
            }
        }
        fragments
    }
}

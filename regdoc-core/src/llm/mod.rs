//! Language model gateway trait.
//!
//! A [`LanguageModel`] exposes exactly the two operations the retrieval pipeline
//! needs: a short synchronous completion (used for query expansion) and a
//! streamed chat completion (used for answer generation). Providers implement
//! this trait once; the pipeline never depends on a concrete vendor SDK.

/// Event types for streaming responses.
pub mod event;
/// Message types and conversation handling.
pub mod message;

use alloc::{string::String, vec::Vec};
use core::future::Future;
pub use event::Event;
use futures_core::Stream;
pub use message::{Message, Role};

/// Sampling and length controls for a single model call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters {
    /// Sampling temperature.
    pub temperature: f32,
    /// Hard cap on generated tokens.
    pub max_tokens: u32,
}

impl Parameters {
    /// Creates new parameters.
    #[must_use]
    pub const fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
        }
    }
}

/// Gateway to an external chat/completion model (component C5).
///
/// Implementations are process-wide singletons: safe to call concurrently
/// from many in-flight requests.
pub trait LanguageModel: Send + Sync {
    /// The error type returned by this gateway.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Answers a short, non-streamed prompt. Used for HyDE query expansion.
    ///
    /// Fails with the gateway's own error before any content is produced;
    /// there is no partial result to salvage.
    fn complete_short(
        &self,
        prompt: &str,
        parameters: Parameters,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;

    /// Streams a chat completion over the given conversation.
    ///
    /// The returned stream is finite and non-restartable. Dropping it before
    /// exhaustion must close the upstream connection at the next suspension
    /// point (cancellation).
    fn stream(
        &self,
        messages: &[Message],
        parameters: Parameters,
    ) -> impl Stream<Item = Result<Event, Self::Error>> + Send;
}

/// Collects every [`Event::Text`] chunk from a stream into a single string.
///
/// # Errors
/// Returns the first stream error encountered while collecting.
pub async fn collect_text<S, E>(stream: S) -> Result<String, E>
where
    S: Stream<Item = Result<Event, E>>,
{
    use futures_lite::{StreamExt, pin};
    pin!(stream);
    let mut result = String::new();
    while let Some(event) = stream.next().await {
        if let Event::Text(text) = event? {
            result.push_str(&text);
        }
    }
    Ok(result)
}

/// Builds a single system + user turn. Convenience for one-shot calls
/// (HyDE expansion, summarization-style prompts).
#[must_use]
pub fn oneshot(system: impl Into<String>, user: impl Into<String>) -> Vec<Message> {
    alloc::vec![Message::system(system.into()), Message::user(user.into())]
}

//! LLM response events.
//!
//! The [`Event`] enum represents what a language model emits while producing a
//! response: visible text, and for reasoning models, internal reasoning.

use alloc::string::String;

/// Events emitted by a language model during response generation.
#[derive(Debug, Clone)]
pub enum Event {
    /// Visible text chunk from the model.
    ///
    /// Chunks should be concatenated in arrival order to form the complete response.
    Text(String),

    /// Internal reasoning from a reasoning model. Not part of the conversation;
    /// observability only.
    Reasoning(String),
}

impl Event {
    /// Creates a text event.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Creates a reasoning event.
    #[must_use]
    pub fn reasoning(thought: impl Into<String>) -> Self {
        Self::Reasoning(thought.into())
    }

    /// Returns the text content if this is a Text event.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Reasoning(_) => None,
        }
    }

    /// Returns true if this is a text event.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_roundtrip() {
        let text = Event::text("hello");
        assert!(text.is_text());
        assert_eq!(text.as_text(), Some("hello"));

        let reasoning = Event::reasoning("thinking...");
        assert_eq!(reasoning.as_text(), None);
    }
}

//! Answer composer (component C10, §4.10): prompt assembly, streamed
//! generation, and post-stream citation validation and metrics.

use std::collections::HashMap;
use std::time::Instant;

use async_stream::stream;
use axum::response::sse::Event as SseEvent;
use futures_lite::StreamExt as _;
use regdoc_chunkstore::ScoredChunk;
use regdoc_core::llm::{LanguageModel, Message, Parameters};
use serde::Serialize;
use tracing::warn;

use crate::citation::{self, Validation};
use crate::dto::{ChatRole, ChatTurn, CitationDto, MetricsDto};
use crate::state::AppState;

const HISTORY_TURNS: usize = 4;

const SYSTEM_PROMPT: &str = "You are a compliance research assistant. Answer strictly grounded in the \
supplied sources; never state a fact the sources do not support. Mark every verbatim-or-near-verbatim \
span you draw from a source using the sentinel ⟨cite id=\"C<i>\"⟩span text⟨/cite⟩, where C<i> matches the \
source's label exactly. For a simple, single-fact question, answer in 300-500 words with 2-4 citations. \
For a complex question spanning multiple mechanisms or sources, answer in 800-1200 words with 6-10 \
citations. Never invent a source label that was not given to you.";

#[derive(Debug)]
struct Passage {
    content: String,
    source: String,
    url: String,
}

fn build_passages(results: &[ScoredChunk]) -> HashMap<String, Passage> {
    results
        .iter()
        .enumerate()
        .map(|(index, scored)| {
            let id = format!("C{}", index + 1);
            let section = scored.chunk.metadata.section.as_deref().map(|s| format!(", section {s}")).unwrap_or_default();
            let source = format!("{}, p.{}{section}", scored.chunk.metadata.document_name, scored.chunk.metadata.page);
            let url = format!("/documents/{}", scored.chunk.document_id);
            (id, Passage { content: scored.chunk.content.clone(), source, url })
        })
        .collect()
}

fn context_block(id: &str, passage: &Passage) -> String {
    format!("Source {id}: [{}]\n{}\n\n", passage.source, passage.content)
}

fn build_messages(question: &str, history: &[ChatTurn], passages: &HashMap<String, Passage>) -> Vec<Message> {
    let mut ordered_ids: Vec<&str> = passages.keys().map(String::as_str).collect();
    ordered_ids.sort_by_key(|id| id[1..].parse::<u32>().unwrap_or(u32::MAX));

    let mut system_content = String::from(SYSTEM_PROMPT);
    system_content.push_str("\n\n");
    for id in ordered_ids {
        system_content.push_str(&context_block(id, &passages[id]));
    }

    let mut messages = vec![Message::system(system_content)];
    for turn in history.iter().rev().take(HISTORY_TURNS).rev() {
        messages.push(match turn.role {
            ChatRole::User => Message::user(turn.content.clone()),
            ChatRole::Assistant => Message::assistant(turn.content.clone()),
        });
    }
    messages.push(Message::user(question.to_string()));
    messages
}

/// Escapes literal newlines in a `text` event payload per the sentinel
/// pair documented in §9 (`<<<BLANK_LINE>>>` for a blank line, otherwise
/// `<<<LINE_BREAK>>>`).
fn escape_newlines(text: &str) -> String {
    text.replace("\n\n", "<<<BLANK_LINE>>>").replace('\n', "<<<LINE_BREAK>>>")
}

/// Holds back text that might be a not-yet-complete `⟨cite⟩` sentinel so a
/// single sentinel is never split across two `text` events.
#[derive(Debug, Default)]
struct SentinelBuffer {
    held: String,
}

impl SentinelBuffer {
    fn push(&mut self, chunk: &str) -> Option<String> {
        self.held.push_str(chunk);
        let safe_len = Self::safe_prefix_len(&self.held);
        if safe_len == 0 {
            return None;
        }
        let flushed = self.held[..safe_len].to_string();
        self.held.drain(..safe_len);
        Some(flushed)
    }

    fn flush_remaining(&mut self) -> String {
        std::mem::take(&mut self.held)
    }

    fn safe_prefix_len(s: &str) -> usize {
        match s.rfind('⟨') {
            None => s.len(),
            Some(open_idx) => {
                if s[open_idx..].contains('⟩') {
                    s.len()
                } else {
                    open_idx
                }
            }
        }
    }
}

fn sse_text(escaped: &str) -> SseEvent {
    SseEvent::default().event("text").data(escaped)
}

fn sse_json(kind: &str, value: impl Serialize) -> SseEvent {
    let payload = serde_json::json!({ "kind": kind, "data": value });
    SseEvent::default().event(kind).data(payload.to_string())
}

fn sse_done() -> SseEvent {
    SseEvent::default().data("[DONE]")
}

#[derive(Debug, Serialize)]
struct InvalidCitationDto {
    id: String,
    span: String,
}

/// Runs C5's streamed completion over the assembled prompt and emits the
/// four SSE event kinds in order (`text* citations metrics done`, §5
/// ordering guarantee).
///
/// `planning_degraded` / `retrieval_degraded` seed the final `degraded`
/// metric; a mid-stream LLM error or an invalid citation can still flip it.
#[allow(clippy::too_many_arguments)]
pub fn compose(
    state: AppState,
    question: String,
    history: Vec<ChatTurn>,
    retrieval: Vec<ScoredChunk>,
    planning_degraded: bool,
    retrieval_degraded: bool,
    average_normalized_score: f32,
) -> impl futures_core::Stream<Item = Result<SseEvent, std::convert::Infallible>> + Send {
    stream! {
        let started_at = Instant::now();
        let passages = build_passages(&retrieval);
        let messages = build_messages(&question, &history, &passages);

        let prompt_tokens: u32 = messages.iter().map(|m| regdoc_chunkstore::tokenizer::count(m.content())).sum();

        let generation = state.config().generation;
        let parameters = Parameters::new(generation.temperature_answer, generation.max_tokens);

        let mut degraded = planning_degraded || retrieval_degraded;
        let mut full_text = String::new();
        let mut buffer = SentinelBuffer::default();

        let llm_stream = state.llm().stream(&messages, parameters);
        tokio::pin!(llm_stream);

        while let Some(item) = llm_stream.next().await {
            match item {
                Ok(event) => {
                    if let Some(text) = event.as_text() {
                        full_text.push_str(text);
                        if let Some(flushed) = buffer.push(text) {
                            if !flushed.is_empty() {
                                yield Ok(sse_text(&escape_newlines(&flushed)));
                            }
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, "LLM stream ended before completion");
                    degraded = true;
                    break;
                }
            }
        }

        let remainder = buffer.flush_remaining();
        if !remainder.is_empty() {
            yield Ok(sse_text(&escape_newlines(&remainder)));
        }

        let strict_citations = state.config().citation.strict_citations;
        let fuzzy_accept = state.config().citation.fuzzy_accept;

        let mut seen_ids = std::collections::HashSet::new();
        let mut citations_dto = Vec::new();
        let mut invalid_citations = Vec::new();

        for extracted in citation::extract(&full_text) {
            if !seen_ids.insert(extracted.id.clone()) {
                continue;
            }
            let Some(passage) = passages.get(extracted.id.as_str()) else {
                invalid_citations.push(InvalidCitationDto { id: extracted.id, span: extracted.span });
                degraded = true;
                continue;
            };
            match citation::validate(&extracted.span, &passage.content, fuzzy_accept) {
                Validation::Accepted { fuzzy } => {
                    if fuzzy {
                        warn!(id = %extracted.id, "citation accepted by fuzzy match");
                    }
                    citations_dto.push(CitationDto {
                        id: extracted.id,
                        text: extracted.span,
                        source: passage.source.clone(),
                        url: Some(passage.url.clone()),
                    });
                }
                Validation::NoMatch | Validation::UnknownId => {
                    if strict_citations {
                        warn!(id = %extracted.id, "invalid citation under strict citation policy");
                    }
                    invalid_citations.push(InvalidCitationDto { id: extracted.id, span: extracted.span });
                    degraded = true;
                }
            }
        }

        let citations_count = citations_dto.len();
        let citations_payload = serde_json::json!({
            "kind": "citations",
            "data": citations_dto,
            "invalid_citations": invalid_citations,
        });
        yield Ok(SseEvent::default().event("citations").data(citations_payload.to_string()));

        let output_tokens = regdoc_chunkstore::tokenizer::count(&full_text);
        let metrics = MetricsDto {
            input_tokens: prompt_tokens,
            output_tokens,
            estimated_cost: f64::from(prompt_tokens) / 1_000_000.0 * f64::from(generation.input_price_per_1m)
                + f64::from(output_tokens) / 1_000_000.0 * f64::from(generation.output_price_per_1m),
            citations_count,
            average_normalized_score,
            latency_ms: u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX),
            degraded,
        };
        yield Ok(sse_json("metrics", metrics));
        yield Ok(sse_done());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_newlines_handles_blank_lines_and_single_breaks() {
        assert_eq!(escape_newlines("a\n\nb\nc"), "a<<<BLANK_LINE>>>b<<<LINE_BREAK>>>c");
    }

    #[test]
    fn sentinel_buffer_holds_back_incomplete_opening_tag() {
        let mut buffer = SentinelBuffer::default();
        assert_eq!(buffer.push("hello "), Some("hello ".to_string()));
        assert_eq!(buffer.push("\u{27e8}cite"), None);
        let flushed = buffer.push(" id=\"C1\"\u{27e9}span\u{27e8}/cite\u{27e9} done");
        assert_eq!(flushed, Some("\u{27e8}cite id=\"C1\"\u{27e9}span\u{27e8}/cite\u{27e9} done".to_string()));
        assert_eq!(buffer.flush_remaining(), "");
    }

    #[test]
    fn sentinel_buffer_flushes_eagerly_when_no_open_bracket() {
        let mut buffer = SentinelBuffer::default();
        assert_eq!(buffer.push("plain text, no sentinels here"), Some("plain text, no sentinels here".to_string()));
    }
}

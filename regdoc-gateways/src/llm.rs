//! HTTP chat-completion gateway (component C5, §4.5): an OpenAI-compatible
//! `/chat/completions` endpoint, non-streaming for `complete_short` and
//! server-sent-events streaming for `stream`.

use async_stream::stream;
use futures_core::Stream;
use futures_lite::StreamExt;
use regdoc_core::llm::{Event, LanguageModel, Message, Parameters, Role};
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::retry::with_retry;

const MAX_ATTEMPTS: u32 = 3;

/// Chat-completion gateway backed by an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct LlmGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl LlmGateway {
    /// Builds a gateway against `base_url` for `model`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn request_url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    }
}

impl LanguageModel for LlmGateway {
    type Error = LlmError;

    async fn complete_short(&self, prompt: &str, parameters: Parameters) -> Result<String, Self::Error> {
        let payload = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: parameters.temperature,
            max_tokens: parameters.max_tokens,
            stream: false,
        };

        with_retry(MAX_ATTEMPTS, "complete_short", || async {
            let response = self
                .client
                .post(self.request_url("/chat/completions"))
                .bearer_auth(&self.api_key)
                .json(&payload)
                .send()
                .await
                .map_err(|e| LlmError::Unavailable(e.to_string()))?;

            if !response.status().is_success() {
                return Err(LlmError::Unavailable(format!("status {}", response.status())));
            }

            let body: ChatCompletionResponse =
                response.json().await.map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

            body.choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .ok_or_else(|| LlmError::MalformedResponse("no choices in response".to_string()))
        })
        .await
    }

    fn stream(&self, messages: &[Message], parameters: Parameters) -> impl Stream<Item = Result<Event, Self::Error>> + Send {
        let client = self.client.clone();
        let url = self.request_url("/chat/completions");
        let api_key = self.api_key.clone();
        let model = self.model.clone();
        let payload = ChatRequest {
            model: &model,
            messages: messages.iter().map(|m| ChatMessage { role: role_str(m.role()), content: m.content() }).collect(),
            temperature: parameters.temperature,
            max_tokens: parameters.max_tokens,
            stream: true,
        };
        let body = serde_json::to_value(&payload).unwrap_or(serde_json::Value::Null);

        stream! {
            let response = client
                .post(&url)
                .bearer_auth(&api_key)
                .header(reqwest::header::ACCEPT, "text/event-stream")
                .json(&body)
                .send()
                .await
                .map_err(|e| LlmError::Unavailable(e.to_string()));

            let response = match response {
                Ok(r) if r.status().is_success() => r,
                Ok(r) => {
                    yield Err(LlmError::Unavailable(format!("status {}", r.status())));
                    return;
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            let mut byte_stream = response.bytes_stream();
            let mut buffer = String::new();
            let mut emitted_any = false;

            while let Some(chunk) = byte_stream.next().await {
                let bytes = match chunk {
                    Ok(b) => b,
                    Err(e) => {
                        let kind = if emitted_any { LlmError::StreamTruncated(e.to_string()) } else { LlmError::Unavailable(e.to_string()) };
                        yield Err(kind);
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&bytes));

                while let Some(pos) = buffer.find("\n\n") {
                    let message = buffer[..pos].to_string();
                    buffer.drain(..pos + 2);

                    for line in message.lines() {
                        let Some(data) = line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")) else {
                            continue;
                        };
                        let data = data.trim();
                        if data == "[DONE]" {
                            return;
                        }
                        match serde_json::from_str::<ChatCompletionChunk>(data) {
                            Ok(parsed) => {
                                if let Some(choice) = parsed.choices.into_iter().next() {
                                    if let Some(content) = choice.delta.content {
                                        if !content.is_empty() {
                                            emitted_any = true;
                                            yield Ok(Event::text(content));
                                        }
                                    }
                                }
                            }
                            Err(e) => {
                                yield Err(LlmError::MalformedResponse(e.to_string()));
                            }
                        }
                    }
                }
            }
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionChunk {
    choices: Vec<ChatChunkChoice>,
}

#[derive(Deserialize)]
struct ChatChunkChoice {
    delta: ChatDelta,
}

#[derive(Deserialize, Default)]
struct ChatDelta {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_str_maps_every_variant() {
        assert_eq!(role_str(Role::User), "user");
        assert_eq!(role_str(Role::Assistant), "assistant");
        assert_eq!(role_str(Role::System), "system");
    }

    #[tokio::test]
    async fn complete_short_reports_unavailable_on_connection_failure() {
        let gateway = LlmGateway::new("http://127.0.0.1:1", "key", "model");
        let result = gateway.complete_short("hello", Parameters::new(0.7, 100)).await;
        assert!(matches!(result, Err(LlmError::Unavailable(_))));
    }
}

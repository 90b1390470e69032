//! Text-completion boundary and everything that talks to it.
//!
//! Callers depend on the [`TextCompletion`] trait; [`LlmClient`] is the
//! reqwest-backed implementation for Ollama and OpenAI-compatible APIs.

pub mod chabura;
pub mod edges;
pub mod json;
pub mod rerank;
pub mod sources;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub content: String,
}

/// An external text-completion service.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<Completion>;
}

/// HTTP client for the configured LLM provider.
#[derive(Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(client: reqwest::Client, config: LlmConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }
}

#[async_trait]
impl TextCompletion for LlmClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<Completion> {
        let content = match self.config.provider.as_str() {
            "ollama" => call_ollama(&self.client, &self.config, messages, options).await?,
            "openai" => call_openai(&self.client, &self.config, messages, options).await?,
            other => anyhow::bail!("Unknown LLM provider: {other}"),
        };
        Ok(Completion { content })
    }
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

async fn call_ollama(
    client: &reqwest::Client,
    config: &LlmConfig,
    messages: Vec<ChatMessage>,
    options: CompletionOptions,
) -> Result<String> {
    let url = format!("{}/api/chat", config.base_url);

    let req = OllamaChatRequest {
        model: config.chat_model.clone(),
        messages,
        stream: false,
        options: OllamaOptions {
            temperature: options.temperature,
            num_predict: options.max_tokens,
        },
    };

    let resp = client
        .post(&url)
        .json(&req)
        .send()
        .await
        .context("Failed to call Ollama chat API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Ollama chat API returned {status}: {body}");
    }

    let body: OllamaChatResponse = resp.json().await?;
    Ok(body.message.content)
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

async fn call_openai(
    client: &reqwest::Client,
    config: &LlmConfig,
    messages: Vec<ChatMessage>,
    options: CompletionOptions,
) -> Result<String> {
    let url = format!("{}/v1/chat/completions", config.base_url);
    let api_key = config.api_key.as_deref().unwrap_or_default();

    let req = OpenAiChatRequest {
        model: config.chat_model.clone(),
        messages,
        temperature: options.temperature,
        max_tokens: options.max_tokens,
    };

    let resp = client
        .post(&url)
        .header("Authorization", format!("Bearer {api_key}"))
        .json(&req)
        .send()
        .await
        .context("Failed to call OpenAI chat API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("OpenAI chat API returned {status}: {body}");
    }

    let body: OpenAiChatResponse = resp.json().await?;
    Ok(body
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted completion backend for unit tests.

    use super::*;
    use parking_lot::Mutex;
    use std::time::Duration;

    pub enum Reply {
        Text(String),
        Fail(String),
        Delay(Duration, String),
    }

    /// Replies in order; records every request it receives.
    pub struct ScriptedCompletion {
        replies: Mutex<Vec<Reply>>,
        pub calls: Mutex<Vec<(Vec<ChatMessage>, CompletionOptions)>>,
    }

    impl ScriptedCompletion {
        pub fn new(replies: Vec<Reply>) -> Self {
            let mut replies = replies;
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn text(content: &str) -> Self {
            Self::new(vec![Reply::Text(content.to_string())])
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    #[async_trait]
    impl TextCompletion for ScriptedCompletion {
        async fn complete(
            &self,
            messages: Vec<ChatMessage>,
            options: CompletionOptions,
        ) -> Result<Completion> {
            self.calls.lock().push((messages, options));
            let reply = self.replies.lock().pop();
            match reply {
                Some(Reply::Text(content)) => Ok(Completion { content }),
                Some(Reply::Fail(msg)) => anyhow::bail!(msg),
                Some(Reply::Delay(delay, content)) => {
                    tokio::time::sleep(delay).await;
                    Ok(Completion { content })
                }
                None => anyhow::bail!("no scripted reply left"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_provider_is_an_error() {
        let client = LlmClient::new(
            reqwest::Client::new(),
            LlmConfig {
                provider: "carrier-pigeon".to_string(),
                ..LlmConfig::default()
            },
        );
        let err = client
            .complete(
                vec![ChatMessage::user("hi")],
                CompletionOptions {
                    temperature: 0.0,
                    max_tokens: 10,
                },
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("carrier-pigeon"));
    }

    #[test]
    fn test_openai_request_shape() {
        let req = OpenAiChatRequest {
            model: "m".into(),
            messages: vec![ChatMessage::system("s"), ChatMessage::user("u")],
            temperature: 0.0,
            max_tokens: 200,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "u");
        assert_eq!(json["max_tokens"], 200);
    }

    #[test]
    fn test_openai_null_content_is_empty() {
        let body: OpenAiChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(body.choices[0].message.content.is_none());
    }
}

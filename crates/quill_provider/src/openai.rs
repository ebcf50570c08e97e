use anyhow::Context;
use async_trait::async_trait;
use quill_domain::{ChatModel, Prompt};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::Error;

const PROVIDER: &str = "openai";

/// Single-attempt client for any OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct OpenAiCompat {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiCompat {
    pub fn new(
        client: reqwest::Client,
        base_url: Url,
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        Self {
            client,
            base_url,
            api_key: api_key.into(),
            model: model.into(),
            max_tokens,
        }
    }

    fn headers(&self) -> anyhow::Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", self.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).context("invalid OpenAI API key")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl ChatModel for OpenAiCompat {
    async fn invoke(&self, prompt: Prompt) -> anyhow::Result<String> {
        let url = self.base_url.join("chat/completions")?;
        let body = ChatRequest {
            model: &self.model,
            temperature: prompt.temperature,
            max_tokens: self.max_tokens,
            messages: vec![ChatMessage { role: "user", content: &prompt.content }],
        };
        debug!(url = %url, model = %self.model, prompt_len = prompt.content.len(), "Calling chat completions");

        let response = self
            .client
            .post(url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .context("failed to call chat completions")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(Error::InvalidStatusCode { provider: PROVIDER, status: status.as_u16(), body }.into());
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("failed to parse chat completions response")?;
        parsed
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content.filter(|content| !content.is_empty()))
            .ok_or_else(|| Error::EmptyContent { provider: PROVIDER }.into())
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use pretty_assertions::assert_eq;

    use super::*;

    fn fixture(server: &mockito::ServerGuard) -> OpenAiCompat {
        let base_url = Url::parse(&format!("{}/v1/", server.url())).unwrap();
        OpenAiCompat::new(reqwest::Client::new(), base_url, "sk-test", "gpt-test", 256)
    }

    #[tokio::test]
    async fn test_invoke_returns_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "gpt-test",
                "max_tokens": 256,
                "messages": [{"role": "user", "content": "Write"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Draft"}}]}"#)
            .create_async()
            .await;

        let actual = fixture(&server).invoke(Prompt::new("Write")).await.unwrap();

        assert_eq!(actual, "Draft");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_null_content_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#)
            .create_async()
            .await;

        let actual = fixture(&server).invoke(Prompt::new("Write")).await.unwrap_err();

        assert!(matches!(actual.downcast_ref::<Error>(), Some(Error::EmptyContent { .. })));
    }
}

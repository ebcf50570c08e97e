use anyhow::Context;
use async_trait::async_trait;
use quill_domain::{ChatModel, Prompt};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::Error;

const PROVIDER: &str = "anthropic";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Single-attempt client for the Anthropic messages API.
#[derive(Clone)]
pub struct Anthropic {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl Anthropic {
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
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(self.api_key.trim()).context("invalid Anthropic API key")?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl ChatModel for Anthropic {
    async fn invoke(&self, prompt: Prompt) -> anyhow::Result<String> {
        let url = self.base_url.join("messages")?;
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: prompt.temperature,
            messages: vec![Message {
                role: "user",
                content: vec![ContentBlock { kind: "text", text: &prompt.content }],
            }],
        };
        debug!(url = %url, model = %self.model, prompt_len = prompt.content.len(), "Calling Anthropic");

        let response = self
            .client
            .post(url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .context("failed to call Anthropic messages API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(Error::InvalidStatusCode { provider: PROVIDER, status: status.as_u16(), body }.into());
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .context("failed to parse Anthropic response")?;
        let answer = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(text),
                ResponseBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");
        if answer.is_empty() {
            return Err(Error::EmptyContent { provider: PROVIDER }.into());
        }
        Ok(answer)
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Serialize)]
struct ContentBlock<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use pretty_assertions::assert_eq;

    use super::*;

    fn fixture(server: &mockito::ServerGuard) -> Anthropic {
        let base_url = Url::parse(&format!("{}/v1/", server.url())).unwrap();
        Anthropic::new(reqwest::Client::new(), base_url, "sk-test", "claude-test", 512)
    }

    #[tokio::test]
    async fn test_invoke_joins_text_blocks() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "sk-test")
            .match_header("anthropic-version", "2023-06-01")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "claude-test",
                "max_tokens": 512,
                "temperature": 0.0,
                "messages": [{"role": "user", "content": [{"type": "text", "text": "Verify"}]}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "content": [
                        {"type": "text", "text": "VERIFICATION STATUS: PASS"},
                        {"type": "tool_use", "id": "x", "name": "y", "input": {}},
                        {"type": "text", "text": "RECOMMENDATION: APPROVE"}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let actual = fixture(&server)
            .invoke(Prompt::new("Verify").temperature(0.0))
            .await
            .unwrap();

        let expected = "VERIFICATION STATUS: PASS\nRECOMMENDATION: APPROVE";
        assert_eq!(actual, expected);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_is_reported_with_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(529)
            .with_body(r#"{"type":"error","error":{"type":"overloaded_error"}}"#)
            .create_async()
            .await;

        let actual = fixture(&server).invoke(Prompt::new("Plan")).await.unwrap_err();

        match actual.downcast_ref::<Error>() {
            Some(Error::InvalidStatusCode { status, body, .. }) => {
                assert_eq!(*status, 529);
                assert!(body.contains("overloaded_error"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_response_without_text_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(r#"{"content":[]}"#)
            .create_async()
            .await;

        let actual = fixture(&server).invoke(Prompt::new("Plan")).await.unwrap_err();

        assert!(matches!(actual.downcast_ref::<Error>(), Some(Error::EmptyContent { .. })));
    }
}

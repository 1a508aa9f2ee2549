use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;

use crate::protocol::errors::provider_error;
use crate::protocol::{build_request, finalize_non_streamed, RequestOptions, WireFormat};
use crate::provider::{LLMError, LLMProvider, LLMResponse, Result};
use agent_core::{tools::ToolDefinition, Message};
use chat_core::Config;

use super::common::sse::llm_stream_from_sse;

/// Provider speaking either wire format to a single endpoint URL.
pub struct HttpProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    format: WireFormat,
    stream: bool,
    max_output_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl HttpProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
            format: WireFormat::Chat,
            stream: true,
            max_output_tokens: None,
            temperature: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.api_base.clone().unwrap_or_default(),
            config.api_key.clone().unwrap_or_default(),
            config.model.clone().unwrap_or_default(),
        )
        .with_format(config.format.into())
        .with_stream(config.stream)
        .with_max_output_tokens(config.max_output_tokens)
        .with_temperature(config.temperature)
    }

    pub fn with_format(mut self, format: WireFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: Option<u32>) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    fn request_options(&self) -> RequestOptions {
        RequestOptions {
            model: self.model.clone(),
            stream: self.stream,
            max_output_tokens: self.max_output_tokens,
            temperature: self.temperature,
        }
    }
}

fn is_event_stream(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("text/event-stream"))
}

#[async_trait]
impl LLMProvider for HttpProvider {
    async fn chat(
        &self,
        system_prompt: Option<&str>,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        let body = build_request(
            self.format,
            &self.request_options(),
            system_prompt,
            messages,
            tools,
        )?;

        log::debug!(
            "Sending {:?} request: model='{}', messages={}, tools={}, stream={}",
            self.format,
            self.model,
            messages.len(),
            tools.len(),
            self.stream
        );

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|payload| provider_error(&payload))
                .unwrap_or(text);
            return Err(LLMError::Api(format!("HTTP {}: {}", status, message)));
        }

        if is_event_stream(&response) {
            return Ok(LLMResponse::Stream(llm_stream_from_sse(response, self.format)));
        }

        let text = response.text().await?;
        let payload: Value = serde_json::from_str(&text)?;
        let reply = finalize_non_streamed(self.format, &payload)?;
        log::debug!(
            "Received complete reply: {} chars, {} tool calls",
            reply.reply_text.len(),
            reply.tool_calls.len()
        );
        Ok(LLMResponse::Complete(reply))
    }
}

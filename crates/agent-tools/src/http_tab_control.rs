//! [`BrowserTools`] over HTTP.
//!
//! Each operation is `POST {base}/tools/<name>` with the tool arguments as the JSON
//! body; the response body is the tool result text.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::browser::BrowserTools;
use crate::definitions::{CLICK_BUTTON, CLOSE_PAGE, GET_PAGE, LIST_TABS, OPEN_PAGE, RUN_CONSOLE};
use crate::error::{Result, ToolError};

pub struct HttpTabControl {
    client: Client,
    base_url: String,
}

impl HttpTabControl {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call(&self, tool: &str, args: Value) -> Result<String> {
        let url = format!("{}/tools/{}", self.base_url, tool);
        log::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(&args)
            .send()
            .await
            .map_err(|e| ToolError::Execution(format!("tab service unreachable: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ToolError::Execution(format!("failed to read tab service reply: {}", e)))?;

        if !status.is_success() {
            return Err(ToolError::Execution(format!("HTTP {}: {}", status, text)));
        }
        Ok(text)
    }
}

#[async_trait]
impl BrowserTools for HttpTabControl {
    async fn open_page(&self, url: &str, focus: bool) -> Result<String> {
        self.call(OPEN_PAGE, json!({ "url": url, "focus": focus }))
            .await
    }

    async fn click_button(&self, id: &str) -> Result<String> {
        self.call(CLICK_BUTTON, json!({ "id": id })).await
    }

    async fn get_page(&self, tab_id: u64) -> Result<String> {
        self.call(GET_PAGE, json!({ "tab_id": tab_id })).await
    }

    async fn close_page(&self, tab_id: u64) -> Result<String> {
        self.call(CLOSE_PAGE, json!({ "tab_id": tab_id })).await
    }

    async fn run_console(&self, command: &str) -> Result<String> {
        self.call(RUN_CONSOLE, json!({ "command": command })).await
    }

    async fn list_tabs(&self) -> Result<String> {
        self.call(LIST_TABS, json!({})).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn network_tests_disabled() -> bool {
        std::env::var_os("CODEX_SANDBOX_NETWORK_DISABLED").is_some()
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        assert_eq!(
            HttpTabControl::new("http://localhost:7070/").base_url(),
            "http://localhost:7070"
        );
    }

    #[tokio::test]
    async fn open_page_posts_arguments() {
        if network_tests_disabled() {
            return;
        }

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tools/open_page"))
            .and(body_json(json!({"url": "https://example.com/", "focus": true})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("Title: Example\nURL: https://example.com/\nTabID: 4"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let control = HttpTabControl::new(server.uri());
        let text = control.open_page("https://example.com/", true).await.unwrap();

        assert!(text.ends_with("TabID: 4"));
    }

    #[tokio::test]
    async fn get_page_uses_snake_case_tab_id() {
        if network_tests_disabled() {
            return;
        }

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tools/get_page"))
            .and(body_json(json!({"tab_id": 9})))
            .respond_with(ResponseTemplate::new(200).set_body_string("page"))
            .mount(&server)
            .await;

        let control = HttpTabControl::new(server.uri());
        assert_eq!(control.get_page(9).await.unwrap(), "page");
    }

    #[tokio::test]
    async fn error_status_becomes_execution_error() {
        if network_tests_disabled() {
            return;
        }

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tools/close_page"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no tab 3"))
            .mount(&server)
            .await;

        let control = HttpTabControl::new(server.uri());
        match control.close_page(3).await {
            Err(ToolError::Execution(message)) => {
                assert!(message.contains("404"), "{message}");
                assert!(message.contains("no tab 3"), "{message}");
            }
            other => panic!("expected execution error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_service_is_an_execution_error() {
        let control = HttpTabControl::new("http://127.0.0.1:9");
        assert!(matches!(
            control.list_tabs().await,
            Err(ToolError::Execution(_))
        ));
    }
}

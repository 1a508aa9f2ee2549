use std::sync::Arc;

use agent_core::tools::{ToolCallRef, ToolDefinition, TOOL_ERROR_PREFIX};

use crate::browser::BrowserTools;
use crate::definitions::browser_tool_definitions;
use crate::error::Result;
use crate::invocation::ToolInvocation;

/// Validates tool calls and forwards them to a [`BrowserTools`] implementation.
#[derive(Clone)]
pub struct ToolDispatcher {
    tools: Arc<dyn BrowserTools>,
}

impl ToolDispatcher {
    pub fn new(tools: Arc<dyn BrowserTools>) -> Self {
        Self { tools }
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        browser_tool_definitions()
    }

    /// Run one call. Arguments are validated before the browser is touched.
    pub async fn dispatch(&self, call: &ToolCallRef) -> Result<String> {
        let invocation = ToolInvocation::parse(&call.name, &call.arguments)?;
        log::debug!("Dispatching {} ({})", invocation.name(), call.call_id);
        self.run(invocation).await
    }

    /// Like [`dispatch`](Self::dispatch), with failures reported as `Error: <message>`
    /// so the model can see them.
    pub async fn dispatch_to_text(&self, call: &ToolCallRef) -> (bool, String) {
        match self.dispatch(call).await {
            Ok(text) => (true, text),
            Err(e) => {
                log::warn!("Tool {} ({}) failed: {}", call.name, call.call_id, e);
                (false, format!("{} {}", TOOL_ERROR_PREFIX, e))
            }
        }
    }

    async fn run(&self, invocation: ToolInvocation) -> Result<String> {
        match invocation {
            ToolInvocation::OpenPage { url, focus } => {
                self.tools.open_page(url.as_str(), focus).await
            }
            ToolInvocation::ClickButton { id } => self.tools.click_button(&id).await,
            ToolInvocation::GetPage { tab_id } => self.tools.get_page(tab_id).await,
            ToolInvocation::ClosePage { tab_id } => self.tools.close_page(tab_id).await,
            ToolInvocation::RunConsole { command } => self.tools.run_console(&command).await,
            ToolInvocation::ListTabs => self.tools.list_tabs().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingBrowser {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingBrowser {
        fn record(&self, entry: String) {
            self.calls.lock().unwrap().push(entry);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BrowserTools for RecordingBrowser {
        async fn open_page(&self, url: &str, focus: bool) -> Result<String> {
            self.record(format!("open_page {url} {focus}"));
            Ok(format!("Title: Example\nURL: {url}\nTabID: 1"))
        }

        async fn click_button(&self, id: &str) -> Result<String> {
            self.record(format!("click_button {id}"));
            Err(ToolError::Execution(format!("element '{id}' not found")))
        }

        async fn get_page(&self, tab_id: u64) -> Result<String> {
            self.record(format!("get_page {tab_id}"));
            Ok("page text".to_string())
        }

        async fn close_page(&self, tab_id: u64) -> Result<String> {
            self.record(format!("close_page {tab_id}"));
            Ok(format!("Closed tab {tab_id}"))
        }

        async fn run_console(&self, command: &str) -> Result<String> {
            self.record(format!("run_console {command}"));
            Ok("2".to_string())
        }

        async fn list_tabs(&self) -> Result<String> {
            self.record("list_tabs".to_string());
            Ok("Title: x\nURL: y\nTabID: 1".to_string())
        }
    }

    fn dispatcher() -> (ToolDispatcher, Arc<RecordingBrowser>) {
        let browser = Arc::new(RecordingBrowser::default());
        (ToolDispatcher::new(browser.clone()), browser)
    }

    #[tokio::test]
    async fn dispatches_valid_calls() {
        let (dispatcher, browser) = dispatcher();

        let result = dispatcher
            .dispatch(&ToolCallRef::new(
                "call_1",
                "open_page",
                r#"{"url":"https://example.com","focus":false}"#,
            ))
            .await
            .unwrap();

        assert!(result.contains("TabID: 1"));
        assert_eq!(browser.calls(), vec!["open_page https://example.com/ false"]);
    }

    #[tokio::test]
    async fn empty_arguments_are_an_empty_object() {
        let (dispatcher, browser) = dispatcher();

        let result = dispatcher
            .dispatch(&ToolCallRef::new("call_1", "list_tabs", ""))
            .await
            .unwrap();

        assert_eq!(result, "Title: x\nURL: y\nTabID: 1");
        assert_eq!(browser.calls(), vec!["list_tabs"]);
    }

    #[tokio::test]
    async fn invalid_arguments_never_reach_the_browser() {
        let (dispatcher, browser) = dispatcher();

        let err = dispatcher
            .dispatch(&ToolCallRef::new("call_1", "get_page", r#"{"tab_id":0}"#))
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert!(browser.calls().is_empty());
    }

    #[tokio::test]
    async fn open_page_without_focus_never_opens_a_tab() {
        let (dispatcher, browser) = dispatcher();

        let err = dispatcher
            .dispatch(&ToolCallRef::new(
                "call_1",
                "open_page",
                r#"{"url":"https://example.com"}"#,
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert!(browser.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let (dispatcher, _) = dispatcher();

        let err = dispatcher
            .dispatch(&ToolCallRef::new("call_1", "delete_history", "{}"))
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn dispatch_to_text_reports_errors_to_the_model() {
        let (dispatcher, _) = dispatcher();

        let (success, text) = dispatcher
            .dispatch_to_text(&ToolCallRef::new("call_1", "click_button", r#"{"id":"buy"}"#))
            .await;
        assert!(!success);
        assert_eq!(text, "Error: Execution failed: element 'buy' not found");

        let (success, text) = dispatcher
            .dispatch_to_text(&ToolCallRef::new("call_2", "run_console", r#"{"command":"1+1"}"#))
            .await;
        assert!(success);
        assert_eq!(text, "2");
    }

    #[test]
    fn definitions_cover_all_tools() {
        let (dispatcher, _) = dispatcher();
        assert_eq!(dispatcher.definitions().len(), 6);
    }
}

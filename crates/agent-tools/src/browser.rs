use async_trait::async_trait;

use crate::error::Result;

/// The browser side of the tools.
///
/// Implementations drive real tabs; every operation returns human-readable text that
/// is handed to the model as the tool result.
#[async_trait]
pub trait BrowserTools: Send + Sync {
    /// Open `url` in a new tab. The result should contain a `TabID: <n>` line.
    async fn open_page(&self, url: &str, focus: bool) -> Result<String>;

    async fn click_button(&self, id: &str) -> Result<String>;

    async fn get_page(&self, tab_id: u64) -> Result<String>;

    async fn close_page(&self, tab_id: u64) -> Result<String>;

    async fn run_console(&self, command: &str) -> Result<String>;

    async fn list_tabs(&self) -> Result<String>;
}

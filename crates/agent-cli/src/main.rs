use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use agent_core::storage::{JsonStorage, Storage};
use agent_core::AgentEvent;
use agent_llm::{HttpProvider, LLMProvider};
use agent_loop::{AgentLoopConfig, Orchestrator, TurnOutcome};
use agent_tools::{HttpTabControl, ToolDispatcher};
use chat_core::{paths, ApiFormat, Config};

mod logging;
mod render;

use logging::init_logging;
use render::{print_history, EventRenderer};

#[derive(Parser, Debug)]
#[command(name = "tabpilot")]
#[command(about = "Chat with an LLM that can drive your browser tabs")]
#[command(version)]
struct Cli {
    /// Conversation to continue; a new one is started when omitted
    #[arg(long, env = "CONVERSATION_ID")]
    conversation_id: Option<String>,

    /// Enable debug mode
    #[arg(long, short, env = "DEBUG", default_value = "false")]
    debug: bool,

    /// Provider endpoint the request body is POSTed to
    #[arg(long)]
    api_base: Option<String>,

    #[arg(long)]
    api_key: Option<String>,

    #[arg(long)]
    model: Option<String>,

    /// Wire format: chat or responses
    #[arg(long, value_parser = parse_api_format)]
    format: Option<ApiFormat>,

    /// Ask for a complete reply instead of a stream
    #[arg(long)]
    no_stream: bool,

    /// Base URL of the tab-control service; tools are disabled without it
    #[arg(long)]
    tab_service_url: Option<String>,

    /// Directory holding stored conversations
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start interactive chat
    Chat,
    /// Send a single message
    Send {
        /// Message content
        message: String,
    },
    /// View a conversation, or list stored conversations without --conversation-id
    History,
}

fn parse_api_format(value: &str) -> Result<ApiFormat, String> {
    ApiFormat::parse(value).ok_or_else(|| format!("unknown format '{}'", value))
}

impl Cli {
    /// File and environment settings with command-line flags on top.
    fn config(&self) -> Config {
        let mut config = Config::new();
        if let Some(api_base) = &self.api_base {
            config.api_base = Some(api_base.clone());
        }
        if let Some(api_key) = &self.api_key {
            config.api_key = Some(api_key.clone());
        }
        if let Some(model) = &self.model {
            config.model = Some(model.clone());
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if self.no_stream {
            config.stream = false;
        }
        if let Some(url) = &self.tab_service_url {
            config.tab_service_url = Some(url.clone());
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = Some(dir.clone());
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let config = cli.config();
    let storage = Arc::new(JsonStorage::new(
        config.data_dir.clone().unwrap_or_else(paths::conversations_dir),
    ));

    log::info!(
        "Provider: {} ({:?}, stream={})",
        config.api_base.as_deref().unwrap_or("<unset>"),
        config.format,
        config.stream
    );

    match cli.command {
        Commands::History => show_history(&storage, cli.conversation_id).await,
        Commands::Send { ref message } => {
            let (orchestrator, mut event_rx) =
                build_orchestrator(&config, storage, cli.conversation_id.clone()).await?;
            let mut renderer = EventRenderer::new(cli.debug);
            run_turn(&orchestrator, message, &mut event_rx, &mut renderer).await
        }
        Commands::Chat => {
            let (orchestrator, mut event_rx) =
                build_orchestrator(&config, storage, cli.conversation_id.clone()).await?;
            run_interactive_chat(&orchestrator, &mut event_rx, cli.debug).await
        }
    }
}

async fn build_orchestrator(
    config: &Config,
    storage: Arc<dyn Storage>,
    conversation_id: Option<String>,
) -> anyhow::Result<(Orchestrator, mpsc::Receiver<AgentEvent>)> {
    let (event_tx, event_rx) = mpsc::channel(256);
    let llm: Arc<dyn LLMProvider> = Arc::new(HttpProvider::from_config(config));

    let mut loop_config = AgentLoopConfig::from_config(config);
    let mut orchestrator = Orchestrator::new(
        conversation_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        llm,
        event_tx,
    )
    .with_storage(storage);

    match config.tab_service_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => {
            let tab_control = HttpTabControl::new(url);
            log::info!("Browser tools served by {}", tab_control.base_url());
            orchestrator = orchestrator.with_tools(ToolDispatcher::new(Arc::new(tab_control)));
        }
        _ => {
            log::warn!("TAB_SERVICE_URL not set; browser tools are disabled");
            loop_config.enable_tools = false;
        }
    }
    let orchestrator = orchestrator.with_config(loop_config);

    if let Some(id) = conversation_id {
        orchestrator.switch_conversation(&id).await?;
    }

    Ok((orchestrator, event_rx))
}

/// Run one turn, rendering events until it ends. Ctrl-C stops the turn and keeps
/// whatever was produced.
async fn run_turn(
    orchestrator: &Orchestrator,
    message: &str,
    event_rx: &mut mpsc::Receiver<AgentEvent>,
    renderer: &mut EventRenderer,
) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let turn = orchestrator.send(message, cancel.clone());
    tokio::pin!(turn);

    let result = loop {
        tokio::select! {
            result = &mut turn => break result,
            Some(event) = event_rx.recv() => renderer.render(&event)?,
            _ = tokio::signal::ctrl_c(), if !cancel.is_cancelled() => {
                log::debug!("Ctrl-C received, stopping turn");
                cancel.cancel();
            }
        }
    };

    while let Ok(event) = event_rx.try_recv() {
        renderer.render(&event)?;
    }
    renderer.end_line();

    match result {
        Ok(TurnOutcome::Busy) => println!("{}", "A reply is still being generated.".yellow()),
        Ok(outcome) => log::debug!("Turn ended: {:?}", outcome),
        // already reported through an Error event
        Err(e) => log::debug!("Turn failed: {:?}", e),
    }
    Ok(())
}

async fn run_interactive_chat(
    orchestrator: &Orchestrator,
    event_rx: &mut mpsc::Receiver<AgentEvent>,
    debug: bool,
) -> anyhow::Result<()> {
    let mut renderer = EventRenderer::new(debug);

    println!("{}", "🤖 tabpilot interactive chat".cyan().bold());
    println!(
        "{}",
        format!("Conversation ID: {}", orchestrator.conversation_id().await).dimmed()
    );
    println!(
        "{}",
        "Type 'exit' to leave. /history, /remove <index>, /switch <id>. Ctrl-C stops a reply."
            .dimmed()
    );
    println!();

    loop {
        print!("{} ", "You:".cyan().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("{}", "👋 Goodbye!".cyan());
            break;
        }
        if input.is_empty() {
            continue;
        }

        if let Some(command) = input.strip_prefix('/') {
            if let Err(e) = run_chat_command(orchestrator, command).await {
                println!("{}", format!("❌ {}", e).red());
            }
            continue;
        }

        println!("{}", "Assistant:".green().bold());
        run_turn(orchestrator, input, event_rx, &mut renderer).await?;
        println!();
    }

    Ok(())
}

async fn run_chat_command(orchestrator: &Orchestrator, command: &str) -> anyhow::Result<()> {
    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("history"), None) => {
            let state = orchestrator.snapshot().await;
            print_history(&state.conversation_id, &state.messages);
        }
        (Some("remove"), Some(index)) => {
            let index: usize = index.parse()?;
            let removed = orchestrator.remove_message(index).await?;
            println!(
                "{}",
                format!("Removed message {}: {}", index, render::preview(&removed.content, 60))
                    .dimmed()
            );
        }
        (Some("switch"), Some(id)) => {
            orchestrator.switch_conversation(id).await?;
            let state = orchestrator.snapshot().await;
            println!(
                "{}",
                format!(
                    "Switched to {} ({} messages)",
                    state.conversation_id,
                    state.messages.len()
                )
                .dimmed()
            );
        }
        _ => anyhow::bail!("unknown command '/{}'", command),
    }
    Ok(())
}

async fn show_history(
    storage: &JsonStorage,
    conversation_id: Option<String>,
) -> anyhow::Result<()> {
    let Some(conversation_id) = conversation_id else {
        let ids = storage.list_conversations().await?;
        if ids.is_empty() {
            println!("{}", "(no stored conversations)".dimmed());
        }
        for id in ids {
            println!("{}", id);
        }
        return Ok(());
    };

    match storage.load_conversation(&conversation_id).await? {
        Some(stored) => print_history(&stored.id, &stored.messages),
        None => println!(
            "{}",
            format!("❌ No stored conversation '{}'", conversation_id).red()
        ),
    }
    Ok(())
}

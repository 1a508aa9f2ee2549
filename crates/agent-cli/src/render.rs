use std::io::{self, Write};

use colored::Colorize;

use agent_core::{AgentEvent, AgentStatus, Message, Role};

const RESULT_PREVIEW_CHARS: usize = 160;

/// Prints agent events as they arrive. Tokens are written inline, everything
/// else on its own line.
pub struct EventRenderer {
    mid_line: bool,
    debug: bool,
}

impl EventRenderer {
    pub fn new(debug: bool) -> Self {
        Self {
            mid_line: false,
            debug,
        }
    }

    pub fn render(&mut self, event: &AgentEvent) -> io::Result<()> {
        match event {
            AgentEvent::Token { content } => {
                print!("{}", content.green());
                io::stdout().flush()?;
                self.mid_line = !content.ends_with('\n');
            }
            AgentEvent::Status { status } => {
                if let Some(label) = status_label(*status) {
                    self.line(label.dimmed().to_string());
                } else if self.debug {
                    self.line(format!("[DEBUG] status: {}", status).dimmed().to_string());
                }
            }
            AgentEvent::ToolStart {
                tool_name,
                arguments,
                ..
            } => {
                self.line(format!("🔧 {}", tool_name).yellow().to_string());
                self.line(format!("   Args: {}", arguments).dimmed().to_string());
            }
            AgentEvent::ToolComplete {
                success, result, ..
            } => {
                let text = format!("   → {}", preview(result, RESULT_PREVIEW_CHARS));
                if *success {
                    self.line(text.dimmed().to_string());
                } else {
                    self.line(text.red().to_string());
                }
            }
            AgentEvent::SettingsRequired => {
                self.line(
                    "⚙️  Provider settings are incomplete. Set API_BASE, API_KEY and MODEL \
                     (or --api-base, --api-key, --model) and try again."
                        .red()
                        .to_string(),
                );
            }
            AgentEvent::Error { message } => {
                self.line(format!("❌ Error: {}", message).red().to_string());
            }
            AgentEvent::Complete { rounds } => {
                self.end_line();
                if self.debug {
                    self.line(format!("[DEBUG] finished in {} rounds", rounds).dimmed().to_string());
                }
            }
        }
        Ok(())
    }

    /// Terminate a partially printed reply.
    pub fn end_line(&mut self) {
        if self.mid_line {
            println!();
            self.mid_line = false;
        }
    }

    fn line(&mut self, text: String) {
        self.end_line();
        println!("{}", text);
    }
}

fn status_label(status: AgentStatus) -> Option<&'static str> {
    match status {
        AgentStatus::Thinking => Some("💭 thinking…"),
        AgentStatus::Browsing => Some("🌐 browsing…"),
        AgentStatus::Searching => Some("🔎 searching…"),
        AgentStatus::Operating => Some("🖱️  operating…"),
        AgentStatus::Coding => Some("⌨️  running code…"),
        AgentStatus::Stopped => Some("⏹  stopped"),
        AgentStatus::Speaking | AgentStatus::Idle => None,
    }
}

/// Print the messages a user would see, with their indices.
pub fn print_history(conversation_id: &str, messages: &[Message]) {
    println!("{}", format!("Conversation {}", conversation_id).cyan().bold());
    if messages.is_empty() {
        println!("{}", "(no messages)".dimmed());
        return;
    }

    for (index, message) in messages.iter().enumerate() {
        if message.hidden {
            continue;
        }
        let label = match message.role {
            Role::User => "You:".cyan().bold(),
            Role::Assistant => "Assistant:".green().bold(),
            Role::Tool => "Tool:".yellow().bold(),
        };
        println!(
            "{} {} {}",
            format!("[{}]", index).dimmed(),
            label,
            message.content
        );
    }
}

/// First `max_chars` characters on one line.
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ⏎ ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}…", cut)
}

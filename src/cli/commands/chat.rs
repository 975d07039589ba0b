//! Interactive chat command.

use crate::chat::ChatSession;
use crate::cli::preflight::{self, Operation};
use crate::cli::{Components, Output};
use crate::config::Settings;
use crate::generation::{ChatMessage, Role};
use anyhow::Result;
use console::style;

/// Messages replayed when a stored session is resumed.
const RESUME_PREVIEW: usize = 10;

/// Run the interactive chat command.
pub async fn run_chat(session: Option<&str>, model: Option<&str>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Generate, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let session_id = session.unwrap_or(settings.chat.session.as_str()).to_string();
    let chat_dir = settings.chat_dir();
    let max_history = settings.chat.max_history;
    let components = Components::new(settings)?;

    let mut chat = ChatSession::open(
        components.generator(model)?,
        &chat_dir,
        &session_id,
        &components.prompts.chat.system,
        max_history,
    )?;

    println!("\n{}", style("Ragbook Chat").bold().cyan());
    let history = chat.history();
    if !history.is_empty() {
        println!(
            "{}",
            style(format!(
                "Resuming session '{}' ({} messages).",
                session_id,
                history.len()
            ))
            .dim()
        );
        Output::header("Previous chat");
        for message in resume_preview(history) {
            let speaker = match message.role {
                Role::User => style("You:").green().bold(),
                _ => style("Ragbook:").cyan().bold(),
            };
            println!("{} {}", speaker, message.content);
        }
        println!();
    }
    println!(
        "{}\n",
        style("Type your message, or 'exit' to quit. Use 'clear' to reset the conversation.").dim()
    );

    loop {
        let input = Output::prompt("You:")?;

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            chat.clear()?;
            Output::info("Conversation history cleared.");
            continue;
        }

        match chat.send(&input).await {
            Ok(response) => {
                println!("\n{} {}\n", style("Ragbook:").cyan().bold(), response);
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}

/// The tail of a stored conversation shown when it is resumed.
fn resume_preview(history: &[ChatMessage]) -> &[ChatMessage] {
    &history[history.len().saturating_sub(RESUME_PREVIEW)..]
}

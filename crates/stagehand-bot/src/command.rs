//! Inbound message text → bot command.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Status,
    Diff,
    Preview,
    Deploy,
    Cancel,
    Edit { file: Option<String>, prompt: String },
    NewFile { file: String, prompt: String },
    /// Bare `yes`/`no` answering a pending confirmation.
    Confirm(bool),
    /// Plain text with no command prefix: treated as an edit of the
    /// default target.
    Prompt(String),
    /// A recognized command with missing arguments; carries the usage hint.
    Usage(&'static str),
}

/// Parse one inbound message. Returns `None` for empty input.
pub fn parse(text: &str) -> Option<Command> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    match text.to_lowercase().as_str() {
        "yes" | "y" => return Some(Command::Confirm(true)),
        "no" | "n" => return Some(Command::Confirm(false)),
        _ => {}
    }

    if !text.starts_with('/') {
        return Some(Command::Prompt(text.to_string()));
    }

    let (command, rest) = match text.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (text, ""),
    };
    // Commands may arrive as `/cmd@BotName` in group chats.
    let command = command.split('@').next().unwrap_or(command);

    Some(match command {
        "/start" | "/help" => Command::Help,
        "/status" => Command::Status,
        "/diff" => Command::Diff,
        "/preview" => Command::Preview,
        "/deploy" => Command::Deploy,
        "/cancel" => Command::Cancel,
        "/edit" => {
            if rest.is_empty() {
                Command::Usage("Usage: `/edit <what to change>`")
            } else {
                Command::Edit {
                    file: None,
                    prompt: rest.to_string(),
                }
            }
        }
        "/editfile" => match rest.split_once(char::is_whitespace) {
            Some((file, prompt)) if !prompt.trim().is_empty() => Command::Edit {
                file: Some(file.to_string()),
                prompt: prompt.trim().to_string(),
            },
            _ => Command::Usage("Usage: `/editfile <filename> <what to change>`"),
        },
        "/newfile" => match rest.split_once(char::is_whitespace) {
            Some((file, prompt)) if !prompt.trim().is_empty() => Command::NewFile {
                file: file.to_string(),
                prompt: prompt.trim().to_string(),
            },
            _ => Command::Usage("Usage: `/newfile <filename> <prompt>`"),
        },
        _ => Command::Usage("Unknown command. Send /help for the command list."),
    })
}

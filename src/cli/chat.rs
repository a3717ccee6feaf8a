use std::io::Write;

use anyhow::{Context as _, Result};
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use super::render;
use crate::chat::{CompletionClient, ConversationController, HistoryFile, SendOutcome, Turn};
use crate::core::AppConfig;
use crate::gemini::GeminiClient;

const COMMANDS: [&str; 7] = ["/new", "/switch", "/list", "/show", "/delete", "/help", "/quit"];

const HELP: &str = "\
/new            start a new conversation
/switch <name>  switch to a conversation (`/switch 2` means `Chat 2`)
/list           list conversations
/show           show the active conversation
/delete         delete all chat history and start over
/help           show this message
/quit           exit
Anything else is sent to the model.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    New,
    Switch(String),
    List,
    Show,
    Delete,
    Help,
    Quit,
    Send(String),
    Unknown(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn parse_line(line: &str) -> Action {
    let trimmed = line.trim();
    if !trimmed.starts_with('/') {
        return Action::Send(line.to_string());
    }

    let (command, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (trimmed, ""),
    };
    match command {
        "/new" => Action::New,
        "/switch" if !arg.is_empty() => Action::Switch(arg.to_string()),
        "/list" => Action::List,
        "/show" => Action::Show,
        "/delete" => Action::Delete,
        "/help" => Action::Help,
        "/quit" | "/exit" => Action::Quit,
        _ => Action::Unknown(trimmed.to_string()),
    }
}

/// Finds the conversation the user meant. A bare number is shorthand
/// for `Chat N` unless a conversation has that exact name.
pub fn resolve_conversation<C: CompletionClient>(
    controller: &ConversationController<C>,
    name: &str,
) -> String {
    let store = controller.store();
    if !store.contains(name) && !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()) {
        format!("Chat {}", name)
    } else {
        name.to_string()
    }
}

fn active_turns<C: CompletionClient>(controller: &ConversationController<C>) -> &[Turn] {
    controller
        .active()
        .and_then(|id| controller.store().get(id).ok())
        .unwrap_or_default()
}

/// Applies one action to the controller and writes whatever the user
/// should see to `out`. Controller errors are shown rather than
/// ending the session.
pub fn dispatch<C: CompletionClient, W: Write>(
    controller: &mut ConversationController<C>,
    action: Action,
    out: &mut W,
) -> Result<Flow> {
    match action {
        Action::New => {
            controller.new_conversation()?;
            write!(out, "{}", render::render(&controller.view()))?;
        }
        Action::Switch(name) => {
            let id = resolve_conversation(controller, &name);
            match controller.switch_conversation(&id) {
                Ok(()) => write!(out, "{}", render::render(&controller.view()))?,
                Err(e) => writeln!(out, "{}", render::format_error(&e.to_string()))?,
            }
        }
        Action::List => {
            write!(out, "{}", render::format_conversations(&controller.view()))?;
        }
        Action::Show => {
            write!(out, "{}", render::render(&controller.view()))?;
        }
        Action::Delete => match controller.delete_history() {
            Ok(_) => {
                writeln!(out, "{}", "Chat history deleted.".bright_black())?;
                write!(out, "{}", render::render(&controller.view()))?;
            }
            Err(e) => writeln!(out, "{}", render::format_error(&e.to_string()))?,
        },
        Action::Help => writeln!(out, "{}", HELP)?,
        Action::Quit => return Ok(Flow::Quit),
        Action::Send(text) => {
            let turns_before = active_turns(controller).len();
            match controller.send(&text) {
                Ok(SendOutcome::Ignored) => {}
                Ok(SendOutcome::Replied(_)) => {
                    // The reply is the last turn in the transcript
                    if let Some(entry) = controller.view().transcript.last() {
                        writeln!(out, "{}", render::format_entry(entry))?;
                    }
                }
                Ok(SendOutcome::Failed(message)) => {
                    writeln!(out, "{}", render::format_error(&message))?;
                }
                Err(e) => {
                    tracing::error!("Send failed: {}", e);
                    // A reply that arrived but couldn't be saved is still shown
                    let turns = active_turns(controller);
                    if turns.len() == turns_before + 2
                        && let Some(reply) = turns.last()
                    {
                        writeln!(out, "{}", render::format_turn(reply))?;
                    }
                    writeln!(out, "{}", render::format_error(&e.to_string()))?;
                }
            }
        }
        Action::Unknown(command) => {
            writeln!(
                out,
                "{}",
                format!("Unknown command {}. Type /help for commands.", command).bright_black()
            )?;
        }
    }
    Ok(Flow::Continue)
}

/// Line editor helper that completes and hints slash commands.
#[derive(Clone, Default)]
struct ReplHelper;

impl Helper for ReplHelper {}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(' ') {
            return Ok((0, vec![]));
        }
        let candidates = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(' ') {
            return None;
        }
        COMMANDS
            .iter()
            .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Highlighter for ReplHelper {}

impl Validator for ReplHelper {}

pub fn run(config: AppConfig) -> Result<()> {
    let client = GeminiClient::from_config(&config)?;
    let history = HistoryFile::new(&config.history_path);
    let mut controller = ConversationController::open(history, client).with_context(|| {
        format!(
            "Could not open chat history. Fix or move {} and try again",
            config.history_path.display()
        )
    })?;

    let mut rl: Editor<ReplHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(ReplHelper));

    let mut stdout = std::io::stdout();
    print!("{}", render::banner(&config.gemini_model));
    print!("{}", render::render(&controller.view()));

    loop {
        let prompt = format!("{} > ", controller.active().unwrap_or_default());
        match rl.readline(&prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                }
                let flow = dispatch(&mut controller, parse_line(&line), &mut stdout)?;
                stdout.flush()?;
                if flow == Flow::Quit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}

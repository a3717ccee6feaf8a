//! Turns controller views into styled terminal text.
use colored::{ColoredString, Colorize};

use crate::chat::{Entry, Speaker, Turn, View};

// Words that start a line of code often enough to treat a reply as
// a snippet
const CODE_KEYWORDS: [&str; 12] = [
    "def", "class", "import", "for", "if", "else", "return", "fn", "let", "use", "pub", "impl",
];

fn label(speaker: Speaker) -> ColoredString {
    let text = format!("{}:", speaker.label());
    match speaker {
        Speaker::User => text.truecolor(0xBB, 0x86, 0xFC).bold(),
        Speaker::Assistant => text.truecolor(0x03, 0xDA, 0xC5).bold(),
    }
}

/// Rough check for whether a reply is source code. Replies that are
/// already fenced are left alone.
pub fn looks_like_code(text: &str) -> bool {
    if text.contains("```") {
        return false;
    }
    text.lines().any(|line| {
        let line = line.trim_start();
        let first = line
            .split(|c: char| c.is_whitespace() || c == '(' || c == ':')
            .next()
            .unwrap_or_default();
        CODE_KEYWORDS.contains(&first)
            && (first == "import" || line.contains(['(', ')', ':', '=', ';', '{']))
    })
}

pub fn format_turn(turn: &Turn) -> String {
    let speaker = turn.speaker();
    if speaker == Speaker::Assistant && looks_like_code(turn.text()) {
        format!("{}\n```\n{}\n```", label(speaker), turn.text())
    } else {
        format!("{} {}", label(speaker), turn.text())
    }
}

pub fn format_error(message: &str) -> String {
    format!("{} {}", "An error occurred:".red().bold(), message)
}

pub fn format_entry(entry: &Entry) -> String {
    match entry {
        Entry::Turn(turn) => format_turn(turn),
        Entry::Error(message) => format_error(message),
    }
}

pub fn format_conversations(view: &View) -> String {
    let mut out = String::new();
    for id in &view.conversations {
        if view.active.as_deref() == Some(id.as_str()) {
            out.push_str(&format!("* {}\n", id.truecolor(0xBB, 0x86, 0xFC).bold()));
        } else {
            out.push_str(&format!("  {}\n", id));
        }
    }
    out
}

/// The full screen for a view: the active conversation's name and its
/// transcript.
pub fn render(view: &View) -> String {
    let mut out = String::new();
    if let Some(active) = &view.active {
        out.push_str(&format!("{}\n", format!("── {} ──", active).bright_black()));
    }
    for entry in &view.transcript {
        out.push_str(&format_entry(entry));
        out.push('\n');
    }
    out
}

pub fn banner(model: &str) -> String {
    format!(
        "{}\n{}\n",
        "RootGPT".truecolor(0xBB, 0x86, 0xFC).bold(),
        format!("Chatting with {}. Type /help for commands.", model).bright_black()
    )
}

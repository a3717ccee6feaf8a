use std::collections::{HashMap, hash_map};
use std::path::Path;

use super::client::{BoxedChatSession, CompletionClient};
use super::history::HistoryFile;
use super::models::{ConversationStore, Turn};
use crate::core::error::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// No conversation exists yet
    Idle,
    Active,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input, nothing happened
    Ignored,
    Replied(String),
    /// The remote call failed. The user's message is kept, the error
    /// only shows up in the view.
    Failed(String),
}

/// A line in the rendered transcript.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry {
    Turn(Turn),
    Error(String),
}

/// Everything the presentation layer needs to redraw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct View {
    pub conversations: Vec<String>,
    pub active: Option<String>,
    pub transcript: Vec<Entry>,
}

/// Drives a set of conversations: keeps the store, the history file
/// and the remote sessions in step with each user action.
///
/// Each local conversation gets its own remote session the first time
/// a message is sent in it, seeded with whatever was already said.
pub struct ConversationController<C: CompletionClient> {
    store: ConversationStore,
    history: HistoryFile,
    client: C,
    sessions: HashMap<String, BoxedChatSession>,
    // Failed sends in the active conversation, keyed by the number of
    // turns that preceded the error
    inline_errors: Vec<(usize, String)>,
}

impl<C: CompletionClient> ConversationController<C> {
    /// Loads the history file and makes sure there is an active
    /// conversation. A history file that can't be parsed is an error
    /// and is left untouched.
    pub fn open(history: HistoryFile, client: C) -> Result<Self> {
        let store = history.load()?;
        let mut controller = Self {
            store,
            history,
            client,
            sessions: HashMap::new(),
            inline_errors: Vec::new(),
        };

        match controller.store.identifiers().pop() {
            Some(last) => controller.store.set_active(&last)?,
            None => {
                controller.new_conversation()?;
            }
        }

        Ok(controller)
    }

    pub fn state(&self) -> State {
        if self.store.get_active().is_some() {
            State::Active
        } else {
            State::Idle
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn history_path(&self) -> &Path {
        self.history.path()
    }

    pub fn active(&self) -> Option<&str> {
        self.store.get_active()
    }

    /// Creates an empty conversation and switches to it. The history
    /// file is written on the first message, not here.
    pub fn new_conversation(&mut self) -> Result<String> {
        let id = self.store.next_identifier();
        self.store.create(&id)?;
        self.inline_errors.clear();
        tracing::debug!("Created conversation {}", id);
        Ok(id)
    }

    pub fn switch_conversation(&mut self, id: &str) -> Result<()> {
        self.store.set_active(id)?;
        self.inline_errors.clear();
        Ok(())
    }

    /// Sends `text` in the active conversation. The user's message is
    /// saved before the remote call and the reply after it, so a
    /// failed call still leaves the message on disk.
    ///
    /// A failed save returns `HistoryError::Write`. Turns already
    /// appended stay in memory (and a reply stays in the remote
    /// session) and are written by the next save that succeeds.
    pub fn send(&mut self, text: &str) -> Result<SendOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(SendOutcome::Ignored);
        }

        let active = match self.store.get_active() {
            Some(id) => id.to_string(),
            None => self.new_conversation()?,
        };

        let session = match self.sessions.entry(active.clone()) {
            hash_map::Entry::Occupied(entry) => entry.into_mut(),
            hash_map::Entry::Vacant(entry) => {
                entry.insert(self.client.start_chat(self.store.get(&active)?))
            }
        };

        self.store.append(&active, Turn::user(text))?;
        self.history.save(&self.store)?;

        match session.send_message(text) {
            Ok(reply) => {
                self.store.append(&active, Turn::assistant(&reply))?;
                self.history.save(&self.store)?;
                Ok(SendOutcome::Replied(reply))
            }
            Err(e) => {
                tracing::warn!("Completion failed in {}: {}", active, e);
                let message = e.to_string();
                let position = self.store.get(&active)?.len();
                self.inline_errors.push((position, message.clone()));
                Ok(SendOutcome::Failed(message))
            }
        }
    }

    /// Deletes the history file and starts over with a single empty
    /// conversation. Succeeds when there is no file to delete.
    pub fn delete_history(&mut self) -> Result<String> {
        self.history.purge()?;
        self.store.clear();
        self.sessions.clear();
        self.inline_errors.clear();
        tracing::debug!("Chat history deleted");
        self.new_conversation()
    }

    pub fn view(&self) -> View {
        let active = self.store.get_active().map(str::to_string);
        let turns = active
            .as_deref()
            .and_then(|id| self.store.get(id).ok())
            .unwrap_or_default();

        let errors_at = |position: usize| {
            self.inline_errors
                .iter()
                .filter(move |(p, _)| *p == position)
                .map(|(_, msg)| Entry::Error(msg.clone()))
        };

        let mut transcript: Vec<Entry> = errors_at(0).collect();
        for (i, turn) in turns.iter().enumerate() {
            transcript.push(Entry::Turn(turn.clone()));
            transcript.extend(errors_at(i + 1));
        }

        View {
            conversations: self.store.identifiers(),
            active,
            transcript,
        }
    }
}

//! Test utilities for integration tests
#![allow(dead_code)]
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tempfile::TempDir;

use rootgpt::chat::{
    BoxedChatSession, ChatSession, CompletionClient, ConversationController, HistoryFile, Turn,
};
use rootgpt::core::RemoteError;

/// A completion client that answers from a queue of canned replies
/// and falls back to echoing the message.
#[derive(Clone, Default)]
pub struct ScriptedClient {
    replies: Rc<RefCell<VecDeque<Result<String, RemoteError>>>>,
    pub sent: Rc<RefCell<Vec<(usize, String)>>>,
    pub sessions_started: Rc<RefCell<usize>>,
    unwritable_on_send: Rc<RefCell<Option<PathBuf>>>,
}

impl ScriptedClient {
    pub fn reply(&self, text: &str) -> &Self {
        self.replies.borrow_mut().push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(&self, reason: &str) -> &Self {
        self.replies.borrow_mut().push_back(Err(RemoteError::NoText {
            reason: reason.to_string(),
        }));
        self
    }

    /// On the next send, replaces the file at `path` with a directory
    /// so saving the reply fails.
    pub fn make_unwritable_on_send(&self, path: &Path) -> &Self {
        *self.unwritable_on_send.borrow_mut() = Some(path.to_path_buf());
        self
    }
}

/// Puts a directory where the history file should be so writes fail.
pub fn make_unwritable(path: &Path) {
    let _ = fs::remove_file(path);
    fs::create_dir(path).expect("Failed to create directory");
}

struct ScriptedSession {
    id: usize,
    client: ScriptedClient,
}

impl CompletionClient for ScriptedClient {
    fn start_chat(&self, _history: &[Turn]) -> BoxedChatSession {
        let mut started = self.sessions_started.borrow_mut();
        *started += 1;
        Box::new(ScriptedSession {
            id: *started - 1,
            client: self.clone(),
        })
    }
}

impl ChatSession for ScriptedSession {
    fn send_message(&mut self, text: &str) -> Result<String, RemoteError> {
        self.client
            .sent
            .borrow_mut()
            .push((self.id, text.to_string()));
        if let Some(path) = self.client.unwritable_on_send.borrow_mut().take() {
            make_unwritable(&path);
        }
        self.client
            .replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("echo: {}", text)))
    }
}

/// A controller backed by a history file in a fresh temp directory.
/// Keep the returned `TempDir` alive for the duration of the test.
pub fn test_controller() -> (TempDir, ConversationController<ScriptedClient>, ScriptedClient) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let (controller, client) = reopen(&dir);
    (dir, controller, client)
}

/// Opens a new controller on the history file in `dir`, as a fresh
/// start of the program would.
pub fn reopen(dir: &TempDir) -> (ConversationController<ScriptedClient>, ScriptedClient) {
    let client = ScriptedClient::default();
    let controller = ConversationController::open(history_file(dir), client.clone())
        .expect("Failed to open controller");
    (controller, client)
}

pub fn history_file(dir: &TempDir) -> HistoryFile {
    HistoryFile::new(dir.path().join("chat_history.txt"))
}

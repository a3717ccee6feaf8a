use std::path::PathBuf;

use thiserror::Error;

/// Failures talking to the remote completion service. These never
/// abort a session, the controller turns them into an inline error
/// entry in the transcript.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Response contained no text ({reason})")]
    NoText { reason: String },
}

/// Failures reading or writing the chat history file.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Failed to read chat history {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Chat history {} is not valid: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write chat history {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to delete chat history {}: {source}", .path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("No conversation named '{0}'")]
    UnknownConversation(String),

    #[error("Conversation '{0}' already exists")]
    DuplicateConversation(String),
}

#[derive(Error, Debug)]
pub enum ChatError {
    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, ChatError>;

pub mod client;
pub mod core;
pub mod history;
pub mod models;

pub use self::client::{BoxedChatSession, ChatSession, CompletionClient};
pub use self::core::{ConversationController, Entry, SendOutcome, State, View};
pub use self::history::HistoryFile;
pub use self::models::{ConversationStore, Speaker, Turn};

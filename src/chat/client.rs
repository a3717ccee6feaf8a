use super::models::{Speaker, Turn};
use crate::core::RemoteError;

/// A conversation with the remote model. The session holds on to the
/// context of earlier exchanges so only the new message is passed
/// in.
pub trait ChatSession {
    fn send_message(&mut self, text: &str) -> Result<String, RemoteError>;
}

pub type BoxedChatSession = Box<dyn ChatSession>;

/// Opens remote chat sessions, one per local conversation.
pub trait CompletionClient {
    /// Starts a session that already knows about `history`.
    fn start_chat(&self, history: &[Turn]) -> BoxedChatSession;
}

/// The exchanges in `history` worth replaying to the remote model: a
/// user turn followed by the assistant's reply. User turns that never
/// got a reply are dropped.
pub fn completed_exchanges(history: &[Turn]) -> Vec<(&Turn, &Turn)> {
    history
        .windows(2)
        .filter_map(|pair| match pair {
            [user, reply]
                if user.speaker() == Speaker::User && reply.speaker() == Speaker::Assistant =>
            {
                Some((user, reply))
            }
            _ => None,
        })
        .collect()
}

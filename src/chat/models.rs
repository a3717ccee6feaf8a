//! The core models for a set of named conversations with an LLM.
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::StoreError;

const ID_PREFIX: &str = "Chat ";

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Speaker {
    #[serde(rename = "You")]
    User,
    #[serde(rename = "RootGPT")]
    Assistant,
}

impl Speaker {
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::User => "You",
            Speaker::Assistant => "RootGPT",
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One message in a transcript. Stored on disk as a two element
/// array `[speaker, text]`.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(from = "(Speaker, String)", into = "(Speaker, String)")]
pub struct Turn {
    speaker: Speaker,
    text: String,
}

impl Turn {
    pub fn new(speaker: Speaker, text: &str) -> Self {
        Turn {
            speaker,
            text: text.to_string(),
        }
    }

    pub fn user(text: &str) -> Self {
        Self::new(Speaker::User, text)
    }

    pub fn assistant(text: &str) -> Self {
        Self::new(Speaker::Assistant, text)
    }

    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl From<(Speaker, String)> for Turn {
    fn from((speaker, text): (Speaker, String)) -> Self {
        Turn { speaker, text }
    }
}

impl From<Turn> for (Speaker, String) {
    fn from(turn: Turn) -> Self {
        (turn.speaker, turn.text)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Conversation {
    id: String,
    turns: Vec<Turn>,
}

/// All conversations in creation order plus the active selection.
///
/// Identifiers come from a counter that only moves forward so an
/// identifier is never handed out twice, even if the number of
/// conversations shrinks.
#[derive(Clone, Debug, Default)]
pub struct ConversationStore {
    conversations: Vec<Conversation>,
    active: Option<String>,
    counter: u64,
}

impl PartialEq for ConversationStore {
    // The active pointer and counter are process state, only the
    // transcripts make up the identity of a store.
    fn eq(&self, other: &Self) -> bool {
        self.conversations == other.conversations
    }
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Adds an empty conversation and makes it the active one.
    pub fn create(&mut self, id: &str) -> Result<(), StoreError> {
        if self.contains(id) {
            return Err(StoreError::DuplicateConversation(id.to_string()));
        }
        self.conversations.push(Conversation {
            id: id.to_string(),
            turns: Vec::new(),
        });
        self.active = Some(id.to_string());
        Ok(())
    }

    pub fn append(&mut self, id: &str, turn: Turn) -> Result<(), StoreError> {
        let conversation = self
            .find_mut(id)
            .ok_or_else(|| StoreError::UnknownConversation(id.to_string()))?;
        conversation.turns.push(turn);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&[Turn], StoreError> {
        self.find(id)
            .map(|c| c.turns.as_slice())
            .ok_or_else(|| StoreError::UnknownConversation(id.to_string()))
    }

    pub fn set_active(&mut self, id: &str) -> Result<(), StoreError> {
        if !self.contains(id) {
            return Err(StoreError::UnknownConversation(id.to_string()));
        }
        self.active = Some(id.to_string());
        Ok(())
    }

    pub fn get_active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Hands out the next unused `Chat N` identifier.
    pub fn next_identifier(&mut self) -> String {
        loop {
            self.counter = match self.counter.checked_add(1) {
                Some(n) => n,
                // A loaded `Chat 18446744073709551615` exhausts the
                // numbering, so start over from the lowest free number
                None => (1u64..)
                    .find(|n| !self.contains(&format!("{}{}", ID_PREFIX, n)))
                    .unwrap_or(1),
            };
            let id = format!("{}{}", ID_PREFIX, self.counter);
            if !self.contains(&id) {
                return id;
            }
        }
    }

    /// Identifiers in creation order.
    pub fn identifiers(&self) -> Vec<String> {
        self.conversations.iter().map(|c| c.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    // Pick up numbering after whatever was loaded so new identifiers
    // don't collide with existing ones.
    fn resume_counter(&mut self) {
        let highest = self
            .conversations
            .iter()
            .filter_map(|c| c.id.strip_prefix(ID_PREFIX))
            .filter_map(|n| n.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        self.counter = highest.max(self.conversations.len() as u64);
    }
}

impl Serialize for ConversationStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.conversations.len()))?;
        for c in &self.conversations {
            map.serialize_entry(&c.id, &c.turns)?;
        }
        map.end()
    }
}

struct StoreVisitor;

impl<'de> Visitor<'de> for StoreVisitor {
    type Value = ConversationStore;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of conversation names to lists of [speaker, text] pairs")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut store = ConversationStore::new();
        while let Some((id, turns)) = access.next_entry::<String, Vec<Turn>>()? {
            if store.contains(&id) {
                return Err(de::Error::custom(format!("duplicate conversation '{}'", id)));
            }
            store.conversations.push(Conversation { id, turns });
        }
        store.resume_counter();
        Ok(store)
    }
}

impl<'de> Deserialize<'de> for ConversationStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(StoreVisitor)
    }
}

pub mod chat;
pub mod core;

pub use self::chat::{GeminiChatSession, GeminiClient};
pub use self::core::{Content, GenerationConfig, Part, Role, generate_content};

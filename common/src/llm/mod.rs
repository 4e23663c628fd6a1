pub mod groq;
pub mod model;

pub use groq::GroqClient;
pub use model::{complete_within, ChatModel, Message, MessageRole};

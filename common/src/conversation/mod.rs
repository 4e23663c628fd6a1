pub mod state;
pub mod store;

pub use state::ConversationState;
pub use store::{spawn_eviction, SessionStore, SharedConversation, DEFAULT_SESSION};

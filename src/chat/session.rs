use tokio::sync::{Mutex, RwLock};

use super::conversation::{Conversation, Turn};

/// One user's chat: the transcript plus the gate that keeps a single chat
/// call in flight.
pub struct ChatSession {
    id: String,
    pub(crate) conversation: RwLock<Conversation>,
    pub(crate) reply_gate: Mutex<()>,
}

impl ChatSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            conversation: RwLock::new(Conversation::new()),
            reply_gate: Mutex::new(()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Snapshot of the transcript.
    pub async fn turns(&self) -> Vec<Turn> {
        self.conversation.read().await.turns().to_vec()
    }

    pub async fn awaiting_reply(&self) -> bool {
        self.conversation.read().await.awaiting_reply()
    }
}

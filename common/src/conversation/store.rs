use crate::conversation::state::ConversationState;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// session used when a request carries no identifier
pub const DEFAULT_SESSION: &str = "default";

pub type SharedConversation = Arc<Mutex<ConversationState>>;

struct SessionEntry {
    state: SharedConversation,
    last_used: Instant,
}

/// Conversation state keyed by session id.
///
/// Sessions are created on first use and dropped by [`SessionStore::evict_idle`]
/// once they have been idle for longer than the configured timeout. A session
/// whose state is still held by a request is never dropped. Each
/// session has its own lock, so two requests in the same session run one
/// after the other while different sessions proceed independently.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionEntry>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// fetch the session, creating it if needed, and mark it as used
    pub async fn session(&self, id: &str) -> SharedConversation {
        let mut sessions = self.sessions.lock().await;
        let entry = sessions.entry(id.to_string()).or_insert_with(|| {
            tracing::debug!(session = %id, "creating conversation session");
            SessionEntry {
                state: Arc::new(Mutex::new(ConversationState::new())),
                last_used: Instant::now(),
            }
        });
        entry.last_used = Instant::now();
        Arc::clone(&entry.state)
    }

    /// drop sessions idle for longer than the timeout, returns how many were removed
    pub async fn evict_idle(&self) -> usize {
        self.evict_idle_at(Instant::now()).await
    }

    async fn evict_idle_at(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|id, entry| {
            // a request still holds it; idle time restarts once it lets go
            if Arc::strong_count(&entry.state) > 1 {
                entry.last_used = now;
                return true;
            }
            let keep = now.saturating_duration_since(entry.last_used) < self.idle_timeout;
            if !keep {
                tracing::debug!(session = %id, "evicting idle conversation session");
            }
            keep
        });
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

/// Periodically evict idle sessions until the returned handle is aborted.
pub fn spawn_eviction(store: Arc<SessionStore>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let removed = store.evict_idle().await;
            if removed > 0 {
                let remaining = store.len().await;
                tracing::info!(removed, remaining, "evicted idle conversation sessions");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new(Duration::from_secs(60));

        store.session("a").await.lock().await.append("runs by Kohli");
        store.session("b").await.lock().await.append("wickets by Bumrah");

        let a = store.session("a").await.lock().await.snapshot();
        let b = store.session("b").await.lock().await.snapshot();

        assert_eq!(a.len(), 1);
        assert_eq!(a[0].content, "runs by Kohli");
        assert_eq!(b.len(), 1);
        assert_eq!(b[0].content, "wickets by Bumrah");
    }

    #[tokio::test]
    async fn test_same_id_returns_same_state() {
        let store = SessionStore::new(Duration::from_secs(60));
        let first = store.session(DEFAULT_SESSION).await;
        let second = store.session(DEFAULT_SESSION).await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_evicts_only_idle_sessions() {
        let store = SessionStore::new(Duration::from_secs(60));
        store.session("old").await;
        store.session("fresh").await;

        {
            let mut sessions = store.sessions.lock().await;
            if let Some(entry) = sessions.get_mut("old") {
                entry.last_used = Instant::now() - Duration::from_secs(120);
            }
        }

        let removed = store.evict_idle().await;
        assert_eq!(removed, 1);

        let sessions = store.sessions.lock().await;
        assert!(sessions.contains_key("fresh"));
        assert!(!sessions.contains_key("old"));
    }

    #[tokio::test]
    async fn test_evicted_session_starts_empty() {
        let store = SessionStore::new(Duration::from_secs(60));
        store.session("s").await.lock().await.append("hello");

        let later = Instant::now() + Duration::from_secs(61);
        assert_eq!(store.evict_idle_at(later).await, 1);

        assert!(store.session("s").await.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_session_in_use_survives_eviction() {
        let store = SessionStore::new(Duration::from_secs(60));
        let held = store.session("slow").await;
        held.lock().await.append("longest partnership");

        let later = Instant::now() + Duration::from_secs(120);
        assert_eq!(store.evict_idle_at(later).await, 0);

        drop(held);
        assert_eq!(store.evict_idle_at(later + Duration::from_secs(30)).await, 0);
        assert_eq!(store.evict_idle_at(later + Duration::from_secs(61)).await, 1);
    }

    #[tokio::test]
    async fn test_spawned_sweeper_evicts_idle_sessions() {
        let store = Arc::new(SessionStore::new(Duration::from_millis(20)));
        store.session("a").await;
        store.session("b").await;

        let sweeper = spawn_eviction(Arc::clone(&store), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(100)).await;
        sweeper.abort();

        assert_eq!(store.len().await, 0);
    }
}

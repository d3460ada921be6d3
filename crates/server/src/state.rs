use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::worker::ChatWorker;
use chat::ChatSession;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// One open conversation.
///
/// The chat log is locked for the whole turn so two messages to the same
/// session cannot interleave.
#[derive(Debug)]
pub struct SessionSlot {
    pub chat: Mutex<ChatSession>,
    /// Milliseconds since [`ServerState`] was created.
    last_used_ms: AtomicU64,
}

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Open conversations by id
    pub sessions: Arc<DashMap<String, Arc<SessionSlot>>>,

    /// Owner of the router and models
    pub worker: ChatWorker,

    epoch: Instant,
}

impl ServerState {
    pub fn new(config: ServerConfig, worker: ChatWorker) -> Self {
        Self {
            config: Arc::new(config),
            sessions: Arc::new(DashMap::new()),
            worker,
            epoch: Instant::now(),
        }
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Open a new session holding only the greeting.
    pub fn create_session(&self) -> (String, ChatSession) {
        let id = uuid::Uuid::new_v4().to_string();
        let session = ChatSession::new(self.config.chat.greeting.clone());
        let slot = SessionSlot {
            chat: Mutex::new(session.clone()),
            last_used_ms: AtomicU64::new(self.now_ms()),
        };
        self.sessions.insert(id.clone(), Arc::new(slot));
        tracing::info!(session_id = %id, open = self.sessions.len(), "session_created");
        (id, session)
    }

    /// Look up a session and mark it as used.
    pub fn session(&self, id: &str) -> ServerResult<Arc<SessionSlot>> {
        let slot = self
            .sessions
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ServerError::SessionNotFound(id.to_string()))?;
        slot.last_used_ms.store(self.now_ms(), Ordering::Relaxed);
        Ok(slot)
    }

    /// Drop sessions unused for at least `idle`. A session whose turn is
    /// still running is kept. Returns how many were removed.
    pub fn evict_idle(&self, idle: Duration) -> usize {
        let now = self.now_ms();
        let idle_ms = idle.as_millis() as u64;
        let before = self.sessions.len();
        self.sessions.retain(|_, slot| {
            let unused = now.saturating_sub(slot.last_used_ms.load(Ordering::Relaxed));
            unused < idle_ms || slot.chat.try_lock().is_err()
        });
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            tracing::info!(evicted, open = self.sessions.len(), "sessions_evicted");
        }
        evicted
    }

    /// Periodically evict idle sessions, per `session_idle_secs` and
    /// `session_sweep_secs`.
    pub fn spawn_session_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let state = Arc::clone(self);
        tokio::spawn(async move {
            let idle = state.config.session_idle();
            let mut ticker = tokio::time::interval(state.config.session_sweep());
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                state.evict_idle(idle);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat::{Answerer, ChatConfig, ChatError, ChatRouter, Generator};

    struct Echo;

    impl Answerer for Echo {
        fn answer(&self, question: &str, _context: &str) -> Result<String, ChatError> {
            Ok(question.to_string())
        }
    }

    impl Generator for Echo {
        fn generate(&self, prompt: &str) -> Result<String, ChatError> {
            Ok(prompt.to_string())
        }
    }

    fn state() -> ServerState {
        let worker = ChatWorker::spawn(|| {
            Ok(ChatRouter::new(
                "ctx",
                Box::new(Echo),
                Box::new(Echo),
                ChatConfig::default(),
            ))
        })
        .unwrap();
        ServerState::new(ServerConfig::default(), worker)
    }

    #[test]
    fn idle_sessions_are_evicted() {
        let state = state();
        let (id, _) = state.create_session();

        assert_eq!(state.evict_idle(Duration::from_secs(3600)), 0);
        assert!(state.session(&id).is_ok());

        assert_eq!(state.evict_idle(Duration::ZERO), 1);
        assert!(matches!(
            state.session(&id),
            Err(ServerError::SessionNotFound(_))
        ));
    }

    #[test]
    fn locked_session_survives_eviction() {
        let state = state();
        let (id, _) = state.create_session();
        let slot = state.session(&id).unwrap();
        let _guard = slot.chat.try_lock().unwrap();

        assert_eq!(state.evict_idle(Duration::ZERO), 0);
        assert_eq!(state.sessions.len(), 1);
    }
}

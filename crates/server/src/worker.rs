//! Dedicated thread that owns the chat router.
//!
//! ONNX sessions are neither `Send` nor cheap, so the router is built on its
//! own OS thread and never leaves it. Requests arrive over a channel and are
//! handled one at a time, in arrival order.

use chat::{ChatError, ChatRouter, ChatSession};
use std::sync::mpsc as std_mpsc;
use std::thread;
use tokio::sync::{mpsc, oneshot};

use crate::error::{ServerError, ServerResult};

/// Pending requests beyond this make senders wait.
const QUEUE_DEPTH: usize = 64;

/// Result of one chat turn: the updated session and the reply, if any.
#[derive(Debug)]
pub struct Turn {
    pub session: ChatSession,
    pub reply: Option<String>,
}

struct Job {
    session: ChatSession,
    prompt: String,
    reply_to: oneshot::Sender<Turn>,
}

/// Cloneable handle to the worker thread.
#[derive(Clone, Debug)]
pub struct ChatWorker {
    tx: mpsc::Sender<Job>,
}

impl ChatWorker {
    /// Start the worker and wait until `build` has produced a router and both
    /// models have loaded. Any failure there is returned and the thread exits.
    ///
    /// Blocks the calling thread; from async code run it under
    /// `spawn_blocking`.
    pub fn spawn<F>(build: F) -> ServerResult<Self>
    where
        F: FnOnce() -> Result<ChatRouter, ChatError> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<Job>(QUEUE_DEPTH);
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<(), ChatError>>();

        thread::Builder::new()
            .name("chat-worker".into())
            .spawn(move || {
                let router = match build().and_then(|r| r.warm_up().map(|()| r)) {
                    Ok(router) => {
                        let _ = ready_tx.send(Ok(()));
                        router
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };

                while let Some(job) = rx.blocking_recv() {
                    let Job {
                        mut session,
                        prompt,
                        reply_to,
                    } = job;
                    let reply = router.handle(&mut session, &prompt);
                    // Receiver gone means the request was cancelled; drop the turn.
                    let _ = reply_to.send(Turn { session, reply });
                }
                tracing::info!("chat_worker_stopped");
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self { tx }),
            Ok(Err(err)) => Err(ServerError::Chat(err)),
            Err(_) => Err(ServerError::WorkerUnavailable),
        }
    }

    /// Run one turn of `session` with `prompt` on the worker.
    pub async fn turn(&self, session: ChatSession, prompt: String) -> ServerResult<Turn> {
        let (reply_to, reply) = oneshot::channel();
        self.tx
            .send(Job {
                session,
                prompt,
                reply_to,
            })
            .await
            .map_err(|_| ServerError::WorkerUnavailable)?;
        reply.await.map_err(|_| ServerError::WorkerUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat::{Answerer, ChatConfig, Generator};

    struct Upper;

    impl Answerer for Upper {
        fn answer(&self, question: &str, _context: &str) -> Result<String, ChatError> {
            Ok(question.to_uppercase())
        }
    }

    impl Generator for Upper {
        fn generate(&self, prompt: &str) -> Result<String, ChatError> {
            Ok(prompt.to_uppercase())
        }
    }

    struct Broken;

    impl Answerer for Broken {
        fn answer(&self, _: &str, _: &str) -> Result<String, ChatError> {
            Err(ChatError::NoAnswer)
        }

        fn warm_up(&self) -> Result<(), ChatError> {
            Err(ChatError::Inference("weights missing".into()))
        }
    }

    #[tokio::test]
    async fn turn_runs_on_worker() {
        let worker = tokio::task::spawn_blocking(|| {
            ChatWorker::spawn(|| {
                Ok(ChatRouter::new(
                    "context",
                    Box::new(Upper),
                    Box::new(Upper),
                    ChatConfig::default(),
                ))
            })
        })
        .await
        .unwrap()
        .unwrap();

        let session = ChatSession::new("hi");
        let turn = worker.turn(session, "ping".into()).await.unwrap();
        assert_eq!(turn.reply.as_deref(), Some("PING"));
        assert_eq!(turn.session.messages().len(), 3);
    }

    #[test]
    fn warm_up_failure_is_fatal() {
        let err = ChatWorker::spawn(|| {
            Ok(ChatRouter::new(
                "",
                Box::new(Broken),
                Box::new(Upper),
                ChatConfig::default(),
            ))
        })
        .unwrap_err();
        assert!(matches!(err, ServerError::Chat(ChatError::Inference(_))));
    }
}

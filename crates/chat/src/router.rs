use std::time::Instant;

use tracing::{debug, info, warn};

use crate::{ChatConfig, ChatError, ChatSession};

/// Extractive question answering over a block of text.
pub trait Answerer {
    /// The span of `context` that best answers `question`.
    fn answer(&self, question: &str, context: &str) -> Result<String, ChatError>;

    /// Load whatever the answerer needs up front. No-op by default.
    fn warm_up(&self) -> Result<(), ChatError> {
        Ok(())
    }
}

/// Open-ended text continuation.
pub trait Generator {
    fn generate(&self, prompt: &str) -> Result<String, ChatError>;

    fn warm_up(&self) -> Result<(), ChatError> {
        Ok(())
    }
}

/// Which path produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    HealthTip,
    Answer,
    Generate,
}

impl Route {
    fn as_str(self) -> &'static str {
        match self {
            Route::HealthTip => "health_tip",
            Route::Answer => "answer",
            Route::Generate => "generate",
        }
    }
}

/// Picks one of three responders per message.
///
/// The QA context is fixed for the router's lifetime; an empty (or
/// whitespace-only) context sends everything that isn't a health-tip request
/// to the generator.
pub struct ChatRouter {
    context: String,
    answerer: Box<dyn Answerer>,
    generator: Box<dyn Generator>,
    cfg: ChatConfig,
}

impl ChatRouter {
    pub fn new(
        context: impl Into<String>,
        answerer: Box<dyn Answerer>,
        generator: Box<dyn Generator>,
        cfg: ChatConfig,
    ) -> Self {
        Self {
            context: context.into(),
            answerer,
            generator,
            cfg,
        }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.cfg
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    /// Force both models to load. A failure here means the bot cannot run.
    pub fn warm_up(&self) -> Result<(), ChatError> {
        self.answerer.warm_up()?;
        self.generator.warm_up()?;
        info!(context_chars = self.context.len(), "chat_router_ready");
        Ok(())
    }

    pub fn route(&self, input: &str) -> Route {
        let keyword = self.cfg.health_tip_keyword.to_lowercase();
        if input.to_lowercase().contains(&keyword) {
            Route::HealthTip
        } else if !self.context.trim().is_empty() {
            Route::Answer
        } else {
            Route::Generate
        }
    }

    /// Reply to one message. Never fails: errors are turned into an apology.
    pub fn respond(&self, input: &str) -> String {
        let start = Instant::now();
        let route = self.route(input);
        let outcome = match route {
            Route::HealthTip => Ok(self.cfg.health_tip.clone()),
            Route::Answer => self.answerer.answer(input, &self.context),
            Route::Generate => self.generator.generate(input),
        };

        match outcome {
            Ok(reply) => {
                info!(
                    route = route.as_str(),
                    reply_chars = reply.len(),
                    elapsed_micros = start.elapsed().as_micros(),
                    "chat_reply"
                );
                reply
            }
            Err(err) => {
                warn!(route = route.as_str(), error = %err, "chat_reply_failure");
                format!("I apologize, but I encountered an error: {err}")
            }
        }
    }

    /// Record `prompt` in `session` and, if the session is waiting on the
    /// assistant, reply and record that too.
    pub fn handle(&self, session: &mut ChatSession, prompt: &str) -> Option<String> {
        session.push_user(prompt);
        if !session.needs_reply() {
            debug!("chat_no_reply_needed");
            return None;
        }
        let reply = self.respond(prompt);
        session.push_assistant(reply.clone());
        Some(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChatMessage, Role};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every call and returns a fixed reply (or error).
    #[derive(Clone, Default)]
    struct Probe {
        calls: Rc<RefCell<Vec<String>>>,
        fail: bool,
    }

    impl Answerer for Probe {
        fn answer(&self, question: &str, context: &str) -> Result<String, ChatError> {
            self.calls.borrow_mut().push(format!("qa:{question}"));
            if self.fail {
                return Err(ChatError::NoAnswer);
            }
            Ok(format!("from {} chars", context.len()))
        }
    }

    impl Generator for Probe {
        fn generate(&self, prompt: &str) -> Result<String, ChatError> {
            self.calls.borrow_mut().push(format!("gen:{prompt}"));
            if self.fail {
                return Err(ChatError::Inference("oom".into()));
            }
            Ok(format!("{prompt} and so on"))
        }
    }

    fn router(context: &str, probe: &Probe) -> ChatRouter {
        ChatRouter::new(
            context,
            Box::new(probe.clone()),
            Box::new(probe.clone()),
            ChatConfig::default(),
        )
    }

    #[test]
    fn health_tip_is_case_insensitive_and_skips_models() {
        let probe = Probe::default();
        let bot = router("some context", &probe);
        let reply = bot.respond("Give me a HEALTH Tip please");
        assert_eq!(
            reply,
            "A healthy diet and regular exercise are important for maintaining good health."
        );
        assert!(probe.calls.borrow().is_empty());
    }

    #[test]
    fn non_empty_context_goes_to_answerer() {
        let probe = Probe::default();
        let bot = router("abcd", &probe);
        assert_eq!(bot.respond("what?"), "from 4 chars");
        assert_eq!(probe.calls.borrow().as_slice(), ["qa:what?"]);
    }

    #[test]
    fn whitespace_context_goes_to_generator() {
        let probe = Probe::default();
        let bot = router(" \n\t ", &probe);
        assert_eq!(bot.route("hello"), Route::Generate);
        assert_eq!(bot.respond("hello"), "hello and so on");
    }

    #[test]
    fn errors_become_apologies() {
        let probe = Probe {
            fail: true,
            ..Default::default()
        };
        assert_eq!(
            router("ctx", &probe).respond("q"),
            "I apologize, but I encountered an error: no answer found"
        );
        assert_eq!(
            router("", &probe).respond("q"),
            "I apologize, but I encountered an error: inference failure: oom"
        );
    }

    #[test]
    fn handle_appends_user_and_reply() {
        let probe = Probe::default();
        let bot = router("", &probe);
        let mut session = ChatSession::new(bot.config().greeting.clone());

        let reply = bot.handle(&mut session, "tell me");
        assert_eq!(reply.as_deref(), Some("tell me and so on"));

        let roles: Vec<Role> = session.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::Assistant, Role::User, Role::Assistant]);
        assert_eq!(
            session.messages()[2],
            ChatMessage::assistant("tell me and so on")
        );
    }
}

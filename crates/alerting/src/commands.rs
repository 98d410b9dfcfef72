//! Command dispatch table for inbound chat messages.

use std::collections::HashMap;

use common::Error;

pub const GREETING: &str = "Hi 👋! The bot is up and running ✅";

/// What to send back for one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Matched command name (`/start`), `None` for an echo.
    pub command: Option<String>,
    pub text: String,
}

/// Fixed replies keyed by command name. Each name can be registered once.
#[derive(Debug, Clone, Default)]
pub struct CommandRouter {
    handlers: HashMap<String, String>,
    echo_unknown: bool,
}

impl CommandRouter {
    pub fn new(echo_unknown: bool) -> Self {
        Self {
            handlers: HashMap::new(),
            echo_unknown,
        }
    }

    /// `/start` and `/help` answer with the greeting.
    pub fn with_defaults(echo_unknown: bool) -> Self {
        let mut router = Self::new(echo_unknown);
        for name in ["/start", "/help"] {
            router.handlers.insert(name.to_string(), GREETING.to_string());
        }
        router
    }

    pub fn register(&mut self, name: &str, reply: impl Into<String>) -> Result<(), Error> {
        let key = normalize(name);
        if self.handlers.contains_key(&key) {
            return Err(Error::DuplicateCommand(key));
        }
        self.handlers.insert(key, reply.into());
        Ok(())
    }

    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Route a message text. `None` means stay silent. Echo mode only
    /// answers plain text; unknown commands are ignored.
    pub fn route(&self, text: &str) -> Option<Reply> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        if trimmed.starts_with('/') {
            let head = trimmed.split_whitespace().next().unwrap_or(trimmed);
            // `/start@SomeBot` in group chats.
            let name = head.split('@').next().unwrap_or(head);
            return self.handlers.get(name).map(|reply| Reply {
                command: Some(name.to_string()),
                text: reply.clone(),
            });
        }

        self.echo_unknown.then(|| Reply {
            command: None,
            text: text.to_string(),
        })
    }
}

fn normalize(name: &str) -> String {
    let name = name.trim();
    if name.starts_with('/') {
        name.to_string()
    } else {
        format!("/{name}")
    }
}

use std::time::Duration;

use crossterm::event::KeyCode;
use serde_json::Value;

/// Inputs an app wants to receive, declared once via `subscriptions()`.
pub enum Subscription<Msg> {
    /// A specific key maps to a message; the description feeds help output.
    Keyboard {
        key: KeyCode,
        msg: Msg,
        description: String,
    },

    /// Periodic timer events
    Timer { interval: Duration, msg: Msg },

    /// Events published on the shared bus; the handler turns a payload into
    /// a message (or ignores it with `None`).
    Topic {
        topic: String,
        handler: Box<dyn Fn(&Value) -> Option<Msg> + Send>,
    },
}

impl<Msg> Subscription<Msg> {
    pub fn keyboard(key: KeyCode, description: impl Into<String>, msg: Msg) -> Self {
        Subscription::Keyboard {
            key,
            msg,
            description: description.into(),
        }
    }

    pub fn timer(interval: Duration, msg: Msg) -> Self {
        Subscription::Timer { interval, msg }
    }

    pub fn topic<F>(topic: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Value) -> Option<Msg> + Send + 'static,
    {
        Subscription::Topic {
            topic: topic.into(),
            handler: Box::new(handler),
        }
    }
}

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

/// Screens the host can switch between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppId {
    Loading,
    Reader,
}

/// Side effects an app asks the runtime to perform, returned from `update()`.
pub enum Command<Msg> {
    /// Do nothing
    None,

    /// Execute multiple commands in sequence
    Batch(Vec<Command<Msg>>),

    /// Perform an async operation and feed the result back as a message
    Perform(Pin<Box<dyn Future<Output = Msg> + Send>>),

    /// Publish an event on the shared bus
    Publish { topic: String, data: Value },

    /// Hand control to another screen
    Navigate(AppId),

    /// Quit the application
    Quit,
}

impl<Msg> Command<Msg> {
    /// Helper to run an async operation and map its output to a message.
    pub fn perform<F, T>(future: F, to_msg: impl Fn(T) -> Msg + Send + Sync + 'static) -> Self
    where
        F: Future<Output = T> + Send + 'static,
        Msg: Send + 'static,
    {
        Command::Perform(Box::pin(async move { to_msg(future.await) }))
    }

    pub fn publish<T: serde::Serialize>(topic: impl Into<String>, data: T) -> Self {
        Command::Publish {
            topic: topic.into(),
            data: serde_json::to_value(data).unwrap_or(Value::Null),
        }
    }

    pub fn batch(commands: Vec<Command<Msg>>) -> Self {
        Command::Batch(commands)
    }

    pub fn navigate(app_id: AppId) -> Self {
        Command::Navigate(app_id)
    }
}

impl<Msg> Default for Command<Msg> {
    fn default() -> Self {
        Command::None
    }
}

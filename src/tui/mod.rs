//! Elm-style terminal front-end: apps declare state, messages, commands and
//! subscriptions; runtimes execute them; the host switches screens.

pub mod app;
pub mod apps;
pub mod command;
pub mod host;
pub mod runtime;
pub mod subscription;
pub mod theme;

pub use app::{App, AppContext};
pub use command::{AppId, Command};
pub use host::AppHost;
pub use runtime::Runtime;
pub use subscription::Subscription;
pub use theme::{Theme, ThemeVariant};

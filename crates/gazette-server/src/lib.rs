//! Watch mode for gazette.
//!
//! Watches content and template sources, reruns the build tasks their changes
//! trigger, and tells connected browsers to reload over a WebSocket.

pub mod reload;
pub mod rules;
pub mod server;
pub mod watcher;

pub use reload::{ReloadHub, ReloadMessage};
pub use rules::{WatchRule, WatchRules};
pub use server::{DevServer, DevServerConfig, ServerError};
pub use watcher::{FileWatcher, WatchEvent};

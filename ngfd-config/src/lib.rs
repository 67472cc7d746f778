//! Configuration file parsing for the feedback daemon: event definitions,
//! the daemon's required plugin list, and per-plugin parameter files. This
//! crate has no knowledge of dispatch — see `ngfd-core` — it only turns
//! files on disk into the data structures `ngfd-core` consumes.

pub mod error;
pub mod events;
pub mod paths;
pub mod plugins;

pub use error::ConfigError;
pub use events::load_events_dir;
pub use paths::ConfigPaths;
pub use plugins::{load_plugin_list, load_plugin_params};

//! Request dispatcher, event resolution and plugin contracts for the
//! feedback daemon. This crate has no knowledge of configuration file
//! formats or concrete sink/input implementations — see `ngfd-config` and
//! `ngfd-plugins` — it only defines the dispatch machinery and the traits
//! plugins implement against.

pub mod context;
pub mod core;
pub mod error;
pub mod event;
pub mod hook;
pub mod input;
pub mod plugin;
pub mod proplist;
pub mod request;
pub mod sink;
pub mod value;

pub use context::{Context, SubscriberId};
pub use core::{Core, CoreHandle};
pub use error::CoreError;
pub use event::{Event, EventCatalog};
pub use hook::{Hook, HookBus, HookId, HookPayload, SinkCandidate};
pub use input::Input;
pub use plugin::{Plugin, PluginRegistrar};
pub use proplist::PropList;
pub use request::{Request, RequestId};
pub use sink::{Sink, SinkRegistration};
pub use value::Value;

//! Concrete sinks, inputs and hook plugins bundled with the daemon. None
//! of this drives real hardware, but each type here follows the exact
//! contract a GStreamer/Immersion/MCE-backed implementation would.

pub mod builtin;
pub mod log_sink;
pub mod stdin_input;
pub mod timer_sink;
pub mod transform;

pub use builtin::BuiltinPlugin;
pub use log_sink::LogSink;
pub use stdin_input::StdinInput;
pub use timer_sink::TimerSink;
pub use transform::TransformPlugin;

/// Resolves a configured plugin name (from `ngfd.yaml`'s `plugins` list) to
/// its statically linked implementation. `ngfd`'s own `PLUGIN_PATH`-based
/// dynamic loading is out of scope here — see `DESIGN.md` — every plugin
/// this daemon can load is one of these.
pub fn builtin_plugin(name: &str) -> Option<Box<dyn ngfd_core::Plugin>> {
    match name {
        "transform" => Some(Box::new(TransformPlugin)),
        "builtin" => Some(Box::new(BuiltinPlugin)),
        _ => None,
    }
}

//! Bundles the demo sinks and the stdin input behind a single `Plugin` so
//! `ngfd.yaml` can just say `plugins: [transform, builtin]` and get a
//! runnable daemon without a real audio/haptic back-end.

use ngfd_core::{Plugin, PluginRegistrar, PropList};

use crate::log_sink::LogSink;
use crate::stdin_input::StdinInput;
use crate::timer_sink::TimerSink;

pub struct BuiltinPlugin;

impl Plugin for BuiltinPlugin {
    fn name(&self) -> &str {
        "builtin"
    }

    fn load(&self, registrar: &mut PluginRegistrar<'_>, _params: &PropList) -> bool {
        registrar.register_sink(Box::new(LogSink::new("audio")), 10).is_ok()
            && registrar.register_sink(Box::new(TimerSink::new("vibrator")), 0).is_ok()
            && registrar.register_input(Box::new(StdinInput)).is_ok()
    }
}

//! The plugin contract and the restricted view of [`Core`] plugins load
//! against. Ports the capability surface `n_core_initialize` hands each
//! plugin: register sinks, register inputs, connect hooks — nothing else.

use crate::core::Core;
use crate::error::CoreError;
use crate::hook::{Hook, HookId, HookPayload};
use crate::input::Input;
use crate::proplist::PropList;
use crate::sink::Sink;

/// A unit of deployable functionality: some combination of sinks, inputs
/// and hooks, configured from its own parameter file.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// Registers whatever this plugin provides against `registrar`.
    /// `params` is this plugin's own parameter file, already parsed.
    /// Returning `false` is a fatal boot error.
    fn load(&self, registrar: &mut PluginRegistrar<'_>, params: &PropList) -> bool;

    /// Called once at daemon shutdown, after every sink and input has
    /// already been shut down.
    fn unload(&self) {}
}

/// Handed to [`Plugin::load`]; the only way a plugin can reach the core.
pub struct PluginRegistrar<'a> {
    core: &'a mut Core,
}

impl<'a> PluginRegistrar<'a> {
    pub fn new(core: &'a mut Core) -> Self {
        Self { core }
    }

    pub fn register_sink(&mut self, sink: Box<dyn Sink>, priority: i32) -> Result<(), CoreError> {
        self.core.register_sink(sink, priority)
    }

    pub fn register_input(&mut self, input: Box<dyn Input>) -> Result<(), CoreError> {
        self.core.register_input(input)
    }

    pub fn connect_hook<F>(&mut self, hook: Hook, priority: i32, callback: F) -> HookId
    where
        F: Fn(&mut HookPayload) + Send + Sync + 'static,
    {
        self.core.hooks_mut().connect(hook, priority, callback)
    }

    pub fn disconnect_hook(&mut self, hook: Hook, id: HookId) {
        self.core.hooks_mut().disconnect(hook, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventCatalog;
    use crate::request::Request;

    struct NullInput;
    impl Input for NullInput {
        fn name(&self) -> &str {
            "null"
        }
    }

    struct NullSink;
    impl Sink for NullSink {
        fn name(&self) -> &str {
            "null"
        }
        fn play(&self, _request: &mut Request, _handle: &crate::core::CoreHandle) -> bool {
            true
        }
        fn stop(&self, _request: &mut Request) {}
    }

    struct DemoPlugin;
    impl Plugin for DemoPlugin {
        fn name(&self) -> &str {
            "demo"
        }

        fn load(&self, registrar: &mut PluginRegistrar<'_>, _params: &PropList) -> bool {
            registrar.register_sink(Box::new(NullSink), 0).is_ok()
                && registrar.register_input(Box::new(NullInput)).is_ok()
        }
    }

    #[test]
    fn plugin_load_registers_through_the_restricted_surface() {
        let mut core = Core::new(EventCatalog::new());
        let loaded = {
            let mut registrar = PluginRegistrar::new(&mut core);
            DemoPlugin.load(&mut registrar, &PropList::new())
        };
        assert!(loaded);
        assert!(core.start().is_ok());
    }
}

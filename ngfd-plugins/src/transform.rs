//! Restricts and renames incoming request properties before they reach
//! event resolution. Ports `plugins/transform/plugin.c`.
//!
//! Configuration (plugin parameter file):
//! - `allow`: space-separated list of property keys to let through, or the
//!   literal `"*"` to pass every key through untouched.
//! - `transform.<key>`: rename `<key>` to the given target name on its way
//!   through; the value under the original name is kept too, under
//!   `<target>.original`, so a later sink can still see what the caller
//!   actually asked for.

use tracing::debug;

use ngfd_core::{Hook, HookPayload, Plugin, PluginRegistrar, PropList};

const TRANSFORM_KEY_PREFIX: &str = "transform.";

pub struct TransformPlugin;

impl Plugin for TransformPlugin {
    fn name(&self) -> &str {
        "transform"
    }

    fn load(&self, registrar: &mut PluginRegistrar<'_>, params: &PropList) -> bool {
        let Some(allow) = params.get_string("allow") else {
            tracing::warn!("transform: no 'allow' key specified in plugin parameters");
            return false;
        };

        let allow_all = allow == "*";
        let allowed_keys: Vec<String> = if allow_all {
            Vec::new()
        } else {
            allow.split_whitespace().map(str::to_string).collect()
        };

        let mut key_map: Vec<(String, String)> = Vec::new();
        for (key, value) in params.iter() {
            if let Some(target) = key.strip_prefix(TRANSFORM_KEY_PREFIX) {
                if let Some(target_name) = value.as_str() {
                    key_map.push((target.to_string(), target_name.to_string()));
                }
            }
        }

        registrar.connect_hook(Hook::NewRequest, 0, move |payload| {
            let HookPayload::NewRequest { request } = payload else {
                return;
            };

            debug!(request = %request.name, "transforming request keys");

            if allow_all {
                return;
            }

            let mut new_props = PropList::new();
            for key in &allowed_keys {
                let Some(value) = request.properties.get(key).cloned() else {
                    continue;
                };

                if let Some((_, target)) = key_map.iter().find(|(k, _)| k == key) {
                    let original_key = format!("{target}.original");
                    if let Some(original) = request.properties.get(target).cloned() {
                        new_props.set(original_key, original);
                    }
                    debug!(from = %key, to = %target, "transforming key");
                    new_props.set(target.clone(), value);
                } else {
                    new_props.set(key.clone(), value);
                }
            }

            request.properties = new_props;
        });

        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use ngfd_core::{Core, Event, EventCatalog, Input, Request, Sink};

    use super::*;

    /// Captures the properties a request carries once it reaches `play`,
    /// i.e. after `TransformPlugin`'s `NEW_REQUEST` hook has already run.
    struct CapturingSink {
        seen: Arc<Mutex<Vec<PropList>>>,
    }

    impl Sink for CapturingSink {
        fn name(&self) -> &str {
            "capture"
        }

        fn play(&self, request: &mut Request, handle: &ngfd_core::CoreHandle) -> bool {
            self.seen.lock().unwrap().push(request.properties.clone());
            handle.complete_sink(request.id(), self.name());
            true
        }

        fn stop(&self, _request: &mut Request) {}
    }

    struct MuteInput;
    impl Input for MuteInput {
        fn name(&self) -> &str {
            "test"
        }
    }

    /// Builds a core with `TransformPlugin` loaded from `params`, a default
    /// `tone` event and a sink that records whatever properties survive to
    /// `play`, then runs `request_props` through it and returns what the
    /// sink observed.
    fn run_transform(params: PropList, request_props: PropList) -> PropList {
        let mut catalog = EventCatalog::new();
        catalog.add_event(Event::new("tone", PropList::new(), PropList::new()));

        let mut core = Core::new(catalog);
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let mut registrar = PluginRegistrar::new(&mut core);
            assert!(TransformPlugin.load(&mut registrar, &params));
        }
        core.register_sink(Box::new(CapturingSink { seen: seen.clone() }), 0)
            .unwrap();
        core.register_input(Box::new(MuteInput)).unwrap();
        core.start().unwrap();

        let handle = core.handle();
        handle.play_request("test", "tone", request_props);
        for _ in 0..10 {
            if core.pump() == 0 {
                break;
            }
        }

        seen.lock().unwrap().pop().expect("sink was never played")
    }

    #[test]
    fn passthrough_when_allow_is_wildcard() {
        let mut params = PropList::new();
        params.set("allow", "*");

        let mut props = PropList::new();
        props.set("sound.filename", "ring.wav");
        props.set("secret.internal", "should stay");

        let result = run_transform(params, props);
        assert_eq!(result.get_string("secret.internal"), Some("should stay"));
    }

    #[test]
    fn only_allowed_keys_survive_and_unlisted_keys_are_dropped() {
        let mut params = PropList::new();
        params.set("allow", "sound.filename vibrator.pattern");

        let mut props = PropList::new();
        props.set("sound.filename", "ring.wav");
        props.set("internal.secret", "drop me");

        let result = run_transform(params, props);
        assert_eq!(result.get_string("sound.filename"), Some("ring.wav"));
        assert_eq!(result.get_string("internal.secret"), None);
        assert_eq!(result.get_string("vibrator.pattern"), None);
    }

    #[test]
    fn remapped_keys_keep_the_original_value_alongside_the_target() {
        let mut params = PropList::new();
        params.set("allow", "sound.filename");
        params.set("transform.sound.filename", "audio.uri");

        let mut props = PropList::new();
        props.set("sound.filename", "ring.wav");
        props.set("audio.uri", "file:///default.wav");

        let result = run_transform(params, props);
        assert_eq!(result.get_string("audio.uri"), Some("ring.wav"));
        assert_eq!(result.get_string("audio.uri.original"), Some("file:///default.wav"));
    }
}

//! The sink interface: a capability-set polymorphic output driver.
//!
//! Ports `ngf/sinkinterface.c` + the `NSinkInterfaceDecl` function-pointer
//! table. `play` and `stop` are required; everything else is optional and
//! defaults to "accept/success/no-op".
//! Optional capabilities that also carry an asynchronous outcome
//! (`prepare`, `pause`) return `Option<bool>`: `None` means the capability
//! is absent (the original's null function pointer), `Some(_)` is the
//! result of actually calling it.

use crate::core::CoreHandle;
use crate::request::Request;

pub trait Sink: Send + Sync {
    /// Unique within a core instance.
    fn name(&self) -> &str;

    /// Called once at daemon startup. `false` is a fatal boot error.
    fn initialize(&self) -> bool {
        true
    }

    /// Called once at daemon shutdown.
    fn shutdown(&self) {}

    /// Absent (default `true`) means "always yes".
    fn can_handle(&self, _request: &Request) -> bool {
        true
    }

    /// `None`: no prepare capability — the core synchronizes this sink
    /// immediately without calling this method at all. `Some(true)`: the
    /// sink accepted the prepare and will call `handle.synchronize_sink`
    /// itself once ready (possibly from a worker thread, posted back
    /// through `handle`). `Some(false)`: prepare failed; the core
    /// synthesizes a `fail_sink` and aborts preparing the remaining sinks.
    fn prepare(&self, _request: &mut Request, _handle: &CoreHandle) -> Option<bool> {
        None
    }

    /// Called once the synchronization barrier is met for every sink in
    /// the request. Returning `false` fails the sink (and the request);
    /// remaining sinks in this pass are not played.
    fn play(&self, request: &mut Request, handle: &CoreHandle) -> bool;

    /// `None`: no pause capability, silently ignored. `Some(false)` is
    /// logged but never treated as a failure.
    fn pause(&self, _request: &mut Request) -> Option<bool> {
        None
    }

    /// Called exactly once per request during teardown, in registration
    /// order. Never interleaved with a later `play` for the same request.
    fn stop(&self, request: &mut Request);
}

/// A registered sink plus its resolved priority (defaults to registration
/// position via `core.sink_order`, set by the plugin loader at
/// registration time — see `ngfd-config`).
pub struct SinkRegistration {
    pub sink: Box<dyn Sink>,
    pub priority: i32,
}

impl SinkRegistration {
    pub fn new(sink: Box<dyn Sink>, priority: i32) -> Self {
        Self { sink, priority }
    }
}

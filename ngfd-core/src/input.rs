//! The input interface: a capability-set polymorphic request source.
//!
//! Inputs own the wire representation of incoming requests; they call
//! back into the core (`CoreHandle::play_request`/`pause_request`/
//! `stop_request`) however they see fit — typically from a worker thread
//! running their own protocol listener (D-Bus, a socket, ...).

use crate::core::CoreHandle;
use crate::request::Request;

pub trait Input: Send + Sync {
    fn name(&self) -> &str;

    /// Called once at daemon startup. `false` is a fatal boot error.
    /// Receives a handle to post new/paused/stopped requests back to the
    /// core from whatever thread this input runs on.
    fn initialize(&self, handle: CoreHandle) -> bool {
        let _ = handle;
        true
    }

    /// Called once at daemon shutdown.
    fn shutdown(&self) {}

    /// Exactly one of `send_reply`/`send_error` is called per request,
    /// exactly once, on teardown. Both are optional (absent ⇒ no-op).
    fn send_reply(&self, _request: &Request, _status: i32) {}

    fn send_error(&self, _request: &Request, _message: &str) {}
}

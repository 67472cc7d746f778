//! Named extension points invoked synchronously with a typed payload.
//!
//! Hooks fire in registration order *within* a priority tier, priority
//! ascending overall (lower priority value runs first), mirroring
//! `n_core_connect`'s `GList` insertion-sorted-by-priority. No hook may
//! call any core operation that would free the request it was handed —
//! hooks execute within the request-handling frame that fired them.

use crate::request::Request;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Hook {
    InitDone,
    NewRequest,
    TransformProperties,
    FilterSinks,
}

/// A candidate sink for `FilterSinks`, identified by its index into the
/// core's sink registry rather than by ownership — hook callbacks
/// reorder/drop entries in the `Vec`, the core maps the survivors back to
/// real sinks by index afterward.
#[derive(Clone, Debug)]
pub struct SinkCandidate {
    pub index: usize,
    pub name: String,
    pub priority: i32,
}

pub enum HookPayload<'a> {
    InitDone,
    NewRequest {
        request: &'a mut Request,
    },
    TransformProperties {
        request: &'a mut Request,
    },
    FilterSinks {
        request: &'a Request,
        sinks: &'a mut Vec<SinkCandidate>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HookId(u64);

type Callback = Box<dyn Fn(&mut HookPayload) + Send + Sync>;

struct Registration {
    id: HookId,
    priority: i32,
    callback: Callback,
}

#[derive(Default)]
pub struct HookBus {
    init_done: Vec<Registration>,
    new_request: Vec<Registration>,
    transform_properties: Vec<Registration>,
    filter_sinks: Vec<Registration>,
    next_id: u64,
}

impl HookBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket_mut(&mut self, hook: Hook) -> &mut Vec<Registration> {
        match hook {
            Hook::InitDone => &mut self.init_done,
            Hook::NewRequest => &mut self.new_request,
            Hook::TransformProperties => &mut self.transform_properties,
            Hook::FilterSinks => &mut self.filter_sinks,
        }
    }

    fn bucket(&self, hook: Hook) -> &Vec<Registration> {
        match hook {
            Hook::InitDone => &self.init_done,
            Hook::NewRequest => &self.new_request,
            Hook::TransformProperties => &self.transform_properties,
            Hook::FilterSinks => &self.filter_sinks,
        }
    }

    /// Registers `callback` on `hook` at `priority` (ascending — lower
    /// runs first). Ties preserve registration order (stable sort).
    pub fn connect<F>(&mut self, hook: Hook, priority: i32, callback: F) -> HookId
    where
        F: Fn(&mut HookPayload) + Send + Sync + 'static,
    {
        self.next_id += 1;
        let id = HookId(self.next_id);
        let bucket = self.bucket_mut(hook);
        bucket.push(Registration {
            id,
            priority,
            callback: Box::new(callback),
        });
        bucket.sort_by_key(|r| r.priority);
        id
    }

    pub fn disconnect(&mut self, hook: Hook, id: HookId) {
        self.bucket_mut(hook).retain(|r| r.id != id);
    }

    /// Fires every callback registered on `payload`'s hook, in order.
    pub fn fire(&self, hook: Hook, payload: &mut HookPayload) {
        for reg in self.bucket(hook) {
            (reg.callback)(payload);
        }
    }
}

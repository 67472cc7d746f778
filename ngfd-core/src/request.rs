//! The mutable per-request lifecycle object and its identity.

use std::any::Any;
use std::collections::HashMap;

use crate::event::Event;
use crate::proplist::PropList;

/// Identifies a [`Request`] for the lifetime of its handling by the core.
/// Never reused within a single core instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub(crate) u64);

/// A single unit of feedback: a name plus client properties, resolved
/// against the event catalog and then fanned out to sinks.
///
/// Owned by the core from acceptance until teardown. `data` is the keyed
/// extension slot sinks/plugins use to stash their own per-request state;
/// entries are typed via `Any` so each sink can store its own struct
/// without the core needing to know its shape, and a sink is expected to
/// remove (and drop) its own entry when it calls `stop`.
pub struct Request {
    pub(crate) id: RequestId,
    pub name: String,
    pub input_name: String,
    pub properties: PropList,
    pub event: Option<Event>,
    data: HashMap<String, Box<dyn Any + Send>>,
}

impl Request {
    pub(crate) fn new(id: RequestId, name: impl Into<String>, input_name: impl Into<String>, properties: PropList) -> Self {
        Self {
            id,
            name: name.into(),
            input_name: input_name.into(),
            properties,
            event: None,
            data: HashMap::new(),
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn set_data<T: Any + Send>(&mut self, key: impl Into<String>, value: T) {
        self.data.insert(key.into(), Box::new(value));
    }

    pub fn get_data<T: Any + Send>(&self, key: &str) -> Option<&T> {
        self.data.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    pub fn get_data_mut<T: Any + Send>(&mut self, key: &str) -> Option<&mut T> {
        self.data.get_mut(key).and_then(|v| v.downcast_mut::<T>())
    }

    /// Removes and returns the sink's own stored state, dropping it if the
    /// caller discards the result. Sinks call this on `stop`.
    pub fn take_data<T: Any + Send>(&mut self, key: &str) -> Option<T> {
        let boxed = self.data.remove(key)?;
        match boxed.downcast::<T>() {
            Ok(v) => Some(*v),
            Err(boxed) => {
                self.data.insert(key.to_string(), boxed);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_slot_roundtrips_typed_value() {
        let mut r = Request::new(RequestId(1), "tone", "test-input", PropList::new());
        r.set_data("audio.stream", 42u32);
        assert_eq!(r.get_data::<u32>("audio.stream"), Some(&42));
        assert_eq!(r.take_data::<u32>("audio.stream"), Some(42));
        assert_eq!(r.get_data::<u32>("audio.stream"), None);
    }

    #[test]
    fn data_slot_type_mismatch_is_none() {
        let mut r = Request::new(RequestId(1), "tone", "test-input", PropList::new());
        r.set_data("k", "a string".to_string());
        assert_eq!(r.get_data::<u32>("k"), None);
    }
}

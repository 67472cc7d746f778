//! Process-wide key/value store with per-key change subscriptions.
//!
//! `set` fires every subscriber registered for that key when the old and
//! new value differ (including the case where one side is absent).
//! Subscribers receive `&Context` itself and may call `set` back into it,
//! including reentrantly on the key that is currently firing: a nested
//! `set` runs its own notification to completion before control returns
//! to the subscriber that triggered it. Interior mutability (`RefCell`)
//! is what makes this legal in safe Rust — every public method takes
//! `&self`, and `notify` clones the subscriber list for a key (cheaply,
//! via `Rc`) before invoking any of it, so a callback that recurses back
//! into `set` on the same key never trips a double-borrow and still sees
//! that key's full subscriber list.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

/// Opaque handle returned by [`Context::subscribe`], used to unsubscribe.
///
/// The original identifies subscribers by a `(callback, userdata)` pair,
/// which isn't meaningful for Rust closures (they aren't comparable). A
/// monotonic token serves the same purpose: unique per subscription, cheap
/// to hand back to the caller, and exact-match on unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

type Callback = dyn Fn(&Context, &str, Option<&Value>, Option<&Value>);

struct Subscription {
    id: SubscriberId,
    callback: Box<Callback>,
}

#[derive(Default)]
struct Inner {
    values: HashMap<String, Value>,
    subscribers: HashMap<String, Vec<Rc<Subscription>>>,
    next_id: u64,
}

#[derive(Default)]
pub struct Context {
    inner: RefCell<Inner>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.borrow().values.get(key).cloned()
    }

    /// Stores `value` under `key`. Fires every subscriber registered for
    /// `key`, in registration order, with `(key, old, new)` iff the old and
    /// new values are not equal (including when one side is absent).
    /// Reentrant: a subscriber may call `set` — on this key or any other —
    /// from within its own callback.
    pub fn set(&self, key: &str, value: Value) {
        let (old, changed) = {
            let mut inner = self.inner.borrow_mut();
            let old = inner.values.get(key).cloned();
            let changed = old.as_ref() != Some(&value);
            inner.values.insert(key.to_string(), value.clone());
            (old, changed)
        };

        if changed {
            self.notify(key, old.as_ref(), Some(&value));
        }
    }

    pub fn unset(&self, key: &str) {
        let old = self.inner.borrow_mut().values.remove(key);
        if let Some(old) = old {
            self.notify(key, Some(&old), None);
        }
    }

    fn notify(&self, key: &str, old: Option<&Value>, new: Option<&Value>) {
        let subs: Vec<Rc<Subscription>> = {
            let inner = self.inner.borrow();
            match inner.subscribers.get(key) {
                Some(subs) => subs.clone(),
                None => return,
            }
        };
        for sub in &subs {
            (sub.callback)(self, key, old, new);
        }
    }

    /// Registers a subscriber for `key`. Returns a token to unsubscribe
    /// with later.
    pub fn subscribe<F>(&self, key: impl Into<String>, callback: F) -> SubscriberId
    where
        F: Fn(&Context, &str, Option<&Value>, Option<&Value>) + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = SubscriberId(inner.next_id);
        inner.subscribers.entry(key.into()).or_default().push(Rc::new(Subscription {
            id,
            callback: Box::new(callback),
        }));
        id
    }

    /// Removes the unique subscription matching `id` under `key`. No-op if
    /// absent.
    pub fn unsubscribe(&self, key: &str, id: SubscriberId) {
        if let Some(subs) = self.inner.borrow_mut().subscribers.get_mut(key) {
            subs.retain(|s| s.id != id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn set_fires_subscriber_only_on_change() {
        let ctx = Context::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();

        ctx.subscribe("profile", move |_, key, old, new| {
            seen2.lock().unwrap().push((key.to_string(), old.cloned(), new.cloned()));
        });

        ctx.set("profile", Value::from("general"));
        ctx.set("profile", Value::from("general")); // no change, no fire
        ctx.set("profile", Value::from("silent"));

        let log = seen.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], ("profile".to_string(), None, Some(Value::from("general"))));
        assert_eq!(
            log[1],
            ("profile".to_string(), Some(Value::from("general")), Some(Value::from("silent")))
        );
    }

    #[test]
    fn unsubscribe_is_exact_match() {
        let ctx = Context::new();
        let count = Arc::new(Mutex::new(0));
        let count2 = count.clone();

        let id = ctx.subscribe("k", move |_, _, _, _| {
            *count2.lock().unwrap() += 1;
        });
        ctx.set("k", Value::from(1i32));
        ctx.unsubscribe("k", id);
        ctx.set("k", Value::from(2i32));

        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn a_subscriber_may_reentrantly_set_a_different_key() {
        let ctx = Context::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let log_b = log.clone();
        ctx.subscribe("b", move |_, _, _, new| {
            log_b.lock().unwrap().push(("b", new.cloned()));
        });

        let log_a = log.clone();
        ctx.subscribe("a", move |ctx, _, _, new| {
            log_a.lock().unwrap().push(("a", new.cloned()));
            ctx.set("b", Value::from("from-a"));
        });

        ctx.set("a", Value::from("x"));

        // The nested set("b", ...) — including its own notification — runs
        // to completion before the outer set("a", ...) call returns.
        assert_eq!(
            log.lock().unwrap().as_slice(),
            &[("a", Some(Value::from("x"))), ("b", Some(Value::from("from-a")))]
        );
    }

    #[test]
    fn a_subscriber_may_reentrantly_set_its_own_key() {
        let ctx = Context::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let reentered = Arc::new(Mutex::new(false));

        let log2 = log.clone();
        let reentered2 = reentered.clone();
        ctx.subscribe("k", move |ctx, _, _, new| {
            log2.lock().unwrap().push(new.cloned());
            let mut reentered = reentered2.lock().unwrap();
            if !*reentered {
                *reentered = true;
                ctx.set("k", Value::from("nested"));
            }
        });

        ctx.set("k", Value::from("outer"));

        // Same-key reentrancy still sees the key's full subscriber list —
        // the nested set above fires the very subscriber that triggered it.
        assert_eq!(
            log.lock().unwrap().as_slice(),
            &[Some(Value::from("outer")), Some(Value::from("nested"))]
        );
    }
}

//! String-keyed, insertion-ordered map of [`Value`]s.
//!
//! Ports `ngf/proplist.h`'s operations onto an [`indexmap::IndexMap`] so
//! that iteration order matches insertion order (tests in this corpus, as
//! in the original, rely on stable dumps).

use indexmap::IndexMap;

use crate::value::Value;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropList {
    entries: IndexMap<String, Value>,
}

impl PropList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn unset(&mut self, key: &str) {
        self.entries.shift_remove(key);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_int(&self, key: &str) -> Option<i32> {
        self.get(key).and_then(Value::as_int)
    }

    pub fn get_uint(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(Value::as_uint)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    /// Deep copy — `indexmap`/`Value` are already owned and `Clone`, so
    /// this is just `clone()`; kept as a named operation because the
    /// original exposes it as a distinct API (`n_proplist_copy`).
    pub fn deep_copy(&self) -> PropList {
        self.clone()
    }

    /// Copy containing only the given keys, in `self`'s order.
    pub fn copy_keys(&self, keys: &[&str]) -> PropList {
        let mut out = PropList::new();
        for key in keys {
            if let Some(v) = self.entries.get(*key) {
                out.entries.insert((*key).to_string(), v.clone());
            }
        }
        out
    }

    /// Merge `source` into `self`; values in `source` overwrite `self`'s
    /// for conflicting keys. New keys are appended in `source`'s order.
    pub fn merge(&mut self, source: &PropList) {
        for (k, v) in source.entries.iter() {
            self.entries.insert(k.clone(), v.clone());
        }
    }

    /// Merge only the given keys from `source` into `self`.
    pub fn merge_keys(&mut self, source: &PropList, keys: &[&str]) {
        for key in keys {
            if let Some(v) = source.entries.get(*key) {
                self.entries.insert((*key).to_string(), v.clone());
            }
        }
    }

    /// `true` iff both prop lists have an identical key set and equal
    /// values for every key (order does not matter here — this backs
    /// catalog merge-on-add, which must treat `{a,b}` and `{b,a}` rule
    /// sets as the same rule set).
    pub fn match_exact(&self, other: &PropList) -> bool {
        if self.entries.len() != other.entries.len() {
            return false;
        }
        self.entries
            .iter()
            .all(|(k, v)| other.entries.get(k).is_some_and(|ov| ov == v))
    }
}

impl FromIterator<(String, Value)> for PropList {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut out = PropList::new();
        for (k, v) in iter {
            out.set(k, v);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_is_preserved() {
        let mut p = PropList::new();
        p.set("z", "1");
        p.set("a", "2");
        p.set("m", "3");
        let keys: Vec<_> = p.keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn replace_keeps_original_position() {
        let mut p = PropList::new();
        p.set("a", "1");
        p.set("b", "2");
        p.set("a", "3");
        assert_eq!(p.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(p.get_string("a"), Some("3"));
    }

    #[test]
    fn unset_removes_entry() {
        let mut p = PropList::new();
        p.set("a", "1");
        p.unset("a");
        assert!(!p.has_key("a"));
        assert_eq!(p.size(), 0);
    }

    #[test]
    fn merge_overwrites_target() {
        let mut target = PropList::new();
        target.set("a", "1");
        target.set("b", "2");

        let mut source = PropList::new();
        source.set("b", "overwritten");
        source.set("c", "3");

        target.merge(&source);

        assert_eq!(target.get_string("a"), Some("1"));
        assert_eq!(target.get_string("b"), Some("overwritten"));
        assert_eq!(target.get_string("c"), Some("3"));
    }

    #[test]
    fn match_exact_ignores_order() {
        let mut a = PropList::new();
        a.set("x", "1");
        a.set("y", "2");

        let mut b = PropList::new();
        b.set("y", "2");
        b.set("x", "1");

        assert!(a.match_exact(&b));

        b.set("z", "3");
        assert!(!a.match_exact(&b));
    }

    #[test]
    fn copy_keys_filters_and_preserves_self_order() {
        let mut p = PropList::new();
        p.set("a", "1");
        p.set("b", "2");
        p.set("c", "3");

        let copy = p.copy_keys(&["c", "a"]);
        assert_eq!(copy.keys().collect::<Vec<_>>(), vec!["c", "a"]);
    }
}

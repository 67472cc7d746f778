//! Event definitions and the catalog that resolves a request name + rules
//! to the most specific matching [`Event`].

use std::collections::HashMap;

use tracing::debug;

use crate::context::Context;
use crate::proplist::PropList;

const CONTEXT_RULE_PREFIX: &str = "context@";
const WILDCARD: &str = "*";

/// Immutable after catalog construction. Multiple events may share a
/// `name`; they are disambiguated by `rules` (see [`EventCatalog`]).
#[derive(Clone, Debug)]
pub struct Event {
    pub name: String,
    pub rules: PropList,
    pub properties: PropList,
}

impl Event {
    pub fn new(name: impl Into<String>, rules: PropList, properties: PropList) -> Self {
        Self {
            name: name.into(),
            rules,
            properties,
        }
    }
}

/// Groups events by name; within a group, orders them most-specific first.
#[derive(Default)]
pub struct EventCatalog {
    groups: HashMap<String, Vec<Event>>,
}

impl EventCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `event` to the catalog. If a stored event in the same name
    /// group has an identical rule set (`PropList::match_exact`), its
    /// `properties` absorb `event`'s (source overwrites target) and the
    /// new event is discarded rather than stored separately. Otherwise
    /// `event` is appended and the group is re-sorted, descending by
    /// `rules.size()`, stable on ties (insertion order is the tie-break —
    /// ties never actually occur in practice since equal rule sets merge
    /// above, but the sort must still be stable for that invariant to
    /// hold incrementally as events are added one at a time).
    pub fn add_event(&mut self, event: Event) {
        let group = self.groups.entry(event.name.clone()).or_default();

        if let Some(found) = group
            .iter_mut()
            .find(|existing| existing.rules.match_exact(&event.rules))
        {
            debug!(name = %event.name, "merging event with identical rule set");
            found.properties.merge(&event.properties);
            return;
        }

        debug!(name = %event.name, rules = event.rules.size(), "adding new event");
        group.push(event);
        group.sort_by(|a, b| b.rules.size().cmp(&a.rules.size()));
    }

    /// Resolves `name`/`properties` (the request's own properties) against
    /// `context`, returning the first (most specific) matching event.
    pub fn evaluate(
        &self,
        name: &str,
        properties: &PropList,
        context: &Context,
    ) -> Option<&Event> {
        let group = self.groups.get(name)?;

        group.iter().find(|event| {
            event.rules.size() == 0 || rules_match(&event.rules, properties, context)
        })
    }
}

fn rules_match(rules: &PropList, properties: &PropList, context: &Context) -> bool {
    rules.iter().all(|(key, expected)| {
        let from_context;
        let actual = if let Some(context_key) = key.strip_prefix(CONTEXT_RULE_PREFIX) {
            from_context = context.get(context_key);
            from_context.as_ref()
        } else {
            properties.get(key)
        };

        match (expected.as_str(), actual) {
            (Some(WILDCARD), Some(_)) => true,
            (_, Some(actual_value)) => actual_value == expected,
            (_, None) => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str, rules: &[(&str, &str)]) -> Event {
        let mut r = PropList::new();
        for (k, v) in rules {
            r.set(*k, *v);
        }
        Event::new(name, r, PropList::new())
    }

    #[test]
    fn add_event_merges_identical_rule_sets() {
        let mut catalog = EventCatalog::new();

        let mut a = event("tone", &[("mode", "loud")]);
        a.properties.set("sound.filename", "loud.wav");
        catalog.add_event(a);

        let mut b = event("tone", &[("mode", "loud")]);
        b.properties.set("vibrator.pattern", "short");
        catalog.add_event(b);

        let ctx = Context::new();
        let props = {
            let mut p = PropList::new();
            p.set("mode", "loud");
            p
        };
        let resolved = catalog.evaluate("tone", &props, &ctx).unwrap();
        assert_eq!(resolved.properties.get_string("sound.filename"), Some("loud.wav"));
        assert_eq!(resolved.properties.get_string("vibrator.pattern"), Some("short"));
    }

    #[test]
    fn resolution_picks_most_specific_matching_event() {
        // S3: two events named "ringtone": one with {mode: loud}, one default.
        let mut catalog = EventCatalog::new();
        catalog.add_event(event("ringtone", &[("mode", "loud")]));
        catalog.add_event(event("ringtone", &[]));

        let ctx = Context::new();

        let mut loud = PropList::new();
        loud.set("mode", "loud");
        assert_eq!(
            catalog.evaluate("ringtone", &loud, &ctx).unwrap().rules.size(),
            1
        );

        let mut silent = PropList::new();
        silent.set("mode", "silent");
        assert_eq!(
            catalog.evaluate("ringtone", &silent, &ctx).unwrap().rules.size(),
            0
        );

        let none = PropList::new();
        assert_eq!(
            catalog.evaluate("ringtone", &none, &ctx).unwrap().rules.size(),
            0
        );
    }

    #[test]
    fn context_rule_reacts_to_context_changes() {
        // S4
        let mut catalog = EventCatalog::new();
        catalog.add_event(event("alarm", &[("context@profile", "silent")]));
        catalog.add_event(event("alarm", &[]));

        let ctx = Context::new();
        ctx.set("profile", crate::value::Value::from("general"));

        let props = PropList::new();
        assert_eq!(catalog.evaluate("alarm", &props, &ctx).unwrap().rules.size(), 0);

        ctx.set("profile", crate::value::Value::from("silent"));
        assert_eq!(catalog.evaluate("alarm", &props, &ctx).unwrap().rules.size(), 1);
    }

    #[test]
    fn wildcard_requires_only_presence() {
        let mut catalog = EventCatalog::new();
        catalog.add_event(event("click", &[("sound.filename", "*")]));

        let ctx = Context::new();
        let mut props = PropList::new();
        props.set("sound.filename", "anything.wav");
        assert!(catalog.evaluate("click", &props, &ctx).is_some());

        let empty = PropList::new();
        assert!(catalog.evaluate("click", &empty, &ctx).is_none());
    }

    #[test]
    fn no_matching_event_returns_none() {
        let catalog = EventCatalog::new();
        let ctx = Context::new();
        assert!(catalog.evaluate("missing", &PropList::new(), &ctx).is_none());
    }
}

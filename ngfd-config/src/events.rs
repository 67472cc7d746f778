//! Parses `events.d/*.yaml` into an [`ngfd_core::EventCatalog`].
//!
//! One file may declare several events sharing a name (rule variants); see
//! `SPEC_FULL.md` §6 for the schema. `parent` names another top-level event
//! whose default (empty-rules) variant is merged in first, recursively;
//! cycles are rejected before any event reaches the catalog.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use ngfd_core::{Event, EventCatalog, PropList, Value};

use crate::error::ConfigError;

#[derive(Debug, Deserialize)]
struct RawEventFile {
    events: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    name: String,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    rules: HashMap<String, String>,
    #[serde(default)]
    properties: HashMap<String, serde_yaml::Value>,
}

/// Parses every `*.yaml` file directly under `dir` and builds a catalog.
pub fn load_events_dir(dir: &Path) -> Result<EventCatalog, ConfigError> {
    if !dir.is_dir() {
        return Err(ConfigError::EventDirMissing(dir.to_path_buf()));
    }

    let mut raw_events = Vec::new();
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|source| ConfigError::Io { path: dir.to_path_buf(), source })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "yaml" || ext == "yml"))
        .collect();
    paths.sort();

    for path in &paths {
        let raw_events_in_file = parse_event_file(path)?;
        debug!(path = %path.display(), count = raw_events_in_file.len(), "parsed event file");
        raw_events.extend(raw_events_in_file);
    }

    build_catalog(raw_events)
}

fn parse_event_file(path: &Path) -> Result<Vec<RawEvent>, ConfigError> {
    let text = fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    let file: RawEventFile = serde_yaml::from_str(&text)
        .map_err(|source| ConfigError::EventFileMalformed { path: path.to_path_buf(), source })?;
    Ok(file.events)
}

fn build_catalog(raw_events: Vec<RawEvent>) -> Result<EventCatalog, ConfigError> {
    let mut by_name: HashMap<String, Vec<RawEvent>> = HashMap::new();
    let mut parents: HashMap<String, String> = HashMap::new();

    for event in raw_events {
        if let Some(parent) = &event.parent {
            parents.entry(event.name.clone()).or_insert_with(|| parent.clone());
        }
        by_name.entry(event.name.clone()).or_default().push(event);
    }

    for name in by_name.keys() {
        detect_cycle(name, &parents)?;
    }

    let mut catalog = EventCatalog::new();
    for (name, variants) in &by_name {
        let base = resolve_base_properties(name, &parents, &by_name)?;
        for variant in variants {
            let rules = string_map_to_rules(&variant.rules);
            let mut properties = base.clone();
            let own = yaml_map_to_properties(name, &variant.properties)?;
            properties.merge(&own);
            catalog.add_event(Event::new(variant.name.clone(), rules, properties));
        }
    }

    Ok(catalog)
}

/// Walks `name`'s parent chain (recursively merging default-variant
/// properties, most distant ancestor first) and returns the accumulated
/// base `PropList` a variant of `name` should start from.
fn resolve_base_properties(
    name: &str,
    parents: &HashMap<String, String>,
    by_name: &HashMap<String, Vec<RawEvent>>,
) -> Result<PropList, ConfigError> {
    let Some(parent_name) = parents.get(name) else {
        return Ok(PropList::new());
    };

    let mut base = resolve_base_properties(parent_name, parents, by_name)?;

    let parent_default = by_name
        .get(parent_name)
        .and_then(|variants| variants.iter().find(|v| v.rules.is_empty()))
        .ok_or_else(|| ConfigError::ParentNotFound {
            name: name.to_string(),
            parent: parent_name.clone(),
        })?;

    let own = yaml_map_to_properties(parent_name, &parent_default.properties)?;
    base.merge(&own);
    Ok(base)
}

fn detect_cycle(name: &str, parents: &HashMap<String, String>) -> Result<(), ConfigError> {
    let mut visited = HashSet::new();
    let mut current = name;
    visited.insert(current.to_string());

    while let Some(parent) = parents.get(current) {
        if !visited.insert(parent.clone()) {
            return Err(ConfigError::ParentCycle(format!("{name} -> ... -> {parent}")));
        }
        current = parent;
    }
    Ok(())
}

fn string_map_to_rules(rules: &HashMap<String, String>) -> PropList {
    let mut out = PropList::new();
    for (k, v) in rules {
        out.set(k.clone(), Value::Str(v.clone()));
    }
    out
}

fn yaml_map_to_properties(
    event_name: &str,
    properties: &HashMap<String, serde_yaml::Value>,
) -> Result<PropList, ConfigError> {
    let mut out = PropList::new();
    for (key, value) in properties {
        let value = yaml_to_value(value).ok_or_else(|| ConfigError::UnsupportedPropertyValue {
            name: event_name.to_string(),
            key: key.clone(),
        })?;
        out.set(key.clone(), value);
    }
    Ok(out)
}

fn yaml_to_value(value: &serde_yaml::Value) -> Option<Value> {
    match value {
        serde_yaml::Value::String(s) => Some(Value::Str(s.clone())),
        serde_yaml::Value::Bool(b) => Some(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).ok().map(Value::Int)
            } else {
                n.as_u64().and_then(|u| u32::try_from(u).ok()).map(Value::UInt)
            }
        }
        _ => None,
    }
}

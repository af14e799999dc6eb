//! The [`StateInterface`] store.

use std::collections::BTreeSet;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::callbacks::{CallbackId, Subscriptions};
use crate::error::{StateError, StateResult};
use crate::lookup::{is_related, segments};

/// Hierarchical JSON state owned by a single object.
///
/// The root is always a JSON object. Values are addressed by lookups such as
/// `borderColor/alpha`; numeric segments index arrays. `insert_*` methods
/// create missing intermediate objects, while [`set_value`](Self::set_value)
/// only updates existing keys so that typos surface as errors.
pub struct StateInterface {
    root: Value,
    dirty: BTreeSet<String>,
    subscriptions: Subscriptions,
}

impl StateInterface {
    /// Create an empty state tree.
    pub fn new() -> Self {
        Self {
            root: Value::Object(Map::new()),
            dirty: BTreeSet::new(),
            subscriptions: Subscriptions::default(),
        }
    }

    /// Create a state tree from JSON text. The result starts clean.
    pub fn from_json(text: &str) -> StateResult<Self> {
        let mut state = Self::new();
        state.set_state(text)?;
        state.dirty.clear();
        Ok(state)
    }

    /// The whole tree.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// The raw value at `path`, if any.
    pub fn value(&self, path: &str) -> Option<&Value> {
        node(&self.root, path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.value(path).is_some()
    }

    /// Read and convert the value at `path`.
    pub fn get_value<T: DeserializeOwned>(&self, path: &str) -> StateResult<T> {
        let value = self.value(path).ok_or_else(|| not_found(path))?;
        T::deserialize(value).map_err(|e| StateError::TypeMismatch {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// Create or overwrite the value at `path`, creating intermediate objects.
    pub fn insert_value<T: Serialize>(&mut self, path: &str, value: T) -> StateResult<()> {
        let value = serde_json::to_value(value)?;
        if path.is_empty() && !value.is_object() {
            return Err(StateError::NotAnObject);
        }
        *self.slot_mut(path, true)? = value;
        self.mark_dirty(path);
        Ok(())
    }

    /// Ensure an object node exists at `path`.
    pub fn insert_object(&mut self, path: &str) -> StateResult<()> {
        match self.value(path) {
            Some(Value::Object(_)) => Ok(()),
            Some(_) => Err(StateError::NotAContainer {
                path: path.to_string(),
            }),
            None => self.insert_value(path, Value::Object(Map::new())),
        }
    }

    /// Create (or replace) an array of `len` nulls at `path`.
    pub fn insert_array(&mut self, path: &str, len: usize) -> StateResult<()> {
        self.insert_value(path, Value::Array(vec![Value::Null; len]))
    }

    /// Update an existing value.
    ///
    /// Returns `Ok(true)` and marks `path` dirty if the stored value changed,
    /// `Ok(false)` if it was already equal.
    pub fn set_value<T: Serialize>(&mut self, path: &str, value: T) -> StateResult<bool> {
        let value = serde_json::to_value(value)?;
        if path.is_empty() && !value.is_object() {
            return Err(StateError::NotAnObject);
        }
        let slot = self.slot_mut(path, false)?;
        if *slot == value {
            return Ok(false);
        }
        *slot = value;
        self.mark_dirty(path);
        Ok(true)
    }

    /// Remove and return the value at `path`.
    pub fn remove(&mut self, path: &str) -> StateResult<Value> {
        let parts = segments(path);
        let Some((last, parent)) = parts.split_last() else {
            return Err(StateError::NotAnObject);
        };
        let parent_path = parent.join("/");
        let removed = match self.slot_mut(&parent_path, false)? {
            Value::Object(map) => map.remove(*last),
            Value::Array(items) => match last.parse::<usize>() {
                Ok(idx) if idx < items.len() => Some(items.remove(idx)),
                _ => None,
            },
            _ => {
                return Err(StateError::NotAContainer { path: parent_path });
            }
        };
        let removed = removed.ok_or_else(|| not_found(path))?;
        self.mark_dirty(path);
        Ok(removed)
    }

    /// Replace the whole tree from JSON text. The text must be a JSON object.
    pub fn set_state(&mut self, text: &str) -> StateResult<()> {
        let value: Value = serde_json::from_str(text)?;
        if !value.is_object() {
            return Err(StateError::NotAnObject);
        }
        self.root = value;
        self.mark_dirty("");
        Ok(())
    }

    /// Subscribe to changes at `path` (the empty path subscribes to everything).
    pub fn add_state_callback<F>(&mut self, path: &str, callback: F) -> CallbackId
    where
        F: FnMut(&str, Option<&Value>) + Send + 'static,
    {
        self.subscriptions.add(path.to_string(), Box::new(callback))
    }

    /// Unsubscribe. Returns `false` if the ID was unknown.
    pub fn remove_state_callback(&mut self, id: CallbackId) -> bool {
        self.subscriptions.remove(id)
    }

    pub fn callback_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Paths changed since the last flush, in sorted order.
    pub fn dirty_paths(&self) -> impl Iterator<Item = &str> {
        self.dirty.iter().map(String::as_str)
    }

    /// Notify subscribers of pending changes and clear the dirty set.
    ///
    /// Each subscriber related to at least one dirty path is invoked exactly
    /// once, in registration order. Returns the drained dirty paths.
    pub fn flush_state(&mut self) -> Vec<String> {
        let dirty: Vec<String> = std::mem::take(&mut self.dirty).into_iter().collect();
        if dirty.is_empty() {
            return dirty;
        }

        let root = &self.root;
        let mut notified = 0usize;
        for sub in self.subscriptions.iter_mut() {
            if dirty.iter().any(|d| is_related(d, &sub.path)) {
                (sub.callback)(&sub.path, node(root, &sub.path));
                notified += 1;
            }
        }
        tracing::trace!(changed = dirty.len(), notified, "flushed state");
        dirty
    }

    /// Indented JSON rendering of the tree.
    pub fn to_pretty_string(&self) -> String {
        format!("{:#}", self.root)
    }

    fn mark_dirty(&mut self, path: &str) {
        self.dirty.insert(path.to_string());
    }

    fn slot_mut(&mut self, path: &str, create: bool) -> StateResult<&mut Value> {
        let parts = segments(path);
        let mut current = &mut self.root;
        for (i, seg) in parts.iter().enumerate() {
            let is_last = i + 1 == parts.len();
            current = match current {
                Value::Object(map) => {
                    if create {
                        map.entry(seg.to_string()).or_insert_with(|| {
                            if is_last {
                                Value::Null
                            } else {
                                Value::Object(Map::new())
                            }
                        })
                    } else {
                        map.get_mut(*seg).ok_or_else(|| not_found(path))?
                    }
                }
                Value::Array(items) => {
                    let idx: usize = seg.parse().map_err(|_| not_found(path))?;
                    items.get_mut(idx).ok_or_else(|| not_found(path))?
                }
                _ => {
                    return Err(StateError::NotAContainer {
                        path: parts[..i].join("/"),
                    });
                }
            };
        }
        Ok(current)
    }
}

fn node<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path)
        .into_iter()
        .try_fold(root, |current, seg| match current {
            Value::Object(map) => map.get(seg),
            Value::Array(items) => items.get(seg.parse::<usize>().ok()?),
            _ => None,
        })
}

fn not_found(path: &str) -> StateError {
    StateError::PathNotFound {
        path: path.to_string(),
    }
}

impl Default for StateInterface {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StateInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

impl fmt::Debug for StateInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateInterface")
            .field("root", &self.root)
            .field("dirty", &self.dirty)
            .field("subscriptions", &self.subscriptions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::lookup::lookup;

    fn color_state() -> StateInterface {
        let mut state = StateInterface::new();
        state.insert_value("colorMapName", "Gray").unwrap();
        state.insert_value("gamma", 1.0).unwrap();
        state.insert_object("colorMix").unwrap();
        state.insert_value(&lookup(&["colorMix", "red"]), 1.0).unwrap();
        state.insert_value(&lookup(&["colorMix", "green"]), 1.0).unwrap();
        state.flush_state();
        state
    }

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl FnMut(&str, Option<&Value>) + Send) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback = move |path: &str, _value: Option<&Value>| {
            sink.lock().unwrap().push(path.to_string());
        };
        (seen, callback)
    }

    #[test]
    fn insert_and_get() {
        let state = color_state();
        assert_eq!(state.get_value::<String>("colorMapName").unwrap(), "Gray");
        assert_eq!(state.get_value::<f64>("colorMix/red").unwrap(), 1.0);
        assert!(state.contains("colorMix"));
        assert!(!state.contains("colorMix/blue"));
    }

    #[test]
    fn insert_creates_intermediate_objects() {
        let mut state = StateInterface::new();
        state.insert_value("nanColor/red", 255).unwrap();
        assert!(state.value("nanColor").unwrap().is_object());
        assert_eq!(state.get_value::<i32>("nanColor/red").unwrap(), 255);
    }

    #[test]
    fn nested_paths_walk_several_levels() {
        let mut state = StateInterface::new();
        state.insert_value("view/zoom/level", 3).unwrap();
        state.insert_value("view/zoom/center", "c").unwrap();
        assert!(state.set_value("view/zoom/level", 4).unwrap());
        assert_eq!(state.get_value::<i32>("view/zoom/level").unwrap(), 4);
        assert!(matches!(
            state.set_value("view/pan/x", 1).unwrap_err(),
            StateError::PathNotFound { .. }
        ));
        assert!(!state.contains("view/pan"));
    }

    #[test]
    fn get_missing_path() {
        let state = color_state();
        let err = state.get_value::<f64>("scale1").unwrap_err();
        assert!(matches!(err, StateError::PathNotFound { path } if path == "scale1"));
    }

    #[test]
    fn get_wrong_type() {
        let state = color_state();
        let err = state.get_value::<bool>("colorMapName").unwrap_err();
        assert!(matches!(err, StateError::TypeMismatch { .. }));
    }

    #[test]
    fn set_value_reports_change() {
        let mut state = color_state();
        assert!(state.set_value("gamma", 2.0).unwrap());
        assert!(!state.set_value("gamma", 2.0).unwrap());
        assert_eq!(state.dirty_paths().collect::<Vec<_>>(), vec!["gamma"]);
    }

    #[test]
    fn set_value_requires_existing_key() {
        let mut state = color_state();
        let err = state.set_value("gama", 2.0).unwrap_err();
        assert!(matches!(err, StateError::PathNotFound { .. }));
        assert!(!state.contains("gama"));
    }

    #[test]
    fn scalar_is_not_a_container() {
        let mut state = color_state();
        let err = state.insert_value("gamma/low", 1).unwrap_err();
        assert!(matches!(err, StateError::NotAContainer { path } if path == "gamma"));
        assert!(matches!(
            state.insert_object("gamma").unwrap_err(),
            StateError::NotAContainer { .. }
        ));
    }

    #[test]
    fn arrays_are_indexed_by_number() {
        let mut state = StateInterface::new();
        state.insert_array("layers", 2).unwrap();
        state.insert_value("layers/1", "image.fits").unwrap();
        assert_eq!(state.get_value::<String>("layers/1").unwrap(), "image.fits");
        assert!(state.value("layers/0").unwrap().is_null());
        assert!(state.set_value("layers/2", "x").is_err());
        assert!(state.value("layers/abc").is_none());
    }

    #[test]
    fn remove_values() {
        let mut state = color_state();
        assert_eq!(state.remove("colorMix/green").unwrap(), Value::from(1.0));
        assert!(!state.contains("colorMix/green"));
        assert!(state.remove("colorMix/green").is_err());
        assert!(state.remove("").is_err());
    }

    #[test]
    fn set_state_replaces_tree() {
        let mut state = color_state();
        state.set_state(r#"{"gamma": 0.5}"#).unwrap();
        assert_eq!(state.get_value::<f64>("gamma").unwrap(), 0.5);
        assert!(!state.contains("colorMapName"));
    }

    #[test]
    fn set_state_rejects_non_objects() {
        let mut state = color_state();
        assert!(matches!(state.set_state("[1,2]").unwrap_err(), StateError::NotAnObject));
        assert!(matches!(state.set_state("{").unwrap_err(), StateError::Json(_)));
        assert_eq!(state.get_value::<String>("colorMapName").unwrap(), "Gray");
    }

    #[test]
    fn display_is_reloadable() {
        let state = color_state();
        let reloaded = StateInterface::from_json(&state.to_string()).unwrap();
        assert_eq!(reloaded.root(), state.root());
        assert!(!reloaded.is_dirty());
        assert!(state.to_pretty_string().contains('\n'));
    }

    #[test]
    fn flush_notifies_related_callbacks_once() {
        let mut state = color_state();
        let (mix_seen, mix_cb) = recorder();
        let (gamma_seen, gamma_cb) = recorder();
        let (all_seen, all_cb) = recorder();
        state.add_state_callback("colorMix", mix_cb);
        state.add_state_callback("gamma", gamma_cb);
        state.add_state_callback("", all_cb);

        state.set_value("colorMix/red", 0.5).unwrap();
        state.set_value("colorMix/green", 0.25).unwrap();
        let flushed = state.flush_state();

        assert_eq!(flushed, vec!["colorMix/green", "colorMix/red"]);
        assert_eq!(*mix_seen.lock().unwrap(), vec!["colorMix"]);
        assert!(gamma_seen.lock().unwrap().is_empty());
        assert_eq!(*all_seen.lock().unwrap(), vec![""]);
        assert!(!state.is_dirty());
    }

    #[test]
    fn flush_without_changes_is_silent() {
        let mut state = color_state();
        let (seen, cb) = recorder();
        state.add_state_callback("", cb);
        assert!(state.flush_state().is_empty());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn callback_receives_current_value() {
        let mut state = color_state();
        let received = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&received);
        state.add_state_callback("gamma", move |_, value| {
            *sink.lock().unwrap() = value.cloned();
        });
        state.set_value("gamma", 3.0).unwrap();
        state.flush_state();
        assert_eq!(*received.lock().unwrap(), Some(Value::from(3.0)));
    }

    #[test]
    fn removed_callbacks_stay_quiet() {
        let mut state = color_state();
        let (seen, cb) = recorder();
        let id = state.add_state_callback("gamma", cb);
        assert_eq!(state.callback_count(), 1);
        assert!(state.remove_state_callback(id));
        assert!(!state.remove_state_callback(id));

        state.set_value("gamma", 4.0).unwrap();
        state.flush_state();
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn set_state_notifies_everyone() {
        let mut state = color_state();
        let (seen, cb) = recorder();
        state.add_state_callback("colorMix/red", cb);
        state.set_state(r#"{"colorMix": {"red": 0.1}}"#).unwrap();
        state.flush_state();
        assert_eq!(*seen.lock().unwrap(), vec!["colorMix/red"]);
    }

    proptest::proptest! {
        #[test]
        fn flush_drains_exactly_the_changed_keys(values in proptest::collection::vec(0i64..4, 1..8)) {
            let mut state = StateInterface::new();
            for i in 0..values.len() {
                state.insert_value(&format!("k{i}"), 0i64).unwrap();
            }
            state.flush_state();

            let mut expected = Vec::new();
            for (i, v) in values.iter().enumerate() {
                if state.set_value(&format!("k{i}"), *v).unwrap() {
                    expected.push(format!("k{i}"));
                }
            }
            expected.sort();
            proptest::prop_assert_eq!(state.flush_state(), expected);
            proptest::prop_assert!(!state.is_dirty());
        }
    }
}

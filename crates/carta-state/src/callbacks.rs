//! Change-callback bookkeeping for [`StateInterface`](crate::StateInterface).

use std::fmt;

use serde_json::Value;

/// Identifier returned when a callback is registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(i64);

impl CallbackId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

/// A state-change callback.
///
/// Invoked with the subscribed lookup and the value currently stored there
/// (`None` if the subscribed path no longer exists).
pub type StateCallback = Box<dyn FnMut(&str, Option<&Value>) + Send>;

pub(crate) struct Subscription {
    pub(crate) id: CallbackId,
    pub(crate) path: String,
    pub(crate) callback: StateCallback,
}

/// Ordered set of subscriptions with monotonically issued IDs.
#[derive(Default)]
pub(crate) struct Subscriptions {
    entries: Vec<Subscription>,
    next_id: i64,
}

impl Subscriptions {
    pub(crate) fn add(&mut self, path: String, callback: StateCallback) -> CallbackId {
        let id = CallbackId(self.next_id);
        self.next_id += 1;
        self.entries.push(Subscription { id, path, callback });
        id
    }

    pub(crate) fn remove(&mut self, id: CallbackId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|s| s.id != id);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Subscription> {
        self.entries.iter_mut()
    }
}

impl fmt::Debug for Subscriptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|s| (s.id, &s.path)))
            .finish()
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Listener registry and event dispatch.
//!
//! - [`SubscriptionId`] - Token identifying a listener
//! - [`ListenerRegistry`] - Per-item registry that filters and dispatches events
//! - [`DispatchOutcome`] - Delivery counts of one dispatch

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::event::{EventKind, ItemEvent};

use super::ListenerOptions;
use super::listener::{EventListener, ListenerCallback};

/// Unique identifier for a listener subscription.
///
/// Returned when a listener is added; used to extend, shrink or remove it
/// later. IDs are unique within an item's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    #[must_use]
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

/// Result of dispatching one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Listeners whose callback returned normally.
    pub delivered: usize,
    /// Listeners whose callback panicked.
    pub failed: usize,
}

impl DispatchOutcome {
    /// Returns the number of listeners the event was handed to.
    #[must_use]
    pub fn total(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Registry of an item's event listeners.
///
/// Callbacks run synchronously on the dispatching thread, outside the
/// registry lock, so a callback may add or remove listeners of the same
/// item. A panicking callback is logged and counted; the remaining
/// listeners still receive the event.
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: RwLock<HashMap<SubscriptionId, EventListener>>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: RwLock::new(HashMap::new()),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers a listener with the given interest filter.
    pub fn add<F>(&self, options: &ListenerOptions, callback: F) -> SubscriptionId
    where
        F: Fn(&ItemEvent) + Send + Sync + 'static,
    {
        let id = self.next_id();
        let callback: ListenerCallback = Arc::new(callback);
        self.listeners
            .write()
            .insert(id, EventListener::new(options, callback));
        id
    }

    /// Adds kinds to an existing listener and replaces its origin filter.
    ///
    /// Returns `false` if no listener has this ID.
    pub fn extend(&self, id: SubscriptionId, options: &ListenerOptions) -> bool {
        match self.listeners.write().get_mut(&id) {
            Some(listener) => {
                listener.extend(options);
                true
            }
            None => false,
        }
    }

    /// Removes kinds from a listener; an empty slice removes all kinds.
    ///
    /// A listener left without kinds is deregistered. Returns `false` if no
    /// listener has this ID.
    pub fn remove_kinds(&self, id: SubscriptionId, kinds: &[EventKind]) -> bool {
        let mut listeners = self.listeners.write();
        let Some(listener) = listeners.get_mut(&id) else {
            return false;
        };

        listener.remove_kinds(kinds);
        if listener.is_empty() {
            listeners.remove(&id);
        }
        true
    }

    /// Deregisters a listener.
    ///
    /// Returns `true` if a listener was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.write().remove(&id).is_some()
    }

    /// Deregisters all listeners.
    pub fn clear(&self) {
        self.listeners.write().clear();
    }

    /// Returns `true` if the listener is registered.
    #[must_use]
    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.listeners.read().contains_key(&id)
    }

    /// Returns the kinds a listener is interested in.
    #[must_use]
    pub fn kinds_of(&self, id: SubscriptionId) -> Option<Vec<EventKind>> {
        self.listeners.read().get(&id).map(|listener| {
            EventKind::ALL
                .into_iter()
                .filter(|kind| listener.kinds().contains(kind))
                .collect()
        })
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Delivers an event to every interested listener.
    ///
    /// Listeners are called in registration order, outside the registry
    /// lock. `echo` marks a remote event recognized as the echo of a local
    /// change.
    pub fn dispatch(&self, event: &ItemEvent, echo: bool) -> DispatchOutcome {
        let mut targets: Vec<(SubscriptionId, ListenerCallback)> = self
            .listeners
            .read()
            .iter()
            .filter(|(_, listener)| listener.wants(event, echo))
            .map(|(id, listener)| (*id, Arc::clone(listener.callback())))
            .collect();
        // Registration order
        targets.sort_by_key(|(id, _)| *id);

        let mut outcome = DispatchOutcome::default();
        for (id, callback) in targets {
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_ok() {
                outcome.delivered += 1;
            } else {
                outcome.failed += 1;
                tracing::error!(
                    item = %event.item_name(),
                    subscription = %id,
                    kind = %event.kind(),
                    "Event listener panicked"
                );
            }
        }

        outcome
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Returns `true` if there are no registered listeners.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listener_count() == 0
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

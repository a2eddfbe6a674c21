// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Local mirror of an openHAB item.
//!
//! An [`Item`] keeps the last known state of one remote item and keeps it
//! consistent with two sources of change:
//!
//! - local calls ([`Item::update`], [`Item::command`]) that validate the
//!   value, stamp the send time, set the state optimistically and send it;
//! - server events ([`Item::on_external_event`]) that overwrite the state
//!   unless they are recognized as the echo of a local change.
//!
//! Both paths end in one [`ItemEvent`] dispatched to the item's listeners
//! and published on the directory event bus.
//!
//! # Echo detection
//!
//! The server reports every change back, including the ones this item just
//! sent. A server event is an echo when its state equals the current state
//! and the last local command or update was sent less than the echo window
//! ago. Echoes leave the state untouched and only reach listeners that
//! asked for them.

mod kinds;
mod state;

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;

use crate::directory::ItemDefaults;
use crate::error::{Error, Result, ValueError};
use crate::event::{EventBus, EventKind, EventOrigin, ItemEvent, RawItemEvent};
use crate::protocol::{RawItem, Transport};
use crate::subscription::{
    DispatchOutcome, ListenerOptions, ListenerRegistry, Subscribable, SubscriptionId,
};
use crate::types::{ItemKind, NULL, ParsedState, RawState, StateValue, UNDEF, codec, grammar};

pub use state::ItemMetadata;

use state::{ItemState, Origin, outgoing, same_state};

/// The result of dispatching one item event.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// The dispatched event.
    pub event: ItemEvent,
    /// Whether the event was recognized as the echo of a local change.
    pub echo: bool,
    /// Listener delivery counts.
    pub outcome: DispatchOutcome,
}

/// A local mirror of one openHAB item.
///
/// Items are created and owned by a [`Directory`](crate::Directory), which
/// hands out shared references; there is never more than one instance per
/// item name.
///
/// # Examples
///
/// ```no_run
/// use openhab_items::{Directory, RestConfig, RestTransport};
///
/// # async fn example() -> openhab_items::Result<()> {
/// let transport = RestTransport::new(RestConfig::new("http://openhab:8080/rest"))?;
/// let directory = Directory::new(transport);
///
/// let dimmer = directory.get_item("Living_Dimmer").await?;
/// dimmer.command(40).await?;
/// assert_eq!(dimmer.current_state().and_then(|v| v.as_i64()), Some(40));
/// # Ok(())
/// # }
/// ```
pub struct Item<T: Transport> {
    name: String,
    kind: ItemKind,
    base_kind: Option<ItemKind>,
    metadata: RwLock<ItemMetadata>,
    transport: Arc<T>,
    echo_window: Duration,
    auto_update: bool,
    state: Mutex<ItemState>,
    members: RwLock<HashMap<String, Weak<Item<T>>>>,
    listeners: ListenerRegistry,
    event_bus: Option<EventBus>,
}

impl<T: Transport> Item<T> {
    /// Creates an item from its raw representation.
    pub(crate) fn from_raw(
        raw: &RawItem,
        transport: Arc<T>,
        defaults: &ItemDefaults,
        event_bus: Option<EventBus>,
    ) -> Result<Self> {
        let (kind, quantity_type) = raw.kind()?;
        let base = raw.base_kind()?;
        let base_kind = base.as_ref().map(|(base_kind, _)| *base_kind);
        let quantity_type = quantity_type.or_else(|| base.and_then(|(_, dimension)| dimension));

        let initial = codec::decode(base_kind.unwrap_or(kind), &raw.state)?;

        Ok(Self {
            name: raw.name.clone(),
            kind,
            base_kind,
            metadata: RwLock::new(ItemMetadata::from_raw(raw, quantity_type)),
            transport,
            echo_window: defaults.echo_window,
            auto_update: defaults.auto_update,
            state: Mutex::new(ItemState::new(initial)),
            members: RwLock::new(HashMap::new()),
            listeners: ListenerRegistry::new(),
            event_bus,
        })
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Returns the item name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the item kind.
    #[must_use]
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Returns the base kind of a group, `None` otherwise.
    #[must_use]
    pub fn base_kind(&self) -> Option<ItemKind> {
        self.base_kind
    }

    /// Returns the kind whose codec and grammars apply to values.
    ///
    /// This is the base kind for groups that have one, the item kind
    /// otherwise.
    #[must_use]
    pub fn value_kind(&self) -> ItemKind {
        self.base_kind.unwrap_or(self.kind)
    }

    /// Returns a copy of the item metadata.
    #[must_use]
    pub fn metadata(&self) -> ItemMetadata {
        self.metadata.read().clone()
    }

    /// Returns whether the item follows the event stream.
    #[must_use]
    pub fn auto_update(&self) -> bool {
        self.auto_update
    }

    /// Returns the echo window.
    #[must_use]
    pub fn echo_window(&self) -> Duration {
        self.echo_window
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Returns the current state.
    ///
    /// Items without auto-update refetch the state from the server first,
    /// which makes this a slow path bounded by the transport timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the refresh fails.
    pub async fn state(&self) -> Result<Option<StateValue>> {
        if !self.auto_update {
            self.refresh().await?;
        }
        Ok(self.current_state())
    }

    /// Refetches state and metadata from the server.
    ///
    /// Group membership is kept as resolved at construction; use
    /// [`Directory::refresh_item`](crate::Directory::refresh_item) to pick
    /// up added or removed members.
    ///
    /// # Errors
    ///
    /// Returns error if the fetch fails or the state cannot be parsed.
    pub async fn refresh(&self) -> Result<()> {
        let raw = self.transport.fetch_item(&self.name).await?;
        self.apply_raw(&raw)
    }

    /// Takes over state and metadata from a fetched representation.
    pub(crate) fn apply_raw(&self, raw: &RawItem) -> Result<()> {
        let parsed = codec::decode(self.value_kind(), &raw.state)?;

        let quantity_type = self.metadata.read().quantity_type.clone();
        *self.metadata.write() = ItemMetadata::from_raw(raw, quantity_type);
        self.state.lock().apply(parsed);

        tracing::debug!(item = %self.name, state = %raw.state, "Refreshed item");
        Ok(())
    }

    /// Returns the locally known state without contacting the server.
    #[must_use]
    pub fn current_state(&self) -> Option<StateValue> {
        self.state.lock().value().cloned()
    }

    /// Returns the last raw state.
    #[must_use]
    pub fn raw_state(&self) -> Option<RawState> {
        self.state.lock().raw().cloned()
    }

    /// Returns the unit of measure of the current state, empty if none.
    #[must_use]
    pub fn unit(&self) -> String {
        self.state.lock().unit().to_string()
    }

    /// Returns when the last command was sent from this item.
    #[must_use]
    pub fn last_command_sent(&self) -> Option<Instant> {
        self.state.lock().last_command_sent()
    }

    /// Returns when the last update was sent from this item.
    #[must_use]
    pub fn last_update_sent(&self) -> Option<Instant> {
        self.state.lock().last_update_sent()
    }

    /// Returns `true` if the absent state was produced by `NULL`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Consistency`] if no raw state was ever recorded, or
    /// a refresh error for items without auto-update.
    pub async fn is_null(&self) -> Result<bool> {
        self.has_sentinel(&RawState::Null).await
    }

    /// Returns `true` if the absent state was produced by `UNDEF`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Consistency`] if no raw state was ever recorded, or
    /// a refresh error for items without auto-update.
    pub async fn is_undef(&self) -> Result<bool> {
        self.has_sentinel(&RawState::Undef).await
    }

    async fn has_sentinel(&self, sentinel: &RawState) -> Result<bool> {
        if !self.auto_update {
            self.refresh().await?;
        }

        let state = self.state.lock();
        if state.value().is_some() {
            return Ok(false);
        }
        match state.raw() {
            Some(raw) => Ok(raw == sentinel),
            None => Err(Error::Consistency(format!(
                "item {} has no raw state",
                self.name
            ))),
        }
    }

    // =========================================================================
    // Local changes
    // =========================================================================

    /// Sets the item state.
    ///
    /// Emits an internal `Update` event, or `Changed` if the state differs
    /// from the previous one. The local state is kept even if sending fails.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError`] if the value is not valid for the kind, or the
    /// transport error unchanged.
    pub async fn update(&self, value: impl Into<StateValue>) -> Result<Delivery> {
        let value = value.into();
        grammar::validate(self.value_kind(), &value)?;
        let wire = codec::format(&value);
        self.send_update(wire, Some(value)).await
    }

    /// Sets the item state to `NULL`, skipping validation.
    ///
    /// # Errors
    ///
    /// Returns the transport error unchanged.
    pub async fn update_to_null(&self) -> Result<Delivery> {
        self.send_update(NULL.to_string(), None).await
    }

    /// Sets the item state to `UNDEF`, skipping validation.
    ///
    /// # Errors
    ///
    /// Returns the transport error unchanged.
    pub async fn update_to_undef(&self) -> Result<Delivery> {
        self.send_update(UNDEF.to_string(), None).await
    }

    async fn send_update(&self, wire: String, value: Option<StateValue>) -> Result<Delivery> {
        let kind = self.value_kind();
        let (previous, current) = {
            let mut state = self.state.lock();
            let next = match value {
                Some(value) => outgoing(kind, &wire, value, state.unit()),
                None => ParsedState::absent(RawState::parse(&wire)),
            };
            let previous = state.commit(Origin::Update, next.clone());
            (previous, next)
        };

        tracing::debug!(item = %self.name, state = %wire, "Sending update");
        self.transport.send_update(&self.name, &wire).await?;

        let event = if same_state(&previous, &current) {
            ItemEvent::new(&self.name, EventKind::Update, EventOrigin::Internal, current)
        } else {
            ItemEvent::changed(&self.name, EventOrigin::Internal, current, previous)
        };
        Ok(self.deliver(event, false))
    }

    /// Sends a command to the item.
    ///
    /// Emits an internal `Command` event. The local state is kept even if
    /// sending fails.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::CommandsNotSupported`] for contacts,
    /// [`ValueError::Rejected`] if the value is not valid for the kind, or
    /// the transport error unchanged.
    pub async fn command(&self, value: impl Into<StateValue>) -> Result<Delivery> {
        let kind = self.value_kind();
        if !kind.accepts_commands() {
            return Err(ValueError::CommandsNotSupported {
                kind,
                item: self.name.clone(),
            }
            .into());
        }

        let value = value.into();
        grammar::validate(kind, &value)?;
        let wire = codec::format(&value);

        let current = {
            let mut state = self.state.lock();
            let next = outgoing(kind, &wire, value, state.unit());
            state.commit(Origin::Command, next.clone());
            next
        };

        tracing::debug!(item = %self.name, command = %wire, "Sending command");
        self.transport.send_command(&self.name, &wire).await?;

        let event = ItemEvent::new(&self.name, EventKind::Command, EventOrigin::Internal, current);
        Ok(self.deliver(event, false))
    }

    /// Deletes the item on the server.
    ///
    /// The local state becomes `NULL` and all listeners are removed.
    ///
    /// # Errors
    ///
    /// Returns the transport error unchanged.
    pub async fn delete(&self) -> Result<()> {
        self.transport.delete_item(&self.name).await?;
        self.state.lock().apply(ParsedState::absent(RawState::Null));
        self.listeners.clear();

        tracing::info!(item = %self.name, "Deleted item");
        Ok(())
    }

    // =========================================================================
    // Server events
    // =========================================================================

    /// Applies an event reported by the server.
    ///
    /// Returns `None` if the item does not follow the event stream.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`](crate::error::ParseError) if the new value
    /// does not parse for the item kind. An unparseable previous value of a
    /// `Changed` event is tolerated and reported as absent.
    pub fn on_external_event(&self, raw: &RawItemEvent) -> Result<Option<Delivery>> {
        if !self.auto_update {
            tracing::debug!(item = %self.name, "Ignoring event, auto-update is off");
            return Ok(None);
        }

        tracing::info!(
            item = %self.name,
            kind = %raw.kind,
            value = %raw.new_raw,
            "Processing external event"
        );

        let kind = self.value_kind();
        let new_state = codec::decode(kind, &raw.new_raw)?;
        let old_state = raw
            .old_raw
            .as_deref()
            .filter(|_| raw.kind == EventKind::Changed)
            .map(|old| {
                codec::decode(kind, old).unwrap_or_else(|e| {
                    tracing::debug!(item = %self.name, error = %e, "Unparseable previous state");
                    ParsedState::absent(RawState::parse(old))
                })
            });

        let echo = {
            let mut state = self.state.lock();
            let echo = raw.origin == EventOrigin::Remote
                && state.is_echo(&new_state, self.echo_window);
            if !echo {
                state.apply(new_state.clone());
            }
            echo
        };

        if echo {
            tracing::debug!(item = %self.name, kind = %raw.kind, "Recognized echo of local change");
        }

        let event = match old_state {
            Some(old_state) => ItemEvent::changed(&self.name, raw.origin, new_state, old_state),
            None => ItemEvent::new(&self.name, raw.kind, raw.origin, new_state),
        };
        Ok(Some(self.deliver(event, echo)))
    }

    fn deliver(&self, event: ItemEvent, echo: bool) -> Delivery {
        let outcome = self.listeners.dispatch(&event, echo);
        if !echo && let Some(bus) = &self.event_bus {
            bus.publish(event.clone());
        }

        Delivery {
            event,
            echo,
            outcome,
        }
    }

    // =========================================================================
    // Group members
    // =========================================================================

    /// Returns the members of a group item.
    ///
    /// Members are owned by the directory; members it no longer holds are
    /// skipped.
    #[must_use]
    pub fn members(&self) -> Vec<Arc<Item<T>>> {
        self.members
            .read()
            .values()
            .filter_map(Weak::upgrade)
            .collect()
    }

    /// Returns one member of a group item by name.
    #[must_use]
    pub fn member(&self, name: &str) -> Option<Arc<Item<T>>> {
        self.members.read().get(name).and_then(Weak::upgrade)
    }

    /// Returns the member names of a group item.
    #[must_use]
    pub fn member_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.members.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub(crate) fn set_members(&self, members: &[Arc<Item<T>>]) {
        *self.members.write() = members
            .iter()
            .map(|member| (member.name.clone(), Arc::downgrade(member)))
            .collect();
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.listener_count()
    }
}

impl<T: Transport> Subscribable for Item<T> {
    fn add_listener<F>(&self, options: &ListenerOptions, callback: F) -> SubscriptionId
    where
        F: Fn(&ItemEvent) + Send + Sync + 'static,
    {
        self.listeners.add(options, callback)
    }

    fn extend_listener(&self, id: SubscriptionId, options: &ListenerOptions) -> bool {
        self.listeners.extend(id, options)
    }

    fn remove_listener(&self, id: SubscriptionId, kinds: &[EventKind]) -> bool {
        self.listeners.remove_kinds(id, kinds)
    }

    fn remove_all_listeners(&self) {
        self.listeners.clear();
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }
}

impl<T: Transport> std::fmt::Debug for Item<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Item")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("base_kind", &self.base_kind)
            .field("raw_state", &self.raw_state())
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}

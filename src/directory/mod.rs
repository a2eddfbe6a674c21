// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Item directory.
//!
//! The [`Directory`] is the single owner of all [`Item`] instances. It
//! resolves item names to items, constructs items from raw server data and
//! routes server events to the item they concern.
//!
//! # Features
//!
//! - **One instance per name**: every lookup returns the same shared item
//! - **Group expansion**: group members are resolved through the directory
//! - **Retrying fetch**: transient transport failures are retried per
//!   [`RetryPolicy`]
//! - **Event routing**: raw events from any source reach their item, and
//!   everything items emit is republished on a broadcast bus

mod config;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::error::{Error, ParseError, Result, TransportError};
use crate::event::{EventBus, ItemEvent, RawItemEvent};
use crate::item::{Delivery, Item};
use crate::protocol::{RawItem, Transport};
use crate::types::ItemKind;

pub use config::{ItemDefaults, RetryPolicy};

/// Registry of the items mirrored from one openHAB server.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use openhab_items::{Directory, RestConfig, RestTransport};
/// use openhab_items::subscription::{ListenerOptions, Subscribable};
///
/// #[tokio::main]
/// async fn main() -> openhab_items::Result<()> {
///     let transport = RestTransport::new(RestConfig::new("http://openhab:8080/rest"))?;
///     let directory = Arc::new(Directory::new(transport));
///
///     let lamp = directory.get_item("Kitchen_Light").await?;
///     lamp.add_listener(&ListenerOptions::new(), |event| {
///         println!("{} -> {:?}", event.item_name(), event.new_value());
///     });
///
///     // Forward server events to the items
///     let pump = directory.listen().await?;
///
///     lamp.on().await?;
///     pump.await.ok();
///     Ok(())
/// }
/// ```
pub struct Directory<T: Transport> {
    transport: Arc<T>,
    defaults: ItemDefaults,
    items: RwLock<HashMap<String, Arc<Item<T>>>>,
    event_bus: EventBus,
}

impl<T: Transport> Directory<T> {
    /// Creates a directory with default item settings.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::with_defaults(transport, ItemDefaults::default())
    }

    /// Creates a directory with the given item settings.
    #[must_use]
    pub fn with_defaults(transport: T, defaults: ItemDefaults) -> Self {
        Self {
            transport: Arc::new(transport),
            event_bus: EventBus::with_capacity(defaults.event_capacity),
            defaults,
            items: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the settings applied to new items.
    #[must_use]
    pub fn defaults(&self) -> &ItemDefaults {
        &self.defaults
    }

    /// Returns the transport shared by all items.
    #[must_use]
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Returns a known item without contacting the server.
    #[must_use]
    pub fn item(&self, name: &str) -> Option<Arc<Item<T>>> {
        self.items.read().get(name).cloned()
    }

    /// Returns all known items.
    #[must_use]
    pub fn items(&self) -> Vec<Arc<Item<T>>> {
        self.items.read().values().cloned().collect()
    }

    /// Returns the number of known items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Returns `true` if no item is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Subscribes to every event the directory's items emit.
    ///
    /// Echoes of local changes are not published.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ItemEvent> {
        self.event_bus.subscribe()
    }

    // ========== Resolution ==========

    /// Returns the item for a name, fetching it from the server if unknown.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ItemNotFound`] if the server does not know the item,
    /// the last transport error once the retry policy is exhausted, or a
    /// [`ParseError`] if the item cannot be constructed.
    pub async fn get_item(&self, name: &str) -> Result<Arc<Item<T>>> {
        if let Some(item) = self.item(name) {
            return Ok(item);
        }

        let raw = self.fetch_with_retry(name).await?;
        self.resolve_or_construct(&raw)
    }

    async fn fetch_with_retry(&self, name: &str) -> Result<RawItem> {
        let policy = &self.defaults.retry;
        let mut attempts = 0;

        loop {
            match self.transport.fetch_item(name).await {
                Ok(raw) => return Ok(raw),
                Err(TransportError::NotFound(_)) => {
                    return Err(Error::ItemNotFound(name.to_string()));
                }
                Err(e) => {
                    attempts += 1;
                    if !e.is_transient() || !policy.should_retry(attempts) {
                        return Err(e.into());
                    }

                    let delay = policy.delay_for_attempt(attempts - 1);
                    tracing::debug!(
                        item = %name,
                        attempt = attempts,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "Retrying item fetch"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Returns the item for a raw representation, constructing it if unknown.
    ///
    /// An existing item is returned unchanged. A new group item resolves its
    /// members recursively; members of an unsupported kind are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the item or one of its members cannot be
    /// constructed. A group whose member fails is not kept; members built
    /// before the failure are.
    pub fn resolve_or_construct(&self, raw: &RawItem) -> Result<Arc<Item<T>>> {
        if let Some(item) = self.item(&raw.name) {
            return Ok(item);
        }

        let item = Arc::new(Item::from_raw(
            raw,
            Arc::clone(&self.transport),
            &self.defaults,
            Some(self.event_bus.clone()),
        )?);

        // Insert before expanding members so that a cycle resolves to this item
        let stored = Arc::clone(
            self.items
                .write()
                .entry(raw.name.clone())
                .or_insert_with(|| Arc::clone(&item)),
        );
        if !Arc::ptr_eq(&stored, &item) {
            return Ok(stored);
        }

        tracing::debug!(item = %raw.name, kind = %item.kind(), "Constructed item");

        if !raw.members.is_empty() {
            match self.resolve_members(raw) {
                Ok(members) => item.set_members(&members),
                Err(e) => {
                    self.discard(&raw.name, &item);
                    return Err(e);
                }
            }
        }

        Ok(item)
    }

    /// Refetches a known item and, for a group, resolves its members again.
    ///
    /// Unknown items are fetched as by [`get_item`](Self::get_item). On a
    /// member failure the group keeps its previous members.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ItemNotFound`] if the server no longer knows the
    /// item, the transport error, or a [`ParseError`] for the item or one of
    /// its members.
    pub async fn refresh_item(&self, name: &str) -> Result<Arc<Item<T>>> {
        let Some(item) = self.item(name) else {
            return self.get_item(name).await;
        };

        let raw = self.fetch_with_retry(name).await?;
        item.apply_raw(&raw)?;
        if item.kind() == ItemKind::Group {
            let members = self.resolve_members(&raw)?;
            item.set_members(&members);
        }

        Ok(item)
    }

    fn resolve_members(&self, raw: &RawItem) -> Result<Vec<Arc<Item<T>>>> {
        let mut members = Vec::with_capacity(raw.members.len());
        for member in &raw.members {
            match self.resolve_or_construct(member) {
                Ok(member) => members.push(member),
                Err(Error::Parse(ParseError::UnknownKind(kind))) => {
                    tracing::warn!(
                        group = %raw.name,
                        member = %member.name,
                        kind = %kind,
                        "Skipping group member of unsupported kind"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(members)
    }

    /// Removes `name` if it still maps to `item`.
    fn discard(&self, name: &str, item: &Arc<Item<T>>) {
        let mut items = self.items.write();
        if items.get(name).is_some_and(|stored| Arc::ptr_eq(stored, item)) {
            items.remove(name);
            tracing::debug!(item = %name, "Discarded partially built group");
        }
    }

    // ========== Lifecycle ==========

    /// Deletes an item on the server and forgets it.
    ///
    /// # Errors
    ///
    /// Returns the transport error unchanged.
    pub async fn delete_item(&self, name: &str) -> Result<()> {
        match self.item(name) {
            Some(item) => item.delete().await?,
            None => self.transport.delete_item(name).await?,
        }

        self.items.write().remove(name);
        Ok(())
    }

    // ========== Events ==========

    /// Routes a server event to its item.
    ///
    /// Events for items the directory does not know are ignored.
    ///
    /// # Errors
    ///
    /// Returns the item's error if the event cannot be applied.
    pub fn handle_event(&self, event: &RawItemEvent) -> Result<Option<Delivery>> {
        match self.item(&event.item_name) {
            Some(item) => item.on_external_event(event),
            None => {
                tracing::debug!(item = %event.item_name, "Ignoring event for unknown item");
                Ok(None)
            }
        }
    }

    /// Spawns a task that routes every event from `events` to its item.
    ///
    /// Events of one item are applied in arrival order. The task ends when
    /// the sender side is dropped.
    pub fn spawn_event_pump(
        self: &Arc<Self>,
        mut events: mpsc::Receiver<RawItemEvent>,
    ) -> JoinHandle<()> {
        let directory = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if let Err(e) = directory.handle_event(&event) {
                    tracing::warn!(
                        item = %event.item_name,
                        error = %e,
                        "Failed to apply event"
                    );
                }
            }
            tracing::debug!("Event source closed");
        })
    }
}

#[cfg(feature = "http")]
impl Directory<crate::protocol::RestTransport> {
    /// Opens the server event stream and routes it to the items.
    ///
    /// # Errors
    ///
    /// Returns error if the event stream cannot be opened.
    pub async fn listen(self: &Arc<Self>) -> Result<JoinHandle<()>> {
        let events = self.transport.open_event_stream().await?;
        Ok(self.spawn_event_pump(events))
    }
}

impl<T: Transport> std::fmt::Debug for Directory<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Directory")
            .field("items", &self.len())
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::protocol::{MemoryTransport, Request};
    use crate::types::StateValue;
    use std::time::Duration;

    fn directory(items: Vec<RawItem>) -> Directory<MemoryTransport> {
        let transport = items
            .into_iter()
            .fold(MemoryTransport::new(), MemoryTransport::with_item);
        Directory::new(transport)
    }

    #[tokio::test]
    async fn get_item_returns_same_instance() {
        let directory = directory(vec![RawItem::new("Lamp", "Switch", "ON")]);

        let first = directory.get_item("Lamp").await.unwrap();
        let second = directory.get_item("Lamp").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(directory.len(), 1);
        assert_eq!(directory.transport().requests().len(), 1);
    }

    #[tokio::test]
    async fn missing_item_is_not_found_without_retry() {
        let directory = directory(vec![]);
        let err = directory.get_item("Ghost").await.unwrap_err();
        assert!(matches!(err, Error::ItemNotFound(name) if name == "Ghost"));
        assert_eq!(directory.transport().requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried() {
        let directory = directory(vec![RawItem::new("Lamp", "Switch", "ON")]);
        let transport = directory.transport();
        transport.fail_next(TransportError::Status {
            status: 503,
            path: "/items/Lamp".to_string(),
        });
        transport.fail_next(TransportError::ChannelClosed("reset".to_string()));

        let lamp = directory.get_item("Lamp").await.unwrap();

        assert_eq!(lamp.current_state(), Some(StateValue::from("ON")));
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_are_bounded() {
        let transport = MemoryTransport::new().with_item(RawItem::new("Lamp", "Switch", "ON"));
        for _ in 0..5 {
            transport.fail_next(TransportError::ChannelClosed("reset".to_string()));
        }
        let defaults = ItemDefaults::new().with_retry(
            RetryPolicy::new()
                .with_max_attempts(3)
                .with_delay(Duration::from_millis(10)),
        );
        let directory = Directory::with_defaults(transport, defaults);

        let err = directory.get_item("Lamp").await.unwrap_err();

        assert!(matches!(err, Error::Transport(TransportError::ChannelClosed(_))));
        assert_eq!(directory.transport().requests().len(), 3);
    }

    #[tokio::test]
    async fn permanent_failures_are_not_retried() {
        let directory = directory(vec![RawItem::new("Lamp", "Switch", "ON")]);
        directory
            .transport()
            .fail_next(TransportError::AuthenticationFailed);

        assert!(directory.get_item("Lamp").await.is_err());
        assert_eq!(directory.transport().requests().len(), 1);
    }

    #[test]
    fn group_members_are_resolved() {
        let directory = directory(vec![]);
        let raw = RawItem::new("Lights", "Group", "ON")
            .with_group_type("Switch")
            .with_member(RawItem::new("Lamp_1", "Switch", "ON"))
            .with_member(RawItem::new("Lamp_2", "Switch", "OFF"))
            .with_member(RawItem::new("Camera", "Image", "NULL"));

        let group = directory.resolve_or_construct(&raw).unwrap();

        assert_eq!(group.kind(), ItemKind::Group);
        assert_eq!(group.member_names(), ["Lamp_1", "Lamp_2"]);
        let lamp = directory.item("Lamp_1").unwrap();
        assert!(Arc::ptr_eq(&group.member("Lamp_1").unwrap(), &lamp));
        assert_eq!(directory.len(), 3);
    }

    #[test]
    fn known_member_is_reused() {
        let directory = directory(vec![]);
        let lamp = directory
            .resolve_or_construct(&RawItem::new("Lamp_1", "Switch", "ON"))
            .unwrap();

        let raw = RawItem::new("Lights", "Group", "ON")
            .with_member(RawItem::new("Lamp_1", "Switch", "OFF"));
        let group = directory.resolve_or_construct(&raw).unwrap();

        assert!(Arc::ptr_eq(&group.members()[0], &lamp));
        assert_eq!(lamp.current_state(), Some(StateValue::from("ON")));
    }

    #[test]
    fn failed_member_discards_group() {
        let directory = directory(vec![]);
        let raw = RawItem::new("Temps", "Group", "NULL")
            .with_group_type("Number")
            .with_member(RawItem::new("Temp_1", "Number", "21"))
            .with_member(RawItem::new("Temp_2", "Number", "warm"));

        let err = directory.resolve_or_construct(&raw).unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::InvalidState { .. })));
        assert!(directory.item("Temps").is_none());
        assert!(directory.item("Temp_1").is_some());

        // A second resolution fails again instead of returning a stale group
        assert!(directory.resolve_or_construct(&raw).is_err());
        assert!(directory.item("Temps").is_none());
    }

    #[tokio::test]
    async fn refresh_item_resolves_changed_members() {
        let group = RawItem::new("Lights", "Group", "OFF")
            .with_group_type("Switch")
            .with_member(RawItem::new("Lamp_1", "Switch", "OFF"))
            .with_member(RawItem::new("Lamp_2", "Switch", "OFF"));
        let directory = directory(vec![group]);
        let lights = directory.get_item("Lights").await.unwrap();
        let lamp_1 = directory.item("Lamp_1").unwrap();

        directory.transport().insert(
            RawItem::new("Lights", "Group", "ON")
                .with_group_type("Switch")
                .with_member(RawItem::new("Lamp_1", "Switch", "ON"))
                .with_member(RawItem::new("Lamp_3", "Switch", "ON")),
        );

        // Plain refresh updates the state only
        lights.refresh().await.unwrap();
        assert_eq!(lights.current_state(), Some(StateValue::from("ON")));
        assert_eq!(lights.member_names(), ["Lamp_1", "Lamp_2"]);

        let refreshed = directory.refresh_item("Lights").await.unwrap();
        assert!(Arc::ptr_eq(&refreshed, &lights));
        assert_eq!(lights.member_names(), ["Lamp_1", "Lamp_3"]);
        assert!(Arc::ptr_eq(&lights.member("Lamp_1").unwrap(), &lamp_1));
        assert!(directory.item("Lamp_3").is_some());
    }

    #[tokio::test]
    async fn refresh_item_keeps_members_on_failure() {
        let group = RawItem::new("Temps", "Group", "NULL")
            .with_group_type("Number")
            .with_member(RawItem::new("Temp_1", "Number", "21"));
        let directory = directory(vec![group]);
        let temps = directory.get_item("Temps").await.unwrap();

        directory.transport().insert(
            RawItem::new("Temps", "Group", "NULL")
                .with_group_type("Number")
                .with_member(RawItem::new("Temp_2", "Number", "warm")),
        );

        assert!(directory.refresh_item("Temps").await.is_err());
        assert_eq!(temps.member_names(), ["Temp_1"]);
        assert!(directory.item("Temps").is_some());
    }

    #[test]
    fn zero_event_capacity_is_usable() {
        let defaults = ItemDefaults::new().with_event_capacity(0);
        let directory = Directory::with_defaults(MemoryTransport::new(), defaults);
        directory
            .resolve_or_construct(&RawItem::new("Lamp", "Switch", "OFF"))
            .unwrap();
        let mut bus = directory.subscribe();

        directory
            .handle_event(&RawItemEvent::remote("Lamp", EventKind::Update, "ON"))
            .unwrap();

        assert_eq!(bus.try_recv().unwrap().item_name(), "Lamp");
    }

    #[test]
    fn handle_event_routes_and_ignores_unknown() {
        let directory = directory(vec![]);
        let lamp = directory
            .resolve_or_construct(&RawItem::new("Lamp", "Switch", "OFF"))
            .unwrap();
        let mut bus = directory.subscribe();

        let delivery = directory
            .handle_event(&RawItemEvent::remote("Lamp", EventKind::Update, "ON"))
            .unwrap()
            .unwrap();
        assert!(!delivery.echo);
        assert_eq!(lamp.current_state(), Some(StateValue::from("ON")));
        assert_eq!(bus.try_recv().unwrap().item_name(), "Lamp");

        let ignored = directory
            .handle_event(&RawItemEvent::remote("Other", EventKind::Update, "ON"))
            .unwrap();
        assert!(ignored.is_none());
    }

    #[tokio::test]
    async fn event_pump_applies_events_in_order() {
        let directory = Arc::new(directory(vec![]));
        let temp = directory
            .resolve_or_construct(&RawItem::new("Temp", "Number", "0"))
            .unwrap();

        let (tx, rx) = mpsc::channel(8);
        let pump = directory.spawn_event_pump(rx);
        for value in ["1", "2", "bogus", "3"] {
            tx.send(RawItemEvent::remote("Temp", EventKind::Update, value))
                .await
                .unwrap();
        }
        drop(tx);
        pump.await.unwrap();

        assert_eq!(temp.current_state(), Some(StateValue::Decimal(3.0)));
    }

    #[tokio::test]
    async fn delete_item_forgets_it() {
        let directory = directory(vec![RawItem::new("Lamp", "Switch", "ON")]);
        directory.get_item("Lamp").await.unwrap();

        directory.delete_item("Lamp").await.unwrap();

        assert!(directory.item("Lamp").is_none());
        assert_eq!(
            directory.transport().requests().last(),
            Some(&Request::Delete {
                item: "Lamp".to_string()
            })
        );
    }
}

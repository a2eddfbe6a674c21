// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Item event types.

use std::fmt;

use crate::types::{ParsedState, RawState, StateValue};

/// The kind of state transition an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The state was set.
    Update,
    /// A command was sent to the item.
    Command,
    /// The state was set to a different value.
    Changed,
}

impl EventKind {
    /// All event kinds.
    pub const ALL: [Self; 3] = [Self::Update, Self::Command, Self::Changed];

    /// Returns the kind name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Update => "Update",
            Self::Command => "Command",
            Self::Changed => "Changed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a transition originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventOrigin {
    /// Caused by a call on the local item.
    Internal,
    /// Reported by the server's event stream.
    Remote,
}

impl fmt::Display for EventOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal => f.write_str("Internal"),
            Self::Remote => f.write_str("Remote"),
        }
    }
}

/// The state an item held before a `Changed` transition.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviousState {
    value: Option<StateValue>,
    raw: RawState,
    unit: String,
}

impl PreviousState {
    /// Returns the previous native value.
    #[must_use]
    pub fn value(&self) -> Option<&StateValue> {
        self.value.as_ref()
    }

    /// Returns the previous raw state.
    #[must_use]
    pub fn raw(&self) -> &RawState {
        &self.raw
    }

    /// Returns the previous unit, empty when there was none.
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }
}

impl From<ParsedState> for PreviousState {
    fn from(parsed: ParsedState) -> Self {
        Self {
            value: parsed.value,
            raw: parsed.raw,
            unit: parsed.unit,
        }
    }
}

/// An immutable record of one item state transition.
///
/// Events are built once per transition, handed to the item's listeners and
/// published on the directory event bus.
///
/// # Examples
///
/// ```
/// use openhab_items::event::{EventKind, EventOrigin, ItemEvent};
/// use openhab_items::types::{codec, ItemKind, StateValue};
///
/// let state = codec::decode(ItemKind::Switch, "ON").unwrap();
/// let event = ItemEvent::new("Kitchen_Light", EventKind::Command, EventOrigin::Internal, state);
///
/// assert_eq!(event.item_name(), "Kitchen_Light");
/// assert_eq!(event.new_value(), Some(&StateValue::from("ON")));
/// assert!(event.previous().is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ItemEvent {
    item_name: String,
    kind: EventKind,
    origin: EventOrigin,
    new_value: Option<StateValue>,
    new_raw: RawState,
    unit: String,
    previous: Option<PreviousState>,
}

impl ItemEvent {
    /// Creates an event without previous state.
    #[must_use]
    pub fn new(
        item_name: impl Into<String>,
        kind: EventKind,
        origin: EventOrigin,
        new_state: ParsedState,
    ) -> Self {
        Self {
            item_name: item_name.into(),
            kind,
            origin,
            new_value: new_state.value,
            new_raw: new_state.raw,
            unit: new_state.unit,
            previous: None,
        }
    }

    /// Creates a `Changed` event.
    #[must_use]
    pub fn changed(
        item_name: impl Into<String>,
        origin: EventOrigin,
        new_state: ParsedState,
        old_state: ParsedState,
    ) -> Self {
        Self {
            previous: Some(old_state.into()),
            ..Self::new(item_name, EventKind::Changed, origin, new_state)
        }
    }

    /// Returns the name of the item this event belongs to.
    #[must_use]
    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    /// Returns the event kind.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Returns the event origin.
    #[must_use]
    pub fn origin(&self) -> EventOrigin {
        self.origin
    }

    /// Returns `true` if the event came from the server.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.origin == EventOrigin::Remote
    }

    /// Returns the new native value, `None` for `UNDEF` and `NULL`.
    #[must_use]
    pub fn new_value(&self) -> Option<&StateValue> {
        self.new_value.as_ref()
    }

    /// Returns the new raw state.
    #[must_use]
    pub fn new_raw(&self) -> &RawState {
        &self.new_raw
    }

    /// Returns the unit of the new value, empty when there is none.
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Returns the previous state of a `Changed` event.
    #[must_use]
    pub fn previous(&self) -> Option<&PreviousState> {
        self.previous.as_ref()
    }
}

/// An undecoded event as reported by the server.
///
/// Event sources produce these; the owning item parses the raw values with
/// its own codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItemEvent {
    /// The item the event is about.
    pub item_name: String,
    /// The event kind.
    pub kind: EventKind,
    /// The new raw state or command.
    pub new_raw: String,
    /// The previous raw state, only for `Changed` events.
    pub old_raw: Option<String>,
    /// Where the event originated.
    pub origin: EventOrigin,
}

impl RawItemEvent {
    /// Creates a remote event without a previous state.
    #[must_use]
    pub fn remote(item_name: impl Into<String>, kind: EventKind, new_raw: impl Into<String>) -> Self {
        Self {
            item_name: item_name.into(),
            kind,
            new_raw: new_raw.into(),
            old_raw: None,
            origin: EventOrigin::Remote,
        }
    }

    /// Creates a remote `Changed` event.
    #[must_use]
    pub fn remote_changed(
        item_name: impl Into<String>,
        new_raw: impl Into<String>,
        old_raw: impl Into<String>,
    ) -> Self {
        Self {
            old_raw: Some(old_raw.into()),
            ..Self::remote(item_name, EventKind::Changed, new_raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ItemKind, codec};

    #[test]
    fn event_without_previous() {
        let state = codec::decode(ItemKind::Number, "21.5 °C").unwrap();
        let event = ItemEvent::new("Temp", EventKind::Update, EventOrigin::Remote, state);

        assert_eq!(event.kind(), EventKind::Update);
        assert!(event.is_remote());
        assert_eq!(event.new_value(), Some(&StateValue::Decimal(21.5)));
        assert_eq!(event.unit(), "°C");
        assert!(event.previous().is_none());
    }

    #[test]
    fn changed_event_keeps_previous() {
        let new_state = codec::decode(ItemKind::Switch, "ON").unwrap();
        let old_state = codec::decode(ItemKind::Switch, "NULL").unwrap();
        let event = ItemEvent::changed("Light", EventOrigin::Internal, new_state, old_state);

        assert_eq!(event.kind(), EventKind::Changed);
        assert!(!event.is_remote());
        let previous = event.previous().unwrap();
        assert!(previous.value().is_none());
        assert_eq!(previous.raw(), &RawState::Null);
        assert!(previous.unit().is_empty());
    }

    #[test]
    fn raw_event_constructors() {
        let raw = RawItemEvent::remote_changed("Light", "ON", "OFF");
        assert_eq!(raw.kind, EventKind::Changed);
        assert_eq!(raw.origin, EventOrigin::Remote);
        assert_eq!(raw.old_raw.as_deref(), Some("OFF"));

        let raw = RawItemEvent::remote("Light", EventKind::Command, "OFF");
        assert!(raw.old_raw.is_none());
    }

    #[test]
    fn kind_display() {
        assert_eq!(EventKind::Changed.to_string(), "Changed");
        assert_eq!(EventOrigin::Remote.to_string(), "Remote");
        assert_eq!(EventKind::ALL.len(), 3);
    }
}

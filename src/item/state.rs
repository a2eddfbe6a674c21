// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mutable item state and descriptive metadata.

use std::time::Duration;

use tokio::time::Instant;

use crate::protocol::RawItem;
use crate::types::{ItemKind, ParsedState, RawState, StateValue};

/// Descriptive data of an item, as reported by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemMetadata {
    /// Display label.
    pub label: Option<String>,
    /// Icon category.
    pub category: Option<String>,
    /// Tags.
    pub tags: Vec<String>,
    /// Groups the item belongs to.
    pub group_names: Vec<String>,
    /// Whether the definition can be changed through the API.
    pub editable: bool,
    /// Quantity type of dimensioned numbers (`Temperature` for
    /// `Number:Temperature`).
    pub quantity_type: Option<String>,
}

impl ItemMetadata {
    pub(crate) fn from_raw(raw: &RawItem, quantity_type: Option<String>) -> Self {
        Self {
            label: raw.label.clone(),
            category: raw.category.clone(),
            tags: raw.tags.clone(),
            group_names: raw.group_names.clone(),
            editable: raw.editable,
            quantity_type,
        }
    }
}

/// Which timestamp a local change stamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    Update,
    Command,
}

/// The part of an item guarded by its mutex.
///
/// `value` is `None` exactly when `raw` holds a sentinel or was never set.
#[derive(Debug, Default)]
pub(crate) struct ItemState {
    value: Option<StateValue>,
    raw: Option<RawState>,
    unit: String,
    last_command_sent: Option<Instant>,
    last_update_sent: Option<Instant>,
}

impl ItemState {
    pub(crate) fn new(initial: ParsedState) -> Self {
        let mut state = Self::default();
        state.apply(initial);
        state
    }

    pub(crate) fn value(&self) -> Option<&StateValue> {
        self.value.as_ref()
    }

    pub(crate) fn raw(&self) -> Option<&RawState> {
        self.raw.as_ref()
    }

    pub(crate) fn unit(&self) -> &str {
        &self.unit
    }

    pub(crate) fn last_command_sent(&self) -> Option<Instant> {
        self.last_command_sent
    }

    pub(crate) fn last_update_sent(&self) -> Option<Instant> {
        self.last_update_sent
    }

    /// Overwrites value, raw state and unit.
    pub(crate) fn apply(&mut self, parsed: ParsedState) {
        self.value = parsed.value;
        self.raw = Some(parsed.raw);
        self.unit = parsed.unit;
    }

    /// Returns the current state as a parsed record.
    pub(crate) fn snapshot(&self) -> ParsedState {
        ParsedState {
            value: self.value.clone(),
            unit: self.unit.clone(),
            raw: self.raw.clone().unwrap_or(RawState::Null),
        }
    }

    /// Commits a local change: stamps the send time and applies the new
    /// state, returning the previous one.
    pub(crate) fn commit(&mut self, origin: Origin, parsed: ParsedState) -> ParsedState {
        let previous = self.snapshot();
        let now = Instant::now();
        match origin {
            Origin::Update => self.last_update_sent = Some(now),
            Origin::Command => self.last_command_sent = Some(now),
        }
        self.apply(parsed);
        previous
    }

    /// Returns `true` if `incoming` matches the current state and a local
    /// change was sent less than `window` ago.
    ///
    /// Absent values match only when both carry the same sentinel.
    pub(crate) fn is_echo(&self, incoming: &ParsedState, window: Duration) -> bool {
        if !same_state(&self.snapshot(), incoming) {
            return false;
        }

        let last_sent = self.last_command_sent.max(self.last_update_sent);
        last_sent.is_some_and(|sent| sent + window > Instant::now())
    }
}

/// Compares two states by value, falling back to the raw sentinel when
/// neither holds a value.
pub(crate) fn same_state(a: &ParsedState, b: &ParsedState) -> bool {
    match (&a.value, &b.value) {
        (None, None) => a.raw == b.raw,
        (left, right) => left == right,
    }
}

/// Builds the local state for a value about to be sent.
///
/// The value is normalized to what the server will echo back; the unit is
/// carried over from the current state.
pub(crate) fn outgoing(kind: ItemKind, wire: &str, value: StateValue, unit: &str) -> ParsedState {
    let raw = RawState::parse(wire);
    if raw.is_sentinel() {
        return ParsedState::absent(raw);
    }

    ParsedState {
        value: Some(crate::types::codec::normalize(kind, value)),
        unit: unit.to_string(),
        raw,
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Item events.
//!
//! An [`ItemEvent`] describes one state transition of an item, tagged with
//! its [`EventKind`] and [`EventOrigin`]. Event sources deliver
//! [`RawItemEvent`]s, which the owning item decodes. The [`EventBus`]
//! broadcasts every event that is not an echo to directory-wide subscribers.

mod event_bus;
mod item_event;

pub use event_bus::{DEFAULT_CHANNEL_CAPACITY, EventBus};
pub use item_event::{EventKind, EventOrigin, ItemEvent, PreviousState, RawItemEvent};

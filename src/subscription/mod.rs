// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Listener subscriptions for item events.
//!
//! Every item owns a [`ListenerRegistry`]. A listener is registered with
//! [`ListenerOptions`] describing which events it wants:
//!
//! - **kinds**: `Update`, `Command`, `Changed`; none given means all
//! - **remote only** (default `true`): skip events caused by local calls
//! - **echoes** (default `false`): also receive server events that merely
//!   echo a change this item just sent
//!
//! Registration returns a [`SubscriptionId`] used to extend, shrink or
//! remove the listener later.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! use openhab_items::event::{EventKind, EventOrigin, ItemEvent};
//! use openhab_items::subscription::{ListenerOptions, ListenerRegistry};
//! use openhab_items::types::{codec, ItemKind};
//!
//! let registry = ListenerRegistry::new();
//! let seen = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&seen);
//!
//! registry.add(&ListenerOptions::new().with_kind(EventKind::Update), move |_| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! let state = codec::decode(ItemKind::Switch, "OFF").unwrap();
//! let event = ItemEvent::new("Light", EventKind::Update, EventOrigin::Remote, state);
//! let outcome = registry.dispatch(&event, false);
//!
//! assert_eq!(outcome.delivered, 1);
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//! ```

mod listener;
mod registry;
mod subscribable;

pub use listener::ListenerOptions;
pub use registry::{DispatchOutcome, ListenerRegistry, SubscriptionId};
pub use subscribable::Subscribable;

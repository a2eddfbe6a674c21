// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscribable trait for types that deliver item events.

use crate::event::{EventKind, ItemEvent};
use crate::subscription::{ListenerOptions, SubscriptionId};

/// Trait for types that accept event listeners.
///
/// # Examples
///
/// ```no_run
/// use openhab_items::event::EventKind;
/// use openhab_items::subscription::{ListenerOptions, Subscribable};
/// use openhab_items::{Directory, RestConfig, RestTransport};
///
/// # async fn example() -> openhab_items::Result<()> {
/// let transport = RestTransport::new(RestConfig::new("http://openhab:8080/rest"))?;
/// let directory = Directory::new(transport);
/// let light = directory.get_item("Kitchen_Light").await?;
///
/// let id = light.add_listener(&ListenerOptions::new().with_kind(EventKind::Changed), |event| {
///     println!("{} is now {:?}", event.item_name(), event.new_value());
/// });
///
/// // Also hear about local commands
/// light.extend_listener(
///     id,
///     &ListenerOptions::new().with_kind(EventKind::Command).with_remote_only(false),
/// );
///
/// light.unsubscribe(id);
/// # Ok(())
/// # }
/// ```
pub trait Subscribable {
    /// Registers a listener and returns its subscription token.
    fn add_listener<F>(&self, options: &ListenerOptions, callback: F) -> SubscriptionId
    where
        F: Fn(&ItemEvent) + Send + Sync + 'static;

    /// Adds the kinds of `options` to a listener and replaces its origin
    /// filter.
    ///
    /// Returns `false` if the subscription is unknown.
    fn extend_listener(&self, id: SubscriptionId, options: &ListenerOptions) -> bool;

    /// Removes kinds from a listener, all of them for an empty slice.
    ///
    /// The listener is deregistered once no kinds remain. Returns `false` if
    /// the subscription is unknown.
    fn remove_listener(&self, id: SubscriptionId, kinds: &[EventKind]) -> bool;

    /// Deregisters every listener.
    fn remove_all_listeners(&self);

    /// Deregisters a listener.
    ///
    /// Returns `true` if the subscription was found and removed.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

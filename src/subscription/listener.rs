// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event listeners and their interest filters.

use std::collections::HashSet;
use std::sync::Arc;

use crate::event::{EventKind, EventOrigin, ItemEvent};

/// Type alias for listener callbacks.
pub(crate) type ListenerCallback = Arc<dyn Fn(&ItemEvent) + Send + Sync>;

/// Interest filter used when adding or extending a listener.
///
/// By default a listener wants every event kind, only events reported by
/// the server, and no echoes of its own item's changes.
///
/// # Examples
///
/// ```
/// use openhab_items::event::EventKind;
/// use openhab_items::subscription::ListenerOptions;
///
/// // Commands from anywhere, including local ones
/// let options = ListenerOptions::new()
///     .with_kind(EventKind::Command)
///     .with_remote_only(false);
///
/// assert!(!options.remote_only());
/// assert_eq!(options.kinds(), &[EventKind::Command]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerOptions {
    kinds: Vec<EventKind>,
    remote_only: bool,
    include_echoes: bool,
}

impl ListenerOptions {
    /// Creates options for all event kinds, remote origin only, no echoes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            kinds: Vec::new(),
            remote_only: true,
            include_echoes: false,
        }
    }

    /// Adds one event kind of interest.
    #[must_use]
    pub fn with_kind(mut self, kind: EventKind) -> Self {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
        self
    }

    /// Adds several event kinds of interest.
    #[must_use]
    pub fn with_kinds(self, kinds: impl IntoIterator<Item = EventKind>) -> Self {
        kinds.into_iter().fold(self, Self::with_kind)
    }

    /// Sets whether only server-reported events are delivered.
    #[must_use]
    pub fn with_remote_only(mut self, remote_only: bool) -> Self {
        self.remote_only = remote_only;
        self
    }

    /// Sets whether echoes of this item's own changes are delivered.
    #[must_use]
    pub fn with_echoes(mut self, include_echoes: bool) -> Self {
        self.include_echoes = include_echoes;
        self
    }

    /// Returns the explicitly requested kinds, empty meaning "all".
    #[must_use]
    pub fn kinds(&self) -> &[EventKind] {
        &self.kinds
    }

    /// Returns `true` if only server-reported events are wanted.
    #[must_use]
    pub fn remote_only(&self) -> bool {
        self.remote_only
    }

    /// Returns `true` if echoes are wanted.
    #[must_use]
    pub fn include_echoes(&self) -> bool {
        self.include_echoes
    }
}

impl Default for ListenerOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// A registered listener: interest filter plus callback.
pub(crate) struct EventListener {
    kinds: HashSet<EventKind>,
    remote_only: bool,
    include_echoes: bool,
    callback: ListenerCallback,
}

impl EventListener {
    pub(crate) fn new(options: &ListenerOptions, callback: ListenerCallback) -> Self {
        let kinds = if options.kinds.is_empty() {
            EventKind::ALL.into_iter().collect()
        } else {
            options.kinds.iter().copied().collect()
        };

        Self {
            kinds,
            remote_only: options.remote_only,
            include_echoes: options.include_echoes,
            callback,
        }
    }

    /// Unions the kinds and takes over the origin filter.
    ///
    /// The echo policy stays as registered.
    pub(crate) fn extend(&mut self, options: &ListenerOptions) {
        self.kinds.extend(options.kinds.iter().copied());
        self.remote_only = options.remote_only;
    }

    /// Removes kinds; an empty slice removes all of them.
    pub(crate) fn remove_kinds(&mut self, kinds: &[EventKind]) {
        if kinds.is_empty() {
            self.kinds.clear();
        } else {
            for kind in kinds {
                self.kinds.remove(kind);
            }
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub(crate) fn kinds(&self) -> &HashSet<EventKind> {
        &self.kinds
    }

    pub(crate) fn callback(&self) -> &ListenerCallback {
        &self.callback
    }

    /// Decides whether this listener receives `event`.
    ///
    /// Remote events are filtered by the echo policy, internal events by the
    /// origin filter.
    pub(crate) fn wants(&self, event: &ItemEvent, echo: bool) -> bool {
        if !self.kinds.contains(&event.kind()) {
            return false;
        }

        match event.origin() {
            EventOrigin::Remote => !echo || self.include_echoes,
            EventOrigin::Internal => !self.remote_only,
        }
    }
}

impl std::fmt::Debug for EventListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventListener")
            .field("kinds", &self.kinds)
            .field("remote_only", &self.remote_only)
            .field("include_echoes", &self.include_echoes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ItemKind, codec};

    fn noop() -> ListenerCallback {
        Arc::new(|_| {})
    }

    fn event(kind: EventKind, origin: EventOrigin) -> ItemEvent {
        let state = codec::decode(ItemKind::Switch, "ON").unwrap();
        ItemEvent::new("Light", kind, origin, state)
    }

    #[test]
    fn default_options() {
        let options = ListenerOptions::default();
        assert!(options.kinds().is_empty());
        assert!(options.remote_only());
        assert!(!options.include_echoes());
    }

    #[test]
    fn with_kinds_deduplicates() {
        let options = ListenerOptions::new().with_kinds([
            EventKind::Update,
            EventKind::Update,
            EventKind::Changed,
        ]);
        assert_eq!(options.kinds(), &[EventKind::Update, EventKind::Changed]);
    }

    #[test]
    fn empty_kinds_mean_all() {
        let listener = EventListener::new(&ListenerOptions::new(), noop());
        assert_eq!(listener.kinds().len(), 3);
    }

    #[test]
    fn extend_unions_and_overwrites_origin_filter() {
        let options = ListenerOptions::new()
            .with_kind(EventKind::Command)
            .with_echoes(true);
        let mut listener = EventListener::new(&options, noop());

        listener.extend(
            &ListenerOptions::new()
                .with_kind(EventKind::Changed)
                .with_remote_only(false),
        );

        assert!(listener.kinds().contains(&EventKind::Command));
        assert!(listener.kinds().contains(&EventKind::Changed));
        assert!(!listener.remote_only);
        assert!(listener.include_echoes);
    }

    #[test]
    fn extend_without_kinds_keeps_kinds() {
        let options = ListenerOptions::new().with_kind(EventKind::Update);
        let mut listener = EventListener::new(&options, noop());
        listener.extend(&ListenerOptions::new());
        assert_eq!(listener.kinds().len(), 1);
    }

    #[test]
    fn remove_kinds() {
        let mut listener = EventListener::new(&ListenerOptions::new(), noop());
        listener.remove_kinds(&[EventKind::Update]);
        assert_eq!(listener.kinds().len(), 2);
        assert!(!listener.is_empty());

        listener.remove_kinds(&[]);
        assert!(listener.is_empty());
    }

    #[test]
    fn wants_filters_by_kind_origin_and_echo() {
        let listener = EventListener::new(
            &ListenerOptions::new().with_kind(EventKind::Command),
            noop(),
        );

        assert!(listener.wants(&event(EventKind::Command, EventOrigin::Remote), false));
        assert!(!listener.wants(&event(EventKind::Command, EventOrigin::Remote), true));
        assert!(!listener.wants(&event(EventKind::Update, EventOrigin::Remote), false));
        assert!(!listener.wants(&event(EventKind::Command, EventOrigin::Internal), false));

        let any_origin = EventListener::new(
            &ListenerOptions::new().with_remote_only(false).with_echoes(true),
            noop(),
        );
        assert!(any_origin.wants(&event(EventKind::Update, EventOrigin::Internal), false));
        assert!(any_origin.wants(&event(EventKind::Changed, EventOrigin::Remote), true));
    }
}

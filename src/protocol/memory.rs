// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory transport.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use crate::error::TransportError;
use crate::protocol::{RawItem, Transport};

/// A request received by a [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// A state update.
    Update {
        /// Target item.
        item: String,
        /// Wire state.
        state: String,
    },
    /// A command.
    Command {
        /// Target item.
        item: String,
        /// Wire command.
        command: String,
    },
    /// An item fetch.
    Fetch {
        /// Target item.
        item: String,
    },
    /// An item deletion.
    Delete {
        /// Target item.
        item: String,
    },
}

/// A transport that serves items from memory and records every request.
///
/// Updates and commands set the stored state the way a server with
/// auto-update enabled would. Queued failures are returned by the next
/// requests in order, without touching the stored items.
///
/// # Examples
///
/// ```
/// use openhab_items::protocol::{MemoryTransport, RawItem, Request, Transport};
///
/// # async fn example() {
/// let transport = MemoryTransport::new().with_item(RawItem::new("Lamp", "Switch", "OFF"));
///
/// transport.send_command("Lamp", "ON").await.unwrap();
///
/// assert_eq!(transport.item_state("Lamp").as_deref(), Some("ON"));
/// assert_eq!(
///     transport.requests(),
///     vec![Request::Command { item: "Lamp".into(), command: "ON".into() }]
/// );
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryTransport {
    items: Mutex<HashMap<String, RawItem>>,
    requests: Mutex<Vec<Request>>,
    failures: Mutex<VecDeque<TransportError>>,
}

impl MemoryTransport {
    /// Creates an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an item, builder style.
    #[must_use]
    pub fn with_item(self, item: RawItem) -> Self {
        self.insert(item);
        self
    }

    /// Adds or replaces an item.
    pub fn insert(&self, item: RawItem) {
        self.items.lock().insert(item.name.clone(), item);
    }

    /// Sets the stored state of an item, if present.
    pub fn set_state(&self, item: &str, state: &str) {
        if let Some(raw) = self.items.lock().get_mut(item) {
            raw.state = state.to_string();
        }
    }

    /// Returns the stored state of an item.
    #[must_use]
    pub fn item_state(&self, item: &str) -> Option<String> {
        self.items.lock().get(item).map(|raw| raw.state.clone())
    }

    /// Queues an error for the next request.
    pub fn fail_next(&self, error: TransportError) {
        self.failures.lock().push_back(error);
    }

    /// Returns all requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    /// Returns and forgets all requests received so far.
    pub fn take_requests(&self) -> Vec<Request> {
        std::mem::take(&mut *self.requests.lock())
    }

    fn record(&self, request: Request) -> Result<(), TransportError> {
        self.requests.lock().push(request);
        match self.failures.lock().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn store_state(&self, item: &str, state: &str) -> Result<(), TransportError> {
        match self.items.lock().get_mut(item) {
            Some(raw) => {
                raw.state = state.to_string();
                Ok(())
            }
            None => Err(TransportError::NotFound(item.to_string())),
        }
    }
}

impl Transport for MemoryTransport {
    async fn send_update(&self, item: &str, state: &str) -> Result<(), TransportError> {
        self.record(Request::Update {
            item: item.to_string(),
            state: state.to_string(),
        })?;
        self.store_state(item, state)
    }

    async fn send_command(&self, item: &str, command: &str) -> Result<(), TransportError> {
        self.record(Request::Command {
            item: item.to_string(),
            command: command.to_string(),
        })?;
        self.store_state(item, command)
    }

    async fn fetch_item(&self, item: &str) -> Result<RawItem, TransportError> {
        self.record(Request::Fetch {
            item: item.to_string(),
        })?;
        self.items
            .lock()
            .get(item)
            .cloned()
            .ok_or_else(|| TransportError::NotFound(item.to_string()))
    }

    async fn delete_item(&self, item: &str) -> Result<(), TransportError> {
        self.record(Request::Delete {
            item: item.to_string(),
        })?;
        match self.items.lock().remove(item) {
            Some(_) => Ok(()),
            None => Err(TransportError::NotFound(item.to_string())),
        }
    }
}

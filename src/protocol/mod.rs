// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Communication with the openHAB server.
//!
//! Items only talk to the server through the [`Transport`] trait, which
//! moves already formatted strings. Any implementation works.
//!
//! # Implementations
//!
//! - [`RestTransport`]: openHAB's REST API over HTTP (feature `http`)
//! - [`MemoryTransport`]: items held in memory, recording every request
//!
//! # Event stream
//!
//! openHAB pushes item events as server-sent events. The
//! [`EventStreamDecoder`] turns the byte stream into [`RawItemEvent`]s,
//! independent of how the bytes arrive.
//!
//! [`RawItemEvent`]: crate::event::RawItemEvent

mod event_stream;
mod memory;
mod raw_item;
#[cfg(feature = "http")]
mod rest;

use std::future::Future;

pub use event_stream::{EventStreamDecoder, MAX_MESSAGE_LEN, parse_event_data};
pub use memory::{MemoryTransport, Request};
pub use raw_item::RawItem;
#[cfg(feature = "http")]
pub use rest::{Credentials, RestConfig, RestTransport};

use crate::error::TransportError;

/// Trait for clients that carry item traffic to the server.
///
/// Values are passed in their formatted wire form. Errors are reported
/// unchanged to the caller of the item operation.
pub trait Transport: Send + Sync + 'static {
    /// Sets the state of an item without triggering its bindings.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the request fails.
    fn send_update(
        &self,
        item: &str,
        state: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Sends a command to an item.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the request fails.
    fn send_command(
        &self,
        item: &str,
        command: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Fetches the full raw representation of an item.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::NotFound` if the item does not exist, or
    /// another `TransportError` if the request fails.
    fn fetch_item(&self, item: &str)
    -> impl Future<Output = Result<RawItem, TransportError>> + Send;

    /// Deletes an item on the server.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the request fails.
    fn delete_item(&self, item: &str) -> impl Future<Output = Result<(), TransportError>> + Send;
}

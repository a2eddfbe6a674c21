// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the openHAB items library.
//!
//! This module provides the error hierarchy used across the crate: value
//! validation, remote value parsing, transport failures and internal
//! consistency violations.

use thiserror::Error;

use crate::types::ItemKind;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// A value was rejected by every grammar of the item's kind.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// A remote value did not match the lexical form expected for the kind.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Communication with the openHAB server failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// An internal invariant was violated.
    ///
    /// This should be unreachable; seeing it indicates a bug in this crate.
    #[error("internal consistency error: {0}")]
    Consistency(String),

    /// The item is not known to the directory.
    #[error("item not found: {0}")]
    ItemNotFound(String),
}

/// Errors raised when a value is not acceptable for an item.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueError {
    /// No grammar of the item's kind accepts the value.
    #[error("invalid value \"{value}\" for {kind} item")]
    Rejected {
        /// The kind of the item the value was sent to.
        kind: ItemKind,
        /// Display form of the rejected value.
        value: String,
    },

    /// The item kind does not accept commands at all.
    #[error("{kind} item {item} only supports updates, not commands")]
    CommandsNotSupported {
        /// The kind of the item.
        kind: ItemKind,
        /// The item name.
        item: String,
    },

    /// The operation does not exist for the item's kind.
    #[error("{operation} is not available for {kind} items")]
    UnsupportedOperation {
        /// The kind of the item.
        kind: ItemKind,
        /// The operation name.
        operation: &'static str,
    },
}

/// Errors related to parsing openHAB representations.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A raw state string does not match the kind's lexical form.
    #[error("unable to parse \"{raw}\" as {kind} state")]
    InvalidState {
        /// The kind whose codec rejected the value.
        kind: ItemKind,
        /// The raw remote string.
        raw: String,
    },

    /// The item type reported by openHAB is not supported.
    #[error("unsupported item type: {0}")]
    UnknownKind(String),

    /// The event type or topic of a pushed event is not understood.
    #[error("unexpected event format: {0}")]
    UnexpectedEvent(String),
}

/// Errors related to communicating with the openHAB server.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} for {path}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The request path.
        path: String,
    },

    /// The server rejected the credentials.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The item does not exist on the server.
    #[error("item {0} does not exist on the server")]
    NotFound(String),

    /// The server response could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Invalid base URL.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Internal channel was closed.
    #[error("channel closed: {0}")]
    ChannelClosed(String),
}

impl TransportError {
    /// Returns `true` if repeating the request may succeed.
    ///
    /// Missing items, rejected credentials and malformed addresses are
    /// permanent.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            #[cfg(feature = "http")]
            Self::Http(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::ChannelClosed(_) => true,
            Self::AuthenticationFailed
            | Self::NotFound(_)
            | Self::InvalidResponse(_)
            | Self::InvalidAddress(_) => false,
        }
    }
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoding of openHAB's server-sent event stream.
//!
//! Each SSE message carries one JSON envelope:
//!
//! ```json
//! {
//!   "topic": "openhab/items/Kitchen_Light/command",
//!   "type": "ItemCommandEvent",
//!   "payload": "{\"type\":\"OnOff\",\"value\":\"ON\"}"
//! }
//! ```
//!
//! The payload is itself JSON encoded as a string. Item command, state and
//! state-changed events are decoded; every other event type is skipped.

use serde::Deserialize;

use crate::error::ParseError;
use crate::event::{EventKind, EventOrigin, RawItemEvent};

/// Topic namespaces for item events (openHAB 3+ and 2.x).
const ITEM_NAMESPACES: [&str; 2] = ["openhab", "smarthome"];

/// Longest line or message data the decoder buffers (1 MiB).
pub const MAX_MESSAGE_LEN: usize = 1024 * 1024;

#[derive(Debug, Deserialize)]
struct Envelope {
    topic: String,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    payload: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatePayload {
    value: String,
    #[serde(default, alias = "oldValueRaw")]
    old_value: Option<String>,
}

fn event_kind(event_type: &str) -> Option<EventKind> {
    match event_type {
        "ItemCommandEvent" => Some(EventKind::Command),
        "ItemStateEvent" => Some(EventKind::Update),
        "ItemStateChangedEvent" => Some(EventKind::Changed),
        _ => None,
    }
}

/// Extracts the item name from `<namespace>/items/<name>/<verb>`.
fn topic_item_name(topic: &str) -> Result<&str, ParseError> {
    let mut segments = topic.split('/');
    match (segments.next(), segments.next(), segments.next()) {
        (Some(namespace), Some("items"), Some(name))
            if ITEM_NAMESPACES.contains(&namespace) && !name.is_empty() =>
        {
            Ok(name)
        }
        _ => Err(ParseError::UnexpectedEvent(format!("topic {topic}"))),
    }
}

/// Parses the `data` of one SSE message.
///
/// Returns `Ok(None)` for event types that do not describe an item state
/// or command.
///
/// # Errors
///
/// Returns `ParseError` if the envelope or payload is not valid JSON or the
/// topic does not name an item.
///
/// # Examples
///
/// ```
/// use openhab_items::event::EventKind;
/// use openhab_items::protocol::parse_event_data;
///
/// let data = r#"{"topic":"openhab/items/Lamp/statechanged","type":"ItemStateChangedEvent","payload":"{\"type\":\"OnOff\",\"value\":\"ON\",\"oldType\":\"OnOff\",\"oldValue\":\"OFF\"}"}"#;
/// let event = parse_event_data(data).unwrap().unwrap();
///
/// assert_eq!(event.item_name, "Lamp");
/// assert_eq!(event.kind, EventKind::Changed);
/// assert_eq!(event.old_raw.as_deref(), Some("OFF"));
/// ```
pub fn parse_event_data(data: &str) -> Result<Option<RawItemEvent>, ParseError> {
    let envelope: Envelope = serde_json::from_str(data)?;
    let Some(kind) = event_kind(&envelope.event_type) else {
        return Ok(None);
    };

    let item_name = topic_item_name(&envelope.topic)?;
    let payload: StatePayload = serde_json::from_str(&envelope.payload)?;

    Ok(Some(RawItemEvent {
        item_name: item_name.to_string(),
        kind,
        new_raw: payload.value,
        old_raw: payload.old_value.filter(|_| kind == EventKind::Changed),
        origin: EventOrigin::Remote,
    }))
}

/// Incremental decoder for a `text/event-stream` body.
///
/// Bytes may be fed in arbitrary chunks; a message is decoded once its
/// terminating blank line has arrived. Malformed messages are logged and
/// skipped, as are messages whose lines or data exceed
/// [`MAX_MESSAGE_LEN`].
///
/// # Examples
///
/// ```
/// use openhab_items::protocol::EventStreamDecoder;
///
/// let mut decoder = EventStreamDecoder::new();
/// let first = decoder.feed(b"data: {\"topic\":\"openhab/items/Lamp/command\",");
/// assert!(first.is_empty());
///
/// let events = decoder.feed(b"\"type\":\"ItemCommandEvent\",\"payload\":\"{\\\"type\\\":\\\"OnOff\\\",\\\"value\\\":\\\"OFF\\\"}\"}\n\n");
/// assert_eq!(events.len(), 1);
/// assert_eq!(events[0].new_raw, "OFF");
/// ```
#[derive(Debug, Default)]
pub struct EventStreamDecoder {
    pending: Vec<u8>,
    data: Vec<String>,
    data_len: usize,
    // Dropping bytes up to the next newline
    discarding_line: bool,
    // Dropping lines up to the next blank line
    discarding_message: bool,
}

impl EventStreamDecoder {
    /// Creates an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns the item events it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<RawItemEvent> {
        self.pending.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(end) = self.pending.iter().position(|&b| b == b'\n') {
            let bytes: Vec<u8> = self.pending.drain(..=end).collect();
            if std::mem::take(&mut self.discarding_line) {
                continue;
            }

            let text = String::from_utf8_lossy(&bytes);
            let line = text.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if std::mem::take(&mut self.discarding_message) {
                    continue;
                }
                if let Some(event) = self.finish_message() {
                    events.push(event);
                }
            } else if self.discarding_message {
                continue;
            } else if let Some(value) = line.strip_prefix("data:") {
                let value = value.strip_prefix(' ').unwrap_or(value);
                self.data_len += value.len();
                if self.data_len > MAX_MESSAGE_LEN {
                    tracing::warn!(len = self.data_len, "Skipping oversized event data");
                    self.drop_message();
                } else {
                    self.data.push(value.to_string());
                }
            }
            // Comments, event names, ids and retry hints carry nothing we use
        }

        if self.pending.len() > MAX_MESSAGE_LEN {
            tracing::warn!(len = self.pending.len(), "Skipping oversized event line");
            self.pending.clear();
            self.discarding_line = true;
            self.drop_message();
        }

        events
    }

    fn drop_message(&mut self) {
        self.data.clear();
        self.data_len = 0;
        self.discarding_message = true;
    }

    fn finish_message(&mut self) -> Option<RawItemEvent> {
        if self.data.is_empty() {
            return None;
        }

        let data = self.data.join("\n");
        self.data.clear();
        self.data_len = 0;

        match parse_event_data(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, data = %data, "Skipping malformed event");
                None
            }
        }
    }
}

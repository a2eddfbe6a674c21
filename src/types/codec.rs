// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversion between openHAB's string states and native values.
//!
//! Parsing is kind-specific; formatting is the [`Display`](std::fmt::Display)
//! form of [`StateValue`]. For every kind, formatting a parsed value yields
//! the raw string again as long as that raw string was itself produced by
//! [`format`].
//!
//! # Examples
//!
//! ```
//! use openhab_items::types::{codec, ItemKind, StateValue};
//!
//! let (value, unit) = codec::parse(ItemKind::Number, "52 %").unwrap();
//! assert_eq!(value, StateValue::Decimal(52.0));
//! assert_eq!(unit, "%");
//!
//! let (value, _) = codec::parse(ItemKind::Dimmer, "42.7").unwrap();
//! assert_eq!(value, StateValue::Integer(42));
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ParseError;

use super::{ItemKind, RawState, StateValue, datetime, grammar};

/// Leading signed decimal, then an optional unit that starts with neither a
/// digit nor a dot.
static NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([-+]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][-+]?\d+)?)(?:\s*([^\d.\s].*?))?\s*$")
        .expect("number pattern is valid")
});

/// A decoded remote state.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedState {
    /// The native value, `None` for `UNDEF` and `NULL`.
    pub value: Option<StateValue>,
    /// The unit suffix, empty when there is none.
    pub unit: String,
    /// The raw state the value was decoded from.
    pub raw: RawState,
}

impl ParsedState {
    /// A state holding no value, recorded as `raw`.
    #[must_use]
    pub fn absent(raw: RawState) -> Self {
        Self {
            value: None,
            unit: String::new(),
            raw,
        }
    }
}

/// Decodes a raw remote string, handling the `UNDEF` and `NULL` sentinels.
///
/// Sentinels never reach the kind-specific parser.
///
/// # Errors
///
/// Returns [`ParseError::InvalidState`] if a non-sentinel string does not
/// match the kind's lexical form.
pub fn decode(kind: ItemKind, raw: &str) -> Result<ParsedState, ParseError> {
    let raw_state = RawState::parse(raw);
    if raw_state.is_sentinel() {
        return Ok(ParsedState::absent(raw_state));
    }

    let (value, unit) = parse(kind, raw)?;
    Ok(ParsedState {
        value: Some(value),
        unit,
        raw: raw_state,
    })
}

/// Parses a non-sentinel raw string into a value and a unit suffix.
///
/// # Errors
///
/// Returns [`ParseError::InvalidState`] if the string does not match the
/// kind's lexical form.
pub fn parse(kind: ItemKind, raw: &str) -> Result<(StateValue, String), ParseError> {
    let invalid = || ParseError::InvalidState {
        kind,
        raw: raw.to_string(),
    };

    match kind {
        ItemKind::Number => {
            let captures = NUMBER_PATTERN.captures(raw).ok_or_else(invalid)?;
            let value: f64 = captures[1].parse().map_err(|_| invalid())?;
            let unit = captures
                .get(2)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            Ok((StateValue::Decimal(value), unit))
        }
        ItemKind::Dimmer | ItemKind::Rollershutter => {
            let trimmed = raw.trim();
            if grammar::is_control_token(kind, trimmed) {
                return Ok((StateValue::Text(trimmed.to_string()), String::new()));
            }
            let value: f64 = trimmed.parse().map_err(|_| invalid())?;
            if !value.is_finite() {
                return Err(invalid());
            }
            #[allow(clippy::cast_possible_truncation)]
            let position = value.trunc() as i64;
            Ok((StateValue::Integer(position), String::new()))
        }
        ItemKind::DateTime => datetime::parse(raw)
            .map(|dt| (StateValue::DateTime(dt), String::new()))
            .ok_or_else(invalid),
        ItemKind::Switch | ItemKind::Contact | ItemKind::Player | ItemKind::Color => {
            let token = raw.trim();
            if token.is_empty() {
                return Err(invalid());
            }
            Ok((StateValue::Text(token.to_string()), String::new()))
        }
        ItemKind::String | ItemKind::Group => Ok((StateValue::Text(raw.to_string()), String::new())),
    }
}

/// Formats a value for sending to openHAB.
#[must_use]
pub fn format(value: &StateValue) -> String {
    value.to_string()
}

/// Returns the value as openHAB will report it back.
///
/// Numbers sent to a `Number` item come back as decimals, percentages sent
/// to a dimmer come back truncated, and date-times lose sub-millisecond
/// precision. Values the kind cannot parse are returned unchanged.
#[must_use]
pub fn normalize(kind: ItemKind, value: StateValue) -> StateValue {
    match parse(kind, &format(&value)) {
        Ok((normalized, _)) => normalized,
        Err(_) => value,
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Native item values and raw remote states.

use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};

use super::datetime;

/// Remote token for an undefined state.
pub const UNDEF: &str = "UNDEF";

/// Remote token for a state that was never initialized.
pub const NULL: &str = "NULL";

/// A native item value.
///
/// Values are what commands and updates carry and what parsed remote states
/// turn into. The [`Display`](fmt::Display) form is the wire form sent to
/// openHAB.
///
/// # Examples
///
/// ```
/// use openhab_items::types::StateValue;
///
/// assert_eq!(StateValue::from("ON").to_string(), "ON");
/// assert_eq!(StateValue::from(60.0).to_string(), "60");
/// assert_eq!(StateValue::from(42).to_string(), "42");
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum StateValue {
    /// A token (`ON`, `OPEN`, `UP`, ...), an HSB triple or free text.
    Text(String),
    /// A decimal number.
    Decimal(f64),
    /// An integral percentage or position.
    Integer(i64),
    /// A point in time.
    DateTime(DateTime<FixedOffset>),
}

impl StateValue {
    /// Returns the text if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric value of decimal and integer values.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Decimal(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Returns the integer value if this is an integer.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the date-time if this is a date-time value.
    #[must_use]
    pub fn as_datetime(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            Self::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Returns `true` if this value is numeric.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Decimal(_) | Self::Integer(_))
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::DateTime(dt) => f.write_str(&datetime::format(dt)),
        }
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for StateValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for StateValue {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

impl From<f32> for StateValue {
    fn from(value: f32) -> Self {
        Self::Decimal(f64::from(value))
    }
}

impl From<i64> for StateValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for StateValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u8> for StateValue {
    fn from(value: u8) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<DateTime<FixedOffset>> for StateValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::DateTime(value)
    }
}

impl From<DateTime<Utc>> for StateValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value.fixed_offset())
    }
}

/// The last raw state string seen for an item.
///
/// openHAB reports two distinct "no value" markers. Both map to an absent
/// native value, but the raw state keeps them apart so callers can still ask
/// which one produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RawState {
    /// The remote state is `UNDEF`.
    Undef,
    /// The remote state is `NULL`.
    Null,
    /// Any other raw string.
    Value(String),
}

impl RawState {
    /// Classifies a raw remote string.
    ///
    /// # Examples
    ///
    /// ```
    /// use openhab_items::types::RawState;
    ///
    /// assert_eq!(RawState::parse("NULL"), RawState::Null);
    /// assert_eq!(RawState::parse("21.5 °C"), RawState::Value("21.5 °C".into()));
    /// ```
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            UNDEF => Self::Undef,
            NULL => Self::Null,
            other => Self::Value(other.to_string()),
        }
    }

    /// Returns the raw string, including the sentinel tokens.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Undef => UNDEF,
            Self::Null => NULL,
            Self::Value(s) => s,
        }
    }

    /// Returns `true` for `UNDEF` and `NULL`.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::Undef | Self::Null)
    }
}

impl fmt::Display for RawState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_display_drops_trailing_zero() {
        assert_eq!(StateValue::Decimal(60.0).to_string(), "60");
        assert_eq!(StateValue::Decimal(-3.25).to_string(), "-3.25");
    }

    #[test]
    fn numeric_accessors() {
        assert_eq!(StateValue::from(75u8).as_f64(), Some(75.0));
        assert_eq!(StateValue::from(75u8).as_i64(), Some(75));
        assert_eq!(StateValue::from("ON").as_f64(), None);
        assert!(StateValue::from(1.5).is_numeric());
        assert!(!StateValue::from("1.5").is_numeric());
    }

    #[test]
    fn raw_state_sentinels() {
        assert!(RawState::parse(UNDEF).is_sentinel());
        assert!(RawState::parse(NULL).is_sentinel());
        assert!(!RawState::parse("null").is_sentinel());
        assert_eq!(RawState::Undef.to_string(), "UNDEF");
    }

    #[test]
    fn datetime_display_uses_millis() {
        let dt = DateTime::parse_from_rfc3339("2024-01-15T10:30:00.123456+01:00").unwrap();
        assert_eq!(
            StateValue::from(dt).to_string(),
            "2024-01-15T10:30:00.123+01:00"
        );
    }
}

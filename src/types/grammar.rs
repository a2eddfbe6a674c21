// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command and update grammars.
//!
//! Every item kind accepts an ordered set of value shapes. A value is valid
//! for the kind if **any** grammar of the set accepts it. String items skip
//! the grammar set and accept any text.
//!
//! # Examples
//!
//! ```
//! use openhab_items::types::{grammar, ItemKind, StateValue};
//!
//! // Dimmers accept ON/OFF, percentages and INCREASE/DECREASE
//! assert!(grammar::validate(ItemKind::Dimmer, &StateValue::from("ON")).is_ok());
//! assert!(grammar::validate(ItemKind::Dimmer, &StateValue::from(40)).is_ok());
//! assert!(grammar::validate(ItemKind::Dimmer, &StateValue::from(140)).is_err());
//! ```

use crate::error::ValueError;

use super::{ItemKind, StateValue};

/// A single acceptable value shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grammar {
    /// `ON` or `OFF`.
    OnOff,
    /// `OPEN` or `CLOSED`.
    OpenClosed,
    /// `H,S,B` with hue 0-360, saturation and brightness 0-100.
    Color,
    /// Any finite number.
    Decimal,
    /// A number between 0 and 100.
    Percent,
    /// `INCREASE` or `DECREASE`.
    IncreaseDecrease,
    /// A date-time value.
    DateTime,
    /// `UP` or `DOWN`.
    UpDown,
    /// `STOP`.
    Stop,
    /// Media player controls.
    Player,
}

const SWITCH: &[Grammar] = &[Grammar::OnOff];
const NUMBER: &[Grammar] = &[Grammar::Decimal];
const CONTACT: &[Grammar] = &[Grammar::OpenClosed];
const DATE_TIME: &[Grammar] = &[Grammar::DateTime];
const DIMMER: &[Grammar] = &[Grammar::OnOff, Grammar::Percent, Grammar::IncreaseDecrease];
const COLOR: &[Grammar] = &[
    Grammar::OnOff,
    Grammar::Percent,
    Grammar::IncreaseDecrease,
    Grammar::Color,
];
const ROLLERSHUTTER: &[Grammar] = &[Grammar::UpDown, Grammar::Percent, Grammar::Stop];
const PLAYER: &[Grammar] = &[Grammar::Player];

impl Grammar {
    /// Returns the fixed tokens of token grammars, empty for the others.
    #[must_use]
    pub const fn tokens(&self) -> &'static [&'static str] {
        match self {
            Self::OnOff => &["ON", "OFF"],
            Self::OpenClosed => &["OPEN", "CLOSED"],
            Self::IncreaseDecrease => &["INCREASE", "DECREASE"],
            Self::UpDown => &["UP", "DOWN"],
            Self::Stop => &["STOP"],
            Self::Player => &["PLAY", "PAUSE", "NEXT", "PREVIOUS", "REWIND", "FASTFORWARD"],
            Self::Color | Self::Decimal | Self::Percent | Self::DateTime => &[],
        }
    }

    /// Returns `true` if this grammar accepts the value.
    #[must_use]
    pub fn accepts(&self, value: &StateValue) -> bool {
        match self {
            Self::Decimal => value.as_f64().is_some_and(f64::is_finite),
            Self::Percent => value
                .as_f64()
                .is_some_and(|v| (0.0..=100.0).contains(&v)),
            Self::DateTime => matches!(value, StateValue::DateTime(_)),
            Self::Color => value.as_text().is_some_and(is_hsb),
            Self::OnOff
            | Self::OpenClosed
            | Self::IncreaseDecrease
            | Self::UpDown
            | Self::Stop
            | Self::Player => value
                .as_text()
                .is_some_and(|token| self.tokens().contains(&token)),
        }
    }
}

/// Returns the ordered grammar set for a kind.
///
/// String items return an empty set because they bypass grammar checks.
/// Groups return an empty set as well; a group validates through its base
/// kind, and a group without one accepts nothing.
#[must_use]
pub const fn grammars_for(kind: ItemKind) -> &'static [Grammar] {
    match kind {
        ItemKind::Switch => SWITCH,
        ItemKind::Number => NUMBER,
        ItemKind::Contact => CONTACT,
        ItemKind::DateTime => DATE_TIME,
        ItemKind::Dimmer => DIMMER,
        ItemKind::Color => COLOR,
        ItemKind::Rollershutter => ROLLERSHUTTER,
        ItemKind::Player => PLAYER,
        ItemKind::String | ItemKind::Group => &[],
    }
}

/// Returns `true` if `token` is a control token any grammar of `kind` knows.
#[must_use]
pub fn is_control_token(kind: ItemKind, token: &str) -> bool {
    grammars_for(kind)
        .iter()
        .any(|grammar| grammar.tokens().contains(&token))
}

/// Validates a value against the grammar set of `kind`.
///
/// # Errors
///
/// Returns [`ValueError::Rejected`] if no grammar accepts the value.
pub fn validate(kind: ItemKind, value: &StateValue) -> Result<(), ValueError> {
    let accepted = match kind {
        ItemKind::String => matches!(value, StateValue::Text(_)),
        _ => grammars_for(kind)
            .iter()
            .any(|grammar| grammar.accepts(value)),
    };

    if accepted {
        Ok(())
    } else {
        Err(ValueError::Rejected {
            kind,
            value: value.to_string(),
        })
    }
}

/// Checks the `H,S,B` color form.
fn is_hsb(s: &str) -> bool {
    const MAXIMA: [u16; 3] = [360, 100, 100];

    let parts: Vec<&str> = s.split(',').collect();
    parts.len() == MAXIMA.len()
        && parts.iter().zip(MAXIMA).all(|(part, max)| {
            part.trim()
                .parse::<u16>()
                .is_ok_and(|value| value <= max)
        })
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Item kinds known to openHAB.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// The kind of an openHAB item.
///
/// The kind decides which codec parses remote states and which grammars
/// validate outgoing commands and updates. The set is closed: every kind
/// openHAB reports that is not listed here is rejected with
/// [`ParseError::UnknownKind`].
///
/// # Examples
///
/// ```
/// use openhab_items::types::ItemKind;
///
/// let kind: ItemKind = "Rollershutter".parse().unwrap();
/// assert_eq!(kind, ItemKind::Rollershutter);
/// assert_eq!(kind.as_str(), "Rollershutter");
///
/// let (kind, dimension) = ItemKind::from_type_str("Number:Temperature").unwrap();
/// assert_eq!(kind, ItemKind::Number);
/// assert_eq!(dimension.as_deref(), Some("Temperature"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ItemKind {
    /// ON/OFF switch.
    Switch,
    /// Decimal number, optionally carrying a unit of measurement.
    Number,
    /// OPEN/CLOSED contact. Accepts updates only.
    Contact,
    /// Date and time.
    DateTime,
    /// Percentage dimmer.
    Dimmer,
    /// HSB color.
    Color,
    /// Rollershutter position and movement.
    Rollershutter,
    /// Media player controls.
    Player,
    /// Free text.
    String,
    /// Group of other items.
    Group,
}

impl ItemKind {
    /// All supported kinds.
    pub const ALL: [Self; 10] = [
        Self::Switch,
        Self::Number,
        Self::Contact,
        Self::DateTime,
        Self::Dimmer,
        Self::Color,
        Self::Rollershutter,
        Self::Player,
        Self::String,
        Self::Group,
    ];

    /// Returns the type name openHAB uses for this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Switch => "Switch",
            Self::Number => "Number",
            Self::Contact => "Contact",
            Self::DateTime => "DateTime",
            Self::Dimmer => "Dimmer",
            Self::Color => "Color",
            Self::Rollershutter => "Rollershutter",
            Self::Player => "Player",
            Self::String => "String",
            Self::Group => "Group",
        }
    }

    /// Returns `true` for group items.
    #[must_use]
    pub const fn is_group(&self) -> bool {
        matches!(self, Self::Group)
    }

    /// Returns `true` if the kind accepts commands.
    ///
    /// Contacts are sensors and only ever receive state updates.
    #[must_use]
    pub const fn accepts_commands(&self) -> bool {
        !matches!(self, Self::Contact)
    }

    /// Parses an openHAB type string such as `"Number:Temperature"`.
    ///
    /// Returns the kind and, for dimensioned numbers, the quantity type.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnknownKind`] if the base type is not supported.
    pub fn from_type_str(s: &str) -> Result<(Self, Option<String>), ParseError> {
        match s.split_once(':') {
            Some((base, dimension)) => {
                let kind = base.parse()?;
                let dimension = Some(dimension.to_string()).filter(|d| !d.is_empty());
                Ok((kind, dimension))
            }
            None => Ok((s.parse()?, None)),
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseError::UnknownKind(s.to_string()))
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Raw item representation as returned by `GET /items/{name}`.

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::types::{ItemKind, NULL};

fn null_state() -> String {
    NULL.to_string()
}

/// An item as the server describes it.
///
/// # Examples
///
/// ```
/// use openhab_items::protocol::RawItem;
/// use openhab_items::types::ItemKind;
///
/// let json = r#"{
///     "name": "Outdoor_Temperature",
///     "type": "Number:Temperature",
///     "state": "12.5 °C",
///     "label": "Outdoor",
///     "tags": ["Measurement"],
///     "groupNames": ["Weather"],
///     "editable": false
/// }"#;
///
/// let raw: RawItem = serde_json::from_str(json).unwrap();
/// let (kind, dimension) = raw.kind().unwrap();
/// assert_eq!(kind, ItemKind::Number);
/// assert_eq!(dimension.as_deref(), Some("Temperature"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawItem {
    /// Unique item name.
    pub name: String,
    /// Type name, possibly with a dimension (`Number:Temperature`).
    #[serde(rename = "type")]
    pub item_type: String,
    /// Raw state string.
    #[serde(default = "null_state")]
    pub state: String,
    /// Display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Icon category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Semantic and free tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Names of the groups this item belongs to.
    #[serde(default)]
    pub group_names: Vec<String>,
    /// Whether the item definition can be changed through the API.
    #[serde(default)]
    pub editable: bool,
    /// Base type of a group item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_type: Option<String>,
    /// Members of a group item.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<RawItem>,
    /// REST link of the item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl RawItem {
    /// Creates a minimal raw item.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        item_type: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            item_type: item_type.into(),
            state: state.into(),
            label: None,
            category: None,
            tags: Vec::new(),
            group_names: Vec::new(),
            editable: false,
            group_type: None,
            members: Vec::new(),
            link: None,
        }
    }

    /// Sets the base type of a group.
    #[must_use]
    pub fn with_group_type(mut self, group_type: impl Into<String>) -> Self {
        self.group_type = Some(group_type.into());
        self
    }

    /// Adds a group member.
    #[must_use]
    pub fn with_member(mut self, member: RawItem) -> Self {
        self.members.push(member);
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Parses the item type into a kind and an optional dimension.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnknownKind`] for unsupported types.
    pub fn kind(&self) -> Result<(ItemKind, Option<String>), ParseError> {
        ItemKind::from_type_str(&self.item_type)
    }

    /// Parses the group base type, `None` for non-groups and plain groups.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnknownKind`] for unsupported base types.
    pub fn base_kind(&self) -> Result<Option<(ItemKind, Option<String>)>, ParseError> {
        self.group_type
            .as_deref()
            .filter(|_| self.item_type == ItemKind::Group.as_str())
            .map(ItemKind::from_type_str)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_group_with_members() {
        let json = r#"{
            "name": "Lights",
            "type": "Group",
            "groupType": "Switch",
            "state": "ON",
            "members": [
                {"name": "Lamp1", "type": "Switch", "state": "ON"},
                {"name": "Lamp2", "type": "Dimmer", "state": "40"}
            ]
        }"#;

        let raw: RawItem = serde_json::from_str(json).unwrap();
        assert_eq!(raw.kind().unwrap().0, ItemKind::Group);
        assert_eq!(raw.base_kind().unwrap(), Some((ItemKind::Switch, None)));
        assert_eq!(raw.members.len(), 2);
        assert_eq!(raw.members[1].state, "40");
        assert!(raw.tags.is_empty());
    }

    #[test]
    fn missing_state_defaults_to_null() {
        let raw: RawItem = serde_json::from_str(r#"{"name": "X", "type": "String"}"#).unwrap();
        assert_eq!(raw.state, "NULL");
    }

    #[test]
    fn group_type_ignored_for_non_groups() {
        let raw = RawItem::new("Lamp", "Switch", "ON").with_group_type("Dimmer");
        assert_eq!(raw.base_kind().unwrap(), None);
    }

    #[test]
    fn unknown_type() {
        let raw = RawItem::new("Loc", "Location", "1,2");
        assert!(matches!(raw.kind(), Err(ParseError::UnknownKind(_))));
    }

    #[test]
    fn serialize_skips_empty_fields() {
        let raw = RawItem::new("Lamp", "Switch", "ON").with_label("Lamp");
        let json = serde_json::to_value(&raw).unwrap();
        assert_eq!(json["type"], "Switch");
        assert_eq!(json["label"], "Lamp");
        assert!(json.get("members").is_none());
        assert!(json.get("groupType").is_none());
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Kind-specific shortcuts.
//!
//! Each shortcut sends one fixed token and is only available on the kinds
//! that define it. Calling it on another kind fails with
//! [`ValueError::UnsupportedOperation`] before anything is sent.

use super::{Delivery, Item};
use crate::error::{Result, ValueError};
use crate::protocol::Transport;
use crate::types::{ItemKind, StateValue};

const ON_OFF_KINDS: &[ItemKind] = &[ItemKind::Switch, ItemKind::Dimmer, ItemKind::Color];
const STEP_KINDS: &[ItemKind] = &[ItemKind::Dimmer, ItemKind::Color];

impl<T: Transport> Item<T> {
    fn require(&self, operation: &'static str, kinds: &[ItemKind]) -> Result<()> {
        let kind = self.value_kind();
        if kinds.contains(&kind) {
            Ok(())
        } else {
            Err(ValueError::UnsupportedOperation { kind, operation }.into())
        }
    }

    async fn command_token(
        &self,
        operation: &'static str,
        kinds: &[ItemKind],
        token: &'static str,
    ) -> Result<Delivery> {
        self.require(operation, kinds)?;
        self.command(token).await
    }

    // ========== Switch, Dimmer, Color ==========

    /// Commands `ON`.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnsupportedOperation`] unless the item is a
    /// switch, dimmer or color, or the error of [`Item::command`].
    pub async fn on(&self) -> Result<Delivery> {
        self.command_token("on", ON_OFF_KINDS, "ON").await
    }

    /// Commands `OFF`.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnsupportedOperation`] unless the item is a
    /// switch, dimmer or color, or the error of [`Item::command`].
    pub async fn off(&self) -> Result<Delivery> {
        self.command_token("off", ON_OFF_KINDS, "OFF").await
    }

    /// Commands the opposite of the current switch state.
    ///
    /// An unknown state toggles to `ON`.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnsupportedOperation`] unless the item is a
    /// switch, or the error of reading the state or sending the command.
    pub async fn toggle(&self) -> Result<Delivery> {
        self.require("toggle", &[ItemKind::Switch])?;
        let next = match self.state().await? {
            Some(StateValue::Text(token)) if token == "ON" => "OFF",
            _ => "ON",
        };
        self.command(next).await
    }

    /// Commands `INCREASE`.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnsupportedOperation`] unless the item is a
    /// dimmer or color, or the error of [`Item::command`].
    pub async fn increase(&self) -> Result<Delivery> {
        self.command_token("increase", STEP_KINDS, "INCREASE").await
    }

    /// Commands `DECREASE`.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnsupportedOperation`] unless the item is a
    /// dimmer or color, or the error of [`Item::command`].
    pub async fn decrease(&self) -> Result<Delivery> {
        self.command_token("decrease", STEP_KINDS, "DECREASE").await
    }

    // ========== Rollershutter ==========

    /// Commands `UP`.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnsupportedOperation`] unless the item is a
    /// rollershutter, or the error of [`Item::command`].
    pub async fn up(&self) -> Result<Delivery> {
        self.command_token("up", &[ItemKind::Rollershutter], "UP").await
    }

    /// Commands `DOWN`.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnsupportedOperation`] unless the item is a
    /// rollershutter, or the error of [`Item::command`].
    pub async fn down(&self) -> Result<Delivery> {
        self.command_token("down", &[ItemKind::Rollershutter], "DOWN").await
    }

    /// Commands `STOP`.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnsupportedOperation`] unless the item is a
    /// rollershutter, or the error of [`Item::command`].
    pub async fn stop(&self) -> Result<Delivery> {
        self.command_token("stop", &[ItemKind::Rollershutter], "STOP").await
    }

    // ========== Player ==========

    /// Commands `PLAY`.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnsupportedOperation`] unless the item is a
    /// player, or the error of [`Item::command`].
    pub async fn play(&self) -> Result<Delivery> {
        self.command_token("play", &[ItemKind::Player], "PLAY").await
    }

    /// Commands `PAUSE`.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnsupportedOperation`] unless the item is a
    /// player, or the error of [`Item::command`].
    pub async fn pause(&self) -> Result<Delivery> {
        self.command_token("pause", &[ItemKind::Player], "PAUSE").await
    }

    /// Commands `NEXT`.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnsupportedOperation`] unless the item is a
    /// player, or the error of [`Item::command`].
    pub async fn next(&self) -> Result<Delivery> {
        self.command_token("next", &[ItemKind::Player], "NEXT").await
    }

    /// Commands `PREVIOUS`.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnsupportedOperation`] unless the item is a
    /// player, or the error of [`Item::command`].
    pub async fn previous(&self) -> Result<Delivery> {
        self.command_token("previous", &[ItemKind::Player], "PREVIOUS")
            .await
    }

    /// Commands `REWIND`.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnsupportedOperation`] unless the item is a
    /// player, or the error of [`Item::command`].
    pub async fn rewind(&self) -> Result<Delivery> {
        self.command_token("rewind", &[ItemKind::Player], "REWIND").await
    }

    /// Commands `FASTFORWARD`.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnsupportedOperation`] unless the item is a
    /// player, or the error of [`Item::command`].
    pub async fn fast_forward(&self) -> Result<Delivery> {
        self.command_token("fast_forward", &[ItemKind::Player], "FASTFORWARD")
            .await
    }

    // ========== Contact ==========

    /// Updates the contact to `OPEN`.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnsupportedOperation`] unless the item is a
    /// contact, or the error of [`Item::update`].
    pub async fn open(&self) -> Result<Delivery> {
        self.require("open", &[ItemKind::Contact])?;
        self.update("OPEN").await
    }

    /// Updates the contact to `CLOSED`.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnsupportedOperation`] unless the item is a
    /// contact, or the error of [`Item::update`].
    pub async fn closed(&self) -> Result<Delivery> {
        self.require("closed", &[ItemKind::Contact])?;
        self.update("CLOSED").await
    }
}

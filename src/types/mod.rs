// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for openHAB items.
//!
//! This module holds everything that depends only on an item's kind: the
//! kind itself, native values, raw remote states, the grammars that validate
//! outgoing values and the codec that parses incoming ones. None of it keeps
//! state.
//!
//! # Types
//!
//! - [`ItemKind`] - The closed set of supported item kinds
//! - [`StateValue`] - A native value (token, number, percentage, date-time)
//! - [`RawState`] - The last raw string, keeping `UNDEF` and `NULL` apart
//! - [`Grammar`] - One acceptable command/update shape
//! - [`ParsedState`] - A decoded remote state

pub mod codec;
pub mod datetime;
pub mod grammar;
mod kind;
mod value;

pub use codec::ParsedState;
pub use grammar::Grammar;
pub use kind::ItemKind;
pub use value::{NULL, RawState, StateValue, UNDEF};

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `openhab_items` - local mirrors of openHAB items.
//!
//! This library keeps a typed, locally cached copy of openHAB items in sync
//! with the server. Local commands and updates are validated per item kind
//! and applied optimistically; server events overwrite the local state unless
//! they are the echo of a change this process just sent.
//!
//! # Supported Features
//!
//! - **Typed values**: Switch, Number, Contact, DateTime, Dimmer, Color,
//!   Rollershutter, Player, String and Group items with their own grammars
//! - **Echo suppression**: server echoes of local changes are recognized
//!   within a configurable window
//! - **Listeners**: per-item callbacks filtered by event kind, origin and
//!   echo policy, plus a directory-wide broadcast bus
//! - **REST transport**: openHAB's REST API and server-sent event stream
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use openhab_items::{Directory, RestConfig, RestTransport};
//! use openhab_items::event::EventKind;
//! use openhab_items::subscription::{ListenerOptions, Subscribable};
//!
//! #[tokio::main]
//! async fn main() -> openhab_items::Result<()> {
//!     let config = RestConfig::new("http://openhab.local:8080/rest").with_token("oh.token");
//!     let directory = Arc::new(Directory::new(RestTransport::new(config)?));
//!
//!     let dimmer = directory.get_item("Living_Dimmer").await?;
//!     dimmer.add_listener(
//!         &ListenerOptions::new().with_kind(EventKind::Changed),
//!         |event| println!("{} changed to {:?}", event.item_name(), event.new_value()),
//!     );
//!
//!     directory.listen().await?;
//!     dimmer.command(60).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Custom Transports
//!
//! Items talk to the server only through [`protocol::Transport`]. The
//! [`protocol::MemoryTransport`] serves items from memory, which is handy in
//! tests:
//!
//! ```
//! use openhab_items::Directory;
//! use openhab_items::protocol::{MemoryTransport, RawItem};
//!
//! # #[tokio::main]
//! # async fn main() -> openhab_items::Result<()> {
//! let transport = MemoryTransport::new().with_item(RawItem::new("Lamp", "Switch", "OFF"));
//! let directory = Directory::new(transport);
//!
//! let lamp = directory.get_item("Lamp").await?;
//! lamp.toggle().await?;
//!
//! assert_eq!(directory.transport().item_state("Lamp").as_deref(), Some("ON"));
//! # Ok(())
//! # }
//! ```

pub mod directory;
pub mod error;
pub mod event;
mod item;
pub mod protocol;
pub mod subscription;
pub mod types;

pub use directory::{Directory, ItemDefaults, RetryPolicy};
pub use error::{Error, ParseError, Result, TransportError, ValueError};
pub use event::{EventKind, EventOrigin, ItemEvent};
pub use item::{Delivery, Item, ItemMetadata};
#[cfg(feature = "http")]
pub use protocol::{RestConfig, RestTransport};
pub use subscription::{ListenerOptions, Subscribable, SubscriptionId};
pub use types::{ItemKind, RawState, StateValue};

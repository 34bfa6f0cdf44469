//! tdrelay core - OSC decoding and the UDP side of the relay.
//!
//! This crate provides the building blocks the relay needs before anything
//! reaches a browser:
//!
//! - **Message** - The [`RelayMessage`] forwarded to clients
//! - **Decode** - Turning OSC datagrams into relay messages
//! - **Listener** - The UDP receive loop feeding a [`RelaySink`]
//! - **Config** - Bind addresses and queue sizes, loadable from TOML
//!
//! # Architecture
//!
//! Data flows one way: a datagram arrives on the [`OscListener`], is decoded
//! into zero or more [`RelayMessage`]s, and each one is handed to a
//! [`RelaySink`]. The sink (the WebSocket gateway in `tdrelay-http`) fans it
//! out to every connected client.
//!
//! ```no_run
//! use tdrelay_core::{OscListener, RelayMessage, RelaySink};
//!
//! struct Print;
//!
//! impl RelaySink for Print {
//!     fn relay(&self, message: &RelayMessage) {
//!         println!("{} = {}", message.address, message.value);
//!     }
//! }
//!
//! # async fn example() -> tdrelay_core::Result<()> {
//! let listener = OscListener::bind("0.0.0.0:10000").await?;
//! listener.run(&Print).await
//! # }
//! ```

pub mod config;
pub mod decode;
pub mod error;
pub mod listener;
pub mod message;

pub use config::{HttpSettings, OscSettings, RelayConfig};
pub use decode::{decode_packet, extract_message, DecodedPacket};
pub use error::{DecodeError, Error, Result};
pub use listener::{ListenerStats, OscListener, RelaySink, StatsSnapshot};
pub use message::{RelayMessage, RelayValue, TD_DATA_EVENT};

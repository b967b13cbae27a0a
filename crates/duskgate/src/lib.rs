//! # Duskgate
//!
//! Async client stack for the Duskgate browser game protocol.
//!
//! The meta-crate ties the layers together: transports from
//! [`duskgate_transport`], the wire codec from [`duskgate_protocol`],
//! session state from [`duskgate_session`], and field encryption from
//! [`duskgate_crypto`]. Embedders implement
//! [`Frame`](duskgate_session::Frame) for each UI surface, register the
//! frames with the client's session, and hand the loop to
//! [`GameClient::run`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use duskgate::prelude::*;
//!
//! # async fn demo() -> Result<(), DuskgateError> {
//! let config = ClientConfig {
//!     websocket_url: "wss://play.example.net/ws".into(),
//!     ..Default::default()
//! };
//! let transport = WebSocketTransport::new(config.websocket_url.clone());
//! let client = GameClient::new(transport, Arc::new(PlainFieldCipher), config);
//!
//! client.connect().await?;
//! client.send_command("look", &serde_json::Value::Null).await?;
//! client.run().await
//! # }
//! ```

mod client;
mod config;
mod error;

pub use client::GameClient;
pub use config::ClientConfig;
pub use error::DuskgateError;

/// Everything an embedder typically needs, in one import.
pub mod prelude {
    pub use duskgate_crypto::{FieldCipher, PlainFieldCipher, RsaFieldCipher};
    pub use duskgate_protocol::{
        kind, render, CommandCodec, Envelope, EscapeContext, WireProfile,
    };
    pub use duskgate_session::{CooldownTracker, Dispatcher, Frame, Session};
    pub use duskgate_timing::{Countdown, Periodic};
    pub use duskgate_transport::{
        ClientTransport, ConnectionState, LongPollTransport, SessionId,
        WebSocketTransport,
    };

    pub use crate::{ClientConfig, DuskgateError, GameClient};
}

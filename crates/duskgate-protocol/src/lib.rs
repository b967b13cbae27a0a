//! Wire protocol for Duskgate.
//!
//! This crate defines the "language" the client speaks with a game server:
//!
//! - **Types** ([`Envelope`], [`WireProfile`]) — the decoded unit of wire
//!   communication and the framing variants observed across deployments.
//! - **Command codec** ([`CommandCodec`]) — turns `(command, args)` pairs
//!   into wire frames and inbound push frames into envelopes.
//! - **Escape codec** ([`render`], [`EscapeContext`]) — substitutes
//!   `$TOKEN` placeholders in server-supplied text with runtime values.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while encoding
//!   or decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw frames) and session
//! (routing and client-side state). It doesn't know about connections or
//! handlers — it only knows how to serialize and deserialize messages.
//!
//! ```text
//! Transport (frames) → Protocol (Envelope) → Session (routed callbacks)
//! ```

mod codec;
mod error;
mod escape;
mod types;

pub use codec::CommandCodec;
pub use error::ProtocolError;
pub use escape::{render, EscapeContext};
pub use types::{kind, Envelope, WireProfile};

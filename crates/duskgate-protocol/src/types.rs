//! Core protocol types for Duskgate's wire format.
//!
//! Every message on the wire is JSON. Outbound frames are command objects
//! (`{"cmd": ..., "args": ...}`); inbound frames are server pushes carrying
//! a `type` discriminator and a `msg`/`data` payload. Once decoded, both
//! directions are represented by an [`Envelope`].

use serde_json::Value;
use std::fmt;

// ---------------------------------------------------------------------------
// WireProfile
// ---------------------------------------------------------------------------

/// The outbound framing variant used by a transport.
///
/// Two framings exist in the observed deployments:
///
/// - [`Bare`](WireProfile::Bare) — the JSON command object is the entire
///   message body. Used over the WebSocket transport.
/// - [`Prefixed`](WireProfile::Prefixed) — the same JSON object preceded
///   by the literal marker [`WireProfile::COMMAND_MARKER`]. Used over the
///   long-poll transport.
///
/// The profile is a property of the transport, fixed at construction.
/// Nothing chooses a framing per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireProfile {
    /// Bare JSON object as the whole frame.
    #[default]
    Bare,
    /// JSON object preceded by the command marker token.
    Prefixed,
}

impl WireProfile {
    /// The literal marker prepended to commands under the prefixed profile.
    pub const COMMAND_MARKER: &'static str = "CMD ";
}

impl fmt::Display for WireProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireProfile::Bare => write!(f, "bare"),
            WireProfile::Prefixed => write!(f, "prefixed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// A decoded unit of wire communication.
///
/// `kind` is the command name (outbound) or push-message type (inbound);
/// `payload` is whatever structured value travelled with it. An envelope
/// is immutable once constructed — it is created per send/receive event
/// and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Command name or push-message type discriminator.
    pub kind: String,
    /// Structured payload. `Value::Null` when the push carried none.
    pub payload: Value,
}

impl Envelope {
    /// Builds an envelope from a kind and payload.
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.kind)
    }
}

// ---------------------------------------------------------------------------
// Well-known message kinds
// ---------------------------------------------------------------------------

/// Push-message kinds the client core itself produces or consumes.
///
/// Servers emit arbitrary kinds; these are the ones with built-in meaning.
/// UI frames register for game-specific kinds by their wire names.
pub mod kind {
    /// Handshake acceptance. Payload carries the session id.
    pub const CONNECTED: &str = "connected";
    /// Synthesized locally when the connection ends.
    pub const CLOSED: &str = "closed";
    /// Skill-cast acknowledgement carrying cooldown figures.
    pub const COOLDOWN: &str = "cooldown";
    /// Substituted for a missing or non-string discriminator so the
    /// dispatcher can drop the frame gracefully.
    pub const UNRECOGNIZED: &str = "unrecognized";
}

// =========================================================================
// Tests
// =========================================================================

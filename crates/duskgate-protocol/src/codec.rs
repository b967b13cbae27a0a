//! The command codec: `(command, args)` pairs to wire frames and back.
//!
//! Outbound, the codec produces the canonical command object
//! `{"cmd": <name>, "args": <value>}` — bare or marker-prefixed depending
//! on the transport's [`WireProfile`]. Inbound, it parses the server's
//! push format into an [`Envelope`], tolerating unknown discriminators and
//! extra fields so the dispatcher can ignore what it doesn't care about.

use serde::Serialize;
use serde_json::Value;

use crate::{kind, Envelope, ProtocolError, WireProfile};

/// Serialized form of an outbound command.
///
/// Field order matters on the wire: deployed servers scan for `"cmd"`
/// first, so the struct keeps `cmd` ahead of `args`.
#[derive(Debug, Serialize)]
struct CommandFrame<'a> {
    cmd: &'a str,
    args: &'a Value,
}

/// Encodes outbound commands and decodes inbound pushes.
///
/// One codec per transport; the framing profile is fixed at construction
/// and never varies per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandCodec {
    profile: WireProfile,
}

impl CommandCodec {
    /// Creates a codec for the given framing profile.
    pub fn new(profile: WireProfile) -> Self {
        Self { profile }
    }

    /// The framing profile this codec applies.
    pub fn profile(&self) -> WireProfile {
        self.profile
    }

    /// Serializes a command into its wire frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    pub fn encode(
        &self,
        cmd: &str,
        args: &Value,
    ) -> Result<String, ProtocolError> {
        let body = serde_json::to_string(&CommandFrame { cmd, args })
            .map_err(ProtocolError::Encode)?;
        Ok(match self.profile {
            WireProfile::Bare => body,
            WireProfile::Prefixed => {
                let mut frame = String::with_capacity(
                    WireProfile::COMMAND_MARKER.len() + body.len(),
                );
                frame.push_str(WireProfile::COMMAND_MARKER);
                frame.push_str(&body);
                frame
            }
        })
    }

    /// Parses an inbound push frame into an [`Envelope`].
    ///
    /// The push format is a JSON object with a `type` discriminator and a
    /// `msg` or `data` payload field. Additional fields are tolerated. A
    /// missing or non-string discriminator yields an envelope with the
    /// [`kind::UNRECOGNIZED`] kind rather than an error, so the dispatcher
    /// can drop it gracefully.
    ///
    /// # Errors
    /// Returns [`ProtocolError::MalformedEnvelope`] when the frame is not
    /// syntactically valid JSON or not a JSON object. The caller must
    /// treat this as a dropped frame, not a dead connection.
    pub fn decode(&self, raw: &str) -> Result<Envelope, ProtocolError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| ProtocolError::MalformedEnvelope(e.to_string()))?;
        let Value::Object(mut obj) = value else {
            return Err(ProtocolError::MalformedEnvelope(
                "push frame is not a JSON object".into(),
            ));
        };

        let kind = match obj.get("type") {
            Some(Value::String(s)) => s.clone(),
            _ => kind::UNRECOGNIZED.to_string(),
        };

        // Deployments disagree on the payload field name; accept both,
        // preferring `msg` (the older wire shape).
        let payload = obj
            .remove("msg")
            .or_else(|| obj.remove("data"))
            .unwrap_or(Value::Null);

        Ok(Envelope { kind, payload })
    }
}

// =========================================================================
// Tests
// =========================================================================

//! Client configuration.

use std::time::Duration;

use tracing::warn;

/// Full configuration for a Duskgate client.
///
/// The timing defaults mirror what the game servers expect: sessions
/// idle out a little past three minutes, so the keepalive fires at 180 s;
/// the long-poll reconnect cadence is fixed at 15 s.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket endpoint, e.g. `wss://play.example.net/ws`.
    pub websocket_url: String,
    /// Long-poll fallback endpoint.
    pub poll_url: String,
    /// Where to fetch the server's RSA public key (PEM).
    pub key_url: String,
    /// Base URL for game resources (images, sounds) referenced by frames.
    pub resource_base_url: String,
    /// Display language code, forwarded to frames via `reset_language`.
    pub language: String,
    /// Whether secrets are encrypted before hitting the wire.
    /// When enabled, `key_url` must be reachable or logins fail.
    pub encryption_enabled: bool,
    /// Idle keepalive period in seconds. Default: 180.
    pub keepalive_secs: u64,
    /// Fixed delay between reconnect attempts in seconds. Default: 15.
    pub reconnect_delay_secs: u64,
    /// How long to wait for the server's acceptance frame. Default: 5.
    pub handshake_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            websocket_url: String::new(),
            poll_url: String::new(),
            key_url: String::new(),
            resource_base_url: String::new(),
            language: "en".to_string(),
            encryption_enabled: true,
            keepalive_secs: 180,
            reconnect_delay_secs: 15,
            handshake_timeout_secs: 5,
        }
    }
}

impl ClientConfig {
    /// Fix any out-of-range values so the config is safe to use.
    ///
    /// Called automatically by `GameClient::new`. Rules:
    /// - a zero keepalive would hammer the server; reset to the default.
    /// - a zero reconnect delay would hot-loop on a dead server; reset.
    /// - a zero handshake timeout can never succeed; reset.
    pub fn validated(mut self) -> Self {
        if self.keepalive_secs == 0 {
            warn!("keepalive_secs of 0 is invalid — resetting to 180");
            self.keepalive_secs = 180;
        }
        if self.reconnect_delay_secs == 0 {
            warn!("reconnect_delay_secs of 0 is invalid — resetting to 15");
            self.reconnect_delay_secs = 15;
        }
        if self.handshake_timeout_secs == 0 {
            warn!("handshake_timeout_secs of 0 is invalid — resetting to 5");
            self.handshake_timeout_secs = 5;
        }
        self
    }

    /// The keepalive period as a `Duration`.
    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }

    /// The reconnect delay as a `Duration`.
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    /// The handshake timeout as a `Duration`.
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    /// Resolves a resource path from a push payload against the
    /// resource base. Servers send bare paths like `items/sword.png`.
    pub fn resource_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.resource_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timing_values() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.keepalive_secs, 180);
        assert_eq!(cfg.reconnect_delay_secs, 15);
        assert_eq!(cfg.handshake_timeout_secs, 5);
        assert!(cfg.encryption_enabled);
    }

    #[test]
    fn test_validated_resets_zero_intervals() {
        let cfg = ClientConfig {
            keepalive_secs: 0,
            reconnect_delay_secs: 0,
            handshake_timeout_secs: 0,
            ..Default::default()
        }
        .validated();

        assert_eq!(cfg.keepalive_secs, 180);
        assert_eq!(cfg.reconnect_delay_secs, 15);
        assert_eq!(cfg.handshake_timeout_secs, 5);
    }

    #[test]
    fn test_validated_keeps_valid_values() {
        let cfg = ClientConfig {
            keepalive_secs: 60,
            reconnect_delay_secs: 5,
            ..Default::default()
        }
        .validated();

        assert_eq!(cfg.keepalive_secs, 60);
        assert_eq!(cfg.reconnect_delay_secs, 5);
    }

    #[test]
    fn test_resource_url_joins_base_and_path() {
        let cfg = ClientConfig {
            resource_base_url: "https://cdn.example.net/assets/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            cfg.resource_url("items/sword.png"),
            "https://cdn.example.net/assets/items/sword.png"
        );
        // Stray slashes on either side don't double up.
        assert_eq!(
            cfg.resource_url("/items/sword.png"),
            "https://cdn.example.net/assets/items/sword.png"
        );
    }

    #[test]
    fn test_duration_accessors() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.keepalive(), Duration::from_secs(180));
        assert_eq!(cfg.reconnect_delay(), Duration::from_secs(15));
        assert_eq!(cfg.handshake_timeout(), Duration::from_secs(5));
    }
}

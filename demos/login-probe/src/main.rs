//! Connects to a Duskgate server, logs in, and prints every chat push
//! until the connection closes.
//!
//! Usage:
//!
//! ```text
//! login-probe ws://localhost:8080 <account> <password>
//! ```
//!
//! With `DUSKGATE_KEY_URL` set, the password is RSA-encrypted with the
//! server's published key; otherwise it goes out as-is (local dev only).

use std::sync::{Arc, Mutex};

use duskgate::prelude::*;
use serde_json::json;
use tracing::info;

/// Prints chat and system pushes to stdout.
struct ConsoleFrame;

impl Frame for ConsoleFrame {
    fn kinds(&self) -> Vec<String> {
        vec![
            "chat".to_string(),
            kind::CONNECTED.to_string(),
            kind::CLOSED.to_string(),
        ]
    }

    fn on_message(&mut self, envelope: &Envelope) {
        match envelope.kind.as_str() {
            "chat" => {
                if let Some(text) = envelope.payload.as_str() {
                    println!("< {text}");
                }
            }
            k if k == kind::CONNECTED => println!("* session open"),
            k if k == kind::CLOSED => println!("* session closed"),
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let url = args.next().unwrap_or_else(|| "ws://127.0.0.1:8080".into());
    let account = args.next().unwrap_or_else(|| "probe".into());
    let password = args.next().unwrap_or_else(|| "probe".into());

    let config = ClientConfig {
        websocket_url: url,
        key_url: std::env::var("DUSKGATE_KEY_URL").unwrap_or_default(),
        encryption_enabled: std::env::var("DUSKGATE_KEY_URL").is_ok(),
        ..Default::default()
    };

    let cipher: Arc<dyn FieldCipher> = if config.encryption_enabled {
        let cipher = Arc::new(RsaFieldCipher::new());
        cipher
            .initialize(&reqwest::Client::new(), &config.key_url)
            .await?;
        cipher
    } else {
        Arc::new(PlainFieldCipher)
    };

    let client = GameClient::websocket(cipher, config);
    client
        .session()
        .lock()
        .unwrap()
        .dispatcher_mut()
        .register_frame(Arc::new(Mutex::new(ConsoleFrame)));

    let session_id = client.connect().await?;
    info!(%session_id, "connected — logging in");

    client.send_command("account", &json!(account)).await?;
    client.send_secret("login", &password).await?;

    client.run().await?;
    Ok(())
}

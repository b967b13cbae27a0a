//! Integration tests for the long-poll fallback transport.
//!
//! Each test binds a throwaway HTTP responder on a raw `TcpListener` so
//! real form-encoded POSTs flow over a real socket. The responder maps
//! each request body to a JSON reply and forwards the body into a
//! channel so tests can assert exactly what was sent.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use duskgate_protocol::WireProfile;
use duskgate_transport::{
    ClientTransport, ConnectionState, LongPollTransport, TransportError,
};

/// Binds a throwaway responder; `reply` maps each POST body to the JSON
/// body of a `200` response.
///
/// Returns the endpoint URL and a channel of request bodies in arrival
/// order.
async fn spawn_server<F>(reply: F) -> (String, mpsc::UnboundedReceiver<String>)
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let addr = listener.local_addr().expect("should have local addr");
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let Some((stream, body)) = read_request(stream).await else {
                continue;
            };
            let _ = seen_tx.send(body.clone());
            respond(stream, &reply(&body)).await;
        }
    });

    (format!("http://{addr}/poll"), seen_rx)
}

/// Reads one HTTP request off the stream and returns its body.
async fn read_request(mut stream: TcpStream) -> Option<(TcpStream, String)> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let headers = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let length = headers
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())?
        })
        .unwrap_or(0);
    while buf.len() < header_end + length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body =
        String::from_utf8_lossy(&buf[header_end..header_end + length]).to_string();
    Some((stream, body))
}

/// Writes a `200` JSON response and closes the connection, so the next
/// request arrives on a fresh socket.
async fn respond(mut stream: TcpStream, body: &str) {
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len(),
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// The reply most tests want: a session id for the handshake, an empty
/// push list for everything else.
fn game_server(body: &str) -> String {
    if body.starts_with("mode=init") {
        r#"{"suid":"lp-99"}"#.to_string()
    } else {
        "[]".to_string()
    }
}

#[tokio::test]
async fn test_connect_posts_init_and_adopts_session_id() {
    let (endpoint, mut seen) = spawn_server(game_server).await;
    let transport = LongPollTransport::new(endpoint).expect("should build");
    assert_eq!(transport.state(), ConnectionState::Disconnected);

    let session_id = transport.connect().await.expect("should connect");

    assert_eq!(session_id.as_str(), "lp-99");
    assert_eq!(transport.state(), ConnectionState::Connected);
    assert_eq!(transport.profile(), WireProfile::Prefixed);

    let init = seen.recv().await.expect("handshake request");
    let cid = init
        .strip_prefix("mode=init&suid=0&cid=")
        .expect("handshake body shape");
    assert_eq!(cid.len(), 32);
    assert!(cid.chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn test_connect_without_session_id_fails() {
    // "0" is the unassigned sentinel; a handshake replying with it never
    // established a session.
    let (endpoint, _seen) =
        spawn_server(|_| r#"{"suid":"0"}"#.to_string()).await;
    let transport = LongPollTransport::new(endpoint).expect("should build");

    let err = transport.connect().await.expect_err("should refuse");

    assert!(matches!(err, TransportError::HandshakeFailed(_)));
    assert_eq!(transport.state(), ConnectionState::Disconnected);
    assert!(transport.session_id().is_none());
}

#[tokio::test]
async fn test_send_posts_command_and_buffers_piggybacked_frames() {
    let (endpoint, mut seen) = spawn_server(|body: &str| {
        if body.starts_with("mode=init") {
            r#"{"suid":"lp-99"}"#.to_string()
        } else if body.contains("data=") {
            // Command responses may carry push frames.
            r#"["{\"type\":\"chat\",\"msg\":\"hi\"}"]"#.to_string()
        } else {
            "[]".to_string()
        }
    })
    .await;
    let transport = LongPollTransport::new(endpoint).expect("should build");
    transport.connect().await.expect("should connect");

    transport
        .send(r#"CMD {"cmd":"say","args":"hi"}"#)
        .await
        .expect("should send");

    let _init = seen.recv().await.expect("handshake request");
    let command = seen.recv().await.expect("command request");
    assert!(
        command.starts_with("suid=lp-99&data=CMD"),
        "unexpected command body: {command}"
    );

    // The piggybacked push surfaces without another poll round trip.
    let frame = transport.recv().await.expect("should recv");
    assert_eq!(frame.as_deref(), Some(r#"{"type":"chat","msg":"hi"}"#));
}

#[tokio::test]
async fn test_recv_polls_until_a_frame_arrives() {
    let polls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&polls);
    let (endpoint, _seen) = spawn_server(move |body: &str| {
        if body.starts_with("mode=init") {
            return r#"{"suid":"lp-99"}"#.to_string();
        }
        // Empty on the first poll, a push object on the second.
        match counter.fetch_add(1, Ordering::SeqCst) {
            0 => "[]".to_string(),
            _ => r#"[{"type":"tick","msg":1}]"#.to_string(),
        }
    })
    .await;
    let transport = LongPollTransport::new(endpoint)
        .expect("should build")
        .with_poll_interval(Duration::from_millis(10));
    transport.connect().await.expect("should connect");

    let frame = transport.recv().await.expect("should recv");

    // Push objects are re-serialized to frame text (keys sort).
    assert_eq!(frame.as_deref(), Some(r#"{"msg":1,"type":"tick"}"#));
    assert!(polls.load(Ordering::SeqCst) >= 2, "should have re-polled");
}

#[tokio::test]
async fn test_close_notifies_server_and_invalidates_session() {
    let (endpoint, mut seen) = spawn_server(game_server).await;
    let transport = LongPollTransport::new(endpoint).expect("should build");
    transport.connect().await.expect("should connect");

    transport.close().await.expect("should close");

    assert_eq!(transport.state(), ConnectionState::Disconnected);
    assert!(transport.session_id().is_none());

    let _init = seen.recv().await.expect("handshake request");
    let close = seen.recv().await.expect("close notification");
    assert_eq!(close, "mode=close&suid=lp-99");

    // After a close, recv reports a clean end of stream.
    assert_eq!(transport.recv().await.expect("clean end"), None);
}

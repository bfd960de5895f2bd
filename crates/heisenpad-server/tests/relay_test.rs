//! Relay behavior over real loopback sockets.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use heisenpad_server::{Server, ServerConfig};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const PUT: &str =
    r#"{"command":"put","message":{"id":"a","user":"u1","content":"hello","encrypted":false}}"#;
const PING: &str = r#"{"command":"ping"}"#;

async fn start_server() -> String {
    let server = Server::bind(ServerConfig { bind_address: "127.0.0.1:0".into() }).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    format!("ws://{addr}")
}

async fn join(base: &str, channel: &str) -> Socket {
    let (socket, _) = connect_async(format!("{base}/ws/{channel}")).await.unwrap();
    socket
}

async fn send(socket: &mut Socket, frame: &str) {
    socket.send(Message::Text(frame.into())).await.unwrap();
}

async fn recv(socket: &mut Socket) -> Option<String> {
    let next = tokio::time::timeout(Duration::from_millis(500), socket.next()).await.ok()??;
    match next.unwrap() {
        Message::Text(text) => Some(text.as_str().to_owned()),
        other => panic!("unexpected message {other:?}"),
    }
}

/// Round-trip a ping so every earlier frame from this socket has been routed.
async fn sync(socket: &mut Socket) {
    send(socket, PING).await;
    assert_eq!(recv(socket).await.as_deref(), Some(PING));
}

#[tokio::test]
async fn put_is_broadcast_to_channel_including_sender() {
    let base = start_server().await;
    let mut alice = join(&base, "lobby").await;
    let mut bob = join(&base, "lobby").await;
    sync(&mut bob).await;

    send(&mut alice, PUT).await;

    assert_eq!(recv(&mut alice).await.as_deref(), Some(PUT));
    assert_eq!(recv(&mut bob).await.as_deref(), Some(PUT));
}

#[tokio::test]
async fn ping_is_echoed_only_to_sender() {
    let base = start_server().await;
    let mut alice = join(&base, "lobby").await;
    let mut bob = join(&base, "lobby").await;
    sync(&mut bob).await;

    send(&mut alice, PING).await;

    assert_eq!(recv(&mut alice).await.as_deref(), Some(PING));
    assert_eq!(recv(&mut bob).await, None);
}

#[tokio::test]
async fn channels_are_isolated() {
    let base = start_server().await;
    let mut alice = join(&base, "lobby").await;
    let mut carol = join(&base, "elsewhere").await;
    sync(&mut carol).await;

    send(&mut alice, PUT).await;

    assert_eq!(recv(&mut alice).await.as_deref(), Some(PUT));
    assert_eq!(recv(&mut carol).await, None);
}

#[tokio::test]
async fn encoded_channel_names_share_a_channel() {
    let base = start_server().await;
    let mut alice = join(&base, "rust%20%26%20friends").await;
    let mut bob = join(&base, "rust%20%26%20friends").await;
    sync(&mut bob).await;

    send(&mut alice, PUT).await;
    assert_eq!(recv(&mut bob).await.as_deref(), Some(PUT));
}

#[tokio::test]
async fn malformed_frames_are_not_relayed() {
    let base = start_server().await;
    let mut alice = join(&base, "lobby").await;
    let mut bob = join(&base, "lobby").await;
    sync(&mut bob).await;

    send(&mut alice, "{not a command").await;
    send(&mut alice, r#"{"command":"shout"}"#).await;
    sync(&mut alice).await;

    assert_eq!(recv(&mut bob).await, None);
}

#[tokio::test]
async fn disconnect_leaves_channel() {
    let server = Server::bind(ServerConfig { bind_address: "127.0.0.1:0".into() }).await.unwrap();
    let base = format!("ws://{}", server.local_addr().unwrap());
    let registry = server.registry();
    tokio::spawn(server.run());

    let mut alice = join(&base, "lobby").await;
    sync(&mut alice).await;
    assert_eq!(registry.read().await.channel_count(), 1);

    alice.close(None).await.unwrap();
    for _ in 0..50 {
        if registry.read().await.channel_count() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("channel was not removed after disconnect");
}

//! End-to-end tests: real clients against a real relay over loopback.

use std::time::Duration;

use heisenpad_app::{ConnectionState, MessageBody};
use heisenpad_client::{ClientConfig, ClientError, SessionHandle, spawn};
use heisenpad_core::ConnectionConfig;
use heisenpad_proto::Channel;
use heisenpad_server::{Server, ServerConfig};

const TIMEOUT: Duration = Duration::from_secs(5);

async fn start_server() -> (String, tokio::task::JoinHandle<()>) {
    let server = Server::bind(ServerConfig { bind_address: "127.0.0.1:0".into() }).await.unwrap();
    let url = format!("ws://{}", server.local_addr().unwrap());
    let task = tokio::spawn(async move {
        let _ = server.run().await;
    });
    (url, task)
}

fn config(server_url: &str) -> ClientConfig {
    ClientConfig {
        server_url: server_url.to_string(),
        tick_interval: Duration::from_millis(10),
        ..ClientConfig::default()
    }
}

async fn wait_open(handle: &SessionHandle) {
    tokio::time::timeout(TIMEOUT, handle.wait_for(|s| s.connection == ConnectionState::Open))
        .await
        .unwrap()
        .unwrap();

    // The relay registers a connection just after answering the upgrade
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn message_reaches_other_client_and_echoes_to_sender() {
    let (url, _server) = start_server().await;
    let (alice, _) = spawn(config(&url)).unwrap();
    let (bob, _) = spawn(config(&url)).unwrap();
    wait_open(&alice).await;
    wait_open(&bob).await;

    alice.send_text("  hello bob  ").await.unwrap();

    let seen = tokio::time::timeout(TIMEOUT, bob.wait_for(|s| !s.messages.is_empty()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seen.messages[0].body, MessageBody::Plain("hello bob".into()));
    assert!(!seen.messages[0].is_own);

    let echoed = tokio::time::timeout(TIMEOUT, alice.wait_for(|s| !s.messages.is_empty()))
        .await
        .unwrap()
        .unwrap();
    assert!(echoed.messages[0].is_own);
}

#[tokio::test]
async fn encrypted_messages_need_the_same_key() {
    let (url, _server) = start_server().await;
    let (alice, _) = spawn(ClientConfig { passphrase: "pw".into(), ..config(&url) }).unwrap();
    let (bob, _) = spawn(config(&url)).unwrap();
    wait_open(&alice).await;
    wait_open(&bob).await;

    alice.send_text("secret msg").await.unwrap();

    let locked = tokio::time::timeout(TIMEOUT, bob.wait_for(|s| !s.messages.is_empty()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(locked.messages[0].body, MessageBody::Locked);
    assert_ne!(locked.messages[0].message.content, "secret msg");

    bob.set_passphrase("pw").await.unwrap();
    let unlocked = tokio::time::timeout(TIMEOUT, bob.wait_for(|s| s.keyed)).await.unwrap().unwrap();
    assert_eq!(unlocked.messages[0].body, MessageBody::Unlocked("secret msg".into()));
}

#[tokio::test]
async fn delete_and_edit_propagate() {
    let (url, _server) = start_server().await;
    let (alice, _) = spawn(config(&url)).unwrap();
    let (bob, _) = spawn(config(&url)).unwrap();
    wait_open(&alice).await;
    wait_open(&bob).await;

    alice.send_text("first").await.unwrap();
    alice.send_text("second").await.unwrap();
    let both = tokio::time::timeout(TIMEOUT, bob.wait_for(|s| s.messages.len() == 2))
        .await
        .unwrap()
        .unwrap();

    // Edit in place: same id, new content
    let mut edited = both.messages[0].message.clone();
    edited.content = "first, edited".into();
    alice.resend(edited).await.unwrap();
    let after_edit = tokio::time::timeout(
        TIMEOUT,
        bob.wait_for(|s| s.messages[0].body.text() == Some("first, edited")),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(after_edit.messages.len(), 2);
    assert_eq!(after_edit.messages[1].body.text(), Some("second"));

    alice.delete(&both.messages[1].id).await.unwrap();
    let after_delete = tokio::time::timeout(TIMEOUT, bob.wait_for(|s| s.messages.len() == 1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after_delete.messages[0].id, both.messages[0].id);
}

#[tokio::test]
async fn join_switches_channel_and_clears_messages() {
    let (url, _server) = start_server().await;
    let (alice, _) = spawn(config(&url)).unwrap();
    wait_open(&alice).await;

    alice.send_text("in lobby").await.unwrap();
    tokio::time::timeout(TIMEOUT, alice.wait_for(|s| !s.messages.is_empty()))
        .await
        .unwrap()
        .unwrap();

    alice.join("side room").await.unwrap();
    let moved = tokio::time::timeout(
        TIMEOUT,
        alice.wait_for(|s| {
            s.channel == Channel::new("side room") && s.connection == ConnectionState::Open
        }),
    )
    .await
    .unwrap()
    .unwrap();
    assert!(moved.messages.is_empty());
}

#[tokio::test]
async fn unreachable_server_settles_closed() {
    // Bind then drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    drop(listener);

    let fast = ConnectionConfig {
        reconnect_interval: Duration::from_millis(20),
        ..ConnectionConfig::default()
    };
    let (handle, _) = spawn(ClientConfig { connection: fast, ..config(&url) }).unwrap();

    // The initial attempt is not from Open, so it goes through the retry budget
    let closed = tokio::time::timeout(
        TIMEOUT,
        handle.wait_for(|s| s.connection == ConnectionState::Closed),
    )
    .await
    .unwrap()
    .unwrap();
    assert!(!closed.can_send());
}

#[tokio::test]
async fn shutdown_stops_the_runtime() {
    let (url, _server) = start_server().await;
    let (handle, task) = spawn(config(&url)).unwrap();
    wait_open(&handle).await;

    handle.shutdown().await.unwrap();
    tokio::time::timeout(TIMEOUT, task).await.unwrap().unwrap().unwrap();

    assert!(matches!(handle.send_text("late").await, Err(ClientError::SessionClosed)));
}

// Boots one combat server per test binary and hands out its base URL.
use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

static SERVER_URL: OnceLock<String> = OnceLock::new();
static SERVER_READY: OnceLock<()> = OnceLock::new();

pub fn ensure_server() -> &'static str {
    SERVER_READY.get_or_init(|| {
        let published_url = Arc::new(OnceLock::<String>::new());
        let published_url_thread = Arc::clone(&published_url);
        // The server thread owns its runtime so it outlives each `#[tokio::test]` runtime.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_url_thread.set(format!("http://{}", addr));
                combat_server::run(listener).await.expect("server failed");
            });
        });
        wait_for_server_url_and_readiness(published_url);
    });

    SERVER_URL
        .get()
        .expect("server url should be initialized")
        .as_str()
}

fn wait_for_server_url_and_readiness(published_url: Arc<OnceLock<String>>) {
    let base_url = loop {
        if let Some(url) = published_url.get() {
            break url.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    let _ = SERVER_URL.set(base_url.clone());

    let addr = base_url
        .strip_prefix("http://")
        .expect("base url should use http://");

    for _ in 0..100 {
        if std::net::TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("server did not become ready in time");
}

pub async fn post(path: &str, body: serde_json::Value) -> reqwest::Response {
    let base_url = ensure_server();
    reqwest::Client::new()
        .post(format!("{base_url}{path}"))
        .json(&body)
        .send()
        .await
        .expect("request should succeed")
}

pub async fn connect() -> Socket {
    let base_url = ensure_server();
    let url = format!("{}/ws", base_url.replacen("http://", "ws://", 1));
    let (socket, _) = connect_async(url).await.expect("websocket should connect");
    socket
}

pub async fn send(socket: &mut Socket, msg: serde_json::Value) {
    socket
        .send(Message::Text(msg.to_string().into()))
        .await
        .expect("send should succeed");
}

/// Grants a session for `player_id` the way the login service would, then connects
/// and completes the Join handshake with the issued token.
pub async fn join(player_id: i32) -> Socket {
    let token = format!("session-{player_id}-{}", rand::random::<u64>());
    let res = post(
        "/sessions",
        serde_json::json!({"session_token": token, "player_id": player_id}),
    )
    .await;
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);

    let mut socket = connect().await;
    send(
        &mut socket,
        serde_json::json!({"type": "Join", "data": {"session_token": token}}),
    )
    .await;
    let identity = next_of_type(&mut socket, "Identity").await;
    assert_eq!(identity["data"]["player_id"], player_id);
    socket
}

/// Next server message of the given type, skipping anything else. `None` once the
/// socket closes.
pub async fn try_next_of_type(socket: &mut Socket, kind: &str) -> Option<serde_json::Value> {
    let wait = async {
        while let Some(msg) = socket.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    let value: serde_json::Value =
                        serde_json::from_str(text.as_str()).expect("server sends json");
                    if value["type"] == kind {
                        return Some(value);
                    }
                }
                Ok(Message::Close(_)) | Err(_) => return None,
                Ok(_) => {}
            }
        }
        None
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .expect("server should answer in time")
}

pub async fn next_of_type(socket: &mut Socket, kind: &str) -> serde_json::Value {
    try_next_of_type(socket, kind)
        .await
        .unwrap_or_else(|| panic!("socket closed before a {kind} message"))
}

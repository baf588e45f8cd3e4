// End-to-end tests for the WebSocket gateway over a real connection.
//
// The merged router is served on an ephemeral port and exercised with a
// real WebSocket client: a new subscriber must immediately receive a
// full-state snapshot equal to the concurrent GET /status body, and every
// successful mutation must reach all live subscribers.

use futures::StreamExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use trainsafe::api::{
    create_status_router, create_update_router, create_ws_router, StatusAppState, UpdateAppState,
    WsAppState,
};
use trainsafe::state::{seed, TrainRegistry};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Serve the full router on an ephemeral port, returning its address
async fn spawn_server() -> String {
    let registry = Arc::new(TrainRegistry::new(seed::default_world()));

    let app = axum::Router::new()
        .merge(create_status_router(Arc::new(StatusAppState {
            registry: Arc::clone(&registry),
        })))
        .merge(create_update_router(Arc::new(UpdateAppState {
            registry: Arc::clone(&registry),
        })))
        .merge(create_ws_router(Arc::new(WsAppState {
            registry: Arc::clone(&registry),
        })));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("127.0.0.1:{}", addr.port())
}

async fn connect(addr: &str) -> WsClient {
    let (ws, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    ws
}

/// Receive the next text frame as JSON, with a timeout so a missing
/// broadcast fails the test instead of hanging it
async fn next_frame(ws: &mut WsClient) -> Value {
    let frame = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => break text,
                Some(Ok(_)) => continue,
                other => panic!("WebSocket stream ended unexpectedly: {:?}", other),
            }
        }
    })
    .await
    .expect("timed out waiting for a train_update frame");

    serde_json::from_str(&frame).unwrap()
}

fn find_train<'a>(frame: &'a Value, id: &str) -> &'a Value {
    frame["trains"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["id"] == id)
        .unwrap()
}

#[tokio::test]
async fn test_connect_receives_snapshot_matching_status() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();

    let status: Value = client
        .get(format!("http://{}/status", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let mut ws = connect(&addr).await;
    let first = next_frame(&mut ws).await;

    // First frame is the full current state, no mutation needed to get it
    assert_eq!(first["type"], "train_update");
    assert_eq!(first["timestamp"], status["timestamp"]);
    assert_eq!(first["trains"], status["trains"]);
}

#[tokio::test]
async fn test_mutation_is_pushed_to_connected_subscriber() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();

    let mut ws = connect(&addr).await;
    next_frame(&mut ws).await; // initial snapshot

    let resp = client
        .post(format!("http://{}/update", addr))
        .json(&json!({"id": "T001", "lat": 9.5, "route": "Test-Route"}))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let update_body: Value = resp.json().await.unwrap();

    let frame = next_frame(&mut ws).await;
    assert_eq!(frame["type"], "train_update");
    assert_eq!(frame["timestamp"], update_body["timestamp"]);

    let t001 = find_train(&frame, "T001");
    assert_eq!(t001["lat"], 9.5);
    assert_eq!(t001["route"], "Test-Route");
    // Unspecified fields keep their prior values in the pushed state
    assert_eq!(t001["name"], "Train_A");
}

#[tokio::test]
async fn test_no_op_update_is_not_broadcast() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();

    let mut ws = connect(&addr).await;
    next_frame(&mut ws).await;

    // Batch without usable ids: changed=false, nothing pushed
    client
        .post(format!("http://{}/update", addr))
        .json(&json!([{"lat": 1.0}]))
        .send()
        .await
        .unwrap();

    // A real mutation afterwards must be the very next frame
    client
        .post(format!("http://{}/update", addr))
        .json(&json!({"id": "T002", "signal": 2}))
        .send()
        .await
        .unwrap();

    let frame = next_frame(&mut ws).await;
    assert_eq!(find_train(&frame, "T002")["signal"], 2);
}

#[tokio::test]
async fn test_dropped_subscriber_does_not_affect_others() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();

    let mut ws_a = connect(&addr).await;
    let mut ws_b = connect(&addr).await;
    next_frame(&mut ws_a).await;
    next_frame(&mut ws_b).await;

    // Subscriber A goes away without a close handshake
    drop(ws_a);

    client
        .post(format!("http://{}/update", addr))
        .json(&json!({"id": "T001", "speed_kmh": 120}))
        .send()
        .await
        .unwrap();

    // B still gets the broadcast
    let frame = next_frame(&mut ws_b).await;
    assert_eq!(find_train(&frame, "T001")["speed_kmh"], 120.0);
}

#[tokio::test]
async fn test_late_subscriber_sees_post_mutation_state() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();

    client
        .post(format!("http://{}/update", addr))
        .json(&json!({"id": "T777", "lat": 3.0, "lon": 4.0}))
        .send()
        .await
        .unwrap();

    // Connecting after the mutation: the snapshot already includes it
    let mut ws = connect(&addr).await;
    let first = next_frame(&mut ws).await;

    let t777 = find_train(&first, "T777");
    assert_eq!(t777["lat"], 3.0);
    assert_eq!(t777["name"], "T777");
}

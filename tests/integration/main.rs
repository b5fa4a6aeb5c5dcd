//! Integration tests driving the store over real HTTP.
//!
//! Each test serves stand-in backends on loopback ports and points the
//! aggregator at them through the same configuration path the binary uses.

mod backends;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use backend_aggregator::api::{create_router, AppState};
use backend_aggregator::client::HttpTransport;
use backend_aggregator::config::Config;
use backend_aggregator::endpoint::Backend;
use backend_aggregator::fetcher::fetch_greeting;
use backend_aggregator::probe::SERVICE_UNAVAILABLE;
use backend_aggregator::store::{AggregateStore, Phase};

/// Build a store from environment-style values, as the binary does.
fn store_for(node: &str, go: &str) -> AggregateStore<HttpTransport> {
    let config = Config::from_vars(vec![
        ("NODE_API_URL".to_string(), node.to_string()),
        ("GO_API_URL".to_string(), go.to_string()),
        ("REQUEST_TIMEOUT_MS".to_string(), "5000".to_string()),
    ])
    .unwrap();

    let transport = HttpTransport::new(config.request_timeout()).unwrap();
    AggregateStore::new(Arc::new(transport), config.endpoints())
}

fn ids_and_kinds(state: &backend_aggregator::AggregateState) -> Vec<(Option<i64>, Option<String>)> {
    state
        .merged
        .iter()
        .map(|item| (item.id(), item.kind().map(str::to_string)))
        .collect()
}

#[tokio::test]
async fn healthy_backends_merge_in_order() {
    let node = backends::spawn(backends::node_service()).await;
    let go = backends::spawn(backends::go_service()).await;
    let store = store_for(&node, &go);

    store.refresh().await;

    let state = store.snapshot();
    assert_eq!(state.phase, Phase::Ready);
    assert!(!state.loading);
    assert_eq!(
        state.health_of(Backend::Node).unwrap().service.as_deref(),
        Some("node-service")
    );
    assert_eq!(
        state.health_of(Backend::Go).unwrap().service.as_deref(),
        Some("go-service")
    );
    assert_eq!(
        ids_and_kinds(&state),
        vec![
            (Some(1), Some("node".to_string())),
            (Some(2), Some("node".to_string())),
            (Some(3), Some("node".to_string())),
            (Some(1), Some("go".to_string())),
            (Some(2), Some("go".to_string())),
        ]
    );
    // Extra backend fields pass through untouched.
    assert_eq!(state.merged[3].as_value()["description"], json!("first"));
}

#[tokio::test]
async fn unreachable_backend_does_not_affect_the_other() {
    let node = backends::closed_port().await;
    let go = backends::spawn(backends::go_service()).await;
    let store = store_for(&node, &go);

    store.refresh().await;

    let state = store.snapshot();
    let node_health = state.health_of(Backend::Node).unwrap();
    assert!(!node_health.is_healthy());
    assert!(node_health.error.is_some());
    assert!(state.health_of(Backend::Go).unwrap().is_healthy());

    assert_eq!(state.items_of(Backend::Node), Some(&[][..]));
    assert_eq!(state.items_of(Backend::Go).map(<[_]>::len), Some(2));
    assert_eq!(state.merged.len(), 2);
}

#[tokio::test]
async fn server_errors_degrade_per_backend() {
    let node = backends::spawn(backends::node_service()).await;
    let go = backends::spawn(backends::broken_go_service()).await;
    let store = store_for(&node, &go);

    store.load_health().await;
    store.load_all_items().await;

    let state = store.snapshot();
    assert_eq!(
        state.health_of(Backend::Go).unwrap().error.as_deref(),
        Some(SERVICE_UNAVAILABLE)
    );
    assert!(state.items[&Backend::Go].as_ref().unwrap().is_failed());
    assert_eq!(state.items_of(Backend::Go), Some(&[][..]));
    assert_eq!(state.merged.len(), 3);
}

#[tokio::test]
async fn html_listing_degrades_to_empty() {
    let node = backends::spawn(backends::html_node_service()).await;
    let go = backends::spawn(backends::go_service()).await;
    let store = store_for(&node, &go);

    store.load_all_items().await;

    let state = store.snapshot();
    assert_eq!(state.items_of(Backend::Node), Some(&[][..]));
    assert_eq!(
        ids_and_kinds(&state),
        vec![
            (Some(1), Some("go".to_string())),
            (Some(2), Some("go".to_string())),
        ]
    );
}

#[tokio::test]
async fn null_data_is_an_empty_listing() {
    let node = backends::spawn(backends::node_service()).await;
    let go = backends::spawn(backends::empty_go_service()).await;
    let store = store_for(&node, &go);

    store.load_backend_items(Backend::Go).await;

    let state = store.snapshot();
    assert!(!state.items[&Backend::Go].as_ref().unwrap().is_failed());
    assert_eq!(state.items_of(Backend::Go), Some(&[][..]));
    assert_eq!(state.items_of(Backend::Node), None);
}

#[tokio::test]
async fn repeated_health_loads_are_stable() {
    let node = backends::spawn(backends::node_service()).await;
    let go = backends::spawn(backends::go_service()).await;
    let store = store_for(&node, &go);

    store.load_health().await;
    let first = store.snapshot().health;
    store.load_health().await;
    let second = store.snapshot().health;

    assert_eq!(first, second);
}

#[tokio::test]
async fn greetings_are_fetched() {
    let node = backends::spawn(backends::node_service()).await;
    let go = backends::spawn(backends::go_service()).await;
    let store = store_for(&node, &go);

    for backend in [Backend::Node, Backend::Go] {
        let greeting = fetch_greeting(
            store.transport(),
            store.endpoints().get(backend),
            backend.greeting_path(),
        )
        .await
        .unwrap();
        assert_eq!(greeting.version.as_deref(), Some("1.0.0"));
    }
}

#[tokio::test]
async fn api_serves_refreshed_state() {
    let node = backends::spawn(backends::node_service()).await;
    let go = backends::closed_port().await;
    let store = Arc::new(store_for(&node, &go));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = create_router(AppState::new(Arc::clone(&store)));
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap();
    let base = format!("http://{}", addr);

    let ready = http.get(format!("{}/ready", base)).send().await.unwrap();
    assert_eq!(ready.status().as_u16(), 503);

    let state: Value = http
        .post(format!("{}/api/v1/refresh", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(state["phase"], json!("ready"));
    assert_eq!(state["health"]["node"]["status"], json!("healthy"));
    assert!(state["health"]["go"]["error"].is_string());
    assert_eq!(state["items"]["go"]["outcome"], json!("failed"));

    let items: Value = http
        .get(format!("{}/api/v1/items", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(items["data"].as_array().map(Vec::len), Some(3));

    let ready = http.get(format!("{}/ready", base)).send().await.unwrap();
    assert_eq!(ready.status().as_u16(), 200);
}

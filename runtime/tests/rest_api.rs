//! REST surface served on an ephemeral port.

mod common;

use katsini_runtime::rest;
use katsini_runtime::Katsini;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn spawn(service: Arc<Katsini>) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, rest::router(service)).await.unwrap();
    });
    addr
}

async fn get(addr: SocketAddr, uri: &str) -> (u16, Value) {
    let resp = reqwest::get(format!("http://{addr}{uri}")).await.unwrap();
    let status = resp.status().as_u16();
    let body = resp.json().await.unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let (service, _) = common::service(common::config("http://127.0.0.1:1"));
    let addr = spawn(service).await;
    let (status, body) = get(addr, "/health").await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_missing_identifiers_are_rejected_before_any_work() {
    let (service, launcher) = common::service(common::config("http://127.0.0.1:1"));
    let addr = spawn(service).await;

    let (status, body) = get(addr, "/playstore").await;
    assert_eq!(status, 400);
    assert_eq!(body, json!({"error": "Please provide an app bundleId"}));

    let (status, body) = get(addr, "/appstore?country=us").await;
    assert_eq!(status, 400);
    assert_eq!(body, json!({"error": "Please provide an app appId or bundleId"}));

    let (status, body) = get(addr, "/appgallery?appId=").await;
    assert_eq!(status, 400);
    assert_eq!(body, json!({"error": "Please provide an app appId"}));

    assert_eq!(launcher.attempts(), 0);
}

#[tokio::test]
async fn test_app_store_success_is_flat_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lookup"))
        .and(query_param("id", "1097587096"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resultCount": 1,
            "results": [{
                "trackId": 1097587096,
                "bundleId": "com.agiletortoise.Diced",
                "trackViewUrl": "https://apps.apple.com/us/app/diced-puzzle-dice-game/id1097587096?uo=4",
                "trackName": "Diced - Puzzle Dice Game",
                "version": "1.4",
                "currentVersionReleaseDate": "2021-11-30T17:05:11Z",
                "artistName": "Agile Tortoise"
            }]
        })))
        .mount(&server)
        .await;

    let (service, _) = common::service(common::config(&server.uri()));
    let addr = spawn(service).await;
    let (status, body) = get(addr, "/appstore?appId=1097587096").await;

    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({
            "appId": "1097587096",
            "bundleId": "com.agiletortoise.Diced",
            "url": "https://apps.apple.com/us/app/diced-puzzle-dice-game/id1097587096?uo=4",
            "title": "Diced - Puzzle Dice Game",
            "version": "1.4",
            "updated": "30-11-2021",
            "developer": "Agile Tortoise"
        })
    );
}

#[tokio::test]
async fn test_provider_errors_are_bad_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lookup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"resultCount": 0, "results": []})))
        .mount(&server)
        .await;

    let (service, _) = common::service(common::config(&server.uri()));
    let addr = spawn(service).await;

    let (status, body) = get(addr, "/appstore?bundleId=com.nope").await;
    assert_eq!(status, 400);
    assert_eq!(body, json!({"error": "app not found"}));

    let (status, body) = get(addr, "/playstore?bundleId=com.gianlu.timeless").await;
    assert_eq!(status, 400);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("failed to start browser session"));
}

#[tokio::test]
async fn test_non_get_is_method_not_allowed() {
    let (service, _) = common::service(common::config("http://127.0.0.1:1"));
    let addr = spawn(service).await;
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/playstore"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 405);
}

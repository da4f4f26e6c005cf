use std::sync::Arc;

use axum::http::{self, Request, StatusCode};
use explorer_core::{AppendAck, ErrorBody, HistoryEntry, MemoryHistory};
use history_server::{app, app_with};
use http_body_util::BodyExt;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn list_request() -> Request<String> {
    Request::builder().uri("/history").body(String::new()).unwrap()
}

fn entry_body(url: &str) -> String {
    serde_json::json!({
        "url": url,
        "method": "GET",
        "headers": [{ "id": "h1", "key": "Accept", "value": "*/*", "enabled": true }],
        "body": null,
        "responseSummary": { "status": 200, "statusText": "OK" }
    })
    .to_string()
}

// --- list ---

#[tokio::test]
async fn list_history_empty() {
    let resp = app().oneshot(list_request()).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let entries: Vec<HistoryEntry> = body_json(resp).await;
    assert!(entries.is_empty());
}

// --- append ---

#[tokio::test]
async fn append_returns_201_with_assigned_fields() {
    let resp = app()
        .oneshot(json_request("POST", "/history", &entry_body("api.test/a")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let ack: AppendAck = body_json(resp).await;
    assert_eq!(ack.message, "Request saved to history");
    assert_eq!(ack.item.request.url, "api.test/a");
    assert!(!ack.item.id.is_empty());
    assert!(ack.item.timestamp > 0);
    assert_eq!(ack.item.request.headers[0].id, "h1");
}

#[tokio::test]
async fn append_missing_url_returns_400() {
    let store = Arc::new(MemoryHistory::new());
    let resp = app_with(store.clone())
        .oneshot(json_request("POST", "/history", r#"{"method":"GET"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: ErrorBody = body_json(resp).await;
    assert_eq!(err.message, "Missing required fields: url and method");
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn append_missing_method_returns_400() {
    let store = Arc::new(MemoryHistory::new());
    let resp = app_with(store.clone())
        .oneshot(json_request("POST", "/history", r#"{"url":"api.test"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn append_malformed_json_is_a_client_error() {
    let resp = app()
        .oneshot(json_request("POST", "/history", "{not json"))
        .await
        .unwrap();

    assert!(resp.status().is_client_error());
    assert!(!body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn append_unknown_method_is_a_client_error() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/history",
            r#"{"url":"api.test","method":"FETCH"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unsupported_method_on_history_is_405() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/history")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// --- ordering and bounding ---

#[tokio::test]
async fn list_is_newest_first_and_bounded() {
    use tower::Service;

    let store = Arc::new(MemoryHistory::with_cap(5));
    let mut app = app_with(store).into_service();

    for i in 0..8 {
        let resp = ServiceExt::ready(&mut app)
            .await
            .unwrap()
            .call(json_request("POST", "/history", &entry_body(&format!("api.test/{i}"))))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(list_request())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let entries: Vec<HistoryEntry> = body_json(resp).await;
    let urls: Vec<&str> = entries.iter().map(|e| e.request.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["api.test/7", "api.test/6", "api.test/5", "api.test/4", "api.test/3"]
    );
    assert!(entries.windows(2).all(|w| w[0].timestamp > w[1].timestamp));
}

//! 라우터 통합 테스트 (StubGateway + oneshot).

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use tickers_api::middleware::ClientCounter;
use tickers_api::{create_api_router, AppState};
use tickers_core::{CachingConfig, DividendRecord, TickerError, UpstreamConfig};
use tickers_data::{StubCall, StubGateway, TickerService};

fn app_with(stub: StubGateway) -> (Arc<StubGateway>, Router) {
    let stub = Arc::new(stub);
    let service = TickerService::new(
        stub.clone(),
        &CachingConfig::default(),
        &UpstreamConfig::default(),
    );
    let state = AppState::new(Arc::new(service), Arc::new(ClientCounter::disabled()));
    (stub, create_api_router().with_state(Arc::new(state)))
}

fn app() -> (Arc<StubGateway>, Router) {
    app_with(StubGateway::new().with_symbols(&["AAPL", "MSFT", "BRK-B"]))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap()
}

#[tokio::test]
async fn root_reports_online() {
    let (_, app) = app();
    let (status, body) = get(&app, "/").await;

    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["status"], "online");
    assert!(body["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e == "/tickers/quote"));
}

#[tokio::test]
async fn health_endpoints() {
    let (_, app) = app();

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    let (status, body) = get(&app, "/health/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["caches"].as_array().unwrap().len(), 9);
}

#[tokio::test]
async fn missing_symbols_is_bad_request() {
    let (stub, app) = app();

    for uri in [
        "/tickers/info",
        "/tickers/quote?symbols=",
        "/tickers/dividends?symbols=%20,%20",
        "/tickers/calendar?symbol=",
    ] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(json(&body)["code"], "INVALID_REQUEST");
    }

    assert_eq!(stub.total_calls(), 0);
}

#[tokio::test]
async fn quote_batch_isolates_unknown_symbol() {
    let (_, app) = app();
    let (status, body) = get(&app, "/tickers/quote?symbols=AAPL,ZZZFAKE,MSFT").await;

    assert_eq!(status, StatusCode::OK);

    // 요청 순서 유지
    let aapl = body.find("\"AAPL\"").unwrap();
    let fake = body.find("\"ZZZFAKE\"").unwrap();
    let msft = body.find("\"MSFT\"").unwrap();
    assert!(aapl < fake && fake < msft);

    let body = json(&body);
    assert_eq!(body.as_object().unwrap().len(), 3);
    assert_eq!(body["AAPL"]["symbol"], "AAPL");
    assert!(body["MSFT"]["currentPrice"].is_number());
    assert_eq!(body["ZZZFAKE"]["kind"], "UPSTREAM_NOT_FOUND");
    assert!(body["ZZZFAKE"]["error"].is_string());
}

#[tokio::test]
async fn symbols_are_normalized() {
    let (stub, app) = app();
    let (status, body) = get(&app, "/tickers/info?symbols=%20aapl%20,AAPL,msft").await;

    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    let keys: Vec<_> = body.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys.len(), 2);
    assert!(body.get("AAPL").is_some());
    assert!(body.get("MSFT").is_some());
    assert_eq!(stub.calls(StubCall::InfoBatch), 1);
}

#[tokio::test]
async fn single_unknown_quote_is_not_found() {
    let (_, app) = app();
    let (status, body) = get(&app, "/tickers/quote?symbol=ZZZFAKE").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let body = json(&body);
    assert_eq!(body["code"], "UPSTREAM_NOT_FOUND");
    assert_eq!(body["path"], "/tickers/quote");
}

#[tokio::test]
async fn failed_batch_is_bad_gateway() {
    let stub = StubGateway::new()
        .with_symbols(&["AAPL", "MSFT"])
        .with_batch_failure(TickerError::UpstreamTransient("rate limited".to_string()));
    let (_, app) = app_with(stub);

    let (status, body) = get(&app, "/tickers/info?symbols=AAPL,MSFT").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json(&body)["code"], "UPSTREAM_UNAVAILABLE");
}

#[tokio::test]
async fn empty_dividends_render_as_empty_list() {
    let stub = StubGateway::new().with_symbols(&["AAPL", "BRK-B"]).with_dividends(
        "AAPL",
        vec![DividendRecord {
            date: "2024-05-10".to_string(),
            dividends: 0.25,
        }],
    );
    let (_, app) = app_with(stub);

    let (status, body) = get(&app, "/tickers/dividends?symbols=BRK-B,AAPL,ZZZFAKE").await;
    assert_eq!(status, StatusCode::OK);

    let body = json(&body);
    assert_eq!(body["BRK-B"], serde_json::json!([]));
    assert_eq!(body["AAPL"][0]["Dividends"], 0.25);
    assert_eq!(body["AAPL"][0]["Date"], "2024-05-10");
    assert_eq!(body["ZZZFAKE"], serde_json::json!([]));
}

#[tokio::test]
async fn calendar_failure_renders_as_empty_object() {
    let (_, app) = app();
    let (status, body) = get(&app, "/tickers/calendar?symbols=AAPL,ZZZFAKE").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["ZZZFAKE"], serde_json::json!({}));
}

#[tokio::test]
async fn history_validates_parameters() {
    let (stub, app) = app();

    let (status, body) = get(&app, "/tickers/history?symbol=AAPL&period=7w").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["code"], "INVALID_REQUEST");

    let (status, _) = get(&app, "/tickers/history?symbol=AAPL&interval=2h").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(stub.calls(StubCall::History), 0);

    let (status, body) = get(&app, "/tickers/history?symbols=AAPL,ZZZFAKE&period=1y&interval=1wk").await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["AAPL"].as_array().unwrap().len(), 1);
    assert!(body["AAPL"][0].get("Adj Close").is_some());
    assert_eq!(body["ZZZFAKE"]["kind"], "UPSTREAM_NOT_FOUND");
}

#[tokio::test]
async fn repeated_requests_hit_the_cache() {
    let (stub, app) = app();

    get(&app, "/tickers/recommendations?symbol=AAPL").await;
    get(&app, "/tickers/recommendations?symbol=aapl").await;
    get(&app, "/tickers/splits?symbols=AAPL,MSFT").await;
    get(&app, "/tickers/splits?symbols=MSFT,AAPL").await;

    assert_eq!(stub.calls(StubCall::Recommendations), 1);
    assert_eq!(stub.calls(StubCall::Splits), 2);
}

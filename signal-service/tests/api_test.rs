mod common;

use common::{article, build_service, fast_config, init_tracing, MockNewsSource, ScriptedModel};
use reqwest::StatusCode;
use serde_json::Value;
use signal_service::api;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

type TestResult = signal_service::Result<()>;

async fn spawn_app(source: MockNewsSource, model: ScriptedModel) -> SocketAddr {
    let service = build_service(Arc::new(source), Arc::new(model), &fast_config()).await;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, api::router(Arc::new(service)))
            .await
            .unwrap();
    });
    addr
}

#[tokio::test]
async fn test_latest_signal_endpoint() -> TestResult {
    init_tracing();

    let source = MockNewsSource::with_articles(vec![article(
        "https://news.example.com/aapl",
        "Apple beats earnings expectations.",
    )]);
    let addr = spawn_app(source, ScriptedModel::answering(&["positive"])).await;

    let response = reqwest::get(format!("http://{addr}/signal/latest/AAPL")).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await?;
    assert_eq!(body["tokenPair"], "AAPL");
    assert_eq!(body["action"], 1);
    assert!(body["timestamp"].as_f64().unwrap() > 1_600_000_000.0);
    assert_eq!(body.as_object().unwrap().len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_latest_signal_without_news_is_neutral() -> TestResult {
    init_tracing();

    let addr = spawn_app(MockNewsSource::empty(), ScriptedModel::answering(&["neutral"])).await;

    let body: Value = reqwest::get(format!("http://{addr}/signal/latest/ETH-USDT"))
        .await?
        .json()
        .await?;
    assert_eq!(body["tokenPair"], "ETH-USDT");
    assert_eq!(body["action"], 0);
    Ok(())
}

#[tokio::test]
async fn test_classification_error_maps_to_no_action() -> TestResult {
    init_tracing();

    let addr = spawn_app(MockNewsSource::empty(), ScriptedModel::answering(&["no idea"])).await;

    let response = reqwest::get(format!("http://{addr}/signal/latest/TSLA")).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await?;
    assert_eq!(body["action"], 0);
    Ok(())
}

#[tokio::test]
async fn test_pipeline_failure_is_a_server_error() -> TestResult {
    init_tracing();

    let source = MockNewsSource {
        fail_search: true,
        ..Default::default()
    };
    let addr = spawn_app(source, ScriptedModel::answering(&["neutral"])).await;

    let response = reqwest::get(format!("http://{addr}/signal/latest/AAPL")).await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json().await?;
    assert_eq!(body["error"], "internal_error");
    assert!(body["message"].as_str().unwrap().contains("503"));
    Ok(())
}

#[tokio::test]
async fn test_unknown_route_is_not_found() -> TestResult {
    init_tracing();

    let addr = spawn_app(MockNewsSource::empty(), ScriptedModel::answering(&["neutral"])).await;

    let response = reqwest::get(format!("http://{addr}/signal/history/AAPL")).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

//! 티커 데이터 게이트웨이 API 서버.
//!
//! 설정을 읽고 Yahoo Finance 게이트웨이와 캐시 서비스를 구성한 뒤
//! Axum 기반 REST API 서버를 시작합니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{http::StatusCode, middleware, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use tickers_api::metrics::{metrics_router, setup_metrics_recorder};
use tickers_api::middleware::{client_counter_layer, metrics_layer, ClientCounter};
use tickers_api::openapi::swagger_ui_router;
use tickers_api::routes::create_api_router;
use tickers_api::state::AppState;
use tickers_core::{init_logging, AppConfig, LogConfig, ServerConfig};
use tickers_data::{TickerService, YahooGateway};

/// CORS 레이어 생성.
///
/// `server.cors_origins`에 `*`가 있으면 모든 origin을 허용합니다.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let allow_origin = if config.allows_any_origin() {
        AllowOrigin::any()
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|s| s.trim().parse().ok())
            .collect();

        if origins.is_empty() {
            warn!("server.cors_origins contains no valid origins, allowing any");
            AllowOrigin::any()
        } else {
            info!("CORS configured with {} allowed origins", origins.len());
            AllowOrigin::list(origins)
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([axum::http::Method::GET, axum::http::Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE, axum::http::header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}

/// 전체 라우터 생성.
fn create_router(state: Arc<AppState>, metrics: Router, config: &ServerConfig) -> Router {
    let client_counter = state.client_counter.clone();

    Router::new()
        .merge(metrics)
        .merge(create_api_router().with_state(state))
        // OpenAPI 문서 및 Swagger UI
        .merge(swagger_ui_router::<()>())
        .layer(middleware::from_fn_with_state(
            client_counter,
            client_counter_layer,
        ))
        .layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(cors_layer(config))
}

/// OpenAPI 스펙 내보내기 처리.
///
/// `--export-openapi` 플래그가 있으면 OpenAPI JSON을 stdout으로 출력합니다.
/// 출력했으면 `true`를 반환합니다.
fn handle_export_openapi() -> anyhow::Result<bool> {
    use tickers_api::openapi::ApiDoc;
    use utoipa::OpenApi as _;

    if !std::env::args().any(|arg| arg == "--export-openapi") {
        return Ok(false);
    }

    let json = serde_json::to_string_pretty(&ApiDoc::openapi())?;
    println!("{}", json);
    Ok(true)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    if handle_export_openapi()? {
        return Ok(());
    }

    let config = AppConfig::load_default().context("Failed to load configuration")?;

    init_logging(LogConfig::from_settings(&config.logging))
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    info!(
        host = %config.server.host,
        port = config.server.port,
        cache_enabled = config.caching.enabled,
        ttl_seconds = config.caching.ttl_seconds,
        max_size = config.caching.max_size,
        batch_max_size = config.caching.batch_max_size,
        upstream_timeout_secs = config.upstream.timeout_secs,
        max_concurrency = config.upstream.max_concurrency,
        "Configuration loaded"
    );

    let gateway = YahooGateway::new(&config.upstream)?;
    let service = Arc::new(TickerService::new(
        Arc::new(gateway),
        &config.caching,
        &config.upstream,
    ));
    let client_counter = Arc::new(ClientCounter::from_config(&config.logging));
    let state = Arc::new(AppState::new(service.clone(), client_counter.clone()));

    let metrics_handle = setup_metrics_recorder()?;
    let app = create_router(state, metrics_router(metrics_handle, service), &config.server);

    let bind_addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    let addr = listener.local_addr()?;

    info!(%addr, "API server listening");
    info!("Swagger UI available at http://{}/swagger-ui", addr);
    info!("Metrics available at http://{}/metrics", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shutdown initiated, writing client counts...");
    if let Err(e) = client_counter.flush().await {
        warn!(error = %e, "Failed to write client counts on shutdown");
    }

    info!("Server stopped gracefully");
    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 반환합니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! Arc로 래핑되어 여러 요청 간에 안전하게 공유됩니다.

use std::sync::Arc;

use tickers_data::TickerService;

use crate::middleware::ClientCounter;

/// 애플리케이션 공유 상태.
///
/// 시작 시 한 번 생성되며 Axum의 State extractor를 통해 핸들러에 주입됩니다.
#[derive(Clone)]
pub struct AppState {
    /// 캐시를 거쳐 업스트림을 조회하는 서비스
    pub service: Arc<TickerService>,

    /// 클라이언트별 요청 수 집계기
    pub client_counter: Arc<ClientCounter>,

    /// 서버 시작 시간
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 새 상태를 생성합니다.
    pub fn new(service: Arc<TickerService>, client_counter: Arc<ClientCounter>) -> Self {
        Self {
            service,
            client_counter,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }
}

/// 테스트용 상태 생성.
///
/// `AAPL`, `MSFT`만 알고 있는 스텁 게이트웨이와 파일에 기록하지 않는
/// 요청 수 집계기를 사용합니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    use tickers_core::{CachingConfig, DividendRecord, UpstreamConfig};
    use tickers_data::StubGateway;

    let gateway = StubGateway::new()
        .with_symbols(&["AAPL", "MSFT", "BRK-B"])
        .with_dividends(
            "AAPL",
            vec![DividendRecord {
                date: "2024-05-10".to_string(),
                dividends: 0.25,
            }],
        );
    let service = TickerService::new(
        Arc::new(gateway),
        &CachingConfig::default(),
        &UpstreamConfig::default(),
    );

    AppState::new(Arc::new(service), Arc::new(ClientCounter::disabled()))
}

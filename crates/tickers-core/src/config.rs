//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 관리합니다.
//! 설정은 시작 시 한 번 로드되며 이후 변경되지 않습니다.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 설정 파일 경로를 지정하는 환경 변수.
pub const CONFIG_PATH_ENV: &str = "TICKERS_CONFIG";

/// 기본 설정 파일 경로.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
    /// 캐시 설정
    pub caching: CachingConfig,
    /// 업스트림 데이터 제공자 설정
    pub upstream: UpstreamConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 허용할 CORS origin 목록 (`*`이면 전체 허용)
    pub cors_origins: Vec<String>,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// `host:port` 형식의 바인딩 주소.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 모든 origin을 허용하는지 확인합니다.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o.trim() == "*")
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
    /// 로그를 추가로 기록할 파일 (빈 문자열이면 stdout에만 출력)
    pub file: String,
    /// 소스 파일명과 줄 번호 포함 여부
    pub with_file: bool,
    /// 대상(모듈 경로) 포함 여부
    pub with_target: bool,
    /// span 진입/종료 이벤트 기록 여부
    pub span_events: bool,
    /// 클라이언트별 요청 수를 저장할 파일 (빈 문자열이면 비활성화)
    pub client_counts_file: String,
    /// N개 요청마다 클라이언트 요청 수를 기록 (0이면 종료 시에만)
    pub client_counts_flush_every: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: String::new(),
            with_file: true,
            with_target: true,
            span_events: false,
            client_counts_file: "logs/ip_counts.json".to_string(),
            client_counts_flush_every: 50,
        }
    }
}

/// 캐시 설정.
///
/// 데이터 종류와 조회 모드(단일/배치)마다 독립된 캐시 인스턴스가
/// 이 설정을 공유합니다.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CachingConfig {
    /// 캐시 사용 여부
    pub enabled: bool,
    /// 항목 유효 시간 (초)
    pub ttl_seconds: u64,
    /// 단일 심볼 캐시 인스턴스당 최대 항목 수
    pub max_size: usize,
    /// 배치 캐시 인스턴스당 최대 항목 수
    pub batch_max_size: usize,
}

impl Default for CachingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 600,
            max_size: 128,
            batch_max_size: 64,
        }
    }
}

impl CachingConfig {
    /// 항목 유효 시간.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// 업스트림 데이터 제공자 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// 게이트웨이 호출당 타임아웃 (초)
    pub timeout_secs: u64,
    /// 요청 하나에서 동시에 실행할 최대 업스트림 호출 수
    pub max_concurrency: usize,
    /// 업스트림 요청에 사용할 User-Agent
    pub user_agent: String,
    /// quote / quoteSummary API 기본 URL
    pub base_url: String,
    /// 인증 쿠키를 받기 위한 URL
    pub cookie_url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_concurrency: 8,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
                .to_string(),
            base_url: "https://query1.finance.yahoo.com".to_string(),
            cookie_url: "https://fc.yahoo.com".to_string(),
        }
    }
}

impl UpstreamConfig {
    /// 게이트웨이 호출 타임아웃.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    /// 환경 변수는 `TICKERS__SECTION__KEY` 형식입니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // 파일에서 로드 (선택)
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("TICKERS")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// 기본 경로에서 설정을 로드합니다.
    ///
    /// `TICKERS_CONFIG`가 지정되어 있으면 그 경로를 사용합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(path)
    }
}

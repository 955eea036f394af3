//! 클라이언트별 요청 수 집계 middleware.
//!
//! 요청마다 클라이언트 주소를 기록하고 누적 요청 수를 JSON 파일에 저장합니다.
//! 파일은 시작 시 읽고, N개 요청마다 그리고 종료 시 다시 씁니다.
//!
//! 기록은 한 번에 하나씩만 진행되며, 임시 파일에 쓴 뒤 `rename`으로 교체하므로
//! 파일에는 항상 완전한 JSON 스냅샷만 남습니다.

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use tickers_core::LoggingConfig;

/// 클라이언트를 식별할 수 없을 때 사용하는 이름.
const UNKNOWN_CLIENT: &str = "unknown";

/// 클라이언트별 요청 수 집계기.
pub struct ClientCounter {
    /// 저장 파일 경로 (`None`이면 메모리에만 유지)
    path: Option<PathBuf>,
    /// 이 수만큼 요청이 쌓이면 파일에 기록 (0이면 종료 시에만)
    flush_every: u64,
    counts: Mutex<HashMap<String, u64>>,
    /// 마지막 기록 이후 요청 수
    since_flush: AtomicU64,
    /// 스냅샷과 파일 쓰기를 직렬화
    flush_lock: Mutex<()>,
}

impl ClientCounter {
    /// 파일에서 기존 집계를 읽어 집계기를 생성합니다.
    ///
    /// 파일이 없거나 내용이 손상되었으면 빈 집계로 시작합니다.
    pub fn load(path: impl Into<PathBuf>, flush_every: u64) -> Self {
        let path = path.into();
        let counts = read_counts(&path);
        debug!(path = %path.display(), clients = counts.len(), "Client counts loaded");

        Self {
            path: Some(path),
            flush_every,
            counts: Mutex::new(counts),
            since_flush: AtomicU64::new(0),
            flush_lock: Mutex::new(()),
        }
    }

    /// 파일에 기록하지 않는 집계기.
    pub fn disabled() -> Self {
        Self {
            path: None,
            flush_every: 0,
            counts: Mutex::new(HashMap::new()),
            since_flush: AtomicU64::new(0),
            flush_lock: Mutex::new(()),
        }
    }

    /// 로깅 설정으로 생성합니다. 파일 경로가 비어 있으면 파일 기록을 끕니다.
    pub fn from_config(config: &LoggingConfig) -> Self {
        let file = config.client_counts_file.trim();
        if file.is_empty() {
            Self::disabled()
        } else {
            Self::load(file, config.client_counts_flush_every)
        }
    }

    /// 요청 한 건을 기록하고 해당 클라이언트의 누적 요청 수를 반환합니다.
    pub async fn record(&self, client: &str) -> u64 {
        let count = {
            let mut counts = self.counts.lock().await;
            let entry = counts.entry(client.to_string()).or_insert(0);
            *entry += 1;
            *entry
        };

        if self.claim_flush() {
            if let Err(e) = self.flush().await {
                warn!(error = %e, "Failed to write client counts");
            }
        }

        count
    }

    /// 요청 수를 하나 올리고, 임계값에 도달했으면 카운터를 0으로 되돌리며 기록 권한을 얻습니다.
    ///
    /// 임계값을 넘길 때마다 정확히 한 요청만 `true`를 받습니다.
    fn claim_flush(&self) -> bool {
        if self.flush_every == 0 {
            return false;
        }

        let flush_every = self.flush_every;
        let previous = self
            .since_flush
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |pending| {
                if pending + 1 >= flush_every {
                    Some(0)
                } else {
                    Some(pending + 1)
                }
            });

        // 클로저가 항상 Some을 반환하므로 Err는 발생하지 않음
        matches!(previous, Ok(pending) if pending + 1 >= flush_every)
    }

    /// 클라이언트의 누적 요청 수.
    pub async fn count(&self, client: &str) -> u64 {
        self.counts.lock().await.get(client).copied().unwrap_or(0)
    }

    /// 집계된 클라이언트 수.
    pub async fn len(&self) -> usize {
        self.counts.lock().await.len()
    }

    /// 집계가 비어 있는지 확인합니다.
    pub async fn is_empty(&self) -> bool {
        self.counts.lock().await.is_empty()
    }

    /// 현재 집계를 파일에 기록합니다. 상위 디렉토리가 없으면 만듭니다.
    ///
    /// 동시에 호출되면 순서대로 실행되며, 나중에 실행된 기록이 더 최신 스냅샷을 씁니다.
    pub async fn flush(&self) -> std::io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let _flushing = self.flush_lock.lock().await;

        let snapshot: BTreeMap<String, u64> = {
            let counts = self.counts.lock().await;
            counts.iter().map(|(k, v)| (k.clone(), *v)).collect()
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&snapshot)?;

        let tmp = temp_path(path);
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;

        debug!(path = %path.display(), clients = snapshot.len(), "Client counts written");
        Ok(())
    }
}

/// 같은 디렉토리의 임시 파일 경로 (`<파일명>.tmp`).
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn read_counts(path: &Path) -> HashMap<String, u64> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return HashMap::new(),
    };

    match serde_json::from_str(&raw) {
        Ok(counts) => counts,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Client counts file is corrupt, starting empty");
            HashMap::new()
        }
    }
}

/// 요청에서 클라이언트 주소 추출.
///
/// X-Forwarded-For(첫 번째 값), X-Real-IP, 소켓 주소 순으로 확인합니다.
pub fn client_address(request: &Request) -> String {
    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(first) = header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return first.to_string();
    }

    if let Some(real_ip) = header("x-real-ip") {
        return real_ip.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// 클라이언트별 요청 수를 집계하는 미들웨어.
pub async fn client_counter_layer(
    State(counter): State<Arc<ClientCounter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_address(&request);
    let count = counter.record(&client).await;

    info!(
        client = %client,
        method = %request.method(),
        path = %request.uri().path(),
        count,
        "Request"
    );

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn request_with(headers: &[(&str, &str)]) -> Request {
        let mut builder = Request::builder().uri("/tickers/quote");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_client_address_prefers_forwarded_for() {
        let request = request_with(&[
            ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
            ("x-real-ip", "198.51.100.2"),
        ]);
        assert_eq!(client_address(&request), "203.0.113.7");
    }

    #[test]
    fn test_client_address_falls_back() {
        let request = request_with(&[("x-real-ip", "198.51.100.2")]);
        assert_eq!(client_address(&request), "198.51.100.2");

        let mut request = request_with(&[]);
        assert_eq!(client_address(&request), "unknown");

        let addr: SocketAddr = "192.0.2.10:52000".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(client_address(&request), "192.0.2.10");
    }

    #[tokio::test]
    async fn test_missing_or_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();

        let missing = ClientCounter::load(dir.path().join("none.json"), 0);
        assert!(missing.is_empty().await);

        let corrupt_path = dir.path().join("corrupt.json");
        std::fs::write(&corrupt_path, "{not json").unwrap();
        let corrupt = ClientCounter::load(&corrupt_path, 0);
        assert!(corrupt.is_empty().await);
    }

    #[tokio::test]
    async fn test_flush_every_n_requests() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ip_counts.json");
        let counter = ClientCounter::load(&path, 2);

        counter.record("10.0.0.1").await;
        assert!(!path.exists());

        counter.record("10.0.0.1").await;
        let saved: HashMap<String, u64> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.get("10.0.0.1"), Some(&2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_flushes_leave_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ip_counts.json");
        let counter = Arc::new(ClientCounter::load(&path, 1));

        let handles: Vec<_> = (0..400)
            .map(|i| {
                let counter = counter.clone();
                tokio::spawn(async move {
                    counter.record(&format!("10.0.{}.{}", i / 256, i % 256)).await;
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let saved: HashMap<String, u64> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.len(), 400);
        assert!(saved.values().all(|&n| n == 1));
        assert!(!temp_path(&path).exists());
    }

    #[tokio::test]
    async fn test_flush_claimed_once_per_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let counter = ClientCounter::load(dir.path().join("ip_counts.json"), 3);

        let claims: Vec<bool> = (0..7).map(|_| counter.claim_flush()).collect();
        assert_eq!(claims, vec![false, false, true, false, false, true, false]);
        assert!(!ClientCounter::disabled().claim_flush());
    }

    #[tokio::test]
    async fn test_counts_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ip_counts.json");

        let counter = ClientCounter::load(&path, 0);
        counter.record("10.0.0.1").await;
        counter.record("10.0.0.2").await;
        counter.flush().await.unwrap();

        let reloaded = ClientCounter::load(&path, 0);
        assert_eq!(reloaded.count("10.0.0.1").await, 1);
        assert_eq!(reloaded.record("10.0.0.2").await, 2);
    }

    #[tokio::test]
    async fn test_disabled_counter_never_writes() {
        let counter = ClientCounter::disabled();
        counter.record("10.0.0.1").await;
        counter.flush().await.unwrap();
        assert_eq!(counter.count("10.0.0.1").await, 1);
    }

    #[tokio::test]
    async fn test_middleware_counts_requests() {
        let counter = Arc::new(ClientCounter::disabled());
        let app = Router::new()
            .route("/tickers/quote", get(|| async { "OK" }))
            .layer(middleware::from_fn_with_state(
                counter.clone(),
                client_counter_layer,
            ));

        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(request_with(&[("x-forwarded-for", "203.0.113.7")]))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        assert_eq!(counter.count("203.0.113.7").await, 3);
    }
}

//! Yahoo crumb/cookie 인증.
//!
//! quote / quoteSummary API는 쿠키와 crumb 토큰이 필요합니다.
//! 1. 쿠키 URL에서 `Set-Cookie` 헤더를 받습니다 (응답 상태는 무시)
//! 2. 쿠키를 붙여 `/v1/test/getcrumb`에서 crumb을 받습니다

use reqwest::{header, Client};
use tokio::sync::RwLock;
use tracing::debug;

use tickers_core::{TickerError, TickerResult};

use super::classify_reqwest;

/// 인증 정보.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrumbData {
    pub cookie: String,
    pub crumb: String,
}

/// 인증 정보 캐시. 게이트웨이 인스턴스마다 하나씩 가집니다.
#[derive(Debug, Default)]
pub struct CrumbStore {
    current: RwLock<Option<CrumbData>>,
}

impl CrumbStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 인증 정보를 반환하거나 새로 받아옵니다.
    pub async fn get_or_fetch(
        &self,
        client: &Client,
        cookie_url: &str,
        base_url: &str,
    ) -> TickerResult<CrumbData> {
        if let Some(crumb) = self.current.read().await.as_ref() {
            return Ok(crumb.clone());
        }

        let fresh = fetch_crumb(client, cookie_url, base_url).await?;
        *self.current.write().await = Some(fresh.clone());
        Ok(fresh)
    }

    /// 인증이 거부되었을 때 저장된 정보를 버립니다.
    pub async fn invalidate(&self) {
        *self.current.write().await = None;
    }
}

/// 쿠키와 crumb을 새로 받아옵니다.
pub async fn fetch_crumb(client: &Client, cookie_url: &str, base_url: &str) -> TickerResult<CrumbData> {
    debug!(cookie_url, "Fetching Yahoo crumb");

    let response = client
        .get(cookie_url)
        .send()
        .await
        .map_err(classify_reqwest)?;

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(';').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            TickerError::UpstreamTransient("Yahoo 인증 쿠키를 받지 못했습니다".to_string())
        })?;

    let response = client
        .get(format!("{}/v1/test/getcrumb", base_url))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .map_err(classify_reqwest)?;

    let status = response.status();
    if !status.is_success() {
        return Err(TickerError::UpstreamTransient(format!(
            "Yahoo crumb 요청 실패: HTTP {}",
            status.as_u16()
        )));
    }

    let crumb = response.text().await.map_err(classify_reqwest)?.trim().to_string();
    if crumb.is_empty() || crumb.contains('<') {
        return Err(TickerError::UpstreamTransient(
            "Yahoo crumb 응답이 비어 있습니다".to_string(),
        ));
    }

    Ok(CrumbData { cookie, crumb })
}

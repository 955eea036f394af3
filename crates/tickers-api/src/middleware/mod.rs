//! API 서버용 HTTP middleware.
//!
//! 요청 처리 파이프라인에 적용되는 middleware 모듈.

mod client_counter;
mod metrics;

pub use client_counter::{client_address, client_counter_layer, ClientCounter};
pub use metrics::{metrics_layer, TickerRequest};

//! 게이트웨이 전반에서 사용되는 공통 타입.

mod data_kind;
mod fetch_key;
mod history_params;
mod models;
mod symbol;

pub use data_kind::*;
pub use fetch_key::*;
pub use history_params::*;
pub use models::*;
pub use symbol::*;

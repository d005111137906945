// ==========================================
// 库存对账同步 - 远端网关错误类型
// ==========================================
// 说明: 错误文本会进入行级 reason，面向上传用户，使用英文
// ==========================================

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("remote API rate limit reached (HTTP 429)")]
    RateLimited { retry_after: Option<Duration> },

    #[error("remote API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("remote API error: {0}")]
    GraphQl(String),

    #[error("remote API rejected the change: {0}")]
    UserErrors(String),

    #[error("unexpected remote response: {0}")]
    Decode(String),

    #[error("gateway configuration error: {0}")]
    Configuration(String),
}

impl GatewayError {
    /// 是否为可重试的限流错误
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GatewayError::RateLimited { .. })
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Decode(err.to_string())
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

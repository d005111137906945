// ==========================================
// 库存对账同步 - 通用重试包装
// ==========================================
// 职责: 对任意远端操作按 (可重试判定, 最大尝试次数, 延迟函数) 重试
// 默认: 仅 429 重试；延迟 = base × 第 N 次尝试（线性）
// ==========================================

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn linear(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// 第 N 次失败后的等待时间: base × N
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// 执行操作，失败且可重试时按策略等待后重试
    ///
    /// # 参数
    /// - operation: 操作名（日志用）
    /// - is_retryable: 错误是否可重试
    /// - op: 每次调用产生一次新请求
    ///
    /// # 返回
    /// - 首次成功结果；不可重试错误或重试耗尽时返回最后一次错误
    pub async fn run<T, E, F, Fut, P>(&self, operation: &str, is_retryable: P, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let mut attempt: u32 = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if is_retryable(&err) && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "远端限流，等待后重试"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

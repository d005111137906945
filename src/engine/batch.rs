// ==========================================
// 库存对账同步 - 批次执行与进度
// ==========================================
// 规则: 批内并发；批间严格串行，间隔固定延迟
// 进度: 每批完成后通知观察者
// ==========================================

use futures::future::join_all;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::info;

/// 执行阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    /// 按身份键预取变体解析
    Prefetch,
    /// 逐行比对与写入
    Process,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncPhase::Prefetch => write!(f, "prefetch"),
            SyncPhase::Process => write!(f, "process"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    pub phase: SyncPhase,
    pub batch_index: usize, // 从 1 开始
    pub batch_count: usize,
    pub completed: usize,
    pub total: usize,
}

pub trait ProgressObserver: Send + Sync {
    fn on_batch(&self, progress: &BatchProgress);
}

/// 默认观察者：写入 tracing 日志
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgressObserver;

impl ProgressObserver for TracingProgressObserver {
    fn on_batch(&self, progress: &BatchProgress) {
        info!(
            phase = %progress.phase,
            batch = progress.batch_index,
            batches = progress.batch_count,
            completed = progress.completed,
            total = progress.total,
            "批次完成"
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchRunner {
    batch_size: usize,
    delay: Duration,
}

impl BatchRunner {
    pub fn new(batch_size: usize, delay: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            delay,
        }
    }

    pub fn batch_count(&self, total: usize) -> usize {
        total.div_ceil(self.batch_size)
    }

    /// 分批执行
    ///
    /// 返回结果与输入顺序一致；第 N 批全部完成后才开始第 N+1 批
    pub async fn run<I, T, F, Fut>(
        &self,
        phase: SyncPhase,
        items: Vec<I>,
        observer: &dyn ProgressObserver,
        task: F,
    ) -> Vec<T>
    where
        F: Fn(I) -> Fut,
        Fut: Future<Output = T>,
    {
        let total = items.len();
        let batch_count = self.batch_count(total);
        let mut results = Vec::with_capacity(total);
        let mut pending = items.into_iter();

        for index in 0..batch_count {
            let batch: Vec<I> = pending.by_ref().take(self.batch_size).collect();
            let outputs = join_all(batch.into_iter().map(&task)).await;
            results.extend(outputs);

            observer.on_batch(&BatchProgress {
                phase,
                batch_index: index + 1,
                batch_count,
                completed: results.len(),
                total,
            });

            if index + 1 < batch_count && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        results
    }
}

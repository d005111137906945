// ==========================================
// 库存对账同步 - 同步执行器
// ==========================================
// 单行状态机:
//   Pending → {VariantResolved, VariantFailed}
//           → {LocationResolved, LocationFailed}
//           → QuantityCompared → {Updated, Skipped, Failed}
// 运行顺序:
//   (a) 解析文件 + 去重/聚合
//   (b) 拉取全部位置（一次）
//   (c) 按身份键分批预取变体解析
//   (d) 分批逐行比对与写入
// 约束: 单行错误只影响该行；每个去重后的行恰好产生一条汇总记录
// ==========================================

use crate::config::SyncSettings;
use crate::domain::{
    IdentityKey, ParsedRow, ResolvedVariant, ResultRow, RowOutcome, RunReport, Summary,
    VariantResolution,
};
use crate::engine::batch::{BatchRunner, ProgressObserver, SyncPhase, TracingProgressObserver};
use crate::engine::location_resolver::{LocationResolution, LocationResolver};
use crate::engine::variant_resolver::VariantResolver;
use crate::gateway::{CatalogGateway, GatewayError, GatewayResult};
use crate::importer::{ConflictHandler, ImportError, ParseOutcome, RowImporter};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

// ==========================================
// SyncError - 运行级结构性错误
// ==========================================
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("文件导入失败: {0}")]
    Import(#[from] ImportError),

    #[error("远端请求失败: {0}")]
    Gateway(#[from] GatewayError),
}

// ==========================================
// SyncOptions - 运行参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub batch_size: usize,
    pub batch_delay: Duration,
    pub default_location_name: Option<String>,
    pub fuzzy_candidate_limit: usize,
    pub dry_run: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            batch_size: 5,
            batch_delay: Duration::from_millis(1000),
            default_location_name: None,
            fuzzy_candidate_limit: 10,
            dry_run: false,
        }
    }
}

impl From<&SyncSettings> for SyncOptions {
    fn from(settings: &SyncSettings) -> Self {
        Self {
            batch_size: settings.batch_size,
            batch_delay: settings.batch_delay(),
            default_location_name: settings.default_location_name.clone(),
            fuzzy_candidate_limit: settings.fuzzy_candidate_limit,
            dry_run: settings.dry_run,
        }
    }
}

// ==========================================
// SyncExecutor
// ==========================================
pub struct SyncExecutor {
    gateway: Arc<dyn CatalogGateway>,
    options: SyncOptions,
    importer: RowImporter,
    observer: Arc<dyn ProgressObserver>,
}

impl SyncExecutor {
    pub fn new(gateway: Arc<dyn CatalogGateway>, options: SyncOptions) -> Self {
        Self {
            gateway,
            options,
            importer: RowImporter::new(),
            observer: Arc::new(TracingProgressObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// 执行一次完整对账
    ///
    /// # 参数
    /// - bytes: 上传文件内容
    /// - file_name: 原始文件名（格式识别提示，可选）
    ///
    /// # 返回
    /// - Ok(RunReport): 三桶汇总（部分失败也返回 Ok）
    /// - Err: 文件无法解析或位置列表拉取失败
    #[instrument(skip(self, bytes), fields(size = bytes.len(), dry_run = self.options.dry_run))]
    pub async fn run(&self, bytes: &[u8], file_name: Option<&str>) -> Result<RunReport, SyncError> {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        info!(run_id = %run_id, "开始库存对账");

        let parsed = self.importer.import(bytes, file_name)?;
        let summary = ReconciliationRun::new(self).execute(parsed).await?;

        let report = RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            summary,
        };
        info!(
            run_id = %report.run_id,
            updated = report.summary.updated.len(),
            failed = report.summary.failed.len(),
            skipped = report.summary.skipped.len(),
            elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
            "库存对账完成"
        );
        Ok(report)
    }

    /// 对已解析的行执行对账（跳过文件解析阶段）
    pub async fn reconcile(&self, parsed: ParseOutcome) -> Result<Summary, SyncError> {
        ReconciliationRun::new(self).execute(parsed).await
    }
}

// ==========================================
// ReconciliationRun - 单次运行状态
// ==========================================
// 所有缓存随运行创建、随运行丢弃
struct ReconciliationRun<'a> {
    gateway: &'a dyn CatalogGateway,
    options: &'a SyncOptions,
    observer: &'a dyn ProgressObserver,
    runner: BatchRunner,
    resolver: VariantResolver,
    summary: Summary,
}

impl<'a> ReconciliationRun<'a> {
    fn new(executor: &'a SyncExecutor) -> Self {
        let options = &executor.options;
        Self {
            gateway: executor.gateway.as_ref(),
            options,
            observer: executor.observer.as_ref(),
            runner: BatchRunner::new(options.batch_size, options.batch_delay),
            resolver: VariantResolver::new(options.fuzzy_candidate_limit),
            summary: Summary::default(),
        }
    }

    async fn execute(mut self, parsed: ParseOutcome) -> Result<Summary, SyncError> {
        for row in parsed.skipped {
            self.summary.record(RowOutcome::Skipped(row));
        }

        // (a) 去重 / 聚合
        let dedup = ConflictHandler.deduplicate(parsed.rows);
        info!(
            unique = dedup.unique.len(),
            conflicts = dedup.failed.len(),
            aggregated = dedup.skipped.len(),
            "去重完成"
        );
        for row in dedup.failed {
            self.summary.record(RowOutcome::Failed(row));
        }
        for row in dedup.skipped {
            self.summary.record(RowOutcome::Skipped(row));
        }

        if dedup.unique.is_empty() {
            self.summary.sort_by_row_number();
            return Ok(self.summary);
        }

        // (b) 位置列表
        let locations = self.gateway.list_locations().await?;
        info!(count = locations.len(), "位置列表已加载");
        let location_resolver =
            LocationResolver::new(locations, self.options.default_location_name.clone());

        // (c) 变体预取；完成后缓存只读
        let cache = self.prefetch(&dedup.unique).await;

        // (d) 逐行处理
        let outcomes = {
            let this = &self;
            let cache = &cache;
            let location_resolver = &location_resolver;
            self.runner
                .run(SyncPhase::Process, dedup.unique, self.observer, |row| async move {
                    this.process_row(row, cache, location_resolver).await
                })
                .await
        };
        for outcome in outcomes {
            self.summary.record(outcome);
        }

        self.summary.sort_by_row_number();
        Ok(self.summary)
    }

    /// 每个身份键只解析一次；查询错误记为失败解析，不中断运行
    async fn prefetch(&self, rows: &[ParsedRow]) -> HashMap<IdentityKey, VariantResolution> {
        let mut seen: HashSet<IdentityKey> = HashSet::new();
        let mut distinct: Vec<(IdentityKey, &ParsedRow)> = Vec::new();
        for row in rows {
            let key = IdentityKey::from_row(row);
            if seen.insert(key.clone()) {
                distinct.push((key, row));
            }
        }
        info!(keys = distinct.len(), "预取变体解析");

        let resolver = &self.resolver;
        let gateway = self.gateway;
        let resolved = self
            .runner
            .run(SyncPhase::Prefetch, distinct, self.observer, |(key, row)| async move {
                let resolution = match resolver.resolve(row, gateway).await {
                    Ok(resolution) => resolution,
                    Err(err) => {
                        warn!(row = row.row_number, key = %key, error = %err, "变体查询失败");
                        VariantResolution::failed(format!("lookup error: {}", err))
                    }
                };
                (key, resolution)
            })
            .await;

        resolved.into_iter().collect()
    }

    async fn process_row(
        &self,
        row: ParsedRow,
        cache: &HashMap<IdentityKey, VariantResolution>,
        location_resolver: &LocationResolver,
    ) -> RowOutcome {
        let key = IdentityKey::from_row(&row);
        let variant = match cache.get(&key) {
            Some(VariantResolution {
                variant: Some(variant),
                ..
            }) => variant,
            Some(VariantResolution { reason, .. }) => {
                let reason = reason
                    .clone()
                    .unwrap_or_else(|| "variant could not be resolved".to_string());
                return RowOutcome::Failed(ResultRow::from_row(&row, reason));
            }
            None => {
                return RowOutcome::Failed(ResultRow::from_row(
                    &row,
                    "variant resolution missing for this row",
                ))
            }
        };

        let mut base = ResultRow::from_row(&row, "").with_fallback_sku(variant.sku.clone());
        if row.identifiers.title.is_none() && !variant.product_title.is_empty() {
            base.item_name = variant.product_title.clone();
        }

        if row.quantity < 0 {
            base.reason = format!("Invalid target quantity {}", row.quantity);
            return RowOutcome::Failed(base);
        }

        match self
            .sync_row(&row, variant, location_resolver, &mut base)
            .await
        {
            Ok(Classification::Updated) => RowOutcome::Updated(base),
            Ok(Classification::Skipped) => RowOutcome::Skipped(base),
            Ok(Classification::Failed) => RowOutcome::Failed(base),
            Err(err) => {
                warn!(row = row.row_number, error = %err, "行同步失败");
                base.reason = err.to_string();
                RowOutcome::Failed(base)
            }
        }
    }

    /// 位置解析 → 读取当前数量 → 比对 → 写入；reason 与位置名写回 result
    async fn sync_row(
        &self,
        row: &ParsedRow,
        variant: &ResolvedVariant,
        location_resolver: &LocationResolver,
        result: &mut ResultRow,
    ) -> GatewayResult<Classification> {
        let location = match location_resolver
            .resolve(row, &variant.inventory_item_id, self.gateway)
            .await?
        {
            LocationResolution::Resolved(location) => location,
            LocationResolution::Unresolved(reason) => {
                result.reason = reason;
                return Ok(Classification::Failed);
            }
        };
        result.location_name = location.name.clone();

        let target = row.quantity;
        let current = self
            .gateway
            .current_quantity(&variant.inventory_item_id, &location.id)
            .await?;

        if current == Some(target) {
            result.reason = format!("Quantity already matches ({})", target);
            return Ok(Classification::Skipped);
        }

        if self.options.dry_run {
            result.reason = match current {
                Some(previous) => format!("dry run: would update from {} to {}", previous, target),
                None => format!("dry run: would create inventory level at {}", target),
            };
            return Ok(Classification::Updated);
        }

        self.gateway
            .set_quantity(&variant.inventory_item_id, &location.id, target)
            .await?;

        result.reason = match current {
            Some(previous) => format!("Updated from {} to {}", previous, target),
            None => format!("Created/initialized inventory level at {}", target),
        };
        Ok(Classification::Updated)
    }
}

/// 单行同步结论（结果行内容由 sync_row 填写）
enum Classification {
    Updated,
    Skipped,
    Failed,
}

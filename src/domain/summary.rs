// ==========================================
// 库存对账同步 - 运行汇总
// ==========================================
// 职责: updated / failed / skipped 三桶汇总 + 运行报告
// 约束: 只追加；每个行记录恰好进入一个桶
// ==========================================

use crate::domain::row::ResultRow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// RowOutcome - 单行终态分类
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Updated(ResultRow),
    Failed(ResultRow),
    Skipped(ResultRow),
}

impl RowOutcome {
    pub fn row(&self) -> &ResultRow {
        match self {
            RowOutcome::Updated(row) | RowOutcome::Failed(row) | RowOutcome::Skipped(row) => row,
        }
    }
}

// ==========================================
// Summary - 上传接口返回体
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub updated: Vec<ResultRow>,
    pub failed: Vec<ResultRow>,
    pub skipped: Vec<ResultRow>,
}

impl Summary {
    /// 记录一条终态分类
    pub fn record(&mut self, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Updated(row) => self.updated.push(row),
            RowOutcome::Failed(row) => self.failed.push(row),
            RowOutcome::Skipped(row) => self.skipped.push(row),
        }
    }

    pub fn total(&self) -> usize {
        self.updated.len() + self.failed.len() + self.skipped.len()
    }

    /// 按行号排序各桶（并发批次内完成顺序不确定）
    pub fn sort_by_row_number(&mut self) {
        self.updated.sort_by_key(|r| r.row_number);
        self.failed.sort_by_key(|r| r.row_number);
        self.skipped.sort_by_key(|r| r.row_number);
    }
}

// ==========================================
// RunReport - 单次运行报告
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub summary: Summary,
}

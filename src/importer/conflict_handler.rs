// ==========================================
// 库存对账同步 - 冲突处理器实现
// ==========================================
// 职责: 按 (身份键, 位置) 分组，合并多库位拆分行，标记真实重复
// 规则:
// - 单行分组原样通过
// - 多行分组且每行库位非空、两两不同 → 数量求和为代表行（首行标识），
//   其余行记入 skipped
// - 否则整组（含首行）记入 failed，列出全部冲突行号
// ==========================================

use crate::domain::{GroupKey, ParsedRow, QuantitySource, ResultRow};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// 去重结果
#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    pub unique: Vec<ParsedRow>,
    pub failed: Vec<ResultRow>,
    pub skipped: Vec<ResultRow>,
}

pub struct ConflictHandler;

impl ConflictHandler {
    /// 分组去重（保持首次出现顺序）
    pub fn deduplicate(&self, rows: Vec<ParsedRow>) -> DedupOutcome {
        let mut order: Vec<GroupKey> = Vec::new();
        let mut groups: HashMap<GroupKey, Vec<ParsedRow>> = HashMap::new();

        for row in rows {
            let key = GroupKey::from_row(&row);
            groups
                .entry(key.clone())
                .or_insert_with(|| {
                    order.push(key);
                    Vec::new()
                })
                .push(row);
        }

        let mut outcome = DedupOutcome::default();
        for key in order {
            let Some(mut group) = groups.remove(&key) else {
                continue;
            };

            if group.len() == 1 {
                outcome.unique.extend(group.pop());
                continue;
            }

            if Self::is_bin_split(&group) {
                debug!(identity = %key.identity, rows = group.len(), "合并多库位拆分行");
                match Self::bin_total(&group) {
                    Some(total) => self.aggregate_bins(group, total, &mut outcome),
                    None => self.mark_overflow(group, &mut outcome),
                }
            } else {
                debug!(identity = %key.identity, rows = group.len(), "检测到重复行");
                self.mark_conflict(group, &mut outcome);
            }
        }

        outcome
    }

    /// 每行都有非空库位且库位两两不同
    fn is_bin_split(group: &[ParsedRow]) -> bool {
        let mut seen = HashSet::new();
        group.iter().all(|row| match &row.bin_name {
            Some(bin) if !bin.trim().is_empty() => seen.insert(bin.trim().to_lowercase()),
            _ => false,
        })
    }

    /// 各库位数量之和；溢出返回 None
    fn bin_total(group: &[ParsedRow]) -> Option<i64> {
        group
            .iter()
            .try_fold(0i64, |acc, row| acc.checked_add(row.quantity))
    }

    fn aggregate_bins(&self, group: Vec<ParsedRow>, total: i64, outcome: &mut DedupOutcome) {
        let bins: Vec<String> = group.iter().filter_map(|r| r.bin_name.clone()).collect();

        let mut rows = group.into_iter();
        let Some(first) = rows.next() else {
            return;
        };

        for other in rows {
            outcome.skipped.push(ResultRow::from_row(
                &other,
                format!(
                    "aggregated with other bins into row {}",
                    first.row_number
                ),
            ));
        }

        outcome.unique.push(ParsedRow {
            quantity: total,
            quantity_source: QuantitySource::AggregatedFromBins,
            bin_name: Some(bins.join(", ")),
            ..first
        });
    }

    fn mark_overflow(&self, group: Vec<ParsedRow>, outcome: &mut DedupOutcome) {
        let row_numbers: Vec<String> = group.iter().map(|r| r.row_number.to_string()).collect();
        let reason = format!(
            "Bin quantities are too large to add up (rows {})",
            row_numbers.join(", ")
        );

        for row in &group {
            outcome.failed.push(ResultRow::from_row(row, reason.clone()));
        }
    }

    fn mark_conflict(&self, group: Vec<ParsedRow>, outcome: &mut DedupOutcome) {
        let row_numbers: Vec<String> = group.iter().map(|r| r.row_number.to_string()).collect();
        let reason = format!(
            "Duplicate rows for the same item and location (rows {}); resolve the conflict in the sheet",
            row_numbers.join(", ")
        );

        for row in &group {
            outcome.failed.push(ResultRow::from_row(row, reason.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RowIdentifiers;

    fn create_test_row(
        row_number: usize,
        sku: &str,
        quantity: i64,
        location: Option<&str>,
        bin: Option<&str>,
    ) -> ParsedRow {
        ParsedRow {
            row_number,
            identifiers: RowIdentifiers {
                sku: Some(sku.to_string()),
                ..Default::default()
            },
            option_values: vec![],
            quantity,
            quantity_source: QuantitySource::ClosingStockDirect,
            location_name: location.map(|l| l.to_string()),
            bin_name: bin.map(|b| b.to_string()),
        }
    }

    #[test]
    fn test_singletons_pass_through_in_order() {
        let handler = ConflictHandler;
        let outcome = handler.deduplicate(vec![
            create_test_row(2, "B", 1, None, None),
            create_test_row(3, "A", 2, None, None),
        ]);

        assert_eq!(outcome.unique.len(), 2);
        assert_eq!(outcome.unique[0].row_number, 2);
        assert_eq!(outcome.unique[1].row_number, 3);
        assert!(outcome.failed.is_empty());
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn test_distinct_bins_are_aggregated() {
        let handler = ConflictHandler;
        let outcome = handler.deduplicate(vec![
            create_test_row(2, "HD-01", 5, Some("Main"), Some("A1")),
            create_test_row(3, "hd-01", 7, Some("main"), Some("A2")),
        ]);

        assert_eq!(outcome.unique.len(), 1);
        let rep = &outcome.unique[0];
        assert_eq!(rep.row_number, 2);
        assert_eq!(rep.quantity, 12);
        assert_eq!(rep.quantity_source, QuantitySource::AggregatedFromBins);
        assert_eq!(rep.identifiers.sku, Some("HD-01".to_string()));

        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].row_number, 3);
        assert!(outcome.skipped[0].reason.contains("aggregated with other bins"));
        assert!(outcome.failed.is_empty());
    }

    #[test]
    fn test_missing_bins_are_conflicts() {
        let handler = ConflictHandler;
        let outcome = handler.deduplicate(vec![
            create_test_row(2, "HD-01", 5, Some("Main"), None),
            create_test_row(4, "HD-01", 7, Some("Main"), None),
        ]);

        assert!(outcome.unique.is_empty());
        assert_eq!(outcome.failed.len(), 2);
        for failed in &outcome.failed {
            assert!(failed.reason.contains("rows 2, 4"));
        }
    }

    #[test]
    fn test_repeated_bin_is_conflict() {
        let handler = ConflictHandler;
        let outcome = handler.deduplicate(vec![
            create_test_row(2, "X", 1, None, Some("A1")),
            create_test_row(3, "X", 1, None, Some("B1")),
            create_test_row(4, "X", 1, None, Some(" a1 ")),
        ]);

        assert!(outcome.unique.is_empty());
        assert_eq!(outcome.failed.len(), 3);
    }

    #[test]
    fn test_different_locations_are_not_grouped() {
        let handler = ConflictHandler;
        let outcome = handler.deduplicate(vec![
            create_test_row(2, "X", 1, Some("Main"), None),
            create_test_row(3, "X", 1, Some("Backroom"), None),
            create_test_row(4, "X", 1, None, None),
        ]);

        assert_eq!(outcome.unique.len(), 3);
    }

    #[test]
    fn test_bin_sum_overflow_fails_whole_group() {
        let handler = ConflictHandler;
        let outcome = handler.deduplicate(vec![
            create_test_row(2, "X", i64::MAX, None, Some("A1")),
            create_test_row(3, "X", 5, None, Some("A2")),
            create_test_row(4, "Y", 1, None, None),
        ]);

        assert_eq!(outcome.unique.len(), 1);
        assert_eq!(outcome.unique[0].row_number, 4);
        assert!(outcome.skipped.is_empty());
        assert_eq!(outcome.failed.len(), 2);
        for failed in &outcome.failed {
            assert!(failed.reason.contains("too large"));
            assert!(failed.reason.contains("rows 2, 3"));
        }
    }

    #[test]
    fn test_conservation_of_rows() {
        let handler = ConflictHandler;
        let rows = vec![
            create_test_row(2, "A", 1, None, Some("A1")),
            create_test_row(3, "A", 2, None, Some("A2")),
            create_test_row(4, "A", 3, None, Some("A3")),
            create_test_row(5, "B", 1, None, None),
            create_test_row(6, "B", 1, None, None),
            create_test_row(7, "C", 1, None, None),
        ];
        let outcome = handler.deduplicate(rows);

        // 代表行 1 + 非代表 2 + 冲突 2 + 单行 1
        assert_eq!(outcome.unique.len(), 2);
        assert_eq!(outcome.skipped.len(), 2);
        assert_eq!(outcome.failed.len(), 2);
        assert_eq!(outcome.unique[0].quantity, 6);
    }
}

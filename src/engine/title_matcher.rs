// ==========================================
// 库存对账同步 - 标题模糊匹配
// ==========================================
// 评分: 词元 Jaccard 相似度
//   + 0.22 一方规范化文本包含另一方
//   + 0.08 前 10 个规范化字符相同
//   封顶 1.0
// 接受: 最高分 ≥ 0.58 且领先次高分 ≥ 0.08
// ==========================================

use std::collections::HashSet;

pub const CONTAINMENT_BONUS: f64 = 0.22;
pub const PREFIX_BONUS: f64 = 0.08;
pub const PREFIX_LEN: usize = 10;
pub const ACCEPT_THRESHOLD: f64 = 0.58;
pub const MIN_LEAD: f64 = 0.08;

/// 规范化：小写、标点转空白、合并空白
pub fn normalize_title(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 两个标题的相似度，取值 [0, 1]
///
/// 词元无交集时直接返回 0，加分项只作用于已有词元重叠的候选。
pub fn title_score(left: &str, right: &str) -> f64 {
    let a = normalize_title(left);
    let b = normalize_title(right);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let tokens_a: HashSet<&str> = a.split(' ').collect();
    let tokens_b: HashSet<&str> = b.split(' ').collect();
    let shared = tokens_a.intersection(&tokens_b).count();
    if shared == 0 {
        return 0.0;
    }
    let union = tokens_a.union(&tokens_b).count();
    let mut score = shared as f64 / union as f64;

    if a.contains(b.as_str()) || b.contains(a.as_str()) {
        score += CONTAINMENT_BONUS;
    }
    let prefix_a: String = a.chars().take(PREFIX_LEN).collect();
    let prefix_b: String = b.chars().take(PREFIX_LEN).collect();
    if prefix_a == prefix_b {
        score += PREFIX_BONUS;
    }

    score.min(1.0)
}

/// 候选选择结果
#[derive(Debug, Clone, PartialEq)]
pub enum TitleMatch {
    /// 被接受的候选下标与得分
    Accepted { index: usize, score: f64 },
    Rejected(String),
}

/// 在候选标题中挑选唯一可信的最佳匹配
pub fn pick_best<S: AsRef<str>>(query: &str, candidates: &[S]) -> TitleMatch {
    if candidates.is_empty() {
        return TitleMatch::Rejected(format!("no products found for title \"{}\"", query));
    }

    let mut scored: Vec<(usize, f64)> = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| (i, title_score(query, c.as_ref())))
        .collect();
    // 同分保持远端相关度顺序
    scored.sort_by(|x, y| y.1.total_cmp(&x.1).then(x.0.cmp(&y.0)));

    let (best_index, best_score) = scored[0];
    let runner_up = scored.get(1).map(|s| s.1).unwrap_or(0.0);

    if best_score < ACCEPT_THRESHOLD {
        return TitleMatch::Rejected(format!(
            "no product title close enough to \"{}\" (best \"{}\" scored {:.2})",
            query,
            candidates[best_index].as_ref(),
            best_score
        ));
    }
    if best_score - runner_up < MIN_LEAD {
        return TitleMatch::Rejected(format!(
            "ambiguous title match for \"{}\" (\"{}\" {:.2} vs {:.2})",
            query,
            candidates[best_index].as_ref(),
            best_score,
            runner_up
        ));
    }

    TitleMatch::Accepted {
        index: best_index,
        score: best_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  Blue-Hoodie (XL)!! "), "blue hoodie xl");
        assert_eq!(normalize_title("***"), "");
    }

    #[test]
    fn test_identical_titles_score_one() {
        assert_eq!(title_score("Blue Hoodie", "blue  hoodie"), 1.0);
        assert_eq!(title_score("Organic Cotton Tee", "Organic Cotton Tee"), 1.0);
    }

    #[test]
    fn test_disjoint_titles_score_zero() {
        assert_eq!(title_score("Blue Hoodie", "Green Scarf"), 0.0);
        assert_eq!(title_score("ab", "abc"), 0.0);
        assert_eq!(title_score("", "Blue Hoodie"), 0.0);
    }

    #[test]
    fn test_partial_overlap() {
        let score = title_score("Blue Hoodie", "Red Hoodie");
        assert!((score - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_containment_bonus() {
        // jaccard 2/3 + containment 0.22 + prefix 0.08
        let score = title_score("Blue Hoodie", "Blue Hoodie Zip");
        assert!((score - (2.0 / 3.0 + 0.30)).abs() < 1e-9);

        let capped = title_score("Blue Hoodie", "Blue Hoodie Pullover Zip");
        assert!(capped <= 1.0);
    }

    #[test]
    fn test_score_non_decreasing_with_overlap() {
        let query = "alpha beta gamma delta";
        let s1 = title_score(query, "alpha zeta eta theta");
        let s2 = title_score(query, "alpha beta eta theta");
        let s3 = title_score(query, "alpha beta gamma theta");
        let s4 = title_score(query, "alpha beta gamma delta");
        assert!(s1 <= s2 && s2 <= s3 && s3 <= s4);
        assert_eq!(s4, 1.0);
    }

    #[test]
    fn test_pick_best_accepts_clear_winner() {
        let candidates = ["Red Hoodie", "Blue Hoodie"];
        match pick_best("Blue Hoodie", &candidates) {
            TitleMatch::Accepted { index, score } => {
                assert_eq!(index, 1);
                assert_eq!(score, 1.0);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_pick_best_rejects_low_score() {
        let candidates = ["Red Hoodie"];
        assert!(matches!(
            pick_best("Blue Hoodie", &candidates),
            TitleMatch::Rejected(_)
        ));
        // 领先次高分足够，但得分低于阈值
        let candidates = ["Red Hoodie", "Green Scarf"];
        assert!(matches!(
            pick_best("Blue Hoodie", &candidates),
            TitleMatch::Rejected(_)
        ));
    }

    #[test]
    fn test_pick_best_rejects_ambiguous() {
        let candidates = ["Classic Wool Beanie", "Classic Wool Beanie"];
        match pick_best("Classic Wool Beanie", &candidates) {
            TitleMatch::Rejected(reason) => assert!(reason.contains("ambiguous")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_pick_best_empty() {
        let candidates: [&str; 0] = [];
        assert!(matches!(
            pick_best("Blue Hoodie", &candidates),
            TitleMatch::Rejected(_)
        ));
    }
}

use crate::classify::Prediction;
use crate::models::LabelSet;
use std::cmp::Ordering;

/// 取分数最高的 k 个类别，按分数降序
///
/// 分数相同时索引大的在前。NaN 排在最后，不会作为首选结果返回。
pub fn top_k(scores: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut indexed: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();

    indexed.sort_by(|a, b| compare_scores(b.1, a.1).then_with(|| b.0.cmp(&a.0)));
    indexed.truncate(k);
    indexed
}

fn compare_scores(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// 排序并映射到标签
pub fn rank(scores: &[f32], labels: &LabelSet, k: usize) -> Vec<Prediction> {
    top_k(scores, k)
        .into_iter()
        .map(|(index, confidence)| Prediction {
            index,
            label: labels.label_for(index).into_owned(),
            confidence,
        })
        .collect()
}

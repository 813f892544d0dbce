use regex::bytes::Regex;

use crate::util::mapping::StrippedSequence;

/// 参考点在等位基因序列中的定位方式
#[derive(Debug, Clone)]
pub enum AnchorRule {
    /// 该基因类型没有此参考点
    Absent,
    /// （去填充后）序列起点
    Begin,
    /// （去填充后）序列终点
    End,
    /// 原始（含填充）序列中的偏移
    Offset(usize),
    /// `regex` 第一个捕获组的起点；未匹配时使用 `fallback`（含填充序列中的偏移）。
    /// 仅模式匹配的参考点没有回退值。
    Pattern { regex: Regex, fallback: Option<usize> },
}

#[derive(Debug, Clone)]
pub struct ReferencePointSpec {
    pub name: String,
    pub rule: AnchorRule,
}

pub fn resolve(rule: &AnchorRule, seq: &StrippedSequence) -> Option<usize> {
    match rule {
        AnchorRule::Absent => None,
        AnchorRule::Begin => Some(0),
        AnchorRule::End => Some(seq.len()),
        AnchorRule::Offset(offset) => seq.convert_position(*offset),
        AnchorRule::Pattern { regex, fallback } => {
            if let Some(caps) = regex.captures(seq.as_bytes()) {
                if let Some(m) = caps.get(1).or_else(|| caps.get(0)) {
                    return Some(m.start());
                }
            }
            fallback.and_then(|offset| seq.convert_position(offset))
        }
    }
}

pub fn resolve_all(specs: &[ReferencePointSpec], seq: &StrippedSequence) -> Vec<Option<usize>> {
    specs.iter().map(|s| resolve(&s.rule, seq)).collect()
}

/// 已定义的参考点位置必须单调不减
pub fn is_ordered(points: &[Option<usize>]) -> bool {
    let mut prev = 0usize;
    for p in points.iter().flatten() {
        if *p < prev {
            return false;
        }
        prev = *p;
    }
    true
}

pub fn format_points(points: &[Option<usize>]) -> String {
    let parts: Vec<String> = points
        .iter()
        .map(|p| p.map(|v| v.to_string()).unwrap_or_else(|| "-1".to_string()))
        .collect();
    format!("[{}]", parts.join(", "))
}

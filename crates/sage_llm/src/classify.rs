//! 题型判定
//!
//! 纯子串启发式: 区分大小写, 不做空白容错, 任意位置出现任一选项标记即判为选择题。

use sage_core::QuestionKind;

/// 选择题选项标记
pub const MULTIPLE_CHOICE_MARKERS: [&str; 4] = ["A)", "B)", "C)", "D)"];

pub fn classify(text: &str) -> QuestionKind {
    if MULTIPLE_CHOICE_MARKERS
        .iter()
        .any(|marker| text.contains(marker))
    {
        QuestionKind::MultipleChoice
    } else {
        QuestionKind::FreeForm
    }
}

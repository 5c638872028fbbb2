//! 流水线周期事件定义
//!
//! 后台任务通过通道把进度与结果发回前端, 每个事件都带着所属周期的 ID。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::answer::{Answer, QuestionKind};
use crate::region::CaptureRegion;

/// 周期 ID 类型别名
pub type CycleId = Uuid;

/// 周期事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleEvent {
    /// 所属周期
    pub cycle_id: CycleId,
    /// 事件类型
    pub kind: CycleEventKind,
    /// 事件时间戳
    pub timestamp: DateTime<Utc>,
}

impl CycleEvent {
    pub fn new(cycle_id: CycleId, kind: CycleEventKind) -> Self {
        Self {
            cycle_id,
            kind,
            timestamp: Utc::now(),
        }
    }

    /// 周期结束事件 (Finished / Failed)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            CycleEventKind::Finished { .. } | CycleEventKind::Failed { .. }
        )
    }
}

/// 事件类型枚举
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CycleEventKind {
    /// 已选定截图区域
    Started { region: CaptureRegion },
    /// OCR 完成
    TextExtracted { chars: usize },
    /// 题型判定完成
    Classified { kind: QuestionKind },
    /// 得到可展示的答案
    Finished { answer: Answer },
    /// 截图或 OCR 失败, 本次周期放弃
    Failed { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::AskOutcome;

    #[test]
    fn test_terminal_events() {
        let id = Uuid::new_v4();
        let started = CycleEvent::new(
            id,
            CycleEventKind::Started {
                region: CaptureRegion {
                    x: 0,
                    y: 0,
                    width: 10,
                    height: 10,
                },
            },
        );
        assert!(!started.is_terminal());

        let finished = CycleEvent::new(
            id,
            CycleEventKind::Finished {
                answer: Answer::Reply(AskOutcome::Empty),
            },
        );
        assert!(finished.is_terminal());
        assert_eq!(finished.cycle_id, started.cycle_id);

        let failed = CycleEvent::new(
            id,
            CycleEventKind::Failed {
                message: "tesseract missing".into(),
            },
        );
        assert!(failed.is_terminal());
    }
}

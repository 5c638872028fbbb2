//! # sage_core - ScreenSage Core Primitives
//!
//! 核心原语层，定义截图区域、题型、答案、流水线事件、配置与统一错误类型。
//! 此 crate 是整个项目的基础依赖，不依赖其他业务 crate。

pub mod answer;
pub mod config;
pub mod error;
pub mod event;
pub mod interaction;
pub mod region;

pub use answer::{Answer, AskOutcome, FailureKind, QuestionKind, ServiceFailure};
pub use config::SageConfig;
pub use error::{Result, ScreenSageError};
pub use event::{CycleEvent, CycleEventKind, CycleId};
pub use region::{CaptureRegion, ClampPolicy, DisplayBounds, Point};

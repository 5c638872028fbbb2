//! # sage_pipeline - ScreenSage Pipeline
//!
//! 单次截图问答周期的编排 (区域 -> 截图 -> OCR -> 题型 -> Prompt -> 问答),
//! 以及在后台任务上逐个运行周期的调度器。

pub mod dispatcher;
pub mod pipeline;

pub use dispatcher::PipelineDispatcher;
pub use pipeline::{CapturePipeline, CaptureRequest};

pub use sage_core::{Result, ScreenSageError};

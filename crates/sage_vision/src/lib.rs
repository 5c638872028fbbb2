//! # sage_vision - ScreenSage Vision
//!
//! 视觉层：光标附近截图区域选择、屏幕源抽象、OCR 文本提取。

pub mod capture;
pub mod ocr;
pub mod region;

pub use capture::{ScreenSource, StillImageSource};
pub use ocr::{StaticExtractor, TesseractExtractor, TextExtractor};
pub use region::{select_region, RegionSelector};

#[cfg(feature = "xcap")]
pub use capture::XcapSource;

pub use sage_core::{Result, ScreenSageError};

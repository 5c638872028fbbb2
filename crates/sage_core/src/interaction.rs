//! 面板拖拽/缩放的单次交互状态
//!
//! 每次按下鼠标创建一个会话, 松开即丢弃; 会话只依赖按下时的快照,
//! 不在窗口对象上保存可变偏移量。

use crate::region::Point;

/// 答案面板最小尺寸
pub const ANSWER_PANEL_MIN: Size = Size::new(240, 180);
/// 主面板缩放手柄的最小尺寸
pub const OVERLAY_PANEL_MIN: Size = Size::new(200, 150);
/// 答案面板相对光标的弹出偏移
pub const ANSWER_POPUP_OFFSET: Point = Point { x: 20, y: 20 };

/// 不透明度滑块范围 (百分比)
pub const OPACITY_MIN_PERCENT: u8 = 30;
pub const OPACITY_MAX_PERCENT: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// 拖拽会话: 记录按下时光标相对窗口左上角的偏移
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    grab_offset: Point,
}

impl DragSession {
    pub fn begin(pointer: Point, window_origin: Point) -> Self {
        Self {
            grab_offset: Point::new(pointer.x - window_origin.x, pointer.y - window_origin.y),
        }
    }

    /// 光标移动后窗口应处的左上角
    pub fn origin_for(&self, pointer: Point) -> Point {
        Point::new(pointer.x - self.grab_offset.x, pointer.y - self.grab_offset.y)
    }
}

/// 缩放会话: 按下时的光标与窗口尺寸快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeSession {
    start_pointer: Point,
    start_size: Size,
    min_size: Size,
}

impl ResizeSession {
    pub fn begin(pointer: Point, size: Size, min_size: Size) -> Self {
        Self {
            start_pointer: pointer,
            start_size: size,
            min_size,
        }
    }

    pub fn size_for(&self, pointer: Point) -> Size {
        let dx = pointer.x as i64 - self.start_pointer.x as i64;
        let dy = pointer.y as i64 - self.start_pointer.y as i64;
        let width = (self.start_size.width as i64 + dx).max(self.min_size.width as i64);
        let height = (self.start_size.height as i64 + dy).max(self.min_size.height as i64);
        Size::new(width as u32, height as u32)
    }
}

/// 滑块百分比 -> 窗口不透明度
pub fn opacity_from_percent(percent: u8) -> f32 {
    percent.clamp(OPACITY_MIN_PERCENT, OPACITY_MAX_PERCENT) as f32 / 100.0
}

/// 答案面板在光标右下方弹出
pub fn answer_popup_origin(cursor: Point) -> Point {
    Point::new(
        cursor.x + ANSWER_POPUP_OFFSET.x,
        cursor.y + ANSWER_POPUP_OFFSET.y,
    )
}

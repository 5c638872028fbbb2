//! 截图区域选择
//!
//! 以光标为中心取固定大小的矩形, 再按夹取策略约束到显示器范围。

use sage_core::config::CaptureSettings;
use sage_core::{CaptureRegion, ClampPolicy, DisplayBounds, Point};

/// 以光标为中心计算截图区域, 仅夹取左上角
///
/// 左上角先按浮点计算再向零截断 (奇数宽高时与 `int(x - w/2)` 一致),
/// 然后分别不小于 `bound_min_x` / `bound_min_y`。右/下边缘不做夹取。
pub fn select_region(
    cursor: Point,
    width: u32,
    height: u32,
    bound_min_x: i32,
    bound_min_y: i32,
) -> CaptureRegion {
    let x = (cursor.x as f64 - width as f64 / 2.0) as i32;
    let y = (cursor.y as f64 - height as f64 / 2.0) as i32;

    CaptureRegion {
        x: x.max(bound_min_x),
        y: y.max(bound_min_y),
        width,
        height,
    }
}

/// 区域选择器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionSelector {
    width: u32,
    height: u32,
    policy: ClampPolicy,
}

impl RegionSelector {
    pub fn new(width: u32, height: u32, policy: ClampPolicy) -> Self {
        Self {
            width,
            height,
            policy,
        }
    }

    pub fn from_settings(settings: &CaptureSettings) -> Self {
        Self::new(settings.width, settings.height, settings.clamp)
    }

    pub fn policy(&self) -> ClampPolicy {
        self.policy
    }

    /// 在指定显示器上为光标选择区域
    pub fn select(&self, cursor: Point, bounds: &DisplayBounds) -> CaptureRegion {
        let region = select_region(cursor, self.width, self.height, bounds.x, bounds.y);

        match self.policy {
            ClampPolicy::TopLeft => region,
            ClampPolicy::Contain => contain(region, bounds),
        }
    }
}

impl Default for RegionSelector {
    fn default() -> Self {
        Self::from_settings(&CaptureSettings::default())
    }
}

/// 把右/下边缘拉回显示器内; 区域比显示器大时钉在显示器原点
fn contain(region: CaptureRegion, bounds: &DisplayBounds) -> CaptureRegion {
    let max_x = (bounds.right() - region.width as i64).max(bounds.x as i64);
    let max_y = (bounds.bottom() - region.height as i64).max(bounds.y as i64);

    CaptureRegion {
        x: (region.x as i64).min(max_x) as i32,
        y: (region.y as i64).min(max_y) as i32,
        ..region
    }
}

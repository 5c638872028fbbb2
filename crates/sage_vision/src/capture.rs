//! 屏幕源
//!
//! 截图能力属于前端; 这里把它抽象成 `ScreenSource`, 流水线只负责给出区域。
//! 区域超出画面的部分以黑色填充, 输出图像尺寸始终等于区域尺寸。

use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, Rgba, RgbaImage};
use sage_core::{CaptureRegion, DisplayBounds, Point, ScreenSageError};

/// 屏幕源特征
///
/// 实现可以是阻塞的, 调用方负责放到阻塞线程池上执行。
pub trait ScreenSource: Send + Sync {
    /// 光标所在显示器的像素范围
    fn display_bounds(&self, cursor: Point) -> sage_core::Result<DisplayBounds>;

    /// 截取给定区域
    fn capture(&self, region: &CaptureRegion) -> sage_core::Result<DynamicImage>;
}

/// 静态图片屏幕源: 把一张截图当作显示器
pub struct StillImageSource {
    frame: Arc<RgbaImage>,
    origin: Point,
}

impl StillImageSource {
    pub fn new(frame: RgbaImage) -> Self {
        Self {
            frame: Arc::new(frame),
            origin: Point::new(0, 0),
        }
    }

    /// 指定画面左上角在虚拟桌面中的位置
    pub fn with_origin(mut self, origin: Point) -> Self {
        self.origin = origin;
        self
    }

    pub fn open(path: &Path) -> sage_core::Result<Self> {
        let image = image::open(path).map_err(|e| {
            ScreenSageError::Capture(format!("failed to load {}: {}", path.display(), e))
        })?;
        tracing::debug!(
            "loaded still screen {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(Self::new(image.to_rgba8()))
    }

    fn bounds(&self) -> DisplayBounds {
        DisplayBounds::new(
            self.origin.x,
            self.origin.y,
            self.frame.width(),
            self.frame.height(),
        )
    }
}

impl ScreenSource for StillImageSource {
    fn display_bounds(&self, cursor: Point) -> sage_core::Result<DisplayBounds> {
        let bounds = self.bounds();
        if !bounds.contains(cursor) {
            return Err(ScreenSageError::Capture(format!(
                "point ({}, {}) is outside the {}x{} screen image",
                cursor.x, cursor.y, bounds.width, bounds.height
            )));
        }
        Ok(bounds)
    }

    fn capture(&self, region: &CaptureRegion) -> sage_core::Result<DynamicImage> {
        crop_padded(&self.frame, &self.bounds(), region)
    }
}

/// 从整屏画面中截取区域, 越界部分填黑
pub fn crop_padded(
    frame: &RgbaImage,
    bounds: &DisplayBounds,
    region: &CaptureRegion,
) -> sage_core::Result<DynamicImage> {
    if region.width == 0 || region.height == 0 {
        return Err(ScreenSageError::Capture(format!(
            "empty capture region {}x{}",
            region.width, region.height
        )));
    }

    // 区域相对画面左上角的偏移
    let rel_x = region.x as i64 - bounds.x as i64;
    let rel_y = region.y as i64 - bounds.y as i64;

    let left = rel_x.max(0);
    let top = rel_y.max(0);
    let right = (rel_x + region.width as i64).min(frame.width() as i64);
    let bottom = (rel_y + region.height as i64).min(frame.height() as i64);

    if left >= right || top >= bottom {
        return Err(ScreenSageError::Capture(format!(
            "region {region:?} does not intersect the display {bounds:?}"
        )));
    }

    let visible = image::imageops::crop_imm(
        frame,
        left as u32,
        top as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    )
    .to_image();

    let mut canvas = RgbaImage::from_pixel(region.width, region.height, Rgba([0, 0, 0, 255]));
    image::imageops::overlay(&mut canvas, &visible, left - rel_x, top - rel_y);

    Ok(DynamicImage::ImageRgba8(canvas))
}

/// 把显示器逻辑坐标下的区域换算为整屏画面的像素坐标
///
/// 高分屏上画面的像素尺寸是显示器逻辑尺寸的整数或小数倍, 倍率按轴
/// 由 `frame_size / bounds` 得出; 返回的区域以画面左上角为原点。
pub fn to_frame_region(
    region: &CaptureRegion,
    bounds: &DisplayBounds,
    frame_width: u32,
    frame_height: u32,
) -> CaptureRegion {
    let scale = |frame: u32, logical: u32| {
        if logical == 0 {
            1.0
        } else {
            frame as f64 / logical as f64
        }
    };
    let sx = scale(frame_width, bounds.width);
    let sy = scale(frame_height, bounds.height);

    CaptureRegion {
        x: ((region.x as i64 - bounds.x as i64) as f64 * sx).round() as i32,
        y: ((region.y as i64 - bounds.y as i64) as f64 * sy).round() as i32,
        width: (region.width as f64 * sx).round().max(1.0) as u32,
        height: (region.height as f64 * sy).round().max(1.0) as u32,
    }
}

/// 实时屏幕源 (xcap)
#[cfg(feature = "xcap")]
#[derive(Debug, Default, Clone, Copy)]
pub struct XcapSource;

#[cfg(feature = "xcap")]
impl XcapSource {
    pub fn new() -> Self {
        Self
    }

    fn monitor_at(point: Point) -> sage_core::Result<xcap::Monitor> {
        xcap::Monitor::from_point(point.x, point.y)
            .map_err(|e| ScreenSageError::Capture(format!("no monitor at {point:?}: {e}")))
    }

    fn monitor_bounds(monitor: &xcap::Monitor) -> sage_core::Result<DisplayBounds> {
        let err = |e: xcap::XCapError| ScreenSageError::Capture(format!("monitor query failed: {e}"));
        Ok(DisplayBounds::new(
            monitor.x().map_err(err)?,
            monitor.y().map_err(err)?,
            monitor.width().map_err(err)?,
            monitor.height().map_err(err)?,
        ))
    }
}

#[cfg(feature = "xcap")]
impl ScreenSource for XcapSource {
    fn display_bounds(&self, cursor: Point) -> sage_core::Result<DisplayBounds> {
        Self::monitor_bounds(&Self::monitor_at(cursor)?)
    }

    fn capture(&self, region: &CaptureRegion) -> sage_core::Result<DynamicImage> {
        let monitor = Self::monitor_at(Point::new(region.x, region.y))?;
        let bounds = Self::monitor_bounds(&monitor)?;
        let frame = monitor.capture_image().map_err(|e| {
            ScreenSageError::Capture(format!(
                "failed to capture screen (check screen recording permission): {e}"
            ))
        })?;

        let physical = to_frame_region(region, &bounds, frame.width(), frame.height());
        if physical.width != region.width || physical.height != region.height {
            tracing::debug!(
                "scaling region {}x{} to {}x{} frame pixels",
                region.width,
                region.height,
                physical.width,
                physical.height
            );
        }
        crop_padded(
            &frame,
            &DisplayBounds::sized(frame.width(), frame.height()),
            &physical,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    fn checker(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([10, 20, 30, 255])
            }
        })
    }

    #[test]
    fn test_capture_inside_frame() {
        let source = StillImageSource::new(checker(100, 80));
        let region = CaptureRegion {
            x: 10,
            y: 10,
            width: 20,
            height: 10,
        };
        let image = source.capture(&region).unwrap();
        assert_eq!(image.dimensions(), (20, 10));
        assert_eq!(image.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(image.get_pixel(1, 0), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_capture_overflow_padded_black() {
        let source = StillImageSource::new(checker(100, 80));
        let region = CaptureRegion {
            x: 90,
            y: 70,
            width: 20,
            height: 20,
        };
        let image = source.capture(&region).unwrap();
        assert_eq!(image.dimensions(), (20, 20));
        assert_eq!(image.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(image.get_pixel(15, 15), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_capture_respects_origin() {
        let source = StillImageSource::new(checker(100, 80)).with_origin(Point::new(-100, 0));
        let bounds = source.display_bounds(Point::new(-50, 10)).unwrap();
        assert_eq!(bounds, DisplayBounds::new(-100, 0, 100, 80));

        let region = CaptureRegion {
            x: -99,
            y: 0,
            width: 4,
            height: 4,
        };
        let image = source.capture(&region).unwrap();
        assert_eq!(image.get_pixel(0, 0), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_frame_region_scales_with_hidpi_frame() {
        let region = CaptureRegion {
            x: 100,
            y: 50,
            width: 900,
            height: 400,
        };
        let scaled = to_frame_region(&region, &DisplayBounds::sized(1440, 900), 2880, 1800);
        assert_eq!(
            scaled,
            CaptureRegion {
                x: 200,
                y: 100,
                width: 1800,
                height: 800,
            }
        );

        // 左侧副屏: 先换算成相对显示器原点的偏移再缩放
        let left_screen = DisplayBounds::new(-1440, 0, 1440, 900);
        let region = CaptureRegion {
            x: -1340,
            y: 50,
            width: 900,
            height: 400,
        };
        assert_eq!(to_frame_region(&region, &left_screen, 2880, 1800), scaled);

        // 1:1 画面只平移
        let same = to_frame_region(&region, &left_screen, 1440, 900);
        assert_eq!((same.x, same.y, same.width, same.height), (100, 50, 900, 400));
    }

    #[test]
    fn test_hidpi_crop_covers_logical_region() {
        // 逻辑 50x40 的显示器, 2x 画面; 右半边涂白
        let mut frame = RgbaImage::from_pixel(100, 80, Rgba([0, 0, 0, 255]));
        for x in 50..100 {
            for y in 0..80 {
                frame.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        let bounds = DisplayBounds::sized(50, 40);
        let region = CaptureRegion {
            x: 20,
            y: 0,
            width: 10,
            height: 10,
        };

        let physical = to_frame_region(&region, &bounds, frame.width(), frame.height());
        let image = crop_padded(&frame, &DisplayBounds::sized(100, 80), &physical).unwrap();

        assert_eq!(image.dimensions(), (20, 20));
        assert_eq!(image.get_pixel(9, 0), Rgba([0, 0, 0, 255]));
        assert_eq!(image.get_pixel(10, 0), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_point_off_screen_image_is_rejected() {
        let source = StillImageSource::new(checker(100, 80)).with_origin(Point::new(-100, 0));
        assert!(source.display_bounds(Point::new(-100, 79)).is_ok());
        assert!(matches!(
            source.display_bounds(Point::new(0, 10)),
            Err(ScreenSageError::Capture(_))
        ));
        assert!(source.display_bounds(Point::new(-50, 80)).is_err());
    }

    #[test]
    fn test_capture_outside_frame_fails() {
        let source = StillImageSource::new(checker(100, 80));
        let region = CaptureRegion {
            x: 500,
            y: 500,
            width: 20,
            height: 20,
        };
        assert!(matches!(
            source.capture(&region),
            Err(ScreenSageError::Capture(_))
        ));
    }

    #[test]
    fn test_open_missing_file_is_capture_error() {
        let result = StillImageSource::open(Path::new("/definitely/not/here.png"));
        assert!(matches!(result, Err(ScreenSageError::Capture(_))));
    }
}

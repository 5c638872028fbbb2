//! ScreenSage CLI - 命令行交互接口
//!
//! 截图周期在后台任务上运行, 结果通过事件通道打印; 前台只负责读命令。

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sage_core::interaction::{
    answer_popup_origin, opacity_from_percent, DragSession, ResizeSession, Size,
    ANSWER_PANEL_MIN, OPACITY_MAX_PERCENT, OPACITY_MIN_PERCENT, OVERLAY_PANEL_MIN,
};
use sage_core::{CycleEvent, CycleEventKind, Point, SageConfig, ScreenSageError};
use sage_llm::{AnswerClient, GoogleAiStudioProvider};
use sage_pipeline::{CapturePipeline, CaptureRequest, PipelineDispatcher};
use sage_vision::{RegionSelector, ScreenSource, StillImageSource, TesseractExtractor};

/// 截取光标附近的屏幕, 识别文字并向 Gemini 提问
#[derive(Debug, Parser)]
#[command(name = "screensage", version, about)]
struct Args {
    /// 把一张截图当作屏幕 (不指定时使用实时屏幕, 需要 `xcap` feature)
    #[arg(long, value_name = "PNG")]
    image: Option<PathBuf>,

    /// JSON 配置文件 (也可用 SCREENSAGE_CONFIG 指定)
    #[arg(long, value_name = "JSON")]
    config: Option<PathBuf>,

    /// 初始用户上下文
    #[arg(long, default_value = "")]
    context: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "screensage=info,sage_pipeline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();
    let config = SageConfig::load(args.config.as_deref())?;

    let source = open_source(args.image.as_deref())?;
    let provider = GoogleAiStudioProvider::from_config(&config)?;
    let pipeline = CapturePipeline::new(
        source,
        Arc::new(TesseractExtractor::new(&config.ocr)),
        AnswerClient::new(Arc::new(provider)),
    )
    .with_selector(RegionSelector::from_settings(&config.capture));
    let dispatcher = PipelineDispatcher::new(pipeline);

    let events = dispatcher.events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv_async().await {
            print_event(&event);
        }
    });

    let mut context = args.context.trim().to_string();
    let mut layout = Layout::default();

    println!("ScreenSage CLI v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'help' for available commands, 'quit' to exit.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("sage> ");
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        let (command, rest) = input
            .split_once(char::is_whitespace)
            .map(|(c, r)| (c, r.trim()))
            .unwrap_or((input, ""));

        match command {
            "help" => {
                println!("Available commands:");
                println!("  help            - Show this help message");
                println!("  capture [x y]   - Capture around a point and ask Gemini");
                println!("  ask <text>      - Ask about the given text, skipping capture");
                println!("  region [x y]    - Show the capture region for a point");
                println!("  context [text]  - Set the context (no text clears it)");
                println!("  panel [...]     - Show or adjust panels:");
                println!("                    panel <overlay|answer> move|resize <dx> <dy>");
                println!("                    panel opacity <percent>");
                println!("  status          - Show current settings");
                println!("  clear           - Clear the screen");
                println!("  quit / exit     - Exit the CLI");
            }
            "capture" => {
                let cursor = match cursor_or_center(rest, dispatcher.pipeline()) {
                    Ok(cursor) => cursor,
                    Err(message) => {
                        println!("{}", message);
                        continue;
                    }
                };
                match dispatcher.trigger(CaptureRequest::new(cursor, context.clone())) {
                    Ok(cycle_id) => {
                        layout.answer.origin = answer_popup_origin(cursor);
                        println!("Capturing around ({}, {}) [{}]", cursor.x, cursor.y, cycle_id)
                    }
                    Err(ScreenSageError::Busy) => {
                        println!("A capture is already in progress; try again when it finishes.")
                    }
                    Err(e) => println!("Capture failed: {}", e),
                }
            }
            "ask" => {
                if rest.is_empty() {
                    println!("Usage: ask <text>");
                    continue;
                }
                match dispatcher.trigger_text(rest, context.clone()) {
                    Ok(cycle_id) => println!("Asking [{}]", cycle_id),
                    Err(ScreenSageError::Busy) => {
                        println!("A capture is already in progress; try again when it finishes.")
                    }
                    Err(e) => println!("Ask failed: {}", e),
                }
            }
            "region" => {
                let cursor = match cursor_or_center(rest, dispatcher.pipeline()) {
                    Ok(cursor) => cursor,
                    Err(message) => {
                        println!("{}", message);
                        continue;
                    }
                };
                match dispatcher.pipeline().region_at(cursor) {
                    Ok(region) => {
                        let popup = answer_popup_origin(cursor);
                        layout.answer.origin = popup;
                        println!("Cursor:  ({}, {})", cursor.x, cursor.y);
                        println!(
                            "Region:  {}x{} at ({}, {})",
                            region.width, region.height, region.x, region.y
                        );
                        println!("Answer panel at ({}, {})", popup.x, popup.y);
                    }
                    Err(e) => println!("Cannot select region: {}", e),
                }
            }
            "context" => {
                context = rest.to_string();
                if context.is_empty() {
                    println!("Context cleared.");
                } else {
                    println!("Context set: {}", context);
                }
            }
            "panel" => match layout.apply(rest) {
                Ok(()) => layout.print(),
                Err(message) => println!("{}", message),
            },
            "status" => {
                let selector = dispatcher.pipeline().selector();
                println!("Status:");
                println!("  Model:    {}", dispatcher.pipeline().client().model());
                println!(
                    "  Capture:  {}x{} ({:?})",
                    config.capture.width,
                    config.capture.height,
                    selector.policy()
                );
                println!("  OCR:      {} -l {}", config.ocr.command, config.ocr.language);
                println!(
                    "  Context:  {}",
                    if context.is_empty() { "(none)" } else { context.as_str() }
                );
                println!(
                    "  Cycle:    {}",
                    if dispatcher.is_busy() { "running" } else { "idle" }
                );
                layout.print();
            }
            "clear" => {
                print!("\x1B[2J\x1B[1;1H");
            }
            "quit" | "exit" => {
                println!("Goodbye!");
                break;
            }
            _ => {
                println!("Unknown command: {}", command);
                println!("Type 'help' for available commands.");
            }
        }
    }

    Ok(())
}

fn open_source(image: Option<&Path>) -> anyhow::Result<Arc<dyn ScreenSource>> {
    match image {
        Some(path) => Ok(Arc::new(StillImageSource::open(path)?)),
        None => live_source(),
    }
}

#[cfg(feature = "xcap")]
fn live_source() -> anyhow::Result<Arc<dyn ScreenSource>> {
    Ok(Arc::new(sage_vision::XcapSource::new()))
}

#[cfg(not(feature = "xcap"))]
fn live_source() -> anyhow::Result<Arc<dyn ScreenSource>> {
    anyhow::bail!("no screen source: pass --image <PNG> or build with the `xcap` feature")
}

/// 解析 `x y`; 缺省时取显示器中心
fn cursor_or_center(rest: &str, pipeline: &CapturePipeline) -> Result<Point, String> {
    let coords: Vec<&str> = rest.split_whitespace().collect();
    match coords.as_slice() {
        [] => pipeline
            .display_center(Point::new(0, 0))
            .map_err(|e| format!("Cannot locate display: {}", e)),
        [x, y] => match (x.parse::<i32>(), y.parse::<i32>()) {
            (Ok(x), Ok(y)) => Ok(Point::new(x, y)),
            _ => Err(format!("Invalid point: {} {}", x, y)),
        },
        _ => Err("Expected two integer coordinates: x y".to_string()),
    }
}

/// 面板几何状态, 拖拽与缩放各按一次按下-移动-松开会话计算
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Panel {
    origin: Point,
    size: Size,
    min_size: Size,
}

impl Panel {
    /// 从标题栏内一点拖动 (dx, dy)
    fn drag(&mut self, dx: i32, dy: i32) {
        let grab = Point::new(self.origin.x + 8, self.origin.y + 8);
        let session = DragSession::begin(grab, self.origin);
        self.origin = session.origin_for(Point::new(grab.x + dx, grab.y + dy));
    }

    /// 从右下角缩放手柄拖动 (dx, dy)
    fn resize(&mut self, dx: i32, dy: i32) {
        let grip = Point::new(
            self.origin.x + self.size.width as i32,
            self.origin.y + self.size.height as i32,
        );
        let session = ResizeSession::begin(grip, self.size, self.min_size);
        self.size = session.size_for(Point::new(grip.x + dx, grip.y + dy));
    }

    fn describe(&self) -> String {
        format!(
            "{}x{} at ({}, {}), min {}x{}",
            self.size.width,
            self.size.height,
            self.origin.x,
            self.origin.y,
            self.min_size.width,
            self.min_size.height
        )
    }
}

/// 主面板与答案面板的布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    overlay: Panel,
    answer: Panel,
    opacity_percent: u8,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            overlay: Panel {
                origin: Point::new(100, 100),
                size: Size::new(320, 240),
                min_size: OVERLAY_PANEL_MIN,
            },
            answer: Panel {
                origin: Point::new(0, 0),
                size: Size::new(360, 220),
                min_size: ANSWER_PANEL_MIN,
            },
            opacity_percent: 85,
        }
    }
}

impl Layout {
    /// 解析 `panel` 命令参数; 无参数时不做修改
    fn apply(&mut self, rest: &str) -> Result<(), String> {
        let args: Vec<&str> = rest.split_whitespace().collect();
        match args.as_slice() {
            [] => Ok(()),
            ["opacity", percent] => {
                let percent = percent
                    .parse::<u8>()
                    .map_err(|_| format!("Invalid percent: {}", percent))?;
                self.opacity_percent = percent.clamp(OPACITY_MIN_PERCENT, OPACITY_MAX_PERCENT);
                Ok(())
            }
            [name, action, dx, dy] if *action == "move" || *action == "resize" => {
                let panel = match *name {
                    "overlay" => &mut self.overlay,
                    "answer" => &mut self.answer,
                    _ => return Err(format!("Unknown panel: {}", name)),
                };
                let (dx, dy) = match (dx.parse::<i32>(), dy.parse::<i32>()) {
                    (Ok(dx), Ok(dy)) => (dx, dy),
                    _ => return Err(format!("Invalid offset: {} {}", dx, dy)),
                };
                if *action == "move" {
                    panel.drag(dx, dy);
                } else {
                    panel.resize(dx, dy);
                }
                Ok(())
            }
            _ => Err(
                "Usage: panel <overlay|answer> move|resize <dx> <dy> | panel opacity <percent>"
                    .to_string(),
            ),
        }
    }

    fn print(&self) {
        println!("  Overlay:  {}", self.overlay.describe());
        println!(
            "  Opacity:  {}% ({:.2})",
            self.opacity_percent,
            opacity_from_percent(self.opacity_percent)
        );
        println!("  Answer:   {}", self.answer.describe());
    }
}

fn print_event(event: &CycleEvent) {
    match &event.kind {
        CycleEventKind::Started { region } => println!(
            "  region {}x{} at ({}, {})",
            region.width, region.height, region.x, region.y
        ),
        CycleEventKind::TextExtracted { chars } => println!("  recognized {} chars", chars),
        CycleEventKind::Classified { kind } => println!("  question type: {}", kind),
        CycleEventKind::Finished { answer } => print_answer(&answer.render()),
        CycleEventKind::Failed { message } => println!("⚠️ Capture failed: {}", message),
    }
}

fn print_answer(text: &str) {
    println!("----------------------------------------");
    println!("{}", text);
    println!("----------------------------------------");
}

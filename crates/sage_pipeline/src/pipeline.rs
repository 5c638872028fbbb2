//! 截图问答流水线
//!
//! 截图与 OCR 的失败向上传播; 远端问答的失败已在 `AnswerClient` 边界
//! 折叠成 `AskOutcome`, 这里不再处理。

use std::sync::Arc;

use sage_core::{Answer, CaptureRegion, CycleEventKind, Point, ScreenSageError};
use sage_llm::{build_prompt, classify, AnswerClient};
use sage_vision::{RegionSelector, ScreenSource, TextExtractor};

/// 一次截图请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    /// 触发时的光标位置
    pub cursor: Point,
    /// 用户上下文 (可为空)
    pub context: String,
}

impl CaptureRequest {
    pub fn new(cursor: Point, context: impl Into<String>) -> Self {
        Self {
            cursor,
            context: context.into(),
        }
    }
}

/// 截图问答流水线
#[derive(Clone)]
pub struct CapturePipeline {
    source: Arc<dyn ScreenSource>,
    extractor: Arc<dyn TextExtractor>,
    client: AnswerClient,
    selector: RegionSelector,
}

impl CapturePipeline {
    pub fn new(
        source: Arc<dyn ScreenSource>,
        extractor: Arc<dyn TextExtractor>,
        client: AnswerClient,
    ) -> Self {
        Self {
            source,
            extractor,
            client,
            selector: RegionSelector::default(),
        }
    }

    pub fn with_selector(mut self, selector: RegionSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn selector(&self) -> &RegionSelector {
        &self.selector
    }

    pub fn client(&self) -> &AnswerClient {
        &self.client
    }

    /// 光标所在显示器的中心 (没有真实光标时的默认触发点)
    pub fn display_center(&self, hint: Point) -> sage_core::Result<Point> {
        Ok(self.source.display_bounds(hint)?.center())
    }

    /// 计算光标处的截图区域, 不截图
    pub fn region_at(&self, cursor: Point) -> sage_core::Result<CaptureRegion> {
        let bounds = self.source.display_bounds(cursor)?;
        Ok(self.selector.select(cursor, &bounds))
    }

    /// 运行一次完整周期
    pub async fn run(&self, request: &CaptureRequest) -> sage_core::Result<Answer> {
        self.run_observed(request, &|_: CycleEventKind| {}).await
    }

    /// 运行一次完整周期, 每完成一步回调一次
    pub async fn run_observed(
        &self,
        request: &CaptureRequest,
        observe: &(dyn Fn(CycleEventKind) + Send + Sync),
    ) -> sage_core::Result<Answer> {
        let region = self.region_at(request.cursor)?;
        observe(CycleEventKind::Started { region });
        tracing::debug!("capturing {:?} around {:?}", region, request.cursor);

        // 屏幕源可能阻塞, 放到阻塞线程池
        let source = Arc::clone(&self.source);
        let image = tokio::task::spawn_blocking(move || source.capture(&region))
            .await
            .map_err(|e| ScreenSageError::Capture(format!("capture task aborted: {}", e)))??;

        let text = self.extractor.extract_text(&image).await?;
        let text = text.trim();
        observe(CycleEventKind::TextExtracted {
            chars: text.chars().count(),
        });

        if text.is_empty() {
            tracing::info!("no text detected in {}x{} region", region.width, region.height);
            return Ok(Answer::NoTextDetected);
        }

        Ok(self.answer_trimmed(text, &request.context, observe).await)
    }

    /// 跳过截图与 OCR, 直接对给定文本问答; 判定题型后回调 `Classified`
    pub async fn answer_text(
        &self,
        text: &str,
        context: &str,
        observe: &(dyn Fn(CycleEventKind) + Send + Sync),
    ) -> Answer {
        let text = text.trim();
        if text.is_empty() {
            return Answer::NoTextDetected;
        }
        self.answer_trimmed(text, context, observe).await
    }

    async fn answer_trimmed(
        &self,
        text: &str,
        context: &str,
        observe: &(dyn Fn(CycleEventKind) + Send + Sync),
    ) -> Answer {
        let kind = classify(text);
        observe(CycleEventKind::Classified { kind });

        let prompt = build_prompt(text, kind, context);
        tracing::info!(
            "asking {} ({}, {} chars of prompt)",
            self.client.model(),
            kind,
            prompt.len()
        );

        Answer::Reply(self.client.ask(&prompt).await)
    }
}

//! 后台调度器
//!
//! 每次触发在独立的 tokio 任务上运行一个周期, 同一时刻至多一个周期。
//! 周期进行中再次触发直接返回 `Busy`, 不排队。周期 panic 时同样发出 `Failed`。

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sage_core::{Answer, CycleEvent, CycleEventKind, CycleId, ScreenSageError};
use uuid::Uuid;

use crate::pipeline::{CapturePipeline, CaptureRequest};

/// 忙碌标志守卫, 任务结束 (包括 panic) 时清除标志
struct BusyGuard {
    busy: Arc<AtomicBool>,
}

impl BusyGuard {
    fn acquire(busy: &Arc<AtomicBool>) -> Option<Self> {
        busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                busy: Arc::clone(busy),
            })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// 流水线调度器
pub struct PipelineDispatcher {
    pipeline: Arc<CapturePipeline>,
    busy: Arc<AtomicBool>,
    events_tx: flume::Sender<CycleEvent>,
    events_rx: flume::Receiver<CycleEvent>,
}

impl PipelineDispatcher {
    pub fn new(pipeline: CapturePipeline) -> Self {
        let (events_tx, events_rx) = flume::unbounded();
        Self {
            pipeline: Arc::new(pipeline),
            busy: Arc::new(AtomicBool::new(false)),
            events_tx,
            events_rx,
        }
    }

    pub fn pipeline(&self) -> &CapturePipeline {
        &self.pipeline
    }

    /// 事件接收端 (可多次获取, 多个接收端之间竞争消费)
    pub fn events(&self) -> flume::Receiver<CycleEvent> {
        self.events_rx.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// 触发一次周期; 必须在 tokio 运行时内调用
    pub fn trigger(&self, request: CaptureRequest) -> sage_core::Result<CycleId> {
        let guard = self.acquire()?;
        let cycle_id = Uuid::new_v4();
        let pipeline = Arc::clone(&self.pipeline);
        let observe = self.observer(cycle_id);

        self.dispatch(guard, cycle_id, async move {
            pipeline.run_observed(&request, &observe).await
        });
        Ok(cycle_id)
    }

    /// 跳过截图, 对给定文本运行一次周期; 与 `trigger` 共用忙碌标志
    pub fn trigger_text(
        &self,
        text: impl Into<String>,
        context: impl Into<String>,
    ) -> sage_core::Result<CycleId> {
        let guard = self.acquire()?;
        let cycle_id = Uuid::new_v4();
        let pipeline = Arc::clone(&self.pipeline);
        let observe = self.observer(cycle_id);
        let (text, context) = (text.into(), context.into());

        self.dispatch(guard, cycle_id, async move {
            Ok::<_, ScreenSageError>(
                pipeline
                    .answer_text(&text, &context, &observe)
                    .await,
            )
        });
        Ok(cycle_id)
    }

    fn acquire(&self) -> sage_core::Result<BusyGuard> {
        BusyGuard::acquire(&self.busy).ok_or_else(|| {
            tracing::debug!("trigger ignored, cycle in flight");
            ScreenSageError::Busy
        })
    }

    /// 把进度转成带周期 ID 的事件
    fn observer(&self, cycle_id: CycleId) -> impl Fn(CycleEventKind) + Send + Sync + 'static {
        let events = self.events_tx.clone();
        move |kind: CycleEventKind| {
            let _ = events.send(CycleEvent::new(cycle_id, kind));
        }
    }

    fn dispatch<F>(&self, guard: BusyGuard, cycle_id: CycleId, work: F)
    where
        F: Future<Output = sage_core::Result<Answer>> + Send + 'static,
    {
        let events = self.events_tx.clone();

        tokio::spawn(async move {
            // 周期放在内层任务里, panic 时由 JoinHandle 带回
            let joined = tokio::spawn(work).await;

            // 先释放标志再发终止事件, 收到终止事件的一方可以立即再次触发
            drop(guard);

            let kind = match joined {
                Ok(Ok(answer)) => {
                    tracing::info!("cycle {} finished", cycle_id);
                    CycleEventKind::Finished { answer }
                }
                Ok(Err(e)) => {
                    tracing::error!("cycle {} failed: {}", cycle_id, e);
                    CycleEventKind::Failed {
                        message: e.to_string(),
                    }
                }
                Err(e) => {
                    tracing::error!("cycle {} aborted: {}", cycle_id, e);
                    let message = if e.is_panic() {
                        "cycle panicked".to_string()
                    } else {
                        format!("cycle aborted: {}", e)
                    };
                    CycleEventKind::Failed { message }
                }
            };
            let _ = events.send(CycleEvent::new(cycle_id, kind));
        });

        tracing::debug!("cycle {} dispatched", cycle_id);
    }
}

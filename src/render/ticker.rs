use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use super::{
    animator::Size,
    state::{Frame, RenderState},
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// The drawing surface the render tick paints onto.
pub trait FrameSink: Send + Sync {
    fn container_size(&self) -> Size;
    fn measure_text(&self, text: &str) -> Size;
    fn present(&self, frame: Frame);
}

/// Drives [`RenderState`] at its frame period and hands frames to a sink.
///
/// The period is re-read after every frame so toggling bounce mode switches
/// between the fast and slow rates without a restart.
#[derive(Clone)]
pub struct RenderTicker {
    state: Arc<Mutex<RenderState>>,
    sink: Arc<dyn FrameSink>,
    ticker: Arc<Mutex<Option<(JoinHandle<()>, CancellationToken)>>>,
}

impl RenderTicker {
    pub fn new(state: Arc<Mutex<RenderState>>, sink: Arc<dyn FrameSink>) -> Self {
        Self {
            state,
            sink,
            ticker: Arc::new(Mutex::new(None)),
        }
    }

    pub fn state(&self) -> Arc<Mutex<RenderState>> {
        self.state.clone()
    }

    pub async fn start(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some((handle, token)) = ticker_guard.take() {
            token.cancel();
            handle.abort();
        }

        let token = CancellationToken::new();
        let handle = tokio::spawn(render_loop(
            self.state.clone(),
            self.sink.clone(),
            token.clone(),
        ));
        *ticker_guard = Some((handle, token));
    }

    pub async fn stop(&self) -> Result<()> {
        let running = self.ticker.lock().await.take();
        if let Some((handle, token)) = running {
            token.cancel();
            handle.await.context("render ticker task failed to join")?;
        }
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.ticker
            .lock()
            .await
            .as_ref()
            .is_some_and(|(handle, _)| !handle.is_finished())
    }
}

async fn render_loop(
    state: Arc<Mutex<RenderState>>,
    sink: Arc<dyn FrameSink>,
    cancel_token: CancellationToken,
) {
    let mut period = state.lock().await.frame_period();
    let mut interval = new_interval(Instant::now(), period);
    log_info!("render ticker started at {:?} per frame", period);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let (frame, next_period) = {
                    let mut guard = state.lock().await;
                    let measure = |text: &str| sink.measure_text(text);
                    let frame = guard.tick(&measure, sink.container_size());
                    (frame, guard.frame_period())
                };
                sink.present(frame);

                if next_period != period {
                    log_debug!("render period changed {:?} -> {:?}", period, next_period);
                    period = next_period;
                    interval = new_interval(Instant::now() + period, period);
                }
            }
            _ = cancel_token.cancelled() => break,
        }
    }

    log_info!("render ticker shutting down");
}

fn new_interval(start: Instant, period: Duration) -> time::Interval {
    let mut interval = time::interval_at(start, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::ManualClock, clock::TimeSource, render::ColorPolicy};
    use chrono::NaiveDate;
    use std::sync::Mutex as StdMutex;

    struct RecordingSink {
        frames: StdMutex<Vec<Frame>>,
    }

    impl FrameSink for RecordingSink {
        fn container_size(&self) -> Size {
            Size::new(400, 300)
        }

        fn measure_text(&self, text: &str) -> Size {
            Size::new(text.len() as i32 * 8, 16)
        }

        fn present(&self, frame: Frame) {
            self.frames.lock().unwrap().push(frame);
        }
    }

    fn render_state(logo_mode: bool) -> Arc<Mutex<RenderState>> {
        let local = NaiveDate::from_ymd_opt(2025, 4, 5)
            .unwrap()
            .and_hms_opt(23, 59, 58)
            .unwrap();
        let source = TimeSource::new(Arc::new(ManualClock::new(local)));
        Arc::new(Mutex::new(RenderState::new(
            source,
            1,
            logo_mode,
            ColorPolicy::default(),
        )))
    }

    #[tokio::test]
    async fn presents_frames_until_stopped() {
        let sink = Arc::new(RecordingSink {
            frames: StdMutex::new(Vec::new()),
        });
        let ticker = RenderTicker::new(render_state(true), sink.clone());

        ticker.start().await;
        time::sleep(Duration::from_millis(120)).await;
        assert!(ticker.is_running().await);
        ticker.stop().await.unwrap();
        assert!(!ticker.is_running().await);

        let frames = sink.frames.lock().unwrap().clone();
        assert!(frames.len() >= 2, "only {} frames", frames.len());
        assert!(frames.iter().all(|frame| frame.text == "23:59:58"));
        // Bounce mode moves the text between frames.
        assert_ne!((frames[0].x, frames[0].y), (frames[1].x, frames[1].y));

        let presented = frames.len();
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sink.frames.lock().unwrap().len(), presented);
    }

    #[tokio::test]
    async fn centered_frames_stay_put() {
        let sink = Arc::new(RecordingSink {
            frames: StdMutex::new(Vec::new()),
        });
        let ticker = RenderTicker::new(render_state(false), sink.clone());

        ticker.start().await;
        time::sleep(Duration::from_millis(150)).await;
        ticker.stop().await.unwrap();

        let frames = sink.frames.lock().unwrap().clone();
        assert!(!frames.is_empty());
        assert!(frames
            .iter()
            .all(|frame| (frame.x, frame.y) == ((400 - 64) / 2, (300 - 16) / 2)));
    }
}

//! The event dispatcher: one tokio task that owns the view state.
//!
//! Every input (command, fetch completion, history completion, fetch timer,
//! countdown tick, stream event) is turned into a `Wake` inside one
//! `select!`, then handled outside it. Scheduler transitions stay pure; this
//! task only carries out their actions. The view is published through a
//! `watch` channel after every wake that changed it.

use super::clock::Clock;
use super::config::SyncConfig;
use super::scheduler::{CountdownDisplay, SchedulerAction, SchedulerEvent, SyncScheduler};
use super::source::DiscountSource;
use crate::domain::discount::DiscountSnapshot;
use crate::domain::history::HistoryPoint;
use crate::error::{FetchError, SdkError};
use crate::shared::Timescale;
use crate::view::{HistoryStatus, StreamStatus, ViewState};
use crate::ws::{EventStream, WsEvent};

use futures_util::future::BoxFuture;
use futures_util::StreamExt;
use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior, Sleep};

const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

type FetchFuture = BoxFuture<'static, Result<DiscountSnapshot, FetchError>>;
type HistoryFuture = BoxFuture<'static, Result<Vec<HistoryPoint>, FetchError>>;

// ─── Commands from the handle to the task ────────────────────────────────────

#[derive(Debug)]
enum Command {
    Refresh,
    SetTimescale(Timescale),
    Dispose,
}

enum Wake {
    Command(Option<Command>),
    Fetched(Result<DiscountSnapshot, FetchError>),
    HistoryLoaded(Timescale, Result<Vec<HistoryPoint>, FetchError>),
    TimerFired,
    CountdownTick,
    Stream(Option<WsEvent>),
}

// ─── Public handle ───────────────────────────────────────────────────────────

/// Handle to a running sync task.
///
/// Dropping the handle aborts the task; [`SyncHandle::dispose`] shuts it
/// down cleanly and waits for it.
pub struct SyncHandle {
    view_rx: watch::Receiver<ViewState>,
    cmd_tx: mpsc::UnboundedSender<Command>,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    /// A copy of the current view.
    pub fn view(&self) -> ViewState {
        self.view_rx.borrow().clone()
    }

    /// Receiver notified on every view change.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.view_rx.clone()
    }

    /// Fetch now, unless a fetch is already in flight.
    pub fn refresh(&self) -> Result<(), SdkError> {
        self.send(Command::Refresh)
    }

    /// Reload history at `scale`, replacing the chart series.
    pub fn set_timescale(&self, scale: Timescale) -> Result<(), SdkError> {
        self.send(Command::SetTimescale(scale))
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancel all timers, the in-flight fetch and the stream, then wait for
    /// the task to exit.
    pub async fn dispose(mut self) -> Result<(), SdkError> {
        let _ = self.cmd_tx.send(Command::Dispose);
        if let Some(task) = self.task.take() {
            task.await.map_err(|e| SdkError::Other(e.to_string()))?;
        }
        Ok(())
    }

    fn send(&self, cmd: Command) -> Result<(), SdkError> {
        self.cmd_tx.send(cmd).map_err(|_| SdkError::TaskStopped)
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Spawn the sync task on the current tokio runtime.
///
/// `stream` is an optional second point source; without it the view's
/// stream status stays `Disabled`.
pub fn spawn_sync<S>(
    source: Arc<S>,
    config: SyncConfig,
    stream: Option<EventStream>,
    clock: Arc<dyn Clock>,
) -> SyncHandle
where
    S: DiscountSource + 'static,
{
    let mut view = ViewState::new(config.series_mode, config.series_capacity);
    if stream.is_some() {
        view.set_stream_status(StreamStatus::Connecting);
    }
    let (view_tx, view_rx) = watch::channel(view.clone());
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let load_history = config.load_history;

    let runtime = Runtime {
        source,
        scheduler: SyncScheduler::new(config.clone()),
        config,
        clock,
        view,
        view_tx,
        cmd_rx,
        fetch: None,
        history: None,
        timer: None,
        ticker: None,
        stream,
        history_after_first_fetch: load_history,
    };

    SyncHandle {
        view_rx,
        cmd_tx,
        task: Some(tokio::spawn(runtime.run())),
    }
}

// ─── Task state ──────────────────────────────────────────────────────────────

struct Runtime<S> {
    source: Arc<S>,
    config: SyncConfig,
    scheduler: SyncScheduler,
    clock: Arc<dyn Clock>,
    view: ViewState,
    view_tx: watch::Sender<ViewState>,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    fetch: Option<FetchFuture>,
    history: Option<(Timescale, HistoryFuture)>,
    timer: Option<Pin<Box<Sleep>>>,
    ticker: Option<Interval>,
    stream: Option<EventStream>,
    /// The startup history load waits for the first fetch to settle, so
    /// backfill is projected with the server's settings.
    history_after_first_fetch: bool,
}

impl<S: DiscountSource + 'static> Runtime<S> {
    async fn run(mut self) {
        tracing::info!(
            policy = ?self.config.policy,
            scale = %self.config.timescale,
            "Sync started"
        );

        self.dispatch(SchedulerEvent::Start);
        self.publish();

        loop {
            let wake = tokio::select! {
                cmd = self.cmd_rx.recv() => Wake::Command(cmd),
                res = poll_fetch(&mut self.fetch) => Wake::Fetched(res),
                (scale, res) = poll_history(&mut self.history) => Wake::HistoryLoaded(scale, res),
                _ = poll_timer(&mut self.timer) => Wake::TimerFired,
                _ = poll_ticker(&mut self.ticker) => Wake::CountdownTick,
                event = poll_stream(&mut self.stream) => Wake::Stream(event),
            };

            match wake {
                Wake::Command(None) | Wake::Command(Some(Command::Dispose)) => break,
                Wake::Command(Some(Command::Refresh)) => {
                    tracing::debug!("Manual refresh");
                    self.dispatch(SchedulerEvent::TimerFired);
                }
                Wake::Command(Some(Command::SetTimescale(scale))) => {
                    tracing::info!(scale = %scale, "Switching timescale");
                    self.begin_history(scale);
                }
                Wake::Fetched(res) => {
                    self.fetch = None;
                    let event = match res {
                        Ok(snapshot) => SchedulerEvent::FetchSucceeded(snapshot),
                        Err(e) => SchedulerEvent::FetchFailed(e),
                    };
                    self.dispatch(event);
                    if std::mem::take(&mut self.history_after_first_fetch) && self.history.is_none() {
                        self.begin_history(self.config.timescale);
                    }
                }
                Wake::HistoryLoaded(scale, res) => {
                    self.history = None;
                    self.on_history(scale, res);
                }
                Wake::TimerFired => {
                    self.timer = None;
                    self.dispatch(SchedulerEvent::TimerFired);
                }
                Wake::CountdownTick => self.dispatch(SchedulerEvent::CountdownTick),
                Wake::Stream(event) => self.on_stream(event),
            }

            self.publish();
        }

        self.shutdown();
    }

    fn dispatch(&mut self, event: SchedulerEvent) {
        let actions = self.scheduler.handle(event, self.clock.now());
        for action in actions {
            self.perform(action);
        }
    }

    fn perform(&mut self, action: SchedulerAction) {
        match action {
            SchedulerAction::Fetch => {
                let source = Arc::clone(&self.source);
                self.fetch = Some(Box::pin(async move { source.fetch_snapshot().await }));
            }
            SchedulerAction::ArmTimer(delay) => {
                self.timer = Some(Box::pin(tokio::time::sleep(delay)));
            }
            SchedulerAction::Countdown(display) => self.on_countdown(display),
            SchedulerAction::Apply(snapshot) => self.view.apply_snapshot(snapshot),
            SchedulerAction::Report(status) => self.view.set_status(status),
        }
    }

    fn on_countdown(&mut self, display: CountdownDisplay) {
        match display {
            CountdownDisplay::Started(secs) => {
                let mut ticker =
                    tokio::time::interval_at(Instant::now() + COUNTDOWN_TICK, COUNTDOWN_TICK);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.ticker = Some(ticker);
                self.view.set_countdown(Some(secs));
            }
            CountdownDisplay::Remaining(secs) => self.view.set_countdown(Some(secs)),
            CountdownDisplay::Hidden => {
                self.ticker = None;
                self.view.set_countdown(None);
            }
        }
    }

    /// Start a history load, dropping any load still in flight.
    fn begin_history(&mut self, scale: Timescale) {
        let source = Arc::clone(&self.source);
        self.history = Some((scale, Box::pin(async move { source.load_history(scale).await })));
        self.view.set_history_status(HistoryStatus::Loading(scale));
    }

    fn on_history(&mut self, scale: Timescale, res: Result<Vec<HistoryPoint>, FetchError>) {
        match res {
            Ok(points) => {
                tracing::info!(scale = %scale, points = points.len(), "History loaded");
                self.view.replace_history(scale, &points);
            }
            Err(e) => {
                tracing::warn!(scale = %scale, "History load failed: {}", e);
                self.view.set_history_status(HistoryStatus::Failed {
                    scale,
                    reason: e.to_string(),
                });
            }
        }
    }

    fn on_stream(&mut self, event: Option<WsEvent>) {
        match event {
            Some(WsEvent::Connected) => self.view.set_stream_status(StreamStatus::Connected),
            Some(WsEvent::Point(point)) => self.view.append_point(point),
            Some(WsEvent::Disconnected { reconnect_in, .. }) => {
                let status = match reconnect_in {
                    Some(retry_in) => StreamStatus::Reconnecting { retry_in },
                    None => StreamStatus::Disabled,
                };
                self.view.set_stream_status(status);
            }
            Some(WsEvent::Error(reason)) => {
                tracing::debug!("Stream error: {}", reason);
            }
            None => {
                tracing::info!("Stream ended");
                self.stream = None;
                self.view.set_stream_status(StreamStatus::Disabled);
            }
        }
    }

    fn publish(&self) {
        self.view_tx.send_if_modified(|published| {
            if *published == self.view {
                return false;
            }
            *published = self.view.clone();
            true
        });
    }

    fn shutdown(mut self) {
        self.fetch = None;
        self.history = None;
        self.timer = None;
        self.ticker = None;
        self.stream = None;
        self.view.set_countdown(None);
        if self.view.stream_status() != &StreamStatus::Disabled {
            self.view.set_stream_status(StreamStatus::Disabled);
        }
        self.publish();
        tracing::info!("Sync disposed");
    }
}

// ─── Optional-future helpers ─────────────────────────────────────────────────

async fn poll_fetch(fetch: &mut Option<FetchFuture>) -> Result<DiscountSnapshot, FetchError> {
    match fetch {
        Some(fut) => fut.as_mut().await,
        None => pending().await,
    }
}

async fn poll_history(
    history: &mut Option<(Timescale, HistoryFuture)>,
) -> (Timescale, Result<Vec<HistoryPoint>, FetchError>) {
    match history {
        Some((scale, fut)) => {
            let res = fut.as_mut().await;
            (*scale, res)
        }
        None => pending().await,
    }
}

async fn poll_timer(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => pending().await,
    }
}

async fn poll_ticker(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => pending().await,
    }
}

async fn poll_stream(stream: &mut Option<EventStream>) -> Option<WsEvent> {
    match stream {
        Some(stream) => stream.next().await,
        None => pending().await,
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::discount::tests::snapshot;
    use crate::error::HttpError;
    use crate::sync::clock::ManualClock;
    use crate::view::SyncStatus;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    enum Step {
        Ok(DiscountSnapshot),
        Fail,
        /// Succeed after holding the fetch open for a while.
        Slow(Duration, DiscountSnapshot),
    }

    #[derive(Default)]
    struct FakeSource {
        steps: Mutex<VecDeque<Step>>,
        history: Mutex<VecDeque<Result<Vec<HistoryPoint>, FetchError>>>,
        fetched_at: Mutex<Vec<Instant>>,
        history_calls: Mutex<Vec<Timescale>>,
    }

    impl FakeSource {
        fn with_steps(steps: Vec<Step>) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into()),
                ..Self::default()
            })
        }

        fn push_history(&self, res: Result<Vec<HistoryPoint>, FetchError>) {
            self.history.lock().unwrap().push_back(res);
        }

        fn fetch_count(&self) -> usize {
            self.fetched_at.lock().unwrap().len()
        }

        fn gaps(&self) -> Vec<Duration> {
            let times = self.fetched_at.lock().unwrap();
            times.windows(2).map(|w| w[1] - w[0]).collect()
        }
    }

    #[async_trait]
    impl DiscountSource for FakeSource {
        async fn fetch_snapshot(&self) -> Result<DiscountSnapshot, FetchError> {
            self.fetched_at.lock().unwrap().push(Instant::now());
            let step = self.steps.lock().unwrap().pop_front();
            match step {
                Some(Step::Ok(snap)) => Ok(snap),
                Some(Step::Fail) => Err(FetchError::Http(HttpError::Status {
                    status: 503,
                    body: "unavailable".into(),
                })),
                Some(Step::Slow(hold, snap)) => {
                    tokio::time::sleep(hold).await;
                    Ok(snap)
                }
                None => Ok(snapshot(80.0, 5.0)),
            }
        }

        async fn load_history(&self, scale: Timescale) -> Result<Vec<HistoryPoint>, FetchError> {
            self.history_calls.lock().unwrap().push(scale);
            let res = self.history.lock().unwrap().pop_front();
            res.unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn epoch() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn hinted(secs: u64) -> DiscountSnapshot {
        DiscountSnapshot {
            seconds_until_next_update: Some(secs),
            ..snapshot(80.0, 5.0)
        }
    }

    fn no_history() -> SyncConfig {
        SyncConfig {
            load_history: false,
            ..SyncConfig::default()
        }
    }

    fn spawn(source: &Arc<FakeSource>, config: SyncConfig, stream: Option<EventStream>) -> SyncHandle {
        spawn_sync(
            Arc::clone(source),
            config,
            stream,
            Arc::new(ManualClock::new(epoch())),
        )
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[test]
    fn test_absent_inputs_never_wake() {
        let mut fetch: Option<FetchFuture> = None;
        let mut fut = tokio_test::task::spawn(poll_fetch(&mut fetch));
        tokio_test::assert_pending!(fut.poll());
        drop(fut);

        let mut stream: Option<EventStream> = None;
        let mut fut = tokio_test::task::spawn(poll_stream(&mut stream));
        tokio_test::assert_pending!(fut.poll());
    }

    #[tokio::test(start_paused = true)]
    async fn test_seconds_hint_schedules_fetch_after_buffer() {
        let source = FakeSource::with_steps(vec![Step::Ok(hinted(45)), Step::Ok(hinted(45))]);
        let handle = spawn(&source, no_history(), None);

        advance(500).await;
        assert_eq!(source.fetch_count(), 1);
        assert_eq!(handle.view().countdown(), Some(45));
        assert_eq!(handle.view().discount_label(), "9.5 折");

        advance(44_000).await; // t = 44.5s
        assert_eq!(handle.view().countdown(), Some(1));

        advance(1_000).await; // t = 45.5s, 45th tick hid it
        assert_eq!(handle.view().countdown(), None);
        assert_eq!(source.fetch_count(), 1);

        advance(2_000).await; // t = 47.5s
        assert_eq!(source.fetch_count(), 2);
        assert_eq!(source.gaps(), [Duration::from_secs(47)]);

        handle.dispose().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_second_fetch_while_in_flight() {
        let source = FakeSource::with_steps(vec![Step::Slow(Duration::from_secs(30), hinted(45))]);
        let handle = spawn(&source, no_history(), None);

        advance(1_000).await;
        for _ in 0..3 {
            handle.refresh().unwrap();
        }
        advance(10_000).await;
        assert_eq!(source.fetch_count(), 1);
        assert_eq!(handle.view().status(), &SyncStatus::Fetching);

        advance(25_000).await; // resolved at 30s
        assert!(matches!(handle.view().status(), SyncStatus::Live { .. }));
        assert_eq!(source.fetch_count(), 1);

        handle.dispose().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_failures_retry_at_flat_delay() {
        let source = FakeSource::with_steps(vec![
            Step::Fail,
            Step::Fail,
            Step::Fail,
            Step::Ok(hinted(45)),
        ]);
        let handle = spawn(&source, no_history(), None);

        advance(5_000).await;
        let view = handle.view();
        assert!(view.status().is_failed());
        assert_eq!(view.status().to_string(), "failed, retrying in 10s");
        assert_eq!(view.countdown(), None);
        assert_eq!(view.discount_label(), "N/A");

        advance(30_500).await; // t = 35.5s
        assert_eq!(source.fetch_count(), 4);
        assert_eq!(source.gaps(), [Duration::from_secs(10); 3]);
        assert!(matches!(handle.view().status(), SyncStatus::Live { .. }));
        assert_eq!(handle.view().countdown(), Some(45 - 5));

        handle.dispose().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_hides_stale_countdown() {
        let source = FakeSource::with_steps(vec![Step::Ok(hinted(5)), Step::Fail]);
        let handle = spawn(&source, no_history(), None);

        advance(2_500).await;
        assert_eq!(handle.view().countdown(), Some(3));

        advance(5_000).await; // failed fetch at 7s
        let view = handle.view();
        assert!(view.status().is_failed());
        assert_eq!(view.countdown(), None);
        // The last good snapshot is kept for the chart, not for display.
        assert!(view.snapshot().is_some());
        assert_eq!(view.discount_label(), "N/A");

        handle.dispose().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_history_is_not_a_failure() {
        let source = FakeSource::with_steps(vec![Step::Ok(hinted(45))]);
        source.push_history(Ok(Vec::new()));
        let handle = spawn(&source, SyncConfig::default(), None);

        advance(100).await;
        let view = handle.view();
        assert_eq!(
            view.history_status(),
            &HistoryStatus::Loaded {
                scale: Timescale::Realtime,
                points: 0
            }
        );
        assert_ne!(view.history_status().to_string(), "history load failed");
        // The first fetch ran before history; its point stays as the tail.
        assert_eq!(source.fetch_count(), 1);
        assert_eq!(view.series().len(), 1);

        handle.dispose().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_failure_persists_and_fetch_still_runs() {
        let source = FakeSource::with_steps(vec![Step::Ok(hinted(45))]);
        source.push_history(Err(FetchError::Http(HttpError::Timeout)));
        let handle = spawn(&source, SyncConfig::default(), None);

        advance(60_000).await;
        let view = handle.view();
        assert_eq!(view.history_status().to_string(), "history load failed");
        assert_eq!(source.history_calls.lock().unwrap().len(), 1);
        assert!(source.fetch_count() >= 1);

        handle.dispose().await.unwrap();
    }

    fn ys(view: &ViewState) -> Vec<f64> {
        view.series().points().iter().map(|p| p.y).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_backfill_projected_with_server_settings() {
        let live = DiscountSnapshot {
            settings: crate::domain::discount::DiscountSettings {
                conversion_factor: 1.0,
                discount_cap: 50.0,
                ..Default::default()
            },
            seconds_until_next_update: Some(45),
            ..snapshot(40.0, 35.0)
        };
        let source = FakeSource::with_steps(vec![Step::Ok(live)]);
        source.push_history(Ok(vec![HistoryPoint {
            timestamp: epoch() - chrono::Duration::minutes(1),
            index: 40.0,
        }]));
        let handle = spawn(&source, SyncConfig::default(), None);

        advance(100).await;
        let view = handle.view();
        assert_eq!(ys(&view), [35.0, 35.0]);
        assert_eq!(source.fetch_count(), 1);
        assert_eq!(*source.history_calls.lock().unwrap(), [Timescale::Realtime]);

        handle.dispose().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_switch_keeps_current_series() {
        let source = FakeSource::with_steps(vec![Step::Ok(hinted(45))]);
        let backfill = (1..=3)
            .rev()
            .map(|m| HistoryPoint {
                timestamp: epoch() - chrono::Duration::minutes(m),
                index: 60.0,
            })
            .collect();
        source.push_history(Ok(backfill));
        source.push_history(Err(FetchError::Http(HttpError::Timeout)));
        let handle = spawn(&source, SyncConfig::default(), None);

        advance(100).await;
        let before = handle.view();
        assert_eq!(ys(&before), [10.0, 10.0, 10.0, 5.0]);

        handle.set_timescale(Timescale::Minute30).unwrap();
        advance(100).await;
        let after = handle.view();
        assert_eq!(after.series(), before.series());
        assert_eq!(after.history_status().to_string(), "history load failed");
        assert!(matches!(
            after.history_status(),
            HistoryStatus::Failed { scale: Timescale::Minute30, .. }
        ));

        handle.dispose().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_timescale_switch_replaces_series() {
        let source = FakeSource::with_steps(vec![Step::Ok(hinted(45))]);
        let backfill: Vec<HistoryPoint> = (0..100)
            .map(|i| HistoryPoint {
                timestamp: epoch() + chrono::Duration::minutes(i),
                index: 40.0,
            })
            .collect();
        source.push_history(Ok(Vec::new()));
        source.push_history(Ok(backfill));
        let handle = spawn(&source, SyncConfig::default(), None);

        advance(100).await;
        assert_eq!(handle.view().series().len(), 1);

        handle.set_timescale(Timescale::Hour1).unwrap();
        advance(100).await;
        let view = handle.view();
        assert_eq!(
            view.history_status(),
            &HistoryStatus::Loaded {
                scale: Timescale::Hour1,
                points: 60
            }
        );
        assert_eq!(view.series().len(), 60);
        assert_eq!(view.series().latest().unwrap().y, 20.0);
        assert_eq!(
            *source.history_calls.lock().unwrap(),
            [Timescale::Realtime, Timescale::Hour1]
        );

        handle.dispose().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_events_update_view() {
        let source = FakeSource::with_steps(vec![Step::Ok(hinted(45))]);
        let (tx, rx) = mpsc::unbounded_channel::<WsEvent>();
        let stream: EventStream = Box::pin(futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        }));
        let handle = spawn(&source, no_history(), Some(stream));
        assert_eq!(handle.view().stream_status(), &StreamStatus::Connecting);

        tx.send(WsEvent::Connected).unwrap();
        tx.send(WsEvent::Point(HistoryPoint {
            timestamp: epoch(),
            index: 40.0,
        }))
        .unwrap();
        advance(100).await;
        let view = handle.view();
        assert_eq!(view.stream_status(), &StreamStatus::Connected);
        assert_eq!(view.series().len(), 2);
        assert_eq!(view.series().latest().unwrap().y, 20.0);
        // Stream points never replace the snapshot.
        assert_eq!(view.snapshot().unwrap().current_index, 80.0);

        tx.send(WsEvent::Error("bad frame".into())).unwrap();
        tx.send(WsEvent::Disconnected {
            code: Some(1006),
            reason: "abnormal".into(),
            reconnect_in: Some(Duration::from_secs(5)),
        })
        .unwrap();
        advance(100).await;
        assert_eq!(
            handle.view().stream_status(),
            &StreamStatus::Reconnecting {
                retry_in: Duration::from_secs(5)
            }
        );

        drop(tx);
        advance(100).await;
        assert_eq!(handle.view().stream_status(), &StreamStatus::Disabled);

        handle.dispose().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_cancels_schedule() {
        let source = FakeSource::with_steps(vec![Step::Ok(hinted(5))]);
        let handle = spawn(&source, no_history(), None);
        let mut rx = handle.subscribe();

        advance(1_000).await;
        assert!(handle.is_running());
        handle.dispose().await.unwrap();

        advance(120_000).await;
        assert_eq!(source.fetch_count(), 1);
        assert_eq!(rx.borrow_and_update().countdown(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_after_dispose_fail() {
        let source = FakeSource::with_steps(Vec::new());
        let handle = spawn(&source, no_history(), None);
        let view_rx = handle.subscribe();
        let cmd_tx = handle.cmd_tx.clone();
        handle.dispose().await.unwrap();

        assert!(cmd_tx.send(Command::Refresh).is_err());
        // The task dropped its sender on exit.
        assert!(view_rx.has_changed().is_err());
    }
}

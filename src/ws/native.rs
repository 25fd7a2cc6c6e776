//! Native stream client over `tokio-tungstenite`.
//!
//! A background tokio task owns the socket and drives the `StreamChannel`
//! machine: it connects, forwards text frames to the machine, and sleeps
//! the fixed reconnect delay whenever the machine asks for it. Events reach
//! the consumer through an mpsc channel.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::WsError;
use crate::ws::channel::{ChannelAction, ChannelEvent, ChannelState, StreamChannel};
use crate::ws::{EventStream, WsConfig, WsEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ─── Commands from public API to background task ─────────────────────────────

enum Command {
    Disconnect,
}

// ─── Shared channel state ────────────────────────────────────────────────────

const STATE_CONNECTING: u8 = 0;
const STATE_OPEN: u8 = 1;
const STATE_CLOSED: u8 = 2;
const STATE_SHUTDOWN: u8 = 3;

fn encode_state(state: ChannelState) -> u8 {
    match state {
        ChannelState::Connecting => STATE_CONNECTING,
        ChannelState::Open => STATE_OPEN,
        ChannelState::Closed { intentional: false } => STATE_CLOSED,
        ChannelState::Closed { intentional: true } => STATE_SHUTDOWN,
    }
}

fn decode_state(raw: u8) -> ChannelState {
    match raw {
        STATE_CONNECTING => ChannelState::Connecting,
        STATE_OPEN => ChannelState::Open,
        STATE_CLOSED => ChannelState::Closed { intentional: false },
        _ => ChannelState::Closed { intentional: true },
    }
}

// ─── Background task state ───────────────────────────────────────────────────

struct TaskState {
    config: WsConfig,
    channel: StreamChannel,
    event_tx: mpsc::Sender<WsEvent>,
    cmd_rx: mpsc::Receiver<Command>,
    shared_state: Arc<AtomicU8>,
}

impl TaskState {
    /// Waits for room in the event channel; a slow consumer slows the
    /// socket reads instead of losing points.
    async fn emit(&self, event: WsEvent) {
        if self.event_tx.send(event).await.is_err() {
            tracing::debug!("Event receiver dropped, discarding stream event");
        }
    }

    /// Feed one event to the machine. Emits are delivered immediately; the
    /// remaining actions are returned for the task loop.
    async fn dispatch(&mut self, event: ChannelEvent) -> Vec<ChannelAction> {
        let actions = self.channel.handle(event);
        self.publish_state();
        let mut rest = Vec::with_capacity(actions.len());
        for action in actions {
            match action {
                ChannelAction::Emit(ev) => self.emit(ev).await,
                other => rest.push(other),
            }
        }
        rest
    }

    fn publish_state(&self) {
        self.shared_state
            .store(encode_state(self.channel.state()), Ordering::SeqCst);
    }
}

// ─── Public WsClient ─────────────────────────────────────────────────────────

/// Native stream client using `tokio-tungstenite`.
///
/// Uses a background tokio task for connection management.
/// The public API communicates with it via mpsc channels.
pub struct WsClient {
    config: WsConfig,
    cmd_tx: Option<mpsc::Sender<Command>>,
    event_rx: Option<mpsc::Receiver<WsEvent>>,
    task_handle: Option<JoinHandle<()>>,
    shared_state: Arc<AtomicU8>,
}

impl WsClient {
    /// Create a new stream client. Does not connect yet.
    pub fn new(config: WsConfig) -> Self {
        Self {
            config,
            cmd_tx: None,
            event_rx: None,
            task_handle: None,
            shared_state: Arc::new(AtomicU8::new(STATE_CLOSED)),
        }
    }

    /// Connect to the stream endpoint.
    ///
    /// Spawns the background task; connection progress is reported through
    /// the event stream.
    pub fn connect(&mut self) -> Result<(), WsError> {
        if self.cmd_tx.is_some() {
            return Ok(());
        }

        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let (event_tx, event_rx) = mpsc::channel(256);
        self.cmd_tx = Some(cmd_tx);
        self.event_rx = Some(event_rx);

        let state = TaskState {
            config: self.config.clone(),
            channel: StreamChannel::new(&self.config),
            event_tx,
            cmd_rx,
            shared_state: Arc::clone(&self.shared_state),
        };

        self.task_handle = Some(tokio::spawn(run_task(state)));
        Ok(())
    }

    /// Disconnect and wait for the background task to finish.
    pub async fn disconnect(&mut self) -> Result<(), WsError> {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(Command::Disconnect).await;
        }

        if let Some(handle) = self.task_handle.take() {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }

        self.shared_state.store(STATE_SHUTDOWN, Ordering::SeqCst);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ChannelState::Open
    }

    /// Current channel state.
    pub fn state(&self) -> ChannelState {
        decode_state(self.shared_state.load(Ordering::SeqCst))
    }

    /// Take the event receiver. Available once per `connect`.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<WsEvent>> {
        self.event_rx.take()
    }

    /// Connect and turn the client into its event stream. Dropping the
    /// stream drops the client, which stops the background task.
    pub fn into_events(mut self) -> Result<EventStream, WsError> {
        self.connect()?;
        let rx = self.take_events().ok_or(WsError::NotConnected)?;
        Ok(Box::pin(futures_util::stream::unfold(
            (self, rx),
            |(client, mut rx)| async move { rx.recv().await.map(|event| (event, (client, rx))) },
        )))
    }
}

impl Drop for WsClient {
    fn drop(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

// ─── Background task ─────────────────────────────────────────────────────────

async fn run_task(mut state: TaskState) {
    let mut queue: VecDeque<ChannelAction> = state.channel.start().into();
    state.publish_state();

    while let Some(action) = queue.pop_front() {
        let next = match action {
            ChannelAction::Emit(event) => {
                state.emit(event).await;
                continue;
            }
            ChannelAction::Stop => break,
            ChannelAction::Connect => connect_and_run(&mut state).await,
            ChannelAction::ScheduleReconnect(delay) => wait_reconnect(&mut state, delay).await,
        };
        queue.extend(state.dispatch(next).await);
    }

    tracing::debug!("Stream task finished");
}

/// Connect, then pump frames into the machine until the connection ends.
/// Returns the event that ended it.
async fn connect_and_run(state: &mut TaskState) -> ChannelEvent {
    let connect_timeout = Duration::from_millis(state.config.connect_timeout_ms);
    let connected = tokio::select! {
        res = attempt_connect(&state.config.url, connect_timeout) => res,
        _ = state.cmd_rx.recv() => return ChannelEvent::Shutdown,
    };

    let (sink, stream) = match connected {
        Ok(parts) => parts,
        Err(e) => return ChannelEvent::ConnectFailed(e),
    };

    // Opened only ever yields Emit(Connected).
    let _ = state.dispatch(ChannelEvent::Opened).await;
    run_connected(state, sink, stream).await
}

/// The inner connected loop. Runs until the connection breaks.
async fn run_connected(
    state: &mut TaskState,
    mut sink: SplitSink<WsStream, Message>,
    mut stream: SplitStream<WsStream>,
) -> ChannelEvent {
    loop {
        tokio::select! {
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let text_str: &str = text.as_ref();
                        let _ = state.dispatch(ChannelEvent::Message(text_str.to_string())).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = extract_close(frame.as_ref());
                        return ChannelEvent::Closed { code: Some(code), reason };
                    }
                    Some(Ok(_)) => {} // Binary, Pong, Frame: ignore
                    Some(Err(e)) => {
                        return ChannelEvent::Closed { code: None, reason: e.to_string() };
                    }
                    None => {
                        return ChannelEvent::Closed { code: None, reason: "Stream ended".into() };
                    }
                }
            }

            // Disconnect requested, or the WsClient was dropped.
            _ = state.cmd_rx.recv() => {
                let _ = sink.send(Message::Close(Some(CloseFrame {
                    code: CloseCode::Normal,
                    reason: "Client disconnect".into(),
                }))).await;
                return ChannelEvent::Shutdown;
            }
        }
    }
}

/// Sleep out the reconnect delay unless a disconnect arrives first.
async fn wait_reconnect(state: &mut TaskState, delay: Duration) -> ChannelEvent {
    tokio::select! {
        _ = tokio::time::sleep(delay) => ChannelEvent::ReconnectDue,
        _ = state.cmd_rx.recv() => ChannelEvent::Shutdown,
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

async fn attempt_connect(
    url: &str,
    timeout: Duration,
) -> Result<(SplitSink<WsStream, Message>, SplitStream<WsStream>), String> {
    let (ws_stream, _) = tokio::time::timeout(timeout, connect_async(url))
        .await
        .map_err(|_| "Connection timeout".to_string())?
        .map_err(|e| e.to_string())?;

    Ok(ws_stream.split())
}

/// Extract close code and reason from an optional CloseFrame.
fn extract_close(frame: Option<&CloseFrame>) -> (u16, String) {
    match frame {
        Some(f) => (f.code.into(), f.reason.to_string()),
        None => (1006, "No close frame".into()),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_client_new() {
        let client = WsClient::new(WsConfig::default());
        assert!(client.cmd_tx.is_none());
        assert!(!client.is_connected());
    }

    #[test]
    fn test_state_encoding_roundtrip() {
        for state in [
            ChannelState::Connecting,
            ChannelState::Open,
            ChannelState::Closed { intentional: false },
            ChannelState::Closed { intentional: true },
        ] {
            assert_eq!(decode_state(encode_state(state)), state);
        }
    }

    #[test]
    fn test_extract_close_with_frame() {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "goodbye".into(),
        };
        let (code, reason) = extract_close(Some(&frame));
        assert_eq!(code, 1000);
        assert_eq!(reason, "goodbye");
    }

    #[test]
    fn test_extract_close_no_frame() {
        let (code, reason) = extract_close(None);
        assert_eq!(code, 1006);
        assert_eq!(reason, "No close frame");
    }

    #[tokio::test]
    async fn test_points_not_dropped_under_backpressure() {
        let (event_tx, mut event_rx) = mpsc::channel(1);
        let (_cmd_tx, cmd_rx) = mpsc::channel(1);
        let config = WsConfig::default();
        let mut state = TaskState {
            channel: StreamChannel::new(&config),
            config,
            event_tx,
            cmd_rx,
            shared_state: Arc::new(AtomicU8::new(STATE_CLOSED)),
        };

        let producer = tokio::spawn(async move {
            state.channel.start();
            state.dispatch(ChannelEvent::Opened).await;
            for i in 0..20 {
                let text = format!(
                    r#"{{"type":"ppi_update","timestamp":{},"ppi":50}}"#,
                    1_700_000_000 + i
                );
                state.dispatch(ChannelEvent::Message(text)).await;
            }
        });

        let mut points = 0;
        while let Some(event) = event_rx.recv().await {
            if matches!(event, WsEvent::Point(_)) {
                points += 1;
            }
        }
        producer.await.unwrap();
        assert_eq!(points, 20);
    }

    #[tokio::test]
    async fn test_disconnect_when_not_connected() {
        let mut client = WsClient::new(WsConfig::default());
        assert!(client.disconnect().await.is_ok());
        assert_eq!(client.state(), ChannelState::Closed { intentional: true });
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_reports_and_rearms() {
        let mut client = WsClient::new(WsConfig {
            url: "ws://127.0.0.1:9/ws".into(),
            reconnect_delay_ms: 50,
            connect_timeout_ms: 2_000,
            ..WsConfig::default()
        });
        client.connect().unwrap();
        let mut events = client.take_events().unwrap();
        assert!(client.take_events().is_none());

        let first = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out")
            .expect("stream ended");
        assert!(matches!(
            first,
            WsEvent::Disconnected { reconnect_in: Some(d), .. } if d == Duration::from_millis(50)
        ));

        // The reconnect loop keeps going.
        let second = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out")
            .expect("stream ended");
        assert!(matches!(second, WsEvent::Disconnected { .. }));

        client.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_into_events_yields_disconnect() {
        let client = WsClient::new(WsConfig {
            url: "ws://127.0.0.1:9/ws".into(),
            reconnect: false,
            ..WsConfig::default()
        });
        let mut events = client.into_events().unwrap();
        let first = tokio::time::timeout(Duration::from_secs(5), events.next())
            .await
            .expect("timed out")
            .expect("stream ended");
        assert!(matches!(first, WsEvent::Disconnected { reconnect_in: None, .. }));
        // Reconnect disabled: the task stops and the stream ends.
        let end = tokio::time::timeout(Duration::from_secs(5), events.next())
            .await
            .expect("timed out");
        assert!(end.is_none());
    }
}

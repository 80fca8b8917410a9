//! Socket channel manager: one persistent connection to the notification
//! endpoint, with heartbeat keep-alive and exponential reconnect backoff.
//!
//! Nothing in here is allowed to throw into the host: transport failures
//! become reconnect attempts, missing credentials abort the attempt with a
//! log line, and the only user-visible error is a single degraded-mode
//! warning once reconnects are exhausted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cache::{invalidation_tags, CacheStore};
use crate::credentials::CredentialStore;
use crate::error::{RealtimeError, Result};
use crate::frame::{self, Frame};
use crate::notify::{notification_for, Notification, NotificationKind, NotificationSink};
use crate::types::{EventKind, NotificationEvent};

const DEFAULT_WS: &str = "ws://localhost:8000/ws";

/// Exponential backoff: `base_delay * 2^(attempt-1)`, capped at
/// `max_attempts` retries per unexpected-disconnect streak.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(1000),
            max_attempts: 5,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt `attempt` (1-based), or `None` once
    /// attempts are exhausted.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        Some(self.base_delay * 2u32.pow(attempt - 1))
    }
}

/// Tunables for the socket channel.
#[derive(Debug, Clone)]
pub struct SocketConfig {
    /// Notification endpoint; the auth token is appended as a path segment.
    pub ws_base_url: String,
    pub heartbeat_interval: Duration,
    pub reconnect: ReconnectPolicy,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            ws_base_url: DEFAULT_WS.to_owned(),
            heartbeat_interval: Duration::from_secs(30),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl SocketConfig {
    pub fn new(ws_base_url: impl Into<String>) -> Self {
        Self {
            ws_base_url: ws_base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }
}

/// Manages the single persistent notification channel.
///
/// Constructed once at application composition with its collaborators
/// injected; `connect`/`disconnect` are driven by the authenticated-session
/// lifecycle (see [`ConnectionGuard`]). All entry points are safe to call
/// repeatedly and from any state.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use vistascan_realtime::{
///     CacheStore, CacheTag, MemoryCredentialStore, Notification, NotificationSink,
///     Role, SocketConfig, SocketManager,
/// };
///
/// struct QueryCache;
/// impl CacheStore for QueryCache {
///     fn invalidate(&self, tags: &[CacheTag]) {
///         for tag in tags {
///             println!("stale: {tag}");
///         }
///     }
/// }
///
/// struct Banners;
/// impl NotificationSink for Banners {
///     fn show(&self, n: Notification) {
///         println!("{}: {}", n.title, n.body);
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let credentials = Arc::new(MemoryCredentialStore::new());
///     credentials.set_session("jwt", "user-1", Role::Patient);
///
///     let manager = SocketManager::new(
///         SocketConfig::new("wss://api.example.com/ws"),
///         credentials,
///         Arc::new(QueryCache),
///         Arc::new(Banners),
///     );
///     manager.connect().await; // spawns background task, returns immediately
/// }
/// ```
pub struct SocketManager {
    config: SocketConfig,
    credentials: Arc<dyn CredentialStore>,
    cache: Arc<dyn CacheStore>,
    notifier: Arc<dyn NotificationSink>,
    events: broadcast::Sender<NotificationEvent>,
    connected: Arc<AtomicBool>,
    manual_close: Arc<AtomicBool>,
    link: Mutex<Option<Link>>,
}

/// The currently-armed connection task and its cancellation handle.
struct Link {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SocketManager {
    pub fn new(
        config: SocketConfig,
        credentials: Arc<dyn CredentialStore>,
        cache: Arc<dyn CacheStore>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            config,
            credentials,
            cache,
            notifier,
            events,
            connected: Arc::new(AtomicBool::new(false)),
            manual_close: Arc::new(AtomicBool::new(false)),
            link: Mutex::new(None),
        }
    }

    /// True only while the channel is fully open.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Subscribe to decoded notification events.
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.events.subscribe()
    }

    /// Open the channel. No-op while already connected; logs and returns if
    /// no auth token is available. Spawns a background task that keeps the
    /// connection alive and returns immediately.
    ///
    /// Calling this after a disconnect (or after reconnects were exhausted)
    /// re-arms the channel with a fresh attempt counter.
    pub async fn connect(&self) {
        if self.is_connected() {
            debug!("Socket already connected");
            return;
        }
        if self.credentials.auth_token().is_none() {
            warn!("No auth token available for socket connection");
            return;
        }

        self.manual_close.store(false, Ordering::SeqCst);

        let mut link = self.link.lock().await;
        // A previous link may still be mid-backoff; tear it down first so at
        // most one channel task exists.
        if let Some(old) = link.take() {
            old.cancel.cancel();
            old.task.abort();
        }

        let cancel = CancellationToken::new();
        let ctx = Arc::new(LinkCtx {
            config: self.config.clone(),
            credentials: Arc::clone(&self.credentials),
            cache: Arc::clone(&self.cache),
            notifier: Arc::clone(&self.notifier),
            events: self.events.clone(),
            connected: Arc::clone(&self.connected),
            manual_close: Arc::clone(&self.manual_close),
            cancel: cancel.clone(),
        });
        let task = tokio::spawn(run(ctx));
        *link = Some(Link { cancel, task });
    }

    /// Close the channel and suppress any pending or future reconnect until
    /// [`connect`](Self::connect) is called again. Idempotent.
    pub async fn disconnect(&self) {
        self.manual_close.store(true, Ordering::SeqCst);

        let link = self.link.lock().await.take();
        if let Some(link) = link {
            info!("Socket: manual disconnect");
            link.cancel.cancel();
            // Let the task send its normal-closure frame before returning.
            let _ = link.task.await;
        }
        self.connected.store(false, Ordering::SeqCst);
    }
}

/// Holds the socket open for the duration of an authenticated session:
/// connects on construction, disconnects when dropped.
pub struct ConnectionGuard {
    manager: Arc<SocketManager>,
}

impl ConnectionGuard {
    pub async fn new(manager: Arc<SocketManager>) -> Self {
        manager.connect().await;
        Self { manager }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        // Stops reconnects immediately even if no runtime is left to run
        // the async teardown.
        self.manager.manual_close.store(true, Ordering::SeqCst);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let manager = Arc::clone(&self.manager);
            handle.spawn(async move { manager.disconnect().await });
        }
    }
}

/// Everything one connection task needs, shared with the manager.
struct LinkCtx {
    config: SocketConfig,
    credentials: Arc<dyn CredentialStore>,
    cache: Arc<dyn CacheStore>,
    notifier: Arc<dyn NotificationSink>,
    events: broadcast::Sender<NotificationEvent>,
    connected: Arc<AtomicBool>,
    manual_close: Arc<AtomicBool>,
    cancel: CancellationToken,
}

impl LinkCtx {
    fn handle_frame(&self, raw: &str) {
        match frame::decode(raw) {
            Frame::KeepAliveAck => debug!("Socket: heartbeat ack"),
            Frame::Greeting => debug!("Socket: server greeting"),
            Frame::Malformed => {}
            Frame::Event(event) => self.handle_event(event),
        }
    }

    fn handle_event(&self, event: NotificationEvent) {
        if event.event_type == EventKind::Unknown {
            debug!("Socket: ignoring unrecognized event type");
            return;
        }
        debug!(
            kind = ?event.event_type,
            consultation = %event.consultation_id,
            "Notification event received"
        );

        let tags = invalidation_tags(&event);
        if !tags.is_empty() {
            self.cache.invalidate(&tags);
        }

        // Viewer identity is re-read per event; it can change across
        // login/logout without a reconnect.
        let viewer = self.credentials.viewer();
        if let Some(notification) = notification_for(&event, &viewer) {
            self.notifier.show(notification);
        }

        let _ = self.events.send(event);
    }
}

/// Connection loop: dial, serve the channel, and on unexpected closure back
/// off and retry until the policy is exhausted or a manual disconnect lands.
async fn run(ctx: Arc<LinkCtx>) {
    let mut attempt = 0u32;
    loop {
        // Token is re-read per attempt; it can rotate between retries, and
        // logout mid-backoff ends the loop.
        let Some(token) = ctx.credentials.auth_token() else {
            warn!("Socket: auth token gone, stopping reconnect");
            break;
        };
        let url = format!("{}/{token}", ctx.config.ws_base_url.trim_end_matches('/'));

        match run_once(&ctx, &url, &mut attempt).await {
            Ok(()) => break,
            Err(e) => {
                if ctx.manual_close.load(Ordering::SeqCst) {
                    break;
                }
                attempt += 1;
                match ctx.config.reconnect.next_delay(attempt) {
                    Some(delay) => {
                        warn!("Socket disconnected ({e}), reconnecting in {delay:?} (attempt {attempt})");
                        tokio::select! {
                            _ = ctx.cancel.cancelled() => break,
                            _ = sleep(delay) => {}
                        }
                    }
                    None => {
                        error!("Socket: reconnect attempts exhausted: {e}");
                        ctx.notifier.show(degraded_warning());
                        break;
                    }
                }
            }
        }
    }
    ctx.connected.store(false, Ordering::SeqCst);
}

/// One connection's lifetime: handshake, heartbeat, and inbound dispatch.
/// Returns `Ok(())` only for a manual close; every other ending is an error
/// the caller may retry.
async fn run_once(ctx: &LinkCtx, url: &str, attempt: &mut u32) -> Result<()> {
    let ws = tokio::select! {
        _ = ctx.cancel.cancelled() => return Ok(()),
        dialed = connect_async(url) => dialed?.0,
    };
    info!("Socket connected");
    *attempt = 0;
    ctx.connected.store(true, Ordering::SeqCst);

    let (mut sink, mut stream) = ws.split();

    let mut heartbeat = interval_at(
        Instant::now() + ctx.config.heartbeat_interval,
        ctx.config.heartbeat_interval,
    );
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let result = loop {
        tokio::select! {
            _ = ctx.cancel.cancelled() => {
                let close = CloseFrame {
                    code: CloseCode::Normal,
                    reason: "Manual disconnect".into(),
                };
                let _ = sink.send(Message::Close(Some(close))).await;
                break Ok(());
            }
            _ = heartbeat.tick() => {
                // Fire-and-forget; the ack comes back as a text frame and is
                // discarded by the decoder.
                if let Err(e) = sink.send(Message::Text(frame::KEEPALIVE.into())).await {
                    break Err(e.into());
                }
            }
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => ctx.handle_frame(text.as_str()),
                Some(Ok(Message::Close(close))) => {
                    debug!("Socket closed by server: {close:?}");
                    break Err(RealtimeError::ConnectionClosed);
                }
                // Control and binary frames carry nothing for us.
                Some(Ok(_)) => {}
                Some(Err(e)) => break Err(e.into()),
                None => break Err(RealtimeError::ConnectionClosed),
            }
        }
    };

    ctx.connected.store(false, Ordering::SeqCst);
    result
}

/// Shown exactly once per exhausted-reconnect streak.
fn degraded_warning() -> Notification {
    Notification {
        kind: NotificationKind::Warning,
        title: "Connection Issues".into(),
        body: "Real-time updates may be delayed. The page will refresh data automatically.".into(),
        dedupe_key: "connection-degraded".into(),
        duration: Duration::from_secs(6),
    }
}

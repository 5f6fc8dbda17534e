//! Topic-based push channel.
//!
//! The backend notifies order changes over a broker-style pub/sub
//! connection. The client never inspects payloads - a frame on a consumed
//! topic means "something changed, re-fetch". The broker transport itself
//! (STOMP over WebSocket in production) is a collaborator behind the
//! [`PushTransport`] port; this module owns the connection lifecycle:
//! subscribe on connect, heartbeat both ways, reconnect with a fixed
//! backoff, tear down on shutdown.
//!
//! Reconnection is unbounded but not silent: after
//! [`PushSessionConfig::lost_threshold`] consecutive failed attempts a
//! [`PushEvent::ConnectionLost`] is emitted for the UI, and a later
//! successful reconnect emits [`PushEvent::Reconnected`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::session::SessionStore;

// =============================================================================
// Transport port
// =============================================================================

/// Topics the client consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// An admin changed some order.
    AdminOrders,
    /// The kitchen finished preparing some order.
    KitchenFinished,
}

impl Topic {
    /// Every topic the client subscribes to.
    pub const ALL: [Self; 2] = [Self::AdminOrders, Self::KitchenFinished];

    /// Broker destination path.
    #[must_use]
    pub const fn destination(self) -> &'static str {
        match self {
            Self::AdminOrders => "/topic/admin/orders",
            Self::KitchenFinished => "/topic/kitchen/finished",
        }
    }
}

/// One inbound frame from the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushFrame {
    /// A message arrived on a consumed topic. The payload is not inspected.
    Event(Topic),
    /// Peer heartbeat.
    Heartbeat,
}

/// Transport-level failure.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("subscribe failed: {0}")]
    Subscribe(String),
    #[error("connection dropped: {0}")]
    Dropped(String),
}

/// Port to the broker transport.
///
/// Authenticated with the bearer token at connect time.
#[async_trait]
pub trait PushTransport: Send + Sync + 'static {
    /// Open a fresh connection.
    async fn connect(&self, token: &SecretString)
    -> Result<Box<dyn PushConnection>, PushError>;
}

/// A live broker connection.
///
/// `next_frame` must be cancel-safe: the session races it against its
/// heartbeat and liveness deadlines.
#[async_trait]
pub trait PushConnection: Send {
    /// Subscribe to a topic.
    async fn subscribe(&mut self, topic: Topic) -> Result<(), PushError>;

    /// Wait for the next inbound frame. An error means the connection is
    /// dead and the session should reconnect.
    async fn next_frame(&mut self) -> Result<PushFrame, PushError>;

    /// Send an outbound heartbeat.
    async fn send_heartbeat(&mut self) -> Result<(), PushError>;

    /// Unsubscribe and close. Best-effort; the connection is gone after.
    async fn close(&mut self);
}

// =============================================================================
// Session
// =============================================================================

/// Events fanned out to screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushEvent {
    /// A consumed topic fired; re-fetch whatever depends on it.
    Changed(Topic),
    /// The channel came back after at least one failed attempt.
    Reconnected,
    /// Several consecutive reconnect attempts failed. Alert material; the
    /// session keeps retrying regardless.
    ConnectionLost,
}

/// Tunables for the connection lifecycle.
#[derive(Debug, Clone)]
pub struct PushSessionConfig {
    /// Outbound heartbeat cadence.
    pub heartbeat_interval: Duration,
    /// How long without any inbound frame before the connection is
    /// declared dead.
    pub liveness_window: Duration,
    /// Fixed delay between reconnect attempts.
    pub reconnect_backoff: Duration,
    /// Consecutive failures before [`PushEvent::ConnectionLost`] is emitted.
    pub lost_threshold: u32,
}

impl Default for PushSessionConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(10),
            liveness_window: Duration::from_secs(30),
            reconnect_backoff: Duration::from_secs(3),
            lost_threshold: 5,
        }
    }
}

/// Owns the background connection task.
///
/// Dropping the session closes the shutdown channel; the task notices and
/// exits at its next suspension point. Prefer [`PushSession::shutdown`] to
/// wait for the teardown.
pub struct PushSession {
    events: broadcast::Sender<PushEvent>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PushSession {
    /// Spawn the connection task.
    ///
    /// The task connects only while the session store is authenticated and
    /// keeps the subscription alive until shutdown.
    #[must_use]
    pub fn spawn(
        transport: Arc<dyn PushTransport>,
        session: SessionStore,
        config: PushSessionConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(32);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run(transport, session, config, events.clone(), shutdown_rx));

        Self {
            events,
            shutdown,
            task,
        }
    }

    /// Subscribe to connection events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.events.subscribe()
    }

    /// Stop the connection task and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

impl std::fmt::Debug for PushSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushSession")
            .field("subscribers", &self.events.receiver_count())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Connection loop
// =============================================================================

enum DriveEnd {
    Shutdown,
    LoggedOut,
    Dead(String),
}

async fn run(
    transport: Arc<dyn PushTransport>,
    session: SessionStore,
    config: PushSessionConfig,
    events: broadcast::Sender<PushEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut consecutive_failures: u32 = 0;

    loop {
        if *shutdown.borrow() {
            return;
        }

        // Only connect while a session exists; logged-out users have no
        // live queue to watch.
        let Some(token) = session.token().await else {
            if wait_or_shutdown(&mut shutdown, config.reconnect_backoff).await {
                return;
            }
            continue;
        };

        match connect_and_subscribe(transport.as_ref(), &token).await {
            Ok(mut conn) => {
                if consecutive_failures > 0 {
                    let _ = events.send(PushEvent::Reconnected);
                }
                consecutive_failures = 0;
                info!("push channel connected");

                let end = drive(conn.as_mut(), &session, &config, &events, &mut shutdown).await;
                conn.close().await;

                match end {
                    DriveEnd::Shutdown => return,
                    DriveEnd::LoggedOut => {
                        info!("push channel closed after logout");
                    }
                    DriveEnd::Dead(reason) => {
                        warn!(reason = %reason, "push connection dropped, will reconnect");
                    }
                }
            }
            Err(e) => {
                consecutive_failures += 1;
                warn!(
                    error = %e,
                    attempt = consecutive_failures,
                    "push connect failed"
                );
                if consecutive_failures == config.lost_threshold {
                    let _ = events.send(PushEvent::ConnectionLost);
                }
            }
        }

        if wait_or_shutdown(&mut shutdown, config.reconnect_backoff).await {
            return;
        }
    }
}

async fn connect_and_subscribe(
    transport: &dyn PushTransport,
    token: &SecretString,
) -> Result<Box<dyn PushConnection>, PushError> {
    let mut conn = transport.connect(token).await?;
    for topic in Topic::ALL {
        if let Err(e) = conn.subscribe(topic).await {
            conn.close().await;
            return Err(e);
        }
    }
    Ok(conn)
}

/// Pump frames until the connection dies, the user logs out, or shutdown
/// is requested.
async fn drive(
    conn: &mut dyn PushConnection,
    session: &SessionStore,
    config: &PushSessionConfig,
    events: &broadcast::Sender<PushEvent>,
    shutdown: &mut watch::Receiver<bool>,
) -> DriveEnd {
    let mut next_heartbeat = Instant::now() + config.heartbeat_interval;
    let mut liveness_deadline = Instant::now() + config.liveness_window;

    loop {
        let deadline = next_heartbeat.min(liveness_deadline);

        let frame = tokio::select! {
            _ = shutdown.changed() => return DriveEnd::Shutdown,
            frame = tokio::time::timeout_at(deadline, conn.next_frame()) => frame,
        };

        match frame {
            Ok(Ok(PushFrame::Event(topic))) => {
                liveness_deadline = Instant::now() + config.liveness_window;
                debug!(topic = ?topic, "push event");
                let _ = events.send(PushEvent::Changed(topic));
            }
            Ok(Ok(PushFrame::Heartbeat)) => {
                liveness_deadline = Instant::now() + config.liveness_window;
            }
            Ok(Err(e)) => return DriveEnd::Dead(e.to_string()),
            // No frame before the earlier of the two deadlines.
            Err(_) => {
                if !session.is_authenticated().await {
                    return DriveEnd::LoggedOut;
                }
                let now = Instant::now();
                if now >= liveness_deadline {
                    return DriveEnd::Dead("liveness window expired".to_string());
                }
                if now >= next_heartbeat {
                    if let Err(e) = conn.send_heartbeat().await {
                        return DriveEnd::Dead(e.to_string());
                    }
                    next_heartbeat = now + config.heartbeat_interval;
                }
            }
        }
    }
}

/// Sleep for the backoff, returning `true` if shutdown was requested.
async fn wait_or_shutdown(shutdown: &mut watch::Receiver<bool>, backoff: Duration) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(backoff) => false,
        _ = shutdown.changed() => true,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use secrecy::SecretString;

    use super::*;
    use crate::storage::InMemoryTokenStorage;

    /// Scripted transport: a queue of connect outcomes, each a frame script.
    struct ScriptedTransport {
        connects: Mutex<Vec<ConnectOutcome>>,
        attempts: AtomicU32,
    }

    enum ConnectOutcome {
        Fail,
        Frames(Vec<PushFrame>),
    }

    impl ScriptedTransport {
        fn new(connects: Vec<ConnectOutcome>) -> Self {
            Self {
                connects: Mutex::new(connects),
                attempts: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl PushTransport for ScriptedTransport {
        async fn connect(
            &self,
            _token: &SecretString,
        ) -> Result<Box<dyn PushConnection>, PushError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let next = self.connects.lock().expect("lock").pop();
            match next {
                Some(ConnectOutcome::Frames(mut frames)) => {
                    frames.reverse();
                    Ok(Box::new(ScriptedConnection { frames }))
                }
                Some(ConnectOutcome::Fail) | None => {
                    Err(PushError::Connect("refused".to_string()))
                }
            }
        }
    }

    struct ScriptedConnection {
        frames: Vec<PushFrame>,
    }

    #[async_trait]
    impl PushConnection for ScriptedConnection {
        async fn subscribe(&mut self, _topic: Topic) -> Result<(), PushError> {
            Ok(())
        }

        async fn next_frame(&mut self) -> Result<PushFrame, PushError> {
            match self.frames.pop() {
                Some(frame) => Ok(frame),
                // Script exhausted: hang until a deadline fires.
                None => std::future::pending().await,
            }
        }

        async fn send_heartbeat(&mut self) -> Result<(), PushError> {
            Ok(())
        }

        async fn close(&mut self) {}
    }

    async fn authed_session() -> SessionStore {
        let session = SessionStore::new(InMemoryTokenStorage::default());
        session
            .set_auth("shipper01", SecretString::from("tok".to_string()))
            .await
            .expect("persist");
        session
    }

    fn fast_config() -> PushSessionConfig {
        PushSessionConfig {
            heartbeat_interval: Duration::from_millis(100),
            liveness_window: Duration::from_millis(500),
            reconnect_backoff: Duration::from_millis(50),
            lost_threshold: 5,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_are_fanned_out() {
        let transport = Arc::new(ScriptedTransport::new(vec![ConnectOutcome::Frames(vec![
            PushFrame::Event(Topic::AdminOrders),
            PushFrame::Event(Topic::KitchenFinished),
        ])]));

        let push = PushSession::spawn(transport, authed_session().await, fast_config());
        let mut events = push.subscribe();

        assert_eq!(
            events.recv().await.expect("event"),
            PushEvent::Changed(Topic::AdminOrders)
        );
        assert_eq!(
            events.recv().await.expect("event"),
            PushEvent::Changed(Topic::KitchenFinished)
        );

        push.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_lost_after_threshold() {
        // Every connect fails; the fifth failure should announce itself.
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let push = PushSession::spawn(transport, authed_session().await, fast_config());
        let mut events = push.subscribe();

        assert_eq!(events.recv().await.expect("event"), PushEvent::ConnectionLost);

        push.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnected_after_failures() {
        // One failure, then a working connection.
        let transport = Arc::new(ScriptedTransport::new(vec![
            ConnectOutcome::Frames(vec![PushFrame::Event(Topic::AdminOrders)]),
            ConnectOutcome::Fail,
        ]));
        let push = PushSession::spawn(transport, authed_session().await, fast_config());
        let mut events = push.subscribe();

        assert_eq!(events.recv().await.expect("event"), PushEvent::Reconnected);
        assert_eq!(
            events.recv().await.expect("event"),
            PushEvent::Changed(Topic::AdminOrders)
        );

        push.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_tears_down_the_connection() {
        let transport = Arc::new(ScriptedTransport::new(vec![ConnectOutcome::Frames(
            Vec::new(),
        )]));
        let session = authed_session().await;
        let push = PushSession::spawn(
            Arc::clone(&transport) as _,
            session.clone(),
            fast_config(),
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(transport.attempts.load(Ordering::SeqCst), 1);

        session.clear().await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(
            transport.attempts.load(Ordering::SeqCst),
            1,
            "no reconnect after logout"
        );

        push.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_connect_without_session() {
        let transport = Arc::new(ScriptedTransport::new(vec![ConnectOutcome::Frames(vec![])]));
        let session = SessionStore::new(InMemoryTokenStorage::default());
        let push = PushSession::spawn(Arc::clone(&transport) as _, session, fast_config());

        // Give the task a few backoff cycles; it must never dial out.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(transport.attempts.load(Ordering::SeqCst), 0);

        push.shutdown().await;
    }
}

//! The shipper's live delivery queue.
//!
//! Two update sources, one rule: fetch every order, keep `DELIVERING`,
//! newest first, replace the whole queue. Pull happens on screen focus and
//! manual refresh; push events on either order topic trigger the exact
//! same re-fetch. An order leaves the queue only because a re-fetch no
//! longer returns it - never by local removal - so multiple shippers
//! racing over the same order converge on whatever the server decided.

use std::sync::Arc;

use datmon_api::{ApiClient, ApiError, PushEvent, PushSession};
use datmon_core::{Order, OrderId, OrderStatus};
use thiserror::Error;
use tokio::sync::{RwLock, broadcast, watch};
use tracing::{debug, info, instrument, warn};

/// Failures surfaced to the shipper screens.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The backend refused or the call failed. Shown as an alert; the
    /// order stays in the queue for retry.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// The live queue of deliverable orders.
///
/// Cheaply cloneable; screens read snapshots while the push listener
/// refreshes in the background. After [`FulfillmentFeed::stop`] no late
/// response is ever applied to the queue.
#[derive(Clone)]
pub struct FulfillmentFeed {
    inner: Arc<FeedInner>,
}

struct FeedInner {
    client: ApiClient,
    queue: RwLock<Vec<Order>>,
    stopped: watch::Sender<bool>,
}

impl FulfillmentFeed {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        let (stopped, _) = watch::channel(false);
        Self {
            inner: Arc::new(FeedInner {
                client,
                queue: RwLock::new(Vec::new()),
                stopped,
            }),
        }
    }

    /// Snapshot of the current queue, newest order first.
    pub async fn queue(&self) -> Vec<Order> {
        self.inner.queue.read().await.clone()
    }

    /// Whether the feed has been stopped.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *self.inner.stopped.borrow()
    }

    /// Re-fetch and replace the queue.
    ///
    /// If the feed was stopped while the fetch was in flight, the response
    /// is discarded instead of applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails; the previous queue stays.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), FeedError> {
        if self.is_stopped() {
            return Ok(());
        }

        let orders = self.inner.client.all_orders().await?;

        // Stopped while in flight: a stale response must not resurface.
        if self.is_stopped() {
            debug!("discarding feed response after stop");
            return Ok(());
        }

        let mut delivering: Vec<Order> = orders
            .into_iter()
            .filter(|o| o.status == OrderStatus::Delivering)
            .collect();
        // The backend lists oldest first; the shipper wants newest on top.
        delivering.reverse();

        debug!(count = delivering.len(), "feed refreshed");
        *self.inner.queue.write().await = delivering;
        Ok(())
    }

    /// Wire the feed to the push channel: any order-change event triggers
    /// an unconditional refresh. Runs until the feed is stopped or the
    /// push session shuts down.
    pub fn listen(&self, push: &PushSession) -> tokio::task::JoinHandle<()> {
        let feed = self.clone();
        let events = push.subscribe();
        tokio::spawn(feed.run_listener(events))
    }

    async fn run_listener(self, mut events: broadcast::Receiver<PushEvent>) {
        let mut stopped = self.inner.stopped.subscribe();
        loop {
            if *stopped.borrow() {
                return;
            }
            let event = tokio::select! {
                _ = stopped.changed() => return,
                event = events.recv() => event,
            };

            match event {
                Ok(PushEvent::Changed(topic)) => {
                    debug!(topic = ?topic, "push event, refreshing feed");
                    if let Err(e) = self.refresh().await {
                        warn!(error = %e, "push-triggered refresh failed");
                    }
                }
                Ok(PushEvent::Reconnected) => {
                    // Events may have been missed while disconnected.
                    info!("push channel back, refreshing feed");
                    if let Err(e) = self.refresh().await {
                        warn!(error = %e, "reconnect refresh failed");
                    }
                }
                Ok(PushEvent::ConnectionLost) => {
                    warn!("push channel lost, feed is pull-only until reconnect");
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    // Missed notifications collapse into one refresh.
                    warn!(missed, "feed listener lagged behind push events");
                    if let Err(e) = self.refresh().await {
                        warn!(error = %e, "lag refresh failed");
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return,
            }
        }
    }

    /// Finalize a delivery: request `DELIVERING -> DONE`, then re-fetch.
    ///
    /// On success the order disappears from the queue via the refresh. On
    /// failure the server's message is surfaced and the order stays queued
    /// for retry.
    ///
    /// # Errors
    ///
    /// Returns the backend's error verbatim.
    #[instrument(skip(self))]
    pub async fn complete_delivery(&self, order: OrderId) -> Result<(), FeedError> {
        self.inner
            .client
            .update_order_status(order, OrderStatus::Done)
            .await?;
        info!(order = %order, "delivery completed");

        // The refresh, not a local removal, is what drops the order.
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "refresh after completion failed");
        }
        Ok(())
    }

    /// Stop the feed: the listener exits and in-flight responses are
    /// discarded. Called on unmount/logout.
    pub fn stop(&self) {
        let _ = self.inner.stopped.send(true);
    }
}

impl std::fmt::Debug for FulfillmentFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FulfillmentFeed")
            .field("stopped", &self.is_stopped())
            .finish_non_exhaustive()
    }
}

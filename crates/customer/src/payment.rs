//! Online payment confirmation.
//!
//! After a PAYOS order is created the customer pays on an external page;
//! no push signal exists for "payment completed", so the client polls the
//! order until its status lands in the settled or failed set. The loop is
//! bounded twice over: at most 40 successful status fetches 1.5 s apart
//! (~a minute of polling), and at most 8 consecutive transient errors.
//! The two budgets are independent counters - errors do not consume
//! status-fetch attempts, and a successful fetch starts a fresh error
//! streak.
//!
//! The payment page itself is opened exactly once per attempt, however
//! many times the result screen re-renders or restarts its poller.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use datmon_api::ApiClient;
use datmon_core::{Order, OrderId};
use tokio::sync::watch;
use tracing::{info, instrument, warn};

/// Delay between status fetches.
pub const POLL_INTERVAL: Duration = Duration::from_millis(1500);

/// Successful status fetches before giving up.
pub const MAX_STATUS_CHECKS: u32 = 40;

/// Consecutive transient errors before giving up.
pub const MAX_CONSECUTIVE_ERRORS: u32 = 8;

/// Port to the platform's "open external URL" capability.
pub trait UrlOpener: Send + Sync {
    /// Open the URL in the external browser/webview. Failures are the
    /// platform's problem to display; the poller proceeds either way.
    fn open(&self, url: &str);
}

/// Terminal result of a confirmation poll.
#[derive(Debug, Clone)]
pub enum PaymentOutcome {
    /// The order reached a settled status. The cart has been cleared
    /// best-effort.
    Confirmed(Order),
    /// The order reached a failed status.
    Failed { message: String },
    /// Still pending after the full status-fetch budget.
    TimedOut { message: String },
    /// Too many consecutive transient errors; carries the last error's
    /// message.
    Error { message: String },
}

/// One payment flow for one order.
///
/// Holds the open-once guard, so it must outlive screen re-renders: create
/// it when the order is placed, keep it while the result screen is up, and
/// spawn a fresh poller from it on every mount.
#[derive(Clone)]
pub struct PaymentAttempt {
    inner: Arc<AttemptInner>,
}

struct AttemptInner {
    order_id: OrderId,
    payment_url: Option<String>,
    opened: AtomicBool,
}

impl PaymentAttempt {
    /// Create an attempt for an order and its payment URL (when one was
    /// issued).
    #[must_use]
    pub fn new(order_id: OrderId, payment_url: Option<String>) -> Self {
        Self {
            inner: Arc::new(AttemptInner {
                order_id,
                payment_url,
                opened: AtomicBool::new(false),
            }),
        }
    }

    /// The order under confirmation.
    #[must_use]
    pub fn order_id(&self) -> OrderId {
        self.inner.order_id
    }

    /// Open the payment page if it has not been opened yet.
    ///
    /// Returns whether this call performed the open. Subsequent calls (a
    /// re-rendered screen, a restarted poller) are no-ops.
    pub fn open_payment_page(&self, opener: &dyn UrlOpener) -> bool {
        let Some(url) = self.inner.payment_url.as_deref() else {
            return false;
        };
        if self.inner.opened.swap(true, Ordering::SeqCst) {
            return false;
        }
        info!(order = %self.inner.order_id, "opening payment page");
        opener.open(url);
        true
    }

    /// Open the payment page (once) and start the confirmation poll.
    #[must_use]
    pub fn spawn_poller(&self, client: ApiClient, opener: &dyn UrlOpener) -> PaymentPollHandle {
        self.spawn_poller_with_interval(client, opener, POLL_INTERVAL)
    }

    /// As [`PaymentAttempt::spawn_poller`], with an explicit poll cadence.
    #[must_use]
    pub fn spawn_poller_with_interval(
        &self,
        client: ApiClient,
        opener: &dyn UrlOpener,
        interval: Duration,
    ) -> PaymentPollHandle {
        self.open_payment_page(opener);

        let (outcome_tx, outcome_rx) = watch::channel(None);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let order_id = self.inner.order_id;

        tokio::spawn(run(client, order_id, interval, outcome_tx, cancel_rx));

        PaymentPollHandle {
            outcome: outcome_rx,
            cancel: cancel_tx,
        }
    }
}

impl std::fmt::Debug for PaymentAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentAttempt")
            .field("order_id", &self.inner.order_id)
            .field("opened", &self.inner.opened.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Handle to a running confirmation poll.
///
/// Dropping the handle cancels the poll: no further fetches are scheduled
/// and no timer outlives the screen that started it.
#[derive(Debug)]
pub struct PaymentPollHandle {
    outcome: watch::Receiver<Option<PaymentOutcome>>,
    cancel: watch::Sender<bool>,
}

impl PaymentPollHandle {
    /// Stop the poll. Idempotent.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    /// Wait for the terminal outcome.
    ///
    /// Returns `None` if the poll was cancelled before reaching one.
    pub async fn outcome(&mut self) -> Option<PaymentOutcome> {
        loop {
            if let Some(outcome) = self.outcome.borrow().clone() {
                return Some(outcome);
            }
            if self.outcome.changed().await.is_err() {
                // Task gone; report whatever it managed to publish.
                return self.outcome.borrow().clone();
            }
        }
    }
}

impl Drop for PaymentPollHandle {
    fn drop(&mut self) {
        let _ = self.cancel.send(true);
    }
}

/// The poll loop. Two independent budgets: `status_checks` counts
/// successful fetches only, `consecutive_errors` resets whenever a fetch
/// succeeds.
#[instrument(skip_all, fields(order = %order_id))]
async fn run(
    client: ApiClient,
    order_id: OrderId,
    interval: Duration,
    outcome: watch::Sender<Option<PaymentOutcome>>,
    mut cancel: watch::Receiver<bool>,
) {
    let mut status_checks: u32 = 0;
    let mut consecutive_errors: u32 = 0;

    loop {
        match client.order(order_id).await {
            Ok(order) => {
                consecutive_errors = 0;
                status_checks += 1;

                if order.status.is_settled() {
                    // Best-effort: a cart that refuses to clear does not
                    // block reporting a confirmed payment.
                    match client.clear_cart().await {
                        Ok(()) => client.session().set_cart_count(0),
                        Err(e) => {
                            warn!(error = %e, "cart clear after payment confirmation failed");
                        }
                    }
                    info!(status = %order.status, checks = status_checks, "payment confirmed");
                    let _ = outcome.send(Some(PaymentOutcome::Confirmed(order)));
                    return;
                }

                if order.status.is_failed() {
                    let _ = outcome.send(Some(PaymentOutcome::Failed {
                        message: "Thanh toán thất bại hoặc đã bị hủy".to_string(),
                    }));
                    return;
                }

                if status_checks >= MAX_STATUS_CHECKS {
                    let _ = outcome.send(Some(PaymentOutcome::TimedOut {
                        message: "Đang chờ xác nhận thanh toán, vui lòng kiểm tra lại sau"
                            .to_string(),
                    }));
                    return;
                }
            }
            Err(e) if e.is_transient() => {
                consecutive_errors += 1;
                warn!(error = %e, streak = consecutive_errors, "payment status fetch failed");
                if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                    let _ = outcome.send(Some(PaymentOutcome::Error {
                        message: e.to_string(),
                    }));
                    return;
                }
            }
            // Contract breakage is not worth retrying.
            Err(e) => {
                let _ = outcome.send(Some(PaymentOutcome::Error {
                    message: e.to_string(),
                }));
                return;
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = cancel.changed() => return,
        }
    }
}

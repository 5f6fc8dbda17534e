//! Shipper fulfillment feed: pull, push, and delivery completion.

use std::sync::Arc;
use std::time::Duration;

use datmon_api::{PushSession, PushSessionConfig, push::Topic};
use datmon_core::OrderStatus;
use datmon_integration_tests::{MockBackend, TestPushTransport, logged_in_client};
use datmon_shipper::FulfillmentFeed;

fn fast_push_config() -> PushSessionConfig {
    PushSessionConfig {
        heartbeat_interval: Duration::from_millis(50),
        liveness_window: Duration::from_secs(10),
        reconnect_backoff: Duration::from_millis(10),
        lost_threshold: 5,
    }
}

#[tokio::test]
async fn test_refresh_keeps_delivering_orders_newest_first() {
    let backend = MockBackend::spawn().await;
    let (client, _session) = logged_in_client(&backend).await;

    let first = backend
        .state()
        .seed_order(OrderStatus::Delivering, 50_000, "0901", "A");
    let _pending = backend
        .state()
        .seed_order(OrderStatus::Pending, 60_000, "0902", "B");
    let second = backend
        .state()
        .seed_order(OrderStatus::Delivering, 70_000, "0903", "C");

    let feed = FulfillmentFeed::new(client);
    feed.refresh().await.expect("refresh");

    let queue = feed.queue().await;
    let ids: Vec<_> = queue.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![second, first], "newest first, DELIVERING only");
}

#[tokio::test]
async fn test_complete_delivery_removes_order_via_refetch() {
    let backend = MockBackend::spawn().await;
    let (client, _session) = logged_in_client(&backend).await;

    let done_next = backend
        .state()
        .seed_order(OrderStatus::Delivering, 50_000, "0901", "A");
    let stays = backend
        .state()
        .seed_order(OrderStatus::Delivering, 60_000, "0902", "B");

    let feed = FulfillmentFeed::new(client);
    feed.refresh().await.expect("refresh");
    assert_eq!(feed.queue().await.len(), 2);

    feed.complete_delivery(done_next).await.expect("complete");

    assert_eq!(backend.state().order_status(done_next), Some(OrderStatus::Done));
    let ids: Vec<_> = feed.queue().await.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![stays]);
}

#[tokio::test]
async fn test_complete_delivery_failure_keeps_order_queued() {
    let backend = MockBackend::spawn().await;
    let (client, _session) = logged_in_client(&backend).await;

    let order = backend
        .state()
        .seed_order(OrderStatus::Delivering, 50_000, "0901", "A");

    let feed = FulfillmentFeed::new(client);
    feed.refresh().await.expect("refresh");

    backend.state().fail_next_status_update("Lỗi hệ thống, thử lại sau");
    let err = feed
        .complete_delivery(order)
        .await
        .expect_err("server refuses");

    assert_eq!(err.to_string(), "Lỗi hệ thống, thử lại sau");
    assert_eq!(
        backend.state().order_status(order),
        Some(OrderStatus::Delivering)
    );
    // Still visible, still retryable.
    assert_eq!(feed.queue().await.len(), 1);
}

#[tokio::test]
async fn test_push_event_triggers_full_refetch() {
    let backend = MockBackend::spawn().await;
    let (client, session) = logged_in_client(&backend).await;

    let transport = Arc::new(TestPushTransport::default());
    let push = PushSession::spawn(
        Arc::clone(&transport) as _,
        session,
        fast_push_config(),
    );

    let feed = FulfillmentFeed::new(client);
    let listener = feed.listen(&push);

    // A new delivery appears server-side; the kitchen topic announces it.
    let order = backend
        .state()
        .seed_order(OrderStatus::Delivering, 50_000, "0901", "A");
    // Give the session a moment to establish the subscription.
    tokio::time::sleep(Duration::from_millis(50)).await;
    transport.emit_event(Topic::KitchenFinished);

    let mut surfaced = false;
    for _ in 0..200 {
        if feed.queue().await.iter().any(|o| o.id == order) {
            surfaced = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(surfaced, "push-triggered refresh must surface the order");

    feed.stop();
    let _ = listener.await;
    push.shutdown().await;
}

#[tokio::test]
async fn test_stopped_feed_discards_refreshes() {
    let backend = MockBackend::spawn().await;
    let (client, _session) = logged_in_client(&backend).await;

    backend
        .state()
        .seed_order(OrderStatus::Delivering, 50_000, "0901", "A");

    let feed = FulfillmentFeed::new(client);
    feed.stop();

    // The screen is gone; a refresh arriving after must not apply.
    feed.refresh().await.expect("refresh is a no-op");
    assert!(feed.queue().await.is_empty());
}

#[tokio::test]
async fn test_repeated_connect_failures_surface_connection_lost() {
    let backend = MockBackend::spawn().await;
    let (_client, session) = logged_in_client(&backend).await;

    let transport = Arc::new(TestPushTransport::default());
    transport.refuse_next_connects(5);

    let push = PushSession::spawn(Arc::clone(&transport) as _, session, fast_push_config());
    let mut events = push.subscribe();

    let event = events.recv().await.expect("event");
    assert_eq!(event, datmon_api::PushEvent::ConnectionLost);

    // The session keeps retrying and eventually comes back.
    let event = events.recv().await.expect("event");
    assert_eq!(event, datmon_api::PushEvent::Reconnected);

    push.shutdown().await;
}

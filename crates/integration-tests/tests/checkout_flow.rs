//! End-to-end checkout: cart to placed order against the mock backend.

use datmon_core::{OrderStatus, PaymentMethod, ProductId, ShippingProfile};
use datmon_customer::{Cart, Checkout, CheckoutError, Placement};
use datmon_integration_tests::{MockBackend, client_for, logged_in_client};

fn valid_shipping() -> ShippingProfile {
    ShippingProfile {
        phone: "0901234567".to_string(),
        address_line: "12 Lý Tự Trọng".to_string(),
        city: "Đà Nẵng".to_string(),
        note: String::new(),
    }
}

#[tokio::test]
async fn test_cod_placement_happy_path() {
    let backend = MockBackend::spawn().await;
    backend.state().seed_product(1, "Cơm tấm sườn", 45_000);
    let (client, session) = client_for(&backend);

    // Real login: token extraction plus session persistence.
    let auth = client.login("ngocanh", "hunter2").await.expect("login");
    assert_eq!(auth.username, "ngocanh");
    assert!(session.is_authenticated().await);

    let mut cart = Cart::new(client.clone(), datmon_core::MembershipRank::Bac);
    cart.add_item(ProductId::new(1), 2).await.expect("add");
    assert_eq!(session.cart_count(), 2);

    let placement = Checkout::new(client.clone())
        .place_order(&mut cart, &valid_shipping(), PaymentMethod::Cod)
        .await
        .expect("place order");

    let Placement::Cod { order } = placement else {
        panic!("COD placement expected");
    };
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_method, PaymentMethod::Cod);
    assert_eq!(order.total, datmon_core::Vnd::new(90_000));

    // Side effects: cart cleared server-side, badge reset.
    assert!(backend.state().cart_items().is_empty());
    assert!(cart.is_empty());
    assert_eq!(session.cart_count(), 0);
}

#[tokio::test]
async fn test_placement_refused_without_shipping_makes_no_call() {
    let backend = MockBackend::spawn().await;
    backend.state().seed_product(1, "Phở bò", 55_000);
    let (client, _session) = logged_in_client(&backend).await;

    let mut cart = Cart::new(client.clone(), datmon_core::MembershipRank::Dong);
    cart.add_item(ProductId::new(1), 1).await.expect("add");

    let hits_before = backend.state().total_hits();
    let err = Checkout::new(client)
        .place_order(&mut cart, &ShippingProfile::default(), PaymentMethod::Cod)
        .await
        .expect_err("must refuse");

    assert!(matches!(err, CheckoutError::ShippingIncomplete));
    assert_eq!(
        backend.state().total_hits(),
        hits_before,
        "refusal must not touch the network"
    );
    // The cart is untouched and the screen can retry.
    assert_eq!(cart.unit_count(), 1);
}

#[tokio::test]
async fn test_placement_refused_with_empty_cart() {
    let backend = MockBackend::spawn().await;
    let (client, _session) = logged_in_client(&backend).await;

    let mut cart = Cart::new(client.clone(), datmon_core::MembershipRank::Dong);
    let hits_before = backend.state().total_hits();

    let err = Checkout::new(client)
        .place_order(&mut cart, &valid_shipping(), PaymentMethod::Cod)
        .await
        .expect_err("must refuse");

    assert!(matches!(err, CheckoutError::EmptyCart));
    assert_eq!(backend.state().total_hits(), hits_before);
}

#[tokio::test]
async fn test_order_failure_surfaces_server_message_and_keeps_cart() {
    let backend = MockBackend::spawn().await;
    backend.state().seed_product(1, "Bún chả", 40_000);
    let (client, session) = logged_in_client(&backend).await;

    let mut cart = Cart::new(client.clone(), datmon_core::MembershipRank::Dong);
    cart.add_item(ProductId::new(1), 1).await.expect("add");

    backend.state().fail_next_order("Món này đã hết hàng");
    let err = Checkout::new(client)
        .place_order(&mut cart, &valid_shipping(), PaymentMethod::Cod)
        .await
        .expect_err("server refuses");

    // Verbatim server message, and everything re-actionable.
    assert_eq!(err.to_string(), "Món này đã hết hàng");
    assert_eq!(cart.unit_count(), 1);
    assert_eq!(backend.state().cart_items().len(), 1);
    assert_eq!(session.cart_count(), 1);
}

#[tokio::test]
async fn test_payos_placement_returns_payment_url_and_keeps_cart() {
    let backend = MockBackend::spawn().await;
    backend.state().seed_product(1, "Gà rán", 65_000);
    let (client, session) = logged_in_client(&backend).await;

    let mut cart = Cart::new(client.clone(), datmon_core::MembershipRank::Dong);
    cart.add_item(ProductId::new(1), 1).await.expect("add");

    let placement = Checkout::new(client)
        .place_order(&mut cart, &valid_shipping(), PaymentMethod::PayOs)
        .await
        .expect("place order");

    let Placement::PendingPayment { order, payment_url } = placement else {
        panic!("online placement expected");
    };
    assert_eq!(payment_url, format!("https://pay.payos.vn/web/{}", order.id));
    // The cart is cleared only once payment confirms.
    assert_eq!(backend.state().cart_items().len(), 1);
    assert_eq!(session.cart_count(), 1);
}

#[tokio::test]
async fn test_cancel_allowed_only_before_kitchen() {
    let backend = MockBackend::spawn().await;
    let (client, _session) = logged_in_client(&backend).await;
    let checkout = Checkout::new(client.clone());

    let pending = backend
        .state()
        .seed_order(OrderStatus::Pending, 50_000, "0901", "addr");
    let delivering = backend
        .state()
        .seed_order(OrderStatus::Delivering, 50_000, "0901", "addr");

    let cancelled = checkout
        .cancel(&client.order(pending).await.expect("fetch"))
        .await
        .expect("cancel pending");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let order = client.order(delivering).await.expect("fetch");
    let hits_before = backend.state().hits_matching("POST /api/orders");
    let err = checkout.cancel(&order).await.expect_err("must refuse");
    assert!(matches!(err, CheckoutError::NotCancellable(_)));
    assert_eq!(
        backend.state().hits_matching("POST /api/orders"),
        hits_before,
        "refusal must not reach the cancel endpoint"
    );
    assert_eq!(
        backend.state().order_status(delivering),
        Some(OrderStatus::Delivering)
    );
}

#[tokio::test]
async fn test_bearer_token_is_injected() {
    let backend = MockBackend::spawn().await;
    let (client, _session) = client_for(&backend);

    client.login("ngocanh", "hunter2").await.expect("login");
    let _ = client.cart().await.expect("cart");

    assert_eq!(
        backend.state().last_bearer().as_deref(),
        Some("Bearer tok-ngocanh")
    );
}

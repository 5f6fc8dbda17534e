//! Test support for the datmon client crates.
//!
//! Provides an in-process axum mock of the backend REST contract with
//! scriptable order-status sequences and per-route request counters, plus
//! an in-memory push transport. Tests drive the real client crates against
//! these, end to end, over loopback HTTP.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering as AtomicOrdering;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use datmon_api::{
    ApiClient, ApiConfig, PushFrame, PushTransport, SessionStore,
    push::{PushConnection, PushError, Topic},
    storage::InMemoryTokenStorage,
};
use datmon_core::{
    CartItem, CartItemId, Order, OrderId, OrderItem, OrderStatus, Product, ProductId,
    ShippingProfile, ShippingSnapshot, Vnd,
};
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;

// =============================================================================
// Mock backend
// =============================================================================

/// One scripted response for `GET /api/orders/{id}`.
#[derive(Debug, Clone, Copy)]
pub enum PollStep {
    /// Respond with the stored order, moved to this status.
    Status(OrderStatus),
    /// Respond with this HTTP error status.
    Error(u16),
}

/// Shared state behind the mock routes.
///
/// Tests seed products and orders, script poll responses, arm one-shot
/// failures, and read request counters back out.
#[derive(Default)]
pub struct BackendState {
    products: Mutex<HashMap<i64, Product>>,
    cart: Mutex<Vec<CartItem>>,
    next_cart_item_id: AtomicI64,
    orders: Mutex<HashMap<i64, Order>>,
    next_order_id: AtomicI64,
    poll_script: Mutex<VecDeque<PollStep>>,
    shipping: Mutex<ShippingProfile>,
    loyalty_points: Mutex<u32>,
    preview_discount: Mutex<i64>,
    fail_next_order: Mutex<Option<String>>,
    fail_next_status_update: Mutex<Option<String>>,
    hits: Mutex<HashMap<String, u32>>,
    last_bearer: Mutex<Option<String>>,
}

impl BackendState {
    /// Register a product the cart and order routes can price.
    pub fn seed_product(&self, id: i64, name: &str, price: i64) {
        self.products.lock().expect("lock").insert(
            id,
            Product {
                id: ProductId::new(id),
                name: name.to_string(),
                price: Vnd::new(price),
                category_id: 1.into(),
                description: None,
                image_url: None,
            },
        );
    }

    /// Create an order directly, bypassing the cart. Returns its id.
    pub fn seed_order(
        &self,
        status: OrderStatus,
        total: i64,
        phone: &str,
        address_line: &str,
    ) -> OrderId {
        let id = self.next_order_id.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        let order = Order {
            id: OrderId::new(id),
            items: Vec::new(),
            total: Vnd::new(total),
            payment_method: datmon_core::PaymentMethod::Cod,
            status,
            created_at: Utc::now(),
            shipping: ShippingSnapshot {
                phone: phone.to_string(),
                address_line: address_line.to_string(),
                city: "Đà Nẵng".to_string(),
            },
        };
        self.orders.lock().expect("lock").insert(id, order);
        OrderId::new(id)
    }

    /// Queue scripted responses for order fetches, consumed in order.
    pub fn script_poll(&self, steps: impl IntoIterator<Item = PollStep>) {
        self.poll_script.lock().expect("lock").extend(steps);
    }

    /// Make the next order creation fail with this message.
    pub fn fail_next_order(&self, message: &str) {
        *self.fail_next_order.lock().expect("lock") = Some(message.to_string());
    }

    /// Make the next status update fail with this message.
    pub fn fail_next_status_update(&self, message: &str) {
        *self.fail_next_status_update.lock().expect("lock") = Some(message.to_string());
    }

    /// The server-side discount the promotion preview answers with.
    pub fn set_preview_discount(&self, amount: i64) {
        *self.preview_discount.lock().expect("lock") = amount;
    }

    /// Loyalty points the profile route reports.
    pub fn set_loyalty_points(&self, points: u32) {
        *self.loyalty_points.lock().expect("lock") = points;
    }

    /// Stored status of an order.
    pub fn order_status(&self, id: OrderId) -> Option<OrderStatus> {
        self.orders
            .lock()
            .expect("lock")
            .get(&id.as_i64())
            .map(|o| o.status)
    }

    /// Current server-side cart.
    pub fn cart_items(&self) -> Vec<CartItem> {
        self.cart.lock().expect("lock").clone()
    }

    /// Requests whose `METHOD path` key starts with the prefix.
    pub fn hits_matching(&self, prefix: &str) -> u32 {
        self.hits
            .lock()
            .expect("lock")
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(_, count)| count)
            .sum()
    }

    /// Every request the backend has seen.
    pub fn total_hits(&self) -> u32 {
        self.hits.lock().expect("lock").values().sum()
    }

    /// The last `Authorization` header seen, if any.
    pub fn last_bearer(&self) -> Option<String> {
        self.last_bearer.lock().expect("lock").clone()
    }

    fn price_of(&self, product: i64) -> Vnd {
        self.products
            .lock()
            .expect("lock")
            .get(&product)
            .map_or(Vnd::new(10_000), |p| p.price)
    }

    fn name_of(&self, product: i64) -> String {
        self.products
            .lock()
            .expect("lock")
            .get(&product)
            .map_or_else(String::new, |p| p.name.clone())
    }
}

/// The running mock server.
pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
}

impl MockBackend {
    /// Bind an ephemeral port and serve the mock routes.
    pub async fn spawn() -> Self {
        let state = Arc::new(BackendState::default());
        let app = router(Arc::clone(&state));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self { addr, state }
    }

    /// Base URL for [`ApiConfig::for_base_url`].
    #[must_use]
    pub fn base_url(&self) -> Url {
        format!("http://{}/", self.addr).parse().expect("base url")
    }

    #[must_use]
    pub fn state(&self) -> &BackendState {
        &self.state
    }
}

/// Build a client + session pair pointed at the mock backend.
pub fn client_for(backend: &MockBackend) -> (ApiClient, SessionStore) {
    let session = SessionStore::new(InMemoryTokenStorage::default());
    let client = ApiClient::new(&ApiConfig::for_base_url(backend.base_url()), session.clone())
        .expect("api client");
    (client, session)
}

/// A client with an authenticated session, without a login round-trip.
pub async fn logged_in_client(backend: &MockBackend) -> (ApiClient, SessionStore) {
    let (client, session) = client_for(backend);
    session
        .set_auth("testuser", SecretString::from("tok-testuser".to_string()))
        .await
        .expect("persist session");
    (client, session)
}

// =============================================================================
// Routes
// =============================================================================

type AppState = Arc<BackendState>;

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(login))
        .route("/api/categories", get(categories))
        .route("/api/products", get(products))
        .route("/api/cart", get(get_cart).delete(clear_cart))
        .route("/api/cart/items", post(add_cart_item))
        .route("/api/cart/items/{id}", put(set_quantity).delete(remove_item))
        .route("/api/orders", post(create_order).get(all_orders))
        .route("/api/orders/mine", get(all_orders))
        .route("/api/orders/{id}", get(get_order))
        .route("/api/orders/{id}/cancel", post(cancel_order))
        .route("/api/orders/{id}/status", put(update_status))
        .route("/api/payments/link", post(payment_link))
        .route("/api/profile", get(get_profile))
        .route("/api/shipping-profile", get(get_shipping).put(put_shipping))
        .route("/api/promotions/preview", post(preview_promotion))
        .layer(middleware::from_fn_with_state(Arc::clone(&state), track))
        .with_state(state)
}

/// Count every request and remember the auth header.
async fn track(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let key = format!("{} {}", request.method(), request.uri().path());
    *state.hits.lock().expect("lock").entry(key).or_insert(0) += 1;

    if let Some(auth) = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        *state.last_bearer.lock().expect("lock") = Some(auth.to_string());
    }

    next.run(request).await
}

fn error_response(status: u16, message: &str) -> Response {
    let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (code, Json(json!({ "message": message }))).into_response()
}

fn cart_envelope(items: &[CartItem]) -> Response {
    Json(json!({ "items": items })).into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    let username = body
        .get("username")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if username.is_empty() {
        return error_response(400, "Thiếu tên đăng nhập");
    }
    Json(json!({ "token": format!("tok-{username}"), "username": username })).into_response()
}

async fn categories() -> Response {
    Json(json!([{ "id": 1, "name": "Cơm", "imageUrl": null }])).into_response()
}

async fn products(State(state): State<AppState>) -> Response {
    let products: Vec<Product> = state.products.lock().expect("lock").values().cloned().collect();
    Json(products).into_response()
}

async fn get_cart(State(state): State<AppState>) -> Response {
    cart_envelope(&state.cart_items())
}

async fn add_cart_item(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let product = body.get("productId").and_then(Value::as_i64).unwrap_or(0);
    let quantity = body.get("quantity").and_then(Value::as_u64).unwrap_or(0);
    if product == 0 || quantity == 0 {
        return error_response(400, "Sản phẩm hoặc số lượng không hợp lệ");
    }

    let price = state.price_of(product);
    let name = state.name_of(product);
    let mut cart = state.cart.lock().expect("lock");

    #[allow(clippy::cast_possible_truncation)]
    let quantity = quantity as u32;

    if let Some(line) = cart.iter_mut().find(|i| i.product_id.as_i64() == product) {
        line.quantity += quantity;
    } else {
        let id = state.next_cart_item_id.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        cart.push(CartItem {
            id: CartItemId::new(id),
            product_id: ProductId::new(product),
            product_name: name,
            unit_price: price,
            quantity,
        });
    }
    cart_envelope(cart.as_slice())
}

async fn set_quantity(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let quantity = body.get("quantity").and_then(Value::as_u64).unwrap_or(0);
    if quantity == 0 {
        return error_response(400, "Số lượng không hợp lệ");
    }

    let mut cart = state.cart.lock().expect("lock");
    let Some(line) = cart.iter_mut().find(|i| i.id.as_i64() == id) else {
        return error_response(404, "Không tìm thấy món trong giỏ");
    };
    #[allow(clippy::cast_possible_truncation)]
    {
        line.quantity = quantity as u32;
    }
    cart_envelope(cart.as_slice())
}

async fn remove_item(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let mut cart = state.cart.lock().expect("lock");
    cart.retain(|i| i.id.as_i64() != id);
    cart_envelope(cart.as_slice())
}

async fn clear_cart(State(state): State<AppState>) -> Response {
    state.cart.lock().expect("lock").clear();
    StatusCode::NO_CONTENT.into_response()
}

async fn create_order(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    if let Some(message) = state.fail_next_order.lock().expect("lock").take() {
        return error_response(400, &message);
    }

    let Some(lines) = body.get("items").and_then(Value::as_array) else {
        return error_response(400, "Thiếu danh sách món");
    };
    let method: datmon_core::PaymentMethod = body
        .get("paymentMethod")
        .and_then(Value::as_str)
        .map_or(datmon_core::PaymentMethod::Cod, |m| {
            if m == "PAYOS" {
                datmon_core::PaymentMethod::PayOs
            } else {
                datmon_core::PaymentMethod::Cod
            }
        });

    let mut items = Vec::new();
    for line in lines {
        let product = line.get("productId").and_then(Value::as_i64).unwrap_or(0);
        let quantity = line.get("quantity").and_then(Value::as_u64).unwrap_or(0);
        #[allow(clippy::cast_possible_truncation)]
        items.push(OrderItem {
            product_id: ProductId::new(product),
            product_name: state.name_of(product),
            unit_price: state.price_of(product),
            quantity: quantity as u32,
        });
    }
    let total: Vnd = items.iter().map(OrderItem::line_total).sum();

    let id = state.next_order_id.fetch_add(1, AtomicOrdering::SeqCst) + 1;
    let shipping = state.shipping.lock().expect("lock").clone();
    let order = Order {
        id: OrderId::new(id),
        items,
        total,
        payment_method: method,
        status: OrderStatus::Pending,
        created_at: Utc::now(),
        shipping: ShippingSnapshot {
            phone: shipping.phone,
            address_line: shipping.address_line,
            city: shipping.city,
        },
    };
    state.orders.lock().expect("lock").insert(id, order.clone());
    Json(order).into_response()
}

async fn all_orders(State(state): State<AppState>) -> Response {
    let mut orders: Vec<Order> = state.orders.lock().expect("lock").values().cloned().collect();
    // Stable, oldest first - the client reverses for newest-first display.
    orders.sort_by_key(|o| o.id);
    Json(orders).into_response()
}

async fn get_order(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let step = state.poll_script.lock().expect("lock").pop_front();
    match step {
        Some(PollStep::Error(status)) => error_response(status, "Máy chủ tạm thời gián đoạn"),
        Some(PollStep::Status(status)) => {
            let mut orders = state.orders.lock().expect("lock");
            let Some(order) = orders.get_mut(&id) else {
                return error_response(404, "Không tìm thấy đơn hàng");
            };
            order.status = status;
            Json(order.clone()).into_response()
        }
        None => match state.orders.lock().expect("lock").get(&id) {
            Some(order) => Json(order.clone()).into_response(),
            None => error_response(404, "Không tìm thấy đơn hàng"),
        },
    }
}

async fn cancel_order(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let mut orders = state.orders.lock().expect("lock");
    let Some(order) = orders.get_mut(&id) else {
        return error_response(404, "Không tìm thấy đơn hàng");
    };
    if !order.status.is_cancellable() {
        return error_response(400, "Không thể hủy đơn ở trạng thái này");
    }
    order.status = OrderStatus::Cancelled;
    Json(order.clone()).into_response()
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if let Some(message) = state.fail_next_status_update.lock().expect("lock").take() {
        return error_response(500, &message);
    }

    let Some(status) = body
        .get("status")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<OrderStatus>().ok())
    else {
        return error_response(400, "Trạng thái không hợp lệ");
    };

    let mut orders = state.orders.lock().expect("lock");
    let Some(order) = orders.get_mut(&id) else {
        return error_response(404, "Không tìm thấy đơn hàng");
    };
    order.status = status;
    Json(order.clone()).into_response()
}

async fn payment_link(Json(body): Json<Value>) -> Response {
    let order = body.get("orderId").and_then(Value::as_i64).unwrap_or(0);
    Json(json!({ "url": format!("https://pay.payos.vn/web/{order}") })).into_response()
}

async fn get_profile(State(state): State<AppState>) -> Response {
    let points = *state.loyalty_points.lock().expect("lock");
    Json(json!({ "username": "testuser", "loyaltyPoints": points })).into_response()
}

async fn get_shipping(State(state): State<AppState>) -> Response {
    Json(state.shipping.lock().expect("lock").clone()).into_response()
}

async fn put_shipping(
    State(state): State<AppState>,
    Json(profile): Json<ShippingProfile>,
) -> Response {
    *state.shipping.lock().expect("lock") = profile.clone();
    Json(profile).into_response()
}

async fn preview_promotion(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    if body.get("code").and_then(Value::as_str).unwrap_or("").is_empty() {
        return error_response(400, "Mã giảm giá không hợp lệ");
    }
    let discount = *state.preview_discount.lock().expect("lock");
    Json(json!({ "discount": discount })).into_response()
}

// =============================================================================
// In-memory push transport
// =============================================================================

/// Push transport for tests: every connection sees frames sent through
/// [`TestPushTransport::emit`].
pub struct TestPushTransport {
    frames: tokio::sync::broadcast::Sender<PushFrame>,
    refuse_connects: Mutex<u32>,
}

impl Default for TestPushTransport {
    fn default() -> Self {
        let (frames, _) = tokio::sync::broadcast::channel(32);
        Self {
            frames,
            refuse_connects: Mutex::new(0),
        }
    }
}

impl TestPushTransport {
    /// Broadcast a frame to every live connection.
    pub fn emit(&self, frame: PushFrame) {
        let _ = self.frames.send(frame);
    }

    /// Broadcast an event on a topic.
    pub fn emit_event(&self, topic: Topic) {
        self.emit(PushFrame::Event(topic));
    }

    /// Refuse the next `n` connection attempts.
    pub fn refuse_next_connects(&self, n: u32) {
        *self.refuse_connects.lock().expect("lock") = n;
    }
}

#[async_trait]
impl PushTransport for TestPushTransport {
    async fn connect(
        &self,
        _token: &SecretString,
    ) -> Result<Box<dyn PushConnection>, PushError> {
        {
            let mut refusals = self.refuse_connects.lock().expect("lock");
            if *refusals > 0 {
                *refusals -= 1;
                return Err(PushError::Connect("refused by test".to_string()));
            }
        }
        Ok(Box::new(TestPushConnection {
            frames: self.frames.subscribe(),
        }))
    }
}

struct TestPushConnection {
    frames: tokio::sync::broadcast::Receiver<PushFrame>,
}

#[async_trait]
impl PushConnection for TestPushConnection {
    async fn subscribe(&mut self, _topic: Topic) -> Result<(), PushError> {
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<PushFrame, PushError> {
        loop {
            match self.frames.recv().await {
                Ok(frame) => return Ok(frame),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    return Err(PushError::Dropped("test transport closed".to_string()));
                }
            }
        }
    }

    async fn send_heartbeat(&mut self) -> Result<(), PushError> {
        Ok(())
    }

    async fn close(&mut self) {}
}

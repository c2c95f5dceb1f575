//! In-process mock of the remote bookstore API.
//!
//! Implements just enough of the wire contract for the client tests: JWT
//! bearer auth with an expirable token set, cookie-scoped refresh, the cart
//! endpoints with server-computed totals, and the catalog/order endpoints.
//! Every endpoint counts its hits so tests can assert exactly which
//! requests were (or were not) issued.

#![allow(clippy::unwrap_used)]
#![allow(dead_code)] // each test binary uses a different slice of the mock

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;

use paperback_client::types::{Book, CartLine, CartSnapshot, Order};
use paperback_client::{BookstoreClient, ClientConfig};
use paperback_core::{BookId, Money, OrderId, OrderStatus, UserId};

type Shared = Arc<Mutex<ApiState>>;

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: i64,
    pub password: String,
    pub role: String,
    pub verified: bool,
}

#[derive(Default)]
pub struct ApiState {
    next_token: u64,
    next_order: i64,
    /// Valid access tokens mapped to the owning email.
    tokens: HashMap<String, String>,
    /// Valid refresh cookies mapped to the owning email.
    refresh_cookies: HashMap<String, String>,
    pub refresh_enabled: bool,
    pub users: HashMap<String, UserRecord>,
    pub books: Vec<Book>,
    /// user id -> ordered (book id, quantity) pairs
    pub carts: HashMap<i64, Vec<(i64, u32)>>,
    pub orders: Vec<(i64, Order)>,
    /// endpoint key -> hit count
    pub hits: HashMap<&'static str, u32>,
    pub fail_cart_fetch: bool,
    pub fail_cart_mutations: bool,
    pub fail_logout: bool,
}

impl ApiState {
    fn hit(&mut self, key: &'static str) {
        *self.hits.entry(key).or_insert(0) += 1;
    }

    fn issue_token(&mut self, email: &str) -> String {
        self.next_token += 1;
        let token = format!("tok-{}", self.next_token);
        self.tokens.insert(token.clone(), email.to_string());
        token
    }

    fn issue_refresh_cookie(&mut self, email: &str) -> String {
        let value = format!("rt-{email}");
        self.refresh_cookies.insert(value.clone(), email.to_string());
        value
    }

    fn book(&self, id: i64) -> Option<&Book> {
        self.books.iter().find(|b| b.id == BookId::new(id))
    }

    fn cart_snapshot(&self, user_id: i64) -> CartSnapshot {
        let lines: Vec<CartLine> = self
            .carts
            .get(&user_id)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|(book_id, quantity)| {
                        self.book(*book_id).map(|book| CartLine {
                            book_id: book.id,
                            title: book.title.clone(),
                            unit_price: book.price,
                            quantity: *quantity,
                            line_subtotal: book.price * *quantity,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let total_price: Money = lines.iter().map(|line| line.line_subtotal).sum();

        CartSnapshot {
            items: lines,
            total_price,
        }
    }
}

pub struct MockApi {
    pub addr: SocketAddr,
    pub state: Shared,
}

impl MockApi {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(ApiState {
            refresh_enabled: true,
            ..ApiState::default()
        }));

        let app = router(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// A fresh client pointed at this mock.
    pub fn client(&self) -> BookstoreClient {
        let config = ClientConfig::for_url(&self.url()).unwrap();
        BookstoreClient::new(&config).unwrap()
    }

    pub fn seed_user(&self, email: &str, password: &str, user_id: i64, role: &str) {
        self.state.lock().unwrap().users.insert(
            email.to_string(),
            UserRecord {
                user_id,
                password: password.to_string(),
                role: role.to_string(),
                verified: true,
            },
        );
    }

    pub fn seed_book(&self, id: i64, title: &str, price_cents: i64, stock: u32) {
        self.state.lock().unwrap().books.push(Book {
            id: BookId::new(id),
            title: title.to_string(),
            isbn: format!("97800000{id:05}"),
            category: "Science".to_string(),
            price: Money::new(Decimal::new(price_cents, 2)),
            publication_year: 2020,
            stock,
            authors: vec![],
            publisher: None,
        });
    }

    /// Invalidate every outstanding access token, as if they all expired.
    pub fn expire_tokens(&self) {
        self.state.lock().unwrap().tokens.clear();
    }

    pub fn set_refresh_enabled(&self, enabled: bool) {
        self.state.lock().unwrap().refresh_enabled = enabled;
    }

    pub fn set_fail_cart_fetch(&self, fail: bool) {
        self.state.lock().unwrap().fail_cart_fetch = fail;
    }

    pub fn set_fail_cart_mutations(&self, fail: bool) {
        self.state.lock().unwrap().fail_cart_mutations = fail;
    }

    pub fn set_fail_logout(&self, fail: bool) {
        self.state.lock().unwrap().fail_logout = fail;
    }

    pub fn hits(&self, key: &'static str) -> u32 {
        self.state
            .lock()
            .unwrap()
            .hits
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    /// The cart as the server sees it right now.
    pub fn server_cart(&self, user_id: i64) -> CartSnapshot {
        self.state.lock().unwrap().cart_snapshot(user_id)
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/verify-user", post(verify_user))
        .route("/auth/forgotpassword", post(forgot_password))
        .route("/auth/checkforgotpassword", post(reset_password))
        .route("/auth/me", get(me))
        .route("/auth/logout", post(logout))
        .route("/auth/refresh", post(refresh))
        .route("/books", get(list_books).post(create_book))
        .route("/books/search", get(search_books))
        .route("/books/{id}", get(get_book).put(update_book).delete(delete_book))
        .route("/cart/{user_id}", get(get_cart))
        .route("/cart/{user_id}/add", post(cart_add))
        .route("/cart/{user_id}/remove", delete(cart_remove))
        .route("/cart/{user_id}/decrement", post(cart_decrement))
        .route("/cart/{user_id}/clear", delete(cart_clear))
        .route("/cart/{user_id}/checkout", post(cart_checkout))
        .route("/orders/user/{user_id}", get(orders_for_user))
        .route("/orders/admin/all", get(all_orders))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/status", put(update_order_status))
        .with_state(state)
}

// =============================================================================
// Auth helpers
// =============================================================================

fn bearer_email(state: &ApiState, headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    state.tokens.get(token).cloned()
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

// =============================================================================
// Auth endpoints
// =============================================================================

async fn signup(State(state): State<Shared>, Json(body): Json<serde_json::Value>) -> Response {
    let mut state = state.lock().unwrap();
    state.hit("signup");

    let email = body["email"].as_str().unwrap_or_default().to_string();
    if state.users.contains_key(&email) {
        return (StatusCode::CONFLICT, "email already registered").into_response();
    }

    let user_id = 1000 + state.users.len() as i64;
    state.users.insert(
        email,
        UserRecord {
            user_id,
            password: body["password"].as_str().unwrap_or_default().to_string(),
            role: body["role"].as_str().unwrap_or("CUSTOMER").to_string(),
            verified: false,
        },
    );

    (StatusCode::CREATED, "User registered successfully").into_response()
}

async fn login(State(state): State<Shared>, Json(body): Json<serde_json::Value>) -> Response {
    let mut state = state.lock().unwrap();
    state.hit("login");

    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default();

    let Some(user) = state.users.get(&email).cloned() else {
        return (StatusCode::UNAUTHORIZED, "Invalid credentials").into_response();
    };
    if user.password != password {
        return (StatusCode::UNAUTHORIZED, "Invalid credentials").into_response();
    }
    if !user.verified {
        return (StatusCode::FORBIDDEN, "account not verified").into_response();
    }

    let token = state.issue_token(&email);
    let cookie = state.issue_refresh_cookie(&email);

    let mut response = Json(json!({
        "accessToken": token,
        "userId": user.user_id,
        "role": user.role,
    }))
    .into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&format!("refreshToken={cookie}; Path=/; HttpOnly")).unwrap(),
    );
    response
}

async fn verify_user(State(state): State<Shared>, Json(body): Json<serde_json::Value>) -> Response {
    let mut state = state.lock().unwrap();
    state.hit("verify");

    let token = body["token"].as_str().unwrap_or_default();
    if token == "000000" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "OTP expired"})),
        )
            .into_response();
    }

    for user in state.users.values_mut() {
        user.verified = true;
    }
    (StatusCode::OK, "The account is verified").into_response()
}

async fn forgot_password(
    State(state): State<Shared>,
    Json(_body): Json<serde_json::Value>,
) -> Response {
    state.lock().unwrap().hit("forgot_password");
    Json(json!({"message": "OTP sent"})).into_response()
}

async fn reset_password(
    State(state): State<Shared>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.hit("reset_password");

    if body["OTP"].as_str() == Some("000000") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "OTP expired"})),
        )
            .into_response();
    }

    let email = body["email"].as_str().unwrap_or_default().to_string();
    let new_password = body["newPassword"].as_str().unwrap_or_default().to_string();
    if let Some(user) = state.users.get_mut(&email) {
        user.password = new_password;
    }

    (StatusCode::OK, "Password reset").into_response()
}

async fn me(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = state.lock().unwrap();
    state.hit("me");

    match bearer_email(&state, &headers) {
        Some(email) => (StatusCode::OK, email).into_response(),
        None => unauthorized(),
    }
}

async fn logout(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = state.lock().unwrap();
    state.hit("logout");

    if state.fail_logout {
        return (StatusCode::INTERNAL_SERVER_ERROR, "logout failed").into_response();
    }

    if let Some(email) = bearer_email(&state, &headers) {
        state.tokens.retain(|_, owner| *owner != email);
        state.refresh_cookies.retain(|_, owner| *owner != email);
    }
    (StatusCode::OK, "logged out successfully").into_response()
}

async fn refresh(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = state.lock().unwrap();
    state.hit("refresh");

    if !state.refresh_enabled {
        return unauthorized();
    }

    let Some(cookie) = cookie_value(&headers, "refreshToken") else {
        return unauthorized();
    };
    let Some(email) = state.refresh_cookies.get(&cookie).cloned() else {
        return unauthorized();
    };

    let token = state.issue_token(&email);
    Json(json!({"accessToken": token})).into_response()
}

// =============================================================================
// Catalog endpoints
// =============================================================================

async fn list_books(State(state): State<Shared>) -> Response {
    let mut state = state.lock().unwrap();
    state.hit("books_list");
    Json(state.books.clone()).into_response()
}

async fn search_books(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.hit("books_search");

    let matches: Vec<Book> = state
        .books
        .iter()
        .filter(|book| {
            params.iter().all(|(key, value)| match key.as_str() {
                "title" => book.title.to_lowercase().contains(&value.to_lowercase()),
                "category" => book.category.eq_ignore_ascii_case(value),
                "isbn" => book.isbn.contains(value.as_str()),
                _ => true,
            })
        })
        .cloned()
        .collect();

    Json(matches).into_response()
}

async fn get_book(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut state = state.lock().unwrap();
    state.hit("books_get");

    match state.book(id) {
        Some(book) => Json(book.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "Book not found").into_response(),
    }
}

async fn create_book(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.hit("books_create");

    if bearer_email(&state, &headers).is_none() {
        return unauthorized();
    }

    let id = state.books.iter().map(|b| b.id.as_i64()).max().unwrap_or(0) + 1;
    let book = Book {
        id: BookId::new(id),
        title: body["title"].as_str().unwrap_or_default().to_string(),
        isbn: body["isbn"].as_str().unwrap_or_default().to_string(),
        category: body["category"].as_str().unwrap_or_default().to_string(),
        price: serde_json::from_value(body["price"].clone()).unwrap_or(Money::ZERO),
        publication_year: body["publicationYear"].as_i64().unwrap_or(2020) as i32,
        stock: body["stock"].as_u64().unwrap_or(0) as u32,
        authors: vec![],
        publisher: None,
    };
    state.books.push(book.clone());

    (StatusCode::CREATED, Json(book)).into_response()
}

async fn update_book(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.hit("books_update");

    if bearer_email(&state, &headers).is_none() {
        return unauthorized();
    }

    let price: Money = serde_json::from_value(body["price"].clone()).unwrap_or(Money::ZERO);
    let Some(book) = state.books.iter_mut().find(|b| b.id == BookId::new(id)) else {
        return (StatusCode::NOT_FOUND, "Book not found").into_response();
    };

    if let Some(title) = body["title"].as_str() {
        book.title = title.to_string();
    }
    book.price = price;
    let updated = book.clone();

    Json(updated).into_response()
}

async fn delete_book(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock().unwrap();
    state.hit("books_delete");

    if bearer_email(&state, &headers).is_none() {
        return unauthorized();
    }

    state.books.retain(|b| b.id != BookId::new(id));
    StatusCode::NO_CONTENT.into_response()
}

// =============================================================================
// Cart endpoints
// =============================================================================

async fn get_cart(
    State(state): State<Shared>,
    Path(user_id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock().unwrap();
    state.hit("cart_fetch");

    if bearer_email(&state, &headers).is_none() {
        return unauthorized();
    }
    if state.fail_cart_fetch {
        return (StatusCode::INTERNAL_SERVER_ERROR, "cart unavailable").into_response();
    }

    Json(state.cart_snapshot(user_id)).into_response()
}

async fn cart_add(
    State(state): State<Shared>,
    Path(user_id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock().unwrap();
    state.hit("cart_add");

    if bearer_email(&state, &headers).is_none() {
        return unauthorized();
    }
    if state.fail_cart_mutations {
        return (StatusCode::INTERNAL_SERVER_ERROR, "mutation failed").into_response();
    }

    let book_id: i64 = params.get("bookId").and_then(|v| v.parse().ok()).unwrap_or(0);
    let quantity: u32 = params.get("quantity").and_then(|v| v.parse().ok()).unwrap_or(1);

    let Some(book) = state.book(book_id).cloned() else {
        return (StatusCode::NOT_FOUND, "Book not found").into_response();
    };

    let cart = state.carts.entry(user_id).or_default();
    let held: u32 = cart
        .iter()
        .find(|(id, _)| *id == book_id)
        .map_or(0, |(_, q)| *q);
    if held + quantity > book.stock {
        return (StatusCode::BAD_REQUEST, "insufficient stock").into_response();
    }

    match cart.iter_mut().find(|(id, _)| *id == book_id) {
        Some((_, q)) => *q += quantity,
        None => cart.push((book_id, quantity)),
    }

    StatusCode::OK.into_response()
}

async fn cart_remove(
    State(state): State<Shared>,
    Path(user_id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock().unwrap();
    state.hit("cart_remove");

    if bearer_email(&state, &headers).is_none() {
        return unauthorized();
    }
    if state.fail_cart_mutations {
        return (StatusCode::INTERNAL_SERVER_ERROR, "mutation failed").into_response();
    }

    let book_id: i64 = params.get("bookId").and_then(|v| v.parse().ok()).unwrap_or(0);
    if let Some(cart) = state.carts.get_mut(&user_id) {
        cart.retain(|(id, _)| *id != book_id);
    }

    StatusCode::OK.into_response()
}

async fn cart_decrement(
    State(state): State<Shared>,
    Path(user_id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock().unwrap();
    state.hit("cart_decrement");

    if bearer_email(&state, &headers).is_none() {
        return unauthorized();
    }
    if state.fail_cart_mutations {
        return (StatusCode::INTERNAL_SERVER_ERROR, "mutation failed").into_response();
    }

    let book_id: i64 = params.get("bookId").and_then(|v| v.parse().ok()).unwrap_or(0);
    if let Some(cart) = state.carts.get_mut(&user_id) {
        if let Some((_, q)) = cart.iter_mut().find(|(id, _)| *id == book_id) {
            *q = q.saturating_sub(1);
        }
        cart.retain(|(_, q)| *q > 0);
    }

    StatusCode::OK.into_response()
}

async fn cart_clear(
    State(state): State<Shared>,
    Path(user_id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock().unwrap();
    state.hit("cart_clear");

    if bearer_email(&state, &headers).is_none() {
        return unauthorized();
    }

    state.carts.remove(&user_id);
    StatusCode::OK.into_response()
}

async fn cart_checkout(
    State(state): State<Shared>,
    Path(user_id): Path<i64>,
    headers: HeaderMap,
    Json(_payment): Json<serde_json::Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.hit("cart_checkout");

    if bearer_email(&state, &headers).is_none() {
        return unauthorized();
    }

    let snapshot = state.cart_snapshot(user_id);
    if snapshot.items.is_empty() {
        return (StatusCode::BAD_REQUEST, "cart is empty").into_response();
    }

    state.next_order += 1;
    let order_id = state.next_order;
    let order = Order {
        id: OrderId::new(order_id),
        status: OrderStatus::Pending,
        total_price: snapshot.total_price,
        created_at: Utc::now(),
        items: vec![],
    };
    state.orders.push((user_id, order));
    state.carts.remove(&user_id);

    (StatusCode::OK, format!("Order #{order_id} placed")).into_response()
}

// =============================================================================
// Order endpoints
// =============================================================================

async fn orders_for_user(
    State(state): State<Shared>,
    Path(user_id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock().unwrap();
    state.hit("orders_user");

    if bearer_email(&state, &headers).is_none() {
        return unauthorized();
    }

    let orders: Vec<Order> = state
        .orders
        .iter()
        .filter(|(owner, _)| *owner == user_id)
        .map(|(_, order)| order.clone())
        .collect();
    Json(orders).into_response()
}

async fn get_order(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock().unwrap();
    state.hit("orders_get");

    if bearer_email(&state, &headers).is_none() {
        return unauthorized();
    }

    match state
        .orders
        .iter()
        .find(|(_, order)| order.id == OrderId::new(id))
    {
        Some((_, order)) => Json(order.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "Order not found").into_response(),
    }
}

async fn all_orders(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = state.lock().unwrap();
    state.hit("orders_all");

    if bearer_email(&state, &headers).is_none() {
        return unauthorized();
    }

    let orders: Vec<Order> = state.orders.iter().map(|(_, o)| o.clone()).collect();
    Json(orders).into_response()
}

async fn update_order_status(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.hit("orders_update_status");

    if bearer_email(&state, &headers).is_none() {
        return unauthorized();
    }

    let status: OrderStatus = match serde_json::from_value(body["status"].clone()) {
        Ok(status) => status,
        Err(_) => return (StatusCode::BAD_REQUEST, "invalid status").into_response(),
    };

    match state
        .orders
        .iter_mut()
        .find(|(_, order)| order.id == OrderId::new(id))
    {
        Some((_, order)) => {
            order.status = status;
            StatusCode::OK.into_response()
        }
        None => (StatusCode::NOT_FOUND, "Order not found").into_response(),
    }
}

// =============================================================================
// Shared test helpers
// =============================================================================

/// A seeded user the scenarios log in as.
pub const EMAIL: &str = "a@x.com";
pub const PASSWORD: &str = "P@ssw0rd1";
pub const USER_ID: i64 = 1;

/// Start a mock with one verified customer and a couple of books.
pub async fn seeded_mock() -> MockApi {
    let mock = MockApi::start().await;
    mock.seed_user(EMAIL, PASSWORD, USER_ID, "CUSTOMER");
    mock.seed_book(42, "The Name of the Wind", 1250, 10);
    mock.seed_book(7, "A Brief History of Time", 999, 3);
    mock
}

/// Convenience: the `UserId` for the seeded customer.
pub fn seeded_user_id() -> UserId {
    UserId::new(USER_ID)
}

//! Wire types for the bookstore API.
//!
//! These mirror the JSON shapes the remote service produces and consumes.
//! Field names follow the service's camelCase convention via serde renames;
//! the Rust side stays snake_case.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use paperback_core::{BookId, Email, Money, OrderId, OrderStatus, UserId, UserRole};

// =============================================================================
// Catalog
// =============================================================================

/// A book author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Display name.
    pub name: String,
}

/// A book publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publisher {
    /// Display name.
    pub name: String,
}

/// A book in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Book identifier. The service spells this `bookID` on the wire.
    #[serde(rename = "bookID")]
    pub id: BookId,
    /// Title.
    pub title: String,
    /// ISBN-13, digits only.
    pub isbn: String,
    /// Category name (see `paperback_core::BOOK_CATEGORIES`).
    pub category: String,
    /// Unit price.
    pub price: Money,
    /// Year of publication.
    pub publication_year: i32,
    /// Copies currently in stock.
    pub stock: u32,
    /// Authors, possibly empty.
    #[serde(default)]
    pub authors: Vec<Author>,
    /// Publisher, when known.
    #[serde(default)]
    pub publisher: Option<Publisher>,
}

/// Payload for creating or replacing a book (admin).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub isbn: String,
    pub category: String,
    pub price: Money,
    pub publication_year: i32,
    pub stock: u32,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub publisher: Option<Publisher>,
}

/// The last-applied catalog search.
///
/// All fields are optional; empty strings are treated as unset. The filter
/// has no server-side persistence - it is serialized into query parameters
/// on each search call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub title: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub isbn: Option<String>,
}

impl CatalogFilter {
    /// Filter on title substring.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Filter on category.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Filter on author name.
    #[must_use]
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Filter on publisher name.
    #[must_use]
    pub fn publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    /// Filter on ISBN.
    #[must_use]
    pub fn isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = Some(isbn.into());
        self
    }

    /// Query parameters for the search endpoint; unset and empty fields are
    /// omitted.
    #[must_use]
    pub fn to_query(&self) -> Vec<(String, String)> {
        [
            ("title", &self.title),
            ("category", &self.category),
            ("author", &self.author),
            ("publisher", &self.publisher),
            ("isbn", &self.isbn),
        ]
        .into_iter()
        .filter_map(|(name, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| (name.to_string(), v.to_string()))
        })
        .collect()
    }

    /// Whether every field is unset or empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_query().is_empty()
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A single line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Book this line refers to.
    pub book_id: BookId,
    /// Title, denormalized by the service for display.
    pub title: String,
    /// Price per copy.
    pub unit_price: Money,
    /// Number of copies.
    pub quantity: u32,
    /// `unit_price * quantity`, computed by the service. Trusted, never
    /// recomputed locally.
    pub line_subtotal: Money,
}

/// Full cart state as of the last fetch.
///
/// Replaced wholesale after every mutating call; never patched
/// field-by-field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    /// Ordered cart lines. The service spells this `cartItems`.
    #[serde(rename = "cartItems", default)]
    pub items: Vec<CartLine>,
    /// Sum of line subtotals, computed by the service.
    #[serde(default)]
    pub total_price: Money,
}

impl CartSnapshot {
    /// The canonical empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Total number of copies across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }
}

/// Payment details submitted at checkout. Passed through to the service,
/// never stored.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub card_number: String,
    pub card_holder: String,
    /// Expiry in `MM/YY` form.
    pub expiry: String,
    pub cvv: String,
}

impl std::fmt::Debug for PaymentDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentDetails")
            .field("card_number", &"[REDACTED]")
            .field("card_holder", &self.card_holder)
            .field("expiry", &self.expiry)
            .field("cvv", &"[REDACTED]")
            .finish()
    }
}

// =============================================================================
// Auth
// =============================================================================

/// Login request body.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Successful login/refresh response.
///
/// `userId` and `role` are included by current service versions; older ones
/// return only the token, so both are tolerated as absent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtResponse {
    pub access_token: String,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub role: Option<UserRole>,
}

/// Signup request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    pub password: String,
    pub role: UserRole,
}

/// Email verification request body.
#[derive(Debug, Serialize)]
pub struct VerifyRequest<'a> {
    pub token: &'a str,
}

/// Forgotten-password OTP issuance request body.
#[derive(Debug, Serialize)]
pub struct ForgotPasswordRequest<'a> {
    pub email: &'a str,
}

/// Password reset request body. The service spells the code field `OTP`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest<'a> {
    pub email: &'a str,
    #[serde(rename = "OTP")]
    pub otp: &'a str,
    pub new_password: &'a str,
}

/// Logout request body. The id is omitted when unknown (cookie-derived
/// sessions); the service then falls back to the session cookie.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

// =============================================================================
// Orders
// =============================================================================

/// A line within an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub book_id: BookId,
    pub title: String,
    pub unit_price: Money,
    pub quantity: u32,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "orderID")]
    pub id: OrderId,
    pub status: OrderStatus,
    pub total_price: Money,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// Order status update request body (admin).
#[derive(Debug, Serialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// Date range for the sales report (admin).
#[derive(Debug, Clone, Copy)]
pub struct SalesReportQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl SalesReportQuery {
    /// Query parameters for the report endpoint.
    #[must_use]
    pub fn to_query(&self) -> Vec<(String, String)> {
        vec![
            ("startDate".to_string(), self.start_date.to_string()),
            ("endDate".to_string(), self.end_date.to_string()),
        ]
    }
}

/// One row of the sales report (admin).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReportRow {
    pub date: NaiveDate,
    pub revenue: Money,
    pub order_count: u64,
}

/// A top-customer report row (admin).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCustomer {
    pub email: Email,
    pub total_spent: Money,
    pub order_count: u64,
}

/// A top-selling-book report row (admin).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopBook {
    pub book_id: BookId,
    pub title: String,
    pub copies_sold: u64,
}

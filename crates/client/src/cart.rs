//! Server-authoritative shopping cart cache.
//!
//! The cache mirrors the remote cart for the current identity. Every
//! mutating operation is mutate-then-refetch: issue the mutating call, and
//! on success refetch the full [`CartSnapshot`] and swap it in atomically.
//! The client never computes its own post-mutation totals - it always
//! re-asks the service. On a failed mutation the previous snapshot is left
//! untouched and the failure propagates to the caller.
//!
//! Mutations are serialized through a single-flight lock so overlapping
//! calls cannot leave the snapshot reflecting anything but the last-issued
//! mutation.
//!
//! Read helpers ([`CartCache::is_in_cart`], [`CartCache::find_line`]) serve
//! the last-fetched snapshot without a network call; they can be stale
//! between a remote-side change and the next fetch, which is within this
//! client's freshness model ("as of last local mutation or load").

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, instrument};

use paperback_core::{BookId, Money, UserId};

use crate::error::ApiError;
use crate::session::SessionManager;
use crate::transport::Transport;
use crate::types::{CartLine, CartSnapshot, PaymentDetails};

/// Cart cache for the authenticated identity.
///
/// Cloning is cheap; clones share the snapshot and the mutation lock.
#[derive(Clone)]
pub struct CartCache {
    inner: Arc<CartInner>,
}

struct CartInner {
    transport: Transport,
    session: SessionManager,
    snapshot: RwLock<CartSnapshot>,
    /// Serializes mutate-then-refetch pairs: last-issued wins, not merely
    /// last-completed.
    mutation: tokio::sync::Mutex<()>,
}

impl CartCache {
    /// Create an empty cart cache bound to the given session.
    #[must_use]
    pub fn new(transport: Transport, session: SessionManager) -> Self {
        Self {
            inner: Arc::new(CartInner {
                transport,
                session,
                snapshot: RwLock::new(CartSnapshot::empty()),
                mutation: tokio::sync::Mutex::new(()),
            }),
        }
    }

    // =========================================================================
    // Reads (no network)
    // =========================================================================

    /// The last-fetched snapshot.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.inner
            .snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether the book appears in the last-fetched snapshot.
    #[must_use]
    pub fn is_in_cart(&self, book_id: BookId) -> bool {
        self.find_line(book_id).is_some()
    }

    /// The cart line for the book, if present in the last-fetched snapshot.
    #[must_use]
    pub fn find_line(&self, book_id: BookId) -> Option<CartLine> {
        self.inner
            .snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .items
            .iter()
            .find(|line| line.book_id == book_id)
            .cloned()
    }

    /// Total number of copies in the last-fetched snapshot.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.snapshot().item_count()
    }

    /// Server-reported total of the last-fetched snapshot.
    #[must_use]
    pub fn total_price(&self) -> Money {
        self.snapshot().total_price
    }

    // =========================================================================
    // Fetch
    // =========================================================================

    /// Refetch the cart from the service and replace the snapshot.
    ///
    /// On a failed fetch the snapshot is reset to canonical-empty rather
    /// than leaving stale lines visible, and the failure propagates.
    ///
    /// # Errors
    ///
    /// [`ApiError::NotAuthenticated`] without a request when no identity is
    /// held, otherwise the transport/service failure.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Result<CartSnapshot, ApiError> {
        let user_id = self.require_user()?;
        let _guard = self.inner.mutation.lock().await;
        self.refetch(user_id).await
    }

    // =========================================================================
    // Mutations (mutate-then-refetch)
    // =========================================================================

    /// Add `quantity` copies of a book to the cart.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] for a zero quantity and
    /// [`ApiError::NotAuthenticated`] with no identity (both without a
    /// request), otherwise the transport/service failure.
    #[instrument(skip(self), fields(book_id = %book_id, quantity))]
    pub async fn add_item(
        &self,
        book_id: BookId,
        quantity: u32,
    ) -> Result<CartSnapshot, ApiError> {
        if quantity == 0 {
            return Err(ApiError::validation("quantity must be at least 1"));
        }
        let user_id = self.require_user()?;
        let _guard = self.inner.mutation.lock().await;

        self.inner
            .transport
            .post_query(
                &format!("/cart/{user_id}/add"),
                &[
                    ("bookId".to_string(), book_id.to_string()),
                    ("quantity".to_string(), quantity.to_string()),
                ],
            )
            .await?;

        self.refetch(user_id).await
    }

    /// Remove a book's line from the cart entirely.
    ///
    /// # Errors
    ///
    /// [`ApiError::NotAuthenticated`] without a request when no identity is
    /// held, otherwise the transport/service failure.
    #[instrument(skip(self), fields(book_id = %book_id))]
    pub async fn remove_item(&self, book_id: BookId) -> Result<CartSnapshot, ApiError> {
        let user_id = self.require_user()?;
        let _guard = self.inner.mutation.lock().await;
        self.remove_line(user_id, book_id).await?;
        self.refetch(user_id).await
    }

    /// Decrease a book's quantity by one.
    ///
    /// A decrement at quantity one removes the line (it never underflows);
    /// decrementing a book that is not in the cached cart is rejected
    /// without a request.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] when the book is not in the cart and
    /// [`ApiError::NotAuthenticated`] with no identity (both without a
    /// request), otherwise the transport/service failure.
    #[instrument(skip(self), fields(book_id = %book_id))]
    pub async fn decrement_item(&self, book_id: BookId) -> Result<CartSnapshot, ApiError> {
        let user_id = self.require_user()?;
        let _guard = self.inner.mutation.lock().await;

        let line = self.find_line(book_id).ok_or_else(|| {
            ApiError::validation(format!("book {book_id} is not in the cart"))
        })?;

        if line.quantity <= 1 {
            self.remove_line(user_id, book_id).await?;
        } else {
            self.inner
                .transport
                .post_query(
                    &format!("/cart/{user_id}/decrement"),
                    &[("bookId".to_string(), book_id.to_string())],
                )
                .await?;
        }

        self.refetch(user_id).await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// [`ApiError::NotAuthenticated`] without a request when no identity is
    /// held, otherwise the transport/service failure.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<CartSnapshot, ApiError> {
        let user_id = self.require_user()?;
        let _guard = self.inner.mutation.lock().await;

        self.inner
            .transport
            .delete_query(&format!("/cart/{user_id}/clear"), &[])
            .await?;

        self.refetch(user_id).await
    }

    /// Check out the cart. On success the server-side cart is consumed by
    /// the order, so the snapshot resets to canonical-empty; the returned
    /// string is the service's confirmation message.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] for malformed payment details and
    /// [`ApiError::NotAuthenticated`] with no identity (both without a
    /// request), otherwise the transport/service failure (snapshot left
    /// untouched).
    #[instrument(skip(self, payment))]
    pub async fn checkout(&self, payment: &PaymentDetails) -> Result<String, ApiError> {
        validate_payment(payment)?;
        let user_id = self.require_user()?;
        let _guard = self.inner.mutation.lock().await;

        let confirmation = self
            .inner
            .transport
            .post_text(&format!("/cart/{user_id}/checkout"), payment)
            .await?;

        self.store(CartSnapshot::empty());
        debug!("checkout complete, cart reset");
        Ok(confirmation)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// The identity key for cart endpoints. Operations never attempt a
    /// request with a null identity key.
    fn require_user(&self) -> Result<UserId, ApiError> {
        self.inner
            .session
            .user_id()
            .ok_or(ApiError::NotAuthenticated)
    }

    async fn remove_line(&self, user_id: UserId, book_id: BookId) -> Result<(), ApiError> {
        self.inner
            .transport
            .delete_query(
                &format!("/cart/{user_id}/remove"),
                &[("bookId".to_string(), book_id.to_string())],
            )
            .await
    }

    async fn refetch(&self, user_id: UserId) -> Result<CartSnapshot, ApiError> {
        match self
            .inner
            .transport
            .get_json::<CartSnapshot>(&format!("/cart/{user_id}"), &[])
            .await
        {
            Ok(snapshot) => {
                self.store(snapshot.clone());
                Ok(snapshot)
            }
            Err(err) => {
                self.store(CartSnapshot::empty());
                Err(err)
            }
        }
    }

    fn store(&self, snapshot: CartSnapshot) {
        *self
            .inner
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}

fn validate_payment(payment: &PaymentDetails) -> Result<(), ApiError> {
    let digits = payment.card_number.chars().all(|c| c.is_ascii_digit());
    if !digits || payment.card_number.len() < 13 || payment.card_number.len() > 19 {
        return Err(ApiError::validation("card number must be 13-19 digits"));
    }

    if payment.card_holder.trim().is_empty() {
        return Err(ApiError::validation("card holder name is required"));
    }

    if !is_valid_expiry(&payment.expiry) {
        return Err(ApiError::validation("expiry must be in MM/YY format"));
    }

    let cvv_digits = payment.cvv.chars().all(|c| c.is_ascii_digit());
    if !cvv_digits || payment.cvv.len() < 3 || payment.cvv.len() > 4 {
        return Err(ApiError::validation("CVV must be 3 or 4 digits"));
    }

    Ok(())
}

fn is_valid_expiry(expiry: &str) -> bool {
    let Some((month, year)) = expiry.split_once('/') else {
        return false;
    };
    if month.len() != 2 || year.len() != 2 {
        return false;
    }
    let Ok(month) = month.parse::<u8>() else {
        return false;
    };
    (1..=12).contains(&month) && year.chars().all(|c| c.is_ascii_digit())
}

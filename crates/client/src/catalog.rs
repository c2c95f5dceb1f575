//! Read-mostly catalog cache.
//!
//! Listings and single-book lookups are cached in-memory via `moka`
//! (5-minute TTL). Search results are deliberately held in a separate
//! container from the unfiltered listing so a search never destroys it, and
//! search responses are not cached. A failed call surfaces the error and
//! leaves prior cached data intact; there is no retry or backoff.
//!
//! The create/update/delete operations are admin-gated and invalidate the
//! affected cache entries on success.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, instrument};

use paperback_core::BookId;

use crate::error::ApiError;
use crate::session::SessionManager;
use crate::transport::Transport;
use crate::types::{Book, CatalogFilter, NewBook};

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Books(Vec<Book>),
    Book(Box<Book>),
}

/// Catalog cache over the bookstore's book endpoints.
///
/// Cloning is cheap; clones share the cache and search results.
#[derive(Clone)]
pub struct CatalogCache {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    transport: Transport,
    session: SessionManager,
    cache: Cache<String, CacheValue>,
    /// Last search results, kept apart from the unfiltered listing.
    search_results: RwLock<Vec<Book>>,
}

impl CatalogCache {
    /// Create a catalog cache bound to the given session.
    #[must_use]
    pub fn new(transport: Transport, session: SessionManager) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(CatalogInner {
                transport,
                session,
                cache,
                search_results: RwLock::new(Vec::new()),
            }),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// The unfiltered book listing.
    ///
    /// # Errors
    ///
    /// Returns the transport/service failure; cached data is unaffected.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Book>, ApiError> {
        let cache_key = "books:all".to_string();

        if let Some(CacheValue::Books(books)) = self.inner.cache.get(&cache_key).await {
            debug!("cache hit for book listing");
            return Ok(books);
        }

        let books: Vec<Book> = self.inner.transport.get_json("/books", &[]).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Books(books.clone()))
            .await;

        Ok(books)
    }

    /// Search the catalog. Results replace the separate search container;
    /// the unfiltered listing cache is untouched. Searches are never cached.
    ///
    /// # Errors
    ///
    /// Returns the transport/service failure; the previous search results
    /// stay in place.
    #[instrument(skip(self, filter))]
    pub async fn search(&self, filter: &CatalogFilter) -> Result<Vec<Book>, ApiError> {
        let books: Vec<Book> = self
            .inner
            .transport
            .get_json("/books/search", &filter.to_query())
            .await?;

        *self
            .inner
            .search_results
            .write()
            .unwrap_or_else(PoisonError::into_inner) = books.clone();

        Ok(books)
    }

    /// Results of the most recent successful search (no network call).
    #[must_use]
    pub fn last_search_results(&self) -> Vec<Book> {
        self.inner
            .search_results
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Forget the held search results.
    pub fn clear_search_results(&self) {
        self.inner
            .search_results
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// A single book by id.
    ///
    /// # Errors
    ///
    /// [`ApiError::NotFound`] when the service does not know the id,
    /// otherwise the transport/service failure.
    #[instrument(skip(self), fields(book_id = %book_id))]
    pub async fn get_by_id(&self, book_id: BookId) -> Result<Book, ApiError> {
        let cache_key = format!("book:{book_id}");

        if let Some(CacheValue::Book(book)) = self.inner.cache.get(&cache_key).await {
            debug!("cache hit for book");
            return Ok(*book);
        }

        let book: Book = self
            .inner
            .transport
            .get_json(&format!("/books/{book_id}"), &[])
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Book(Box::new(book.clone())))
            .await;

        Ok(book)
    }

    // =========================================================================
    // Admin catalog management
    // =========================================================================

    /// Add a book to the catalog (admin only).
    ///
    /// # Errors
    ///
    /// [`ApiError::NotAuthenticated`]/[`ApiError::Unauthorized`] without a
    /// request when the role check fails, otherwise the transport/service
    /// failure.
    #[instrument(skip(self, book), fields(title = %book.title))]
    pub async fn create(&self, book: &NewBook) -> Result<Book, ApiError> {
        self.require_admin()?;

        let created: Book = self.inner.transport.post_json("/books", book).await?;

        self.inner.cache.invalidate("books:all").await;
        Ok(created)
    }

    /// Replace a book's details (admin only).
    ///
    /// # Errors
    ///
    /// [`ApiError::NotAuthenticated`]/[`ApiError::Unauthorized`] without a
    /// request when the role check fails, otherwise the transport/service
    /// failure.
    #[instrument(skip(self, book), fields(book_id = %book_id))]
    pub async fn update(&self, book_id: BookId, book: &NewBook) -> Result<Book, ApiError> {
        self.require_admin()?;

        let updated: Book = self
            .inner
            .transport
            .put_json(&format!("/books/{book_id}"), book)
            .await?;

        self.invalidate(book_id).await;
        Ok(updated)
    }

    /// Remove a book from the catalog (admin only).
    ///
    /// # Errors
    ///
    /// [`ApiError::NotAuthenticated`]/[`ApiError::Unauthorized`] without a
    /// request when the role check fails, otherwise the transport/service
    /// failure.
    #[instrument(skip(self), fields(book_id = %book_id))]
    pub async fn delete(&self, book_id: BookId) -> Result<(), ApiError> {
        self.require_admin()?;

        self.inner
            .transport
            .delete_query(&format!("/books/{book_id}"), &[])
            .await?;

        self.invalidate(book_id).await;
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn invalidate(&self, book_id: BookId) {
        self.inner.cache.invalidate("books:all").await;
        self.inner.cache.invalidate(&format!("book:{book_id}")).await;
    }

    fn require_admin(&self) -> Result<(), ApiError> {
        let identity = self
            .inner
            .session
            .identity()
            .ok_or(ApiError::NotAuthenticated)?;

        if identity.role.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Unauthorized("admin role required".to_string()))
        }
    }
}

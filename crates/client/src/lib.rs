//! Paperback API client.
//!
//! A typed client for the remote bookstore HTTP API: authentication and
//! session lifecycle, a server-authoritative shopping cart cache, a
//! read-mostly catalog cache, and order history.
//!
//! # Architecture
//!
//! - The remote service is the source of truth. Every cart mutation is a
//!   round-trip followed by a full refetch of the cart; the client never
//!   computes its own totals.
//! - The bearer credential lives in an injectable [`TokenStore`] and is
//!   never persisted - a new process always starts unauthenticated.
//! - [`Transport`] attaches the credential to every request and performs a
//!   single refresh-and-retry when the service answers 401.
//! - Catalog reads are cached in-memory via `moka` (5 minute TTL); search
//!   results are kept apart from the unfiltered listing.
//!
//! # Example
//!
//! ```rust,ignore
//! use paperback_client::{BookstoreClient, ClientConfig};
//!
//! let client = BookstoreClient::from_env()?;
//!
//! // Re-attach a cookie-backed session from a previous login, if any
//! client.session().bootstrap().await;
//!
//! let identity = client.session().login("a@x.com", "P@ssw0rd1").await?;
//!
//! let books = client.catalog().list_all().await?;
//! client.cart().add_item(books[0].id, 2).await?;
//! let confirmation = client.cart().checkout(&payment).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod orders;
pub mod session;
pub mod token;
pub mod transport;
pub mod types;

pub use cart::CartCache;
pub use catalog::CatalogCache;
pub use config::{ClientConfig, ConfigError};
pub use error::ApiError;
pub use orders::OrdersClient;
pub use session::{Identity, SessionManager, SessionState, SignupForm};
pub use token::TokenStore;
pub use transport::Transport;
pub use types::*;

/// Facade over the client components, wired to a single remote service.
///
/// Cloning is cheap; clones share the session, token store, and caches.
#[derive(Clone)]
pub struct BookstoreClient {
    session: SessionManager,
    cart: CartCache,
    catalog: CatalogCache,
    orders: OrdersClient,
}

impl BookstoreClient {
    /// Build a client from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let tokens = TokenStore::new();
        let transport = Transport::new(config, tokens.clone())?;
        let session = SessionManager::new(transport.clone(), tokens);
        let cart = CartCache::new(transport.clone(), session.clone());
        let catalog = CatalogCache::new(transport.clone(), session.clone());
        let orders = OrdersClient::new(transport, session.clone());

        Ok(Self {
            session,
            cart,
            catalog,
            orders,
        })
    }

    /// Build a client from environment variables (see [`ClientConfig`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be constructed.
    pub fn from_env() -> Result<Self, ApiError> {
        let config = ClientConfig::from_env()?;
        Self::new(&config)
    }

    /// Session manager: login, signup, verification, logout.
    #[must_use]
    pub const fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Cart cache for the current identity.
    #[must_use]
    pub const fn cart(&self) -> &CartCache {
        &self.cart
    }

    /// Catalog cache: listings, search, admin catalog management.
    #[must_use]
    pub const fn catalog(&self) -> &CatalogCache {
        &self.catalog
    }

    /// Order history and admin order management.
    #[must_use]
    pub const fn orders(&self) -> &OrdersClient {
        &self.orders
    }
}

//! Order history and admin order management.
//!
//! Orders change server-side (status transitions, fulfillment) without the
//! client's involvement, so nothing here is cached - every call is a plain
//! request/parse with the shared error mapping.

use std::sync::Arc;

use tracing::instrument;

use paperback_core::{OrderId, OrderStatus, UserId};

use crate::error::ApiError;
use crate::session::SessionManager;
use crate::transport::Transport;
use crate::types::{
    Order, SalesReportQuery, SalesReportRow, TopBook, TopCustomer, UpdateOrderStatusRequest,
};

/// Client for the order endpoints.
#[derive(Clone)]
pub struct OrdersClient {
    inner: Arc<OrdersInner>,
}

struct OrdersInner {
    transport: Transport,
    session: SessionManager,
}

impl OrdersClient {
    /// Create an orders client bound to the given session.
    #[must_use]
    pub fn new(transport: Transport, session: SessionManager) -> Self {
        Self {
            inner: Arc::new(OrdersInner { transport, session }),
        }
    }

    /// The authenticated user's order history, most recent first.
    ///
    /// # Errors
    ///
    /// [`ApiError::NotAuthenticated`] without a request when no identity
    /// (with a known id) is held, otherwise the transport/service failure.
    #[instrument(skip(self))]
    pub async fn history(&self) -> Result<Vec<Order>, ApiError> {
        let user_id = self.require_user()?;
        self.inner
            .transport
            .get_json(&format!("/orders/user/{user_id}"), &[])
            .await
    }

    /// A single order's details.
    ///
    /// # Errors
    ///
    /// [`ApiError::NotFound`] for an unknown id, otherwise the
    /// transport/service failure.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get(&self, order_id: OrderId) -> Result<Order, ApiError> {
        self.inner
            .transport
            .get_json(&format!("/orders/{order_id}"), &[])
            .await
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// Every order in the store (admin only).
    ///
    /// # Errors
    ///
    /// [`ApiError::NotAuthenticated`]/[`ApiError::Unauthorized`] without a
    /// request when the role check fails, otherwise the transport/service
    /// failure.
    #[instrument(skip(self))]
    pub async fn all(&self) -> Result<Vec<Order>, ApiError> {
        self.require_admin()?;
        self.inner.transport.get_json("/orders/admin/all", &[]).await
    }

    /// Move an order to a new status (admin only).
    ///
    /// # Errors
    ///
    /// [`ApiError::NotAuthenticated`]/[`ApiError::Unauthorized`] without a
    /// request when the role check fails, otherwise the transport/service
    /// failure.
    #[instrument(skip(self), fields(order_id = %order_id, status = %status))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), ApiError> {
        self.require_admin()?;
        self.inner
            .transport
            .put_empty(
                &format!("/orders/{order_id}/status"),
                &UpdateOrderStatusRequest { status },
            )
            .await
    }

    /// Per-day sales figures for a date range (admin only).
    ///
    /// # Errors
    ///
    /// [`ApiError::NotAuthenticated`]/[`ApiError::Unauthorized`] without a
    /// request when the role check fails, otherwise the transport/service
    /// failure.
    #[instrument(skip(self))]
    pub async fn sales_report(
        &self,
        query: &SalesReportQuery,
    ) -> Result<Vec<SalesReportRow>, ApiError> {
        self.require_admin()?;
        self.inner
            .transport
            .get_json("/orders/admin/reports/sales", &query.to_query())
            .await
    }

    /// Customers ranked by lifetime spend (admin only).
    ///
    /// # Errors
    ///
    /// [`ApiError::NotAuthenticated`]/[`ApiError::Unauthorized`] without a
    /// request when the role check fails, otherwise the transport/service
    /// failure.
    #[instrument(skip(self))]
    pub async fn top_customers(&self) -> Result<Vec<TopCustomer>, ApiError> {
        self.require_admin()?;
        self.inner
            .transport
            .get_json("/orders/admin/reports/top-customers", &[])
            .await
    }

    /// Books ranked by copies sold (admin only).
    ///
    /// # Errors
    ///
    /// [`ApiError::NotAuthenticated`]/[`ApiError::Unauthorized`] without a
    /// request when the role check fails, otherwise the transport/service
    /// failure.
    #[instrument(skip(self))]
    pub async fn top_books(&self) -> Result<Vec<TopBook>, ApiError> {
        self.require_admin()?;
        self.inner
            .transport
            .get_json("/orders/admin/reports/top-books", &[])
            .await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn require_user(&self) -> Result<UserId, ApiError> {
        self.inner
            .session
            .user_id()
            .ok_or(ApiError::NotAuthenticated)
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::session::{Identity, SessionState};
    use crate::token::TokenStore;
    use paperback_core::{Email, UserRole};

    fn orders() -> OrdersClient {
        let tokens = TokenStore::new();
        let config = ClientConfig::for_url("http://localhost:8080").unwrap();
        let transport = Transport::new(&config, tokens.clone()).unwrap();
        let session = SessionManager::new(transport.clone(), tokens);
        OrdersClient::new(transport, session)
    }

    #[tokio::test]
    async fn test_history_requires_identity() {
        let orders = orders();
        assert!(matches!(
            orders.history().await,
            Err(ApiError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_admin_endpoints_gated_locally() {
        let orders = orders();

        assert!(matches!(
            orders.all().await,
            Err(ApiError::NotAuthenticated)
        ));

        orders
            .inner
            .session
            .force_state(SessionState::Authenticated(Identity {
                email: Email::parse("a@x.com").unwrap(),
                user_id: Some(UserId::new(1)),
                role: UserRole::Customer,
            }));

        assert!(matches!(
            orders.all().await,
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(
            orders
                .update_status(OrderId::new(1), OrderStatus::Shipped)
                .await,
            Err(ApiError::Unauthorized(_))
        ));
    }
}

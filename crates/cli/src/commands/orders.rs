//! Order commands: history for customers, management and reports for
//! admins.

use chrono::NaiveDate;
use clap::Subcommand;

use paperback_client::types::{Order, SalesReportQuery};
use paperback_core::{OrderId, OrderStatus};

use super::{CliError, Credentials, authenticated_client};

#[derive(Subcommand)]
pub enum OrdersAction {
    /// Your order history
    History,
    /// Show one order
    Show {
        /// Order id
        id: OrderId,
    },
    /// Every order in the store (admin)
    All,
    /// Move an order to a new status (admin)
    SetStatus {
        /// Order id
        id: OrderId,

        /// New status (PENDING, PROCESSING, SHIPPED, COMPLETED, CANCELLED)
        status: OrderStatus,
    },
    /// Per-day sales figures (admin)
    SalesReport {
        /// First day of the range (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,

        /// Last day of the range (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,
    },
    /// Customers ranked by lifetime spend (admin)
    TopCustomers,
    /// Books ranked by copies sold (admin)
    TopBooks,
}

pub async fn run(action: OrdersAction, credentials: &Credentials) -> Result<(), CliError> {
    let client = authenticated_client(credentials).await?;

    match action {
        OrdersAction::History => {
            let orders = client.orders().history().await?;
            print_orders(&orders);
        }
        OrdersAction::Show { id } => {
            let order = client.orders().get(id).await?;
            print_order(&order);
        }
        OrdersAction::All => {
            let orders = client.orders().all().await?;
            print_orders(&orders);
        }
        OrdersAction::SetStatus { id, status } => {
            client.orders().update_status(id, status).await?;
            tracing::info!("Order #{id} moved to {status}");
        }
        OrdersAction::SalesReport { from, to } => {
            let rows = client
                .orders()
                .sales_report(&SalesReportQuery {
                    start_date: from,
                    end_date: to,
                })
                .await?;
            print_sales_report(&rows);
        }
        OrdersAction::TopCustomers => {
            let rows = client.orders().top_customers().await?;
            print_top_customers(&rows);
        }
        OrdersAction::TopBooks => {
            let rows = client.orders().top_books().await?;
            print_top_books(&rows);
        }
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_orders(orders: &[Order]) {
    if orders.is_empty() {
        println!("(no orders)");
        return;
    }
    for order in orders {
        println!(
            "#{:<6} {:<12} {:>8}  {}",
            order.id,
            order.status,
            order.total_price,
            order.created_at.format("%Y-%m-%d %H:%M")
        );
    }
}

#[allow(clippy::print_stdout)]
fn print_order(order: &Order) {
    println!("#{} {} {}", order.id, order.status, order.total_price);
    for item in &order.items {
        println!(
            "  #{:<6} {:<40} {} x {}",
            item.book_id, item.title, item.quantity, item.unit_price
        );
    }
}

#[allow(clippy::print_stdout)]
fn print_sales_report(rows: &[paperback_client::types::SalesReportRow]) {
    for row in rows {
        println!("{}  {:>10}  {} orders", row.date, row.revenue, row.order_count);
    }
}

#[allow(clippy::print_stdout)]
fn print_top_customers(rows: &[paperback_client::types::TopCustomer]) {
    for row in rows {
        println!(
            "{:<40} {:>10}  {} orders",
            row.email, row.total_spent, row.order_count
        );
    }
}

#[allow(clippy::print_stdout)]
fn print_top_books(rows: &[paperback_client::types::TopBook]) {
    for row in rows {
        println!("#{:<6} {:<40} {} sold", row.book_id, row.title, row.copies_sold);
    }
}

//! Shopping cart commands. All of these are authenticated.

use clap::Subcommand;

use paperback_client::types::{CartSnapshot, PaymentDetails};
use paperback_core::BookId;

use super::{CliError, Credentials, authenticated_client};

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the current cart
    Show,
    /// Add copies of a book
    Add {
        /// Book id
        id: BookId,

        /// Number of copies
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a book's line entirely
    Remove {
        /// Book id
        id: BookId,
    },
    /// Decrease a book's quantity by one (removes the line at quantity one)
    Decrement {
        /// Book id
        id: BookId,
    },
    /// Empty the cart
    Clear,
    /// Check out the cart
    Checkout {
        /// Card number
        #[arg(long)]
        card_number: String,

        /// Name on the card
        #[arg(long)]
        card_holder: String,

        /// Expiry in MM/YY form
        #[arg(long)]
        expiry: String,

        /// Card verification code
        #[arg(long)]
        cvv: String,
    },
}

pub async fn run(action: CartAction, credentials: &Credentials) -> Result<(), CliError> {
    let client = authenticated_client(credentials).await?;

    match action {
        CartAction::Show => {
            let snapshot = client.cart().fetch().await?;
            print_cart(&snapshot);
        }
        CartAction::Add { id, quantity } => {
            let snapshot = client.cart().add_item(id, quantity).await?;
            print_cart(&snapshot);
        }
        CartAction::Remove { id } => {
            let snapshot = client.cart().remove_item(id).await?;
            print_cart(&snapshot);
        }
        CartAction::Decrement { id } => {
            let snapshot = client.cart().decrement_item(id).await?;
            print_cart(&snapshot);
        }
        CartAction::Clear => {
            client.cart().clear().await?;
            tracing::info!("Cart emptied");
        }
        CartAction::Checkout {
            card_number,
            card_holder,
            expiry,
            cvv,
        } => {
            let confirmation = client
                .cart()
                .checkout(&PaymentDetails {
                    card_number,
                    card_holder,
                    expiry,
                    cvv,
                })
                .await?;
            tracing::info!("{confirmation}");
        }
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_cart(snapshot: &CartSnapshot) {
    if snapshot.items.is_empty() {
        println!("(cart is empty)");
        return;
    }
    for line in &snapshot.items {
        println!(
            "#{:<6} {:<40} {} x {:>8} = {:>8}",
            line.book_id, line.title, line.quantity, line.unit_price, line.line_subtotal
        );
    }
    println!("{:>70}", format!("total: {}", snapshot.total_price));
}

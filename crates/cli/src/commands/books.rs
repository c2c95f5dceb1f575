//! Catalog commands: listing, search, and admin management.

use clap::Subcommand;

use paperback_client::types::{Author, Book, CatalogFilter, NewBook, Publisher};
use paperback_core::{BookId, Money};

use super::{CliError, Credentials, anonymous_client, authenticated_client};

#[derive(Subcommand)]
pub enum BooksAction {
    /// List every book in the catalog
    List,
    /// Search the catalog
    Search {
        /// Title substring
        #[arg(long)]
        title: Option<String>,

        /// Category name
        #[arg(long)]
        category: Option<String>,

        /// Author name
        #[arg(long)]
        author: Option<String>,

        /// Publisher name
        #[arg(long)]
        publisher: Option<String>,

        /// ISBN
        #[arg(long)]
        isbn: Option<String>,
    },
    /// Show one book
    Show {
        /// Book id
        id: BookId,
    },
    /// Add a book to the catalog (admin)
    Add {
        #[arg(short, long)]
        title: String,

        #[arg(long)]
        isbn: String,

        #[arg(short, long)]
        category: String,

        /// Unit price, e.g. 12.50
        #[arg(short, long)]
        price: Money,

        #[arg(long)]
        year: i32,

        #[arg(short, long)]
        stock: u32,

        /// Author name (repeatable)
        #[arg(short, long)]
        author: Vec<String>,

        #[arg(long)]
        publisher: Option<String>,
    },
    /// Remove a book from the catalog (admin)
    Remove {
        /// Book id
        id: BookId,
    },
}

pub async fn run(action: BooksAction, credentials: &Credentials) -> Result<(), CliError> {
    match action {
        BooksAction::List => {
            let client = anonymous_client()?;
            let books = client.catalog().list_all().await?;
            print_books(&books);
        }
        BooksAction::Search {
            title,
            category,
            author,
            publisher,
            isbn,
        } => {
            let client = anonymous_client()?;
            let filter = CatalogFilter {
                title,
                category,
                author,
                publisher,
                isbn,
            };
            let books = client.catalog().search(&filter).await?;
            print_books(&books);
        }
        BooksAction::Show { id } => {
            let client = anonymous_client()?;
            let book = client.catalog().get_by_id(id).await?;
            print_book(&book);
        }
        BooksAction::Add {
            title,
            isbn,
            category,
            price,
            year,
            stock,
            author,
            publisher,
        } => {
            let client = authenticated_client(credentials).await?;
            let created = client
                .catalog()
                .create(&NewBook {
                    title,
                    isbn,
                    category,
                    price,
                    publication_year: year,
                    stock,
                    authors: author.into_iter().map(|name| Author { name }).collect(),
                    publisher: publisher.map(|name| Publisher { name }),
                })
                .await?;
            tracing::info!("Added book #{}: {}", created.id, created.title);
        }
        BooksAction::Remove { id } => {
            let client = authenticated_client(credentials).await?;
            client.catalog().delete(id).await?;
            tracing::info!("Removed book #{id}");
        }
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_books(books: &[Book]) {
    if books.is_empty() {
        println!("(no books)");
        return;
    }
    for book in books {
        println!(
            "#{:<6} {:<40} {:>8}  stock {}",
            book.id, book.title, book.price, book.stock
        );
    }
}

#[allow(clippy::print_stdout)]
fn print_book(book: &Book) {
    println!("#{} {}", book.id, book.title);
    println!("  isbn:      {}", book.isbn);
    println!("  category:  {}", book.category);
    println!("  price:     {}", book.price);
    println!("  published: {}", book.publication_year);
    println!("  stock:     {}", book.stock);
    for author in &book.authors {
        println!("  author:    {}", author.name);
    }
    if let Some(publisher) = &book.publisher {
        println!("  publisher: {}", publisher.name);
    }
}

//! CLI subcommands.

pub mod account;
pub mod books;
pub mod cart;
pub mod orders;

use thiserror::Error;

use paperback_client::{ApiError, BookstoreClient};

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Client/service failure.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// An authenticated command was run without credentials.
    #[error(
        "credentials required: pass --email/--password or set PAPERBACK_EMAIL and PAPERBACK_PASSWORD"
    )]
    MissingCredentials,
}

/// Credentials resolved from flags, falling back to the environment.
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    fn resolve(&self) -> Result<(String, String), CliError> {
        let email = self
            .email
            .clone()
            .or_else(|| std::env::var("PAPERBACK_EMAIL").ok())
            .ok_or(CliError::MissingCredentials)?;
        let password = self
            .password
            .clone()
            .or_else(|| std::env::var("PAPERBACK_PASSWORD").ok())
            .ok_or(CliError::MissingCredentials)?;
        Ok((email, password))
    }
}

/// A client with no session, for public endpoints.
pub fn anonymous_client() -> Result<BookstoreClient, CliError> {
    Ok(BookstoreClient::from_env()?)
}

/// A freshly logged-in client. Nothing persists between invocations, so
/// every authenticated command starts with a login round-trip.
pub async fn authenticated_client(credentials: &Credentials) -> Result<BookstoreClient, CliError> {
    let (email, password) = credentials.resolve()?;
    let client = BookstoreClient::from_env()?;
    client.session().login(&email, &password).await?;
    Ok(client)
}

//! Account management commands: signup, verification, password recovery.

use clap::Subcommand;

use paperback_client::SignupForm;
use paperback_core::UserRole;

use super::{CliError, Credentials, anonymous_client, authenticated_client};

#[derive(Subcommand)]
pub enum AccountAction {
    /// Register a new account (email verification required before login)
    Signup {
        /// Username (letters, numbers, underscores)
        #[arg(short, long)]
        username: String,

        /// First name
        #[arg(short = 'f', long)]
        first_name: String,

        /// Last name
        #[arg(short = 'l', long)]
        last_name: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Phone number
        #[arg(long)]
        phone: String,

        /// Password
        #[arg(short, long)]
        password: String,

        /// Account role (CUSTOMER or ADMIN)
        #[arg(long, default_value = "CUSTOMER")]
        role: UserRole,
    },
    /// Submit the emailed verification code
    Verify {
        /// Six-digit code from the verification email
        #[arg(long)]
        otp: String,
    },
    /// Check that the stored credentials work
    Login,
    /// Request a password-reset code
    ForgotPassword {
        /// Email address of the account
        #[arg(short, long)]
        email: String,
    },
    /// Consume a password-reset code and set a new password
    ResetPassword {
        /// Email address of the account
        #[arg(short, long)]
        email: String,

        /// Six-digit code from the reset email
        #[arg(long)]
        otp: String,

        /// New password
        #[arg(short, long)]
        new_password: String,
    },
}

pub async fn run(action: AccountAction, credentials: &Credentials) -> Result<(), CliError> {
    match action {
        AccountAction::Signup {
            username,
            first_name,
            last_name,
            email,
            phone,
            password,
            role,
        } => {
            let client = anonymous_client()?;
            client
                .session()
                .signup(&SignupForm {
                    username,
                    first_name,
                    last_name,
                    email,
                    phone,
                    password,
                    role,
                })
                .await?;
            tracing::info!("Account created; check your email for the verification code");
        }
        AccountAction::Verify { otp } => {
            let client = anonymous_client()?;
            client.session().verify_email(&otp).await?;
            tracing::info!("Account verified; you can now log in");
        }
        AccountAction::Login => {
            let client = authenticated_client(credentials).await?;
            let identity = client
                .session()
                .identity()
                .ok_or(paperback_client::ApiError::NotAuthenticated)?;
            tracing::info!("Logged in as {} ({})", identity.email, identity.role);
        }
        AccountAction::ForgotPassword { email } => {
            let client = anonymous_client()?;
            client.session().forgot_password(&email).await?;
            tracing::info!("Reset code sent to {email}");
        }
        AccountAction::ResetPassword {
            email,
            otp,
            new_password,
        } => {
            let client = anonymous_client()?;
            client
                .session()
                .reset_password(&email, &otp, &new_password)
                .await?;
            tracing::info!("Password updated; log in with the new password");
        }
    }
    Ok(())
}

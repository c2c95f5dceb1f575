//! Authenticated-session lifecycle.
//!
//! [`SessionManager`] owns the sign-up/login/logout/verify/reset flows and
//! derives the local [`Identity`] from service responses. It is a small
//! state machine:
//!
//! ```text
//! Anonymous --login--> Authenticated          (credential stored)
//! Anonymous --signup--> VerificationPending   (no credential yet)
//! VerificationPending --verify_email--> Anonymous   (login still required)
//! Authenticated --logout--> Anonymous         (always, even if remote fails)
//! ```
//!
//! `is_authenticated()` is derived from the state; there is no separate
//! flag to drift out of sync. Every transition out of `Authenticated`
//! clears the token store.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, instrument, warn};

use paperback_core::{Email, Otp, Password, UserId, UserRole};

use crate::error::ApiError;
use crate::token::TokenStore;
use crate::transport::{LOGIN_PATH, Transport};
use crate::types::{
    ForgotPasswordRequest, JwtResponse, LoginRequest, LogoutRequest, ResetPasswordRequest,
    SignupRequest, VerifyRequest,
};

/// The locally held representation of who is logged in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Account email address.
    pub email: Email,
    /// Account id, when the service has reported it. Cart and order
    /// operations require it.
    pub user_id: Option<UserId>,
    /// Account role.
    pub role: UserRole,
}

/// Session state machine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No identity held.
    #[default]
    Anonymous,
    /// A login round-trip is in flight.
    Authenticating,
    /// An identity is held and consistent with the last successful auth
    /// call.
    Authenticated(Identity),
    /// Signup succeeded; the account still needs email verification, then
    /// an explicit login.
    VerificationPending {
        /// Email the verification code was sent to.
        email: Email,
    },
}

/// Signup form fields, validated client-side before any request is issued.
#[derive(Debug, Clone)]
pub struct SignupForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub role: UserRole,
}

impl SignupForm {
    /// Validate the form and produce the wire request.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] describing the first failing field.
    fn validate(&self) -> Result<SignupRequest, ApiError> {
        validate_username(&self.username)?;
        validate_name("first name", &self.first_name)?;
        validate_name("last name", &self.last_name)?;
        let email = Email::parse(&self.email)?;
        validate_phone(&self.phone)?;
        let password = Password::parse(&self.password)?;

        Ok(SignupRequest {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email,
            phone: self.phone.clone(),
            password: password.expose().to_string(),
            role: self.role,
        })
    }
}

/// Owner of the session lifecycle.
///
/// Cloning is cheap; clones share the same state, so a cart holding a clone
/// observes logins and logouts immediately.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    transport: Transport,
    tokens: TokenStore,
    state: RwLock<SessionState>,
}

impl SessionManager {
    /// Create a session manager over the given transport and token store.
    #[must_use]
    pub fn new(transport: Transport, tokens: TokenStore) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                transport,
                tokens,
                state: RwLock::new(SessionState::Anonymous),
            }),
        }
    }

    // =========================================================================
    // State accessors
    // =========================================================================

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The held identity, if authenticated.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        match self.state() {
            SessionState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    /// Whether an identity is held. Derived from the state machine; there is
    /// no independent flag.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self.state(), SessionState::Authenticated(_))
    }

    /// The authenticated account id, when known.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.identity().and_then(|identity| identity.user_id)
    }

    // =========================================================================
    // Flows
    // =========================================================================

    /// Log in with email and password.
    ///
    /// On success the returned access token is stored and the session
    /// becomes `Authenticated`; on failure the session returns to
    /// `Anonymous` and the classified error is surfaced.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] for a malformed email or empty password
    /// (no request is issued), otherwise the transport/service failure.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, ApiError> {
        let email = Email::parse(email)?;
        if password.is_empty() {
            return Err(ApiError::validation("password is required"));
        }

        self.set_state(SessionState::Authenticating);

        let request = LoginRequest {
            email: email.as_str(),
            password,
        };

        match self
            .inner
            .transport
            .post_json::<JwtResponse, _>(LOGIN_PATH, &request)
            .await
        {
            Ok(jwt) => {
                self.inner.tokens.set(jwt.access_token);
                let identity = Identity {
                    email,
                    user_id: jwt.user_id,
                    role: jwt.role.unwrap_or_default(),
                };
                self.set_state(SessionState::Authenticated(identity.clone()));
                debug!("login succeeded");
                Ok(identity)
            }
            Err(err) => {
                self.set_state(SessionState::Anonymous);
                Err(err)
            }
        }
    }

    /// Register a new account. Success leaves the session in
    /// `VerificationPending`; no credential is issued until the account is
    /// verified and logged in.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] for any failing form field (no request is
    /// issued), otherwise the transport/service failure.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn signup(&self, form: &SignupForm) -> Result<(), ApiError> {
        let request = form.validate()?;
        let email = request.email.clone();

        self.inner
            .transport
            .post_text("/auth/signup", &request)
            .await?;

        self.set_state(SessionState::VerificationPending { email });
        Ok(())
    }

    /// Submit the emailed verification code. Verification alone does not
    /// authenticate; a successful call returns the session to `Anonymous`
    /// and the account must log in explicitly.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] for a malformed code, otherwise the
    /// transport/service failure.
    #[instrument(skip(self, otp))]
    pub async fn verify_email(&self, otp: &str) -> Result<(), ApiError> {
        let otp = Otp::parse(otp)?;

        self.inner
            .transport
            .post_text("/auth/verify-user", &VerifyRequest { token: otp.as_str() })
            .await?;

        self.set_state(SessionState::Anonymous);
        Ok(())
    }

    /// Log out. Local sign-out is unconditional: the credential and
    /// identity are cleared even when the remote call fails, and the remote
    /// failure (if any) is reported only after cleanup.
    ///
    /// # Errors
    ///
    /// The remote failure, surfaced after local state is already cleared.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        let user_id = self.user_id();

        let result = self
            .inner
            .transport
            .post_text("/auth/logout", &LogoutRequest { user_id })
            .await
            .map(|_| ());

        if let Err(err) = &result {
            warn!(error = %err, "remote logout failed; local sign-out proceeds");
        }

        self.set_state(SessionState::Anonymous);
        result
    }

    /// Request a password-reset code for the given email. Side effect only;
    /// the session stays `Anonymous`.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] for a malformed email, otherwise the
    /// transport/service failure.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn forgot_password(&self, email: &str) -> Result<(), ApiError> {
        let email = Email::parse(email)?;

        self.inner
            .transport
            .post_text(
                "/auth/forgotpassword",
                &ForgotPasswordRequest {
                    email: email.as_str(),
                },
            )
            .await?;
        Ok(())
    }

    /// Consume a password-reset code and set a new password. Side effect
    /// only; the session stays `Anonymous` and the account must log in with
    /// the new password.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] for a malformed email, code, or weak
    /// password, otherwise the transport/service failure.
    #[instrument(skip(self, new_password), fields(email = %email))]
    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        let email = Email::parse(email)?;
        let otp = Otp::parse(otp)?;
        let new_password = Password::parse(new_password)?;

        self.inner
            .transport
            .post_text(
                "/auth/checkforgotpassword",
                &ResetPasswordRequest {
                    email: email.as_str(),
                    otp: otp.as_str(),
                    new_password: new_password.expose(),
                },
            )
            .await?;
        Ok(())
    }

    /// One-shot reconciliation at process start: ask the service who the
    /// cookie-backed session belongs to. Success transitions to
    /// `Authenticated` without requiring a stored credential (the transport
    /// mints one via the refresh cookie along the way); any failure is
    /// swallowed and leaves the session `Anonymous`.
    #[instrument(skip(self))]
    pub async fn bootstrap(&self) -> Option<Identity> {
        match self.inner.transport.get_text("/auth/me").await {
            Ok(body) => match Email::parse(body.trim()) {
                Ok(email) => {
                    let identity = Identity {
                        email,
                        user_id: None,
                        role: UserRole::default(),
                    };
                    self.set_state(SessionState::Authenticated(identity.clone()));
                    debug!("session reconciled from cookie");
                    Some(identity)
                }
                Err(_) => None,
            },
            Err(err) => {
                debug!(error = %err, "no reusable session");
                None
            }
        }
    }

    /// Enrich the held identity with details learned after login (profile
    /// fetch, admin views).
    ///
    /// # Errors
    ///
    /// [`ApiError::NotAuthenticated`] when no identity is held.
    pub fn update_identity(
        &self,
        user_id: Option<UserId>,
        role: Option<UserRole>,
    ) -> Result<Identity, ApiError> {
        let mut identity = self.identity().ok_or(ApiError::NotAuthenticated)?;
        if user_id.is_some() {
            identity.user_id = user_id;
        }
        if let Some(role) = role {
            identity.role = role;
        }
        self.set_state(SessionState::Authenticated(identity.clone()));
        Ok(identity)
    }

    /// Drop the identity and credential without a remote call, e.g. after an
    /// unrecoverable authorization failure.
    pub fn invalidate(&self) {
        self.set_state(SessionState::Anonymous);
    }

    /// Test-only hook to place the session in a known state.
    #[cfg(test)]
    pub(crate) fn force_state(&self, state: SessionState) {
        self.set_state(state);
    }

    /// Apply a state transition, clearing the token store whenever the
    /// session leaves `Authenticated`.
    fn set_state(&self, next: SessionState) {
        let mut state = self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let leaving_authenticated = matches!(*state, SessionState::Authenticated(_))
            && !matches!(next, SessionState::Authenticated(_));
        if leaving_authenticated {
            self.inner.tokens.clear();
        }

        *state = next;
    }
}

fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.trim().is_empty() {
        return Err(ApiError::validation("username is required"));
    }
    if username.len() < 3 || username.len() > 30 {
        return Err(ApiError::validation(
            "username must be between 3 and 30 characters",
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ApiError::validation(
            "username can only contain letters, numbers, and underscores",
        ));
    }
    Ok(())
}

fn validate_name(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    if value.len() < 2 || value.len() > 50 {
        return Err(ApiError::validation(format!(
            "{field} must be between 2 and 50 characters"
        )));
    }
    if !value.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ApiError::validation(format!(
            "{field} must contain letters only"
        )));
    }
    Ok(())
}

/// Phone numbers follow the service's national format: an optional +20/20
/// country prefix or leading 0, then a mobile prefix (10/11/12/15) and
/// eight digits.
fn validate_phone(phone: &str) -> Result<(), ApiError> {
    let rest = phone
        .strip_prefix("+20")
        .or_else(|| phone.strip_prefix("20"))
        .or_else(|| phone.strip_prefix('0'))
        .unwrap_or("");

    let mut chars = rest.chars();
    let valid = rest.len() == 10
        && chars.next() == Some('1')
        && matches!(chars.next(), Some('0' | '1' | '2' | '5'))
        && chars.all(|c| c.is_ascii_digit());

    if valid {
        Ok(())
    } else {
        Err(ApiError::validation("invalid phone number format"))
    }
}

//! Authentication operations: login, signup, logout, and password recovery.
//!
//! Login and signup follow one contract: a non-2xx response is an
//! [`ApiError`], while a 2xx response is returned as-is and only establishes a
//! session when its `status` is `"success"` and it carries a user record.

use ddi_api_models::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, ResetTokenRequest,
    ResetTokenValidation, SignupRequest, StatusMessage,
};
use reqwest::Method;
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::session::PersistedSession;

pub(crate) const LOGIN_ENDPOINT: &str = "/auth/login";
pub(crate) const SIGNUP_ENDPOINT: &str = "/auth/signup";
pub(crate) const LOGOUT_ENDPOINT: &str = "/auth/logout";
const FORGOT_PASSWORD_ENDPOINT: &str = "/auth/forgot-password";
const VALIDATE_RESET_TOKEN_ENDPOINT: &str = "/auth/validate-reset-token";
const RESET_PASSWORD_ENDPOINT: &str = "/auth/reset-password";

/// Minimum accepted length for a new password.
pub const MIN_PASSWORD_LEN: usize = 8;

impl ApiClient {
    /// Authenticate with e-mail and password.
    ///
    /// # Errors
    ///
    /// Returns an error for transport failures and non-2xx responses; a
    /// rejected login (401) surfaces the backend message, e.g.
    /// `"Invalid credentials"`.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let body = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let response: AuthResponse = self.post_json(LOGIN_ENDPOINT, &body).await?;
        self.adopt_auth_response(&response);
        Ok(response)
    }

    /// Create an account and sign in with it.
    ///
    /// # Errors
    ///
    /// Same contract as [`ApiClient::login`].
    pub async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, ApiError> {
        let response: AuthResponse = self.post_json(SIGNUP_ENDPOINT, request).await?;
        self.adopt_auth_response(&response);
        Ok(response)
    }

    /// End the session.
    ///
    /// The backend call is best effort; local state is cleared whether or not
    /// it succeeds.
    pub async fn logout(&self) {
        if let Err(err) = self.request(LOGOUT_ENDPOINT, Method::POST, None).await {
            warn!(error = %err, detail = ?err, "logout request failed; clearing local session anyway");
        }
        self.clear_session();
    }

    /// Ask the backend to e-mail a password reset link.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for a blank e-mail, otherwise the
    /// normalized request error.
    pub async fn forgot_password(&self, email: &str) -> Result<StatusMessage, ApiError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ApiError::validation("Email is required"));
        }
        self.post_json(
            FORGOT_PASSWORD_ENDPOINT,
            &ForgotPasswordRequest {
                email: email.to_string(),
            },
        )
        .await
    }

    /// Check a reset token before showing the new-password form.
    ///
    /// # Errors
    ///
    /// Returns the normalized request error; an expired token is a 4xx with
    /// the backend's message.
    pub async fn validate_reset_token(&self, token: &str) -> Result<ResetTokenValidation, ApiError> {
        let token = require_token(token)?;
        self.post_json(
            VALIDATE_RESET_TOKEN_ENDPOINT,
            &ResetTokenRequest {
                token: token.to_string(),
            },
        )
        .await
    }

    /// Set a new password using a reset token.
    ///
    /// Input is checked before any request is sent: the two passwords must
    /// match and be at least [`MIN_PASSWORD_LEN`] characters long.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for rejected input, otherwise the
    /// normalized request error.
    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<StatusMessage, ApiError> {
        let token = require_token(token)?;
        validate_new_password(password, confirm_password)?;
        self.post_json(
            RESET_PASSWORD_ENDPOINT,
            &ResetPasswordRequest {
                token: token.to_string(),
                password: password.to_string(),
            },
        )
        .await
    }

    fn adopt_auth_response(&self, response: &AuthResponse) {
        match (&response.user, response.is_success()) {
            (Some(user), true) => self.establish_session(PersistedSession {
                user: user.clone(),
                token: response.token.clone(),
            }),
            _ => debug!(
                status = %response.status,
                "auth response did not establish a session"
            ),
        }
    }
}

fn require_token(token: &str) -> Result<&str, ApiError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ApiError::validation("Reset token is missing"));
    }
    Ok(token)
}

/// Check a new password and its confirmation.
///
/// # Errors
///
/// Returns [`ApiError::Validation`] when the values differ or are too short.
pub fn validate_new_password(password: &str, confirm_password: &str) -> Result<(), ApiError> {
    if password != confirm_password {
        return Err(ApiError::validation("Passwords do not match"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

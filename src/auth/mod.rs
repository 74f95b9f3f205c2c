//! Auth gate for mutating requests.
//!
//! Two credential schemes are supported:
//!
//! - **Bearer**: `Authorization: Bearer <token>`, an HS256 token signed with
//!   the configured signing secret. `POST /api/auth` trades the admin
//!   password for such a token.
//! - **Shared secret**: the `x-admin-password` header must equal the
//!   configured secret.
//!
//! The gate only decides; the HTTP layer decides which requests it guards.

mod token;

use std::fmt;

pub use token::{Claims, TokenError, TokenSigner};

/// Header carrying the admin password (login, shared-secret mode).
pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

const ADMIN_SUBJECT: &str = "admin";

/// Credential scheme in force.
#[derive(Debug, Clone)]
pub enum AuthMode {
    Bearer(TokenSigner),
    SharedSecret(String),
}

/// Error type for credential checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No credential was presented.
    Missing,
    /// A credential was presented and rejected.
    Invalid,
    /// Login was attempted with a wrong or missing password.
    BadPassword,
    /// Login is not possible because no admin password is configured.
    LoginDisabled,
    /// Signing a token failed.
    Token(TokenError),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Missing => write!(f, "Unauthorized: No token provided"),
            AuthError::Invalid => write!(f, "Unauthorized: Invalid or expired token"),
            AuthError::BadPassword => write!(f, "Unauthorized: Invalid password"),
            AuthError::LoginDisabled => write!(f, "Unauthorized: Login is not configured"),
            AuthError::Token(e) => write!(f, "token error: {}", e),
        }
    }
}

impl std::error::Error for AuthError {}

/// Credentials pulled from a request.
#[derive(Debug, Clone, Copy, Default)]
pub struct Credentials<'a> {
    /// Raw `Authorization` header value.
    pub authorization: Option<&'a str>,
    /// Raw `x-admin-password` header value.
    pub admin_password: Option<&'a str>,
}

/// Successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Login {
    /// Bearer token; `None` in shared-secret mode.
    pub token: Option<String>,
}

/// Validates credentials for gated requests and handles login.
#[derive(Debug, Clone)]
pub struct AuthGate {
    mode: AuthMode,
    admin_password: Option<String>,
}

impl AuthGate {
    /// Bearer-token gate. `admin_password` enables login; without it tokens
    /// must be minted elsewhere.
    pub fn bearer(signer: TokenSigner, admin_password: Option<String>) -> Self {
        Self {
            mode: AuthMode::Bearer(signer),
            admin_password,
        }
    }

    /// Shared-secret gate; the secret doubles as the login password.
    pub fn shared_secret(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        Self {
            mode: AuthMode::SharedSecret(secret.clone()),
            admin_password: Some(secret),
        }
    }

    pub fn mode(&self) -> &AuthMode {
        &self.mode
    }

    /// Check the credentials of a gated request.
    pub fn check(&self, credentials: Credentials<'_>) -> Result<(), AuthError> {
        match &self.mode {
            AuthMode::Bearer(signer) => {
                let token = credentials
                    .authorization
                    .and_then(|value| value.strip_prefix("Bearer "))
                    .map(str::trim)
                    .filter(|token| !token.is_empty())
                    .ok_or(AuthError::Missing)?;

                signer.verify(token).map(|_| ()).map_err(|e| {
                    tracing::warn!(error = %e, "rejected bearer token");
                    AuthError::Invalid
                })
            }
            AuthMode::SharedSecret(secret) => {
                let presented = credentials.admin_password.ok_or(AuthError::Missing)?;
                if constant_time_eq(presented.as_bytes(), secret.as_bytes()) {
                    Ok(())
                } else {
                    tracing::warn!("rejected shared secret");
                    Err(AuthError::Invalid)
                }
            }
        }
    }

    /// Trade the admin password for a login (and, in bearer mode, a token).
    pub fn login(&self, password: Option<&str>) -> Result<Login, AuthError> {
        let expected = self.admin_password.as_deref().ok_or(AuthError::LoginDisabled)?;
        let presented = password.ok_or(AuthError::BadPassword)?;
        if !constant_time_eq(presented.as_bytes(), expected.as_bytes()) {
            tracing::warn!("rejected login attempt");
            return Err(AuthError::BadPassword);
        }

        match &self.mode {
            AuthMode::Bearer(signer) => {
                let token = signer.issue(ADMIN_SUBJECT).map_err(AuthError::Token)?;
                Ok(Login { token: Some(token) })
            }
            AuthMode::SharedSecret(_) => Ok(Login { token: None }),
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

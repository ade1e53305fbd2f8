//! Session/auth collaborator contract
//!
//! The server owns accounts. The client only reports who is logged in, forwards
//! credentials and enforces the password checks that happen before registration.

use crate::{Result, TasteError};
use serde::{Deserialize, Serialize};

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LEN: usize = 8;

/// Response of `GET /user/status`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStatus {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_premium: Option<bool>,
}

impl UserStatus {
    pub fn is_premium(&self) -> bool {
        self.is_premium.unwrap_or(false)
    }
}

/// Body of `POST /login` and `POST /register`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Credentials for registration, after the confirmation and length checks
    pub fn for_registration(email: &str, password: &str, confirm: &str) -> Result<Self> {
        if password != confirm {
            return Err(TasteError::ValidationError(
                "Passwords do not match".to_string(),
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(TasteError::ValidationError(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(Self::new(email, password))
    }
}

/// Error body returned by login/register on rejection
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AuthErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

/// Which auth form produced a reply
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthAction {
    Login,
    Register,
}

impl AuthAction {
    /// Message shown when the server rejects without an `error` field
    pub fn fallback_message(self) -> &'static str {
        match self {
            AuthAction::Login => "Login failed",
            AuthAction::Register => "Registration failed",
        }
    }
}

/// Server decision on a login or registration
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthReply {
    Accepted,
    Rejected(String),
}

impl AuthReply {
    /// Build a rejection from an optional server-provided message
    pub fn rejected(action: AuthAction, body: AuthErrorBody) -> Self {
        AuthReply::Rejected(
            body.error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| action.fallback_message().to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_mismatch() {
        let err = Credentials::for_registration("a@b.c", "longenough", "longenougH").unwrap_err();
        assert_eq!(err, TasteError::ValidationError("Passwords do not match".into()));
    }

    #[test]
    fn test_password_too_short() {
        let err = Credentials::for_registration("a@b.c", "short", "short").unwrap_err();
        assert_eq!(
            err,
            TasteError::ValidationError("Password must be at least 8 characters".into())
        );
        assert!(Credentials::for_registration("a@b.c", "12345678", "12345678").is_ok());
    }

    #[test]
    fn test_status_defaults() {
        let status: UserStatus = serde_json::from_str(r#"{"authenticated": false}"#).unwrap();
        assert!(!status.authenticated);
        assert!(!status.is_premium());

        let status: UserStatus = serde_json::from_str(
            r#"{"authenticated": true, "email": "dj@example.com", "is_premium": true}"#,
        )
        .unwrap();
        assert_eq!(status.email.as_deref(), Some("dj@example.com"));
        assert!(status.is_premium());
    }

    #[test]
    fn test_rejection_fallbacks() {
        assert_eq!(
            AuthReply::rejected(AuthAction::Login, AuthErrorBody::default()),
            AuthReply::Rejected("Login failed".into())
        );
        assert_eq!(
            AuthReply::rejected(
                AuthAction::Register,
                AuthErrorBody {
                    error: Some("Email already registered".into())
                }
            ),
            AuthReply::Rejected("Email already registered".into())
        );
    }
}

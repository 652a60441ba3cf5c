//! Credentials, identity-provider tokens and the labs service session.
//!
//! Every secret is held as a [`SecretString`] so that `Debug` output and
//! tracing fields never reveal it.

use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;

/// Username and password supplied by the caller for a single login.
#[derive(Debug)]
pub struct LoginCredentials {
    pub username: String,
    pub password: SecretString,
}

impl LoginCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Token endpoint response of the identity provider.
///
/// Used once to open a [`ServiceSession`]; refresh is not handled.
#[derive(Debug, Deserialize)]
#[serde(from = "TokenResponseWire")]
pub struct AccessTokenBundle {
    pub access_token: SecretString,
    pub id_token: SecretString,
    pub refresh_token: SecretString,
    pub expires_in: u64,
    pub scope: String,
    pub token_type: String,
}

#[derive(Deserialize)]
struct TokenResponseWire {
    access_token: String,
    id_token: String,
    refresh_token: String,
    expires_in: u64,
    scope: String,
    token_type: String,
}

impl From<TokenResponseWire> for AccessTokenBundle {
    fn from(w: TokenResponseWire) -> Self {
        Self {
            access_token: w.access_token.into(),
            id_token: w.id_token.into(),
            refresh_token: w.refresh_token.into(),
            expires_in: w.expires_in,
            scope: w.scope,
            token_type: w.token_type,
        }
    }
}

impl AccessTokenBundle {
    /// Value for an `Authorization` header carrying the access token.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token.expose_secret())
    }
}

/// Service-scoped bearer credential returned by `POST /api/labs/auth/login`.
///
/// Wire shape: `{"user": {"session": {"sensitive_id": "..."}}}`.
#[derive(Debug, Deserialize)]
#[serde(from = "LoginResponseWire")]
pub struct ServiceSession {
    sensitive_id: SecretString,
}

#[derive(Deserialize)]
struct LoginResponseWire {
    user: UserWire,
}

#[derive(Deserialize)]
struct UserWire {
    session: SessionWire,
}

#[derive(Deserialize)]
struct SessionWire {
    sensitive_id: String,
}

impl From<LoginResponseWire> for ServiceSession {
    fn from(w: LoginResponseWire) -> Self {
        Self::new(w.user.session.sensitive_id)
    }
}

impl ServiceSession {
    pub fn new(sensitive_id: impl Into<String>) -> Self {
        Self {
            sensitive_id: SecretString::from(sensitive_id.into()),
        }
    }

    /// The session's sensitive id, used as the bearer token for task calls.
    #[must_use]
    pub fn sensitive_id(&self) -> &SecretString {
        &self.sensitive_id
    }

    /// Value for an `Authorization` header carrying the session id.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.sensitive_id.expose_secret())
    }
}

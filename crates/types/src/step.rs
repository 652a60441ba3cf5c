//! Named steps of the headless login choreography.

use std::fmt;

/// One exchange of the five-step authorization-code + PKCE login.
///
/// Steps run strictly in declaration order; [`LoginStep::ALL`] lists them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LoginStep {
    /// `GET /authorize` without following redirects, yielding the login `state`.
    Authorize,
    /// `POST /u/login/identifier` with the username.
    Identifier,
    /// `POST /u/login/password`, yielding the resume redirect.
    Password,
    /// `GET` the resume URL, landing on the callback carrying the `code`.
    Resume,
    /// `POST /oauth/token`, exchanging the code for tokens.
    TokenExchange,
}

impl LoginStep {
    /// Every step, in execution order.
    pub const ALL: [Self; 5] = [
        Self::Authorize,
        Self::Identifier,
        Self::Password,
        Self::Resume,
        Self::TokenExchange,
    ];

    /// One-based position of the step in the choreography.
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Self::Authorize => 1,
            Self::Identifier => 2,
            Self::Password => 3,
            Self::Resume => 4,
            Self::TokenExchange => 5,
        }
    }
}

impl fmt::Display for LoginStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authorize => write!(f, "authorize"),
            Self::Identifier => write!(f, "identifier"),
            Self::Password => write!(f, "password"),
            Self::Resume => write!(f, "resume"),
            Self::TokenExchange => write!(f, "token_exchange"),
        }
    }
}

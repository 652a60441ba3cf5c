//! Headless login against the labs identity provider.
//!
//! [`AuthFlow`] replays the browser's authorization-code + PKCE choreography
//! step by step and then trades the resulting access token for a labs
//! service session. The [`pkce`] module holds the random-string and challenge
//! helpers, and [`transport`] builds the HTTP clients the steps share.

pub mod flow;
pub mod pkce;
pub mod session;
pub mod transport;

pub use flow::{AuthFlow, AuthorizationCode, LoginState, ResumeUrl};
pub use pkce::PkceMaterial;
pub use transport::Transports;

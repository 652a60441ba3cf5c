//! HTTP transports for the login choreography.
//!
//! The identity provider needs three client behaviours: one that stops at
//! redirects so `Location` can be read, one that follows them like a browser,
//! and one that speaks JSON to the token endpoint. Each is built once and
//! never reconfigured; all three present the same cookie jar so the provider
//! sees a single in-progress login session.

use labs_config::AuthConfig;
use labs_types::Result;
use reqwest::{
    Client, ClientBuilder,
    cookie::Jar,
    header::{ACCEPT, HeaderMap, HeaderValue},
    redirect::Policy,
};
use std::sync::Arc;

/// The three per-attempt clients and the cookie jar they share.
pub struct Transports {
    jar: Arc<Jar>,
    no_redirect: Client,
    redirecting: Client,
    json: Client,
}

impl Transports {
    /// Build all transports around a fresh, empty cookie jar.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend or client cannot be initialised.
    pub fn new(config: &AuthConfig) -> Result<Self> {
        Self::with_jar(config, Arc::new(Jar::default()))
    }

    /// Build all transports around an existing cookie jar.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend or client cannot be initialised.
    pub fn with_jar(config: &AuthConfig, jar: Arc<Jar>) -> Result<Self> {
        let no_redirect = base_builder(config, &jar).redirect(Policy::none()).build()?;
        let redirecting = base_builder(config, &jar).redirect(Policy::limited(10)).build()?;

        let mut json_headers = HeaderMap::new();
        json_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let json = base_builder(config, &jar)
            .redirect(Policy::none())
            .default_headers(json_headers)
            .build()?;

        Ok(Self {
            jar,
            no_redirect,
            redirecting,
            json,
        })
    }

    /// Client that returns 3xx responses as-is.
    #[must_use]
    pub fn no_redirect(&self) -> &Client {
        &self.no_redirect
    }

    /// Client that follows redirects to the final landed URL.
    #[must_use]
    pub fn redirecting(&self) -> &Client {
        &self.redirecting
    }

    /// Client for JSON request/response endpoints.
    #[must_use]
    pub fn json(&self) -> &Client {
        &self.json
    }

    /// The cookie jar shared by every transport.
    #[must_use]
    pub fn jar(&self) -> &Arc<Jar> {
        &self.jar
    }
}

fn base_builder(config: &AuthConfig, jar: &Arc<Jar>) -> ClientBuilder {
    Client::builder()
        .cookie_provider(Arc::clone(jar))
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout())
}

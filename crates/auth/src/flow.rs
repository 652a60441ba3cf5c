//! Browser-less replay of the identity provider's authorization-code + PKCE login.
//!
//! The provider's login pages were built for a browser, so a login is a fixed
//! sequence of five exchanges (see [`LoginStep`]). Each step is its own method
//! on `LoginAttempt`, consumes the typed output of the previous one, and
//! fails with [`LabsError::Protocol`] naming itself when the redirect or query
//! parameter it needs is missing.

use labs_config::{AuthConfig, Config};
use labs_types::{
    AccessTokenBundle, LabsError, LoginCredentials, LoginStep, Result, http::json_response,
};
use reqwest::{
    Client, Response, Url,
    header::{ACCEPT, LOCATION},
};
use secrecy::ExposeSecret as _;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{pkce::PkceMaterial, transport::Transports};

/// The `state` value the provider assigned to this login, read from step 1's redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginState(pub String);

/// Absolute URL the password step redirects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeUrl(pub Url);

/// Single-use authorization code from the final landed URL of step 4.
///
/// Consumed by value in the token exchange.
#[derive(Debug, PartialEq, Eq)]
pub struct AuthorizationCode(pub String);

/// Logs into the labs identity provider and opens service sessions.
pub struct AuthFlow {
    pub(crate) config: AuthConfig,
    pub(crate) session_url: String,
    pub(crate) session_http: Client,
}

impl AuthFlow {
    /// Create a flow for the identity provider and labs service in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let session_http = Client::builder()
            .user_agent(config.auth.user_agent.as_str())
            .timeout(config.auth.timeout())
            .build()?;
        Ok(Self {
            config: config.auth.clone(),
            session_url: format!(
                "{}/api/labs/auth/login",
                config.labs.base_url.trim_end_matches('/')
            ),
            session_http,
        })
    }

    /// Run the five-step login and return the identity provider's tokens.
    ///
    /// Every call uses a fresh cookie jar and fresh PKCE material, so
    /// concurrent logins through one `AuthFlow` do not interfere.
    ///
    /// # Errors
    ///
    /// Returns [`LabsError::Protocol`] if an expected redirect or parameter is
    /// absent, and transport or deserialization errors unchanged.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AccessTokenBundle> {
        let attempt = LoginAttempt::new(&self.config)?;

        let state = attempt.authorize().await?;
        attempt
            .submit_identifier(&state, &credentials.username)
            .await?;
        let resume = attempt.submit_password(&state, credentials).await?;
        let code = attempt.resume(resume).await?;
        let bundle = attempt.exchange_code(code).await?;

        info!(expires_in = bundle.expires_in, "identity provider login successful");
        Ok(bundle)
    }
}

/// State owned by one login: its transports, cookie jar and PKCE values.
pub(crate) struct LoginAttempt<'a> {
    config: &'a AuthConfig,
    transports: Transports,
    pkce: PkceMaterial,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    code: &'a str,
    code_verifier: &'a str,
    redirect_uri: &'a str,
    client_id: &'a str,
    grant_type: &'static str,
}

impl<'a> LoginAttempt<'a> {
    pub(crate) fn new(config: &'a AuthConfig) -> Result<Self> {
        Ok(Self {
            config,
            transports: Transports::new(config)?,
            pkce: PkceMaterial::generate(config.verifier_length),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let raw = format!("{}{path}", self.config.base_url.trim_end_matches('/'));
        Url::parse(&raw).map_err(|e| LabsError::Config(format!("invalid endpoint {raw}: {e}")))
    }

    /// Step 1: `GET /authorize` without following the redirect.
    ///
    /// The provider only reveals its `state` on the redirect itself.
    pub(crate) async fn authorize(&self) -> Result<LoginState> {
        let step = LoginStep::Authorize;
        let mut url = self.endpoint("/authorize")?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("audience", &self.config.audience)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("max_age", "0")
            .append_pair("scope", &self.config.scope)
            .append_pair("response_type", "code")
            .append_pair("response_mode", "query")
            .append_pair("auth0Client", &self.config.auth0_client)
            .append_pair("state", &self.pkce.state)
            .append_pair("nonce", &self.pkce.nonce)
            .append_pair("code_challenge", &self.pkce.code_challenge)
            .append_pair("code_challenge_method", "S256");

        debug!(step = %step, "requesting authorization");
        let resp = self
            .transports
            .no_redirect()
            .get(url)
            .header(ACCEPT, "*/*")
            .send()
            .await?;

        let location =
            location(&resp).ok_or_else(|| LabsError::protocol(step, "no location header"))?;
        let state = query_param(&location, "state")
            .ok_or_else(|| LabsError::protocol(step, "no state in location"))?;
        Ok(LoginState(state))
    }

    /// Step 2: `POST /u/login/identifier` with the username.
    ///
    /// Nothing is read from the response; only transport failures abort.
    pub(crate) async fn submit_identifier(&self, state: &LoginState, username: &str) -> Result<()> {
        let step = LoginStep::Identifier;
        let mut url = self.endpoint("/u/login/identifier")?;
        url.query_pairs_mut().append_pair("state", &state.0);
        let form = [
            ("state", state.0.as_str()),
            ("username", username),
            ("js-available", "true"),
            ("webauthn-available", "true"),
            ("is-brave", "false"),
            ("webauthn-platform-available", "true"),
            ("action", "default"),
        ];

        debug!(step = %step, "submitting identifier");
        let resp = self
            .transports
            .redirecting()
            .post(url)
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() && !status.is_redirection() {
            warn!(step = %step, status = status.as_u16(), "identifier step returned an error status");
        }
        Ok(())
    }

    /// Step 3: `POST /u/login/password`, keeping the resume redirect.
    pub(crate) async fn submit_password(
        &self,
        state: &LoginState,
        credentials: &LoginCredentials,
    ) -> Result<ResumeUrl> {
        let step = LoginStep::Password;
        let mut url = self.endpoint("/u/login/password")?;
        url.query_pairs_mut().append_pair("state", &state.0);
        let form = [
            ("state", state.0.as_str()),
            ("username", credentials.username.as_str()),
            ("password", credentials.password.expose_secret()),
            ("action", "default"),
        ];

        debug!(step = %step, "submitting password");
        let resp = self
            .transports
            .no_redirect()
            .post(url)
            .header(ACCEPT, "*/*")
            .form(&form)
            .send()
            .await?;

        location(&resp)
            .map(ResumeUrl)
            .ok_or_else(|| LabsError::protocol(step, "no location header"))
    }

    /// Step 4: follow the resume URL to the callback carrying the `code`.
    pub(crate) async fn resume(&self, resume: ResumeUrl) -> Result<AuthorizationCode> {
        let step = LoginStep::Resume;

        debug!(step = %step, "following resume redirect");
        let resp = self
            .transports
            .redirecting()
            .get(resume.0)
            .header(ACCEPT, "*/*")
            .send()
            .await?;

        query_param(resp.url(), "code")
            .map(AuthorizationCode)
            .ok_or_else(|| LabsError::protocol(step, "no code in landed url"))
    }

    /// Step 5: exchange the code and verifier for tokens.
    pub(crate) async fn exchange_code(&self, code: AuthorizationCode) -> Result<AccessTokenBundle> {
        let step = LoginStep::TokenExchange;
        let url = self.endpoint("/oauth/token")?;
        let body = TokenRequest {
            code: &code.0,
            code_verifier: &self.pkce.code_verifier,
            redirect_uri: &self.config.redirect_uri,
            client_id: &self.config.client_id,
            grant_type: "authorization_code",
        };

        debug!(step = %step, "exchanging authorization code");
        let resp = self.transports.json().post(url).json(&body).send().await?;
        json_response(resp).await
    }
}

/// The response's `Location` header, resolved against the request URL.
fn location(resp: &Response) -> Option<Url> {
    let value = resp.headers().get(LOCATION)?.to_str().ok()?;
    resp.url().join(value).ok()
}

/// First non-empty value of the query parameter `name`.
fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

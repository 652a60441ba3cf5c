//! Labs service session creation.

use labs_types::{AccessTokenBundle, Result, ServiceSession, http::json_response};
use reqwest::header::AUTHORIZATION;
use tracing::info;

use crate::AuthFlow;

impl AuthFlow {
    /// Trade the identity provider's access token for a labs service session.
    ///
    /// A single `POST /api/labs/auth/login`; failures are returned as-is.
    ///
    /// # Errors
    ///
    /// Returns a transport error, [`labs_types::LabsError::Upstream`] on a
    /// non-2xx status, or a deserialization error if the body has no session.
    pub async fn create_session(&self, bundle: &AccessTokenBundle) -> Result<ServiceSession> {
        let resp = self
            .session_http
            .post(&self.session_url)
            .header(AUTHORIZATION, bundle.bearer())
            .send()
            .await?;
        let session = json_response(resp).await?;
        info!("labs session created");
        Ok(session)
    }
}

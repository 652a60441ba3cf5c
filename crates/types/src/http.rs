//! Response helpers shared by the login flow and the task client.

use crate::{LabsError, Result};
use serde::de::DeserializeOwned;

/// Checks the status of a JSON endpoint response and deserializes its body.
///
/// Non-2xx responses become [`LabsError::Upstream`] carrying the body text;
/// bodies that do not match `T` become [`LabsError::Serialization`].
///
/// # Errors
///
/// Returns `LabsError::Upstream` on non-success status, `LabsError::Http` if
/// the body cannot be read, or `LabsError::Serialization` on a shape mismatch.
pub async fn json_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(LabsError::Upstream {
            status: status.as_u16(),
            body,
        });
    }
    let text = resp.text().await?;
    Ok(serde_json::from_str(&text)?)
}

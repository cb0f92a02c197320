//! HTTP plumbing shared by every remote call.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use crate::error::ApiError;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Issues a GET for `url` and decodes the JSON body.
///
/// Status mapping is uniform across endpoints: 404 becomes
/// [`ApiError::NotFound`], any other non-success status becomes
/// [`ApiError::Http`] carrying the response body as the message.
pub async fn get_json<C: HttpClient, T: DeserializeOwned>(
    client: &C,
    url: Url,
) -> Result<T, ApiError> {
    debug!(url = %url, "GET");
    let req = reqwest::Request::new(Method::GET, url.clone());
    let resp = client.execute(req).await?;

    let status = resp.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        let body = resp.text().await.unwrap_or_default();
        let detail = if body.is_empty() { url.to_string() } else { body };
        return Err(ApiError::NotFound(detail));
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::Http {
            status: status.as_u16(),
            message: body,
        });
    }

    resp.json::<T>()
        .await
        .map_err(|e| ApiError::Transport(format!("invalid response body: {e}")))
}

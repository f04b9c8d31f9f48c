//! HTTP plumbing for the product API.

mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use crate::error::FetchError;

/// Sends a GET to `url` with the given query pairs and returns the body.
///
/// Non-success statuses are returned as [`FetchError::Status`] with the body
/// text attached.
pub async fn fetch_bytes<C: HttpClient>(
    client: &C,
    url: &str,
    query: &[(&str, &str)],
) -> Result<Vec<u8>, FetchError> {
    let mut url =
        reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }

    let req = reqwest::Request::new(reqwest::Method::GET, url);
    let resp = client.execute(req).await?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(FetchError::Status { status, body });
    }

    Ok(resp.bytes().await?.to_vec())
}


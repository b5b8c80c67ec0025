//! Client for the Aster futures v3 REST API.
//!
//! Requests are authenticated with the off-chain "user/signer" delegation scheme:
//! the request parameters are canonicalized into a sorted JSON string, ABI-encoded
//! together with the delegating `user`, the `signer` and a microsecond nonce, hashed
//! with Keccak-256 and personal-signed with the signer's secp256k1 key.
//!
//! - [`signing`] holds the deterministic canonicalization and signing procedure.
//! - [`futures`] holds the HTTP client and typed order requests.

pub mod clock;
pub mod error;
pub mod futures;
pub mod signing;
pub mod types;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client as ReqwestClient, Method, Request, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Production host of the futures REST API.
pub const ASTER_FUTURES_HOST: &str = "https://fapi.asterdex.com";

/// `recvWindow` inserted into every signed request unless configured otherwise.
pub const DEFAULT_RECV_WINDOW: u64 = 50_000;

const CLIENT_USER_AGENT: &str = concat!("aster-futures-client/", env!("CARGO_PKG_VERSION"));

/// Unparsed response of a signed call.
///
/// Non-2xx statuses are not turned into errors; the exchange reports
/// rejections in the body and callers decide how to read them.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct RawResponse {
    pub method: Method,
    pub path: String,
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

async fn request(
    client: &ReqwestClient,
    mut request: Request,
    headers: Option<HeaderMap>,
) -> Result<RawResponse> {
    let method = request.method().clone();
    let path = request.url().path().to_owned();

    if let Some(h) = headers {
        request.headers_mut().extend(h);
    }
    if !request.headers().contains_key(USER_AGENT) {
        request
            .headers_mut()
            .insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(%method, url = %request.url(), "sending signed request");

    let response = client.execute(request).await?;
    let status = response.status();
    let body = response.text().await?;

    #[cfg(feature = "tracing")]
    tracing::debug!(%method, %path, %status, "received response");

    Ok(RawResponse {
        method,
        path,
        status,
        body,
    })
}

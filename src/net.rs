use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::TransportError;

/// Where the lesson server lives and how to authenticate against it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub base_url: String,
    /// Opaque bearer token; never inspected here.
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Endpoint {
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.into(),
            token,
            timeout_secs,
        }
    }

    pub fn url(&self, path: &str) -> Result<String, TransportError> {
        let base = self.base_url.trim_end_matches('/');
        if base.is_empty() {
            return Err(TransportError::NotConfigured);
        }
        Ok(format!("{base}/{}", path.trim_start_matches('/')))
    }
}

#[cfg(feature = "network")]
fn client(endpoint: &Endpoint) -> Result<reqwest::blocking::Client, TransportError> {
    reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(endpoint.timeout_secs))
        .build()
        .map_err(|e| TransportError::Request(e.to_string()))
}

#[cfg(feature = "network")]
fn send(
    request: reqwest::blocking::RequestBuilder,
    endpoint: &Endpoint,
    url: &str,
) -> Result<reqwest::blocking::Response, TransportError> {
    let request = match &endpoint.token {
        Some(token) => request.bearer_auth(token),
        None => request,
    };
    let response = request
        .send()
        .map_err(|e| TransportError::Request(e.to_string()))?;
    if !response.status().is_success() {
        return Err(TransportError::Status {
            status: response.status().as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response)
}

#[cfg(feature = "network")]
pub fn get_json<T: DeserializeOwned>(endpoint: &Endpoint, path: &str) -> Result<T, TransportError> {
    let url = endpoint.url(path)?;
    let response = send(client(endpoint)?.get(&url), endpoint, &url)?;
    response
        .json()
        .map_err(|e| TransportError::Decode(e.to_string()))
}

#[cfg(feature = "network")]
pub fn post_json<B: Serialize>(
    endpoint: &Endpoint,
    path: &str,
    body: &B,
) -> Result<(), TransportError> {
    let url = endpoint.url(path)?;
    send(client(endpoint)?.post(&url).json(body), endpoint, &url)?;
    Ok(())
}

#[cfg(not(feature = "network"))]
pub fn get_json<T: DeserializeOwned>(
    _endpoint: &Endpoint,
    _path: &str,
) -> Result<T, TransportError> {
    Err(TransportError::Disabled)
}

#[cfg(not(feature = "network"))]
pub fn post_json<B: Serialize>(
    _endpoint: &Endpoint,
    _path: &str,
    _body: &B,
) -> Result<(), TransportError> {
    Err(TransportError::Disabled)
}

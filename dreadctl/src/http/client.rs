//! HTTP client implementation

use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;
use url::Url;

use crate::errors::TransportError;

/// Credentials for the deployment service
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    /// Base endpoint, with or without scheme
    pub api: String,
}

/// HTTP client options
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Per-request timeout; `None` keeps reqwest's default of no timeout
    pub request_timeout: Option<Duration>,
}

/// HTTP client for the deployment service
pub struct HttpClient {
    client: Client,
    base_url: Url,
    username: String,
    password: SecretString,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(credentials: Credentials, options: &ClientOptions) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            base_url: normalize_base_uri(&credentials.api)?,
            username: credentials.username,
            password: credentials.password,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve path segments against the base URL
    pub fn url(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::Url(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, TransportError> {
        let url = self.url(segments)?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .send()
            .await?;

        read_json(response, "GET").await
    }

    /// Make a form-encoded POST request
    pub async fn post_form<T: DeserializeOwned, B: Serialize>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, TransportError> {
        let url = self.url(segments)?;
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .form(body)
            .send()
            .await?;

        read_json(response, "POST").await
    }
}

async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    method: &str,
) -> Result<T, TransportError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        debug!("HTTP {} failed: {} - {}", method, status, body);
        return Err(TransportError::Status {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|e| TransportError::Malformed {
        reason: e.to_string(),
        body,
    })
}

/// Normalize an endpoint into a canonical base URL.
///
/// A missing scheme becomes `http://`, or `https://` when the port is 443.
/// Trailing slashes are dropped; any base path is kept.
pub fn normalize_base_uri(api: &str) -> Result<Url, TransportError> {
    let api = api.trim().trim_end_matches('/');
    if api.is_empty() {
        return Err(TransportError::Url("empty endpoint".to_string()));
    }

    let with_scheme = if api.contains("://") {
        api.to_string()
    } else {
        let authority = api.split('/').next().unwrap_or(api);
        if authority.ends_with(":443") {
            format!("https://{}", api)
        } else {
            format!("http://{}", api)
        }
    };

    let url = Url::parse(&with_scheme).map_err(|e| TransportError::Url(format!("{}: {}", api, e)))?;
    if url.cannot_be_a_base() {
        return Err(TransportError::Url(format!("{} cannot be a base", api)));
    }
    Ok(url)
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP implementation of [`RouterApi`] for the router's REST API.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::{Value, json};
use tokio::sync::Mutex;

use super::endpoints;
use super::{Ack, MasterPayload, RouterApi, RouterCommand};
use crate::error::{ApiError, ParseError};
use crate::normalize::{device_list, path};
use crate::registry::WritePath;
use crate::types::{DeviceId, Target};

/// Response keys the firmware has used for the login token, in order.
const TOKEN_KEYS: &[&str] = &["token", "access_token", "accessToken", "jwt", "session"];

/// Longest response body excerpt kept in errors.
const BODY_EXCERPT: usize = 300;

// ============================================================================
// HttpConfig
// ============================================================================

/// Connection settings for one router.
///
/// # Examples
///
/// ```
/// use azrouter_lib::protocol::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig::new("192.168.1.50")
///     .with_credentials("admin", "secret")
///     .with_timeout(Duration::from_secs(5));
/// assert_eq!(config.base_url(), "http://192.168.1.50");
///
/// let config = HttpConfig::new("router.local").with_https().with_port(8443);
/// assert_eq!(config.base_url(), "https://router.local:8443");
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    host: String,
    port: u16,
    use_https: bool,
    credentials: Option<(String, String)>,
    timeout: Duration,
    verify_ssl: bool,
}

impl HttpConfig {
    /// Default HTTP port.
    pub const DEFAULT_PORT: u16 = 80;
    /// Default HTTPS port.
    pub const DEFAULT_HTTPS_PORT: u16 = 443;
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration for the given host.
    ///
    /// The host may already carry a scheme (`https://router.local`), in which
    /// case the scheme and any port in it are used as given.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into().trim().trim_end_matches('/').to_string(),
            port: Self::DEFAULT_PORT,
            use_https: false,
            credentials: None,
            timeout: Self::DEFAULT_TIMEOUT,
            verify_ssl: true,
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enables HTTPS.
    ///
    /// If the port hasn't been explicitly set, it changes to 443.
    #[must_use]
    pub fn with_https(mut self) -> Self {
        self.use_https = true;
        if self.port == Self::DEFAULT_PORT {
            self.port = Self::DEFAULT_HTTPS_PORT;
        }
        self
    }

    /// Sets the login credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables or disables certificate validation.
    #[must_use]
    pub fn with_verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns whether HTTPS is enabled.
    #[must_use]
    pub fn use_https(&self) -> bool {
        self.use_https
    }

    /// Returns the credentials if set.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.credentials
            .as_ref()
            .map(|(u, p)| (u.as_str(), p.as_str()))
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns whether certificates are validated.
    #[must_use]
    pub fn verify_ssl(&self) -> bool {
        self.verify_ssl
    }

    /// Builds the base URL from this configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            return self.host.clone();
        }
        let scheme = if self.use_https { "https" } else { "http" };
        let port_suffix = if (self.use_https && self.port == Self::DEFAULT_HTTPS_PORT)
            || (!self.use_https && self.port == Self::DEFAULT_PORT)
        {
            String::new()
        } else {
            format!(":{}", self.port)
        };
        format!("{scheme}://{}{port_suffix}", self.host)
    }

    /// Creates an [`HttpClient`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidAddress`] if the host is empty or the
    /// underlying client cannot be built.
    pub fn into_client(self) -> Result<HttpClient, ApiError> {
        if self.host.is_empty() {
            return Err(ApiError::InvalidAddress("host is required".to_string()));
        }
        let base_url = self.base_url();

        let client = Client::builder()
            .timeout(self.timeout)
            .cookie_store(true)
            .danger_accept_invalid_certs(!self.verify_ssl)
            .build()
            .map_err(|e| ApiError::InvalidAddress(e.to_string()))?;

        let credentials = self
            .credentials
            .map(|(username, password)| Credentials { username, password });

        Ok(HttpClient {
            base_url,
            client,
            credentials,
            session: Arc::new(RwLock::new(Session::LoggedOut)),
            login_lock: Arc::new(Mutex::new(())),
        })
    }
}

// ============================================================================
// HttpClient
// ============================================================================

/// Login credentials.
#[derive(Clone)]
struct Credentials {
    username: String,
    password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Session {
    LoggedOut,
    /// Logged in; the firmware returned no token and relies on cookies.
    Cookie,
    Bearer(String),
}

/// Client for the router's REST API.
///
/// Clones share the HTTP connection pool and the login session.
///
/// # Examples
///
/// ```no_run
/// use azrouter_lib::protocol::{HttpConfig, RouterApi};
///
/// # async fn example() -> Result<(), azrouter_lib::ApiError> {
/// let client = HttpConfig::new("192.168.1.50")
///     .with_credentials("admin", "secret")
///     .into_client()?;
/// let master = client.fetch_master().await?;
/// println!("{} devices", master.devices.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    client: Client,
    credentials: Option<Credentials>,
    session: Arc<RwLock<Session>>,
    login_lock: Arc<Mutex<()>>,
}

impl HttpClient {
    /// Returns the base URL of the router.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Logs in and stores the session token.
    ///
    /// Called on demand by every request; calling it explicitly forces a
    /// fresh login.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Auth`] if the credentials are rejected.
    pub async fn login(&self) -> Result<(), ApiError> {
        let _guard = self.login_lock.lock().await;
        self.login_locked().await
    }

    async fn login_locked(&self) -> Result<(), ApiError> {
        let Some(credentials) = &self.credentials else {
            *self.session.write() = Session::Cookie;
            return Ok(());
        };

        let body = json!({
            "data": {
                "username": credentials.username,
                "password": credentials.password,
            }
        });
        tracing::debug!(url = %self.url(endpoints::LOGIN), username = %credentials.username, "Logging in");

        let response = self
            .client
            .post(self.url(endpoints::LOGIN))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        if is_auth_status(response.status()) {
            return Err(ApiError::Auth);
        }
        if !response.status().is_success() {
            return Err(ApiError::Unreachable(format!(
                "login returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let body = read_json(response).await?;
        let session = TOKEN_KEYS
            .iter()
            .find_map(|key| body.get(key).and_then(Value::as_str))
            .filter(|token| !token.is_empty())
            .map_or(Session::Cookie, |token| Session::Bearer(token.to_string()));
        tracing::debug!(bearer = matches!(session, Session::Bearer(_)), "Logged in");
        *self.session.write() = session;
        Ok(())
    }

    async fn ensure_session(&self) -> Result<(), ApiError> {
        if *self.session.read() != Session::LoggedOut {
            return Ok(());
        }
        let _guard = self.login_lock.lock().await;
        // Another request may have logged in while we waited.
        if *self.session.read() != Session::LoggedOut {
            return Ok(());
        }
        self.login_locked().await
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    async fn send(
        &self,
        method: &Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Response, ApiError> {
        let token = match &*self.session.read() {
            Session::Bearer(token) => Some(token.clone()),
            Session::LoggedOut | Session::Cookie => None,
        };
        let mut request = self.client.request(method.clone(), self.url(endpoint));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        tracing::debug!(%method, endpoint, "Sending request");
        request.send().await.map_err(transport_error)
    }

    /// Sends a request, logging in again once if the session was rejected.
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Response, ApiError> {
        self.ensure_session().await?;
        let response = self.send(&method, endpoint, body).await?;
        if !is_auth_status(response.status()) {
            return Ok(response);
        }

        tracing::debug!(endpoint, status = response.status().as_u16(), "Session rejected, logging in again");
        *self.session.write() = Session::LoggedOut;
        self.login().await?;

        let retry = self.send(&method, endpoint, body).await?;
        if is_auth_status(retry.status()) {
            return Err(ApiError::Auth);
        }
        Ok(retry)
    }

    async fn get(&self, endpoint: &str) -> Result<Value, ApiError> {
        let response = self.request(Method::GET, endpoint, None).await?;
        let status = response.status();
        if !status.is_success() {
            let message = format!("GET {endpoint} returned HTTP {}", status.as_u16());
            return Err(if status.is_server_error() {
                ApiError::Unreachable(message)
            } else {
                ApiError::Malformed(message)
            });
        }
        let body = read_json(response).await?;
        tracing::debug!(endpoint, body = %body, "Received response");
        Ok(body)
    }

    async fn post(&self, endpoint: &str, body: &Value) -> Result<Value, ApiError> {
        let response = self.request(Method::POST, endpoint, Some(body)).await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message: excerpt(&text),
            });
        }
        // Acks are informational; a non-JSON body is not an error.
        let text = response.text().await.map_err(transport_error)?;
        Ok(serde_json::from_str(&text).unwrap_or(Value::Null))
    }

    async fn fetch_devices(&self) -> Result<Vec<Value>, ApiError> {
        let body = self.get(endpoints::DEVICES).await?;
        Ok(device_list(body)?)
    }

    async fn write_master_setting(&self, setting: &str, value: &Value) -> Result<Value, ApiError> {
        let mut settings = self.get(endpoints::SETTINGS).await?;
        if !settings.is_object() {
            return Err(ParseError::UnexpectedFormat("settings is not an object".to_string()).into());
        }
        path::patch(&mut settings, setting, value)?;
        self.post(endpoints::SETTINGS, &json!({ "data": settings }))
            .await
    }

    async fn write_device_settings(
        &self,
        id: &DeviceId,
        settings: &[&str],
        value: &Value,
    ) -> Result<Value, ApiError> {
        let mut device = self.fetch_device(id).await?;
        let mut written = 0;
        for setting in settings {
            written += path::patch(&mut device, setting, value)?;
        }
        if written == 0 {
            return Err(ParseError::MissingField(settings.join(", ")).into());
        }
        self.post(endpoints::DEVICE_SETTINGS, &json!({ "data": device }))
            .await
    }
}

impl RouterApi for HttpClient {
    async fn fetch_master(&self) -> Result<MasterPayload, ApiError> {
        let (power, status, devices, settings) = tokio::join!(
            self.get(endpoints::POWER),
            self.get(endpoints::STATUS),
            self.fetch_devices(),
            self.get(endpoints::SETTINGS),
        );

        let settings = settings.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Master settings unavailable");
            Value::Object(serde_json::Map::new())
        });

        Ok(MasterPayload {
            power: power?,
            status: status?,
            devices: devices?,
            settings,
        })
    }

    async fn fetch_device(&self, id: &DeviceId) -> Result<Value, ApiError> {
        self.fetch_devices()
            .await?
            .into_iter()
            .find(|device| {
                path::lookup(device, "common.id")
                    .and_then(DeviceId::from_json)
                    .is_some_and(|found| &found == id)
            })
            .ok_or_else(|| ApiError::NotFound(id.clone()))
    }

    async fn send_command(&self, command: &RouterCommand) -> Result<Ack, ApiError> {
        command.validate()?;
        let value = command.value.to_wire();
        tracing::debug!(device = %command.target, field = %command.field, value = %value, "Sending command");

        let body = match (&command.target, command.write) {
            (Target::Master, WritePath::MasterBoost) => {
                self.post(endpoints::MASTER_BOOST, &json!({ "data": { "boost": value } }))
                    .await?
            }
            (Target::Master, WritePath::MasterSetting(setting)) => {
                self.write_master_setting(setting, &value).await?
            }
            (Target::Device(id), WritePath::DeviceBoost) => {
                let payload = json!({
                    "data": {
                        "device": { "common": { "id": id.to_json() } },
                        "boost": value,
                    }
                });
                self.post(endpoints::DEVICE_BOOST, &payload).await?
            }
            (Target::Device(id), WritePath::DeviceSetting(settings)) => {
                self.write_device_settings(id, settings, &value).await?
            }
            (target, write) => {
                return Err(ApiError::Malformed(format!(
                    "{write:?} cannot be sent to {target}"
                )));
            }
        };

        Ok(Ack {
            target: command.target.clone(),
            body,
        })
    }
}

fn is_auth_status(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Unreachable("request timed out".to_string())
    } else if e.is_decode() {
        ApiError::Malformed(e.to_string())
    } else {
        ApiError::Unreachable(e.to_string())
    }
}

async fn read_json(response: Response) -> Result<Value, ApiError> {
    let text = response.text().await.map_err(transport_error)?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| ParseError::Json(e).into())
}

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(BODY_EXCERPT) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_config_default_values() {
        let config = HttpConfig::new("192.168.1.50");
        assert_eq!(config.host(), "192.168.1.50");
        assert_eq!(config.port(), 80);
        assert!(!config.use_https());
        assert!(config.credentials().is_none());
        assert!(config.verify_ssl());
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn http_config_with_https() {
        let config = HttpConfig::new("192.168.1.50").with_https();
        assert_eq!(config.port(), 443);
        assert_eq!(config.base_url(), "https://192.168.1.50");
    }

    #[test]
    fn http_config_with_https_custom_port() {
        let config = HttpConfig::new("192.168.1.50").with_port(8443).with_https();
        assert_eq!(config.port(), 8443);
        assert_eq!(config.base_url(), "https://192.168.1.50:8443");
    }

    #[test]
    fn http_config_host_with_scheme() {
        let config = HttpConfig::new("https://router.local:8080/");
        assert_eq!(config.base_url(), "https://router.local:8080");
    }

    #[test]
    fn http_config_into_client() {
        let client = HttpConfig::new("192.168.1.50")
            .with_credentials("admin", "secret")
            .with_verify_ssl(false)
            .into_client()
            .unwrap();
        assert_eq!(client.base_url(), "http://192.168.1.50");
        assert!(client.credentials.is_some());
    }

    #[test]
    fn empty_host_is_rejected() {
        assert!(matches!(
            HttpConfig::new("  ").into_client(),
            Err(ApiError::InvalidAddress(_))
        ));
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials {
            username: "admin".to_string(),
            password: "secret".to_string(),
        };
        let debug = format!("{creds:?}");
        assert!(debug.contains("admin"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn excerpt_truncates_long_bodies() {
        let long = "x".repeat(BODY_EXCERPT + 10);
        assert_eq!(excerpt(&long).len(), BODY_EXCERPT + 3);
        assert_eq!(excerpt("short"), "short");
    }
}

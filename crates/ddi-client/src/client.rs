//! Core request pipeline and session state of the API client.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ddi_api_models::User;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::{ClientConfig, SessionMode};
use crate::cookies::SessionCookies;
use crate::error::{ApiError, ConfigError};
use crate::session::{FileSessionStore, MemorySessionStore, PersistedSession, SessionStore};

const HEADER_REQUEST_ID: &str = "x-request-id";
const APPLICATION_JSON: &str = "application/json";

/// Raw bodies up to this many characters are shown to the user verbatim.
const SHORT_BODY_LIMIT: usize = 200;

/// Endpoints whose 401/403 answers mean "bad credentials", not "session expired".
const AUTH_ENDPOINTS: &[&str] = &[
    "/auth/login",
    "/auth/signup",
    "/auth/forgot-password",
    "/auth/validate-reset-token",
    "/auth/reset-password",
];

/// Decoded body of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Body served with a JSON content type.
    Json(Value),
    /// Any other body, as text.
    Text(String),
}

impl Payload {
    /// Interpret the payload as JSON, parsing text bodies when needed.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] when a text body is not valid JSON.
    pub fn into_json(self) -> Result<Value, ApiError> {
        match self {
            Self::Json(value) => Ok(value),
            Self::Text(text) => serde_json::from_str(&text).map_err(|err| ApiError::decode(&err)),
        }
    }
}

pub(crate) enum RequestBody {
    Empty,
    Json(Value),
    Multipart(Form),
}

/// Session-aware client for the Demand Intelligence backend.
///
/// Cloning is cheap and every clone shares the same session, so one instance
/// can be created per process and handed to every caller.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    base_url: String,
    cookies: Option<Arc<SessionCookies>>,
    store: Box<dyn SessionStore>,
    session: RwLock<Option<PersistedSession>>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("cookies", &self.inner.cookies.is_some())
            .field("logged_in", &self.is_logged_in())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Build a client using the session backend selected by `config.session_mode`.
    ///
    /// # Errors
    ///
    /// Returns an error if no durable session location can be determined or the
    /// HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        let store: Box<dyn SessionStore> = match config.session_mode {
            SessionMode::Durable => {
                let path = config
                    .session_file
                    .clone()
                    .or_else(FileSessionStore::default_path)
                    .ok_or(ConfigError::SessionPathUnavailable)?;
                Box::new(FileSessionStore::new(path))
            }
            SessionMode::Ephemeral => Box::new(MemorySessionStore::new()),
        };
        Self::new(config, store)
    }

    /// Build a client over an explicit session store.
    ///
    /// A previously persisted session is restored immediately; unreadable or
    /// malformed data is discarded and the client starts logged out.
    ///
    /// # Errors
    ///
    /// Returns an error if the request identifier is not a valid header value
    /// or the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, store: Box<dyn SessionStore>) -> Result<Self, ConfigError> {
        let mut default_headers = HeaderMap::new();
        if let Some(request_id) = &config.request_id {
            let value =
                HeaderValue::from_str(request_id).map_err(|_| ConfigError::InvalidRequestId)?;
            default_headers.insert(HEADER_REQUEST_ID, value);
        }

        let mut builder = Client::builder().default_headers(default_headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let cookies = config
            .session_mode
            .uses_cookies()
            .then(|| Arc::new(SessionCookies::default()));
        if let Some(jar) = &cookies {
            builder = builder.cookie_provider(Arc::clone(jar));
        }
        let http = builder
            .build()
            .map_err(|source| ConfigError::HttpClient { source })?;

        let session = match store.restore() {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, "discarding unreadable persisted session");
                if let Err(clear_err) = store.clear() {
                    warn!(error = %clear_err, "failed to clear unreadable persisted session");
                }
                None
            }
        };
        if let Some(restored) = &session {
            debug!(user_id = restored.user.id, "restored persisted session");
        }

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: config.base_url_str().to_string(),
                cookies,
                store,
                session: RwLock::new(session),
            }),
        })
    }

    /// Root address every endpoint is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Current user, without touching the network.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.read_session().as_ref().map(|session| session.user.clone())
    }

    /// Whether a user record is present, without touching the network.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.read_session().is_some()
    }

    /// Drop the in-memory session, the persisted slot, and any session cookies.
    pub fn clear_session(&self) {
        let previous = self.write_session().take();
        if let Err(err) = self.inner.store.clear() {
            warn!(error = %err, "failed to clear persisted session");
        }
        if let Some(cookies) = &self.inner.cookies {
            cookies.reset();
        }
        if let Some(session) = previous {
            info!(user_id = session.user.id, "session cleared");
        }
    }

    pub(crate) fn establish_session(&self, session: PersistedSession) {
        if let Err(err) = self.inner.store.persist(&session) {
            warn!(error = %err, "failed to persist session; keeping it in memory only");
        }
        let user_id = session.user.id;
        *self.write_session() = Some(session);
        info!(user_id, "session established");
    }

    /// Issue a request and decode the successful body.
    ///
    /// `endpoint` is a path relative to the base URL. JSON bodies are decoded
    /// into [`Payload::Json`]; anything else is returned as text.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] for transport failures and non-2xx
    /// responses. A 401/403 on a non-auth endpoint clears the session first.
    pub async fn request(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<Value>,
    ) -> Result<Payload, ApiError> {
        let body = body.map_or(RequestBody::Empty, RequestBody::Json);
        let response = self.execute(endpoint, method, body).await?;
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains(APPLICATION_JSON));
        let text = response.text().await.map_err(|err| {
            error!(endpoint, error = %err, "failed to read response body");
            ApiError::network(&err)
        })?;

        if is_json {
            serde_json::from_str(&text).map(Payload::Json).map_err(|err| {
                error!(endpoint, error = %err, "response declared JSON but did not parse");
                ApiError::decode(&err)
            })
        } else {
            Ok(Payload::Text(text))
        }
    }

    /// `GET` `endpoint` and decode the body into `T`.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`]; a shape mismatch is [`ApiError::Decode`].
    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.send_json(endpoint, Method::GET, None).await
    }

    /// `POST` `body` to `endpoint` and decode the response into `T`.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`]; a shape mismatch is [`ApiError::Decode`].
    pub async fn post_json<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body).map_err(|err| ApiError::Encode {
            detail: err.to_string(),
        })?;
        self.send_json(endpoint, Method::POST, Some(body)).await
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        let value = self.request(endpoint, method, body).await?.into_json()?;
        serde_json::from_value(value).map_err(|err| {
            error!(endpoint, error = %err, "response did not match the expected shape");
            ApiError::decode(&err)
        })
    }

    pub(crate) async fn request_bytes(
        &self,
        endpoint: &str,
        method: Method,
        body: RequestBody,
    ) -> Result<Vec<u8>, ApiError> {
        let response = self.execute(endpoint, method, body).await?;
        let bytes = response.bytes().await.map_err(|err| {
            error!(endpoint, error = %err, "failed to read response body");
            ApiError::network(&err)
        })?;
        Ok(bytes.to_vec())
    }

    pub(crate) async fn request_multipart(
        &self,
        endpoint: &str,
        form: Form,
    ) -> Result<Value, ApiError> {
        let bytes = self
            .request_bytes(endpoint, Method::POST, RequestBody::Multipart(form))
            .await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|err| {
            error!(endpoint, error = %err, "upload response was not JSON");
            ApiError::decode(&err)
        })
    }

    async fn execute(
        &self,
        endpoint: &str,
        method: Method,
        body: RequestBody,
    ) -> Result<Response, ApiError> {
        let path = normalize_endpoint(endpoint);
        let url = format!("{}{path}", self.inner.base_url);

        let mut builder = self.inner.http.request(method.clone(), &url);
        if let Some(token) = self.token() {
            builder = builder.bearer_auth(token);
        }
        builder = match body {
            RequestBody::Empty => builder.header(CONTENT_TYPE, APPLICATION_JSON),
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        debug!(%method, %url, "api request");
        let response = builder.send().await.map_err(|err| {
            error!(%method, %url, error = %err, "api request did not reach the server");
            ApiError::network(&err)
        })?;

        let status = response.status();
        if status.is_success() {
            debug!(%method, %url, status = status.as_u16(), "api response");
            return Ok(response);
        }

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
            && !is_auth_endpoint(&path)
        {
            warn!(
                %method,
                %url,
                status = status.as_u16(),
                "backend rejected the session; clearing local state"
            );
            self.clear_session();
            return Err(ApiError::Unauthorized {
                status: status.as_u16(),
            });
        }

        let body = match response.text().await {
            Ok(text) => text,
            Err(err) => {
                warn!(%method, %url, error = %err, "failed to read error body");
                String::new()
            }
        };
        error!(
            %method,
            %url,
            status = status.as_u16(),
            body = %body,
            "api request failed"
        );
        Err(ApiError::Http {
            status: status.as_u16(),
            message: failure_message(status, &body),
        })
    }

    fn token(&self) -> Option<String> {
        self.read_session()
            .as_ref()
            .and_then(|session| session.token.clone())
    }

    fn read_session(&self) -> RwLockReadGuard<'_, Option<PersistedSession>> {
        self.inner
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_session(&self) -> RwLockWriteGuard<'_, Option<PersistedSession>> {
        self.inner
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Ensure `endpoint` starts with a single `/`.
pub(crate) fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim();
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Whether `path` (optionally carrying a query string) targets a credential endpoint.
pub(crate) fn is_auth_endpoint(path: &str) -> bool {
    let route = path.split(['?', '#']).next().unwrap_or(path);
    let route = route.trim_end_matches('/');
    AUTH_ENDPOINTS.contains(&route)
}

/// Pick the user-facing message for a failed response.
///
/// Order: a `message` (or `error`) string in a JSON object body, then the raw
/// body, untouched, when it is short, then the status reason phrase.
pub(crate) fn failure_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error"] {
            if let Some(Value::String(message)) = map.get(key) {
                if !message.trim().is_empty() {
                    return message.clone();
                }
            }
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.chars().count() <= SHORT_BODY_LIMIT {
        return body.to_string();
    }

    status.canonical_reason().map_or_else(
        || format!("Request failed with status {}", status.as_u16()),
        str::to_string,
    )
}

/// Append URL-encoded query pairs to `path`.
pub(crate) fn with_query(path: &str, pairs: &[(&str, String)]) -> String {
    if pairs.is_empty() {
        return path.to_string();
    }
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    format!("{path}?{}", serializer.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_endpoint_adds_leading_slash() {
        assert_eq!(normalize_endpoint("health"), "/health");
        assert_eq!(normalize_endpoint("/health"), "/health");
        assert_eq!(normalize_endpoint(" products/list "), "/products/list");
    }

    #[test]
    fn auth_endpoints_ignore_query_and_trailing_slash() {
        assert!(is_auth_endpoint("/auth/login"));
        assert!(is_auth_endpoint("/auth/signup/"));
        assert!(is_auth_endpoint("/auth/reset-password?x=1"));
        assert!(!is_auth_endpoint("/auth/logout"));
        assert!(!is_auth_endpoint("/inventory"));
        assert!(!is_auth_endpoint("/auth/login-history"));
    }

    #[test]
    fn failure_message_prefers_json_message() {
        let message = failure_message(
            StatusCode::UNAUTHORIZED,
            r#"{"status":"error","message":"Invalid credentials"}"#,
        );
        assert_eq!(message, "Invalid credentials");
    }

    #[test]
    fn failure_message_falls_back_to_error_field() {
        let message = failure_message(
            StatusCode::BAD_REQUEST,
            r#"{"error":"store_id and date required"}"#,
        );
        assert_eq!(message, "store_id and date required");
    }

    #[test]
    fn failure_message_uses_short_raw_body() {
        let message = failure_message(StatusCode::BAD_GATEWAY, "Upstream unavailable");
        assert_eq!(message, "Upstream unavailable");
    }

    #[test]
    fn failure_message_keeps_raw_body_verbatim() {
        let message = failure_message(StatusCode::INTERNAL_SERVER_ERROR, "  Database down\n");
        assert_eq!(message, "  Database down\n");
    }

    #[test]
    fn failure_message_uses_reason_for_long_or_empty_bodies() {
        let long_body = "<html>".repeat(100);
        assert_eq!(
            failure_message(StatusCode::INTERNAL_SERVER_ERROR, &long_body),
            "Internal Server Error"
        );
        assert_eq!(
            failure_message(StatusCode::SERVICE_UNAVAILABLE, "   "),
            "Service Unavailable"
        );
    }

    #[test]
    fn failure_message_handles_unknown_status() -> Result<(), Box<dyn std::error::Error>> {
        let status = StatusCode::from_u16(599)?;
        assert_eq!(failure_message(status, ""), "Request failed with status 599");
        Ok(())
    }

    #[test]
    fn with_query_encodes_values() {
        assert_eq!(
            with_query(
                "/forecast",
                &[
                    ("store_id", "12345".to_string()),
                    ("target_date", "2026-01-02".to_string())
                ]
            ),
            "/forecast?store_id=12345&target_date=2026-01-02"
        );
        assert_eq!(
            with_query("/search", &[("q", "a b&c".to_string())]),
            "/search?q=a+b%26c"
        );
        assert_eq!(with_query("/health", &[]), "/health");
    }

    #[test]
    fn text_payload_parses_as_json_on_demand() -> Result<(), ApiError> {
        let value = Payload::Text(r#"{"ok":true}"#.to_string()).into_json()?;
        assert_eq!(value["ok"], Value::Bool(true));
        assert!(Payload::Text("plain".to_string()).into_json().is_err());
        Ok(())
    }
}

//! Single configured HTTP transport for the admin API.
//!
//! One pooled `reqwest::Client` bound to `{base_url}/api/admin`, JSON in
//! and out. A stored bearer token is attached to every request; its
//! absence sends the request unauthenticated. Every failure is normalized
//! into [`ApiError`], and a 401 triggers exactly one side effect: the
//! persisted token is cleared and the registered handler notified, unless
//! the client already held no token.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ApiSettings;
use crate::error::{ApiError, ApiResult};

use super::token::TokenStore;

/// Base path under the backend origin.
const ADMIN_BASE_PATH: &str = "/api/admin";

/// Seam for the auth session: invoked when the server declares the current
/// session invalid.
pub trait UnauthorizedHandler: Send + Sync {
    fn on_unauthorized(&self);
}

/// Wire shape of API error bodies: `{ "error": { "message", "code" } }`.
#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, serde::Deserialize)]
struct ErrorDetail {
    message: String,
    code: Option<String>,
}

pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
    unauthorized: RwLock<Option<Arc<dyn UnauthorizedHandler>>>,
}

impl HttpTransport {
    pub fn new(api: &ApiSettings, tokens: Arc<dyn TokenStore>) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .connect_timeout(Duration::from_secs(api.connect_timeout_secs))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .zstd(true)
            .use_rustls_tls()
            .build()
            .map_err(|e| ApiError::Configuration {
                key: "api".into(),
                source: e.into(),
            })?;

        let base_url = format!("{}{}", api.base_url.trim_end_matches('/'), ADMIN_BASE_PATH);

        Ok(Self {
            http,
            base_url,
            tokens,
            unauthorized: RwLock::new(None),
        })
    }

    /// Registers the forced sign-out handler. Wired once by the client
    /// facade when the auth session is created.
    pub fn set_unauthorized_handler(&self, handler: Arc<dyn UnauthorizedHandler>) {
        if let Ok(mut slot) = self.unauthorized.write() {
            *slot = Some(handler);
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ========================================================================
    // Verbs
    // ========================================================================

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request_json(Method::GET, path, &[], None::<&()>).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        self.request_json(Method::GET, path, query, None::<&()>)
            .await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.request_json(Method::POST, path, &[], Some(body)).await
    }

    /// POST with a body, discarding any response payload.
    pub async fn post_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<()> {
        self.request_unit(Method::POST, path, Some(body)).await
    }

    /// Bodyless POST, discarding any response payload.
    pub async fn post_empty(&self, path: &str) -> ApiResult<()> {
        self.request_unit(Method::POST, path, None::<&()>).await
    }

    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.request_json(Method::PATCH, path, &[], Some(body))
            .await
    }

    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        self.request_unit(Method::DELETE, path, None::<&()>).await
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn request_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> ApiResult<T> {
        let response = self.send(method, path, query, body).await?;
        response.json::<T>().await.map_err(|e| ApiError::Decode {
            path: path.to_string(),
            source: e.into(),
        })
    }

    async fn request_unit<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ApiResult<()> {
        self.send(method, path, &[], body).await?;
        Ok(())
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> ApiResult<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method.clone(), &url);

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(token) = self.tokens.load() {
            request = request.bearer_auth(token);
        }

        debug!(%method, path, "sending request");

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout {
                    method: method.to_string(),
                    path: path.to_string(),
                }
            } else {
                ApiError::Network {
                    method: method.to_string(),
                    path: path.to_string(),
                    source: e.into(),
                }
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body_text = response.text().await.unwrap_or_default();
        let error = normalize_error(status, path, &body_text);
        warn!(%method, path, status = status.as_u16(), error = %error, "request failed");

        if status == StatusCode::UNAUTHORIZED {
            self.force_sign_out();
        }

        Err(error)
    }

    /// Clears the persisted token and notifies the registered handler, but
    /// only when a token was actually held: an anonymous 401 (e.g. a bad
    /// login attempt) must not bounce a client that is already signed out.
    fn force_sign_out(&self) {
        if self.tokens.load().is_none() {
            return;
        }
        self.tokens.clear();
        let handler = self
            .unauthorized
            .read()
            .ok()
            .and_then(|slot| slot.clone());
        if let Some(handler) = handler {
            handler.on_unauthorized();
        }
    }
}

/// Maps a non-success response to the error taxonomy. Server-supplied
/// messages are preserved when the body carries the standard error shape.
fn normalize_error(status: StatusCode, path: &str, body: &str) -> ApiError {
    let detail = serde_json::from_str::<ErrorBody>(body).ok().map(|b| b.error);
    let message = detail
        .as_ref()
        .map(|d| d.message.clone())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    let code = detail.and_then(|d| d.code);

    match status {
        StatusCode::UNAUTHORIZED => ApiError::Auth { message },
        StatusCode::FORBIDDEN => ApiError::Forbidden { message },
        StatusCode::NOT_FOUND => ApiError::NotFound {
            resource: path.to_string(),
        },
        s if s.is_server_error() => ApiError::Server {
            status: s.as_u16(),
            message,
        },
        _ => ApiError::Validation { message, code },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::http::token::MemoryTokenStore;

    struct CountingHandler(AtomicUsize);

    impl UnauthorizedHandler for CountingHandler {
        fn on_unauthorized(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn transport_with(tokens: Arc<dyn TokenStore>) -> HttpTransport {
        HttpTransport::new(&ApiSettings::default(), tokens).unwrap()
    }

    #[test]
    fn test_base_url_includes_admin_path() {
        let transport = transport_with(Arc::new(MemoryTokenStore::new()));
        assert_eq!(transport.base_url(), "http://localhost:3000/api/admin");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let api = ApiSettings {
            base_url: "https://example.com/".into(),
            ..ApiSettings::default()
        };
        let transport = HttpTransport::new(&api, Arc::new(MemoryTokenStore::new())).unwrap();
        assert_eq!(transport.base_url(), "https://example.com/api/admin");
    }

    #[test]
    fn test_normalize_error_classification() {
        let body = r#"{"error":{"message":"expired session","code":"SESSION_EXPIRED"}}"#;
        match normalize_error(StatusCode::UNAUTHORIZED, "/auth/me", body) {
            ApiError::Auth { message } => assert_eq!(message, "expired session"),
            other => panic!("expected Auth, got {other:?}"),
        }

        match normalize_error(StatusCode::FORBIDDEN, "/admin-users", "{}") {
            ApiError::Forbidden { .. } => {}
            other => panic!("expected Forbidden, got {other:?}"),
        }

        match normalize_error(StatusCode::NOT_FOUND, "/residences/x", "") {
            ApiError::NotFound { resource } => assert_eq!(resource, "/residences/x"),
            other => panic!("expected NotFound, got {other:?}"),
        }

        match normalize_error(StatusCode::BAD_GATEWAY, "/stats", "") {
            ApiError::Server { status, .. } => assert_eq!(status, 502),
            other => panic!("expected Server, got {other:?}"),
        }
    }

    #[test]
    fn test_normalize_error_validation_keeps_code() {
        let body = r#"{"error":{"message":"amount must be positive","code":"INVALID_AMOUNT"}}"#;
        match normalize_error(StatusCode::UNPROCESSABLE_ENTITY, "/payments", body) {
            ApiError::Validation { message, code } => {
                assert_eq!(message, "amount must be positive");
                assert_eq!(code.as_deref(), Some("INVALID_AMOUNT"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_normalize_error_falls_back_to_canonical_reason() {
        match normalize_error(StatusCode::BAD_REQUEST, "/users", "not json at all") {
            ApiError::Validation { message, code } => {
                assert_eq!(message, "Bad Request");
                assert_eq!(code, None);
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_force_sign_out_clears_token_once() {
        let tokens = Arc::new(MemoryTokenStore::with_token("t1"));
        let transport = transport_with(tokens.clone());
        let handler = Arc::new(CountingHandler(AtomicUsize::new(0)));
        transport.set_unauthorized_handler(handler.clone());

        transport.force_sign_out();
        assert_eq!(tokens.load(), None);
        assert_eq!(handler.0.load(Ordering::SeqCst), 1);

        // Already signed out: no second notification
        transport.force_sign_out();
        assert_eq!(handler.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_force_sign_out_without_token_is_silent() {
        let tokens = Arc::new(MemoryTokenStore::new());
        let transport = transport_with(tokens);
        let handler = Arc::new(CountingHandler(AtomicUsize::new(0)));
        transport.set_unauthorized_handler(handler.clone());

        transport.force_sign_out();
        assert_eq!(handler.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    #[ignore = "requires a running backend"]
    async fn test_unauthenticated_request_against_local_backend() {
        let transport = transport_with(Arc::new(MemoryTokenStore::new()));
        let result: ApiResult<serde_json::Value> = transport.get("/auth/me").await;
        assert!(matches!(result, Err(ApiError::Auth { .. })));
    }
}

//! Session state machine for the admin dashboard.
//!
//! States: `Unknown` (nothing attempted yet) -> `Verifying` (stored token
//! being checked) -> `Authenticated` | `Unauthenticated`. The session is
//! the only writer of the token store besides the transport's 401 path;
//! everything else reads per-request.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};
use validator::Validate;

use crate::cache::{QueryCache, keys};
use crate::error::ApiResult;
use crate::http::{HttpTransport, TokenStore, UnauthorizedHandler};

/// Admin account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminRole {
    SuperAdmin,
    Admin,
}

/// An administrator account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: AdminRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<jiff::Timestamp>,
}

/// Credentials for [`AuthSession::login`].
#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginInput {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoginResponse {
    token: String,
    admin: AdminUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MeResponse {
    admin: AdminUser,
}

/// Where the session currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    /// No verification attempted yet
    Unknown,
    /// A stored token is being verified against the server
    Verifying,
    Authenticated(AdminUser),
    Unauthenticated,
}

impl AuthState {
    /// Observers treat this as "still loading"; it can never coexist with
    /// a verification error, which lands in `Unauthenticated` directly.
    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Unknown | AuthState::Verifying)
    }
}

/// Process-wide session handle.
pub struct AuthSession {
    transport: Arc<HttpTransport>,
    cache: Arc<QueryCache>,
    tokens: Arc<dyn TokenStore>,
    state_tx: watch::Sender<AuthState>,
}

impl AuthSession {
    pub fn new(
        transport: Arc<HttpTransport>,
        cache: Arc<QueryCache>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        let (state_tx, _) = watch::channel(AuthState::Unknown);
        Self {
            transport,
            cache,
            tokens,
            state_tx,
        }
    }

    /// Resolves the startup state.
    ///
    /// Without a stored token this settles on `Unauthenticated` without
    /// touching the network. With one, the session verifies it against
    /// `/auth/me`; any failure (expired token included) clears the token
    /// and settles on `Unauthenticated` rather than surfacing an error.
    pub async fn initialize(&self) -> AuthState {
        if self.tokens.load().is_none() {
            self.transition(AuthState::Unauthenticated);
            return self.state();
        }

        self.transition(AuthState::Verifying);
        match self.transport.get::<MeResponse>("/auth/me").await {
            Ok(me) => {
                self.cache.set(keys::admin_auth::me(), &me);
                info!(admin = %me.admin.email, "session verified");
                self.transition(AuthState::Authenticated(me.admin));
            }
            Err(e) => {
                warn!(error = %e, "stored token failed verification");
                self.tokens.clear();
                self.transition(AuthState::Unauthenticated);
            }
        }
        self.state()
    }

    /// Exchanges credentials for a session.
    ///
    /// On success the token is persisted, the current-admin cache entry is
    /// seeded from the login response (no redundant verification round
    /// trip), and the state moves straight to `Authenticated`. On failure
    /// the state is left untouched and the server message propagates.
    pub async fn login(&self, input: LoginInput) -> ApiResult<AdminUser> {
        input.validate()?;

        let response: LoginResponse = self.transport.post("/auth/login", &input).await?;

        self.tokens.store(&response.token);
        self.cache.set(
            keys::admin_auth::me(),
            &MeResponse {
                admin: response.admin.clone(),
            },
        );
        info!(admin = %response.admin.email, "logged in");
        self.transition(AuthState::Authenticated(response.admin.clone()));

        Ok(response.admin)
    }

    /// Ends the session.
    ///
    /// The server-side logout is best-effort; locally the token and the
    /// entire cache are always cleared and the state always becomes
    /// `Unauthenticated`, regardless of the network outcome.
    pub async fn logout(&self) {
        if let Err(e) = self.transport.post_empty("/auth/logout").await {
            warn!(error = %e, "server-side logout failed, clearing local session anyway");
        }
        self.tokens.clear();
        self.cache.clear();
        self.transition(AuthState::Unauthenticated);
        info!("logged out");
    }

    /// Current state snapshot.
    pub fn state(&self) -> AuthState {
        self.state_tx.borrow().clone()
    }

    /// Watch channel for state transitions.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state_tx.subscribe()
    }

    pub fn current_admin(&self) -> Option<AdminUser> {
        match self.state() {
            AuthState::Authenticated(admin) => Some(admin),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state(), AuthState::Authenticated(_))
    }

    /// Gates the admin-account-management surface.
    pub fn is_super_admin(&self) -> bool {
        self.current_admin()
            .is_some_and(|admin| admin.role == AdminRole::SuperAdmin)
    }

    fn transition(&self, next: AuthState) {
        self.state_tx.send_replace(next);
    }
}

impl UnauthorizedHandler for AuthSession {
    /// Forced sign-out on a 401 from anywhere in the client. The transport
    /// has already cleared the token; skip when already signed out so a
    /// failed login attempt does not produce a spurious transition.
    fn on_unauthorized(&self) {
        if self.state() != AuthState::Unauthenticated {
            warn!("session rejected by server, signing out");
            self.transition(AuthState::Unauthenticated);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiSettings, CacheSettings};
    use crate::http::MemoryTokenStore;

    fn session_with(tokens: Arc<dyn TokenStore>) -> AuthSession {
        let transport = Arc::new(HttpTransport::new(&ApiSettings::default(), tokens.clone()).unwrap());
        let cache = Arc::new(QueryCache::new(&CacheSettings::default()));
        AuthSession::new(transport, cache, tokens)
    }

    fn admin(role: AdminRole) -> AdminUser {
        AdminUser {
            id: "u1".into(),
            email: "admin@syndic.app".into(),
            name: "Admin".into(),
            role,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_initialize_without_token_skips_network() {
        let session = session_with(Arc::new(MemoryTokenStore::new()));
        assert_eq!(session.state(), AuthState::Unknown);
        // No backend is running; this must settle without a request.
        let state = session.initialize().await;
        assert_eq!(state, AuthState::Unauthenticated);
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_state_transitions_publish_to_watchers() {
        let session = session_with(Arc::new(MemoryTokenStore::new()));
        let mut rx = session.subscribe();

        session.transition(AuthState::Authenticated(admin(AdminRole::Admin)));
        rx.changed().await.unwrap();
        assert!(matches!(&*rx.borrow(), AuthState::Authenticated(_)));
    }

    #[tokio::test]
    async fn test_super_admin_gate() {
        let session = session_with(Arc::new(MemoryTokenStore::new()));
        assert!(!session.is_super_admin());

        session.transition(AuthState::Authenticated(admin(AdminRole::Admin)));
        assert!(!session.is_super_admin());

        session.transition(AuthState::Authenticated(admin(AdminRole::SuperAdmin)));
        assert!(session.is_super_admin());
    }

    #[tokio::test]
    async fn test_forced_sign_out_transitions_once() {
        let session = session_with(Arc::new(MemoryTokenStore::new()));
        session.transition(AuthState::Authenticated(admin(AdminRole::Admin)));

        session.on_unauthorized();
        assert_eq!(session.state(), AuthState::Unauthenticated);

        // Already unauthenticated: no further transition observed
        let mut rx = session.subscribe();
        session.on_unauthorized();
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_login_validates_input_locally() {
        let session = session_with(Arc::new(MemoryTokenStore::new()));
        let result = session
            .login(LoginInput {
                email: "not-an-email".into(),
                password: "secret".into(),
            })
            .await;
        assert!(matches!(
            result,
            Err(crate::error::ApiError::Validation { .. })
        ));
        // Failed login leaves the state untouched
        assert_eq!(session.state(), AuthState::Unknown);
    }

    #[test]
    fn test_role_wire_format() {
        let json = serde_json::to_string(&AdminRole::SuperAdmin).unwrap();
        assert_eq!(json, "\"SUPER_ADMIN\"");
        let role: AdminRole = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(role, AdminRole::Admin);
    }

    #[test]
    fn test_loading_states() {
        assert!(AuthState::Unknown.is_loading());
        assert!(AuthState::Verifying.is_loading());
        assert!(!AuthState::Unauthenticated.is_loading());
        assert!(!AuthState::Authenticated(admin(AdminRole::Admin)).is_loading());
    }
}

//! Top-level client facade.
//!
//! Owns the shared transport, query cache, and auth session, and hands out
//! per-resource clients that borrow them. One instance per process is the
//! intended shape; everything inside is `Arc`-shared and the facade itself
//! is cheap to clone.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::AuthSession;
use crate::cache::QueryCache;
use crate::config::Settings;
use crate::error::{ApiError, ApiResult};
use crate::http::{FileTokenStore, HttpTransport, TokenStore};
use crate::resources::{
    AdminUsers, DeletionRequests, Invitations, Members, Otps, Payments, Residences, Stats, Users,
};

#[derive(Clone)]
pub struct SyndicAdmin {
    settings: Settings,
    transport: Arc<HttpTransport>,
    cache: Arc<QueryCache>,
    session: Arc<AuthSession>,
}

impl SyndicAdmin {
    /// Builds a client persisting its token at `settings.token_path`.
    pub fn new(settings: Settings) -> ApiResult<Self> {
        let tokens = Arc::new(FileTokenStore::new(settings.token_path.clone()));
        Self::with_token_store(settings, tokens)
    }

    /// Builds a client over a caller-supplied token backend.
    pub fn with_token_store(settings: Settings, tokens: Arc<dyn TokenStore>) -> ApiResult<Self> {
        settings.validate().map_err(|e| ApiError::Configuration {
            key: "settings".into(),
            source: e.into(),
        })?;

        let transport = Arc::new(HttpTransport::new(&settings.api, tokens.clone())?);
        let cache = Arc::new(QueryCache::new(&settings.cache));
        let session = Arc::new(AuthSession::new(
            transport.clone(),
            cache.clone(),
            tokens,
        ));
        // Any 401 anywhere in the client forces the session out.
        transport.set_unauthorized_handler(session.clone());

        Ok(Self {
            settings,
            transport,
            cache,
            session,
        })
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn residences(&self) -> Residences {
        Residences::new(
            self.transport.clone(),
            self.cache.clone(),
            self.settings.api.page_size,
        )
    }

    pub fn payments(&self) -> Payments {
        Payments::new(
            self.transport.clone(),
            self.cache.clone(),
            self.settings.api.page_size,
        )
    }

    pub fn users(&self) -> Users {
        Users::new(
            self.transport.clone(),
            self.cache.clone(),
            self.settings.api.page_size,
        )
    }

    pub fn invitations(&self) -> Invitations {
        Invitations::new(
            self.transport.clone(),
            self.cache.clone(),
            self.settings.api.page_size,
        )
    }

    pub fn members(&self) -> Members {
        Members::new(
            self.transport.clone(),
            self.cache.clone(),
            self.settings.api.page_size,
        )
    }

    pub fn deletion_requests(&self) -> DeletionRequests {
        DeletionRequests::new(
            self.transport.clone(),
            self.cache.clone(),
            self.settings.api.page_size,
        )
    }

    pub fn otps(&self) -> Otps {
        Otps::new(
            self.transport.clone(),
            Duration::from_secs(self.settings.otp.poll_interval_secs),
        )
    }

    pub fn admin_users(&self) -> AdminUsers {
        AdminUsers::new(self.transport.clone(), self.cache.clone())
    }

    pub fn stats(&self) -> Stats {
        Stats::new(self.transport.clone(), self.cache.clone())
    }
}

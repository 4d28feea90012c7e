//! Administrator account management, super-admin only. The server
//! rejects these calls with 403 for regular admins; callers gate the
//! surface on [`crate::auth::AuthSession::is_super_admin`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::AdminUser;
use crate::cache::{QueryCache, keys};
use crate::error::ApiResult;
use crate::http::HttpTransport;

use super::require_id;

const ADMIN_USERS_PATH: &str = "/admin-users";

#[derive(Debug, Clone, Serialize, Validate)]
pub struct CreateAdminInput {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct GetAdminUsersResponse {
    admins: Vec<AdminUser>,
}

#[derive(Debug, Deserialize)]
struct CreateAdminResponse {
    admin: AdminUser,
}

/// Client for `/admin-users`.
#[derive(Clone)]
pub struct AdminUsers {
    transport: Arc<HttpTransport>,
    cache: Arc<QueryCache>,
}

impl AdminUsers {
    pub(crate) fn new(transport: Arc<HttpTransport>, cache: Arc<QueryCache>) -> Self {
        Self { transport, cache }
    }

    /// All administrator accounts. The list is small and uncursored.
    pub async fn list(&self) -> ApiResult<Vec<AdminUser>> {
        let transport = self.transport.clone();
        let response: GetAdminUsersResponse = self
            .cache
            .fetch_with(keys::admin_users::list(), || async move {
                transport.get(ADMIN_USERS_PATH).await
            })
            .await?;
        Ok(response.admins)
    }

    pub async fn create(&self, input: CreateAdminInput) -> ApiResult<AdminUser> {
        input.validate()?;
        let response: CreateAdminResponse = self.transport.post(ADMIN_USERS_PATH, &input).await?;
        self.cache.invalidate(&keys::admin_users::all());
        Ok(response.admin)
    }

    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        require_id(id, "admin")?;
        self.transport
            .delete(&format!("{ADMIN_USERS_PATH}/{id}"))
            .await?;
        self.cache.invalidate(&keys::admin_users::all());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiSettings, CacheSettings};
    use crate::http::MemoryTokenStore;

    fn client() -> AdminUsers {
        let tokens = Arc::new(MemoryTokenStore::new());
        let transport = Arc::new(HttpTransport::new(&ApiSettings::default(), tokens).unwrap());
        let cache = Arc::new(QueryCache::new(&CacheSettings::default()));
        AdminUsers::new(transport, cache)
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let admins = client();

        let bad_email = admins
            .create(CreateAdminInput {
                email: "not-an-email".into(),
                password: "long enough".into(),
                name: "Admin".into(),
            })
            .await;
        assert!(matches!(
            bad_email,
            Err(crate::error::ApiError::Validation { .. })
        ));

        let short_password = admins
            .create(CreateAdminInput {
                email: "admin@example.com".into(),
                password: "short".into(),
                name: "Admin".into(),
            })
            .await;
        assert!(short_password.is_err());
    }

    #[test]
    fn test_endpoint_path() {
        assert_eq!(ADMIN_USERS_PATH, "/admin-users");
    }

    #[test]
    fn test_list_response_wire_shape() {
        let json = serde_json::json!({
            "admins": [
                {
                    "id": "a1",
                    "email": "root@example.com",
                    "name": "Root",
                    "role": "SUPER_ADMIN",
                    "createdAt": "2025-01-01T00:00:00Z"
                }
            ]
        });
        let response: GetAdminUsersResponse = serde_json::from_value(json).unwrap();
        assert_eq!(response.admins[0].email, "root@example.com");
    }
}

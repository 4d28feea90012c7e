//! Resident-user lifecycle: listing, detail, ban/unban, deletion.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::cache::{Params, QueryCache, keys};
use crate::error::ApiResult;
use crate::http::HttpTransport;
use crate::pagination::{Page, PagedQuery};

use super::{MemberRole, ResidenceRef, paged, require_id};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCounts {
    pub residency_members: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub is_banned: bool,
    pub banned_at: Option<jiff::Timestamp>,
    pub ban_reason: Option<String>,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
    #[serde(default, rename = "_count", skip_serializing_if = "Option::is_none")]
    pub counts: Option<UserCounts>,
}

/// One residence membership attached to a user detail view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMembership {
    pub id: String,
    pub role: MemberRole,
    pub residence: ResidenceRef,
}

/// User detail: the base record plus its memberships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithDetails {
    #[serde(flatten)]
    pub user: User,
    pub residency_members: Vec<UserMembership>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    pub search: Option<String>,
    pub is_banned: Option<bool>,
}

impl UserFilter {
    fn key_params(&self) -> Params {
        Params::new()
            .set("search", self.search.as_deref())
            .set("isBanned", self.is_banned)
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(search) = &self.search {
            query.push(("search", search.clone()));
        }
        if let Some(is_banned) = self.is_banned {
            query.push(("isBanned", is_banned.to_string()));
        }
        query
    }
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct BanUserInput {
    #[validate(length(min = 1, message = "Ban reason is required"))]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsersPage {
    users: Vec<User>,
    next_cursor: Option<String>,
    has_more: bool,
    total_count: u64,
}

impl From<UsersPage> for Page<User> {
    fn from(wire: UsersPage) -> Self {
        Page {
            items: wire.users,
            next_cursor: wire.next_cursor,
            has_more: wire.has_more,
            total_count: wire.total_count,
        }
    }
}

/// Client for `/users`.
#[derive(Clone)]
pub struct Users {
    transport: Arc<HttpTransport>,
    cache: Arc<QueryCache>,
    page_size: u32,
}

impl Users {
    pub(crate) fn new(transport: Arc<HttpTransport>, cache: Arc<QueryCache>, page_size: u32) -> Self {
        Self {
            transport,
            cache,
            page_size,
        }
    }

    pub fn pages(&self, filter: UserFilter) -> PagedQuery<User> {
        paged::<User, UsersPage>(
            self.transport.clone(),
            self.cache.clone(),
            keys::users::list(filter.key_params()),
            "/users",
            filter.query(),
            self.page_size,
        )
    }

    pub async fn get(&self, id: &str) -> ApiResult<UserWithDetails> {
        require_id(id, "user")?;
        let transport = self.transport.clone();
        let path = format!("/users/{id}");
        self.cache
            .fetch_with(keys::users::detail(id), || async move {
                transport.get(&path).await
            })
            .await
    }

    /// Bans a user. Affects the listing, the detail view, and the
    /// dashboard counters.
    pub async fn ban(&self, id: &str, input: BanUserInput) -> ApiResult<()> {
        require_id(id, "user")?;
        input.validate()?;
        self.transport
            .post_unit(&format!("/users/{id}/ban"), &input)
            .await?;
        self.invalidate_user(id);
        Ok(())
    }

    pub async fn unban(&self, id: &str) -> ApiResult<()> {
        require_id(id, "user")?;
        self.transport
            .post_empty(&format!("/users/{id}/unban"))
            .await?;
        self.invalidate_user(id);
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        require_id(id, "user")?;
        self.transport.delete(&format!("/users/{id}")).await?;
        self.cache.invalidate(&keys::users::all());
        self.cache.invalidate(&keys::stats::all());
        Ok(())
    }

    fn invalidate_user(&self, id: &str) {
        self.cache.invalidate(&keys::users::all());
        self.cache.invalidate(&keys::users::detail(id));
        self.cache.invalidate(&keys::stats::all());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiSettings, CacheSettings};
    use crate::http::MemoryTokenStore;

    fn client() -> Users {
        let tokens = Arc::new(MemoryTokenStore::new());
        let transport = Arc::new(HttpTransport::new(&ApiSettings::default(), tokens).unwrap());
        let cache = Arc::new(QueryCache::new(&CacheSettings::default()));
        Users::new(transport, cache, 20)
    }

    #[tokio::test]
    async fn test_ban_requires_reason() {
        let result = client().ban("u1", BanUserInput { reason: "".into() }).await;
        assert!(matches!(
            result,
            Err(crate::error::ApiError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_id_guards() {
        let users = client();
        assert!(users.get("").await.is_err());
        assert!(users.unban(" ").await.is_err());
        assert!(users.delete("").await.is_err());
    }

    #[test]
    fn test_detail_flattens_base_user() {
        let json = serde_json::json!({
            "id": "u1",
            "name": "Sara",
            "email": "sara@example.com",
            "phoneNumber": "+212612345678",
            "isBanned": false,
            "bannedAt": null,
            "banReason": null,
            "createdAt": "2025-01-01T00:00:00Z",
            "updatedAt": "2025-01-02T00:00:00Z",
            "residencyMembers": [
                { "id": "m1", "role": "SYNDIC", "residence": { "id": "r1", "name": "Palm Court" } }
            ]
        });
        let detail: UserWithDetails = serde_json::from_value(json).unwrap();
        assert_eq!(detail.user.name, "Sara");
        assert_eq!(detail.residency_members.len(), 1);
        assert_eq!(detail.residency_members[0].role, MemberRole::Syndic);
    }

    #[test]
    fn test_banned_filter_key_differs_from_unfiltered() {
        let banned = UserFilter {
            is_banned: Some(true),
            ..UserFilter::default()
        };
        assert_ne!(
            keys::users::list(banned.key_params()),
            keys::users::list(UserFilter::default().key_params())
        );
    }
}

//! Residence membership listing, read-only.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::{Params, QueryCache, keys};
use crate::http::HttpTransport;
use crate::pagination::{Page, PagedQuery};

use super::{MemberRole, paged};

/// The user behind a membership row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberUser {
    pub id: String,
    pub name: String,
    pub phone_number: Option<String>,
    pub is_banned: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidenceMember {
    pub id: String,
    pub role: MemberRole,
    pub joined_at: jiff::Timestamp,
    pub user: MemberUser,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberFilter {
    pub residence_id: Option<String>,
}

impl MemberFilter {
    fn key_params(&self) -> Params {
        Params::new().set("residenceId", self.residence_id.as_deref())
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        match &self.residence_id {
            Some(id) => vec![("residenceId", id.clone())],
            None => Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MembersPage {
    members: Vec<ResidenceMember>,
    next_cursor: Option<String>,
    has_more: bool,
    total_count: u64,
}

impl From<MembersPage> for Page<ResidenceMember> {
    fn from(wire: MembersPage) -> Self {
        Page {
            items: wire.members,
            next_cursor: wire.next_cursor,
            has_more: wire.has_more,
            total_count: wire.total_count,
        }
    }
}

/// Client for `/members`.
#[derive(Clone)]
pub struct Members {
    transport: Arc<HttpTransport>,
    cache: Arc<QueryCache>,
    page_size: u32,
}

impl Members {
    pub(crate) fn new(transport: Arc<HttpTransport>, cache: Arc<QueryCache>, page_size: u32) -> Self {
        Self {
            transport,
            cache,
            page_size,
        }
    }

    pub fn pages(&self, filter: MemberFilter) -> PagedQuery<ResidenceMember> {
        paged::<ResidenceMember, MembersPage>(
            self.transport.clone(),
            self.cache.clone(),
            keys::members::list(filter.key_params()),
            "/members",
            filter.query(),
            self.page_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_wire_shape() {
        let json = serde_json::json!({
            "id": "m1",
            "role": "SYNDIC",
            "joinedAt": "2025-05-01T12:00:00Z",
            "user": {
                "id": "u1",
                "name": "Yassine",
                "phoneNumber": "+212712345678",
                "isBanned": false
            }
        });
        let member: ResidenceMember = serde_json::from_value(json).unwrap();
        assert_eq!(member.role, MemberRole::Syndic);
        assert_eq!(member.user.name, "Yassine");
    }

    #[test]
    fn test_residence_filter_scopes_key() {
        let scoped = MemberFilter {
            residence_id: Some("r1".into()),
        };
        assert_ne!(
            keys::members::list(scoped.key_params()),
            keys::members::list(MemberFilter::default().key_params())
        );
    }
}

//! Account deletion requests submitted by residents. Processing one
//! removes the account, so the user listings and dashboard counters are
//! invalidated alongside the request queue.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::{QueryCache, keys};
use crate::error::ApiResult;
use crate::http::HttpTransport;
use crate::pagination::{Page, PagedQuery};

use super::{ResidenceRef, paged, require_id};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionRequestMembership {
    pub residence: ResidenceRef,
}

/// The account asking to be deleted, with the residences it belongs to.
/// The listing identifies users by phone number, not email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionRequestUser {
    pub id: String,
    pub name: String,
    pub phone_number: Option<String>,
    pub created_at: jiff::Timestamp,
    #[serde(default)]
    pub residency_members: Vec<DeletionRequestMembership>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionRequest {
    pub id: String,
    pub reason: Option<String>,
    pub details: Option<String>,
    pub user_id: String,
    pub created_at: jiff::Timestamp,
    pub user: DeletionRequestUser,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeletionRequestsPage {
    requests: Vec<DeletionRequest>,
    next_cursor: Option<String>,
    has_more: bool,
    total_count: u64,
}

impl From<DeletionRequestsPage> for Page<DeletionRequest> {
    fn from(wire: DeletionRequestsPage) -> Self {
        Page {
            items: wire.requests,
            next_cursor: wire.next_cursor,
            has_more: wire.has_more,
            total_count: wire.total_count,
        }
    }
}

/// Client for `/deletion-requests`.
#[derive(Clone)]
pub struct DeletionRequests {
    transport: Arc<HttpTransport>,
    cache: Arc<QueryCache>,
    page_size: u32,
}

impl DeletionRequests {
    pub(crate) fn new(
        transport: Arc<HttpTransport>,
        cache: Arc<QueryCache>,
        page_size: u32,
    ) -> Self {
        Self {
            transport,
            cache,
            page_size,
        }
    }

    pub fn pages(&self) -> PagedQuery<DeletionRequest> {
        paged::<DeletionRequest, DeletionRequestsPage>(
            self.transport.clone(),
            self.cache.clone(),
            keys::deletion_requests::list(),
            "/deletion-requests",
            Vec::new(),
            self.page_size,
        )
    }

    /// Approves the request and deletes the account behind it.
    pub async fn process(&self, id: &str) -> ApiResult<()> {
        require_id(id, "deletion request")?;
        self.transport
            .post_empty(&format!("/deletion-requests/{id}/process"))
            .await?;
        self.cache.invalidate(&keys::deletion_requests::all());
        self.cache.invalidate(&keys::users::all());
        self.cache.invalidate(&keys::stats::all());
        Ok(())
    }
}

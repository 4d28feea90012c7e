//! Residence invitations, keyed to validated Moroccan phone numbers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::cache::{Params, QueryCache, keys};
use crate::error::ApiResult;
use crate::http::HttpTransport;
use crate::pagination::{Page, PagedQuery};
use crate::phone;

use super::{MemberRole, ResidenceRef, paged, require_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl InvitationStatus {
    fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: String,
    pub phone_number: String,
    pub role: MemberRole,
    pub status: InvitationStatus,
    pub residence_id: String,
    pub created_at: jiff::Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residence: Option<ResidenceRef>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvitationFilter {
    pub residence_id: Option<String>,
    pub status: Option<InvitationStatus>,
}

impl InvitationFilter {
    fn key_params(&self) -> Params {
        Params::new()
            .set("residenceId", self.residence_id.as_deref())
            .set("status", self.status.map(InvitationStatus::as_str))
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(id) = &self.residence_id {
            query.push(("residenceId", id.clone()));
        }
        if let Some(status) = self.status {
            query.push(("status", status.as_str().to_string()));
        }
        query
    }
}

#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvitationInput {
    /// Accepted in domestic or international form; normalized before
    /// sending.
    #[validate(custom(function = "phone::validate_phone_field"))]
    pub phone_number: String,
    pub role: MemberRole,
    #[validate(length(min = 1, message = "Residence is required"))]
    pub residence_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvitationsPage {
    invitations: Vec<Invitation>,
    next_cursor: Option<String>,
    has_more: bool,
    total_count: u64,
}

impl From<InvitationsPage> for Page<Invitation> {
    fn from(wire: InvitationsPage) -> Self {
        Page {
            items: wire.invitations,
            next_cursor: wire.next_cursor,
            has_more: wire.has_more,
            total_count: wire.total_count,
        }
    }
}

/// Client for `/invitations`.
#[derive(Clone)]
pub struct Invitations {
    transport: Arc<HttpTransport>,
    cache: Arc<QueryCache>,
    page_size: u32,
}

impl Invitations {
    pub(crate) fn new(transport: Arc<HttpTransport>, cache: Arc<QueryCache>, page_size: u32) -> Self {
        Self {
            transport,
            cache,
            page_size,
        }
    }

    pub fn pages(&self, filter: InvitationFilter) -> PagedQuery<Invitation> {
        paged::<Invitation, InvitationsPage>(
            self.transport.clone(),
            self.cache.clone(),
            keys::invitations::list(filter.key_params()),
            "/invitations",
            filter.query(),
            self.page_size,
        )
    }

    /// Sends an invitation. The phone number is normalized to
    /// `+212XXXXXXXXX` before the request.
    pub async fn create(&self, mut input: CreateInvitationInput) -> ApiResult<Invitation> {
        input.validate()?;
        input.phone_number = phone::validate(&input.phone_number).normalized;

        let invitation: Invitation = self.transport.post("/invitations", &input).await?;
        self.cache.invalidate(&keys::invitations::all());
        self.cache
            .invalidate(&keys::residences::detail(&input.residence_id));
        Ok(invitation)
    }

    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        require_id(id, "invitation")?;
        self.transport.delete(&format!("/invitations/{id}")).await?;
        self.cache.invalidate(&keys::invitations::all());
        Ok(())
    }
}

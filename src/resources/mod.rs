//! Typed per-entity API clients.
//!
//! Each resource composes the shared transport and query cache into read
//! operations (cached, coalesced) and mutations (which synchronously
//! invalidate the affected key namespaces before returning).

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::cache::{QueryCache, QueryKey};
use crate::error::ApiResult;
use crate::http::HttpTransport;
use crate::pagination::{Page, PagedQuery};

mod admin_users;
mod deletion_requests;
mod invitations;
mod members;
mod otps;
mod payments;
mod residences;
mod stats;
mod users;

pub use admin_users::{AdminUsers, CreateAdminInput};
pub use deletion_requests::{
    DeletionRequest, DeletionRequestMembership, DeletionRequestUser, DeletionRequests,
};
pub use invitations::{CreateInvitationInput, Invitation, InvitationFilter, InvitationStatus, Invitations};
pub use members::{MemberFilter, MemberUser, Members, ResidenceMember};
pub use otps::{OtpWatcher, Otps, PendingOtp};
pub use payments::{CreatePaymentInput, PaymentFilter, Payments, SubscriptionPayment, UpdatePaymentInput};
pub use residences::{
    CreateResidenceInput, Residence, ResidenceCounts, ResidenceFilter, ResidenceStatus,
    ResidenceStatusFilter, Residences, UpdateResidenceInput,
};
pub use stats::{
    ChartDataPoint, DEFAULT_CHART_MONTHS, DashboardStats, DeletionRequestStats,
    ExpiringSoonResidence, RecentActivity, RecentPayment, RecentPaymentResidence, RecentResidence,
    RecentUser, ResidenceStats, RevenueStats, Stats, UserStats,
};
pub use users::{BanUserInput, User, UserFilter, UserMembership, UserWithDetails, Users};

/// Membership role within a residence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Syndic,
    Resident,
}

/// Minimal residence reference embedded in other entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidenceRef {
    pub id: String,
    pub name: String,
}

/// Builds a [`PagedQuery`] whose page fetcher routes through the cache:
/// each page is cached under `[list_key, page, <cursor>]`, so equal
/// in-flight page fetches coalesce and namespace invalidation covers
/// every page.
pub(crate) fn paged<T, W>(
    transport: Arc<HttpTransport>,
    cache: Arc<QueryCache>,
    list_key: QueryKey,
    path: &'static str,
    base_query: Vec<(&'static str, String)>,
    limit: u32,
) -> PagedQuery<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
    W: DeserializeOwned + Into<Page<T>> + Send + 'static,
{
    PagedQuery::new(Box::new(move |cursor| {
        let transport = transport.clone();
        let cache = cache.clone();
        let page_key = list_key
            .clone()
            .with("page")
            .with(cursor.clone().unwrap_or_default());

        let mut query = base_query.clone();
        query.push(("limit", limit.to_string()));
        if let Some(cursor) = &cursor {
            query.push(("cursor", cursor.clone()));
        }

        Box::pin(async move {
            cache
                .fetch_with(page_key, || async move {
                    let wire: W = transport.get_with_query(path, &query).await?;
                    Ok(wire.into())
                })
                .await
        })
    }))
}

/// Rejects an empty id before any request fires. The dashboard calls
/// detail views with ids that may not be resolved yet; the guard turns
/// that into a cheap local error instead of a bogus request.
pub(crate) fn require_id(id: &str, what: &str) -> ApiResult<()> {
    if id.trim().is_empty() {
        return Err(crate::error::ApiError::Validation {
            message: format!("{what} id must not be empty"),
            code: None,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_role_wire_format() {
        assert_eq!(
            serde_json::to_string(&MemberRole::Syndic).unwrap(),
            "\"SYNDIC\""
        );
        let role: MemberRole = serde_json::from_str("\"RESIDENT\"").unwrap();
        assert_eq!(role, MemberRole::Resident);
    }

    #[test]
    fn test_require_id() {
        assert!(require_id("abc", "residence").is_ok());
        assert!(require_id("", "residence").is_err());
        assert!(require_id("   ", "user").is_err());
    }
}

//! Dashboard statistics: headline counters, time-series charts, and the
//! recent-activity feed. All reads are cached; every mutation elsewhere
//! in the crate that changes a counter invalidates the `stats` namespace.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::{QueryCache, keys};
use crate::error::ApiResult;
use crate::http::HttpTransport;

pub const DEFAULT_CHART_MONTHS: u32 = 6;

const RECENT_ACTIVITY_PATH: &str = "/stats/recent";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total: u64,
    pub this_month: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidenceStats {
    pub total: u64,
    pub active: u64,
    pub expiring_soon: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionRequestStats {
    pub pending: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueStats {
    pub this_month: f64,
    pub total: f64,
}

/// Headline counters shown at the top of the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub users: UserStats,
    pub residences: ResidenceStats,
    pub deletion_requests: DeletionRequestStats,
    pub revenue: RevenueStats,
}

/// One month of a time-series chart. User charts carry `count`, revenue
/// charts carry `total`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataPoint {
    pub month: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
}

/// Name-only residence reference in the activity feed; the feed carries
/// no residence ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentPaymentResidence {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentPayment {
    pub id: String,
    pub amount: f64,
    pub paid_at: jiff::Timestamp,
    pub residence: RecentPaymentResidence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentUser {
    pub id: String,
    pub name: String,
    pub phone_number: Option<String>,
    pub created_at: jiff::Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentResidence {
    pub id: String,
    pub name: String,
    pub created_at: jiff::Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiringSoonResidence {
    pub id: String,
    pub name: String,
    pub expiration_date: jiff::Timestamp,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    #[serde(default)]
    pub recent_payments: Vec<RecentPayment>,
    #[serde(default)]
    pub recent_users: Vec<RecentUser>,
    #[serde(default)]
    pub recent_residences: Vec<RecentResidence>,
    #[serde(default)]
    pub expiring_soon: Vec<ExpiringSoonResidence>,
}

/// Client for `/stats`.
#[derive(Clone)]
pub struct Stats {
    transport: Arc<HttpTransport>,
    cache: Arc<QueryCache>,
}

impl Stats {
    pub(crate) fn new(transport: Arc<HttpTransport>, cache: Arc<QueryCache>) -> Self {
        Self { transport, cache }
    }

    pub async fn dashboard(&self) -> ApiResult<DashboardStats> {
        let transport = self.transport.clone();
        self.cache
            .fetch_with(keys::stats::dashboard(), || async move {
                transport.get("/stats").await
            })
            .await
    }

    /// New-user counts per month over the trailing window.
    pub async fn users_over_time(&self, months: u32) -> ApiResult<Vec<ChartDataPoint>> {
        let transport = self.transport.clone();
        let query = vec![("months", months.to_string())];
        self.cache
            .fetch_with(keys::stats::users_over_time(months), || async move {
                transport
                    .get_with_query("/stats/users-over-time", &query)
                    .await
            })
            .await
    }

    /// Payment revenue per month over the trailing window.
    pub async fn revenue_over_time(&self, months: u32) -> ApiResult<Vec<ChartDataPoint>> {
        let transport = self.transport.clone();
        let query = vec![("months", months.to_string())];
        self.cache
            .fetch_with(keys::stats::revenue_over_time(months), || async move {
                transport
                    .get_with_query("/stats/revenue-over-time", &query)
                    .await
            })
            .await
    }

    pub async fn recent_activity(&self) -> ApiResult<RecentActivity> {
        let transport = self.transport.clone();
        self.cache
            .fetch_with(keys::stats::recent(), || async move {
                transport.get(RECENT_ACTIVITY_PATH).await
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_wire_shape() {
        let json = serde_json::json!({
            "users": { "total": 120, "thisMonth": 8 },
            "residences": { "total": 40, "active": 35, "expiringSoon": 3 },
            "deletionRequests": { "pending": 2 },
            "revenue": { "thisMonth": 4500.0, "total": 98000.0 }
        });
        let stats: DashboardStats = serde_json::from_value(json).unwrap();
        assert_eq!(stats.users.this_month, 8);
        assert_eq!(stats.residences.expiring_soon, 3);
        assert_eq!(stats.deletion_requests.pending, 2);
    }

    #[test]
    fn test_chart_point_carries_either_series() {
        let user_point: ChartDataPoint =
            serde_json::from_value(serde_json::json!({ "month": "2026-01", "count": 14 })).unwrap();
        assert_eq!(user_point.count, Some(14));
        assert_eq!(user_point.total, None);

        let revenue_point: ChartDataPoint =
            serde_json::from_value(serde_json::json!({ "month": "2026-01", "total": 3200.5 }))
                .unwrap();
        assert_eq!(revenue_point.total, Some(3200.5));
    }

    #[test]
    fn test_recent_activity_defaults_missing_sections() {
        let activity: RecentActivity =
            serde_json::from_value(serde_json::json!({ "recentUsers": [] })).unwrap();
        assert!(activity.recent_payments.is_empty());
        assert!(activity.expiring_soon.is_empty());
    }

    #[test]
    fn test_recent_activity_endpoint_path() {
        assert_eq!(RECENT_ACTIVITY_PATH, "/stats/recent");
    }

    #[test]
    fn test_recent_activity_wire_shape() {
        // Payments carry a name-only residence; users carry a phone number
        // and no email.
        let json = serde_json::json!({
            "recentPayments": [
                {
                    "id": "p1",
                    "amount": 1200.0,
                    "paidAt": "2026-02-01T00:00:00Z",
                    "residence": { "name": "Palm Court" }
                }
            ],
            "recentUsers": [
                {
                    "id": "u1",
                    "name": "Sara",
                    "phoneNumber": "+212612345678",
                    "createdAt": "2026-02-02T00:00:00Z"
                },
                {
                    "id": "u2",
                    "name": "Omar",
                    "phoneNumber": null,
                    "createdAt": "2026-02-03T00:00:00Z"
                }
            ],
            "recentResidences": [],
            "expiringSoon": []
        });
        let activity: RecentActivity = serde_json::from_value(json).unwrap();
        assert_eq!(activity.recent_payments[0].residence.name, "Palm Court");
        assert_eq!(
            activity.recent_users[0].phone_number.as_deref(),
            Some("+212612345678")
        );
        assert_eq!(activity.recent_users[1].phone_number, None);
    }
}

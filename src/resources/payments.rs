//! Subscription payments. Creating one can extend the residence's
//! subscription, so mutations here ripple into the residence detail and
//! the revenue stats.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::cache::{Params, QueryCache, keys};
use crate::error::ApiResult;
use crate::http::HttpTransport;
use crate::pagination::{Page, PagedQuery};

use super::{ResidenceRef, paged, require_id};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPayment {
    pub id: String,
    pub amount: f64,
    pub note: Option<String>,
    pub residence_id: String,
    pub paid_at: jiff::Timestamp,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residence: Option<ResidenceRef>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentFilter {
    pub residence_id: Option<String>,
}

impl PaymentFilter {
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

#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentInput {
    #[validate(length(min = 1, message = "Residence is required"))]
    pub residence_id: String,
    #[validate(range(min = 0.01, message = "Amount must be positive"))]
    pub amount: f64,
    pub paid_at: jiff::Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Months to extend the residence subscription by, applied server-side
    /// alongside the payment.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 36, message = "Extension must be between 1 and 36 months"))]
    pub extend_months: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.01, message = "Amount must be positive"))]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<jiff::Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentsPage {
    payments: Vec<SubscriptionPayment>,
    next_cursor: Option<String>,
    has_more: bool,
    total_count: u64,
}

impl From<PaymentsPage> for Page<SubscriptionPayment> {
    fn from(wire: PaymentsPage) -> Self {
        Page {
            items: wire.payments,
            next_cursor: wire.next_cursor,
            has_more: wire.has_more,
            total_count: wire.total_count,
        }
    }
}

/// Client for `/payments`.
#[derive(Clone)]
pub struct Payments {
    transport: Arc<HttpTransport>,
    cache: Arc<QueryCache>,
    page_size: u32,
}

impl Payments {
    pub(crate) fn new(transport: Arc<HttpTransport>, cache: Arc<QueryCache>, page_size: u32) -> Self {
        Self {
            transport,
            cache,
            page_size,
        }
    }

    pub fn pages(&self, filter: PaymentFilter) -> PagedQuery<SubscriptionPayment> {
        paged::<SubscriptionPayment, PaymentsPage>(
            self.transport.clone(),
            self.cache.clone(),
            keys::payments::list(filter.key_params()),
            "/payments",
            filter.query(),
            self.page_size,
        )
    }

    /// Records a payment, optionally extending the subscription.
    pub async fn create(&self, input: CreatePaymentInput) -> ApiResult<SubscriptionPayment> {
        input.validate()?;
        let payment: SubscriptionPayment = self.transport.post("/payments", &input).await?;
        self.cache.invalidate(&keys::payments::all());
        self.cache
            .invalidate(&keys::residences::detail(&input.residence_id));
        self.cache.invalidate(&keys::stats::all());
        Ok(payment)
    }

    pub async fn update(&self, id: &str, input: UpdatePaymentInput) -> ApiResult<SubscriptionPayment> {
        require_id(id, "payment")?;
        input.validate()?;
        let payment: SubscriptionPayment = self
            .transport
            .patch(&format!("/payments/{id}"), &input)
            .await?;
        self.cache.invalidate(&keys::payments::all());
        self.cache.invalidate(&keys::stats::all());
        Ok(payment)
    }

    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        require_id(id, "payment")?;
        self.transport.delete(&format!("/payments/{id}")).await?;
        self.cache.invalidate(&keys::payments::all());
        self.cache.invalidate(&keys::stats::all());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiSettings, CacheSettings};
    use crate::http::MemoryTokenStore;

    fn client() -> Payments {
        let tokens = Arc::new(MemoryTokenStore::new());
        let transport = Arc::new(HttpTransport::new(&ApiSettings::default(), tokens).unwrap());
        let cache = Arc::new(QueryCache::new(&CacheSettings::default()));
        Payments::new(transport, cache, 20)
    }

    #[tokio::test]
    async fn test_create_rejects_zero_amount() {
        let result = client()
            .create(CreatePaymentInput {
                residence_id: "r1".into(),
                amount: 0.0,
                paid_at: jiff::Timestamp::UNIX_EPOCH,
                note: None,
                extend_months: None,
            })
            .await;
        assert!(matches!(
            result,
            Err(crate::error::ApiError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_excessive_extension() {
        let result = client()
            .create(CreatePaymentInput {
                residence_id: "r1".into(),
                amount: 500.0,
                paid_at: jiff::Timestamp::UNIX_EPOCH,
                note: None,
                extend_months: Some(48),
            })
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_create_input_wire_shape() {
        let input = CreatePaymentInput {
            residence_id: "r1".into(),
            amount: 1200.5,
            paid_at: "2026-03-01T00:00:00Z".parse().unwrap(),
            note: None,
            extend_months: Some(12),
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["residenceId"], "r1");
        assert_eq!(json["extendMonths"], 12);
        assert!(json.get("note").is_none());
    }

    #[test]
    fn test_residence_scoped_filter_key() {
        let scoped = PaymentFilter {
            residence_id: Some("r1".into()),
        };
        assert_ne!(
            keys::payments::list(scoped.key_params()),
            keys::payments::list(PaymentFilter::default().key_params())
        );
        assert!(scoped.query().contains(&("residenceId", "r1".to_string())));
    }
}

//! Residence management.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::cache::{Params, QueryCache, keys};
use crate::error::ApiResult;
use crate::http::HttpTransport;
use crate::limits::{ResidenceLimits, ResidenceLimitsPatch};
use crate::pagination::{Page, PagedQuery};

use super::{paged, require_id};

/// Whether a residence subscription is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResidenceStatus {
    Active,
    Inactive,
}

/// Nested relation counts returned with each residence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidenceCounts {
    pub members: u64,
    pub buildings: u64,
    pub apartments: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributions: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expenses: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Residence {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub status: ResidenceStatus,
    pub expiration_date: jiff::Timestamp,
    pub limits: ResidenceLimits,
    pub is_demo: bool,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
    #[serde(default, rename = "_count", skip_serializing_if = "Option::is_none")]
    pub counts: Option<ResidenceCounts>,
}

/// Subscription-state filter for the residence listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResidenceStatusFilter {
    Active,
    Expired,
    Expiring,
}

impl ResidenceStatusFilter {
    fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Expiring => "expiring",
        }
    }
}

/// Listing filters; every combination is its own cache key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResidenceFilter {
    pub search: Option<String>,
    pub status: Option<ResidenceStatusFilter>,
    pub is_demo: Option<bool>,
}

impl ResidenceFilter {
    fn key_params(&self) -> Params {
        Params::new()
            .set("search", self.search.as_deref())
            .set("status", self.status.map(ResidenceStatusFilter::as_str))
            .set("isDemo", self.is_demo)
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(search) = &self.search {
            query.push(("search", search.clone()));
        }
        if let Some(status) = self.status {
            query.push(("status", status.as_str().to_string()));
        }
        if let Some(is_demo) = self.is_demo {
            query.push(("isDemo", is_demo.to_string()));
        }
        query
    }
}

#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateResidenceInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub expiration_date: jiff::Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_demo: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<ResidenceLimitsPatch>,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResidenceInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<jiff::Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_demo: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<ResidenceLimitsPatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResidencesPage {
    residences: Vec<Residence>,
    next_cursor: Option<String>,
    has_more: bool,
    total_count: u64,
}

impl From<ResidencesPage> for Page<Residence> {
    fn from(wire: ResidencesPage) -> Self {
        Page {
            items: wire.residences,
            next_cursor: wire.next_cursor,
            has_more: wire.has_more,
            total_count: wire.total_count,
        }
    }
}

/// Client for `/residences`.
#[derive(Clone)]
pub struct Residences {
    transport: Arc<HttpTransport>,
    cache: Arc<QueryCache>,
    page_size: u32,
}

impl Residences {
    pub(crate) fn new(transport: Arc<HttpTransport>, cache: Arc<QueryCache>, page_size: u32) -> Self {
        Self {
            transport,
            cache,
            page_size,
        }
    }

    /// Paginated listing for one filter combination.
    pub fn pages(&self, filter: ResidenceFilter) -> PagedQuery<Residence> {
        paged::<Residence, ResidencesPage>(
            self.transport.clone(),
            self.cache.clone(),
            keys::residences::list(filter.key_params()),
            "/residences",
            filter.query(),
            self.page_size,
        )
    }

    /// Single residence by id.
    pub async fn get(&self, id: &str) -> ApiResult<Residence> {
        require_id(id, "residence")?;
        let transport = self.transport.clone();
        let path = format!("/residences/{id}");
        self.cache
            .fetch_with(keys::residences::detail(id), || async move {
                transport.get(&path).await
            })
            .await
    }

    pub async fn create(&self, input: CreateResidenceInput) -> ApiResult<Residence> {
        input.validate()?;
        let residence: Residence = self.transport.post("/residences", &input).await?;
        self.cache.invalidate(&keys::residences::all());
        self.cache.invalidate(&keys::stats::all());
        Ok(residence)
    }

    pub async fn update(&self, id: &str, input: UpdateResidenceInput) -> ApiResult<Residence> {
        require_id(id, "residence")?;
        input.validate()?;
        let residence: Residence = self
            .transport
            .patch(&format!("/residences/{id}"), &input)
            .await?;
        self.cache.invalidate(&keys::residences::all());
        self.cache.invalidate(&keys::residences::detail(id));
        Ok(residence)
    }

    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        require_id(id, "residence")?;
        self.transport.delete(&format!("/residences/{id}")).await?;
        self.cache.invalidate(&keys::residences::all());
        self.cache.invalidate(&keys::stats::all());
        Ok(())
    }
}

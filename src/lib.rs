//! Async client for the SyndicApp admin API.
//!
//! Wraps the dashboard backend in typed per-resource clients sharing one
//! HTTP transport, an invalidation-aware query cache, and a persistent
//! auth session. Start from [`SyndicAdmin`].

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod limits;
pub mod logging;
pub mod pagination;
pub mod phone;
pub mod resources;

pub use client::SyndicAdmin;
pub use error::{ApiError, ApiResult};

//! Query cache: structured keys, the per-resource key registry, and the
//! coalescing store with hierarchical invalidation.

mod key;
pub mod keys;
mod store;

pub use key::{ParamValue, Params, QueryKey, Segment};
pub use store::QueryCache;

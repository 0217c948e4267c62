//! Schooldesk overview cache
//!
//! Serves the expensive, slowly-changing overview aggregate behind a
//! single-entry read-through cache:
//! - concurrent misses coalesce onto one in-flight fetch (no stampede)
//! - explicit invalidation and forced refresh
//! - a failed refresh never discards previously held data

pub mod cache;
pub mod error;


pub use cache::{Overview, OverviewCache};
pub use error::FetchError;

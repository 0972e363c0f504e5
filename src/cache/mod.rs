//! Report cache
//!
//! Persists hiring reports per job posting and kind, judges their freshness
//! with a per-kind TTL, and supports manual invalidation. Expired entries are
//! kept and returned with their age so callers can decide whether to show
//! stale data or refetch.

mod expiry;
mod invalidation;
mod key;
mod status;
mod store;

pub use expiry::ExpiryPolicy;
pub use invalidation::Invalidator;
pub use key::{CacheKey, KeyError, ReportKind};
pub use status::{CacheStatus, StatusInspector, StatusReport};
pub use store::{CacheEntry, CacheStore, StorageError};

//! Usage endpoint integration.
//!
//! This module provides:
//! - Client for the bootstrap and per-organization usage documents
//! - Data structures for usage snapshots
//! - One-entry cache for the resolved organization id
//!
//! Requests are authenticated with the browser session cookie.

mod cache;
mod client;
mod error;
mod types;

pub use cache::{OrgCache, ORG_CACHE_FILE_NAME};
pub use client::{extract_org_id, UsageApi, WebUsageClient};
pub use error::PollError;
pub use types::{UsageResponse, UsageSnapshot, UsageWindowApi, WindowUsage};

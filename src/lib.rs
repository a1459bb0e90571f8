//! # ICP Lookup Library
//!
//! Looks up the ICP (Chinese website registration) record behind a hostname.
//!
//! ## Features
//!
//! - Registrable-domain extraction from page URLs and hostnames
//! - Primary and fallback API providers with per-provider retry counts
//! - Durable, time-boxed result cache (JSON file or in-memory)
//! - Lookups never fail: total failure yields a "not found" record
//! - HTML rendering of records for popup-style views
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use icp_lookup::{Config, LookupPipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load()?;
//!     let pipeline = LookupPipeline::from_config(&config)?;
//!     let record = pipeline.lookup("www.example.com").await;
//!
//!     println!("Company: {}", record.company_name);
//!     println!("ICP: {}", record.icp);
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod domain;
pub mod errors;
pub mod fetcher;
pub mod metrics;
pub mod pipeline;
pub mod providers;
pub mod render;
pub mod store;

// Re-export main types for easy access
pub use cache::ResultCache;
pub use config::Config;
pub use errors::IcpError;
pub use fetcher::RetryingFetcher;
pub use pipeline::LookupPipeline;
pub use providers::{ProviderConfig, ProviderId, ProviderTable};
pub use store::{FileStore, KeyValueStore, MemoryStore};

use serde::{Deserialize, Serialize};

/// Placeholder for a field the provider left out.
pub const UNKNOWN: &str = "未知";

/// Placeholder for every field when no provider had a record.
pub const NOT_FOUND: &str = "未查询到";

/// Canonical ICP registration record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRecord {
    pub domain: String,
    pub company_name: String,
    pub site_name: String,
    pub nature: String,
    pub icp: String,
    pub time: String,
}

impl LookupRecord {
    /// The record returned when every provider came back empty.
    pub fn not_found() -> Self {
        Self {
            domain: NOT_FOUND.to_string(),
            company_name: NOT_FOUND.to_string(),
            site_name: NOT_FOUND.to_string(),
            nature: NOT_FOUND.to_string(),
            icp: NOT_FOUND.to_string(),
            time: NOT_FOUND.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        *self == Self::not_found()
    }
}

/// Where a lookup's record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    Cache,
    Provider(ProviderId),
    NotFound,
}

/// A record together with the domain it was looked up under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupOutcome {
    pub domain: String,
    pub record: LookupRecord,
    pub source: RecordSource,
}

/// Response structure for ICP lookups served over HTTP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResponse {
    pub domain: String,
    pub record: LookupRecord,
    pub source: RecordSource,
    pub cached: bool,
    pub query_time_ms: u64,
}

impl LookupResponse {
    pub fn from_outcome(outcome: LookupOutcome, query_time_ms: u64) -> Self {
        Self {
            cached: outcome.source == RecordSource::Cache,
            domain: outcome.domain,
            record: outcome.record,
            source: outcome.source,
            query_time_ms,
        }
    }
}

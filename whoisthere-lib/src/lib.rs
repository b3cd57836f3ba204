//! # whoisthere Library
//!
//! Domain availability checking over WHOIS, with TLD search for a bare name.
//!
//! The library normalizes user input into canonical domains, expands a label
//! across a catalog of TLDs, and resolves every candidate concurrently with a
//! bounded number of WHOIS probes in flight.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use whoisthere_lib::{DomainChecker, FindTldsRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let checker = DomainChecker::new();
//!     let result = checker.check_domain("example.com").await?;
//!     println!("Domain: {} - Available: {}", result.domain, result.available);
//!
//!     let search = checker
//!         .find_available_tlds(&FindTldsRequest::new("example"))
//!         .await?;
//!     println!("Free: {:?}", search.available_domains);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Input normalization**: URLs, ports, case and IDNA are folded away
//! - **TLD catalog**: popular, country and extended categories
//! - **Three-valued verdicts**: undetermined results never read as available
//! - **Concurrent Processing**: semaphore-bounded fan-out with per-probe timeouts
//! - **Configurable**: TOML files and `WT_*` environment variables

// Re-export main public API types and functions
// This makes them available as whoisthere_lib::TypeName
pub use catalog::{
    extract_tld, has_tld, validate_catalog_entry, TldCatalog, TldCategory, COUNTRY_TLDS,
    EXTENDED_TLDS, POPULAR_TLDS,
};
pub use checker::DomainChecker;
pub use classifier::{classify, classify_response, is_available};
pub use concurrent::ConcurrentProcessor;
pub use config::{
    load_env_config, load_env_config_from, parse_duration, parse_timeout_string, CatalogConfig,
    ConfigManager, DefaultsConfig, EnvConfig, FileConfig,
};
pub use dates::parse_expiration_date;
pub use error::WhoisThereError;
pub use protocols::{
    builtin_whois_server, is_rate_limited, ResponseParser, WhoisClient, WhoisParser, WhoisRecord,
    WhoisSource,
};
pub use types::{
    AggregatedOutcome, Availability, CandidateFilter, CanonicalDomain, CheckConfig,
    DomainAvailability, FindTldsRequest, ProbeResult, TldSearchResult,
};
pub use utils::normalize_domain;

// Internal modules - these are not part of the public API
mod catalog;
mod checker;
mod classifier;
mod concurrent;
mod config;
mod dates;
mod error;
mod protocols;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, WhoisThereError>;

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

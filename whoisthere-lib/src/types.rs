//! Core data types for domain availability checking.
//!
//! This module defines the main data structures used throughout the library:
//! the canonical domain newtype, probe results, aggregated outcomes,
//! configuration and the request/response shapes of the two operations.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::time::Duration;

/// A normalized, validated domain name.
///
/// Lowercase, no scheme/path/port, at least two labels of 1-63 characters
/// without leading or trailing hyphens, and a final label of two or more
/// characters. The only way to obtain one is [`crate::normalize_domain`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CanonicalDomain(String);

impl CanonicalDomain {
    /// Wrap a string that has already passed validation.
    pub(crate) fn from_validated(domain: String) -> Self {
        Self(domain)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Outcome of classifying a single domain.
///
/// `Unknown` keeps "could not tell" apart from "registered" internally;
/// every boolean surface of the library treats it as not available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Availability {
    Available,
    Registered,
    Unknown { reason: String },
}

impl Availability {
    pub fn unknown<R: Into<String>>(reason: R) -> Self {
        Self::Unknown {
            reason: reason.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }

    /// Reason attached to an undetermined result.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Unknown { reason } => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Available => write!(f, "available"),
            Availability::Registered => write!(f, "registered"),
            Availability::Unknown { reason } => write!(f, "unknown ({})", reason),
        }
    }
}

/// Result of probing one candidate.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub domain: CanonicalDomain,

    pub availability: Availability,

    /// How long the probe took once it was admitted
    #[serde(skip)]
    pub check_duration: Duration,
}

impl ProbeResult {
    pub fn available(&self) -> bool {
        self.availability.is_available()
    }
}

/// Fan-in result of a multi-candidate resolution.
///
/// Sets keep every domain exactly once regardless of completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedOutcome {
    pub available_domains: BTreeSet<CanonicalDomain>,

    /// Available domains whose TLD is in the popular category
    pub popular_available_domains: BTreeSet<CanonicalDomain>,

    /// Domains whose probe could not reach a verdict (counted as unavailable)
    pub undetermined_domains: BTreeSet<CanonicalDomain>,
}

impl AggregatedOutcome {
    /// Fold one probe result into the outcome.
    pub fn record(&mut self, result: ProbeResult, is_popular: bool) {
        match result.availability {
            Availability::Available => {
                if is_popular {
                    self.popular_available_domains.insert(result.domain.clone());
                }
                self.available_domains.insert(result.domain);
            }
            Availability::Registered => {}
            Availability::Unknown { .. } => {
                self.undetermined_domains.insert(result.domain);
            }
        }
    }
}

/// Configuration options for checking operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Maximum number of probes in flight at once
    /// Default: 20, Range: 1-100
    pub concurrency: usize,

    /// Upper bound for one complete probe (fetch, referral and classification)
    /// Default: 10 seconds
    #[serde(skip)]
    pub probe_timeout: Duration,

    /// Timeout for a single WHOIS server round trip
    /// Default: 5 seconds
    #[serde(skip)]
    pub whois_timeout: Duration,

    /// Whether to follow "Registrar WHOIS Server" referrals
    /// Default: true
    pub follow_referral: bool,

    /// WHOIS server overrides keyed by TLD or suffix (e.g. "co.uk")
    #[serde(skip)]
    pub whois_servers: HashMap<String, String>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            concurrency: 20,
            probe_timeout: Duration::from_secs(10),
            whois_timeout: Duration::from_secs(5),
            follow_referral: true,
            whois_servers: HashMap::new(),
        }
    }
}

impl CheckConfig {
    /// Set concurrency, capped to 1-100 to prevent resource exhaustion.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, 100);
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_whois_timeout(mut self, timeout: Duration) -> Self {
        self.whois_timeout = timeout;
        self
    }

    pub fn with_follow_referral(mut self, enabled: bool) -> Self {
        self.follow_referral = enabled;
        self
    }

    pub fn with_whois_servers(mut self, servers: HashMap<String, String>) -> Self {
        self.whois_servers = servers;
        self
    }
}

/// Selection flags for candidate generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateFilter {
    #[serde(default)]
    pub only_popular: bool,
    #[serde(default)]
    pub only_country: bool,
    /// Append the extended TLD set to the selection
    #[serde(default)]
    pub include_extended: bool,
}

/// Input of the TLD search operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindTldsRequest {
    /// Bare label without a TLD, e.g. "google"
    pub domain: String,
    #[serde(default, alias = "only_popular")]
    pub only_popular: bool,
    #[serde(default, alias = "only_country")]
    pub only_country: bool,
    #[serde(default, alias = "include_extended")]
    pub include_extended: bool,
}

impl FindTldsRequest {
    pub fn new<D: Into<String>>(domain: D) -> Self {
        Self {
            domain: domain.into(),
            ..Default::default()
        }
    }

    pub fn only_popular(mut self, enabled: bool) -> Self {
        self.only_popular = enabled;
        self
    }

    pub fn only_country(mut self, enabled: bool) -> Self {
        self.only_country = enabled;
        self
    }

    pub fn include_extended(mut self, enabled: bool) -> Self {
        self.include_extended = enabled;
        self
    }

    pub fn filter(&self) -> CandidateFilter {
        CandidateFilter {
            only_popular: self.only_popular,
            only_country: self.only_country,
            include_extended: self.include_extended,
        }
    }
}

/// Output of the single-domain check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainAvailability {
    pub available: bool,

    /// Canonical form of the checked domain
    pub domain: String,

    /// Why the check could not reach a verdict, if it could not
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub note: Option<String>,
}

/// Output of the TLD search operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TldSearchResult {
    pub available_domains: Vec<String>,

    /// Subset of `available_domains` under popular TLDs
    pub popular_domains: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub undetermined_domains: Vec<String>,
}

impl From<AggregatedOutcome> for TldSearchResult {
    fn from(outcome: AggregatedOutcome) -> Self {
        let to_strings = |set: BTreeSet<CanonicalDomain>| {
            set.into_iter()
                .map(CanonicalDomain::into_string)
                .collect::<Vec<_>>()
        };
        Self {
            available_domains: to_strings(outcome.available_domains),
            popular_domains: to_strings(outcome.popular_available_domains),
            undetermined_domains: to_strings(outcome.undetermined_domains),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain(s: &str) -> CanonicalDomain {
        CanonicalDomain::from_validated(s.to_string())
    }

    fn probe(s: &str, availability: Availability) -> ProbeResult {
        ProbeResult {
            domain: domain(s),
            availability,
            check_duration: Duration::ZERO,
        }
    }

    #[test]
    fn test_aggregate_keeps_popular_subset() {
        let mut outcome = AggregatedOutcome::default();
        outcome.record(probe("a.com", Availability::Available), true);
        outcome.record(probe("a.de", Availability::Available), false);
        outcome.record(probe("a.net", Availability::Registered), true);
        outcome.record(probe("a.io", Availability::unknown("timeout")), true);

        assert_eq!(outcome.available_domains.len(), 2);
        assert_eq!(outcome.popular_available_domains.len(), 1);
        assert!(outcome
            .popular_available_domains
            .is_subset(&outcome.available_domains));
        assert!(outcome.undetermined_domains.contains(&domain("a.io")));
    }

    #[test]
    fn test_aggregate_deduplicates() {
        let mut outcome = AggregatedOutcome::default();
        outcome.record(probe("a.co", Availability::Available), true);
        outcome.record(probe("a.co", Availability::Available), true);
        assert_eq!(outcome.available_domains.len(), 1);
        assert_eq!(outcome.popular_available_domains.len(), 1);
    }

    #[test]
    fn test_search_result_serializes_camel_case() {
        let mut outcome = AggregatedOutcome::default();
        outcome.record(probe("a.com", Availability::Available), true);
        let json = serde_json::to_value(TldSearchResult::from(outcome)).unwrap();
        assert_eq!(json["availableDomains"][0], "a.com");
        assert_eq!(json["popularDomains"][0], "a.com");
        assert!(json.get("undeterminedDomains").is_none());
    }

    #[test]
    fn test_find_request_defaults() {
        let req: FindTldsRequest = serde_json::from_str(r#"{"domain":"google"}"#).unwrap();
        assert!(!req.only_popular);
        assert!(!req.only_country);
        let req: FindTldsRequest =
            serde_json::from_str(r#"{"domain":"google","only_popular":true}"#).unwrap();
        assert!(req.only_popular);
    }

    #[test]
    fn test_concurrency_is_clamped() {
        assert_eq!(CheckConfig::default().with_concurrency(0).concurrency, 1);
        assert_eq!(CheckConfig::default().with_concurrency(500).concurrency, 100);
    }

    #[test]
    fn test_availability_reason() {
        assert_eq!(Availability::unknown("timeout").reason(), Some("timeout"));
        assert!(Availability::Available.reason().is_none());
        assert!(!Availability::unknown("x").is_available());
    }
}

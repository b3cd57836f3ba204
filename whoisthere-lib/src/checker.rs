//! Main domain checker implementation.
//!
//! This module provides the primary `DomainChecker` struct that validates
//! input, builds candidate sets and drives WHOIS probes for the two public
//! operations: checking one domain and searching TLDs for a bare label.

use crate::catalog::{has_tld, TldCatalog};
use crate::concurrent::ConcurrentProcessor;
use crate::error::WhoisThereError;
use crate::protocols::{ResponseParser, WhoisClient, WhoisParser, WhoisSource};
use crate::types::{
    CanonicalDomain, CheckConfig, DomainAvailability, FindTldsRequest, ProbeResult,
    TldSearchResult,
};
use crate::utils::normalize_domain;
use std::sync::Arc;

/// Suffix appended to a bare label to validate it as a domain.
const SENTINEL_TLD: &str = "com";

/// Main domain checker that coordinates availability checking operations.
///
/// The `DomainChecker` handles:
/// - Input normalization and validation
/// - Candidate generation from the TLD catalog
/// - Bounded concurrent WHOIS probing
/// - Aggregation into caller-facing results
///
/// # Example
///
/// ```rust,no_run
/// use whoisthere_lib::{DomainChecker, FindTldsRequest};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let checker = DomainChecker::new();
///     let result = checker.check_domain("example.com").await?;
///     println!("Available: {}", result.available);
///
///     let search = checker
///         .find_available_tlds(&FindTldsRequest::new("example").only_popular(true))
///         .await?;
///     println!("Free: {:?}", search.available_domains);
///     Ok(())
/// }
/// ```
pub struct DomainChecker {
    /// Configuration settings for this checker instance
    config: CheckConfig,
    /// Catalog used for candidate generation and popularity checks
    catalog: Arc<TldCatalog>,
    /// Fan-out engine shared by both operations
    processor: ConcurrentProcessor,
}

impl DomainChecker {
    /// Create a new domain checker with default configuration.
    ///
    /// Default settings:
    /// - Concurrency: 20
    /// - Probe timeout: 10 seconds
    /// - WHOIS timeout: 5 seconds
    /// - Registrar referrals: followed
    pub fn new() -> Self {
        Self::with_config(CheckConfig::default())
    }

    /// Create a new domain checker with custom configuration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use whoisthere_lib::{DomainChecker, CheckConfig};
    /// use std::time::Duration;
    ///
    /// let config = CheckConfig::default()
    ///     .with_concurrency(30)
    ///     .with_probe_timeout(Duration::from_secs(15));
    ///
    /// let checker = DomainChecker::with_config(config);
    /// assert_eq!(checker.config().concurrency, 30);
    /// ```
    pub fn with_config(config: CheckConfig) -> Self {
        Self::with_catalog(config, TldCatalog::default())
    }

    /// Create a checker with a custom TLD catalog.
    pub fn with_catalog(config: CheckConfig, catalog: TldCatalog) -> Self {
        let source: Arc<dyn WhoisSource> = Arc::new(WhoisClient::from_config(&config));
        Self::with_components(config, source, Arc::new(WhoisParser::new()), Arc::new(catalog))
    }

    /// Create a checker from explicit collaborators.
    pub fn with_components(
        config: CheckConfig,
        source: Arc<dyn WhoisSource>,
        parser: Arc<dyn ResponseParser>,
        catalog: Arc<TldCatalog>,
    ) -> Self {
        let processor = ConcurrentProcessor::new(
            source,
            parser,
            Arc::clone(&catalog),
            config.concurrency,
            config.probe_timeout,
        );
        Self {
            config,
            catalog,
            processor,
        }
    }

    /// Check availability of a single, fully-qualified domain.
    ///
    /// URLs and `host:port` inputs are accepted; only the host is checked.
    ///
    /// # Errors
    ///
    /// Returns an input error when the domain is empty, malformed or lacks a
    /// TLD. Network and parsing problems are never returned: they produce
    /// `available: false` with a `note`.
    pub async fn check_domain(&self, input: &str) -> Result<DomainAvailability, WhoisThereError> {
        let probe = self.probe_domain(input).await?;
        Ok(DomainAvailability {
            available: probe.available(),
            note: probe.availability.reason().map(str::to_string),
            domain: probe.domain.into_string(),
        })
    }

    /// Like [`check_domain`](Self::check_domain) but returns the full probe result.
    pub async fn probe_domain(&self, input: &str) -> Result<ProbeResult, WhoisThereError> {
        let domain = self.validate_fqdn(input)?;
        let result = self.processor.resolve_one(&domain).await;
        tracing::info!(
            domain = %result.domain,
            availability = %result.availability,
            elapsed_ms = result.check_duration.as_millis() as u64,
            "domain checked"
        );
        Ok(result)
    }

    /// Find which catalog TLDs are available for a bare label.
    ///
    /// # Errors
    ///
    /// Returns an input error when the label is empty, already carries a
    /// TLD, or does not form a valid domain.
    pub async fn find_available_tlds(
        &self,
        request: &FindTldsRequest,
    ) -> Result<TldSearchResult, WhoisThereError> {
        let candidates = self.candidates_for(request)?;
        let outcome = self.processor.resolve_many(candidates).await;
        Ok(outcome.into())
    }

    /// Validate the request label and build its candidate set.
    pub fn candidates_for(
        &self,
        request: &FindTldsRequest,
    ) -> Result<Vec<CanonicalDomain>, WhoisThereError> {
        let label = self.validate_label(&request.domain)?;
        Ok(self.catalog.candidates(&label, &request.filter()))
    }

    /// Get the current configuration for this checker.
    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// Get the catalog used by this checker.
    pub fn catalog(&self) -> &TldCatalog {
        &self.catalog
    }

    fn validate_fqdn(&self, input: &str) -> Result<CanonicalDomain, WhoisThereError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(WhoisThereError::EmptyDomain);
        }
        if !trimmed.contains('.') {
            return Err(WhoisThereError::domain_must_include_tld(trimmed));
        }

        let domain = normalize_domain(trimmed)?;
        if !has_tld(domain.as_str()) {
            return Err(WhoisThereError::domain_must_include_tld(domain.as_str()));
        }
        Ok(domain)
    }

    fn validate_label(&self, input: &str) -> Result<String, WhoisThereError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(WhoisThereError::EmptyDomain);
        }
        if has_tld(trimmed) {
            return Err(WhoisThereError::label_must_not_include_tld(trimmed));
        }

        let sentinel = normalize_domain(&format!("{}.{}", trimmed, SENTINEL_TLD))?;
        let label = sentinel
            .as_str()
            .strip_suffix(SENTINEL_TLD)
            .and_then(|rest| rest.strip_suffix('.'))
            .ok_or_else(|| WhoisThereError::invalid_format(sentinel.as_str()))?;
        Ok(label.to_string())
    }
}

impl Default for DomainChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Every domain in `free` is unregistered, everything else is taken.
    struct FakeSource {
        free: HashSet<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl WhoisSource for FakeSource {
        async fn fetch(&self, domain: &str) -> Result<String, WhoisThereError> {
            self.calls.lock().unwrap().push(domain.to_string());
            if domain.ends_with(".ke") {
                return Err(WhoisThereError::timeout("WHOIS", std::time::Duration::from_secs(5)));
            }
            if self.free.contains(domain) {
                Ok("No match for domain".to_string())
            } else {
                Ok("Domain Name: X\nRegistrar: Y\n".to_string())
            }
        }
    }

    fn checker(free: &[&'static str]) -> (DomainChecker, Arc<FakeSource>) {
        let source = Arc::new(FakeSource {
            free: free.iter().copied().collect(),
            calls: Mutex::new(Vec::new()),
        });
        let checker = DomainChecker::with_components(
            CheckConfig::default(),
            source.clone(),
            Arc::new(WhoisParser::new()),
            Arc::new(TldCatalog::default()),
        );
        (checker, source)
    }

    #[tokio::test]
    async fn test_check_domain_available_and_taken() {
        let (checker, _) = checker(&["free-name.com"]);

        let result = checker.check_domain("https://Free-Name.com/x").await.unwrap();
        assert_eq!(
            result,
            DomainAvailability {
                available: true,
                domain: "free-name.com".to_string(),
                note: None,
            }
        );

        let result = checker.check_domain("google.com").await.unwrap();
        assert!(!result.available);
        assert!(result.note.is_none());
    }

    #[tokio::test]
    async fn test_check_domain_probe_failure_is_unavailable() {
        let (checker, _) = checker(&[]);
        let result = checker.check_domain("name.ke").await.unwrap();
        assert!(!result.available);
        assert!(result.note.is_some());
    }

    #[tokio::test]
    async fn test_check_domain_input_errors_skip_network() {
        let (checker, source) = checker(&[]);

        assert_eq!(
            checker.check_domain("   ").await,
            Err(WhoisThereError::EmptyDomain)
        );
        assert!(matches!(
            checker.check_domain("google").await,
            Err(WhoisThereError::DomainMustIncludeTld { .. })
        ));
        assert!(matches!(
            checker.check_domain("me@google.com").await,
            Err(WhoisThereError::EmailLikeInput { .. })
        ));
        assert!(source.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_available_tlds_popular_only() {
        let (checker, source) = checker(&["acme.io", "acme.dev", "acme.de"]);
        let request = FindTldsRequest::new("acme").only_popular(true);

        let result = checker.find_available_tlds(&request).await.unwrap();
        assert_eq!(result.available_domains, vec!["acme.dev", "acme.io"]);
        assert_eq!(result.popular_domains, vec!["acme.dev", "acme.io"]);
        assert!(result.undetermined_domains.is_empty());
        assert_eq!(source.calls.lock().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_find_available_tlds_default_selection() {
        let (checker, _) = checker(&["acme.io", "acme.de", "acme.co.uk"]);

        let result = checker
            .find_available_tlds(&FindTldsRequest::new("Acme"))
            .await
            .unwrap();
        assert_eq!(
            result.available_domains,
            vec!["acme.co.uk", "acme.de", "acme.io"]
        );
        assert_eq!(result.popular_domains, vec!["acme.io"]);
        assert_eq!(result.undetermined_domains, vec!["acme.ke"]);
    }

    #[tokio::test]
    async fn test_find_available_tlds_rejects_tld() {
        let (checker, source) = checker(&[]);

        assert!(matches!(
            checker
                .find_available_tlds(&FindTldsRequest::new("google.com"))
                .await,
            Err(WhoisThereError::LabelMustNotIncludeTld { .. })
        ));
        assert_eq!(
            checker.find_available_tlds(&FindTldsRequest::new("")).await,
            Err(WhoisThereError::EmptyDomain)
        );
        assert!(matches!(
            checker
                .find_available_tlds(&FindTldsRequest::new("-bad"))
                .await,
            Err(WhoisThereError::InvalidLabelHyphen { .. })
        ));
        assert!(source.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_candidates_for_country_only() {
        let (checker, _) = checker(&[]);
        let candidates = checker
            .candidates_for(&FindTldsRequest::new("acme").only_country(true))
            .unwrap();
        assert!(candidates.iter().all(|d| !d.as_str().ends_with(".com")));
        assert!(candidates.iter().any(|d| d.as_str() == "acme.co.uk"));
    }
}

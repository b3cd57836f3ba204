//! Concurrent processing utilities for domain checking.
//!
//! One task is spawned per candidate. A semaphore bounds how many probes are
//! in flight, every probe carries its own timeout, and results flow back over
//! a channel into an [`AggregatedOutcome`] that is only returned once every
//! probe has reported.

use crate::catalog::TldCatalog;
use crate::classifier::classify;
use crate::protocols::{ResponseParser, WhoisSource};
use crate::types::{AggregatedOutcome, Availability, CanonicalDomain, ProbeResult};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};

/// Manages concurrent domain checking operations.
#[derive(Clone)]
pub struct ConcurrentProcessor {
    source: Arc<dyn WhoisSource>,
    parser: Arc<dyn ResponseParser>,
    catalog: Arc<TldCatalog>,
    semaphore: Arc<Semaphore>,
    max_concurrency: usize,
    probe_timeout: Duration,
}

impl ConcurrentProcessor {
    /// Create a new concurrent processor.
    ///
    /// `max_concurrency` is raised to at least one.
    pub fn new(
        source: Arc<dyn WhoisSource>,
        parser: Arc<dyn ResponseParser>,
        catalog: Arc<TldCatalog>,
        max_concurrency: usize,
        probe_timeout: Duration,
    ) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            source,
            parser,
            catalog,
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
            probe_timeout,
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Probe a single domain, bounded by the probe timeout.
    pub async fn resolve_one(&self, domain: &CanonicalDomain) -> ProbeResult {
        probe(
            domain.clone(),
            self.source.as_ref(),
            self.parser.as_ref(),
            self.probe_timeout,
        )
        .await
    }

    /// Probe every candidate concurrently and aggregate the results.
    ///
    /// Returns only after all probes have reported. Output sets are
    /// independent of completion order.
    pub async fn resolve_many(&self, candidates: Vec<CanonicalDomain>) -> AggregatedOutcome {
        let mut outcome = AggregatedOutcome::default();
        if candidates.is_empty() {
            return outcome;
        }

        let start = Instant::now();
        let total = candidates.len();
        tracing::info!(
            candidates = total,
            concurrency = self.max_concurrency,
            "resolving candidates"
        );

        let (tx, mut rx) = mpsc::channel::<ProbeResult>(total);

        for domain in candidates {
            let tx = tx.clone();
            let source = Arc::clone(&self.source);
            let parser = Arc::clone(&self.parser);
            let semaphore = Arc::clone(&self.semaphore);
            let probe_timeout = self.probe_timeout;

            tokio::spawn(async move {
                // The processor owns the semaphore and never closes it
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("probe semaphore is never closed");
                let result = probe(domain, source.as_ref(), parser.as_ref(), probe_timeout).await;
                // The receiver lives until every sender is dropped
                let _ = tx.send(result).await;
            });
        }
        drop(tx);

        let mut reported = 0;
        while let Some(result) = rx.recv().await {
            reported += 1;
            let popular = self.catalog.is_popular_tld(result.domain.as_str());
            outcome.record(result, popular);
        }

        if reported < total {
            tracing::warn!(
                missing = total - reported,
                "some probes ended without reporting"
            );
        }
        tracing::info!(
            available = outcome.available_domains.len(),
            popular = outcome.popular_available_domains.len(),
            undetermined = outcome.undetermined_domains.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "resolution finished"
        );

        outcome
    }
}

/// Classify one domain under a timeout; a timeout yields `Unknown`.
async fn probe(
    domain: CanonicalDomain,
    source: &dyn WhoisSource,
    parser: &dyn ResponseParser,
    probe_timeout: Duration,
) -> ProbeResult {
    let start = Instant::now();
    let availability =
        match tokio::time::timeout(probe_timeout, classify(domain.as_str(), source, parser)).await
        {
            Ok(availability) => availability,
            Err(_) => {
                tracing::debug!(domain = %domain, timeout = ?probe_timeout, "probe timed out");
                Availability::unknown(format!("probe timed out after {:?}", probe_timeout))
            }
        };

    ProbeResult {
        domain,
        availability,
        check_duration: start.elapsed(),
    }
}

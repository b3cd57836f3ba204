//! Availability classification of WHOIS responses.
//!
//! Registries disagree on how to say "no such domain", so classification is
//! an ordered list of checks over the raw text and the parsed record. The
//! first check that fires decides. Anything that prevents a decision yields
//! [`Availability::Unknown`], which every boolean surface reports as taken.

use crate::dates::parse_expiration_date;
use crate::protocols::{ResponseParser, WhoisSource};
use crate::types::Availability;
use chrono::{DateTime, Utc};

/// Phrases in the raw response that mean the domain is not registered.
pub const NOT_FOUND_PATTERNS: &[&str] = &[
    "no match for",
    "not found",
    "no entries found",
    "no data found",
    "domain not found",
    "no information available",
    "status: free",
    "status: available",
];

/// Status flags marking a registration that is on its way out.
pub const EXPIRED_STATUS_MARKERS: &[&str] = &["pendingdelete", "redemptionperiod", "expired"];

/// Fetch and classify `domain`.
pub async fn classify(
    domain: &str,
    source: &dyn WhoisSource,
    parser: &dyn ResponseParser,
) -> Availability {
    match source.fetch(domain).await {
        Ok(raw) => {
            let availability = classify_response(&raw, parser, Utc::now());
            tracing::debug!(domain = %domain, availability = %availability, "classified");
            availability
        }
        Err(e) => {
            tracing::debug!(domain = %domain, error = %e, "WHOIS fetch failed");
            Availability::unknown(e.to_string())
        }
    }
}

/// Fetch and classify `domain`, collapsing the verdict to a boolean.
///
/// Undetermined results count as not available.
pub async fn is_available(
    domain: &str,
    source: &dyn WhoisSource,
    parser: &dyn ResponseParser,
) -> bool {
    classify(domain, source, parser).await.is_available()
}

/// Classify an already fetched response as of `now`.
pub fn classify_response(
    raw: &str,
    parser: &dyn ResponseParser,
    now: DateTime<Utc>,
) -> Availability {
    let lower = raw.to_lowercase();
    if let Some(pattern) = NOT_FOUND_PATTERNS.iter().find(|p| lower.contains(*p)) {
        tracing::debug!(rule = "text_pattern", pattern = %pattern, "available");
        return Availability::Available;
    }

    let record = match parser.parse(raw) {
        Ok(record) => record,
        Err(e) if e.indicates_available() => {
            tracing::debug!(rule = "parser_not_found", "available");
            return Availability::Available;
        }
        Err(e) => return Availability::unknown(e.to_string()),
    };

    let expired_status = record.statuses.iter().find(|status| {
        let status = status.to_lowercase();
        EXPIRED_STATUS_MARKERS
            .iter()
            .any(|marker| status.contains(marker))
    });
    if let Some(status) = expired_status {
        tracing::debug!(rule = "expired_status", status = %status, "available");
        return Availability::Available;
    }

    if let Some(expiration) = record.expiration_date.as_deref().filter(|d| !d.trim().is_empty()) {
        match parse_expiration_date(expiration) {
            Ok(expires) if expires < now => {
                tracing::debug!(rule = "past_expiration", expires = %expires, "available");
                return Availability::Available;
            }
            Ok(_) => {}
            Err(e) => return Availability::unknown(e.to_string()),
        }
    }

    Availability::Registered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WhoisThereError;
    use crate::protocols::{WhoisParser, WhoisRecord};
    use async_trait::async_trait;
    use chrono::TimeZone;

    struct StaticSource(Result<String, WhoisThereError>);

    #[async_trait]
    impl WhoisSource for StaticSource {
        async fn fetch(&self, _domain: &str) -> Result<String, WhoisThereError> {
            self.0.clone()
        }
    }

    /// Parser returning a fixed outcome regardless of input.
    struct FixedParser(Result<WhoisRecord, WhoisThereError>);

    impl ResponseParser for FixedParser {
        fn parse(&self, _raw: &str) -> Result<WhoisRecord, WhoisThereError> {
            self.0.clone()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn record_with(statuses: &[&str], expiration: Option<&str>) -> FixedParser {
        FixedParser(Ok(WhoisRecord {
            domain_name: Some("example.com".into()),
            statuses: statuses.iter().map(|s| s.to_string()).collect(),
            expiration_date: expiration.map(str::to_string),
            ..Default::default()
        }))
    }

    #[test]
    fn test_text_pattern_in_any_case() {
        let parser = FixedParser(Err(WhoisThereError::parse("unused", None)));
        for raw in ["Domain not found.", "DOMAIN NOT FOUND", "No match for \"X.COM\"."] {
            assert_eq!(
                classify_response(raw, &parser, now()),
                Availability::Available
            );
        }
    }

    #[test]
    fn test_parser_not_found_is_available() {
        let parser = FixedParser(Err(WhoisThereError::DomainNotFound));
        assert_eq!(
            classify_response("whatever", &parser, now()),
            Availability::Available
        );
    }

    #[test]
    fn test_parse_failure_is_unknown() {
        let parser = FixedParser(Err(WhoisThereError::parse("garbage", None)));
        assert!(classify_response("whatever", &parser, now()).is_unknown());
    }

    #[test]
    fn test_pending_delete_status_is_available() {
        let parser = record_with(&["pendingDelete"], Some("2030-01-01"));
        assert_eq!(
            classify_response("Domain Name: example.com", &parser, now()),
            Availability::Available
        );
        let parser = record_with(&["redemptionPeriod"], None);
        assert!(classify_response("x", &parser, now()).is_available());
    }

    #[test]
    fn test_expiration_dates() {
        let past = record_with(&["ok"], Some("2021-01-01"));
        assert!(classify_response("x", &past, now()).is_available());

        let future = record_with(&["ok"], Some("2030-01-01 12:00:00"));
        assert_eq!(
            classify_response("x", &future, now()),
            Availability::Registered
        );

        let malformed = record_with(&["ok"], Some("2021-0111-01 12:00:00"));
        assert!(classify_response("x", &malformed, now()).is_unknown());
    }

    #[test]
    fn test_record_without_hints_is_registered() {
        let parser = record_with(&["clientTransferProhibited"], None);
        assert_eq!(
            classify_response("x", &parser, now()),
            Availability::Registered
        );
    }

    #[test]
    fn test_with_real_parser() {
        let raw = "Domain Name: EXAMPLE.COM\nRegistrar: Foo\nRegistry Expiry Date: 2030-08-13T04:00:00Z\n";
        assert_eq!(
            classify_response(raw, &WhoisParser::new(), now()),
            Availability::Registered
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_is_not_available() {
        let source = StaticSource(Err(WhoisThereError::network("connection refused")));
        let parser = WhoisParser::new();
        let availability = classify("example.com", &source, &parser).await;
        assert!(availability.is_unknown());
        assert!(!is_available("example.com", &source, &parser).await);
    }

    #[tokio::test]
    async fn test_rate_limited_fetch_is_unknown() {
        let source = StaticSource(Err(WhoisThereError::rate_limited("whois.nic.io")));
        let availability = classify("example.io", &source, &WhoisParser::new()).await;
        assert_eq!(availability.reason(), Some("Rate limited by whois.nic.io"));
    }

    #[tokio::test]
    async fn test_classify_fetched_text() {
        let source = StaticSource(Ok("%% NOT FOUND %%".to_string()));
        assert!(is_available("example.io", &source, &WhoisParser::new()).await);
    }
}

//! Structured parsing of WHOIS responses.
//!
//! WHOIS text is loosely `key: value` lines with registry-specific keys.
//! The parser collects the fields availability classification cares about
//! and reports [`WhoisThereError::DomainNotFound`] when the registry says
//! there is no such object.

use crate::error::WhoisThereError;
use crate::protocols::whois::is_rate_limited;
use serde::{Deserialize, Serialize};

/// Fields extracted from a WHOIS response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhoisRecord {
    pub domain_name: Option<String>,
    pub registrar: Option<String>,
    /// Status flags, first token of each status value (e.g. `clientTransferProhibited`)
    pub statuses: Vec<String>,
    pub creation_date: Option<String>,
    pub updated_date: Option<String>,
    /// Raw expiration date text, parsed later by the classifier
    pub expiration_date: Option<String>,
    pub name_servers: Vec<String>,
}

impl WhoisRecord {
    fn is_empty(&self) -> bool {
        self.domain_name.is_none()
            && self.registrar.is_none()
            && self.statuses.is_empty()
            && self.expiration_date.is_none()
    }
}

/// Parser turning raw WHOIS text into a [`WhoisRecord`].
pub trait ResponseParser: Send + Sync {
    /// Parse `raw`. A missing registration is signalled with
    /// `Err(WhoisThereError::DomainNotFound)`.
    fn parse(&self, raw: &str) -> Result<WhoisRecord, WhoisThereError>;
}

/// Not-found wording that the classifier's quick text check does not cover.
const NOT_FOUND_MARKERS: &[&str] = &[
    "object does not exist",
    "no matching record",
    "not registered",
    "available for registration",
    "no object found",
    "nothing found",
    "no matching entry",
    "this domain name has not been registered",
];

const DOMAIN_KEYS: &[&str] = &["domain name", "domain"];
const REGISTRAR_KEYS: &[&str] = &["registrar", "sponsoring registrar", "registrar name"];
const STATUS_KEYS: &[&str] = &["domain status", "status", "state"];
const CREATION_KEYS: &[&str] = &[
    "creation date",
    "created",
    "created on",
    "registered on",
    "registration time",
];
const UPDATED_KEYS: &[&str] = &["updated date", "last updated", "last modified", "changed"];
const EXPIRATION_KEYS: &[&str] = &[
    "registry expiry date",
    "registrar registration expiration date",
    "expiration date",
    "expiry date",
    "expires",
    "expires on",
    "paid-till",
    "expire",
    "renewal date",
    "valid until",
];
const NAME_SERVER_KEYS: &[&str] = &["name server", "nserver", "nameserver", "name servers"];

/// Default line-oriented WHOIS parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhoisParser;

impl WhoisParser {
    pub fn new() -> Self {
        Self
    }
}

impl ResponseParser for WhoisParser {
    fn parse(&self, raw: &str) -> Result<WhoisRecord, WhoisThereError> {
        if raw.trim().is_empty() {
            return Err(WhoisThereError::parse("empty WHOIS response", None));
        }
        if is_rate_limited(raw) {
            return Err(WhoisThereError::parse(
                "WHOIS server is rate limiting",
                Some(raw),
            ));
        }

        let lower = raw.to_lowercase();
        if NOT_FOUND_MARKERS.iter().any(|marker| lower.contains(marker)) {
            return Err(WhoisThereError::DomainNotFound);
        }

        let mut record = WhoisRecord::default();
        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty()
                || line.starts_with('%')
                || line.starts_with('#')
                || line.starts_with(">>>")
            {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            if DOMAIN_KEYS.contains(&key.as_str()) {
                record.domain_name.get_or_insert_with(|| value.to_lowercase());
            } else if REGISTRAR_KEYS.contains(&key.as_str()) {
                record.registrar.get_or_insert_with(|| value.to_string());
            } else if STATUS_KEYS.contains(&key.as_str()) {
                if let Some(flag) = value.split_whitespace().next() {
                    let flag = flag.trim_end_matches(',').to_string();
                    if !record.statuses.contains(&flag) {
                        record.statuses.push(flag);
                    }
                }
            } else if CREATION_KEYS.contains(&key.as_str()) {
                record.creation_date.get_or_insert_with(|| value.to_string());
            } else if UPDATED_KEYS.contains(&key.as_str()) {
                record.updated_date.get_or_insert_with(|| value.to_string());
            } else if EXPIRATION_KEYS.contains(&key.as_str()) {
                record.expiration_date.get_or_insert_with(|| value.to_string());
            } else if NAME_SERVER_KEYS.contains(&key.as_str()) {
                let ns = value.to_lowercase();
                if !record.name_servers.contains(&ns) {
                    record.name_servers.push(ns);
                }
            }
        }

        if record.is_empty() {
            return Err(WhoisThereError::parse(
                "no recognizable WHOIS fields",
                Some(raw),
            ));
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERISIGN_SAMPLE: &str = "   Domain Name: GOOGLE.COM\r
   Registry Domain ID: 2138514_DOMAIN_COM-VRSN\r
   Registrar WHOIS Server: whois.markmonitor.com\r
   Updated Date: 2019-09-09T15:39:04Z\r
   Creation Date: 1997-09-15T04:00:00Z\r
   Registry Expiry Date: 2028-09-14T04:00:00Z\r
   Registrar: MarkMonitor Inc.\r
   Domain Status: clientDeleteProhibited https://icann.org/epp#clientDeleteProhibited\r
   Domain Status: serverTransferProhibited https://icann.org/epp#serverTransferProhibited\r
   Name Server: NS1.GOOGLE.COM\r
   Name Server: NS2.GOOGLE.COM\r
>>> Last update of whois database: 2024-01-01T00:00:00Z <<<\r
";

    #[test]
    fn test_parse_thick_registry_response() {
        let record = WhoisParser::new().parse(VERISIGN_SAMPLE).unwrap();
        assert_eq!(record.domain_name.as_deref(), Some("google.com"));
        assert_eq!(record.registrar.as_deref(), Some("MarkMonitor Inc."));
        assert_eq!(
            record.statuses,
            vec!["clientDeleteProhibited", "serverTransferProhibited"]
        );
        assert_eq!(
            record.expiration_date.as_deref(),
            Some("2028-09-14T04:00:00Z")
        );
        assert_eq!(
            record.creation_date.as_deref(),
            Some("1997-09-15T04:00:00Z")
        );
        assert_eq!(record.name_servers, vec!["ns1.google.com", "ns2.google.com"]);
    }

    #[test]
    fn test_parse_ru_style_keys() {
        let raw = "domain:        EXAMPLE.RU\nstate:         REGISTERED, DELEGATED\nregistrar:     RU-CENTER-RU\npaid-till:     2025-03-01T21:00:00Z\n";
        let record = WhoisParser::new().parse(raw).unwrap();
        assert_eq!(record.statuses, vec!["REGISTERED"]);
        assert_eq!(record.expiration_date.as_deref(), Some("2025-03-01T21:00:00Z"));
    }

    #[test]
    fn test_not_found_sentinel() {
        let parser = WhoisParser::new();
        for raw in [
            "%ERROR:101: no entries found\n% The queried object does not exist: example.de",
            "This domain name has not been registered.",
            "Domain Status: No Object Found",
        ] {
            assert_eq!(parser.parse(raw), Err(WhoisThereError::DomainNotFound), "{}", raw);
        }
    }

    #[test]
    fn test_empty_and_garbage_fail() {
        let parser = WhoisParser::new();
        assert!(matches!(
            parser.parse("  \n "),
            Err(WhoisThereError::ParseError { .. })
        ));
        assert!(matches!(
            parser.parse("% comment only\nsome free text without fields\n"),
            Err(WhoisThereError::ParseError { .. })
        ));
    }

    #[test]
    fn test_rate_limited_is_not_not_found() {
        let result = WhoisParser::new().parse("Too many requests, domain not found maybe");
        assert!(matches!(result, Err(WhoisThereError::ParseError { .. })));
    }
}

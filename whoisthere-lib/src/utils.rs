//! Utility functions for domain processing and validation.
//!
//! This module turns arbitrary user input (bare domains, URLs, `host:port`
//! pairs) into a [`CanonicalDomain`] or a typed rejection. It is pure and
//! never touches the network.

use crate::error::WhoisThereError;
use crate::types::CanonicalDomain;
use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

lazy_static! {
    /// At least two dot-separated labels of lowercase letters, digits and hyphens.
    static ref DOMAIN_SHAPE: Regex =
        Regex::new(r"^[a-z0-9-]+(\.[a-z0-9-]+)+$").expect("domain shape regex is valid");
}

const MAX_LABEL_LEN: usize = 63;

/// Normalize and validate a user-supplied domain.
///
/// Accepts plain domains as well as URLs and `host:port` pairs, keeping only
/// the host. The result is lowercase and satisfies every label rule.
///
/// # Examples
///
/// ```rust
/// use whoisthere_lib::normalize_domain;
///
/// let domain = normalize_domain("http://Google.com/path:1").unwrap();
/// assert_eq!(domain.as_str(), "google.com");
/// ```
pub fn normalize_domain(input: &str) -> Result<CanonicalDomain, WhoisThereError> {
    let trimmed = input.trim();

    if trimmed.contains('@') {
        return Err(WhoisThereError::email_like(trimmed));
    }

    let mut host = if trimmed.contains("://") {
        let url = Url::parse(trimmed).map_err(|_| WhoisThereError::invalid_url(trimmed))?;
        url.host_str()
            .map(str::to_string)
            .ok_or_else(|| WhoisThereError::invalid_url(trimmed))?
    } else if trimmed.contains('/') || trimmed.contains(':') || !trimmed.is_ascii() {
        // Things like "google.com/path", "google.com:8080" or IDN hosts
        match Url::parse(&format!("https://{}", trimmed)) {
            Ok(url) => match url.host_str() {
                Some(h) if !h.is_empty() => h.to_string(),
                _ => trimmed.to_string(),
            },
            Err(_) => trimmed.to_string(),
        }
    } else {
        trimmed.to_string()
    };

    if host.matches(':').count() == 1 {
        if let Some((name, _port)) = host.split_once(':') {
            host = name.to_string();
        }
    }

    let domain = host.trim().to_lowercase();

    if !DOMAIN_SHAPE.is_match(&domain) {
        return Err(WhoisThereError::invalid_format(domain));
    }

    for label in domain.split('.') {
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            return Err(WhoisThereError::invalid_label_length(&domain, label));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(WhoisThereError::invalid_label_hyphen(&domain, label));
        }
    }

    match domain.rsplit('.').next() {
        Some(tld) if tld.len() >= 2 => {}
        _ => return Err(WhoisThereError::invalid_tld(domain)),
    }

    Ok(CanonicalDomain::from_validated(domain))
}

//! TLD catalog and candidate generation.
//!
//! The catalog holds three curated TLD categories (popular, country and
//! extended) and answers public-suffix questions about domains. It is built
//! once, wrapped in an `Arc`, and never mutated afterwards.

use crate::error::WhoisThereError;
use crate::types::{CandidateFilter, CanonicalDomain};
use crate::utils::normalize_domain;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Default popular TLDs.
pub const POPULAR_TLDS: &[&str] = &["com", "net", "org", "io", "dev", "app", "co"];

/// Default country-code TLDs (plus the common `co.uk` second-level suffix).
pub const COUNTRY_TLDS: &[&str] = &[
    "us", "uk", "ca", "au", "de", "fr", "it", "es", "nl", "jp", "kr", "cn", "in", "br", "mx",
    "ar", "cl", "co", "pe", "ru", "pl", "cz", "ch", "at", "se", "no", "dk", "fi", "be", "pt",
    "gr", "tr", "za", "eg", "ma", "ng", "ke", "co.uk",
];

/// Default extended TLDs, only probed when explicitly requested.
pub const EXTENDED_TLDS: &[&str] = &[
    "xyz", "me", "info", "biz", "ai", "shop", "store", "online", "info", "blog", "us", "tech",
];

/// Category a catalog entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TldCategory {
    Popular,
    Country,
    Extended,
}

impl fmt::Display for TldCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TldCategory::Popular => write!(f, "popular"),
            TldCategory::Country => write!(f, "country"),
            TldCategory::Extended => write!(f, "extended"),
        }
    }
}

/// Curated TLD lists used to build candidate sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TldCatalog {
    popular: Vec<String>,
    country: Vec<String>,
    extended: Vec<String>,
}

impl Default for TldCatalog {
    fn default() -> Self {
        let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            popular: owned(POPULAR_TLDS),
            country: owned(COUNTRY_TLDS),
            extended: owned(EXTENDED_TLDS),
        }
    }
}

impl TldCatalog {
    /// Build a catalog from custom lists.
    ///
    /// Every entry is trimmed, lowercased and checked with
    /// [`validate_catalog_entry`]. Empty categories are rejected.
    pub fn new(
        popular: Vec<String>,
        country: Vec<String>,
        extended: Vec<String>,
    ) -> Result<Self, WhoisThereError> {
        Ok(Self {
            popular: clean_category("popular", popular)?,
            country: clean_category("country", country)?,
            extended: clean_category("extended", extended)?,
        })
    }

    pub fn popular(&self) -> &[String] {
        &self.popular
    }

    pub fn country(&self) -> &[String] {
        &self.country
    }

    pub fn extended(&self) -> &[String] {
        &self.extended
    }

    /// Naive concatenation popular ++ country ++ extended (may contain duplicates).
    pub fn all_tlds(&self) -> Vec<&str> {
        self.popular
            .iter()
            .chain(self.country.iter())
            .chain(self.extended.iter())
            .map(String::as_str)
            .collect()
    }

    /// First category containing `tld`, checked popular, country, extended.
    pub fn category_of(&self, tld: &str) -> Option<TldCategory> {
        let tld = tld.trim_start_matches('.').to_lowercase();
        if self.popular.contains(&tld) {
            Some(TldCategory::Popular)
        } else if self.country.contains(&tld) {
            Some(TldCategory::Country)
        } else if self.extended.contains(&tld) {
            Some(TldCategory::Extended)
        } else {
            None
        }
    }

    /// Whether the public suffix of `domain` is one of the popular TLDs.
    pub fn is_popular_tld(&self, domain: &str) -> bool {
        let tld = extract_tld(domain);
        self.popular.iter().any(|t| *t == tld)
    }

    /// Build the candidate set for `label` under the selected categories.
    ///
    /// Neither flag set selects popular and country TLDs; `only_country`
    /// wins over `only_popular`. Extended TLDs are appended only when
    /// requested. Every candidate goes through [`normalize_domain`];
    /// duplicates keep their first position and invalid combinations are
    /// skipped.
    pub fn candidates(&self, label: &str, filter: &CandidateFilter) -> Vec<CanonicalDomain> {
        let mut selected: Vec<&String> = if filter.only_country {
            self.country.iter().collect()
        } else if filter.only_popular {
            self.popular.iter().collect()
        } else {
            self.popular.iter().chain(self.country.iter()).collect()
        };
        if filter.include_extended {
            selected.extend(self.extended.iter());
        }

        let mut seen = HashSet::new();
        let mut candidates = Vec::with_capacity(selected.len());
        for tld in selected {
            let raw = format!("{}.{}", label, tld);
            match normalize_domain(&raw) {
                Ok(domain) => {
                    if seen.insert(domain.clone()) {
                        candidates.push(domain);
                    }
                }
                Err(e) => {
                    tracing::warn!(candidate = %raw, error = %e, "skipping invalid candidate");
                }
            }
        }
        candidates
    }
}

/// Whether `domain` already carries a recognizable TLD.
///
/// Leading dots are ignored. The answer comes from the Public Suffix List:
/// an ICANN suffix always counts, and so does any suffix that is shorter
/// than the whole name.
///
/// # Examples
///
/// ```rust
/// use whoisthere_lib::has_tld;
///
/// assert!(has_tld("google.com"));
/// assert!(has_tld("google.com.br"));
/// assert!(!has_tld("google"));
/// ```
pub fn has_tld(domain: &str) -> bool {
    let domain = domain.to_lowercase();
    let domain = domain.trim_start_matches('.');
    if domain.is_empty() || !domain.contains('.') {
        return false;
    }

    match psl::suffix(domain.as_bytes()) {
        Some(suffix) => {
            suffix.typ() == Some(psl::Type::Icann) || suffix.as_bytes() != domain.as_bytes()
        }
        None => false,
    }
}

/// Public suffix of `domain`, e.g. `"com.br"` for `"google.com.br"`.
///
/// Returns an empty string when no suffix can be determined.
pub fn extract_tld(domain: &str) -> String {
    let domain = domain.to_lowercase();
    let domain = domain.trim_start_matches('.');
    psl::suffix(domain.as_bytes())
        .and_then(|suffix| std::str::from_utf8(suffix.as_bytes()).ok())
        .map(str::to_string)
        .unwrap_or_default()
}

/// Check a single catalog override entry.
///
/// Entries may be multi-label (`co.uk`) but must consist of lowercase
/// letters, digits, hyphens and inner dots only.
pub fn validate_catalog_entry(entry: &str) -> Result<(), WhoisThereError> {
    if entry.is_empty() {
        return Err(WhoisThereError::config("catalog entries cannot be empty"));
    }
    if !entry
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(WhoisThereError::config(format!(
            "invalid TLD '{}': only lowercase letters, digits, '-' and '.' are allowed",
            entry
        )));
    }
    if entry.starts_with(['.', '-']) || entry.ends_with(['.', '-']) || entry.contains("..") {
        return Err(WhoisThereError::config(format!(
            "invalid TLD '{}': malformed label",
            entry
        )));
    }
    Ok(())
}

fn clean_category(name: &str, entries: Vec<String>) -> Result<Vec<String>, WhoisThereError> {
    if entries.is_empty() {
        return Err(WhoisThereError::config(format!(
            "catalog category '{}' cannot be empty",
            name
        )));
    }
    entries
        .into_iter()
        .map(|entry| {
            let entry = entry.trim().trim_start_matches('.').to_lowercase();
            validate_catalog_entry(&entry)?;
            Ok(entry)
        })
        .collect()
}

//! Error handling for domain checking operations.
//!
//! One error type covers the three failure families of the library:
//! input validation (reported to the caller before any network activity),
//! probe failures (absorbed into an undetermined availability), and the
//! ambient configuration/file errors.

use std::fmt;

/// Main error type for whoisthere operations.
#[derive(Debug, Clone, PartialEq)]
pub enum WhoisThereError {
    /// The caller supplied an empty domain or label
    EmptyDomain,

    /// Input contains `@` and looks like an e-mail address
    EmailLikeInput { input: String },

    /// Input had a scheme but could not be parsed as a URL
    InvalidUrl { input: String },

    /// Input does not have the `label(.label)+` shape
    InvalidFormat { domain: String },

    /// A label is empty or longer than 63 characters
    InvalidLabelLength { domain: String, label: String },

    /// A label starts or ends with a hyphen
    InvalidLabelHyphen { domain: String, label: String },

    /// The final label is shorter than two characters
    InvalidTld { domain: String },

    /// A bare label was expected but the input already carries a TLD
    LabelMustNotIncludeTld { label: String },

    /// A fully-qualified domain was expected but no TLD was found
    DomainMustIncludeTld { domain: String },

    /// Network-related errors (connect, read, write)
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// No WHOIS server could be determined for the TLD
    NoWhoisServer { tld: String },

    /// Structured parser sentinel: the registry has no record for the domain
    DomainNotFound,

    /// WHOIS response could not be parsed into a record
    ParseError {
        message: String,
        content: Option<String>,
    },

    /// An expiration date string could not be understood
    DateError { input: String },

    /// Configuration errors (invalid settings, etc.)
    ConfigError { message: String },

    /// File I/O errors when reading configuration
    FileError { path: String, message: String },

    /// Timeout errors when operations take too long
    Timeout {
        operation: String,
        duration: std::time::Duration,
    },

    /// The WHOIS server still refused to answer after the retry
    RateLimited { server: String },
}

impl WhoisThereError {
    pub fn email_like<I: Into<String>>(input: I) -> Self {
        Self::EmailLikeInput {
            input: input.into(),
        }
    }

    pub fn invalid_url<I: Into<String>>(input: I) -> Self {
        Self::InvalidUrl {
            input: input.into(),
        }
    }

    pub fn invalid_format<D: Into<String>>(domain: D) -> Self {
        Self::InvalidFormat {
            domain: domain.into(),
        }
    }

    pub fn invalid_label_length<D: Into<String>, L: Into<String>>(domain: D, label: L) -> Self {
        Self::InvalidLabelLength {
            domain: domain.into(),
            label: label.into(),
        }
    }

    pub fn invalid_label_hyphen<D: Into<String>, L: Into<String>>(domain: D, label: L) -> Self {
        Self::InvalidLabelHyphen {
            domain: domain.into(),
            label: label.into(),
        }
    }

    pub fn invalid_tld<D: Into<String>>(domain: D) -> Self {
        Self::InvalidTld {
            domain: domain.into(),
        }
    }

    pub fn label_must_not_include_tld<L: Into<String>>(label: L) -> Self {
        Self::LabelMustNotIncludeTld {
            label: label.into(),
        }
    }

    pub fn domain_must_include_tld<D: Into<String>>(domain: D) -> Self {
        Self::DomainMustIncludeTld {
            domain: domain.into(),
        }
    }

    /// Create a new network error.
    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn no_whois_server<T: Into<String>>(tld: T) -> Self {
        Self::NoWhoisServer { tld: tld.into() }
    }

    /// Create a new parse error, keeping a prefix of the offending content.
    pub fn parse<M: Into<String>>(message: M, content: Option<&str>) -> Self {
        Self::ParseError {
            message: message.into(),
            content: content.map(|c| c.chars().take(200).collect()),
        }
    }

    pub fn date<I: Into<String>>(input: I) -> Self {
        Self::DateError {
            input: input.into(),
        }
    }

    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    pub fn rate_limited<S: Into<String>>(server: S) -> Self {
        Self::RateLimited {
            server: server.into(),
        }
    }

    /// True for errors caused by the caller's input.
    ///
    /// These are reported synchronously and never retried.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyDomain
                | Self::EmailLikeInput { .. }
                | Self::InvalidUrl { .. }
                | Self::InvalidFormat { .. }
                | Self::InvalidLabelLength { .. }
                | Self::InvalidLabelHyphen { .. }
                | Self::InvalidTld { .. }
                | Self::LabelMustNotIncludeTld { .. }
                | Self::DomainMustIncludeTld { .. }
        )
    }

    /// Check if this error indicates the domain is definitely available.
    pub fn indicates_available(&self) -> bool {
        matches!(self, Self::DomainNotFound)
    }
}

impl fmt::Display for WhoisThereError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDomain => write!(f, "domain cannot be empty"),
            Self::EmailLikeInput { .. } => write!(f, "invalid URL: looks like an email"),
            Self::InvalidUrl { input } => write!(f, "invalid URL: '{}'", input),
            Self::InvalidFormat { domain } => write!(f, "invalid domain format: '{}'", domain),
            Self::InvalidLabelLength { label, .. } => {
                write!(f, "invalid domain label length: '{}'", label)
            }
            Self::InvalidLabelHyphen { label, .. } => write!(
                f,
                "invalid domain: labels cannot start/end with hyphens ('{}')",
                label
            ),
            Self::InvalidTld { domain } => write!(f, "invalid TLD in '{}'", domain),
            Self::LabelMustNotIncludeTld { .. } => write!(
                f,
                "domain must not contain a TLD. This is used to find available TLDs for a domain"
            ),
            Self::DomainMustIncludeTld { .. } => write!(
                f,
                "domain must contain a TLD. Please try again with a TLD included or use 'find' to search available TLDs for a name"
            ),
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::NoWhoisServer { tld } => write!(f, "No WHOIS server known for '.{}'", tld),
            Self::DomainNotFound => write!(f, "Domain not found in WHOIS registry"),
            Self::ParseError { message, .. } => write!(f, "Parse error: {}", message),
            Self::DateError { input } => write!(f, "Unrecognized date format: '{}'", input),
            Self::ConfigError { message } => write!(f, "Configuration error: {}", message),
            Self::FileError { path, message } => write!(f, "File error at '{}': {}", path, message),
            Self::Timeout {
                operation,
                duration,
            } => write!(f, "Timeout after {:?} during: {}", duration, operation),
            Self::RateLimited { server } => write!(f, "Rate limited by {}", server),
        }
    }
}

impl std::error::Error for WhoisThereError {}

impl From<std::io::Error> for WhoisThereError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut => Self::network_with_source("I/O timed out", err.to_string()),
            _ => Self::network_with_source("I/O error", err.to_string()),
        }
    }
}

impl From<toml::de::Error> for WhoisThereError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(format!("Failed to parse TOML configuration: {}", err))
    }
}

impl From<serde_json::Error> for WhoisThereError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(format!("JSON serialization failed: {}", err), None)
    }
}

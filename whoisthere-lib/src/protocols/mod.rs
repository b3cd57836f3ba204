//! Protocol implementations for domain checking.
//!
//! This module contains the WHOIS wire client and the parser that turns its
//! free-form responses into structured records.

/// WHOIS protocol implementation
pub mod whois;

/// WHOIS response parsing
pub mod parser;

// Re-export commonly used functions and types
pub use parser::{ResponseParser, WhoisParser, WhoisRecord};
pub use whois::{builtin_whois_server, is_rate_limited, WhoisClient, WhoisSource};

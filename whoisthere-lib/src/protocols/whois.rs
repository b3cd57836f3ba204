//! WHOIS protocol implementation (RFC 3912).
//!
//! Queries go straight to port 43 of the responsible server. The server is
//! picked from configured overrides, a built-in table, or discovered through
//! an IANA referral and cached per client. Registrar referrals found in thick
//! registry responses can be followed and appended to the returned text.

use crate::error::WhoisThereError;
use crate::types::CheckConfig;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const WHOIS_PORT: u16 = 43;
const IANA_WHOIS_SERVER: &str = "whois.iana.org";
const RATE_LIMIT_BACKOFF: Duration = Duration::from_millis(1000);
/// Replies are cut off here; real records are a few KiB
const MAX_RESPONSE_BYTES: u64 = 1024 * 1024;

/// Source of raw WHOIS text for a domain.
///
/// The production implementation is [`WhoisClient`]; tests plug in fakes.
#[async_trait]
pub trait WhoisSource: Send + Sync {
    /// Fetch the raw WHOIS response for `domain`.
    async fn fetch(&self, domain: &str) -> Result<String, WhoisThereError>;
}

/// WHOIS client talking to servers directly over TCP.
#[derive(Clone)]
pub struct WhoisClient {
    /// Timeout for one server round trip (connect, query, read)
    timeout: Duration,
    /// Whether to query the registrar's own WHOIS server when referred
    follow_referral: bool,
    /// Suffix -> server overrides, longest suffix wins
    overrides: HashMap<String, String>,
    /// TLD -> discovered server, `None` when IANA knows of none
    server_cache: Arc<Mutex<HashMap<String, Option<String>>>>,
}

impl WhoisClient {
    /// Create a new WHOIS client with default settings.
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            follow_referral: true,
            overrides: HashMap::new(),
            server_cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Create a client from checking configuration.
    pub fn from_config(config: &CheckConfig) -> Self {
        Self::new()
            .with_timeout(config.whois_timeout)
            .with_follow_referral(config.follow_referral)
            .with_servers(config.whois_servers.clone())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_follow_referral(mut self, enabled: bool) -> Self {
        self.follow_referral = enabled;
        self
    }

    /// Set server overrides keyed by TLD or multi-label suffix.
    ///
    /// A value may carry an explicit port (`host:port`).
    pub fn with_servers(mut self, servers: HashMap<String, String>) -> Self {
        self.overrides = servers
            .into_iter()
            .map(|(suffix, server)| {
                (
                    suffix.trim().trim_start_matches('.').to_lowercase(),
                    server.trim().to_string(),
                )
            })
            .collect();
        self
    }

    /// Determine the WHOIS server responsible for `domain`.
    pub async fn resolve_server(&self, domain: &str) -> Result<String, WhoisThereError> {
        let domain = domain.to_lowercase();

        if let Some(server) = self.override_for(&domain) {
            return Ok(server);
        }

        let suffix = crate::catalog::extract_tld(&domain);
        if let Some(server) = builtin_whois_server(&suffix) {
            return Ok(server.to_string());
        }

        let tld = match domain.rsplit('.').next() {
            Some(tld) if !tld.is_empty() => tld.to_string(),
            _ => return Err(WhoisThereError::no_whois_server(domain)),
        };
        if let Some(server) = builtin_whois_server(&tld) {
            return Ok(server.to_string());
        }

        if let Some(cached) = self.cached_server(&tld) {
            return cached.ok_or_else(|| WhoisThereError::no_whois_server(&tld));
        }

        let discovered = match self.query_server(IANA_WHOIS_SERVER, &format!("{}\r\n", tld)).await {
            Ok(response) => parse_iana_refer_response(&response),
            Err(e) => {
                // Transient failures are not cached
                tracing::debug!(tld = %tld, error = %e, "IANA referral lookup failed");
                return Err(e);
            }
        };
        tracing::debug!(tld = %tld, server = ?discovered, "IANA referral");
        self.cache_server(&tld, discovered.clone());

        discovered.ok_or_else(|| WhoisThereError::no_whois_server(tld))
    }

    fn override_for(&self, domain: &str) -> Option<String> {
        self.overrides
            .iter()
            .filter(|(suffix, _)| {
                domain == suffix.as_str() || domain.ends_with(&format!(".{}", suffix))
            })
            .max_by_key(|(suffix, _)| suffix.len())
            .map(|(_, server)| server.clone())
    }

    fn cached_server(&self, tld: &str) -> Option<Option<String>> {
        match self.server_cache.lock() {
            Ok(cache) => cache.get(tld).cloned(),
            Err(_) => None,
        }
    }

    fn cache_server(&self, tld: &str, server: Option<String>) {
        if let Ok(mut cache) = self.server_cache.lock() {
            cache.insert(tld.to_string(), server);
        }
    }

    /// One round trip: connect, send `query`, read until the server closes.
    async fn query_server(&self, server: &str, query: &str) -> Result<String, WhoisThereError> {
        let start = Instant::now();
        let (host, port) = server_address(server);

        let result = tokio::time::timeout(self.timeout, async {
            let mut stream = TcpStream::connect((host, port)).await?;
            stream.write_all(query.as_bytes()).await?;

            let mut buf = Vec::new();
            (&mut stream)
                .take(MAX_RESPONSE_BYTES)
                .read_to_end(&mut buf)
                .await?;
            Ok::<_, std::io::Error>(buf)
        })
        .await;

        match result {
            Ok(Ok(buf)) => {
                tracing::debug!(
                    server = %server,
                    bytes = buf.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "WHOIS round trip"
                );
                Ok(String::from_utf8_lossy(&buf).into_owned())
            }
            Ok(Err(e)) => Err(WhoisThereError::network_with_source(
                format!("WHOIS query to {} failed", server),
                e.to_string(),
            )),
            Err(_) => Err(WhoisThereError::timeout(
                format!("WHOIS query to {}", server),
                self.timeout,
            )),
        }
    }

    /// Query `server` for `domain`, retrying once after a short pause when
    /// the server answers with a rate-limit notice.
    async fn query_domain(&self, server: &str, domain: &str) -> Result<String, WhoisThereError> {
        let query = format_query(server, domain);
        let response = self.query_server(server, &query).await?;
        if !is_rate_limited(&response) {
            return Ok(response);
        }

        tracing::debug!(server = %server, "rate limited, retrying once");
        tokio::time::sleep(RATE_LIMIT_BACKOFF).await;
        let response = self.query_server(server, &query).await?;
        if is_rate_limited(&response) {
            return Err(WhoisThereError::rate_limited(server));
        }

        Ok(response)
    }
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WhoisSource for WhoisClient {
    async fn fetch(&self, domain: &str) -> Result<String, WhoisThereError> {
        let server = self.resolve_server(domain).await?;
        let response = self.query_domain(&server, domain).await?;

        if !self.follow_referral {
            return Ok(response);
        }

        match extract_registrar_server(&response) {
            Some(referral) if !referral.eq_ignore_ascii_case(&server) => {
                match self.query_domain(&referral, domain).await {
                    Ok(registrar_response) => Ok(format!("{}\n{}", response, registrar_response)),
                    Err(e) => {
                        tracing::debug!(
                            domain = %domain,
                            referral = %referral,
                            error = %e,
                            "registrar referral failed, keeping registry response"
                        );
                        Ok(response)
                    }
                }
            }
            _ => Ok(response),
        }
    }
}

/// Built-in WHOIS servers for common TLDs and suffixes.
pub fn builtin_whois_server(suffix: &str) -> Option<&'static str> {
    let server = match suffix {
        "com" | "net" => "whois.verisign-grs.com",
        "org" => "whois.pir.org",
        "info" => "whois.afilias.net",
        "biz" => "whois.biz",
        "io" => "whois.nic.io",
        "ai" => "whois.nic.ai",
        "co" => "whois.nic.co",
        "me" => "whois.nic.me",
        "dev" | "app" | "page" => "whois.nic.google",
        "xyz" => "whois.nic.xyz",
        "online" => "whois.nic.online",
        "tech" => "whois.nic.tech",
        "store" => "whois.nic.store",
        "shop" => "whois.nic.shop",
        "blog" => "whois.nic.blog",
        "us" => "whois.nic.us",
        "uk" | "co.uk" => "whois.nic.uk",
        "de" => "whois.denic.de",
        "fr" => "whois.nic.fr",
        "jp" => "whois.jprs.jp",
        "br" | "com.br" => "whois.registro.br",
        "cn" => "whois.cnnic.cn",
        "ru" => "whois.tcinet.ru",
        "za" => "whois.registry.net.za",
        _ => return None,
    };
    Some(server)
}

/// Build the query line a given server expects.
fn format_query(server: &str, domain: &str) -> String {
    match server {
        "whois.denic.de" => format!("-T dn,ace {}\r\n", domain),
        "whois.jprs.jp" => format!("{}/e\r\n", domain),
        _ => format!("{}\r\n", domain),
    }
}

/// Split `host:port`, defaulting to port 43.
fn server_address(server: &str) -> (&str, u16) {
    if let Some((host, port)) = server.rsplit_once(':') {
        if let Ok(port) = port.parse::<u16>() {
            return (host, port);
        }
    }
    (server, WHOIS_PORT)
}

/// Parse an IANA WHOIS response for the authoritative WHOIS server.
///
/// The IANA WHOIS response may use either `refer:` or `whois:` to indicate
/// the authoritative WHOIS server for a TLD. We check both fields, preferring
/// `refer:` when present.
///
/// ```text
/// whois:        whois.verisign-grs.com
/// refer:        whois.verisign-grs.com
/// ```
pub(crate) fn parse_iana_refer_response(response: &str) -> Option<String> {
    let mut whois_server = None;

    for line in response.lines() {
        let line_trimmed = line.trim();
        if let Some(server) = line_trimmed.strip_prefix("refer:") {
            let server = server.trim();
            if !server.is_empty() {
                return Some(server.to_string());
            }
        } else if let Some(server) = line_trimmed.strip_prefix("whois:") {
            let server = server.trim();
            if !server.is_empty() {
                whois_server = Some(server.to_string());
            }
        }
    }

    whois_server
}

/// Find the `Registrar WHOIS Server:` line of a thick registry response.
pub(crate) fn extract_registrar_server(response: &str) -> Option<String> {
    response.lines().find_map(|line| {
        let (key, value) = line.trim().split_once(':')?;
        if !key.trim().eq_ignore_ascii_case("registrar whois server") {
            return None;
        }
        let value = value.trim();
        let value = value
            .strip_prefix("whois://")
            .or_else(|| value.strip_prefix("https://"))
            .or_else(|| value.strip_prefix("http://"))
            .unwrap_or(value);
        let host = value.split('/').next().unwrap_or("").trim();
        if host.is_empty() {
            None
        } else {
            Some(host.to_lowercase())
        }
    })
}

/// Check if the WHOIS output indicates rate limiting.
pub fn is_rate_limited(output: &str) -> bool {
    let output_lower = output.to_lowercase();
    let rate_limit_patterns = [
        "rate limit exceeded",
        "too many requests",
        "try again later",
        "quota exceeded",
        "limit exceeded",
        "throttled",
        "rate-limited",
    ];

    rate_limit_patterns
        .iter()
        .any(|pattern| output_lower.contains(pattern))
}

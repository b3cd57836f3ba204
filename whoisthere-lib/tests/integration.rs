// whoisthere-lib/tests/integration.rs

//! Integration tests for whoisthere-lib exports and core functionality

use std::collections::HashMap;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use whoisthere_lib::{
    extract_tld, has_tld, normalize_domain, Availability, CheckConfig, DomainChecker,
    FindTldsRequest, TldCatalog, TldCategory, WhoisClient, WhoisSource, WhoisThereError,
    POPULAR_TLDS,
};

/// Minimal WHOIS server: domains listed in `free` get a "No match" reply,
/// everything else gets a registered record.
async fn fake_whois_server(free: &'static [&'static str]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 512];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let query = String::from_utf8_lossy(&buf[..n]).trim().to_lowercase();
                let reply = if free.contains(&query.as_str()) {
                    format!("No match for \"{}\".\r\n", query.to_uppercase())
                } else {
                    format!(
                        "Domain Name: {}\r\nRegistrar: Example Registrar\r\nRegistry Expiry Date: 2099-01-01T00:00:00Z\r\n",
                        query.to_uppercase()
                    )
                };
                let _ = socket.write_all(reply.as_bytes()).await;
            });
        }
    });
    addr.to_string()
}

fn local_config(server: &str, suffixes: &[&str]) -> CheckConfig {
    let servers: HashMap<String, String> = suffixes
        .iter()
        .map(|s| (s.to_string(), server.to_string()))
        .collect();
    CheckConfig::default()
        .with_concurrency(4)
        .with_probe_timeout(Duration::from_secs(5))
        .with_whois_timeout(Duration::from_secs(2))
        .with_follow_referral(false)
        .with_whois_servers(servers)
}

#[test]
fn test_library_exports_work() {
    let domain = normalize_domain("HTTPS://Example.com/path").unwrap();
    assert_eq!(domain.as_str(), "example.com");

    assert!(has_tld("example.co.uk"));
    assert!(!has_tld("example"));
    assert_eq!(extract_tld("example.co.uk"), "co.uk");

    let catalog = TldCatalog::default();
    assert_eq!(catalog.popular().len(), POPULAR_TLDS.len());
    assert_eq!(catalog.category_of("de"), Some(TldCategory::Country));
    assert_eq!(catalog.category_of("co"), Some(TldCategory::Popular));
}

#[test]
fn test_default_candidate_order() {
    let checker = DomainChecker::new();
    let candidates = checker
        .candidates_for(&FindTldsRequest::new("acme"))
        .unwrap();

    let names: Vec<&str> = candidates.iter().map(|d| d.as_str()).collect();
    assert_eq!(&names[..3], &["acme.com", "acme.net", "acme.org"]);
    // "co" appears in both categories but is only probed once
    assert_eq!(names.iter().filter(|n| **n == "acme.co").count(), 1);
    assert!(names.contains(&"acme.co.uk"));
    assert!(!names.contains(&"acme.xyz"));
}

#[test]
fn test_extended_candidates_on_request() {
    let checker = DomainChecker::new();
    let candidates = checker
        .candidates_for(&FindTldsRequest::new("acme").include_extended(true))
        .unwrap();
    assert!(candidates.iter().any(|d| d.as_str() == "acme.xyz"));
}

#[tokio::test]
async fn test_check_domain_against_local_server() {
    let server = fake_whois_server(&["free-name.com"]).await;
    let checker = DomainChecker::with_config(local_config(&server, &["com"]));

    let free = checker.check_domain("Free-Name.com").await.unwrap();
    assert!(free.available);
    assert_eq!(free.domain, "free-name.com");

    let taken = checker.check_domain("taken-name.com").await.unwrap();
    assert!(!taken.available);
    assert!(taken.note.is_none());
}

#[tokio::test]
async fn test_find_available_tlds_against_local_server() {
    let server = fake_whois_server(&["acme.io", "acme.dev"]).await;
    let config = local_config(&server, POPULAR_TLDS);
    let checker = DomainChecker::with_config(config);

    let result = checker
        .find_available_tlds(&FindTldsRequest::new("acme").only_popular(true))
        .await
        .unwrap();

    assert_eq!(result.available_domains, vec!["acme.dev", "acme.io"]);
    assert_eq!(result.popular_domains, result.available_domains);
    assert!(result.undetermined_domains.is_empty());
}

#[tokio::test]
async fn test_unreachable_server_is_not_available() {
    // Bind then drop to get a port nothing listens on
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().to_string()
    };
    let checker = DomainChecker::with_config(local_config(&addr, &["com"]));

    let result = checker.check_domain("anything.com").await.unwrap();
    assert!(!result.available);
    assert!(result.note.is_some());

    let probe = checker.probe_domain("anything.com").await.unwrap();
    assert!(matches!(probe.availability, Availability::Unknown { .. }));
}

#[tokio::test]
async fn test_whois_client_uses_override() {
    let server = fake_whois_server(&[]).await;
    let mut servers = HashMap::new();
    servers.insert("com".to_string(), server.clone());
    let client = WhoisClient::new().with_servers(servers);

    assert_eq!(client.resolve_server("example.com").await.unwrap(), server);
    let raw = client.fetch("example.com").await.unwrap();
    assert!(raw.contains("Domain Name: EXAMPLE.COM"));
}

#[tokio::test]
async fn test_input_errors_are_returned() {
    let checker = DomainChecker::new();
    assert_eq!(
        checker.check_domain("").await,
        Err(WhoisThereError::EmptyDomain)
    );
    assert!(checker
        .check_domain("not a domain.com")
        .await
        .unwrap_err()
        .is_input_error());
    assert!(matches!(
        checker
            .find_available_tlds(&FindTldsRequest::new("google.com"))
            .await,
        Err(WhoisThereError::LabelMustNotIncludeTld { .. })
    ));
}

// Live network tests, run with `cargo test -- --ignored`

#[tokio::test]
#[ignore]
async fn test_live_registered_domain() {
    let checker = DomainChecker::new();
    let result = checker.check_domain("google.com").await.unwrap();
    assert!(!result.available);
}

#[tokio::test]
#[ignore]
async fn test_live_random_domain_available() {
    let label: String = std::iter::repeat("qzxv").take(13).collect::<String>() + "abc";
    assert_eq!(label.len(), 55);

    let checker = DomainChecker::new();
    let result = checker
        .check_domain(&format!("{}.com", label))
        .await
        .unwrap();
    assert!(result.available);
}

#[tokio::test]
#[ignore]
async fn test_live_popular_scan_for_taken_name() {
    let checker = DomainChecker::new();
    let result = checker
        .find_available_tlds(&FindTldsRequest::new("google").only_popular(true))
        .await
        .unwrap();
    assert!(result.available_domains.is_empty());
}

//! Human-readable display logic for the whoisthere CLI.
//!
//! Colored result lines, the search header and summary, and a spinner
//! shown while probes run. Uses only the `console` crate. Everything
//! decorative goes to stderr so stdout carries only results.

use console::{pad_str, style, Alignment, Term};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use whoisthere_lib::{extract_tld, DomainAvailability, TldCatalog, TldSearchResult};

// ── Spinner ──────────────────────────────────────────────────────────────────

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// An async braille-dot spinner that writes to stderr so stdout stays clean.
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    /// Start a spinner, or return `None` when stderr is not a terminal.
    pub fn start(message: String) -> Option<Self> {
        if !Term::stderr().is_term() {
            return None;
        }

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = tokio::spawn(async move {
            let term = Term::stderr();
            let mut idx = 0usize;
            while running_clone.load(Ordering::Relaxed) {
                let frame = SPINNER_FRAMES[idx % SPINNER_FRAMES.len()];
                let _ = term.clear_line();
                let _ = term.write_str(&format!("{} {}", style(frame).cyan(), message));
                idx += 1;
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            let _ = term.clear_line();
        });

        Some(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Stop the spinner and clear the line.
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a styled header at the start of a TLD search.
pub fn print_header(label: &str, candidate_count: usize, concurrency: usize) {
    eprintln!(
        "{} {} {}",
        style("whoisthere").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!(
            "· Searching {} TLD{} for '{}'",
            candidate_count,
            if candidate_count == 1 { "" } else { "s" },
            label
        ))
        .dim(),
    );
    eprintln!("{}", style(format!("Concurrency: {}", concurrency)).dim());
    eprintln!();
}

// ── Results ──────────────────────────────────────────────────────────────────

/// Format and print the result of a single-domain check.
pub fn print_check_result(result: &DomainAvailability, debug: bool) {
    let padded_domain = pad_str(&result.domain, 30, Alignment::Left, Some(".."));

    match (result.available, &result.note) {
        (true, _) => println!(
            "  {}  {}",
            style(&padded_domain).white(),
            style("AVAILABLE").green().bold()
        ),
        (false, None) => println!(
            "  {}  {}",
            style(&padded_domain).white(),
            style("TAKEN").red()
        ),
        (false, Some(note)) => {
            let detail = if debug {
                format!("  {}", style(format!("({})", note)).dim())
            } else {
                String::new()
            };
            println!(
                "  {}  {}{}",
                style(&padded_domain).white(),
                style("UNKNOWN").yellow(),
                detail
            );
        }
    }
}

/// Print the outcome of a TLD search with the catalog category of each hit.
pub fn print_search_results(result: &TldSearchResult, catalog: &TldCatalog) {
    if result.available_domains.is_empty() {
        println!("  {}", style("No available domains found").yellow());
    } else {
        for domain in &result.available_domains {
            let marker = if result.popular_domains.contains(domain) {
                style("★").yellow().to_string()
            } else {
                " ".to_string()
            };
            let category = catalog
                .category_of(&extract_tld(domain))
                .map(|c| c.to_string())
                .unwrap_or_default();
            println!(
                "  {} {}  {}  {}",
                marker,
                style(pad_str(domain, 30, Alignment::Left, Some(".."))).white(),
                style("AVAILABLE").green().bold(),
                style(category).dim()
            );
        }
    }

    if !result.undetermined_domains.is_empty() {
        println!();
        println!(
            "  {} {}",
            style("Could not be determined:").yellow(),
            format_domain_list(&result.undetermined_domains, 5)
        );
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the final summary bar with colored counts.
pub fn print_summary(result: &TldSearchResult, total: usize, duration: Duration) {
    let available = result.available_domains.len();
    let unknown = result.undetermined_domains.len();
    let taken = total.saturating_sub(available + unknown);

    eprintln!();
    eprintln!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );
    eprintln!(
        "  {} domain{} in {:.1}s  {}  {}  {}  {}  {}  {}",
        style(total).bold(),
        if total == 1 { "" } else { "s" },
        duration.as_secs_f64(),
        style("|").dim(),
        style(format!("{} available", available)).green(),
        style("|").dim(),
        style(format!("{} taken", taken)).red(),
        style("|").dim(),
        style(format!("{} unknown", unknown)).yellow(),
    );
}

// ── Catalog listing ──────────────────────────────────────────────────────────

/// Print every catalog category with its TLDs.
pub fn print_catalog(catalog: &TldCatalog) {
    let categories = [
        ("popular", catalog.popular()),
        ("country", catalog.country()),
        ("extended", catalog.extended()),
    ];

    println!();
    println!("{}", style("TLD Catalog:").yellow().bold());
    println!();
    for (name, tlds) in categories {
        println!(
            "  {} {}  {}",
            style(format!("{:<10}", name)).green().bold(),
            style(format!("({})", tlds.len())).cyan(),
            tlds.join(", "),
        );
    }
    println!();
    println!(
        "{}",
        style(format!("{} entries in total", catalog.all_tlds().len())).dim()
    );
    println!("Use: whoisthere find <name> [--only-popular | --only-country] [--extended]");
}

/// Join at most `max_show` domains, summarizing the rest.
pub fn format_domain_list(domains: &[String], max_show: usize) -> String {
    if domains.len() <= max_show {
        domains.join(", ")
    } else {
        format!(
            "{} (+{} more)",
            domains[..max_show].join(", "),
            domains.len() - max_show
        )
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

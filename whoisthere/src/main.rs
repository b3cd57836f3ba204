//! whoisthere CLI Application
//!
//! A command-line interface for checking domain availability over WHOIS and
//! for finding which TLDs are still free for a name. This binary is a thin
//! shell over the whoisthere-lib library.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand};
use std::process;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use whoisthere_lib::{
    load_env_config, parse_duration, CheckConfig, ConfigManager, DomainChecker, EnvConfig,
    FileConfig, FindTldsRequest, TldCatalog,
};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for whoisthere
#[derive(Parser, Debug)]
#[command(name = "whoisthere")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Check domain availability over WHOIS and find free TLDs for a name")]
#[command(
    long_about = "Check domain availability over WHOIS.\n\nChecks a single domain, or searches popular, country and extended TLDs for a bare name with bounded concurrency."
)]
#[command(styles = STYLES)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Output results in JSON format
    #[arg(short = 'j', long = "json", global = true, help_heading = "Output Format")]
    pub json: bool,

    /// Max concurrent WHOIS probes (default: 20, max: 100)
    #[arg(
        short = 'c',
        long = "concurrency",
        value_name = "N",
        global = true,
        help_heading = "Performance"
    )]
    pub concurrency: Option<usize>,

    /// Upper bound for one probe, e.g. "10s" or "1m"
    #[arg(
        long = "timeout",
        value_name = "DURATION",
        global = true,
        help_heading = "Performance"
    )]
    pub timeout: Option<String>,

    /// Timeout for a single WHOIS server round trip
    #[arg(
        long = "whois-timeout",
        value_name = "DURATION",
        global = true,
        help_heading = "Protocol"
    )]
    pub whois_timeout: Option<String>,

    /// Do not follow registrar WHOIS referrals
    #[arg(long = "no-referral", global = true, help_heading = "Protocol")]
    pub no_referral: bool,

    /// Use specific config file instead of automatic discovery
    #[arg(
        long = "config",
        value_name = "FILE",
        global = true,
        help_heading = "Configuration"
    )]
    pub config: Option<String>,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", global = true, help_heading = "Configuration")]
    pub verbose: bool,

    /// Show debug logging and the reason behind undetermined results
    #[arg(short = 'd', long = "debug", global = true, help_heading = "Configuration")]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check whether a single domain is available
    Check {
        /// Fully-qualified domain (URLs and host:port are accepted)
        #[arg(value_name = "DOMAIN")]
        domain: String,
    },

    /// Find available TLDs for a bare name
    Find {
        /// Name without a TLD, e.g. "acme"
        #[arg(value_name = "LABEL")]
        label: String,

        /// Only search popular TLDs
        #[arg(long = "only-popular")]
        only_popular: bool,

        /// Only search country-code TLDs (wins over --only-popular)
        #[arg(long = "only-country")]
        only_country: bool,

        /// Also search the extended TLD set
        #[arg(long = "extended")]
        extended: bool,
    },

    /// List the TLD catalog and exit
    Tlds,
}

/// Effective settings after merging files, environment and flags.
#[derive(Debug)]
struct Settings {
    check: CheckConfig,
    catalog: TldCatalog,
    json: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.debug);

    // Validate arguments
    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over the flags.
fn init_logging(verbose: bool, debug: bool) {
    let default_level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > 100 {
            return Err("Concurrency must be between 1 and 100".to_string());
        }
    }

    for (flag, value) in [
        ("--timeout", &args.timeout),
        ("--whois-timeout", &args.whois_timeout),
    ] {
        if let Some(value) = value {
            if parse_duration(value).is_none() {
                return Err(format!(
                    "Invalid {} '{}'. Use format like '5s', '30s', '2m'",
                    flag, value
                ));
            }
        }
    }

    Ok(())
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let settings = build_settings(&args)?;
    tracing::debug!(?settings, "effective settings");

    match &args.command {
        Command::Tlds => {
            if settings.json {
                let json = serde_json::json!({
                    "popular": settings.catalog.popular(),
                    "country": settings.catalog.country(),
                    "extended": settings.catalog.extended(),
                    "all": settings.catalog.all_tlds(),
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            } else {
                ui::print_catalog(&settings.catalog);
            }
            Ok(())
        }
        Command::Check { domain } => {
            let checker = DomainChecker::with_catalog(settings.check, settings.catalog);
            let spinner = if settings.json {
                None
            } else {
                ui::Spinner::start(format!("Checking {}...", domain.trim()))
            };
            let result = checker.check_domain(domain).await;
            if let Some(spinner) = spinner {
                spinner.stop().await;
            }
            let result = result?;

            if settings.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                ui::print_check_result(&result, args.debug);
            }
            Ok(())
        }
        Command::Find {
            label,
            only_popular,
            only_country,
            extended,
        } => {
            let request = FindTldsRequest::new(label.as_str())
                .only_popular(*only_popular)
                .only_country(*only_country)
                .include_extended(*extended);
            let checker = DomainChecker::with_catalog(settings.check, settings.catalog);

            // Validates the label before any network activity
            let total = checker.candidates_for(&request)?.len();

            let start = Instant::now();
            let spinner = if settings.json {
                None
            } else {
                ui::print_header(label.trim(), total, checker.config().concurrency);
                ui::Spinner::start(format!("Probing {} domains...", total))
            };
            let result = checker.find_available_tlds(&request).await;
            if let Some(spinner) = spinner {
                spinner.stop().await;
            }
            let result = result?;

            if settings.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                ui::print_search_results(&result, checker.catalog());
                ui::print_summary(&result, total, start.elapsed());
            }
            Ok(())
        }
    }
}

/// Build effective settings with proper precedence.
///
/// Precedence (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables (WT_*)
/// 3. Explicit config file (--config, then WT_CONFIG)
/// 4. Discovered config files (local > global > XDG)
/// 5. Built-in defaults
fn build_settings(args: &Args) -> Result<Settings, Box<dyn std::error::Error>> {
    let env_config = load_env_config();
    let file_config = load_file_config(args, &env_config)?;

    let mut check = file_config.apply_to(CheckConfig::default())?;
    check = env_config.apply_to(check);
    check = apply_cli_args(check, args);

    let json = args.json || env_config.json.or(file_config.json()).unwrap_or(false);

    Ok(Settings {
        check,
        catalog: file_config.build_catalog()?,
        json,
    })
}

fn load_file_config(
    args: &Args,
    env_config: &EnvConfig,
) -> Result<FileConfig, Box<dyn std::error::Error>> {
    let config_manager = ConfigManager::new();

    let explicit = args
        .config
        .as_deref()
        .map(|path| (path, "CLI --config"))
        .or_else(|| env_config.config.as_deref().map(|path| (path, "WT_CONFIG")));

    match explicit {
        Some((path, origin)) => {
            tracing::info!(path = %path, origin, "using explicit config file");
            config_manager
                .load_file(path)
                .map_err(|e| format!("Failed to load config file '{}': {}", path, e).into())
        }
        None => Ok(config_manager.discover_and_load()?),
    }
}

/// Apply CLI arguments to config (highest precedence).
fn apply_cli_args(mut config: CheckConfig, args: &Args) -> CheckConfig {
    if let Some(concurrency) = args.concurrency {
        config = config.with_concurrency(concurrency);
    }
    if let Some(timeout) = args.timeout.as_deref().and_then(parse_duration) {
        config = config.with_probe_timeout(timeout);
    }
    if let Some(timeout) = args.whois_timeout.as_deref().and_then(parse_duration) {
        config = config.with_whois_timeout(timeout);
    }
    // Only override when the flag is passed, so config/env values survive
    if args.no_referral {
        config = config.with_follow_referral(false);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_find_flags() {
        let args = parse(&["whoisthere", "find", "acme", "--only-popular", "--extended"]);
        match args.command {
            Command::Find {
                label,
                only_popular,
                only_country,
                extended,
            } => {
                assert_eq!(label, "acme");
                assert!(only_popular);
                assert!(!only_country);
                assert!(extended);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = parse(&["whoisthere", "check", "example.com", "--json", "-c", "5"]);
        assert!(args.json);
        assert_eq!(args.concurrency, Some(5));
    }

    #[test]
    fn test_validate_concurrency() {
        let args = parse(&["whoisthere", "-c", "0", "tlds"]);
        assert!(validate_args(&args).is_err());
        let args = parse(&["whoisthere", "-c", "100", "tlds"]);
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_validate_timeouts() {
        let args = parse(&["whoisthere", "--timeout", "soon", "tlds"]);
        assert!(validate_args(&args).is_err());
        let args = parse(&["whoisthere", "--whois-timeout", "3s", "tlds"]);
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_cli_args_override_config() {
        let base = CheckConfig::default()
            .with_concurrency(50)
            .with_follow_referral(true);
        let args = parse(&[
            "whoisthere",
            "--timeout",
            "1m",
            "--no-referral",
            "check",
            "example.com",
        ]);

        let config = apply_cli_args(base, &args);
        assert_eq!(config.concurrency, 50); // not passed, kept
        assert_eq!(config.probe_timeout, Duration::from_secs(60));
        assert!(!config.follow_referral);
    }

    #[test]
    fn test_unset_flags_keep_config() {
        let base = CheckConfig::default().with_follow_referral(false);
        let args = parse(&["whoisthere", "tlds"]);
        let config = apply_cli_args(base, &args);
        assert!(!config.follow_referral);
        assert_eq!(config.whois_timeout, Duration::from_secs(5));
    }
}

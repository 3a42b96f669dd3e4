#![forbid(unsafe_code)]

//! Command-line argument parsing for the console.
//!
//! Parses args by hand. Defaults are overridden by `EVALBOARD_*` environment
//! variables, which are in turn overridden by explicit flags.

use std::env;
use std::path::PathBuf;
use std::process;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default REST endpoint.
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

const HELP_TEXT: &str = "\
evalboard: terminal console for agent evaluations

USAGE:
    evalboard [OPTIONS]

OPTIONS:
    --api-url=URL         REST endpoint (default: http://localhost:8080/api)
    --state-file=PATH     Where preferences and session are kept
                          (default: $XDG_STATE_HOME/evalboard/state.json)
    --log-dir=PATH        Directory for the daily log file (default: state dir)
    --log-json            Write log lines as JSON
    --ephemeral           Keep state in memory only
    --reset-onboarding    Clear completion markers so first-run flows show again
    --exit-after-ms=N     Quit automatically after N milliseconds
    --help, -h            Show this help message
    --version, -V         Show version

KEYBINDINGS:
    k               Open the command palette
    n               Go to evaluations
    r               Reload the current page
    ?               Keyboard shortcuts
    q / Ctrl+C      Quit

ENVIRONMENT VARIABLES:
    EVALBOARD_API_URL          Override --api-url
    EVALBOARD_STATE_FILE       Override --state-file
    EVALBOARD_LOG_DIR          Override --log-dir
    EVALBOARD_LOG_JSON         Set to 1 for --log-json
    EVALBOARD_EXIT_AFTER_MS    Auto-quit after N milliseconds (for testing)
    RUST_LOG                   Log filter (default: info)";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    /// Base URL of the REST service.
    pub api_url: String,
    /// Persisted state location. `None` uses the platform default.
    pub state_file: Option<PathBuf>,
    /// Log directory. `None` puts logs next to the state file.
    pub log_dir: Option<PathBuf>,
    pub log_json: bool,
    /// Memory-only storage; nothing is read or written on disk.
    pub ephemeral: bool,
    pub reset_onboarding: bool,
    /// Auto-exit after this many milliseconds (0 = disabled).
    pub exit_after_ms: u64,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            state_file: None,
            log_dir: None,
            log_json: false,
            ephemeral: false,
            reset_onboarding: false,
            exit_after_ms: 0,
        }
    }
}

/// What a parse asked for besides running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Run(Opts),
    Help,
    Version,
    Invalid(String),
}

impl Opts {
    /// Parse the process environment and arguments, exiting on `--help`,
    /// `--version` or a malformed flag.
    pub fn parse() -> Self {
        let env_lookup = |key: &str| env::var(key).ok();
        let args: Vec<String> = env::args().skip(1).collect();
        match Self::parse_from(env_lookup, &args) {
            ParseOutcome::Run(opts) => opts,
            ParseOutcome::Help => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            ParseOutcome::Version => {
                println!("evalboard {VERSION}");
                process::exit(0);
            }
            ParseOutcome::Invalid(message) => {
                eprintln!("{message}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    /// Pure form of [`parse`](Self::parse).
    pub fn parse_from(env_lookup: impl Fn(&str) -> Option<String>, args: &[String]) -> ParseOutcome {
        let mut opts = Self::default();

        // Environment first
        if let Some(val) = env_lookup("EVALBOARD_API_URL") {
            opts.api_url = val;
        }
        if let Some(val) = env_lookup("EVALBOARD_STATE_FILE") {
            opts.state_file = Some(PathBuf::from(val));
        }
        if let Some(val) = env_lookup("EVALBOARD_LOG_DIR") {
            opts.log_dir = Some(PathBuf::from(val));
        }
        if let Some(val) = env_lookup("EVALBOARD_LOG_JSON") {
            opts.log_json = matches!(val.as_str(), "1" | "true" | "yes");
        }
        if let Some(val) = env_lookup("EVALBOARD_EXIT_AFTER_MS")
            && let Ok(n) = val.parse()
        {
            opts.exit_after_ms = n;
        }

        // Flags override env vars
        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => return ParseOutcome::Help,
                "--version" | "-V" => return ParseOutcome::Version,
                "--log-json" => opts.log_json = true,
                "--ephemeral" => opts.ephemeral = true,
                "--reset-onboarding" => opts.reset_onboarding = true,
                other => {
                    if let Some(val) = other.strip_prefix("--api-url=") {
                        opts.api_url = val.to_string();
                    } else if let Some(val) = other.strip_prefix("--state-file=") {
                        opts.state_file = Some(PathBuf::from(val));
                    } else if let Some(val) = other.strip_prefix("--log-dir=") {
                        opts.log_dir = Some(PathBuf::from(val));
                    } else if let Some(val) = other.strip_prefix("--exit-after-ms=") {
                        match val.parse() {
                            Ok(n) => opts.exit_after_ms = n,
                            Err(_) => {
                                return ParseOutcome::Invalid(format!(
                                    "Invalid --exit-after-ms value: {val}"
                                ));
                            }
                        }
                    } else {
                        return ParseOutcome::Invalid(format!("Unknown argument: {other}"));
                    }
                }
            }
        }

        if opts.api_url.trim().is_empty() {
            return ParseOutcome::Invalid("--api-url must not be empty".into());
        }
        ParseOutcome::Run(opts)
    }
}

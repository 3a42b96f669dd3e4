#![forbid(unsafe_code)]

//! evalboard binary entry point.

use std::sync::Arc;
use std::time::Duration;

use evalboard::app::AppModel;
use evalboard::{cli, logging};
use evalboard_client::{DEFAULT_TIMEOUT, HttpClient};
use evalboard_runtime::{FileStorage, KeyValueStore, ProfileStore, Program, ProgramConfig};
use tracing::{info, warn};

fn main() {
    let opts = cli::Opts::parse();

    let state_file = opts
        .state_file
        .clone()
        .unwrap_or_else(|| FileStorage::default_location().path().to_path_buf());
    let store = if opts.ephemeral {
        KeyValueStore::in_memory()
    } else {
        KeyValueStore::with_file(&state_file)
    }
    .shared();

    let log_dir = opts
        .log_dir
        .clone()
        .unwrap_or_else(|| logging::default_dir(&state_file));
    let _log_guard = match logging::init(&log_dir, opts.log_json) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Logging disabled: {e}");
            None
        }
    };
    info!(
        api_url = %opts.api_url,
        state_file = %state_file.display(),
        ephemeral = opts.ephemeral,
        "starting"
    );

    if let Err(e) = store.load() {
        warn!(error = %e, "could not read stored state; starting fresh");
    }
    if opts.reset_onboarding {
        ProfileStore::new(Arc::clone(&store)).reset_completion();
        info!("onboarding flags cleared");
    }

    let api = match HttpClient::new(opts.api_url.clone(), DEFAULT_TIMEOUT) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            eprintln!("Failed to create API client: {e}");
            std::process::exit(1);
        }
    };

    let model = AppModel::new(api, store);
    let config = ProgramConfig {
        exit_after: (opts.exit_after_ms > 0).then(|| Duration::from_millis(opts.exit_after_ms)),
        ..ProgramConfig::default()
    };
    match Program::new(model, config) {
        Ok(mut program) => {
            if let Err(e) = program.run() {
                eprintln!("Runtime error: {e}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Failed to initialize: {e}");
            std::process::exit(1);
        }
    }
}

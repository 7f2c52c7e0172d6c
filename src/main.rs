// Entrypoint for `yi`.
// - Parse flags, read the application keys and make sure an access token
//   exists (running the browser handshake if needed).
// - Then import every path argument. Setup failures end the run with
//   status 1; per-path failures are reported and the run continues.

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ynote_importer::{
    api::ApiClient,
    auth::{ensure_credentials, open_in_browser, stdin_verifier},
    cli::Cli,
    config::AppConfig,
    credentials::CredentialStore,
    import::import_paths,
};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let opts = cli.import_options();

    let config = AppConfig::load(&cli.config);
    if !config.has_consumer_key() {
        warn!(path = %cli.config.display(), "no application key configured; the service will reject requests");
    }
    let mut client = ApiClient::new(&config).context("Failed to build HTTP client")?;

    let store = match &cli.credentials {
        Some(path) => CredentialStore::new(path),
        None => CredentialStore::default_location(),
    };
    let mut verifier = stdin_verifier();
    let credentials = ensure_credentials(&client, &store, verifier.as_mut(), open_in_browser)?;
    client.set_credentials(credentials);

    let user = client.user_info().context("Getting user info failed")?;
    println!("Hi, {}", user.user);

    let summary = import_paths(&client, &opts, &cli.paths);
    if summary.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse_with_single_dash(std::env::args_os());
    info!(paths = cli.paths.len(), "yi starting");

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!(error = %format!("{:#}", e), "setup failed");
            println!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

// OAuth handshake.
//
// When no stored access token is usable the user has to authorize the
// application in a browser:
//
// 1. request temporary credentials from the service,
// 2. open (and print) the authorization URL,
// 3. read the verifier the service displays back from the console,
// 4. exchange temporary credentials + verifier for access credentials,
// 5. persist them with the `CredentialStore`.
//
// Steps 1, 3 and 4 are fatal on failure. Opening the browser and saving
// the token are best-effort.

use anyhow::{bail, Context, Result};
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, IsTerminal};
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::credentials::{CredentialStore, Credentials, TemporaryCredential, CREDENTIALS_FILE};
use crate::error::ApiError;

const VERIFIER_PROMPT: &str = "Please input the verifier";

/// The token endpoints of the remote service.
pub trait OAuthService {
    fn request_temporary_credentials(&self) -> Result<TemporaryCredential, ApiError>;
    fn authorization_url(&self, temporary: &TemporaryCredential) -> String;
    fn request_token(
        &self,
        temporary: &TemporaryCredential,
        verifier: &str,
    ) -> Result<Credentials, ApiError>;
}

/// Where the user-supplied verifier comes from.
pub trait VerifierSource {
    fn read_verifier(&mut self) -> io::Result<String>;
}

/// Interactive prompt on the terminal.
pub struct TerminalPrompt;

impl VerifierSource for TerminalPrompt {
    fn read_verifier(&mut self) -> io::Result<String> {
        Input::<String>::new()
            .with_prompt(VERIFIER_PROMPT)
            .interact_text()
    }
}

/// Reads one line from any buffered reader, e.g. piped stdin.
pub struct LineReader<R>(pub R);

impl<R: BufRead> VerifierSource for LineReader<R> {
    fn read_verifier(&mut self) -> io::Result<String> {
        print!("{}: ", VERIFIER_PROMPT);
        io::Write::flush(&mut io::stdout())?;
        let mut line = String::new();
        if self.0.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stdin closed before a verifier was entered",
            ));
        }
        Ok(line)
    }
}

/// Prompt on a terminal, plain line read otherwise.
pub fn stdin_verifier() -> Box<dyn VerifierSource> {
    if io::stdin().is_terminal() {
        Box::new(TerminalPrompt)
    } else {
        Box::new(LineReader(io::stdin().lock()))
    }
}

/// Launch the platform's URL opener without waiting for it.
pub fn open_in_browser(url: &str) -> io::Result<()> {
    let mut cmd = if cfg!(target_os = "macos") {
        let mut c = Command::new("open");
        c.arg(url);
        c
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/c", "start", "", url]);
        c
    } else {
        let mut c = Command::new("xdg-open");
        c.arg(url);
        c
    };
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Run the full handshake and persist the resulting credentials.
pub fn authorize<S, O>(
    service: &S,
    store: &CredentialStore,
    verifier: &mut dyn VerifierSource,
    open_url: O,
) -> Result<Credentials>
where
    S: OAuthService + ?Sized,
    O: Fn(&str) -> io::Result<()>,
{
    println!("Requesting temporary credentials ...");
    let pb = spinner("Contacting note service...");
    let temporary = service.request_temporary_credentials();
    pb.finish_and_clear();
    let temporary = temporary.context("Requesting temporary credentials failed")?;
    println!("Temporary credentials got: {}", temporary.token);

    let url = service.authorization_url(&temporary);
    println!("{}", url);
    if let Err(e) = open_url(&url) {
        debug!(error = %e, "could not open browser; user can open the URL manually");
    }

    let verifier = verifier
        .read_verifier()
        .context("Read verifier from console failed")?;
    let verifier = verifier.trim();
    if verifier.is_empty() {
        bail!("Read verifier from console failed: empty verifier");
    }
    println!("verifier: {}", verifier);

    let pb = spinner("Exchanging verifier for access token...");
    let credentials = service.request_token(&temporary, verifier);
    pb.finish_and_clear();
    let credentials = credentials.context("Token exchange failed")?;
    info!("access token obtained");

    if let Err(e) = store.save(&credentials) {
        warn!(error = %e, "access token not persisted");
        println!("Saving access token failed: {:#}", e);
    }
    Ok(credentials)
}

/// Stored credentials if present, otherwise run [`authorize`].
pub fn ensure_credentials<S, O>(
    service: &S,
    store: &CredentialStore,
    verifier: &mut dyn VerifierSource,
    open_url: O,
) -> Result<Credentials>
where
    S: OAuthService + ?Sized,
    O: Fn(&str) -> io::Result<()>,
{
    if let Some(creds) = store.load() {
        debug!(path = %store.path().display(), "using stored access token");
        return Ok(creds);
    }
    println!(
        "Access token ({}) not found, try authorize...",
        CREDENTIALS_FILE
    );
    authorize(service, store, verifier, open_url)
}

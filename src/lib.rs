// Library root
// ------------
// The `yi` binary (`main.rs`) is a thin shell around these modules.
//
// Module responsibilities:
// - `api`: signed HTTP calls to the note service (token endpoints,
//   user info, notebooks, notes).
// - `auth`: the interactive OAuth handshake and credential bootstrap.
// - `cli`: command-line flags.
// - `config`: `yi.conf` application keys and per-run import options.
// - `credentials`: the access token file in the home directory.
// - `decoder`: input text decoding chosen by `-enc`.
// - `error`: typed errors for remote calls.
// - `import`: maps files and folders to notes and notebooks.
// - `markup`: plain text to note HTML.
// - `oauth`: OAuth 1.0a signing primitives.
//
// `auth` and `import` only see the service through the `OAuthService` and
// `NoteService` traits, so both run against in-memory fakes in tests.
pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod decoder;
pub mod error;
pub mod import;
pub mod markup;
pub mod oauth;

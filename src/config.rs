// Application configuration.
//
// Two immutable pieces are built once at startup:
// - `AppConfig`: the application's own OAuth consumer key/secret and the
//   service base URL, read from `yi.conf` (JSON) with an environment
//   override for the URL.
// - `ImportOptions`: author, source and input decoding from the CLI
//   flags, passed explicitly to the import walker.

use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

use crate::decoder::TextDecoder;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "yi.conf";

/// Production endpoint of the note service.
pub const DEFAULT_BASE_URL: &str = "https://note.youdao.com";

/// Environment variable overriding the service base URL (e.g. a sandbox).
pub const BASE_URL_ENV: &str = "YNOTE_BASE_URL";

pub const DEFAULT_AUTHOR: &str = "GO-IMPORTER";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub base_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            consumer_key: String::new(),
            consumer_secret: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, then apply `YNOTE_BASE_URL`. A missing or broken
    /// file is not an error: defaults are used and a warning is logged.
    pub fn load(path: &Path) -> Self {
        let mut config = match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Value>(&contents) {
                Ok(doc) => Self::from_value(&doc),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "config file is not valid JSON, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config file not readable, using defaults");
                Self::default()
            }
        };
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                debug!(url = %url, "base URL overridden from environment");
                config.base_url = url;
            }
        }
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        config
    }

    pub fn from_value(doc: &Value) -> Self {
        let defaults = Self::default();
        AppConfig {
            consumer_key: lookup_str(doc, "key.token").unwrap_or(defaults.consumer_key),
            consumer_secret: lookup_str(doc, "key.secret").unwrap_or(defaults.consumer_secret),
            base_url: lookup_str(doc, "api.base_url").unwrap_or(defaults.base_url),
        }
    }

    pub fn has_consumer_key(&self) -> bool {
        !self.consumer_key.is_empty() && !self.consumer_secret.is_empty()
    }
}

/// Resolve a dotted key either as a literal member (`"key.token": ...`) or
/// through nested objects (`"key": {"token": ...}`).
fn lookup_str(doc: &Value, dotted: &str) -> Option<String> {
    if let Some(Value::String(s)) = doc.get(dotted) {
        return Some(s.clone());
    }
    dotted
        .split('.')
        .try_fold(doc, |node, part| node.get(part))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Per-note settings shared by every import in one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    pub author: String,
    pub source: String,
    pub decoder: TextDecoder,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            author: DEFAULT_AUTHOR.to_string(),
            source: String::new(),
            decoder: TextDecoder::Identity,
        }
    }
}

impl ImportOptions {
    /// Build options from flag values. An unknown encoding falls back to
    /// UTF-8 with a notice instead of failing the run.
    pub fn new(author: &str, source: &str, encoding: &str) -> Self {
        let decoder = TextDecoder::for_label_or_identity(encoding);
        if decoder != TextDecoder::Identity {
            println!("Supposing input encoding: {}", decoder.name());
        }
        ImportOptions {
            author: author.to_string(),
            source: source.to_string(),
            decoder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_nested_keys() {
        let doc = json!({"key": {"token": "ck", "secret": "cs"}});
        let config = AppConfig::from_value(&doc);
        assert_eq!(config.consumer_key, "ck");
        assert_eq!(config.consumer_secret, "cs");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.has_consumer_key());
    }

    #[test]
    fn test_literal_dotted_keys() {
        let doc = json!({"key.token": "ck", "key.secret": "cs", "api": {"base_url": "http://sandbox.note.youdao.com"}});
        let config = AppConfig::from_value(&doc);
        assert_eq!(config.consumer_key, "ck");
        assert_eq!(config.base_url, "http://sandbox.note.youdao.com");
    }

    #[test]
    fn test_missing_keys_default_to_empty() {
        let config = AppConfig::from_value(&json!({"key": {"token": 42}}));
        assert_eq!(config.consumer_key, "");
        assert!(!config.has_consumer_key());
    }

    #[test]
    fn test_load_missing_or_broken_file() {
        let dir = TempDir::new().unwrap();
        let missing = AppConfig::load(&dir.path().join(CONFIG_FILE));
        assert_eq!(missing.consumer_key, "");

        let broken = dir.path().join("broken.conf");
        std::fs::write(&broken, "{ key: ").unwrap();
        assert_eq!(AppConfig::load(&broken).consumer_secret, "");
    }

    #[test]
    fn test_load_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"key": {"token": "ck", "secret": "cs"}}"#).unwrap();
        let config = AppConfig::load(&path);
        assert_eq!(config.consumer_key, "ck");
        assert_eq!(config.consumer_secret, "cs");
    }

    #[test]
    fn test_import_options() {
        let defaults = ImportOptions::default();
        assert_eq!(defaults.author, "GO-IMPORTER");
        assert_eq!(defaults.source, "");

        let opts = ImportOptions::new("me", "disk", "gb18030");
        assert_eq!(opts.author, "me");
        assert_eq!(opts.decoder.name(), "gb18030");

        assert_eq!(ImportOptions::new("me", "", "bogus").decoder, TextDecoder::Identity);
    }
}

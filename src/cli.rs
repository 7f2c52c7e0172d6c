// Command-line surface of `yi`.

use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::config::{ImportOptions, CONFIG_FILE, DEFAULT_AUTHOR};

/// Flags that older scripts pass with a single dash (`-author x`).
const SINGLE_DASH_FLAGS: &[&str] = &["author", "source", "enc", "config", "credentials"];

/// Import text files into Youdao Note
#[derive(Parser, Debug)]
#[command(name = "yi", version)]
pub struct Cli {
    /// The author of imported notes
    #[arg(long, default_value = DEFAULT_AUTHOR)]
    pub author: String,

    /// The source of imported notes
    #[arg(long, default_value = "")]
    pub source: String,

    /// The encoding of the input text
    #[arg(long, default_value = "utf-8")]
    pub enc: String,

    /// Application key file (JSON with key.token / key.secret)
    #[arg(long, default_value = CONFIG_FILE)]
    pub config: PathBuf,

    /// Where the access token is stored [default: ~/at.json]
    #[arg(long)]
    pub credentials: Option<PathBuf>,

    /// Files or folders to import
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,
}

impl Cli {
    /// Parse, accepting `-author value` style flags as well.
    pub fn parse_with_single_dash<I>(args: I) -> Self
    where
        I: IntoIterator<Item = OsString>,
    {
        Cli::parse_from(normalize_single_dash(args))
    }

    pub fn import_options(&self) -> ImportOptions {
        ImportOptions::new(&self.author, &self.source, &self.enc)
    }
}

/// Rewrite `-author`/`-author=x` into `--author`/`--author=x`. Everything
/// after `--` is left alone.
pub fn normalize_single_dash<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut out = Vec::new();
    let mut passthrough = false;
    for arg in args {
        if passthrough {
            out.push(arg);
            continue;
        }
        let rewritten = arg.to_str().and_then(|s| {
            let flag = s.strip_prefix('-').filter(|rest| !rest.starts_with('-'))?;
            let name = flag.split('=').next().unwrap_or(flag);
            SINGLE_DASH_FLAGS
                .contains(&name)
                .then(|| OsString::from(format!("-{}", s)))
        });
        if arg == "--" {
            passthrough = true;
        }
        out.push(rewritten.unwrap_or(arg));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<OsString> {
        v.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_normalize_single_dash() {
        let out = normalize_single_dash(args(&["yi", "-author", "me", "-enc=gbk", "-x", "--source", "s", "notes"]));
        assert_eq!(
            out,
            args(&["yi", "--author", "me", "--enc=gbk", "-x", "--source", "s", "notes"])
        );
    }

    #[test]
    fn test_double_dash_stops_rewriting() {
        let out = normalize_single_dash(args(&["yi", "--", "-author"]));
        assert_eq!(out, args(&["yi", "--", "-author"]));
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_with_single_dash(args(&["yi", "a.txt", "notes"]));
        assert_eq!(cli.author, "GO-IMPORTER");
        assert_eq!(cli.source, "");
        assert_eq!(cli.enc, "utf-8");
        assert_eq!(cli.config, PathBuf::from("yi.conf"));
        assert!(cli.credentials.is_none());
        assert_eq!(cli.paths, vec![PathBuf::from("a.txt"), PathBuf::from("notes")]);
    }

    #[test]
    fn test_go_style_flags() {
        let cli = Cli::parse_with_single_dash(args(&["yi", "-author", "me", "-source", "disk", "-enc", "gbk", "x"]));
        assert_eq!(cli.author, "me");
        assert_eq!(cli.source, "disk");
        let opts = cli.import_options();
        assert_eq!(opts.decoder.name(), "GBK");
    }

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

//! Process configuration for the NWScript language server.
//!
//! Handles:
//! - Command-line argument parsing
//! - Grammar file resolution
//!
//! Client (workspace) settings live in [`crate::core::configuration`].

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::parser::GrammarLoader;

/// File name looked up in the user config directory
pub const USER_GRAMMAR_FILE: &str = "grammar.toml";

/// Command-line arguments for the NWScript language server
#[derive(Debug, Parser)]
#[command(name = "nwscript-ls")]
#[command(about = "Language server for NWScript files")]
#[command(version)]
pub struct Args {
    /// Grammar file to tokenize with instead of the built-in one
    #[arg(long, help = "Path to a TOML grammar file (keywords and types)")]
    pub grammar: Option<PathBuf>,

    /// Log level for the language server
    #[arg(
        long,
        default_value = "info",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,

    /// Give up on a workspace configuration request after this many seconds
    #[arg(long, help = "Timeout for workspace/configuration requests, in seconds")]
    pub config_timeout_secs: Option<u64>,
}

/// Options the server runs with
#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    /// Grammar file to load, `None` for the embedded grammar
    pub grammar_path: Option<PathBuf>,
    pub log_level: String,
    /// Unset means configuration requests may take as long as the client needs
    pub config_timeout: Option<Duration>,
}

impl ServerOptions {
    /// Create options from command-line arguments
    pub fn from_args_and_env() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Create options from explicit arguments (useful for testing)
    pub fn from_args(args: Args) -> Result<Self> {
        args.log_level
            .parse::<log::LevelFilter>()
            .with_context(|| format!("Invalid log level '{}'", args.log_level))?;

        let grammar_path = match args.grammar {
            Some(path) => {
                if !path.is_file() {
                    anyhow::bail!("Grammar file {} does not exist", path.display());
                }
                Some(path)
            }
            None => user_grammar_path().filter(|p| p.is_file()),
        };

        Ok(ServerOptions {
            grammar_path,
            log_level: args.log_level,
            config_timeout: args.config_timeout_secs.map(Duration::from_secs),
        })
    }

    /// Loader for the grammar these options select
    pub fn grammar_loader(&self) -> GrammarLoader {
        GrammarLoader::new(self.grammar_path.clone())
    }
}

/// `<config_dir>/nwscript-ls/grammar.toml`, whether or not it exists
pub fn user_grammar_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("nwscript-ls").join(USER_GRAMMAR_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["nwscript-ls"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).expect("parse args")
    }

    #[test]
    fn test_defaults() {
        let args = args(&[]);
        assert_eq!(args.log_level, "info");
        assert!(args.grammar.is_none());

        let options = ServerOptions::from_args(args).expect("options");
        assert_eq!(options.config_timeout, None);
    }

    #[test]
    fn test_explicit_grammar_and_timeout() {
        let grammar = NamedTempFile::new().expect("temp file");
        let path = grammar.path().to_string_lossy().to_string();

        let options = ServerOptions::from_args(args(&[
            "--grammar",
            &path,
            "--config-timeout-secs",
            "5",
            "--log-level",
            "debug",
        ]))
        .expect("options");

        assert_eq!(options.grammar_path.as_deref(), Some(grammar.path()));
        assert_eq!(options.config_timeout, Some(Duration::from_secs(5)));
        assert_eq!(options.grammar_loader().path(), Some(grammar.path()));
    }

    #[test]
    fn test_missing_grammar_is_rejected() {
        let result = ServerOptions::from_args(args(&["--grammar", "/nonexistent/grammar.toml"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let error = ServerOptions::from_args(args(&["--log-level", "loud"])).unwrap_err();
        assert!(error.to_string().contains("loud"));
    }

    #[test]
    fn test_user_grammar_location() {
        if let Some(path) = user_grammar_path() {
            assert!(path.ends_with("nwscript-ls/grammar.toml"));
        }
    }
}

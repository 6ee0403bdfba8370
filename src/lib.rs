//! NWScript Language Server
//!
//! Language Server Protocol implementation for NWScript (`.nss`) files.
//!
//! This library provides:
//! - Session coordination (startup ordering, diagnostics gating)
//! - A grammar driven tokenizer
//! - Completion, hover, definition, signature help and formatting providers
//! - LSP protocol implementation

pub mod config;
pub mod core;
pub mod error;
pub mod lsp;
pub mod parser;
pub mod providers;

mod test_utils;

// Re-exports for clean public API
pub use config::ServerOptions;
pub use crate::core::{ServerConfiguration, SessionClient, SessionCoordinator};
pub use error::{ConfigError, GrammarError};
pub use parser::{Grammar, GrammarLoader, Lexer, Tokenizer, TokenizerLoader};

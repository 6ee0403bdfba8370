//! Grammar Loading
//!
//! Keyword/type tables for the lexer, embedded at build time and optionally
//! overridden by a user TOML file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use super::lexer::Lexer;
use super::{Tokenizer, TokenizerLoader};
use crate::error::GrammarError;

const EMBEDDED_GRAMMAR: &str = include_str!("../../resources/grammar/nwscript.grammar.toml");

/// Grammar file structure (matches TOML)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Grammar {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub types: Vec<String>,
}

impl Grammar {
    /// Parse a grammar from TOML text; `origin` names the source in errors
    pub fn from_toml(content: &str, origin: &str) -> Result<Self, GrammarError> {
        let grammar: Grammar = toml::from_str(content).map_err(|source| GrammarError::Parse {
            origin: origin.to_string(),
            source,
        })?;

        if grammar.keywords.is_empty() && grammar.types.is_empty() {
            return Err(GrammarError::Empty(origin.to_string()));
        }

        Ok(grammar)
    }

    /// The grammar compiled into the binary
    pub fn embedded() -> Result<Self, GrammarError> {
        Self::from_toml(EMBEDDED_GRAMMAR, "<embedded>")
    }

    /// Read a grammar file from disk
    pub async fn from_file(path: &Path) -> Result<Self, GrammarError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| GrammarError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_toml(&content, &path.display().to_string())
    }
}

/// Loads the lexer grammar: an explicit file when configured, the embedded
/// grammar otherwise.
#[derive(Debug, Clone, Default)]
pub struct GrammarLoader {
    path: Option<PathBuf>,
}

impl GrammarLoader {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[tower_lsp::async_trait]
impl TokenizerLoader for GrammarLoader {
    async fn load(&self) -> anyhow::Result<Arc<dyn Tokenizer>> {
        let grammar = match &self.path {
            Some(path) => {
                log::info!("Loading grammar from {}", path.display());
                Grammar::from_file(path).await?
            }
            None => Grammar::embedded()?,
        };

        log::debug!(
            "Grammar '{}' loaded: {} keywords, {} types",
            grammar.name,
            grammar.keywords.len(),
            grammar.types.len()
        );

        Ok(Arc::new(Lexer::new(&grammar)))
    }
}

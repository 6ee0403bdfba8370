//! NWScript Tokenizer
//!
//! The session only sees the [`Tokenizer`] and [`TokenizerLoader`] traits;
//! the grammar-driven [`Lexer`] is the default implementation.

pub mod declarations;
pub mod grammar;
pub mod lexer;

use std::sync::Arc;

pub use declarations::{find_declaration, find_declarations, Declaration, DeclarationKind};
pub use grammar::{Grammar, GrammarLoader};
pub use lexer::{Lexer, Location, Token, TokenKind};

/// Immutable tokenized representation of one document
pub type TokenStream = Arc<[Token]>;

/// Converts raw text into tokens. Must be a pure function of the text.
pub trait Tokenizer: Send + Sync + std::fmt::Debug {
    fn tokenize(&self, text: &str) -> TokenStream;

    /// Reserved words known to the grammar
    fn keywords(&self) -> &[String] {
        &[]
    }

    /// Built-in type names known to the grammar
    fn types(&self) -> &[String] {
        &[]
    }
}

/// One-shot asynchronous acquisition of a tokenizer
#[tower_lsp::async_trait]
pub trait TokenizerLoader: Send + Sync {
    async fn load(&self) -> anyhow::Result<Arc<dyn Tokenizer>>;
}

/// Find the token covering `location`, preferring identifiers when the
/// cursor touches two tokens
pub fn token_at(tokens: &[Token], location: Location) -> Option<&Token> {
    let mut candidates = tokens.iter().filter(|t| t.contains(location));
    let first = candidates.next()?;
    if first.kind == TokenKind::Identifier {
        return Some(first);
    }
    Some(
        candidates
            .find(|t| t.kind == TokenKind::Identifier)
            .unwrap_or(first),
    )
}

use std::collections::HashSet;
use std::sync::Arc;

use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, InsertTextFormat, Position, Url,
};

use super::to_location;
use crate::core::configuration::{CompletionConfig, ConfigurationState};
use crate::core::document::DocumentStateStore;
use crate::parser::{find_declarations, Declaration, DeclarationKind, TokenKind, Tokenizer};

pub struct CompletionProvider {
    documents: Arc<DocumentStateStore>,
    tokenizer: Arc<dyn Tokenizer>,
    config: Arc<ConfigurationState>,
}

impl CompletionProvider {
    pub fn new(
        documents: Arc<DocumentStateStore>,
        tokenizer: Arc<dyn Tokenizer>,
        config: Arc<ConfigurationState>,
    ) -> Self {
        Self {
            documents,
            tokenizer,
            config,
        }
    }

    /// Keywords, types and document declarations matching the word under
    /// the cursor
    pub async fn complete(&self, uri: &Url, position: Position) -> Option<Vec<CompletionItem>> {
        let document = self.documents.get(uri).await?;
        let config = self.config.snapshot().await.completion;
        let location = to_location(position);

        let prefix = document
            .tokens
            .iter()
            .find(|t| {
                matches!(
                    t.kind,
                    TokenKind::Identifier | TokenKind::Keyword | TokenKind::Type
                ) && t.contains(location)
            })
            .map(|t| utf16_prefix(&t.text, location.column - t.start.column))
            .unwrap_or_default()
            .to_lowercase();

        let mut seen = HashSet::new();
        let mut items = Vec::new();

        let words = self
            .tokenizer
            .keywords()
            .iter()
            .map(|k| (k, CompletionItemKind::KEYWORD))
            .chain(
                self.tokenizer
                    .types()
                    .iter()
                    .map(|t| (t, CompletionItemKind::TYPE_PARAMETER)),
            );
        for (word, kind) in words {
            if word.to_lowercase().starts_with(&prefix) && seen.insert(word.clone()) {
                items.push(CompletionItem {
                    label: word.clone(),
                    kind: Some(kind),
                    ..Default::default()
                });
            }
        }

        for declaration in find_declarations(&document.tokens) {
            if declaration.name.to_lowercase().starts_with(&prefix)
                && seen.insert(declaration.name.clone())
            {
                items.push(declaration_item(&declaration, &config));
            }
        }

        if items.is_empty() {
            None
        } else {
            Some(items)
        }
    }
}

fn declaration_item(declaration: &Declaration, config: &CompletionConfig) -> CompletionItem {
    let mut item = CompletionItem {
        label: declaration.name.clone(),
        detail: Some(declaration.signature()),
        ..Default::default()
    };

    match &declaration.kind {
        DeclarationKind::Function { parameters } => {
            item.kind = Some(CompletionItemKind::FUNCTION);
            if config.add_params_to_functions {
                let placeholders: Vec<String> = parameters
                    .iter()
                    .enumerate()
                    .map(|(i, p)| format!("${{{}:{}}}", i + 1, p))
                    .collect();
                item.insert_text = Some(format!("{}({})", declaration.name, placeholders.join(", ")));
                item.insert_text_format = Some(InsertTextFormat::SNIPPET);
            } else if config.add_parenthesis {
                item.insert_text = Some(format!("{}()", declaration.name));
            }
        }
        DeclarationKind::Variable => {
            item.kind = Some(CompletionItemKind::VARIABLE);
        }
    }

    item
}

/// First `units` UTF-16 code units of `text`
fn utf16_prefix(text: &str, units: u32) -> String {
    let mut taken = 0;
    text.chars()
        .take_while(|c| {
            taken += c.len_utf16() as u32;
            taken <= units
        })
        .collect()
}

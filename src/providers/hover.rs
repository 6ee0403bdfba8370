use std::sync::Arc;

use tower_lsp::lsp_types::{
    Hover, HoverContents, MarkupContent, MarkupKind, Position, Range, Url,
};

use super::{to_location, to_position};
use crate::core::configuration::ConfigurationState;
use crate::core::document::DocumentStateStore;
use crate::parser::{find_declaration, find_declarations, token_at, TokenKind};

pub struct HoverProvider {
    documents: Arc<DocumentStateStore>,
    config: Arc<ConfigurationState>,
}

impl HoverProvider {
    pub fn new(documents: Arc<DocumentStateStore>, config: Arc<ConfigurationState>) -> Self {
        Self { documents, config }
    }

    pub async fn hover(&self, uri: &Url, position: Position) -> Option<Hover> {
        let document = self.documents.get(uri).await?;
        let token = token_at(&document.tokens, to_location(position))?;
        if token.kind != TokenKind::Identifier {
            return None;
        }

        let declarations = find_declarations(&document.tokens);
        let declaration =
            find_declaration(&declarations, &token.text).filter(|d| d.is_function())?;

        let mut value = String::new();
        if self.config.snapshot().await.hovering.add_comments_to_functions
            && let Some(comment) = &declaration.comment
        {
            value.push_str(comment);
            value.push_str("\n\n");
        }
        value.push_str(&format!("```nwscript\n{}\n```", declaration.signature()));

        Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value,
            }),
            range: Some(Range::new(to_position(token.start), to_position(token.end))),
        })
    }
}

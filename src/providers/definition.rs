use std::sync::Arc;

use tower_lsp::lsp_types::{Location as LspLocation, Position, Range, Url};

use super::{to_location, to_position};
use crate::core::document::DocumentStateStore;
use crate::parser::{find_declaration, find_declarations, token_at, TokenKind};

pub struct DefinitionProvider {
    documents: Arc<DocumentStateStore>,
}

impl DefinitionProvider {
    pub fn new(documents: Arc<DocumentStateStore>) -> Self {
        Self { documents }
    }

    /// First declaration of the identifier under the cursor, same document only
    pub async fn definition(&self, uri: &Url, position: Position) -> Option<LspLocation> {
        let document = self.documents.get(uri).await?;
        let token = token_at(&document.tokens, to_location(position))?;
        if token.kind != TokenKind::Identifier {
            return None;
        }

        let declarations = find_declarations(&document.tokens);
        let declaration = find_declaration(&declarations, &token.text)?;

        Some(LspLocation::new(
            uri.clone(),
            Range::new(
                to_position(declaration.token.start),
                to_position(declaration.token.end),
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_helpers::{store_with, test_uri};

    #[tokio::test]
    async fn test_jumps_to_function_declaration() {
        let text = "int Add(int a, int b) { return a + b; }\nvoid main() { Add(1, 2); }";
        let provider = DefinitionProvider::new(store_with(text).await);

        let location = provider
            .definition(&test_uri(), Position::new(1, 15))
            .await
            .expect("definition");

        assert_eq!(location.uri, test_uri());
        assert_eq!(location.range, Range::new(Position::new(0, 4), Position::new(0, 7)));
    }

    #[tokio::test]
    async fn test_parameter_reference() {
        let text = "int Add(int a, int b) { return a + b; }";
        let provider = DefinitionProvider::new(store_with(text).await);

        let location = provider
            .definition(&test_uri(), Position::new(0, 31))
            .await
            .expect("definition");

        assert_eq!(location.range.start, Position::new(0, 12));
    }

    #[tokio::test]
    async fn test_undeclared_and_non_identifier() {
        let text = "void main() { GetFirstPC(); }";
        let provider = DefinitionProvider::new(store_with(text).await);

        assert!(provider.definition(&test_uri(), Position::new(0, 16)).await.is_none());
        // `void`
        assert!(provider.definition(&test_uri(), Position::new(0, 1)).await.is_none());
    }
}

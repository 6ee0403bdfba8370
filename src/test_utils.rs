//! Test utilities for provider and diagnostics unit tests.

#[cfg(test)]
pub(crate) mod test_helpers {
    use std::sync::Arc;

    use tower_lsp::lsp_types::{DidOpenTextDocumentParams, TextDocumentItem, Url};

    use crate::core::configuration::ConfigurationState;
    use crate::core::document::DocumentStateStore;
    use crate::core::events::LiveDocumentEventBus;
    use crate::core::workspace::WorkspaceFileSystem;
    use crate::parser::{Grammar, Lexer, Tokenizer};

    pub fn test_uri() -> Url {
        Url::parse("file:///work/test.nss").expect("valid url")
    }

    pub fn test_tokenizer() -> Arc<dyn Tokenizer> {
        Arc::new(Lexer::new(&Grammar::embedded().expect("embedded grammar")))
    }

    /// Store holding `text` under [`test_uri`]
    pub async fn store_with(text: &str) -> Arc<DocumentStateStore> {
        let store = Arc::new(DocumentStateStore::new());
        store
            .create_document(
                test_uri(),
                text.into(),
                1,
                test_tokenizer().as_ref(),
                &WorkspaceFileSystem::default(),
            )
            .await;
        store
    }

    /// Live bus with `text` open under [`test_uri`]
    pub fn live_with(text: &str) -> Arc<LiveDocumentEventBus> {
        let live = Arc::new(LiveDocumentEventBus::new());
        live.did_open(DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri: test_uri(),
                language_id: "nwscript".to_string(),
                version: 1,
                text: text.to_string(),
            },
        });
        live
    }

    /// Configuration state after merging `update` onto the defaults
    pub async fn config_with(update: serde_json::Value) -> Arc<ConfigurationState> {
        struct Fixed(serde_json::Value);

        #[tower_lsp::async_trait]
        impl crate::core::configuration::ConfigurationSource for Fixed {
            async fn get_configuration(
                &self,
                _section: &str,
            ) -> Result<serde_json::Value, crate::error::ConfigError> {
                Ok(self.0.clone())
            }
        }

        let state = Arc::new(ConfigurationState::default());
        state.load(&Fixed(update)).await.expect("merge test config");
        state
    }
}

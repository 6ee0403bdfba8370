//! Document Management
//!
//! Tokenized state for every open document. Entries are immutable and are
//! swapped wholesale, so readers always see a consistent snapshot.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tower_lsp::lsp_types::Url;

use super::events::DocumentHandle;
use super::workspace::WorkspaceFileSystem;
use crate::parser::{TokenStream, Tokenizer};

/// Tokenized snapshot of one document
#[derive(Debug, Clone)]
pub struct Document {
    pub uri: Url,
    pub version: i32,
    pub text: Arc<str>,
    pub tokens: TokenStream,
    /// Path relative to the workspace, when the document lives inside it
    pub relative_path: Option<PathBuf>,
}

impl Document {
    fn build(
        uri: Url,
        version: i32,
        text: Arc<str>,
        tokenizer: &dyn Tokenizer,
        fs: &WorkspaceFileSystem,
    ) -> Self {
        let tokens = tokenizer.tokenize(&text);
        let relative_path = fs.relative_path(&uri);

        Self {
            uri,
            version,
            text,
            tokens,
            relative_path,
        }
    }
}

#[derive(Debug, Default)]
pub struct DocumentStateStore {
    documents: RwLock<HashMap<Url, Arc<Document>>>,
}

impl DocumentStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenize `text` and store it under `uri`, replacing any prior entry
    pub async fn create_document(
        &self,
        uri: Url,
        text: Arc<str>,
        version: i32,
        tokenizer: &dyn Tokenizer,
        fs: &WorkspaceFileSystem,
    ) -> Arc<Document> {
        let document = Arc::new(Document::build(uri, version, text, tokenizer, fs));
        log::debug!(
            "Stored {} (version {}, {} tokens)",
            document.uri,
            document.version,
            document.tokens.len()
        );

        self.documents
            .write()
            .await
            .insert(document.uri.clone(), Arc::clone(&document));
        document
    }

    /// Re-tokenize from the handle's text snapshot. Creates the entry when
    /// the document was never stored.
    pub async fn update_document(
        &self,
        handle: &DocumentHandle,
        tokenizer: &dyn Tokenizer,
        fs: &WorkspaceFileSystem,
    ) -> Arc<Document> {
        self.create_document(
            handle.uri.clone(),
            Arc::clone(&handle.text),
            handle.version,
            tokenizer,
            fs,
        )
        .await
    }

    pub async fn get(&self, uri: &Url) -> Option<Arc<Document>> {
        self.documents.read().await.get(uri).cloned()
    }

    pub async fn contains(&self, uri: &Url) -> bool {
        self.documents.read().await.contains_key(uri)
    }

    pub async fn remove(&self, uri: &Url) -> Option<Arc<Document>> {
        self.documents.write().await.remove(uri)
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    pub async fn uris(&self) -> Vec<Url> {
        self.documents.read().await.keys().cloned().collect()
    }
}

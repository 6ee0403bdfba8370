//! Live document events
//!
//! Tracks the live text of every document the client has open and turns the
//! raw text-synchronization notifications into [`DocumentEvent`]s. Until
//! [`LiveDocumentEventBus::subscribe`] is called no events are emitted,
//! although live text is still tracked.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tower_lsp::lsp_types::{
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    DidSaveTextDocumentParams, Url, WillSaveTextDocumentParams,
};

/// Snapshot of a live document at the time an event fired
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentHandle {
    pub uri: Url,
    pub version: i32,
    pub text: Arc<str>,
}

/// Typed document events routed to the session
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEvent {
    Opened(DocumentHandle),
    WillSave(DocumentHandle),
    DidSave(Url),
    Closed(Url),
}

impl DocumentEvent {
    pub fn uri(&self) -> &Url {
        match self {
            DocumentEvent::Opened(handle) | DocumentEvent::WillSave(handle) => &handle.uri,
            DocumentEvent::DidSave(uri) | DocumentEvent::Closed(uri) => uri,
        }
    }
}

#[derive(Debug, Default)]
pub struct LiveDocumentEventBus {
    documents: Mutex<HashMap<Url, DocumentHandle>>,
    subscribed: AtomicBool,
}

impl LiveDocumentEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start emitting events
    pub fn subscribe(&self) {
        self.subscribed.store(true, Ordering::Release);
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::Acquire)
    }

    fn documents(&self) -> MutexGuard<'_, HashMap<Url, DocumentHandle>> {
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, event: DocumentEvent) -> Option<DocumentEvent> {
        if self.is_subscribed() {
            Some(event)
        } else {
            log::debug!("No subscriber yet, dropping event for {}", event.uri());
            None
        }
    }

    /// Current live snapshot of `uri`
    pub fn get(&self, uri: &Url) -> Option<DocumentHandle> {
        self.documents().get(uri).cloned()
    }

    pub fn did_open(&self, params: DidOpenTextDocumentParams) -> Option<DocumentEvent> {
        let document = params.text_document;
        let handle = DocumentHandle {
            uri: document.uri,
            version: document.version,
            text: document.text.into(),
        };

        self.documents().insert(handle.uri.clone(), handle.clone());
        self.emit(DocumentEvent::Opened(handle))
    }

    /// Full-sync change: the last content change carries the whole text.
    /// Changes never produce an event.
    pub fn did_change(&self, params: DidChangeTextDocumentParams) {
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };

        let uri = params.text_document.uri;
        let mut documents = self.documents();
        match documents.get_mut(&uri) {
            Some(handle) => {
                handle.version = params.text_document.version;
                handle.text = change.text.into();
            }
            None => {
                log::warn!("Change for unknown document {}", uri);
            }
        }
    }

    pub fn will_save(&self, params: WillSaveTextDocumentParams) -> Option<DocumentEvent> {
        let uri = params.text_document.uri;
        let Some(handle) = self.get(&uri) else {
            log::warn!("Will-save for unknown document {}", uri);
            return None;
        };
        self.emit(DocumentEvent::WillSave(handle))
    }

    pub fn did_save(&self, params: DidSaveTextDocumentParams) -> Option<DocumentEvent> {
        self.emit(DocumentEvent::DidSave(params.text_document.uri))
    }

    pub fn did_close(&self, params: DidCloseTextDocumentParams) -> Option<DocumentEvent> {
        let uri = params.text_document.uri;
        self.documents().remove(&uri);
        self.emit(DocumentEvent::Closed(uri))
    }
}

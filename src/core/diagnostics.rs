//! Diagnostics
//!
//! Publication of per-document diagnostics, and the queue that holds
//! documents back until the first configuration load has completed.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use tower_lsp::lsp_types::{self, DiagnosticSeverity, Position, Range, Url};

use super::configuration::{CompilerConfig, ConfigurationState, LoadedFlag};
use super::document::{Document, DocumentStateStore};
use crate::parser::{Location, Token, TokenKind};

/// Outcome of asking to publish a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    PublishNow,
    Deferred,
}

/// Documents waiting for the first configuration load
#[derive(Debug, Default)]
pub struct DiagnosticsPublishQueue {
    pending: Mutex<BTreeSet<Url>>,
}

impl DiagnosticsPublishQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn pending(&self) -> MutexGuard<'_, BTreeSet<Url>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add `uri` to the pending set; false if it was already there
    pub fn defer(&self, uri: Url) -> bool {
        self.pending().insert(uri)
    }

    /// Take every pending uri when `is_ready`, nothing otherwise
    pub fn drain_if_ready(&self, is_ready: bool) -> Vec<Url> {
        if !is_ready {
            return Vec::new();
        }
        std::mem::take(&mut *self.pending()).into_iter().collect()
    }

    /// Decide between publishing now and deferring. The latch is read under
    /// the queue lock, so this cannot interleave with [`Self::open`].
    pub fn schedule(&self, uri: &Url, loaded: &LoadedFlag) -> Schedule {
        let mut pending = self.pending();
        if loaded.is_set() {
            Schedule::PublishNow
        } else {
            pending.insert(uri.clone());
            Schedule::Deferred
        }
    }

    /// Set the latch and drain in one critical section. Only the call that
    /// flips the latch gets the pending uris.
    pub fn open(&self, loaded: &LoadedFlag) -> Vec<Url> {
        let mut pending = self.pending();
        let flipped = loaded.set();
        if flipped {
            std::mem::take(&mut *pending).into_iter().collect()
        } else {
            Vec::new()
        }
    }

    pub fn forget(&self, uri: &Url) -> bool {
        self.pending().remove(uri)
    }

    pub fn contains(&self, uri: &Url) -> bool {
        self.pending().contains(uri)
    }

    pub fn len(&self) -> usize {
        self.pending().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending().is_empty()
    }
}

/// Severity of an analysis finding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One analysis result, before conversion to the LSP type
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub start: Location,
    pub end: Location,
    pub message: String,
    pub severity: Severity,
}

impl Finding {
    fn error(token: &Token, message: String) -> Self {
        Self {
            start: token.start,
            end: token.end,
            message,
            severity: Severity::Error,
        }
    }

    fn warning(token: &Token, message: String) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(token, message)
        }
    }

    pub fn to_lsp(&self) -> lsp_types::Diagnostic {
        let severity = match self.severity {
            Severity::Error => DiagnosticSeverity::ERROR,
            Severity::Warning => DiagnosticSeverity::WARNING,
        };

        lsp_types::Diagnostic::new(
            Range::new(
                Position::new(self.start.line, self.start.column),
                Position::new(self.end.line, self.end.column),
            ),
            Some(severity),
            None,
            Some("nwscript-ls".to_string()),
            self.message.clone(),
            None,
            None,
        )
    }
}

/// Diagnostic analysis over a tokenized document
pub trait DiagnosticsAnalyzer: Send + Sync {
    fn analyze(&self, document: &Document, config: &CompilerConfig) -> Vec<Finding>;
}

/// Token-level checks: invalid tokens, bracket balance, malformed includes
#[derive(Debug, Default, Clone, Copy)]
pub struct TokenAnalyzer;

impl DiagnosticsAnalyzer for TokenAnalyzer {
    fn analyze(&self, document: &Document, config: &CompilerConfig) -> Vec<Finding> {
        if !config.enabled {
            return Vec::new();
        }

        let mut findings = Vec::new();
        let mut open_brackets: Vec<&Token> = Vec::new();
        let tokens = &document.tokens;

        for (index, token) in tokens.iter().enumerate() {
            match token.kind {
                TokenKind::Invalid => findings.push(Finding::error(token, invalid_message(token))),
                TokenKind::Punctuation => match token.text.as_str() {
                    "(" | "{" | "[" => open_brackets.push(token),
                    ")" | "}" | "]" => {
                        let expected = matching_open(&token.text);
                        match open_brackets.last() {
                            Some(open) if open.text == expected => {
                                open_brackets.pop();
                            }
                            _ => findings.push(Finding::error(
                                token,
                                format!("Unmatched '{}'", token.text),
                            )),
                        }
                    }
                    _ => {}
                },
                TokenKind::Directive if token.text == "#include" => {
                    let target = tokens
                        .get(index + 1)
                        .filter(|next| next.start.line == token.start.line);
                    if !matches!(target, Some(t) if t.kind == TokenKind::String) {
                        findings.push(Finding::warning(
                            token,
                            "#include expects a quoted script name".to_string(),
                        ));
                    }
                }
                _ => {}
            }
        }

        for open in open_brackets {
            findings.push(Finding::error(open, format!("Unclosed '{}'", open.text)));
        }

        if !config.report_warnings {
            findings.retain(|f| f.severity != Severity::Warning);
        }

        findings
    }
}

fn matching_open(close: &str) -> &'static str {
    match close {
        ")" => "(",
        "}" => "{",
        _ => "[",
    }
}

fn invalid_message(token: &Token) -> String {
    if token.text.starts_with('"') {
        "Unterminated string literal".to_string()
    } else if token.text.starts_with("/*") {
        "Unterminated block comment".to_string()
    } else {
        format!("Unexpected character '{}'", token.text)
    }
}

/// Transport-side publish call
#[tower_lsp::async_trait]
pub trait DiagnosticsSink: Send + Sync {
    async fn publish_diagnostics(
        &self,
        uri: Url,
        diagnostics: Vec<lsp_types::Diagnostic>,
        version: Option<i32>,
    );
}

/// Computes and publishes diagnostics for stored documents
pub struct DiagnosticsProvider {
    documents: Arc<DocumentStateStore>,
    config: Arc<ConfigurationState>,
    analyzer: Arc<dyn DiagnosticsAnalyzer>,
    sink: Arc<dyn DiagnosticsSink>,
    published: Mutex<HashMap<Url, i32>>,
}

impl DiagnosticsProvider {
    pub fn new(
        documents: Arc<DocumentStateStore>,
        config: Arc<ConfigurationState>,
        analyzer: Arc<dyn DiagnosticsAnalyzer>,
        sink: Arc<dyn DiagnosticsSink>,
    ) -> Self {
        Self {
            documents,
            config,
            analyzer,
            sink,
            published: Mutex::new(HashMap::new()),
        }
    }

    fn published(&self) -> MutexGuard<'_, HashMap<Url, i32>> {
        self.published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Analyze the current snapshot of `uri` and send the result
    pub async fn publish(&self, uri: &Url) {
        let Some(document) = self.documents.get(uri).await else {
            log::debug!("No tokenized state for {}, nothing to publish", uri);
            return;
        };

        let compiler = self.config.snapshot().await.compiler;
        let diagnostics: Vec<_> = self
            .analyzer
            .analyze(&document, &compiler)
            .iter()
            .map(Finding::to_lsp)
            .collect();

        log::debug!(
            "Publishing {} diagnostics for {} (version {})",
            diagnostics.len(),
            uri,
            document.version
        );
        self.sink
            .publish_diagnostics(uri.clone(), diagnostics, Some(document.version))
            .await;
        self.published().insert(uri.clone(), document.version);
    }

    /// Publish each drained uri once
    pub async fn process_documents_waiting_for_publish(&self, uris: Vec<Url>) {
        if !uris.is_empty() {
            log::info!("Publishing {} deferred document(s)", uris.len());
        }
        for uri in uris {
            self.publish(&uri).await;
        }
    }

    /// Clear client-side markers for a closed document
    pub async fn clear(&self, uri: &Url) {
        self.published().remove(uri);
        self.sink
            .publish_diagnostics(uri.clone(), Vec::new(), None)
            .await;
    }

    pub fn last_published_version(&self, uri: &Url) -> Option<i32> {
        self.published().get(uri).copied()
    }
}

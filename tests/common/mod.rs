//! Common test utilities for session integration tests.
//!
//! In-memory stand-ins for the client-facing collaborators so the
//! coordinator can be driven without a transport.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use serde_json::{json, Value};
use tokio::sync::Notify;
use tower_lsp::lsp_types::{
    ClientCapabilities, Diagnostic, DidOpenTextDocumentParams,
    DynamicRegistrationClientCapabilities, DidSaveTextDocumentParams, InitializeParams, Registration,
    TextDocumentIdentifier, TextDocumentItem, Url, WorkspaceClientCapabilities,
};

use nwscript_language_server::core::configuration::ConfigurationSource;
use nwscript_language_server::core::diagnostics::DiagnosticsSink;
use nwscript_language_server::core::session::CapabilityRegistrar;
use nwscript_language_server::core::{SessionClient, SessionCoordinator};
use nwscript_language_server::parser::{Grammar, Lexer, Tokenizer, TokenizerLoader};
use nwscript_language_server::ConfigError;

/// One `publishDiagnostics` call seen by the fake client
#[derive(Debug, Clone)]
#[allow(dead_code)] // Not every test file reads every field
pub struct Published {
    pub uri: Url,
    pub diagnostics: Vec<Diagnostic>,
    pub version: Option<i32>,
}

/// Records everything the session sends; answers configuration requests
/// from a script, then with an empty object.
#[derive(Default)]
pub struct FakeClient {
    published: Mutex<Vec<Published>>,
    registrations: Mutex<Vec<Registration>>,
    /// `None` entries fail the request
    responses: Mutex<VecDeque<Option<Value>>>,
    configuration_requests: AtomicUsize,
}

#[allow(dead_code)]
impl FakeClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue the answer for the next configuration request
    pub fn respond_with(&self, value: Value) {
        self.responses.lock().unwrap().push_back(Some(value));
    }

    /// Fail the next configuration request
    pub fn fail_next(&self) {
        self.responses.lock().unwrap().push_back(None);
    }

    pub fn published(&self) -> Vec<Published> {
        self.published.lock().unwrap().clone()
    }

    pub fn published_for(&self, uri: &Url) -> Vec<Published> {
        self.published()
            .into_iter()
            .filter(|p| &p.uri == uri)
            .collect()
    }

    pub fn registrations(&self) -> Vec<Registration> {
        self.registrations.lock().unwrap().clone()
    }

    pub fn configuration_requests(&self) -> usize {
        self.configuration_requests.load(Ordering::SeqCst)
    }
}

#[tower_lsp::async_trait]
impl ConfigurationSource for FakeClient {
    async fn get_configuration(&self, section: &str) -> Result<Value, ConfigError> {
        assert_eq!(section, "nwscript-ee-lsp");
        self.configuration_requests.fetch_add(1, Ordering::SeqCst);

        match self.responses.lock().unwrap().pop_front() {
            Some(Some(value)) => Ok(value),
            Some(None) => Err(ConfigError::Fetch("scripted failure".to_string())),
            None => Ok(json!({})),
        }
    }
}

#[tower_lsp::async_trait]
impl DiagnosticsSink for FakeClient {
    async fn publish_diagnostics(
        &self,
        uri: Url,
        diagnostics: Vec<Diagnostic>,
        version: Option<i32>,
    ) {
        self.published.lock().unwrap().push(Published {
            uri,
            diagnostics,
            version,
        });
    }
}

#[tower_lsp::async_trait]
impl CapabilityRegistrar for FakeClient {
    async fn register_capability(&self, registrations: Vec<Registration>) -> anyhow::Result<()> {
        self.registrations.lock().unwrap().extend(registrations);
        Ok(())
    }
}

/// Loads the embedded grammar immediately
pub struct ReadyLoader;

#[tower_lsp::async_trait]
impl TokenizerLoader for ReadyLoader {
    async fn load(&self) -> anyhow::Result<Arc<dyn Tokenizer>> {
        Ok(Arc::new(Lexer::new(&Grammar::embedded()?)))
    }
}

/// Holds the load until [`GatedLoader::release`] is called
#[derive(Default)]
pub struct GatedLoader {
    gate: Notify,
}

#[allow(dead_code)]
impl GatedLoader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[tower_lsp::async_trait]
impl TokenizerLoader for GatedLoader {
    async fn load(&self) -> anyhow::Result<Arc<dyn Tokenizer>> {
        self.gate.notified().await;
        ReadyLoader.load().await
    }
}

/// Never produces a tokenizer
pub struct FailingLoader;

#[tower_lsp::async_trait]
impl TokenizerLoader for FailingLoader {
    async fn load(&self) -> anyhow::Result<Arc<dyn Tokenizer>> {
        Err(anyhow!("grammar unavailable"))
    }
}

/// Client capabilities with the workspace features the session looks at
#[allow(dead_code)]
pub fn capabilities(configuration: bool, dynamic_registration: bool) -> ClientCapabilities {
    ClientCapabilities {
        workspace: Some(WorkspaceClientCapabilities {
            configuration: Some(configuration),
            did_change_configuration: Some(DynamicRegistrationClientCapabilities {
                dynamic_registration: Some(dynamic_registration),
            }),
            workspace_folders: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Coordinator wired to `client` for every collaborator
pub fn coordinator(client: &Arc<FakeClient>, capabilities: ClientCapabilities) -> SessionCoordinator {
    let params = InitializeParams {
        capabilities,
        ..Default::default()
    };
    SessionCoordinator::new(&params, SessionClient::from_client(Arc::clone(client)), None)
}

#[allow(dead_code)]
pub fn uri(name: &str) -> Url {
    Url::parse(&format!("file:///{}", name)).unwrap()
}

#[allow(dead_code)]
pub fn open_params(uri: &Url, version: i32, text: &str) -> DidOpenTextDocumentParams {
    DidOpenTextDocumentParams {
        text_document: TextDocumentItem {
            uri: uri.clone(),
            language_id: "nwscript".to_string(),
            version,
            text: text.to_string(),
        },
    }
}

#[allow(dead_code)]
pub fn save_params(uri: &Url) -> DidSaveTextDocumentParams {
    DidSaveTextDocumentParams {
        text_document: TextDocumentIdentifier { uri: uri.clone() },
        text: None,
    }
}

//! Session coordination
//!
//! One [`SessionCoordinator`] per client connection. It sequences startup
//! (capabilities → tokenizer → providers → event subscription → `up`) and
//! routes document events so that diagnostics are never published before the
//! tokenizer is ready, nor before configuration has loaded once.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::Duration;

use tokio::sync::RwLock;
use tower_lsp::lsp_types::{
    InitializeParams, Registration, ServerCapabilities, Url, WorkspaceFoldersChangeEvent,
};

use super::capabilities::CapabilitiesNegotiator;
use super::configuration::{ConfigurationSource, ConfigurationState};
use super::diagnostics::{
    DiagnosticsAnalyzer, DiagnosticsProvider, DiagnosticsPublishQueue, DiagnosticsSink, Schedule,
    TokenAnalyzer,
};
use super::document::DocumentStateStore;
use super::events::{DocumentEvent, LiveDocumentEventBus};
use super::workspace::WorkspaceFileSystem;
use crate::error::ConfigError;
use crate::parser::{Tokenizer, TokenizerLoader};
use crate::providers::{ProviderContext, Providers};

const CONFIGURATION_REGISTRATION_ID: &str = "nwscript-ls-configuration";
const DID_CHANGE_CONFIGURATION: &str = "workspace/didChangeConfiguration";

/// Dynamic capability registration on the client
#[tower_lsp::async_trait]
pub trait CapabilityRegistrar: Send + Sync {
    async fn register_capability(&self, registrations: Vec<Registration>) -> anyhow::Result<()>;
}

/// Tokenizer readiness
#[derive(Clone, Default)]
pub enum TokenizerState {
    #[default]
    Uninitialized,
    Loading,
    Ready(Arc<dyn Tokenizer>),
    /// Load failed; document features stay disabled for the session
    Failed(String),
}

impl TokenizerState {
    pub fn is_ready(&self) -> bool {
        matches!(self, TokenizerState::Ready(_))
    }
}

impl fmt::Debug for TokenizerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenizerState::Uninitialized => write!(f, "Uninitialized"),
            TokenizerState::Loading => write!(f, "Loading"),
            TokenizerState::Ready(_) => write!(f, "Ready"),
            TokenizerState::Failed(reason) => write!(f, "Failed({})", reason),
        }
    }
}

/// Per-connection state
pub struct Session {
    pub capabilities: CapabilitiesNegotiator,
    pub config: Arc<ConfigurationState>,
    pub documents: Arc<DocumentStateStore>,
    pub live_documents: Arc<LiveDocumentEventBus>,
    pub publish_queue: DiagnosticsPublishQueue,
    pub workspace: RwLock<WorkspaceFileSystem>,
    tokenizer: RwLock<TokenizerState>,
    open_documents: Mutex<HashSet<Url>>,
}

impl Session {
    fn open_documents(&self) -> MutexGuard<'_, HashSet<Url>> {
        self.open_documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_open(&self, uri: &Url) -> bool {
        self.open_documents().contains(uri)
    }

    pub fn open_document_count(&self) -> usize {
        self.open_documents().len()
    }
}

/// Client-facing collaborators of a session
#[derive(Clone)]
pub struct SessionClient {
    pub configuration: Arc<dyn ConfigurationSource>,
    pub diagnostics: Arc<dyn DiagnosticsSink>,
    pub registrar: Arc<dyn CapabilityRegistrar>,
}

impl SessionClient {
    /// Use one client object for every collaborator
    pub fn from_client<C>(client: Arc<C>) -> Self
    where
        C: ConfigurationSource + DiagnosticsSink + CapabilityRegistrar + 'static,
    {
        Self {
            configuration: client.clone(),
            diagnostics: client.clone(),
            registrar: client,
        }
    }
}

pub struct SessionCoordinator {
    session: Session,
    client: SessionClient,
    analyzer: Arc<dyn DiagnosticsAnalyzer>,
    providers: OnceLock<Arc<Providers>>,
    configuration_listener: AtomicBool,
    folder_tracking: AtomicBool,
}

impl SessionCoordinator {
    /// Step 1 of startup: negotiate capabilities. Never fails.
    pub fn new(
        params: &InitializeParams,
        client: SessionClient,
        config_timeout: Option<Duration>,
    ) -> Self {
        let capabilities = CapabilitiesNegotiator::new(&params.capabilities);
        log::debug!("Client support: {:?}", capabilities.client());

        Self {
            session: Session {
                capabilities,
                config: Arc::new(ConfigurationState::new(config_timeout)),
                documents: Arc::new(DocumentStateStore::new()),
                live_documents: Arc::new(LiveDocumentEventBus::new()),
                publish_queue: DiagnosticsPublishQueue::new(),
                workspace: RwLock::new(WorkspaceFileSystem::from_params(params)),
                tokenizer: RwLock::new(TokenizerState::Uninitialized),
                open_documents: Mutex::new(HashSet::new()),
            },
            client,
            analyzer: Arc::new(TokenAnalyzer),
            providers: OnceLock::new(),
            configuration_listener: AtomicBool::new(false),
            folder_tracking: AtomicBool::new(false),
        }
    }

    /// Replace the default diagnostics analyzer. Only effective before
    /// [`Self::initialize`] registers the providers.
    pub fn with_analyzer(mut self, analyzer: Arc<dyn DiagnosticsAnalyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn capabilities(&self) -> &ServerCapabilities {
        self.session.capabilities.capabilities()
    }

    pub async fn tokenizer_state(&self) -> TokenizerState {
        self.session.tokenizer.read().await.clone()
    }

    /// Registered providers; `None` until the tokenizer is ready
    pub fn providers(&self) -> Option<Arc<Providers>> {
        self.providers.get().cloned()
    }

    pub fn is_configuration_loaded(&self) -> bool {
        self.session.config.is_loaded()
    }

    pub fn has_configuration_listener(&self) -> bool {
        self.configuration_listener.load(Ordering::Acquire)
    }

    /// Steps 2–4 of startup: load the tokenizer, register providers, then
    /// subscribe to live document events. A tokenizer failure leaves the
    /// session in no-op mode instead of failing.
    pub async fn initialize(&self, loader: &dyn TokenizerLoader) {
        {
            let mut state = self.session.tokenizer.write().await;
            if !matches!(*state, TokenizerState::Uninitialized) {
                log::warn!("Session already initialized ({:?})", *state);
                return;
            }
            *state = TokenizerState::Loading;
        }

        match loader.load().await {
            Ok(tokenizer) => {
                // Providers exist before any event can observe `Ready`
                self.register_providers(Arc::clone(&tokenizer));
                *self.session.tokenizer.write().await = TokenizerState::Ready(tokenizer);
            }
            Err(e) => {
                log::error!("Tokenizer failed to load, document features disabled: {:#}", e);
                *self.session.tokenizer.write().await = TokenizerState::Failed(e.to_string());
            }
        }

        self.session.live_documents.subscribe();
    }

    fn register_providers(&self, tokenizer: Arc<dyn Tokenizer>) {
        let context = ProviderContext {
            documents: Arc::clone(&self.session.documents),
            live: Arc::clone(&self.session.live_documents),
            tokenizer,
            config: Arc::clone(&self.session.config),
        };
        let providers = Providers::register(
            &context,
            Arc::clone(&self.analyzer),
            Arc::clone(&self.client.diagnostics),
        );

        if self.providers.set(Arc::new(providers)).is_err() {
            log::warn!("Providers were already registered");
        }
    }

    /// Step 5: register workspace and configuration listeners, then load the
    /// configuration once. Diagnostics deferred so far are flushed only when
    /// that load succeeds.
    pub async fn up(&self) -> Result<(), ConfigError> {
        self.register_workspace().await;

        if self.session.capabilities.supports_workspace_configuration() {
            self.register_configuration_listener().await;
        } else {
            log::info!("Client does not support workspace/configuration, using defaults");
        }

        self.load_configuration().await
    }

    pub fn down(&self) {
        log::info!(
            "Session shutting down with {} open document(s)",
            self.session.open_document_count()
        );
    }

    async fn register_workspace(&self) {
        let workspace = self.session.workspace.read().await;
        log::info!(
            "Workspace root: {}",
            workspace
                .root()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<none>".to_string())
        );

        if self.session.capabilities.supports_workspace_folders() {
            self.folder_tracking.store(true, Ordering::Release);
        }
    }

    async fn register_configuration_listener(&self) {
        self.configuration_listener.store(true, Ordering::Release);

        if !self
            .session
            .capabilities
            .supports_configuration_change_registration()
        {
            return;
        }

        let registration = Registration {
            id: CONFIGURATION_REGISTRATION_ID.to_string(),
            method: DID_CHANGE_CONFIGURATION.to_string(),
            register_options: None,
        };
        if let Err(e) = self
            .client
            .registrar
            .register_capability(vec![registration])
            .await
        {
            log::warn!("Failed to register configuration listener: {:#}", e);
        }
    }

    /// Client reported a configuration change. Ignored unless the listener
    /// was registered in [`Self::up`].
    pub async fn reload_configuration(&self) -> Result<(), ConfigError> {
        if !self.has_configuration_listener() {
            log::debug!("Configuration change ignored: no listener registered");
            return Ok(());
        }
        self.load_configuration().await
    }

    async fn load_configuration(&self) -> Result<(), ConfigError> {
        self.session
            .config
            .load(self.client.configuration.as_ref())
            .await?;

        let pending = self.session.publish_queue.open(self.session.config.loaded());
        if let Some(providers) = self.providers() {
            providers
                .diagnostics
                .process_documents_waiting_for_publish(pending)
                .await;
        }
        Ok(())
    }

    pub async fn workspace_folders_changed(&self, event: &WorkspaceFoldersChangeEvent) {
        if !self.folder_tracking.load(Ordering::Acquire) {
            return;
        }
        self.session.workspace.write().await.apply_folder_change(event);
    }

    /// Route one document event. Events are dropped, without error, unless
    /// the tokenizer is ready.
    pub async fn dispatch(&self, event: DocumentEvent) {
        let tokenizer = match &*self.session.tokenizer.read().await {
            TokenizerState::Ready(tokenizer) => Arc::clone(tokenizer),
            state => {
                log::debug!("Tokenizer {:?}, dropping event for {}", state, event.uri());
                return;
            }
        };

        match event {
            DocumentEvent::Opened(handle) => {
                let workspace = self.session.workspace.read().await;
                self.session
                    .documents
                    .create_document(
                        handle.uri.clone(),
                        Arc::clone(&handle.text),
                        handle.version,
                        tokenizer.as_ref(),
                        &workspace,
                    )
                    .await;
                drop(workspace);

                self.session.open_documents().insert(handle.uri.clone());
                self.request_publish(&handle.uri).await;
            }
            DocumentEvent::WillSave(handle) => {
                let workspace = self.session.workspace.read().await;
                self.session
                    .documents
                    .update_document(&handle, tokenizer.as_ref(), &workspace)
                    .await;
            }
            DocumentEvent::DidSave(uri) => {
                self.request_publish(&uri).await;
            }
            DocumentEvent::Closed(uri) => {
                self.session.documents.remove(&uri).await;
                self.session.open_documents().remove(&uri);
                self.session.publish_queue.forget(&uri);

                if self.is_configuration_loaded()
                    && let Some(providers) = self.providers()
                {
                    providers.diagnostics.clear(&uri).await;
                }
            }
        }
    }

    /// Publish now when configuration has loaded, otherwise defer
    async fn request_publish(&self, uri: &Url) {
        let Some(providers) = self.providers() else {
            return;
        };

        match self
            .session
            .publish_queue
            .schedule(uri, self.session.config.loaded())
        {
            Schedule::PublishNow => providers.diagnostics.publish(uri).await,
            Schedule::Deferred => {
                log::debug!("Configuration not loaded yet, deferring {}", uri);
            }
        }
    }
}

use std::sync::{Arc, OnceLock};

use tower_lsp::jsonrpc::{Error as LspError, Result as LspResult};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::config::ServerOptions;
use crate::core::session::{SessionClient, SessionCoordinator, TokenizerState};
use crate::lsp::handlers::{
    HandleCompletion, HandleDefinition, HandleFormatting, HandleHover, HandleSignatureHelp,
};
use crate::providers::Providers;

/// The LSP backend: translates protocol traffic into session calls
pub struct Backend {
    pub client: Client,
    pub options: ServerOptions,
    session: OnceLock<Arc<SessionCoordinator>>,
}

impl Backend {
    pub fn new(client: Client, options: ServerOptions) -> Self {
        Self {
            client,
            options,
            session: OnceLock::new(),
        }
    }

    /// The session, once `initialize` has been received
    pub fn coordinator(&self) -> Option<&Arc<SessionCoordinator>> {
        self.session.get()
    }

    pub(crate) fn providers(&self) -> Option<Arc<Providers>> {
        self.coordinator()?.providers()
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> LspResult<InitializeResult> {
        let coordinator = Arc::new(SessionCoordinator::new(
            &params,
            SessionClient::from_client(Arc::new(self.client.clone())),
            self.options.config_timeout,
        ));
        if self.session.set(Arc::clone(&coordinator)).is_err() {
            return Err(LspError::invalid_request());
        }

        coordinator
            .initialize(&self.options.grammar_loader())
            .await;

        if let TokenizerState::Failed(reason) = coordinator.tokenizer_state().await {
            self.client
                .log_message(
                    MessageType::ERROR,
                    format!("NWScript grammar failed to load: {}", reason),
                )
                .await;
        }

        Ok(InitializeResult {
            capabilities: coordinator.capabilities().clone(),
            server_info: Some(ServerInfo {
                name: "nwscript-ls".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        let Some(coordinator) = self.coordinator() else {
            return;
        };

        if let Err(e) = coordinator.up().await {
            log::warn!("Failed to load configuration: {}", e);
            self.client
                .log_message(
                    MessageType::WARNING,
                    format!("Failed to load nwscript-ee-lsp configuration: {}", e),
                )
                .await;
            return;
        }

        self.client
            .log_message(MessageType::INFO, "nwscript-language-server initialized")
            .await;
    }

    async fn shutdown(&self) -> LspResult<()> {
        if let Some(coordinator) = self.coordinator() {
            coordinator.down();
        }
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let Some(coordinator) = self.coordinator() else {
            return;
        };
        if let Some(event) = coordinator.session().live_documents.did_open(params) {
            coordinator.dispatch(event).await;
        }
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        if let Some(coordinator) = self.coordinator() {
            coordinator.session().live_documents.did_change(params);
        }
    }

    async fn will_save(&self, params: WillSaveTextDocumentParams) {
        let Some(coordinator) = self.coordinator() else {
            return;
        };
        if let Some(event) = coordinator.session().live_documents.will_save(params) {
            coordinator.dispatch(event).await;
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let Some(coordinator) = self.coordinator() else {
            return;
        };
        if let Some(event) = coordinator.session().live_documents.did_save(params) {
            coordinator.dispatch(event).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let Some(coordinator) = self.coordinator() else {
            return;
        };
        if let Some(event) = coordinator.session().live_documents.did_close(params) {
            coordinator.dispatch(event).await;
        }
    }

    async fn did_change_configuration(&self, _: DidChangeConfigurationParams) {
        let Some(coordinator) = self.coordinator() else {
            return;
        };
        if let Err(e) = coordinator.reload_configuration().await {
            log::warn!("Failed to reload configuration: {}", e);
            self.client
                .log_message(
                    MessageType::WARNING,
                    format!("Failed to reload nwscript-ee-lsp configuration: {}", e),
                )
                .await;
        }
    }

    async fn did_change_workspace_folders(&self, params: DidChangeWorkspaceFoldersParams) {
        if let Some(coordinator) = self.coordinator() {
            coordinator.workspace_folders_changed(&params.event).await;
        }
    }

    async fn hover(&self, params: HoverParams) -> LspResult<Option<Hover>> {
        self.handle_hover(params).await
    }

    async fn completion(&self, params: CompletionParams) -> LspResult<Option<CompletionResponse>> {
        self.handle_completion(params).await
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> LspResult<Option<GotoDefinitionResponse>> {
        self.handle_definition(params).await
    }

    async fn signature_help(&self, params: SignatureHelpParams) -> LspResult<Option<SignatureHelp>> {
        self.handle_signature_help(params).await
    }

    async fn formatting(&self, params: DocumentFormattingParams) -> LspResult<Option<Vec<TextEdit>>> {
        self.handle_formatting(params).await
    }

    async fn range_formatting(
        &self,
        params: DocumentRangeFormattingParams,
    ) -> LspResult<Option<Vec<TextEdit>>> {
        self.handle_range_formatting(params).await
    }
}

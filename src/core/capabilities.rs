//! Capability negotiation
//!
//! Reads the client's declared capabilities once, at initialize, and derives
//! both the server capabilities we advertise and the client features the
//! session depends on. Absent fields mean "unsupported".

use tower_lsp::lsp_types::{
    ClientCapabilities, CompletionOptions, HoverProviderCapability, OneOf, SaveOptions,
    ServerCapabilities, SignatureHelpOptions, TextDocumentSyncCapability, TextDocumentSyncKind,
    TextDocumentSyncOptions, TextDocumentSyncSaveOptions, WorkspaceFoldersServerCapabilities,
    WorkspaceServerCapabilities,
};

/// Client features the session cares about
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientSupport {
    /// `workspace/configuration` requests are answered
    pub workspace_configuration: bool,
    /// `workspace/didChangeConfiguration` can be registered dynamically
    pub configuration_change_registration: bool,
    pub workspace_folders: bool,
}

impl ClientSupport {
    fn from_client(capabilities: &ClientCapabilities) -> Self {
        let workspace = capabilities.workspace.as_ref();

        Self {
            workspace_configuration: workspace
                .and_then(|w| w.configuration)
                .unwrap_or(false),
            configuration_change_registration: workspace
                .and_then(|w| w.did_change_configuration.as_ref())
                .and_then(|d| d.dynamic_registration)
                .unwrap_or(false),
            workspace_folders: workspace
                .and_then(|w| w.workspace_folders)
                .unwrap_or(false),
        }
    }
}

/// Static capability description for one connection
#[derive(Debug, Clone)]
pub struct CapabilitiesNegotiator {
    client: ClientSupport,
    capabilities: ServerCapabilities,
}

impl CapabilitiesNegotiator {
    pub fn new(client_capabilities: &ClientCapabilities) -> Self {
        let client = ClientSupport::from_client(client_capabilities);

        Self {
            capabilities: server_capabilities(&client),
            client,
        }
    }

    /// Capabilities advertised in the initialize response
    pub fn capabilities(&self) -> &ServerCapabilities {
        &self.capabilities
    }

    pub fn client(&self) -> ClientSupport {
        self.client
    }

    /// Whether the server may pull configuration from the client
    pub fn supports_workspace_configuration(&self) -> bool {
        self.client.workspace_configuration
    }

    pub fn supports_configuration_change_registration(&self) -> bool {
        self.client.configuration_change_registration
    }

    pub fn supports_workspace_folders(&self) -> bool {
        self.client.workspace_folders
    }
}

fn server_capabilities(client: &ClientSupport) -> ServerCapabilities {
    let workspace = client
        .workspace_folders
        .then(|| WorkspaceServerCapabilities {
            workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                supported: Some(true),
                change_notifications: Some(OneOf::Left(true)),
            }),
            file_operations: None,
        });

    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::FULL),
                will_save: Some(true),
                will_save_wait_until: None,
                save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                    include_text: Some(false),
                })),
            },
        )),
        completion_provider: Some(CompletionOptions {
            resolve_provider: Some(false),
            trigger_characters: Some(vec![".".to_string()]),
            ..Default::default()
        }),
        hover_provider: Some(HoverProviderCapability::Simple(true)),
        definition_provider: Some(OneOf::Left(true)),
        signature_help_provider: Some(SignatureHelpOptions {
            trigger_characters: Some(vec!["(".to_string(), ",".to_string()]),
            retrigger_characters: None,
            work_done_progress_options: Default::default(),
        }),
        document_formatting_provider: Some(OneOf::Left(true)),
        document_range_formatting_provider: Some(OneOf::Left(true)),
        workspace,
        ..Default::default()
    }
}

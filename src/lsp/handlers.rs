use tower_lsp::jsonrpc::Result as LspResult;
use tower_lsp::lsp_types::*;

use crate::lsp::backend::Backend;

/// Trait for handling hover requests
#[tower_lsp::async_trait]
pub trait HandleHover {
    async fn handle_hover(&self, params: HoverParams) -> LspResult<Option<Hover>>;
}

/// Trait for handling completion requests
#[tower_lsp::async_trait]
pub trait HandleCompletion {
    async fn handle_completion(
        &self,
        params: CompletionParams,
    ) -> LspResult<Option<CompletionResponse>>;
}

/// Trait for handling go-to-definition requests
#[tower_lsp::async_trait]
pub trait HandleDefinition {
    async fn handle_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> LspResult<Option<GotoDefinitionResponse>>;
}

/// Trait for handling signature help requests
#[tower_lsp::async_trait]
pub trait HandleSignatureHelp {
    async fn handle_signature_help(
        &self,
        params: SignatureHelpParams,
    ) -> LspResult<Option<SignatureHelp>>;
}

/// Trait for handling whole-document and range formatting
#[tower_lsp::async_trait]
pub trait HandleFormatting {
    async fn handle_formatting(
        &self,
        params: DocumentFormattingParams,
    ) -> LspResult<Option<Vec<TextEdit>>>;

    async fn handle_range_formatting(
        &self,
        params: DocumentRangeFormattingParams,
    ) -> LspResult<Option<Vec<TextEdit>>>;
}

// Requests arriving before the tokenizer is ready, or after it failed, get an
// empty answer rather than an error.

#[tower_lsp::async_trait]
impl HandleHover for Backend {
    async fn handle_hover(&self, params: HoverParams) -> LspResult<Option<Hover>> {
        let Some(providers) = self.providers() else {
            return Ok(None);
        };
        let tdpp = params.text_document_position_params;
        Ok(providers
            .hover
            .hover(&tdpp.text_document.uri, tdpp.position)
            .await)
    }
}

#[tower_lsp::async_trait]
impl HandleCompletion for Backend {
    async fn handle_completion(
        &self,
        params: CompletionParams,
    ) -> LspResult<Option<CompletionResponse>> {
        let Some(providers) = self.providers() else {
            return Ok(None);
        };
        let position = params.text_document_position;
        Ok(providers
            .completion
            .complete(&position.text_document.uri, position.position)
            .await
            .map(CompletionResponse::Array))
    }
}

#[tower_lsp::async_trait]
impl HandleDefinition for Backend {
    async fn handle_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> LspResult<Option<GotoDefinitionResponse>> {
        let Some(providers) = self.providers() else {
            return Ok(None);
        };
        let tdpp = params.text_document_position_params;
        Ok(providers
            .definition
            .definition(&tdpp.text_document.uri, tdpp.position)
            .await
            .map(GotoDefinitionResponse::Scalar))
    }
}

#[tower_lsp::async_trait]
impl HandleSignatureHelp for Backend {
    async fn handle_signature_help(
        &self,
        params: SignatureHelpParams,
    ) -> LspResult<Option<SignatureHelp>> {
        let Some(providers) = self.providers() else {
            return Ok(None);
        };
        let tdpp = params.text_document_position_params;
        Ok(providers
            .signature_help
            .signature_help(&tdpp.text_document.uri, tdpp.position)
            .await)
    }
}

#[tower_lsp::async_trait]
impl HandleFormatting for Backend {
    async fn handle_formatting(
        &self,
        params: DocumentFormattingParams,
    ) -> LspResult<Option<Vec<TextEdit>>> {
        let Some(providers) = self.providers() else {
            return Ok(None);
        };
        Ok(providers.formatting.format(&params.text_document.uri).await)
    }

    async fn handle_range_formatting(
        &self,
        params: DocumentRangeFormattingParams,
    ) -> LspResult<Option<Vec<TextEdit>>> {
        let Some(providers) = self.providers() else {
            return Ok(None);
        };
        Ok(providers
            .range_formatting
            .format_range(&params.text_document.uri, params.range)
            .await)
    }
}

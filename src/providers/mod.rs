//! Content providers
//!
//! Each provider is built from the narrow [`ProviderContext`] handed out
//! once the tokenizer is ready; none of them can reach the session itself.

pub mod completion;
pub mod definition;
pub mod formatting;
pub mod hover;
pub mod signature_help;

use std::sync::Arc;

use tower_lsp::lsp_types::Position;

use crate::core::configuration::ConfigurationState;
use crate::core::diagnostics::{DiagnosticsAnalyzer, DiagnosticsProvider, DiagnosticsSink};
use crate::core::document::DocumentStateStore;
use crate::core::events::LiveDocumentEventBus;
use crate::parser::{Location, Tokenizer};

pub use completion::CompletionProvider;
pub use definition::DefinitionProvider;
pub use formatting::{FormattingProvider, RangeFormattingProvider};
pub use hover::HoverProvider;
pub use signature_help::SignatureHelpProvider;

/// What providers may depend on
#[derive(Clone)]
pub struct ProviderContext {
    /// Tokenized state, refreshed on open and will-save
    pub documents: Arc<DocumentStateStore>,
    /// Text as last synchronized by the client
    pub live: Arc<LiveDocumentEventBus>,
    pub tokenizer: Arc<dyn Tokenizer>,
    pub config: Arc<ConfigurationState>,
}

/// Every provider registered for a session
pub struct Providers {
    pub completion: CompletionProvider,
    pub definition: DefinitionProvider,
    pub hover: HoverProvider,
    pub signature_help: SignatureHelpProvider,
    pub formatting: FormattingProvider,
    pub range_formatting: RangeFormattingProvider,
    pub diagnostics: Arc<DiagnosticsProvider>,
}

impl Providers {
    pub fn register(
        context: &ProviderContext,
        analyzer: Arc<dyn DiagnosticsAnalyzer>,
        sink: Arc<dyn DiagnosticsSink>,
    ) -> Self {
        let providers = Self {
            completion: CompletionProvider::new(
                Arc::clone(&context.documents),
                Arc::clone(&context.tokenizer),
                Arc::clone(&context.config),
            ),
            definition: DefinitionProvider::new(Arc::clone(&context.documents)),
            hover: HoverProvider::new(
                Arc::clone(&context.documents),
                Arc::clone(&context.config),
            ),
            signature_help: SignatureHelpProvider::new(Arc::clone(&context.documents)),
            formatting: FormattingProvider::new(
                Arc::clone(&context.live),
                Arc::clone(&context.config),
            ),
            range_formatting: RangeFormattingProvider::new(
                Arc::clone(&context.live),
                Arc::clone(&context.config),
            ),
            diagnostics: Arc::new(DiagnosticsProvider::new(
                Arc::clone(&context.documents),
                Arc::clone(&context.config),
                analyzer,
                sink,
            )),
        };

        log::debug!("Registered completion, definition, hover, signature help, formatting and diagnostics providers");
        providers
    }
}

pub(crate) fn to_location(position: Position) -> Location {
    Location::new(position.line, position.character)
}

pub(crate) fn to_position(location: Location) -> Position {
    Position::new(location.line, location.column)
}

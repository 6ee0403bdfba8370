//! Core Session Logic
//!
//! Capability negotiation, document state, configuration, diagnostics
//! gating and the coordinator that sequences them.

pub mod capabilities;
pub mod configuration;
pub mod diagnostics;
pub mod document;
pub mod events;
pub mod session;
pub mod workspace;

pub use capabilities::{CapabilitiesNegotiator, ClientSupport};
pub use configuration::{ConfigurationSource, ConfigurationState, ServerConfiguration};
pub use diagnostics::{
    DiagnosticsAnalyzer, DiagnosticsProvider, DiagnosticsPublishQueue, DiagnosticsSink,
    TokenAnalyzer,
};
pub use document::{Document, DocumentStateStore};
pub use events::{DocumentEvent, DocumentHandle, LiveDocumentEventBus};
pub use session::{CapabilityRegistrar, Session, SessionClient, SessionCoordinator, TokenizerState};
pub use workspace::WorkspaceFileSystem;

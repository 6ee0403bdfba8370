//! Session collaborators backed by the connected client

use serde_json::Value;
use tower_lsp::lsp_types::{ConfigurationItem, Diagnostic, Registration, Url};
use tower_lsp::Client;

use crate::core::configuration::ConfigurationSource;
use crate::core::diagnostics::DiagnosticsSink;
use crate::core::session::CapabilityRegistrar;
use crate::error::ConfigError;

#[tower_lsp::async_trait]
impl ConfigurationSource for Client {
    async fn get_configuration(&self, section: &str) -> Result<Value, ConfigError> {
        let items = vec![ConfigurationItem {
            scope_uri: None,
            section: Some(section.to_string()),
        }];

        let mut values = self
            .configuration(items)
            .await
            .map_err(|e| ConfigError::Fetch(e.to_string()))?;

        Ok(values.pop().unwrap_or(Value::Null))
    }
}

#[tower_lsp::async_trait]
impl DiagnosticsSink for Client {
    async fn publish_diagnostics(
        &self,
        uri: Url,
        diagnostics: Vec<Diagnostic>,
        version: Option<i32>,
    ) {
        Client::publish_diagnostics(self, uri, diagnostics, version).await;
    }
}

#[tower_lsp::async_trait]
impl CapabilityRegistrar for Client {
    async fn register_capability(&self, registrations: Vec<Registration>) -> anyhow::Result<()> {
        Client::register_capability(self, registrations)
            .await
            .map_err(|e| anyhow::anyhow!("client/registerCapability failed: {}", e))
    }
}

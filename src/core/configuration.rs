//! Workspace configuration
//!
//! The client-side settings for the `nwscript-ee-lsp` namespace. Reloads are
//! merged shallowly per section so keys missing from an update keep their
//! previous value.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::error::ConfigError;

/// Namespace requested with `workspace/configuration`
pub const CONFIGURATION_SECTION: &str = "nwscript-ee-lsp";

fn default_true() -> bool {
    true
}

fn default_tab_size() -> u32 {
    2
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionConfig {
    #[serde(default = "default_true")]
    pub add_parenthesis: bool,
    #[serde(default)]
    pub add_params_to_functions: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            add_parenthesis: true,
            add_params_to_functions: false,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoveringConfig {
    #[serde(default = "default_true")]
    pub add_comments_to_functions: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for HoveringConfig {
    fn default() -> Self {
        Self {
            add_comments_to_functions: true,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatterConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_tab_size")]
    pub tab_size: u32,
    #[serde(default = "default_true")]
    pub insert_final_newline: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            tab_size: default_tab_size(),
            insert_final_newline: true,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub report_warnings: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            report_warnings: true,
            extra: Map::new(),
        }
    }
}

/// Effective client configuration
///
/// ```
/// use nwscript_language_server::core::configuration::ServerConfiguration;
/// use serde_json::json;
///
/// let mut config = ServerConfiguration::default();
/// config.merge(json!({ "compiler": { "strict": true } }));
/// let rejected = config.merge(json!({ "compiler": { "reportWarnings": false, "enabled": null } }));
///
/// assert!(!config.compiler.report_warnings);
/// assert!(config.compiler.enabled);
/// assert_eq!(config.compiler.extra["strict"], json!(true));
/// assert_eq!(rejected.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfiguration {
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub hovering: HoveringConfig,
    #[serde(default)]
    pub formatter: FormatterConfig,
    #[serde(default)]
    pub compiler: CompilerConfig,
    /// Free-form top-level options
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl ServerConfiguration {
    /// Merge a client update. Known sections merge key by key; other
    /// top-level keys overwrite their previous value. A non-object update is
    /// an empty update.
    ///
    /// A key whose value does not fit its section is skipped and keeps its
    /// previous value; the skipped keys are returned.
    pub fn merge(&mut self, update: Value) -> Vec<ConfigError> {
        let Value::Object(mut update) = update else {
            return Vec::new();
        };

        let mut rejected = Vec::new();
        let mut section = |name: &str| update.remove(name).map(|value| (name.to_string(), value));

        let completion = section("completion");
        let hovering = section("hovering");
        let formatter = section("formatter");
        let compiler = section("compiler");
        merge_section(&mut self.completion, completion, &mut rejected);
        merge_section(&mut self.hovering, hovering, &mut rejected);
        merge_section(&mut self.formatter, formatter, &mut rejected);
        merge_section(&mut self.compiler, compiler, &mut rejected);
        self.options.extend(update);

        rejected
    }
}

fn merge_section<T>(section: &mut T, update: Option<(String, Value)>, rejected: &mut Vec<ConfigError>)
where
    T: Serialize + DeserializeOwned,
{
    let Some((name, Value::Object(update))) = update else {
        return;
    };

    let mut merged = match serde_json::to_value(&*section) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };

    // One key at a time, so a bad value only costs that key
    for (key, value) in update {
        let mut candidate = merged.clone();
        candidate.insert(key.clone(), value);

        match serde_json::from_value::<T>(Value::Object(candidate.clone())) {
            Ok(next) => {
                *section = next;
                merged = candidate;
            }
            Err(source) => rejected.push(ConfigError::Invalid {
                key: format!("{}.{}", name, key),
                source,
            }),
        }
    }
}

/// Where configuration comes from (the client, in production)
#[tower_lsp::async_trait]
pub trait ConfigurationSource: Send + Sync {
    async fn get_configuration(&self, section: &str) -> Result<Value, ConfigError>;
}

/// Monotonic false → true latch
#[derive(Debug, Default)]
pub struct LoadedFlag(AtomicBool);

impl LoadedFlag {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Set the latch; true only for the call that flipped it
    pub(crate) fn set(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }
}

/// Last loaded configuration plus the configuration-loaded latch
#[derive(Debug, Default)]
pub struct ConfigurationState {
    current: RwLock<ServerConfiguration>,
    loaded: LoadedFlag,
    timeout: Option<Duration>,
}

impl ConfigurationState {
    /// `timeout` bounds each fetch; `None` waits forever
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    pub fn loaded(&self) -> &LoadedFlag {
        &self.loaded
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_set()
    }

    pub async fn snapshot(&self) -> ServerConfiguration {
        self.current.read().await.clone()
    }

    /// Fetch the namespace from `source` and merge it. Only a failed or
    /// timed out fetch is an error; values that do not fit are logged and
    /// skipped. The latch is not touched here.
    pub async fn load(&self, source: &dyn ConfigurationSource) -> Result<(), ConfigError> {
        let fetch = source.get_configuration(CONFIGURATION_SECTION);

        let update = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .map_err(|_| ConfigError::Timeout(limit))??,
            None => fetch.await?,
        };

        log::debug!("Merging configuration update: {}", update);
        let rejected = self.current.write().await.merge(update);
        for error in rejected {
            log::warn!("Ignoring configuration value: {}", error);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = ServerConfiguration::default();
        assert!(config.completion.add_parenthesis);
        assert!(!config.formatter.enabled);
        assert_eq!(config.formatter.tab_size, 2);
        assert!(config.compiler.enabled);
    }

    #[test]
    fn test_omitted_sections_and_keys_are_kept() {
        let mut config = ServerConfiguration::default();
        config.merge(json!({ "formatter": { "enabled": true, "tabSize": 4 } }));
        config.merge(json!({ "formatter": { "tabSize": 8 } }));

        assert!(config.formatter.enabled);
        assert_eq!(config.formatter.tab_size, 8);
        assert_eq!(config.hovering, HoveringConfig::default());
    }

    #[test]
    fn test_top_level_options_merge() {
        let mut config = ServerConfiguration::default();
        config.merge(json!({ "trace": "verbose", "nwnHome": "/nwn" }));
        config.merge(json!({ "trace": "off" }));

        assert_eq!(config.options["trace"], json!("off"));
        assert_eq!(config.options["nwnHome"], json!("/nwn"));
    }

    #[test]
    fn test_null_update_is_empty() {
        let mut config = ServerConfiguration::default();
        assert!(config.merge(Value::Null).is_empty());
        assert_eq!(config, ServerConfiguration::default());
    }

    #[test]
    fn test_invalid_value_skips_only_that_key() {
        let mut config = ServerConfiguration::default();
        config.merge(json!({ "completion": { "addParenthesis": false } }));

        let rejected = config.merge(json!({
            "completion": { "addParamsToFunctions": true },
            "compiler": { "enabled": "yes", "reportWarnings": false }
        }));

        assert_eq!(rejected.len(), 1);
        assert!(matches!(&rejected[0], ConfigError::Invalid { key, .. } if key == "compiler.enabled"));
        assert!(!config.completion.add_parenthesis);
        assert!(config.completion.add_params_to_functions);
        // Previous value kept, sibling keys applied
        assert!(config.compiler.enabled);
        assert!(!config.compiler.report_warnings);
    }

    #[test]
    fn test_null_for_unset_setting_keeps_default() {
        let mut config = ServerConfiguration::default();
        let rejected = config.merge(json!({
            "formatter": { "tabSize": null, "enabled": true },
            "hovering": { "addCommentsToFunctions": null }
        }));

        assert_eq!(rejected.len(), 2);
        assert_eq!(config.formatter.tab_size, 2);
        assert!(config.formatter.enabled);
        assert!(config.hovering.add_comments_to_functions);
    }

    #[test]
    fn test_disjoint_updates_commute_per_section() {
        let a = json!({ "completion": { "addParenthesis": false } });
        let b = json!({ "completion": { "addParamsToFunctions": true } });

        let mut sequential = ServerConfiguration::default();
        sequential.merge(a.clone());
        sequential.merge(b.clone());

        let mut reversed = ServerConfiguration::default();
        reversed.merge(b);
        reversed.merge(a);

        assert_eq!(sequential.completion, reversed.completion);
    }

    #[test]
    fn test_latch_reports_first_transition_only() {
        let flag = LoadedFlag::default();
        assert!(!flag.is_set());
        assert!(flag.set());
        assert!(!flag.set());
        assert!(flag.is_set());
    }

    struct Hanging;

    #[tower_lsp::async_trait]
    impl ConfigurationSource for Hanging {
        async fn get_configuration(&self, _section: &str) -> Result<Value, ConfigError> {
            std::future::pending().await
        }
    }

    struct Fixed(Value);

    #[tower_lsp::async_trait]
    impl ConfigurationSource for Fixed {
        async fn get_configuration(&self, _section: &str) -> Result<Value, ConfigError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_load_succeeds_despite_bad_values() {
        let state = ConfigurationState::default();
        let update = json!({ "compiler": { "enabled": true, "reportWarnings": null } });

        state.load(&Fixed(update)).await.expect("fetch succeeded");

        assert!(state.snapshot().await.compiler.report_warnings);
    }

    #[tokio::test]
    async fn test_timeout_knob() {
        let state = ConfigurationState::new(Some(Duration::from_millis(20)));
        let result = state.load(&Hanging).await;
        assert!(matches!(result, Err(ConfigError::Timeout(_))));
        assert!(!state.is_loaded());
    }
}

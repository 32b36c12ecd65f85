//! Citizen Dashboard - AI-assisted question answering about a city
//!
//! This crate provides:
//! - A two-panel single-page dashboard (city insights, public services)
//! - A watsonx.ai text-generation backend behind a swappable `Completer` trait
//! - A REST endpoint the page submits questions through

pub mod api;
pub mod provider;
pub mod session;

pub use provider::{Completer, Completion, WatsonxCompleter};
pub use session::{Session, Topic};

use serde::Deserialize;
use thiserror::Error;

/// Environment variable holding the watsonx.ai endpoint URL
pub const ENV_ENDPOINT_URL: &str = "WATSONX_URL";
/// Environment variable holding the IBM Cloud API key
pub const ENV_API_KEY: &str = "WATSONX_APIKEY";
/// Environment variable holding the watsonx.ai project id
pub const ENV_PROJECT_ID: &str = "WATSONX_PROJECT_ID";

/// Configuration for the dashboard server
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Topic-keyed model identifiers
    #[serde(default)]
    pub models: ModelMap,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            models: ModelMap::default(),
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

/// Model identifier per topic panel.
///
/// Both panels currently point at the same granite model; the mapping stays
/// data so the topics can diverge through `config.toml` without touching
/// any call site.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelMap {
    #[serde(default = "default_model")]
    pub insights: String,
    #[serde(default = "default_model")]
    pub services: String,
}

impl Default for ModelMap {
    fn default() -> Self {
        Self {
            insights: default_model(),
            services: default_model(),
        }
    }
}

fn default_model() -> String {
    "ibm/granite-13b-instruct-v2".to_string()
}

impl ModelMap {
    /// Resolve the model identifier for a topic
    pub fn model_for(&self, topic: Topic) -> &str {
        match topic {
            Topic::Insights => &self.insights,
            Topic::Services => &self.services,
        }
    }
}

/// Errors raised while assembling startup configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required credential: set the {0} environment variable")]
    MissingCredential(&'static str),

    #[error("credential {0} is set but empty")]
    EmptyCredential(&'static str),
}

/// Credentials for the hosted completion endpoint.
///
/// All three values are required. They are read once at process start and
/// shared read-only afterwards; a missing or blank value must abort startup
/// before any panel is served.
#[derive(Debug, Clone)]
pub struct WatsonxCredentials {
    pub endpoint_url: String,
    pub api_key: String,
    pub project_id: String,
}

impl WatsonxCredentials {
    /// Read credentials from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &'static str| -> Result<String, ConfigError> {
            let value = lookup(key).ok_or(ConfigError::MissingCredential(key))?;
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyCredential(key));
            }
            Ok(value)
        };

        Ok(Self {
            endpoint_url: get(ENV_ENDPOINT_URL)?,
            api_key: get(ENV_API_KEY)?,
            project_id: get(ENV_PROJECT_ID)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_config_defaults() {
        let config: DashboardConfig = toml::from_str("").unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.models.insights, "ibm/granite-13b-instruct-v2");
        assert_eq!(config.models.services, "ibm/granite-13b-instruct-v2");
    }

    #[test]
    fn test_config_models_can_diverge() {
        let config: DashboardConfig = toml::from_str(
            r#"
            listen_addr = "127.0.0.1:3000"

            [models]
            services = "ibm/granite-20b-multilingual"
            "#,
        )
        .unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:3000");
        assert_eq!(
            config.models.model_for(Topic::Insights),
            "ibm/granite-13b-instruct-v2"
        );
        assert_eq!(
            config.models.model_for(Topic::Services),
            "ibm/granite-20b-multilingual"
        );
    }

    #[test]
    fn test_credentials_complete() {
        let vars = env(&[
            ("WATSONX_URL", "https://us-south.ml.cloud.ibm.com"),
            ("WATSONX_APIKEY", "key"),
            ("WATSONX_PROJECT_ID", "project"),
        ]);
        let credentials = WatsonxCredentials::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(credentials.endpoint_url, "https://us-south.ml.cloud.ibm.com");
        assert_eq!(credentials.project_id, "project");
    }

    #[test]
    fn test_credentials_missing_variable_is_fatal() {
        let vars = env(&[
            ("WATSONX_URL", "https://us-south.ml.cloud.ibm.com"),
            ("WATSONX_PROJECT_ID", "project"),
        ]);
        let err = WatsonxCredentials::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential("WATSONX_APIKEY")));
        assert!(err.to_string().contains("WATSONX_APIKEY"));
    }

    #[test]
    fn test_credentials_blank_variable_is_fatal() {
        let vars = env(&[
            ("WATSONX_URL", "   "),
            ("WATSONX_APIKEY", "key"),
            ("WATSONX_PROJECT_ID", "project"),
        ]);
        let err = WatsonxCredentials::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyCredential("WATSONX_URL")));
    }
}

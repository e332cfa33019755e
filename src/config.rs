use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

/// Endpoint and credential configuration, loadable from a YAML file. Every
/// field has a production default so the binary runs without a config file.
/// Credentials are never stored in the file itself, only the names of the
/// environment variables that hold them.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    pub openlibrary_url: String,
    pub sparql_url: String,
    pub wikidata_rest_url: String,
    pub user_agent: String,
    pub http_timeout_secs: u64,
    /// Environment variable holding the Open Library session cookie.
    pub ol_session_env: String,
    /// Environment variable holding the Wikidata OAuth access token.
    pub wikidata_token_env: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            openlibrary_url: "https://openlibrary.org".to_string(),
            sparql_url: "https://query.wikidata.org/sparql".to_string(),
            wikidata_rest_url: "https://www.wikidata.org/w/rest.php/wikibase/v1".to_string(),
            user_agent: format!("ol-wikidata-sync/{}", env!("CARGO_PKG_VERSION")),
            http_timeout_secs: 30,
            ol_session_env: "OL_SESSION".to_string(),
            wikidata_token_env: "WIKIDATA_ACCESS_TOKEN".to_string(),
        }
    }
}

impl SyncConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            None => Ok(Self::default()),
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("Failed to open config file: {}", path.display()))?;
                serde_yaml::from_reader(file)
                    .with_context(|| format!("Failed to parse config YAML from {}", path.display()))
            }
        }
    }
}

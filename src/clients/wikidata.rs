use log::debug;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::env;
use std::time::Duration;

use super::{ClientError, SparqlRow, Wikidata};
use crate::config::SyncConfig;

/// Synchronous Wikidata client: SPARQL reads against the query service and
/// statement writes against the Wikibase REST API. Writes authenticate with
/// the OAuth token from the configured environment variable.
pub struct HttpWikidata {
    agent: ureq::Agent,
    sparql_url: String,
    rest_url: String,
    token_env: String,
}

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    bindings: Vec<HashMap<String, SparqlBinding>>,
}

#[derive(Debug, Deserialize)]
struct SparqlBinding {
    value: String,
}

impl HttpWikidata {
    pub fn new(config: &SyncConfig) -> Self {
        let timeout = Duration::from_secs(config.http_timeout_secs);
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(timeout)
            .timeout_write(timeout)
            .user_agent(&config.user_agent)
            .build();
        Self {
            agent,
            sparql_url: config.sparql_url.clone(),
            rest_url: config.wikidata_rest_url.trim_end_matches('/').to_string(),
            token_env: config.wikidata_token_env.clone(),
        }
    }
}

fn classify(url: &str, error: ureq::Error) -> ClientError {
    match error {
        ureq::Error::Status(status, _) => ClientError::Status {
            status,
            url: url.to_string(),
        },
        transport => ClientError::Transport {
            url: url.to_string(),
            source: Box::new(transport),
        },
    }
}

impl Wikidata for HttpWikidata {
    fn select(&self, query: &str) -> Result<Vec<SparqlRow>, ClientError> {
        debug!("SPARQL select against {}", self.sparql_url);
        let response = self
            .agent
            .get(&self.sparql_url)
            .query("query", query)
            .query("format", "json")
            .set("Accept", "application/sparql-results+json")
            .call()
            .map_err(|e| classify(&self.sparql_url, e))?;
        let parsed: SparqlResponse =
            response.into_json().map_err(|e| ClientError::Payload {
                url: self.sparql_url.clone(),
                detail: e.to_string(),
            })?;
        let rows = parsed
            .results
            .bindings
            .into_iter()
            .map(|binding| {
                binding
                    .into_iter()
                    .filter(|(_, b)| !b.value.is_empty())
                    .map(|(var, b)| (var, b.value))
                    .collect()
            })
            .collect();
        Ok(rows)
    }

    fn add_string_claim(
        &self,
        qid: &str,
        property_id: &str,
        value: &str,
        comment: &str,
    ) -> Result<(), ClientError> {
        let token = env::var(&self.token_env)
            .map_err(|_| ClientError::Credentials(self.token_env.clone()))?;
        let url = format!("{}/entities/items/{}/statements", self.rest_url, qid);
        debug!("POST {} ({} = {})", url, property_id, value);
        self.agent
            .post(&url)
            .set("Authorization", &format!("Bearer {}", token))
            .send_json(json!({
                "statement": {
                    "property": {"id": property_id},
                    "value": {"type": "value", "content": value}
                },
                "comment": comment,
                "bot": true
            }))
            .map_err(|e| classify(&url, e))?;
        Ok(())
    }
}

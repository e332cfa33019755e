use log::debug;
use std::env;
use std::time::Duration;

use super::{ClientError, OpenLibrary};
use crate::config::SyncConfig;
use crate::records::{Author, Edition};

/// Synchronous Open Library client. Reads are anonymous; writes send the
/// session cookie from the configured environment variable and carry a
/// change comment, mirroring how the site records bot edits.
pub struct HttpOpenLibrary {
    agent: ureq::Agent,
    base_url: String,
    session_env: String,
}

impl HttpOpenLibrary {
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
            base_url: config.openlibrary_url.trim_end_matches('/').to_string(),
            session_env: config.ol_session_env.clone(),
        }
    }

    fn get_record<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<Option<T>, ClientError> {
        match self.agent.get(url).call() {
            Ok(response) => {
                let record = response.into_json::<T>().map_err(|e| ClientError::Payload {
                    url: url.to_string(),
                    detail: e.to_string(),
                })?;
                Ok(Some(record))
            }
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(e) => Err(classify(url, e)),
        }
    }

    fn put_record(
        &self,
        url: &str,
        body: serde_json::Value,
        comment: &str,
    ) -> Result<(), ClientError> {
        let session = env::var(&self.session_env)
            .map_err(|_| ClientError::Credentials(self.session_env.clone()))?;
        self.agent
            .put(url)
            .query("comment", comment)
            .set("Cookie", &session)
            .send_json(body)
            .map_err(|e| classify(url, e))?;
        Ok(())
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

impl OpenLibrary for HttpOpenLibrary {
    fn get_author(&self, olid: &str) -> Result<Option<Author>, ClientError> {
        let url = format!("{}/authors/{}.json", self.base_url, olid);
        debug!("GET {}", url);
        self.get_record(&url)
    }

    fn save_author(&self, author: &Author, comment: &str) -> Result<(), ClientError> {
        let url = format!("{}{}.json", self.base_url, author.key);
        let body = serde_json::to_value(author).map_err(|e| ClientError::Payload {
            url: url.clone(),
            detail: e.to_string(),
        })?;
        debug!("PUT {} ({})", url, comment);
        self.put_record(&url, body, comment)
    }

    fn get_edition_by_isbn(&self, isbn: &str) -> Result<Option<Edition>, ClientError> {
        // The /isbn endpoint redirects to the edition document; the agent
        // follows the redirect.
        let url = format!("{}/isbn/{}.json", self.base_url, isbn);
        debug!("GET {}", url);
        self.get_record(&url)
    }

    fn save_edition(&self, edition: &Edition, comment: &str) -> Result<(), ClientError> {
        let url = format!("{}{}.json", self.base_url, edition.key);
        let body = serde_json::to_value(edition).map_err(|e| ClientError::Payload {
            url: url.clone(),
            detail: e.to_string(),
        })?;
        debug!("PUT {} ({})", url, comment);
        self.put_record(&url, body, comment)
    }
}

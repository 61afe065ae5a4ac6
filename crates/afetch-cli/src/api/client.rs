//! HTTP client for the AlphaFold file server
//!
//! The server publishes each prediction under a model version number and
//! offers no "latest" alias, so the client probes versions newest first and
//! keeps the first one that answers 200.

use crate::api::endpoints;
use crate::config::Config;
use crate::error::Result;
use afetch_common::StructureFormat;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, instrument};

const USER_AGENT: &str = concat!("afetch/", env!("CARGO_PKG_VERSION"));

/// What happened when one version was requested
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// HTTP 200 with a readable body
    Found,
    /// Any other HTTP status
    Status(u16),
    /// Connection, TLS or body read failure
    Transport(String),
}

/// One probed version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeAttempt {
    pub version: u32,
    pub outcome: AttemptOutcome,
}

/// The version that answered, with its content
#[derive(Debug, Clone)]
pub struct ProbeHit {
    pub version: u32,
    pub url: String,
    pub contents: Vec<u8>,
}

/// Result of probing a descending list of versions
#[derive(Debug, Clone, Default)]
pub struct VersionProbe {
    pub attempts: Vec<ProbeAttempt>,
    pub hit: Option<ProbeHit>,
}

impl VersionProbe {
    /// Versions requested, in request order
    pub fn tried_versions(&self) -> Vec<u32> {
        self.attempts.iter().map(|a| a.version).collect()
    }
}

/// Client for the AlphaFold file server
#[derive(Debug, Clone)]
pub struct AlphaFoldClient {
    client: Client,
    base_url: String,
}

impl AlphaFoldClient {
    /// Create a new client
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.base_url.clone(), config.timeout_secs)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Download URL for one model version
    pub fn model_url(&self, code: &str, version: u32, format: StructureFormat) -> String {
        endpoints::model_url(&self.base_url, code, version, format)
    }

    /// Request one URL; only a 200 with a readable body counts as found
    async fn request(&self, url: &str) -> (AttemptOutcome, Vec<u8>) {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return (AttemptOutcome::Transport(e.to_string()), Vec::new()),
        };

        let status = response.status();
        if status != StatusCode::OK {
            return (AttemptOutcome::Status(status.as_u16()), Vec::new());
        }

        match response.bytes().await {
            Ok(body) => (AttemptOutcome::Found, body.to_vec()),
            Err(e) => (AttemptOutcome::Transport(e.to_string()), Vec::new()),
        }
    }

    /// Try `versions` in order and stop at the first 200
    ///
    /// A non-200 status or a transport failure moves on to the next version;
    /// nothing is retried.
    #[instrument(skip(self, versions), fields(base_url = %self.base_url))]
    pub async fn probe_versions<I>(&self, code: &str, format: StructureFormat, versions: I) -> VersionProbe
    where
        I: IntoIterator<Item = u32>,
    {
        let mut probe = VersionProbe::default();

        for version in versions {
            let url = self.model_url(code, version, format);
            let (outcome, contents) = self.request(&url).await;
            debug!(version, url = %url, outcome = ?outcome, "Probed model version");

            let found = outcome == AttemptOutcome::Found;
            probe.attempts.push(ProbeAttempt { version, outcome });

            if found {
                probe.hit = Some(ProbeHit {
                    version,
                    url,
                    contents,
                });
                break;
            }
        }

        probe
    }
}

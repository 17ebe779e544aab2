use std::fmt;
use std::time::Duration;

use serde_json::Value;

use crate::RemoteRecord;

/// Production endpoint of the EPA CIMC web service. The facility key is
/// appended to this path.
pub(crate) const DEFAULT_SERVICE_URL: &str =
    "https://ofmpub.epa.gov/apex/cimc_dws/cimc_patdws_apex/GET/CIMCWS/";

pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LookupError {
    Timeout,
    Http(u16, String),
    Transport(String),
    Malformed(String),
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::Timeout => write!(f, "request timed out"),
            LookupError::Http(code, text) => write!(f, "status {code}: {text}"),
            LookupError::Transport(text) => write!(f, "transport error: {text}"),
            LookupError::Malformed(text) => write!(f, "malformed response: {text}"),
        }
    }
}

impl std::error::Error for LookupError {}

/// Black-box key -> record fetch. The pipeline only sees this trait, so
/// tests drive it with canned records instead of a live service.
pub(crate) trait SiteLookup {
    fn fetch(&self, key: &str) -> Result<RemoteRecord, LookupError>;
}

pub(crate) struct HttpLookup {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpLookup {
    pub(crate) fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .build();
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        HttpLookup { agent, base_url }
    }

    /// Raw service payload for one key, before any record parsing.
    pub(crate) fn fetch_value(&self, key: &str) -> Result<Value, LookupError> {
        let url = format!("{}{}", self.base_url, urlencoding::encode(key));
        match self.agent.get(&url).call() {
            Ok(resp) => resp
                .into_json::<Value>()
                .map_err(|err| LookupError::Malformed(err.to_string())),
            Err(ureq::Error::Status(code, resp)) => {
                let text = resp.into_string().unwrap_or_default();
                Err(LookupError::Http(code, text))
            }
            Err(ureq::Error::Transport(err)) => {
                let text = err.to_string();
                if text.contains("timed out") || text.contains("timeout") {
                    Err(LookupError::Timeout)
                } else {
                    Err(LookupError::Transport(text))
                }
            }
        }
    }
}

impl SiteLookup for HttpLookup {
    fn fetch(&self, key: &str) -> Result<RemoteRecord, LookupError> {
        Ok(RemoteRecord::from_json(self.fetch_value(key)?))
    }
}

/// Per-run lookup state. Input rows arrive sorted by facility key, so a
/// run of identical consecutive keys shares one fetch; a key seen again
/// later in the run fetches again (the service is the source of truth,
/// records are not held beyond the current key). Failed keys are collected
/// in `bad_sites` in first-failure order, one entry per key.
pub(crate) struct LookupCache {
    last_key: Option<String>,
    last: Option<RemoteRecord>,
    bad_sites: Vec<String>,
    null_key_reported: bool,
}

impl LookupCache {
    pub(crate) fn new() -> Self {
        LookupCache {
            last_key: None,
            last: None,
            bad_sites: Vec::new(),
            null_key_reported: false,
        }
    }

    /// Resolve the remote record for one row's key, fetching only when the
    /// key differs from the previous row's. `None` means the row passes
    /// through unenriched.
    pub(crate) fn resolve(
        &mut self,
        key: Option<&str>,
        lookup: &dyn SiteLookup,
    ) -> Option<&RemoteRecord> {
        let Some(key) = key else {
            if !self.null_key_reported {
                eprintln!(
                    "A site has a null Handler_ID field. Please check the input records."
                );
                self.null_key_reported = true;
            }
            return None;
        };
        if self.last_key.as_deref() != Some(key) {
            eprintln!("Get data for: {key}");
            self.last_key = Some(key.to_string());
            self.last = match lookup.fetch(key) {
                Ok(record) => Some(record),
                Err(err) => {
                    self.note_failure(key, &err);
                    None
                }
            };
        }
        self.last.as_ref()
    }

    /// Report a failed key once, even when it recurs non-consecutively.
    fn note_failure(&mut self, key: &str, err: &LookupError) {
        if self.bad_sites.iter().any(|k| k == key) {
            return;
        }
        match err {
            LookupError::Timeout => {
                eprintln!("Connection to web service for site {key} timed out");
            }
            other => {
                eprintln!("Site {key} not found in the RCRAInfo web service ({other})");
            }
        }
        self.bad_sites.push(key.to_string());
    }

    pub(crate) fn bad_sites(&self) -> &[String] {
        &self.bad_sites
    }
}

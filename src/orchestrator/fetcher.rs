//! Concurrent downstream fetch.
//!
//! One GET per selected API, each in its own task on a [`JoinSet`], all
//! sharing one `reqwest::Client` built for this call and dropped when it
//! returns. A failing API only spoils its own slot: bad status and transport
//! errors become `{"error": "..."}` entries, siblings are untouched.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::{Map, Value, json};
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::config::FetchConfig;
use crate::registry::ApiEntry;

/// Per-API results keyed by API name.
///
/// `serde_json::Map` is ordered by key, so the mapping (and its JSON form)
/// does not depend on the order fetches complete in.
pub type Aggregated = Map<String, Value>;

#[derive(Debug, Clone)]
pub struct Fetcher {
    query_param: String,
    timeout: Option<Duration>,
}

impl Fetcher {
    pub fn new(query_param: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self { query_param: query_param.into(), timeout }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(
            config.query_param.clone(),
            config.timeout_seconds.map(Duration::from_secs),
        )
    }

    /// Fetch every entry concurrently and wait for all of them.
    ///
    /// The result holds exactly one slot per distinct entry name.
    pub async fn fetch_all(&self, entries: &[&ApiEntry], subject_id: &str) -> Aggregated {
        if entries.is_empty() {
            return Aggregated::new();
        }

        let mut builder = Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = match builder.build() {
            Ok(client) => client,
            Err(e) => {
                error!(error = %e, "failed to build fetch client");
                let msg = format!("failed to build HTTP client: {e}");
                return aggregate(entries.iter().map(|api| (api.name.clone(), error_value(&msg))));
            }
        };

        let mut set: JoinSet<(String, Value)> = JoinSet::new();
        for api in entries {
            debug!(api = %api.name, url = %api.url, "spawning fetch");
            set.spawn(fetch_one(
                client.clone(),
                (*api).clone(),
                self.query_param.clone(),
                subject_id.to_string(),
            ));
        }

        let mut results = Vec::with_capacity(entries.len());
        while let Some(res) = set.join_next().await {
            match res {
                Ok(pair) => results.push(pair),
                Err(e) => error!("fetch task panicked: {e}"),
            }
        }

        let mut combined = aggregate(results);

        // A panicked task loses its name; give it an error slot anyway.
        let missing: HashSet<&str> = entries
            .iter()
            .map(|api| api.name.as_str())
            .filter(|name| !combined.contains_key(*name))
            .collect();
        for name in missing {
            combined.insert(name.to_string(), error_value("fetch task failed"));
        }

        combined
    }
}

/// Merge per-API results into one mapping. Later duplicates win.
pub fn aggregate<I>(results: I) -> Aggregated
where
    I: IntoIterator<Item = (String, Value)>,
{
    let mut combined = Aggregated::new();
    for (name, value) in results {
        combined.insert(name, value);
    }
    combined
}

async fn fetch_one(
    client: Client,
    api: ApiEntry,
    query_param: String,
    subject_id: String,
) -> (String, Value) {
    let sent = client
        .get(&api.url)
        .query(&[(query_param.as_str(), subject_id.as_str())])
        .send()
        .await;

    let value = match sent {
        Ok(resp) if resp.status() == StatusCode::OK => match resp.json::<Value>().await {
            Ok(body) => {
                debug!(api = %api.name, "fetch ok");
                body
            }
            Err(e) => {
                warn!(api = %api.name, error = %e, "fetch body is not JSON");
                error_value(&e.to_string())
            }
        },
        Ok(resp) => {
            let status = resp.status().as_u16();
            warn!(api = %api.name, status, "fetch returned non-200");
            error_value(&format!("API returned status {status}"))
        }
        Err(e) => {
            warn!(api = %api.name, error = %e, "fetch failed (transport)");
            error_value(&e.to_string())
        }
    };

    (api.name, value)
}

fn error_value(msg: &str) -> Value {
    json!({ "error": msg })
}

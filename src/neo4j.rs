use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::batch::{BatchOp, GraphBatch};
use crate::error::TissuegraphError;

/// The graph-store contract the import pipeline consumes. Index creation is
/// idempotent; commit submits the whole batch as one atomic transaction.
pub trait GraphStore: Send + Sync {
    fn ensure_unique_index(&self, label: &str, property: &str) -> Result<(), TissuegraphError>;
    fn commit(&self, batch: &GraphBatch) -> Result<CommitSummary, TissuegraphError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub operations: usize,
}

#[derive(Clone)]
pub struct GraphAuth {
    pub user: String,
    pub pass: String,
}

impl fmt::Debug for GraphAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphAuth")
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .finish()
    }
}

/// Client for the Neo4j REST surface: the schema index endpoints and the
/// batch endpoint, which applies all submitted jobs in one transaction.
#[derive(Clone)]
pub struct Neo4jHttpClient {
    client: Client,
    base_url: String,
    auth: Option<GraphAuth>,
}

impl Neo4jHttpClient {
    pub fn new(server_url: &str, auth: Option<GraphAuth>) -> Result<Self, TissuegraphError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("tissuegraph/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| TissuegraphError::GraphHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| TissuegraphError::GraphHttp(err.to_string()))?;

        Ok(Self {
            client,
            base_url: server_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    fn with_auth(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match &self.auth {
            Some(auth) => request.basic_auth(&auth.user, Some(&auth.pass)),
            None => request,
        }
    }
}

#[derive(Debug, Deserialize)]
struct IndexDescriptor {
    property_keys: Vec<String>,
}

#[derive(Debug, Serialize)]
struct IndexRequest {
    property_keys: Vec<String>,
}

impl GraphStore for Neo4jHttpClient {
    fn ensure_unique_index(&self, label: &str, property: &str) -> Result<(), TissuegraphError> {
        let url = format!("{}/db/data/schema/index/{label}", self.base_url);
        let response = self
            .with_auth(self.client.get(&url))
            .send()
            .map_err(|err| TissuegraphError::GraphHttp(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let existing: Vec<IndexDescriptor> = response
                .json()
                .map_err(|err| TissuegraphError::GraphHttp(err.to_string()))?;
            if existing
                .iter()
                .any(|index| index.property_keys.iter().any(|key| key == property))
            {
                debug!(label, property, "uniqueness index already present");
                return Ok(());
            }
        } else if status.as_u16() != 404 {
            // 404 just means the label has no indexes yet.
            return Err(index_error(label, property, status.as_u16(), response));
        }

        let request = IndexRequest {
            property_keys: vec![property.to_string()],
        };
        let response = self
            .with_auth(self.client.post(&url))
            .json(&request)
            .send()
            .map_err(|err| TissuegraphError::GraphHttp(err.to_string()))?;
        let status = response.status();
        // A concurrent run may create the index between the check and this
        // call; the store answers 409 and the index exists either way.
        if !status.is_success() && status.as_u16() != 409 {
            return Err(index_error(label, property, status.as_u16(), response));
        }
        debug!(label, property, "uniqueness index ensured");
        Ok(())
    }

    fn commit(&self, batch: &GraphBatch) -> Result<CommitSummary, TissuegraphError> {
        let jobs = batch_jobs(batch);
        let url = format!("{}/db/data/batch", self.base_url);
        let response = self
            .with_auth(self.client.post(&url))
            .json(&jobs)
            .send()
            .map_err(|err| TissuegraphError::GraphHttp(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // The body carries the store's per-job results for diagnosis;
            // its atomicity guarantee means none of them were persisted.
            return Err(TissuegraphError::CommitFailed {
                status: status.as_u16(),
                message: read_body(response),
            });
        }
        let results: Vec<Value> = response
            .json()
            .map_err(|err| TissuegraphError::GraphHttp(err.to_string()))?;
        debug!(operations = results.len(), "batch commit acknowledged");
        Ok(CommitSummary {
            operations: results.len(),
        })
    }
}

fn index_error(
    label: &str,
    property: &str,
    status: u16,
    response: reqwest::blocking::Response,
) -> TissuegraphError {
    TissuegraphError::IndexCreation {
        label: label.to_string(),
        property: property.to_string(),
        message: format!("status {status}: {}", read_body(response)),
    }
}

fn read_body(response: reqwest::blocking::Response) -> String {
    response
        .text()
        .unwrap_or_else(|_| "graph store request failed".to_string())
}

/// Maps batch operations onto REST batch jobs. A node created at op index
/// `N` is addressed by later jobs in the same batch as `{N}`.
#[derive(Debug, Serialize)]
struct BatchJob {
    method: &'static str,
    to: String,
    id: usize,
    body: Value,
}

fn batch_jobs(batch: &GraphBatch) -> Vec<BatchJob> {
    batch
        .ops()
        .iter()
        .enumerate()
        .map(|(id, op)| match op {
            BatchOp::CreateNode { properties } => BatchJob {
                method: "POST",
                to: "/node".to_string(),
                id,
                body: Value::Object(properties.clone()),
            },
            BatchOp::AddLabel { node, label } => BatchJob {
                method: "POST",
                to: format!("{{{}}}/labels", node.0),
                id,
                body: Value::String(label.clone()),
            },
            BatchOp::CreateRelationship { from, rel_type, to } => BatchJob {
                method: "POST",
                to: format!("{{{}}}/relationships", from.0),
                id,
                body: json!({
                    "to": format!("{{{}}}", to.0),
                    "type": rel_type.as_str(),
                }),
            },
        })
        .collect()
}

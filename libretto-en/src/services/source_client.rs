//! Scoring source HTTP client
//!
//! Issues one scoring request to one source and validates the response into
//! typed candidates. Sources implement their own ranking and top-k semantics;
//! this client only enforces the wire contract:
//!
//! POST `endpoint` with `{"playlist_ids": [...], "top_k": n}`, response body
//! either a JSON list of records or an object wrapping that list under one of
//! `results`, `recommendations`, `books`, `items`. Each record must carry
//! `title`, `author`, `description`, `isbn`, `similarity`.
//!
//! Individually malformed records are dropped and counted; a response where
//! every record is malformed fails the source. No retries: sources are
//! assumed idempotent and retry policy belongs to the caller.

use crate::types::{EnsembleError, RawCandidate, ScoreSource, SourceConfig, SourceResult};
use libretto_common::api::PlaylistId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("libretto/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Wrapper keys accepted around the record list, checked in order
const WRAPPER_KEYS: [&str; 4] = ["results", "recommendations", "books", "items"];

/// Scoring request body
#[derive(Debug, Serialize)]
struct ScoringRequest<'a> {
    playlist_ids: &'a [PlaylistId],
    top_k: usize,
}

/// One record as received on the wire, before validation
#[derive(Debug, Deserialize)]
struct WireCandidate {
    isbn: Option<String>,
    title: Option<String>,
    author: Option<String>,
    description: Option<String>,
    similarity: Option<f64>,
}

/// Build the shared HTTP client used for all source calls
///
/// Per-call timeouts are set per request; only the connect timeout and
/// user-agent live on the client itself.
pub fn build_http_client() -> Result<reqwest::Client, EnsembleError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| EnsembleError::Config(format!("HTTP client build failed: {}", e)))
}

/// HTTP implementation of `ScoreSource`
pub struct HttpScoreSource {
    name: String,
    endpoint: String,
    http_client: reqwest::Client,
    timeout: Duration,
}

impl HttpScoreSource {
    pub fn new(config: &SourceConfig, http_client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            name: config.name.clone(),
            endpoint: config.endpoint.clone(),
            http_client,
            timeout,
        }
    }

    fn timeout_error(&self) -> EnsembleError {
        EnsembleError::SourceTimeout {
            source: self.name.clone(),
            timeout_ms: self.timeout.as_millis() as u64,
        }
    }
}

#[async_trait::async_trait]
impl ScoreSource for HttpScoreSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(
        &self,
        playlist_ids: &[PlaylistId],
        top_k: usize,
    ) -> Result<SourceResult, EnsembleError> {
        debug!(
            source = %self.name,
            endpoint = %self.endpoint,
            playlist_len = playlist_ids.len(),
            top_k = top_k,
            "Querying scoring source"
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&ScoringRequest { playlist_ids, top_k })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    self.timeout_error()
                } else {
                    EnsembleError::SourceHttp {
                        source: self.name.clone(),
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnsembleError::SourceHttp {
                source: self.name.clone(),
                message: format!("status {}", status),
            });
        }

        let body: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.timeout_error()
            } else {
                EnsembleError::SourceSchema {
                    source: self.name.clone(),
                    reason: format!("body is not JSON: {}", e),
                }
            }
        })?;

        let records = extract_records(&body, &self.name)?;
        let result = validate_records(records, &self.name)?;

        debug!(
            source = %self.name,
            candidate_count = result.candidates.len(),
            dropped = result.dropped_records,
            "Scoring source response validated"
        );

        Ok(result)
    }
}

/// Locate the record list inside the response body
///
/// Accepts a top-level JSON list, or an object carrying the list under one of
/// the recognized wrapper keys. A wrapper key holding a non-list value is
/// skipped, matching how lenient model servers nest their payloads.
fn extract_records<'a>(body: &'a Value, source: &str) -> Result<&'a [Value], EnsembleError> {
    if let Value::Array(records) = body {
        return Ok(records);
    }

    if let Value::Object(map) = body {
        for key in WRAPPER_KEYS {
            if let Some(Value::Array(records)) = map.get(key) {
                return Ok(records);
            }
        }
    }

    Err(EnsembleError::SourceSchema {
        source: source.to_string(),
        reason: "body is neither a list nor an object with a recognized wrapper key".to_string(),
    })
}

/// Validate wire records into typed candidates
///
/// Records missing any required field (or with a non-finite score) are
/// dropped and counted. Dropping every record fails the source; an empty
/// record list is a valid zero-candidate result.
fn validate_records(records: &[Value], source: &str) -> Result<SourceResult, EnsembleError> {
    let mut candidates = Vec::with_capacity(records.len());
    let mut dropped_records = 0usize;

    for record in records {
        match parse_candidate(record) {
            Some(candidate) => candidates.push(candidate),
            None => dropped_records += 1,
        }
    }

    if candidates.is_empty() && dropped_records > 0 {
        return Err(EnsembleError::SourceSchema {
            source: source.to_string(),
            reason: format!(
                "all {} records are missing required fields",
                dropped_records
            ),
        });
    }

    if dropped_records > 0 {
        warn!(
            source = source,
            dropped = dropped_records,
            kept = candidates.len(),
            "Dropped records missing required fields"
        );
    }

    Ok(SourceResult {
        source: source.to_string(),
        candidates,
        dropped_records,
    })
}

/// Parse one record; `None` when any required field is absent or unusable
fn parse_candidate(record: &Value) -> Option<RawCandidate> {
    let wire: WireCandidate = serde_json::from_value(record.clone()).ok()?;

    let raw_score = wire.similarity.filter(|s| s.is_finite())?;

    Some(RawCandidate {
        isbn: wire.isbn?,
        title: wire.title?,
        author: wire.author?,
        description: wire.description?,
        raw_score,
    })
}

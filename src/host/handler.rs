//! Command dispatch for the host bridge.
//!
//! Maps each [`CommandEnvelope`] onto an [`NpaSearcher`] operation and
//! wraps the outcome in a [`ResponseEnvelope`]. Errors never escape: they
//! become `ok: false` responses.

use std::path::PathBuf;

use npa_search::{DocumentDescriptor, DocumentStore, NpaSearcher, RawCandidate};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::error::{NpaError, Result};
use crate::host::contract::{CommandEnvelope, CommandName, ResponseEnvelope};

#[derive(Debug, Deserialize)]
struct ExplainRequest {
    descriptor: DocumentDescriptor,
    candidate: RawCandidate,
}

#[derive(Debug, Deserialize)]
struct DownloadRequest {
    candidate: RawCandidate,
    path: PathBuf,
}

/// Dispatches host commands to a searcher.
pub struct CommandHandler<S> {
    searcher: NpaSearcher<S>,
}

impl<S: DocumentStore> CommandHandler<S> {
    pub fn new(searcher: NpaSearcher<S>) -> Self {
        Self { searcher }
    }

    pub fn searcher(&self) -> &NpaSearcher<S> {
        &self.searcher
    }

    /// Handle one command.
    pub async fn handle(&self, envelope: CommandEnvelope) -> ResponseEnvelope {
        if let Err(e) = envelope.validate() {
            return ResponseEnvelope::error(envelope.request_id, e.to_string());
        }
        let request_id = envelope.request_id.clone();
        let command = envelope.command;
        tracing::debug!(request_id = %request_id, command = command.as_str(), "host command");

        match self.dispatch(command, envelope.payload).await {
            Ok(payload) => ResponseEnvelope::ok(request_id, payload),
            Err(e) => {
                tracing::warn!(
                    request_id = %request_id,
                    command = command.as_str(),
                    error = %e,
                    "host command failed"
                );
                ResponseEnvelope::error(request_id, e.to_string())
            }
        }
    }

    async fn dispatch(&self, command: CommandName, payload: Value) -> Result<Value> {
        match command {
            CommandName::SearchRun => {
                let descriptor: DocumentDescriptor = decode(payload)?;
                let results = self.searcher.search(&descriptor).await?;
                Ok(json!({ "results": results }))
            }
            CommandName::SearchConsolidated => {
                let candidate: RawCandidate = decode(payload)?;
                encode(&self.searcher.find_consolidated_version(&candidate))
            }
            CommandName::SearchExplain => {
                let request: ExplainRequest = decode(payload)?;
                let breakdown = self
                    .searcher
                    .explain_score(&request.descriptor, &request.candidate);
                Ok(json!({
                    "breakdown": breakdown,
                    "explanation": breakdown.to_string(),
                }))
            }
            CommandName::SearchStats => encode(&self.searcher.statistics()),
            CommandName::DocumentDownload => {
                let request: DownloadRequest = decode(payload)?;
                let bytes = self.searcher.download_document(&request.candidate).await?;
                if let Some(parent) = request.path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&request.path, &bytes).await?;
                tracing::info!(path = %request.path.display(), bytes = bytes.len(), "document saved");
                Ok(json!({ "path": request.path, "bytes": bytes.len() }))
            }
            CommandName::HostStop => Ok(json!({ "stopping": true })),
        }
    }
}

fn decode<T: DeserializeOwned>(payload: Value) -> Result<T> {
    serde_json::from_value(payload).map_err(|e| NpaError::Protocol(format!("invalid payload: {e}")))
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| NpaError::Protocol(format!("failed to serialize response: {e}")))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use npa_search::{
        QuerySpec, QueryTarget, RetryPolicy, SearchConfig, SearchError, SearchStats,
    };
    use std::sync::Arc;

    /// Serves a single record for number queries equal to its number.
    pub(crate) struct OneRecordStore(pub RawCandidate);

    impl DocumentStore for OneRecordStore {
        async fn query(&self, spec: &QuerySpec) -> std::result::Result<Vec<RawCandidate>, SearchError> {
            match &spec.target {
                QueryTarget::Number { value, .. } if *value == self.0.number => {
                    Ok(vec![self.0.clone()])
                }
                _ => Ok(vec![]),
            }
        }

        async fn fetch_by_external_id(
            &self,
            _id: &str,
        ) -> std::result::Result<Option<RawCandidate>, SearchError> {
            Ok(None)
        }

        async fn download_artifact(&self, id: &str) -> std::result::Result<Vec<u8>, SearchError> {
            if id == self.0.eo_number {
                Ok(b"%PDF-1.7".to_vec())
            } else {
                Err(SearchError::NotFound(id.to_owned()))
            }
        }
    }

    pub(crate) fn law() -> RawCandidate {
        RawCandidate {
            id: "a1".into(),
            number: "273-ФЗ".into(),
            name: "Об образовании в Российской Федерации".into(),
            eo_number: "0001201212300007".into(),
            view_date: "2023-01-01".into(),
            ..Default::default()
        }
    }

    pub(crate) fn handler() -> CommandHandler<OneRecordStore> {
        let config = SearchConfig {
            request_delay_ms: 0,
            retry: RetryPolicy::no_retry(),
            ..Default::default()
        };
        let searcher = NpaSearcher::new(OneRecordStore(law()), config)
            .expect("config")
            .with_stats(Arc::new(SearchStats::new()));
        CommandHandler::new(searcher)
    }

    fn command(name: CommandName, payload: Value) -> CommandEnvelope {
        CommandEnvelope::new("req-1", name, payload)
    }

    #[tokio::test]
    async fn search_returns_ranked_results() {
        let resp = handler()
            .handle(command(
                CommandName::SearchRun,
                json!({"type": "ФЗ", "number": "273-ФЗ"}),
            ))
            .await;
        assert!(resp.ok, "{:?}", resp.error);
        assert_eq!(resp.request_id, "req-1");
        let results = resp.payload["results"].as_array().expect("array");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["id"], "a1");
        assert_eq!(results[0]["score"], 8200);
        assert_eq!(results[0]["isAmendment"], false);
    }

    #[tokio::test]
    async fn invalid_descriptor_is_error_response() {
        let resp = handler()
            .handle(command(CommandName::SearchRun, json!({"type": "ФЗ", "number": ""})))
            .await;
        assert!(!resp.ok);
        assert!(resp.error.expect("message").starts_with("invalid document descriptor"));
    }

    #[tokio::test]
    async fn malformed_payload_is_protocol_error() {
        let resp = handler()
            .handle(command(CommandName::SearchRun, json!([1, 2, 3])))
            .await;
        assert!(!resp.ok);
        assert!(resp.error.expect("message").starts_with("protocol error: invalid payload"));
    }

    #[tokio::test]
    async fn consolidated_lookup() {
        let resp = handler()
            .handle(command(
                CommandName::SearchConsolidated,
                serde_json::to_value(law()).expect("json"),
            ))
            .await;
        assert!(resp.ok);
        assert_eq!(resp.payload["type"], "consolidated_version");
    }

    #[tokio::test]
    async fn explain_renders_breakdown() {
        let resp = handler()
            .handle(command(
                CommandName::SearchExplain,
                json!({
                    "descriptor": {"type": "ФЗ", "number": "273-ФЗ"},
                    "candidate": serde_json::to_value(law()).expect("json"),
                }),
            ))
            .await;
        assert!(resp.ok);
        assert_eq!(resp.payload["breakdown"]["total"], 8200);
        assert_eq!(resp.payload["breakdown"]["numberTier"], "exact");
        assert!(
            resp.payload["explanation"]
                .as_str()
                .expect("text")
                .contains("exact number match")
        );
    }

    #[tokio::test]
    async fn stats_reflect_searches() {
        let h = handler();
        h.handle(command(CommandName::SearchRun, json!({"type": "ФЗ", "number": "273-ФЗ"})))
            .await;
        let resp = h.handle(command(CommandName::SearchStats, Value::Null)).await;
        assert_eq!(resp.payload["totalSearches"], 1);
        assert_eq!(resp.payload["successfulSearches"], 1);
    }

    #[tokio::test]
    async fn download_writes_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pdf").join("273.pdf");
        let resp = handler()
            .handle(command(
                CommandName::DocumentDownload,
                json!({
                    "candidate": serde_json::to_value(law()).expect("json"),
                    "path": path,
                }),
            ))
            .await;
        assert!(resp.ok, "{:?}", resp.error);
        assert_eq!(resp.payload["bytes"], 8);
        assert_eq!(std::fs::read(&path).expect("read"), b"%PDF-1.7");
    }

    #[tokio::test]
    async fn invalid_envelope_rejected_before_dispatch() {
        let mut envelope = command(CommandName::SearchStats, Value::Null);
        envelope.v = 0;
        let resp = handler().handle(envelope).await;
        assert!(!resp.ok);
        assert!(resp.error.expect("message").contains("contract version"));
    }
}

//! [`DocumentStore`] backed by the official publication registry API.
//!
//! Queries go to `{base_url}/Documents` with one filter parameter per
//! query target; single records come from `{base_url}/Document`; PDFs from
//! `{file_base_url}/file/pdf`. Retries, pacing and timeouts are applied by
//! the search core, so every method here makes exactly one request.

use std::time::Duration;

use npa_search::types::NumberMatch;
use npa_search::{DocumentStore, QuerySpec, QueryTarget, RawCandidate, SearchConfig, SearchError};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use serde::Deserialize;
use url::Url;

use crate::config::ApiConfig;
use crate::error::{NpaError, Result};

const ACCEPT_JSON: &str = "application/json, text/html, application/xhtml+xml, \
                           application/xml;q=0.9, */*;q=0.8";

/// One page of the `Documents` listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentsPage {
    #[serde(default)]
    items: Vec<RawCandidate>,
    #[serde(default)]
    items_total_count: u64,
}

/// HTTP client for `publication.pravo.gov.ru`.
pub struct PravoStore {
    client: reqwest::Client,
    base_url: Url,
    file_base_url: Url,
    page_size: u32,
    request_timeout: Duration,
    artifact_timeout: Duration,
}

impl PravoStore {
    /// Build a store with browser-like headers.
    ///
    /// # Errors
    ///
    /// Returns [`NpaError::Config`] for unparsable URLs or headers and
    /// [`NpaError::Http`] if the client cannot be constructed.
    pub fn new(api: &ApiConfig, search: &SearchConfig) -> Result<Self> {
        let base_url = Url::parse(&api.base_url)
            .map_err(|e| NpaError::Config(format!("api.base_url: {e}")))?;
        let file_base_url = Url::parse(&api.file_base_url)
            .map_err(|e| NpaError::Config(format!("api.file_base_url: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_JSON));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&api.accept_language)
                .map_err(|e| NpaError::Config(format!("api.accept_language: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .user_agent(api.user_agent.clone())
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| NpaError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            file_base_url,
            page_size: api.page_size,
            request_timeout: search.request_timeout(),
            artifact_timeout: search.artifact_timeout(),
        })
    }

    /// `base` with `segments` appended to its path.
    fn endpoint(base: &Url, segments: &[&str]) -> std::result::Result<Url, SearchError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| SearchError::Config(format!("{base} cannot be a base URL")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn documents_url(&self, spec: &QuerySpec) -> std::result::Result<Url, SearchError> {
        let mut url = Self::endpoint(&self.base_url, &["Documents"])?;
        {
            let mut query = url.query_pairs_mut();
            match &spec.target {
                QueryTarget::Number { value, mode } => {
                    query.append_pair("Number", value);
                    let search_type = match mode {
                        NumberMatch::Exact => "0",
                        NumberMatch::StartsWith => "1",
                    };
                    query.append_pair("NumberSearchType", search_type);
                }
                QueryTarget::ComplexName(value) => {
                    query.append_pair("ComplexName", value);
                }
                QueryTarget::Name(value) => {
                    query.append_pair("Name", value);
                }
                QueryTarget::ExternalId(value) => {
                    query.append_pair("EoNumber", value);
                }
            }
            query.append_pair("PageSize", &self.page_size.to_string());
        }
        Ok(url)
    }

    async fn get(&self, url: Url, timeout: Duration) -> std::result::Result<reqwest::Response, SearchError> {
        tracing::trace!(%url, "registry request");
        self.client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout(format!("registry request: {e}"))
                } else {
                    SearchError::Network(format!("registry request failed: {e}"))
                }
            })
    }
}

fn status_error(status: StatusCode, what: &str) -> SearchError {
    SearchError::Network(format!("{what}: HTTP {status}"))
}

impl DocumentStore for PravoStore {
    async fn query(&self, spec: &QuerySpec) -> std::result::Result<Vec<RawCandidate>, SearchError> {
        let url = self.documents_url(spec)?;
        let response = self.get(url, self.request_timeout).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(vec![]);
        }
        if !status.is_success() {
            return Err(status_error(status, "registry query"));
        }
        let page: DocumentsPage = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(format!("registry response: {e}")))?;
        tracing::debug!(
            strategy = %spec.strategy,
            items = page.items.len(),
            total = page.items_total_count,
            "registry page received"
        );
        Ok(page.items)
    }

    async fn fetch_by_external_id(
        &self,
        id: &str,
    ) -> std::result::Result<Option<RawCandidate>, SearchError> {
        let mut url = Self::endpoint(&self.base_url, &["Document"])?;
        url.query_pairs_mut().append_pair("eoNumber", id);
        let response = self.get(url, self.request_timeout).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(status_error(status, "registry lookup"));
        }
        let record: RawCandidate = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(format!("registry record: {e}")))?;
        Ok(Some(record))
    }

    async fn download_artifact(&self, id: &str) -> std::result::Result<Vec<u8>, SearchError> {
        let mut url = Self::endpoint(&self.file_base_url, &["file", "pdf"])?;
        url.query_pairs_mut().append_pair("eoNumber", id);
        let response = self.get(url, self.artifact_timeout).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SearchError::NotFound(format!("no PDF for {id}")));
        }
        if !status.is_success() {
            return Err(status_error(status, "PDF download"));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SearchError::Network(format!("PDF download interrupted: {e}")))?;
        Ok(bytes.to_vec())
    }
}

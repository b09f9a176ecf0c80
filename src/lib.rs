//! npa: legal-document search against the official publication registry.
//!
//! The search engine itself (query planning, scoring, deduplication, text
//! extraction) lives in the `npa-search` crate and is transport-agnostic.
//! This crate supplies the pieces around it:
//!
//! - **Registry client**: [`pravo::PravoStore`], an HTTP [`DocumentStore`]
//!   for `publication.pravo.gov.ru`
//! - **Configuration**: [`config::NpaConfig`], loaded from TOML
//! - **Host bridge**: NDJSON command/response envelopes over stdin/stdout,
//!   used by the `npa-host` binary
//!
//! [`DocumentStore`]: npa_search::DocumentStore

pub mod config;
pub mod error;
pub mod host;
pub mod pravo;

pub use config::NpaConfig;
pub use error::{NpaError, Result};
pub use pravo::PravoStore;

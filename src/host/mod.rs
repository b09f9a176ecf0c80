//! Host-facing NDJSON contract and bridge for driving searches from another
//! process.

pub mod contract;
pub mod handler;
pub mod stdio;

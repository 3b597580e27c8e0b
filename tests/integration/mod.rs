//! Integration tests for aql-exec.
//!
//! HTTP tests run against a local canned-response server, so no ArangoDB
//! instance is needed.

pub mod pipeline_test;
pub mod server;
pub mod transport_test;

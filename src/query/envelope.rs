//! Request bodies for the ArangoDB query endpoints.

use serde::Serialize;
use std::fmt;

use super::bind_vars::BindVars;
use crate::config::ConnectionProfile;

/// Query listing the user collections of the current database.
pub const COLLECTIONS_QUERY: &str =
    "for e in Collections() filter SUBSTRING(e.name, 0, 1) != '_' return e.name";

/// Batch size used for collection discovery.
pub const COLLECTIONS_BATCH_SIZE: u32 = 100;

/// Which query endpoint a request goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `/_api/cursor`: run the query and return the first batch.
    Cursor,
    /// `/_api/explain`: return the execution plan.
    Explain,
}

impl Endpoint {
    /// Path below `/_db/{database}`.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Cursor => "/_api/cursor",
            Self::Explain => "/_api/explain",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// JSON body of a cursor or explain request.
///
/// `count` and `batchSize` only appear on cursor requests.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_vars: Option<BindVars>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
}

impl RequestEnvelope {
    /// Cursor request using the profile's count flag and batch size.
    pub fn execute(
        query: impl Into<String>,
        bind_vars: Option<BindVars>,
        profile: &ConnectionProfile,
    ) -> Self {
        Self {
            query: query.into(),
            bind_vars,
            count: Some(profile.result_count),
            batch_size: Some(profile.batch_size),
        }
    }

    /// Explain request.
    pub fn explain(query: impl Into<String>, bind_vars: Option<BindVars>) -> Self {
        Self {
            query: query.into(),
            bind_vars,
            count: None,
            batch_size: None,
        }
    }

    /// Cursor request listing non-system collection names.
    pub fn collections() -> Self {
        Self {
            query: COLLECTIONS_QUERY.to_string(),
            bind_vars: None,
            count: Some(true),
            batch_size: Some(COLLECTIONS_BATCH_SIZE),
        }
    }
}

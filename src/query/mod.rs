//! Query preparation: splitting a buffer into units, pulling out inline bind
//! variables and building request bodies.

mod bind_vars;
mod envelope;
mod splitter;

pub use bind_vars::{extract_bind_vars, BindVars};
pub use envelope::{Endpoint, RequestEnvelope, COLLECTIONS_BATCH_SIZE, COLLECTIONS_QUERY};
pub use splitter::{split_queries, QuerySplitter, QueryUnit};

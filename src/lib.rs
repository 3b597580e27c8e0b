//! aql-exec - run AQL query batches against ArangoDB from an editor.
//!
//! The pipeline splits a buffer into query units, pulls inline bind variables
//! out of each unit, POSTs it to the cursor or explain endpoint, pretty-prints
//! the JSON response and writes it to a log surface or a result file. Editor
//! specifics sit behind [`host::EditorHost`] and [`config::ProfileProvider`].

pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod query;
pub mod render;
pub mod session;
pub mod sink;
pub mod transport;

pub use error::{AqlExecError, Result};
pub use session::{RunMode, RunReport, Session, UnitOutcome};

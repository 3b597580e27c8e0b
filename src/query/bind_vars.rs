//! Inline bind-variable declarations.
//!
//! A query may carry its bind variables on a single line such as
//!
//! ```text
//! // bindVars : {"name": "alice", "limit": 10}
//! ```
//!
//! Only the first such line counts. Anything that fails to parse is ignored
//! with a warning, so a typo never blocks the query itself.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

/// Ordered bind-variable map, as sent in the request body.
pub type BindVars = Map<String, Value>;

static BIND_VARS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^.*bindVars\s*:\s*(\{.*\})\s*$").expect("bind vars pattern is valid")
});

/// Extracts the bind variables declared in `query`, if any.
///
/// An empty object counts as no bind variables.
pub fn extract_bind_vars(query: &str) -> Option<BindVars> {
    let captures = BIND_VARS_LINE.captures(query)?;
    let declaration = captures.get(1)?.as_str();

    match serde_json::from_str::<BindVars>(declaration) {
        Ok(vars) if vars.is_empty() => None,
        Ok(vars) => Some(vars),
        Err(e) => {
            warn!("Ignoring bind variables that are not a JSON object ({e}): {declaration}");
            None
        }
    }
}

//! Query sessions.
//!
//! A [`Session`] holds everything a run needs: the profile provider, the
//! editor host, the transport, the result sink, and the collection names
//! offered as completions. Runs execute their units strictly in document order,
//! one request at a time. A failing unit is logged and skipped; only a broken
//! profile stops a run.

use serde::Deserialize;
use serde_json::Value;
use std::sync::{Arc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{ConnectionProfile, ProfileProvider};
use crate::error::{AqlExecError, Result};
use crate::host::EditorHost;
use crate::query::{extract_bind_vars, Endpoint, QueryUnit, RequestEnvelope};
use crate::render::render;
use crate::sink::ResultSink;
use crate::transport::{fetch_body, QueryTransport};

/// What a run does with its queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Run the queries, replacing previous results.
    Execute,
    /// Run the queries, appending to previous results.
    ExecuteAppend,
    /// Fetch execution plans, replacing previous results.
    Explain,
}

impl RunMode {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::Execute | Self::ExecuteAppend => Endpoint::Cursor,
            Self::Explain => Endpoint::Explain,
        }
    }

    /// Whether the destination is cleared before the first unit.
    pub fn clears_destination(&self) -> bool {
        !matches!(self, Self::ExecuteAppend)
    }
}

/// What happened to one query unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    /// The response was written; `pretty` is false for non-JSON bodies.
    Written { query: String, pretty: bool },
    /// The request failed, so nothing was written.
    NoResponse { query: String },
    /// The response arrived but could not be written.
    SinkFailed { query: String, reason: String },
}

/// Summary of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub outcomes: Vec<UnitOutcome>,
    /// True if the run stopped early because it was cancelled.
    pub cancelled: bool,
}

impl RunReport {
    /// Number of units whose results were written.
    pub fn written(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, UnitOutcome::Written { .. }))
            .count()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CursorResponse {
    #[serde(default)]
    error: bool,
    error_message: Option<String>,
    result: Option<Vec<Value>>,
}

/// Context shared by all commands against one editor.
pub struct Session {
    provider: Arc<dyn ProfileProvider>,
    host: Arc<dyn EditorHost>,
    transport: Arc<dyn QueryTransport>,
    sink: ResultSink,
    collections: RwLock<Vec<(String, String)>>,
}

impl Session {
    pub fn new(
        provider: Arc<dyn ProfileProvider>,
        host: Arc<dyn EditorHost>,
        transport: Arc<dyn QueryTransport>,
    ) -> Self {
        Self {
            provider,
            host,
            transport,
            sink: ResultSink::new(),
            collections: RwLock::new(Vec::new()),
        }
    }

    /// Replaces the result sink, e.g. to change poll limits.
    pub fn with_sink(mut self, sink: ResultSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn sink(&self) -> &ResultSink {
        &self.sink
    }

    /// Loads the selected profile from the provider.
    pub fn active_profile(&self) -> Result<ConnectionProfile> {
        let name = self.provider.default_profile_name()?;
        self.provider.get_profile(&name)
    }

    pub fn profile_names(&self) -> Result<Vec<String>> {
        self.provider.list_profile_names()
    }

    /// Selects the profile called `name` and refreshes the collection list.
    pub async fn switch_connection(&self, name: &str) -> Result<()> {
        self.provider.set_default_profile_name(name)?;
        info!("Switched to connection {name}");
        self.fill_database_collections().await;
        Ok(())
    }

    /// Selects the profile at `index` of [`profile_names`](Self::profile_names).
    pub async fn switch_connection_at(&self, index: usize) -> Result<String> {
        let names = self.profile_names()?;
        let name = names
            .get(index)
            .cloned()
            .ok_or_else(|| AqlExecError::config(format!("No connection at index {index}")))?;
        self.switch_connection(&name).await?;
        Ok(name)
    }

    /// Reloads the non-system collection names of the active database.
    ///
    /// On failure the list is left empty. Returns the number of collections.
    pub async fn fill_database_collections(&self) -> usize {
        let collections = match self.load_collections().await {
            Ok(names) => names
                .into_iter()
                .map(|name| (name.clone(), name))
                .collect::<Vec<_>>(),
            Err(e) => {
                warn!("Could not load collections: {e}");
                Vec::new()
            }
        };

        let count = collections.len();
        if let Ok(mut cached) = self.collections.write() {
            *cached = collections.clone();
        }
        self.host.set_completions(collections);
        debug!("Loaded {count} collections");
        count
    }

    async fn load_collections(&self) -> Result<Vec<String>> {
        let profile = self.active_profile()?;
        let response = self
            .transport
            .execute(&profile, &RequestEnvelope::collections(), Endpoint::Cursor)
            .await?;
        let parsed: CursorResponse = serde_json::from_str(&response.body)
            .map_err(|e| AqlExecError::parse(format!("collections response: {e}")))?;

        if parsed.error || response.status >= 400 {
            return Err(AqlExecError::transport(format!(
                "server answered {}: {}",
                response.status,
                parsed.error_message.as_deref().unwrap_or("unknown error")
            )));
        }
        let result = parsed
            .result
            .ok_or_else(|| AqlExecError::parse("collections response has no result"))?;

        Ok(result
            .into_iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect())
    }

    /// Collection completions as `(trigger, contents)` pairs.
    pub fn completions(&self) -> Vec<(String, String)> {
        self.collections
            .read()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Texts to run: each non-empty selection, or the whole buffer for an
    /// empty selection or when there are no selections.
    pub fn query_texts(&self) -> Vec<String> {
        let buffer = self.host.buffer_text();
        let selections = self.host.current_selections();
        if selections.is_empty() {
            return vec![buffer];
        }

        selections
            .into_iter()
            .filter_map(|(a, b)| {
                let (start, end) = (a.min(b), a.max(b));
                if start == end {
                    return Some(buffer.clone());
                }
                match buffer.get(start..end) {
                    Some(text) => Some(text.to_string()),
                    None => {
                        warn!("Ignoring selection {start}..{end}: not a valid range of the buffer");
                        None
                    }
                }
            })
            .collect()
    }

    pub async fn execute(&self) -> Result<RunReport> {
        self.run(RunMode::Execute, &CancellationToken::new()).await
    }

    pub async fn execute_append(&self) -> Result<RunReport> {
        self.run(RunMode::ExecuteAppend, &CancellationToken::new()).await
    }

    pub async fn explain(&self) -> Result<RunReport> {
        self.run(RunMode::Explain, &CancellationToken::new()).await
    }

    /// Runs every query unit of the current selections.
    ///
    /// `cancel` is checked before each unit; a request already sent is
    /// always allowed to finish.
    pub async fn run(&self, mode: RunMode, cancel: &CancellationToken) -> Result<RunReport> {
        let profile = self.active_profile()?;
        let splitter = profile.splitter()?;

        let units: Vec<QueryUnit> = self
            .query_texts()
            .iter()
            .flat_map(|text| splitter.split(text))
            .collect();

        let mut report = RunReport::default();
        if units.is_empty() {
            debug!("Nothing to run");
            return Ok(report);
        }

        info!(
            "Running {} quer{} on {} ({:?})",
            units.len(),
            if units.len() == 1 { "y" } else { "ies" },
            profile.display_string(),
            mode
        );

        let mut clear = mode.clears_destination();
        for unit in units {
            if cancel.is_cancelled() {
                info!("Run cancelled");
                report.cancelled = true;
                break;
            }
            let outcome = self.run_unit(&profile, unit, mode, clear).await;
            clear = false;
            report.outcomes.push(outcome);
        }

        Ok(report)
    }

    async fn run_unit(
        &self,
        profile: &ConnectionProfile,
        unit: QueryUnit,
        mode: RunMode,
        clear: bool,
    ) -> UnitOutcome {
        let bind_vars = extract_bind_vars(unit.as_str());
        let query = unit.into_string();
        let envelope = match mode {
            RunMode::Explain => RequestEnvelope::explain(query.clone(), bind_vars),
            RunMode::Execute | RunMode::ExecuteAppend => {
                RequestEnvelope::execute(query.clone(), bind_vars, profile)
            }
        };

        let Some(body) =
            fetch_body(self.transport.as_ref(), profile, &envelope, mode.endpoint()).await
        else {
            return UnitOutcome::NoResponse { query };
        };

        let rendered = render(&body);
        match self
            .sink
            .write(self.host.as_ref(), profile, &rendered, clear)
            .await
        {
            Ok(()) => UnitOutcome::Written {
                query,
                pretty: rendered.is_pretty(),
            },
            Err(e) => {
                warn!("{}: {e}", e.category());
                UnitOutcome::SinkFailed {
                    query,
                    reason: e.to_string(),
                }
            }
        }
    }
}

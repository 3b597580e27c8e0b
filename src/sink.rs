//! Routing of rendered results.
//!
//! A profile without `result_file_name` writes to the host's log surface.
//! Otherwise results go to a file next to the query document, named by the
//! pattern with `*` replaced by the document's stem. File destinations open
//! asynchronously in an editor, so the sink polls until the surface has loaded,
//! giving up after a bounded number of polls.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ConnectionProfile;
use crate::error::{AqlExecError, Result};
use crate::host::{EditorHost, SurfaceId};
use crate::render::RenderedResult;

/// Extension a query document must have for file-sink mode.
pub const QUERY_FILE_EXTENSION: &str = "aql";

/// Wildcard replaced with the document's stem in destination patterns.
pub const STEM_WILDCARD: char = '*';

/// Delay between checks of a loading destination surface.
pub const LOAD_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Checks before a loading destination is given up on.
pub const MAX_LOAD_POLLS: u32 = 100;

/// Resolves the result file for `document` from a destination pattern.
///
/// Documents with an extension other than [`QUERY_FILE_EXTENSION`] are
/// rejected, as are unsaved documents.
pub fn destination_path(document: Option<&Path>, pattern: &str) -> Result<PathBuf> {
    let document = document
        .ok_or_else(|| AqlExecError::destination("current document has no file name"))?;

    if let Some(extension) = document.extension() {
        let extension = extension.to_string_lossy();
        if !extension.eq_ignore_ascii_case(QUERY_FILE_EXTENSION) {
            return Err(AqlExecError::destination(format!(
                "{} is not a .{QUERY_FILE_EXTENSION} file",
                document.display()
            )));
        }
    }

    let directory = document.parent().unwrap_or_else(|| Path::new(""));
    let file_name = if pattern.contains(STEM_WILDCARD) {
        let stem = document
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        pattern.replace(STEM_WILDCARD, &stem)
    } else {
        pattern.to_string()
    };

    Ok(directory.join(file_name))
}

/// Creates `path` as an empty file, with its parent directories, if missing.
async fn ensure_file(path: &Path) -> Result<()> {
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Ok(());
    }

    debug!("Creating result file {}", path.display());
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AqlExecError::destination(format!("{}: {e}", parent.display()))
            })?;
        }
    }
    tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| AqlExecError::destination(format!("{}: {e}", path.display())))?;
    Ok(())
}

/// Progress of the file destination currently being written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SlotState {
    #[default]
    Idle,
    /// The surface was requested and is still loading.
    Opening { path: PathBuf, surface: SurfaceId },
    /// The surface is loaded and being written.
    Ready { path: PathBuf, surface: SurfaceId },
    /// The last write failed. Kept until the next writer takes the slot.
    Failed { path: PathBuf, reason: String },
}

/// Allows one file-destination write at a time.
///
/// Writers queue on `turn`; `state` is observable while a write is running.
#[derive(Debug, Default)]
pub struct DestinationSlot {
    turn: tokio::sync::Mutex<()>,
    state: Mutex<SlotState>,
}

impl DestinationSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SlotState {
        self.state
            .lock()
            .map(|state| state.clone())
            .unwrap_or_default()
    }

    fn set(&self, next: SlotState) {
        if let Ok(mut state) = self.state.lock() {
            *state = next;
        }
    }
}

/// Writes rendered results to the log surface or a result file.
#[derive(Debug)]
pub struct ResultSink {
    slot: DestinationSlot,
    poll_interval: Duration,
    max_polls: u32,
}

impl ResultSink {
    pub fn new() -> Self {
        Self {
            slot: DestinationSlot::new(),
            poll_interval: LOAD_POLL_INTERVAL,
            max_polls: MAX_LOAD_POLLS,
        }
    }

    /// Overrides how long to wait for a loading destination.
    pub fn with_poll_limits(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    pub fn slot(&self) -> &DestinationSlot {
        &self.slot
    }

    /// Writes one result, clearing the destination first if `clear` is set.
    pub async fn write(
        &self,
        host: &dyn EditorHost,
        profile: &ConnectionProfile,
        rendered: &RenderedResult,
        clear: bool,
    ) -> Result<()> {
        match &profile.result_file_name {
            None => self.write_to_log(host, rendered.text(), clear).await,
            Some(pattern) => {
                let document = host.current_document_path();
                let path = destination_path(document.as_deref(), pattern)?;
                self.write_to_file(host, &path, rendered.text(), clear, profile.auto_save)
                    .await
            }
        }
    }

    async fn write_to_log(&self, host: &dyn EditorHost, text: &str, clear: bool) -> Result<()> {
        let surface = host.log_surface();

        host.set_read_only(surface, false).await?;
        let written = async {
            if clear {
                host.clear_surface(surface).await?;
            }
            host.append_text(surface, text).await
        }
        .await;
        let restored = host.set_read_only(surface, true).await;

        written?;
        restored?;
        host.show_surface(surface).await
    }

    async fn write_to_file(
        &self,
        host: &dyn EditorHost,
        path: &Path,
        text: &str,
        clear: bool,
        auto_save: bool,
    ) -> Result<()> {
        ensure_file(path).await?;

        let _turn = self.slot.turn.lock().await;
        let written = self.fill_destination(host, path, text, clear, auto_save).await;
        match &written {
            Ok(()) => self.slot.set(SlotState::Idle),
            Err(e) => {
                warn!("Could not write results to {}: {e}", path.display());
                self.slot.set(SlotState::Failed {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        }
        written
    }

    async fn fill_destination(
        &self,
        host: &dyn EditorHost,
        path: &Path,
        text: &str,
        clear: bool,
        auto_save: bool,
    ) -> Result<()> {
        let surface = host.open_or_create_file(path).await?;
        self.slot.set(SlotState::Opening {
            path: path.to_path_buf(),
            surface,
        });

        let mut polls = 0;
        while host.is_surface_loading(surface).await? {
            if polls >= self.max_polls {
                return Err(AqlExecError::destination(format!(
                    "{} still loading after {polls} checks",
                    path.display()
                )));
            }
            polls += 1;
            tokio::time::sleep(self.poll_interval).await;
        }

        self.slot.set(SlotState::Ready {
            path: path.to_path_buf(),
            surface,
        });
        if clear {
            host.clear_surface(surface).await?;
        }
        host.append_text(surface, text).await?;
        if auto_save {
            host.save(surface).await?;
        }
        Ok(())
    }
}

impl Default for ResultSink {
    fn default() -> Self {
        Self::new()
    }
}

//! Host used by the `aqlexec` binary.
//!
//! The log surface is stdout. Result files are written straight through to
//! disk on every change, so they never stay dirty and never report loading.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::{EditorHost, Selection, SurfaceId};
use crate::error::{AqlExecError, Result};

const STDOUT_SURFACE: SurfaceId = SurfaceId(0);

#[derive(Debug, Default)]
struct HeadlessState {
    next_id: u64,
    files: HashMap<SurfaceId, (PathBuf, String)>,
    completions: Vec<(String, String)>,
}

/// Editor host for running queries from the command line.
#[derive(Debug)]
pub struct HeadlessHost {
    document_path: Option<PathBuf>,
    buffer: String,
    selections: Vec<Selection>,
    state: Mutex<HeadlessState>,
}

impl HeadlessHost {
    pub fn new(document_path: Option<PathBuf>, buffer: String, selections: Vec<Selection>) -> Self {
        Self {
            document_path,
            buffer,
            selections,
            state: Mutex::new(HeadlessState {
                next_id: STDOUT_SURFACE.0 + 1,
                ..Default::default()
            }),
        }
    }

    /// Reads the document to run from `path`.
    pub fn from_file(path: &Path, selections: Vec<Selection>) -> Result<Self> {
        let buffer = std::fs::read_to_string(path)?;
        Ok(Self::new(Some(path.to_path_buf()), buffer, selections))
    }

    pub fn completions(&self) -> Vec<(String, String)> {
        self.state()
            .map(|state| state.completions.clone())
            .unwrap_or_default()
    }

    fn state(&self) -> Result<MutexGuard<'_, HeadlessState>> {
        self.state
            .lock()
            .map_err(|_| AqlExecError::internal("headless host lock poisoned"))
    }

    /// Applies `f` to a file surface and returns what to write to disk.
    fn update_file(
        &self,
        surface: SurfaceId,
        f: impl FnOnce(&mut String),
    ) -> Result<(PathBuf, String)> {
        let mut state = self.state()?;
        let (path, text) = state
            .files
            .get_mut(&surface)
            .ok_or_else(|| AqlExecError::internal(format!("unknown surface {}", surface.0)))?;
        f(text);
        Ok((path.clone(), text.clone()))
    }

    async fn write_file(&self, surface: SurfaceId, f: impl FnOnce(&mut String)) -> Result<()> {
        let (path, text) = self.update_file(surface, f)?;
        tokio::fs::write(&path, text.as_bytes())
            .await
            .map_err(|e| AqlExecError::destination(format!("{}: {e}", path.display())))
    }
}

#[async_trait]
impl EditorHost for HeadlessHost {
    fn log_surface(&self) -> SurfaceId {
        STDOUT_SURFACE
    }

    async fn append_text(&self, surface: SurfaceId, text: &str) -> Result<()> {
        if surface == STDOUT_SURFACE {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
            return Ok(());
        }
        self.write_file(surface, |contents| contents.push_str(text))
            .await
    }

    async fn clear_surface(&self, surface: SurfaceId) -> Result<()> {
        if surface == STDOUT_SURFACE {
            return Ok(());
        }
        self.write_file(surface, String::clear).await
    }

    async fn set_read_only(&self, _surface: SurfaceId, _read_only: bool) -> Result<()> {
        Ok(())
    }

    async fn show_surface(&self, _surface: SurfaceId) -> Result<()> {
        Ok(())
    }

    async fn is_surface_loading(&self, _surface: SurfaceId) -> Result<bool> {
        Ok(false)
    }

    async fn open_or_create_file(&self, path: &Path) -> Result<SurfaceId> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AqlExecError::destination(format!("{}: {e}", path.display())))?;

        let mut state = self.state()?;
        let id = SurfaceId(state.next_id);
        state.next_id += 1;
        state.files.insert(id, (path.to_path_buf(), text));
        Ok(id)
    }

    async fn save(&self, _surface: SurfaceId) -> Result<()> {
        Ok(())
    }

    fn current_document_path(&self) -> Option<PathBuf> {
        self.document_path.clone()
    }

    fn current_selections(&self) -> Vec<Selection> {
        self.selections.clone()
    }

    fn buffer_text(&self) -> String {
        self.buffer.clone()
    }

    fn set_completions(&self, completions: Vec<(String, String)>) {
        if let Ok(mut state) = self.state() {
            state.completions = completions;
        }
    }
}

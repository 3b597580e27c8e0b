//! In-memory editor host for testing.
//!
//! Surfaces are plain strings. Opened files can be made to report "loading"
//! for a number of polls, and every mutation is recorded as a [`HostEvent`].

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::{EditorHost, Selection, SurfaceId};
use crate::error::{AqlExecError, Result};

const LOG_SURFACE: SurfaceId = SurfaceId(0);

/// A mutation performed on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Open(PathBuf),
    Clear(SurfaceId),
    Append(SurfaceId, String),
    Save(SurfaceId),
    Show(SurfaceId),
}

#[derive(Debug, Default)]
struct MemorySurface {
    text: String,
    read_only: bool,
    loading_polls: u32,
    path: Option<PathBuf>,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: u64,
    surfaces: HashMap<SurfaceId, MemorySurface>,
    files: HashMap<PathBuf, SurfaceId>,
    events: Vec<HostEvent>,
    completions: Vec<(String, String)>,
}

/// Editor host backed by in-memory surfaces.
#[derive(Debug)]
pub struct MemoryHost {
    state: Mutex<MemoryState>,
    document_path: Option<PathBuf>,
    buffer: String,
    selections: Vec<Selection>,
    loading_polls: u32,
}

impl MemoryHost {
    /// Creates a host with an empty, unnamed document.
    pub fn new() -> Self {
        let mut state = MemoryState {
            next_id: LOG_SURFACE.0 + 1,
            ..Default::default()
        };
        state.surfaces.insert(
            LOG_SURFACE,
            MemorySurface {
                read_only: true,
                ..Default::default()
            },
        );

        Self {
            state: Mutex::new(state),
            document_path: None,
            buffer: String::new(),
            selections: Vec::new(),
            loading_polls: 0,
        }
    }

    /// Sets the current document.
    pub fn with_document(mut self, path: Option<PathBuf>, text: impl Into<String>) -> Self {
        self.document_path = path;
        self.buffer = text.into();
        self
    }

    pub fn with_selections(mut self, selections: Vec<Selection>) -> Self {
        self.selections = selections;
        self
    }

    /// Newly opened files report loading for this many polls.
    pub fn with_loading_polls(mut self, polls: u32) -> Self {
        self.loading_polls = polls;
        self
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| AqlExecError::internal("memory host lock poisoned"))
    }

    /// Text of a surface, if it exists.
    pub fn surface_text(&self, surface: SurfaceId) -> Option<String> {
        let state = self.state().ok()?;
        state.surfaces.get(&surface).map(|s| s.text.clone())
    }

    /// Text of the log surface.
    pub fn log_text(&self) -> String {
        self.surface_text(LOG_SURFACE).unwrap_or_default()
    }

    /// Text of the surface opened for `path`, if one was opened.
    pub fn file_text(&self, path: &Path) -> Option<String> {
        let id = *self.state().ok()?.files.get(path)?;
        self.surface_text(id)
    }

    pub fn is_read_only(&self, surface: SurfaceId) -> bool {
        self.state()
            .ok()
            .and_then(|state| state.surfaces.get(&surface).map(|s| s.read_only))
            .unwrap_or(false)
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.state()
            .map(|state| state.events.clone())
            .unwrap_or_default()
    }

    pub fn completions(&self) -> Vec<(String, String)> {
        self.state()
            .map(|state| state.completions.clone())
            .unwrap_or_default()
    }

    fn with_surface<T>(
        &self,
        surface: SurfaceId,
        f: impl FnOnce(&mut MemorySurface, &mut Vec<HostEvent>) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.state()?;
        let state = &mut *guard;
        let entry = state
            .surfaces
            .get_mut(&surface)
            .ok_or_else(|| AqlExecError::internal(format!("unknown surface {}", surface.0)))?;
        f(entry, &mut state.events)
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EditorHost for MemoryHost {
    fn log_surface(&self) -> SurfaceId {
        LOG_SURFACE
    }

    async fn append_text(&self, surface: SurfaceId, text: &str) -> Result<()> {
        self.with_surface(surface, |s, events| {
            if s.read_only {
                return Err(AqlExecError::internal(format!(
                    "surface {} is read-only",
                    surface.0
                )));
            }
            s.text.push_str(text);
            events.push(HostEvent::Append(surface, text.to_string()));
            Ok(())
        })
    }

    async fn clear_surface(&self, surface: SurfaceId) -> Result<()> {
        self.with_surface(surface, |s, events| {
            if s.read_only {
                return Err(AqlExecError::internal(format!(
                    "surface {} is read-only",
                    surface.0
                )));
            }
            s.text.clear();
            events.push(HostEvent::Clear(surface));
            Ok(())
        })
    }

    async fn set_read_only(&self, surface: SurfaceId, read_only: bool) -> Result<()> {
        self.with_surface(surface, |s, _| {
            s.read_only = read_only;
            Ok(())
        })
    }

    async fn show_surface(&self, surface: SurfaceId) -> Result<()> {
        self.with_surface(surface, |_, events| {
            events.push(HostEvent::Show(surface));
            Ok(())
        })
    }

    async fn is_surface_loading(&self, surface: SurfaceId) -> Result<bool> {
        self.with_surface(surface, |s, _| {
            if s.loading_polls == 0 {
                Ok(false)
            } else {
                s.loading_polls -= 1;
                Ok(true)
            }
        })
    }

    async fn open_or_create_file(&self, path: &Path) -> Result<SurfaceId> {
        {
            let mut state = self.state()?;
            state.events.push(HostEvent::Open(path.to_path_buf()));
            if let Some(id) = state.files.get(path) {
                return Ok(*id);
            }
        }

        let text = tokio::fs::read_to_string(path).await.unwrap_or_default();

        let mut state = self.state()?;
        if let Some(id) = state.files.get(path) {
            return Ok(*id);
        }
        let id = SurfaceId(state.next_id);
        state.next_id += 1;
        state.surfaces.insert(
            id,
            MemorySurface {
                text,
                read_only: false,
                loading_polls: self.loading_polls,
                path: Some(path.to_path_buf()),
            },
        );
        state.files.insert(path.to_path_buf(), id);
        Ok(id)
    }

    async fn save(&self, surface: SurfaceId) -> Result<()> {
        let (path, text) = self.with_surface(surface, |s, events| {
            events.push(HostEvent::Save(surface));
            Ok((s.path.clone(), s.text.clone()))
        })?;
        if let Some(path) = path {
            tokio::fs::write(path, text).await?;
        }
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

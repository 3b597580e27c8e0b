//! Editor host abstraction.
//!
//! The pipeline never touches editor UI directly. Everything it needs from the
//! host (the buffer and selections, the log surface, result-file surfaces,
//! completions) goes through [`EditorHost`], so the same pipeline can run
//! inside an editor plugin, in the headless binary, or in tests.

mod headless;
mod memory;

pub use headless::HeadlessHost;
pub use memory::{HostEvent, MemoryHost};

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Opaque handle to a text surface owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

/// A selection as a pair of byte offsets into the buffer. Either end may come
/// first; equal ends mean an empty selection (a caret).
pub type Selection = (usize, usize);

/// Text surfaces and document state provided by the host editor.
#[async_trait]
pub trait EditorHost: Send + Sync {
    /// The shared results log surface.
    fn log_surface(&self) -> SurfaceId;

    async fn append_text(&self, surface: SurfaceId, text: &str) -> Result<()>;

    async fn clear_surface(&self, surface: SurfaceId) -> Result<()>;

    async fn set_read_only(&self, surface: SurfaceId, read_only: bool) -> Result<()>;

    /// Brings the surface into view.
    async fn show_surface(&self, surface: SurfaceId) -> Result<()>;

    /// Whether the surface is still loading its file and cannot be edited yet.
    async fn is_surface_loading(&self, surface: SurfaceId) -> Result<bool>;

    /// Opens `path` in a surface. The file already exists on disk.
    async fn open_or_create_file(&self, path: &Path) -> Result<SurfaceId>;

    async fn save(&self, surface: SurfaceId) -> Result<()>;

    /// Path of the document the queries come from, if it has one.
    fn current_document_path(&self) -> Option<PathBuf>;

    fn current_selections(&self) -> Vec<Selection>;

    /// Full text of the current document.
    fn buffer_text(&self) -> String;

    /// Replaces the completion entries offered while editing queries.
    fn set_completions(&self, completions: Vec<(String, String)>);
}

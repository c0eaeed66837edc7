//! The ordered, immutable image collection handed to a playback session.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use image::ImageFormat;
use tracing::{debug, info, instrument, warn};

use crate::error::Error;
use crate::scan::{ScanOptions, scan_with_options};

/// Stable identity of an image within one loaded library.
pub type ImageId = u64;

/// One photo as the playback core sees it.
///
/// Decoded pixels are owned by the renderer; sequencers only refer to items
/// by their index in the library slice.
#[derive(Debug, Clone)]
pub struct ImageItem {
    pub id: ImageId,
    pub filename: String,
    pub path: PathBuf,
    pub is_animated: bool,
    /// Raw file contents, kept only for animated images so the renderer can
    /// drive frame playback itself.
    pub animated_bytes: Option<Arc<[u8]>>,
    pub created_at: Option<SystemTime>,
}

impl ImageItem {
    pub fn from_path(id: ImageId, path: &Path) -> Result<Self, Error> {
        let metadata = fs::metadata(path)?;
        let is_animated = matches!(ImageFormat::from_path(path), Ok(ImageFormat::Gif));
        let animated_bytes = if is_animated {
            Some(Arc::from(fs::read(path)?))
        } else {
            None
        };
        Ok(Self {
            id,
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: path.to_path_buf(),
            is_animated,
            animated_bytes,
            created_at: metadata.created().or_else(|_| metadata.modified()).ok(),
        })
    }
}

/// Shared, read-only image collection for one session.
pub type Library = Arc<[ImageItem]>;

/// Build library items from already discovered paths.
///
/// Unreadable files are skipped with a warning rather than failing the load.
pub fn build_library(paths: &[PathBuf]) -> Library {
    let mut items = Vec::with_capacity(paths.len());
    for path in paths {
        match ImageItem::from_path(items.len() as ImageId, path) {
            Ok(item) => {
                debug!(path = %path.display(), animated = item.is_animated, "library item");
                items.push(item);
            }
            Err(err) => warn!(path = %path.display(), error = %err, "skipping unreadable image"),
        }
    }
    items.into()
}

/// Scan `roots` and build the library off the async executor.
///
/// Playback must only start once this has resolved.
#[instrument(skip(opts), fields(roots = roots.len()))]
pub async fn load_library(roots: Vec<PathBuf>, opts: ScanOptions) -> Result<Library, Error> {
    let library = tokio::task::spawn_blocking(move || -> Result<Library, Error> {
        let paths = scan_with_options(&roots, &opts)?;
        Ok(build_library(&paths))
    })
    .await
    .map_err(|err| Error::Io(std::io::Error::other(err)))??;
    info!(images = library.len(), "library loaded");
    Ok(library)
}

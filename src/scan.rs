//! Directory scanning utilities for discovering image files.

use std::path::{Path, PathBuf};

use image::ImageFormat;
use walkdir::{DirEntry, WalkDir};

use crate::error::Error;

const SUPPORTED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
    ImageFormat::Bmp,
    ImageFormat::Tiff,
];

/// Options controlling directory scanning.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional maximum recursion depth. `None` or `Some(0)` means unlimited.
    pub max_depth: Option<usize>,
    /// Optional override for allowed extensions (lowercase, without dot).
    pub exts: Option<Vec<String>>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            max_depth: None,
            exts: None,
        }
    }
}

/// Return `true` if `path` has an allowed image extension.
#[must_use]
pub fn is_supported_image(path: &Path, exts: Option<&[String]>) -> bool {
    let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    match exts {
        Some(allowed) => allowed.iter().any(|e| *e == ext),
        None => ImageFormat::from_extension(&ext).is_some_and(|f| SUPPORTED_FORMATS.contains(&f)),
    }
}

/// Scan the given `paths` for images using the provided options.
///
/// Files come back grouped by root in the order the roots were given, each
/// root walked in file-name order.
///
/// # Errors
/// Returns [`Error::BadDir`] if any path is missing or not a directory.
pub fn scan_with_options(paths: &[PathBuf], opts: &ScanOptions) -> Result<Vec<PathBuf>, Error> {
    let bad: Vec<String> = paths
        .iter()
        .filter(|p| !p.is_dir())
        .map(|p| p.to_string_lossy().into_owned())
        .collect();
    if !bad.is_empty() {
        return Err(Error::BadDir(bad.join(", ")));
    }

    let mut out = Vec::new();
    for root in paths {
        let mut wd = WalkDir::new(root).follow_links(true).sort_by_file_name();
        if !opts.recursive {
            wd = wd.max_depth(1);
        } else if let Some(d) = opts.max_depth
            && d > 0
        {
            wd = wd.max_depth(d);
        }

        for entry in wd
            .into_iter()
            .filter_entry(|e| !should_skip_dir(e))
            .flatten()
        {
            let path = entry.path();
            if entry.file_type().is_file() && is_supported_image(path, opts.exts.as_deref()) {
                out.push(path.to_path_buf());
            }
        }
    }

    Ok(out)
}

fn should_skip_dir(entry: &DirEntry) -> bool {
    // Never skip the root; tempfile roots can be dot-dirs.
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .is_some_and(|n| n.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_extensions_follow_image_formats() {
        assert!(is_supported_image(Path::new("a/b.JPG"), None));
        assert!(is_supported_image(Path::new("loop.gif"), None));
        assert!(is_supported_image(Path::new("x.tiff"), None));
        assert!(!is_supported_image(Path::new("notes.txt"), None));
        assert!(!is_supported_image(Path::new("no_extension"), None));
    }

    #[test]
    fn explicit_extensions_override_defaults() {
        let only_png = vec!["png".to_string()];
        assert!(is_supported_image(Path::new("a.png"), Some(&only_png)));
        assert!(!is_supported_image(Path::new("a.jpg"), Some(&only_png)));
    }
}

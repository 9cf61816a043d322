//! # File Management Module
//!
//! Questo modulo gestisce le operazioni sui file del batch.
//!
//! ## Responsabilità:
//! - Espansione degli input: file, directory (ricorsive) e pattern glob
//! - Esclusione dei file "junk" (`.DS_Store`, `Thumbs.db`, ...)
//! - Riconoscimento delle varianti `@2x`
//! - Calcolo del path di destinazione in modalità `--out-dir`
//! - Svuotamento ricorsivo di una directory preservandone la struttura
//!
//! ## Espansione degli input:
//! - File esistente → preso così com'è
//! - Directory esistente → tutti i file regolari al suo interno, ordinati
//! - Pattern con `*`, `?` o `[` → espanso con `glob`, solo file
//! - Altro → ignorato (con un warning)
//!
//! ## Esempio:
//! ```ignore
//! let files = FileManager::expand_inputs(&["images/*.png".to_string(), "icons".to_string()])?;
//! for file in files {
//!     // optimize file
//! }
//! ```

use crate::error::Result;
use crate::format::ImageKind;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Extensions of the high-resolution variants `--delete2x` drops
const RETINA_EXTENSIONS: &[&str] = &["png", "jpeg", "jpg", "gif"];

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Expand paths, directories and glob patterns into the list of files to
    /// optimize, in input order and without duplicates.
    pub fn expand_inputs<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut seen = HashSet::new();

        for input in inputs {
            let input = input.as_ref();
            let path = Path::new(input);

            let found = if path.is_file() {
                vec![path.to_path_buf()]
            } else if path.is_dir() {
                Self::find_files(path)
            } else if Self::is_glob(input) {
                Self::expand_glob(input)?
            } else {
                warn!("Skipping missing input: {}", input);
                Vec::new()
            };

            for file in found {
                if Self::is_junk(&file) {
                    debug!("Ignoring junk file {}", file.display());
                    continue;
                }
                if seen.insert(file.clone()) {
                    files.push(file);
                }
            }
        }

        Ok(files)
    }

    /// Find all regular files below a directory, sorted. Symlinks are
    /// followed, so a linked image is listed under the link's path.
    pub fn find_files(dir: &Path) -> Vec<PathBuf> {
        WalkDir::new(dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect()
    }

    fn is_glob(input: &str) -> bool {
        input.contains(['*', '?', '['])
    }

    fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
        let files = glob::glob(pattern)?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Failed to read glob entry: {}", e);
                    None
                }
            })
            .filter(|path| path.is_file())
            .collect();
        Ok(files)
    }

    /// OS metadata files that are never images
    pub fn is_junk(path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        matches!(
            name,
            ".DS_Store" | ".AppleDouble" | ".LSOverride" | "Thumbs.db" | "ehthumbs.db" | "desktop.ini" | "npm-debug.log"
        ) || name.starts_with("._")
    }

    /// Whether a path names an `@2x` variant: something, then `@2x.` and one
    /// of png/jpeg/jpg/gif at the very end. Case-sensitive.
    pub fn is_retina_variant(path: &Path) -> bool {
        let path = path.to_string_lossy();
        match path.rsplit_once("@2x.") {
            Some((stem, extension)) => !stem.is_empty() && RETINA_EXTENSIONS.contains(&extension),
            None => false,
        }
    }

    /// Where an optimized file lands in `destination`: same file name, with a
    /// `.webp` extension when the plugins turned it into WebP.
    pub fn destination_path(
        source: &Path,
        destination: &Path,
        source_kind: Option<ImageKind>,
        output_kind: Option<ImageKind>,
    ) -> PathBuf {
        let file_name = source.file_name().unwrap_or(source.as_os_str());
        let target = destination.join(file_name);

        if output_kind == Some(ImageKind::WebP) && source_kind != Some(ImageKind::WebP) {
            target.with_extension("webp")
        } else {
            target
        }
    }

    /// Delete every file below `dir`, keeping the directory tree itself.
    /// A missing directory is a no-op.
    pub fn clear_dir(dir: &Path) -> io::Result<()> {
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                Self::clear_dir(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"data").unwrap();
    }

    #[test]
    fn test_retina_variant_pattern() {
        assert!(FileManager::is_retina_variant(Path::new("images/logo@2x.png")));
        assert!(FileManager::is_retina_variant(Path::new("x@2x.jpeg")));
        assert!(FileManager::is_retina_variant(Path::new("x@2x.gif")));
        assert!(!FileManager::is_retina_variant(Path::new("x.png")));
        assert!(!FileManager::is_retina_variant(Path::new("@2x.png")));
        assert!(!FileManager::is_retina_variant(Path::new("x@2x.PNG")));
        assert!(!FileManager::is_retina_variant(Path::new("x@2x.svg")));
        assert!(!FileManager::is_retina_variant(Path::new("x@2x.png.bak")));
    }

    #[test]
    fn test_clear_dir_keeps_structure() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("a.png"));
        touch(&root.join("nested/b.png"));
        touch(&root.join("nested/deeper/c.gif"));
        fs::create_dir_all(root.join("empty")).unwrap();

        FileManager::clear_dir(root).unwrap();

        assert!(root.join("nested/deeper").is_dir());
        assert!(root.join("empty").is_dir());
        assert!(FileManager::find_files(root).is_empty());
    }

    #[test]
    fn test_clear_missing_dir_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        assert!(FileManager::clear_dir(&temp_dir.path().join("missing")).is_ok());
    }

    #[test]
    fn test_expand_directory_and_glob() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("b.png"));
        touch(&root.join("a.png"));
        touch(&root.join("sub/c.jpg"));
        touch(&root.join(".DS_Store"));

        let files = FileManager::expand_inputs(&[root.to_string_lossy().to_string()]).unwrap();
        assert_eq!(files, vec![root.join("a.png"), root.join("b.png"), root.join("sub/c.jpg")]);

        let pattern = format!("{}/*.png", root.display());
        let single = root.join("a.png").to_string_lossy().to_string();
        let files = FileManager::expand_inputs(&[single, pattern]).unwrap();
        assert_eq!(files, vec![root.join("a.png"), root.join("b.png")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_find_files_follows_symlinks() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("images");
        touch(&root.join("a.png"));
        touch(&temp_dir.path().join("real.png"));
        std::os::unix::fs::symlink(temp_dir.path().join("real.png"), root.join("linked.png")).unwrap();

        assert_eq!(FileManager::find_files(&root), vec![root.join("a.png"), root.join("linked.png")]);
    }

    #[test]
    fn test_expand_skips_missing_paths() {
        let files = FileManager::expand_inputs(&["/definitely/not/here.png"]).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_destination_path_switches_to_webp() {
        let dest = Path::new("build");
        assert_eq!(
            FileManager::destination_path(Path::new("src/a.png"), dest, Some(ImageKind::Png), Some(ImageKind::Png)),
            PathBuf::from("build/a.png")
        );
        assert_eq!(
            FileManager::destination_path(Path::new("src/a.png"), dest, Some(ImageKind::Png), Some(ImageKind::WebP)),
            PathBuf::from("build/a.webp")
        );
    }
}

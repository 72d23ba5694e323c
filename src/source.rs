// Document discovery and loading (local files only)
use crate::fixup::fixup;
use crate::verifier::Diagnostic;
use crate::xml::{parse_bytes, Element};
use crate::{Error, Result};
#[cfg(feature = "mmap")]
use memmap2::Mmap;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File identifier -> namespace-resolved tree.
pub type Documents = BTreeMap<String, Element>;

/// Result of loading a directory: the readable documents plus one
/// [`Diagnostic::LoadFailure`] per file that could not be loaded.
#[derive(Debug, Default)]
pub struct Loaded {
    pub documents: Documents,
    pub failures: Vec<Diagnostic>,
}

/// Regular files directly inside `dir`, sorted by name. An empty `extensions`
/// list accepts every file; otherwise extensions match case-insensitively.
pub fn discover(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::NotFound(dir.display().to_string()));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let accepted = extensions.is_empty()
            || path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)));
        if accepted {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Identifier of a discovered file: its file name.
pub fn file_id(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Run `f` over the raw bytes of a file.
#[cfg(not(feature = "mmap"))]
pub fn with_contents<T>(path: &Path, f: impl FnOnce(&[u8]) -> T) -> Result<T> {
    let content = std::fs::read(path)?;
    Ok(f(&content))
}

/// Run `f` over the raw bytes of a file, memory-mapped.
#[cfg(feature = "mmap")]
pub fn with_contents<T>(path: &Path, f: impl FnOnce(&[u8]) -> T) -> Result<T> {
    let file = std::fs::File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(f(&[]));
    }
    // SAFETY: the mapping is read-only and dropped before returning
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(f(&mmap))
}

/// Parse raw bytes and resolve namespaces.
pub fn load_document(data: &[u8]) -> Result<Element> {
    let tree = parse_bytes(data)?;
    Ok(fixup(tree)?)
}

/// Load every discovered file of `dir`. Fails only when the directory itself
/// cannot be listed.
pub fn load_directory(dir: &Path, extensions: &[String]) -> Result<Loaded> {
    let mut loaded = Loaded::default();
    for path in discover(dir, extensions)? {
        let id = file_id(&path);
        match with_contents(&path, load_document).and_then(|doc| doc) {
            Ok(root) => {
                tracing::debug!(file = %id, "loaded");
                loaded.documents.insert(id, root);
            }
            Err(err) => {
                tracing::warn!(file = %id, reason = %err, "failed to load");
                loaded.failures.push(Diagnostic::LoadFailure {
                    file: id,
                    reason: err.to_string(),
                });
            }
        }
    }
    Ok(loaded)
}

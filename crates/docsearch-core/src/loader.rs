//! Directory loader: one `Document` per non-empty text file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::types::Document;

pub const META_FILENAME: &str = "filename";
pub const META_PATH: &str = "path";

/// Outcome of a directory scan. Files that could not be read are listed in
/// `skipped` together with the reason instead of failing the whole load.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub documents: Vec<Document>,
    pub skipped: Vec<(PathBuf, String)>,
}

#[derive(Debug, Clone)]
pub struct DocumentLoader {
    extensions: Vec<String>,
}

impl Default for DocumentLoader {
    fn default() -> Self { Self { extensions: vec!["txt".to_string()] } }
}

impl DocumentLoader {
    pub fn new() -> Self { Self::default() }

    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { extensions: extensions.into_iter().map(|e| e.into().trim_start_matches('.').to_lowercase()).collect() }
    }

    pub fn load_documents(&self, dir: &Path) -> Result<Vec<Document>> { Ok(self.load(dir)?.documents) }

    pub fn load(&self, dir: &Path) -> Result<LoadReport> {
        if !dir.exists() { return Err(Error::SourceNotFound(dir.to_path_buf())); }
        if !dir.is_dir() { return Err(Error::SourceInvalid(dir.to_path_buf())); }

        let mut report = LoadReport::default();
        for path in self.list_files(dir, &mut report) {
            match read_document(&path) {
                Ok(Some(doc)) => report.documents.push(doc),
                Ok(None) => debug!(path = %path.display(), "skipping empty file"),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load document");
                    report.skipped.push((path, e.to_string()));
                }
            }
        }
        debug!(dir = %dir.display(), loaded = report.documents.len(), skipped = report.skipped.len(), "directory scanned");
        Ok(report)
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension().and_then(|s| s.to_str()).map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))).unwrap_or(false)
    }

    /// Symlinks are followed; entries that cannot be resolved (dangling
    /// links, permission errors) are recorded in `report.skipped`.
    fn list_files(&self, dir: &Path, report: &mut LoadReport) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir).follow_links(true).min_depth(1).max_depth(1) {
            match entry {
                Ok(e) if e.file_type().is_file() && self.matches(e.path()) => files.push(e.into_path()),
                Ok(_) => {}
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
                    if e.path().is_some_and(|p| !self.matches(p)) { continue; }
                    warn!(path = %path.display(), error = %e, "failed to read directory entry");
                    report.skipped.push((path, e.to_string()));
                }
            }
        }
        files.sort();
        files
    }
}

fn read_document(path: &Path) -> Result<Option<Document>> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8(bytes).map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    let text = text.trim();
    if text.is_empty() { return Ok(None); }
    let id = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
    let filename = path.file_name().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
    Ok(Some(Document::new(id, text).with_meta(META_FILENAME, filename).with_meta(META_PATH, path.to_string_lossy())))
}

//! Enumerates `{root}/{source}/{category}/pdfs` directories and the PDFs
//! inside them.
//!
//! The input tree may change underneath us while a sweep is running. Entries
//! that vanish or cannot be read are logged and skipped; only an unreadable
//! root is reported to the caller.

use std::fs::{self, ReadDir};
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{FigbatchError, Result};
use crate::filter::FileFilter;

/// A category directory holding PDFs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDir {
    pub source: String,
    pub category: String,
    pub pdf_dir: PathBuf,
}

/// A single PDF found by the recursive walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub source: String,
    pub category: String,
    pub path: PathBuf,
}

/// Lazily lists `{root}/*/*/{pdf_dir_name}` two levels at a time.
pub fn category_dirs(root: &Path, pdf_dir_name: &str) -> Result<CategoryDirs> {
    let sources = fs::read_dir(root).map_err(|source| FigbatchError::Listing {
        path: root.to_path_buf(),
        source,
    })?;
    Ok(CategoryDirs {
        pdf_dir_name: pdf_dir_name.to_string(),
        sources,
        current: None,
    })
}

/// Iterator returned by [`category_dirs`].
pub struct CategoryDirs {
    pdf_dir_name: String,
    sources: ReadDir,
    current: Option<(String, ReadDir)>,
}

impl Iterator for CategoryDirs {
    type Item = CategoryDir;

    fn next(&mut self) -> Option<CategoryDir> {
        loop {
            if let Some((source, categories)) = self.current.as_mut() {
                match categories.next() {
                    Some(Ok(entry)) => {
                        let Some(category) = utf8_name(&entry.path()) else {
                            continue;
                        };
                        let pdf_dir = entry.path().join(&self.pdf_dir_name);
                        if pdf_dir.is_dir() {
                            return Some(CategoryDir {
                                source: source.clone(),
                                category,
                                pdf_dir,
                            });
                        }
                        continue;
                    }
                    Some(Err(err)) => {
                        tracing::warn!(source = %source, error = %err, "skipping unreadable category entry");
                        continue;
                    }
                    None => {}
                }
            }
            self.current = None;

            let entry = match self.sources.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable source entry");
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(source) = utf8_name(&path) else {
                continue;
            };
            match fs::read_dir(&path) {
                Ok(categories) => self.current = Some((source, categories)),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable source directory");
                }
            }
        }
    }
}

/// Walks the whole tree and yields every file whose directory sits at least
/// two levels below `root`.
///
/// The category is the second-to-last segment of the file's directory path
/// and the source the third-to-last, so `root/arxiv/cancer/pdfs/a.pdf`
/// resolves to (`arxiv`, `cancer`).
pub fn walk_files(root: &Path) -> impl Iterator<Item = DiscoveredFile> {
    WalkDir::new(root)
        .min_depth(3)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(error = %err, "skipping entry during walk");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let dir = entry.path().parent()?;
            let (source, category) = source_and_category(dir)?;
            Some(DiscoveredFile {
                source,
                category,
                path: entry.into_path(),
            })
        })
}

fn source_and_category(dir: &Path) -> Option<(String, String)> {
    let segments: Vec<&str> = dir
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .collect();
    let n = segments.len();
    if n < 3 {
        return None;
    }
    Some((segments[n - 3].to_string(), segments[n - 2].to_string()))
}

/// Non-recursive, name-sorted listing of the regular files in `dir` that
/// pass `filter`.
pub fn list_pdfs(dir: &Path, filter: &FileFilter) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| FigbatchError::Listing {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(err) => {
                tracing::warn!(dir = %dir.display(), error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|p| p.is_file() && filter.matches(p))
        .collect();
    files.sort();
    Ok(files)
}

fn utf8_name(path: &Path) -> Option<String> {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => Some(name.to_string()),
        None => {
            tracing::warn!(path = %path.display(), "skipping non UTF-8 directory name");
            None
        }
    }
}

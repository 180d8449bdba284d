use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::PublishError;

/// Top-level directory that is never published.
pub const DEFAULT_RESERVED_NAME: &str = "data";

/// Directory name pruned at any depth.
pub const DEFAULT_CACHE_MARKER: &str = "__pycache__";

/// A local file eligible for publishing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path relative to the source root, always `/`-separated.
    pub relative_path: String,
    pub absolute_path: PathBuf,
}

/// A single entry that could not be enumerated. Never fatal to a run.
#[derive(Debug, thiserror::Error)]
pub enum EnumerateError {
    #[error("failed to read {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to resolve link {}: {source}", .path.display())]
    Link {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8(PathBuf),
}

impl EnumerateError {
    pub fn path(&self) -> &Path {
        match self {
            Self::Walk { path, .. } | Self::Link { path, .. } | Self::NonUtf8(path) => path,
        }
    }

    /// The failing path below `root`, `/`-separated. Segments that are not
    /// valid UTF-8 are converted lossily.
    pub fn relative_path(&self, root: &Path) -> String {
        let path = self.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Walks a source root and yields the files to publish.
///
/// Two exclusions apply:
/// - anything whose first segment is the reserved name (`data/` by default),
/// - any directory named like the cache marker (`__pycache__` by default),
///   wherever it appears. Pruned directories are never descended into.
#[derive(Debug, Clone)]
pub struct Enumerator {
    root: PathBuf,
    reserved_name: String,
    cache_marker: String,
}

impl Enumerator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            reserved_name: DEFAULT_RESERVED_NAME.to_owned(),
            cache_marker: DEFAULT_CACHE_MARKER.to_owned(),
        }
    }

    pub fn with_reserved_name(mut self, name: impl Into<String>) -> Self {
        self.reserved_name = name.into();
        self
    }

    pub fn with_cache_marker(mut self, marker: impl Into<String>) -> Self {
        self.cache_marker = marker.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fails if the root is missing, not a directory, or unreadable.
    pub fn check_root(&self) -> Result<(), PublishError> {
        if !self.root.is_dir() {
            return Err(PublishError::SourceNotFound(self.root.clone()));
        }
        std::fs::read_dir(&self.root).map_err(|source| PublishError::SourceUnreadable {
            path: self.root.clone(),
            source,
        })?;
        Ok(())
    }

    /// Start a lazy walk. Entries come back sorted by file name within each
    /// directory, so the order is stable for an unchanged tree.
    pub fn entries(&self) -> Result<Entries, PublishError> {
        self.check_root()?;

        let reserved_name = self.reserved_name.clone();
        let cache_marker = self.cache_marker.clone();
        let keep: EntryFilter = Box::new(move |entry: &DirEntry| {
            is_kept(entry, &reserved_name, &cache_marker)
        });

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(keep);

        Ok(Entries {
            walker,
            root: self.root.clone(),
        })
    }
}

type EntryFilter = Box<dyn FnMut(&DirEntry) -> bool + Send>;

/// Iterator returned by [`Enumerator::entries`].
pub struct Entries {
    walker: walkdir::FilterEntry<walkdir::IntoIter, EntryFilter>,
    root: PathBuf,
}

impl Iterator for Entries {
    type Item = Result<FileEntry, EnumerateError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(source) => {
                    let path = source
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    return Some(Err(EnumerateError::Walk { path, source }));
                }
            };

            // Links are resolved but never descended. Only links to files count.
            if entry.path_is_symlink() {
                match std::fs::metadata(entry.path()) {
                    Ok(metadata) if metadata.is_file() => {}
                    Ok(_) => continue,
                    Err(source) => {
                        return Some(Err(EnumerateError::Link {
                            path: entry.into_path(),
                            source,
                        }));
                    }
                }
            } else if !entry.file_type().is_file() {
                continue;
            }

            let relative = relative_path(&self.root, entry.path());
            return Some(relative.map(|relative_path| FileEntry {
                relative_path,
                absolute_path: entry.into_path(),
            }));
        }
    }
}

fn is_kept(entry: &DirEntry, reserved_name: &str, cache_marker: &str) -> bool {
    if entry.depth() == 0 {
        return true;
    }

    let name = entry.file_name();
    if entry.depth() == 1 && name == reserved_name {
        return false;
    }

    !(entry.file_type().is_dir() && name == cache_marker)
}

/// Join the components below `root` with `/`, regardless of platform.
fn relative_path(root: &Path, path: &Path) -> Result<String, EnumerateError> {
    let relative = path.strip_prefix(root).unwrap_or(path);

    let segments = relative
        .components()
        .map(|component| {
            component
                .as_os_str()
                .to_str()
                .ok_or_else(|| EnumerateError::NonUtf8(path.to_path_buf()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(segments.join("/"))
}

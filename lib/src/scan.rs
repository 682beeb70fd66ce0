use std::fmt;
use std::path::{Path, PathBuf, Component};

use jwalk::WalkDir;

use crate::error::{Result, Chainable};

/// A lazy, sorted sequence of the regular files under a root directory.
///
/// Yields `Ok(Entry)` for each matching file and `Err` for any directory
/// that could not be read. A root that does not exist yields nothing.
pub struct Scan {
    root: PathBuf,
    extension: Option<String>,
    walker: Option<jwalk::DirEntryIter<((), ())>>,
}

/// A regular file discovered by a [`Scan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The full path to the file.
    pub path: PathBuf,
    /// The path relative to the scan root.
    pub relative: PathBuf,
}

impl Scan {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Scan { root: root.as_ref().to_path_buf(), extension: None, walker: None }
    }

    /// Only yield files with the extension `ext`, compared ASCII
    /// case-insensitively.
    pub fn extension(mut self, ext: &str) -> Self {
        self.extension = Some(ext.trim_start_matches('.').to_string());
        self
    }

    fn matches(&self, path: &Path) -> bool {
        match &self.extension {
            Some(wanted) => path.extension()
                .and_then(|e| e.to_str())
                .map_or(false, |ext| ext.eq_ignore_ascii_case(wanted)),
            None => true,
        }
    }

    fn entry(&self, path: PathBuf) -> Result<Entry> {
        let relative = path.strip_prefix(&self.root)
            .map(|p| p.to_path_buf())
            .map_err(|_| error! {
                "scanned file escaped the scan root",
                "scan root" => self.root.display(),
                "file" => path.display(),
            })?;

        Ok(Entry { path, relative })
    }
}

impl Iterator for Scan {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.walker.is_none() {
            if !self.root.is_dir() {
                return None;
            }

            self.walker = Some(WalkDir::new(&self.root)
                .sort(true)
                .follow_links(true)
                .skip_hidden(true)
                .into_iter());
        }

        loop {
            let entry = match self.walker.as_mut()?.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e).chain_with(|| error! {
                    "file scan failed",
                    "scan root" => self.root.display(),
                })),
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if self.matches(&path) {
                return Some(self.entry(path));
            }
        }
    }
}

impl fmt::Debug for Scan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scan")
            .field("root", &self.root)
            .field("extension", &self.extension)
            .finish()
    }
}

impl Entry {
    /// File name without the extension.
    pub fn stem(&self) -> &str {
        self.relative.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }

    /// The final extension, if any.
    pub fn ext(&self) -> Option<&str> {
        self.relative.extension().and_then(|e| e.to_str())
    }

    /// The relative path with `/` separators on every platform.
    pub fn relative_url(&self) -> String {
        let mut url = String::new();
        for component in self.relative.components() {
            if let Component::Normal(s) = component {
                if !url.is_empty() {
                    url.push('/');
                }

                url.push_str(&s.to_string_lossy());
            }
        }

        url
    }
}

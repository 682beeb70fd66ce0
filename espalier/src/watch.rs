//! Rebuilds the site when its sources change.
//!
//! ```text
//!  notify events --> Debouncer (300ms) --> Change::Html   --> Site::html()
//!                                      \-> Change::Public --> Site::public()
//! ```

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;

use trellis::error::{Chainable, Result};
use trellis::error;

use crate::build::Site;

const DEBOUNCE_MS: u64 = 300;

/// What a changed path requires to be rebuilt.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Change {
    /// A page, template, data file or Markdown include.
    Html,
    /// A public file.
    Public,
}

/// Editor swap files, backups and hidden files.
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Batches rapid file events.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self { pending: FxHashSet::default(), last_event: None }
    }

    fn add(&mut self, event: Event) {
        for path in event.paths {
            if !is_temp_file(&path) {
                self.pending.insert(path);
            }
        }

        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self.last_event.is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        self.pending.drain().collect()
    }

    fn timeout(&self) -> Duration {
        match self.pending.is_empty() {
            true => Duration::from_secs(60),
            false => Duration::from_millis(DEBOUNCE_MS),
        }
    }
}

/// The rebuilds required by the set of changed `paths`.
pub fn classify(site: &Site, paths: &[PathBuf]) -> FxHashSet<Change> {
    let config = &site.config;
    let html = [config.content(), config.templates(), config.data(), config.markdown()];
    let public = config.public();

    paths.iter()
        .filter_map(|path| {
            if html.iter().any(|dir| path.starts_with(dir)) {
                Some(Change::Html)
            } else if path.starts_with(&public) {
                Some(Change::Public)
            } else {
                None
            }
        })
        .collect()
}

fn rebuild(site: &Site, changes: &FxHashSet<Change>) {
    if changes.contains(&Change::Public) {
        match site.public() {
            Ok(n) => log::info!("copied {n} public file(s)"),
            Err(e) => log::error!("public copy failed\n{e}"),
        }
    }

    if changes.contains(&Change::Html) {
        let start = Instant::now();
        match site.html() {
            Ok(s) => log::info!("rendered {} page(s) in {}ms", s.pages, start.elapsed().as_millis()),
            Err(e) => log::error!("html build failed\n{e}"),
        }
    }
}

const fn is_relevant(event: &Event) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_))
}

/// Watches the project's source directories and rebuilds what changed,
/// until the watcher shuts down. Build failures are logged, not returned.
pub fn watch(site: &Site) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx)
        .map_err(|e| error!(Io: "failed to create file watcher", e))?;

    let config = &site.config;
    let dirs = [config.content(), config.templates(), config.data(), config.markdown(), config.public()];
    for dir in dirs.iter().filter(|dir| dir.is_dir()) {
        watcher.watch(dir, RecursiveMode::Recursive)
            .map_err(|e| error!(Io: "failed to watch directory", e))
            .chain_with(|| error!("watch failed", "directory" => dir.display()))?;

        log::info!("watching {}", dir.strip_prefix(&config.root).unwrap_or(dir).display());
    }

    let mut debouncer = Debouncer::new();
    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) => debouncer.add(event),
            Ok(Err(e)) => log::warn!("watch error: {e}"),
            Err(RecvTimeoutError::Timeout) if debouncer.ready() => {
                let paths = debouncer.take();
                log::debug!("{} path(s) changed", paths.len());
                rebuild(site, &classify(site, &paths));
            }
            Err(RecvTimeoutError::Disconnected) => break,
            _ => {}
        }
    }

    Ok(())
}

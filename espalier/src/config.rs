use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use trellis::error;
use trellis::error::{Chainable, Result};
use trellis::value::{Format, Toml};

/// A project directory and its settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub settings: Settings,
}

/// The contents of `espalier.toml`. Every path is relative to the project
/// root.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Pages, each rendered to the same relative path in `output`.
    pub content: PathBuf,
    /// Layouts and partials pages may extend or include.
    pub templates: PathBuf,
    /// JSON files exposed to templates as `data`.
    pub data: PathBuf,
    /// Files available to the `markdown` tag.
    pub markdown: PathBuf,
    /// Files copied verbatim into `output`.
    pub public: PathBuf,
    pub output: PathBuf,
    pub port: u16,
    pub minify: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            content: "src/content".into(),
            templates: "src/templates".into(),
            data: "data".into(),
            markdown: "markdown".into(),
            public: "public".into(),
            output: "dist".into(),
            port: 3000,
            minify: false,
        }
    }
}

impl Config {
    /// Reads `espalier.toml` from `root`, if there is one, and applies the
    /// build environment.
    pub fn discover<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let file = root.join(crate::CONFIG_FILE);
        let mut settings: Settings = match file.is_file() {
            true => Toml::read(&file).chain_with(|| error! {
                "invalid configuration",
                "config file" => file.display(),
            })?,
            false => Settings::default(),
        };

        if is_production(std::env::var(crate::ENV_VAR).ok().as_deref()) {
            settings.minify = true;
        }

        log::info!("build mode: {}", if settings.minify { "production" } else { "development" });
        Ok(Config { root, settings })
    }

    pub fn content(&self) -> PathBuf {
        self.root.join(&self.settings.content)
    }

    pub fn templates(&self) -> PathBuf {
        self.root.join(&self.settings.templates)
    }

    pub fn data(&self) -> PathBuf {
        self.root.join(&self.settings.data)
    }

    pub fn markdown(&self) -> PathBuf {
        self.root.join(&self.settings.markdown)
    }

    pub fn public(&self) -> PathBuf {
        self.root.join(&self.settings.public)
    }

    pub fn output(&self) -> PathBuf {
        self.root.join(&self.settings.output)
    }
}

fn is_production(env: Option<&str>) -> bool {
    env.map_or(false, |env| env.trim().eq_ignore_ascii_case("production"))
}

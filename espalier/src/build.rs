use std::path::Path;
use std::time::Instant;

use trellis::rayon::prelude::*;
use trellis::content::{self, Content};
use trellis::context::{ContextBuilder, TemplateContext, PAGE_EXT};
use trellis::error::{Chainable, Result};
use trellis::scan::{Entry, Scan};
use trellis::templating::{is_template, Engine, MiniJinjaEngine};
use trellis::{err, error};

use crate::config::Config;

/// What a build produced.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub pages: usize,
    pub excluded: usize,
    pub assets: usize,
}

/// Runs the build steps for one project.
#[derive(Debug, Clone)]
pub struct Site {
    pub config: Config,
}

impl Site {
    pub fn new(config: Config) -> Self {
        Site { config }
    }

    /// Cleans the output directory, then copies public files and renders
    /// every page into it.
    pub fn build(&self) -> Result<Summary> {
        let start = Instant::now();
        self.clean()?;
        let assets = self.public()?;
        let summary = Summary { assets, ..self.html()? };
        log::info!("built {} page(s) and {} public file(s) in {}ms ({} excluded)",
            summary.pages, summary.assets, start.elapsed().as_millis(), summary.excluded);

        Ok(summary)
    }

    /// Removes the output directory.
    pub fn clean(&self) -> Result<()> {
        let output = self.config.output();
        let resolved = output.canonicalize().unwrap_or_else(|_| output.clone());
        let root = self.config.root.canonicalize().unwrap_or_else(|_| self.config.root.clone());
        if root.starts_with(&resolved) {
            return err! {
                "refusing to clean an output directory that contains the project",
                "output" => output.display(),
                "project root" => self.config.root.display(),
            };
        }

        match std::fs::remove_dir_all(&output) {
            Ok(()) => log::debug!("removed {}", output.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
            Err(e) => return Err(e).chain_with(|| error! {
                "failed to clean output directory",
                "output" => output.display(),
            }),
        }

        Ok(())
    }

    /// Copies every file under the public directory into the output
    /// directory. Returns the number of files copied.
    pub fn public(&self) -> Result<usize> {
        let output = self.config.output();
        let files = Scan::new(self.config.public()).collect::<Result<Vec<_>>>()?;
        files.par_iter()
            .map(|entry| copy(entry, &output.join(&entry.relative)))
            .collect::<Result<Vec<()>>>()?;

        log::debug!("copied {} public file(s)", files.len());
        Ok(files.len())
    }

    /// Assembles the template context and renders every page that is not
    /// excluded.
    pub fn html(&self) -> Result<Summary> {
        let context = ContextBuilder::new(self.config.data(), self.config.content()).build()?;
        let engine = MiniJinjaEngine::new(self.config.templates(), self.config.markdown());
        let pages = Scan::new(self.config.content())
            .extension(PAGE_EXT)
            .collect::<Result<Vec<_>>>()?;

        let rendered = pages.par_iter()
            .map(|entry| self.page(&context, &engine, entry))
            .collect::<Result<Vec<bool>>>()?;

        let written = rendered.iter().filter(|r| **r).count();
        Ok(Summary { pages: written, excluded: rendered.len() - written, assets: 0 })
    }

    /// Renders one page. Returns `false` if the page is excluded.
    fn page(&self, context: &TemplateContext, engine: &dyn Engine, entry: &Entry) -> Result<bool> {
        let name = entry.relative_url();
        let page = match content::load(&entry.path)? {
            Content::Page(page) => page,
            Content::Data(_) => return err!("expected a page file", "path" => &name),
        };

        let page_context = context.for_page(format!("/{name}"), page.attributes);
        if page_context.current_page.is_excluded() {
            log::debug!("skipping excluded page {name}");
            return Ok(false);
        }

        let html = match is_template(&page.body) {
            true => engine.render_page(&name, &page.body, &page_context)?,
            false => page.body,
        };

        let html = match self.config.settings.minify {
            true => crate::minify::html(&html),
            false => html,
        };

        let output = self.config.output().join(&entry.relative);
        write(&output, html).chain_with(|| error! {
            "failed to write page",
            "page" => &name,
        })?;

        log::debug!("rendered {name}");
        Ok(true)
    }
}

fn write(path: &Path, contents: String) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, contents).chain_with(|| error! {
        "failed to write file",
        "path" => path.display(),
    })
}

fn copy(entry: &Entry, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::copy(&entry.path, to).map(|_| ()).chain_with(|| error! {
        "failed to copy public file",
        "source path" => entry.path.display(),
        "destination path" => to.display(),
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::config::Settings;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn site(root: &Path, minify: bool) -> Site {
        let settings = Settings { minify, ..Settings::default() };
        Site::new(Config { root: root.to_path_buf(), settings })
    }

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "src/templates/base.twig", concat!(
            "<html>\n  <head><title>{{ current_page.title }}</title></head>\n",
            "  <body>\n    {% block body %}{% endblock %}\n  </body>\n</html>\n",
        ));
        write(root, "src/content/index.html", concat!(
            "---\ntitle: Home\n---\n{% extends 'base.twig' %}{% block body %}",
            "{% for page in sitemap|flatten %}<a href=\"{{ page.path }}\">{{ page.title }}</a>\n{% endfor %}",
            "{% endblock %}",
        ));
        write(root, "src/content/about/team.html", "---\ntitle: Team\n---\n<!-- plain -->\n<p>{{ data.team.lead }}</p>");
        write(root, "src/content/drafts/wip.html", "---\ntitle: WIP\nexclude: true\n---\n<p>soon</p>");
        write(root, "src/content/static.html", "<p>no { template } here</p>");
        write(root, "data/team.json", r#"{"lead": "Sarah"}"#);
        write(root, "public/css/site.css", "body {}");
        write(root, "public/robots.txt", "User-agent: *");
        dir
    }

    #[test]
    fn builds_pages_and_public_files() {
        let dir = project();
        let summary = site(dir.path(), false).build().unwrap();
        assert_eq!(summary, Summary { pages: 3, excluded: 1, assets: 2 });

        let dist = dir.path().join("dist");
        let index = fs::read_to_string(dist.join("index.html")).unwrap();
        assert!(index.contains("<title>Home</title>"), "{index}");
        assert!(index.contains(r#"<a href="/about/team.html">Team</a>"#), "{index}");
        assert!(index.contains(r#"<a href="/drafts/wip.html">WIP</a>"#), "{index}");

        let team = fs::read_to_string(dist.join("about/team.html")).unwrap();
        assert_eq!(team, "<!-- plain -->\n<p>Sarah</p>");

        let plain = fs::read_to_string(dist.join("static.html")).unwrap();
        assert_eq!(plain, "<p>no { template } here</p>");

        assert!(!dist.join("drafts/wip.html").exists());
        assert_eq!(fs::read_to_string(dist.join("css/site.css")).unwrap(), "body {}");
        assert!(dist.join("robots.txt").exists());
    }

    #[test]
    fn minified_build() {
        let dir = project();
        site(dir.path(), true).build().unwrap();

        let dist = dir.path().join("dist");
        let team = fs::read_to_string(dist.join("about/team.html")).unwrap();
        assert_eq!(team.trim(), "<p>Sarah</p>");

        let index = fs::read_to_string(dist.join("index.html")).unwrap();
        assert!(index.contains("<title>Home</title>"), "{index}");
        assert!(index.contains(">Team</a>"), "{index}");
        assert!(!index.contains("\n  "), "{index}");
    }

    #[test]
    fn clean_removes_stale_output() {
        let dir = project();
        let site = site(dir.path(), false);
        write(dir.path(), "dist/old.html", "stale");

        site.build().unwrap();
        assert!(!dir.path().join("dist/old.html").exists());

        site.clean().unwrap();
        assert!(!dir.path().join("dist").exists());
        site.clean().unwrap();
    }

    #[test]
    fn refuses_to_clean_the_project() {
        let dir = project();
        for output in [".", "..", "src/.."] {
            let settings = Settings { output: output.into(), ..Settings::default() };
            let site = Site::new(Config { root: dir.path().to_path_buf(), settings });
            assert!(site.clean().is_err(), "{output}");
        }

        assert!(dir.path().join("src/content/index.html").exists());
    }

    #[test]
    fn a_broken_page_fails_the_build() {
        let dir = project();
        write(dir.path(), "src/content/broken.html", "{% markdown 'missing.md' %}");

        let error = site(dir.path(), false).build().unwrap_err();
        assert_eq!(error.kind(), trellis::error::Kind::FileNotFound);
    }
}

use std::path::{Path, PathBuf};

use crate::error::{Chainable, Kind, Result};
use crate::markdown::{FrontMatter, HorizontalRule, Markdown, Srcset};

/// Converts Markdown files under a fixed root into HTML for inclusion in
/// rendered pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownIncluder {
    root: PathBuf,
}

impl MarkdownIncluder {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        MarkdownIncluder { root: root.as_ref().to_path_buf() }
    }

    /// Reads `relative` under the root, drops its front-matter and returns
    /// the body converted to HTML.
    ///
    /// Fails with [`Kind::FileNotFound`] if the file does not exist.
    pub fn resolve<P: AsRef<Path>>(&self, relative: P) -> Result<String> {
        let path = self.root.join(relative.as_ref());
        let source = std::fs::read_to_string(&path).map_err(|e| {
            let kind = match e.kind() {
                std::io::ErrorKind::NotFound => Kind::FileNotFound,
                _ => Kind::Io,
            };

            crate::error::Error::new(kind, "failed to read markdown include")
                .with_param(Some("path"), path.display())
                .with_param(None::<&str>, e)
        })?;

        log::debug!("including markdown {}", path.display());
        Self::convert(source).chain_with(|| error! {
            "failed to convert markdown include",
            "path" => path.display(),
        })
    }

    /// Converts a full Markdown document, header included, to HTML.
    pub fn convert<S: Into<String>>(source: S) -> Result<String> {
        Markdown::from(source)
            .plugin(FrontMatter)
            .plugin(HorizontalRule)
            .plugin(Srcset)
            .run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn resolves_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("about")).unwrap();
        fs::write(dir.path().join("about/bio.md"), "---\ntitle: Bio\n---\n# Hi\n\nText\n---\nMore\n").unwrap();

        let html = MarkdownIncluder::new(dir.path()).resolve("about/bio.md").unwrap();
        assert_eq!(html, "<h1>Hi</h1>\n<p>Text</p>\n<hr />\n<p>More</p>\n");
        assert!(!html.contains("title"));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let error = MarkdownIncluder::new(dir.path()).resolve("nope.md").unwrap_err();

        assert_eq!(error.kind(), Kind::FileNotFound);
        let path = dir.path().join("nope.md").display().to_string();
        assert!(error.parameters().iter().any(|(_, v)| *v == path), "{error}");
    }

    #[test]
    fn unterminated_header_fails() {
        let error = MarkdownIncluder::convert("---\ntitle: x\nbody\n").unwrap_err();
        assert_eq!(error.kind(), Kind::Parse);
    }

    #[test]
    fn images_get_srcset() {
        let html = MarkdownIncluder::convert("![me](me.jpg @400x400 @2x?2x)\n").unwrap();
        assert!(html.contains(r#"srcset="me-400x400.jpg 400w,me-2x.jpg 2x""#), "{html}");
    }
}

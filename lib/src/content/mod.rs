//! Loading of data files and page files into values.

pub mod frontmatter;

use std::path::Path;

use crate::error::{Result, Chainable};
use crate::value::{Dict, Format, Json, Toml, Value, Yaml};

/// The semantic contents of a file.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// A structured data file, fully parsed.
    Data(Value),
    /// A text file split into its front-matter and its body.
    Page(Page),
}

/// A text file with an optional front-matter header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub attributes: Dict,
    pub body: String,
}

impl Page {
    pub fn parse(text: &str) -> Result<Self> {
        let (attributes, body) = frontmatter::split(text)?;
        Ok(Page { attributes, body: body.to_string() })
    }
}

/// Interprets `bytes` according to the file extension `ext`.
///
/// ```rust
/// use trellis::content::{parse, Content};
///
/// let Content::Data(data) = parse(br#"{"name": "Sarah"}"#, Some("json")).unwrap() else {
///     panic!("expected data");
/// };
/// assert_eq!(data.find("name").and_then(|v| v.as_str()), Some("Sarah"));
///
/// let Content::Page(page) = parse(b"---\ntitle: Bio\n---\nHello", Some("html")).unwrap() else {
///     panic!("expected page");
/// };
/// assert_eq!(page.body, "Hello");
/// ```
pub fn parse(bytes: &[u8], ext: Option<&str>) -> Result<Content> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| error!(Parse: "file is not valid UTF-8", e))?;

    let content = match ext.map(|e| e.to_ascii_lowercase()).as_deref() {
        Some("json") => Content::Data(Json::from_str(text)?),
        Some("toml") => Content::Data(Toml::from_str(text)?),
        Some("yaml" | "yml") => Content::Data(Yaml::from_str(text)?),
        _ => Content::Page(Page::parse(text)?),
    };

    Ok(content)
}

/// Reads and interprets the file at `path`.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Content> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).chain_with(|| error! {
        "failed to read file",
        "file path" => path.display(),
    })?;

    let ext = path.extension().and_then(|e| e.to_str());
    parse(&bytes, ext).chain_with(|| error! {
        "failed to load file",
        "file path" => path.display(),
    })
}

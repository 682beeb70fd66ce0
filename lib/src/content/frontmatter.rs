use crate::error::{Result, Chainable};
use crate::value::{Dict, Format, Toml, Value, Yaml};

const BOM: char = '\u{feff}';

/// The header conventions recognized at the top of a file.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Delimiter {
    /// A YAML header between `---` lines. The closing line may also be `...`.
    Yaml,
    /// A TOML header between `+++` lines.
    Toml,
}

impl Delimiter {
    fn open(line: &str) -> Option<Self> {
        match line.trim_end() {
            "---" => Some(Delimiter::Yaml),
            "+++" => Some(Delimiter::Toml),
            _ => None,
        }
    }

    fn closes(self, line: &str) -> bool {
        match (self, line.trim_end()) {
            (Delimiter::Yaml, "---" | "...") => true,
            (Delimiter::Toml, "+++") => true,
            _ => false,
        }
    }

    fn parse(self, header: &str) -> Result<Dict> {
        if header.trim().is_empty() {
            return Ok(Dict::new());
        }

        let value: Value = match self {
            Delimiter::Yaml => Yaml::from_str(header)?,
            Delimiter::Toml => Toml::from_str(header)?,
        };

        match value {
            Value::Null => Ok(Dict::new()),
            Value::Dict(dict) => Ok(std::sync::Arc::unwrap_or_clone(dict)),
            other => err!(Parse: "front-matter header must be a mapping",
                "found" => other.kind()),
        }
    }
}

/// Splits `input` into its front-matter attributes and its body.
///
/// A header must begin on the first line. When there is no header, the
/// attributes are empty and the body is all of `input`.
///
/// ```rust
/// use trellis::content::frontmatter;
///
/// let (attributes, body) = frontmatter::split("---\ntitle: Test\n---\nBody text").unwrap();
/// assert_eq!(attributes["title"].as_str(), Some("Test"));
/// assert_eq!(body, "Body text");
///
/// let (attributes, body) = frontmatter::split("<p>no header</p>").unwrap();
/// assert!(attributes.is_empty());
/// assert_eq!(body, "<p>no header</p>");
/// ```
pub fn split(input: &str) -> Result<(Dict, &str)> {
    let input = input.strip_prefix(BOM).unwrap_or(input);
    let mut lines = Lines { rest: input, offset: 0 };

    let delimiter = match lines.next().and_then(|(_, line)| Delimiter::open(line)) {
        Some(delimiter) => delimiter,
        None => return Ok((Dict::new(), input)),
    };

    let header_start = lines.offset;
    while let Some((start, line)) = lines.next() {
        if delimiter.closes(line) {
            let attributes = delimiter.parse(&input[header_start..start])
                .chain(error!("malformed front-matter header"))?;

            return Ok((attributes, &input[lines.offset..]));
        }
    }

    err!(Parse: "unterminated front-matter header",
        "expected closing line" => match delimiter {
            Delimiter::Yaml => "---",
            Delimiter::Toml => "+++",
        })
}

/// Returns `input` without its front-matter header, after checking that the
/// header is well-formed.
pub fn strip(input: &str) -> Result<&str> {
    split(input).map(|(_, body)| body)
}

/// Lines with their starting byte offsets, without line terminators.
struct Lines<'a> {
    rest: &'a str,
    offset: usize,
}

impl<'a> Iterator for Lines<'a> {
    type Item = (usize, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }

        let start = self.offset;
        let (line, consumed) = match memchr::memchr(b'\n', self.rest.as_bytes()) {
            Some(i) => (&self.rest[..i], i + 1),
            None => (self.rest, self.rest.len()),
        };

        self.rest = &self.rest[consumed..];
        self.offset += consumed;
        Some((start, line.strip_suffix('\r').unwrap_or(line)))
    }
}

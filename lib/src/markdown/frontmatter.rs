use std::borrow::Cow;

use crate::content::frontmatter;
use crate::error::Result;

/// Removes a front-matter header from the document. The header must still
/// be well-formed; its attributes are discarded.
#[derive(Debug, Default, Copy, Clone)]
pub struct FrontMatter;

impl crate::markdown::Plugin for FrontMatter {
    fn preprocess<'a>(&self, input: &'a str) -> Result<Cow<'a, str>> {
        frontmatter::strip(input).map(Cow::Borrowed)
    }
}

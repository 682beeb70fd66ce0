pub mod minijinja;

pub use self::minijinja::MiniJinjaEngine;

use std::fmt::Debug;

use crate::error::Result;
use crate::context::PageContext;

/// A template engine that renders pages against a [`PageContext`].
pub trait Engine: Send + Sync + Debug {
    /// Renders `source`, the body of the page called `name`, as a template.
    /// The page may extend or include templates known to the engine.
    fn render_page(&self, name: &str, source: &str, context: &PageContext<'_>) -> Result<String>;

    /// Renders the template called `name` known to the engine.
    fn render(&self, name: &str, context: &PageContext<'_>) -> Result<String>;
}

/// Returns `true` if `input` is likely to contain a template.
///
/// ```rust
/// use trellis::templating::is_template;
///
/// assert!(is_template("<p>{{ title }}</p>"));
/// assert!(is_template("{% extends 'base.twig' %}"));
/// assert!(!is_template("<style>p { color: red }</style>"));
/// ```
pub fn is_template(input: &str) -> bool {
    let mut slice = input.as_bytes();
    while let Some(i) = memchr::memchr(b'{', slice) {
        match slice.get(i + 1) {
            Some(b'{') | Some(b'%') => return true,
            Some(_) => slice = &slice[(i + 1)..],
            None => return false,
        }
    }

    false
}

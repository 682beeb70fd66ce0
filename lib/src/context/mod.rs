//! Assembly of the context handed to every page template.
//!
//! ```text
//!  data/**/*.json ----> Tree "data"    ---+
//!                                         +---> TemplateContext ---> page
//!  content/**/*.html -> Tree "sitemap" ---+            ^
//!                                                      |
//!                                      current_page ---+
//! ```

mod tree;
mod record;
mod flatten;
mod builder;

pub use tree::*;
pub use record::*;
pub use flatten::*;
pub use builder::*;

use serde::Serialize;

use crate::value::Dict;

/// The data and sitemap trees of a site.
///
/// Built once per build and shared, read-only, by every page render.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TemplateContext {
    pub data: Tree,
    pub sitemap: Tree,
}

/// The context for rendering one page: the site context plus the page
/// itself as `current_page`.
#[derive(Debug, Clone, Serialize)]
pub struct PageContext<'c> {
    pub data: &'c Tree,
    pub sitemap: &'c Tree,
    pub current_page: PageRecord,
}

impl TemplateContext {
    pub fn new(data: Tree, sitemap: Tree) -> Self {
        TemplateContext { data, sitemap }
    }

    /// Every page in the sitemap, in key order.
    pub fn pages(&self) -> Vec<PageRecord> {
        flatten(&self.sitemap.to_value())
    }

    /// The context for the page at site path `path` whose own front-matter
    /// is `attributes`. Attributes override `path` on collision.
    pub fn for_page<P: Into<std::sync::Arc<str>>>(&self, path: P, attributes: Dict) -> PageContext<'_> {
        let mut current_page = PageRecord::new(path, Dict::new());
        current_page.overlay(attributes);

        PageContext {
            data: &self.data,
            sitemap: &self.sitemap,
            current_page,
        }
    }
}

#![doc = svgbobdoc::transform!(
//! Template context assembly and Markdown extensions for static site builds.
//!
//! # Overview
//!
//! Trellis turns a directory of structured data files and a directory of
//! templated HTML pages into the context every page is rendered against:
//!
//! ```svgbob
//!   data/                         src/content/
//!   +-- site.json                 +-- index.html
//!   +-- team/                     +-- blog/
//!       +-- sarah.json                +-- post1.html
//!            |                            |
//!            v                            v
//!     +-------------+              +-------------+
//!     |   "data"    |              |  "sitemap"  |
//!     +------+------+              +------+------+
//!            |                            |
//!            +-------------+--------------+
//!                          |
//!                  +-------+--------+
//!                  |TemplateContext |<---- current_page
//!                  +-------+--------+
//!                          |
//!                          v
//!                    rendered page
//! ```
//!
//! Both trees mirror the directories they were read from. A file's stem is
//! its key: `data/team/sarah.json` is `data.team.sarah` and
//! `src/content/blog/post1.html` is `sitemap.blog.post1`, a page record
//! holding the page's front-matter and its site `path`.
//!
//! ## Rendering
//!
//! 1. [`ContextBuilder`](context::ContextBuilder) scans both directories
//!    and assembles the [`TemplateContext`](context::TemplateContext).
//! 2. For each page, [`TemplateContext::for_page()`] adds the page itself
//!    as `current_page`.
//! 3. An [`Engine`](templating::Engine) renders the page body as a
//!    template. Templates can use the `flatten` filter to list every page
//!    and the `{% markdown 'file.md' %}` tag to include Markdown converted
//!    to HTML, with responsive `srcset`s for annotated images.
//!
//! [`TemplateContext::for_page()`]: context::TemplateContext::for_page
)]

#[macro_use]
pub mod error;
pub mod value;
pub mod scan;
pub mod content;
pub mod context;
pub mod markdown;
pub mod templating;

pub use rayon;

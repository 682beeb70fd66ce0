//! Markdown to HTML conversion and the plugins hooked around it.

mod plugin;
mod markdown;
mod frontmatter;
mod rule;
mod srcset;
mod include;

pub mod code;

pub use plugin::*;
pub use markdown::*;
pub use frontmatter::*;
pub use rule::*;
pub use srcset::*;
pub use include::*;

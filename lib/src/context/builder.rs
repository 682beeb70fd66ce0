use std::path::{Path, PathBuf};

use crate::content::{self, Content};
use crate::context::{path_to_tree, PageRecord, TemplateContext, Tree};
use crate::error::{Result, Chainable};
use crate::scan::{Entry, Scan};
use crate::value::Value;

pub const DATA_EXT: &str = "json";
pub const PAGE_EXT: &str = "html";

/// Assembles a [`TemplateContext`] from a data root and a content root.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    data_root: PathBuf,
    content_root: PathBuf,
}

impl ContextBuilder {
    pub fn new<D, C>(data_root: D, content_root: C) -> Self
        where D: AsRef<Path>, C: AsRef<Path>
    {
        ContextBuilder {
            data_root: data_root.as_ref().to_path_buf(),
            content_root: content_root.as_ref().to_path_buf(),
        }
    }

    /// Scans both roots and returns the assembled context.
    ///
    /// The two scans run concurrently; the context is published only after
    /// both have completed. Any malformed file fails the whole build.
    pub fn build(&self) -> Result<TemplateContext> {
        let (data, sitemap) = rayon::join(|| self.data(), || self.sitemap());
        let context = TemplateContext::new(data?, sitemap?);
        log::info!("assembled template context with {} page(s)", context.pages().len());
        Ok(context)
    }

    /// The tree of every data file under the data root.
    pub fn data(&self) -> Result<Tree> {
        fold(Scan::new(&self.data_root).extension(DATA_EXT), |entry| {
            let value = match content::load(&entry.path)? {
                Content::Data(value) => value,
                Content::Page(page) => Value::from(page.body),
            };

            Ok(Tree::leaf(value))
        }).chain_with(|| error!("failed to load template data", "data root" => self.data_root.display()))
    }

    /// The tree of every page's record under the content root.
    pub fn sitemap(&self) -> Result<Tree> {
        fold(Scan::new(&self.content_root).extension(PAGE_EXT), |entry| {
            let attributes = match content::load(&entry.path)? {
                Content::Page(page) => page.attributes,
                Content::Data(_) => return err!("expected a page file", "file" => entry.path.display()),
            };

            let record = PageRecord::new(format!("/{}", entry.relative_url()), attributes);
            Ok(Tree::leaf(record.to_value()))
        }).chain_with(|| error!("failed to load sitemap", "content root" => self.content_root.display()))
    }
}

/// Loads each scanned file with `load` and merges it into a single tree,
/// keyed by its directories and its stem.
fn fold<F>(scan: Scan, load: F) -> Result<Tree>
    where F: Fn(&Entry) -> Result<Tree>
{
    let mut tree = Tree::empty();
    for entry in scan {
        let entry = entry?;
        log::debug!("loading {}", entry.path.display());

        let leaf = load(&entry)?;
        let file = path_to_tree(&entry.relative, Tree::node(entry.stem(), leaf));
        tree = tree.merge(file).chain_with(|| error! {
            "conflicting source paths",
            "file" => entry.relative.display(),
        })?;
    }

    Ok(tree)
}

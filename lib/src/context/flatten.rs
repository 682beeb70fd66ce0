use crate::context::PageRecord;
use crate::value::Value;

/// Collects every page record in a sitemap tree, depth first.
///
/// A dictionary with a `path` attribute is a page; any other dictionary is
/// descended into. Non-dictionary values are skipped. Records are returned
/// in the tree's key order and `sitemap` is not modified.
///
/// ```rust
/// use trellis::context::flatten;
/// use trellis::value::Value;
///
/// let sitemap: Value = serde_json::from_str(r#"{
///     "blog": { "post1": { "path": "/blog/post1.html", "title": "One" } },
///     "index": { "path": "/index.html" }
/// }"#).unwrap();
///
/// let paths: Vec<String> = flatten(&sitemap).into_iter().map(|r| r.path.to_string()).collect();
/// assert_eq!(paths, vec!["/blog/post1.html", "/index.html"]);
/// ```
pub fn flatten(sitemap: &Value) -> Vec<PageRecord> {
    let mut pages = vec![];
    collect(sitemap, &mut pages);
    pages
}

fn collect(node: &Value, pages: &mut Vec<PageRecord>) {
    let Some(dict) = node.as_dict() else {
        return;
    };

    for child in dict.values() {
        match child.as_dict().and_then(PageRecord::from_dict) {
            Some(record) => pages.push(record),
            None => collect(child, pages),
        }
    }
}

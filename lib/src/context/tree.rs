use std::sync::Arc;
use std::path::{Path, Component};
use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::error::Result;
use crate::value::{Dict, Value};

/// A nested mapping whose shape mirrors a directory hierarchy.
///
/// Interior nodes are keyed by path segment. Leaves hold the value loaded
/// from a single file: parsed data for the data tree, a page record for the
/// sitemap tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Tree {
    Node(BTreeMap<Arc<str>, Tree>),
    Leaf(Value),
}

impl Default for Tree {
    fn default() -> Self {
        Tree::Node(BTreeMap::new())
    }
}

impl Tree {
    /// A node with no children. It is the identity of [`Tree::merge()`].
    pub fn empty() -> Self {
        Tree::default()
    }

    pub fn leaf<V: Into<Value>>(value: V) -> Self {
        Tree::Leaf(value.into())
    }

    /// A node with a single child `key`.
    pub fn node<K: Into<Arc<str>>>(key: K, child: Tree) -> Self {
        Tree::Node(BTreeMap::from([(key.into(), child)]))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Tree::Node(children) if children.is_empty())
    }

    pub fn get(&self, key: &str) -> Option<&Tree> {
        match self {
            Tree::Node(children) => children.get(key),
            Tree::Leaf(_) => None,
        }
    }

    /// Follows a dotted key path such as `blog.post1`.
    pub fn find(&self, key: &str) -> Option<&Tree> {
        if key.is_empty() {
            return Some(self);
        }

        key.split('.').try_fold(self, |tree, segment| tree.get(segment))
    }

    /// Converts the tree into a plain nested dictionary.
    pub fn to_value(&self) -> Value {
        match self {
            Tree::Leaf(value) => value.clone(),
            Tree::Node(children) => {
                let dict: Dict = children.iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect();

                Value::Dict(Arc::new(dict))
            }
        }
    }

    /// Deep-merges `other` into `self`.
    ///
    /// Nodes merge key by key. When two leaves collide, `other` wins. A leaf
    /// and a node at the same key is an [`AmbiguousPath`] error, since one of
    /// the two would otherwise be lost.
    ///
    /// [`AmbiguousPath`]: crate::error::Kind::AmbiguousPath
    pub fn merge(self, other: Tree) -> Result<Tree> {
        let mut trail = vec![];
        merge_at(&mut trail, self, other)
    }
}

fn merge_at(trail: &mut Vec<Arc<str>>, base: Tree, other: Tree) -> Result<Tree> {
    if base.is_empty() {
        return Ok(other);
    } else if other.is_empty() {
        return Ok(base);
    }

    match (base, other) {
        (Tree::Node(mut children), Tree::Node(incoming)) => {
            for (key, child) in incoming {
                let merged = match children.remove(&key) {
                    Some(existing) => {
                        trail.push(key.clone());
                        let merged = merge_at(trail, existing, child)?;
                        trail.pop();
                        merged
                    }
                    None => child,
                };

                children.insert(key, merged);
            }

            Ok(Tree::Node(children))
        }
        (Tree::Leaf(_), Tree::Leaf(value)) => {
            log::warn!("`{}` defined more than once; keeping the last value", join(trail));
            Ok(Tree::Leaf(value))
        }
        (Tree::Leaf(_), Tree::Node(_)) | (Tree::Node(_), Tree::Leaf(_)) => {
            err!(AmbiguousPath: "a file and a directory map to the same key",
                "key" => join(trail))
        }
    }
}

fn join(trail: &[Arc<str>]) -> String {
    match trail.is_empty() {
        true => "<root>".into(),
        false => trail.join("."),
    }
}

/// Nests `leaf` under one node per directory component of `path`.
///
/// The file name itself is not used. A path with no directory component
/// returns `leaf` unchanged.
///
/// ```rust
/// use trellis::context::{path_to_tree, Tree};
///
/// let tree = path_to_tree("blog/2024/post.html", Tree::leaf(1));
/// assert_eq!(tree.find("blog.2024"), Some(&Tree::leaf(1)));
///
/// assert_eq!(path_to_tree("index.html", Tree::leaf(1)), Tree::leaf(1));
/// ```
pub fn path_to_tree<P: AsRef<Path>>(path: P, leaf: Tree) -> Tree {
    let dirs = path.as_ref().parent().map(|parent| {
        parent.components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
    });

    dirs.unwrap_or_default()
        .into_iter()
        .rev()
        .fold(leaf, |tree, dir| Tree::node(dir, tree))
}

impl Serialize for Tree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Tree::Leaf(value) => value.serialize(serializer),
            Tree::Node(children) => serializer.collect_map(children),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Kind;

    fn file(path: &str, stem: &str, value: i32) -> Tree {
        path_to_tree(path, Tree::node(stem, Tree::leaf(value)))
    }

    #[test]
    fn nests_by_directory() {
        let tree = file("a/b/c.json", "c", 1);
        assert_eq!(tree.find("a.b.c"), Some(&Tree::leaf(1)));
        assert!(tree.find("a.c").is_none());
    }

    #[test]
    fn root_file_is_unwrapped() {
        assert_eq!(path_to_tree("c.json", Tree::leaf(7)), Tree::leaf(7));
        assert_eq!(path_to_tree("./c.json", Tree::leaf(7)), Tree::leaf(7));
    }

    #[test]
    fn merge_is_commutative_for_disjoint_paths() {
        let a = file("blog/one.html", "one", 1);
        let b = file("blog/two.html", "two", 2);
        let c = file("about.html", "about", 3);

        let left = a.clone().merge(b.clone()).unwrap().merge(c.clone()).unwrap();
        let right = c.merge(b).unwrap().merge(a).unwrap();
        assert_eq!(left, right);
        assert_eq!(left.find("blog.one"), Some(&Tree::leaf(1)));
        assert_eq!(left.find("blog.two"), Some(&Tree::leaf(2)));
        assert_eq!(left.find("about"), Some(&Tree::leaf(3)));
    }

    #[test]
    fn empty_is_identity() {
        let a = file("x/y.json", "y", 1);
        assert_eq!(Tree::empty().merge(a.clone()).unwrap(), a);
        assert_eq!(a.clone().merge(Tree::empty()).unwrap(), a);
        assert_eq!(Tree::leaf(2).merge(Tree::empty()).unwrap(), Tree::leaf(2));
    }

    #[test]
    fn leaf_collision_keeps_last() {
        let merged = file("a.json", "a", 1).merge(file("a.json", "a", 2)).unwrap();
        assert_eq!(merged.find("a"), Some(&Tree::leaf(2)));
    }

    #[test]
    fn leaf_against_subtree_is_ambiguous() {
        let leaf = file("team.json", "team", 1);
        let subtree = file("team/sarah.json", "sarah", 2);

        let error = leaf.clone().merge(subtree.clone()).unwrap_err();
        assert_eq!(error.kind(), Kind::AmbiguousPath);
        assert!(error.to_string().contains("key: team"));

        let error = subtree.merge(leaf).unwrap_err();
        assert_eq!(error.kind(), Kind::AmbiguousPath);
    }

    #[test]
    fn serializes_as_nested_maps() {
        let tree = file("blog/one.html", "one", 1);
        let json = serde_json::to_string(&tree).unwrap();
        assert_eq!(json, r#"{"blog":{"one":1}}"#);
        assert_eq!(serde_json::to_string(&tree.to_value()).unwrap(), json);
    }
}

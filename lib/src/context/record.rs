use std::sync::Arc;

use serde::Serialize;

use crate::value::{Dict, Value};

/// The name of the attribute that marks a sitemap node as a page.
pub const PATH_KEY: &str = "path";

/// A page's front-matter attributes and its site-relative URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRecord {
    pub path: Arc<str>,
    #[serde(flatten)]
    pub attributes: Dict,
}

impl PageRecord {
    /// A record for the page at `path`. A `path` attribute, if any, is
    /// replaced by `path`.
    pub fn new<P: Into<Arc<str>>>(path: P, mut attributes: Dict) -> Self {
        attributes.remove(PATH_KEY);
        PageRecord { path: path.into(), attributes }
    }

    /// Builds a record from a dictionary that has a `path` attribute.
    pub fn from_dict(dict: &Dict) -> Option<Self> {
        let path = path_string(dict.get(PATH_KEY)?)?;
        Some(PageRecord::new(path, dict.clone()))
    }

    /// Overlays `attributes` onto `self`; on a key collision the incoming
    /// attribute wins, `path` included.
    pub fn overlay(&mut self, attributes: Dict) {
        for (key, value) in attributes {
            if &*key != PATH_KEY {
                self.attributes.insert(key, value);
            } else if let Some(path) = path_string(&value) {
                self.path = path;
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Whether the page asked to be left out of the build.
    pub fn is_excluded(&self) -> bool {
        self.get("exclude").and_then(|v| v.to_bool()) == Some(true)
    }

    pub fn to_value(&self) -> Value {
        let mut dict = self.attributes.clone();
        dict.insert(PATH_KEY.into(), Value::String(self.path.clone()));
        Value::from(dict)
    }
}

/// A `path` attribute as a string. Non-string values are rendered as JSON.
fn path_string(value: &Value) -> Option<Arc<str>> {
    match value {
        Value::String(s) => Some(s.clone()),
        other => serde_json::to_string(other).ok().map(Arc::from),
    }
}

use std::borrow::Cow;

use pulldown_cmark::{html, Options, Parser};

use crate::markdown::Plugin;
use crate::error::{Chainable, Result};

/// A Markdown document and the plugins to run while converting it to HTML.
pub struct Markdown<'p> {
    input: String,
    options: Options,
    plugins: Vec<Box<dyn Plugin + Send + Sync + 'p>>,
}

impl<'p> Markdown<'p> {
    pub fn from<S: Into<String>>(input: S) -> Self {
        Self {
            input: input.into(),
            options: Self::default_options(),
            plugins: vec![],
        }
    }

    /// Tables, strikethrough and task lists on top of CommonMark, which
    /// already has fenced code blocks with info strings.
    pub fn default_options() -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
    }

    /// Adds `plugin` after the plugins already added. Plugins preprocess and
    /// postprocess in the order they were added.
    pub fn plugin<T: Plugin + Send + Sync + 'p>(mut self, plugin: T) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Converts the document to HTML.
    pub fn run(self) -> Result<String> {
        let mut text = self.input;
        for plugin in &self.plugins {
            text = rewrite(text, |input| plugin.preprocess(input))
                .chain(error!("markdown preprocessing failed"))?;
        }

        let mut html = String::with_capacity(text.len() + text.len() / 2);
        html::push_html(&mut html, Parser::new_ext(&text, self.options));

        for plugin in &self.plugins {
            html = rewrite(html, |input| plugin.postprocess(input))
                .chain(error!("markdown postprocessing failed"))?;
        }

        Ok(html)
    }
}

fn rewrite<F>(text: String, f: F) -> Result<String>
    where F: for<'a> FnOnce(&'a str) -> Result<Cow<'a, str>>
{
    let rewritten = match f(&text)? {
        Cow::Borrowed(s) if s.as_ptr() == text.as_ptr() && s.len() == text.len() => None,
        Cow::Borrowed(s) => Some(s.to_string()),
        Cow::Owned(s) => Some(s),
    };

    Ok(rewritten.unwrap_or(text))
}

use std::path::Path;
use std::sync::Arc;

use minijinja::{AutoEscape, Environment, path_loader};
use minijinja::value::Value;

use crate::context::PageContext;
use crate::error::{Chainable, Result};
use crate::markdown::MarkdownIncluder;
use crate::templating::Engine;

/// A [`minijinja`] environment that loads templates from a directory and
/// knows the `flatten` filter and the `markdown` function and tag.
///
/// Output is never auto-escaped, whatever the template's extension.
#[derive(Debug)]
pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl MiniJinjaEngine {
    /// An engine loading templates from `templates` and Markdown includes
    /// from `markdown`.
    pub fn new<T: AsRef<Path>, M: AsRef<Path>>(templates: T, markdown: M) -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        let loader = path_loader(templates.as_ref());
        env.set_loader(move |name| {
            let source = loader(name)?;
            Ok(source.map(|s| tag::rewrite(&s).into_owned()))
        });

        let mut engine = MiniJinjaEngine { env };
        engine.register_extensions(MarkdownIncluder::new(markdown));
        engine
    }

    /// Adds the `flatten` filter and the `markdown` function, the latter
    /// resolving includes with `includer`.
    pub fn register_extensions(&mut self, includer: MarkdownIncluder) {
        let includer = Arc::new(includer);
        self.env.add_filter("flatten", ext::flatten);
        self.env.add_function("markdown", move |path: String| ext::markdown(&includer, &path));
    }
}

impl Engine for MiniJinjaEngine {
    fn render_page(&self, name: &str, source: &str, context: &PageContext<'_>) -> Result<String> {
        let source = tag::rewrite(source);
        let context = Value::from_serializable(context);
        self.env.render_named_str(name, &source, context)
            .chain_with(|| error!("failed to render page", "page" => name))
    }

    fn render(&self, name: &str, context: &PageContext<'_>) -> Result<String> {
        let template = self.env.get_template(name)?;
        template.render(Value::from_serializable(context))
            .chain_with(|| error!("failed to render template", "template" => name))
    }
}

/// Support for the `{% markdown 'file.md' %}` tag.
pub mod tag {
    use std::borrow::Cow;

    use once_cell::sync::Lazy;
    use regex::{Captures, Regex};

    static MARKDOWN_TAG: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r#"\{%(?P<l>-?)\s*markdown\s+(?P<path>'[^'\n]+\.md'|"[^"\n]+\.md")\s*(?P<r>-?)%\}"#)
            .expect("valid markdown tag regex")
    });

    /// Rewrites every `{% markdown 'file.md' %}` tag in `source` into the
    /// equivalent `{{ markdown('file.md') }}` expression, keeping
    /// whitespace control markers.
    ///
    /// ```rust
    /// use trellis::templating::minijinja::tag::rewrite;
    ///
    /// assert_eq!(rewrite("<div>{% markdown 'bios/sarah.md' %}</div>"),
    ///     "<div>{{ markdown('bios/sarah.md') }}</div>");
    /// assert_eq!(rewrite(r#"{%- markdown "a.md" -%}"#), r#"{{- markdown("a.md") -}}"#);
    /// assert_eq!(rewrite("{% markdown 'a.txt' %}"), "{% markdown 'a.txt' %}");
    /// ```
    pub fn rewrite(source: &str) -> Cow<'_, str> {
        if memchr::memmem::find(source.as_bytes(), b"markdown").is_none() {
            return Cow::Borrowed(source);
        }

        MARKDOWN_TAG.replace_all(source, |caps: &Captures| {
            format!("{{{{{} markdown({}) {}}}}}", &caps["l"], &caps["path"], &caps["r"])
        })
    }
}

mod ext {
    use minijinja::{Error, ErrorKind};
    use minijinja::value::Value;

    use crate::context;
    use crate::markdown::MarkdownIncluder;

    fn invalid<E: std::fmt::Display>(message: &str, error: E) -> Error {
        Error::new(ErrorKind::InvalidOperation, format!("{message}: {error}"))
    }

    pub fn flatten(sitemap: Value) -> Result<Value, Error> {
        let json = serde_json::to_value(&sitemap)
            .map_err(|e| invalid("`flatten` could not read its input", e))?;

        let sitemap: crate::value::Value = serde_json::from_value(json)
            .map_err(|e| invalid("`flatten` expects a sitemap", e))?;

        Ok(Value::from_serializable(&context::flatten(&sitemap)))
    }

    pub fn markdown(includer: &MarkdownIncluder, path: &str) -> Result<Value, Error> {
        let html = includer.resolve(path)
            .map_err(|e| Error::new(ErrorKind::InvalidOperation, "markdown include failed")
                .with_source(e))?;

        Ok(Value::from_safe_string(html))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::context::{path_to_tree, PageRecord, TemplateContext, Tree};
    use crate::error::Kind;
    use crate::value::{Dict, Value as TValue};

    fn page(rel: &str, title: &str) -> Tree {
        let mut attributes = Dict::new();
        attributes.insert("title".into(), TValue::from(title));
        let record = PageRecord::new(format!("/{rel}"), attributes);
        let stem = Path::new(rel).file_stem().unwrap().to_str().unwrap();
        path_to_tree(rel, Tree::node(stem, Tree::leaf(record.to_value())))
    }

    fn site() -> TemplateContext {
        let sitemap = page("index.html", "Home")
            .merge(page("blog/a.html", "A")).unwrap()
            .merge(page("blog/b.html", "B")).unwrap();

        TemplateContext::new(Tree::node("site", Tree::leaf("Demo")), sitemap)
    }

    #[test]
    fn flatten_filter_lists_pages() {
        let dir = tempfile::tempdir().unwrap();
        let engine = MiniJinjaEngine::new(dir.path(), dir.path());
        let context = site();
        let page = context.for_page("/index.html", Dict::new());

        let source = "{% for p in sitemap|flatten %}{{ p.path }}={{ p.title }};{% endfor %}";
        let html = engine.render_page("index.html", source, &page).unwrap();
        assert_eq!(html, "/blog/a.html=A;/blog/b.html=B;/index.html=Home;");
    }

    #[test]
    fn current_page_and_data_are_visible() {
        let dir = tempfile::tempdir().unwrap();
        let engine = MiniJinjaEngine::new(dir.path(), dir.path());
        let context = site();
        let mut attributes = Dict::new();
        attributes.insert("title".into(), TValue::from("A"));
        let page = context.for_page("/blog/a.html", attributes);

        let source = "{{ data.site }}|{{ current_page.title }}|{{ current_page.path }}|{{ sitemap.blog.b.title }}";
        let html = engine.render_page("blog/a.html", source, &page).unwrap();
        assert_eq!(html, "Demo|A|/blog/a.html|B");
    }

    #[test]
    fn markdown_tag_in_layout_is_unescaped() {
        let dir = tempfile::tempdir().unwrap();
        let (templates, markdown) = (dir.path().join("templates"), dir.path().join("markdown"));
        fs::create_dir_all(&templates).unwrap();
        fs::create_dir_all(markdown.join("bios")).unwrap();
        fs::write(templates.join("base.twig"), "<main>{% block body %}{% endblock %}</main>").unwrap();
        fs::write(markdown.join("bios/sarah.md"), "---\nname: Sarah\n---\n*Sarah*\n").unwrap();

        let engine = MiniJinjaEngine::new(&templates, &markdown);
        let context = TemplateContext::default();
        let page = context.for_page("/about.html", Dict::new());

        let source = "{% extends 'base.twig' %}{% block body %}{% markdown 'bios/sarah.md' %}{% endblock %}";
        let html = engine.render_page("about.html", source, &page).unwrap();
        assert_eq!(html, "<main><p><em>Sarah</em></p>\n</main>");

        let html = engine.render_page("x.html", "{{ markdown('bios/sarah.md') }}", &page).unwrap();
        assert_eq!(html, "<p><em>Sarah</em></p>\n");
    }

    #[test]
    fn missing_include_fails_the_page() {
        let dir = tempfile::tempdir().unwrap();
        let engine = MiniJinjaEngine::new(dir.path(), dir.path());
        let context = TemplateContext::default();
        let page = context.for_page("/x.html", Dict::new());

        let error = engine.render_page("x.html", "{% markdown 'gone.md' %}", &page).unwrap_err();
        assert_eq!(error.kind(), Kind::FileNotFound);
    }

    #[test]
    fn named_templates_render() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hello.twig"), "hi {{ current_page.path }}").unwrap();

        let engine = MiniJinjaEngine::new(dir.path(), dir.path());
        let context = TemplateContext::default();
        let html = engine.render("hello.twig", &context.for_page("/p.html", Dict::new())).unwrap();
        assert_eq!(html, "hi /p.html");

        let error = engine.render("absent.twig", &context.for_page("/p.html", Dict::new())).unwrap_err();
        assert_eq!(error.kind(), Kind::Template);
    }
}

use std::fs;
use std::path::Path;

use trellis::context::{flatten, ContextBuilder};
use trellis::error::Kind;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn path_of<'a>(value: &'a trellis::value::Value, key: &str) -> Option<&'a str> {
    value.find(key).and_then(|v| v.as_str())
}

#[test]
fn sitemap_mirrors_content_tree() {
    let site = tempfile::tempdir().unwrap();
    let (data, content) = (site.path().join("data"), site.path().join("content"));
    write(&content, "blog/post1.html", "---\ntitle: First\n---\n<p>one</p>");
    write(&content, "blog/post2.html", "---\ntitle: Second\ntags: [a, b]\n---\n<p>two</p>");
    write(&content, "index.html", "<h1>home</h1>");
    write(&content, "notes.txt", "ignored");

    let context = ContextBuilder::new(&data, &content).build().unwrap();
    let sitemap = context.sitemap.to_value();

    assert_eq!(path_of(&sitemap, "blog.post1.path"), Some("/blog/post1.html"));
    assert_eq!(path_of(&sitemap, "blog.post2.path"), Some("/blog/post2.html"));
    assert_eq!(path_of(&sitemap, "blog.post1.title"), Some("First"));
    assert_eq!(path_of(&sitemap, "index.path"), Some("/index.html"));
    assert!(sitemap.find("notes").is_none());

    let tags = sitemap.find("blog.post2.tags").and_then(|v| v.as_slice()).unwrap();
    assert_eq!(tags.len(), 2);

    let pages: Vec<String> = flatten(&sitemap).into_iter().map(|p| p.path.to_string()).collect();
    assert_eq!(pages, ["/blog/post1.html", "/blog/post2.html", "/index.html"]);
}

#[test]
fn data_nests_by_directory() {
    let site = tempfile::tempdir().unwrap();
    let (data, content) = (site.path().join("data"), site.path().join("content"));
    write(&data, "site.json", r#"{"name": "Demo", "year": 2024}"#);
    write(&data, "team/sarah.json", r#"{"role": "editor"}"#);
    write(&data, "team/leads/ann.json", r#"["a", "b"]"#);
    write(&data, "team/readme.md", "not data");

    let context = ContextBuilder::new(&data, &content).build().unwrap();
    let data = context.data.to_value();

    assert_eq!(path_of(&data, "site.name"), Some("Demo"));
    assert_eq!(path_of(&data, "team.sarah.role"), Some("editor"));
    assert_eq!(data.find("team.leads.ann").and_then(|v| v.as_slice()).map(|s| s.len()), Some(2));
    assert!(data.find("team.readme").is_none());
    assert!(context.sitemap.is_empty());
}

#[test]
fn missing_roots_give_an_empty_context() {
    let site = tempfile::tempdir().unwrap();
    let context = ContextBuilder::new(site.path().join("a"), site.path().join("b")).build().unwrap();

    assert!(context.data.is_empty());
    assert!(context.sitemap.is_empty());
    assert!(context.pages().is_empty());
}

#[test]
fn malformed_data_fails_the_build() {
    let site = tempfile::tempdir().unwrap();
    let (data, content) = (site.path().join("data"), site.path().join("content"));
    write(&data, "good.json", "{}");
    write(&data, "bad.json", "{ \"a\": ");
    write(&content, "index.html", "ok");

    let error = ContextBuilder::new(&data, &content).build().unwrap_err();
    assert_eq!(error.kind(), Kind::Parse);
    assert!(error.to_string().contains("bad.json"), "{error}");
}

#[test]
fn unterminated_front_matter_fails_the_build() {
    let site = tempfile::tempdir().unwrap();
    let content = site.path().join("content");
    write(&content, "broken.html", "---\ntitle: never closed\n<p>body</p>\n");

    let error = ContextBuilder::new(site.path().join("data"), &content).build().unwrap_err();
    assert_eq!(error.kind(), Kind::Parse);
}

#[test]
fn file_and_directory_with_one_name_is_ambiguous() {
    let site = tempfile::tempdir().unwrap();
    let (data, content) = (site.path().join("data"), site.path().join("content"));
    write(&content, "blog.html", "<p>listing</p>");
    write(&content, "blog/post.html", "<p>post</p>");

    let error = ContextBuilder::new(&data, &content).build().unwrap_err();
    assert_eq!(error.kind(), Kind::AmbiguousPath);
    assert!(error.to_string().contains("blog"), "{error}");
}

#[test]
fn current_page_overrides_with_own_attributes() {
    let site = tempfile::tempdir().unwrap();
    let content = site.path().join("content");
    write(&content, "about.html", "---\ntitle: About\nexclude: true\n---\nbody");

    let context = ContextBuilder::new(site.path().join("data"), &content).build().unwrap();
    let record = context.pages().into_iter().next().unwrap();
    assert!(record.is_excluded());

    let page = context.for_page(record.path.clone(), record.attributes.clone());
    assert_eq!(&*page.current_page.path, "/about.html");
    assert_eq!(page.current_page.get("title").and_then(|v| v.as_str()), Some("About"));
}

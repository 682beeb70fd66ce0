/// Shrinks rendered HTML: removes comments and collapses whitespace the way a
/// browser would render it. Closing tags and the `<html>`/`<head>` opening
/// tags are kept so layouts that rely on them render unchanged.
pub fn html(input: &str) -> String {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;

    let minified = minify_html::minify(input.as_bytes(), &cfg);
    String::from_utf8_lossy(&minified).into_owned()
}

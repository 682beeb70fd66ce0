use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::error::Result;
use crate::markdown::code::replace_outside_code;

/// Separates an image URL from the responsive-image rules appended to it.
pub const SENTINEL: &str = "||";

/// An image reference followed by a list of `@suffix` or `@suffix?descriptor`
/// rules, before the closing parenthesis.
static MARKDOWN_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(concat!(
    r#"(?P<head>!\[[^\]]*\]\s?\([ \t]*<?\S+?)"#,
    r#"(?P<mid>>?(?:[ \t]+=[*\d]+[A-Za-z%]{0,4}x[*\d]+[A-Za-z%]{0,4})?"#,
    r#"(?:[ \t]+(?:"[^"]*"|'[^']*'))?)"#,
    r#"(?P<rules>(?:\s+@\w+(?:\?\w+)?)+)(?P<tail>[ \t]*\))"#,
)).expect("valid image regex"));

/// An `<img>` tag whose `src` carries rules after the sentinel. The renderer
/// percent-encodes `|`, so both spellings are accepted.
static HTML_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(concat!(
    r#"<img[^>]+src=['"](?P<url>[^'"\s]+?)(?:\|\||%7C%7C)"#,
    r#"(?P<rules>@[\w?,@]*)['"][^>]*>"#,
)).expect("valid img regex"));

static SRC_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"src=['"][^'"]+['"]"#).expect("valid src regex")
});

static TAG_CLOSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\s*/?>"#).expect("valid close regex")
});

static EXTENSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\.\w+$"#).expect("valid extension regex")
});

static RULE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^@(\w+)(?:\?(\w+))?$"#).expect("valid rule regex")
});

static SIZE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(\d+)x(\d+)"#).expect("valid size regex")
});

/// A single responsive-image rule: one generated image variant and the
/// descriptor that selects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsiveImageRule {
    pub suffix: String,
    pub descriptor: Option<String>,
}

impl ResponsiveImageRule {
    /// Parses `@suffix` or `@suffix?descriptor`.
    ///
    /// ```rust
    /// use trellis::markdown::ResponsiveImageRule;
    ///
    /// let rule = ResponsiveImageRule::parse("@2x?200w").unwrap();
    /// assert_eq!(rule.suffix, "2x");
    /// assert_eq!(rule.descriptor.as_deref(), Some("200w"));
    ///
    /// assert!(ResponsiveImageRule::parse("2x").is_none());
    /// ```
    pub fn parse(rule: &str) -> Option<Self> {
        let caps = RULE.captures(rule)?;
        Some(ResponsiveImageRule {
            suffix: caps[1].to_string(),
            descriptor: caps.get(2).map(|m| m.as_str().to_string()),
        })
    }

    /// The explicit descriptor, else the width of a `WxH` suffix as `<W>w`,
    /// else an empty string.
    pub fn descriptor(&self) -> Cow<'_, str> {
        if let Some(descriptor) = &self.descriptor {
            return Cow::Borrowed(descriptor.as_str());
        }

        match SIZE.captures(&self.suffix) {
            Some(caps) => Cow::Owned(format!("{}w", &caps[1])),
            None => Cow::Borrowed(""),
        }
    }

    /// The image candidate string for the image `name` + `ext`.
    ///
    /// ```rust
    /// use trellis::markdown::ResponsiveImageRule;
    ///
    /// let rule = ResponsiveImageRule::parse("@640x480").unwrap();
    /// assert_eq!(rule.candidate("img/cat", ".jpg"), "img/cat-640x480.jpg 640w");
    ///
    /// let rule = ResponsiveImageRule::parse("@thumb").unwrap();
    /// assert_eq!(rule.candidate("cat", ".jpg"), "cat-thumb.jpg ");
    /// ```
    pub fn candidate(&self, name: &str, ext: &str) -> String {
        format!("{name}-{}{ext} {}", self.suffix, self.descriptor())
    }
}

/// Adds a `srcset` attribute to images that carry responsive-image rules.
///
/// Before conversion, `![alt](img.png @2x?200w @thumb)` is rewritten to
/// `![alt](img.png||@2x?200w,@thumb)` so that the rules survive into the
/// `src` of the generated `<img>`. After conversion, the rules are removed
/// from `src` and expanded into `srcset="img-2x.png 200w,img-thumb.png "`.
#[derive(Debug, Default, Copy, Clone)]
pub struct Srcset;

impl Srcset {
    /// Moves rule lists from image syntax into image URLs. Fenced code and
    /// code spans are left as written.
    pub fn tag(markdown: &str) -> Cow<'_, str> {
        replace_outside_code(markdown, tag_images)
    }

    /// Expands tagged image URLs in `html` into `srcset` attributes.
    pub fn expand(html: &str) -> Cow<'_, str> {
        HTML_IMAGE.replace_all(html, |caps: &Captures| {
            let tag = &caps[0];
            let url = &caps["url"];

            let ext = EXTENSION.find(url).map_or("", |m| m.as_str());
            let name = &url[..url.len() - ext.len()];

            let candidates = caps["rules"].split(',')
                .filter_map(ResponsiveImageRule::parse)
                .map(|rule| rule.candidate(name, ext))
                .collect::<Vec<_>>();

            let src = format!(r#"src="{url}""#);
            let tag = SRC_ATTR.replace(tag, regex::NoExpand(&src));
            let srcset = format!(r#" srcset="{}" />"#, candidates.join(","));
            TAG_CLOSE.replace(&tag, regex::NoExpand(&srcset)).into_owned()
        })
    }
}

fn tag_images(text: &str) -> Cow<'_, str> {
    MARKDOWN_IMAGE.replace_all(text, |caps: &Captures| {
        let rules = caps["rules"].split_whitespace().collect::<Vec<_>>().join(",");
        format!("{}{SENTINEL}{rules}{}{}", &caps["head"], &caps["mid"], &caps["tail"])
    })
}

impl crate::markdown::Plugin for Srcset {
    fn preprocess<'a>(&self, input: &'a str) -> Result<Cow<'a, str>> {
        Ok(Srcset::tag(input))
    }

    fn postprocess<'a>(&self, html: &'a str) -> Result<Cow<'a, str>> {
        Ok(Srcset::expand(html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::Markdown;

    fn convert(markdown: &str) -> String {
        Markdown::from(markdown).plugin(Srcset).run().unwrap()
    }

    #[test]
    fn tags_rules_onto_url() {
        assert_eq!(Srcset::tag("![alt](img.png @2x?200w)"), "![alt](img.png||@2x?200w)");
        assert_eq!(
            Srcset::tag(r#"![a](i.jpg "Title" @1x @2x?2x @640x480)"#),
            r#"![a](i.jpg||@1x,@2x?2x,@640x480 "Title")"#,
        );
        assert_eq!(Srcset::tag("![a](i.jpg)"), "![a](i.jpg)");
        assert_eq!(Srcset::tag("see ![a](i.jpg @x) and ![b](j.png)"), "see ![a](i.jpg||@x) and ![b](j.png)");
    }

    #[test]
    fn explicit_descriptor() {
        let html = convert("![alt](img.png @2x?200w)");
        assert!(html.contains(r#"src="img.png""#), "{html}");
        assert!(html.contains(r#"srcset="img-2x.png 200w""#), "{html}");
        assert!(html.contains(r#"alt="alt""#), "{html}");
        assert!(!html.contains("||") && !html.contains("%7C"), "{html}");
        assert!(html.trim_end().ends_with("/></p>"), "{html}");
    }

    #[test]
    fn missing_descriptor_is_empty() {
        let html = convert("![alt](img.png @thumb)");
        assert!(html.contains(r#"srcset="img-thumb.png ""#), "{html}");
    }

    #[test]
    fn size_suffix_implies_width() {
        let html = convert("![cat](/photos/cat.jpg @320x240 @640x480 @2x?1280w)");
        assert!(html.contains(r#"src="/photos/cat.jpg""#), "{html}");
        assert!(html.contains(
            r#"srcset="/photos/cat-320x240.jpg 320w,/photos/cat-640x480.jpg 640w,/photos/cat-2x.jpg 1280w""#
        ), "{html}");
    }

    #[test]
    fn url_without_extension() {
        let html = convert("![x](images/hero @big?900w)");
        assert!(html.contains(r#"srcset="images/hero-big 900w""#), "{html}");
    }

    #[test]
    fn literal_sentinel_in_html() {
        let html = Srcset::expand(r#"<img src="a.png||@2x?2x" alt="">"#);
        assert_eq!(html, r#"<img src="a.png" alt="" srcset="a-2x.png 2x" />"#);
    }

    #[test]
    fn plain_images_are_untouched() {
        let html = convert("![alt](img.png)");
        assert_eq!(html, "<p><img src=\"img.png\" alt=\"alt\" /></p>\n");
        assert!(matches!(Srcset::expand(&html), Cow::Borrowed(_)));
    }

    #[test]
    fn code_is_left_as_written() {
        let source = "```md\n![alt](img.png @2x?200w)\n```\n";
        assert!(matches!(Srcset::tag(source), Cow::Borrowed(_)));

        let html = convert(source);
        assert!(html.contains("![alt](img.png @2x?200w)"), "{html}");
        assert!(!html.contains("||"), "{html}");

        let html = convert("Use `![a](b.png @thumb)` for ![b](c.png @thumb).");
        assert!(html.contains("<code>![a](b.png @thumb)</code>"), "{html}");
        assert!(html.contains(r#"srcset="c-thumb.png ""#), "{html}");
    }

    #[test]
    fn malformed_rules_are_skipped() {
        assert!(ResponsiveImageRule::parse("@").is_none());
        assert!(ResponsiveImageRule::parse("@a?").is_none());
        assert!(ResponsiveImageRule::parse("").is_none());

        let html = Srcset::expand(r#"<img src="a.png||@2x,,@3x" />"#);
        assert_eq!(html, r#"<img src="a.png" srcset="a-2x.png ,a-3x.png " />"#);
    }
}

//! Server-side `<head>` injection.
//!
//! Each tag is located by its `name`/`property`/`rel` selector and rewritten in
//! place, so applying the same metadata twice leaves the document unchanged.
//! Tags with an empty value are removed instead of emitted blank.

use regex::Regex;
use std::collections::HashMap;
use std::ops::Range;

use super::metadata::{ContentType, Metadata};
use crate::config::SiteConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    Title,
    /// `<meta name=...>`
    Name(&'static str),
    /// `<meta property=...>`
    Property(&'static str),
    /// `<link rel=...>`
    Link(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadTag {
    pub selector: Selector,
    pub value: String,
}

impl HeadTag {
    fn new(selector: Selector, value: impl Into<String>) -> Self {
        Self {
            selector,
            value: value.into(),
        }
    }

    fn render(&self) -> String {
        let value = escape(&self.value);
        match self.selector {
            Selector::Title => format!("<title>{value}</title>"),
            Selector::Name(key) => format!(r#"<meta name="{key}" content="{value}">"#),
            Selector::Property(key) => format!(r#"<meta property="{key}" content="{value}">"#),
            Selector::Link(rel) => format!(r#"<link rel="{rel}" href="{value}">"#),
        }
    }
}

const META_KEYS: &[&str] = &[
    "description",
    "keywords",
    "og:title",
    "og:description",
    "og:image",
    "og:url",
    "og:type",
    "og:site_name",
    "twitter:card",
    "twitter:site",
    "twitter:title",
    "twitter:description",
    "twitter:image",
];

lazy_static::lazy_static! {
    static ref HEAD_OPEN: Regex = Regex::new(r"(?i)<head(?:\s[^>]*)?>").unwrap();
    /// Where head content stops: `</head>`, or the implied end at `<body` or `</html>`.
    static ref HEAD_END: Regex = Regex::new(r"(?i)</head\s*>|<body[\s>]|</html\s*>").unwrap();
    static ref COMMENT: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
    static ref HTML_OPEN: Regex = Regex::new(r"(?i)<html(?:\s[^>]*)?>").unwrap();
    static ref TITLE: Regex = Regex::new(r"(?is)<title(?:\s[^>]*)?>.*?</title\s*>").unwrap();
    static ref CANONICAL: Regex = link_regex("canonical");

    /// Matches either attribute so a template's `name="og:title"` is also
    /// replaced rather than duplicated.
    static ref META: HashMap<&'static str, Regex> = META_KEYS
        .iter()
        .map(|key| {
            let pattern = format!(
                r#"(?i)<meta\s(?:[^>]*\s)?(?:name|property)\s*=\s*["']{}["'][^>]*>"#,
                regex::escape(key)
            );
            (*key, Regex::new(&pattern).unwrap())
        })
        .collect();
}

fn link_regex(rel: &str) -> Regex {
    Regex::new(&format!(
        r#"(?i)<link\s(?:[^>]*\s)?rel\s*=\s*["']{}["'][^>]*>"#,
        regex::escape(rel)
    ))
    .unwrap()
}

fn selector_regex(selector: Selector) -> Option<&'static Regex> {
    match selector {
        Selector::Title => Some(&*TITLE),
        Selector::Name(key) | Selector::Property(key) => META.get(key),
        Selector::Link("canonical") => Some(&*CANONICAL),
        Selector::Link(_) => None,
    }
}

/// HTML escape for text and double- or single-quoted attribute values.
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// The full tag set for one page.
pub fn head_tags(meta: &Metadata, content_type: ContentType, site: &SiteConfig) -> Vec<HeadTag> {
    let card = if meta.og_image.is_empty() {
        "summary"
    } else {
        "summary_large_image"
    };

    vec![
        HeadTag::new(Selector::Title, &meta.title),
        HeadTag::new(Selector::Name("description"), &meta.description),
        HeadTag::new(Selector::Name("keywords"), &meta.keywords),
        HeadTag::new(Selector::Link("canonical"), &meta.canonical),
        HeadTag::new(Selector::Property("og:title"), &meta.og_title),
        HeadTag::new(Selector::Property("og:description"), &meta.og_description),
        HeadTag::new(Selector::Property("og:image"), &meta.og_image),
        HeadTag::new(Selector::Property("og:url"), &meta.canonical),
        HeadTag::new(Selector::Property("og:type"), content_type.as_str()),
        HeadTag::new(Selector::Property("og:site_name"), &site.name),
        HeadTag::new(Selector::Name("twitter:card"), card),
        HeadTag::new(
            Selector::Name("twitter:site"),
            site.twitter_handle.clone().unwrap_or_default(),
        ),
        HeadTag::new(Selector::Name("twitter:title"), &meta.og_title),
        HeadTag::new(Selector::Name("twitter:description"), &meta.og_description),
        HeadTag::new(Selector::Name("twitter:image"), &meta.og_image),
    ]
}

/// Returns `html` with every tag in `tags` present exactly once in `<head>`
/// (or absent when its value is empty).
pub fn apply(html: &str, tags: &[HeadTag]) -> String {
    let document = ensure_head(html);

    let Some(bounds) = locate_head(&document) else {
        return document;
    };

    let mut head = document[bounds.clone()].to_string();
    for tag in tags {
        let Some(re) = selector_regex(tag.selector) else {
            continue;
        };
        rewrite(&mut head, re, tag);
    }

    let mut out = String::with_capacity(document.len() + head.len());
    out.push_str(&document[..bounds.start]);
    out.push_str(&head);
    out.push_str(&document[bounds.end..]);
    out
}

/// Byte range of the head's content, ignoring anything inside comments.
fn locate_head(html: &str) -> Option<Range<usize>> {
    let comments: Vec<Range<usize>> = COMMENT.find_iter(html).map(|m| m.range()).collect();
    let open = find_outside(&HEAD_OPEN, html, 0, &comments)?;
    let end = find_outside(&HEAD_END, html, open.end, &comments).map_or(html.len(), |m| m.start);
    Some(open.end..end)
}

/// First match of `re` at or after `from` that does not start inside a comment.
fn find_outside(re: &Regex, html: &str, from: usize, comments: &[Range<usize>]) -> Option<Range<usize>> {
    let mut at = from;
    while let Some(m) = re.find_at(html, at) {
        match comments.iter().find(|c| c.contains(&m.start())) {
            Some(comment) => at = comment.end,
            None => return Some(m.range()),
        }
    }
    None
}

fn rewrite(head: &mut String, re: &Regex, tag: &HeadTag) {
    let found: Vec<Range<usize>> = re.find_iter(head.as_str()).map(|m| m.range()).collect();
    let keep = !tag.value.trim().is_empty();

    match found.first().map(|r| r.start) {
        Some(first) => {
            for range in found.into_iter().rev() {
                head.replace_range(range, "");
            }
            if keep {
                head.insert_str(first, &tag.render());
            }
        }
        None if keep => {
            if !head.is_empty() && !head.ends_with('\n') {
                head.push('\n');
            }
            head.push_str(&tag.render());
            head.push('\n');
        }
        None => {}
    }
}

fn ensure_head(html: &str) -> String {
    let comments: Vec<Range<usize>> = COMMENT.find_iter(html).map(|m| m.range()).collect();
    if find_outside(&HEAD_OPEN, html, 0, &comments).is_some() {
        return html.to_string();
    }
    match find_outside(&HTML_OPEN, html, 0, &comments) {
        Some(m) => format!("{}<head>\n</head>{}", &html[..m.end], &html[m.end..]),
        None => format!("<head>\n</head>\n{html}"),
    }
}

//! Metadata resolution: defaults, then parent, then page content, then item,
//! merged field by field into one fully populated [`Metadata`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::route::{ItemKind, PageRoute};
use crate::config::SiteConfig;
use crate::db::models::{BlogPost, PageContent, Project};

/// Resolved head metadata. Every field is always present, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub canonical: String,
    pub og_title: String,
    pub og_description: String,
    pub og_image: String,
}

/// One override layer. `None` leaves the field to lower layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub canonical: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Website,
    Article,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Website => "website",
            ContentType::Article => "article",
        }
    }

    pub fn for_route(route: &PageRoute) -> Self {
        if route.item().is_some() {
            ContentType::Article
        } else {
            ContentType::Website
        }
    }
}

impl PartialMetadata {
    /// Reads a loosely typed `metadata` object. Unknown keys, non-string
    /// values and blank strings are ignored; `keywords` may be an array.
    pub fn from_json(object: &Map<String, Value>) -> Self {
        let text = |key: &str| object.get(key).and_then(non_blank);
        Self {
            title: text("title"),
            description: text("description"),
            keywords: object.get("keywords").and_then(keywords_value),
            canonical: text("canonical"),
            og_title: text("ogTitle"),
            og_description: text("ogDescription"),
            og_image: text("ogImage"),
        }
    }

    /// Layer derived from a blog post shown on its detail page.
    pub fn from_blog_post(site: &SiteConfig, post: &BlogPost) -> Self {
        item_layer(
            site,
            ItemKind::Blog,
            &post.slug,
            &post.title,
            &post.excerpt,
            post.image_url.as_deref(),
        )
    }

    /// Layer derived from a project shown on its detail page.
    pub fn from_project(site: &SiteConfig, project: &Project) -> Self {
        item_layer(
            site,
            ItemKind::Projects,
            &project.slug,
            &project.title,
            &project.description,
            project.image_url.as_deref(),
        )
    }

    /// Drops blank strings so they never override a lower layer.
    fn normalized(&self) -> Self {
        let keep = |v: &Option<String>| v.as_ref().filter(|s| !s.trim().is_empty()).cloned();
        Self {
            title: keep(&self.title),
            description: keep(&self.description),
            keywords: keep(&self.keywords),
            canonical: keep(&self.canonical),
            og_title: keep(&self.og_title),
            og_description: keep(&self.og_description),
            og_image: keep(&self.og_image),
        }
    }

    /// Per-field merge; fields set on `over` win.
    fn overlay(&mut self, over: &PartialMetadata) {
        let over = over.normalized();
        let set = |dst: &mut Option<String>, src: Option<String>| {
            if src.is_some() {
                *dst = src;
            }
        };
        set(&mut self.title, over.title);
        set(&mut self.description, over.description);
        set(&mut self.keywords, over.keywords);
        set(&mut self.canonical, over.canonical);
        set(&mut self.og_title, over.og_title);
        set(&mut self.og_description, over.og_description);
        set(&mut self.og_image, over.og_image);
    }
}

fn non_blank(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn keywords_value(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => {
            let words: Vec<&str> = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            (!words.is_empty()).then(|| words.join(", "))
        }
        other => non_blank(other),
    }
}

fn item_layer(
    site: &SiteConfig,
    kind: ItemKind,
    slug: &str,
    title: &str,
    summary: &str,
    image_url: Option<&str>,
) -> PartialMetadata {
    PartialMetadata {
        title: Some(format!("{} | {}", title, site.name)),
        description: Some(summary.to_string()),
        keywords: None,
        canonical: Some(item_canonical(site, kind, slug)),
        og_title: Some(title.to_string()),
        og_description: Some(summary.to_string()),
        og_image: image_url.map(str::to_string),
    }
}

/// `https://<site>/<type>/<slug>/`
pub fn item_canonical(site: &SiteConfig, kind: ItemKind, slug: &str) -> String {
    site.absolute_url(&format!("{}/{}", kind.as_str(), slug))
}

/// Extracts the metadata layer from stored page content.
///
/// String content is parsed as JSON text. Anything that does not end up as a
/// JSON object contributes an empty layer; parse failures are logged.
pub fn page_layer(page: &PageContent) -> PartialMetadata {
    let parsed;
    let content = match &page.content {
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(value) => {
                parsed = value;
                &parsed
            }
            Err(e) => {
                tracing::warn!(page = %page.page, error = %e, "page content is not valid JSON, skipping layer");
                return PartialMetadata::default();
            }
        },
        other => other,
    };

    content
        .as_object()
        .and_then(|object| object.get("metadata"))
        .and_then(Value::as_object)
        .map(PartialMetadata::from_json)
        .unwrap_or_default()
}

/// Inputs to [`resolve`]. Every layer is optional.
#[derive(Debug, Default, Clone, Copy)]
pub struct Layers<'a> {
    pub parent: Option<&'a PartialMetadata>,
    pub page: Option<&'a PageContent>,
    pub item: Option<&'a PartialMetadata>,
}

pub fn resolve(site: &SiteConfig, route: &PageRoute, layers: Layers<'_>) -> Metadata {
    let mut merged = PartialMetadata {
        title: Some(site.name.clone()),
        description: Some(site.description.clone()),
        keywords: Some(site.keywords.clone()),
        og_image: Some(site.og_image.clone()),
        ..PartialMetadata::default()
    };

    if let Some(parent) = layers.parent {
        merged.overlay(parent);
    }
    if let Some(page) = layers.page {
        merged.overlay(&page_layer(page));
    }
    if let Some(item) = layers.item {
        merged.overlay(item);
    }

    let title = merged.title.unwrap_or_default();
    let description = merged.description.unwrap_or_default();
    let canonical = merged.canonical.unwrap_or_else(|| match route.item() {
        Some((kind, slug)) => item_canonical(site, kind, slug),
        None => site.absolute_url(&route.path),
    });

    Metadata {
        og_title: merged.og_title.unwrap_or_else(|| title.clone()),
        og_description: merged.og_description.unwrap_or_else(|| description.clone()),
        og_image: merged.og_image.unwrap_or_default(),
        keywords: merged.keywords.unwrap_or_default(),
        title,
        description,
        canonical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seo::route::map_path;
    use chrono::Utc;
    use serde_json::json;

    fn site() -> SiteConfig {
        SiteConfig {
            name: "Site".to_string(),
            url: "https://acme.dev".to_string(),
            ..SiteConfig::default()
        }
    }

    fn page(content: Value) -> PageContent {
        PageContent {
            page: "home".to_string(),
            content,
            updated_at: Utc::now(),
        }
    }

    fn project(slug: &str) -> Project {
        let now = Utc::now();
        Project {
            id: 1,
            title: "Widget".to_string(),
            slug: slug.to_string(),
            description: "A widget".to_string(),
            content: String::new(),
            image_url: Some("https://cdn.acme.dev/widget.png".to_string()),
            category: None,
            github_url: None,
            demo_url: None,
            is_featured: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_defaults_only_fill_every_field() {
        for path in ["/", "/about", "/blog", "/legal", "/contact"] {
            let route = map_path(path);
            let meta = resolve(&site(), &route, Layers::default());
            assert_eq!(meta.title, "Site");
            assert_eq!(meta.og_title, "Site");
            assert_eq!(meta.description, "");
            assert_eq!(meta.og_description, "");
            assert_eq!(meta.keywords, "");
            assert_eq!(meta.og_image, "");
            assert!(meta.canonical.starts_with("https://acme.dev/"));
        }
    }

    #[test]
    fn test_item_beats_page_beats_default() {
        let route = map_path("/blog/item");
        let content = page(json!({ "metadata": { "title": "Page", "description": "Page desc" } }));
        let item = PartialMetadata {
            title: Some("Item | Site".to_string()),
            ..PartialMetadata::default()
        };
        let meta = resolve(
            &site(),
            &route,
            Layers {
                page: Some(&content),
                item: Some(&item),
                ..Layers::default()
            },
        );
        assert_eq!(meta.title, "Item | Site");
        assert_eq!(meta.description, "Page desc");
    }

    #[test]
    fn test_blog_post_layer_suffixes_site_name() {
        let now = Utc::now();
        let post = BlogPost {
            id: 7,
            title: "Item".to_string(),
            slug: "item".to_string(),
            excerpt: "Short".to_string(),
            content: String::new(),
            image_url: None,
            author: None,
            created_at: now,
            updated_at: now,
        };
        let layer = PartialMetadata::from_blog_post(&site(), &post);
        let content = page(json!({ "metadata": { "title": "Page" } }));
        let meta = resolve(
            &site(),
            &map_path("/blog/item"),
            Layers {
                page: Some(&content),
                item: Some(&layer),
                ..Layers::default()
            },
        );
        assert_eq!(meta.title, "Item | Site");
        assert_eq!(meta.og_title, "Item");
        assert_eq!(meta.description, "Short");
        assert_eq!(meta.canonical, "https://acme.dev/blog/item/");
    }

    #[test]
    fn test_parent_sits_between_defaults_and_page() {
        let parent = PartialMetadata {
            title: Some("Parent".to_string()),
            keywords: Some("parent, words".to_string()),
            ..PartialMetadata::default()
        };
        let content = page(json!({ "metadata": { "title": "Page" } }));
        let meta = resolve(
            &site(),
            &map_path("/"),
            Layers {
                parent: Some(&parent),
                page: Some(&content),
                item: None,
            },
        );
        assert_eq!(meta.title, "Page");
        assert_eq!(meta.keywords, "parent, words");
    }

    #[test]
    fn test_malformed_string_content_is_skipped() {
        let content = page(Value::String("{not json".to_string()));
        let meta = resolve(
            &site(),
            &map_path("/"),
            Layers {
                page: Some(&content),
                ..Layers::default()
            },
        );
        assert_eq!(meta.title, "Site");
    }

    #[test]
    fn test_string_content_holding_json_is_parsed() {
        let content = page(Value::String(
            r#"{"metadata":{"title":"From text","ogImage":"/og.png"}}"#.to_string(),
        ));
        let meta = resolve(
            &site(),
            &map_path("/"),
            Layers {
                page: Some(&content),
                ..Layers::default()
            },
        );
        assert_eq!(meta.title, "From text");
        assert_eq!(meta.og_title, "From text");
        assert_eq!(meta.og_image, "/og.png");
    }

    #[test]
    fn test_non_object_content_is_empty_layer() {
        for content in [json!([1, 2, 3]), json!("\"just a string\""), json!(42), json!(null)] {
            let layer = page_layer(&page(content));
            assert_eq!(layer, PartialMetadata::default());
        }
        let layer = page_layer(&page(json!({ "metadata": "nope" })));
        assert_eq!(layer, PartialMetadata::default());
    }

    #[test]
    fn test_blank_and_non_string_fields_do_not_override() {
        let content = page(json!({
            "metadata": { "title": "   ", "description": 12, "ogTitle": "Shared" }
        }));
        let meta = resolve(
            &site(),
            &map_path("/"),
            Layers {
                page: Some(&content),
                ..Layers::default()
            },
        );
        assert_eq!(meta.title, "Site");
        assert_eq!(meta.description, "");
        assert_eq!(meta.og_title, "Shared");
    }

    #[test]
    fn test_keywords_array_is_joined() {
        let content = page(json!({ "metadata": { "keywords": ["rust", " web ", 3, ""] } }));
        let layer = page_layer(&content);
        assert_eq!(layer.keywords.as_deref(), Some("rust, web"));
    }

    #[test]
    fn test_project_canonical_default() {
        let route = map_path("/projects/widget");
        let meta = resolve(&site(), &route, Layers::default());
        assert_eq!(meta.canonical, "https://acme.dev/projects/widget/");

        let layer = PartialMetadata::from_project(&site(), &project("widget"));
        let meta = resolve(
            &site(),
            &route,
            Layers {
                item: Some(&layer),
                ..Layers::default()
            },
        );
        assert_eq!(meta.canonical, "https://acme.dev/projects/widget/");
        assert_eq!(meta.og_image, "https://cdn.acme.dev/widget.png");
        assert_eq!(meta.og_description, "A widget");
    }

    #[test]
    fn test_explicit_canonical_wins() {
        let content = page(json!({ "metadata": { "canonical": "https://other.dev/home" } }));
        let meta = resolve(
            &site(),
            &map_path("/"),
            Layers {
                page: Some(&content),
                ..Layers::default()
            },
        );
        assert_eq!(meta.canonical, "https://other.dev/home");
    }

    #[test]
    fn test_page_canonical_from_route() {
        let meta = resolve(&site(), &map_path("/about/"), Layers::default());
        assert_eq!(meta.canonical, "https://acme.dev/about/");
        let meta = resolve(&site(), &map_path("/"), Layers::default());
        assert_eq!(meta.canonical, "https://acme.dev/");
    }

    #[test]
    fn test_site_defaults_feed_og_fields() {
        let site = SiteConfig {
            description: "We build things".to_string(),
            og_image: "https://acme.dev/og.png".to_string(),
            ..site()
        };
        let meta = resolve(&site, &map_path("/"), Layers::default());
        assert_eq!(meta.og_description, "We build things");
        assert_eq!(meta.og_image, "https://acme.dev/og.png");
    }
}

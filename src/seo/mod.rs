/*!
 * SEO Module
 * Route mapping, metadata resolution and head injection
 */
pub mod head;
pub mod metadata;
pub mod route;

use serde::Serialize;

use self::metadata::{ContentType, Layers, Metadata, PartialMetadata};
use self::route::{is_valid_slug, ItemKind, PageRoute};
use crate::config::SiteConfig;
use crate::db::{ItemStore, PageStore, Store, StoreResult};

/// Everything a renderer needs for one path.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPage {
    pub route: PageRoute,
    pub metadata: Metadata,
    pub content_type: ContentType,
    /// The path names a detail item that does not exist.
    pub not_found: bool,
}

impl ResolvedPage {
    /// Writes the resolved tags into an HTML document's head.
    pub fn apply_to(&self, html: &str, site: &SiteConfig) -> String {
        head::apply(html, &head::head_tags(&self.metadata, self.content_type, site))
    }
}

/// Maps `path`, loads its layers and resolves metadata.
///
/// Store failures never escape: the affected layer is skipped with a warning
/// and the page still resolves to baseline metadata.
pub async fn resolve_path(store: &dyn Store, site: &SiteConfig, path: &str) -> ResolvedPage {
    let mut route = route::map_path(path);

    let page = match store.get_page(&route.page_key).await {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!(page = %route.page_key, error = %e, "page content fetch failed, using defaults");
            None
        }
    };

    let mut not_found = false;
    let item = match route.item() {
        None => None,
        Some((kind, slug)) if !is_valid_slug(slug) => {
            tracing::debug!(kind = kind.as_str(), slug, "invalid slug on detail route");
            not_found = true;
            None
        }
        Some((kind, slug)) => match item_layer(store, site, kind, slug).await {
            Ok(Some(layer)) => Some(layer),
            Ok(None) => {
                not_found = true;
                None
            }
            Err(e) => {
                tracing::warn!(kind = kind.as_str(), slug, error = %e, "item fetch failed, using page defaults");
                None
            }
        },
    };

    // A missing item resolves as its section's index page.
    if not_found {
        route.item_type = None;
        route.item_slug = None;
        route.path = route.page_key.clone();
    }

    let metadata = metadata::resolve(
        site,
        &route,
        Layers {
            parent: None,
            page: page.as_ref(),
            item: item.as_ref(),
        },
    );

    ResolvedPage {
        content_type: ContentType::for_route(&route),
        route,
        metadata,
        not_found,
    }
}

async fn item_layer(
    store: &dyn Store,
    site: &SiteConfig,
    kind: ItemKind,
    slug: &str,
) -> StoreResult<Option<PartialMetadata>> {
    Ok(match kind {
        ItemKind::Blog => store
            .get_blog_post_by_slug(slug)
            .await?
            .map(|post| PartialMetadata::from_blog_post(site, &post)),
        ItemKind::Projects => store
            .get_project_by_slug(slug)
            .await?
            .map(|project| PartialMetadata::from_project(site, &project)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::BlogPostInput;
    use crate::db::MemoryStore;
    use serde_json::json;

    fn site() -> SiteConfig {
        SiteConfig {
            name: "Site".to_string(),
            url: "https://acme.dev".to_string(),
            ..SiteConfig::default()
        }
    }

    #[tokio::test]
    async fn test_detail_route_uses_item() {
        let store = MemoryStore::new();
        store
            .upsert_page("blog", &json!({ "metadata": { "title": "Blog", "description": "All posts" } }))
            .await
            .unwrap();
        store
            .create_blog_post(&BlogPostInput {
                title: "Hello".to_string(),
                slug: "hello".to_string(),
                excerpt: "First post".to_string(),
                content: "Body".to_string(),
                image_url: Some("/hello.png".to_string()),
                author: None,
            })
            .await
            .unwrap();

        let resolved = resolve_path(&store, &site(), "/blog/hello/").await;
        assert!(!resolved.not_found);
        assert_eq!(resolved.content_type, ContentType::Article);
        assert_eq!(resolved.metadata.title, "Hello | Site");
        assert_eq!(resolved.metadata.description, "First post");
        assert_eq!(resolved.metadata.og_image, "/hello.png");
        assert_eq!(resolved.metadata.canonical, "https://acme.dev/blog/hello/");
    }

    #[tokio::test]
    async fn test_missing_item_falls_back_to_page_defaults() {
        let store = MemoryStore::new();
        store
            .upsert_page("blog", &json!({ "metadata": { "title": "Blog" } }))
            .await
            .unwrap();

        let resolved = resolve_path(&store, &site(), "/blog/nope").await;
        assert!(resolved.not_found);
        assert_eq!(resolved.content_type, ContentType::Website);
        assert_eq!(resolved.metadata.title, "Blog");
        assert_eq!(resolved.metadata.canonical, "https://acme.dev/blog/");
    }

    #[tokio::test]
    async fn test_invalid_slug_is_not_found() {
        let store = MemoryStore::new();
        let resolved = resolve_path(&store, &site(), "/projects/Not%20A%20Slug").await;
        assert!(resolved.not_found);
        assert_eq!(resolved.metadata.title, "Site");
    }

    #[tokio::test]
    async fn test_apply_to_renders_head() {
        let store = MemoryStore::new();
        let resolved = resolve_path(&store, &site(), "/about").await;
        let html = resolved.apply_to("<html><head></head><body></body></html>", &site());
        assert!(html.contains("<title>Site</title>"));
        assert!(html.contains(r#"<link rel="canonical" href="https://acme.dev/about/">"#));
        assert!(html.contains(r#"<meta property="og:type" content="website">"#));
    }
}

/**
 * Feed Routes
 * rss.xml, sitemap.xml and robots.txt built from the store
 */
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::db::{ItemStore, PageStore};
use crate::error::ApiError;
use crate::seo::{metadata::item_canonical, route::ItemKind};
use crate::state::AppState;

const RSS_ITEM_LIMIT: usize = 50;

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn rfc822(dt: &DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S +0000").to_string()
}

fn xml_response(content_type: &'static str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::CACHE_CONTROL,
                "public, max-age=3600, stale-while-revalidate=600",
            ),
        ],
        body,
    )
        .into_response()
}

/// GET /rss.xml - Latest blog posts
pub async fn rss_feed(State(state): State<AppState>) -> Result<Response, ApiError> {
    let site = &state.config.site;
    let posts = state.store.list_blog_posts().await?;

    let mut items = String::new();
    for post in posts.iter().take(RSS_ITEM_LIMIT) {
        let post_url = item_canonical(site, ItemKind::Blog, &post.slug);
        items.push_str(&format!(
            "    <item>\n\
                   <title>{}</title>\n\
                   <link>{}</link>\n\
                   <description>{}</description>\n\
                   <pubDate>{}</pubDate>\n\
                   <guid isPermaLink=\"true\">{}</guid>\n\
                 </item>\n",
            escape_xml(&post.title),
            escape_xml(&post_url),
            escape_xml(&post.excerpt),
            rfc822(&post.created_at),
            escape_xml(&post_url),
        ));
    }

    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <title>{}</title>
    <link>{}</link>
    <description>{}</description>
    <language>en-us</language>
    <atom:link href="{}/rss.xml" rel="self" type="application/rss+xml"/>
    <lastBuildDate>{}</lastBuildDate>
{}  </channel>
</rss>"#,
        escape_xml(&site.name),
        escape_xml(&site.absolute_url("blog")),
        escape_xml(&site.description),
        escape_xml(&site.url),
        posts.first().map(|p| rfc822(&p.created_at)).unwrap_or_default(),
        items,
    );

    Ok(xml_response("application/rss+xml; charset=utf-8", xml))
}

/// GET /sitemap.xml - Pages, blog posts and projects
pub async fn sitemap(State(state): State<AppState>) -> Result<Response, ApiError> {
    let site = &state.config.site;

    // url -> last modified
    let mut urls: BTreeMap<String, Option<DateTime<Utc>>> = BTreeMap::new();
    urls.insert(site.absolute_url(""), None);
    for kind in [ItemKind::Blog, ItemKind::Projects] {
        urls.insert(site.absolute_url(kind.as_str()), None);
    }

    for page in state.store.list_pages().await? {
        let path = if page.page == "home" { "" } else { page.page.as_str() };
        urls.insert(site.absolute_url(path), Some(page.updated_at));
    }
    for post in state.store.list_blog_posts().await? {
        urls.insert(
            item_canonical(site, ItemKind::Blog, &post.slug),
            Some(post.updated_at),
        );
    }
    for project in state.store.list_projects(None).await? {
        urls.insert(
            item_canonical(site, ItemKind::Projects, &project.slug),
            Some(project.updated_at),
        );
    }

    let mut body = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for (loc, lastmod) in &urls {
        body.push_str("  <url>\n");
        body.push_str(&format!("    <loc>{}</loc>\n", escape_xml(loc)));
        if let Some(lastmod) = lastmod {
            body.push_str(&format!(
                "    <lastmod>{}</lastmod>\n",
                lastmod.format("%Y-%m-%d")
            ));
        }
        body.push_str("  </url>\n");
    }
    body.push_str("</urlset>\n");

    Ok(xml_response("application/xml; charset=utf-8", body))
}

/// GET /robots.txt
pub async fn robots(State(state): State<AppState>) -> impl IntoResponse {
    let body = format!(
        "User-agent: *\nAllow: /\nDisallow: /api/\n\nSitemap: {}/sitemap.xml\n",
        state.config.site.url
    );
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body)
}

//! Maps a request path to the page-content key and, for detail routes, the
//! item it describes.

use regex::Regex;
use serde::Serialize;

lazy_static::lazy_static! {
    /// Lowercase letters, numbers and single hyphens.
    static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
}

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_REGEX.is_match(slug)
}

/// Item tables that have their own detail routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Blog,
    Projects,
}

impl ItemKind {
    /// First path segment of the detail route, also the page key of its index.
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Blog => "blog",
            ItemKind::Projects => "projects",
        }
    }

    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "blog" => Some(ItemKind::Blog),
            "projects" => Some(ItemKind::Projects),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRoute {
    pub page_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_type: Option<ItemKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_slug: Option<String>,
    /// Path with query, fragment and surrounding slashes removed.
    #[serde(skip)]
    pub path: String,
}

impl PageRoute {
    pub fn item(&self) -> Option<(ItemKind, &str)> {
        match (self.item_type, self.item_slug.as_deref()) {
            (Some(kind), Some(slug)) => Some((kind, slug)),
            _ => None,
        }
    }
}

pub fn map_path(raw: &str) -> PageRoute {
    let without_query = raw.split(['?', '#']).next().unwrap_or_default();
    let path = without_query.trim_matches('/');

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let (page_key, item) = match segments.as_slice() {
        [] => ("home".to_string(), None),
        [section, slug] => match ItemKind::from_segment(section) {
            Some(kind) => (kind.as_str().to_string(), Some((kind, slug.to_string()))),
            None => (section.to_string(), None),
        },
        [first, ..] => (first.to_string(), None),
    };

    PageRoute {
        page_key,
        item_type: item.as_ref().map(|(kind, _)| *kind),
        item_slug: item.map(|(_, slug)| slug),
        path: segments.join("/"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_home() {
        let route = map_path("/");
        assert_eq!(route.page_key, "home");
        assert!(route.item().is_none());
        assert_eq!(route.path, "");
        assert_eq!(map_path("").page_key, "home");
    }

    #[test]
    fn test_blog_detail() {
        let route = map_path("/blog/my-post/");
        assert_eq!(route.page_key, "blog");
        assert_eq!(route.item(), Some((ItemKind::Blog, "my-post")));
    }

    #[test]
    fn test_blog_index_has_no_item() {
        let route = map_path("/blog/");
        assert_eq!(route.page_key, "blog");
        assert!(route.item_type.is_none());
        assert!(route.item_slug.is_none());
    }

    #[test]
    fn test_project_detail() {
        let route = map_path("projects/widget");
        assert_eq!(route.page_key, "projects");
        assert_eq!(route.item(), Some((ItemKind::Projects, "widget")));
    }

    #[test]
    fn test_other_pages_use_first_segment() {
        assert_eq!(map_path("/about").page_key, "about");
        assert_eq!(map_path("/legal/privacy/section").page_key, "legal");
        assert!(map_path("/legal/privacy").item().is_none());
    }

    #[test]
    fn test_query_and_fragment_ignored() {
        let route = map_path("/blog/hello?ref=tw#top");
        assert_eq!(route.item(), Some((ItemKind::Blog, "hello")));
        assert_eq!(route.path, "blog/hello");
    }

    #[test]
    fn test_deep_blog_path_is_not_a_detail_route() {
        let route = map_path("/blog/a/b");
        assert_eq!(route.page_key, "blog");
        assert!(route.item().is_none());
    }

    #[test]
    fn test_repeated_slashes_collapse() {
        let route = map_path("//blog//post//");
        assert_eq!(route.item(), Some((ItemKind::Blog, "post")));
    }

    #[test]
    fn test_slug_validation() {
        assert!(is_valid_slug("my-post-2"));
        assert!(!is_valid_slug("My-Post"));
        assert!(!is_valid_slug("double--hyphen"));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(map_path("/projects/widget")).unwrap();
        assert_eq!(json["pageKey"], "projects");
        assert_eq!(json["itemType"], "projects");
        assert_eq!(json["itemSlug"], "widget");
    }
}

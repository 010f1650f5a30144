//! In-process store used when no database is configured, and in tests.
//! Data lives until restart.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::RwLock;

use super::models::{
    BlogPost, BlogPostInput, ContactMessage, NewContactMessage, NewWaitlistEntry, PageContent,
    Project, ProjectInput, User, WaitlistEntry,
};
use super::store::{
    ItemStore, PageStore, Store, StoreError, StoreResult, SubmissionStore, UserStore,
};

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    pages: BTreeMap<String, PageContent>,
    blog_posts: Vec<BlogPost>,
    projects: Vec<Project>,
    waitlist: Vec<WaitlistEntry>,
    contact_messages: Vec<ContactMessage>,
    users: Vec<User>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Rows are appended in id order, so reversing yields newest first.
fn newest_first<T: Clone>(rows: &[T]) -> Vec<T> {
    rows.iter().rev().cloned().collect()
}

#[async_trait]
impl PageStore for MemoryStore {
    async fn get_page(&self, page: &str) -> StoreResult<Option<PageContent>> {
        Ok(self.tables.read().await.pages.get(page).cloned())
    }

    async fn list_pages(&self) -> StoreResult<Vec<PageContent>> {
        Ok(self.tables.read().await.pages.values().cloned().collect())
    }

    async fn upsert_page(&self, page: &str, content: &Value) -> StoreResult<PageContent> {
        let row = PageContent {
            page: page.to_string(),
            content: content.clone(),
            updated_at: Utc::now(),
        };
        self.tables
            .write()
            .await
            .pages
            .insert(page.to_string(), row.clone());
        Ok(row)
    }

    async fn delete_page(&self, page: &str) -> StoreResult<bool> {
        Ok(self.tables.write().await.pages.remove(page).is_some())
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn list_blog_posts(&self) -> StoreResult<Vec<BlogPost>> {
        Ok(newest_first(&self.tables.read().await.blog_posts))
    }

    async fn get_blog_post(&self, id: i64) -> StoreResult<Option<BlogPost>> {
        let tables = self.tables.read().await;
        Ok(tables.blog_posts.iter().find(|p| p.id == id).cloned())
    }

    async fn get_blog_post_by_slug(&self, slug: &str) -> StoreResult<Option<BlogPost>> {
        let tables = self.tables.read().await;
        Ok(tables.blog_posts.iter().find(|p| p.slug == slug).cloned())
    }

    async fn create_blog_post(&self, input: &BlogPostInput) -> StoreResult<BlogPost> {
        let mut tables = self.tables.write().await;
        if tables.blog_posts.iter().any(|p| p.slug == input.slug) {
            return Err(StoreError::Conflict);
        }
        let now = Utc::now();
        let post = BlogPost {
            id: tables.allocate_id(),
            title: input.title.clone(),
            slug: input.slug.clone(),
            excerpt: input.excerpt.clone(),
            content: input.content.clone(),
            image_url: input.image_url.clone(),
            author: input.author.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.blog_posts.push(post.clone());
        Ok(post)
    }

    async fn update_blog_post(
        &self,
        id: i64,
        input: &BlogPostInput,
    ) -> StoreResult<Option<BlogPost>> {
        let mut tables = self.tables.write().await;
        if tables.blog_posts.iter().any(|p| p.slug == input.slug && p.id != id) {
            return Err(StoreError::Conflict);
        }
        let Some(post) = tables.blog_posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        post.title = input.title.clone();
        post.slug = input.slug.clone();
        post.excerpt = input.excerpt.clone();
        post.content = input.content.clone();
        post.image_url = input.image_url.clone();
        post.author = input.author.clone();
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete_blog_post(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.blog_posts.len();
        tables.blog_posts.retain(|p| p.id != id);
        Ok(tables.blog_posts.len() < before)
    }

    async fn list_projects(&self, featured: Option<bool>) -> StoreResult<Vec<Project>> {
        let tables = self.tables.read().await;
        Ok(newest_first(&tables.projects)
            .into_iter()
            .filter(|p| featured.is_none_or(|f| p.is_featured == f))
            .collect())
    }

    async fn get_project(&self, id: i64) -> StoreResult<Option<Project>> {
        let tables = self.tables.read().await;
        Ok(tables.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn get_project_by_slug(&self, slug: &str) -> StoreResult<Option<Project>> {
        let tables = self.tables.read().await;
        Ok(tables.projects.iter().find(|p| p.slug == slug).cloned())
    }

    async fn create_project(&self, input: &ProjectInput) -> StoreResult<Project> {
        let mut tables = self.tables.write().await;
        if tables.projects.iter().any(|p| p.slug == input.slug) {
            return Err(StoreError::Conflict);
        }
        let now = Utc::now();
        let project = Project {
            id: tables.allocate_id(),
            title: input.title.clone(),
            slug: input.slug.clone(),
            description: input.description.clone(),
            content: input.content.clone(),
            image_url: input.image_url.clone(),
            category: input.category.clone(),
            github_url: input.github_url.clone(),
            demo_url: input.demo_url.clone(),
            is_featured: input.is_featured,
            created_at: now,
            updated_at: now,
        };
        tables.projects.push(project.clone());
        Ok(project)
    }

    async fn update_project(
        &self,
        id: i64,
        input: &ProjectInput,
    ) -> StoreResult<Option<Project>> {
        let mut tables = self.tables.write().await;
        if tables.projects.iter().any(|p| p.slug == input.slug && p.id != id) {
            return Err(StoreError::Conflict);
        }
        let Some(project) = tables.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        project.title = input.title.clone();
        project.slug = input.slug.clone();
        project.description = input.description.clone();
        project.content = input.content.clone();
        project.image_url = input.image_url.clone();
        project.category = input.category.clone();
        project.github_url = input.github_url.clone();
        project.demo_url = input.demo_url.clone();
        project.is_featured = input.is_featured;
        project.updated_at = Utc::now();
        Ok(Some(project.clone()))
    }

    async fn delete_project(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.projects.len();
        tables.projects.retain(|p| p.id != id);
        Ok(tables.projects.len() < before)
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn list_waitlist(&self) -> StoreResult<Vec<WaitlistEntry>> {
        Ok(newest_first(&self.tables.read().await.waitlist))
    }

    async fn create_waitlist_entry(&self, entry: &NewWaitlistEntry) -> StoreResult<WaitlistEntry> {
        let mut tables = self.tables.write().await;
        if tables.waitlist.iter().any(|w| w.email == entry.email) {
            return Err(StoreError::Conflict);
        }
        let row = WaitlistEntry {
            id: tables.allocate_id(),
            email: entry.email.clone(),
            name: entry.name.clone(),
            created_at: Utc::now(),
        };
        tables.waitlist.push(row.clone());
        Ok(row)
    }

    async fn delete_waitlist_entry(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.waitlist.len();
        tables.waitlist.retain(|w| w.id != id);
        Ok(tables.waitlist.len() < before)
    }

    async fn list_contact_messages(&self) -> StoreResult<Vec<ContactMessage>> {
        Ok(newest_first(&self.tables.read().await.contact_messages))
    }

    async fn create_contact_message(
        &self,
        message: &NewContactMessage,
    ) -> StoreResult<ContactMessage> {
        let mut tables = self.tables.write().await;
        let row = ContactMessage {
            id: tables.allocate_id(),
            name: message.name.clone(),
            email: message.email.clone(),
            subject: message.subject.clone(),
            message: message.message.clone(),
            is_read: false,
            created_at: Utc::now(),
        };
        tables.contact_messages.push(row.clone());
        Ok(row)
    }

    async fn set_contact_message_read(
        &self,
        id: i64,
        is_read: bool,
    ) -> StoreResult<Option<ContactMessage>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .contact_messages
            .iter_mut()
            .find(|m| m.id == id)
            .map(|m| {
                m.is_read = is_read;
                m.clone()
            }))
    }

    async fn delete_contact_message(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.contact_messages.len();
        tables.contact_messages.retain(|m| m.id != id);
        Ok(tables.contact_messages.len() < before)
    }
}

/// Usernames compare like Postgres `LOWER(username)`.
fn same_username(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, id: i64) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| same_username(&u.username, username))
            .cloned())
    }

    async fn count_users(&self) -> StoreResult<i64> {
        Ok(self.tables.read().await.users.len() as i64)
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| same_username(&u.username, username)) {
            return Err(StoreError::Conflict);
        }
        let user = User {
            id: tables.allocate_id(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<Duration> {
        Ok(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(slug: &str) -> BlogPostInput {
        BlogPostInput {
            title: "Title".to_string(),
            slug: slug.to_string(),
            excerpt: "Excerpt".to_string(),
            content: "Body".to_string(),
            image_url: None,
            author: None,
        }
    }

    #[tokio::test]
    async fn test_blog_slug_is_unique() {
        let store = MemoryStore::new();
        store.create_blog_post(&post("hello")).await.unwrap();
        let err = store.create_blog_post(&post("hello")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
    }

    #[tokio::test]
    async fn test_update_keeps_own_slug_but_rejects_others() {
        let store = MemoryStore::new();
        let first = store.create_blog_post(&post("first")).await.unwrap();
        store.create_blog_post(&post("second")).await.unwrap();

        let same = store.update_blog_post(first.id, &post("first")).await.unwrap();
        assert!(same.is_some());

        let clash = store.update_blog_post(first.id, &post("second")).await;
        assert!(matches!(clash, Err(StoreError::Conflict)));

        let missing = store.update_blog_post(9_999, &post("third")).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_lists_are_newest_first() {
        let store = MemoryStore::new();
        store.create_blog_post(&post("older")).await.unwrap();
        store.create_blog_post(&post("newer")).await.unwrap();
        let slugs: Vec<_> = store
            .list_blog_posts()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.slug)
            .collect();
        assert_eq!(slugs, vec!["newer", "older"]);
    }

    #[tokio::test]
    async fn test_upsert_page_replaces_content() {
        let store = MemoryStore::new();
        store
            .upsert_page("home", &serde_json::json!({ "hero": "v1" }))
            .await
            .unwrap();
        store
            .upsert_page("home", &serde_json::json!({ "hero": "v2" }))
            .await
            .unwrap();
        let pages = store.list_pages().await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].content["hero"], "v2");
    }

    #[tokio::test]
    async fn test_featured_filter() {
        let store = MemoryStore::new();
        let base = ProjectInput {
            title: "P".to_string(),
            slug: "plain".to_string(),
            description: String::new(),
            content: String::new(),
            image_url: None,
            category: None,
            github_url: None,
            demo_url: None,
            is_featured: false,
        };
        store.create_project(&base).await.unwrap();
        store
            .create_project(&ProjectInput {
                slug: "star".to_string(),
                is_featured: true,
                ..base.clone()
            })
            .await
            .unwrap();

        assert_eq!(store.list_projects(None).await.unwrap().len(), 2);
        let featured = store.list_projects(Some(true)).await.unwrap();
        assert_eq!(featured.len(), 1);
        assert_eq!(featured[0].slug, "star");
    }

    #[tokio::test]
    async fn test_usernames_are_unique_ignoring_case() {
        let store = MemoryStore::new();
        let admin = store.create_user("Admin", "hash").await.unwrap();
        assert!(matches!(
            store.create_user("admin", "other").await,
            Err(StoreError::Conflict)
        ));
        let found = store.get_user_by_username("ADMIN").await.unwrap().unwrap();
        assert_eq!(found.id, admin.id);
        assert_eq!(store.count_users().await.unwrap(), 1);
    }
}

//! Storage seams. Handlers and the metadata pipeline only see these traits;
//! `PgStore` backs them with Postgres and `MemoryStore` with process memory.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::models::{
    BlogPost, BlogPostInput, ContactMessage, NewContactMessage, NewWaitlistEntry, PageContent,
    Project, ProjectInput, User, WaitlistEntry,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique column (slug, page key, email, username) already holds the value.
    #[error("unique constraint violated")]
    Conflict,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait PageStore: Send + Sync {
    async fn get_page(&self, page: &str) -> StoreResult<Option<PageContent>>;
    async fn list_pages(&self) -> StoreResult<Vec<PageContent>>;
    /// Insert or replace the blob for `page`, stamping `updated_at`.
    async fn upsert_page(&self, page: &str, content: &Value) -> StoreResult<PageContent>;
    async fn delete_page(&self, page: &str) -> StoreResult<bool>;
}

/// Blog posts and projects. Lists are newest first.
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn list_blog_posts(&self) -> StoreResult<Vec<BlogPost>>;
    async fn get_blog_post(&self, id: i64) -> StoreResult<Option<BlogPost>>;
    async fn get_blog_post_by_slug(&self, slug: &str) -> StoreResult<Option<BlogPost>>;
    async fn create_blog_post(&self, input: &BlogPostInput) -> StoreResult<BlogPost>;
    /// `Ok(None)` when no post has `id`.
    async fn update_blog_post(
        &self,
        id: i64,
        input: &BlogPostInput,
    ) -> StoreResult<Option<BlogPost>>;
    async fn delete_blog_post(&self, id: i64) -> StoreResult<bool>;

    async fn list_projects(&self, featured: Option<bool>) -> StoreResult<Vec<Project>>;
    async fn get_project(&self, id: i64) -> StoreResult<Option<Project>>;
    async fn get_project_by_slug(&self, slug: &str) -> StoreResult<Option<Project>>;
    async fn create_project(&self, input: &ProjectInput) -> StoreResult<Project>;
    async fn update_project(&self, id: i64, input: &ProjectInput)
    -> StoreResult<Option<Project>>;
    async fn delete_project(&self, id: i64) -> StoreResult<bool>;
}

/// Public form submissions.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn list_waitlist(&self) -> StoreResult<Vec<WaitlistEntry>>;
    async fn create_waitlist_entry(&self, entry: &NewWaitlistEntry) -> StoreResult<WaitlistEntry>;
    async fn delete_waitlist_entry(&self, id: i64) -> StoreResult<bool>;

    async fn list_contact_messages(&self) -> StoreResult<Vec<ContactMessage>>;
    async fn create_contact_message(
        &self,
        message: &NewContactMessage,
    ) -> StoreResult<ContactMessage>;
    async fn set_contact_message_read(
        &self,
        id: i64,
        is_read: bool,
    ) -> StoreResult<Option<ContactMessage>>;
    async fn delete_contact_message(&self, id: i64) -> StoreResult<bool>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: i64) -> StoreResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn count_users(&self) -> StoreResult<i64>;
    async fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<User>;
}

#[async_trait]
pub trait Store: PageStore + ItemStore + SubmissionStore + UserStore {
    /// Short name for health output ("postgres", "memory").
    fn backend(&self) -> &'static str;

    /// Round-trip latency to the backing store.
    async fn ping(&self) -> StoreResult<Duration>;
}

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use std::time::{Duration, Instant};

use super::models::{
    BlogPost, BlogPostInput, ContactMessage, NewContactMessage, NewWaitlistEntry, PageContent,
    Project, ProjectInput, User, WaitlistEntry,
};
use super::store::{
    ItemStore, PageStore, Store, StoreError, StoreResult, SubmissionStore, UserStore,
};

const BLOG_COLUMNS: &str =
    "id, title, slug, excerpt, content, image_url, author, created_at, updated_at";

const PROJECT_COLUMNS: &str = "id, title, slug, description, content, image_url, category, \
     github_url, demo_url, is_featured, created_at, updated_at";

const CONTACT_COLUMNS: &str = "id, name, email, subject, message, is_read, created_at";

/// Postgres-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Unique violations become [`StoreError::Conflict`].
fn map_err(e: sqlx::Error) -> StoreError {
    let unique = e
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());
    if unique {
        StoreError::Conflict
    } else {
        StoreError::Database(e)
    }
}

#[async_trait]
impl PageStore for PgStore {
    async fn get_page(&self, page: &str) -> StoreResult<Option<PageContent>> {
        sqlx::query_as::<_, PageContent>(
            "SELECT page, content, updated_at FROM page_contents WHERE page = $1",
        )
        .bind(page)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn list_pages(&self) -> StoreResult<Vec<PageContent>> {
        sqlx::query_as::<_, PageContent>(
            "SELECT page, content, updated_at FROM page_contents ORDER BY page",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn upsert_page(&self, page: &str, content: &Value) -> StoreResult<PageContent> {
        sqlx::query_as::<_, PageContent>(
            r#"
            INSERT INTO page_contents (page, content, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (page) DO UPDATE SET
                content = EXCLUDED.content,
                updated_at = now()
            RETURNING page, content, updated_at
            "#,
        )
        .bind(page)
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn delete_page(&self, page: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM page_contents WHERE page = $1")
            .bind(page)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ItemStore for PgStore {
    async fn list_blog_posts(&self) -> StoreResult<Vec<BlogPost>> {
        sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {BLOG_COLUMNS} FROM blog_posts ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn get_blog_post(&self, id: i64) -> StoreResult<Option<BlogPost>> {
        sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {BLOG_COLUMNS} FROM blog_posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn get_blog_post_by_slug(&self, slug: &str) -> StoreResult<Option<BlogPost>> {
        sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {BLOG_COLUMNS} FROM blog_posts WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn create_blog_post(&self, input: &BlogPostInput) -> StoreResult<BlogPost> {
        sqlx::query_as::<_, BlogPost>(&format!(
            r#"
            INSERT INTO blog_posts (title, slug, excerpt, content, image_url, author, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, now(), now())
            RETURNING {BLOG_COLUMNS}
            "#
        ))
        .bind(&input.title)
        .bind(&input.slug)
        .bind(&input.excerpt)
        .bind(&input.content)
        .bind(&input.image_url)
        .bind(&input.author)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn update_blog_post(
        &self,
        id: i64,
        input: &BlogPostInput,
    ) -> StoreResult<Option<BlogPost>> {
        sqlx::query_as::<_, BlogPost>(&format!(
            r#"
            UPDATE blog_posts
            SET title = $1, slug = $2, excerpt = $3, content = $4, image_url = $5, author = $6,
                updated_at = now()
            WHERE id = $7
            RETURNING {BLOG_COLUMNS}
            "#
        ))
        .bind(&input.title)
        .bind(&input.slug)
        .bind(&input.excerpt)
        .bind(&input.content)
        .bind(&input.image_url)
        .bind(&input.author)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn delete_blog_post(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_projects(&self, featured: Option<bool>) -> StoreResult<Vec<Project>> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS} FROM projects
            WHERE $1::BOOLEAN IS NULL OR is_featured = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(featured)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn get_project(&self, id: i64) -> StoreResult<Option<Project>> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn get_project_by_slug(&self, slug: &str) -> StoreResult<Option<Project>> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn create_project(&self, input: &ProjectInput) -> StoreResult<Project> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (title, slug, description, content, image_url, category,
                                  github_url, demo_url, is_featured, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now(), now())
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(&input.title)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(&input.content)
        .bind(&input.image_url)
        .bind(&input.category)
        .bind(&input.github_url)
        .bind(&input.demo_url)
        .bind(input.is_featured)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn update_project(
        &self,
        id: i64,
        input: &ProjectInput,
    ) -> StoreResult<Option<Project>> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET title = $1, slug = $2, description = $3, content = $4, image_url = $5,
                category = $6, github_url = $7, demo_url = $8, is_featured = $9,
                updated_at = now()
            WHERE id = $10
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(&input.title)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(&input.content)
        .bind(&input.image_url)
        .bind(&input.category)
        .bind(&input.github_url)
        .bind(&input.demo_url)
        .bind(input.is_featured)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn delete_project(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SubmissionStore for PgStore {
    async fn list_waitlist(&self) -> StoreResult<Vec<WaitlistEntry>> {
        sqlx::query_as::<_, WaitlistEntry>(
            "SELECT id, email, name, created_at FROM waitlist_entries ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn create_waitlist_entry(&self, entry: &NewWaitlistEntry) -> StoreResult<WaitlistEntry> {
        sqlx::query_as::<_, WaitlistEntry>(
            r#"
            INSERT INTO waitlist_entries (email, name, created_at)
            VALUES ($1, $2, now())
            RETURNING id, email, name, created_at
            "#,
        )
        .bind(&entry.email)
        .bind(&entry.name)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn delete_waitlist_entry(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM waitlist_entries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_contact_messages(&self) -> StoreResult<Vec<ContactMessage>> {
        sqlx::query_as::<_, ContactMessage>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contact_messages ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn create_contact_message(
        &self,
        message: &NewContactMessage,
    ) -> StoreResult<ContactMessage> {
        sqlx::query_as::<_, ContactMessage>(&format!(
            r#"
            INSERT INTO contact_messages (name, email, subject, message, is_read, created_at)
            VALUES ($1, $2, $3, $4, false, now())
            RETURNING {CONTACT_COLUMNS}
            "#
        ))
        .bind(&message.name)
        .bind(&message.email)
        .bind(&message.subject)
        .bind(&message.message)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn set_contact_message_read(
        &self,
        id: i64,
        is_read: bool,
    ) -> StoreResult<Option<ContactMessage>> {
        sqlx::query_as::<_, ContactMessage>(&format!(
            "UPDATE contact_messages SET is_read = $1 WHERE id = $2 RETURNING {CONTACT_COLUMNS}"
        ))
        .bind(is_read)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn delete_contact_message(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM contact_messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn get_user(&self, id: i64) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_at FROM users WHERE LOWER(username) = LOWER($1)",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn count_users(&self) -> StoreResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(count)
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, created_at)
            VALUES ($1, $2, now())
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StoreResult<Duration> {
        let start = Instant::now();
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(start.elapsed())
    }
}

//! Database Models - rows of the content, item, submission and user tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Page content row: a free-form JSON blob keyed by page identifier.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContent {
    pub page: String,
    pub content: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

/// Blog post model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub image_url: Option<String>,
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields written on blog post create and update
#[derive(Debug, Clone)]
pub struct BlogPostInput {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub image_url: Option<String>,
    pub author: Option<String>,
}

/// Project model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub content: String,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub github_url: Option<String>,
    pub demo_url: Option<String>,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields written on project create and update
#[derive(Debug, Clone)]
pub struct ProjectInput {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub content: String,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub github_url: Option<String>,
    pub demo_url: Option<String>,
    pub is_featured: bool,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistEntry {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWaitlistEntry {
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewContactMessage {
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
}

/// Admin user. The password hash never leaves the server.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

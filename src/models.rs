use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::slug::Sluggable;

/// Columns selected for tool listings; keep in sync with [`Tool::from_row`].
pub const TOOL_COLUMNS: &str = "id, name, slug, short_description, description, image_url, \
     website_url, pricing, category_id, COALESCE(featured, false) AS featured, \
     rating::float8 AS rating, created_at, updated_at, published_at";

pub const CATEGORY_COLUMNS: &str =
    "id, name, slug, description, icon, image_url, updated_at";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub id: Uuid,
    pub name: String,
    pub slug: Option<String>,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub website_url: Option<String>,
    pub pricing: Option<Value>,
    pub category_id: Option<Uuid>,
    pub featured: bool,
    pub rating: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
}

impl Tool {
    /// A tool with only the identifying fields set.
    pub fn new(name: impl Into<String>, slug: Option<&str>, category_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: slug.map(ToOwned::to_owned),
            short_description: None,
            description: None,
            image_url: None,
            website_url: None,
            pricing: None,
            category_id,
            featured: false,
            rating: None,
            created_at: None,
            updated_at: None,
            published_at: None,
        }
    }

    pub fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            short_description: row.try_get("short_description")?,
            description: row.try_get("description")?,
            image_url: row.try_get("image_url")?,
            website_url: row.try_get("website_url")?,
            pricing: row.try_get("pricing")?,
            category_id: row.try_get("category_id")?,
            featured: row.try_get("featured")?,
            rating: row.try_get("rating")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            published_at: row.try_get("published_at")?,
        })
    }

    /// Most recent of `updated_at` and `published_at`.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.updated_at.max(self.published_at)
    }
}

impl Sluggable for Tool {
    fn name(&self) -> &str {
        &self.name
    }

    fn stored_slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub image_url: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Category {
    pub fn new(name: impl Into<String>, slug: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: slug.map(ToOwned::to_owned),
            description: None,
            icon: None,
            image_url: None,
            updated_at: None,
        }
    }

    pub fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            description: row.try_get("description")?,
            icon: row.try_get("icon")?,
            image_url: row.try_get("image_url")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl Sluggable for Category {
    fn name(&self) -> &str {
        &self.name
    }

    fn stored_slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolWithCategory {
    #[serde(flatten)]
    pub tool: Tool,
    pub category: Option<Category>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: Category,
    pub tools_count: i64,
}

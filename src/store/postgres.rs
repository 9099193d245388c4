use async_trait::async_trait;
use chrono::{Duration, Utc};
use deadpool_postgres::Pool;
use tokio_postgres::types::ToSql;
use tokio_postgres::Row;
use uuid::Uuid;

use super::{DirectoryStore, POPULAR_WINDOW_DAYS};
use crate::error::Result;
use crate::models::{Category, Tool, CATEGORY_COLUMNS, TOOL_COLUMNS};

/// [`DirectoryStore`] over the `tools` and `categories` tables.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn query_tools(&self, query: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<Tool>> {
        let client = self.pool.get().await?;
        let rows = client.query(query, params).await?;
        rows_to_tools(&rows)
    }

    async fn query_category(
        &self,
        query: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Category>> {
        let client = self.pool.get().await?;
        let row = client.query_opt(query, params).await?;
        Ok(row.as_ref().map(Category::from_row).transpose()?)
    }

    async fn count(&self, query: &str, params: &[&(dyn ToSql + Sync)]) -> Result<i64> {
        let client = self.pool.get().await?;
        let row = client.query_one(query, params).await?;
        Ok(row.try_get(0)?)
    }
}

fn rows_to_tools(rows: &[Row]) -> Result<Vec<Tool>> {
    Ok(rows
        .iter()
        .map(Tool::from_row)
        .collect::<std::result::Result<Vec<_>, _>>()?)
}

/// Wraps `query` for ILIKE, escaping the pattern metacharacters it contains.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl DirectoryStore for PgStore {
    async fn list_tools(&self, limit: Option<i64>) -> Result<Vec<Tool>> {
        let query = format!(
            "SELECT {TOOL_COLUMNS} FROM tools \
             ORDER BY published_at DESC NULLS LAST LIMIT $1"
        );
        self.query_tools(&query, &[&limit]).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let query = format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name ASC");
        let client = self.pool.get().await?;
        let rows = client.query(&query, &[]).await?;
        if rows.is_empty() {
            log::warn!("No categories found in the database");
        }
        Ok(rows
            .iter()
            .map(Category::from_row)
            .collect::<std::result::Result<Vec<_>, _>>()?)
    }

    async fn tool_by_slug(&self, slug: &str) -> Result<Option<Tool>> {
        let query = format!("SELECT {TOOL_COLUMNS} FROM tools WHERE slug = $1 LIMIT 1");
        let client = self.pool.get().await?;
        let row = client.query_opt(&query, &[&slug]).await?;
        Ok(row.as_ref().map(Tool::from_row).transpose()?)
    }

    async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let query = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = $1 LIMIT 1");
        self.query_category(&query, &[&slug]).await
    }

    async fn category_by_id(&self, id: Uuid) -> Result<Option<Category>> {
        let query = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1");
        self.query_category(&query, &[&id]).await
    }

    async fn tools_by_category(&self, category_id: Uuid, limit: Option<i64>) -> Result<Vec<Tool>> {
        let query = format!(
            "SELECT {TOOL_COLUMNS} FROM tools WHERE category_id = $1 \
             ORDER BY published_at DESC NULLS LAST LIMIT $2"
        );
        self.query_tools(&query, &[&category_id, &limit]).await
    }

    async fn featured_tools(&self, limit: i64) -> Result<Vec<Tool>> {
        let query = format!(
            "SELECT {TOOL_COLUMNS} FROM tools WHERE featured = true \
             ORDER BY published_at DESC NULLS LAST LIMIT $1"
        );
        self.query_tools(&query, &[&limit]).await
    }

    async fn recent_tools(&self, days: i64, limit: i64) -> Result<Vec<Tool>> {
        let cutoff = Utc::now() - Duration::days(days);
        let query = format!(
            "SELECT {TOOL_COLUMNS} FROM tools WHERE published_at >= $1 \
             ORDER BY published_at DESC LIMIT $2"
        );
        self.query_tools(&query, &[&cutoff, &limit]).await
    }

    async fn popular_tools(&self, limit: i64) -> Result<Vec<Tool>> {
        let cutoff = Utc::now() - Duration::days(POPULAR_WINDOW_DAYS);
        let query = format!(
            "SELECT {TOOL_COLUMNS} FROM tools WHERE published_at >= $1 \
             ORDER BY rating DESC NULLS LAST, published_at DESC LIMIT $2"
        );
        self.query_tools(&query, &[&cutoff, &limit]).await
    }

    async fn search_tools(&self, query: &str, category_id: Option<Uuid>) -> Result<Vec<Tool>> {
        let pattern = like_pattern(query);
        let sql = format!(
            "SELECT {TOOL_COLUMNS} FROM tools \
             WHERE ($2::uuid IS NULL OR category_id = $2) \
               AND (name ILIKE $1 OR description ILIKE $1) \
             ORDER BY published_at DESC NULLS LAST"
        );
        self.query_tools(&sql, &[&pattern, &category_id]).await
    }

    async fn similar_tools(
        &self,
        category_id: Uuid,
        exclude_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Tool>> {
        let query = format!(
            "SELECT {TOOL_COLUMNS} FROM tools WHERE category_id = $1 AND id <> $2 \
             ORDER BY published_at DESC NULLS LAST LIMIT $3"
        );
        self.query_tools(&query, &[&category_id, &exclude_id, &limit])
            .await
    }

    async fn count_tools(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM tools", &[]).await
    }

    async fn count_tools_in_category(&self, category_id: Uuid) -> Result<i64> {
        self.count(
            "SELECT COUNT(*) FROM tools WHERE category_id = $1",
            &[&category_id],
        )
        .await
    }
}

//! Data-access layer over the directory database.
//!
//! Handlers and the [`Directory`](crate::directory::Directory) service only
//! see the [`DirectoryStore`] trait; [`PgStore`] talks to Postgres and
//! [`MemoryStore`] keeps everything in memory for tests and local runs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Category, Tool};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// How far back `popular_tools` looks.
pub const POPULAR_WINDOW_DAYS: i64 = 7;

/// Read operations over tools and categories.
///
/// Tool lists come back newest `published_at` first unless noted otherwise;
/// categories come back ordered by name.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn list_tools(&self, limit: Option<i64>) -> Result<Vec<Tool>>;

    async fn list_categories(&self) -> Result<Vec<Category>>;

    async fn tool_by_slug(&self, slug: &str) -> Result<Option<Tool>>;

    async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>>;

    async fn category_by_id(&self, id: Uuid) -> Result<Option<Category>>;

    async fn tools_by_category(&self, category_id: Uuid, limit: Option<i64>) -> Result<Vec<Tool>>;

    async fn featured_tools(&self, limit: i64) -> Result<Vec<Tool>>;

    /// Tools published within the last `days` days.
    async fn recent_tools(&self, days: i64, limit: i64) -> Result<Vec<Tool>>;

    /// Highest rated first (unrated last), within [`POPULAR_WINDOW_DAYS`].
    async fn popular_tools(&self, limit: i64) -> Result<Vec<Tool>>;

    /// Case-insensitive substring match on name and description.
    async fn search_tools(&self, query: &str, category_id: Option<Uuid>) -> Result<Vec<Tool>>;

    async fn similar_tools(
        &self,
        category_id: Uuid,
        exclude_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Tool>>;

    async fn count_tools(&self) -> Result<i64>;

    async fn count_tools_in_category(&self, category_id: Uuid) -> Result<i64>;
}

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DirectoryStore, POPULAR_WINDOW_DAYS};
use crate::error::{Error, Result};
use crate::models::{Category, Tool};

/// In-memory [`DirectoryStore`] with the same ordering rules as Postgres.
///
/// Every call bumps `fetch_calls`; setting `fail` makes every call return
/// [`Error::Upstream`].
#[derive(Default)]
pub struct MemoryStore {
    pub tools: RwLock<Vec<Tool>>,
    pub categories: RwLock<Vec<Category>>,
    pub fetch_calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl MemoryStore {
    pub fn new(tools: Vec<Tool>, categories: Vec<Category>) -> Self {
        Self {
            tools: RwLock::new(tools),
            categories: RwLock::new(categories),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn begin(&self) -> Result<()> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Upstream("memory store set to fail".to_string()));
        }
        Ok(())
    }

    async fn tools_where<P>(&self, keep: P) -> Vec<Tool>
    where
        P: Fn(&Tool) -> bool,
    {
        let mut tools: Vec<Tool> = self
            .tools
            .read()
            .await
            .iter()
            .filter(|tool| keep(*tool))
            .cloned()
            .collect();
        tools.sort_by(newest_first);
        tools
    }
}

// Stable, so tools without a publish date keep their insertion order at the end.
fn newest_first(a: &Tool, b: &Tool) -> CmpOrdering {
    match (a.published_at, b.published_at) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => CmpOrdering::Less,
        (None, Some(_)) => CmpOrdering::Greater,
        (None, None) => CmpOrdering::Equal,
    }
}

fn take(mut tools: Vec<Tool>, limit: Option<i64>) -> Vec<Tool> {
    if let Some(limit) = limit {
        tools.truncate(limit.max(0) as usize);
    }
    tools
}

fn contains_ignore_case(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle))
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn list_tools(&self, limit: Option<i64>) -> Result<Vec<Tool>> {
        self.begin()?;
        Ok(take(self.tools_where(|_| true).await, limit))
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.begin()?;
        let mut categories = self.categories.read().await.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn tool_by_slug(&self, slug: &str) -> Result<Option<Tool>> {
        self.begin()?;
        let tools = self.tools.read().await;
        Ok(tools
            .iter()
            .find(|tool| tool.slug.as_deref() == Some(slug))
            .cloned())
    }

    async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        self.begin()?;
        let categories = self.categories.read().await;
        Ok(categories
            .iter()
            .find(|category| category.slug.as_deref() == Some(slug))
            .cloned())
    }

    async fn category_by_id(&self, id: Uuid) -> Result<Option<Category>> {
        self.begin()?;
        let categories = self.categories.read().await;
        Ok(categories.iter().find(|category| category.id == id).cloned())
    }

    async fn tools_by_category(&self, category_id: Uuid, limit: Option<i64>) -> Result<Vec<Tool>> {
        self.begin()?;
        let tools = self
            .tools_where(|tool| tool.category_id == Some(category_id))
            .await;
        Ok(take(tools, limit))
    }

    async fn featured_tools(&self, limit: i64) -> Result<Vec<Tool>> {
        self.begin()?;
        Ok(take(self.tools_where(|tool| tool.featured).await, Some(limit)))
    }

    async fn recent_tools(&self, days: i64, limit: i64) -> Result<Vec<Tool>> {
        self.begin()?;
        let cutoff = Utc::now() - Duration::days(days);
        let tools = self
            .tools_where(|tool| tool.published_at.is_some_and(|at| at >= cutoff))
            .await;
        Ok(take(tools, Some(limit)))
    }

    async fn popular_tools(&self, limit: i64) -> Result<Vec<Tool>> {
        self.begin()?;
        let cutoff = Utc::now() - Duration::days(POPULAR_WINDOW_DAYS);
        let mut tools = self
            .tools_where(|tool| tool.published_at.is_some_and(|at| at >= cutoff))
            .await;
        tools.sort_by(|a, b| match (a.rating, b.rating) {
            (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(CmpOrdering::Equal),
            (Some(_), None) => CmpOrdering::Less,
            (None, Some(_)) => CmpOrdering::Greater,
            (None, None) => CmpOrdering::Equal,
        });
        Ok(take(tools, Some(limit)))
    }

    async fn search_tools(&self, query: &str, category_id: Option<Uuid>) -> Result<Vec<Tool>> {
        self.begin()?;
        let needle = query.to_lowercase();
        Ok(self
            .tools_where(|tool| {
                category_id.map_or(true, |id| tool.category_id == Some(id))
                    && (tool.name.to_lowercase().contains(&needle)
                        || contains_ignore_case(tool.description.as_deref(), &needle))
            })
            .await)
    }

    async fn similar_tools(
        &self,
        category_id: Uuid,
        exclude_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Tool>> {
        self.begin()?;
        let tools = self
            .tools_where(|tool| tool.category_id == Some(category_id) && tool.id != exclude_id)
            .await;
        Ok(take(tools, Some(limit)))
    }

    async fn count_tools(&self) -> Result<i64> {
        self.begin()?;
        Ok(self.tools.read().await.len() as i64)
    }

    async fn count_tools_in_category(&self, category_id: Uuid) -> Result<i64> {
        self.begin()?;
        let tools = self.tools.read().await;
        Ok(tools
            .iter()
            .filter(|tool| tool.category_id == Some(category_id))
            .count() as i64)
    }
}

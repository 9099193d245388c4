use std::collections::HashMap;
use std::sync::Arc;

use futures::future::try_join_all;
use uuid::Uuid;

use crate::cache::{DirectoryCache, SimilarKey};
use crate::comparison::{generate_pairs, is_same_comparison, Comparison, PairMode};
use crate::error::{Error, Result};
use crate::models::{Category, CategoryWithCount, Tool, ToolWithCategory};
use crate::slug::Sluggable;
use crate::store::DirectoryStore;

pub const DEFAULT_SIMILAR_LIMIT: i64 = 6;

/// Read service over a [`DirectoryStore`], with the hot lookups going
/// through the shared [`DirectoryCache`].
#[derive(Clone)]
pub struct Directory {
    store: Arc<dyn DirectoryStore>,
    cache: Arc<DirectoryCache>,
}

/// Result of resolving both sides of an `a-vs-b` URL.
#[derive(Debug, Clone)]
pub struct ComparisonTools {
    pub tool1: Option<Arc<Tool>>,
    pub tool2: Option<Arc<Tool>>,
}

impl Directory {
    pub fn new(store: Arc<dyn DirectoryStore>, cache: Arc<DirectoryCache>) -> Self {
        Self { store, cache }
    }

    pub fn store(&self) -> &dyn DirectoryStore {
        self.store.as_ref()
    }

    pub fn cache(&self) -> &DirectoryCache {
        &self.cache
    }

    pub async fn categories(&self) -> Result<Arc<Vec<Category>>> {
        self.cache
            .categories
            .get_or_fetch((), || async {
                let categories = self.store.list_categories().await?;
                log::info!("Fetched {} categories", categories.len());
                Ok::<_, Error>(Arc::new(categories))
            })
            .await
    }

    /// Looks a tool up by its persisted slug. Misses are cached too.
    pub async fn tool_by_slug(&self, slug: &str) -> Result<Option<Arc<Tool>>> {
        self.cache
            .tool_by_slug
            .get_or_fetch(slug.to_string(), || async {
                Ok::<_, Error>(self.store.tool_by_slug(slug).await?.map(Arc::new))
            })
            .await
    }

    pub async fn similar_tools(
        &self,
        category_id: Uuid,
        exclude_id: Uuid,
        limit: i64,
    ) -> Result<Arc<Vec<Tool>>> {
        let key = SimilarKey {
            category_id,
            exclude_id,
            limit,
        };
        self.cache
            .similar_tools
            .get_or_fetch(key, || async {
                let tools = self
                    .store
                    .similar_tools(category_id, exclude_id, limit)
                    .await?;
                Ok::<_, Error>(Arc::new(tools))
            })
            .await
    }

    /// Resolves both slugs of a comparison URL.
    ///
    /// Persisted slugs are tried first. Any side still missing is matched
    /// against the resolved slug of every tool, which is how tools without a
    /// stored slug get found.
    pub async fn tools_for_comparison(&self, slug1: &str, slug2: &str) -> Result<ComparisonTools> {
        let (tool1, tool2) = tokio::try_join!(self.tool_by_slug(slug1), self.tool_by_slug(slug2))?;
        if tool1.is_some() && tool2.is_some() {
            return Ok(ComparisonTools { tool1, tool2 });
        }

        log::debug!("Falling back to derived slugs for {slug1} / {slug2}");
        let all_tools = self.store.list_tools(None).await?;
        let find = |wanted: &str| {
            all_tools
                .iter()
                .find(|tool| tool.slug() == wanted)
                .cloned()
                .map(Arc::new)
        };

        Ok(ComparisonTools {
            tool1: tool1.or_else(|| find(slug1)),
            tool2: tool2.or_else(|| find(slug2)),
        })
    }

    /// Every same-category pair once, in the store's newest-first order.
    pub async fn comparisons_by_category(&self, category_id: Uuid) -> Result<Vec<Comparison>> {
        let tools = self.store.tools_by_category(category_id, None).await?;
        Ok(generate_pairs(&tools, PairMode::Single)
            .into_iter()
            .map(Comparison::from)
            .collect())
    }

    /// The "see also" list for a comparison page: the category's pairs minus
    /// the one being viewed, whichever order it was requested in.
    pub async fn similar_comparisons(
        &self,
        category_id: Uuid,
        current_slug1: &str,
        current_slug2: &str,
    ) -> Result<Vec<Comparison>> {
        let mut comparisons = self.comparisons_by_category(category_id).await?;
        comparisons.retain(|comparison| {
            !is_same_comparison(&comparison.slug, current_slug1, current_slug2)
        });
        Ok(comparisons)
    }

    pub async fn tools_with_categories(&self) -> Result<Vec<ToolWithCategory>> {
        let tools = self.store.list_tools(None).await?;
        let categories = self.categories().await?;
        let by_id: HashMap<Uuid, &Category> = categories.iter().map(|c| (c.id, c)).collect();

        Ok(tools
            .into_iter()
            .map(|tool| {
                let category = tool
                    .category_id
                    .and_then(|id| by_id.get(&id))
                    .map(|category| (*category).clone());
                ToolWithCategory { tool, category }
            })
            .collect())
    }

    pub async fn categories_with_tool_count(&self) -> Result<Vec<CategoryWithCount>> {
        let categories = self.categories().await?;
        let counts = try_join_all(
            categories
                .iter()
                .map(|category| self.store.count_tools_in_category(category.id)),
        )
        .await?;

        Ok(categories
            .iter()
            .zip(counts)
            .map(|(category, tools_count)| CategoryWithCount {
                category: category.clone(),
                tools_count,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    struct Fixture {
        store: Arc<MemoryStore>,
        directory: Directory,
        writing: Category,
    }

    fn fixture() -> Fixture {
        let writing = Category::new("Writing", Some("writing"));
        let images = Category::new("Images", Some("images"));
        let tools = vec![
            Tool::new("Magic Writer", None, Some(writing.id)),
            Tool::new("Quick Draft", Some("quick-draft"), Some(writing.id)),
            Tool::new("Prose Bot", Some("prose-bot"), Some(writing.id)),
            Tool::new("Painter", Some("painter"), Some(images.id)),
        ];
        let store = Arc::new(MemoryStore::new(tools, vec![writing.clone(), images]));
        let directory = Directory::new(store.clone(), Arc::new(DirectoryCache::default()));
        Fixture {
            store,
            directory,
            writing,
        }
    }

    #[tokio::test]
    async fn test_categories_are_cached() {
        let f = fixture();

        let first = f.directory.categories().await.unwrap();
        let second = f.directory.categories().await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first[0].name, "Images");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(f.store.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_propagates_and_keeps_cached_value() {
        let f = fixture();
        f.directory.categories().await.unwrap();
        f.store.set_failing(true);

        // Fresh entry: served from cache, store not consulted.
        assert_eq!(f.directory.categories().await.unwrap().len(), 2);

        f.directory.cache().categories.clear();
        assert!(f.directory.categories().await.is_err());
        assert!(f.directory.cache().categories.is_empty());
    }

    #[tokio::test]
    async fn test_tool_by_slug_caches_misses() {
        let f = fixture();

        assert!(f.directory.tool_by_slug("nope").await.unwrap().is_none());
        assert!(f.directory.tool_by_slug("nope").await.unwrap().is_none());
        assert_eq!(f.store.calls(), 1);
    }

    #[tokio::test]
    async fn test_tools_for_comparison_falls_back_to_derived_slug() {
        let f = fixture();

        let resolved = f
            .directory
            .tools_for_comparison("magic-writer", "quick-draft")
            .await
            .unwrap();

        assert_eq!(resolved.tool1.unwrap().name, "Magic Writer");
        assert_eq!(resolved.tool2.unwrap().name, "Quick Draft");
    }

    #[tokio::test]
    async fn test_tools_for_comparison_reports_missing_side() {
        let f = fixture();

        let resolved = f
            .directory
            .tools_for_comparison("quick-draft", "ghost")
            .await
            .unwrap();

        assert!(resolved.tool1.is_some());
        assert!(resolved.tool2.is_none());
    }

    #[tokio::test]
    async fn test_similar_comparisons_exclude_current_in_either_order() {
        let f = fixture();

        let all = f
            .directory
            .comparisons_by_category(f.writing.id)
            .await
            .unwrap();
        assert_eq!(all.len(), 3);

        let forward = f
            .directory
            .similar_comparisons(f.writing.id, "quick-draft", "prose-bot")
            .await
            .unwrap();
        let reversed = f
            .directory
            .similar_comparisons(f.writing.id, "prose-bot", "quick-draft")
            .await
            .unwrap();

        assert_eq!(forward.len(), 2);
        assert_eq!(reversed.len(), 2);
        assert!(forward
            .iter()
            .all(|c| !is_same_comparison(&c.slug, "quick-draft", "prose-bot")));
    }

    #[tokio::test]
    async fn test_similar_tools_cached_per_key() {
        let f = fixture();
        let exclude = Uuid::new_v4();

        let first = f
            .directory
            .similar_tools(f.writing.id, exclude, DEFAULT_SIMILAR_LIMIT)
            .await
            .unwrap();
        f.directory
            .similar_tools(f.writing.id, exclude, DEFAULT_SIMILAR_LIMIT)
            .await
            .unwrap();
        f.directory
            .similar_tools(f.writing.id, exclude, 1)
            .await
            .unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(f.store.calls(), 2);
    }

    #[tokio::test]
    async fn test_categories_with_tool_count() {
        let f = fixture();

        let counted = f.directory.categories_with_tool_count().await.unwrap();
        let counts: Vec<(&str, i64)> = counted
            .iter()
            .map(|c| (c.category.name.as_str(), c.tools_count))
            .collect();
        assert_eq!(counts, vec![("Images", 1), ("Writing", 3)]);
    }

    #[tokio::test]
    async fn test_tools_with_categories_joins_category() {
        let f = fixture();

        let joined = f.directory.tools_with_categories().await.unwrap();
        assert_eq!(joined.len(), 4);
        assert!(joined.iter().all(|t| t.category.is_some()));
    }
}

use serde::Serialize;
use uuid::Uuid;

use crate::models::Tool;
use crate::slug::Sluggable;

pub const SLUG_SEPARATOR: &str = "-vs-";

/// Whether each unordered pair is emitted once (`A-vs-B`) or in both
/// orders (`A-vs-B` then `B-vs-A`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairMode {
    Single,
    Bidirectional,
}

/// Two entities from the same category and the slug/title of their
/// comparison page. Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonPair<'a, T> {
    pub slug: String,
    pub title: String,
    pub tool1: &'a T,
    pub tool2: &'a T,
}

/// Owned, serializable form of a [`ComparisonPair`] of tools.
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub slug: String,
    pub title: String,
    pub tool1: Tool,
    pub tool2: Tool,
}

impl From<ComparisonPair<'_, Tool>> for Comparison {
    fn from(pair: ComparisonPair<'_, Tool>) -> Self {
        Self {
            slug: pair.slug,
            title: pair.title,
            tool1: pair.tool1.clone(),
            tool2: pair.tool2.clone(),
        }
    }
}

pub fn comparison_slug(slug1: &str, slug2: &str) -> String {
    format!("{slug1}{SLUG_SEPARATOR}{slug2}")
}

/// Splits `a-vs-b` at the first separator. Both halves must be non-empty.
pub fn split_comparison_slug(slug: &str) -> Option<(&str, &str)> {
    let (first, second) = slug.split_once(SLUG_SEPARATOR)?;
    if first.is_empty() || second.is_empty() {
        return None;
    }
    Some((first, second))
}

/// True when `slug` names the `a`/`b` comparison in either order.
pub fn is_same_comparison(slug: &str, a: &str, b: &str) -> bool {
    slug == comparison_slug(a, b) || slug == comparison_slug(b, a)
}

/// Enumerates every pair `(entities[i], entities[j])` with `i < j`, in input
/// order. The caller is responsible for passing a single category.
pub fn generate_pairs<T: Sluggable>(entities: &[T], mode: PairMode) -> Vec<ComparisonPair<'_, T>> {
    let n = entities.len();
    if n < 2 {
        return Vec::new();
    }

    let slugs: Vec<String> = entities.iter().map(Sluggable::slug).collect();
    let per_pair = match mode {
        PairMode::Single => 1,
        PairMode::Bidirectional => 2,
    };
    let mut pairs = Vec::with_capacity(n * (n - 1) / 2 * per_pair);

    for i in 0..n {
        for j in i + 1..n {
            pairs.push(pair(&entities[i], &entities[j], &slugs[i], &slugs[j]));
            if mode == PairMode::Bidirectional {
                pairs.push(pair(&entities[j], &entities[i], &slugs[j], &slugs[i]));
            }
        }
    }

    pairs
}

fn pair<'a, T: Sluggable>(a: &'a T, b: &'a T, slug_a: &str, slug_b: &str) -> ComparisonPair<'a, T> {
    ComparisonPair {
        slug: comparison_slug(slug_a, slug_b),
        title: format!("{} vs {}", a.name(), b.name()),
        tool1: a,
        tool2: b,
    }
}

/// Groups tools by category, keeping the order in which categories first
/// appear and the input order inside each group. Tools without a category
/// share one group.
pub fn group_by_category(tools: &[Tool]) -> Vec<(Option<Uuid>, Vec<&Tool>)> {
    let mut groups: Vec<(Option<Uuid>, Vec<&Tool>)> = Vec::new();
    for tool in tools {
        match groups.iter_mut().find(|(id, _)| *id == tool.category_id) {
            Some((_, group)) => group.push(tool),
            None => groups.push((tool.category_id, vec![tool])),
        }
    }
    groups
}

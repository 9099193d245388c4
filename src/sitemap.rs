//! Sitemap documents in the sitemaps.org 0.9 format.
//!
//! Everything here is pure string assembly over already-fetched tools and
//! categories; fetching (and deciding what to do when it fails) is left to
//! the handlers.

use std::fmt::{self, Write as _};

use chrono::{DateTime, NaiveDate, Utc};
use quick_xml::escape::escape;
use url::Url;

use crate::comparison::{generate_pairs, group_by_category, PairMode};
use crate::models::{Category, Tool};
use crate::slug::Sluggable;

pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

pub const TOOL_PRIORITY: f32 = 0.8;
pub const CATEGORY_PRIORITY: f32 = 0.7;
pub const COMPARISON_PRIORITY: f32 = 0.6;

/// Split sitemaps listed by the index, relative to the site root.
pub const SPLIT_SITEMAPS: [&str; 4] = [
    "sitemap-tools.xml",
    "sitemap-categories.xml",
    "sitemap-agents.xml",
    "sitemap-compare.xml",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFrequency {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFrequency::Always => "always",
            ChangeFrequency::Hourly => "hourly",
            ChangeFrequency::Daily => "daily",
            ChangeFrequency::Weekly => "weekly",
            ChangeFrequency::Monthly => "monthly",
            ChangeFrequency::Yearly => "yearly",
            ChangeFrequency::Never => "never",
        }
    }
}

impl fmt::Display for ChangeFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `<url>` block. `url` is a path relative to the site base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub url: String,
    pub last_modified: Option<NaiveDate>,
    pub change_frequency: Option<ChangeFrequency>,
    pub priority: Option<f32>,
}

impl SitemapEntry {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            last_modified: None,
            change_frequency: None,
            priority: None,
        }
    }

    pub fn changes(mut self, frequency: ChangeFrequency) -> Self {
        self.change_frequency = Some(frequency);
        self
    }

    pub fn priority(mut self, priority: f32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Keeps only the date part of the timestamp.
    pub fn modified(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.last_modified = at.map(|ts| ts.date_naive());
        self
    }
}

pub fn static_entries() -> Vec<SitemapEntry> {
    use ChangeFrequency::*;

    vec![
        SitemapEntry::new("/").changes(Daily).priority(1.0),
        SitemapEntry::new("/about/").changes(Monthly).priority(0.5),
        SitemapEntry::new("/categories/").changes(Weekly).priority(0.7),
        SitemapEntry::new("/ai-agent/").changes(Monthly).priority(0.6),
        SitemapEntry::new("/compare/").changes(Monthly).priority(0.6),
        SitemapEntry::new("/privacy/").changes(Yearly).priority(0.3),
        SitemapEntry::new("/terms/").changes(Yearly).priority(0.3),
    ]
}

pub fn tool_entries(tools: &[Tool]) -> Vec<SitemapEntry> {
    tools
        .iter()
        .map(|tool| {
            SitemapEntry::new(format!("/ai/{}/", tool.slug()))
                .modified(tool.last_modified())
                .changes(ChangeFrequency::Weekly)
                .priority(TOOL_PRIORITY)
        })
        .collect()
}

pub fn category_entries(categories: &[Category]) -> Vec<SitemapEntry> {
    categories
        .iter()
        .map(|category| {
            SitemapEntry::new(format!("/category/{}/", category.slug()))
                .modified(category.updated_at)
                .changes(ChangeFrequency::Weekly)
                .priority(CATEGORY_PRIORITY)
        })
        .collect()
}

/// Both `a-vs-b` and `b-vs-a` for every same-category pair, across all
/// categories present in `tools`.
pub fn comparison_entries(tools: &[Tool]) -> Vec<SitemapEntry> {
    let mut entries = Vec::new();
    for (_, group) in group_by_category(tools) {
        for pair in generate_pairs(&group, PairMode::Bidirectional) {
            let modified = pair.tool1.last_modified().max(pair.tool2.last_modified());
            entries.push(
                SitemapEntry::new(format!("/compare/{}/", pair.slug))
                    .modified(modified)
                    .changes(ChangeFrequency::Monthly)
                    .priority(COMPARISON_PRIORITY),
            );
        }
    }
    entries
}

/// `base_url` followed by `path`, percent-encoded where the URL syntax
/// requires it. Left as-is when the result does not parse.
fn location(base_url: &str, path: &str) -> String {
    let raw = format!("{base_url}{path}");
    match Url::parse(&raw) {
        Ok(url) => url.into(),
        Err(e) => {
            log::warn!("Sitemap location {raw:?} is not a valid URL: {e}");
            raw
        }
    }
}

/// Renders a `<urlset>` document; `loc` is `base_url` followed by the entry path.
pub fn assemble(base_url: &str, entries: &[SitemapEntry]) -> String {
    let base_url = base_url.trim_end_matches('/');
    let mut xml = String::with_capacity(128 + entries.len() * 160);
    xml.push_str(XML_DECLARATION);
    xml.push('\n');
    let _ = writeln!(xml, r#"<urlset xmlns="{SITEMAP_NAMESPACE}">"#);

    for entry in entries {
        xml.push_str("  <url>\n");
        let loc = location(base_url, &entry.url);
        let _ = writeln!(xml, "    <loc>{}</loc>", escape(loc.as_str()));
        if let Some(date) = entry.last_modified {
            let _ = writeln!(xml, "    <lastmod>{}</lastmod>", date.format("%Y-%m-%d"));
        }
        if let Some(frequency) = entry.change_frequency {
            let _ = writeln!(xml, "    <changefreq>{frequency}</changefreq>");
        }
        if let Some(priority) = entry.priority {
            let _ = writeln!(xml, "    <priority>{priority:.1}</priority>");
        }
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>");
    xml
}

/// The combined sitemap: static routes, then every tool, category and
/// comparison.
pub fn assemble_sitemap(
    base_url: &str,
    static_routes: &[SitemapEntry],
    tools: &[Tool],
    categories: &[Category],
) -> String {
    let mut entries = static_routes.to_vec();
    entries.extend(tool_entries(tools));
    entries.extend(category_entries(categories));
    entries.extend(comparison_entries(tools));
    log::debug!("Assembled sitemap with {} entries", entries.len());
    assemble(base_url, &entries)
}

pub fn tools_sitemap(base_url: &str, tools: &[Tool]) -> String {
    assemble(base_url, &tool_entries(tools))
}

pub fn categories_sitemap(base_url: &str, categories: &[Category]) -> String {
    let mut entries = vec![SitemapEntry::new("/categories/")
        .changes(ChangeFrequency::Weekly)
        .priority(CATEGORY_PRIORITY)];
    entries.extend(category_entries(categories));
    assemble(base_url, &entries)
}

pub fn agents_sitemap(base_url: &str) -> String {
    let entries = [SitemapEntry::new("/ai-agent/")
        .changes(ChangeFrequency::Monthly)
        .priority(0.6)];
    assemble(base_url, &entries)
}

pub fn compare_sitemap(base_url: &str, tools: &[Tool]) -> String {
    assemble(base_url, &comparison_entries(tools))
}

/// `<sitemapindex>` pointing at the split sitemaps, all stamped `today`.
pub fn sitemap_index(base_url: &str, today: NaiveDate) -> String {
    let base_url = base_url.trim_end_matches('/');
    let mut xml = String::new();
    xml.push_str(XML_DECLARATION);
    xml.push('\n');
    let _ = writeln!(xml, r#"<sitemapindex xmlns="{SITEMAP_NAMESPACE}">"#);
    for sitemap in SPLIT_SITEMAPS {
        let loc = location(base_url, &format!("/{sitemap}"));
        xml.push_str("  <sitemap>\n");
        let _ = writeln!(xml, "    <loc>{}</loc>", escape(loc.as_str()));
        let _ = writeln!(xml, "    <lastmod>{}</lastmod>", today.format("%Y-%m-%d"));
        xml.push_str("  </sitemap>\n");
    }
    xml.push_str("</sitemapindex>");
    xml
}

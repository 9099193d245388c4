use actix_web::http::header;
use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::comparison::{comparison_slug, split_comparison_slug, Comparison};
use crate::directory::DEFAULT_SIMILAR_LIMIT;
use crate::error::{Error, Result};
use crate::models::{Category, Tool};
use crate::sitemap;
use crate::slug::Sluggable;
use crate::utils::Pagination;

const XML_CONTENT_TYPE: &str = "application/xml; charset=UTF-8";
const XML_CACHE_CONTROL: &str = "public, s-maxage=0, stale-while-revalidate=60";

#[derive(Deserialize)]
pub struct PaginationParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct ToolListParams {
    #[serde(default)]
    pub with_category: bool,
}

#[derive(Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct RecentParams {
    pub days: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct CategoryListParams {
    #[serde(default)]
    pub counts: bool,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub category: Option<Uuid>,
}

#[derive(Serialize)]
struct Paginated<T> {
    total_count: i64,
    page: i64,
    limit: i64,
    total_pages: i64,
    data: Vec<T>,
}

#[derive(Serialize)]
struct ComparisonPage {
    slug: String,
    title: String,
    tool1: Tool,
    tool2: Tool,
    category: Option<Category>,
    similar_comparisons: Vec<Comparison>,
}

fn xml_response(xml: String) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, XML_CONTENT_TYPE))
        .insert_header((header::CACHE_CONTROL, XML_CACHE_CONTROL))
        .body(xml)
}

#[get("/heartbeat")]
pub async fn heartbeat(data: web::Data<AppState>) -> impl Responder {
    match data.directory.store().count_tools().await {
        Ok(_) => HttpResponse::Ok().body("OK - Database connection is healthy"),
        Err(e) => {
            log::error!("Heartbeat query failed: {e}");
            HttpResponse::InternalServerError().body("Database query failed")
        }
    }
}

#[get("/categories")]
pub async fn list_categories(
    query: web::Query<CategoryListParams>,
    data: web::Data<AppState>,
) -> Result<HttpResponse> {
    if query.counts {
        let categories = data.directory.categories_with_tool_count().await?;
        return Ok(HttpResponse::Ok().json(categories));
    }
    let categories = data.directory.categories().await?;
    Ok(HttpResponse::Ok().json(categories.as_slice()))
}

async fn category_or_404(data: &AppState, slug: &str) -> Result<Category> {
    data.directory
        .store()
        .category_by_slug(slug)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Category '{slug}' not found")))
}

#[get("/categories/{slug}")]
pub async fn get_category(
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> Result<HttpResponse> {
    let slug = path.into_inner();
    let category = category_or_404(&data, &slug).await?;
    let tools = data
        .directory
        .store()
        .tools_by_category(category.id, None)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "category": category,
        "tools_count": tools.len(),
        "tools": tools,
    })))
}

#[get("/categories/id/{id}")]
pub async fn get_category_by_id(
    path: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    match data.directory.store().category_by_id(id).await? {
        Some(category) => Ok(HttpResponse::Ok().json(category)),
        None => Err(Error::NotFound(format!("Category '{id}' not found"))),
    }
}

#[get("/categories/{slug}/comparisons")]
pub async fn category_comparisons(
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> Result<HttpResponse> {
    let slug = path.into_inner();
    let category = category_or_404(&data, &slug).await?;
    let comparisons = data.directory.comparisons_by_category(category.id).await?;
    Ok(HttpResponse::Ok().json(comparisons))
}

fn paginated<T: Clone>(pagination: &Pagination, total_count: i64, items: &[T]) -> Paginated<T> {
    Paginated {
        total_count,
        page: pagination.page,
        limit: pagination.limit,
        total_pages: pagination.total_pages,
        data: pagination.slice(items).to_vec(),
    }
}

/// `?with_category=true` embeds each tool's category.
#[get("/tools")]
pub async fn list_tools(
    query: web::Query<PaginationParams>,
    options: web::Query<ToolListParams>,
    data: web::Data<AppState>,
) -> Result<HttpResponse> {
    if options.with_category {
        let tools = data.directory.tools_with_categories().await?;
        let pagination = Pagination::new(&query, tools.len() as i64);
        return Ok(HttpResponse::Ok().json(paginated(&pagination, tools.len() as i64, &tools)));
    }

    let store = data.directory.store();
    let total_count = store.count_tools().await?;
    let pagination = Pagination::new(&query, total_count);

    let tools = store
        .list_tools(Some(pagination.offset + pagination.limit))
        .await?;
    Ok(HttpResponse::Ok().json(paginated(&pagination, total_count, &tools)))
}

#[get("/tools/featured")]
pub async fn featured_tools(
    query: web::Query<LimitParams>,
    data: web::Data<AppState>,
) -> Result<HttpResponse> {
    let limit = query.limit.unwrap_or(8).clamp(1, 100);
    let tools = data.directory.store().featured_tools(limit).await?;
    Ok(HttpResponse::Ok().json(tools))
}

#[get("/tools/recent")]
pub async fn recent_tools(
    query: web::Query<RecentParams>,
    data: web::Data<AppState>,
) -> Result<HttpResponse> {
    let days = query.days.unwrap_or(7).clamp(1, 365);
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let tools = data.directory.store().recent_tools(days, limit).await?;
    Ok(HttpResponse::Ok().json(tools))
}

#[get("/tools/popular")]
pub async fn popular_tools(
    query: web::Query<LimitParams>,
    data: web::Data<AppState>,
) -> Result<HttpResponse> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let tools = data.directory.store().popular_tools(limit).await?;
    Ok(HttpResponse::Ok().json(tools))
}

#[get("/tools/search")]
pub async fn search_tools(
    query: web::Query<SearchParams>,
    data: web::Data<AppState>,
) -> Result<HttpResponse> {
    let q = query.q.as_deref().map(str::trim).unwrap_or_default();
    if q.is_empty() && query.category.is_none() {
        return Err(Error::BadRequest("Search query cannot be empty".to_string()));
    }

    let tools = data.directory.store().search_tools(q, query.category).await?;
    Ok(HttpResponse::Ok().json(tools))
}

#[get("/tools/{slug}")]
pub async fn get_tool(path: web::Path<String>, data: web::Data<AppState>) -> Result<HttpResponse> {
    let slug = path.into_inner();
    match data.directory.tool_by_slug(&slug).await? {
        Some(tool) => Ok(HttpResponse::Ok().json(&*tool)),
        None => Err(Error::NotFound(format!("Tool '{slug}' not found"))),
    }
}

#[get("/tools/{slug}/similar")]
pub async fn similar_tools(
    path: web::Path<String>,
    query: web::Query<LimitParams>,
    data: web::Data<AppState>,
) -> Result<HttpResponse> {
    let slug = path.into_inner();
    let tool = data
        .directory
        .tool_by_slug(&slug)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Tool '{slug}' not found")))?;

    let Some(category_id) = tool.category_id else {
        return Ok(HttpResponse::Ok().json(Vec::<Tool>::new()));
    };

    let limit = query.limit.unwrap_or(DEFAULT_SIMILAR_LIMIT).clamp(1, 50);
    let similar = match data
        .directory
        .similar_tools(category_id, tool.id, limit)
        .await
    {
        Ok(tools) => tools.to_vec(),
        Err(e) => {
            log::error!("Failed to load similar tools for {slug}: {e}");
            Vec::new()
        }
    };
    Ok(HttpResponse::Ok().json(similar))
}

#[get("/compare/{comparison}")]
pub async fn compare_tools(
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> Result<HttpResponse> {
    let comparison = path.into_inner();
    let Some((slug1, slug2)) = split_comparison_slug(&comparison) else {
        return Err(Error::BadRequest(format!(
            "Invalid comparison URL format: '{comparison}'"
        )));
    };

    let resolved = data.directory.tools_for_comparison(slug1, slug2).await?;
    let (tool1, tool2) = match (resolved.tool1, resolved.tool2) {
        (Some(tool1), Some(tool2)) => (tool1, tool2),
        (None, None) => {
            return Err(Error::NotFound(format!(
                "Neither tool could be found: {slug1} and {slug2}"
            )))
        }
        (None, Some(_)) => {
            return Err(Error::NotFound(format!("Tool '{slug1}' could not be found")))
        }
        (Some(_), None) => {
            return Err(Error::NotFound(format!("Tool '{slug2}' could not be found")))
        }
    };

    if tool1.category_id != tool2.category_id {
        return Err(Error::BadRequest(format!(
            "{} and {} are from different categories and cannot be compared",
            tool1.name, tool2.name
        )));
    }

    let mut category = None;
    let mut similar_comparisons = Vec::new();
    if let Some(category_id) = tool1.category_id {
        match data.directory.categories().await {
            Ok(categories) => {
                category = categories.iter().find(|c| c.id == category_id).cloned();
            }
            Err(e) => log::error!("Failed to load categories for {comparison}: {e}"),
        }
        if category.is_some() {
            match data
                .directory
                .similar_comparisons(category_id, slug1, slug2)
                .await
            {
                Ok(comparisons) => similar_comparisons = comparisons,
                Err(e) => log::error!("Failed to load similar comparisons for {comparison}: {e}"),
            }
        }
    }

    Ok(HttpResponse::Ok().json(ComparisonPage {
        slug: comparison_slug(&tool1.slug(), &tool2.slug()),
        title: format!("{} vs {}", tool1.name, tool2.name),
        tool1: Tool::clone(&tool1),
        tool2: Tool::clone(&tool2),
        category,
        similar_comparisons,
    }))
}

#[get("/sitemap.xml")]
pub async fn sitemap_index(data: web::Data<AppState>) -> impl Responder {
    xml_response(sitemap::sitemap_index(
        &data.site_base_url,
        Utc::now().date_naive(),
    ))
}

#[get("/sitemap-all.xml")]
pub async fn sitemap_all(data: web::Data<AppState>) -> Result<HttpResponse> {
    let tools = data.directory.store().list_tools(None).await?;
    let categories = data.directory.categories().await?;
    Ok(xml_response(sitemap::assemble_sitemap(
        &data.site_base_url,
        &sitemap::static_entries(),
        &tools,
        &categories,
    )))
}

#[get("/sitemap-tools.xml")]
pub async fn sitemap_tools(data: web::Data<AppState>) -> Result<HttpResponse> {
    let tools = data.directory.store().list_tools(None).await?;
    Ok(xml_response(sitemap::tools_sitemap(&data.site_base_url, &tools)))
}

#[get("/sitemap-categories.xml")]
pub async fn sitemap_categories(data: web::Data<AppState>) -> Result<HttpResponse> {
    let categories = data.directory.categories().await?;
    Ok(xml_response(sitemap::categories_sitemap(
        &data.site_base_url,
        &categories,
    )))
}

#[get("/sitemap-agents.xml")]
pub async fn sitemap_agents(data: web::Data<AppState>) -> impl Responder {
    xml_response(sitemap::agents_sitemap(&data.site_base_url))
}

#[get("/sitemap-compare.xml")]
pub async fn sitemap_compare(data: web::Data<AppState>) -> Result<HttpResponse> {
    let tools = data.directory.store().list_tools(None).await?;
    Ok(xml_response(sitemap::compare_sitemap(&data.site_base_url, &tools)))
}

/// Registers every route. Literal `/tools/...` paths go before `/tools/{slug}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // HEALTH
        .service(heartbeat)
        // CATEGORIES
        .service(list_categories)
        .service(get_category_by_id)
        .service(category_comparisons)
        .service(get_category)
        // TOOLS
        .service(list_tools)
        .service(featured_tools)
        .service(recent_tools)
        .service(popular_tools)
        .service(search_tools)
        .service(similar_tools)
        .service(get_tool)
        // COMPARISONS
        .service(compare_tools)
        // SITEMAPS
        .service(sitemap_index)
        .service(sitemap_all)
        .service(sitemap_tools)
        .service(sitemap_categories)
        .service(sitemap_agents)
        .service(sitemap_compare);
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::web::Query;

    #[test]
    fn test_pagination_params_deserialization() {
        let query = Query::<PaginationParams>::from_query("").unwrap();
        assert_eq!(query.page, None);
        assert_eq!(query.limit, None);

        let query = Query::<PaginationParams>::from_query("page=2&limit=50").unwrap();
        assert_eq!(query.page, Some(2));
        assert_eq!(query.limit, Some(50));
    }

    #[test]
    fn test_pagination_params_with_invalid_values() {
        assert!(Query::<PaginationParams>::from_query("page=invalid").is_err());
        assert!(Query::<PaginationParams>::from_query("limit=invalid").is_err());
    }

    #[test]
    fn test_search_params_category_must_be_uuid() {
        assert!(Query::<SearchParams>::from_query("q=writer&category=not-a-uuid").is_err());

        let query = Query::<SearchParams>::from_query(
            "q=writer&category=00000000-0000-0000-0000-000000000000",
        )
        .unwrap();
        assert_eq!(query.q.as_deref(), Some("writer"));
        assert_eq!(query.category, Some(Uuid::nil()));
    }

    #[test]
    fn test_category_list_params_default() {
        let query = Query::<CategoryListParams>::from_query("").unwrap();
        assert!(!query.counts);
        let query = Query::<CategoryListParams>::from_query("counts=true").unwrap();
        assert!(query.counts);
    }

    #[test]
    fn test_tool_list_params_default() {
        let query = Query::<ToolListParams>::from_query("page=2").unwrap();
        assert!(!query.with_category);
        let query = Query::<ToolListParams>::from_query("with_category=true").unwrap();
        assert!(query.with_category);
    }

    #[test]
    fn test_xml_response_headers() {
        let response = xml_response("<urlset/>".to_string());
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            XML_CONTENT_TYPE
        );
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            XML_CACHE_CONTROL
        );
    }
}

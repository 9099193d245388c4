use actix_web::web::Query;

use crate::handlers::PaginationParams;

pub const DEFAULT_PAGE_SIZE: i64 = 24;
pub const MAX_PAGE_SIZE: i64 = 200;

pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(query: &Query<PaginationParams>, total_count: i64) -> Self {
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let total_pages = ((total_count as f64 / limit as f64).ceil() as i64).max(1);

        let page = query.page.unwrap_or(1).clamp(1, total_pages);

        let offset = (page - 1) * limit;
        Self {
            page,
            limit,
            offset,
            total_pages,
        }
    }

    /// The slice of `items` for this page; empty when past the end.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.offset as usize).min(items.len());
        let end = (start + self.limit as usize).min(items.len());
        &items[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(query: &str) -> Query<PaginationParams> {
        Query::from_query(query).unwrap()
    }

    #[test]
    fn test_defaults() {
        let pagination = Pagination::new(&params(""), 100);
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(pagination.offset, 0);
        assert_eq!(pagination.total_pages, 5);
    }

    #[test]
    fn test_clamps_limit_and_page() {
        let pagination = Pagination::new(&params("page=99&limit=5000"), 450);
        assert_eq!(pagination.limit, MAX_PAGE_SIZE);
        assert_eq!(pagination.total_pages, 3);
        assert_eq!(pagination.page, 3);
        assert_eq!(pagination.offset, 400);

        let pagination = Pagination::new(&params("page=-1&limit=0"), 10);
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.limit, 1);
    }

    #[test]
    fn test_empty_collection_has_one_page() {
        let pagination = Pagination::new(&params("page=3"), 0);
        assert_eq!(pagination.total_pages, 1);
        assert_eq!(pagination.page, 1);
        assert!(pagination.slice::<u8>(&[]).is_empty());
    }

    #[test]
    fn test_slice() {
        let items: Vec<i32> = (0..10).collect();
        let pagination = Pagination::new(&params("page=2&limit=4"), items.len() as i64);
        assert_eq!(pagination.slice(&items), &[4, 5, 6, 7]);

        let last = Pagination::new(&params("page=3&limit=4"), items.len() as i64);
        assert_eq!(last.slice(&items), &[8, 9]);
    }
}

use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortBy {
    CreatedAt,
    Price,
    Name,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub q: Option<String>,
    pub category_id: Option<Uuid>,
    pub shop_id: Option<Uuid>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub sort_by: Option<ProductSortBy>,
    pub sort_order: Option<SortOrder>,
}

impl ProductQuery {
    /// Stable cache key; field order is fixed so equal queries share entries.
    pub fn cache_key(&self) -> String {
        let (page, per_page, _) = self.pagination.normalize();
        format!(
            "products:{page}:{per_page}:{}:{}:{}:{}:{}:{:?}:{:?}",
            self.q.as_deref().unwrap_or(""),
            self.category_id.map(|id| id.to_string()).unwrap_or_default(),
            self.shop_id.map(|id| id.to_string()).unwrap_or_default(),
            self.min_price.unwrap_or(-1),
            self.max_price.unwrap_or(-1),
            self.sort_by,
            self.sort_order,
        )
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderListQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub status: Option<String>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LowStockQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub threshold: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamps_bounds() {
        let p = Pagination {
            page: Some(0),
            per_page: Some(1_000),
        };
        assert_eq!(p.normalize(), (1, 100, 0));

        let p = Pagination {
            page: None,
            per_page: None,
        };
        assert_eq!(p.normalize(), (1, 20, 0));
    }

    #[test]
    fn equal_queries_share_a_cache_key() {
        let q = ProductQuery {
            pagination: Pagination {
                page: Some(2),
                per_page: Some(10),
            },
            q: Some("mug".into()),
            category_id: None,
            shop_id: None,
            min_price: None,
            max_price: Some(5_000),
            sort_by: Some(ProductSortBy::Price),
            sort_order: Some(SortOrder::Asc),
        };
        let key = q.cache_key();
        let same = ProductQuery {
            pagination: Pagination {
                page: Some(2),
                per_page: Some(10),
            },
            ..q
        };
        assert_eq!(key, same.cache_key());
    }
}

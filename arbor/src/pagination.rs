//! Page-based pagination over backend queries and in-memory lists.
//!
//! Pages are 1-based. Both entry points produce the same [`Paginated`] shape, so callers can't
//! tell whether a page was cut by the backend (`LIMIT`/`OFFSET`) or sliced out of an assembled
//! list.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::db::errors::Result;
use crate::db::models::Entity;
use crate::db::query::Query;
use crate::db::storage::Backend;

/// Default number of items per page.
pub const DEFAULT_LIMIT: i64 = 10;

/// Page request parameters.
///
/// - `page`: 1-based page number (default: 1)
/// - `limit`: items per page (default: 10, never below 1)
#[serde_as]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageOptions {
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub page: Option<i64>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub limit: Option<i64>,
}

impl PageOptions {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// Get the page, defaulting to 1 and never below it.
    #[inline]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Get the limit, defaulting to [`DEFAULT_LIMIT`] and never below 1.
    #[inline]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).max(1)
    }

    /// Rows to skip before the requested page.
    #[inline]
    pub fn skip(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Items on this page
    pub item_count: i64,
    pub total_items: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub current_page: i64,
}

impl PageMeta {
    pub fn new(total_items: i64, page: i64, limit: i64) -> Self {
        let total_pages = if total_items <= 0 { 0 } else { (total_items + limit - 1) / limit };
        let item_count = if page < total_pages {
            limit
        } else if page == total_pages {
            total_items - (page - 1) * limit
        } else {
            0
        };
        Self {
            item_count,
            total_items,
            per_page: limit,
            total_pages,
            current_page: page,
        }
    }
}

/// One page of results with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Paginated<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

/// Paginate a backend query: count the matching rows, then fetch the requested window.
///
/// The query's own window, if any, is replaced.
pub async fn paginate<E, B>(
    backend: &B,
    query: Query,
    options: &PageOptions,
) -> Result<Paginated<E>>
where
    E: Entity,
    B: Backend<E>,
{
    let (page, limit) = (options.page(), options.limit());
    let total = backend.count(&query).await?;
    let items = backend.find(&query.window(options.skip(), limit)).await?;
    Ok(Paginated {
        items,
        meta: PageMeta::new(total, page, limit),
    })
}

/// Paginate an already-materialized list by slicing it.
pub fn manual_paginate<T>(data: Vec<T>, options: &PageOptions) -> Paginated<T> {
    let (page, limit) = (options.page(), options.limit());
    let total = data.len() as i64;
    let items = data
        .into_iter()
        .skip(options.skip() as usize)
        .take(limit as usize)
        .collect();
    Paginated {
        items,
        meta: PageMeta::new(total, page, limit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::categories::Category;
    use crate::db::order::{OrderDirection, OrderField};
    use crate::db::storage::InMemoryBackend;

    #[test]
    fn test_default_values() {
        let p = PageOptions::default();
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), DEFAULT_LIMIT);
        assert_eq!(p.skip(), 0);
    }

    #[test]
    fn test_clamping() {
        let p = PageOptions::new(0, 0);
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 1);

        let p = PageOptions::new(-3, -5);
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 1);

        let p = PageOptions::new(3, 20);
        assert_eq!(p.skip(), 40);
    }

    #[test]
    fn test_options_from_query_strings() {
        let p: PageOptions = serde_json::from_str(r#"{"page":"2","limit":"25"}"#).unwrap();
        assert_eq!(p, PageOptions::new(2, 25));

        let p: PageOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(p, PageOptions::default());
    }

    #[test]
    fn test_meta_for_twenty_five_items() {
        let first = PageMeta::new(25, 1, 10);
        assert_eq!(first.item_count, 10);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.total_items, 25);
        assert_eq!(first.per_page, 10);
        assert_eq!(first.current_page, 1);

        assert_eq!(PageMeta::new(25, 3, 10).item_count, 5);
        assert_eq!(PageMeta::new(25, 4, 10).item_count, 0);
        assert_eq!(PageMeta::new(20, 2, 10).item_count, 10);
    }

    #[test]
    fn test_meta_for_empty_list() {
        let meta = PageMeta::new(0, 1, 10);
        assert_eq!(meta.total_pages, 0);
        assert_eq!(meta.item_count, 0);
    }

    #[test]
    fn test_meta_serializes_camel_case() {
        let json = serde_json::to_value(PageMeta::new(25, 1, 10)).unwrap();
        assert_eq!(json["itemCount"], 10);
        assert_eq!(json["totalItems"], 25);
        assert_eq!(json["perPage"], 10);
        assert_eq!(json["totalPages"], 3);
        assert_eq!(json["currentPage"], 1);
    }

    #[test]
    fn test_manual_paginate() {
        let data: Vec<i32> = (1..=25).collect();

        let page = manual_paginate(data.clone(), &PageOptions::new(1, 10));
        assert_eq!(page.items, (1..=10).collect::<Vec<_>>());
        assert_eq!(page.meta.total_pages, 3);

        let page = manual_paginate(data.clone(), &PageOptions::new(3, 10));
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.meta.item_count, 5);

        let page = manual_paginate(data, &PageOptions::new(4, 10));
        assert!(page.items.is_empty());
        assert_eq!(page.meta.item_count, 0);
    }

    #[test]
    fn test_large_limit_is_kept() {
        let page = manual_paginate((0..250).collect::<Vec<i32>>(), &PageOptions::new(1, 200));
        assert_eq!(page.items.len(), 200);
        assert_eq!(page.meta.per_page, 200);
        assert_eq!(page.meta.total_pages, 2);
        assert_eq!(page.meta.item_count, 200);

        let page = manual_paginate((0..250).collect::<Vec<i32>>(), &PageOptions::new(2, 200));
        assert_eq!(page.items, (200..250).collect::<Vec<_>>());
        assert_eq!(page.meta.item_count, 50);
    }

    #[tokio::test]
    async fn test_paginate_backend_query() {
        let rows = (0..25).map(|i| Category::new(format!("c{i}"), None).with_order(i));
        let backend = InMemoryBackend::with_rows(rows);
        let by_position = OrderField::new("custom_order", OrderDirection::Asc);
        let query = Query::new().order_by(vec![by_position]);

        let page = paginate(&backend, query.clone(), &PageOptions::new(1, 10)).await.unwrap();
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.items[0].custom_order, 0);
        assert_eq!(page.meta.total_pages, 3);
        assert_eq!(page.meta.total_items, 25);

        let page = paginate(&backend, query.clone(), &PageOptions::new(3, 10)).await.unwrap();
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.items[0].custom_order, 20);
        assert_eq!(page.meta.item_count, 5);

        let page = paginate(&backend, query, &PageOptions::new(4, 10)).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.meta.item_count, 0);
    }
}

//! Catalog filtering, ordering, and pagination.
//!
//! Both the shop grid and the admin table run the same pipeline over the
//! full product list fetched from the backend: [`select`] filters and
//! orders, [`paginate`] cuts a page out of the result.

use core::cmp::Ordering;

use rust_decimal::Decimal;

use crate::product::Product;
use crate::types::{CategoryFilter, Price};

/// Keep the items accepted by `predicate`, ordered by `comparator`.
///
/// The sort is stable, so items that compare equal keep their input order.
pub fn select<'a, T, P, C>(items: &'a [T], predicate: P, mut comparator: C) -> Vec<&'a T>
where
    P: Fn(&T) -> bool,
    C: FnMut(&T, &T) -> Ordering,
{
    let mut selected: Vec<&T> = items.iter().filter(|item| predicate(*item)).collect();
    selected.sort_by(|a, b| comparator(*a, *b));
    selected
}

/// Price buckets offered by the shop filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceRange {
    #[default]
    All,
    /// Strictly below 100.
    Under100,
    /// 100 to 500, both inclusive.
    From100To500,
    /// Strictly above 500.
    Over500,
}

impl PriceRange {
    pub const ALL: [Self; 4] = [Self::All, Self::Under100, Self::From100To500, Self::Over500];

    /// Parse a query-string value; unknown values mean [`PriceRange::All`].
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("under100") => Self::Under100,
            Some("100to500") => Self::From100To500,
            Some("over500") => Self::Over500,
            _ => Self::All,
        }
    }

    #[must_use]
    pub const fn as_param(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Under100 => "under100",
            Self::From100To500 => "100to500",
            Self::Over500 => "over500",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::All => "All prices",
            Self::Under100 => "Under 100",
            Self::From100To500 => "100 to 500",
            Self::Over500 => "Over 500",
        }
    }

    #[must_use]
    pub fn contains(&self, price: Price) -> bool {
        let low = Decimal::ONE_HUNDRED;
        let high = Decimal::from(500);
        let amount = price.amount();
        match self {
            Self::All => true,
            Self::Under100 => amount < low,
            Self::From100To500 => amount >= low && amount <= high,
            Self::Over500 => amount > high,
        }
    }
}

/// Catalog orderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Most recently created first.
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

impl SortOrder {
    pub const ALL: [Self; 3] = [Self::Newest, Self::PriceAsc, Self::PriceDesc];

    /// Parse a query-string value; unknown values mean [`SortOrder::Newest`].
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("priceAsc") => Self::PriceAsc,
            Some("priceDesc") => Self::PriceDesc,
            _ => Self::Newest,
        }
    }

    #[must_use]
    pub const fn as_param(&self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceAsc => "priceAsc",
            Self::PriceDesc => "priceDesc",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Newest => "Newest",
            Self::PriceAsc => "Price: low to high",
            Self::PriceDesc => "Price: high to low",
        }
    }

    #[must_use]
    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::Newest => b.created_at.cmp(&a.created_at),
            Self::PriceAsc => a.price.cmp(&b.price),
            Self::PriceDesc => b.price.cmp(&a.price),
        }
    }
}

/// Search, filter, and sort settings for a catalog view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub search: String,
    pub price_range: PriceRange,
    pub category: CategoryFilter,
    pub sort: SortOrder,
}

impl CatalogQuery {
    /// Query that only searches, keeping every other setting at its default.
    #[must_use]
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: term.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        product.matches_search(&self.search)
            && self.price_range.contains(product.price)
            && self.category.matches(product.category)
    }

    /// Filter and order `products`.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        select(products, |p| self.matches(p), |a, b| self.sort.compare(a, b))
    }

    /// Whether anything differs from the default view.
    #[must_use]
    pub fn is_filtered(&self) -> bool {
        !self.search.trim().is_empty() || !self.without_search_is_default()
    }

    fn without_search_is_default(&self) -> bool {
        self.price_range == PriceRange::All
            && self.category == CategoryFilter::All
            && self.sort == SortOrder::Newest
    }
}

/// One page of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// 1-based page number actually shown.
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<'_, T> {
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// 1-based position of the first item on this page (0 for an empty list).
    #[must_use]
    pub const fn first_index(&self) -> usize {
        if self.total_items == 0 {
            0
        } else {
            (self.page - 1) * self.per_page + 1
        }
    }

    /// 1-based position of the last item on this page.
    #[must_use]
    pub const fn last_index(&self) -> usize {
        if self.total_items == 0 {
            0
        } else {
            self.first_index() + self.items.len() - 1
        }
    }

    /// Page numbers for a numbered pager.
    #[must_use]
    pub fn numbers(&self) -> Vec<usize> {
        (1..=self.total_pages).collect()
    }
}

/// Cut page `page` (1-based) of `per_page` items out of `items`.
///
/// Page 0 is treated as page 1 and pages past the end as the last page. An
/// empty list has a single empty page.
#[must_use]
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> Page<'_, T> {
    let per_page = per_page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * per_page;
    let end = (start + per_page).min(total_items);

    Page {
        items: items.get(start..end).unwrap_or_default(),
        page,
        per_page,
        total_items,
        total_pages,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::types::{Category, ProductId};

    fn product(id: i64, title: &str, description: &str, price: u16, category: Category) -> Product {
        Product {
            id: ProductId::new(id),
            title: title.to_string(),
            description: description.to_string(),
            price: Price::from(price),
            image_url: None,
            images: Vec::new(),
            category,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::days(id),
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product(1, "Companion Grey", "Open edition vinyl", 80, Category::Figure),
            product(2, "BFF Pink", "Plush companion", 100, Category::Figure),
            product(3, "Urge print", "Signed screen print", 500, Category::Art),
            product(4, "Gone", "Large bronze", 501, Category::Figure),
            product(5, "Tension canvas", "Acrylic on canvas", 2500, Category::Art),
        ]
    }

    fn ids(products: &[&Product]) -> Vec<i64> {
        products.iter().map(|p| p.id.as_i64()).collect()
    }

    #[test]
    fn test_default_query_returns_everything_newest_first() {
        let products = catalog();
        let result = CatalogQuery::default().apply(&products);
        assert_eq!(ids(&result), vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_search_matches_title_or_description_only() {
        let products = catalog();
        let result = CatalogQuery::search("COMPANION").apply(&products);
        assert_eq!(ids(&result), vec![2, 1]);
        for product in &result {
            let hay = format!("{} {}", product.title, product.description).to_lowercase();
            assert!(hay.contains("companion"));
        }
        assert!(CatalogQuery::search("kaws").apply(&products).is_empty());
    }

    #[test]
    fn test_price_range_boundaries() {
        assert!(PriceRange::Under100.contains(Price::from_cents(9_999)));
        assert!(!PriceRange::Under100.contains(Price::from(100)));
        assert!(PriceRange::From100To500.contains(Price::from(100)));
        assert!(PriceRange::From100To500.contains(Price::from(500)));
        assert!(!PriceRange::From100To500.contains(Price::from_cents(50_001)));
        assert!(PriceRange::Over500.contains(Price::from_cents(50_001)));
        assert!(!PriceRange::Over500.contains(Price::from(500)));
    }

    #[test]
    fn test_combined_filters_and_price_sort() {
        let products = catalog();
        let query = CatalogQuery {
            search: String::new(),
            price_range: PriceRange::From100To500,
            category: CategoryFilter::All,
            sort: SortOrder::PriceDesc,
        };
        assert_eq!(ids(&query.apply(&products)), vec![3, 2]);

        let figures = CatalogQuery {
            category: CategoryFilter::Only(Category::Figure),
            sort: SortOrder::PriceAsc,
            ..CatalogQuery::default()
        };
        assert_eq!(ids(&figures.apply(&products)), vec![1, 2, 4]);
    }

    #[test]
    fn test_select_sort_is_stable() {
        let values = [(1, 'a'), (0, 'b'), (1, 'c'), (0, 'd')];
        let sorted = select(&values, |_| true, |a, b| a.0.cmp(&b.0));
        let letters: String = sorted.iter().map(|v| v.1).collect();
        assert_eq!(letters, "bdac");
    }

    #[test]
    fn test_params_round_trip_and_fallback() {
        for range in PriceRange::ALL {
            assert_eq!(PriceRange::from_param(Some(range.as_param())), range);
        }
        for sort in SortOrder::ALL {
            assert_eq!(SortOrder::from_param(Some(sort.as_param())), sort);
        }
        assert_eq!(PriceRange::from_param(Some("cheap")), PriceRange::All);
        assert_eq!(SortOrder::from_param(None), SortOrder::Newest);
    }

    #[test]
    fn test_is_filtered() {
        assert!(!CatalogQuery::default().is_filtered());
        assert!(!CatalogQuery::search("  ").is_filtered());
        assert!(CatalogQuery::search("grey").is_filtered());
        let sorted = CatalogQuery {
            sort: SortOrder::PriceAsc,
            ..CatalogQuery::default()
        };
        assert!(sorted.is_filtered());
    }

    #[test]
    fn test_paginate_pages_of_five() {
        let items: Vec<u32> = (1..=12).collect();
        let first = paginate(&items, 1, 5);
        assert_eq!(first.items, &[1, 2, 3, 4, 5]);
        assert_eq!(first.total_pages, 3);
        assert!(!first.has_previous());
        assert!(first.has_next());
        assert_eq!((first.first_index(), first.last_index()), (1, 5));

        let last = paginate(&items, 3, 5);
        assert_eq!(last.items, &[11, 12]);
        assert!(last.has_previous());
        assert!(!last.has_next());
        assert_eq!((last.first_index(), last.last_index()), (11, 12));
        assert_eq!(last.numbers(), vec![1, 2, 3]);
    }

    #[test]
    fn test_paginate_clamps_out_of_range_pages() {
        let items: Vec<u32> = (1..=6).collect();
        assert_eq!(paginate(&items, 0, 5).page, 1);
        assert_eq!(paginate(&items, 40, 5).page, 2);
        assert_eq!(paginate(&items, 40, 5).items, &[6]);
    }

    #[test]
    fn test_paginate_empty_list() {
        let items: Vec<u32> = Vec::new();
        let page = paginate(&items, 3, 5);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
        assert_eq!((page.first_index(), page.last_index()), (0, 0));
    }
}

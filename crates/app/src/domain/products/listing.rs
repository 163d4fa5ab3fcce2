//! Product listing queries: filtering, price ordering, pagination and
//! grouping of a page by category.

use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::Value;

use crate::{
    domain::products::records::ProductRecord,
    store::{Filter, Sort},
};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Which products a listing includes.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FilterSpec {
    #[default]
    All,

    /// Equality on any stored field, from a JSON object of scalar values.
    Fields(Filter),

    /// Bare category name.
    Category(String),
}

impl FilterSpec {
    /// Parse a raw filter string.
    ///
    /// A JSON object whose values are all scalars becomes a field filter.
    /// Anything else, including text that is not valid JSON, is taken as a
    /// category name. Blank input lists everything.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();

        if raw.is_empty() {
            return Self::All;
        }

        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(fields)) if fields.values().all(is_scalar) => {
                if fields.is_empty() {
                    return Self::All;
                }

                Self::Fields(
                    fields
                        .into_iter()
                        .fold(Filter::all(), |filter, (field, value)| {
                            filter.equals(field, value)
                        }),
                )
            }
            _ => Self::Category(raw.to_string()),
        }
    }

    #[must_use]
    pub fn to_filter(&self) -> Filter {
        match self {
            Self::All => Filter::all(),
            Self::Fields(filter) => filter.clone(),
            Self::Category(category) => Filter::all().equals("category", category.as_str()),
        }
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

/// Price ordering of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceOrder {
    Ascending,
    Descending,
}

impl PriceOrder {
    /// `asc` and `desc` select an order; anything else leaves the listing unordered.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "asc" => Some(Self::Ascending),
            "desc" => Some(Self::Descending),
            _ => None,
        }
    }

    #[must_use]
    pub const fn sort(self) -> Sort {
        match self {
            Self::Ascending => Sort::ascending("price"),
            Self::Descending => Sort::descending("price"),
        }
    }
}

/// One-based page number and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    page_size: u64,
}

impl PageRequest {
    /// Zero for either value selects the default.
    #[must_use]
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: if page == 0 { DEFAULT_PAGE } else { page },
            page_size: if page_size == 0 {
                DEFAULT_PAGE_SIZE
            } else {
                page_size
            },
        }
    }

    /// Lenient parse of raw query parameters.
    ///
    /// Leading digits are used (`"2abc"` is page 2); missing, non-numeric and
    /// non-positive values fall back to the defaults.
    #[must_use]
    pub fn from_params(page: Option<&str>, page_size: Option<&str>) -> Self {
        Self::new(
            page.map_or(0, leading_number),
            page_size.map_or(0, leading_number),
        )
    }

    #[must_use]
    pub const fn page(&self) -> u64 {
        self.page
    }

    #[must_use]
    pub const fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Number of matching records before this page.
    #[must_use]
    pub const fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_PAGE_SIZE)
    }
}

fn leading_number(raw: &str) -> u64 {
    let digits: String = raw
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();

    digits.parse().unwrap_or(0)
}

/// Parameters of a product listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingQuery {
    pub filter: FilterSpec,
    pub order: Option<PriceOrder>,
    pub page: PageRequest,
}

/// One page of results plus navigation metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub docs: Vec<T>,
    pub total_docs: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    pub prev_page: Option<u64>,
    pub next_page: Option<u64>,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(docs: Vec<T>, total_docs: u64, request: PageRequest) -> Self {
        let page = request.page();
        let total_pages = total_docs.div_ceil(request.page_size());
        let has_prev_page = page > 1;
        let has_next_page = page < total_pages;

        Self {
            docs,
            total_docs,
            page,
            page_size: request.page_size(),
            total_pages,
            has_prev_page,
            has_next_page,
            prev_page: has_prev_page.then_some(page - 1),
            next_page: has_next_page.then_some(page + 1),
        }
    }
}

/// Products of a page sharing one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryGroup {
    pub category: String,
    pub products: Vec<ProductRecord>,
}

/// A product page together with its items grouped by category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    #[serde(flatten)]
    pub page: Page<ProductRecord>,
    pub by_category: Vec<CategoryGroup>,
}

impl Listing {
    /// Groups appear in order of their first product on the page.
    #[must_use]
    pub fn from_page(page: Page<ProductRecord>) -> Self {
        let mut by_category: Vec<CategoryGroup> = Vec::new();
        let mut positions: FxHashMap<String, usize> = FxHashMap::default();

        for product in &page.docs {
            let position = *positions
                .entry(product.category.clone())
                .or_insert_with(|| {
                    by_category.push(CategoryGroup {
                        category: product.category.clone(),
                        products: Vec::new(),
                    });
                    by_category.len() - 1
                });

            if let Some(group) = by_category.get_mut(position) {
                group.products.push(product.clone());
            }
        }

        Self { page, by_category }
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;
    use crate::domain::products::records::ProductUuid;

    fn product(code: &str, category: &str) -> ProductRecord {
        ProductRecord {
            uuid: ProductUuid::new(),
            title: code.to_string(),
            description: String::new(),
            code: code.to_string(),
            price: Decimal::ONE,
            stock: 1,
            category: category.to_string(),
            status: true,
            thumbnails: Vec::new(),
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
        }
    }

    #[test]
    fn json_object_becomes_field_filter() {
        let filter = FilterSpec::parse(r#"{"category":"Hornos","status":true}"#);

        assert_eq!(
            filter,
            FilterSpec::Fields(Filter::all().equals("category", "Hornos").equals("status", true))
        );
    }

    #[test]
    fn invalid_json_falls_back_to_category() {
        assert_eq!(
            FilterSpec::parse("Hornos"),
            FilterSpec::Category("Hornos".to_string())
        );
        assert_eq!(
            FilterSpec::parse("{broken"),
            FilterSpec::Category("{broken".to_string())
        );
    }

    #[test]
    fn non_object_or_nested_json_falls_back_to_category() {
        assert_eq!(FilterSpec::parse("42"), FilterSpec::Category("42".to_string()));
        assert_eq!(
            FilterSpec::parse(r#"{"price":{"$gt":10}}"#),
            FilterSpec::Category(r#"{"price":{"$gt":10}}"#.to_string())
        );
    }

    #[test]
    fn blank_filter_lists_everything() {
        assert_eq!(FilterSpec::parse("  "), FilterSpec::All);
        assert_eq!(FilterSpec::parse("{}"), FilterSpec::All);
        assert!(FilterSpec::All.to_filter().is_empty(), "All should not filter");
    }

    #[test]
    fn category_spec_filters_on_category() {
        let filter = FilterSpec::Category("Hornos".to_string()).to_filter();

        assert!(filter.matches(&json!({ "category": "Hornos" })));
        assert!(!filter.matches(&json!({ "category": "Lavadoras" })));
    }

    #[test]
    fn price_order_parse() {
        assert_eq!(PriceOrder::parse("asc"), Some(PriceOrder::Ascending));
        assert_eq!(PriceOrder::parse("desc"), Some(PriceOrder::Descending));
        assert_eq!(PriceOrder::parse("price"), None);
        assert_eq!(PriceOrder::Descending.sort(), Sort::descending("price"));
    }

    #[test]
    fn zero_and_garbage_page_params_use_defaults() {
        assert_eq!(PageRequest::new(0, 0), PageRequest::default());
        assert_eq!(
            PageRequest::from_params(Some("abc"), Some("-5")),
            PageRequest::default()
        );
        assert_eq!(
            PageRequest::from_params(Some("3rd"), None),
            PageRequest::new(3, DEFAULT_PAGE_SIZE)
        );
    }

    #[test]
    fn skip_is_previous_pages_worth_of_records() {
        assert_eq!(PageRequest::new(1, 10).skip(), 0);
        assert_eq!(PageRequest::new(3, 10).skip(), 20);
    }

    #[test]
    fn twenty_five_records_make_three_pages_of_ten() {
        let first = Page::<()>::new(Vec::new(), 25, PageRequest::new(1, 10));
        let last = Page::<()>::new(Vec::new(), 25, PageRequest::new(3, 10));

        assert_eq!(first.total_pages, 3);
        assert!(!first.has_prev_page, "page 1 has no previous page");
        assert!(first.has_next_page, "page 1 has a next page");
        assert_eq!((first.prev_page, first.next_page), (None, Some(2)));

        assert!(last.has_prev_page, "page 3 has a previous page");
        assert!(!last.has_next_page, "page 3 is the last page");
        assert_eq!((last.prev_page, last.next_page), (Some(2), None));
    }

    #[test]
    fn empty_result_is_an_empty_page() {
        let page = Page::<()>::new(Vec::new(), 0, PageRequest::default());

        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next_page, "empty listing has no next page");
        assert!(!page.has_prev_page, "empty listing has no previous page");
    }

    #[test]
    fn groups_follow_first_appearance() {
        let docs = vec![
            product("a", "Hornos"),
            product("b", "Lavadoras"),
            product("c", "Hornos"),
        ];

        let listing = Listing::from_page(Page::new(docs, 3, PageRequest::default()));
        let groups: Vec<(&str, Vec<&str>)> = listing
            .by_category
            .iter()
            .map(|group| {
                (
                    group.category.as_str(),
                    group.products.iter().map(|p| p.code.as_str()).collect(),
                )
            })
            .collect();

        assert_eq!(
            groups,
            [("Hornos", vec!["a", "c"]), ("Lavadoras", vec!["b"])]
        );
    }
}

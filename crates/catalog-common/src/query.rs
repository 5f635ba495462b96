/// Catalog query engine: filter, sort, and page a snapshot of listings.
///
/// The engine is a pure function of `(records, params)`. It never mutates the
/// snapshot, never fails, and never renormalizes caller state: resetting the page
/// to 1 when a filter changes is the caller's job.
use std::cmp::Ordering;

use schemars::JsonSchema;
use serde::Serialize;

use crate::listing::Listing;

pub const DEFAULT_PAGE_SIZE: usize = 12;

const BUCKET_LOW: f64 = 100_000.0;
const BUCKET_HIGH: f64 = 200_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Snapshot order. The store hands rows over newest first.
    #[default]
    Newest,
    PriceLow,
    PriceHigh,
    NameAsc,
}

impl SortKey {
    /// Unknown labels fall back to `Newest`.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "price-low" => SortKey::PriceLow,
            "price-high" => SortKey::PriceHigh,
            "name-asc" => SortKey::NameAsc,
            _ => SortKey::Newest,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Newest => "newest",
            SortKey::PriceLow => "price-low",
            SortKey::PriceHigh => "price-high",
            SortKey::NameAsc => "name-asc",
        }
    }
}

/// Named price buckets offered by the marketplace filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, JsonSchema)]
pub enum PriceRange {
    #[default]
    #[serde(rename = "all")]
    All,
    /// price < 100,000
    #[serde(rename = "under-100k")]
    Under100k,
    /// 100,000 <= price <= 200,000
    #[serde(rename = "100k-200k")]
    From100kTo200k,
    /// price > 200,000
    #[serde(rename = "over-200k")]
    Over200k,
}

impl PriceRange {
    /// Unknown labels fall back to `All`.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "under-100k" => PriceRange::Under100k,
            "100k-200k" => PriceRange::From100kTo200k,
            "over-200k" => PriceRange::Over200k,
            _ => PriceRange::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceRange::All => "all",
            PriceRange::Under100k => "under-100k",
            PriceRange::From100kTo200k => "100k-200k",
            PriceRange::Over200k => "over-200k",
        }
    }

    /// `All` admits records without a price; every other bucket excludes them.
    pub fn matches(&self, price: Option<f64>) -> bool {
        match (self, price) {
            (PriceRange::All, _) => true,
            (_, None) => false,
            (PriceRange::Under100k, Some(p)) => p < BUCKET_LOW,
            (PriceRange::From100kTo200k, Some(p)) => (BUCKET_LOW..=BUCKET_HIGH).contains(&p),
            (PriceRange::Over200k, Some(p)) => p > BUCKET_HIGH,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    /// Partition to query. Records from other partitions never appear.
    pub category: String,
    pub search_text: String,
    pub price_range: PriceRange,
    pub sort: SortKey,
    /// 1-based. Values below 1 are read as 1.
    pub page_number: usize,
    /// Values below 1 are read as 1.
    pub page_size: usize,
}

impl QueryParams {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            search_text: String::new(),
            price_range: PriceRange::All,
            sort: SortKey::Newest,
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    pub fn price_range(mut self, range: PriceRange) -> Self {
        self.price_range = range;
        self
    }

    pub fn sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    pub fn page(mut self, page_number: usize) -> Self {
        self.page_number = page_number.max(1);
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<'a, T> {
    /// The requested page, borrowed from the snapshot.
    pub items: Vec<&'a T>,
    pub total_count: usize,
    /// Never less than 1, even when nothing matched.
    pub total_pages: usize,
    pub page_number: usize,
}

pub fn run_query<'a, T: Listing>(records: &'a [T], params: &QueryParams) -> QueryResult<'a, T> {
    let needle = params.search_text.to_lowercase();
    let search_all = needle.trim().is_empty();

    let mut matched: Vec<&'a T> = records
        .iter()
        .filter(|r| r.category() == params.category)
        .filter(|r| search_all || matches_search(*r, &needle))
        .filter(|r| params.price_range.matches(r.numeric_sort_field()))
        .collect();

    sort_listings(&mut matched, params.sort);

    let page_size = params.page_size.max(1);
    let page_number = params.page_number.max(1);
    let total_count = matched.len();
    let total_pages = total_count.div_ceil(page_size).max(1);

    let start = (page_number - 1).saturating_mul(page_size);
    let items = if start >= total_count {
        Vec::new()
    } else {
        let end = start.saturating_add(page_size).min(total_count);
        matched[start..end].to_vec()
    };

    QueryResult {
        items,
        total_count,
        total_pages,
        page_number,
    }
}

/// `needle` must already be lowercased.
fn matches_search<T: Listing>(record: &T, needle: &str) -> bool {
    if record.title().to_lowercase().contains(needle) {
        return true;
    }
    record
        .secondary_search_field()
        .is_some_and(|field| field.to_lowercase().contains(needle))
}

/// `sort_by` is stable, so equal keys keep their snapshot order.
fn sort_listings<T: Listing>(items: &mut [&T], key: SortKey) {
    match key {
        SortKey::Newest => {}
        SortKey::PriceLow => items.sort_by(|a, b| price_of(*a).total_cmp(&price_of(*b))),
        SortKey::PriceHigh => items.sort_by(|a, b| price_of(*b).total_cmp(&price_of(*a))),
        SortKey::NameAsc => items.sort_by(|a, b| compare_titles(a.title(), b.title())),
    }
}

fn price_of<T: Listing>(record: &T) -> f64 {
    record.numeric_sort_field().unwrap_or(0.0)
}

/// Dictionary-style ordering: case-insensitive first, then lowercase before
/// uppercase at the first position where two case-variants differ.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    let folded = a.chars().flat_map(char::to_lowercase).cmp(b.chars().flat_map(char::to_lowercase));
    if folded != Ordering::Equal {
        return folded;
    }
    for (ca, cb) in a.chars().zip(b.chars()) {
        if ca != cb {
            return match (ca.is_lowercase(), cb.is_lowercase()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => ca.cmp(&cb),
            };
        }
    }
    a.len().cmp(&b.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: &'static str,
        title: &'static str,
        brand: Option<&'static str>,
        price: Option<f64>,
        category: &'static str,
    }

    impl Listing for Item {
        fn title(&self) -> &str {
            self.title
        }
        fn category(&self) -> &str {
            self.category
        }
        fn secondary_search_field(&self) -> Option<&str> {
            self.brand
        }
        fn numeric_sort_field(&self) -> Option<f64> {
            self.price
        }
    }

    fn item(id: &'static str, title: &'static str, brand: &'static str, price: f64) -> Item {
        Item {
            id,
            title,
            brand: Some(brand),
            price: Some(price),
            category: "for-sale",
        }
    }

    fn ids<'a>(result: &QueryResult<'a, Item>) -> Vec<&'static str> {
        result.items.iter().map(|i| i.id).collect()
    }

    fn mixed_catalog() -> Vec<Item> {
        vec![
            item("a", "Crown Inverter AC", "Gree", 95_000.0),
            Item {
                category: "wanted",
                ..item("b", "Need a 1.5 ton split", "Any", 80_000.0)
            },
            item("c", "Dawlance Sprinter", "Dawlance", 135_000.0),
            item("d", "Haier Thunder", "Haier", 55_000.0),
            Item {
                price: None,
                ..item("e", "Window unit, price on call", "Orient", 0.0)
            },
            item("f", "Gree Fairy", "Gree", 115_000.0),
            Item {
                category: "wanted",
                ..item("g", "Looking for Gree inverter", "Gree", 150_000.0)
            },
        ]
    }

    #[test]
    fn identical_inputs_give_identical_results() {
        let records = mixed_catalog();
        let params = QueryParams::new("for-sale").search("e").sort(SortKey::PriceHigh);
        assert_eq!(run_query(&records, &params), run_query(&records, &params));
    }

    #[test]
    fn only_requested_partition_is_returned() {
        let records = mixed_catalog();
        for category in ["for-sale", "wanted"] {
            let result = run_query(&records, &QueryParams::new(category).page_size(100));
            assert!(result.items.iter().all(|i| i.category == category));
        }
        let wanted = run_query(&records, &QueryParams::new("wanted"));
        assert_eq!(ids(&wanted), vec!["b", "g"]);
    }

    #[test]
    fn search_matches_title_or_brand_case_insensitively() {
        let records = mixed_catalog();
        for query in ["gree", "GREE", "Gree"] {
            let result = run_query(&records, &QueryParams::new("for-sale").search(query));
            assert_eq!(ids(&result), vec!["a", "f"], "query {query:?}");
        }

        let by_title = run_query(&records, &QueryParams::new("for-sale").search("sprinter"));
        assert_eq!(ids(&by_title), vec!["c"]);
    }

    #[test]
    fn search_is_exactly_title_or_brand_substring() {
        let records = mixed_catalog();
        for needle in ["in", "ER", "x", "ai", " "] {
            let result = run_query(
                &records,
                &QueryParams::new("for-sale").search(needle).page_size(100),
            );
            let lowered = needle.to_lowercase();
            let expected: Vec<&str> = records
                .iter()
                .filter(|r| r.category == "for-sale")
                .filter(|r| {
                    lowered.trim().is_empty()
                        || r.title.to_lowercase().contains(&lowered)
                        || r.brand.is_some_and(|b| b.to_lowercase().contains(&lowered))
                })
                .map(|r| r.id)
                .collect();
            assert_eq!(ids(&result), expected, "needle {needle:?}");
        }
    }

    #[test]
    fn whitespace_search_matches_everything() {
        let records = mixed_catalog();
        let result = run_query(&records, &QueryParams::new("for-sale").search("   "));
        assert_eq!(result.total_count, 5);
    }

    #[test]
    fn pages_reconstruct_the_filtered_sorted_set() {
        let records: Vec<Item> = (0..23)
            .map(|n| Item {
                id: Box::leak(format!("u{n}").into_boxed_str()),
                title: "Unit",
                brand: None,
                price: Some(((n * 7919) % 31) as f64 * 1_000.0),
                category: "for-sale",
            })
            .collect();

        let base = QueryParams::new("for-sale").sort(SortKey::PriceLow).page_size(5);
        let everything = run_query(&records, &base.clone().page_size(100));
        let first = run_query(&records, &base);
        assert_eq!(first.total_pages, 5);
        assert_eq!(first.total_count, 23);

        let mut rebuilt = Vec::new();
        for page in 1..=first.total_pages {
            let result = run_query(&records, &base.clone().page(page));
            assert!(result.items.len() <= 5);
            rebuilt.extend(result.items);
        }
        assert_eq!(rebuilt, everything.items);
    }

    #[test]
    fn empty_result_still_reports_one_page() {
        let records = mixed_catalog();
        let result = run_query(&records, &QueryParams::new("for-sale").search("carrier"));
        assert!(result.items.is_empty());
        assert_eq!(result.total_count, 0);
        assert_eq!(result.total_pages, 1);
        assert_eq!(result.page_number, 1);
    }

    #[test]
    fn newest_keeps_snapshot_order() {
        let records = mixed_catalog();
        let result = run_query(&records, &QueryParams::new("for-sale"));
        assert_eq!(ids(&result), vec!["a", "c", "d", "e", "f"]);
    }

    #[test]
    fn price_low_is_non_decreasing_and_missing_price_counts_as_zero() {
        let records = mixed_catalog();
        let result = run_query(&records, &QueryParams::new("for-sale").sort(SortKey::PriceLow));
        let prices: Vec<f64> = result.items.iter().map(|i| i.price.unwrap_or(0.0)).collect();
        assert!(prices.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(result.items[0].id, "e");
    }

    #[test]
    fn price_high_is_descending_and_stable_on_ties() {
        let records = vec![
            item("x", "One", "A", 70_000.0),
            item("y", "Two", "B", 90_000.0),
            item("z", "Three", "C", 70_000.0),
        ];
        let result = run_query(&records, &QueryParams::new("for-sale").sort(SortKey::PriceHigh));
        assert_eq!(ids(&result), vec!["y", "x", "z"]);

        let low = run_query(&records, &QueryParams::new("for-sale").sort(SortKey::PriceLow));
        assert_eq!(ids(&low), vec!["x", "z", "y"]);
    }

    #[test]
    fn name_asc_ignores_case() {
        let records = vec![
            item("1", "haier Thunder", "Haier", 1.0),
            item("2", "Crown Inverter", "Gree", 1.0),
            item("3", "Dawlance", "Dawlance", 1.0),
            item("4", "crown inverter", "Gree", 1.0),
        ];
        let result = run_query(&records, &QueryParams::new("for-sale").sort(SortKey::NameAsc));
        assert_eq!(ids(&result), vec!["4", "2", "3", "1"]);
    }

    #[test]
    fn page_past_the_end_is_empty_without_touching_totals() {
        let records = mixed_catalog();
        let params = QueryParams::new("for-sale").page_size(2);
        let in_range = run_query(&records, &params);
        let past = run_query(&records, &params.clone().page(9));
        assert!(past.items.is_empty());
        assert_eq!(past.total_count, in_range.total_count);
        assert_eq!(past.total_pages, in_range.total_pages);
        assert_eq!(past.page_number, 9);
    }

    #[test]
    fn second_page_of_fourteen_holds_the_two_highest_prices() {
        let mut prices: Vec<f64> = (0..13).map(|n| 50_000.0 + 5_000.0 * n as f64).collect();
        prices.push(220_000.0);
        // Arrive in a scrambled order so sorting actually has work to do.
        prices.swap(0, 13);
        prices.swap(4, 9);
        let records: Vec<Item> = prices
            .iter()
            .enumerate()
            .map(|(n, p)| Item {
                id: Box::leak(format!("s{n}").into_boxed_str()),
                title: "Split AC",
                brand: None,
                price: Some(*p),
                category: "for-sale",
            })
            .collect();

        let result = run_query(
            &records,
            &QueryParams::new("for-sale").sort(SortKey::PriceLow).page_size(12).page(2),
        );
        assert_eq!(result.total_pages, 2);
        assert_eq!(result.total_count, 14);
        let page_prices: Vec<f64> = result.items.iter().filter_map(|i| i.price).collect();
        assert_eq!(page_prices, vec![110_000.0, 220_000.0]);
    }

    #[test]
    fn under_100k_bucket_keeps_cheaper_units() {
        let records = vec![
            item("p1", "A", "A", 55_000.0),
            item("p2", "B", "B", 95_000.0),
            item("p3", "C", "C", 115_000.0),
            item("p4", "D", "D", 135_000.0),
        ];
        let params = QueryParams::new("for-sale").price_range(PriceRange::Under100k);
        assert_eq!(ids(&run_query(&records, &params)), vec!["p1", "p2"]);

        let high_first = params.sort(SortKey::PriceHigh);
        assert_eq!(ids(&run_query(&records, &high_first)), vec!["p2", "p1"]);
    }

    #[test]
    fn price_buckets_exclude_unpriced_records_except_all() {
        assert!(PriceRange::All.matches(None));
        assert!(!PriceRange::Under100k.matches(None));
        assert!(PriceRange::From100kTo200k.matches(Some(100_000.0)));
        assert!(PriceRange::From100kTo200k.matches(Some(200_000.0)));
        assert!(!PriceRange::Under100k.matches(Some(100_000.0)));
        assert!(PriceRange::Over200k.matches(Some(200_001.0)));
    }

    #[test]
    fn unknown_labels_fall_back_to_defaults() {
        assert_eq!(SortKey::parse("cheapest"), SortKey::Newest);
        assert_eq!(SortKey::parse(" Price-High "), SortKey::PriceHigh);
        assert_eq!(PriceRange::parse("under-50k"), PriceRange::All);
        assert_eq!(PriceRange::parse("OVER-200K"), PriceRange::Over200k);
        for key in [SortKey::Newest, SortKey::PriceLow, SortKey::PriceHigh, SortKey::NameAsc] {
            assert_eq!(SortKey::parse(key.as_str()), key);
        }
    }

    #[test]
    fn zero_page_inputs_are_read_as_one() {
        let records = mixed_catalog();
        let mut params = QueryParams::new("for-sale");
        params.page_number = 0;
        params.page_size = 0;
        let result = run_query(&records, &params);
        assert_eq!(result.page_number, 1);
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.total_pages, 5);
    }
}

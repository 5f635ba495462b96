/// The storefront's view of the hosted store: one snapshot of listings, posts, and
/// testimonials, loaded from the snapshot cache when warm and from the store otherwise.
use std::sync::Arc;

use tracing::info;

use catalog_common::api::{BlogPage, BlogSummary, ListingPage, ListingSummary, SearchBlogParams, SearchListingsParams};
use catalog_common::cache::{fingerprint, SnapshotCache};
use catalog_common::listing::{AcUnit, BlogPost, Table, Testimonial};
use catalog_common::query::{run_query, PriceRange, QueryParams, SortKey};
use catalog_common::store::StoreClient;

use crate::error::AppError;

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Newest first, as delivered by the store.
    pub units: Vec<AcUnit>,
    pub posts: Vec<BlogPost>,
    pub testimonials: Vec<Testimonial>,
}

impl Snapshot {
    pub fn search_units(&self, params: &SearchListingsParams, page_size: usize) -> ListingPage {
        let query = QueryParams::new(params.listing_type.trim())
            .search(params.search.clone().unwrap_or_default())
            .price_range(params.price_range.as_deref().map(PriceRange::parse).unwrap_or_default())
            .sort(params.sort.as_deref().map(SortKey::parse).unwrap_or_default())
            .page(params.page.unwrap_or(1) as usize)
            .page_size(page_size);
        let result = run_query(&self.units, &query);

        ListingPage {
            listing_type: query.category.clone(),
            sort: query.sort.as_str().to_string(),
            price_range: query.price_range.as_str().to_string(),
            items: result.items.into_iter().map(ListingSummary::from).collect(),
            total_count: result.total_count,
            total_pages: result.total_pages,
            page_number: result.page_number,
        }
    }

    pub fn search_posts(&self, params: &SearchBlogParams, page_size: usize) -> BlogPage {
        let query = QueryParams::new(params.category.trim())
            .search(params.search.clone().unwrap_or_default())
            .sort(params.sort.as_deref().map(SortKey::parse).unwrap_or_default())
            .page(params.page.unwrap_or(1) as usize)
            .page_size(page_size);
        let result = run_query(&self.posts, &query);

        BlogPage {
            category: query.category.clone(),
            sort: query.sort.as_str().to_string(),
            items: result.items.into_iter().map(BlogSummary::from).collect(),
            total_count: result.total_count,
            total_pages: result.total_pages,
            page_number: result.page_number,
        }
    }

    pub fn find_unit(&self, id: &str) -> Option<&AcUnit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn find_post(&self, slug: &str) -> Option<&BlogPost> {
        self.posts.iter().find(|p| p.slug.eq_ignore_ascii_case(slug))
    }

    pub fn fingerprint(&self) -> String {
        fingerprint(&(&self.units, &self.posts, &self.testimonials))
    }
}

pub struct CatalogLoader {
    store: Arc<StoreClient>,
    cache: SnapshotCache,
}

impl CatalogLoader {
    pub fn new(store: Arc<StoreClient>, cache: SnapshotCache) -> Self {
        Self { store, cache }
    }

    /// Cached snapshot when every table is cached, otherwise a fresh fetch.
    pub async fn load(&self) -> Result<Snapshot, AppError> {
        let (units, posts, testimonials) = futures::join!(
            self.cache.get_rows::<AcUnit>(Table::AcUnits),
            self.cache.get_rows::<BlogPost>(Table::BlogPosts),
            self.cache.get_rows::<Testimonial>(Table::Testimonials),
        );
        if let (Some(units), Some(posts), Some(testimonials)) = (units, posts, testimonials) {
            info!(units = units.len(), posts = posts.len(), "snapshot cache hit");
            return Ok(Snapshot {
                units,
                posts,
                testimonials,
            });
        }
        self.reload().await
    }

    /// Fetch every table from the store and refill the cache.
    pub async fn reload(&self) -> Result<Snapshot, AppError> {
        let (units, posts, testimonials) = futures::try_join!(
            self.store.fetch_visible::<AcUnit>(Table::AcUnits),
            self.store.fetch_visible::<BlogPost>(Table::BlogPosts),
            self.store.fetch_visible::<Testimonial>(Table::Testimonials),
        )?;

        let cached = self.cache.set_rows(Table::AcUnits, &units).await
            & self.cache.set_rows(Table::BlogPosts, &posts).await
            & self.cache.set_rows(Table::Testimonials, &testimonials).await;
        info!(
            units = units.len(),
            posts = posts.len(),
            testimonials = testimonials.len(),
            cached,
            "snapshot loaded from store"
        );

        Ok(Snapshot {
            units,
            posts,
            testimonials,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use catalog_common::redis::RedisCache;
    use catalog_common::store::StoreClientConfig;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// A store that serves `units` from `ac_units` and no rows from any other table.
    /// Returns its base URL and a counter of requests served.
    pub(crate) async fn stub_store(units: Vec<AcUnit>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let served = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&served);
        let units_json = serde_json::to_string(&units).unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 8192];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                let body = if request.starts_with("GET /rest/v1/ac_units") {
                    units_json.as_str()
                } else {
                    "[]"
                };
                counter.fetch_add(1, Ordering::SeqCst);
                let reply = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        (format!("http://{addr}"), served)
    }

    pub(crate) fn loader_for(base_url: &str) -> CatalogLoader {
        let store = StoreClient::new(StoreClientConfig::new(base_url, "test-key")).unwrap();
        CatalogLoader::new(Arc::new(store), SnapshotCache::new(RedisCache::disabled(), 60))
    }

    pub(crate) fn unit(id: &str, title: &str, brand: &str, price: f64, listing_type: &str) -> AcUnit {
        AcUnit {
            id: id.to_string(),
            title: title.to_string(),
            brand: Some(brand.to_string()),
            price: Some(price),
            tonnage: Some(1.5),
            condition: Some("used".to_string()),
            location: Some("Lahore".to_string()),
            description: None,
            image_url: None,
            contact_name: None,
            contact_phone: None,
            listing_type: listing_type.to_string(),
            is_active: true,
            created_at: None,
        }
    }

    pub(crate) fn post(id: &str, title: &str, slug: &str, category: &str) -> BlogPost {
        BlogPost {
            id: id.to_string(),
            title: title.to_string(),
            slug: slug.to_string(),
            excerpt: None,
            content: "body".to_string(),
            category: category.to_string(),
            author: None,
            image_url: None,
            published: true,
            created_at: None,
        }
    }

    pub(crate) fn sample_snapshot() -> Snapshot {
        Snapshot {
            units: vec![
                unit("u1", "Crown Inverter AC", "Gree", 95_000.0, "for-sale"),
                unit("u2", "Sprinter DC", "Dawlance", 135_000.0, "for-sale"),
                unit("u3", "Need 1 ton split", "Any", 60_000.0, "wanted"),
                unit("u4", "Thunder Plus", "Haier", 55_000.0, "for-sale"),
            ],
            posts: vec![
                post("p1", "Why your AC drips water", "ac-drips-water", "maintenance"),
                post("p2", "Buying a used inverter", "buying-used-inverter", "buying-guide"),
                post("p3", "Cleaning filters at home", "cleaning-filters", "maintenance"),
            ],
            testimonials: vec![],
        }
    }

    fn listing_params(listing_type: &str) -> SearchListingsParams {
        SearchListingsParams {
            listing_type: listing_type.to_string(),
            search: None,
            price_range: None,
            sort: None,
            page: None,
        }
    }

    #[test]
    fn listing_search_applies_filters_and_labels() {
        let snapshot = sample_snapshot();
        let params = SearchListingsParams {
            price_range: Some("under-100k".to_string()),
            sort: Some("price-low".to_string()),
            ..listing_params("for-sale")
        };
        let page = snapshot.search_units(&params, 12);
        let ids: Vec<&str> = page.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["u4", "u1"]);
        assert_eq!(page.sort, "price-low");
        assert_eq!(page.price_range, "under-100k");
        assert_eq!(page.items[0].price_label.as_deref(), Some("Rs. 55,000"));
    }

    #[test]
    fn bad_labels_fall_back_and_page_passes_through() {
        let snapshot = sample_snapshot();
        let params = SearchListingsParams {
            sort: Some("cheapest-first".to_string()),
            price_range: Some("bogus".to_string()),
            page: Some(3),
            ..listing_params("for-sale")
        };
        let page = snapshot.search_units(&params, 12);
        assert_eq!(page.sort, "newest");
        assert_eq!(page.price_range, "all");
        assert_eq!(page.page_number, 3);
        assert_eq!(page.total_count, 3);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn wanted_partition_is_separate() {
        let snapshot = sample_snapshot();
        let page = snapshot.search_units(&listing_params(" wanted "), 12);
        assert_eq!(page.listing_type, "wanted");
        assert_eq!(page.total_count, 1);
        assert_eq!(page.items[0].id, "u3");
    }

    #[test]
    fn blog_search_stays_in_category() {
        let snapshot = sample_snapshot();
        let params = SearchBlogParams {
            category: "maintenance".to_string(),
            search: None,
            sort: Some("name-asc".to_string()),
            page: None,
        };
        let page = snapshot.search_posts(&params, 9);
        let slugs: Vec<&str> = page.items.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["cleaning-filters", "ac-drips-water"]);
    }

    #[test]
    fn lookups_by_id_and_slug() {
        let snapshot = sample_snapshot();
        assert_eq!(snapshot.find_unit("u2").map(|u| u.title.as_str()), Some("Sprinter DC"));
        assert!(snapshot.find_unit("missing").is_none());
        assert!(snapshot.find_post("Cleaning-Filters").is_some());
    }

    #[test]
    fn fingerprint_follows_every_table() {
        let mut snapshot = sample_snapshot();
        let before = snapshot.fingerprint();
        snapshot.units.pop();
        let after_units = snapshot.fingerprint();
        assert_ne!(before, after_units);

        snapshot.posts.pop();
        let after_posts = snapshot.fingerprint();
        assert_ne!(after_units, after_posts);

        snapshot.testimonials.push(Testimonial {
            id: "t1".to_string(),
            name: "Bilal".to_string(),
            location: None,
            message: "Quick service".to_string(),
            rating: Some(5),
            is_active: true,
        });
        assert_ne!(after_posts, snapshot.fingerprint());
    }

    #[tokio::test]
    async fn load_without_cache_fetches_every_table() {
        let (url, served) =
            stub_store(vec![unit("u9", "Fresh Listing", "Gree", 80_000.0, "for-sale")]).await;
        let snapshot = loader_for(&url).load().await.unwrap();
        assert_eq!(snapshot.units.len(), 1);
        assert_eq!(snapshot.units[0].id, "u9");
        assert!(snapshot.posts.is_empty());
        assert!(snapshot.testimonials.is_empty());
        assert_eq!(served.load(Ordering::SeqCst), 3);
    }
}

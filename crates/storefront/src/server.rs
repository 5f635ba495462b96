/// MCP server for the public storefront.
///
/// Exposes ten tools:
/// - `search_listings`, `search_blog`: filtered, sorted, paged catalog views
/// - `get_listing`, `get_post`, `list_testimonials`: direct lookups
/// - `chat_reply`: canned chat-widget replies
/// - `inquiry_link`, `quote_link`, `request_booking`: WhatsApp hand-off
/// - `refresh_catalog`: re-fetch the snapshot from the store
///
/// The snapshot is reloaded on first read once it is older than `SNAPSHOT_TTL_SECS`,
/// so back-office edits (which drop the snapshot cache) show up without a restart.
use std::sync::Arc;
use std::time::{Duration, Instant};

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use serde::Serialize;
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{info, warn};

use catalog_common::api::{
    BlogPage, BookingResponse, ChatReplyParams, ChatReplyResponse, GetListingParams,
    GetPostParams, InquiryLinkParams, ListingPage, QuoteLinkParams, RefreshCatalogResponse,
    RequestBookingParams, SearchBlogParams, SearchListingsParams, TestimonialsResponse,
    WhatsAppLinkResponse,
};
use catalog_common::listing::{AcUnit, BlogPost, Booking, BookingStatus, Table};
use catalog_common::responder::CannedResponder;
use catalog_common::store::StoreClient;
use catalog_common::whatsapp::{self, BookingRequest, QuoteRequest};

use crate::catalog::{CatalogLoader, Snapshot};
use crate::config::Config;
use crate::error::AppError;

#[derive(Clone)]
pub struct StorefrontServer {
    live: Arc<RwLock<LiveSnapshot>>,
    max_age: Duration,
    loader: Arc<CatalogLoader>,
    store: Arc<StoreClient>,
    responder: Arc<CannedResponder>,
    config: Config,
    tool_router: ToolRouter<StorefrontServer>,
}

struct LiveSnapshot {
    snapshot: Snapshot,
    loaded_at: Instant,
}

impl LiveSnapshot {
    fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            loaded_at: Instant::now(),
        }
    }
}

/// Row shape for a new booking; the store assigns `id` and `created_at`.
#[derive(Debug, Serialize)]
struct NewBooking<'a> {
    customer_name: &'a str,
    phone: &'a str,
    service: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    preferred_date: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
    status: BookingStatus,
}

impl StorefrontServer {
    pub fn new(
        snapshot: Snapshot,
        loader: Arc<CatalogLoader>,
        store: Arc<StoreClient>,
        responder: CannedResponder,
        config: Config,
    ) -> Self {
        Self {
            live: Arc::new(RwLock::new(LiveSnapshot::new(snapshot))),
            max_age: Duration::from_secs(config.snapshot_ttl_secs),
            loader,
            store,
            responder: Arc::new(responder),
            config,
            tool_router: Self::tool_router(),
        }
    }

    /// The current snapshot, reloaded first when older than the snapshot TTL.
    pub async fn snapshot(&self) -> RwLockReadGuard<'_, Snapshot> {
        {
            let live = self.live.read().await;
            if live.loaded_at.elapsed() < self.max_age {
                return RwLockReadGuard::map(live, |l| &l.snapshot);
            }
        }
        self.reload_stale().await;
        RwLockReadGuard::map(self.live.read().await, |l| &l.snapshot)
    }

    /// Holds the write lock across the load so concurrent readers wait for one reload
    /// instead of each starting their own. A failed load keeps serving the old
    /// snapshot until the next TTL.
    async fn reload_stale(&self) {
        let mut live = self.live.write().await;
        if live.loaded_at.elapsed() < self.max_age {
            return;
        }
        match self.loader.load().await {
            Ok(fresh) => {
                info!(
                    listings = fresh.units.len(),
                    posts = fresh.posts.len(),
                    "stale snapshot reloaded"
                );
                live.snapshot = fresh;
            }
            Err(e) => warn!(error = %e, "snapshot reload failed, serving previous catalog"),
        }
        live.loaded_at = Instant::now();
    }

    pub async fn listing_page(&self, params: &SearchListingsParams) -> ListingPage {
        let snapshot = self.snapshot().await;
        snapshot.search_units(params, self.config.listing_page_size)
    }

    pub async fn blog_page(&self, params: &SearchBlogParams) -> BlogPage {
        let snapshot = self.snapshot().await;
        snapshot.search_posts(params, self.config.blog_page_size)
    }

    pub async fn find_listing(&self, id: &str) -> Option<AcUnit> {
        let snapshot = self.snapshot().await;
        snapshot.find_unit(id.trim()).cloned()
    }

    pub async fn find_post(&self, slug: &str) -> Option<BlogPost> {
        let snapshot = self.snapshot().await;
        snapshot.find_post(slug.trim()).cloned()
    }

    pub fn chat(&self, message: &str) -> ChatReplyResponse {
        match self.responder.matched_reply(message) {
            Some(reply) => ChatReplyResponse {
                reply: reply.to_string(),
                matched: true,
            },
            None => ChatReplyResponse {
                reply: self.responder.fallback(&mut rand::thread_rng()).to_string(),
                matched: false,
            },
        }
    }

    pub async fn inquiry(
        &self,
        listing_id: &str,
        customer_name: Option<&str>,
    ) -> Result<WhatsAppLinkResponse, AppError> {
        let unit = self
            .find_listing(listing_id)
            .await
            .ok_or_else(|| AppError::NotFound {
                kind: "listing",
                id: listing_id.trim().to_string(),
            })?;
        let message = whatsapp::listing_inquiry(&unit, customer_name);
        let url = whatsapp::chat_link(&self.config.whatsapp_number, &message)?;
        Ok(WhatsAppLinkResponse { url, message })
    }

    pub async fn refresh(&self) -> Result<RefreshCatalogResponse, AppError> {
        let fresh = self.loader.reload().await?;
        let response = RefreshCatalogResponse {
            listing_count: fresh.units.len(),
            post_count: fresh.posts.len(),
            testimonial_count: fresh.testimonials.len(),
            fingerprint: fresh.fingerprint(),
        };
        *self.live.write().await = LiveSnapshot::new(fresh);
        info!(
            listings = response.listing_count,
            posts = response.post_count,
            "in-memory snapshot replaced"
        );
        Ok(response)
    }

    async fn book(&self, params: &RequestBookingParams) -> Result<BookingResponse, AppError> {
        let customer_name = required(&params.customer_name, "customer_name")?;
        let service = required(&params.service, "service")?;
        let phone = whatsapp::normalize_phone(&params.phone)?;

        let row = NewBooking {
            customer_name,
            phone: &phone,
            service,
            address: non_blank(params.address.as_deref()),
            preferred_date: non_blank(params.preferred_date.as_deref()),
            notes: non_blank(params.notes.as_deref()),
            status: BookingStatus::Pending,
        };
        let booking: Booking = self.store.insert_row(Table::Bookings, &row).await?;
        info!(booking_id = %booking.id, service, "booking stored");

        let message = whatsapp::booking_request(
            &BookingRequest {
                customer_name,
                phone: &phone,
                service,
                address: row.address,
                preferred_date: row.preferred_date,
                notes: row.notes,
            },
            Some(&booking.id),
        );
        let url = whatsapp::chat_link(&self.config.whatsapp_number, &message)?;
        Ok(BookingResponse {
            booking_id: booking.id,
            status: booking.status,
            url,
            message,
        })
    }
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Invalid(format!("{field} must not be empty")));
    }
    Ok(trimmed)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[tool_router]
impl StorefrontServer {
    #[tool(description = "Search marketplace AC listings of one type ('for-sale' or 'wanted') with optional text search, price range, sort, and page.")]
    async fn search_listings(
        &self,
        Parameters(params): Parameters<SearchListingsParams>,
    ) -> Result<Json<ListingPage>, String> {
        if params.listing_type.trim().is_empty() {
            return Err("listing_type must not be empty".to_string());
        }
        Ok(Json(self.listing_page(&params).await))
    }

    #[tool(description = "Search blog posts in one category with optional text search, sort ('newest' or 'name-asc'), and page.")]
    async fn search_blog(
        &self,
        Parameters(params): Parameters<SearchBlogParams>,
    ) -> Result<Json<BlogPage>, String> {
        if params.category.trim().is_empty() {
            return Err("category must not be empty".to_string());
        }
        Ok(Json(self.blog_page(&params).await))
    }

    #[tool(description = "Get the full details of one marketplace listing by ID.")]
    async fn get_listing(
        &self,
        Parameters(params): Parameters<GetListingParams>,
    ) -> Result<Json<AcUnit>, String> {
        self.find_listing(&params.id)
            .await
            .map(Json)
            .ok_or_else(|| format!("listing not found: {}", params.id.trim()))
    }

    #[tool(description = "Get a published blog post by its slug.")]
    async fn get_post(
        &self,
        Parameters(params): Parameters<GetPostParams>,
    ) -> Result<Json<BlogPost>, String> {
        self.find_post(&params.slug)
            .await
            .map(Json)
            .ok_or_else(|| format!("post not found: {}", params.slug.trim()))
    }

    #[tool(description = "List the customer testimonials shown on the site.")]
    async fn list_testimonials(&self) -> Result<Json<TestimonialsResponse>, String> {
        let snapshot = self.snapshot().await;
        Ok(Json(TestimonialsResponse {
            testimonials: snapshot.testimonials.clone(),
        }))
    }

    #[tool(description = "Answer a chat-widget message with the matching canned reply.")]
    async fn chat_reply(
        &self,
        Parameters(params): Parameters<ChatReplyParams>,
    ) -> Result<Json<ChatReplyResponse>, String> {
        Ok(Json(self.chat(&params.message)))
    }

    #[tool(description = "Build a WhatsApp link with a pre-filled inquiry about one listing.")]
    async fn inquiry_link(
        &self,
        Parameters(params): Parameters<InquiryLinkParams>,
    ) -> Result<Json<WhatsAppLinkResponse>, String> {
        self.inquiry(&params.listing_id, params.customer_name.as_deref())
            .await
            .map(Json)
            .map_err(|e| match e {
                AppError::NotFound { .. } => e.to_string(),
                other => format!("inquiry link failed: {other}"),
            })
    }

    #[tool(description = "Build a WhatsApp link with a pre-filled service quote request.")]
    async fn quote_link(
        &self,
        Parameters(params): Parameters<QuoteLinkParams>,
    ) -> Result<Json<WhatsAppLinkResponse>, String> {
        let service = params.service.trim();
        if service.is_empty() {
            return Err("service must not be empty".to_string());
        }
        let message = whatsapp::quote_request(&QuoteRequest {
            service,
            name: params.name.as_deref(),
            location: params.location.as_deref(),
            tonnage: params.tonnage,
            units: params.units,
        });
        let url = whatsapp::chat_link(&self.config.whatsapp_number, &message)
            .map_err(|e| format!("quote link failed: {e}"))?;
        Ok(Json(WhatsAppLinkResponse { url, message }))
    }

    #[tool(description = "Record a pending service booking and return a WhatsApp link that confirms it with the team.")]
    async fn request_booking(
        &self,
        Parameters(params): Parameters<RequestBookingParams>,
    ) -> Result<Json<BookingResponse>, String> {
        self.book(&params)
            .await
            .map(Json)
            .map_err(|e| format!("booking failed: {e}"))
    }

    #[tool(description = "Re-fetch listings, blog posts, and testimonials from the store.")]
    async fn refresh_catalog(&self) -> Result<Json<RefreshCatalogResponse>, String> {
        info!("refresh_catalog tool invoked");
        self.refresh()
            .await
            .map(Json)
            .map_err(|e| format!("refresh failed: {e}"))
    }
}

#[tool_handler]
impl ServerHandler for StorefrontServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "storefront".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "AC marketplace storefront. Use search_listings for for-sale/wanted units and \
                 search_blog for articles; page numbers should go back to 1 whenever search, \
                 filter, or sort change. get_listing and get_post return full records. \
                 chat_reply answers common questions, and inquiry_link, quote_link, and \
                 request_booking hand the customer over to WhatsApp."
                    .to_string(),
            ),
        }
    }
}

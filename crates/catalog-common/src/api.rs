use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::listing::{AcUnit, BlogPost, BookingStatus, Table, Testimonial};
use crate::whatsapp::format_price;

// --- storefront parameters ---

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchListingsParams {
    /// `for-sale` or `wanted`.
    pub listing_type: String,
    /// Matched case-insensitively against title and brand.
    pub search: Option<String>,
    /// One of `all`, `under-100k`, `100k-200k`, `over-200k` (default `all`).
    pub price_range: Option<String>,
    /// One of `newest`, `price-low`, `price-high`, `name-asc` (default `newest`).
    pub sort: Option<String>,
    /// 1-based page number (default 1). Reset to 1 whenever a filter changes.
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchBlogParams {
    /// Blog category such as "maintenance" or "buying-guide".
    pub category: String,
    pub search: Option<String>,
    /// `newest` or `name-asc` (default `newest`).
    pub sort: Option<String>,
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetListingParams {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetPostParams {
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ChatReplyParams {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct InquiryLinkParams {
    pub listing_id: String,
    pub customer_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QuoteLinkParams {
    /// e.g. "installation", "gas refill", "general service".
    pub service: String,
    pub name: Option<String>,
    pub location: Option<String>,
    /// Capacity in tons.
    pub tonnage: Option<f64>,
    pub units: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RequestBookingParams {
    pub customer_name: String,
    pub phone: String,
    pub service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// --- storefront responses ---

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListingSummary {
    pub id: String,
    pub title: String,
    pub brand: Option<String>,
    pub price: Option<f64>,
    /// Display form, e.g. "Rs. 95,000".
    pub price_label: Option<String>,
    pub tonnage: Option<f64>,
    pub condition: Option<String>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub listing_type: String,
}

impl From<&AcUnit> for ListingSummary {
    fn from(unit: &AcUnit) -> Self {
        Self {
            id: unit.id.clone(),
            title: unit.title.clone(),
            brand: unit.brand.clone(),
            price: unit.price,
            price_label: unit.price.map(format_price),
            tonnage: unit.tonnage,
            condition: unit.condition.clone(),
            location: unit.location.clone(),
            image_url: unit.image_url.clone(),
            listing_type: unit.listing_type.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListingPage {
    pub listing_type: String,
    pub sort: String,
    pub price_range: String,
    pub items: Vec<ListingSummary>,
    pub total_count: usize,
    pub total_pages: usize,
    pub page_number: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BlogSummary {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub category: String,
    pub author: Option<String>,
    pub image_url: Option<String>,
    pub created_at: Option<String>,
}

impl From<&BlogPost> for BlogSummary {
    fn from(post: &BlogPost) -> Self {
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
            slug: post.slug.clone(),
            excerpt: post.excerpt.clone(),
            category: post.category.clone(),
            author: post.author.clone(),
            image_url: post.image_url.clone(),
            created_at: post.created_at.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BlogPage {
    pub category: String,
    pub sort: String,
    pub items: Vec<BlogSummary>,
    pub total_count: usize,
    pub total_pages: usize,
    pub page_number: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TestimonialsResponse {
    pub testimonials: Vec<Testimonial>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChatReplyResponse {
    pub reply: String,
    /// `false` when the reply came from the fallback list.
    pub matched: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WhatsAppLinkResponse {
    pub url: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BookingResponse {
    pub booking_id: String,
    pub status: BookingStatus,
    pub url: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RefreshCatalogResponse {
    pub listing_count: usize,
    pub post_count: usize,
    pub testimonial_count: usize,
    /// Changes whenever the listing snapshot changes.
    pub fingerprint: String,
}

// --- backoffice parameters ---

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListRecordsParams {
    pub table: Table,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DeleteRecordParams {
    pub table: Table,
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AcUnitInput {
    pub title: String,
    /// `for-sale` or `wanted`.
    pub listing_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tonnage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Only the fields present are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AcUnitPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tonnage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateAcUnitParams {
    pub id: String,
    pub patch: AcUnitPatch,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BlogPostInput {
    pub title: String,
    pub category: String,
    pub content: String,
    /// Derived from the title when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct BlogPostPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateBlogPostParams {
    pub id: String,
    pub patch: BlogPostPatch,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TestimonialInput {
    pub name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// 1 to 5.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateBookingStatusParams {
    pub id: String,
    pub status: BookingStatus,
}

// --- backoffice responses ---

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RecordsResponse {
    pub table: Table,
    pub count: usize,
    pub rows: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DeleteRecordResponse {
    pub table: Table,
    pub id: String,
    pub deleted: bool,
}

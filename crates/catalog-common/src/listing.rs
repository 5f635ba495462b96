use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Capabilities the query engine needs from a record.
///
/// AC units and blog posts carry different fields; anything that can name its
/// title, partition, and optionally a secondary search field and a numeric sort
/// field can be searched, filtered, sorted, and paged.
pub trait Listing {
    fn title(&self) -> &str;

    /// Partition this record belongs to (`for-sale`/`wanted`, or a blog category).
    fn category(&self) -> &str;

    fn secondary_search_field(&self) -> Option<&str> {
        None
    }

    fn numeric_sort_field(&self) -> Option<f64> {
        None
    }
}

pub const FOR_SALE: &str = "for-sale";
pub const WANTED: &str = "wanted";

/// A marketplace listing, either a unit offered for sale or a unit someone wants to buy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AcUnit {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub brand: Option<String>,
    /// Asking (or offered) price in PKR.
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub tonnage: Option<f64>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    /// `for-sale` or `wanted`.
    pub listing_type: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Listing for AcUnit {
    fn title(&self) -> &str {
        &self.title
    }

    fn category(&self) -> &str {
        &self.listing_type
    }

    fn secondary_search_field(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    fn numeric_sort_field(&self) -> Option<f64> {
        self.price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: String,
    pub category: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub published: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Listing for BlogPost {
    fn title(&self) -> &str {
        &self.title
    }

    fn category(&self) -> &str {
        &self.category
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Testimonial {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    /// 1 to 5 stars.
    #[serde(default)]
    pub rating: Option<u8>,
    pub message: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Booking {
    pub id: String,
    pub customer_name: String,
    pub phone: String,
    pub service: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub preferred_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: BookingStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Tables in the hosted store, by their REST resource name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    AcUnits,
    BlogPosts,
    Testimonials,
    Bookings,
}

impl Table {
    pub const ALL: [Table; 4] = [
        Table::AcUnits,
        Table::BlogPosts,
        Table::Testimonials,
        Table::Bookings,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::AcUnits => "ac_units",
            Table::BlogPosts => "blog_posts",
            Table::Testimonials => "testimonials",
            Table::Bookings => "bookings",
        }
    }

    /// Column the public site filters on so hidden rows never reach a snapshot.
    pub fn visibility_filter(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Table::AcUnits | Table::Testimonials => Some(("is_active", "eq.true")),
            Table::BlogPosts => Some(("published", "eq.true")),
            Table::Bookings => None,
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ac_unit_row_with_sparse_columns_deserializes() {
        let row = r#"{"id":"u1","title":"Crown Inverter AC","listing_type":"for-sale"}"#;
        let unit: AcUnit = serde_json::from_str(row).unwrap();
        assert_eq!(unit.category(), FOR_SALE);
        assert!(unit.is_active);
        assert_eq!(unit.secondary_search_field(), None);
        assert_eq!(unit.numeric_sort_field(), None);
    }

    #[test]
    fn blog_post_has_no_secondary_or_numeric_field() {
        let row = r#"{"id":"p1","title":"Summer tips","slug":"summer-tips","category":"maintenance"}"#;
        let post: BlogPost = serde_json::from_str(row).unwrap();
        assert_eq!(post.category(), "maintenance");
        assert!(post.secondary_search_field().is_none());
        assert!(post.numeric_sort_field().is_none());
        assert!(post.published);
    }

    #[test]
    fn table_names_match_serde_names() {
        for table in Table::ALL {
            let json = serde_json::to_string(&table).unwrap();
            assert_eq!(json, format!("\"{}\"", table.name()));
        }
    }

    #[test]
    fn booking_status_round_trips_as_lowercase() {
        let status: BookingStatus = serde_json::from_str("\"confirmed\"").unwrap();
        assert_eq!(status, BookingStatus::Confirmed);
        assert_eq!(status.as_str(), "confirmed");
    }
}

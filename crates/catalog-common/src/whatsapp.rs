/// WhatsApp hand-off: phone normalization, `wa.me` links, and the pre-filled
/// messages the site sends for listing inquiries, quotes, and bookings.
use std::sync::OnceLock;

use regex::Regex;
use reqwest::Url;

use crate::error::CommonError;
use crate::listing::{AcUnit, WANTED};

const WA_BASE: &str = "https://wa.me/";
const COUNTRY_CODE: &str = "92";
const MIN_DIGITS: usize = 10;

fn non_digits() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\D+").expect("valid regex"))
}

/// Digits-only international form. Local numbers (`03xx...`) get the `92` prefix.
pub fn normalize_phone(raw: &str) -> Result<String, CommonError> {
    let digits = non_digits().replace_all(raw, "");
    let digits = digits.trim_start_matches("00");
    let normalized = match digits.strip_prefix('0') {
        Some(local) => format!("{COUNTRY_CODE}{local}"),
        None => digits.to_string(),
    };
    if normalized.len() < MIN_DIGITS {
        return Err(CommonError::InvalidPhone(raw.to_string()));
    }
    Ok(normalized)
}

pub fn chat_link(phone: &str, text: &str) -> Result<String, CommonError> {
    let phone = normalize_phone(phone)?;
    let url = Url::parse_with_params(&format!("{WA_BASE}{phone}"), &[("text", text)])
        .map_err(|_| CommonError::InvalidPhone(phone.clone()))?;
    Ok(url.to_string())
}

/// `Rs. 55,000` style formatting. Fractions are dropped.
pub fn format_price(price: f64) -> String {
    let whole = price.max(0.0).round() as u64;
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    format!("Rs. {out}")
}

pub fn listing_inquiry(unit: &AcUnit, customer_name: Option<&str>) -> String {
    let mut lines = Vec::new();
    let greeting = match customer_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!("Hi, this is {name}."),
        None => "Hi,".to_string(),
    };
    lines.push(greeting);

    if unit.listing_type == WANTED {
        lines.push(format!("I have an AC that matches your request \"{}\".", unit.title));
    } else {
        lines.push(format!("I'm interested in \"{}\".", unit.title));
    }
    if let Some(brand) = unit.brand.as_deref().filter(|b| !b.is_empty()) {
        lines.push(format!("Brand: {brand}"));
    }
    if let Some(price) = unit.price {
        lines.push(format!("Price: {}", format_price(price)));
    }
    lines.push(format!("Listing ID: {}", unit.id));
    lines.push("Is it still available?".to_string());
    lines.join("\n")
}

#[derive(Debug, Clone, Default)]
pub struct QuoteRequest<'a> {
    pub service: &'a str,
    pub name: Option<&'a str>,
    pub location: Option<&'a str>,
    pub tonnage: Option<f64>,
    pub units: Option<u32>,
}

pub fn quote_request(req: &QuoteRequest<'_>) -> String {
    let mut lines = vec![format!("Hi, I'd like a quote for {}.", req.service.trim())];
    if let Some(tonnage) = req.tonnage {
        lines.push(format!("Capacity: {tonnage} ton"));
    }
    if let Some(units) = req.units {
        lines.push(format!("Number of units: {units}"));
    }
    push_optional(&mut lines, "Location", req.location);
    push_optional(&mut lines, "Name", req.name);
    lines.join("\n")
}

#[derive(Debug, Clone, Default)]
pub struct BookingRequest<'a> {
    pub customer_name: &'a str,
    pub phone: &'a str,
    pub service: &'a str,
    pub address: Option<&'a str>,
    pub preferred_date: Option<&'a str>,
    pub notes: Option<&'a str>,
}

pub fn booking_request(req: &BookingRequest<'_>, reference: Option<&str>) -> String {
    let mut lines = vec![
        format!("Hi, I'd like to book {}.", req.service.trim()),
        format!("Name: {}", req.customer_name.trim()),
        format!("Phone: {}", req.phone.trim()),
    ];
    push_optional(&mut lines, "Address", req.address);
    push_optional(&mut lines, "Preferred date", req.preferred_date);
    push_optional(&mut lines, "Notes", req.notes);
    push_optional(&mut lines, "Booking reference", reference);
    lines.join("\n")
}

fn push_optional(lines: &mut Vec<String>, label: &str, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
        lines.push(format!("{label}: {value}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> AcUnit {
        AcUnit {
            id: "u-42".to_string(),
            title: "Crown Inverter AC".to_string(),
            brand: Some("Gree".to_string()),
            price: Some(95_000.0),
            tonnage: Some(1.5),
            condition: None,
            location: None,
            description: None,
            image_url: None,
            contact_name: None,
            contact_phone: None,
            listing_type: "for-sale".to_string(),
            is_active: true,
            created_at: None,
        }
    }

    #[test]
    fn local_numbers_get_country_code() {
        assert_eq!(normalize_phone("0300-1234567").unwrap(), "923001234567");
        assert_eq!(normalize_phone("+92 300 1234567").unwrap(), "923001234567");
        assert_eq!(normalize_phone("0092 300 1234567").unwrap(), "923001234567");
    }

    #[test]
    fn short_numbers_are_rejected() {
        assert!(matches!(normalize_phone("12345"), Err(CommonError::InvalidPhone(_))));
        assert!(normalize_phone("").is_err());
    }

    #[test]
    fn chat_link_encodes_message() {
        let link = chat_link("0300 1234567", "Hi & bye\nline two").unwrap();
        assert!(link.starts_with("https://wa.me/923001234567?text="));
        assert!(!link.contains(' '));
        assert!(!link.contains('\n'));
        assert!(link.contains("%26"));
    }

    #[test]
    fn prices_use_thousands_separators() {
        assert_eq!(format_price(55_000.0), "Rs. 55,000");
        assert_eq!(format_price(1_250_000.0), "Rs. 1,250,000");
        assert_eq!(format_price(950.0), "Rs. 950");
    }

    #[test]
    fn inquiry_mentions_listing_details() {
        let text = listing_inquiry(&unit(), Some("Ali"));
        assert!(text.starts_with("Hi, this is Ali."));
        assert!(text.contains("\"Crown Inverter AC\""));
        assert!(text.contains("Brand: Gree"));
        assert!(text.contains("Price: Rs. 95,000"));
        assert!(text.contains("Listing ID: u-42"));
    }

    #[test]
    fn inquiry_for_wanted_listing_offers_a_unit() {
        let mut wanted = unit();
        wanted.listing_type = WANTED.to_string();
        wanted.price = None;
        let text = listing_inquiry(&wanted, None);
        assert!(text.contains("matches your request"));
        assert!(!text.contains("Price:"));
    }

    #[test]
    fn quote_and_booking_skip_blank_fields() {
        let quote = quote_request(&QuoteRequest {
            service: "installation",
            tonnage: Some(1.5),
            location: Some("  "),
            ..Default::default()
        });
        assert_eq!(quote, "Hi, I'd like a quote for installation.\nCapacity: 1.5 ton");

        let booking = booking_request(
            &BookingRequest {
                customer_name: "Sara",
                phone: "0300 1234567",
                service: "gas refill",
                preferred_date: Some("2026-06-01"),
                ..Default::default()
            },
            Some("b-7"),
        );
        assert!(booking.contains("Preferred date: 2026-06-01"));
        assert!(booking.contains("Booking reference: b-7"));
        assert!(!booking.contains("Address"));
    }
}

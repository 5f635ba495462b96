/// Input checks for back-office writes. Each function returns the cleaned value
/// that is actually sent to the store.
use std::sync::OnceLock;

use regex::Regex;

use catalog_common::api::{AcUnitInput, AcUnitPatch, BlogPostInput, BlogPostPatch, TestimonialInput};
use catalog_common::listing::{FOR_SALE, WANTED};
use catalog_common::whatsapp::normalize_phone;

use crate::error::AppError;

fn slug_separator() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"))
}

/// `"Why Your AC Drips!"` -> `"why-your-ac-drips"`.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    slug_separator()
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

pub fn ac_unit(mut input: AcUnitInput) -> Result<AcUnitInput, AppError> {
    input.title = non_empty(&input.title, "title")?;
    input.listing_type = listing_type(&input.listing_type)?;
    check_price(input.price)?;
    check_tonnage(input.tonnage)?;
    input.brand = trimmed(input.brand);
    input.contact_phone = phone(input.contact_phone)?;
    Ok(input)
}

pub fn ac_unit_patch(mut patch: AcUnitPatch) -> Result<AcUnitPatch, AppError> {
    if let Some(title) = &patch.title {
        patch.title = Some(non_empty(title, "title")?);
    }
    if let Some(kind) = &patch.listing_type {
        patch.listing_type = Some(listing_type(kind)?);
    }
    check_price(patch.price)?;
    check_tonnage(patch.tonnage)?;
    ensure_not_empty(&patch)?;
    Ok(patch)
}

pub fn blog_post(mut input: BlogPostInput) -> Result<BlogPostInput, AppError> {
    input.title = non_empty(&input.title, "title")?;
    input.category = non_empty(&input.category, "category")?.to_lowercase();
    input.content = non_empty(&input.content, "content")?;
    let slug = match input.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(given) => slugify(given),
        None => slugify(&input.title),
    };
    if slug.is_empty() {
        return Err(AppError::Invalid(
            "slug must contain at least one letter or digit".to_string(),
        ));
    }
    input.slug = Some(slug);
    Ok(input)
}

/// Renaming a post keeps its slug unless a new one is given, so links stay valid.
pub fn blog_post_patch(mut patch: BlogPostPatch) -> Result<BlogPostPatch, AppError> {
    if let Some(title) = &patch.title {
        patch.title = Some(non_empty(title, "title")?);
    }
    if let Some(category) = &patch.category {
        patch.category = Some(non_empty(category, "category")?.to_lowercase());
    }
    if let Some(content) = &patch.content {
        patch.content = Some(non_empty(content, "content")?);
    }
    if let Some(slug) = &patch.slug {
        let slug = slugify(slug);
        if slug.is_empty() {
            return Err(AppError::Invalid(
                "slug must contain at least one letter or digit".to_string(),
            ));
        }
        patch.slug = Some(slug);
    }
    ensure_not_empty(&patch)?;
    Ok(patch)
}

pub fn testimonial(mut input: TestimonialInput) -> Result<TestimonialInput, AppError> {
    input.name = non_empty(&input.name, "name")?;
    input.message = non_empty(&input.message, "message")?;
    if let Some(rating) = input.rating {
        if !(1..=5).contains(&rating) {
            return Err(AppError::Invalid(format!("rating must be 1 to 5, got {rating}")));
        }
    }
    input.location = trimmed(input.location);
    Ok(input)
}

fn non_empty(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Invalid(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn listing_type(value: &str) -> Result<String, AppError> {
    let normalized = value.trim().to_lowercase();
    if normalized == FOR_SALE || normalized == WANTED {
        Ok(normalized)
    } else {
        Err(AppError::Invalid(format!(
            "listing_type must be '{FOR_SALE}' or '{WANTED}', got '{}'",
            value.trim()
        )))
    }
}

fn check_price(price: Option<f64>) -> Result<(), AppError> {
    match price {
        Some(p) if !p.is_finite() || p < 0.0 => Err(AppError::Invalid(format!(
            "price must be a non-negative amount, got {p}"
        ))),
        _ => Ok(()),
    }
}

fn check_tonnage(tonnage: Option<f64>) -> Result<(), AppError> {
    match tonnage {
        Some(t) if !t.is_finite() || t <= 0.0 => Err(AppError::Invalid(format!(
            "tonnage must be positive, got {t}"
        ))),
        _ => Ok(()),
    }
}

fn phone(value: Option<String>) -> Result<Option<String>, AppError> {
    match trimmed(value) {
        Some(raw) => Ok(Some(normalize_phone(&raw)?)),
        None => Ok(None),
    }
}

/// A patch that serializes to `{}` would be a no-op write.
fn ensure_not_empty<T: serde::Serialize>(patch: &T) -> Result<(), AppError> {
    let value = serde_json::to_value(patch).map_err(|e| AppError::Invalid(e.to_string()))?;
    match value.as_object() {
        Some(fields) if !fields.is_empty() => Ok(()),
        _ => Err(AppError::Invalid("patch must set at least one field".to_string())),
    }
}

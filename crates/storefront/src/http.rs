//! JSON HTTP API for the website front end. Serves the same snapshot as the MCP tools.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use catalog_common::api::{ChatReplyParams, InquiryLinkParams, SearchBlogParams, SearchListingsParams};

use crate::error::AppError;
use crate::server::StorefrontServer;

pub fn router(server: StorefrontServer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/listings", get(listings))
        .route("/api/listings/{id}", get(listing))
        .route("/api/listings/{id}/inquiry", get(inquiry))
        .route("/api/blog", get(blog))
        .route("/api/blog/{slug}", get(post_by_slug))
        .route("/api/chat", post(chat))
        .with_state(server)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

async fn listings(
    State(server): State<StorefrontServer>,
    Query(params): Query<SearchListingsParams>,
) -> Response {
    if params.listing_type.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "listing_type must not be empty");
    }
    Json(server.listing_page(&params).await).into_response()
}

async fn listing(State(server): State<StorefrontServer>, Path(id): Path<String>) -> Response {
    match server.find_listing(&id).await {
        Some(unit) => Json(unit).into_response(),
        None => error_response(StatusCode::NOT_FOUND, &format!("listing not found: {id}")),
    }
}

#[derive(Debug, serde::Deserialize)]
struct InquiryQuery {
    name: Option<String>,
}

async fn inquiry(
    State(server): State<StorefrontServer>,
    Path(id): Path<String>,
    Query(query): Query<InquiryQuery>,
) -> Response {
    let params = InquiryLinkParams {
        listing_id: id,
        customer_name: query.name,
    };
    match server
        .inquiry(&params.listing_id, params.customer_name.as_deref())
        .await
    {
        Ok(link) => Json(link).into_response(),
        Err(e) => error_response(status_for(&e), &e.to_string()),
    }
}

async fn blog(
    State(server): State<StorefrontServer>,
    Query(params): Query<SearchBlogParams>,
) -> Response {
    if params.category.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "category must not be empty");
    }
    Json(server.blog_page(&params).await).into_response()
}

async fn post_by_slug(State(server): State<StorefrontServer>, Path(slug): Path<String>) -> Response {
    match server.find_post(&slug).await {
        Some(post) => Json(post).into_response(),
        None => error_response(StatusCode::NOT_FOUND, &format!("post not found: {slug}")),
    }
}

async fn chat(
    State(server): State<StorefrontServer>,
    Json(body): Json<ChatReplyParams>,
) -> Json<catalog_common::api::ChatReplyResponse> {
    Json(server.chat(&body.message))
}

fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::Invalid(_) => StatusCode::BAD_REQUEST,
        AppError::Config(_) | AppError::Store(_) | AppError::Common(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

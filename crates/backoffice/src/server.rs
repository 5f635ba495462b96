/// MCP server for the admin back-office.
///
/// Every tool is a validated pass-through to the hosted store. Writes to tables the
/// storefront snapshots (listings, posts, testimonials) drop the snapshot cache so
/// the storefront's next load re-fetches.
use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use serde_json::json;
use tracing::info;

use catalog_common::api::{
    AcUnitInput, BlogPostInput, DeleteRecordParams, DeleteRecordResponse, ListRecordsParams,
    RecordsResponse, TestimonialInput, UpdateAcUnitParams, UpdateBlogPostParams,
    UpdateBookingStatusParams,
};
use catalog_common::cache::SnapshotCache;
use catalog_common::listing::{AcUnit, BlogPost, Booking, Table, Testimonial};
use catalog_common::store::StoreClient;

use crate::error::AppError;
use crate::validate;

#[derive(Clone)]
pub struct BackofficeServer {
    store: Arc<StoreClient>,
    cache: SnapshotCache,
    tool_router: ToolRouter<BackofficeServer>,
}

impl BackofficeServer {
    pub fn new(store: Arc<StoreClient>, cache: SnapshotCache) -> Self {
        Self {
            store,
            cache,
            tool_router: Self::tool_router(),
        }
    }

    async fn after_write(&self, table: Table, id: &str, action: &str) {
        info!(table = table.name(), id, action, "record written");
        if snapshot_table(table) {
            self.cache.invalidate_all().await;
        }
    }
}

/// Tables the storefront keeps in its in-memory snapshot.
fn snapshot_table(table: Table) -> bool {
    !matches!(table, Table::Bookings)
}

fn tool_error(action: &str, err: AppError) -> String {
    format!("{action} failed: {err}")
}

#[tool_router]
impl BackofficeServer {
    #[tool(description = "List every row of a table (ac_units, blog_posts, testimonials, bookings), newest first, including hidden rows.")]
    async fn list_records(
        &self,
        Parameters(params): Parameters<ListRecordsParams>,
    ) -> Result<Json<RecordsResponse>, String> {
        let rows: Vec<serde_json::Value> = self
            .store
            .fetch_rows(params.table, &[])
            .await
            .map_err(|e| tool_error("list", e.into()))?;
        Ok(Json(RecordsResponse {
            table: params.table,
            count: rows.len(),
            rows,
        }))
    }

    #[tool(description = "Create a marketplace listing ('for-sale' or 'wanted').")]
    async fn create_ac_unit(
        &self,
        Parameters(input): Parameters<AcUnitInput>,
    ) -> Result<Json<AcUnit>, String> {
        let input = validate::ac_unit(input).map_err(|e| tool_error("create", e))?;
        let unit: AcUnit = self
            .store
            .insert_row(Table::AcUnits, &input)
            .await
            .map_err(|e| tool_error("create", e.into()))?;
        self.after_write(Table::AcUnits, &unit.id, "create").await;
        Ok(Json(unit))
    }

    #[tool(description = "Update fields of a marketplace listing. Only fields present in the patch change; set is_active=false to hide it.")]
    async fn update_ac_unit(
        &self,
        Parameters(params): Parameters<UpdateAcUnitParams>,
    ) -> Result<Json<AcUnit>, String> {
        let patch = validate::ac_unit_patch(params.patch).map_err(|e| tool_error("update", e))?;
        let unit: AcUnit = self
            .store
            .update_row(Table::AcUnits, params.id.trim(), &patch)
            .await
            .map_err(|e| tool_error("update", e.into()))?;
        self.after_write(Table::AcUnits, &unit.id, "update").await;
        Ok(Json(unit))
    }

    #[tool(description = "Create a blog post. The slug is derived from the title when omitted.")]
    async fn create_blog_post(
        &self,
        Parameters(input): Parameters<BlogPostInput>,
    ) -> Result<Json<BlogPost>, String> {
        let input = validate::blog_post(input).map_err(|e| tool_error("create", e))?;
        let post: BlogPost = self
            .store
            .insert_row(Table::BlogPosts, &input)
            .await
            .map_err(|e| tool_error("create", e.into()))?;
        self.after_write(Table::BlogPosts, &post.id, "create").await;
        Ok(Json(post))
    }

    #[tool(description = "Update fields of a blog post. Renaming keeps the slug unless a new slug is given.")]
    async fn update_blog_post(
        &self,
        Parameters(params): Parameters<UpdateBlogPostParams>,
    ) -> Result<Json<BlogPost>, String> {
        let patch = validate::blog_post_patch(params.patch).map_err(|e| tool_error("update", e))?;
        let post: BlogPost = self
            .store
            .update_row(Table::BlogPosts, params.id.trim(), &patch)
            .await
            .map_err(|e| tool_error("update", e.into()))?;
        self.after_write(Table::BlogPosts, &post.id, "update").await;
        Ok(Json(post))
    }

    #[tool(description = "Add a customer testimonial.")]
    async fn create_testimonial(
        &self,
        Parameters(input): Parameters<TestimonialInput>,
    ) -> Result<Json<Testimonial>, String> {
        let input = validate::testimonial(input).map_err(|e| tool_error("create", e))?;
        let testimonial: Testimonial = self
            .store
            .insert_row(Table::Testimonials, &input)
            .await
            .map_err(|e| tool_error("create", e.into()))?;
        self.after_write(Table::Testimonials, &testimonial.id, "create").await;
        Ok(Json(testimonial))
    }

    #[tool(description = "Move a booking to pending, confirmed, completed, or cancelled.")]
    async fn update_booking_status(
        &self,
        Parameters(params): Parameters<UpdateBookingStatusParams>,
    ) -> Result<Json<Booking>, String> {
        let id = params.id.trim();
        if id.is_empty() {
            return Err("id must not be empty".to_string());
        }
        let booking: Booking = self
            .store
            .update_row(Table::Bookings, id, &json!({ "status": params.status }))
            .await
            .map_err(|e| tool_error("update", e.into()))?;
        self.after_write(Table::Bookings, &booking.id, params.status.as_str())
            .await;
        Ok(Json(booking))
    }

    #[tool(description = "Permanently delete a row from a table by ID.")]
    async fn delete_record(
        &self,
        Parameters(params): Parameters<DeleteRecordParams>,
    ) -> Result<Json<DeleteRecordResponse>, String> {
        let id = params.id.trim().to_string();
        if id.is_empty() {
            return Err("id must not be empty".to_string());
        }
        let deleted = self
            .store
            .delete_row(params.table, &id)
            .await
            .map_err(|e| tool_error("delete", e.into()))?;
        if deleted {
            self.after_write(params.table, &id, "delete").await;
        }
        Ok(Json(DeleteRecordResponse {
            table: params.table,
            id,
            deleted,
        }))
    }
}

#[tool_handler]
impl ServerHandler for BackofficeServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "backoffice".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "AC marketplace back-office. Use list_records to browse a table, the create_* \
                 and update_* tools to manage listings, blog posts, and testimonials, \
                 update_booking_status to work the booking queue, and delete_record to remove \
                 rows. Changes reach the storefront on its next catalog load."
                    .to_string(),
            ),
        }
    }
}

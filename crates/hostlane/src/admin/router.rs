use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::DestinationInput;
use crate::api::{failure, reply, AppServices, Caller};
use crate::backend::{PropertyFilter, UserFilter};
use crate::listings::domain::{DestinationId, PropertyId, UserId, UserRole};
use crate::listings::PropertyLimits;
use crate::platform::PlatformSettings;

/// Router exposing the admin dashboard endpoints.
pub fn admin_router(services: AppServices) -> Router {
    Router::new()
        .route("/api/v1/admin/stats", get(stats_handler))
        .route("/api/v1/admin/users", get(users_handler))
        .route("/api/v1/admin/users/:user_id/role", put(role_handler))
        .route("/api/v1/admin/properties", get(properties_handler))
        .route("/api/v1/admin/properties/export", get(export_handler))
        .route(
            "/api/v1/admin/properties/:property_id",
            get(property_handler).delete(delete_property_handler),
        )
        .route(
            "/api/v1/admin/properties/:property_id/review",
            post(review_handler),
        )
        .route(
            "/api/v1/admin/properties/:property_id/approve",
            post(approve_handler),
        )
        .route(
            "/api/v1/admin/properties/:property_id/reject",
            post(reject_handler),
        )
        .route(
            "/api/v1/admin/properties/:property_id/featured",
            put(featured_handler),
        )
        .route(
            "/api/v1/admin/settings",
            get(settings_handler).put(update_settings_handler),
        )
        .route(
            "/api/v1/admin/limits",
            get(limits_handler).put(update_limits_handler),
        )
        .route(
            "/api/v1/admin/limits/hosts/:host_id",
            get(host_check_handler)
                .put(set_override_handler)
                .delete(clear_override_handler),
        )
        .route(
            "/api/v1/admin/destinations",
            get(destinations_handler).post(create_destination_handler),
        )
        .route(
            "/api/v1/admin/destinations/reorder",
            put(reorder_handler),
        )
        .route(
            "/api/v1/admin/destinations/:destination_id",
            put(update_destination_handler).delete(delete_destination_handler),
        )
        .route(
            "/api/v1/admin/destinations/:destination_id/toggle",
            post(toggle_destination_handler),
        )
        .with_state(services)
}

#[derive(Debug, Deserialize)]
pub(crate) struct RoleRequest {
    role: UserRole,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RejectRequest {
    reason: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeaturedRequest {
    featured: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OverrideRequest {
    max_properties: u32,
    #[serde(default)]
    note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReorderRequest {
    ids: Vec<DestinationId>,
}

pub(crate) async fn stats_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
) -> Response {
    reply(
        services.admin.dashboard_stats(caller, Utc::now()).await,
        StatusCode::OK,
    )
}

pub(crate) async fn users_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
    Query(filter): Query<UserFilter>,
) -> Response {
    reply(
        services.admin.list_users(caller, &filter).await,
        StatusCode::OK,
    )
}

pub(crate) async fn role_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
    Path(user_id): Path<UserId>,
    Json(request): Json<RoleRequest>,
) -> Response {
    reply(
        services.admin.set_role(caller, user_id, request.role).await,
        StatusCode::OK,
    )
}

pub(crate) async fn properties_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
    Query(filter): Query<PropertyFilter>,
) -> Response {
    reply(
        services.admin.list_properties(caller, &filter).await,
        StatusCode::OK,
    )
}

pub(crate) async fn export_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
    Query(filter): Query<PropertyFilter>,
) -> Response {
    match services.admin.export_csv(caller, &filter).await {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"properties.csv\"",
                ),
            ],
            csv,
        )
            .into_response(),
        Err(err) => failure(err),
    }
}

pub(crate) async fn property_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
    Path(property_id): Path<PropertyId>,
) -> Response {
    reply(
        services.admin.property_detail(caller, property_id).await,
        StatusCode::OK,
    )
}

pub(crate) async fn delete_property_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
    Path(property_id): Path<PropertyId>,
) -> Response {
    let result = services
        .admin
        .delete_property(caller, property_id)
        .await
        .map(|()| json!({ "id": property_id }));
    reply(result, StatusCode::OK)
}

pub(crate) async fn review_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
    Path(property_id): Path<PropertyId>,
) -> Response {
    reply(
        services.admin.start_review(caller, property_id).await,
        StatusCode::OK,
    )
}

pub(crate) async fn approve_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
    Path(property_id): Path<PropertyId>,
) -> Response {
    reply(
        services.admin.approve(caller, property_id).await,
        StatusCode::OK,
    )
}

pub(crate) async fn reject_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
    Path(property_id): Path<PropertyId>,
    Json(request): Json<RejectRequest>,
) -> Response {
    reply(
        services
            .admin
            .reject(caller, property_id, request.reason)
            .await,
        StatusCode::OK,
    )
}

pub(crate) async fn featured_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
    Path(property_id): Path<PropertyId>,
    Json(request): Json<FeaturedRequest>,
) -> Response {
    reply(
        services
            .admin
            .set_featured(caller, property_id, request.featured)
            .await,
        StatusCode::OK,
    )
}

pub(crate) async fn settings_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
) -> Response {
    reply(services.admin.get_settings(caller).await, StatusCode::OK)
}

pub(crate) async fn update_settings_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
    Json(settings): Json<PlatformSettings>,
) -> Response {
    reply(
        services.admin.update_settings(caller, settings).await,
        StatusCode::OK,
    )
}

pub(crate) async fn limits_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
) -> Response {
    reply(services.admin.get_limits(caller).await, StatusCode::OK)
}

pub(crate) async fn update_limits_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
    Json(limits): Json<PropertyLimits>,
) -> Response {
    reply(
        services.admin.update_limits(caller, limits).await,
        StatusCode::OK,
    )
}

pub(crate) async fn host_check_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
    Path(host_id): Path<UserId>,
) -> Response {
    reply(
        services.admin.host_limit_check(caller, host_id).await,
        StatusCode::OK,
    )
}

pub(crate) async fn set_override_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
    Path(host_id): Path<UserId>,
    Json(request): Json<OverrideRequest>,
) -> Response {
    reply(
        services
            .admin
            .set_host_override(caller, host_id, request.max_properties, request.note)
            .await,
        StatusCode::OK,
    )
}

pub(crate) async fn clear_override_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
    Path(host_id): Path<UserId>,
) -> Response {
    let result = services
        .admin
        .clear_host_override(caller, host_id)
        .await
        .map(|()| json!({ "host_id": host_id }));
    reply(result, StatusCode::OK)
}

pub(crate) async fn destinations_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
) -> Response {
    reply(
        services.admin.list_destinations(caller).await,
        StatusCode::OK,
    )
}

pub(crate) async fn create_destination_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
    Json(input): Json<DestinationInput>,
) -> Response {
    reply(
        services.admin.create_destination(caller, input).await,
        StatusCode::CREATED,
    )
}

pub(crate) async fn reorder_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
    Json(request): Json<ReorderRequest>,
) -> Response {
    reply(
        services
            .admin
            .reorder_destinations(caller, &request.ids)
            .await,
        StatusCode::OK,
    )
}

pub(crate) async fn update_destination_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
    Path(destination_id): Path<DestinationId>,
    Json(input): Json<DestinationInput>,
) -> Response {
    reply(
        services
            .admin
            .update_destination(caller, destination_id, input)
            .await,
        StatusCode::OK,
    )
}

pub(crate) async fn delete_destination_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
    Path(destination_id): Path<DestinationId>,
) -> Response {
    let result = services
        .admin
        .delete_destination(caller, destination_id)
        .await
        .map(|()| json!({ "id": destination_id }));
    reply(result, StatusCode::OK)
}

pub(crate) async fn toggle_destination_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
    Path(destination_id): Path<DestinationId>,
) -> Response {
    reply(
        services
            .admin
            .toggle_destination(caller, destination_id)
            .await,
        StatusCode::OK,
    )
}

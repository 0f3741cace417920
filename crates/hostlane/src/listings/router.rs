use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::catalog::catalog_view;
use super::domain::{Property, PropertyId};
use super::service::ListingServiceError;
use super::uploads::{UploadKind, UploadRequest, MAX_DOCUMENT_BYTES};
use super::wizard::{evaluate_step, ListingDraft, WizardStep};
use crate::api::{failure, reply, AppServices, Caller};
use crate::backend::Envelope;

// Oversized photos still reach the upload service so it can name the limit.
const UPLOAD_BODY_LIMIT: usize = MAX_DOCUMENT_BYTES + 1;

/// Router exposing the host listing flow, uploads and the public destination list.
pub fn listing_router(services: AppServices) -> Router {
    Router::new()
        .route("/api/v1/catalog", get(catalog_handler))
        .route("/api/v1/listings/wizard/evaluate", post(evaluate_handler))
        .route("/api/v1/listings/checklist", post(checklist_handler))
        .route(
            "/api/v1/listings",
            post(submit_handler).get(list_handler),
        )
        .route("/api/v1/listings/limits", get(limits_handler))
        .route(
            "/api/v1/listings/:property_id",
            get(detail_handler).delete(withdraw_handler),
        )
        .route(
            "/api/v1/listings/:property_id/resubmit",
            put(resubmit_handler),
        )
        .route(
            "/api/v1/uploads/:kind",
            post(upload_handler)
                .delete(remove_upload_handler)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/v1/uploads/signed", get(signed_url_handler))
        .route("/api/v1/destinations", get(destinations_handler))
        .with_state(services)
}

#[derive(Debug, Deserialize)]
pub(crate) struct EvaluateRequest {
    step: WizardStep,
    #[serde(default)]
    draft: ListingDraft,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadQuery {
    draft: String,
    file_name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PathQuery {
    path: String,
}

/// Submissions and resubmissions surface validation issues alongside the error.
fn listing_reply(result: Result<Property, ListingServiceError>, success: StatusCode) -> Response {
    match result {
        Ok(property) => Envelope::ok(property).respond(success),
        Err(ListingServiceError::Invalid(issues)) => {
            let message = format!("listing is incomplete ({} issue(s))", issues.len());
            Envelope::rejected(json!({ "issues": issues }), message)
                .respond(StatusCode::UNPROCESSABLE_ENTITY)
        }
        Err(other) => failure(other),
    }
}

pub(crate) async fn catalog_handler() -> Response {
    Envelope::ok(catalog_view()).respond(StatusCode::OK)
}

pub(crate) async fn evaluate_handler(
    State(services): State<AppServices>,
    Json(request): Json<EvaluateRequest>,
) -> Response {
    match services.properties.rules().await {
        Ok(rules) => {
            let evaluation = evaluate_step(&request.draft, request.step, &rules);
            Envelope::ok(evaluation).respond(StatusCode::OK)
        }
        Err(err) => failure(err),
    }
}

pub(crate) async fn checklist_handler(Json(draft): Json<ListingDraft>) -> Response {
    Envelope::ok(draft.checklist()).respond(StatusCode::OK)
}

pub(crate) async fn submit_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
    Json(draft): Json<ListingDraft>,
) -> Response {
    let result = services.properties.submit_draft(caller, &draft).await;
    listing_reply(result, StatusCode::CREATED)
}

pub(crate) async fn list_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
) -> Response {
    let result = services
        .properties
        .list_for_host(caller)
        .await
        .map(|listings| {
            listings
                .iter()
                .map(Property::summary_view)
                .collect::<Vec<_>>()
        });
    reply(result, StatusCode::OK)
}

pub(crate) async fn limits_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
) -> Response {
    reply(services.limits.check(caller).await, StatusCode::OK)
}

pub(crate) async fn detail_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
    Path(property_id): Path<PropertyId>,
) -> Response {
    reply(
        services.properties.get_for_host(caller, property_id).await,
        StatusCode::OK,
    )
}

pub(crate) async fn withdraw_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
    Path(property_id): Path<PropertyId>,
) -> Response {
    let result = services
        .properties
        .withdraw(caller, property_id)
        .await
        .map(|()| json!({ "id": property_id }));
    reply(result, StatusCode::OK)
}

pub(crate) async fn resubmit_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
    Path(property_id): Path<PropertyId>,
    Json(draft): Json<ListingDraft>,
) -> Response {
    let result = services
        .properties
        .resubmit(caller, property_id, &draft)
        .await;
    listing_reply(result, StatusCode::OK)
}

pub(crate) async fn upload_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
    Path(kind): Path<UploadKind>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let request = UploadRequest {
        kind,
        draft_id: query.draft,
        file_name: query.file_name,
        content_type,
        bytes: body.to_vec(),
    };
    reply(
        services.uploads.upload(caller, request).await,
        StatusCode::CREATED,
    )
}

pub(crate) async fn remove_upload_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
    Path(kind): Path<UploadKind>,
    Query(query): Query<PathQuery>,
) -> Response {
    let result = services
        .uploads
        .remove(caller, kind, &query.path)
        .await
        .map(|()| json!({ "path": query.path }));
    reply(result, StatusCode::OK)
}

pub(crate) async fn signed_url_handler(
    State(services): State<AppServices>,
    Caller(caller): Caller,
    Query(query): Query<PathQuery>,
) -> Response {
    reply(
        services
            .uploads
            .signed_document_url(caller, &query.path)
            .await,
        StatusCode::OK,
    )
}

pub(crate) async fn destinations_handler(State(services): State<AppServices>) -> Response {
    match services.admin.active_destinations().await {
        Ok(destinations) => Envelope::ok(destinations).respond(StatusCode::OK),
        Err(err) => failure(err),
    }
}

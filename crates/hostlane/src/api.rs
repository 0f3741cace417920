//! HTTP surface shared by the listing and admin routers: caller identity, the
//! service bundle handed to handlers, and envelope responses.

use std::fmt::Display;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::Response;
use axum::Router;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::admin::{admin_router, AdminError, AdminService};
use crate::backend::{
    DestinationRepository, Envelope, ObjectStorage, PropertyRepository, SettingsRepository,
    UserRepository,
};
use crate::listings::domain::UserId;
use crate::listings::{
    listing_router, LimitsError, ListingServiceError, PropertyLimitsService, PropertyService,
    StorageBuckets, UploadError, UploadService,
};

/// Header carrying the authenticated profile id, set by the backend's gateway.
pub const CALLER_HEADER: &str = "x-user-id";

/// Profile id of the user making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub UserId);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(CALLER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty());
        let Some(raw) = raw else {
            return Err(Envelope::<()>::failure(format!("missing {CALLER_HEADER} header"))
                .respond(StatusCode::UNAUTHORIZED));
        };
        Uuid::parse_str(raw)
            .map(|id| Caller(UserId(id)))
            .map_err(|_| {
                Envelope::<()>::failure(format!("{CALLER_HEADER} must be a UUID"))
                    .respond(StatusCode::UNAUTHORIZED)
            })
    }
}

/// Services every route handler can reach.
#[derive(Clone)]
pub struct AppServices {
    pub properties: Arc<PropertyService>,
    pub limits: Arc<PropertyLimitsService>,
    pub uploads: Arc<UploadService>,
    pub admin: Arc<AdminService>,
}

impl AppServices {
    /// Wire every service over one backend that serves all repositories.
    pub fn from_backend<B>(
        backend: Arc<B>,
        storage: Arc<dyn ObjectStorage>,
        buckets: StorageBuckets,
    ) -> Self
    where
        B: PropertyRepository
            + UserRepository
            + SettingsRepository
            + DestinationRepository
            + 'static,
    {
        let limits = Arc::new(PropertyLimitsService::new(backend.clone(), backend.clone()));
        let properties = Arc::new(PropertyService::new(
            backend.clone(),
            backend.clone(),
            backend.clone(),
            storage.clone(),
            limits.clone(),
            buckets.clone(),
        ));
        let uploads = Arc::new(UploadService::new(storage, backend.clone(), buckets));
        let admin = Arc::new(AdminService::new(
            backend.clone(),
            backend.clone(),
            backend.clone(),
            backend,
            properties.clone(),
            limits.clone(),
        ));
        Self {
            properties,
            limits,
            uploads,
            admin,
        }
    }
}

/// Host-facing and admin routes under `/api/v1`.
pub fn api_router(services: AppServices) -> Router {
    listing_router(services.clone()).merge(admin_router(services))
}

/// Service errors that know which HTTP status they map to.
pub(crate) trait HttpFailure: Display {
    fn status(&self) -> StatusCode;
}

impl HttpFailure for ListingServiceError {
    fn status(&self) -> StatusCode {
        self.status_code()
    }
}

impl HttpFailure for LimitsError {
    fn status(&self) -> StatusCode {
        self.status_code()
    }
}

impl HttpFailure for UploadError {
    fn status(&self) -> StatusCode {
        self.status_code()
    }
}

impl HttpFailure for AdminError {
    fn status(&self) -> StatusCode {
        self.status_code()
    }
}

pub(crate) fn failure<E: HttpFailure>(err: E) -> Response {
    let status = err.status();
    if status.is_server_error() {
        warn!(status = status.as_u16(), error = %err, "request failed");
    }
    Envelope::<()>::failure(err.to_string()).respond(status)
}

pub(crate) fn reply<T, E>(result: Result<T, E>, success: StatusCode) -> Response
where
    T: Serialize,
    E: HttpFailure,
{
    match result {
        Ok(data) => Envelope::ok(data).respond(success),
        Err(err) => failure(err),
    }
}

//! Admin dashboard operations: statistics, user roles, property moderation,
//! platform settings, submission limits and featured destinations.

mod destinations;
mod moderation;
pub mod router;
mod settings;
mod stats;
mod users;

use std::sync::Arc;

use axum::http::StatusCode;

use crate::backend::{
    backend_status, BackendError, DestinationRepository, PropertyRepository, SettingsRepository,
    UserRepository,
};
use crate::listings::domain::{DestinationId, UserId, UserProfile, UserRole};
use crate::listings::{LimitsError, ListingServiceError, PropertyLimitsService, PropertyService};
use crate::platform::SettingsError;

pub use destinations::DestinationInput;
pub use moderation::{export_properties_csv, write_properties_csv};
pub use router::admin_router;
pub use settings::LimitsOverview;
pub use stats::{compute_stats, CityCount, DashboardStats, RoleCount, StatusCount};

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("admin role required")]
    Forbidden,
    #[error("admins cannot change their own role")]
    SelfRoleChange,
    #[error("the last admin cannot be demoted")]
    LastAdmin,
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("destination {0} not found")]
    DestinationNotFound(DestinationId),
    #[error("invalid destination: {0}")]
    InvalidDestination(String),
    #[error("invalid destination order: {0}")]
    InvalidOrder(String),
    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),
    #[error("export failed: {0}")]
    Export(String),
    #[error(transparent)]
    Listing(#[from] ListingServiceError),
    #[error(transparent)]
    Limits(#[from] LimitsError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl AdminError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AdminError::Forbidden => StatusCode::FORBIDDEN,
            AdminError::SelfRoleChange | AdminError::LastAdmin => StatusCode::CONFLICT,
            AdminError::UserNotFound(_) | AdminError::DestinationNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AdminError::InvalidDestination(_)
            | AdminError::InvalidOrder(_)
            | AdminError::Settings(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AdminError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AdminError::Listing(err) => err.status_code(),
            AdminError::Limits(err) => err.status_code(),
            AdminError::Backend(err) => backend_status(err),
        }
    }
}

/// Back office operations. Every method except the public destination list
/// first checks that the caller's profile has the admin role.
pub struct AdminService {
    users: Arc<dyn UserRepository>,
    properties: Arc<dyn PropertyRepository>,
    settings: Arc<dyn SettingsRepository>,
    destinations: Arc<dyn DestinationRepository>,
    listings: Arc<PropertyService>,
    limits: Arc<PropertyLimitsService>,
}

impl AdminService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        properties: Arc<dyn PropertyRepository>,
        settings: Arc<dyn SettingsRepository>,
        destinations: Arc<dyn DestinationRepository>,
        listings: Arc<PropertyService>,
        limits: Arc<PropertyLimitsService>,
    ) -> Self {
        Self {
            users,
            properties,
            settings,
            destinations,
            listings,
            limits,
        }
    }

    pub async fn authorize(&self, caller: UserId) -> Result<UserProfile, AdminError> {
        match self.users.fetch(caller).await? {
            Some(profile) if profile.role == UserRole::Admin => Ok(profile),
            _ => Err(AdminError::Forbidden),
        }
    }
}

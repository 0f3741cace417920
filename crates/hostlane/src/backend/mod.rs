//! Client side of the managed backend: repository traits over its tables and
//! object storage, plus the in-memory and REST implementations.

mod envelope;
pub mod memory;
pub mod rest;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::listings::domain::{
    DestinationId, FeaturedDestination, Property, PropertyId, PropertyStatus, UserId,
    UserProfile, UserRole,
};
use crate::listings::limits::{HostLimitOverride, PropertyLimits};
use crate::platform::PlatformSettings;

pub use envelope::Envelope;
pub use memory::{InMemoryBackend, InMemoryStorage};
pub use rest::RestBackend;

/// Error enumeration for backend failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("record not found")]
    NotFound,
    #[error("record already exists")]
    Conflict,
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("unexpected backend payload: {0}")]
    Decode(String),
    #[error("backend rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// HTTP status a service reports when the backend call behind it failed.
pub fn backend_status(err: &BackendError) -> StatusCode {
    match err {
        BackendError::NotFound => StatusCode::NOT_FOUND,
        BackendError::Conflict => StatusCode::CONFLICT,
        BackendError::Unavailable(_) | BackendError::Decode(_) | BackendError::Rejected { .. } => {
            StatusCode::BAD_GATEWAY
        }
    }
}

/// Property listing query used by hosts and moderators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyFilter {
    pub status: Option<PropertyStatus>,
    pub featured: Option<bool>,
    pub host_id: Option<UserId>,
    /// Case-insensitive match against the listing name and city.
    pub search: Option<String>,
}

impl PropertyFilter {
    pub fn for_host(host_id: UserId) -> Self {
        Self {
            host_id: Some(host_id),
            ..Self::default()
        }
    }

    pub fn with_status(status: PropertyStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub(crate) fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, property: &Property) -> bool {
        if self.status.is_some_and(|status| property.status != status) {
            return false;
        }
        if self.featured.is_some_and(|featured| property.featured != featured) {
            return false;
        }
        if self.host_id.is_some_and(|host| property.host_id != host) {
            return false;
        }
        match self.search_term() {
            Some(term) => {
                property.basic_info.name.to_lowercase().contains(&term)
                    || property.basic_info.city.to_lowercase().contains(&term)
            }
            None => true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    /// Case-insensitive match against email and full name.
    pub search: Option<String>,
}

impl UserFilter {
    pub(crate) fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, profile: &UserProfile) -> bool {
        if self.role.is_some_and(|role| profile.role != role) {
            return false;
        }
        match self.search_term() {
            Some(term) => {
                profile.email.to_lowercase().contains(&term)
                    || profile
                        .full_name
                        .as_deref()
                        .is_some_and(|name| name.to_lowercase().contains(&term))
            }
            None => true,
        }
    }
}

#[async_trait]
pub trait PropertyRepository: Send + Sync {
    async fn insert(&self, property: Property) -> Result<Property, BackendError>;
    async fn update(&self, property: Property) -> Result<Property, BackendError>;
    async fn fetch(&self, id: PropertyId) -> Result<Option<Property>, BackendError>;
    /// Matching properties, newest first.
    async fn list(&self, filter: &PropertyFilter) -> Result<Vec<Property>, BackendError>;
    async fn delete(&self, id: PropertyId) -> Result<(), BackendError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, profile: UserProfile) -> Result<UserProfile, BackendError>;
    async fn fetch(&self, id: UserId) -> Result<Option<UserProfile>, BackendError>;
    async fn list(&self, filter: &UserFilter) -> Result<Vec<UserProfile>, BackendError>;
    async fn update_role(&self, id: UserId, role: UserRole) -> Result<UserProfile, BackendError>;
}

/// Singleton configuration rows plus per-host limit overrides.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn platform_settings(&self) -> Result<PlatformSettings, BackendError>;
    async fn save_platform_settings(
        &self,
        settings: PlatformSettings,
    ) -> Result<PlatformSettings, BackendError>;
    async fn property_limits(&self) -> Result<PropertyLimits, BackendError>;
    async fn save_property_limits(
        &self,
        limits: PropertyLimits,
    ) -> Result<PropertyLimits, BackendError>;
    async fn host_override(&self, host: UserId)
        -> Result<Option<HostLimitOverride>, BackendError>;
    async fn save_host_override(
        &self,
        entry: HostLimitOverride,
    ) -> Result<HostLimitOverride, BackendError>;
    async fn delete_host_override(&self, host: UserId) -> Result<(), BackendError>;
    async fn list_host_overrides(&self) -> Result<Vec<HostLimitOverride>, BackendError>;
}

#[async_trait]
pub trait DestinationRepository: Send + Sync {
    /// Every destination ordered by `display_order`.
    async fn list(&self) -> Result<Vec<FeaturedDestination>, BackendError>;
    async fn fetch(&self, id: DestinationId) -> Result<Option<FeaturedDestination>, BackendError>;
    async fn insert(
        &self,
        destination: FeaturedDestination,
    ) -> Result<FeaturedDestination, BackendError>;
    async fn update(
        &self,
        destination: FeaturedDestination,
    ) -> Result<FeaturedDestination, BackendError>;
    async fn delete(&self, id: DestinationId) -> Result<(), BackendError>;
}

/// Bucketed object storage used for listing photos and verification documents.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError>;
    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), BackendError>;
    async fn signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, BackendError>;
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

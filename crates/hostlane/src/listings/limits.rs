use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{PropertyStatus, UserId};
use crate::backend::{
    backend_status, BackendError, PropertyFilter, PropertyRepository, SettingsRepository,
};

/// Platform-wide submission caps, stored as the backend's `property_limits` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyLimits {
    pub max_properties_per_host: u32,
    pub max_pending_per_host: u32,
}

impl Default for PropertyLimits {
    fn default() -> Self {
        Self {
            max_properties_per_host: 10,
            max_pending_per_host: 3,
        }
    }
}

impl PropertyLimits {
    pub fn validate(&self) -> Result<(), LimitsError> {
        if self.max_properties_per_host == 0 || self.max_pending_per_host == 0 {
            return Err(LimitsError::Invalid(
                "limits must be at least 1".to_string(),
            ));
        }
        if self.max_pending_per_host > self.max_properties_per_host {
            return Err(LimitsError::Invalid(format!(
                "pending limit ({}) cannot exceed the property limit ({})",
                self.max_pending_per_host, self.max_properties_per_host
            )));
        }
        Ok(())
    }
}

/// Per-host replacement for `max_properties_per_host`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostLimitOverride {
    pub host_id: UserId,
    pub max_properties: u32,
    #[serde(default)]
    pub note: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Result of checking whether a host may submit another listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitCheck {
    pub allowed: bool,
    pub active_count: u32,
    pub pending_count: u32,
    pub max_properties: u32,
    pub max_pending: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum LimitsError {
    #[error("invalid limits: {0}")]
    Invalid(String),
    #[error("no limit override exists for host {0}")]
    OverrideNotFound(UserId),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl LimitsError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            LimitsError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            LimitsError::OverrideNotFound(_) => StatusCode::NOT_FOUND,
            LimitsError::Backend(err) => backend_status(err),
        }
    }
}

/// Reads and manages submission limits and evaluates them for a host.
pub struct PropertyLimitsService {
    settings: Arc<dyn SettingsRepository>,
    properties: Arc<dyn PropertyRepository>,
}

impl PropertyLimitsService {
    pub fn new(
        settings: Arc<dyn SettingsRepository>,
        properties: Arc<dyn PropertyRepository>,
    ) -> Self {
        Self {
            settings,
            properties,
        }
    }

    pub async fn limits(&self) -> Result<PropertyLimits, LimitsError> {
        Ok(self.settings.property_limits().await?)
    }

    pub async fn update_limits(
        &self,
        limits: PropertyLimits,
    ) -> Result<PropertyLimits, LimitsError> {
        limits.validate()?;
        let saved = self.settings.save_property_limits(limits).await?;
        info!(
            max_properties = saved.max_properties_per_host,
            max_pending = saved.max_pending_per_host,
            "property limits updated"
        );
        Ok(saved)
    }

    pub async fn set_host_override(
        &self,
        host: UserId,
        max_properties: u32,
        note: Option<String>,
    ) -> Result<HostLimitOverride, LimitsError> {
        if max_properties == 0 {
            return Err(LimitsError::Invalid(
                "host override must allow at least 1 property".to_string(),
            ));
        }
        let entry = HostLimitOverride {
            host_id: host,
            max_properties,
            note: note
                .map(|note| note.trim().to_string())
                .filter(|note| !note.is_empty()),
            updated_at: Utc::now(),
        };
        let saved = self.settings.save_host_override(entry).await?;
        info!(host = %host, max_properties, "host limit override saved");
        Ok(saved)
    }

    pub async fn clear_host_override(&self, host: UserId) -> Result<(), LimitsError> {
        match self.settings.delete_host_override(host).await {
            Ok(()) => {
                info!(host = %host, "host limit override cleared");
                Ok(())
            }
            Err(BackendError::NotFound) => Err(LimitsError::OverrideNotFound(host)),
            Err(other) => Err(other.into()),
        }
    }

    pub async fn list_overrides(&self) -> Result<Vec<HostLimitOverride>, LimitsError> {
        Ok(self.settings.list_host_overrides().await?)
    }

    /// Count the host's non-rejected listings against the effective limits.
    pub async fn check(&self, host: UserId) -> Result<LimitCheck, LimitsError> {
        let limits = self.settings.property_limits().await?;
        let max_properties = self
            .settings
            .host_override(host)
            .await?
            .map(|entry| entry.max_properties)
            .unwrap_or(limits.max_properties_per_host);

        let owned = self.properties.list(&PropertyFilter::for_host(host)).await?;
        let active_count = owned
            .iter()
            .filter(|property| property.status != PropertyStatus::Rejected)
            .count() as u32;
        let pending_count = owned
            .iter()
            .filter(|property| property.status.awaiting_review())
            .count() as u32;

        let reason = if active_count >= max_properties {
            Some(format!(
                "host has reached the limit of {max_properties} properties"
            ))
        } else if pending_count >= limits.max_pending_per_host {
            Some(format!(
                "host already has {pending_count} listings awaiting review (limit {})",
                limits.max_pending_per_host
            ))
        } else {
            None
        };

        Ok(LimitCheck {
            allowed: reason.is_none(),
            active_count,
            pending_count,
            max_properties,
            max_pending: limits.max_pending_per_host,
            reason,
        })
    }
}

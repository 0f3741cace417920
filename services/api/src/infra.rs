use chrono::Utc;
use hostlane::api::AppServices;
use hostlane::backend::{
    BackendError, InMemoryBackend, InMemoryStorage, ObjectStorage, PropertyRepository,
    RestBackend, UserRepository,
};
use hostlane::config::{BackendConfig, BackendMode};
use hostlane::error::AppError;
use hostlane::listings::domain::{PropertyStatus, UserId, UserProfile, UserRole};
use hostlane::listings::StorageBuckets;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Services wired to the configured backend, plus the raw repositories the
/// operator commands read directly.
pub(crate) struct Backends {
    pub(crate) services: AppServices,
    pub(crate) properties: Arc<dyn PropertyRepository>,
}

pub(crate) async fn build_backends(config: &BackendConfig) -> Result<Backends, AppError> {
    let buckets = StorageBuckets::from(config);
    let (services, properties, users): (
        AppServices,
        Arc<dyn PropertyRepository>,
        Arc<dyn UserRepository>,
    ) = match &config.mode {
        BackendMode::Memory => {
            let backend = Arc::new(InMemoryBackend::default());
            let storage: Arc<dyn ObjectStorage> = Arc::new(InMemoryStorage::default());
            let services = AppServices::from_backend(backend.clone(), storage, buckets);
            let properties: Arc<dyn PropertyRepository> = backend.clone();
            let users: Arc<dyn UserRepository> = backend;
            (services, properties, users)
        }
        BackendMode::Rest { url, .. } => {
            let backend = RestBackend::from_config(config)
                .map(Arc::new)
                .ok_or_else(|| {
                    BackendError::Unavailable("rest backend is not configured".to_string())
                })?;
            info!(%url, "using managed backend");
            let storage: Arc<dyn ObjectStorage> = backend.clone();
            let services = AppServices::from_backend(backend.clone(), storage, buckets);
            let properties: Arc<dyn PropertyRepository> = backend.clone();
            let users: Arc<dyn UserRepository> = backend;
            (services, properties, users)
        }
    };

    if let Some(id) = config.bootstrap_admin {
        ensure_admin(users.as_ref(), UserId(id)).await?;
    }

    Ok(Backends {
        services,
        properties,
    })
}

/// Make sure the configured bootstrap profile exists and holds the admin role.
pub(crate) async fn ensure_admin(
    users: &dyn UserRepository,
    id: UserId,
) -> Result<UserProfile, BackendError> {
    match users.fetch(id).await? {
        Some(profile) if profile.role == UserRole::Admin => Ok(profile),
        Some(_) => {
            let profile = users.update_role(id, UserRole::Admin).await?;
            info!(user = %id, "bootstrap profile promoted to admin");
            Ok(profile)
        }
        None => {
            let profile = users
                .insert(UserProfile {
                    id,
                    email: format!("admin+{}@hostlane.local", id.0.simple()),
                    full_name: Some("Bootstrap admin".to_string()),
                    role: UserRole::Admin,
                    created_at: Utc::now(),
                })
                .await?;
            info!(user = %id, "bootstrap admin profile created");
            Ok(profile)
        }
    }
}

pub(crate) fn parse_status(raw: &str) -> Result<PropertyStatus, String> {
    PropertyStatus::parse(raw).ok_or_else(|| {
        format!("invalid status '{raw}', expected pending, under_review, approved or rejected")
    })
}

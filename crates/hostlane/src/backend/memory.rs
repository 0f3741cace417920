use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{
    BackendError, DestinationRepository, ObjectStorage, PropertyFilter, PropertyRepository,
    SettingsRepository, UserFilter, UserRepository,
};
use crate::listings::domain::{
    DestinationId, FeaturedDestination, Property, PropertyId, UserId, UserProfile, UserRole,
};
use crate::listings::limits::{HostLimitOverride, PropertyLimits};
use crate::platform::PlatformSettings;

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, BackendError> {
    mutex
        .lock()
        .map_err(|_| BackendError::Unavailable("in-memory store poisoned".to_string()))
}

/// Process-local stand-in for the managed backend's tables.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    properties: Mutex<HashMap<PropertyId, Property>>,
    users: Mutex<HashMap<UserId, UserProfile>>,
    settings: Mutex<Option<PlatformSettings>>,
    limits: Mutex<Option<PropertyLimits>>,
    overrides: Mutex<BTreeMap<UserId, HostLimitOverride>>,
    destinations: Mutex<HashMap<DestinationId, FeaturedDestination>>,
}

impl InMemoryBackend {
    pub fn with_settings(settings: PlatformSettings) -> Self {
        Self {
            settings: Mutex::new(Some(settings)),
            ..Self::default()
        }
    }

    /// Store a property as-is, replacing any row with the same id.
    pub fn seed_property(&self, property: Property) -> Result<(), BackendError> {
        lock(&self.properties)?.insert(property.id, property);
        Ok(())
    }

    pub fn seed_user(&self, profile: UserProfile) -> Result<(), BackendError> {
        lock(&self.users)?.insert(profile.id, profile);
        Ok(())
    }
}

#[async_trait]
impl PropertyRepository for InMemoryBackend {
    async fn insert(&self, property: Property) -> Result<Property, BackendError> {
        let mut guard = lock(&self.properties)?;
        if guard.contains_key(&property.id) {
            return Err(BackendError::Conflict);
        }
        guard.insert(property.id, property.clone());
        Ok(property)
    }

    async fn update(&self, property: Property) -> Result<Property, BackendError> {
        let mut guard = lock(&self.properties)?;
        let slot = guard.get_mut(&property.id).ok_or(BackendError::NotFound)?;
        *slot = property.clone();
        Ok(property)
    }

    async fn fetch(&self, id: PropertyId) -> Result<Option<Property>, BackendError> {
        Ok(lock(&self.properties)?.get(&id).cloned())
    }

    async fn list(&self, filter: &PropertyFilter) -> Result<Vec<Property>, BackendError> {
        let guard = lock(&self.properties)?;
        let mut matches: Vec<Property> = guard
            .values()
            .filter(|property| filter.matches(property))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(matches)
    }

    async fn delete(&self, id: PropertyId) -> Result<(), BackendError> {
        lock(&self.properties)?
            .remove(&id)
            .map(|_| ())
            .ok_or(BackendError::NotFound)
    }
}

#[async_trait]
impl UserRepository for InMemoryBackend {
    async fn insert(&self, profile: UserProfile) -> Result<UserProfile, BackendError> {
        let mut guard = lock(&self.users)?;
        let duplicate_email = guard
            .values()
            .any(|existing| existing.email.eq_ignore_ascii_case(&profile.email));
        if guard.contains_key(&profile.id) || duplicate_email {
            return Err(BackendError::Conflict);
        }
        guard.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn fetch(&self, id: UserId) -> Result<Option<UserProfile>, BackendError> {
        Ok(lock(&self.users)?.get(&id).cloned())
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<UserProfile>, BackendError> {
        let guard = lock(&self.users)?;
        let mut matches: Vec<UserProfile> = guard
            .values()
            .filter(|profile| filter.matches(profile))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(matches)
    }

    async fn update_role(&self, id: UserId, role: UserRole) -> Result<UserProfile, BackendError> {
        let mut guard = lock(&self.users)?;
        let profile = guard.get_mut(&id).ok_or(BackendError::NotFound)?;
        profile.role = role;
        Ok(profile.clone())
    }
}

#[async_trait]
impl SettingsRepository for InMemoryBackend {
    async fn platform_settings(&self) -> Result<PlatformSettings, BackendError> {
        Ok(lock(&self.settings)?.clone().unwrap_or_default())
    }

    async fn save_platform_settings(
        &self,
        settings: PlatformSettings,
    ) -> Result<PlatformSettings, BackendError> {
        *lock(&self.settings)? = Some(settings.clone());
        Ok(settings)
    }

    async fn property_limits(&self) -> Result<PropertyLimits, BackendError> {
        Ok(lock(&self.limits)?.unwrap_or_default())
    }

    async fn save_property_limits(
        &self,
        limits: PropertyLimits,
    ) -> Result<PropertyLimits, BackendError> {
        *lock(&self.limits)? = Some(limits);
        Ok(limits)
    }

    async fn host_override(
        &self,
        host: UserId,
    ) -> Result<Option<HostLimitOverride>, BackendError> {
        Ok(lock(&self.overrides)?.get(&host).cloned())
    }

    async fn save_host_override(
        &self,
        entry: HostLimitOverride,
    ) -> Result<HostLimitOverride, BackendError> {
        lock(&self.overrides)?.insert(entry.host_id, entry.clone());
        Ok(entry)
    }

    async fn delete_host_override(&self, host: UserId) -> Result<(), BackendError> {
        lock(&self.overrides)?
            .remove(&host)
            .map(|_| ())
            .ok_or(BackendError::NotFound)
    }

    async fn list_host_overrides(&self) -> Result<Vec<HostLimitOverride>, BackendError> {
        Ok(lock(&self.overrides)?.values().cloned().collect())
    }
}

#[async_trait]
impl DestinationRepository for InMemoryBackend {
    async fn list(&self) -> Result<Vec<FeaturedDestination>, BackendError> {
        let guard = lock(&self.destinations)?;
        let mut all: Vec<FeaturedDestination> = guard.values().cloned().collect();
        all.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(all)
    }

    async fn fetch(
        &self,
        id: DestinationId,
    ) -> Result<Option<FeaturedDestination>, BackendError> {
        Ok(lock(&self.destinations)?.get(&id).cloned())
    }

    async fn insert(
        &self,
        destination: FeaturedDestination,
    ) -> Result<FeaturedDestination, BackendError> {
        let mut guard = lock(&self.destinations)?;
        if guard.contains_key(&destination.id) {
            return Err(BackendError::Conflict);
        }
        guard.insert(destination.id, destination.clone());
        Ok(destination)
    }

    async fn update(
        &self,
        destination: FeaturedDestination,
    ) -> Result<FeaturedDestination, BackendError> {
        let mut guard = lock(&self.destinations)?;
        let slot = guard
            .get_mut(&destination.id)
            .ok_or(BackendError::NotFound)?;
        *slot = destination.clone();
        Ok(destination)
    }

    async fn delete(&self, id: DestinationId) -> Result<(), BackendError> {
        lock(&self.destinations)?
            .remove(&id)
            .map(|_| ())
            .ok_or(BackendError::NotFound)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub content_type: String,
    pub size: usize,
}

/// Object storage double that keeps blob metadata and hands out fake signed URLs.
#[derive(Debug)]
pub struct InMemoryStorage {
    base_url: String,
    objects: Mutex<BTreeMap<String, StoredBlob>>,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self {
            base_url: "memory://storage".to_string(),
            objects: Mutex::new(BTreeMap::new()),
        }
    }
}

impl InMemoryStorage {
    fn key(bucket: &str, path: &str) -> String {
        format!("{bucket}/{path}")
    }

    pub fn object(&self, bucket: &str, path: &str) -> Option<StoredBlob> {
        lock(&self.objects)
            .ok()
            .and_then(|guard| guard.get(&Self::key(bucket, path)).cloned())
    }

    pub fn object_count(&self) -> usize {
        lock(&self.objects).map(|guard| guard.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ObjectStorage for InMemoryStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError> {
        let mut guard = lock(&self.objects)?;
        let key = Self::key(bucket, path);
        if guard.contains_key(&key) {
            return Err(BackendError::Conflict);
        }
        guard.insert(
            key,
            StoredBlob {
                content_type: content_type.to_string(),
                size: bytes.len(),
            },
        );
        Ok(())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), BackendError> {
        let mut guard = lock(&self.objects)?;
        for path in paths {
            guard.remove(&Self::key(bucket, path));
        }
        Ok(())
    }

    async fn signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, BackendError> {
        if !lock(&self.objects)?.contains_key(&Self::key(bucket, path)) {
            return Err(BackendError::NotFound);
        }
        let expires_at = Utc::now().timestamp() + expires_in_secs as i64;
        Ok(format!(
            "{}/object/sign/{bucket}/{path}?token={}&expires={expires_at}",
            self.base_url,
            Uuid::new_v4().simple()
        ))
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/object/public/{bucket}/{path}", self.base_url)
    }
}

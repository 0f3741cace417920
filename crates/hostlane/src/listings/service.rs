use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use tracing::{info, warn};

use super::domain::{Property, PropertyId, PropertyStatus, UserId, UserRole};
use super::limits::{LimitsError, PropertyLimitsService};
use super::uploads::{owned_by, StorageBuckets};
use super::wizard::{ListingDraft, ListingSubmission, ValidationIssue, WizardRules, WizardStep};
use crate::backend::{
    backend_status, BackendError, ObjectStorage, PropertyFilter, PropertyRepository,
    SettingsRepository, UserRepository,
};

/// Host submissions and the moderation lifecycle of stored listings.
pub struct PropertyService {
    properties: Arc<dyn PropertyRepository>,
    users: Arc<dyn UserRepository>,
    settings: Arc<dyn SettingsRepository>,
    storage: Arc<dyn ObjectStorage>,
    limits: Arc<PropertyLimitsService>,
    buckets: StorageBuckets,
}

#[derive(Debug, thiserror::Error)]
pub enum ListingServiceError {
    #[error("listing is incomplete ({} issue(s))", .0.len())]
    Invalid(Vec<ValidationIssue>),
    #[error("{0}")]
    SubmissionsClosed(String),
    #[error("{0}")]
    LimitReached(String),
    #[error("profile {0} does not exist")]
    UnknownUser(UserId),
    #[error("property {0} not found")]
    NotFound(PropertyId),
    #[error("caller may not access this property")]
    Forbidden,
    #[error("cannot move a property from {} to {}", .from.label(), .to.label())]
    InvalidTransition {
        from: PropertyStatus,
        to: PropertyStatus,
    },
    #[error("a rejection reason is required")]
    ReasonRequired,
    #[error("only approved properties can be featured")]
    NotFeaturable,
    #[error("{} listings cannot be withdrawn", .0.label())]
    NotWithdrawable(PropertyStatus),
    #[error(transparent)]
    Limits(#[from] LimitsError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ListingServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ListingServiceError::Invalid(_) | ListingServiceError::ReasonRequired => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ListingServiceError::SubmissionsClosed(_) => StatusCode::SERVICE_UNAVAILABLE,
            ListingServiceError::LimitReached(_) | ListingServiceError::Forbidden => {
                StatusCode::FORBIDDEN
            }
            ListingServiceError::UnknownUser(_) | ListingServiceError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ListingServiceError::InvalidTransition { .. }
            | ListingServiceError::NotFeaturable
            | ListingServiceError::NotWithdrawable(_) => StatusCode::CONFLICT,
            ListingServiceError::Limits(err) => err.status_code(),
            ListingServiceError::Backend(err) => backend_status(err),
        }
    }
}

impl PropertyService {
    pub fn new(
        properties: Arc<dyn PropertyRepository>,
        users: Arc<dyn UserRepository>,
        settings: Arc<dyn SettingsRepository>,
        storage: Arc<dyn ObjectStorage>,
        limits: Arc<PropertyLimitsService>,
        buckets: StorageBuckets,
    ) -> Self {
        Self {
            properties,
            users,
            settings,
            storage,
            limits,
            buckets,
        }
    }

    /// Wizard rules derived from the current platform settings.
    pub async fn rules(&self) -> Result<WizardRules, ListingServiceError> {
        let settings = self.settings.platform_settings().await?;
        Ok(WizardRules::from(&settings))
    }

    /// Validate a raw draft against the live rules and submit it.
    pub async fn submit_draft(
        &self,
        host: UserId,
        draft: &ListingDraft,
    ) -> Result<Property, ListingServiceError> {
        let rules = self.rules().await?;
        let submission =
            ListingSubmission::from_draft(draft, &rules).map_err(ListingServiceError::Invalid)?;
        self.submit_listing(host, submission).await
    }

    pub async fn submit_listing(
        &self,
        host: UserId,
        submission: ListingSubmission,
    ) -> Result<Property, ListingServiceError> {
        let profile = self
            .users
            .fetch(host)
            .await?
            .ok_or(ListingServiceError::UnknownUser(host))?;
        ensure_own_assets(host, &submission)?;

        let settings = self.settings.platform_settings().await?;
        if let Some(reason) = settings.closed_reason() {
            warn!(host = %host, reason, "submission refused");
            return Err(ListingServiceError::SubmissionsClosed(reason.to_string()));
        }
        self.ensure_within_limits(host).await?;

        let now = Utc::now();
        let property = Property {
            id: PropertyId::generate(),
            host_id: host,
            status: PropertyStatus::Pending,
            featured: false,
            category: submission.category,
            subtype: submission.subtype,
            mode: submission.mode,
            unit_count: submission.unit_count,
            basic_info: submission.basic_info,
            rooms: submission.rooms,
            amenities: submission.amenities,
            photos: submission.photos,
            pricing: submission.pricing,
            policies: submission.policies,
            documents: submission.documents,
            rejection_reason: None,
            reviewed_by: None,
            reviewed_at: None,
            created_at: now,
            updated_at: now,
        };

        let stored = self.properties.insert(property).await?;
        if let Err(err) = self.recount_limits(host).await {
            self.properties.delete(stored.id).await?;
            warn!(property = %stored.id, host = %host, "concurrent submission rolled back");
            return Err(err);
        }

        if profile.role == UserRole::Guest {
            self.users.update_role(host, UserRole::Host).await?;
            info!(user = %host, "guest promoted to host on first listing");
        }
        info!(property = %stored.id, host = %host, "listing submitted for review");
        Ok(stored)
    }

    /// Limits counted after a write, which includes the written listing. Exceeding them means
    /// another submission from the same host landed between the check and the write.
    async fn recount_limits(&self, host: UserId) -> Result<(), ListingServiceError> {
        let check = self.limits.check(host).await?;
        if check.active_count > check.max_properties || check.pending_count > check.max_pending {
            return Err(ListingServiceError::LimitReached(format!(
                "host exceeded the listing limits ({} total, {} awaiting review)",
                check.active_count, check.pending_count
            )));
        }
        Ok(())
    }

    async fn ensure_within_limits(&self, host: UserId) -> Result<(), ListingServiceError> {
        let check = self.limits.check(host).await?;
        if check.allowed {
            return Ok(());
        }
        let reason = check
            .reason
            .unwrap_or_else(|| "listing limit reached".to_string());
        warn!(host = %host, %reason, "submission blocked by limits");
        Err(ListingServiceError::LimitReached(reason))
    }

    pub async fn list_for_host(&self, host: UserId) -> Result<Vec<Property>, ListingServiceError> {
        Ok(self.properties.list(&PropertyFilter::for_host(host)).await?)
    }

    pub async fn fetch(&self, id: PropertyId) -> Result<Property, ListingServiceError> {
        self.properties
            .fetch(id)
            .await?
            .ok_or(ListingServiceError::NotFound(id))
    }

    /// Fetch a listing for its owner or an admin.
    pub async fn get_for_host(
        &self,
        caller: UserId,
        id: PropertyId,
    ) -> Result<Property, ListingServiceError> {
        let property = self.fetch(id).await?;
        if property.host_id == caller {
            return Ok(property);
        }
        let is_admin = self
            .users
            .fetch(caller)
            .await?
            .is_some_and(|profile| profile.role == UserRole::Admin);
        if is_admin {
            Ok(property)
        } else {
            Err(ListingServiceError::Forbidden)
        }
    }

    /// Host deletes their own pending or rejected listing.
    pub async fn withdraw(
        &self,
        caller: UserId,
        id: PropertyId,
    ) -> Result<(), ListingServiceError> {
        let property = self.fetch(id).await?;
        if property.host_id != caller {
            return Err(ListingServiceError::Forbidden);
        }
        if !matches!(
            property.status,
            PropertyStatus::Pending | PropertyStatus::Rejected
        ) {
            return Err(ListingServiceError::NotWithdrawable(property.status));
        }
        self.properties.delete(id).await?;
        self.remove_assets(&property).await;
        info!(property = %id, host = %caller, "listing withdrawn");
        Ok(())
    }

    /// Send a rejected listing back to the review queue with updated content.
    pub async fn resubmit(
        &self,
        caller: UserId,
        id: PropertyId,
        draft: &ListingDraft,
    ) -> Result<Property, ListingServiceError> {
        let mut property = self.fetch(id).await?;
        if property.host_id != caller {
            return Err(ListingServiceError::Forbidden);
        }
        if !property.status.can_transition_to(PropertyStatus::Pending) {
            return Err(ListingServiceError::InvalidTransition {
                from: property.status,
                to: PropertyStatus::Pending,
            });
        }
        let rules = self.rules().await?;
        let submission =
            ListingSubmission::from_draft(draft, &rules).map_err(ListingServiceError::Invalid)?;
        ensure_own_assets(caller, &submission)?;
        self.ensure_within_limits(caller).await?;

        let previous = property.clone();
        property.category = submission.category;
        property.subtype = submission.subtype;
        property.mode = submission.mode;
        property.unit_count = submission.unit_count;
        property.basic_info = submission.basic_info;
        property.rooms = submission.rooms;
        property.amenities = submission.amenities;
        property.photos = submission.photos;
        property.pricing = submission.pricing;
        property.policies = submission.policies;
        property.documents = submission.documents;
        property.status = PropertyStatus::Pending;
        property.rejection_reason = None;
        property.reviewed_by = None;
        property.reviewed_at = None;
        property.updated_at = Utc::now();

        let stored = self.properties.update(property).await?;
        if let Err(err) = self.recount_limits(caller).await {
            self.properties.update(previous).await?;
            warn!(property = %id, host = %caller, "concurrent resubmission rolled back");
            return Err(err);
        }
        info!(property = %id, host = %caller, "listing resubmitted");
        Ok(stored)
    }

    /// Apply a moderation decision, enforcing the status lifecycle.
    pub async fn transition(
        &self,
        id: PropertyId,
        next: PropertyStatus,
        reason: Option<String>,
        reviewer: UserId,
    ) -> Result<Property, ListingServiceError> {
        let mut property = self.fetch(id).await?;
        let current = property.status;
        if !current.can_transition_to(next) {
            warn!(property = %id, from = current.label(), to = next.label(), "invalid transition");
            return Err(ListingServiceError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        if next == PropertyStatus::Rejected {
            let reason = reason
                .map(|reason| reason.trim().to_string())
                .filter(|reason| !reason.is_empty())
                .ok_or(ListingServiceError::ReasonRequired)?;
            property.rejection_reason = Some(reason);
            property.featured = false;
        } else {
            property.rejection_reason = None;
        }

        let now = Utc::now();
        property.status = next;
        property.reviewed_by = Some(reviewer);
        property.reviewed_at = Some(now);
        property.updated_at = now;

        let stored = self.properties.update(property).await?;
        info!(
            property = %id,
            reviewer = %reviewer,
            from = current.label(),
            to = next.label(),
            "listing status changed"
        );
        Ok(stored)
    }

    pub async fn set_featured(
        &self,
        id: PropertyId,
        featured: bool,
    ) -> Result<Property, ListingServiceError> {
        let mut property = self.fetch(id).await?;
        if featured && property.status != PropertyStatus::Approved {
            return Err(ListingServiceError::NotFeaturable);
        }
        if property.featured == featured {
            return Ok(property);
        }
        property.featured = featured;
        property.updated_at = Utc::now();
        let stored = self.properties.update(property).await?;
        info!(property = %id, featured, "featured flag updated");
        Ok(stored)
    }

    /// Remove a listing regardless of status, used by moderators.
    pub async fn remove(&self, id: PropertyId) -> Result<Property, ListingServiceError> {
        let property = self.fetch(id).await?;
        self.properties.delete(id).await?;
        self.remove_assets(&property).await;
        info!(property = %id, host = %property.host_id, "listing deleted");
        Ok(property)
    }

    /// Best-effort cleanup of a listing's stored photos and documents. Only paths under the
    /// owning host's prefix are touched.
    async fn remove_assets(&self, property: &Property) {
        let (photos, documents) = property.storage_paths();
        for (bucket, paths) in [
            (&self.buckets.photos, photos),
            (&self.buckets.documents, documents),
        ] {
            let paths: Vec<String> = paths
                .into_iter()
                .filter(|path| owned_by(path, property.host_id))
                .collect();
            if paths.is_empty() {
                continue;
            }
            if let Err(err) = self.storage.remove(bucket, &paths).await {
                warn!(
                    property = %property.id,
                    bucket = %bucket,
                    error = %err,
                    "failed to remove listing files"
                );
            }
        }
    }
}

/// Photos and documents must come from the submitting host's own uploads.
fn ensure_own_assets(
    host: UserId,
    submission: &ListingSubmission,
) -> Result<(), ListingServiceError> {
    let mut issues = Vec::new();
    if let Some(photo) = submission
        .photos
        .iter()
        .find(|photo| !owned_by(&photo.storage_path, host))
    {
        issues.push(ValidationIssue::new(
            WizardStep::Photos,
            "photos",
            format!("photo '{}' was not uploaded by this host", photo.storage_path),
        ));
    }
    if let Some(document) = submission
        .documents
        .iter()
        .find(|document| !owned_by(&document.storage_path, host))
    {
        issues.push(ValidationIssue::new(
            WizardStep::Documents,
            "documents",
            format!("document '{}' was not uploaded by this host", document.file_name),
        ));
    }
    if issues.is_empty() {
        Ok(())
    } else {
        warn!(host = %host, "submission references files outside the host's uploads");
        Err(ListingServiceError::Invalid(issues))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::backend::{InMemoryBackend, InMemoryStorage};
    use crate::listings::fixtures::{complete_draft, host_id, property, submission, user};
    use crate::listings::limits::PropertyLimits;
    use crate::platform::PlatformSettings;

    struct Harness {
        service: PropertyService,
        backend: Arc<InMemoryBackend>,
        storage: Arc<InMemoryStorage>,
    }

    fn harness_with(storage: Arc<dyn ObjectStorage>) -> (PropertyService, Arc<InMemoryBackend>) {
        let backend = Arc::new(InMemoryBackend::default());
        let limits = Arc::new(PropertyLimitsService::new(backend.clone(), backend.clone()));
        let service = PropertyService::new(
            backend.clone(),
            backend.clone(),
            backend.clone(),
            storage,
            limits,
            StorageBuckets::default(),
        );
        (service, backend)
    }

    fn harness() -> Harness {
        let storage = Arc::new(InMemoryStorage::default());
        let (service, backend) = harness_with(storage.clone());
        Harness {
            service,
            backend,
            storage,
        }
    }

    fn seeded_host(backend: &InMemoryBackend, role: UserRole) -> UserId {
        let profile = user(role, &format!("{}@example.test", host_id()));
        let id = profile.id;
        backend.seed_user(profile).unwrap();
        id
    }

    #[tokio::test]
    async fn first_submission_promotes_guest_to_host() {
        let h = harness();
        let guest = seeded_host(&h.backend, UserRole::Guest);

        let stored = h
            .service
            .submit_listing(guest, submission(guest))
            .await
            .unwrap();
        assert_eq!(stored.status, PropertyStatus::Pending);
        assert!(!stored.featured);

        let profile = UserRepository::fetch(&*h.backend, guest).await.unwrap().unwrap();
        assert_eq!(profile.role, UserRole::Host);
    }

    #[tokio::test]
    async fn unknown_profiles_cannot_submit() {
        let h = harness();
        let err = h
            .service
            .submit_listing(host_id(), submission(host_id()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn maintenance_mode_closes_submissions() {
        let h = harness();
        let host = seeded_host(&h.backend, UserRole::Host);
        h.backend
            .save_platform_settings(PlatformSettings {
                maintenance_mode: true,
                ..PlatformSettings::default()
            })
            .await
            .unwrap();

        let err = h
            .service
            .submit_listing(host, submission(host))
            .await
            .unwrap_err();
        assert!(matches!(err, ListingServiceError::SubmissionsClosed(_)));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn paused_listings_report_their_own_reason() {
        let h = harness();
        let host = seeded_host(&h.backend, UserRole::Host);
        h.backend
            .save_platform_settings(PlatformSettings {
                allow_new_listings: false,
                ..PlatformSettings::default()
            })
            .await
            .unwrap();

        let err = h
            .service
            .submit_listing(host, submission(host))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "new listings are not being accepted");
    }

    #[tokio::test]
    async fn blank_currency_takes_the_platform_default() {
        let h = harness();
        let host = seeded_host(&h.backend, UserRole::Host);
        h.backend
            .save_platform_settings(PlatformSettings {
                default_currency: "chf".to_string(),
                ..PlatformSettings::default()
            })
            .await
            .unwrap();

        let mut draft = complete_draft(host);
        if let Some(pricing) = draft.pricing.as_mut() {
            pricing.currency = "  ".to_string();
        }
        let stored = h.service.submit_draft(host, &draft).await.unwrap();
        assert_eq!(stored.pricing.currency, "CHF");
    }

    #[tokio::test]
    async fn pending_limit_blocks_submission() {
        let h = harness();
        let host = seeded_host(&h.backend, UserRole::Host);
        h.backend
            .save_property_limits(PropertyLimits {
                max_properties_per_host: 5,
                max_pending_per_host: 1,
            })
            .await
            .unwrap();
        h.service.submit_listing(host, submission(host)).await.unwrap();

        let err = h
            .service
            .submit_listing(host, submission(host))
            .await
            .unwrap_err();
        assert!(matches!(err, ListingServiceError::LimitReached(_)));
    }

    #[tokio::test]
    async fn submit_draft_uses_live_photo_rules() {
        let h = harness();
        let host = seeded_host(&h.backend, UserRole::Host);
        h.backend
            .save_platform_settings(PlatformSettings {
                min_photos: 8,
                max_photos: 12,
                ..PlatformSettings::default()
            })
            .await
            .unwrap();

        let err = h
            .service
            .submit_draft(host, &complete_draft(host))
            .await
            .unwrap_err();
        match err {
            ListingServiceError::Invalid(issues) => {
                assert!(issues.iter().any(|issue| issue.field == "photos"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejection_requires_reason_and_clears_feature() {
        let h = harness();
        let host = host_id();
        let reviewer = host_id();
        let listing = property(host, PropertyStatus::UnderReview);
        let id = listing.id;
        h.backend.seed_property(listing).unwrap();

        let err = h
            .service
            .transition(id, PropertyStatus::Rejected, Some("   ".to_string()), reviewer)
            .await
            .unwrap_err();
        assert!(matches!(err, ListingServiceError::ReasonRequired));

        let rejected = h
            .service
            .transition(
                id,
                PropertyStatus::Rejected,
                Some(" Photos are blurry ".to_string()),
                reviewer,
            )
            .await
            .unwrap();
        assert_eq!(rejected.rejection_reason.as_deref(), Some("Photos are blurry"));
        assert_eq!(rejected.reviewed_by, Some(reviewer));
        assert!(rejected.reviewed_at.is_some());
    }

    #[tokio::test]
    async fn approved_listings_cannot_change_status() {
        let h = harness();
        let listing = property(host_id(), PropertyStatus::Approved);
        let id = listing.id;
        h.backend.seed_property(listing).unwrap();

        let err = h
            .service
            .transition(id, PropertyStatus::Pending, None, host_id())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn only_approved_listings_are_featured() {
        let h = harness();
        let pending = property(host_id(), PropertyStatus::Pending);
        let approved = property(host_id(), PropertyStatus::Approved);
        let (pending_id, approved_id) = (pending.id, approved.id);
        h.backend.seed_property(pending).unwrap();
        h.backend.seed_property(approved).unwrap();

        assert!(matches!(
            h.service.set_featured(pending_id, true).await,
            Err(ListingServiceError::NotFeaturable)
        ));
        let featured = h.service.set_featured(approved_id, true).await.unwrap();
        assert!(featured.featured);
    }

    #[tokio::test]
    async fn resubmission_returns_rejected_listing_to_queue() {
        let h = harness();
        let host = seeded_host(&h.backend, UserRole::Host);
        let mut listing = property(host, PropertyStatus::Rejected);
        listing.rejection_reason = Some("Missing deed".to_string());
        let id = listing.id;
        h.backend.seed_property(listing).unwrap();

        let mut draft = complete_draft(host);
        if let Some(info) = draft.basic_info.as_mut() {
            info.name = "Canal House Studio (renovated)".to_string();
        }
        let stranger = host_id();
        assert!(matches!(
            h.service.resubmit(stranger, id, &draft).await,
            Err(ListingServiceError::Forbidden)
        ));

        let updated = h.service.resubmit(host, id, &draft).await.unwrap();
        assert_eq!(updated.status, PropertyStatus::Pending);
        assert_eq!(updated.rejection_reason, None);
        assert_eq!(updated.basic_info.name, "Canal House Studio (renovated)");
    }

    #[tokio::test]
    async fn withdraw_removes_listing_and_files() {
        let h = harness();
        let host = host_id();
        let listing = property(host, PropertyStatus::Pending);
        let photo_path = listing.photos[0].storage_path.clone();
        h.storage
            .upload("property-photos", &photo_path, vec![1], "image/jpeg")
            .await
            .unwrap();
        let id = listing.id;
        h.backend.seed_property(listing).unwrap();

        h.service.withdraw(host, id).await.unwrap();
        assert!(matches!(
            h.service.fetch(id).await,
            Err(ListingServiceError::NotFound(_))
        ));
        assert!(h.storage.object("property-photos", &photo_path).is_none());
    }

    #[tokio::test]
    async fn drafts_cannot_reference_another_hosts_uploads() {
        let h = harness();
        let owner = seeded_host(&h.backend, UserRole::Host);
        let other = seeded_host(&h.backend, UserRole::Host);
        let owner_photo = format!("{owner}/d1/photo/front.jpg");
        h.storage
            .upload("property-photos", &owner_photo, vec![1], "image/jpeg")
            .await
            .unwrap();

        let mut draft = complete_draft(other);
        draft.photos[0].storage_path = owner_photo.clone();
        match h.service.submit_draft(other, &draft).await.unwrap_err() {
            ListingServiceError::Invalid(issues) => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].field, "photos");
            }
            err => panic!("unexpected error {err:?}"),
        }

        let mut draft = complete_draft(other);
        draft.documents[0].storage_path = format!("{other}/../{owner}/d1/document/id.pdf");
        match h.service.submit_draft(other, &draft).await.unwrap_err() {
            ListingServiceError::Invalid(issues) => {
                assert_eq!(issues[0].field, "documents");
                assert_eq!(issues[0].step, WizardStep::Documents);
            }
            err => panic!("unexpected error {err:?}"),
        }
        assert!(h.storage.object("property-photos", &owner_photo).is_some());
    }

    #[tokio::test]
    async fn resubmission_rejects_foreign_documents() {
        let h = harness();
        let host = seeded_host(&h.backend, UserRole::Host);
        let listing = property(host, PropertyStatus::Rejected);
        let id = listing.id;
        h.backend.seed_property(listing).unwrap();

        let mut draft = complete_draft(host);
        draft.documents[1].storage_path = format!("{}/d1/document/deed.pdf", host_id());
        assert!(matches!(
            h.service.resubmit(host, id, &draft).await,
            Err(ListingServiceError::Invalid(_))
        ));
        assert_eq!(h.service.fetch(id).await.unwrap().status, PropertyStatus::Rejected);
    }

    #[tokio::test]
    async fn withdraw_leaves_files_outside_the_hosts_prefix() {
        let h = harness();
        let host = host_id();
        let owner_photo = format!("{}/d1/photo/front.jpg", host_id());
        h.storage
            .upload("property-photos", &owner_photo, vec![1], "image/jpeg")
            .await
            .unwrap();
        let mut listing = property(host, PropertyStatus::Pending);
        listing.photos[0].storage_path = owner_photo.clone();
        let own_photo = listing.photos[1].storage_path.clone();
        h.storage
            .upload("property-photos", &own_photo, vec![2], "image/jpeg")
            .await
            .unwrap();
        let id = listing.id;
        h.backend.seed_property(listing).unwrap();

        h.service.withdraw(host, id).await.unwrap();
        assert!(h.storage.object("property-photos", &owner_photo).is_some());
        assert!(h.storage.object("property-photos", &own_photo).is_none());
    }

    #[tokio::test]
    async fn approved_listings_cannot_be_withdrawn() {
        let h = harness();
        let host = host_id();
        let listing = property(host, PropertyStatus::Approved);
        let id = listing.id;
        h.backend.seed_property(listing).unwrap();

        assert!(matches!(
            h.service.withdraw(host, id).await,
            Err(ListingServiceError::NotWithdrawable(PropertyStatus::Approved))
        ));
    }

    /// Lands a second pending listing for the same host just before each insert.
    struct RacingProperties {
        inner: Arc<InMemoryBackend>,
    }

    #[async_trait]
    impl PropertyRepository for RacingProperties {
        async fn insert(&self, property: Property) -> Result<Property, BackendError> {
            let rival =
                crate::listings::fixtures::property(property.host_id, PropertyStatus::Pending);
            PropertyRepository::insert(&*self.inner, rival).await?;
            PropertyRepository::insert(&*self.inner, property).await
        }

        async fn update(&self, property: Property) -> Result<Property, BackendError> {
            PropertyRepository::update(&*self.inner, property).await
        }

        async fn fetch(&self, id: PropertyId) -> Result<Option<Property>, BackendError> {
            PropertyRepository::fetch(&*self.inner, id).await
        }

        async fn list(&self, filter: &PropertyFilter) -> Result<Vec<Property>, BackendError> {
            PropertyRepository::list(&*self.inner, filter).await
        }

        async fn delete(&self, id: PropertyId) -> Result<(), BackendError> {
            PropertyRepository::delete(&*self.inner, id).await
        }
    }

    #[tokio::test]
    async fn submission_racing_past_pending_limit_is_rolled_back() {
        let backend = Arc::new(InMemoryBackend::default());
        let properties: Arc<dyn PropertyRepository> = Arc::new(RacingProperties {
            inner: backend.clone(),
        });
        let limits = Arc::new(PropertyLimitsService::new(backend.clone(), properties.clone()));
        let service = PropertyService::new(
            properties,
            backend.clone(),
            backend.clone(),
            Arc::new(InMemoryStorage::default()),
            limits,
            StorageBuckets::default(),
        );
        backend
            .save_property_limits(PropertyLimits {
                max_properties_per_host: 10,
                max_pending_per_host: 1,
            })
            .await
            .unwrap();
        let guest = seeded_host(&backend, UserRole::Guest);

        let err = service
            .submit_listing(guest, submission(guest))
            .await
            .unwrap_err();
        assert!(matches!(err, ListingServiceError::LimitReached(_)));

        let remaining = service.list_for_host(guest).await.unwrap();
        assert_eq!(remaining.len(), 1);
        let profile = UserRepository::fetch(&*backend, guest).await.unwrap().unwrap();
        assert_eq!(profile.role, UserRole::Guest);
    }

    struct BrokenStorage;

    #[async_trait]
    impl ObjectStorage for BrokenStorage {
        async fn upload(
            &self,
            _bucket: &str,
            _path: &str,
            _bytes: Vec<u8>,
            _content_type: &str,
        ) -> Result<(), BackendError> {
            Err(BackendError::Unavailable("storage offline".to_string()))
        }

        async fn remove(&self, _bucket: &str, _paths: &[String]) -> Result<(), BackendError> {
            Err(BackendError::Unavailable("storage offline".to_string()))
        }

        async fn signed_url(
            &self,
            _bucket: &str,
            _path: &str,
            _expires_in_secs: u64,
        ) -> Result<String, BackendError> {
            Err(BackendError::Unavailable("storage offline".to_string()))
        }

        fn public_url(&self, bucket: &str, path: &str) -> String {
            format!("broken://{bucket}/{path}")
        }
    }

    #[tokio::test]
    async fn storage_failures_do_not_block_deletion() {
        let (service, backend) = harness_with(Arc::new(BrokenStorage));
        let listing = property(host_id(), PropertyStatus::Approved);
        let id = listing.id;
        backend.seed_property(listing).unwrap();

        let removed = service.remove(id).await.unwrap();
        assert_eq!(removed.id, id);
        assert!(PropertyRepository::fetch(&*backend, id).await.unwrap().is_none());
    }
}

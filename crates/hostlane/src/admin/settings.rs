use serde::Serialize;
use tracing::info;

use super::{AdminError, AdminService};
use crate::listings::domain::UserId;
use crate::listings::{HostLimitOverride, LimitCheck, PropertyLimits};
use crate::platform::PlatformSettings;

/// Global limits together with every per-host override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitsOverview {
    pub limits: PropertyLimits,
    pub overrides: Vec<HostLimitOverride>,
}

impl AdminService {
    pub async fn get_settings(&self, caller: UserId) -> Result<PlatformSettings, AdminError> {
        self.authorize(caller).await?;
        Ok(self.settings.platform_settings().await?)
    }

    pub async fn update_settings(
        &self,
        caller: UserId,
        settings: PlatformSettings,
    ) -> Result<PlatformSettings, AdminError> {
        self.authorize(caller).await?;
        settings.validate()?;
        let saved = self.settings.save_platform_settings(settings).await?;
        info!(
            admin = %caller,
            maintenance = saved.maintenance_mode,
            accepting = saved.allow_new_listings,
            "platform settings updated"
        );
        Ok(saved)
    }

    pub async fn get_limits(&self, caller: UserId) -> Result<LimitsOverview, AdminError> {
        self.authorize(caller).await?;
        Ok(LimitsOverview {
            limits: self.limits.limits().await?,
            overrides: self.limits.list_overrides().await?,
        })
    }

    pub async fn update_limits(
        &self,
        caller: UserId,
        limits: PropertyLimits,
    ) -> Result<PropertyLimits, AdminError> {
        self.authorize(caller).await?;
        Ok(self.limits.update_limits(limits).await?)
    }

    pub async fn set_host_override(
        &self,
        caller: UserId,
        host: UserId,
        max_properties: u32,
        note: Option<String>,
    ) -> Result<HostLimitOverride, AdminError> {
        self.authorize(caller).await?;
        if self.users.fetch(host).await?.is_none() {
            return Err(AdminError::UserNotFound(host));
        }
        Ok(self
            .limits
            .set_host_override(host, max_properties, note)
            .await?)
    }

    pub async fn clear_host_override(
        &self,
        caller: UserId,
        host: UserId,
    ) -> Result<(), AdminError> {
        self.authorize(caller).await?;
        Ok(self.limits.clear_host_override(host).await?)
    }

    /// Limit status of one host, as the host would see it on submission.
    pub async fn host_limit_check(
        &self,
        caller: UserId,
        host: UserId,
    ) -> Result<LimitCheck, AdminError> {
        self.authorize(caller).await?;
        Ok(self.limits.check(host).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::testing::harness;
    use crate::listings::domain::UserRole;
    use crate::listings::fixtures::user;
    use crate::listings::LimitsError;
    use crate::platform::SettingsError;

    #[tokio::test]
    async fn settings_round_trip_through_the_backend() {
        let h = harness();
        let mut settings = h.admin.get_settings(h.admin_id).await.unwrap();
        assert_eq!(settings, PlatformSettings::default());

        settings.maintenance_mode = true;
        settings.min_photos = 3;
        h.admin
            .update_settings(h.admin_id, settings.clone())
            .await
            .unwrap();
        assert_eq!(h.admin.get_settings(h.admin_id).await.unwrap(), settings);
    }

    #[tokio::test]
    async fn invalid_settings_are_not_saved() {
        let h = harness();
        let settings = PlatformSettings {
            default_currency: "euro".to_string(),
            ..PlatformSettings::default()
        };
        let err = h
            .admin
            .update_settings(h.admin_id, settings)
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::Settings(SettingsError::Currency(_))));
        assert_eq!(
            h.admin.get_settings(h.admin_id).await.unwrap().default_currency,
            "USD"
        );
    }

    #[tokio::test]
    async fn overrides_show_up_in_overview() {
        let h = harness();
        let host = user(UserRole::Host, "big@example.test");
        let host_id = host.id;
        h.backend.seed_user(host).unwrap();

        h.admin
            .set_host_override(h.admin_id, host_id, 40, Some(" agency ".to_string()))
            .await
            .unwrap();
        let overview = h.admin.get_limits(h.admin_id).await.unwrap();
        assert_eq!(overview.limits, PropertyLimits::default());
        assert_eq!(overview.overrides[0].note.as_deref(), Some("agency"));

        let check = h.admin.host_limit_check(h.admin_id, host_id).await.unwrap();
        assert_eq!(check.max_properties, 40);

        h.admin.clear_host_override(h.admin_id, host_id).await.unwrap();
        let err = h
            .admin
            .clear_host_override(h.admin_id, host_id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AdminError::Limits(LimitsError::OverrideNotFound(_))
        ));
    }

    #[tokio::test]
    async fn override_requires_known_host() {
        let h = harness();
        let missing = UserId(uuid::Uuid::new_v4());
        assert!(matches!(
            h.admin.set_host_override(h.admin_id, missing, 5, None).await,
            Err(AdminError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn limits_are_validated() {
        let h = harness();
        let err = h
            .admin
            .update_limits(
                h.admin_id,
                PropertyLimits {
                    max_properties_per_host: 2,
                    max_pending_per_host: 5,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    }
}

//! Platform-wide settings edited from the admin dashboard and read by the listing flow.

use serde::{Deserialize, Serialize};

/// Singleton row of the backend's `platform_settings` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformSettings {
    pub site_name: String,
    pub support_email: String,
    pub maintenance_mode: bool,
    pub allow_new_listings: bool,
    pub min_photos: usize,
    pub max_photos: usize,
    pub max_units_per_listing: u16,
    pub deposit_cap_multiplier: f32,
    pub require_documents: bool,
    pub default_currency: String,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            site_name: "Hostlane".to_string(),
            support_email: "support@hostlane.example".to_string(),
            maintenance_mode: false,
            allow_new_listings: true,
            min_photos: 5,
            max_photos: 30,
            max_units_per_listing: 500,
            deposit_cap_multiplier: 3.0,
            require_documents: true,
            default_currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("site name cannot be empty")]
    EmptySiteName,
    #[error("support email '{0}' is not a valid address")]
    InvalidSupportEmail(String),
    #[error("photo bounds are inconsistent (min {min}, max {max})")]
    PhotoBounds { min: usize, max: usize },
    #[error("max units per listing must be at least 1")]
    MaxUnits,
    #[error("deposit cap multiplier must be a positive number")]
    DepositCap,
    #[error("default currency '{0}' must be a three-letter ISO code")]
    Currency(String),
}

impl PlatformSettings {
    /// Why hosts may not submit new listings right now, maintenance taking precedence.
    /// `None` while submissions are open.
    pub fn closed_reason(&self) -> Option<&'static str> {
        if self.maintenance_mode {
            Some("the platform is in maintenance mode")
        } else if !self.allow_new_listings {
            Some("new listings are not being accepted")
        } else {
            None
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.site_name.trim().is_empty() {
            return Err(SettingsError::EmptySiteName);
        }
        let email = self.support_email.trim();
        let valid_email = match email.split_once('@') {
            Some((local, domain)) => !local.is_empty() && domain.contains('.'),
            None => false,
        };
        if !valid_email {
            return Err(SettingsError::InvalidSupportEmail(email.to_string()));
        }
        if self.min_photos == 0 || self.max_photos < self.min_photos {
            return Err(SettingsError::PhotoBounds {
                min: self.min_photos,
                max: self.max_photos,
            });
        }
        if self.max_units_per_listing == 0 {
            return Err(SettingsError::MaxUnits);
        }
        if !self.deposit_cap_multiplier.is_finite() || self.deposit_cap_multiplier <= 0.0 {
            return Err(SettingsError::DepositCap);
        }
        let currency = self.default_currency.trim();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(SettingsError::Currency(currency.to_string()));
        }
        Ok(())
    }
}

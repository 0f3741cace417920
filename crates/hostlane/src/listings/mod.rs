//! Host-facing listing surface: catalog data, the listing wizard, submission and
//! lifecycle rules, per-host limits and file uploads.

pub mod catalog;
pub mod domain;
pub mod limits;
pub mod router;
pub mod service;
pub mod uploads;
pub mod wizard;

#[cfg(test)]
pub(crate) mod fixtures;

pub use limits::{HostLimitOverride, LimitCheck, LimitsError, PropertyLimits, PropertyLimitsService};
pub use router::listing_router;
pub use service::{ListingServiceError, PropertyService};
pub use uploads::{
    StorageBuckets, StoredObject, UploadError, UploadKind, UploadRequest, UploadService,
};

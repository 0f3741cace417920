use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::catalog::{BedType, DocumentKind, ListingMode, PropertyCategory, PropertySubtype};

/// Identifier wrapper for stored properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(pub Uuid);

impl PropertyId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a platform profile (host, guest or admin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Moderation lifecycle of a property listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl PropertyStatus {
    pub const fn ordered() -> [PropertyStatus; 4] {
        [
            PropertyStatus::Pending,
            PropertyStatus::UnderReview,
            PropertyStatus::Approved,
            PropertyStatus::Rejected,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            PropertyStatus::Pending => "pending",
            PropertyStatus::UnderReview => "under_review",
            PropertyStatus::Approved => "approved",
            PropertyStatus::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|status| status.label() == raw.trim())
    }

    pub const fn can_transition_to(self, next: PropertyStatus) -> bool {
        matches!(
            (self, next),
            (PropertyStatus::Pending, PropertyStatus::UnderReview)
                | (PropertyStatus::Pending, PropertyStatus::Approved)
                | (PropertyStatus::Pending, PropertyStatus::Rejected)
                | (PropertyStatus::UnderReview, PropertyStatus::Approved)
                | (PropertyStatus::UnderReview, PropertyStatus::Rejected)
                | (PropertyStatus::Rejected, PropertyStatus::Pending)
        )
    }

    /// Statuses still waiting on an admin decision.
    pub const fn awaiting_review(self) -> bool {
        matches!(self, PropertyStatus::Pending | PropertyStatus::UnderReview)
    }
}

/// Descriptive fields captured on the basic-info step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicInfo {
    pub name: String,
    pub description: String,
    pub street_address: String,
    pub city: String,
    #[serde(default)]
    pub region: Option<String>,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BedCount {
    pub bed_type: BedType,
    pub count: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bedroom {
    #[serde(default)]
    pub name: Option<String>,
    pub beds: Vec<BedCount>,
}

/// Room and bed layout of one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfiguration {
    pub bedrooms: Vec<Bedroom>,
    #[serde(default)]
    pub living_room_beds: Vec<BedCount>,
    pub bathrooms: u8,
    pub max_guests: u8,
}

/// Aggregated bed counts for a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BedSummary {
    pub bedroom_count: usize,
    pub total_beds: u32,
    pub sleeping_capacity: u32,
    pub beds_by_type: BTreeMap<BedType, u32>,
}

impl RoomConfiguration {
    pub fn bed_summary(&self) -> BedSummary {
        let mut summary = BedSummary {
            bedroom_count: self.bedrooms.len(),
            ..BedSummary::default()
        };

        let beds = self
            .bedrooms
            .iter()
            .flat_map(|room| room.beds.iter())
            .chain(self.living_room_beds.iter());
        for bed in beds {
            let count = u32::from(bed.count);
            *summary.beds_by_type.entry(bed.bed_type).or_default() += count;
            summary.total_beds += count;
            summary.sleeping_capacity += count * bed.bed_type.sleeps();
        }

        summary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub currency: String,
    pub nightly_rate: u32,
    #[serde(default)]
    pub weekend_rate: Option<u32>,
    #[serde(default)]
    pub cleaning_fee: u32,
    #[serde(default)]
    pub security_deposit: u32,
    #[serde(default)]
    pub weekly_discount_pct: u8,
    #[serde(default)]
    pub monthly_discount_pct: u8,
    pub min_nights: u16,
    #[serde(default)]
    pub max_nights: Option<u16>,
}

/// Price breakdown for a stay of a given length at the base nightly rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StayQuote {
    pub nights: u16,
    pub subtotal: u64,
    pub discount: u64,
    pub cleaning_fee: u64,
    pub total: u64,
}

impl Pricing {
    pub const WEEKLY_NIGHTS: u16 = 7;
    pub const MONTHLY_NIGHTS: u16 = 28;

    pub fn quote(&self, nights: u16) -> StayQuote {
        let subtotal = u64::from(self.nightly_rate) * u64::from(nights);
        let discount_pct = if nights >= Self::MONTHLY_NIGHTS && self.monthly_discount_pct > 0 {
            self.monthly_discount_pct
        } else if nights >= Self::WEEKLY_NIGHTS {
            self.weekly_discount_pct
        } else {
            0
        };
        let discount = subtotal * u64::from(discount_pct.min(100)) / 100;
        let cleaning_fee = if nights == 0 {
            0
        } else {
            u64::from(self.cleaning_fee)
        };

        StayQuote {
            nights,
            subtotal,
            discount,
            cleaning_fee,
            total: subtotal.saturating_sub(discount) + cleaning_fee,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationPolicy {
    Flexible,
    Moderate,
    Strict,
    NonRefundable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseRules {
    pub smoking_allowed: bool,
    pub pets_allowed: bool,
    pub parties_allowed: bool,
    pub children_allowed: bool,
    #[serde(default)]
    pub quiet_hours_start: Option<NaiveTime>,
    #[serde(default)]
    pub quiet_hours_end: Option<NaiveTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policies {
    pub check_in_from: NaiveTime,
    #[serde(default)]
    pub check_in_until: Option<NaiveTime>,
    pub check_out_until: NaiveTime,
    pub cancellation: CancellationPolicy,
    pub house_rules: HouseRules,
}

/// Uploaded listing photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoAsset {
    pub storage_path: String,
    pub url: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub is_cover: bool,
}

/// Uploaded verification document. The URL is never stored; documents live in a
/// private bucket and are read through signed URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentAsset {
    pub kind: DocumentKind,
    pub storage_path: String,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Stored listing as persisted in the backend's `properties` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub host_id: UserId,
    pub status: PropertyStatus,
    pub featured: bool,
    pub category: PropertyCategory,
    pub subtype: Option<PropertySubtype>,
    pub mode: ListingMode,
    pub unit_count: u16,
    pub basic_info: BasicInfo,
    pub rooms: RoomConfiguration,
    pub amenities: Vec<String>,
    pub photos: Vec<PhotoAsset>,
    pub pricing: Pricing,
    pub policies: Policies,
    pub documents: Vec<DocumentAsset>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub reviewed_by: Option<UserId>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Property {
    pub fn cover_photo(&self) -> Option<&PhotoAsset> {
        self.photos
            .iter()
            .find(|photo| photo.is_cover)
            .or_else(|| self.photos.first())
    }

    /// Storage paths of every photo and document attached to the listing.
    pub fn storage_paths(&self) -> (Vec<String>, Vec<String>) {
        let photos = self
            .photos
            .iter()
            .map(|photo| photo.storage_path.clone())
            .collect();
        let documents = self
            .documents
            .iter()
            .map(|document| document.storage_path.clone())
            .collect();
        (photos, documents)
    }

    pub fn summary_view(&self) -> PropertySummaryView {
        PropertySummaryView {
            id: self.id,
            host_id: self.host_id,
            name: self.basic_info.name.clone(),
            city: self.basic_info.city.clone(),
            country: self.basic_info.country.clone(),
            category: self.category,
            status: self.status,
            status_label: self.status.label(),
            featured: self.featured,
            nightly_rate: self.pricing.nightly_rate,
            currency: self.pricing.currency.clone(),
            cover_photo_url: self.cover_photo().map(|photo| photo.url.clone()),
            rejection_reason: self.rejection_reason.clone(),
            created_at: self.created_at,
        }
    }
}

/// Compact listing view for tables and dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct PropertySummaryView {
    pub id: PropertyId,
    pub host_id: UserId,
    pub name: String,
    pub city: String,
    pub country: String,
    pub category: PropertyCategory,
    pub status: PropertyStatus,
    pub status_label: &'static str,
    pub featured: bool,
    pub nightly_rate: u32,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Platform role stored on the backend profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Guest,
    Host,
    Admin,
}

impl UserRole {
    pub const fn ordered() -> [UserRole; 3] {
        [UserRole::Guest, UserRole::Host, UserRole::Admin]
    }

    pub const fn label(self) -> &'static str {
        match self {
            UserRole::Guest => "guest",
            UserRole::Host => "host",
            UserRole::Admin => "admin",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|role| role.label() == raw.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// Identifier of a featured destination row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationId(pub Uuid);

impl DestinationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Destination promoted on the public landing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturedDestination {
    pub id: DestinationId,
    pub name: String,
    pub country: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub display_order: u32,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pricing() -> Pricing {
        Pricing {
            currency: "EUR".to_string(),
            nightly_rate: 100,
            weekend_rate: None,
            cleaning_fee: 40,
            security_deposit: 0,
            weekly_discount_pct: 10,
            monthly_discount_pct: 25,
            min_nights: 1,
            max_nights: None,
        }
    }

    #[test]
    fn status_lifecycle_only_allows_documented_moves() {
        use PropertyStatus::*;
        assert!(Pending.can_transition_to(UnderReview));
        assert!(UnderReview.can_transition_to(Rejected));
        assert!(Rejected.can_transition_to(Pending));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Approved.can_transition_to(Pending));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn status_labels_round_trip() {
        for status in PropertyStatus::ordered() {
            assert_eq!(PropertyStatus::parse(status.label()), Some(status));
        }
        assert_eq!(PropertyStatus::parse("archived"), None);
    }

    #[test]
    fn bed_summary_counts_living_room_and_ignores_cribs_for_capacity() {
        let rooms = RoomConfiguration {
            bedrooms: vec![
                Bedroom {
                    name: Some("Main".to_string()),
                    beds: vec![BedCount {
                        bed_type: BedType::King,
                        count: 1,
                    }],
                },
                Bedroom {
                    name: None,
                    beds: vec![
                        BedCount {
                            bed_type: BedType::Single,
                            count: 2,
                        },
                        BedCount {
                            bed_type: BedType::Crib,
                            count: 1,
                        },
                    ],
                },
            ],
            living_room_beds: vec![BedCount {
                bed_type: BedType::SofaBed,
                count: 1,
            }],
            bathrooms: 2,
            max_guests: 6,
        };

        let summary = rooms.bed_summary();
        assert_eq!(summary.bedroom_count, 2);
        assert_eq!(summary.total_beds, 5);
        assert_eq!(summary.sleeping_capacity, 6);
        assert_eq!(summary.beds_by_type.get(&BedType::Single), Some(&2));
    }

    #[test]
    fn quote_applies_weekly_then_monthly_discount() {
        let pricing = pricing();
        let short = pricing.quote(3);
        assert_eq!(short.discount, 0);
        assert_eq!(short.total, 340);

        let week = pricing.quote(7);
        assert_eq!(week.discount, 70);
        assert_eq!(week.total, 700 - 70 + 40);

        let month = pricing.quote(30);
        assert_eq!(month.discount, 750);
        assert_eq!(month.total, 3000 - 750 + 40);
    }

    #[test]
    fn oversized_discount_is_capped_at_the_subtotal() {
        let mut pricing = pricing();
        pricing.weekly_discount_pct = 200;
        let week = pricing.quote(7);
        assert_eq!(week.discount, week.subtotal);
        assert_eq!(week.total, 40);
    }

    #[test]
    fn zero_night_quote_has_no_cleaning_fee() {
        assert_eq!(pricing().quote(0).total, 0);
    }
}

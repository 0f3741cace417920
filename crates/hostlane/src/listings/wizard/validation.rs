use serde::Serialize;

use super::draft::ListingDraft;
use super::steps::{following, WizardStep};
use crate::listings::catalog::{find_amenity, ListingMode};
use crate::platform::PlatformSettings;

pub const MAX_NAME_CHARS: usize = 100;
pub const MIN_DESCRIPTION_CHARS: usize = 20;
pub const MAX_DISCOUNT_PCT: u8 = 90;

/// Platform-configured dials the wizard validates against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WizardRules {
    pub min_photos: usize,
    pub max_photos: usize,
    pub max_units: u16,
    pub deposit_cap_multiplier: f32,
    pub require_documents: bool,
    /// Applied when the host leaves the pricing currency blank.
    pub default_currency: String,
}

impl Default for WizardRules {
    fn default() -> Self {
        Self::from(&PlatformSettings::default())
    }
}

impl From<&PlatformSettings> for WizardRules {
    fn from(settings: &PlatformSettings) -> Self {
        Self {
            min_photos: settings.min_photos,
            max_photos: settings.max_photos,
            max_units: settings.max_units_per_listing,
            deposit_cap_multiplier: settings.deposit_cap_multiplier,
            require_documents: settings.require_documents,
            default_currency: settings.default_currency.trim().to_ascii_uppercase(),
        }
    }
}

impl WizardRules {
    pub fn max_deposit_for(&self, nightly_rate: u32) -> u64 {
        let max = f64::from(nightly_rate) * f64::from(self.deposit_cap_multiplier.max(0.0));
        max.ceil().min(u64::MAX as f64) as u64
    }
}

/// A single problem preventing a step from being completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub step: WizardStep,
    pub field: &'static str,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(step: WizardStep, field: &'static str, message: impl Into<String>) -> Self {
        Self {
            step,
            field,
            message: message.into(),
        }
    }
}

struct Issues {
    step: WizardStep,
    found: Vec<ValidationIssue>,
}

impl Issues {
    fn new(step: WizardStep) -> Self {
        Self {
            step,
            found: Vec::new(),
        }
    }

    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.found.push(ValidationIssue::new(self.step, field, message));
    }

    fn require(&mut self, condition: bool, field: &'static str, message: impl Into<String>) {
        if !condition {
            self.push(field, message);
        }
    }

    fn finish(self) -> Vec<ValidationIssue> {
        self.found
    }
}

/// Validate the values a single step is responsible for.
pub fn validate_step(
    step: WizardStep,
    draft: &ListingDraft,
    rules: &WizardRules,
) -> Vec<ValidationIssue> {
    let mut issues = Issues::new(step);
    match step {
        WizardStep::Category => {
            issues.require(draft.category.is_some(), "category", "choose a property category");
        }
        WizardStep::Subtype => match (draft.category, draft.subtype) {
            (_, None) => issues.push("subtype", "choose a property type"),
            (Some(category), Some(subtype)) if subtype.category() != category => issues.push(
                "subtype",
                format!("{} is not a {} type", subtype.label(), category.label()),
            ),
            _ => {}
        },
        WizardStep::ListingMode => {
            issues.require(
                draft.effective_mode().is_some(),
                "mode",
                "choose whether you are listing one or multiple units",
            );
        }
        WizardStep::Quantity => validate_quantity(draft, rules, &mut issues),
        WizardStep::BasicInfo => validate_basic_info(draft, &mut issues),
        WizardStep::Rooms => validate_rooms(draft, &mut issues),
        WizardStep::Amenities => {
            for key in &draft.amenities {
                if find_amenity(key).is_none() {
                    issues.push("amenities", format!("unknown amenity '{key}'"));
                }
            }
        }
        WizardStep::Photos => validate_photos(draft, rules, &mut issues),
        WizardStep::Pricing => validate_pricing(draft, rules, &mut issues),
        WizardStep::Policies => validate_policies(draft, &mut issues),
        WizardStep::Documents => {
            if rules.require_documents {
                let checklist = draft.checklist();
                for kind in checklist.missing {
                    issues.push("documents", format!("{} is required", kind.label()));
                }
            }
        }
        WizardStep::Review => return validate_all(draft, rules),
        WizardStep::Submitted => {}
    }
    issues.finish()
}

/// Validate every step on the path the draft's choices select.
pub fn validate_all(draft: &ListingDraft, rules: &WizardRules) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut current = WizardStep::Category;
    while current != WizardStep::Review {
        issues.extend(validate_step(current, draft, rules));
        match following(current, draft) {
            Some(next) => current = next,
            None => break,
        }
    }
    issues
}

fn validate_quantity(draft: &ListingDraft, rules: &WizardRules, issues: &mut Issues) {
    let minimum = match (draft.category, draft.effective_mode()) {
        (Some(category), _) if category.always_multi_unit() => 1,
        (_, Some(ListingMode::Multiple)) => 2,
        _ => 1,
    };
    match draft.quantity {
        None => issues.push("quantity", "enter how many units you are listing"),
        Some(quantity) if quantity < minimum => {
            issues.push("quantity", format!("at least {minimum} units are required"))
        }
        Some(quantity) if quantity > rules.max_units => issues.push(
            "quantity",
            format!("at most {} units can be listed at once", rules.max_units),
        ),
        Some(_) => {}
    }
}

fn validate_basic_info(draft: &ListingDraft, issues: &mut Issues) {
    let Some(info) = &draft.basic_info else {
        issues.push("basic_info", "basic information is required");
        return;
    };

    let name = info.name.trim();
    issues.require(!name.is_empty(), "name", "property name is required");
    issues.require(
        name.chars().count() <= MAX_NAME_CHARS,
        "name",
        format!("property name must be at most {MAX_NAME_CHARS} characters"),
    );
    issues.require(
        info.description.trim().chars().count() >= MIN_DESCRIPTION_CHARS,
        "description",
        format!("description must be at least {MIN_DESCRIPTION_CHARS} characters"),
    );
    issues.require(
        !info.street_address.trim().is_empty(),
        "street_address",
        "street address is required",
    );
    issues.require(!info.city.trim().is_empty(), "city", "city is required");
    issues.require(
        !info.postal_code.trim().is_empty(),
        "postal_code",
        "postal code is required",
    );
    issues.require(!info.country.trim().is_empty(), "country", "country is required");

    match (info.latitude, info.longitude) {
        (Some(lat), Some(lng)) => {
            issues.require(
                (-90.0..=90.0).contains(&lat),
                "latitude",
                "latitude must be between -90 and 90",
            );
            issues.require(
                (-180.0..=180.0).contains(&lng),
                "longitude",
                "longitude must be between -180 and 180",
            );
        }
        (None, None) => {}
        _ => issues.push("latitude", "latitude and longitude must be provided together"),
    }
}

fn validate_rooms(draft: &ListingDraft, issues: &mut Issues) {
    let Some(rooms) = &draft.rooms else {
        issues.push("rooms", "room configuration is required");
        return;
    };

    issues.require(!rooms.bedrooms.is_empty(), "bedrooms", "add at least one bedroom");
    for (index, bedroom) in rooms.bedrooms.iter().enumerate() {
        let beds: u32 = bedroom.beds.iter().map(|bed| u32::from(bed.count)).sum();
        if beds == 0 {
            issues.push("bedrooms", format!("bedroom {} has no beds", index + 1));
        }
    }
    issues.require(rooms.bathrooms >= 1, "bathrooms", "add at least one bathroom");

    let capacity = rooms.bed_summary().sleeping_capacity;
    if rooms.max_guests == 0 {
        issues.push("max_guests", "at least one guest must be allowed");
    } else if u32::from(rooms.max_guests) > capacity {
        issues.push(
            "max_guests",
            format!(
                "{} guests exceed the sleeping capacity of {capacity}",
                rooms.max_guests
            ),
        );
    }
}

fn validate_photos(draft: &ListingDraft, rules: &WizardRules, issues: &mut Issues) {
    let count = draft.photos.len();
    issues.require(
        count >= rules.min_photos,
        "photos",
        format!("upload at least {} photos", rules.min_photos),
    );
    issues.require(
        count <= rules.max_photos,
        "photos",
        format!("at most {} photos are allowed", rules.max_photos),
    );
    let covers = draft.photos.iter().filter(|photo| photo.is_cover).count();
    issues.require(covers <= 1, "photos", "only one cover photo can be selected");
}

fn validate_pricing(draft: &ListingDraft, rules: &WizardRules, issues: &mut Issues) {
    let Some(pricing) = &draft.pricing else {
        issues.push("pricing", "pricing is required");
        return;
    };

    let currency = match pricing.currency.trim() {
        "" => rules.default_currency.as_str(),
        declared => declared,
    };
    issues.require(
        currency.len() == 3 && currency.chars().all(|c| c.is_ascii_alphabetic()),
        "currency",
        "currency must be a three-letter ISO code",
    );
    issues.require(
        pricing.nightly_rate > 0,
        "nightly_rate",
        "nightly rate must be greater than zero",
    );
    if let Some(weekend) = pricing.weekend_rate {
        issues.require(weekend > 0, "weekend_rate", "weekend rate must be greater than zero");
    }
    issues.require(
        pricing.weekly_discount_pct <= MAX_DISCOUNT_PCT,
        "weekly_discount_pct",
        format!("discounts are capped at {MAX_DISCOUNT_PCT}%"),
    );
    issues.require(
        pricing.monthly_discount_pct <= MAX_DISCOUNT_PCT,
        "monthly_discount_pct",
        format!("discounts are capped at {MAX_DISCOUNT_PCT}%"),
    );
    if pricing.weekly_discount_pct > 0 && pricing.monthly_discount_pct > 0 {
        issues.require(
            pricing.monthly_discount_pct >= pricing.weekly_discount_pct,
            "monthly_discount_pct",
            "monthly discount cannot be smaller than the weekly discount",
        );
    }
    issues.require(pricing.min_nights >= 1, "min_nights", "minimum stay is at least one night");
    if let Some(max) = pricing.max_nights {
        issues.require(
            max >= pricing.min_nights,
            "max_nights",
            "maximum stay cannot be shorter than the minimum stay",
        );
    }

    let cap = rules.max_deposit_for(pricing.nightly_rate);
    if u64::from(pricing.security_deposit) > cap {
        issues.push(
            "security_deposit",
            format!(
                "security deposit exceeds {:.1}x the nightly rate (max {cap}, found {})",
                rules.deposit_cap_multiplier, pricing.security_deposit
            ),
        );
    }
}

fn validate_policies(draft: &ListingDraft, issues: &mut Issues) {
    let Some(policies) = &draft.policies else {
        issues.push("policies", "policies are required");
        return;
    };

    if let Some(until) = policies.check_in_until {
        issues.require(
            until > policies.check_in_from,
            "check_in_until",
            "check-in window must end after it starts",
        );
    }
    let rules = &policies.house_rules;
    match (rules.quiet_hours_start, rules.quiet_hours_end) {
        (Some(_), Some(_)) | (None, None) => {}
        _ => issues.push(
            "quiet_hours",
            "quiet hours need both a start and an end time",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::catalog::{BedType, PropertyCategory, PropertySubtype};
    use crate::listings::domain::{BedCount, Bedroom, RoomConfiguration};

    #[test]
    fn subtype_must_match_category() {
        let draft = ListingDraft {
            category: Some(PropertyCategory::Home),
            subtype: Some(PropertySubtype::Hostel),
            ..ListingDraft::default()
        };
        let issues = validate_step(WizardStep::Subtype, &draft, &WizardRules::default());
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("Hostel"));
    }

    #[test]
    fn multiple_mode_needs_two_units_but_hotels_accept_one() {
        let rules = WizardRules::default();
        let mut draft = ListingDraft {
            category: Some(PropertyCategory::Apartment),
            mode: Some(ListingMode::Multiple),
            quantity: Some(1),
            ..ListingDraft::default()
        };
        assert_eq!(validate_step(WizardStep::Quantity, &draft, &rules).len(), 1);

        draft.category = Some(PropertyCategory::HotelAndBnb);
        draft.mode = None;
        assert!(validate_step(WizardStep::Quantity, &draft, &rules).is_empty());

        draft.quantity = Some(rules.max_units + 1);
        assert_eq!(validate_step(WizardStep::Quantity, &draft, &rules).len(), 1);
    }

    #[test]
    fn guests_cannot_exceed_sleeping_capacity() {
        let draft = ListingDraft {
            rooms: Some(RoomConfiguration {
                bedrooms: vec![Bedroom {
                    name: None,
                    beds: vec![BedCount {
                        bed_type: BedType::Double,
                        count: 1,
                    }],
                }],
                living_room_beds: Vec::new(),
                bathrooms: 1,
                max_guests: 3,
            }),
            ..ListingDraft::default()
        };
        let issues = validate_step(WizardStep::Rooms, &draft, &WizardRules::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "max_guests");
    }

    #[test]
    fn empty_bedroom_is_flagged() {
        let draft = ListingDraft {
            rooms: Some(RoomConfiguration {
                bedrooms: vec![Bedroom { name: None, beds: Vec::new() }],
                living_room_beds: vec![BedCount {
                    bed_type: BedType::SofaBed,
                    count: 1,
                }],
                bathrooms: 1,
                max_guests: 2,
            }),
            ..ListingDraft::default()
        };
        let issues = validate_step(WizardStep::Rooms, &draft, &WizardRules::default());
        assert!(issues.iter().any(|issue| issue.message.contains("bedroom 1")));
    }

    #[test]
    fn unknown_amenities_are_rejected() {
        let draft = ListingDraft {
            amenities: vec!["wifi".to_string(), "helipad".to_string()],
            ..ListingDraft::default()
        };
        let issues = validate_step(WizardStep::Amenities, &draft, &WizardRules::default());
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("helipad"));
    }

    #[test]
    fn documents_are_skipped_when_not_required() {
        let draft = ListingDraft {
            category: Some(PropertyCategory::Apartment),
            mode: Some(ListingMode::Single),
            ..ListingDraft::default()
        };
        let mut rules = WizardRules::default();
        assert_eq!(validate_step(WizardStep::Documents, &draft, &rules).len(), 2);
        rules.require_documents = false;
        assert!(validate_step(WizardStep::Documents, &draft, &rules).is_empty());
    }

    #[test]
    fn deposit_cap_scales_with_nightly_rate() {
        let rules = WizardRules {
            deposit_cap_multiplier: 2.5,
            ..WizardRules::default()
        };
        assert_eq!(rules.max_deposit_for(101), 253);
        assert_eq!(rules.max_deposit_for(0), 0);
    }
}

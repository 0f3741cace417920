use chrono::{NaiveTime, Utc};
use uuid::Uuid;

use super::catalog::{BedType, DocumentKind, ListingMode, PropertyCategory};
use super::domain::{
    BasicInfo, BedCount, Bedroom, CancellationPolicy, DocumentAsset, HouseRules, PhotoAsset,
    Policies, Pricing, Property, PropertyId, PropertyStatus, RoomConfiguration, UserId,
    UserProfile, UserRole,
};
use super::wizard::{ListingDraft, ListingSubmission, WizardRules};

pub(crate) fn host_id() -> UserId {
    UserId(Uuid::new_v4())
}

pub(crate) fn user(role: UserRole, email: &str) -> UserProfile {
    UserProfile {
        id: host_id(),
        email: email.to_string(),
        full_name: None,
        role,
        created_at: Utc::now(),
    }
}

pub(crate) fn complete_draft(host: UserId) -> ListingDraft {
    let photos = (1..=5)
        .map(|index| PhotoAsset {
            storage_path: format!("{host}/draft-1/photo/{index}.jpg"),
            url: format!("memory://storage/object/public/property-photos/{index}.jpg"),
            caption: None,
            is_cover: false,
        })
        .collect();
    let documents = [DocumentKind::GovernmentId, DocumentKind::ProofOfOwnership]
        .into_iter()
        .map(|kind| DocumentAsset {
            kind,
            storage_path: format!("{host}/draft-1/document/{}.pdf", kind.label()),
            file_name: format!("{}.pdf", kind.label()),
            uploaded_at: Utc::now(),
        })
        .collect();

    ListingDraft {
        category: Some(PropertyCategory::Apartment),
        subtype: None,
        mode: Some(ListingMode::Single),
        quantity: None,
        basic_info: Some(BasicInfo {
            name: "Canal House Studio".to_string(),
            description: "Quiet studio overlooking the canal, close to the old town."
                .to_string(),
            street_address: "Prinsengracht 1".to_string(),
            city: "Amsterdam".to_string(),
            region: None,
            postal_code: "1015".to_string(),
            country: "Netherlands".to_string(),
            latitude: None,
            longitude: None,
        }),
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
            max_guests: 2,
        }),
        amenities: vec!["wifi".to_string(), "heating".to_string()],
        photos,
        pricing: Some(Pricing {
            currency: "EUR".to_string(),
            nightly_rate: 95,
            weekend_rate: None,
            cleaning_fee: 25,
            security_deposit: 150,
            weekly_discount_pct: 0,
            monthly_discount_pct: 0,
            min_nights: 1,
            max_nights: None,
        }),
        policies: Some(Policies {
            check_in_from: NaiveTime::from_hms_opt(15, 0, 0).expect("valid time"),
            check_in_until: None,
            check_out_until: NaiveTime::from_hms_opt(11, 0, 0).expect("valid time"),
            cancellation: CancellationPolicy::Flexible,
            house_rules: HouseRules {
                smoking_allowed: false,
                pets_allowed: false,
                parties_allowed: false,
                children_allowed: true,
                quiet_hours_start: None,
                quiet_hours_end: None,
            },
        }),
        documents,
    }
}

pub(crate) fn submission(host: UserId) -> ListingSubmission {
    ListingSubmission::from_draft(&complete_draft(host), &WizardRules::default())
        .expect("fixture draft is complete")
}

pub(crate) fn property(host: UserId, status: PropertyStatus) -> Property {
    let submission = submission(host);
    let now = Utc::now();
    Property {
        id: PropertyId::generate(),
        host_id: host,
        status,
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
    }
}

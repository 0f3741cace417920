//! Static catalog backing the listing wizard: categories, subtypes, amenities, bed
//! types and the verification documents each kind of listing must carry.

use serde::{Deserialize, Serialize};

/// Top-level choice on the first wizard screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyCategory {
    Apartment,
    Home,
    HotelAndBnb,
    AlternativePlace,
}

impl PropertyCategory {
    pub const fn ordered() -> [PropertyCategory; 4] {
        [
            PropertyCategory::Apartment,
            PropertyCategory::Home,
            PropertyCategory::HotelAndBnb,
            PropertyCategory::AlternativePlace,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            PropertyCategory::Apartment => "Apartment",
            PropertyCategory::Home => "Home",
            PropertyCategory::HotelAndBnb => "Hotel, B&B and more",
            PropertyCategory::AlternativePlace => "Alternative place",
        }
    }

    pub fn subtypes(self) -> Vec<PropertySubtype> {
        PropertySubtype::all()
            .into_iter()
            .filter(|subtype| subtype.category() == self)
            .collect()
    }

    pub fn has_subtypes(self) -> bool {
        !matches!(self, PropertyCategory::Apartment)
    }

    /// Hotels are always multi-unit, so the wizard skips the single/multiple question.
    pub const fn always_multi_unit(self) -> bool {
        matches!(self, PropertyCategory::HotelAndBnb)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertySubtype {
    EntireHome,
    HolidayHome,
    Villa,
    Chalet,
    Cottage,
    Hotel,
    GuestHouse,
    BedAndBreakfast,
    Homestay,
    Hostel,
    Motel,
    Lodge,
    Boat,
    Campsite,
    LuxuryTent,
    FarmStay,
    Treehouse,
}

impl PropertySubtype {
    pub const fn all() -> [PropertySubtype; 17] {
        [
            PropertySubtype::EntireHome,
            PropertySubtype::HolidayHome,
            PropertySubtype::Villa,
            PropertySubtype::Chalet,
            PropertySubtype::Cottage,
            PropertySubtype::Hotel,
            PropertySubtype::GuestHouse,
            PropertySubtype::BedAndBreakfast,
            PropertySubtype::Homestay,
            PropertySubtype::Hostel,
            PropertySubtype::Motel,
            PropertySubtype::Lodge,
            PropertySubtype::Boat,
            PropertySubtype::Campsite,
            PropertySubtype::LuxuryTent,
            PropertySubtype::FarmStay,
            PropertySubtype::Treehouse,
        ]
    }

    pub const fn category(self) -> PropertyCategory {
        match self {
            PropertySubtype::EntireHome
            | PropertySubtype::HolidayHome
            | PropertySubtype::Villa
            | PropertySubtype::Chalet
            | PropertySubtype::Cottage => PropertyCategory::Home,
            PropertySubtype::Hotel
            | PropertySubtype::GuestHouse
            | PropertySubtype::BedAndBreakfast
            | PropertySubtype::Homestay
            | PropertySubtype::Hostel
            | PropertySubtype::Motel
            | PropertySubtype::Lodge => PropertyCategory::HotelAndBnb,
            PropertySubtype::Boat
            | PropertySubtype::Campsite
            | PropertySubtype::LuxuryTent
            | PropertySubtype::FarmStay
            | PropertySubtype::Treehouse => PropertyCategory::AlternativePlace,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            PropertySubtype::EntireHome => "Entire home",
            PropertySubtype::HolidayHome => "Holiday home",
            PropertySubtype::Villa => "Villa",
            PropertySubtype::Chalet => "Chalet",
            PropertySubtype::Cottage => "Cottage",
            PropertySubtype::Hotel => "Hotel",
            PropertySubtype::GuestHouse => "Guest house",
            PropertySubtype::BedAndBreakfast => "Bed and breakfast",
            PropertySubtype::Homestay => "Homestay",
            PropertySubtype::Hostel => "Hostel",
            PropertySubtype::Motel => "Motel",
            PropertySubtype::Lodge => "Lodge",
            PropertySubtype::Boat => "Boat",
            PropertySubtype::Campsite => "Campsite",
            PropertySubtype::LuxuryTent => "Luxury tent",
            PropertySubtype::FarmStay => "Farm stay",
            PropertySubtype::Treehouse => "Treehouse",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BedType {
    Single,
    Double,
    Queen,
    King,
    Bunk,
    SofaBed,
    Futon,
    Crib,
}

impl BedType {
    pub const fn ordered() -> [BedType; 8] {
        [
            BedType::Single,
            BedType::Double,
            BedType::Queen,
            BedType::King,
            BedType::Bunk,
            BedType::SofaBed,
            BedType::Futon,
            BedType::Crib,
        ]
    }

    /// Guests one bed of this type sleeps. Cribs do not count towards capacity.
    pub const fn sleeps(self) -> u32 {
        match self {
            BedType::Single | BedType::Futon => 1,
            BedType::Double | BedType::Queen | BedType::King | BedType::Bunk | BedType::SofaBed => {
                2
            }
            BedType::Crib => 0,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            BedType::Single => "Single bed",
            BedType::Double => "Double bed",
            BedType::Queen => "Queen bed",
            BedType::King => "King bed",
            BedType::Bunk => "Bunk bed",
            BedType::SofaBed => "Sofa bed",
            BedType::Futon => "Futon",
            BedType::Crib => "Crib",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AmenityGroup {
    Essentials,
    Features,
    Location,
    Safety,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Amenity {
    pub key: &'static str,
    pub label: &'static str,
    pub group: AmenityGroup,
}

const AMENITIES: &[Amenity] = &[
    Amenity {
        key: "wifi",
        label: "Wi-Fi",
        group: AmenityGroup::Essentials,
    },
    Amenity {
        key: "kitchen",
        label: "Kitchen",
        group: AmenityGroup::Essentials,
    },
    Amenity {
        key: "washer",
        label: "Washing machine",
        group: AmenityGroup::Essentials,
    },
    Amenity {
        key: "heating",
        label: "Heating",
        group: AmenityGroup::Essentials,
    },
    Amenity {
        key: "air_conditioning",
        label: "Air conditioning",
        group: AmenityGroup::Essentials,
    },
    Amenity {
        key: "workspace",
        label: "Dedicated workspace",
        group: AmenityGroup::Essentials,
    },
    Amenity {
        key: "tv",
        label: "TV",
        group: AmenityGroup::Essentials,
    },
    Amenity {
        key: "pool",
        label: "Pool",
        group: AmenityGroup::Features,
    },
    Amenity {
        key: "hot_tub",
        label: "Hot tub",
        group: AmenityGroup::Features,
    },
    Amenity {
        key: "free_parking",
        label: "Free parking",
        group: AmenityGroup::Features,
    },
    Amenity {
        key: "ev_charger",
        label: "EV charger",
        group: AmenityGroup::Features,
    },
    Amenity {
        key: "bbq_grill",
        label: "BBQ grill",
        group: AmenityGroup::Features,
    },
    Amenity {
        key: "fireplace",
        label: "Indoor fireplace",
        group: AmenityGroup::Features,
    },
    Amenity {
        key: "gym",
        label: "Gym",
        group: AmenityGroup::Features,
    },
    Amenity {
        key: "beachfront",
        label: "Beachfront",
        group: AmenityGroup::Location,
    },
    Amenity {
        key: "waterfront",
        label: "Waterfront",
        group: AmenityGroup::Location,
    },
    Amenity {
        key: "ski_in_out",
        label: "Ski-in/ski-out",
        group: AmenityGroup::Location,
    },
    Amenity {
        key: "smoke_alarm",
        label: "Smoke alarm",
        group: AmenityGroup::Safety,
    },
    Amenity {
        key: "carbon_monoxide_alarm",
        label: "Carbon monoxide alarm",
        group: AmenityGroup::Safety,
    },
    Amenity {
        key: "first_aid_kit",
        label: "First aid kit",
        group: AmenityGroup::Safety,
    },
    Amenity {
        key: "fire_extinguisher",
        label: "Fire extinguisher",
        group: AmenityGroup::Safety,
    },
];

pub fn amenities() -> &'static [Amenity] {
    AMENITIES
}

pub fn find_amenity(key: &str) -> Option<&'static Amenity> {
    AMENITIES.iter().find(|amenity| amenity.key == key)
}

/// Verification documents a host may be asked to upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    GovernmentId,
    ProofOfOwnership,
    BusinessRegistration,
    FireSafetyCertificate,
    LiabilityInsurance,
    Other,
}

impl DocumentKind {
    pub const fn label(self) -> &'static str {
        match self {
            DocumentKind::GovernmentId => "Government-issued ID",
            DocumentKind::ProofOfOwnership => "Proof of ownership or right to let",
            DocumentKind::BusinessRegistration => "Business registration",
            DocumentKind::FireSafetyCertificate => "Fire safety certificate",
            DocumentKind::LiabilityInsurance => "Liability insurance",
            DocumentKind::Other => "Other supporting document",
        }
    }
}

/// Whether a listing describes one unit or several identical ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingMode {
    Single,
    Multiple,
}

pub fn required_documents(category: PropertyCategory, mode: ListingMode) -> Vec<DocumentKind> {
    let mut required = vec![DocumentKind::GovernmentId, DocumentKind::ProofOfOwnership];
    match category {
        PropertyCategory::HotelAndBnb => {
            required.push(DocumentKind::BusinessRegistration);
            required.push(DocumentKind::FireSafetyCertificate);
        }
        PropertyCategory::AlternativePlace => required.push(DocumentKind::LiabilityInsurance),
        PropertyCategory::Apartment | PropertyCategory::Home => {}
    }
    if mode == ListingMode::Multiple && !required.contains(&DocumentKind::BusinessRegistration) {
        required.push(DocumentKind::BusinessRegistration);
    }
    required
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryEntry {
    pub category: PropertyCategory,
    pub label: &'static str,
    pub subtypes: Vec<SubtypeEntry>,
    pub always_multi_unit: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubtypeEntry {
    pub subtype: PropertySubtype,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct BedTypeEntry {
    pub bed_type: BedType,
    pub label: &'static str,
    pub sleeps: u32,
}

/// Everything a client needs to render the wizard's choice screens.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogView {
    pub categories: Vec<CategoryEntry>,
    pub amenities: Vec<Amenity>,
    pub bed_types: Vec<BedTypeEntry>,
}

pub fn catalog_view() -> CatalogView {
    let categories = PropertyCategory::ordered()
        .into_iter()
        .map(|category| CategoryEntry {
            category,
            label: category.label(),
            subtypes: category
                .subtypes()
                .into_iter()
                .map(|subtype| SubtypeEntry {
                    subtype,
                    label: subtype.label(),
                })
                .collect(),
            always_multi_unit: category.always_multi_unit(),
        })
        .collect();

    let bed_types = BedType::ordered()
        .into_iter()
        .map(|bed_type| BedTypeEntry {
            bed_type,
            label: bed_type.label(),
            sleeps: bed_type.sleeps(),
        })
        .collect();

    CatalogView {
        categories,
        amenities: AMENITIES.to_vec(),
        bed_types,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subtype_belongs_to_a_category_with_subtypes() {
        for subtype in PropertySubtype::all() {
            assert!(subtype.category().has_subtypes(), "{subtype:?}");
        }
        assert!(PropertyCategory::Apartment.subtypes().is_empty());
        assert_eq!(PropertyCategory::Home.subtypes().len(), 5);
    }

    #[test]
    fn hotel_documents_do_not_duplicate_business_registration() {
        let docs = required_documents(PropertyCategory::HotelAndBnb, ListingMode::Multiple);
        let registrations = docs
            .iter()
            .filter(|kind| **kind == DocumentKind::BusinessRegistration)
            .count();
        assert_eq!(registrations, 1);
        assert_eq!(docs.len(), 4);
    }

    #[test]
    fn multiple_apartments_need_business_registration() {
        let single = required_documents(PropertyCategory::Apartment, ListingMode::Single);
        let multiple = required_documents(PropertyCategory::Apartment, ListingMode::Multiple);
        assert!(!single.contains(&DocumentKind::BusinessRegistration));
        assert!(multiple.contains(&DocumentKind::BusinessRegistration));
    }

    #[test]
    fn amenity_keys_are_unique() {
        let mut keys: Vec<_> = amenities().iter().map(|amenity| amenity.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), amenities().len());
        assert!(find_amenity("wifi").is_some());
        assert!(find_amenity("helipad").is_none());
    }
}
